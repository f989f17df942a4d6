//! Shared building blocks for the sXLM liquid staking protocol.
//!
//! ## Architecture
//!
//! The protocol is five Soroban contracts wired caller→callee with no
//! callbacks:
//!
//! - **sXLM token**: supply-capped receipt token, mint/burn gated by a
//!   single minter address (the staking pool in production)
//! - **Staking pool**: XLM↔sXLM conversion through the exchange rate,
//!   withdrawal queue with instant-path liquidity buffer, rewards,
//!   slashing
//! - **Lending pool**: sXLM-collateralised XLM borrowing with an
//!   interest accumulator, health factor and liquidation
//! - **LP pool**: constant-product XLM/sXLM AMM with LP shares
//! - **Governance**: sXLM-weighted parameter proposals
//!
//! This crate holds what the contracts share: the protocol error enum,
//! fixed-point constants, checked 128-bit math, the borrow-interest
//! accumulator and the cross-contract client for the sXLM token.

#![no_std]

pub mod constants;
pub mod error;
pub mod interest;
pub mod math;
pub mod token;
