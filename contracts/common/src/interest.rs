//! Borrow-interest accumulator for the lending pool.
//!
//! A global monotone index (scale 1e7, starting at `RATE_PRECISION`)
//! compounds the per-year borrow rate ledger by ledger. Positions store
//! the index seen at their last touch; current debt is
//! `principal * accumulator / borrow_index`, so untouched positions accrue
//! lazily without per-position writes.

use crate::constants::{BPS_DENOMINATOR, LEDGERS_PER_YEAR};
use crate::error::Error;
use crate::math;

/// Advance the accumulator over `elapsed_ledgers` at `borrow_rate_bps`
/// per year (simple interest within the window, floored).
pub fn advance_accumulator(
    accumulator: i128,
    borrow_rate_bps: u32,
    elapsed_ledgers: u32,
) -> Result<i128, Error> {
    if elapsed_ledgers == 0 || borrow_rate_bps == 0 {
        return Ok(accumulator);
    }

    // delta = accumulator * rate_bps * elapsed / (BPS * LEDGERS_PER_YEAR)
    let numerator = accumulator
        .checked_mul(borrow_rate_bps as i128)
        .and_then(|v| v.checked_mul(elapsed_ledgers as i128))
        .ok_or(Error::ArithmeticOverflow)?;
    let delta = numerator / (BPS_DENOMINATOR * LEDGERS_PER_YEAR);

    math::add(accumulator, delta)
}

/// Current debt of a position given the global accumulator and the index
/// recorded at the position's last update.
pub fn fresh_debt(principal: i128, accumulator: i128, borrow_index: i128) -> Result<i128, Error> {
    if principal == 0 {
        return Ok(0);
    }
    math::mul_div_floor(principal, accumulator, borrow_index)
}
