//! LP Pool Contract
//!
//! Constant-product AMM for the XLM/sXLM pair.
//!
//! ## Design
//!
//! - Swaps quote against `x * y = k` with the fee deducted from the input
//!   before the quote; reserves absorb the full pre-fee input, so the fee
//!   accrues to LPs and k never decreases. Every swap re-checks the
//!   invariant and refuses to settle if it would shrink.
//! - `add_liquidity` takes both transfer amounts as given and mints by
//!   the lesser reserve ratio; excess on one side stays in the pool for
//!   all LPs. The quote is computed, not coerced.
//! - The first provider's shares are minted from `isqrt(x * y)`, with
//!   `MIN_LIQUIDITY` locked to the pool's own address forever so the
//!   share price cannot be manipulated by emptying the pool.

#![no_std]

use protocol_common::constants::{BPS_DENOMINATOR, RATE_PRECISION};
use protocol_common::error::Error;
use protocol_common::math;
use soroban_sdk::{
    contract, contractimpl, symbol_short, token, Address, BytesN, Env, Symbol,
};

mod storage;


use storage::{
    extend_instance, is_initialized, read_admin, read_fee_bps, read_i128, read_lp_balance,
    read_native_token, read_sxlm_token, write_i128, write_lp_balance, DataKey,
};

/// LP shares locked to the pool address by the first deposit.
const MIN_LIQUIDITY: i128 = 1000;

fn require_admin(env: &Env) -> Result<Address, Error> {
    if !is_initialized(env) {
        return Err(Error::NotInitialized);
    }
    let admin = read_admin(env);
    admin.require_auth();
    Ok(admin)
}

fn native_client(env: &Env) -> token::Client<'_> {
    token::Client::new(env, &read_native_token(env))
}

fn sxlm_client(env: &Env) -> token::Client<'_> {
    token::Client::new(env, &read_sxlm_token(env))
}

/// Constant-product output for `amount_in` after the fee.
fn swap_output(
    reserve_in: i128,
    reserve_out: i128,
    amount_in: i128,
    fee_bps: u32,
) -> Result<i128, Error> {
    let after_fee = math::mul_div_floor(
        amount_in,
        BPS_DENOMINATOR - fee_bps as i128,
        BPS_DENOMINATOR,
    )?;
    let kept = math::mul_div_floor(reserve_in, reserve_out, math::add(reserve_in, after_fee)?)?;
    Ok(reserve_out - kept)
}

/// The product after settling must cover the product before.
fn check_invariant(
    reserve_xlm: i128,
    reserve_sxlm: i128,
    new_reserve_xlm: i128,
    new_reserve_sxlm: i128,
) -> Result<(), Error> {
    let k_before = reserve_xlm
        .checked_mul(reserve_sxlm)
        .ok_or(Error::ArithmeticOverflow)?;
    let k_after = new_reserve_xlm
        .checked_mul(new_reserve_sxlm)
        .ok_or(Error::ArithmeticOverflow)?;
    if k_after < k_before {
        return Err(Error::InvariantViolated);
    }
    Ok(())
}

#[contract]
pub struct LpPool;

#[contractimpl]
impl LpPool {
    /// Initialize the LP pool.
    pub fn initialize(
        env: Env,
        admin: Address,
        sxlm_token: Address,
        native_token: Address,
        fee_bps: u32,
    ) -> Result<(), Error> {
        if is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }
        if fee_bps >= BPS_DENOMINATOR as u32 {
            return Err(Error::InvalidConfig);
        }
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::SxlmToken, &sxlm_token);
        env.storage()
            .instance()
            .set(&DataKey::NativeToken, &native_token);
        env.storage().instance().set(&DataKey::FeeBps, &fee_bps);
        extend_instance(&env);
        Ok(())
    }

    /// Upgrade the contract WASM. Only callable by admin.
    pub fn upgrade(env: Env, new_wasm_hash: BytesN<32>) -> Result<(), Error> {
        require_admin(&env)?;
        env.deployer().update_current_contract_wasm(new_wasm_hash);
        Ok(())
    }

    /// Bump instance TTL — callable by anyone to keep the contract alive.
    pub fn bump_instance(env: Env) {
        extend_instance(&env);
    }

    // ==========================================================
    // Liquidity
    // ==========================================================

    /// Add liquidity. Both amounts are transferred as given; LP shares are
    /// minted by the lesser reserve ratio and any excess on the richer
    /// side stays in the pool.
    pub fn add_liquidity(
        env: Env,
        user: Address,
        xlm_amount: i128,
        sxlm_amount: i128,
    ) -> Result<i128, Error> {
        user.require_auth();
        if xlm_amount <= 0 || sxlm_amount <= 0 {
            return Err(Error::NegativeAmount);
        }
        extend_instance(&env);

        let reserve_xlm = read_i128(&env, &DataKey::ReserveXlm);
        let reserve_sxlm = read_i128(&env, &DataKey::ReserveSxlm);
        let total_lp = read_i128(&env, &DataKey::TotalLpSupply);

        let lp_minted = if total_lp == 0 {
            let product = xlm_amount
                .checked_mul(sxlm_amount)
                .ok_or(Error::ArithmeticOverflow)?;
            let shares = math::isqrt(product);
            if shares <= MIN_LIQUIDITY {
                return Err(Error::BelowMinLiquidity);
            }
            // Lock the minimum forever under the pool's own address.
            write_lp_balance(&env, &env.current_contract_address(), MIN_LIQUIDITY);
            write_i128(&env, &DataKey::TotalLpSupply, shares);
            shares - MIN_LIQUIDITY
        } else {
            let from_xlm = math::mul_div_floor(xlm_amount, total_lp, reserve_xlm)?;
            let from_sxlm = math::mul_div_floor(sxlm_amount, total_lp, reserve_sxlm)?;
            let minted = from_xlm.min(from_sxlm);
            if minted <= 0 {
                return Err(Error::InsufficientLiquidity);
            }
            write_i128(&env, &DataKey::TotalLpSupply, math::add(total_lp, minted)?);
            minted
        };

        native_client(&env).transfer(&user, &env.current_contract_address(), &xlm_amount);
        sxlm_client(&env).transfer(&user, &env.current_contract_address(), &sxlm_amount);

        write_i128(&env, &DataKey::ReserveXlm, math::add(reserve_xlm, xlm_amount)?);
        write_i128(
            &env,
            &DataKey::ReserveSxlm,
            math::add(reserve_sxlm, sxlm_amount)?,
        );
        write_lp_balance(&env, &user, math::add(read_lp_balance(&env, &user), lp_minted)?);

        env.events().publish(
            (symbol_short!("add_liq"),),
            (user, xlm_amount, sxlm_amount, lp_minted),
        );
        Ok(lp_minted)
    }

    /// Burn LP shares for the pro-rata share of both reserves.
    pub fn remove_liquidity(env: Env, user: Address, lp_amount: i128) -> Result<(i128, i128), Error> {
        user.require_auth();
        if lp_amount <= 0 {
            return Err(Error::NegativeAmount);
        }
        extend_instance(&env);

        let user_lp = read_lp_balance(&env, &user);
        if user_lp < lp_amount {
            return Err(Error::InsufficientLiquidity);
        }

        let reserve_xlm = read_i128(&env, &DataKey::ReserveXlm);
        let reserve_sxlm = read_i128(&env, &DataKey::ReserveSxlm);
        let total_lp = read_i128(&env, &DataKey::TotalLpSupply);

        let xlm_out = math::mul_div_floor(lp_amount, reserve_xlm, total_lp)?;
        let sxlm_out = math::mul_div_floor(lp_amount, reserve_sxlm, total_lp)?;
        if xlm_out <= 0 || sxlm_out <= 0 {
            return Err(Error::InsufficientLiquidity);
        }

        write_i128(&env, &DataKey::ReserveXlm, reserve_xlm - xlm_out);
        write_i128(&env, &DataKey::ReserveSxlm, reserve_sxlm - sxlm_out);
        write_i128(&env, &DataKey::TotalLpSupply, total_lp - lp_amount);
        write_lp_balance(&env, &user, user_lp - lp_amount);

        native_client(&env).transfer(&env.current_contract_address(), &user, &xlm_out);
        sxlm_client(&env).transfer(&env.current_contract_address(), &user, &sxlm_out);

        env.events().publish(
            (symbol_short!("rm_liq"),),
            (user, lp_amount, xlm_out, sxlm_out),
        );
        Ok((xlm_out, sxlm_out))
    }

    // ==========================================================
    // Swaps
    // ==========================================================

    /// Swap XLM for sXLM. `min_sxlm_out` bounds slippage.
    pub fn swap_xlm_to_sxlm(
        env: Env,
        user: Address,
        xlm_in: i128,
        min_sxlm_out: i128,
    ) -> Result<i128, Error> {
        user.require_auth();
        if xlm_in <= 0 {
            return Err(Error::NegativeAmount);
        }
        extend_instance(&env);

        let reserve_xlm = read_i128(&env, &DataKey::ReserveXlm);
        let reserve_sxlm = read_i128(&env, &DataKey::ReserveSxlm);
        if reserve_xlm <= 0 || reserve_sxlm <= 0 {
            return Err(Error::InsufficientLiquidity);
        }

        let sxlm_out = swap_output(reserve_xlm, reserve_sxlm, xlm_in, read_fee_bps(&env))?;
        if sxlm_out <= 0 || sxlm_out >= reserve_sxlm {
            return Err(Error::InsufficientLiquidity);
        }
        if sxlm_out < min_sxlm_out {
            return Err(Error::SlippageExceeded);
        }

        // The fee stays in the pool: reserves take the pre-fee input.
        let new_reserve_xlm = math::add(reserve_xlm, xlm_in)?;
        let new_reserve_sxlm = reserve_sxlm - sxlm_out;
        check_invariant(reserve_xlm, reserve_sxlm, new_reserve_xlm, new_reserve_sxlm)?;

        native_client(&env).transfer(&user, &env.current_contract_address(), &xlm_in);
        sxlm_client(&env).transfer(&env.current_contract_address(), &user, &sxlm_out);

        write_i128(&env, &DataKey::ReserveXlm, new_reserve_xlm);
        write_i128(&env, &DataKey::ReserveSxlm, new_reserve_sxlm);

        Self::swap_event(&env, user, symbol_short!("xlm"), xlm_in, sxlm_out);
        Ok(sxlm_out)
    }

    /// Swap sXLM for XLM. `min_xlm_out` bounds slippage.
    pub fn swap_sxlm_to_xlm(
        env: Env,
        user: Address,
        sxlm_in: i128,
        min_xlm_out: i128,
    ) -> Result<i128, Error> {
        user.require_auth();
        if sxlm_in <= 0 {
            return Err(Error::NegativeAmount);
        }
        extend_instance(&env);

        let reserve_xlm = read_i128(&env, &DataKey::ReserveXlm);
        let reserve_sxlm = read_i128(&env, &DataKey::ReserveSxlm);
        if reserve_xlm <= 0 || reserve_sxlm <= 0 {
            return Err(Error::InsufficientLiquidity);
        }

        let xlm_out = swap_output(reserve_sxlm, reserve_xlm, sxlm_in, read_fee_bps(&env))?;
        if xlm_out <= 0 || xlm_out >= reserve_xlm {
            return Err(Error::InsufficientLiquidity);
        }
        if xlm_out < min_xlm_out {
            return Err(Error::SlippageExceeded);
        }

        let new_reserve_sxlm = math::add(reserve_sxlm, sxlm_in)?;
        let new_reserve_xlm = reserve_xlm - xlm_out;
        check_invariant(reserve_xlm, reserve_sxlm, new_reserve_xlm, new_reserve_sxlm)?;

        sxlm_client(&env).transfer(&user, &env.current_contract_address(), &sxlm_in);
        native_client(&env).transfer(&env.current_contract_address(), &user, &xlm_out);

        write_i128(&env, &DataKey::ReserveXlm, new_reserve_xlm);
        write_i128(&env, &DataKey::ReserveSxlm, new_reserve_sxlm);

        Self::swap_event(&env, user, symbol_short!("sxlm"), sxlm_in, xlm_out);
        Ok(xlm_out)
    }

    // ==========================================================
    // Views
    // ==========================================================

    /// Returns (reserve_xlm, reserve_sxlm).
    pub fn get_reserves(env: Env) -> (i128, i128) {
        extend_instance(&env);
        (
            read_i128(&env, &DataKey::ReserveXlm),
            read_i128(&env, &DataKey::ReserveSxlm),
        )
    }

    /// Spot price of sXLM in XLM, scaled by 1e7.
    pub fn get_price(env: Env) -> i128 {
        extend_instance(&env);
        let reserve_xlm = read_i128(&env, &DataKey::ReserveXlm);
        let reserve_sxlm = read_i128(&env, &DataKey::ReserveSxlm);
        if reserve_sxlm == 0 {
            return RATE_PRECISION;
        }
        math::mul_div_floor(reserve_xlm, RATE_PRECISION, reserve_sxlm).unwrap_or(0)
    }

    pub fn get_lp_balance(env: Env, user: Address) -> i128 {
        extend_instance(&env);
        read_lp_balance(&env, &user)
    }

    pub fn total_lp_supply(env: Env) -> i128 {
        extend_instance(&env);
        read_i128(&env, &DataKey::TotalLpSupply)
    }

    pub fn get_fee_bps(env: Env) -> u32 {
        extend_instance(&env);
        read_fee_bps(&env)
    }
}

impl LpPool {
    fn swap_event(env: &Env, user: Address, in_sym: Symbol, in_amt: i128, out_amt: i128) {
        env.events()
            .publish((symbol_short!("swap"),), (user, in_sym, in_amt, out_amt));
    }
}
