//! Lending Pool Contract
//!
//! XLM loans against sXLM collateral.
//!
//! ## Design
//!
//! - Debt compounds through a global monotone accumulator (scale 1e7);
//!   each position stores the index it last saw, so accrual is lazy and
//!   O(1) per touch.
//! - The sXLM→XLM rate is pushed by the staking side through
//!   `update_exchange_rate`; the pool never reads a price feed.
//! - The health factor uses the liquidation threshold and gates every
//!   position-weakening operation; `max_borrow` (collateral factor) is the
//!   advisory bound the off-chain gateway pre-flights with.
//! - Liquidation lets anyone repay up to the close factor of an unhealthy
//!   borrower's debt and seize collateral at a bonus.
//!
//! Every operation that touches a position accrues it first: accrue, then
//! mutate, then check health.

#![no_std]

use protocol_common::constants::{BPS_DENOMINATOR, RATE_PRECISION};
use protocol_common::error::Error;
use protocol_common::{interest, math};
use soroban_sdk::{
    contract, contractimpl, symbol_short, token, Address, BytesN, Env,
};

mod storage;


pub use storage::Position;

use storage::{
    extend_instance, is_initialized, read_accumulator, read_admin, read_exchange_rate, read_i128,
    read_native_token, read_position, read_sxlm_token, read_u32, write_i128, write_position,
    DataKey,
};

const DEFAULT_LIQUIDATION_BONUS_BPS: u32 = 500; // 5%
const DEFAULT_CLOSE_FACTOR_BPS: u32 = 5000; // half the debt per liquidation

fn require_admin(env: &Env) -> Result<Address, Error> {
    if !is_initialized(env) {
        return Err(Error::NotInitialized);
    }
    let admin = read_admin(env);
    admin.require_auth();
    Ok(admin)
}

fn check_bps(value: u32) -> Result<(), Error> {
    if value == 0 || value > BPS_DENOMINATOR as u32 {
        return Err(Error::InvalidConfig);
    }
    Ok(())
}

fn sxlm_client(env: &Env) -> token::Client<'_> {
    token::Client::new(env, &read_sxlm_token(env))
}

fn native_client(env: &Env) -> token::Client<'_> {
    token::Client::new(env, &read_native_token(env))
}

/// Health factor scaled by 1e7; `i128::MAX` when there is no debt.
fn health_factor_value(
    collateral: i128,
    debt: i128,
    threshold_bps: u32,
    exchange_rate: i128,
) -> Result<i128, Error> {
    if debt == 0 {
        return Ok(i128::MAX);
    }
    let numerator = collateral
        .checked_mul(exchange_rate)
        .and_then(|v| v.checked_mul(threshold_bps as i128))
        .ok_or(Error::ArithmeticOverflow)?;
    let denominator = debt
        .checked_mul(BPS_DENOMINATOR)
        .ok_or(Error::ArithmeticOverflow)?;
    Ok(numerator / denominator)
}

/// Advance the global accumulator to the current ledger.
fn accrue_global(env: &Env) -> Result<i128, Error> {
    let sequence = env.ledger().sequence();
    let last: u32 = env
        .storage()
        .instance()
        .get(&DataKey::LastAccrualLedger)
        .unwrap_or(sequence);
    let mut accumulator = read_accumulator(env);

    if sequence > last {
        let rate_bps = read_u32(env, &DataKey::BorrowRateBps, 0);
        accumulator = interest::advance_accumulator(accumulator, rate_bps, sequence - last)?;
        write_i128(env, &DataKey::Accumulator, accumulator);
    }
    env.storage()
        .instance()
        .set(&DataKey::LastAccrualLedger, &sequence);
    Ok(accumulator)
}

/// Accrue a position against the current accumulator. The realised
/// interest delta is folded into the aggregates; the caller is
/// responsible for writing the position back.
fn accrue_position(env: &Env, user: &Address) -> Result<Position, Error> {
    let accumulator = accrue_global(env)?;
    let sequence = env.ledger().sequence();

    let mut position = read_position(env, user).unwrap_or(Position {
        sxlm_collateral: 0,
        principal: 0,
        borrow_index: accumulator,
        last_update_ledger: sequence,
    });

    if position.principal > 0 && position.borrow_index != accumulator {
        let fresh = interest::fresh_debt(position.principal, accumulator, position.borrow_index)?;
        let delta = fresh - position.principal;
        if delta > 0 {
            let total = read_i128(env, &DataKey::TotalBorrowed);
            write_i128(env, &DataKey::TotalBorrowed, math::add(total, delta)?);
            let accrued = read_i128(env, &DataKey::TotalAccruedInterest);
            write_i128(env, &DataKey::TotalAccruedInterest, math::add(accrued, delta)?);
        }
        position.principal = fresh;
    }
    position.borrow_index = accumulator;
    position.last_update_ledger = sequence;
    Ok(position)
}

#[contract]
pub struct LendingPool;

#[contractimpl]
impl LendingPool {
    /// Initialize the lending pool.
    pub fn initialize(
        env: Env,
        admin: Address,
        sxlm_token: Address,
        native_token: Address,
        collateral_factor_bps: u32,
        liquidation_threshold_bps: u32,
        borrow_rate_bps: u32,
    ) -> Result<(), Error> {
        if is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }
        check_bps(collateral_factor_bps)?;
        check_bps(liquidation_threshold_bps)?;

        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::SxlmToken, &sxlm_token);
        env.storage()
            .instance()
            .set(&DataKey::NativeToken, &native_token);
        env.storage()
            .instance()
            .set(&DataKey::CollateralFactorBps, &collateral_factor_bps);
        env.storage()
            .instance()
            .set(&DataKey::LiquidationThresholdBps, &liquidation_threshold_bps);
        env.storage()
            .instance()
            .set(&DataKey::BorrowRateBps, &borrow_rate_bps);
        env.storage()
            .instance()
            .set(&DataKey::LiquidationBonusBps, &DEFAULT_LIQUIDATION_BONUS_BPS);
        env.storage()
            .instance()
            .set(&DataKey::CloseFactorBps, &DEFAULT_CLOSE_FACTOR_BPS);
        env.storage()
            .instance()
            .set(&DataKey::ExchangeRate, &RATE_PRECISION);
        write_i128(&env, &DataKey::Accumulator, RATE_PRECISION);
        env.storage()
            .instance()
            .set(&DataKey::LastAccrualLedger, &env.ledger().sequence());
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
    // Core lending
    // ==========================================================

    /// Deposit sXLM as collateral. Never weakens the position.
    pub fn deposit_collateral(env: Env, user: Address, sxlm_amount: i128) -> Result<(), Error> {
        user.require_auth();
        if sxlm_amount <= 0 {
            return Err(Error::NegativeAmount);
        }
        extend_instance(&env);

        let mut position = accrue_position(&env, &user)?;

        sxlm_client(&env).transfer(&user, &env.current_contract_address(), &sxlm_amount);

        position.sxlm_collateral = math::add(position.sxlm_collateral, sxlm_amount)?;
        write_position(&env, &user, &position);

        let total = read_i128(&env, &DataKey::TotalCollateral);
        write_i128(&env, &DataKey::TotalCollateral, math::add(total, sxlm_amount)?);

        env.events()
            .publish((symbol_short!("deposit"),), (user, sxlm_amount));
        Ok(())
    }

    /// Withdraw sXLM collateral, provided the position stays healthy.
    pub fn withdraw_collateral(env: Env, user: Address, sxlm_amount: i128) -> Result<(), Error> {
        user.require_auth();
        if sxlm_amount <= 0 {
            return Err(Error::NegativeAmount);
        }
        extend_instance(&env);

        let mut position = accrue_position(&env, &user)?;
        if position.sxlm_collateral < sxlm_amount {
            return Err(Error::InsufficientCollateral);
        }
        position.sxlm_collateral -= sxlm_amount;

        let hf = health_factor_value(
            position.sxlm_collateral,
            position.principal,
            read_u32(&env, &DataKey::LiquidationThresholdBps, 8000),
            read_exchange_rate(&env),
        )?;
        if hf < RATE_PRECISION {
            return Err(Error::UnhealthyAfter);
        }

        write_position(&env, &user, &position);
        let total = read_i128(&env, &DataKey::TotalCollateral);
        write_i128(&env, &DataKey::TotalCollateral, math::sub(total, sxlm_amount)?);

        sxlm_client(&env).transfer(&env.current_contract_address(), &user, &sxlm_amount);

        env.events()
            .publish((symbol_short!("withdraw"),), (user, sxlm_amount));
        Ok(())
    }

    /// Borrow XLM from the pool against deposited collateral.
    pub fn borrow(env: Env, user: Address, xlm_amount: i128) -> Result<(), Error> {
        user.require_auth();
        if xlm_amount <= 0 {
            return Err(Error::NegativeAmount);
        }
        extend_instance(&env);

        let mut position = accrue_position(&env, &user)?;

        let pool_balance = read_i128(&env, &DataKey::PoolBalance);
        if pool_balance < xlm_amount {
            return Err(Error::InsufficientPoolLiquidity);
        }

        position.principal = math::add(position.principal, xlm_amount)?;

        let hf = health_factor_value(
            position.sxlm_collateral,
            position.principal,
            read_u32(&env, &DataKey::LiquidationThresholdBps, 8000),
            read_exchange_rate(&env),
        )?;
        if hf < RATE_PRECISION {
            return Err(Error::UnhealthyAfter);
        }

        write_position(&env, &user, &position);
        let total = read_i128(&env, &DataKey::TotalBorrowed);
        write_i128(&env, &DataKey::TotalBorrowed, math::add(total, xlm_amount)?);
        write_i128(&env, &DataKey::PoolBalance, pool_balance - xlm_amount);

        native_client(&env).transfer(&env.current_contract_address(), &user, &xlm_amount);

        env.events()
            .publish((symbol_short!("borrow"),), (user, xlm_amount));
        Ok(())
    }

    /// Repay borrowed XLM. Amounts above the outstanding debt are clipped,
    /// never pulled.
    pub fn repay(env: Env, user: Address, xlm_amount: i128) -> Result<i128, Error> {
        user.require_auth();
        if xlm_amount <= 0 {
            return Err(Error::NegativeAmount);
        }
        extend_instance(&env);

        let mut position = accrue_position(&env, &user)?;
        if position.principal == 0 {
            return Err(Error::NothingToRepay);
        }
        let actual = xlm_amount.min(position.principal);

        native_client(&env).transfer(&user, &env.current_contract_address(), &actual);

        position.principal -= actual;
        write_position(&env, &user, &position);

        let total = read_i128(&env, &DataKey::TotalBorrowed);
        write_i128(&env, &DataKey::TotalBorrowed, math::sub(total, actual)?);
        let pool_balance = read_i128(&env, &DataKey::PoolBalance);
        write_i128(&env, &DataKey::PoolBalance, math::add(pool_balance, actual)?);

        env.events().publish((symbol_short!("repay"),), (user, actual));
        Ok(actual)
    }

    /// Liquidate an unhealthy borrower: the liquidator repays up to the
    /// close factor of the debt and seizes collateral at a bonus.
    pub fn liquidate(env: Env, liquidator: Address, borrower: Address) -> Result<(), Error> {
        liquidator.require_auth();
        extend_instance(&env);

        let mut position = accrue_position(&env, &borrower)?;
        if position.principal == 0 {
            return Err(Error::PositionEmpty);
        }

        let exchange_rate = read_exchange_rate(&env);
        let threshold_bps = read_u32(&env, &DataKey::LiquidationThresholdBps, 8000);
        let hf = health_factor_value(
            position.sxlm_collateral,
            position.principal,
            threshold_bps,
            exchange_rate,
        )?;
        if hf >= RATE_PRECISION {
            return Err(Error::HealthyBorrower);
        }

        let close_factor = read_u32(&env, &DataKey::CloseFactorBps, DEFAULT_CLOSE_FACTOR_BPS);
        let repaid = math::mul_div_floor(position.principal, close_factor as i128, BPS_DENOMINATOR)?;
        if repaid == 0 {
            return Err(Error::NothingToRepay);
        }

        // seized = repaid * 1e7 * (10000 + bonus) / rate / 10000
        let bonus = read_u32(&env, &DataKey::LiquidationBonusBps, DEFAULT_LIQUIDATION_BONUS_BPS);
        let scaled = repaid
            .checked_mul(RATE_PRECISION)
            .and_then(|v| v.checked_mul(BPS_DENOMINATOR + bonus as i128))
            .ok_or(Error::ArithmeticOverflow)?;
        let seized = (scaled / exchange_rate / BPS_DENOMINATOR).min(position.sxlm_collateral);

        native_client(&env).transfer(&liquidator, &env.current_contract_address(), &repaid);

        position.principal -= repaid;
        position.sxlm_collateral -= seized;
        write_position(&env, &borrower, &position);

        let total_borrowed = read_i128(&env, &DataKey::TotalBorrowed);
        write_i128(&env, &DataKey::TotalBorrowed, math::sub(total_borrowed, repaid)?);
        let total_collateral = read_i128(&env, &DataKey::TotalCollateral);
        write_i128(
            &env,
            &DataKey::TotalCollateral,
            math::sub(total_collateral, seized)?,
        );
        let pool_balance = read_i128(&env, &DataKey::PoolBalance);
        write_i128(&env, &DataKey::PoolBalance, math::add(pool_balance, repaid)?);

        sxlm_client(&env).transfer(&env.current_contract_address(), &liquidator, &seized);

        env.events().publish(
            (symbol_short!("liq"),),
            (liquidator, borrower, repaid, seized),
        );
        Ok(())
    }

    // ==========================================================
    // Admin operations
    // ==========================================================

    /// Push the sXLM→XLM rate from the staking side.
    pub fn update_exchange_rate(env: Env, rate: i128) -> Result<(), Error> {
        require_admin(&env)?;
        if rate <= 0 {
            return Err(Error::InvalidConfig);
        }
        extend_instance(&env);
        env.storage().instance().set(&DataKey::ExchangeRate, &rate);

        env.events().publish((symbol_short!("er_upd"),), rate);
        Ok(())
    }

    /// Supply XLM for borrowers.
    pub fn fund_pool(env: Env, amount: i128) -> Result<(), Error> {
        let admin = require_admin(&env)?;
        if amount <= 0 {
            return Err(Error::NegativeAmount);
        }
        extend_instance(&env);

        native_client(&env).transfer(&admin, &env.current_contract_address(), &amount);
        let pool_balance = read_i128(&env, &DataKey::PoolBalance);
        write_i128(&env, &DataKey::PoolBalance, math::add(pool_balance, amount)?);

        env.events().publish((symbol_short!("fund"),), amount);
        Ok(())
    }

    /// Move realised interest to the admin for piping back into staking
    /// rewards. Capped by the cash actually sitting in the pool.
    pub fn harvest_interest(env: Env) -> Result<i128, Error> {
        let admin = require_admin(&env)?;
        extend_instance(&env);

        accrue_global(&env)?;
        let accrued = read_i128(&env, &DataKey::TotalAccruedInterest);
        let pool_balance = read_i128(&env, &DataKey::PoolBalance);
        let amount = accrued.min(pool_balance);
        if amount <= 0 {
            return Ok(0);
        }

        write_i128(&env, &DataKey::TotalAccruedInterest, accrued - amount);
        write_i128(&env, &DataKey::PoolBalance, pool_balance - amount);
        native_client(&env).transfer(&env.current_contract_address(), &admin, &amount);

        env.events().publish((symbol_short!("harvest"),), amount);
        Ok(amount)
    }

    pub fn set_collateral_factor(env: Env, bps: u32) -> Result<(), Error> {
        require_admin(&env)?;
        check_bps(bps)?;
        extend_instance(&env);
        env.storage().instance().set(&DataKey::CollateralFactorBps, &bps);

        env.events().publish((symbol_short!("cf_upd"),), bps);
        Ok(())
    }

    pub fn set_liquidation_threshold(env: Env, bps: u32) -> Result<(), Error> {
        require_admin(&env)?;
        check_bps(bps)?;
        extend_instance(&env);
        env.storage()
            .instance()
            .set(&DataKey::LiquidationThresholdBps, &bps);
        Ok(())
    }

    pub fn set_borrow_rate(env: Env, bps: u32) -> Result<(), Error> {
        require_admin(&env)?;
        extend_instance(&env);
        // Accrue at the old rate before the new one takes effect.
        accrue_global(&env)?;
        env.storage().instance().set(&DataKey::BorrowRateBps, &bps);
        Ok(())
    }

    pub fn set_liquidation_bonus(env: Env, bps: u32) -> Result<(), Error> {
        require_admin(&env)?;
        if bps > BPS_DENOMINATOR as u32 {
            return Err(Error::InvalidConfig);
        }
        extend_instance(&env);
        env.storage().instance().set(&DataKey::LiquidationBonusBps, &bps);
        Ok(())
    }

    pub fn set_close_factor(env: Env, bps: u32) -> Result<(), Error> {
        require_admin(&env)?;
        check_bps(bps)?;
        extend_instance(&env);
        env.storage().instance().set(&DataKey::CloseFactorBps, &bps);
        Ok(())
    }

    // ==========================================================
    // Views
    // ==========================================================

    /// Returns the position with debt accrued to the current ledger.
    pub fn get_position(env: Env, user: Address) -> Position {
        extend_instance(&env);
        let sequence = env.ledger().sequence();
        match read_position(&env, &user) {
            Some(mut position) => {
                let accumulator = Self::projected_accumulator(&env);
                if position.principal > 0 {
                    position.principal = interest::fresh_debt(
                        position.principal,
                        accumulator,
                        position.borrow_index,
                    )
                    .unwrap_or(position.principal);
                }
                position.borrow_index = accumulator;
                position
            }
            None => Position {
                sxlm_collateral: 0,
                principal: 0,
                borrow_index: Self::projected_accumulator(&env),
                last_update_ledger: sequence,
            },
        }
    }

    /// Health factor scaled by 1e7; `i128::MAX` when debt-free.
    pub fn health_factor(env: Env, user: Address) -> i128 {
        extend_instance(&env);
        let position = Self::get_position(env.clone(), user);
        health_factor_value(
            position.sxlm_collateral,
            position.principal,
            read_u32(&env, &DataKey::LiquidationThresholdBps, 8000),
            read_exchange_rate(&env),
        )
        .unwrap_or(0)
    }

    /// Advisory borrow ceiling from the collateral factor.
    pub fn max_borrow(env: Env, user: Address) -> i128 {
        extend_instance(&env);
        let position = Self::get_position(env.clone(), user);
        let cf_bps = read_u32(&env, &DataKey::CollateralFactorBps, 7000);
        let exchange_rate = read_exchange_rate(&env);

        position
            .sxlm_collateral
            .checked_mul(exchange_rate)
            .and_then(|v| v.checked_mul(cf_bps as i128))
            .map(|v| v / (BPS_DENOMINATOR * RATE_PRECISION))
            .unwrap_or(0)
    }

    pub fn get_pool_balance(env: Env) -> i128 {
        extend_instance(&env);
        read_i128(&env, &DataKey::PoolBalance)
    }

    pub fn total_collateral(env: Env) -> i128 {
        extend_instance(&env);
        read_i128(&env, &DataKey::TotalCollateral)
    }

    pub fn total_borrowed(env: Env) -> i128 {
        extend_instance(&env);
        read_i128(&env, &DataKey::TotalBorrowed)
    }

    pub fn total_accrued_interest(env: Env) -> i128 {
        extend_instance(&env);
        read_i128(&env, &DataKey::TotalAccruedInterest)
    }

    pub fn get_accumulator(env: Env) -> i128 {
        extend_instance(&env);
        Self::projected_accumulator(&env)
    }

    pub fn get_collateral_factor(env: Env) -> u32 {
        extend_instance(&env);
        read_u32(&env, &DataKey::CollateralFactorBps, 7000)
    }

    pub fn get_liquidation_threshold(env: Env) -> u32 {
        extend_instance(&env);
        read_u32(&env, &DataKey::LiquidationThresholdBps, 8000)
    }

    pub fn get_borrow_rate(env: Env) -> u32 {
        extend_instance(&env);
        read_u32(&env, &DataKey::BorrowRateBps, 0)
    }

    pub fn get_liquidation_bonus(env: Env) -> u32 {
        extend_instance(&env);
        read_u32(&env, &DataKey::LiquidationBonusBps, DEFAULT_LIQUIDATION_BONUS_BPS)
    }

    pub fn get_close_factor(env: Env) -> u32 {
        extend_instance(&env);
        read_u32(&env, &DataKey::CloseFactorBps, DEFAULT_CLOSE_FACTOR_BPS)
    }

    pub fn get_exchange_rate(env: Env) -> i128 {
        extend_instance(&env);
        read_exchange_rate(&env)
    }
}

impl LendingPool {
    /// Accumulator value as of the current ledger, without writing it.
    fn projected_accumulator(env: &Env) -> i128 {
        let sequence = env.ledger().sequence();
        let last: u32 = env
            .storage()
            .instance()
            .get(&DataKey::LastAccrualLedger)
            .unwrap_or(sequence);
        let accumulator = read_accumulator(env);
        if sequence <= last {
            return accumulator;
        }
        let rate_bps = read_u32(env, &DataKey::BorrowRateBps, 0);
        interest::advance_accumulator(accumulator, rate_bps, sequence - last)
            .unwrap_or(accumulator)
    }
}
