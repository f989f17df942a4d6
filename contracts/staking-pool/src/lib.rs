//! Staking Pool Contract
//!
//! Converts XLM to sXLM and back through a pool-wide exchange rate.
//!
//! ## Design
//!
//! - The pool owns the authoritative XLM reserve (`total_xlm_staked`);
//!   the sXLM supply lives in the receipt token, for which this contract
//!   is the sole minter. `rate = total_xlm_staked / total_supply`.
//! - Rewards raise the reserve (minus the protocol fee), so the rate only
//!   climbs; slashing lowers it.
//! - A withdrawal burns sXLM and earmarks the XLM immediately. It settles
//!   instantly from the liquidity buffer when the caller asks for it and
//!   the buffer covers the payout; otherwise it joins the delayed queue
//!   and unlocks after the cooldown.
//! - Slashing must reach pending claims as well as the live reserve: a
//!   cumulative slash index is snapshotted into each withdrawal record and
//!   the claim pays the recorded amount scaled by the index movement
//!   since.
//!
//! ## Buffer flow
//!
//! Deposits land in the buffer. The off-chain delegator drains it for
//! delegation (`release_for_delegation`) and refills it from undelegated
//! funds (`replenish_buffer`); both leave `total_xlm_staked` unchanged.

#![no_std]

use protocol_common::constants::{BPS_DENOMINATOR, RATE_PRECISION};
use protocol_common::error::Error;
use protocol_common::math;
use protocol_common::token::ReceiptTokenClient;
use soroban_sdk::{contract, contractimpl, token, Address, BytesN, Env, Vec};

mod events;
mod storage;


pub use storage::{Withdrawal, WithdrawalResult};

use storage::{
    extend_instance, is_initialized, next_withdrawal_id, push_user_withdrawal, read_admin,
    read_cooldown, read_i128, read_native_token, read_paused, read_protocol_fee_bps,
    read_slash_index, read_sxlm_token, read_treasury, read_user_withdrawals, read_validators,
    read_withdrawal, write_i128, write_withdrawal, DataKey,
};

/// Minimum deposit: 1 XLM.
const MIN_STAKE: i128 = 10_000_000;

/// Id returned for withdrawals settled instantly (no record stored).
const INSTANT_WITHDRAWAL_ID: u64 = u64::MAX;

/// Open withdrawal records per account, to bound storage.
const MAX_WITHDRAWALS_PER_USER: u32 = 100;

fn require_admin(env: &Env) -> Result<Address, Error> {
    if !is_initialized(env) {
        return Err(Error::NotInitialized);
    }
    let admin = read_admin(env);
    admin.require_auth();
    Ok(admin)
}

fn require_not_paused(env: &Env) -> Result<(), Error> {
    if read_paused(env) {
        return Err(Error::Paused);
    }
    Ok(())
}

fn sxlm_client(env: &Env) -> ReceiptTokenClient<'_> {
    ReceiptTokenClient::new(env, &read_sxlm_token(env))
}

fn native_client(env: &Env) -> token::Client<'_> {
    token::Client::new(env, &read_native_token(env))
}

/// Lower `total_xlm_staked`, keeping the buffer within the reserve.
fn shrink_total(env: &Env, by: i128) -> Result<i128, Error> {
    let new_total = math::sub(read_i128(env, &DataKey::TotalXlmStaked), by)?;
    write_i128(env, &DataKey::TotalXlmStaked, new_total);
    let buffer = read_i128(env, &DataKey::LiquidityBuffer);
    if buffer > new_total {
        write_i128(env, &DataKey::LiquidityBuffer, new_total);
    }
    Ok(new_total)
}

fn current_rate(total_staked: i128, total_supply: i128) -> i128 {
    if total_supply == 0 {
        return RATE_PRECISION;
    }
    // Reserve and supply both fit comfortably below 2^63, so the scaled
    // product stays inside i128.
    total_staked * RATE_PRECISION / total_supply
}

#[contract]
pub struct StakingPool;

#[contractimpl]
impl StakingPool {
    /// Initialize the staking pool.
    pub fn initialize(
        env: Env,
        admin: Address,
        sxlm_token: Address,
        native_token: Address,
        cooldown_period: u32,
    ) -> Result<(), Error> {
        if is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::SxlmToken, &sxlm_token);
        env.storage()
            .instance()
            .set(&DataKey::NativeToken, &native_token);
        env.storage()
            .instance()
            .set(&DataKey::CooldownPeriod, &cooldown_period);
        env.storage().instance().set(&DataKey::Treasury, &admin);
        env.storage().instance().set(&DataKey::Paused, &false);
        write_i128(&env, &DataKey::TotalXlmStaked, 0);
        write_i128(&env, &DataKey::LiquidityBuffer, 0);
        write_i128(&env, &DataKey::TreasuryBalance, 0);
        write_i128(&env, &DataKey::PendingClaims, 0);
        write_i128(&env, &DataKey::SlashIndex, RATE_PRECISION);
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
    // Core staking
    // ==========================================================

    /// Deposit XLM, receive sXLM at the current exchange rate.
    pub fn deposit(env: Env, user: Address, xlm_amount: i128) -> Result<i128, Error> {
        user.require_auth();
        require_not_paused(&env)?;
        if xlm_amount < MIN_STAKE {
            return Err(Error::BelowMinimumStake);
        }
        extend_instance(&env);

        let total_staked = read_i128(&env, &DataKey::TotalXlmStaked);
        let sxlm = sxlm_client(&env);
        let total_supply = sxlm.total_supply();

        // Mint at the pre-deposit rate; 1:1 on bootstrap (or after a full
        // slash, which resets the rate).
        let sxlm_to_mint = if total_supply == 0 || total_staked == 0 {
            xlm_amount
        } else {
            math::mul_div_floor(xlm_amount, total_supply, total_staked)?
        };
        if sxlm_to_mint <= 0 {
            return Err(Error::BelowMinimumStake);
        }

        native_client(&env).transfer(&user, &env.current_contract_address(), &xlm_amount);

        write_i128(
            &env,
            &DataKey::TotalXlmStaked,
            math::add(total_staked, xlm_amount)?,
        );
        let buffer = read_i128(&env, &DataKey::LiquidityBuffer);
        write_i128(&env, &DataKey::LiquidityBuffer, math::add(buffer, xlm_amount)?);

        sxlm.mint(&user, &sxlm_to_mint);

        events::deposit_event(&env, user, xlm_amount, sxlm_to_mint);
        Ok(sxlm_to_mint)
    }

    /// Burn sXLM and withdraw the backing XLM.
    ///
    /// The instant path is taken only when the caller asks for it and the
    /// liquidity buffer covers the payout; otherwise the request falls
    /// back to the delayed queue and unlocks after the cooldown.
    pub fn request_withdrawal(
        env: Env,
        user: Address,
        sxlm_amount: i128,
        instant: bool,
    ) -> Result<WithdrawalResult, Error> {
        user.require_auth();
        require_not_paused(&env)?;
        if sxlm_amount <= 0 {
            return Err(Error::NegativeAmount);
        }
        extend_instance(&env);

        let sxlm = sxlm_client(&env);
        let total_supply = sxlm.total_supply();
        if total_supply == 0 || sxlm.balance(&user) < sxlm_amount {
            return Err(Error::InsufficientSxlm);
        }

        let total_staked = read_i128(&env, &DataKey::TotalXlmStaked);
        let xlm_out = math::mul_div_floor(sxlm_amount, total_staked, total_supply)?;
        if xlm_out <= 0 {
            return Err(Error::BelowMinimumStake);
        }

        sxlm.burn(&user, &sxlm_amount);
        shrink_total(&env, xlm_out)?;

        let buffer = read_i128(&env, &DataKey::LiquidityBuffer);
        if instant && buffer >= xlm_out {
            write_i128(&env, &DataKey::LiquidityBuffer, buffer - xlm_out);
            native_client(&env).transfer(&env.current_contract_address(), &user, &xlm_out);

            events::instant_event(&env, user, xlm_out);
            return Ok(WithdrawalResult {
                withdrawal_id: INSTANT_WITHDRAWAL_ID,
                is_instant: true,
                xlm_amount: xlm_out,
            });
        }

        if read_user_withdrawals(&env, &user).len() >= MAX_WITHDRAWALS_PER_USER {
            return Err(Error::TooManyWithdrawals);
        }

        let id = next_withdrawal_id(&env);
        let unlock_ledger = env.ledger().sequence() + read_cooldown(&env);
        let record = Withdrawal {
            owner: user.clone(),
            xlm_amount: xlm_out,
            unlock_ledger,
            claimed: false,
            slash_index: read_slash_index(&env),
        };
        write_withdrawal(&env, id, &record);
        push_user_withdrawal(&env, &user, id);

        let pending = read_i128(&env, &DataKey::PendingClaims);
        write_i128(&env, &DataKey::PendingClaims, math::add(pending, xlm_out)?);

        events::delayed_event(&env, user, xlm_out, id, unlock_ledger);
        Ok(WithdrawalResult {
            withdrawal_id: id,
            is_instant: false,
            xlm_amount: xlm_out,
        })
    }

    /// Claim a delayed withdrawal once its cooldown has expired.
    ///
    /// Allowed while paused. The payout is the recorded amount reduced by
    /// any slashing applied since the request was created.
    pub fn claim_withdrawal(env: Env, user: Address, withdrawal_id: u64) -> Result<i128, Error> {
        user.require_auth();
        extend_instance(&env);

        let mut record = read_withdrawal(&env, withdrawal_id).ok_or(Error::NotFound)?;
        if record.owner != user {
            return Err(Error::NotOwner);
        }
        if record.claimed {
            return Err(Error::AlreadyClaimed);
        }
        if env.ledger().sequence() < record.unlock_ledger {
            return Err(Error::WithdrawalLocked);
        }

        let payout =
            math::mul_div_floor(record.xlm_amount, read_slash_index(&env), record.slash_index)?;

        record.claimed = true;
        write_withdrawal(&env, withdrawal_id, &record);

        let pending = read_i128(&env, &DataKey::PendingClaims);
        write_i128(
            &env,
            &DataKey::PendingClaims,
            math::sub(pending, record.xlm_amount)?,
        );

        native_client(&env).transfer(&env.current_contract_address(), &user, &payout);

        events::claimed_event(&env, user, payout, withdrawal_id);
        Ok(payout)
    }

    // ==========================================================
    // Rewards, fees and slashing
    // ==========================================================

    /// Add staking rewards. The protocol fee goes to the treasury balance;
    /// the remainder raises the reserve and with it the exchange rate.
    pub fn add_rewards(env: Env, amount: i128) -> Result<(), Error> {
        let admin = require_admin(&env)?;
        if amount <= 0 {
            return Err(Error::NegativeAmount);
        }
        extend_instance(&env);

        native_client(&env).transfer(&admin, &env.current_contract_address(), &amount);

        let fee = math::mul_div_floor(amount, read_protocol_fee_bps(&env) as i128, BPS_DENOMINATOR)?;
        let net_reward = amount - fee;

        let treasury_bal = read_i128(&env, &DataKey::TreasuryBalance);
        write_i128(&env, &DataKey::TreasuryBalance, math::add(treasury_bal, fee)?);

        let total_staked = read_i128(&env, &DataKey::TotalXlmStaked);
        write_i128(
            &env,
            &DataKey::TotalXlmStaked,
            math::add(total_staked, net_reward)?,
        );

        events::rewards_event(&env, amount);
        Ok(())
    }

    /// Transfer accumulated protocol fees to the treasury address.
    pub fn withdraw_fees(env: Env) -> Result<i128, Error> {
        require_admin(&env)?;
        extend_instance(&env);

        let treasury_bal = read_i128(&env, &DataKey::TreasuryBalance);
        if treasury_bal <= 0 {
            return Err(Error::NoFeesAccrued);
        }

        let treasury = read_treasury(&env);
        write_i128(&env, &DataKey::TreasuryBalance, 0);
        native_client(&env).transfer(&env.current_contract_address(), &treasury, &treasury_bal);

        events::fee_out_event(&env, treasury, treasury_bal);
        Ok(treasury_bal)
    }

    /// Apply a slashing loss reported by the off-chain delegator.
    ///
    /// Lowers the reserve (and so the exchange rate) and shrinks the
    /// cumulative slash index by the same fraction, which reduces every
    /// pending withdrawal claim proportionally at claim time.
    pub fn apply_slashing(env: Env, slash_amount: i128) -> Result<(), Error> {
        require_admin(&env)?;
        if slash_amount <= 0 {
            return Err(Error::NegativeAmount);
        }
        extend_instance(&env);

        let total_before = read_i128(&env, &DataKey::TotalXlmStaked);
        let applied = slash_amount.min(total_before);
        if applied == 0 {
            events::slashed_event(&env, 0, total_before);
            return Ok(());
        }

        let new_total = shrink_total(&env, applied)?;

        let index = read_slash_index(&env);
        let new_index = math::mul_div_floor(index, new_total, total_before)?;
        write_i128(&env, &DataKey::SlashIndex, new_index);

        events::slashed_event(&env, applied, new_total);
        Ok(())
    }

    /// Publish the current exchange rate for off-chain consumers.
    pub fn recalibrate_rate(env: Env) -> i128 {
        extend_instance(&env);
        let total_staked = read_i128(&env, &DataKey::TotalXlmStaked);
        let total_supply = sxlm_client(&env).total_supply();
        let rate = current_rate(total_staked, total_supply);

        events::recalib_event(&env, rate, total_staked, total_supply);
        rate
    }

    // ==========================================================
    // Emergency pause
    // ==========================================================

    /// Pause deposits and withdrawal requests. Claims stay open.
    pub fn pause(env: Env) -> Result<(), Error> {
        require_admin(&env)?;
        extend_instance(&env);
        env.storage().instance().set(&DataKey::Paused, &true);
        events::paused_event(&env, true);
        Ok(())
    }

    pub fn unpause(env: Env) -> Result<(), Error> {
        require_admin(&env)?;
        extend_instance(&env);
        env.storage().instance().set(&DataKey::Paused, &false);
        events::paused_event(&env, false);
        Ok(())
    }

    // ==========================================================
    // Buffer management and delegation
    // ==========================================================

    /// Move XLM out of the liquidity buffer to the delegator. The funds
    /// stay counted in the reserve: they are staked, just not liquid.
    pub fn release_for_delegation(env: Env, amount: i128) -> Result<(), Error> {
        let admin = require_admin(&env)?;
        if amount <= 0 {
            return Err(Error::NegativeAmount);
        }
        extend_instance(&env);

        let buffer = read_i128(&env, &DataKey::LiquidityBuffer);
        if amount > buffer {
            return Err(Error::BufferExceeded);
        }
        write_i128(&env, &DataKey::LiquidityBuffer, buffer - amount);
        native_client(&env).transfer(&env.current_contract_address(), &admin, &amount);
        Ok(())
    }

    /// Return undelegated XLM to the liquidity buffer. The buffer can
    /// never exceed the reserve it is a part of.
    pub fn replenish_buffer(env: Env, amount: i128) -> Result<(), Error> {
        let admin = require_admin(&env)?;
        if amount <= 0 {
            return Err(Error::NegativeAmount);
        }
        extend_instance(&env);

        let buffer = math::add(read_i128(&env, &DataKey::LiquidityBuffer), amount)?;
        if buffer > read_i128(&env, &DataKey::TotalXlmStaked) {
            return Err(Error::BufferExceeded);
        }
        native_client(&env).transfer(&admin, &env.current_contract_address(), &amount);
        write_i128(&env, &DataKey::LiquidityBuffer, buffer);
        Ok(())
    }

    /// Replace the advisory validator list. No per-validator accounting
    /// happens on-chain; the delegator reads this list.
    pub fn update_validators(env: Env, validators: Vec<Address>) -> Result<(), Error> {
        require_admin(&env)?;
        extend_instance(&env);
        env.storage().instance().set(&DataKey::Validators, &validators);
        Ok(())
    }

    // ==========================================================
    // Parameter setters (governance surface)
    // ==========================================================

    pub fn set_treasury(env: Env, treasury: Address) -> Result<(), Error> {
        require_admin(&env)?;
        extend_instance(&env);
        env.storage().instance().set(&DataKey::Treasury, &treasury);
        Ok(())
    }

    pub fn set_protocol_fee_bps(env: Env, fee_bps: u32) -> Result<(), Error> {
        require_admin(&env)?;
        if fee_bps > BPS_DENOMINATOR as u32 {
            return Err(Error::InvalidConfig);
        }
        extend_instance(&env);
        env.storage().instance().set(&DataKey::ProtocolFeeBps, &fee_bps);
        Ok(())
    }

    pub fn set_cooldown_period(env: Env, cooldown: u32) -> Result<(), Error> {
        require_admin(&env)?;
        extend_instance(&env);
        env.storage().instance().set(&DataKey::CooldownPeriod, &cooldown);
        env.events()
            .publish((soroban_sdk::symbol_short!("cd_upd"),), cooldown);
        Ok(())
    }

    pub fn set_admin(env: Env, new_admin: Address) -> Result<(), Error> {
        require_admin(&env)?;
        extend_instance(&env);
        env.storage().instance().set(&DataKey::Admin, &new_admin);
        Ok(())
    }

    // ==========================================================
    // Views
    // ==========================================================

    /// XLM per sXLM, scaled by 1e7. 1:1 while no sXLM circulates.
    pub fn get_exchange_rate(env: Env) -> i128 {
        extend_instance(&env);
        let total_staked = read_i128(&env, &DataKey::TotalXlmStaked);
        let total_supply = sxlm_client(&env).total_supply();
        current_rate(total_staked, total_supply)
    }

    pub fn total_xlm_staked(env: Env) -> i128 {
        extend_instance(&env);
        read_i128(&env, &DataKey::TotalXlmStaked)
    }

    pub fn liquidity_buffer(env: Env) -> i128 {
        extend_instance(&env);
        read_i128(&env, &DataKey::LiquidityBuffer)
    }

    pub fn treasury_balance(env: Env) -> i128 {
        extend_instance(&env);
        read_i128(&env, &DataKey::TreasuryBalance)
    }

    /// Sum of unclaimed delayed withdrawals at their recorded amounts.
    pub fn pending_claims(env: Env) -> i128 {
        extend_instance(&env);
        read_i128(&env, &DataKey::PendingClaims)
    }

    pub fn slash_index(env: Env) -> i128 {
        extend_instance(&env);
        read_slash_index(&env)
    }

    pub fn is_paused(env: Env) -> bool {
        extend_instance(&env);
        read_paused(&env)
    }

    pub fn protocol_fee_bps(env: Env) -> u32 {
        extend_instance(&env);
        read_protocol_fee_bps(&env)
    }

    pub fn get_cooldown_period(env: Env) -> u32 {
        extend_instance(&env);
        read_cooldown(&env)
    }

    pub fn get_withdrawal(env: Env, withdrawal_id: u64) -> Result<Withdrawal, Error> {
        extend_instance(&env);
        read_withdrawal(&env, withdrawal_id).ok_or(Error::NotFound)
    }

    /// Current claim value of a withdrawal, after any slashing since its
    /// creation.
    pub fn withdrawal_payout(env: Env, withdrawal_id: u64) -> Result<i128, Error> {
        extend_instance(&env);
        let record = read_withdrawal(&env, withdrawal_id).ok_or(Error::NotFound)?;
        math::mul_div_floor(record.xlm_amount, read_slash_index(&env), record.slash_index)
    }

    /// All withdrawal ids ever created for `user`, claimed ones included.
    pub fn get_user_withdrawals(env: Env, user: Address) -> Vec<u64> {
        extend_instance(&env);
        read_user_withdrawals(&env, &user)
    }

    pub fn get_validators(env: Env) -> Vec<Address> {
        extend_instance(&env);
        read_validators(&env)
    }

    pub fn admin(env: Env) -> Address {
        extend_instance(&env);
        read_admin(&env)
    }
}
