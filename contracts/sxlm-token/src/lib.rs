//! sXLM Receipt Token Contract
//!
//! Supply-capped fungible token representing a share of the staking
//! reserve. Minting and burning are restricted to a single `minter`
//! address (the staking pool in production), so the supply can only move
//! through deposits and withdrawals. Holders transfer and approve freely
//! (SEP-41 surface); allowances carry an expiration ledger.

#![no_std]

use protocol_common::error::Error;
use protocol_common::math;
use soroban_sdk::{contract, contractimpl, Address, BytesN, Env, String};
use soroban_token_sdk::TokenUtils;

mod storage;


use storage::{
    extend_balance, extend_instance, has_admin, read_admin, read_allowance, read_balance,
    read_decimals, read_metadata_string, read_minter, read_total_supply, write_admin,
    write_allowance, write_balance, write_minter, write_total_supply, AllowanceValue, DataKey,
};

fn check_nonnegative(amount: i128) -> Result<(), Error> {
    if amount < 0 {
        return Err(Error::NegativeAmount);
    }
    Ok(())
}

/// Effective allowance: an entry past its expiration ledger reads as zero.
fn effective_allowance(env: &Env, from: &Address, spender: &Address) -> i128 {
    match read_allowance(env, from, spender) {
        Some(a) if a.expiration_ledger >= env.ledger().sequence() => a.amount,
        _ => 0,
    }
}

fn spend_allowance(
    env: &Env,
    from: &Address,
    spender: &Address,
    amount: i128,
) -> Result<(), Error> {
    let allowance = match read_allowance(env, from, spender) {
        Some(a) => a,
        None => return Err(Error::InsufficientAllowance),
    };
    if allowance.expiration_ledger < env.ledger().sequence() {
        return Err(Error::AllowanceExpired);
    }
    if allowance.amount < amount {
        return Err(Error::InsufficientAllowance);
    }
    write_allowance(
        env,
        from,
        spender,
        &AllowanceValue {
            amount: allowance.amount - amount,
            expiration_ledger: allowance.expiration_ledger,
        },
    );
    Ok(())
}

fn move_balance(env: &Env, from: &Address, to: &Address, amount: i128) -> Result<(), Error> {
    let from_balance = read_balance(env, from);
    if from_balance < amount {
        return Err(Error::InsufficientBalance);
    }
    write_balance(env, from, from_balance - amount);
    let to_balance = math::add(read_balance(env, to), amount)?;
    write_balance(env, to, to_balance);
    Ok(())
}

#[contract]
pub struct SxlmToken;

#[contractimpl]
impl SxlmToken {
    /// Initialize the token.
    ///
    /// `minter` is the only address allowed to mint and burn: the staking
    /// pool's contract address in a production deployment.
    pub fn initialize(
        env: Env,
        admin: Address,
        minter: Address,
        decimals: u32,
        name: String,
        symbol: String,
    ) -> Result<(), Error> {
        if has_admin(&env) {
            return Err(Error::AlreadyInitialized);
        }
        write_admin(&env, &admin);
        write_minter(&env, &minter);
        env.storage().instance().set(&DataKey::Decimals, &decimals);
        env.storage().instance().set(&DataKey::Name, &name);
        env.storage().instance().set(&DataKey::Symbol, &symbol);
        write_total_supply(&env, 0);
        extend_instance(&env);
        Ok(())
    }

    /// Upgrade the contract WASM. Only callable by admin.
    pub fn upgrade(env: Env, new_wasm_hash: BytesN<32>) -> Result<(), Error> {
        if !has_admin(&env) {
            return Err(Error::NotInitialized);
        }
        read_admin(&env).require_auth();
        env.deployer().update_current_contract_wasm(new_wasm_hash);
        Ok(())
    }

    /// Bump instance TTL — callable by anyone to keep the contract alive.
    pub fn bump_instance(env: Env) {
        extend_instance(&env);
    }

    /// Bump a holder's balance TTL — callable by anyone.
    pub fn bump_balance(env: Env, holder: Address) {
        extend_balance(&env, &holder);
        extend_instance(&env);
    }

    // ==========================================================
    // Mint / burn (minter only)
    // ==========================================================

    pub fn mint(env: Env, to: Address, amount: i128) -> Result<(), Error> {
        check_nonnegative(amount)?;
        if !has_admin(&env) {
            return Err(Error::NotInitialized);
        }
        let minter = read_minter(&env);
        minter.require_auth();
        extend_instance(&env);

        let balance = math::add(read_balance(&env, &to), amount)?;
        write_balance(&env, &to, balance);
        let supply = math::add(read_total_supply(&env), amount)?;
        write_total_supply(&env, supply);

        TokenUtils::new(&env).events().mint(minter, to, amount);
        Ok(())
    }

    pub fn burn(env: Env, from: Address, amount: i128) -> Result<(), Error> {
        check_nonnegative(amount)?;
        if !has_admin(&env) {
            return Err(Error::NotInitialized);
        }
        let minter = read_minter(&env);
        minter.require_auth();
        extend_instance(&env);

        let balance = read_balance(&env, &from);
        if balance < amount {
            return Err(Error::InsufficientBalance);
        }
        write_balance(&env, &from, balance - amount);
        write_total_supply(&env, read_total_supply(&env) - amount);

        TokenUtils::new(&env).events().burn(from, amount);
        Ok(())
    }

    // ==========================================================
    // SEP-41 token interface
    // ==========================================================

    pub fn allowance(env: Env, from: Address, spender: Address) -> i128 {
        extend_instance(&env);
        effective_allowance(&env, &from, &spender)
    }

    pub fn approve(
        env: Env,
        from: Address,
        spender: Address,
        amount: i128,
        expiration_ledger: u32,
    ) -> Result<(), Error> {
        from.require_auth();
        check_nonnegative(amount)?;
        extend_instance(&env);

        if amount > 0 && expiration_ledger < env.ledger().sequence() {
            return Err(Error::AllowanceExpired);
        }
        write_allowance(
            &env,
            &from,
            &spender,
            &AllowanceValue {
                amount,
                expiration_ledger,
            },
        );

        TokenUtils::new(&env)
            .events()
            .approve(from, spender, amount, expiration_ledger);
        Ok(())
    }

    pub fn balance(env: Env, id: Address) -> i128 {
        extend_instance(&env);
        read_balance(&env, &id)
    }

    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) -> Result<(), Error> {
        from.require_auth();
        check_nonnegative(amount)?;
        extend_instance(&env);

        move_balance(&env, &from, &to, amount)?;

        TokenUtils::new(&env).events().transfer(from, to, amount);
        Ok(())
    }

    pub fn transfer_from(
        env: Env,
        spender: Address,
        from: Address,
        to: Address,
        amount: i128,
    ) -> Result<(), Error> {
        spender.require_auth();
        check_nonnegative(amount)?;
        extend_instance(&env);

        spend_allowance(&env, &from, &spender, amount)?;
        move_balance(&env, &from, &to, amount)?;

        TokenUtils::new(&env).events().transfer(from, to, amount);
        Ok(())
    }

    pub fn total_supply(env: Env) -> i128 {
        extend_instance(&env);
        read_total_supply(&env)
    }

    pub fn decimals(env: Env) -> u32 {
        read_decimals(&env)
    }

    pub fn name(env: Env) -> String {
        read_metadata_string(&env, &DataKey::Name)
    }

    pub fn symbol(env: Env) -> String {
        read_metadata_string(&env, &DataKey::Symbol)
    }

    // ==========================================================
    // Admin
    // ==========================================================

    /// Update the minter address (e.g. when the staking pool is redeployed).
    pub fn set_minter(env: Env, new_minter: Address) -> Result<(), Error> {
        if !has_admin(&env) {
            return Err(Error::NotInitialized);
        }
        read_admin(&env).require_auth();
        extend_instance(&env);
        write_minter(&env, &new_minter);
        Ok(())
    }

    /// Transfer the admin role.
    pub fn set_admin(env: Env, new_admin: Address) -> Result<(), Error> {
        if !has_admin(&env) {
            return Err(Error::NotInitialized);
        }
        read_admin(&env).require_auth();
        extend_instance(&env);
        write_admin(&env, &new_admin);
        Ok(())
    }

    pub fn minter(env: Env) -> Address {
        read_minter(&env)
    }

    pub fn admin(env: Env) -> Address {
        read_admin(&env)
    }
}
