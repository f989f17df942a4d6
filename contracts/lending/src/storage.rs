//! Storage layout and TTL-aware accessors for the lending pool.

use protocol_common::constants::{
    INSTANCE_BUMP_AMOUNT, INSTANCE_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT,
    PERSISTENT_LIFETIME_THRESHOLD, RATE_PRECISION,
};
use soroban_sdk::{contracttype, Address, Env};

#[derive(Clone)]
#[contracttype]
pub enum DataKey {
    Admin,
    SxlmToken,
    NativeToken,
    CollateralFactorBps,
    LiquidationThresholdBps,
    BorrowRateBps,
    LiquidationBonusBps,
    CloseFactorBps,
    ExchangeRate,
    TotalCollateral,
    TotalBorrowed,
    TotalAccruedInterest,
    PoolBalance,
    Accumulator,
    LastAccrualLedger,
    Position(Address),
}

/// Per-account collateral and debt.
///
/// `principal` is the debt at the accumulator value recorded in
/// `borrow_index`; the amount currently owed is
/// `principal * accumulator / borrow_index`.
#[derive(Clone)]
#[contracttype]
pub struct Position {
    pub sxlm_collateral: i128,
    pub principal: i128,
    pub borrow_index: i128,
    pub last_update_ledger: u32,
}

pub fn extend_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Admin)
}

pub fn read_admin(env: &Env) -> Address {
    env.storage().instance().get(&DataKey::Admin).unwrap()
}

pub fn read_sxlm_token(env: &Env) -> Address {
    env.storage().instance().get(&DataKey::SxlmToken).unwrap()
}

pub fn read_native_token(env: &Env) -> Address {
    env.storage().instance().get(&DataKey::NativeToken).unwrap()
}

pub fn read_i128(env: &Env, key: &DataKey) -> i128 {
    env.storage().instance().get(key).unwrap_or(0)
}

pub fn write_i128(env: &Env, key: &DataKey, val: i128) {
    env.storage().instance().set(key, &val);
}

pub fn read_u32(env: &Env, key: &DataKey, default: u32) -> u32 {
    env.storage().instance().get(key).unwrap_or(default)
}

pub fn read_exchange_rate(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::ExchangeRate)
        .unwrap_or(RATE_PRECISION)
}

pub fn read_accumulator(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::Accumulator)
        .unwrap_or(RATE_PRECISION)
}

pub fn read_position(env: &Env, user: &Address) -> Option<Position> {
    let key = DataKey::Position(user.clone());
    let position: Option<Position> = env.storage().persistent().get(&key);
    if position.is_some() {
        env.storage().persistent().extend_ttl(
            &key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );
    }
    position
}

/// Write a position; empty positions are removed instead of stored.
pub fn write_position(env: &Env, user: &Address, position: &Position) {
    let key = DataKey::Position(user.clone());
    if position.sxlm_collateral == 0 && position.principal == 0 {
        env.storage().persistent().remove(&key);
    } else {
        env.storage().persistent().set(&key, position);
        env.storage().persistent().extend_ttl(
            &key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );
    }
}
