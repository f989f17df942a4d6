//! Storage layout and TTL-aware accessors for the staking pool.

use protocol_common::constants::{
    INSTANCE_BUMP_AMOUNT, INSTANCE_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT,
    PERSISTENT_LIFETIME_THRESHOLD, RATE_PRECISION,
};
use soroban_sdk::{contracttype, Address, Env, Vec};

#[derive(Clone)]
#[contracttype]
pub enum DataKey {
    Admin,
    SxlmToken,
    NativeToken,
    Treasury,
    CooldownPeriod,
    ProtocolFeeBps,
    Paused,
    TotalXlmStaked,
    LiquidityBuffer,
    TreasuryBalance,
    PendingClaims,
    SlashIndex,
    NextWithdrawalId,
    Validators,
    Withdrawal(u64),
    UserWithdrawals(Address),
}

/// A delayed withdrawal claim on already-unstaked XLM.
///
/// `slash_index` snapshots the pool's cumulative slash index at creation
/// time; the payout at claim time is `xlm_amount` scaled by the index
/// movement since, so slashing reaches pending claims too.
#[derive(Clone)]
#[contracttype]
pub struct Withdrawal {
    pub owner: Address,
    pub xlm_amount: i128,
    pub unlock_ledger: u32,
    pub claimed: bool,
    pub slash_index: i128,
}

/// Outcome of a withdrawal request. Instant withdrawals carry
/// `withdrawal_id == u64::MAX`; no record is stored for them.
#[derive(Clone, Debug, PartialEq)]
#[contracttype]
pub struct WithdrawalResult {
    pub withdrawal_id: u64,
    pub is_instant: bool,
    pub xlm_amount: i128,
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

pub fn read_treasury(env: &Env) -> Address {
    env.storage().instance().get(&DataKey::Treasury).unwrap()
}

pub fn read_i128(env: &Env, key: &DataKey) -> i128 {
    env.storage().instance().get(key).unwrap_or(0)
}

pub fn write_i128(env: &Env, key: &DataKey, val: i128) {
    env.storage().instance().set(key, &val);
}

pub fn read_cooldown(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&DataKey::CooldownPeriod)
        .unwrap_or(17280u32) // ~24 hours at 5s/ledger
}

pub fn read_protocol_fee_bps(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&DataKey::ProtocolFeeBps)
        .unwrap_or(1000u32) // 10%
}

pub fn read_paused(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Paused)
        .unwrap_or(false)
}

pub fn read_slash_index(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::SlashIndex)
        .unwrap_or(RATE_PRECISION)
}

pub fn next_withdrawal_id(env: &Env) -> u64 {
    let id: u64 = env
        .storage()
        .instance()
        .get(&DataKey::NextWithdrawalId)
        .unwrap_or(0);
    env.storage()
        .instance()
        .set(&DataKey::NextWithdrawalId, &(id + 1));
    id
}

pub fn read_withdrawal(env: &Env, id: u64) -> Option<Withdrawal> {
    let key = DataKey::Withdrawal(id);
    let record: Option<Withdrawal> = env.storage().persistent().get(&key);
    if record.is_some() {
        env.storage().persistent().extend_ttl(
            &key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );
    }
    record
}

pub fn write_withdrawal(env: &Env, id: u64, record: &Withdrawal) {
    let key = DataKey::Withdrawal(id);
    env.storage().persistent().set(&key, record);
    env.storage().persistent().extend_ttl(
        &key,
        PERSISTENT_LIFETIME_THRESHOLD,
        PERSISTENT_BUMP_AMOUNT,
    );
}

pub fn read_user_withdrawals(env: &Env, user: &Address) -> Vec<u64> {
    let key = DataKey::UserWithdrawals(user.clone());
    let ids: Vec<u64> = env
        .storage()
        .persistent()
        .get(&key)
        .unwrap_or(Vec::new(env));
    if !ids.is_empty() {
        env.storage().persistent().extend_ttl(
            &key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );
    }
    ids
}

pub fn push_user_withdrawal(env: &Env, user: &Address, id: u64) {
    let key = DataKey::UserWithdrawals(user.clone());
    let mut ids = read_user_withdrawals(env, user);
    ids.push_back(id);
    env.storage().persistent().set(&key, &ids);
    env.storage().persistent().extend_ttl(
        &key,
        PERSISTENT_LIFETIME_THRESHOLD,
        PERSISTENT_BUMP_AMOUNT,
    );
}

pub fn read_validators(env: &Env) -> Vec<Address> {
    env.storage()
        .instance()
        .get(&DataKey::Validators)
        .unwrap_or(Vec::new(env))
}
