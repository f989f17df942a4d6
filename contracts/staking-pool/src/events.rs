//! Event emission for the staking pool.
//!
//! Every state-changing entry point publishes one event; the first topic
//! is the short name the off-chain indexer keys on.

use soroban_sdk::{symbol_short, Address, Env};

pub fn deposit_event(env: &Env, user: Address, xlm_amount: i128, sxlm_minted: i128) {
    env.events().publish(
        (symbol_short!("deposit"),),
        (user, xlm_amount, sxlm_minted),
    );
}

pub fn instant_event(env: &Env, user: Address, xlm_amount: i128) {
    env.events()
        .publish((symbol_short!("instant"),), (user, xlm_amount));
}

pub fn delayed_event(env: &Env, user: Address, xlm_amount: i128, id: u64, unlock_ledger: u32) {
    env.events().publish(
        (symbol_short!("delayed"),),
        (user, xlm_amount, id, unlock_ledger),
    );
}

pub fn claimed_event(env: &Env, user: Address, xlm_amount: i128, id: u64) {
    env.events()
        .publish((symbol_short!("claimed"),), (user, xlm_amount, id));
}

pub fn rewards_event(env: &Env, amount: i128) {
    env.events().publish((symbol_short!("rewards"),), amount);
}

pub fn slashed_event(env: &Env, applied: i128, new_total: i128) {
    env.events()
        .publish((symbol_short!("slashed"),), (applied, new_total));
}

pub fn recalib_event(env: &Env, rate: i128, total_staked: i128, total_supply: i128) {
    env.events().publish(
        (symbol_short!("recalib"),),
        (rate, total_staked, total_supply),
    );
}

pub fn fee_out_event(env: &Env, treasury: Address, amount: i128) {
    env.events()
        .publish((symbol_short!("fee_out"),), (treasury, amount));
}

pub fn paused_event(env: &Env, paused: bool) {
    env.events().publish((symbol_short!("paused"),), paused);
}
