//! Deposit, rewards, withdrawal and slashing flows against the real
//! token wiring.

use crate::setup::{deploy, funded_user, staker, COOLDOWN};
use protocol_common::constants::RATE_PRECISION;
use protocol_common::error::Error;
use soroban_sdk::testutils::Ledger;
use soroban_sdk::Env;

/// Walks the canonical lifecycle (first depositor, rewards, second
/// depositor, instant withdrawal) asserting exact stroop amounts at
/// every step.
#[test]
fn test_protocol_lifecycle_exact_amounts() {
    let env = Env::default();
    let p = deploy(&env);
    let alice = funded_user(&env, &p, 200_0000000);
    let bob = funded_user(&env, &p, 200_0000000);
    p.native_asset.mint(&p.admin, &100_0000000);

    // First depositor: everything 1:1.
    let minted = p.staking.deposit(&alice, &100_0000000);
    assert_eq!(minted, 100_0000000);
    assert_eq!(p.staking.total_xlm_staked(), 100_0000000);
    assert_eq!(p.token.total_supply(), 100_0000000);
    assert_eq!(p.staking.get_exchange_rate(), RATE_PRECISION);

    // Rewards (10% protocol fee) lift the rate to 1.09.
    p.staking.add_rewards(&10_0000000);
    assert_eq!(p.staking.treasury_balance(), 1_0000000);
    assert_eq!(p.staking.total_xlm_staked(), 109_0000000);
    assert_eq!(p.staking.get_exchange_rate(), 10_900_000);

    // Second depositor pays 109 XLM for 100 sXLM.
    let minted = p.staking.deposit(&bob, &109_0000000);
    assert_eq!(minted, 100_0000000);
    assert_eq!(p.token.total_supply(), 200_0000000);

    // Instant withdrawal of 50 sXLM at 1.09.
    let native_before = p.native.balance(&alice);
    let result = p.staking.request_withdrawal(&alice, &50_0000000, &true);
    assert!(result.is_instant);
    assert_eq!(result.xlm_amount, 54_5000000);
    assert_eq!(p.token.balance(&alice), 50_0000000);
    assert_eq!(p.staking.total_xlm_staked(), 218_0000000 - 54_5000000);
    assert_eq!(p.native.balance(&alice), native_before + 54_5000000);

    // The receipt supply always equals the sum of holder balances.
    assert_eq!(
        p.token.total_supply(),
        p.token.balance(&alice) + p.token.balance(&bob)
    );
    // The buffer never exceeds the reserve.
    assert!(p.staking.liquidity_buffer() <= p.staking.total_xlm_staked());
}

#[test]
fn test_slashing_reaches_pending_withdrawals() {
    let env = Env::default();
    let p = deploy(&env);
    let (alice, minted) = staker(&env, &p, 100_0000000);

    // Queue a delayed withdrawal for half the stake.
    let result = p
        .staking
        .request_withdrawal(&alice, &(minted / 2), &false);
    assert_eq!(result.xlm_amount, 50_0000000);
    assert_eq!(p.staking.total_xlm_staked(), 50_0000000);

    // A 20% slash of the remaining reserve.
    p.staking.apply_slashing(&10_0000000);
    assert_eq!(p.staking.total_xlm_staked(), 40_0000000);

    // The pending claim is cut by the same fraction...
    assert_eq!(p.staking.withdrawal_payout(&result.withdrawal_id), 40_0000000);

    // ...and the rate fell for remaining holders too.
    assert_eq!(p.staking.get_exchange_rate(), 8_000_000);

    env.ledger().with_mut(|li| {
        li.sequence_number += COOLDOWN + 1;
    });
    let native_before = p.native.balance(&alice);
    assert_eq!(
        p.staking.claim_withdrawal(&alice, &result.withdrawal_id),
        40_0000000
    );
    assert_eq!(p.native.balance(&alice), native_before + 40_0000000);
}

#[test]
fn test_two_slashes_compound_on_one_claim() {
    let env = Env::default();
    let p = deploy(&env);
    let (alice, _) = staker(&env, &p, 100_0000000);

    let result = p.staking.request_withdrawal(&alice, &40_0000000, &false);
    assert_eq!(p.staking.total_xlm_staked(), 60_0000000);

    // Two successive 10% slashes: the claim carries both haircuts.
    p.staking.apply_slashing(&6_0000000);
    p.staking.apply_slashing(&5_4000000);
    assert_eq!(p.staking.slash_index(), 8_100_000);
    assert_eq!(p.staking.withdrawal_payout(&result.withdrawal_id), 32_4000000);
}

#[test]
fn test_slash_on_empty_reserve_leaves_claims_whole() {
    let env = Env::default();
    let p = deploy(&env);
    let (alice, minted) = staker(&env, &p, 100_0000000);

    let result = p.staking.request_withdrawal(&alice, &minted, &false);
    assert_eq!(result.xlm_amount, 100_0000000);
    assert_eq!(p.staking.total_xlm_staked(), 0);

    // With nothing left in the reserve there is nothing to slash; the
    // earmarked claim is untouched.
    p.staking.apply_slashing(&10_0000000);
    assert_eq!(p.staking.withdrawal_payout(&result.withdrawal_id), 100_0000000);
}

#[test]
fn test_delayed_claim_after_cooldown_roundtrip() {
    let env = Env::default();
    let p = deploy(&env);
    let (alice, minted) = staker(&env, &p, 77_0000000);

    let native_before = p.native.balance(&alice);
    let result = p.staking.request_withdrawal(&alice, &minted, &false);

    env.ledger().with_mut(|li| {
        li.sequence_number += COOLDOWN + 1;
    });
    p.staking.claim_withdrawal(&alice, &result.withdrawal_id);

    // Deposit-then-withdraw round trip is exact for a lone staker.
    assert_eq!(p.native.balance(&alice), native_before + 77_0000000);
    assert_eq!(p.token.total_supply(), 0);
}

#[test]
fn test_withdrawals_after_buffer_released_for_delegation() {
    let env = Env::default();
    let p = deploy(&env);
    let (alice, _) = staker(&env, &p, 100_0000000);

    // Delegator takes 80 XLM out of the buffer for staking.
    p.staking.release_for_delegation(&80_0000000);

    // An instant request over the buffer falls back to the queue.
    let result = p.staking.request_withdrawal(&alice, &30_0000000, &true);
    assert!(!result.is_instant);

    // A request the buffer covers settles instantly.
    let result = p.staking.request_withdrawal(&alice, &10_0000000, &true);
    assert!(result.is_instant);

    // Returning delegated funds re-enables instant service.
    p.native_asset.mint(&p.admin, &80_0000000);
    p.staking.replenish_buffer(&30_0000000);
    let result = p.staking.request_withdrawal(&alice, &30_0000000, &true);
    assert!(result.is_instant);
}

#[test]
fn test_paused_pool_still_honours_claims() {
    let env = Env::default();
    let p = deploy(&env);
    let (alice, _) = staker(&env, &p, 100_0000000);

    let result = p.staking.request_withdrawal(&alice, &20_0000000, &false);
    p.staking.pause();

    assert_eq!(
        p.staking.try_deposit(&alice, &10_0000000),
        Err(Ok(Error::Paused))
    );

    env.ledger().with_mut(|li| {
        li.sequence_number += COOLDOWN + 1;
    });
    assert_eq!(
        p.staking.claim_withdrawal(&alice, &result.withdrawal_id),
        20_0000000
    );
}
