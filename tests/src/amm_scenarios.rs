//! AMM flows with staked sXLM on one side of the pair.

use crate::setup::{deploy, funded_user, staker};
use protocol_common::constants::RATE_PRECISION;
use soroban_sdk::Env;

#[test]
fn test_provide_liquidity_with_staked_tokens() {
    let env = Env::default();
    let p = deploy(&env);

    // 100 XLM staked for the sXLM side; fresh XLM for the other.
    let (lp, _) = staker(&env, &p, 100_0000000);
    p.native_asset.mint(&lp, &100_0000000);

    let minted = p.amm.add_liquidity(&lp, &100_0000000, &100_0000000);
    assert!(minted > 0);
    assert_eq!(p.amm.get_reserves(), (100_0000000, 100_0000000));
    assert_eq!(p.amm.get_price(), RATE_PRECISION);
}

/// The constant-product quote at 30 bps, verified to the stroop, and the
/// invariant across the trade.
#[test]
fn test_swap_preserves_invariant_exactly() {
    let env = Env::default();
    let p = deploy(&env);
    let (lp, _) = staker(&env, &p, 100_0000000);
    p.native_asset.mint(&lp, &100_0000000);
    p.amm.add_liquidity(&lp, &100_0000000, &100_0000000);

    let trader = funded_user(&env, &p, 100_0000000);
    let (reserve_xlm, reserve_sxlm) = p.amm.get_reserves();
    let k_before = reserve_xlm * reserve_sxlm;

    // in_after_fee = 10e7 * 9970/10000; out = rs - rx*rs/(rx + in_after_fee).
    let out = p.amm.swap_xlm_to_sxlm(&trader, &10_0000000, &0);
    assert_eq!(out, 90_661_090);

    let (reserve_xlm, reserve_sxlm) = p.amm.get_reserves();
    assert!(reserve_xlm * reserve_sxlm >= k_before);
}

/// Swapped-out sXLM is the real receipt token: it can be unstaked.
#[test]
fn test_swapped_sxlm_is_redeemable() {
    let env = Env::default();
    let p = deploy(&env);
    let (lp, _) = staker(&env, &p, 500_0000000);
    p.native_asset.mint(&lp, &500_0000000);
    p.amm.add_liquidity(&lp, &500_0000000, &500_0000000);

    let trader = funded_user(&env, &p, 100_0000000);
    let out = p.amm.swap_xlm_to_sxlm(&trader, &10_0000000, &0);
    assert_eq!(p.token.balance(&trader), out);

    let result = p.staking.request_withdrawal(&trader, &out, &true);
    assert!(result.is_instant);
    assert_eq!(p.token.balance(&trader), 0);
}

#[test]
fn test_lp_round_trip_keeps_fees_in_pool() {
    let env = Env::default();
    let p = deploy(&env);
    let (lp, _) = staker(&env, &p, 500_0000000);
    p.native_asset.mint(&lp, &500_0000000);
    let minted = p.amm.add_liquidity(&lp, &500_0000000, &500_0000000);

    // Trading volume accrues fees to the reserves.
    let trader = funded_user(&env, &p, 1_000_0000000);
    for _ in 0..10 {
        let out = p.amm.swap_xlm_to_sxlm(&trader, &10_0000000, &0);
        p.amm.swap_sxlm_to_xlm(&trader, &out, &0);
    }

    // Removing all shares returns more value than went in; the locked
    // minimum stays behind.
    let (xlm_out, sxlm_out) = p.amm.remove_liquidity(&lp, &minted);
    assert!(xlm_out + sxlm_out > 500_0000000 + 500_0000000 - 10_000);
    assert!(p.amm.total_lp_supply() > 0);
    let (reserve_xlm, reserve_sxlm) = p.amm.get_reserves();
    assert!(reserve_xlm > 0);
    assert!(reserve_sxlm > 0);
}
