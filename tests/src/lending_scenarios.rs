//! Lending flows running on real staked sXLM: the rate push from the
//! staking side, borrowing, liquidation and the interest-to-rewards loop.

use crate::setup::{deploy, funded_user, staker};
use protocol_common::constants::LEDGERS_PER_YEAR;
use protocol_common::error::Error;
use soroban_sdk::testutils::Ledger;
use soroban_sdk::Env;

#[test]
fn test_borrow_against_staked_collateral() {
    let env = Env::default();
    let p = deploy(&env);
    p.native_asset.mint(&p.admin, &1_000_0000000);
    p.lending.fund_pool(&1_000_0000000);

    let (user, minted) = staker(&env, &p, 100_0000000);
    assert_eq!(minted, 100_0000000);

    p.lending.deposit_collateral(&user, &100_0000000);
    p.lending.borrow(&user, &70_0000000);

    assert_eq!(p.lending.health_factor(&user), 11_428_571);
    assert_eq!(p.native.balance(&user), 70_0000000);
    assert_eq!(p.token.balance(&user), 0);
}

/// The keeper pushes the staking rate into the lending pool; collateral
/// denominated in sXLM is worth more XLM and borrow capacity grows.
#[test]
fn test_staking_rate_flows_into_lending() {
    let env = Env::default();
    let p = deploy(&env);
    p.native_asset.mint(&p.admin, &1_000_0000000);
    p.lending.fund_pool(&1_000_0000000);

    let (user, _) = staker(&env, &p, 100_0000000);
    p.lending.deposit_collateral(&user, &100_0000000);
    assert_eq!(p.lending.max_borrow(&user), 70_0000000);

    // Rewards lift the staking rate to 1.09; the keeper mirrors it.
    p.native_asset.mint(&p.admin, &10_0000000);
    p.staking.add_rewards(&10_0000000);
    let rate = p.staking.recalibrate_rate();
    assert_eq!(rate, 10_900_000);
    p.lending.update_exchange_rate(&rate);

    assert_eq!(p.lending.get_exchange_rate(), 10_900_000);
    // 100 sXLM * 1.09 * 70% = 76.3 XLM.
    assert_eq!(p.lending.max_borrow(&user), 76_3000000);
}

/// Scenario: borrow at CF 70 / LT 80, rate drops 1.0 -> 0.7, borrower
/// becomes liquidatable; close factor 50%, 5% bonus.
#[test]
fn test_liquidation_with_real_receipt_token() {
    let env = Env::default();
    let p = deploy(&env);
    p.native_asset.mint(&p.admin, &1_000_0000000);
    p.lending.fund_pool(&1_000_0000000);
    // Interest out of the picture: the numbers below are rate-only.
    p.lending.set_borrow_rate(&0);

    let (borrower, _) = staker(&env, &p, 100_0000000);
    let liquidator = funded_user(&env, &p, 100_0000000);

    p.lending.deposit_collateral(&borrower, &100_0000000);
    p.lending.borrow(&borrower, &70_0000000);
    assert_eq!(p.lending.health_factor(&borrower), 11_428_571);

    p.lending.update_exchange_rate(&7_000_000);
    assert_eq!(p.lending.health_factor(&borrower), 8_000_000);

    p.lending.liquidate(&liquidator, &borrower);

    // Repaid 35 XLM; seized 35e7 * 1e7 * 10500 / 7e6 / 1e4 = 52.5 sXLM.
    let position = p.lending.get_position(&borrower);
    assert_eq!(position.principal, 35_0000000);
    assert_eq!(position.sxlm_collateral, 47_5000000);
    assert_eq!(p.token.balance(&liquidator), 52_5000000);

    // The seized sXLM is real: the liquidator can unstake it.
    let result = p.staking.request_withdrawal(&liquidator, &52_5000000, &true);
    assert!(result.is_instant);
}

/// Keeper loop: harvested lending interest is pushed back into staking
/// rewards, lifting the exchange rate for all sXLM holders.
#[test]
fn test_interest_harvest_feeds_staking_rewards() {
    let env = Env::default();
    let p = deploy(&env);
    p.native_asset.mint(&p.admin, &10_000_0000000);
    p.lending.fund_pool(&10_000_0000000);

    let (user, _) = staker(&env, &p, 1_000_0000000);
    p.lending.deposit_collateral(&user, &1_000_0000000);
    p.lending.borrow(&user, &500_0000000);

    env.ledger().with_mut(|li| {
        li.sequence_number += LEDGERS_PER_YEAR as u32;
    });

    // One year at 5%: 25 XLM owed on top of the 500 principal.
    p.native_asset.mint(&user, &25_0000000);
    p.lending.repay(&user, &525_0000000);

    let harvested = p.lending.harvest_interest();
    assert_eq!(harvested, 25_0000000);

    let rate_before = p.staking.get_exchange_rate();
    p.staking.add_rewards(&harvested);
    assert!(p.staking.get_exchange_rate() > rate_before);
}

#[test]
fn test_collateral_withdrawal_blocked_while_borrowed() {
    let env = Env::default();
    let p = deploy(&env);
    p.native_asset.mint(&p.admin, &1_000_0000000);
    p.lending.fund_pool(&1_000_0000000);
    p.lending.set_borrow_rate(&0);

    let (user, _) = staker(&env, &p, 100_0000000);
    p.lending.deposit_collateral(&user, &100_0000000);
    p.lending.borrow(&user, &80_0000000); // exactly at the LT bound

    assert_eq!(
        p.lending.try_withdraw_collateral(&user, &1),
        Err(Ok(Error::UnhealthyAfter))
    );

    // After repaying, the collateral is free again.
    p.lending.repay(&user, &80_0000000);
    p.lending.withdraw_collateral(&user, &100_0000000);
    assert_eq!(p.token.balance(&user), 100_0000000);
    assert_eq!(p.lending.health_factor(&user), i128::MAX);
}
