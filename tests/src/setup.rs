//! Shared deployment harness: the full protocol wired in one host.

use governance::{Governance, GovernanceClient};
use lending::{LendingPool, LendingPoolClient};
use lp_pool::{LpPool, LpPoolClient};
use soroban_sdk::testutils::Address as _;
use soroban_sdk::token::{Client as TokenClient, StellarAssetClient};
use soroban_sdk::{Address, Env, String};
use staking_pool::{StakingPool, StakingPoolClient};
use sxlm_token::{SxlmToken, SxlmTokenClient};

pub const COOLDOWN: u32 = 100;
pub const VOTING_PERIOD: u32 = 100;
pub const QUORUM_BPS: u32 = 1000;

pub struct Protocol<'a> {
    pub admin: Address,
    pub token: SxlmTokenClient<'a>,
    pub staking: StakingPoolClient<'a>,
    pub lending: LendingPoolClient<'a>,
    pub amm: LpPoolClient<'a>,
    pub gov: GovernanceClient<'a>,
    pub native: TokenClient<'a>,
    pub native_asset: StellarAssetClient<'a>,
}

/// Deploy and initialize every contract. The staking pool is the token's
/// minter; lending starts at CF 70% / LT 80% / 5% APR; the AMM charges
/// 30 bps; governance runs a 100-ledger window at 10% quorum.
pub fn deploy(env: &Env) -> Protocol<'_> {
    env.mock_all_auths();

    let admin = Address::generate(env);
    let native_id = env
        .register_stellar_asset_contract_v2(admin.clone())
        .address();

    let token_id = env.register_contract(None, SxlmToken);
    let staking_id = env.register_contract(None, StakingPool);
    let lending_id = env.register_contract(None, LendingPool);
    let amm_id = env.register_contract(None, LpPool);
    let gov_id = env.register_contract(None, Governance);

    let token = SxlmTokenClient::new(env, &token_id);
    token.initialize(
        &admin,
        &staking_id,
        &7u32,
        &String::from_str(env, "Staked XLM"),
        &String::from_str(env, "sXLM"),
    );

    let staking = StakingPoolClient::new(env, &staking_id);
    staking.initialize(&admin, &token_id, &native_id, &COOLDOWN);

    let lending = LendingPoolClient::new(env, &lending_id);
    lending.initialize(&admin, &token_id, &native_id, &7000, &8000, &500);

    let amm = LpPoolClient::new(env, &amm_id);
    amm.initialize(&admin, &token_id, &native_id, &30);

    let gov = GovernanceClient::new(env, &gov_id);
    gov.initialize(&admin, &token_id, &VOTING_PERIOD, &QUORUM_BPS);

    Protocol {
        admin,
        token,
        staking,
        lending,
        amm,
        gov,
        native: TokenClient::new(env, &native_id),
        native_asset: StellarAssetClient::new(env, &native_id),
    }
}

/// A fresh account holding `xlm` native.
pub fn funded_user(env: &Env, p: &Protocol, xlm: i128) -> Address {
    let user = Address::generate(env);
    p.native_asset.mint(&user, &xlm);
    user
}

/// Stake through the real deposit path and return the sXLM minted.
pub fn staker(env: &Env, p: &Protocol, xlm: i128) -> (Address, i128) {
    let user = funded_user(env, p, xlm);
    let minted = p.staking.deposit(&user, &xlm);
    (user, minted)
}
