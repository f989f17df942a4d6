//! Governance over real staked balances, ending in a parameter change
//! applied to the staking pool.

use crate::setup::{deploy, staker, QUORUM_BPS, VOTING_PERIOD};
use protocol_common::error::Error;
use soroban_sdk::testutils::Ledger;
use soroban_sdk::{Env, String};

/// Quorum met, majority for: the proposal executes once and writes the
/// parameter store; the forwarder then applies it on the target module.
#[test]
fn test_parameter_change_end_to_end() {
    let env = Env::default();
    let p = deploy(&env);

    // Stake 1:1 so voting weights equal the XLM staked.
    let (proposer, _) = staker(&env, &p, 100_0000000);
    let (for_voter, _) = staker(&env, &p, 60_0000000);
    let (against_voter, _) = staker(&env, &p, 50_0000000);

    assert_eq!(p.gov.get_quorum_bps(), QUORUM_BPS);

    let key = String::from_str(&env, "protocol_fee_bps");
    let id = p
        .gov
        .create_proposal(&proposer, &key, &String::from_str(&env, "500"));

    p.gov.vote(&for_voter, &id, &true);
    p.gov.vote(&against_voter, &id, &false);
    assert_eq!(p.gov.get_vote_count(&id), (60_0000000, 50_0000000));

    // Supply 210 sXLM, quorum 10% = 21; turnout 110 passes it.
    env.ledger().with_mut(|li| {
        li.sequence_number += VOTING_PERIOD + 1;
    });
    p.gov.execute_proposal(&id);
    assert_eq!(p.gov.get_param(&key), String::from_str(&env, "500"));

    // Executed is terminal.
    assert_eq!(
        p.gov.try_execute_proposal(&id),
        Err(Ok(Error::AlreadyExecuted))
    );

    // The forwarder relays the approved value into the staking pool.
    p.staking.set_protocol_fee_bps(&500);
    assert_eq!(p.staking.protocol_fee_bps(), 500);
}

#[test]
fn test_stake_size_drives_voting_weight() {
    let env = Env::default();
    let p = deploy(&env);

    let (whale, _) = staker(&env, &p, 1_000_0000000);
    let (minnow, _) = staker(&env, &p, 100_0000000);

    let id = p.gov.create_proposal(
        &whale,
        &String::from_str(&env, "cooldown_period"),
        &String::from_str(&env, "8640"),
    );

    p.gov.vote(&whale, &id, &false);
    p.gov.vote(&minnow, &id, &true);

    env.ledger().with_mut(|li| {
        li.sequence_number += VOTING_PERIOD + 1;
    });
    // The whale's stake outweighs the minnow: rejected.
    assert_eq!(
        p.gov.try_execute_proposal(&id),
        Err(Ok(Error::ProposalRejected))
    );
}

#[test]
fn test_unstaking_before_vote_forfeits_weight() {
    let env = Env::default();
    let p = deploy(&env);

    let (proposer, _) = staker(&env, &p, 200_0000000);
    let (voter, minted) = staker(&env, &p, 50_0000000);

    let id = p.gov.create_proposal(
        &proposer,
        &String::from_str(&env, "quorum_bps"),
        &String::from_str(&env, "2000"),
    );

    // Burning the stake before voting leaves nothing to vote with.
    p.staking.request_withdrawal(&voter, &minted, &true);
    assert_eq!(
        p.gov.try_vote(&voter, &id, &true),
        Err(Ok(Error::NoVotingPower))
    );
}
