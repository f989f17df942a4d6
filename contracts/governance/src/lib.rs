//! Governance Contract
//!
//! sXLM-weighted proposals over named protocol parameters.
//!
//! ## Design
//!
//! - Proposing requires a minimum sXLM stake; voting weight is the
//!   voter's live balance at vote time. There is no checkpointing:
//!   tokens moved after a vote carry their weight to the new holder.
//! - Quorum compares the turnout to the token's live total supply at
//!   execution time.
//! - Execution writes the approved value into the on-chain parameter
//!   store and emits an event; the off-chain forwarder relays it to the
//!   target module's admin setter.

#![no_std]

use protocol_common::constants::BPS_DENOMINATOR;
use protocol_common::error::Error;
use protocol_common::math;
use protocol_common::token::ReceiptTokenClient;
use soroban_sdk::{contract, contractimpl, symbol_short, Address, BytesN, Env, String};

mod storage;


pub use storage::Proposal;

use storage::{
    extend_instance, has_voted, is_initialized, next_proposal_id, read_admin, read_param,
    read_proposal, read_quorum_bps, read_sxlm_token, read_voting_period, set_voted, write_param,
    write_proposal, DataKey,
};

/// Minimum sXLM balance to open a proposal: 100 sXLM.
const MIN_PROPOSAL_STAKE: i128 = 100_0000000;

fn require_admin(env: &Env) -> Result<Address, Error> {
    if !is_initialized(env) {
        return Err(Error::NotInitialized);
    }
    let admin = read_admin(env);
    admin.require_auth();
    Ok(admin)
}

fn sxlm_client(env: &Env) -> ReceiptTokenClient<'_> {
    ReceiptTokenClient::new(env, &read_sxlm_token(env))
}

#[contract]
pub struct Governance;

#[contractimpl]
impl Governance {
    /// Initialize the governance contract.
    pub fn initialize(
        env: Env,
        admin: Address,
        sxlm_token: Address,
        voting_period_ledgers: u32,
        quorum_bps: u32,
    ) -> Result<(), Error> {
        if is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }
        if quorum_bps > BPS_DENOMINATOR as u32 {
            return Err(Error::InvalidConfig);
        }
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::SxlmToken, &sxlm_token);
        env.storage()
            .instance()
            .set(&DataKey::VotingPeriodLedgers, &voting_period_ledgers);
        env.storage().instance().set(&DataKey::QuorumBps, &quorum_bps);
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
    // Proposals
    // ==========================================================

    /// Open a proposal to set `param_key` to `new_value`.
    pub fn create_proposal(
        env: Env,
        proposer: Address,
        param_key: String,
        new_value: String,
    ) -> Result<u64, Error> {
        proposer.require_auth();
        if !is_initialized(&env) {
            return Err(Error::NotInitialized);
        }
        extend_instance(&env);

        if sxlm_client(&env).balance(&proposer) < MIN_PROPOSAL_STAKE {
            return Err(Error::InsufficientStakeToPropose);
        }

        let id = next_proposal_id(&env);
        let current_ledger = env.ledger().sequence();
        let proposal = Proposal {
            id,
            proposer: proposer.clone(),
            param_key: param_key.clone(),
            new_value: new_value.clone(),
            votes_for: 0,
            votes_against: 0,
            start_ledger: current_ledger,
            end_ledger: current_ledger + read_voting_period(&env),
            executed: false,
        };
        write_proposal(&env, &proposal);

        env.events().publish(
            (symbol_short!("propose"),),
            (id, proposer, param_key, new_value),
        );
        Ok(id)
    }

    /// Vote on an open proposal. Weight is the voter's sXLM balance at
    /// vote time.
    pub fn vote(env: Env, voter: Address, proposal_id: u64, support: bool) -> Result<(), Error> {
        voter.require_auth();
        extend_instance(&env);

        let mut proposal = read_proposal(&env, proposal_id).ok_or(Error::ProposalNotFound)?;

        if env.ledger().sequence() > proposal.end_ledger {
            return Err(Error::VotingClosed);
        }
        if has_voted(&env, proposal_id, &voter) {
            return Err(Error::AlreadyVoted);
        }

        let weight = sxlm_client(&env).balance(&voter);
        if weight <= 0 {
            return Err(Error::NoVotingPower);
        }

        if support {
            proposal.votes_for = math::add(proposal.votes_for, weight)?;
        } else {
            proposal.votes_against = math::add(proposal.votes_against, weight)?;
        }
        set_voted(&env, proposal_id, &voter);
        write_proposal(&env, &proposal);

        env.events().publish(
            (symbol_short!("voted"),),
            (proposal_id, voter, support, weight),
        );
        Ok(())
    }

    /// Execute a passed proposal after its voting window closes.
    ///
    /// Quorum is measured against the token's live total supply.
    pub fn execute_proposal(env: Env, proposal_id: u64) -> Result<(), Error> {
        extend_instance(&env);

        let mut proposal = read_proposal(&env, proposal_id).ok_or(Error::ProposalNotFound)?;

        if proposal.executed {
            return Err(Error::AlreadyExecuted);
        }
        if env.ledger().sequence() <= proposal.end_ledger {
            return Err(Error::VotingOpen);
        }

        let total_votes = math::add(proposal.votes_for, proposal.votes_against)?;
        let total_supply = sxlm_client(&env).total_supply();
        let quorum =
            math::mul_div_floor(total_supply, read_quorum_bps(&env) as i128, BPS_DENOMINATOR)?;
        if total_votes < quorum {
            return Err(Error::QuorumNotMet);
        }
        if proposal.votes_for <= proposal.votes_against {
            return Err(Error::ProposalRejected);
        }

        write_param(&env, &proposal.param_key, &proposal.new_value);
        proposal.executed = true;
        write_proposal(&env, &proposal);

        env.events().publish(
            (symbol_short!("executed"),),
            (proposal_id, proposal.param_key, proposal.new_value),
        );
        Ok(())
    }

    // ==========================================================
    // Views
    // ==========================================================

    pub fn get_proposal(env: Env, id: u64) -> Result<Proposal, Error> {
        extend_instance(&env);
        read_proposal(&env, id).ok_or(Error::ProposalNotFound)
    }

    pub fn get_vote_count(env: Env, id: u64) -> Result<(i128, i128), Error> {
        extend_instance(&env);
        let proposal = read_proposal(&env, id).ok_or(Error::ProposalNotFound)?;
        Ok((proposal.votes_for, proposal.votes_against))
    }

    pub fn proposal_count(env: Env) -> u64 {
        extend_instance(&env);
        env.storage()
            .instance()
            .get(&DataKey::ProposalCount)
            .unwrap_or(0)
    }

    /// Read an approved parameter value; empty string when unset.
    pub fn get_param(env: Env, key: String) -> String {
        extend_instance(&env);
        read_param(&env, &key).unwrap_or(String::from_str(&env, ""))
    }

    pub fn get_voting_period(env: Env) -> u32 {
        extend_instance(&env);
        read_voting_period(&env)
    }

    pub fn get_quorum_bps(env: Env) -> u32 {
        extend_instance(&env);
        read_quorum_bps(&env)
    }

    pub fn admin(env: Env) -> Address {
        extend_instance(&env);
        read_admin(&env)
    }
}
