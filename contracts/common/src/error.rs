//! Protocol error definitions.
//!
//! One numbered enum covers every contract so that error codes crossing a
//! contract boundary keep their meaning. Codes are grouped in ranges:
//! shared lifecycle/auth/arithmetic below 100, then one block of 100 per
//! module.

use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // Lifecycle (1-9)
    NotInitialized = 1,
    AlreadyInitialized = 2,

    // Authorisation (10-19)
    NotAuthorized = 10,

    // Arithmetic (20-29)
    ArithmeticOverflow = 20,
    DivisionByZero = 21,
    NegativeAmount = 22,

    // Configuration (30-39)
    InvalidConfig = 30,

    // Token (1xx)
    InsufficientBalance = 100,
    InsufficientAllowance = 101,
    AllowanceExpired = 102,

    // Staking (2xx)
    Paused = 200,
    InsufficientSxlm = 201,
    WithdrawalLocked = 202,
    NotOwner = 203,
    AlreadyClaimed = 204,
    NotFound = 205,
    BelowMinimumStake = 206,
    BufferExceeded = 207,
    NoFeesAccrued = 208,
    TooManyWithdrawals = 209,

    // Lending (3xx)
    PositionEmpty = 300,
    UnhealthyAfter = 301,
    InsufficientPoolLiquidity = 302,
    HealthyBorrower = 303,
    NothingToRepay = 304,
    InsufficientCollateral = 305,

    // AMM (4xx)
    InsufficientLiquidity = 400,
    SlippageExceeded = 401,
    InvariantViolated = 402,
    BelowMinLiquidity = 403,

    // Governance (5xx)
    InsufficientStakeToPropose = 500,
    AlreadyVoted = 501,
    VotingClosed = 502,
    VotingOpen = 503,
    QuorumNotMet = 504,
    AlreadyExecuted = 505,
    ProposalNotFound = 506,
    ProposalRejected = 507,
    NoVotingPower = 508,
}

impl Error {
    pub const fn message(&self) -> &'static str {
        match self {
            // Lifecycle
            Error::NotInitialized => "Contract not initialized",
            Error::AlreadyInitialized => "Contract already initialized",

            // Authorisation
            Error::NotAuthorized => "Required principal did not authenticate",

            // Arithmetic
            Error::ArithmeticOverflow => "Arithmetic overflow",
            Error::DivisionByZero => "Division by zero",
            Error::NegativeAmount => "Amount must be positive",

            // Configuration
            Error::InvalidConfig => "Invalid configuration parameter",

            // Token
            Error::InsufficientBalance => "Insufficient token balance",
            Error::InsufficientAllowance => "Insufficient allowance",
            Error::AllowanceExpired => "Allowance expired",

            // Staking
            Error::Paused => "Protocol is paused",
            Error::InsufficientSxlm => "Insufficient sXLM balance",
            Error::WithdrawalLocked => "Withdrawal still in cooldown",
            Error::NotOwner => "Caller does not own this record",
            Error::AlreadyClaimed => "Withdrawal already claimed",
            Error::NotFound => "Record not found",
            Error::BelowMinimumStake => "Amount below minimum stake",
            Error::BufferExceeded => "Liquidity buffer bound exceeded",
            Error::NoFeesAccrued => "No protocol fees to withdraw",
            Error::TooManyWithdrawals => "Too many open withdrawals for this account",

            // Lending
            Error::PositionEmpty => "Position has no collateral or debt",
            Error::UnhealthyAfter => "Operation would leave position unhealthy",
            Error::InsufficientPoolLiquidity => "Insufficient pool liquidity",
            Error::HealthyBorrower => "Position is healthy, cannot liquidate",
            Error::NothingToRepay => "No outstanding debt to repay",
            Error::InsufficientCollateral => "Insufficient collateral",

            // AMM
            Error::InsufficientLiquidity => "Insufficient pool liquidity",
            Error::SlippageExceeded => "Output below minimum",
            Error::InvariantViolated => "Constant-product invariant violated",
            Error::BelowMinLiquidity => "Initial liquidity below minimum",

            // Governance
            Error::InsufficientStakeToPropose => "Insufficient sXLM to create proposal",
            Error::AlreadyVoted => "Already voted on this proposal",
            Error::VotingClosed => "Voting period has ended",
            Error::VotingOpen => "Voting period not ended",
            Error::QuorumNotMet => "Quorum not met",
            Error::AlreadyExecuted => "Proposal already executed",
            Error::ProposalNotFound => "Proposal not found",
            Error::ProposalRejected => "Proposal did not pass",
            Error::NoVotingPower => "No sXLM to vote with",
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}
