//! sXLM Protocol Integration Tests
//!
//! End-to-end scenarios that wire all five contracts into one host: the
//! receipt token (with the staking pool as its minter), the staking pool,
//! the lending pool, the LP pool and governance, against a registered
//! Stellar asset standing in for native XLM.

#[cfg(test)]
mod setup;

#[cfg(test)]
mod staking_scenarios;

#[cfg(test)]
mod lending_scenarios;

#[cfg(test)]
mod amm_scenarios;

#[cfg(test)]
mod governance_scenarios;
