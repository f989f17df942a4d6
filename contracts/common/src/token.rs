//! Cross-contract surface of the sXLM receipt token.
//!
//! The staking pool and governance contracts call the token through this
//! client; the standard `soroban_sdk::token::Client` is used where the
//! SEP-41 subset (transfer/balance) suffices.

use soroban_sdk::{contractclient, Address, Env};

#[contractclient(name = "ReceiptTokenClient")]
pub trait ReceiptToken {
    /// Mint `amount` to `to`. Requires the token's minter to authenticate.
    fn mint(env: Env, to: Address, amount: i128);
    /// Burn `amount` from `from`. Requires the token's minter to authenticate.
    fn burn(env: Env, from: Address, amount: i128);
    fn balance(env: Env, id: Address) -> i128;
    fn total_supply(env: Env) -> i128;
}
