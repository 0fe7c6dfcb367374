//! TON NFT Giver Miner
//!
//! Proof-of-work miner for TON NFT giver collections:
//! - Reads the giver's `get_mining_data` through toncenter
//! - Searches for a nonce whose `mine` message hash is below the complexity
//! - Packages the winning message as a `ton://transfer` link for any wallet

pub mod address;
pub mod cell;
pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod message;
pub mod search;
pub mod stack;
pub mod transfer;
pub mod types;
pub mod utils;

#[cfg(test)]
mod tests_property;

pub use address::Address;
pub use config::Config;
pub use error::{Error, Result};
pub use message::MessageEncoding;
pub use search::{Attempt, Search, SearchState, Solution};
pub use transfer::TransferDescriptor;
pub use types::*;

/// Application information
pub const APP_NAME: &str = "ton-giver-miner";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
