//! Core types for NFT giver mining
//!
//! The session input published by the giver contract, the per-attempt message
//! record, and the complexity threshold hashes are compared against.

use crate::address::Address;
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use std::fmt;

/// Values returned by the collection's `get_mining_data` get-method
///
/// Field order follows the contract's stack layout. A successful mint anywhere
/// changes the seed, so these are only valid for one search session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningParameters {
    pub complexity: BigUint,
    pub last_success: BigUint,
    pub seed: BigUint,
    pub target_delta: BigUint,
    pub min_cpl: BigUint,
    pub max_cpl: BigUint,
}

impl MiningParameters {
    pub fn complexity(&self) -> Complexity {
        Complexity::new(self.complexity.clone())
    }
}

/// One `mine` message: everything that goes into a single hash attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MineMessageParams {
    /// Unix seconds after which the contract rejects the message
    pub expire: u64,
    /// Wallet that receives the NFT
    pub mint_to: Address,
    pub nonce: BigUint,
    pub seed: BigUint,
}

/// Proof-of-work threshold: a hash is accepted only when strictly below it
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Complexity(BigUint);

impl Complexity {
    pub fn new(value: BigUint) -> Self {
        Self(value)
    }

    /// Threshold admitting every hash
    pub fn max() -> Self {
        Self(BigUint::from(1u8) << 256usize)
    }

    pub fn value(&self) -> &BigUint {
        &self.0
    }

    /// Check a big-endian hash against the threshold
    pub fn is_met_by(&self, hash: &[u8; 32]) -> bool {
        BigUint::from_bytes_be(hash) < self.0
    }

    /// Mean number of attempts for a uniformly distributed hash
    pub fn expected_attempts(&self) -> f64 {
        if self.0.is_zero() {
            return f64::INFINITY;
        }
        let threshold = self.0.to_f64().unwrap_or(f64::INFINITY);
        2f64.powi(256) / threshold
    }

    /// Leading zero bits every accepted hash is guaranteed to have
    pub fn leading_zero_bits(&self) -> u32 {
        if self.0.is_zero() {
            return 256;
        }
        // hash < complexity means hash <= complexity - 1
        let bound = &self.0 - 1u32;
        256u32.saturating_sub(bound.bits() as u32)
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<BigUint> for Complexity {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}
