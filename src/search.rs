//! Proof-of-work nonce search
//!
//! [`Search`] is a lazy iterator of attempts. Every attempt re-stamps the
//! message expiry from a [`Clock`], encodes it, and compares the cell hash
//! against the complexity. The first accepted attempt ends the sequence.
//! Rendering progress is left to whoever consumes the iterator.

use crate::address::Address;
use crate::crypto::Sha256Hasher;
use crate::message::MessageEncoding;
use crate::types::{Complexity, MineMessageParams};
use crate::utils::current_timestamp_secs;
use crate::{Error, Result};
use num_bigint::BigUint;
use std::time::{Duration, Instant};
use tracing::{debug, info, Span};

/// Seconds a mined message stays valid
pub const DEFAULT_EXPIRE_HORIZON_SECS: u64 = 300;

/// Source of the current unix time in seconds
pub trait Clock {
    fn now_secs(&self) -> u64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        current_timestamp_secs()
    }
}

/// A clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_secs(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// No attempt made yet
    Idle,
    Searching,
    /// An accepted hash was found; the sequence is over
    Found,
    /// Encoding failed; the sequence is over
    Failed,
}

/// Outcome of a single hash attempt
#[derive(Debug, Clone)]
pub struct Attempt {
    /// 1-based attempt counter
    pub number: u64,
    pub nonce: BigUint,
    pub expire: u64,
    pub hash: [u8; 32],
    /// Whether the hash is below the complexity
    pub found: bool,
}

impl Attempt {
    pub fn hash_value(&self) -> BigUint {
        BigUint::from_bytes_be(&self.hash)
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

/// The accepted message
#[derive(Debug, Clone)]
pub struct Solution {
    pub params: MineMessageParams,
    pub encoding: MessageEncoding,
    pub hash: [u8; 32],
    pub attempts: u64,
}

/// Lazy nonce search over `mine` messages for one session
#[derive(Debug)]
pub struct Search<C = SystemClock> {
    mint_to: Address,
    seed: BigUint,
    complexity: Complexity,
    nonce: BigUint,
    horizon_secs: u64,
    clock: C,
    hasher: Sha256Hasher,
    attempts: u64,
    state: SearchState,
    solution: Option<Solution>,
}

impl Search<SystemClock> {
    /// Start from nonce 0 with the default expiry horizon and the wall clock
    pub fn new(mint_to: Address, seed: BigUint, complexity: Complexity) -> Self {
        Self {
            mint_to,
            seed,
            complexity,
            nonce: BigUint::default(),
            horizon_secs: DEFAULT_EXPIRE_HORIZON_SECS,
            clock: SystemClock,
            hasher: Sha256Hasher::new(),
            attempts: 0,
            state: SearchState::Idle,
            solution: None,
        }
    }
}

impl<C: Clock> Search<C> {
    /// Replace the time source
    pub fn with_clock<D: Clock>(self, clock: D) -> Search<D> {
        Search {
            mint_to: self.mint_to,
            seed: self.seed,
            complexity: self.complexity,
            nonce: self.nonce,
            horizon_secs: self.horizon_secs,
            clock,
            hasher: self.hasher,
            attempts: self.attempts,
            state: self.state,
            solution: self.solution,
        }
    }

    /// Nonce for the first attempt
    pub fn with_initial_nonce(mut self, nonce: BigUint) -> Self {
        if self.state == SearchState::Idle {
            self.nonce = nonce;
        }
        self
    }

    pub fn with_expire_horizon(mut self, horizon_secs: u64) -> Self {
        self.horizon_secs = horizon_secs;
        self
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Attempts made so far
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn complexity(&self) -> &Complexity {
        &self.complexity
    }

    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    pub fn into_solution(self) -> Option<Solution> {
        self.solution
    }

    fn attempt(&mut self) -> Result<Attempt> {
        let params = MineMessageParams {
            expire: self.clock.now_secs().saturating_add(self.horizon_secs),
            mint_to: self.mint_to,
            nonce: self.nonce.clone(),
            seed: self.seed.clone(),
        };
        let encoding = params.encode()?;
        let hash = encoding.hash_with(&mut self.hasher);
        self.attempts += 1;

        let found = self.complexity.is_met_by(&hash);
        let attempt = Attempt {
            number: self.attempts,
            nonce: params.nonce.clone(),
            expire: params.expire,
            hash,
            found,
        };

        if found {
            info!(
                attempts = self.attempts,
                nonce = %params.nonce,
                hash = %attempt.hash_hex(),
                "Found hash below complexity"
            );
            self.state = SearchState::Found;
            self.solution = Some(Solution {
                params,
                encoding,
                hash,
                attempts: self.attempts,
            });
        } else {
            self.nonce += 1u32;
        }

        Ok(attempt)
    }

    /// Drive the search to completion
    ///
    /// `progress` sees every attempt, including the accepted one. With
    /// `max_attempts` set, gives up with `SearchExhausted` once that many
    /// attempts have been made without success.
    pub fn run<F>(mut self, max_attempts: Option<u64>, mut progress: F) -> Result<Solution>
    where
        F: FnMut(&Attempt),
    {
        loop {
            if let Some(max) = max_attempts {
                if self.attempts >= max {
                    return Err(Error::search_exhausted(self.attempts));
                }
            }

            let attempt = match self.next() {
                Some(attempt) => attempt?,
                None => return Err(Error::invalid_state("search already finished")),
            };
            progress(&attempt);

            if attempt.found {
                return self
                    .into_solution()
                    .ok_or_else(|| Error::invalid_state("accepted attempt without a solution"));
            }
        }
    }
}

impl<C: Clock> Iterator for Search<C> {
    type Item = Result<Attempt>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            SearchState::Found | SearchState::Failed => return None,
            SearchState::Idle => {
                debug!(
                    complexity = %self.complexity,
                    initial_nonce = %self.nonce,
                    horizon_secs = self.horizon_secs,
                    "Starting nonce search"
                );
                self.state = SearchState::Searching;
            }
            SearchState::Searching => {}
        }

        match self.attempt() {
            Ok(attempt) => Some(Ok(attempt)),
            Err(e) => {
                self.state = SearchState::Failed;
                Some(Err(e))
            }
        }
    }
}

/// Running statistics over consumed attempts
#[derive(Debug, Clone)]
pub struct SearchStats {
    /// Attempts seen
    pub attempts: u64,
    /// Lowest hash seen
    pub best_hash: Option<[u8; 32]>,
    started: Instant,
}

impl SearchStats {
    pub fn new() -> Self {
        Self {
            attempts: 0,
            best_hash: None,
            started: Instant::now(),
        }
    }

    pub fn record(&mut self, attempt: &Attempt) {
        self.attempts = attempt.number;
        if self.best_hash.map_or(true, |best| attempt.hash < best) {
            self.best_hash = Some(attempt.hash);
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Average hashes per second since creation
    pub fn hash_rate(&self) -> f64 {
        compute_hash_rate(self.attempts, self.elapsed())
    }
}

impl Default for SearchStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Utility function to compute hash rate over a time period
pub fn compute_hash_rate(hashes: u64, elapsed: Duration) -> f64 {
    if elapsed.as_secs_f64() > 0.0 {
        hashes as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    }
}

/// Span for a search session
pub fn search_span(mint_to: &Address) -> Span {
    tracing::info_span!("search", mint_to = %mint_to)
}
