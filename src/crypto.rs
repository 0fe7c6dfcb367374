//! Cryptographic utilities for mining
//!
//! SHA-256 hashing for cell representation hashes, plus the two checksums
//! TON uses in its serialization formats: CRC32-C for bag-of-cells and
//! CRC16-XMODEM for user-friendly addresses.

use sha2::{Digest, Sha256};
use std::fmt;

/// Reusable SHA-256 hasher for mining operations
pub struct Sha256Hasher {
    hasher: Sha256,
}

impl Sha256Hasher {
    /// Create a new SHA-256 hasher
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    /// Hash data and return the result
    pub fn hash(&mut self, data: &[u8]) -> [u8; 32] {
        self.hasher.update(data);
        self.hasher.finalize_reset().into()
    }

    /// Hash the concatenation of several slices without copying them together
    pub fn hash_parts(&mut self, parts: &[&[u8]]) -> [u8; 32] {
        for part in parts {
            self.hasher.update(part);
        }
        self.hasher.finalize_reset().into()
    }
}

impl fmt::Debug for Sha256Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sha256Hasher").finish_non_exhaustive()
    }
}

impl Default for Sha256Hasher {
    fn default() -> Self {
        Self::new()
    }
}

const CRC32C_POLY: u32 = 0x82F6_3B78;
const CRC16_POLY: u16 = 0x1021;

/// CRC32-C (Castagnoli), reflected, as used by the bag-of-cells trailer
pub fn crc32c(data: &[u8]) -> u32 {
    let mut crc = !0u32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ CRC32C_POLY
            } else {
                crc >> 1
            };
        }
    }
    !crc
}

/// CRC16-XMODEM, as used by user-friendly addresses
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0u16;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ CRC16_POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}
