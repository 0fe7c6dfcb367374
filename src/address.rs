//! TON account addresses
//!
//! Parsing and formatting of standard (`addr_std`) internal addresses in both
//! the raw `workchain:hex` form and the 48-character user-friendly form.

use crate::crypto::crc16;
use crate::utils::validate_hex_string;
use crate::{Error, Result};
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const BOUNCEABLE_TAG: u8 = 0x11;
const NON_BOUNCEABLE_TAG: u8 = 0x51;
const TEST_ONLY_FLAG: u8 = 0x80;

/// Decoded length of a user-friendly address
const FRIENDLY_BYTES: usize = 36;
/// Encoded length of a user-friendly address
const FRIENDLY_CHARS: usize = 48;

/// A standard internal address: workchain plus 256-bit account id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    workchain: i8,
    account_id: [u8; 32],
}

/// Flags carried by the user-friendly representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FriendlyFormat {
    pub url_safe: bool,
    pub bounceable: bool,
    pub testnet_only: bool,
}

impl Default for FriendlyFormat {
    fn default() -> Self {
        Self {
            url_safe: true,
            bounceable: true,
            testnet_only: false,
        }
    }
}

impl Address {
    /// Create an address from its parts
    pub fn new(workchain: i8, account_id: [u8; 32]) -> Self {
        Self {
            workchain,
            account_id,
        }
    }

    pub fn workchain(&self) -> i8 {
        self.workchain
    }

    pub fn account_id(&self) -> &[u8; 32] {
        &self.account_id
    }

    /// Parse the raw `workchain:hex` form
    pub fn from_raw(s: &str) -> Result<Self> {
        let (workchain, hex_id) = s
            .split_once(':')
            .ok_or_else(|| Error::address(format!("missing workchain separator in {:?}", s)))?;

        let workchain: i8 = workchain
            .parse()
            .map_err(|e| Error::address(format!("invalid workchain {:?}: {}", workchain, e)))?;

        validate_hex_string(hex_id, Some(64))
            .map_err(|e| Error::address(format!("invalid account id: {}", e)))?;

        let mut account_id = [0u8; 32];
        hex::decode_to_slice(hex_id, &mut account_id)
            .map_err(|e| Error::address(format!("invalid account id: {}", e)))?;

        Ok(Self::new(workchain, account_id))
    }

    /// Parse the user-friendly form, returning the flags it was written with
    pub fn from_friendly(s: &str) -> Result<(Self, FriendlyFormat)> {
        if s.len() != FRIENDLY_CHARS {
            return Err(Error::address(format!(
                "expected {} characters, got {}",
                FRIENDLY_CHARS,
                s.len()
            )));
        }

        let url_safe = !s.contains(['+', '/']);
        let bytes = if url_safe {
            URL_SAFE.decode(s)
        } else {
            STANDARD.decode(s)
        }
        .map_err(|e| Error::address(format!("invalid base64: {}", e)))?;

        if bytes.len() != FRIENDLY_BYTES {
            return Err(Error::address(format!(
                "expected {} bytes, got {}",
                FRIENDLY_BYTES,
                bytes.len()
            )));
        }

        let expected = crc16(&bytes[..34]);
        let actual = u16::from_be_bytes([bytes[34], bytes[35]]);
        if expected != actual {
            return Err(Error::address(format!(
                "checksum mismatch: expected {:04x}, got {:04x}",
                expected, actual
            )));
        }

        let tag = bytes[0];
        let testnet_only = tag & TEST_ONLY_FLAG != 0;
        let bounceable = match tag & !TEST_ONLY_FLAG {
            BOUNCEABLE_TAG => true,
            NON_BOUNCEABLE_TAG => false,
            other => return Err(Error::address(format!("unknown address tag {:#04x}", other))),
        };

        let mut account_id = [0u8; 32];
        account_id.copy_from_slice(&bytes[2..34]);

        let address = Self::new(bytes[1] as i8, account_id);
        let format = FriendlyFormat {
            url_safe,
            bounceable,
            testnet_only,
        };
        Ok((address, format))
    }

    /// Format as `workchain:hex`
    pub fn to_raw(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.account_id))
    }

    /// Format as a 48-character user-friendly string
    pub fn to_friendly(&self, format: FriendlyFormat) -> String {
        let mut tag = if format.bounceable {
            BOUNCEABLE_TAG
        } else {
            NON_BOUNCEABLE_TAG
        };
        if format.testnet_only {
            tag |= TEST_ONLY_FLAG;
        }

        let mut bytes = Vec::with_capacity(FRIENDLY_BYTES);
        bytes.push(tag);
        bytes.push(self.workchain as u8);
        bytes.extend_from_slice(&self.account_id);
        let checksum = crc16(&bytes);
        bytes.extend_from_slice(&checksum.to_be_bytes());

        if format.url_safe {
            URL_SAFE.encode(&bytes)
        } else {
            STANDARD.encode(&bytes)
        }
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.contains(':') {
            Self::from_raw(s)
        } else {
            Self::from_friendly(s).map(|(address, _)| address)
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_friendly(FriendlyFormat::default()))
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::from_str(&s).map_err(serde::de::Error::custom)
    }
}
