//! Decoding of get-method result stacks
//!
//! A get-method answer arrives as a list of `[type, value]` pairs. The giver's
//! `get_mining_data` returns six numbers, each a hex string such as `"0x1f"`.

use crate::types::MiningParameters;
use crate::utils::validate_hex_string;
use crate::{Error, Result};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Number of entries `get_mining_data` returns
pub const MINING_DATA_LEN: usize = 6;

const MINING_DATA_FIELDS: [&str; MINING_DATA_LEN] = [
    "complexity",
    "last_success",
    "seed",
    "target_delta",
    "min_cpl",
    "max_cpl",
];

/// One `[type, value]` pair of a get-method result stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackEntry(pub String, pub Value);

impl StackEntry {
    /// Numeric entry with a hex payload
    pub fn num(hex: impl Into<String>) -> Self {
        Self("num".to_string(), Value::String(hex.into()))
    }

    pub fn tag(&self) -> &str {
        &self.0
    }

    pub fn payload(&self) -> &Value {
        &self.1
    }
}

/// Interpret an entry's payload as a big-endian unsigned hex integer
pub fn parse_num(entry: &StackEntry) -> Result<BigUint> {
    let payload = entry
        .payload()
        .as_str()
        .ok_or_else(|| Error::decode(format!("payload is not a string: {}", entry.payload())))?;

    let digits = payload
        .strip_prefix("0x")
        .or_else(|| payload.strip_prefix("0X"))
        .unwrap_or(payload);

    if digits.is_empty() {
        return Err(Error::decode(format!("empty numeric payload {:?}", payload)));
    }
    validate_hex_string(digits, None)
        .map_err(|_| Error::decode(format!("invalid hex payload {:?}", payload)))?;

    BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| Error::decode(format!("invalid hex payload {:?}", payload)))
}

/// Decode a `get_mining_data` stack into typed parameters
///
/// Entries past the sixth are ignored.
pub fn decode_mining_data(stack: &[StackEntry]) -> Result<MiningParameters> {
    if stack.len() < MINING_DATA_LEN {
        return Err(Error::decode(format!(
            "expected {} stack entries, got {}",
            MINING_DATA_LEN,
            stack.len()
        )));
    }

    let mut values = Vec::with_capacity(MINING_DATA_LEN);
    for (entry, field) in stack.iter().zip(MINING_DATA_FIELDS) {
        if entry.tag() != "num" {
            warn!(field, tag = entry.tag(), "Unexpected stack entry type");
        }
        let value = parse_num(entry).map_err(|e| match e {
            Error::Decode { message } => Error::decode(format!("{}: {}", field, message)),
            other => other,
        })?;
        values.push(value);
    }

    let [complexity, last_success, seed, target_delta, min_cpl, max_cpl]: [BigUint; MINING_DATA_LEN] =
        values
            .try_into()
            .map_err(|_| Error::invalid_state("mining data field count changed while decoding"))?;

    Ok(MiningParameters {
        complexity,
        last_success,
        seed,
        target_delta,
        min_cpl,
        max_cpl,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn sample_stack() -> Vec<StackEntry> {
        vec![
            StackEntry::num("0x1000"),
            StackEntry::num("0x6553f0d8"),
            StackEntry::num("0x1234567890abcdef1234567890abcdef"),
            StackEntry::num("0x1e"),
            StackEntry::num("0x8"),
            StackEntry::num("0xF0"),
        ]
    }

    #[test]
    fn test_decode_field_order() {
        let params = decode_mining_data(&sample_stack()).unwrap();
        assert_eq!(params.complexity, BigUint::from(0x1000u32));
        assert_eq!(params.last_success, BigUint::from(0x6553f0d8u32));
        assert_eq!(
            params.seed,
            BigUint::parse_bytes(b"1234567890abcdef1234567890abcdef", 16).unwrap()
        );
        assert_eq!(params.target_delta, BigUint::from(30u32));
        assert_eq!(params.min_cpl, BigUint::from(8u32));
        assert_eq!(params.max_cpl, BigUint::from(240u32));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let stack = sample_stack();
        assert_eq!(
            decode_mining_data(&stack).unwrap(),
            decode_mining_data(&stack).unwrap()
        );
    }

    #[test]
    fn test_five_entries_rejected() {
        let mut stack = sample_stack();
        stack.pop();
        assert_matches!(decode_mining_data(&stack), Err(Error::Decode { .. }));
        assert_matches!(decode_mining_data(&[]), Err(Error::Decode { .. }));
    }

    #[test]
    fn test_extra_entries_ignored() {
        let mut stack = sample_stack();
        stack.push(StackEntry::num("0xdead"));
        let params = decode_mining_data(&stack).unwrap();
        assert_eq!(params.max_cpl, BigUint::from(240u32));
    }

    #[test]
    fn test_prefix_is_optional() {
        assert_eq!(parse_num(&StackEntry::num("ff")).unwrap(), BigUint::from(255u32));
        assert_eq!(parse_num(&StackEntry::num("0XFF")).unwrap(), BigUint::from(255u32));
        assert_eq!(parse_num(&StackEntry::num("0x0")).unwrap(), BigUint::from(0u32));
    }

    #[test]
    fn test_invalid_payloads() {
        assert_matches!(parse_num(&StackEntry::num("0x")), Err(Error::Decode { .. }));
        assert_matches!(parse_num(&StackEntry::num("0xzz")), Err(Error::Decode { .. }));
        assert_matches!(parse_num(&StackEntry::num("-0x1")), Err(Error::Decode { .. }));
        assert_matches!(parse_num(&StackEntry::num("0x1_0")), Err(Error::Decode { .. }));

        let not_a_string = StackEntry("num".to_string(), serde_json::json!(16));
        assert_matches!(parse_num(&not_a_string), Err(Error::Decode { .. }));
    }

    #[test]
    fn test_error_names_the_field() {
        let mut stack = sample_stack();
        stack[2] = StackEntry::num("0xnope");
        let err = decode_mining_data(&stack).unwrap_err();
        assert!(err.to_string().contains("seed"));
    }

    #[test]
    fn test_stack_from_json() {
        let json = r#"[["num","0x1"],["num","0x2"],["num","0x3"],["num","0x4"],["num","0x5"],["num","0x6"]]"#;
        let stack: Vec<StackEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(stack.len(), 6);
        assert_eq!(stack[0].tag(), "num");

        let params = decode_mining_data(&stack).unwrap();
        assert_eq!(params.seed, BigUint::from(3u32));
        assert_eq!(params.max_cpl, BigUint::from(6u32));
    }
}
