//! Small helpers shared by the CLI and the library: time, hex and
//! integer parsing, hash rate display, and logging setup.

use crate::config::{LogFormat, LogLevel};
use crate::{Error, Result};
use num_bigint::BigUint;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

/// Get current timestamp in seconds since Unix epoch
pub fn current_timestamp_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Render a hash rate with a metric suffix, e.g. `1.50 MH/s`
pub fn format_hash_rate(hashes_per_sec: f64) -> String {
    const SUFFIXES: [&str; 5] = ["", "K", "M", "G", "T"];
    let (rate, suffix) = SUFFIXES
        .iter()
        .enumerate()
        .map(|(exp, suffix)| (hashes_per_sec / 1000f64.powi(exp as i32), *suffix))
        .take_while(|(rate, _)| *rate >= 1.0)
        .last()
        .unwrap_or((hashes_per_sec, ""));

    format!("{:.2} {}H/s", rate, suffix)
}

/// Check that `s` holds only hex digits, optionally of an exact length
pub fn validate_hex_string(s: &str, expected_len: Option<usize>) -> Result<()> {
    match expected_len {
        Some(len) if s.len() != len => Err(Error::config(format!(
            "{} hex digits where {} are required",
            s.len(),
            len
        ))),
        _ if s.bytes().any(|b| !b.is_ascii_hexdigit()) => {
            Err(Error::config(format!("{:?} is not hexadecimal", s)))
        }
        _ => Ok(()),
    }
}

/// Parse an unsigned integer written in decimal or `0x`-prefixed hex
pub fn parse_big_uint(s: &str) -> Result<BigUint> {
    let s = s.trim();
    let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (s, 10),
    };

    let valid = !digits.is_empty()
        && digits.chars().all(|c| c.is_digit(radix));
    if !valid {
        return Err(Error::config(format!("invalid unsigned integer {:?}", s)));
    }

    BigUint::parse_bytes(digits.as_bytes(), radix)
        .ok_or_else(|| Error::config(format!("invalid unsigned integer {:?}", s)))
}

/// Initialize the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level. Logs go to stderr,
/// leaving stdout for the transfer link.
pub fn init_logging(level: LogLevel, format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(level.into()).into()));

    let json = matches!(format, LogFormat::Json);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| fmt::layer().json().with_target(false).with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_target(false).with_writer(std::io::stderr)))
        .init();
}
