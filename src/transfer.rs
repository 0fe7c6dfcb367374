//! Transfer descriptors and `ton://transfer` links
//!
//! The mined message is attached to a plain transfer to the collection. The
//! descriptor carries everything a wallet needs: destination, amount in
//! nanotons, and the message as base64url bag-of-cells.

use crate::address::{Address, FriendlyFormat};
use crate::message::MessageEncoding;
use crate::{Error, Result};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use qrcode::render::unicode::Dense1x2;
use qrcode::QrCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Nanotons per TON
pub const NANO_PER_TON: u64 = 1_000_000_000;

/// Fractional digits a TON amount can carry
const NANO_DIGITS: usize = 9;

pub const DEFAULT_URI_SCHEME: &str = "ton";

/// URL-safe base64 that writes no padding and reads either form
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Destination, amount and payload of the transfer that submits a mined message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferDescriptor {
    pub destination_address: String,
    pub amount_nano: u64,
    pub payload_base64_url: String,
}

impl TransferDescriptor {
    /// Package an encoded message for `destination`
    ///
    /// The destination is written in url-safe bounceable form.
    pub fn build(encoding: &MessageEncoding, destination: &Address, amount_nano: u64) -> Result<Self> {
        let payload = encoding.to_boc()?;
        Ok(Self::from_payload(&payload, destination, amount_nano))
    }

    /// Package already serialized payload bytes
    pub fn from_payload(payload: &[u8], destination: &Address, amount_nano: u64) -> Self {
        Self {
            destination_address: destination.to_friendly(FriendlyFormat::default()),
            amount_nano,
            payload_base64_url: URL_SAFE_LENIENT.encode(payload),
        }
    }

    /// Decode the payload back into bytes
    pub fn payload(&self) -> Result<Vec<u8>> {
        URL_SAFE_LENIENT
            .decode(&self.payload_base64_url)
            .map_err(|e| Error::decode(format!("invalid base64url payload: {}", e)))
    }

    /// `<scheme>://transfer/<address>?amount=<nano>&bin=<payload>`
    pub fn to_uri(&self, scheme: &str) -> String {
        format!(
            "{}://transfer/{}?amount={}&bin={}",
            scheme, self.destination_address, self.amount_nano, self.payload_base64_url
        )
    }

    /// Render the transfer link as a QR code of unicode half blocks
    pub fn to_qr(&self, scheme: &str) -> Result<String> {
        let code = QrCode::new(self.to_uri(scheme).as_bytes())
            .map_err(|e| Error::encoding(format!("transfer link does not fit a QR code: {}", e)))?;

        Ok(code
            .render::<Dense1x2>()
            .dark_color(Dense1x2::Light)
            .light_color(Dense1x2::Dark)
            .build())
    }
}

impl fmt::Display for TransferDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri(DEFAULT_URI_SCHEME))
    }
}

/// Parse a decimal TON amount such as `"0.05"` into nanotons
pub fn parse_ton_amount(s: &str) -> Result<u64> {
    let s = s.trim();
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));

    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
        return Err(Error::config(format!("invalid TON amount {:?}", s)));
    }
    if frac.len() > NANO_DIGITS {
        return Err(Error::config(format!(
            "TON amount {:?} has more than {} fractional digits",
            s, NANO_DIGITS
        )));
    }

    let overflow = || Error::config(format!("TON amount {:?} is too large", s));
    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow())?
    };
    let frac: u64 = if frac.is_empty() {
        0
    } else {
        format!("{:0<width$}", frac, width = NANO_DIGITS)
            .parse()
            .map_err(|_| overflow())?
    };

    whole
        .checked_mul(NANO_PER_TON)
        .and_then(|nano| nano.checked_add(frac))
        .ok_or_else(overflow)
}

/// Format nanotons as a decimal TON amount
pub fn format_ton_amount(nano: u64) -> String {
    let whole = nano / NANO_PER_TON;
    let frac = nano % NANO_PER_TON;
    if frac == 0 {
        whole.to_string()
    } else {
        let frac = format!("{:0width$}", frac, width = NANO_DIGITS);
        format!("{}.{}", whole, frac.trim_end_matches('0'))
    }
}
