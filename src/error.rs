//! Error handling for the NFT giver miner
//!
//! A single error type covers stack decoding, message encoding, address
//! parsing, node communication and the bounded search escape hatch.

use thiserror::Error;

/// Result type alias for miner operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the NFT giver miner
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Malformed or incomplete mining data stack
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// A field does not fit the message layout
    #[error("Encoding error: {message}")]
    Encoding { message: String },

    /// Address parsing errors
    #[error("Invalid address: {message}")]
    Address { message: String },

    /// Remote node returned an unusable answer
    #[error("Node error: {message}")]
    Node { message: String },

    /// Caller-supplied attempt ceiling reached without a solution
    #[error("Search exhausted after {attempts} attempts")]
    SearchExhausted { attempts: u64 },

    /// Invalid state errors
    #[error("Invalid state: {message}")]
    InvalidState { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an encoding error
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Create an address error
    pub fn address(message: impl Into<String>) -> Self {
        Self::Address {
            message: message.into(),
        }
    }

    /// Create a node error
    pub fn node(message: impl Into<String>) -> Self {
        Self::Node {
            message: message.into(),
        }
    }

    /// Create a search exhausted error
    pub fn search_exhausted(attempts: u64) -> Self {
        Self::SearchExhausted { attempts }
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::Http(_) => "http",
            Error::Json(_) => "json",
            Error::Yaml(_) => "yaml",
            Error::Io(_) => "io",
            Error::Config { .. } => "config",
            Error::Decode { .. } => "decode",
            Error::Encoding { .. } => "encoding",
            Error::Address { .. } => "address",
            Error::Node { .. } => "node",
            Error::SearchExhausted { .. } => "search_exhausted",
            Error::InvalidState { .. } => "invalid_state",
        }
    }
}
