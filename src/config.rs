//! Configuration management for the NFT giver miner
//!
//! Supports configuration via command line arguments, environment variables,
//! and configuration files (YAML/JSON) with validation and defaults.
//! Command line and environment values win over file values.

use crate::address::Address;
use crate::client::{MAINNET_ENDPOINT, TESTNET_ENDPOINT};
use crate::search::DEFAULT_EXPIRE_HORIZON_SECS;
use crate::transfer::{parse_ton_amount, DEFAULT_URI_SCHEME};
use crate::utils::parse_big_uint;
use crate::{Error, Result};
use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// NFT giver collection deployed on testnet
pub const DEFAULT_COLLECTION: &str = "EQDk8N7xM5D669LC2YACrseBJtDyFqwtSPCNhRWXU7kjEptX";

/// TON network to read giver state from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Testnet,
    Mainnet,
}

impl Network {
    /// Default toncenter JSON-RPC endpoint
    pub fn endpoint(&self) -> &'static str {
        match self {
            Network::Testnet => TESTNET_ENDPOINT,
            Network::Mainnet => MAINNET_ENDPOINT,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Testnet => write!(f, "testnet"),
            Network::Mainnet => write!(f, "mainnet"),
        }
    }
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Log output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Plain,
    Json,
}

/// Complete configuration for the miner
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(
    name = "ton-giver-miner",
    version = env!("CARGO_PKG_VERSION"),
    about = "TON NFT giver miner",
    long_about = "Mines the proof-of-work message of a TON NFT giver collection and prints a ton://transfer link that submits it"
)]
pub struct Config {
    /// Print the parsed configuration and exit
    #[arg(long)]
    #[serde(default)]
    pub print_config: bool,

    /// Configuration file path (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    /// Wallet address that receives the NFT
    #[arg(short = 'w', long, env = "YOUR_WALLET_ADDRESS")]
    pub wallet: Option<String>,

    /// Network to read giver state from
    #[arg(short = 'n', long, env = "TON_NETWORK", default_value = "testnet")]
    #[serde(default = "default_network")]
    pub network: Network,

    /// toncenter JSON-RPC endpoint (default: per network)
    #[arg(long, env = "TONCENTER_ENDPOINT")]
    pub endpoint: Option<String>,

    /// toncenter API key
    #[arg(long, env = "TONCENTER_API_KEY", hide_env_values = true)]
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// NFT giver collection address
    #[arg(short = 'c', long, default_value = DEFAULT_COLLECTION)]
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Amount attached to the transfer, in TON
    #[arg(short = 'a', long, default_value = "0.05")]
    #[serde(default = "default_amount")]
    pub amount: String,

    /// Seconds a mined message stays valid
    #[arg(long, default_value = "300")]
    #[serde(default = "default_expire_horizon")]
    pub expire_horizon: u64,

    /// First nonce to try (decimal or 0x-prefixed hex)
    #[arg(long, default_value = "0")]
    #[serde(default = "default_initial_nonce")]
    pub initial_nonce: String,

    /// Give up after this many attempts
    #[arg(long)]
    pub max_attempts: Option<u64>,

    /// Attempts between progress reports
    #[arg(long, default_value = "100000")]
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,

    /// Default HTTP timeout in milliseconds
    #[arg(long, default_value = "30000")]
    #[serde(default = "default_http_timeout")]
    pub http_timeout: u64,

    /// Scheme of the printed transfer link
    #[arg(long, default_value = "ton")]
    #[serde(default = "default_uri_scheme")]
    pub uri_scheme: String,

    /// Print the transfer descriptor as JSON instead of a link
    #[arg(long)]
    #[serde(default)]
    pub json: bool,

    /// Also render the link as a terminal QR code (ignored with --json)
    #[arg(long)]
    #[serde(default)]
    pub qr: bool,

    /// Log level
    #[arg(short = 'l', long, default_value = "info")]
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, default_value = "plain")]
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from the process arguments, environment and file
    pub async fn load() -> Result<Self> {
        Self::from_matches(Self::command().get_matches()).await
    }

    /// Load configuration from explicit arguments
    pub async fn load_from<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command()
            .try_get_matches_from(args)
            .map_err(|e| Error::config(e.to_string()))?;
        Self::from_matches(matches).await
    }

    async fn from_matches(matches: ArgMatches) -> Result<Self> {
        let mut config =
            Self::from_arg_matches(&matches).map_err(|e| Error::config(e.to_string()))?;

        // Load from config file if specified
        if let Some(config_file) = config.config_file.clone() {
            let file_config = Self::load_from_file(&config_file).await?;
            config = config.merge_with_file(file_config, &matches);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    async fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;

        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&content).map_err(Error::from)
        } else {
            // Default to YAML
            serde_yaml::from_str(&content).map_err(Error::from)
        }
    }

    /// Take file values for every field not given on the command line or in the environment
    fn merge_with_file(self, file_config: Self, matches: &ArgMatches) -> Self {
        let explicit = |id: &str| {
            matches!(
                matches.value_source(id),
                Some(ValueSource::CommandLine) | Some(ValueSource::EnvVariable)
            )
        };

        let mut config = self;
        config.wallet = pick(explicit("wallet"), config.wallet, file_config.wallet);
        config.network = pick(explicit("network"), config.network, file_config.network);
        config.endpoint = pick(explicit("endpoint"), config.endpoint, file_config.endpoint);
        config.api_key = pick(explicit("api_key"), config.api_key, file_config.api_key);
        config.collection = pick(explicit("collection"), config.collection, file_config.collection);
        config.amount = pick(explicit("amount"), config.amount, file_config.amount);
        config.expire_horizon = pick(
            explicit("expire_horizon"),
            config.expire_horizon,
            file_config.expire_horizon,
        );
        config.initial_nonce = pick(
            explicit("initial_nonce"),
            config.initial_nonce,
            file_config.initial_nonce,
        );
        config.max_attempts = pick(explicit("max_attempts"), config.max_attempts, file_config.max_attempts);
        config.progress_interval = pick(
            explicit("progress_interval"),
            config.progress_interval,
            file_config.progress_interval,
        );
        config.http_timeout = pick(explicit("http_timeout"), config.http_timeout, file_config.http_timeout);
        config.uri_scheme = pick(explicit("uri_scheme"), config.uri_scheme, file_config.uri_scheme);
        config.log_level = pick(explicit("log_level"), config.log_level, file_config.log_level);
        config.log_format = pick(explicit("log_format"), config.log_format, file_config.log_format);

        config.print_config |= file_config.print_config;
        config.json |= file_config.json;
        config.qr |= file_config.qr;
        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(wallet) = &self.wallet {
            parse_address(wallet, "wallet")?;
        }
        self.collection()?;
        self.amount_nano()?;
        self.initial_nonce()?;

        if self.expire_horizon == 0 || self.expire_horizon > u32::MAX as u64 {
            return Err(Error::config(format!(
                "Expire horizon must be between 1 and {} seconds",
                u32::MAX
            )));
        }

        Url::parse(self.endpoint_url())
            .map_err(|e| Error::config(format!("Invalid endpoint URL: {}", e)))?;

        if self.progress_interval == 0 {
            return Err(Error::config("Progress interval must be greater than 0"));
        }

        if self.http_timeout == 0 {
            return Err(Error::config("HTTP timeout must be greater than 0"));
        }

        let scheme_ok = self
            .uri_scheme
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && self
                .uri_scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !scheme_ok {
            return Err(Error::config(format!("Invalid URI scheme {:?}", self.uri_scheme)));
        }

        Ok(())
    }

    /// Get the wallet that receives the NFT
    pub fn wallet(&self) -> Result<Address> {
        let wallet = self.wallet.as_deref().ok_or_else(|| {
            Error::config("Wallet address is required. Set YOUR_WALLET_ADDRESS or use --wallet")
        })?;
        parse_address(wallet, "wallet")
    }

    /// Get the giver collection address
    pub fn collection(&self) -> Result<Address> {
        parse_address(&self.collection, "collection")
    }

    /// Get transfer amount in nanotons
    pub fn amount_nano(&self) -> Result<u64> {
        parse_ton_amount(&self.amount)
    }

    /// Get the first nonce to try
    pub fn initial_nonce(&self) -> Result<BigUint> {
        let nonce = parse_big_uint(&self.initial_nonce)?;
        if nonce.bits() > 256 {
            return Err(Error::config("Initial nonce does not fit in 256 bits"));
        }
        Ok(nonce)
    }

    /// Get the JSON-RPC endpoint, falling back to the network default
    pub fn endpoint_url(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.network.endpoint())
    }

    /// Get HTTP timeout duration
    pub fn http_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.http_timeout)
    }
}

/// Parse an address, reporting failures as configuration errors
fn parse_address(s: &str, what: &str) -> Result<Address> {
    s.parse()
        .map_err(|e: Error| Error::config(format!("Invalid {} address: {}", what, e)))
}

fn pick<T>(explicit: bool, cli: T, file: T) -> T {
    if explicit {
        cli
    } else {
        file
    }
}

// Default value functions for serde
fn default_network() -> Network { Network::Testnet }
fn default_collection() -> String { DEFAULT_COLLECTION.to_string() }
fn default_amount() -> String { "0.05".to_string() }
fn default_expire_horizon() -> u64 { DEFAULT_EXPIRE_HORIZON_SECS }
fn default_initial_nonce() -> String { "0".to_string() }
fn default_progress_interval() -> u64 { 100_000 }
fn default_http_timeout() -> u64 { 30000 }
fn default_uri_scheme() -> String { DEFAULT_URI_SCHEME.to_string() }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_log_format() -> LogFormat { LogFormat::Plain }
