//! TON NFT Giver Miner - Main Application
//!
//! Fetches the giver's mining data, searches for an accepted `mine` message
//! and prints the transfer that submits it.

use num_traits::ToPrimitive;
use std::time::Duration;
use ton_giver_miner::{
    client::TonClient,
    config::Config,
    search::{search_span, Search, SearchStats},
    transfer::{format_ton_amount, TransferDescriptor},
    utils::{format_hash_rate, init_logging},
    Error, Result, APP_NAME, APP_VERSION,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Variables from a local .env file, if any, feed the env-backed options
    dotenvy::dotenv().ok();

    // Load and validate configuration
    let config = Config::load().await?;
    init_logging(config.log_level, config.log_format);

    if config.print_config {
        print_configuration(&config)?;
        return Ok(());
    }

    if let Err(e) = run(config).await {
        error!(category = e.category(), "{}", e);
        return Err(e);
    }

    Ok(())
}

/// Fetch, mine, print
async fn run(config: Config) -> Result<()> {
    let wallet = config.wallet()?;
    let collection = config.collection()?;
    let amount_nano = config.amount_nano()?;

    info!("Starting {} v{}", APP_NAME, APP_VERSION);
    info!(
        network = %config.network,
        wallet = %wallet,
        collection = %collection,
        "Configuration loaded"
    );

    let client = TonClient::new(config.endpoint_url(), config.http_timeout_duration())?
        .with_api_key(config.api_key.clone());
    let mining_data = client.get_mining_data(&collection).await?;

    let complexity = mining_data.complexity();
    info!(
        complexity = %complexity,
        leading_zero_bits = complexity.leading_zero_bits(),
        expected_attempts = %format!("{:.0}", complexity.expected_attempts()),
        seed = %mining_data.seed,
        "Mining parameters"
    );
    if let Some(last_success) = mining_data
        .last_success
        .to_i64()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
    {
        info!(last_success = %last_success.to_rfc3339(), "Last successful mint");
    }

    let search = Search::new(wallet, mining_data.seed.clone(), complexity)
        .with_initial_nonce(config.initial_nonce()?)
        .with_expire_horizon(config.expire_horizon);
    let max_attempts = config.max_attempts;
    let progress_interval = config.progress_interval;
    let span = search_span(&wallet);

    let (solution, stats) = tokio::task::spawn_blocking(move || {
        let _entered = span.entered();
        let mut stats = SearchStats::new();
        let result = search.run(max_attempts, |attempt| {
            stats.record(attempt);
            if attempt.number % progress_interval == 0 {
                info!(
                    attempts = attempt.number,
                    nonce = %attempt.nonce,
                    hash = %attempt.hash_hex(),
                    rate = %format_hash_rate(stats.hash_rate()),
                    "Mining in progress"
                );
            }
        });
        result.map(|solution| (solution, stats))
    })
    .await
    .map_err(|e| Error::invalid_state(format!("search task failed: {}", e)))??;

    info!(
        attempts = solution.attempts,
        elapsed = %humantime::format_duration(Duration::from_secs(stats.elapsed().as_secs())),
        rate = %format_hash_rate(stats.hash_rate()),
        nonce = %solution.params.nonce,
        hash = %hex::encode(solution.hash),
        "Mission completed"
    );

    let descriptor = TransferDescriptor::build(&solution.encoding, &collection, amount_nano)?;

    let valid_until = i64::try_from(solution.params.expire)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map_or_else(|| solution.params.expire.to_string(), |t| t.to_rfc3339());
    warn!(
        valid_until = %valid_until,
        "Send the transfer now: the seed changes as soon as anyone mines"
    );
    info!(
        amount = %format_ton_amount(amount_nano),
        destination = %descriptor.destination_address,
        "Transfer ready"
    );

    if config.json {
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
    } else {
        println!("{}", descriptor.to_uri(&config.uri_scheme));
        if config.qr {
            println!("{}", descriptor.to_qr(&config.uri_scheme)?);
            info!("Scan the code with a wallet set to the same network");
        }
    }

    Ok(())
}

/// Print current configuration
fn print_configuration(config: &Config) -> Result<()> {
    let config_yaml = serde_yaml::to_string(config)?;
    println!("{}", config_yaml);
    Ok(())
}
