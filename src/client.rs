//! toncenter client for reading giver state
//!
//! Talks to the toncenter v2 JSON-RPC endpoint. Only read-only get-methods are
//! needed; the mined message is sent by the user's wallet, not by this client.

use crate::address::Address;
use crate::stack::{decode_mining_data, StackEntry};
use crate::types::MiningParameters;
use crate::{Error, Result};
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

pub const TESTNET_ENDPOINT: &str = "https://testnet.toncenter.com/api/v2/jsonRPC";
pub const MAINNET_ENDPOINT: &str = "https://toncenter.com/api/v2/jsonRPC";

const API_KEY_HEADER: &str = "X-API-Key";

/// Get-method returning the giver's mining parameters
pub const GET_MINING_DATA: &str = "get_mining_data";

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Debug, Serialize)]
struct RunGetMethodParams<'a> {
    address: String,
    method: &'a str,
    stack: Vec<StackEntry>,
}

/// toncenter response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
}

/// Result of `runGetMethod`
#[derive(Debug, Clone, Deserialize)]
pub struct RunGetMethodResult {
    #[serde(default)]
    pub gas_used: Option<u64>,
    pub exit_code: i32,
    #[serde(default)]
    pub stack: Vec<StackEntry>,
}

/// toncenter JSON-RPC client
pub struct TonClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl TonClient {
    /// Create a new client for a JSON-RPC endpoint
    pub fn new(endpoint: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint.as_ref())
            .map_err(|e| Error::config(format!("Invalid endpoint URL: {}", e)))?;

        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(Error::from)?;

        Ok(Self {
            client,
            endpoint,
            api_key: None,
        })
    }

    /// Send an API key with every request
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Run a get-method without arguments and return its result stack
    #[instrument(skip(self), fields(address = %address))]
    pub async fn run_get_method(&self, address: &Address, method: &str) -> Result<Vec<StackEntry>> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "runGetMethod",
            params: RunGetMethodParams {
                address: address.to_string(),
                method,
                stack: Vec::new(),
            },
        };

        debug!("Calling {} via {}", method, self.endpoint);

        let mut builder = self.client.post(self.endpoint.clone()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }

        let response = builder.send().await.map_err(Error::from)?;
        let status = response.status();
        let body = response.text().await.map_err(Error::from)?;

        if !status.is_success() {
            return Err(Error::node(format!(
                "{} failed: HTTP {}: {}",
                method,
                status,
                body.trim()
            )));
        }

        let response: JsonRpcResponse<RunGetMethodResult> = serde_json::from_str(&body)?;
        into_stack(response, method)
    }

    /// Fetch and decode the giver's current mining parameters
    #[instrument(skip(self), fields(collection = %collection))]
    pub async fn get_mining_data(&self, collection: &Address) -> Result<MiningParameters> {
        let stack = self.run_get_method(collection, GET_MINING_DATA).await?;
        let params = decode_mining_data(&stack)?;
        info!(complexity = %params.complexity, "Fetched mining data");
        Ok(params)
    }
}

/// Unwrap a `runGetMethod` envelope into the result stack
fn into_stack(response: JsonRpcResponse<RunGetMethodResult>, method: &str) -> Result<Vec<StackEntry>> {
    if !response.ok {
        return Err(Error::node(format!(
            "{} failed: {} (code {})",
            method,
            response.error.as_deref().unwrap_or("unknown error"),
            response.code.map_or_else(|| "none".to_string(), |c| c.to_string())
        )));
    }

    let result = response
        .result
        .ok_or_else(|| Error::node(format!("{} returned no result", method)))?;

    // 0 and 1 are the TVM success codes
    if result.exit_code != 0 && result.exit_code != 1 {
        return Err(Error::node(format!(
            "{} exited with code {}",
            method, result.exit_code
        )));
    }

    debug!(
        gas_used = result.gas_used.unwrap_or_default(),
        entries = result.stack.len(),
        "{} succeeded",
        method
    );
    Ok(result.stack)
}
