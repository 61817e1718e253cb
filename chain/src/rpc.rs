//! Ethereum JSON-RPC provider over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use election_types::Address;

use crate::error::ChainError;
use crate::provider::{TransactionReceipt, TransactionRequest, TxHash, WalletProvider};

/// Default timeout for a single JSON-RPC request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Provider backed by a node or wallet exposing the standard `eth_*` methods.
///
/// `eth_sendTransaction` is used for mutating calls, so the endpoint must
/// hold (or proxy to) the key of the sending account.
pub struct JsonRpcProvider {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Receipt as returned by `eth_getTransactionReceipt`; quantities are hex strings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: String,
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    gas_used: Option<String>,
    /// Absent on pre-Byzantium chains.
    #[serde(default)]
    status: Option<String>,
}

impl JsonRpcProvider {
    /// Create a provider targeting `url` with default timeouts.
    pub fn new(url: impl Into<String>) -> Result<Self, ChainError> {
        Self::with_timeouts(url, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    pub fn with_timeouts(
        url: impl Into<String>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ChainError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one JSON-RPC request and deserialize its `result`.
    async fn request<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<R, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self.http.post(&self.url).json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                ChainError::Transport(format!("{method} timed out: {e}"))
            } else if e.is_connect() {
                ChainError::Transport(format!("{method} connection failed: {e}"))
            } else {
                ChainError::Transport(format!("{method} failed: {e}"))
            }
        })?;

        if !response.status().is_success() {
            return Err(ChainError::Transport(format!(
                "{method}: HTTP status {}",
                response.status()
            )));
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| ChainError::InvalidResponse(format!("{method}: {e}")))?;

        if let Some(err) = envelope.error {
            return Err(ChainError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        serde_json::from_value(envelope.result.unwrap_or(Value::Null))
            .map_err(|e| ChainError::InvalidResponse(format!("{method} result: {e}")))
    }
}

impl WalletProvider for JsonRpcProvider {
    async fn coinbase(&self) -> Result<Address, ChainError> {
        let raw: Option<String> = self.request("eth_coinbase", json!([])).await?;
        let raw = raw.ok_or(ChainError::NoAccount)?;
        let address: Address = raw.parse()?;
        if address.is_zero() {
            return Err(ChainError::NoAccount);
        }
        Ok(address)
    }

    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, ChainError> {
        let params = json!([
            { "to": to.to_hex(), "data": encode_hex(&data) },
            "latest",
        ]);
        let raw: String = self.request("eth_call", params).await?;
        decode_hex(&raw)
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<TxHash, ChainError> {
        let params = json!([{
            "from": request.from.to_hex(),
            "to": request.to.to_hex(),
            "data": encode_hex(&request.data),
        }]);
        let raw: String = self.request("eth_sendTransaction", params).await?;
        raw.parse()
    }

    async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, ChainError> {
        let raw: Option<RawReceipt> = self
            .request("eth_getTransactionReceipt", json!([hash.to_string()]))
            .await?;
        raw.map(RawReceipt::into_receipt).transpose()
    }
}

impl RawReceipt {
    fn into_receipt(self) -> Result<TransactionReceipt, ChainError> {
        Ok(TransactionReceipt {
            transaction_hash: self.transaction_hash.parse()?,
            block_number: self.block_number.as_deref().map(parse_quantity).transpose()?,
            gas_used: self.gas_used.as_deref().map(parse_quantity).transpose()?,
            status: match self.status.as_deref() {
                Some(s) => parse_quantity(s)? == 1,
                None => true,
            },
        })
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn decode_hex(s: &str) -> Result<Vec<u8>, ChainError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|e| ChainError::InvalidResponse(format!("hex data {s}: {e}")))
}

/// Parse a JSON-RPC hex quantity such as `"0x1b4"`.
fn parse_quantity(s: &str) -> Result<u64, ChainError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.is_empty() {
        return Err(ChainError::InvalidResponse(format!("empty quantity {s:?}")));
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| ChainError::InvalidResponse(format!("quantity {s}: {e}")))
}
