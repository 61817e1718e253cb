//! Client configuration with TOML file support.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use election_types::Address;
use election_utils::LogFormat;

use crate::ClientError;

/// Deployment of the election contract the client binds to by default.
pub const DEFAULT_CONTRACT: Address = Address::new([
    0x87, 0x00, 0x26, 0x9f, 0xfb, 0x81, 0xac, 0xe4, 0x78, 0x4a, 0xb2, 0x7e, 0xcf, 0x9a, 0x63,
    0x33, 0x26, 0xc4, 0x78, 0xe3,
]);

/// Configuration for an election client.
///
/// Can be loaded from a TOML file via [`ClientConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default, so an
/// empty file is a valid configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// JSON-RPC endpoint of the node or wallet.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Address of the election contract.
    #[serde(default = "default_contract_address")]
    pub contract_address: Address,

    /// Timeout for a single JSON-RPC request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout for establishing the HTTP connection, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Delay between receipt polls for a submitted transaction.
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,

    /// Candidate indices read concurrently during a scan; 1 is strictly sequential.
    #[serde(default = "default_scan_concurrency")]
    pub scan_concurrency: usize,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_contract_address() -> Address {
    DEFAULT_CONTRACT
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_receipt_poll_interval_ms() -> u64 {
    500
}

fn default_scan_concurrency() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ClientError> {
        let config: Self = toml::from_str(s).map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("ClientConfig is always serializable to TOML")
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.scan_concurrency == 0 {
            return Err(ClientError::Config(
                "scan_concurrency must be at least 1".into(),
            ));
        }
        if self.receipt_poll_interval_ms == 0 {
            return Err(ClientError::Config(
                "receipt_poll_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    /// Install the global tracing subscriber described by `log_format` and `log_level`.
    pub fn init_logging(&self) -> Result<(), ClientError> {
        election_utils::try_init_logging(self.log_format, &self.log_level)?;
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            contract_address: default_contract_address(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
            scan_concurrency: default_scan_concurrency(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}
