//! Client configuration with TOML file support, and the explicit
//! configuration object every orchestrator component is built from.

use mjvs_types::Address;
use mjvs_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::OrchestratorError;

/// How often the event correlator polls for a new head.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Deadline for creation / voting-state confirmation events.
pub const DEFAULT_CREATION_TIMEOUT: Duration = Duration::from_secs(60);
/// Deadline for a decryption fulfilment event.
pub const DEFAULT_DECRYPTION_TIMEOUT: Duration = Duration::from_secs(180);
/// Deadline for the oracle's own completion signal.
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(180);

/// Settings for the `mjvs` command surface.
///
/// Can be loaded from a TOML file via [`ClientConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// JSON-RPC ledger gateway URL.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Where the deployed contract address is recorded.
    #[serde(default = "default_deployment_file")]
    pub deployment_file: PathBuf,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_creation_timeout_secs")]
    pub creation_timeout_secs: u64,

    #[serde(default = "default_decryption_timeout_secs")]
    pub decryption_timeout_secs: u64,

    #[serde(default = "default_oracle_timeout_secs")]
    pub oracle_timeout_secs: u64,

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

fn default_deployment_file() -> PathBuf {
    PathBuf::from("./mjvs-deployment.toml")
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_creation_timeout_secs() -> u64 {
    DEFAULT_CREATION_TIMEOUT.as_secs()
}

fn default_decryption_timeout_secs() -> u64 {
    DEFAULT_DECRYPTION_TIMEOUT.as_secs()
}

fn default_oracle_timeout_secs() -> u64 {
    DEFAULT_ORACLE_TIMEOUT.as_secs()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, OrchestratorError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| OrchestratorError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, OrchestratorError> {
        toml::from_str(s).map_err(|e| OrchestratorError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, OrchestratorError> {
        toml::to_string_pretty(self).map_err(|e| OrchestratorError::Config(e.to_string()))
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            creation: Duration::from_secs(self.creation_timeout_secs),
            decryption: Duration::from_secs(self.decryption_timeout_secs),
            oracle: Duration::from_secs(self.oracle_timeout_secs),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            deployment_file: default_deployment_file(),
            poll_interval_ms: default_poll_interval_ms(),
            creation_timeout_secs: default_creation_timeout_secs(),
            decryption_timeout_secs: default_decryption_timeout_secs(),
            oracle_timeout_secs: default_oracle_timeout_secs(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

/// Poll cadence and deadlines for every wait the orchestrator performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    pub poll_interval: Duration,
    pub creation: Duration,
    pub decryption: Duration,
    pub oracle: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            creation: DEFAULT_CREATION_TIMEOUT,
            decryption: DEFAULT_DECRYPTION_TIMEOUT,
            oracle: DEFAULT_ORACLE_TIMEOUT,
        }
    }
}

/// Everything an orchestrator component needs to know about where it acts
/// and as whom. Passed explicitly into every construction; read-only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub contract: Address,
    /// Identity that signs lifecycle and decryption transactions.
    pub signer: Address,
    pub timeouts: Timeouts,
}

impl OrchestratorConfig {
    pub fn new(contract: Address, signer: Address) -> Self {
        Self {
            contract,
            signer,
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}
