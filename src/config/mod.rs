use anyhow::{anyhow, Context, Result};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::{env, fmt, path::PathBuf, str::FromStr, time::Duration};
use url::Url;
use validator::{Validate, ValidationError};

use crate::aggregator::AmountPolicy;
use crate::constants::{
    multicall3_address, DEFAULT_CHAIN_ID, DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_POLL_INTERVAL,
    DEFAULT_RPC_URL,
};

/// Which transfer strategy a run uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One Multicall3 transaction carrying every transfer.
    #[default]
    Batched,
    /// One transaction per recipient per asset, failures recorded and skipped.
    Sequential,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Batched => write!(f, "batched"),
            ExecutionMode::Sequential => write!(f, "sequential"),
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batched" | "batch" | "multicall" => Ok(Self::Batched),
            "sequential" | "single" => Ok(Self::Sequential),
            other => Err(anyhow!("unknown airdrop mode {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AirdropConfig {
    // Network configuration
    #[validate(range(min = 1))]
    pub chain_id: u64,
    #[validate(custom = "validate_rpc_url")]
    pub rpc_url: String,

    // Wallet configuration
    #[serde(skip_serializing)]
    #[validate(custom = "validate_private_key")]
    pub private_key: String,

    // Contract addresses
    #[validate(custom = "validate_address")]
    pub multicall_address: Address,

    // Execution parameters
    pub mode: ExecutionMode,
    pub amount_policy: AmountPolicy,
    #[validate(range(min = 1, max = 3600))]
    pub confirmation_timeout_secs: u64,
    #[validate(range(min = 10, max = 60000))]
    pub poll_interval_ms: u64,
    pub simulate_batch: bool,

    // CLI
    pub recipients_path: Option<PathBuf>,
    pub metrics_port: Option<u16>,
    pub debug: bool,
}

impl AirdropConfig {
    /// Load `.env` then read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let config = Self {
            chain_id: parse_or(get("CHAIN_ID"), "CHAIN_ID", DEFAULT_CHAIN_ID)?,
            rpc_url: get("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            private_key: get("PRIVATE_KEY").context("PRIVATE_KEY is required")?,
            multicall_address: parse_or(get("MULTICALL_ADDRESS"), "MULTICALL_ADDRESS", multicall3_address())?,
            mode: parse_or(get("AIRDROP_MODE"), "AIRDROP_MODE", ExecutionMode::default())?,
            amount_policy: parse_or(get("AMOUNT_POLICY"), "AMOUNT_POLICY", AmountPolicy::default())?,
            confirmation_timeout_secs: parse_or(
                get("CONFIRMATION_TIMEOUT_SECS"),
                "CONFIRMATION_TIMEOUT_SECS",
                DEFAULT_CONFIRMATION_TIMEOUT.as_secs(),
            )?,
            poll_interval_ms: parse_or(
                get("POLL_INTERVAL_MS"),
                "POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL.as_millis() as u64,
            )?,
            simulate_batch: parse_flag(get("SIMULATE_BATCH"), true),
            recipients_path: get("RECIPIENTS_CSV").map(PathBuf::from),
            metrics_port: get("METRICS_PORT")
                .map(|v| v.parse().with_context(|| format!("METRICS_PORT {v:?} is not a port")))
                .transpose()?,
            debug: parse_flag(get("DEBUG"), false),
        };

        config.validate_all()?;
        Ok(config)
    }

    pub fn validate_all(&self) -> Result<()> {
        if let Err(e) = self.validate() {
            return Err(anyhow!("Configuration validation failed: {:?}", e));
        }
        Url::parse(&self.rpc_url).with_context(|| format!("RPC_URL {:?} is not a url", self.rpc_url))?;
        Ok(())
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// JSON dump for debug logging. The private key is never serialized.
    pub fn redacted(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("<unserializable config: {e}>"))
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow!("{key} has invalid value {raw:?}: {e}")),
        None => Ok(default),
    }
}

fn parse_flag(raw: Option<String>, default: bool) -> bool {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

// Custom validators
fn validate_rpc_url(url: &str) -> Result<(), ValidationError> {
    if !url.starts_with("http://") && !url.starts_with("https://") && !url.starts_with("ws://") && !url.starts_with("wss://") {
        return Err(ValidationError::new("invalid_rpc_url"));
    }
    Ok(())
}

fn validate_private_key(key: &str) -> Result<(), ValidationError> {
    let Some(hex_part) = key.strip_prefix("0x") else {
        return Err(ValidationError::new("invalid_private_key"));
    };
    if hex_part.len() != 64 || hex::decode(hex_part).is_err() {
        return Err(ValidationError::new("invalid_private_key"));
    }
    Ok(())
}

fn validate_address(address: &Address) -> Result<(), ValidationError> {
    if address == &Address::zero() {
        return Err(ValidationError::new("zero_address"));
    }
    Ok(())
}
