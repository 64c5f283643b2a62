use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::chain::inclusion::{InclusionPoller, DEFAULT_DELAY, DEFAULT_MAX_ATTEMPTS};
use crate::chain::sender::SenderConfig;
use crate::chain::types::{BroadcastMode, GasPrice, TransactionRequest, DEFAULT_GAS_DENOM};
use crate::chain::wallet::DEFAULT_ADDRESS_PREFIX;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub node: NodeConfig,
    pub tx: TxConfig,
    #[serde(default)]
    pub inclusion: InclusionConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub rest_endpoint: String,
    pub chain_id: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxConfig {
    pub gas: u64,
    /// Decimal string, e.g. "0.000000025"
    pub gas_price: String,
    pub denom: String,
    #[serde(default)]
    pub memo: String,
    #[serde(default = "default_broadcast_mode")]
    pub broadcast_mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InclusionConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    // Note: Mnemonic should be provided via environment variable SENDER_MNEMONIC
    // Never store sensitive keys in config files!
    pub address_prefix: String,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_broadcast_mode() -> String {
    BroadcastMode::default().to_string()
}

impl Default for InclusionConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_ms: DEFAULT_DELAY.as_millis() as u64,
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            address_prefix: DEFAULT_ADDRESS_PREFIX.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let gas_price = GasPrice::default();
        Self {
            node: NodeConfig {
                rest_endpoint: "http://localhost:1317".to_string(),
                chain_id: "cosmoshub-4".to_string(),
                request_timeout_secs: default_request_timeout(),
            },
            tx: TxConfig {
                gas: 200_000,
                gas_price: gas_price.amount.to_string(),
                denom: DEFAULT_GAS_DENOM.to_string(),
                memo: String::new(),
                broadcast_mode: default_broadcast_mode(),
            },
            inclusion: InclusionConfig::default(),
            wallet: WalletConfig::default(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.node.rest_endpoint.trim().is_empty() {
            bail!("node.rest_endpoint must not be empty");
        }
        if self.node.chain_id.trim().is_empty() {
            bail!("node.chain_id must not be empty");
        }
        if self.tx.gas == 0 {
            bail!("tx.gas must be greater than zero");
        }
        if self.tx.denom.trim().is_empty() {
            bail!("tx.denom must not be empty");
        }
        if self.inclusion.max_attempts == 0 {
            bail!("inclusion.max_attempts must be greater than zero");
        }
        self.gas_price()?;
        Ok(())
    }

    pub fn gas_price(&self) -> Result<GasPrice> {
        Ok(GasPrice::parse(&self.tx.gas_price, self.tx.denom.clone())?)
    }

    pub fn poller(&self) -> InclusionPoller {
        InclusionPoller::new(
            self.inclusion.max_attempts,
            Duration::from_millis(self.inclusion.delay_ms),
        )
    }

    pub fn sender_config(&self) -> SenderConfig {
        let mut config = SenderConfig::new(self.node.rest_endpoint.clone(), self.node.chain_id.clone());
        config.broadcast_mode = BroadcastMode::from(self.tx.broadcast_mode.clone());
        config.inclusion = self.poller();
        config.request_timeout = Duration::from_secs(self.node.request_timeout_secs);
        config
    }

    /// Request carrying the configured gas, price and memo
    pub fn transaction_request(&self, messages: Vec<serde_json::Value>) -> Result<TransactionRequest> {
        let request = TransactionRequest::new(self.tx.gas, messages)?
            .with_gas_price(self.gas_price()?)
            .with_memo(self.tx.memo.clone());
        Ok(request)
    }
}
