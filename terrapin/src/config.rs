// File: terrapin/src/config.rs
//
// Fixture configuration
//
// A single YAML document configures every component of a session:
//
// ```yaml
// events:
//   timeout: 5000
// network:
//   rpc: "http://127.0.0.1:9000"
//   gas_price: 750
// transactions:
//   confirmation_delay: 200
// wallets:
//   treasury:
//     name: "Treasury"
//     balances:
//       SUI: 5000000000000
// ```
//
// Durations are expressed in milliseconds.

use std::path::Path;

use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrapinError};
use crate::events::EventListenerOptions;
use crate::network_mock::NetworkMockConfig;
use crate::transaction_builder::TransactionBuilderOptions;
use crate::wallets::{create_test_wallet, PartialWalletConfig, TestWalletConfig};

/// Environment variable pointing at a YAML configuration file
pub const CONFIG_ENV_VAR: &str = "TERRAPIN_CONFIG";

/// Configuration of a terrapin session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TerrapinConfig {
    /// Event listener options
    pub events: EventListenerOptions,
    /// Network mock options
    pub network: NetworkMockConfig,
    /// Transaction builder options
    pub transactions: TransactionBuilderOptions,
    /// Project specific wallets, completed like `create_test_wallet`
    pub wallets: IndexMap<String, PartialWalletConfig>,
}

impl TerrapinConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| TerrapinError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| TerrapinError::Config(format!("{}: {}", path.display(), e)))?;

        debug!("Loading terrapin config from {}", path.display());
        Self::from_yaml_str(&content)
    }

    /// Load the file named by `TERRAPIN_CONFIG`, or fall back to defaults
    pub fn from_env_or_default() -> Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => {
                info!("Using terrapin config from {}={}", CONFIG_ENV_VAR, path);
                Self::load_from_file(path.trim())
            }
            _ => Ok(Self::default()),
        }
    }

    /// Check values that would make fixtures unusable
    pub fn validate(&self) -> Result<()> {
        if self.network.rpc.trim().is_empty() {
            return Err(TerrapinError::Config("network.rpc must not be empty".into()));
        }

        if self.events.timeout.is_zero() {
            return Err(TerrapinError::Config("events.timeout must be positive".into()));
        }

        if self.transactions.timeout.is_zero() {
            return Err(TerrapinError::Config(
                "transactions.timeout must be positive".into(),
            ));
        }

        Ok(())
    }

    /// Build a configured custom wallet by its key
    pub fn custom_wallet(&self, key: &str) -> Option<TestWalletConfig> {
        self.wallets
            .get(key)
            .map(|partial| create_test_wallet(partial.clone()))
    }
}

/// Serde adapter storing a `Duration` as integer milliseconds
pub(crate) mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
