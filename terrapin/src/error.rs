use std::time::Duration;

use thiserror::Error;

/// Failures surfaced by terrapin fixtures
///
/// Every variant reaches the caller unchanged; nothing is retried.
#[derive(Error, Debug)]
pub enum TerrapinError {
    /// Unknown preset name; carries every valid name
    #[error("Test wallet \"{name}\" not found. Available wallets: {}", .available.join(", "))]
    NotFound {
        /// Requested name
        name: String,
        /// Valid names, in registry order
        available: Vec<String>,
    },

    /// A wait exceeded its bound
    #[error("Timeout waiting for {what} after {timeout:?}")]
    Timeout {
        /// What was awaited, e.g. `event: Transfer`
        what: String,
        /// Bound that elapsed
        timeout: Duration,
    },

    /// An expected wallet or page affordance is absent
    #[error("{0}")]
    Unavailable(String),

    /// The network transport refused to install or remove a rule
    #[error("Transport error: {0:#}")]
    Transport(#[from] anyhow::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl TerrapinError {
    /// Timeout while waiting for an event of `event_type`
    pub fn event_timeout(event_type: &str, timeout: Duration) -> Self {
        Self::Timeout {
            what: format!("event: {}", event_type),
            timeout,
        }
    }

    /// Whether the error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, TerrapinError>;
