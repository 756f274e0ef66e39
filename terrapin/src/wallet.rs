// File: terrapin/src/wallet.rs
//
// Wallet collaborator
//
// The fixtures never drive a wallet themselves. Browser automation (or any
// other harness) implements `WalletHelpers`; `SimulatedWallet` is the
// in-process implementation used when no real wallet is involved.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use parking_lot::Mutex;

use crate::error::{Result, TerrapinError};
use crate::orchestrator::{Clock, SystemClock};
use crate::wallets::TestWalletConfig;

/// Network a simulated wallet reports by default
pub const DEFAULT_NETWORK: &str = "localnet";

/// Wallet state as seen by a test
#[async_trait]
pub trait WalletHelpers: Send + Sync {
    /// Connect the wallet; already connected is not an error
    ///
    /// # Errors
    ///
    /// `Unavailable` when the wallet cannot be reached.
    async fn connect(&self) -> Result<()>;

    /// Disconnect the wallet
    async fn disconnect(&self) -> Result<()>;

    /// Connected address, `None` when disconnected or not displayed
    async fn get_address(&self) -> Result<Option<String>>;

    /// Wait until the pending transaction completes
    ///
    /// # Errors
    ///
    /// `Timeout` when it does not complete within `timeout`.
    async fn wait_for_transaction(&self, timeout: Duration) -> Result<()>;

    /// Whether a wallet is connected
    async fn is_connected(&self) -> Result<bool>;

    /// Network the wallet is on, e.g. `localnet`
    async fn get_network(&self) -> Result<Option<String>>;
}

struct SimulatedState {
    connected: bool,
    network: String,
    confirmation_latency: Duration,
    reachable: bool,
    transactions: usize,
}

/// Wallet living entirely in the test process
///
/// Transactions complete after `confirmation_latency` on the injected clock.
/// A latency above the caller's timeout yields a `Timeout` error.
#[derive(Clone)]
pub struct SimulatedWallet {
    address: String,
    preset: Option<TestWalletConfig>,
    clock: Arc<dyn Clock>,
    state: Arc<Mutex<SimulatedState>>,
}

impl SimulatedWallet {
    /// Disconnected wallet owning `address`
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            preset: None,
            clock: Arc::new(SystemClock),
            state: Arc::new(Mutex::new(SimulatedState {
                connected: false,
                network: DEFAULT_NETWORK.to_string(),
                confirmation_latency: Duration::ZERO,
                reachable: true,
                transactions: 0,
            })),
        }
    }

    /// Attach the preset this wallet stands for
    pub fn with_preset(mut self, preset: TestWalletConfig) -> Self {
        self.preset = Some(preset);
        self
    }

    /// Use `clock` for transaction latency
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Time a transaction takes to complete
    pub fn with_confirmation_latency(self, latency: Duration) -> Self {
        self.state.lock().confirmation_latency = latency;
        self
    }

    /// Preset attached to this wallet
    pub fn preset(&self) -> Option<&TestWalletConfig> {
        self.preset.as_ref()
    }

    /// Switch network
    pub fn set_network(&self, network: impl Into<String>) {
        self.state.lock().network = network.into();
    }

    /// Make every call fail with `Unavailable` until set back
    pub fn set_reachable(&self, reachable: bool) {
        self.state.lock().reachable = reachable;
    }

    /// Number of completed transactions
    pub fn transaction_count(&self) -> usize {
        self.state.lock().transactions
    }

    fn ensure_reachable(&self) -> Result<()> {
        if self.state.lock().reachable {
            Ok(())
        } else {
            Err(TerrapinError::Unavailable(format!(
                "Wallet {} is not reachable",
                self.address
            )))
        }
    }
}

#[async_trait]
impl WalletHelpers for SimulatedWallet {
    async fn connect(&self) -> Result<()> {
        self.ensure_reachable()?;

        let mut state = self.state.lock();
        if state.connected {
            info!("Wallet already connected, skipping connect()");
            return Ok(());
        }

        state.connected = true;
        info!("Wallet connected: {}", self.address);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.ensure_reachable()?;

        let mut state = self.state.lock();
        if state.connected {
            state.connected = false;
            info!("Wallet disconnected");
        }
        Ok(())
    }

    async fn get_address(&self) -> Result<Option<String>> {
        self.ensure_reachable()?;
        let connected = self.state.lock().connected;
        Ok(connected.then(|| self.address.clone()))
    }

    async fn wait_for_transaction(&self, timeout: Duration) -> Result<()> {
        self.ensure_reachable()?;

        let latency = {
            let state = self.state.lock();
            if !state.connected {
                return Err(TerrapinError::Unavailable(
                    "No wallet connected, cannot wait for a transaction".to_string(),
                ));
            }
            state.confirmation_latency
        };

        debug!("Waiting for transaction (timeout: {:?})", timeout);
        if latency > timeout {
            self.clock.sleep(timeout).await;
            return Err(TerrapinError::Timeout {
                what: "transaction".to_string(),
                timeout,
            });
        }

        self.clock.sleep(latency).await;
        self.state.lock().transactions += 1;
        debug!("Transaction completed");
        Ok(())
    }

    async fn is_connected(&self) -> Result<bool> {
        self.ensure_reachable()?;
        Ok(self.state.lock().connected)
    }

    async fn get_network(&self) -> Result<Option<String>> {
        self.ensure_reachable()?;
        Ok(Some(self.state.lock().network.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallets::get_test_wallet;

    const ADDRESS: &str = "0x7d20dcdb2bca4f508ea9613994683eb4e76e9c4ed371169677c1be02aaf0b58e";

    #[tokio::test]
    async fn test_connect_cycle() {
        let wallet = SimulatedWallet::new(ADDRESS);
        assert!(!wallet.is_connected().await.unwrap());
        assert_eq!(wallet.get_address().await.unwrap(), None);

        wallet.connect().await.unwrap();
        wallet.connect().await.unwrap();
        assert!(wallet.is_connected().await.unwrap());
        assert_eq!(wallet.get_address().await.unwrap().as_deref(), Some(ADDRESS));
        assert_eq!(wallet.get_network().await.unwrap().as_deref(), Some("localnet"));

        wallet.disconnect().await.unwrap();
        assert!(!wallet.is_connected().await.unwrap());
    }

    #[tokio::test]
    async fn test_unreachable_wallet() {
        let wallet = SimulatedWallet::new(ADDRESS);
        wallet.set_reachable(false);

        let error = wallet.connect().await.unwrap_err();
        assert!(matches!(error, TerrapinError::Unavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transaction_latency_and_timeout() {
        let wallet = SimulatedWallet::new(ADDRESS)
            .with_preset(get_test_wallet("whale").unwrap().clone())
            .with_confirmation_latency(Duration::from_secs(2));
        assert_eq!(wallet.preset().unwrap().name, "Whale");

        let error = wallet
            .wait_for_transaction(Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(error, TerrapinError::Unavailable(_)));

        wallet.connect().await.unwrap();
        let error = wallet
            .wait_for_transaction(Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(error.is_timeout());

        wallet
            .wait_for_transaction(Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(wallet.transaction_count(), 1);
    }
}
