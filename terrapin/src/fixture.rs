// File: terrapin/src/fixture.rs
//
// Per-test fixture
//
// Bundles the listener, the network mock and the transaction builder of one
// test, all built from a single `TerrapinConfig` and sharing one clock and
// RNG. `teardown` undoes what the test left behind.

use std::sync::Arc;

use log::{debug, warn};

use crate::config::TerrapinConfig;
use crate::error::Result;
use crate::events::SuiEventListener;
use crate::network_mock::{InMemoryTransport, RouteTransport, SuiNetworkMock};
use crate::orchestrator::DeterministicTestEnv;
use crate::transaction_builder::TransactionBuilder;
use crate::wallet::{SimulatedWallet, WalletHelpers};
use crate::wallets::{get_test_wallet, TestWalletConfig};

/// Everything a wallet test needs
pub struct TerrapinFixture {
    config: TerrapinConfig,
    env: DeterministicTestEnv,
    wallet: Arc<dyn WalletHelpers>,
    /// Event bus of the test
    pub events: SuiEventListener,
    /// Network mock of the test
    pub network: SuiNetworkMock,
    /// Transaction builder waiting on the fixture wallet
    pub transactions: TransactionBuilder,
}

impl TerrapinFixture {
    /// Fixture routing through `transport` and waiting on `wallet`
    pub fn new(
        config: TerrapinConfig,
        transport: Arc<dyn RouteTransport>,
        wallet: Arc<dyn WalletHelpers>,
        env: DeterministicTestEnv,
    ) -> Self {
        debug!("Creating terrapin fixture (seed: 0x{:016x})", env.seed());

        let events = SuiEventListener::new(config.events.clone());
        let network = SuiNetworkMock::new(transport, config.network.clone())
            .with_clock(env.clock.clone());
        let transactions = TransactionBuilder::new(wallet.clone(), config.transactions.clone())
            .with_env(&env);

        Self {
            config,
            env,
            wallet,
            events,
            network,
            transactions,
        }
    }

    /// Fixture running fully in process: an in-memory transport and a
    /// simulated wallet standing for `wallet_name`
    ///
    /// `wallet_name` is looked up in the configured custom wallets first,
    /// then in the presets.
    ///
    /// # Errors
    ///
    /// `NotFound` when neither knows `wallet_name`.
    pub fn simulated(
        config: TerrapinConfig,
        wallet_name: &str,
        env: DeterministicTestEnv,
    ) -> Result<(Self, InMemoryTransport)> {
        let preset = resolve_wallet(&config, wallet_name)?;
        let address = format!("0x{}", env.rng.gen_hex(32));

        let wallet = SimulatedWallet::new(address)
            .with_preset(preset)
            .with_clock(env.clock.clone());
        let transport = InMemoryTransport::new();

        let fixture = Self::new(config, Arc::new(transport.clone()), Arc::new(wallet), env);
        Ok((fixture, transport))
    }

    /// Configuration the fixture was built from
    pub fn config(&self) -> &TerrapinConfig {
        &self.config
    }

    /// Clock and RNG shared by the components
    pub fn env(&self) -> &DeterministicTestEnv {
        &self.env
    }

    /// Wallet of the test
    pub fn wallet(&self) -> &Arc<dyn WalletHelpers> {
        &self.wallet
    }

    /// Disable network mocking and disconnect the wallet if still connected
    ///
    /// Failures are logged as warnings, never returned.
    pub async fn teardown(&self) {
        if let Err(e) = self.network.disable().await {
            warn!("Failed to disable network mocking during teardown: {}", e);
        }

        match self.wallet.is_connected().await {
            Ok(true) => {
                if let Err(e) = self.wallet.disconnect().await {
                    warn!("Failed to disconnect wallet during teardown: {}", e);
                }
            }
            Ok(false) => {}
            Err(e) => warn!("Failed to query wallet during teardown: {}", e),
        }

        debug!("Terrapin fixture torn down");
    }
}

/// Custom wallet from `config`, or the preset named `name`
pub fn resolve_wallet(config: &TerrapinConfig, name: &str) -> Result<TestWalletConfig> {
    if let Some(wallet) = config.custom_wallet(name) {
        return Ok(wallet);
    }

    get_test_wallet(name).cloned()
}
