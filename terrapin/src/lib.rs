//! # Terrapin: wallet test fixtures for Sui applications
//!
//! Simulation layer used by end-to-end tests of a Sui DeFi application:
//!
//! - **wallets**: named wallet presets (whale, degen, empty, ...) and custom ones
//! - **events**: event bus with timeout-bounded waits
//! - **network_mock**: JSON-RPC response table installed at a transport boundary
//! - **transaction_builder**: step recorder simulating transaction submission
//! - **assertions**: `anyhow`-returning checks over all of the above
//! - **fixture**: one bundle per test, built from a [`TerrapinConfig`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tortoise_terrapin::prelude::*;
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_swap_emits_event() -> anyhow::Result<()> {
//!     let (mut fixture, _transport) = TerrapinFixture::simulated(
//!         TerrapinConfig::default(),
//!         "whale",
//!         DeterministicTestEnv::with_seed(42),
//!     )?;
//!
//!     fixture.network.mock_balance("0x123", 1_000_000_000, None);
//!     fixture.network.enable().await?;
//!     fixture.wallet().connect().await?;
//!
//!     fixture.transactions.transfer("0x456", 100).execute().await?;
//!     fixture.teardown().await;
//!     Ok(())
//! }
//! ```
//!
//! Durations, seeds and wallets can be configured from YAML, see [`config`].

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Per-test assertion helpers
pub mod assertions;
/// Session configuration
pub mod config;
/// Error types
pub mod error;
/// Event bus
pub mod events;
/// Per-test fixture bundle
pub mod fixture;
/// JSON-RPC network mock
pub mod network_mock;
/// Clock and RNG shared by a test session
pub mod orchestrator;
/// Transaction step recorder
pub mod transaction_builder;
/// Wallet collaborator trait and simulated wallet
pub mod wallet;
/// Wallet presets
pub mod wallets;

pub use config::TerrapinConfig;
pub use error::{Result, TerrapinError};
pub use fixture::TerrapinFixture;

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::assertions::*;
    pub use crate::config::TerrapinConfig;
    pub use crate::error::{Result, TerrapinError};
    pub use crate::events::{
        create_event_listener, EventCallback, EventEmitter, EventListenerOptions, SuiEvent,
        SuiEventListener, WaitOptions, WILDCARD,
    };
    pub use crate::fixture::TerrapinFixture;
    pub use crate::network_mock::{
        create_network_mock, InMemoryTransport, InterceptedRequest, NetworkMockConfig,
        RouteOutcome, RouteTransport, SuiNetworkMock, TransactionStatus,
    };
    pub use crate::orchestrator::{Clock, DeterministicTestEnv, PausedClock, SystemClock};
    pub use crate::transaction_builder::{
        create_transaction_builder, TransactionBuilder, TransactionBuilderOptions,
        TransactionStep,
    };
    pub use crate::wallet::{SimulatedWallet, WalletHelpers};
    pub use crate::wallets::{
        create_test_wallet, get_test_wallet, get_wallet_summary, list_test_wallets,
        PartialWalletConfig, TestWalletConfig,
    };
    pub use tortoise_common::utils::{format_balance, format_sui, mist_to_sui, sui_to_mist};

    pub use std::sync::Arc;
    pub use std::time::Duration;
}
