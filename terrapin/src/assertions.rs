//! Assertion helpers for wallet tests
//!
//! Each helper checks one observable fact about the wallet, the event
//! listener or the network mock and returns a descriptive error when it does
//! not hold, so tests can use `?` instead of bare `assert!`.

use anyhow::{Context, Result};

use crate::events::SuiEventListener;
use crate::network_mock::SuiNetworkMock;
use crate::wallet::WalletHelpers;
use crate::wallets::TestWalletConfig;

/// Assert that a wallet is connected
///
/// # Errors
///
/// Returns an error if the wallet cannot be queried or is disconnected.
///
/// # Example
///
/// ```rust,ignore
/// wallet.connect().await?;
/// assert_wallet_connected(&wallet).await?;
/// ```
pub async fn assert_wallet_connected<W: WalletHelpers + ?Sized>(wallet: &W) -> Result<()> {
    let connected = wallet
        .is_connected()
        .await
        .context("Failed to query wallet connection")?;

    if !connected {
        anyhow::bail!("Expected wallet to be connected");
    }

    Ok(())
}

/// Assert that no wallet is connected
pub async fn assert_wallet_disconnected<W: WalletHelpers + ?Sized>(wallet: &W) -> Result<()> {
    let connected = wallet
        .is_connected()
        .await
        .context("Failed to query wallet connection")?;

    if connected {
        anyhow::bail!("Expected wallet to NOT be connected");
    }

    Ok(())
}

/// Assert that the wallet shows an address
///
/// A `0x` followed by hex digits is required; with `expected`, the address
/// must also contain it.
///
/// # Example
///
/// ```rust,ignore
/// assert_wallet_address(&wallet, Some("0x7d20")).await?;
/// ```
pub async fn assert_wallet_address<W: WalletHelpers + ?Sized>(
    wallet: &W,
    expected: Option<&str>,
) -> Result<()> {
    let actual = wallet
        .get_address()
        .await
        .context("Failed to get wallet address")?;

    let Some(address) = actual.filter(|a| is_hex_address(a)) else {
        anyhow::bail!(
            "Expected wallet address {}, but found: none",
            expected.unwrap_or("(any)")
        );
    };

    if let Some(expected) = expected {
        if !address.contains(expected) {
            anyhow::bail!(
                "Expected wallet address {}, but found: {}",
                expected,
                address
            );
        }
    }

    Ok(())
}

fn is_hex_address(address: &str) -> bool {
    address
        .strip_prefix("0x")
        .is_some_and(|hex| !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Assert that the wallet is on `expected` (case-insensitive)
pub async fn assert_wallet_network<W: WalletHelpers + ?Sized>(
    wallet: &W,
    expected: &str,
) -> Result<()> {
    let network = wallet
        .get_network()
        .await
        .context("Failed to get wallet network")?;

    match network {
        Some(network) if network.to_lowercase().contains(&expected.to_lowercase()) => Ok(()),
        Some(network) => anyhow::bail!(
            "Expected network: {}, but found: {}",
            expected,
            network
        ),
        None => anyhow::bail!("Expected network: {}, but found: not displayed", expected),
    }
}

/// Assert that a preset holds exactly `expected` of `token`
pub fn assert_preset_balance(wallet: &TestWalletConfig, token: &str, expected: u64) -> Result<()> {
    let actual = wallet.balance(token);
    if actual != expected {
        anyhow::bail!(
            "Balance mismatch for {} {}: expected {}, got {}",
            wallet.name,
            token,
            expected,
            actual
        );
    }

    Ok(())
}

/// Assert that at least one event of `event_type` was emitted
pub fn assert_event_emitted(listener: &SuiEventListener, event_type: &str) -> Result<()> {
    if !listener.has_event(event_type) {
        anyhow::bail!(
            "Expected event {} to be emitted, got {} events of other types",
            event_type,
            listener.get_event_count(None)
        );
    }

    Ok(())
}

/// Assert the exact number of events of `event_type`
pub fn assert_event_count(
    listener: &SuiEventListener,
    event_type: &str,
    expected: usize,
) -> Result<()> {
    let actual = listener.get_event_count(Some(event_type));
    if actual != expected {
        anyhow::bail!(
            "Event count mismatch for {}: expected {}, got {}",
            event_type,
            expected,
            actual
        );
    }

    Ok(())
}

/// Assert that `method` went through the network mock
pub fn assert_method_called(mock: &SuiNetworkMock, method: &str) -> Result<()> {
    if !mock.was_method_called(method) {
        anyhow::bail!("Expected RPC method {} to be called", method);
    }

    Ok(())
}

/// Assert the exact number of calls to `method`
pub fn assert_call_count(mock: &SuiNetworkMock, method: &str, expected: usize) -> Result<()> {
    let actual = mock.get_call_count(method);
    if actual != expected {
        anyhow::bail!(
            "Call count mismatch for {}: expected {}, got {}",
            method,
            expected,
            actual
        );
    }

    Ok(())
}
