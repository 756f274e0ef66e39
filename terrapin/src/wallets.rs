//! Pre-configured test wallet presets
//!
//! Each preset describes a wallet profile (balances, NFTs, gas sponsorship)
//! used to seed repeatable scenarios. Balances are in the smallest unit of
//! each token: MIST for SUI (9 decimals), 6 decimals for stable coins.
//!
//! ```rust,ignore
//! let whale = get_test_wallet("whale")?;
//! assert_eq!(whale.balance("SUI"), 1_000_000_000_000_000); // 1,000,000 SUI
//! ```

use indexmap::IndexMap;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tortoise_common::config::COIN_DECIMALS;
use tortoise_common::utils::format_balance;

use crate::error::{Result, TerrapinError};

/// Name given to wallets created without one
pub const DEFAULT_WALLET_NAME: &str = "Custom Wallet";

/// NFT owned by a test wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestWalletNft {
    /// Collection name
    pub collection: String,
    /// Token ID inside the collection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Free-form attributes
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// Wallet profile used to seed a test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestWalletConfig {
    /// Nickname for easy reference
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Token symbol to amount in smallest units
    pub balances: IndexMap<String, u64>,
    /// NFTs owned by the wallet
    pub nfts: Vec<TestWalletNft>,
    /// Whether the wallet sponsors gas for others
    pub is_gas_sponsor: bool,
    /// Custom metadata
    pub metadata: Map<String, Value>,
}

impl TestWalletConfig {
    /// Balance of `token`, zero when the wallet holds none
    pub fn balance(&self, token: &str) -> u64 {
        self.balances.get(token).copied().unwrap_or(0)
    }

    /// Number of NFTs owned
    pub fn nft_count(&self) -> usize {
        self.nfts.len()
    }
}

/// Every field of a `TestWalletConfig`, all optional
///
/// Missing fields get empty defaults in `create_test_wallet`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialWalletConfig {
    /// Nickname
    pub name: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Balances
    pub balances: Option<IndexMap<String, u64>>,
    /// NFTs
    pub nfts: Option<Vec<TestWalletNft>>,
    /// Gas sponsorship flag
    pub is_gas_sponsor: Option<bool>,
    /// Metadata
    pub metadata: Option<Map<String, Value>>,
}

fn nft(collection: &str, id: Option<&str>, attributes: Value) -> TestWalletNft {
    TestWalletNft {
        collection: collection.to_string(),
        id: id.map(str::to_string),
        attributes: into_map(attributes),
    }
}

fn balances(entries: &[(&str, u64)]) -> IndexMap<String, u64> {
    entries
        .iter()
        .map(|(token, amount)| (token.to_string(), *amount))
        .collect()
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn preset(
    name: &str,
    entries: &[(&str, u64)],
    nfts: Vec<TestWalletNft>,
    is_gas_sponsor: bool,
    metadata: Value,
) -> TestWalletConfig {
    TestWalletConfig {
        name: name.to_string(),
        description: None,
        balances: balances(entries),
        nfts,
        is_gas_sponsor,
        metadata: into_map(metadata),
    }
}

lazy_static! {
    // Registry order is the order reported by `list_test_wallets`
    static ref TEST_WALLETS: IndexMap<&'static str, TestWalletConfig> = {
        let mut wallets = IndexMap::new();

        wallets.insert("whale", preset(
            "Whale",
            &[
                ("SUI", 1_000_000_000_000_000), // 1,000,000 SUI
                ("USDC", 500_000_000_000),      // 500,000 USDC
                ("USDT", 250_000_000_000),      // 250,000 USDT
            ],
            vec![
                nft("Premium Collection", Some("1"), json!({ "rarity": "legendary" })),
                nft("Premium Collection", Some("2"), json!({ "rarity": "legendary" })),
            ],
            true,
            json!({ "description": "High-balance wallet for testing large transactions" }),
        ));

        wallets.insert("normie", preset(
            "Normie",
            &[
                ("SUI", 100_000_000_000), // 100 SUI
                ("USDC", 50_000_000),     // 50 USDC
                ("USDT", 25_000_000),     // 25 USDT
            ],
            vec![nft("Common Collection", None, json!({ "rarity": "common" }))],
            false,
            json!({ "description": "Standard wallet for typical user testing" }),
        ));

        wallets.insert("degen", preset(
            "Degen",
            &[
                ("SUI", 10_000_000_000),  // 10 SUI
                ("USDC", 5_000_000_000),  // 5,000 USDC
                ("USDT", 5_000_000_000),  // 5,000 USDT
            ],
            Vec::new(),
            false,
            json!({ "description": "Active trader wallet for DeFi testing" }),
        ));

        wallets.insert("poor", preset(
            "Poor",
            &[
                ("SUI", 500_000_000), // 0.5 SUI
                ("USDC", 100_000),    // 0.1 USDC
            ],
            Vec::new(),
            false,
            json!({ "description": "Low-balance wallet for testing insufficient funds scenarios" }),
        ));

        wallets.insert("empty", preset(
            "Empty",
            &[],
            Vec::new(),
            false,
            json!({ "description": "Empty wallet for testing zero-balance states" }),
        ));

        wallets.insert("nftCollector", preset(
            "NFT Collector",
            &[
                ("SUI", 50_000_000_000),   // 50 SUI
                ("USDC", 10_000_000_000),  // 10,000 USDC
            ],
            vec![
                nft("Art Collection", Some("101"), json!({ "rarity": "rare", "artist": "Alice" })),
                nft("Art Collection", Some("102"), json!({ "rarity": "common", "artist": "Bob" })),
                nft("Gaming NFTs", Some("201"), json!({ "level": 50, "class": "warrior" })),
                nft("Gaming NFTs", Some("202"), json!({ "level": 30, "class": "mage" })),
                nft("PFP Collection", Some("301"), json!({ "trait": "laser-eyes" })),
            ],
            false,
            json!({ "description": "Wallet with diverse NFT collection for testing NFT operations" }),
        ));

        wallets.insert("gasSponsor", preset(
            "Gas Sponsor",
            &[("SUI", 10_000_000_000_000)], // 10,000 SUI
            Vec::new(),
            true,
            json!({ "description": "Gas sponsor wallet for testing sponsored transactions" }),
        ));

        wallets.insert("staker", preset(
            "Staker",
            &[
                ("SUI", 500_000_000_000),   // 500 SUI
                ("USDC", 100_000_000_000),  // 100,000 USDC
            ],
            Vec::new(),
            false,
            json!({
                "description": "Wallet with staked positions for testing staking/yield",
                "stakedSUI": 250_000_000_000u64,
                "stakedUSDC": 50_000_000_000u64,
            }),
        ));

        wallets.insert("multiToken", preset(
            "Multi-Token",
            &[
                ("SUI", 100_000_000_000),   // 100 SUI
                ("USDC", 50_000_000_000),   // 50,000 USDC
                ("USDT", 50_000_000_000),   // 50,000 USDT
                ("DAI", 25_000_000_000),    // 25,000 DAI
                ("WETH", 10_000_000_000),   // 10 WETH
                ("WBTC", 500_000_000),      // 0.5 WBTC
            ],
            Vec::new(),
            false,
            json!({ "description": "Wallet with diverse token holdings for testing multi-token operations" }),
        ));

        wallets
    };
}

/// Get a preset by name
///
/// # Errors
///
/// `NotFound` listing every preset name when `name` is unknown.
pub fn get_test_wallet(name: &str) -> Result<&'static TestWalletConfig> {
    TEST_WALLETS
        .get(name)
        .ok_or_else(|| TerrapinError::NotFound {
            name: name.to_string(),
            available: list_test_wallets()
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
}

/// Names of all presets, in registry order
pub fn list_test_wallets() -> Vec<&'static str> {
    TEST_WALLETS.keys().copied().collect()
}

/// All presets, in registry order
pub fn test_wallets() -> impl Iterator<Item = (&'static str, &'static TestWalletConfig)> {
    TEST_WALLETS.iter().map(|(name, wallet)| (*name, wallet))
}

/// Create a custom wallet, filling unset fields with empty defaults
///
/// The registry is never modified.
pub fn create_test_wallet(config: PartialWalletConfig) -> TestWalletConfig {
    TestWalletConfig {
        name: config
            .name
            .unwrap_or_else(|| DEFAULT_WALLET_NAME.to_string()),
        description: config.description,
        balances: config.balances.unwrap_or_default(),
        nfts: config.nfts.unwrap_or_default(),
        is_gas_sponsor: config.is_gas_sponsor.unwrap_or(false),
        metadata: config.metadata.unwrap_or_default(),
    }
}

/// One-line summary for logs, e.g. `Poor: 0.5 SUI, 0 USDC`
///
/// Every balance is rendered with 9 decimals.
pub fn get_wallet_summary(wallet: &TestWalletConfig) -> String {
    let balances = wallet
        .balances
        .iter()
        .map(|(token, amount)| format_balance(*amount, token, COIN_DECIMALS))
        .collect::<Vec<_>>()
        .join(", ");

    let balance_text = if balances.is_empty() {
        "No balances".to_string()
    } else {
        balances
    };

    let nft_info = match wallet.nft_count() {
        0 => String::new(),
        count => format!(", {} NFTs", count),
    };

    format!("{}: {}{}", wallet.name, balance_text, nft_info)
}
