pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 9 decimals numbers
pub const COIN_DECIMALS: u8 = 9;
// 1 000 000 000 MIST to represent 1 SUI
pub const MIST_PER_SUI: u64 = 10u64.pow(COIN_DECIMALS as u32);

// Native coin
pub const SUI_SYMBOL: &str = "SUI";
pub const SUI_COIN_TYPE: &str = "0x2::sui::SUI";

// Local node defaults
pub const DEFAULT_RPC_URL: &str = "http://localhost:9000";
pub const DEFAULT_CHAIN_ID: &str = "local-test";
// Milliseconds between two checkpoints on a local network
pub const DEFAULT_BLOCK_TIME_MS: u64 = 1000;
// Reference gas price in MIST
pub const DEFAULT_GAS_PRICE: u64 = 1000;
// Gas budget attached to a transaction, in MIST
pub const DEFAULT_GAS_BUDGET: u64 = 10_000_000;

// JSON-RPC methods that can be mocked by name
pub const METHOD_GET_BALANCE: &str = "sui_getBalance";
pub const METHOD_GET_TRANSACTION_BLOCK: &str = "sui_getTransactionBlock";
pub const METHOD_GET_OBJECT: &str = "sui_getObject";
pub const METHOD_GET_REFERENCE_GAS_PRICE: &str = "sui_getReferenceGasPrice";
pub const METHOD_EXECUTE_TRANSACTION_BLOCK: &str = "sui_executeTransactionBlock";
