// File: terrapin/src/network_mock/mod.rs
//
// Network Mock
//
// Deterministic, offline answers for selected JSON-RPC methods. Calls to
// methods without a mock reach the real node unchanged.

mod interceptor;
/// Transport boundary and the in-memory transport
pub mod transport;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use log::{debug, info};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use strum::{Display, EnumString};
use tortoise_common::config::{
    DEFAULT_BLOCK_TIME_MS, DEFAULT_CHAIN_ID, DEFAULT_GAS_PRICE, DEFAULT_RPC_URL,
    METHOD_EXECUTE_TRANSACTION_BLOCK, METHOD_GET_BALANCE, METHOD_GET_OBJECT,
    METHOD_GET_REFERENCE_GAS_PRICE, METHOD_GET_TRANSACTION_BLOCK, SUI_COIN_TYPE,
};
use tortoise_common::rpc::InternalRpcError;
use tortoise_common::time::get_current_time_in_millis;

use crate::error::Result;
use crate::orchestrator::{Clock, SystemClock};
use interceptor::RpcInterceptor;

pub use interceptor::is_rpc_endpoint;
pub use transport::{
    InMemoryTransport, InterceptedRequest, MockHttpResponse, RouteDecision, RouteHandler,
    RouteOutcome, RouteTransport, CATCH_ALL_PATTERN,
};

// JSON-RPC server error code used for failed executions
const EXECUTION_FAILURE_CODE: i16 = -32000;

/// Network the mock stands in for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkMockConfig {
    /// JSON-RPC endpoint
    pub rpc: String,
    /// Chain identifier
    pub chain_id: String,
    /// Time between two checkpoints
    #[serde(with = "crate::config::millis")]
    pub block_time: Duration,
    /// Reference gas price in MIST
    pub gas_price: u64,
}

impl Default for NetworkMockConfig {
    fn default() -> Self {
        Self {
            rpc: DEFAULT_RPC_URL.to_string(),
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            block_time: Duration::from_millis(DEFAULT_BLOCK_TIME_MS),
            gas_price: DEFAULT_GAS_PRICE,
        }
    }
}

/// A registered mock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockResponse {
    /// JSON-RPC method
    pub method: String,
    /// Value returned as `result`
    pub response: Value,
}

/// A call seen by the interceptor, mocked or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterceptedCall {
    /// Target URL
    pub url: String,
    /// JSON-RPC method, absent when the body could not be parsed
    pub method: Option<String>,
    /// JSON-RPC params
    pub params: Option<Value>,
    /// Milliseconds since the unix epoch
    pub timestamp: u64,
}

/// Status reported by a mocked transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Executed
    #[default]
    Success,
    /// Aborted
    Failure,
}

pub(crate) struct MockState {
    config: NetworkMockConfig,
    mocks: IndexMap<String, Value>,
    delays: HashMap<String, Duration>,
    intercepted: Vec<InterceptedCall>,
}

/// Mock table for Sui JSON-RPC calls
///
/// Mocks can be registered before or after `enable`; the installed rule reads
/// the table on every call.
///
/// ```rust,ignore
/// let mock = create_network_mock(Arc::new(InMemoryTransport::new()), NetworkMockConfig::default());
///
/// mock.mock_balance("0x123", 1_000_000_000, None)
///     .mock_gas_price(750);
/// mock.enable().await?;
/// ```
pub struct SuiNetworkMock {
    state: Arc<Mutex<MockState>>,
    transport: Arc<dyn RouteTransport>,
    clock: Arc<dyn Clock>,
    // Serializes enable/disable across the transport await
    enabled: tokio::sync::Mutex<bool>,
}

impl SuiNetworkMock {
    /// Mock routing through `transport`, delays on the system clock
    pub fn new(transport: Arc<dyn RouteTransport>, config: NetworkMockConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                config,
                mocks: IndexMap::new(),
                delays: HashMap::new(),
                intercepted: Vec::new(),
            })),
            transport,
            clock: Arc::new(SystemClock),
            enabled: tokio::sync::Mutex::new(false),
        }
    }

    /// Use `clock` for mocked delays
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Current configuration
    pub fn config(&self) -> NetworkMockConfig {
        self.state.lock().config.clone()
    }

    /// Answer `method` with `response` as its `result`; replaces any
    /// previous mock for the method
    pub fn mock_rpc_response(&self, method: impl Into<String>, response: Value) -> &Self {
        let method = method.into();
        debug!("Mocking RPC method: {}", method);
        self.state.lock().mocks.insert(method, response);
        self
    }

    /// `sui_getBalance` answers `amount` (MIST) of `coin_type`, SUI by default
    pub fn mock_balance(&self, address: &str, amount: u64, coin_type: Option<&str>) -> &Self {
        debug!("Mocking balance of {}: {}", address, amount);
        self.mock_rpc_response(
            METHOD_GET_BALANCE,
            json!({
                "totalBalance": amount.to_string(),
                "coinType": coin_type.unwrap_or(SUI_COIN_TYPE),
                "coinObjectCount": 1,
            }),
        )
    }

    /// `sui_getTransactionBlock` answers `digest` with `status`
    pub fn mock_transaction(&self, digest: &str, status: TransactionStatus) -> &Self {
        self.mock_rpc_response(
            METHOD_GET_TRANSACTION_BLOCK,
            json!({
                "digest": digest,
                "effects": {
                    "status": { "status": status.to_string() },
                },
                "timestamp": get_current_time_in_millis(),
            }),
        )
    }

    /// `sui_getObject` answers an object owned by `owner`
    pub fn mock_object(&self, object_id: &str, owner: &str, object_type: &str) -> &Self {
        self.mock_rpc_response(
            METHOD_GET_OBJECT,
            json!({
                "objectId": object_id,
                "owner": { "AddressOwner": owner },
                "type": object_type,
            }),
        )
    }

    /// `sui_getReferenceGasPrice` answers `price`, also recorded in the config
    pub fn mock_gas_price(&self, price: u64) -> &Self {
        self.state.lock().config.gas_price = price;
        self.mock_rpc_response(METHOD_GET_REFERENCE_GAS_PRICE, json!(price))
    }

    /// `sui_executeTransactionBlock` answers an execution error
    pub fn mock_transaction_failure(&self, message: &str) -> &Self {
        let error = InternalRpcError::Custom(EXECUTION_FAILURE_CODE, message.to_string());
        self.mock_rpc_response(
            METHOD_EXECUTE_TRANSACTION_BLOCK,
            json!({ "error": error.to_error_object() }),
        )
    }

    /// Delay every mocked answer to `method` by `delay`
    ///
    /// Unmocked calls are not delayed. The delay outlives `clear_mocks`.
    pub fn mock_delay(&self, method: impl Into<String>, delay: Duration) -> &Self {
        let method = method.into();
        debug!("Delaying RPC method {} by {:?}", method, delay);
        self.state.lock().delays.insert(method, delay);
        self
    }

    /// Registered mocks, in registration order
    pub fn get_mocks(&self) -> Vec<MockResponse> {
        self.state
            .lock()
            .mocks
            .iter()
            .map(|(method, response)| MockResponse {
                method: method.clone(),
                response: response.clone(),
            })
            .collect()
    }

    /// Install the interception rule; no-op when already enabled
    ///
    /// # Errors
    ///
    /// `Transport` when the transport refuses the rule.
    pub async fn enable(&self) -> Result<()> {
        let mut enabled = self.enabled.lock().await;
        if *enabled {
            info!("Network mocking already enabled");
            return Ok(());
        }

        info!("Enabling network mocking");
        let handler = Arc::new(RpcInterceptor::new(self.state.clone(), self.clock.clone()));
        self.transport.route(CATCH_ALL_PATTERN, handler).await?;

        *enabled = true;
        info!("Network mocking enabled");
        Ok(())
    }

    /// Remove the interception rule; no-op when not enabled
    pub async fn disable(&self) -> Result<()> {
        let mut enabled = self.enabled.lock().await;
        if !*enabled {
            return Ok(());
        }

        info!("Disabling network mocking");
        self.transport.unroute(CATCH_ALL_PATTERN).await?;
        *enabled = false;
        Ok(())
    }

    /// Whether the interception rule is installed
    pub async fn is_enabled(&self) -> bool {
        *self.enabled.lock().await
    }

    /// Drop every mock, the rule stays installed
    pub fn clear_mocks(&self) -> &Self {
        debug!("Clearing all mocks");
        self.state.lock().mocks.clear();
        self
    }

    /// Recorded calls, all of them or those of `method`
    pub fn get_intercepted_requests(&self, method: Option<&str>) -> Vec<InterceptedCall> {
        let state = self.state.lock();
        match method {
            None => state.intercepted.clone(),
            Some(method) => state
                .intercepted
                .iter()
                .filter(|call| call.method.as_deref() == Some(method))
                .cloned()
                .collect(),
        }
    }

    /// Forget recorded calls
    pub fn clear_intercepted_requests(&self) {
        self.state.lock().intercepted.clear();
    }

    /// Whether `method` was called at least once
    pub fn was_method_called(&self, method: &str) -> bool {
        self.state
            .lock()
            .intercepted
            .iter()
            .any(|call| call.method.as_deref() == Some(method))
    }

    /// Number of recorded calls to `method`
    pub fn get_call_count(&self, method: &str) -> usize {
        self.state
            .lock()
            .intercepted
            .iter()
            .filter(|call| call.method.as_deref() == Some(method))
            .count()
    }
}

/// Create a network mock routing through `transport`
pub fn create_network_mock(
    transport: Arc<dyn RouteTransport>,
    config: NetworkMockConfig,
) -> SuiNetworkMock {
    SuiNetworkMock::new(transport, config)
}
