// File: terrapin/src/network_mock/interceptor.rs
//
// Catch-all rule installed by `SuiNetworkMock::enable`
//
// Per call: ignore anything that is not the RPC endpoint, record the call,
// answer from the mock table when the method is mocked, otherwise let the
// call through. A malformed body is recorded without a method and passes.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, log_enabled, trace, Level};
use parking_lot::Mutex;
use tortoise_common::rpc::{RpcRequest, RpcResponse};
use tortoise_common::time::get_current_time_in_millis;

use super::transport::{InterceptedRequest, MockHttpResponse, RouteDecision, RouteHandler};
use super::{InterceptedCall, MockState};
use crate::orchestrator::Clock;

pub(super) struct RpcInterceptor {
    state: Arc<Mutex<MockState>>,
    clock: Arc<dyn Clock>,
}

impl RpcInterceptor {
    pub(super) fn new(state: Arc<Mutex<MockState>>, clock: Arc<dyn Clock>) -> Self {
        Self { state, clock }
    }
}

#[async_trait]
impl RouteHandler for RpcInterceptor {
    async fn handle(&self, request: &InterceptedRequest) -> RouteDecision {
        let (id, result, delay) = {
            let mut state = self.state.lock();
            if !is_rpc_endpoint(&request.url, &state.config.rpc) {
                return RouteDecision::Continue;
            }

            let parsed = match request.post_data.as_deref().map(RpcRequest::parse) {
                Some(Ok(parsed)) => Some(parsed),
                Some(Err(e)) => {
                    debug!("Unparsable RPC body sent to {}: {}", request.url, e);
                    None
                }
                None => None,
            };

            state.intercepted.push(InterceptedCall {
                url: request.url.clone(),
                method: parsed.as_ref().map(|p| p.method.clone()),
                params: parsed.as_ref().and_then(|p| p.params.clone()),
                timestamp: get_current_time_in_millis(),
            });

            let Some(parsed) = parsed else {
                return RouteDecision::Continue;
            };

            debug!("Intercepted RPC: {}", parsed.method);
            if log_enabled!(Level::Trace) {
                if let Some(params) = &parsed.params {
                    trace!("Params of {}: {}", parsed.method, params);
                }
            }

            let Some(result) = state.mocks.get(&parsed.method).cloned() else {
                return RouteDecision::Continue;
            };

            let delay = state.delays.get(&parsed.method).copied();
            (parsed.id.unwrap_or_default(), result, delay)
        };

        if let Some(delay) = delay {
            trace!("Delaying mocked response by {:?}", delay);
            self.clock.sleep(delay).await;
        }

        let body = RpcResponse::new(Cow::Owned(id), Cow::Owned(result)).to_json();
        RouteDecision::Fulfill(MockHttpResponse::json(&body))
    }
}

/// Whether `url` targets the JSON-RPC endpoint configured as `rpc`
///
/// True when the URL contains `/rpc`, starts with `rpc`, or contains the port
/// of `rpc`.
pub fn is_rpc_endpoint(url: &str, rpc: &str) -> bool {
    if url.contains("/rpc") || (!rpc.is_empty() && url.starts_with(rpc)) {
        return true;
    }

    endpoint_port(rpc).is_some_and(|port| url.contains(&format!(":{}", port)))
}

fn endpoint_port(rpc: &str) -> Option<&str> {
    let without_scheme = rpc.split_once("://").map_or(rpc, |(_, rest)| rest);
    let authority = without_scheme.split('/').next()?;
    let (_, port) = authority.rsplit_once(':')?;

    if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) {
        Some(port)
    } else {
        None
    }
}
