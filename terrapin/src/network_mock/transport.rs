// File: terrapin/src/network_mock/transport.rs
//
// Transport boundary of the network mock
//
// The mock never talks to the network itself. It installs a rule on a
// transport (a browser page, an HTTP proxy, or the in-memory transport
// below) and the transport asks the rule what to do with each outbound call.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use log::{debug, trace};
use parking_lot::Mutex;

/// Pattern matching every outbound call
pub const CATCH_ALL_PATTERN: &str = "**/*";

/// Outbound call seen by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedRequest {
    /// Target URL
    pub url: String,
    /// HTTP method, `POST` for JSON-RPC
    pub method: String,
    /// Raw request body
    pub post_data: Option<Vec<u8>>,
}

impl InterceptedRequest {
    /// `POST` to `url` with a body
    pub fn post(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            method: "POST".to_string(),
            post_data: Some(body.into()),
        }
    }

    /// `GET` of `url`
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            post_data: None,
        }
    }
}

/// Synthetic response returned in place of the real one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockHttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Value of the `Content-Type` header
    pub content_type: String,
    /// Serialized body
    pub body: String,
}

impl MockHttpResponse {
    /// `200 OK` with a JSON body
    pub fn json(body: &serde_json::Value) -> Self {
        Self {
            status: 200,
            content_type: "application/json".to_string(),
            body: body.to_string(),
        }
    }

    /// Body parsed as JSON
    pub fn json_body(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.body)
    }
}

/// What a rule decided for one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Answer with this response, the call never reaches the network
    Fulfill(MockHttpResponse),
    /// Let the call proceed unchanged
    Continue,
}

/// Rule installed on a transport
#[async_trait]
pub trait RouteHandler: Send + Sync {
    /// Decide the fate of one call; must not fail
    async fn handle(&self, request: &InterceptedRequest) -> RouteDecision;
}

/// Transport able to install interception rules
#[async_trait]
pub trait RouteTransport: Send + Sync {
    /// Install `handler` for calls matching `pattern`
    async fn route(&self, pattern: &str, handler: Arc<dyn RouteHandler>) -> anyhow::Result<()>;

    /// Remove the rule installed for `pattern`
    async fn unroute(&self, pattern: &str) -> anyhow::Result<()>;
}

/// Result of dispatching a call through `InMemoryTransport`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A rule answered
    Fulfilled(MockHttpResponse),
    /// No rule answered, the call would go to the network
    Continued,
}

impl RouteOutcome {
    /// Response if fulfilled
    pub fn response(&self) -> Option<&MockHttpResponse> {
        match self {
            Self::Fulfilled(response) => Some(response),
            Self::Continued => None,
        }
    }

    /// Whether a rule answered
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled(_))
    }
}

/// Transport keeping its rules in memory
///
/// Rules are consulted from the most recently installed one, like a browser
/// page does. Only the catch-all pattern and exact URLs are understood.
#[derive(Default, Clone)]
pub struct InMemoryTransport {
    rules: Arc<Mutex<IndexMap<String, Arc<dyn RouteHandler>>>>,
}

impl InMemoryTransport {
    /// Transport without rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of installed rules
    pub fn rule_count(&self) -> usize {
        self.rules.lock().len()
    }

    /// Run `request` through the installed rules
    pub async fn dispatch(&self, request: InterceptedRequest) -> RouteOutcome {
        // Handlers are async, never await while holding the lock
        let handlers: Vec<Arc<dyn RouteHandler>> = self
            .rules
            .lock()
            .iter()
            .rev()
            .filter(|(pattern, _)| pattern_matches(pattern, &request.url))
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in handlers {
            if let RouteDecision::Fulfill(response) = handler.handle(&request).await {
                trace!("{} {} fulfilled by rule", request.method, request.url);
                return RouteOutcome::Fulfilled(response);
            }
        }

        RouteOutcome::Continued
    }
}

fn pattern_matches(pattern: &str, url: &str) -> bool {
    pattern == CATCH_ALL_PATTERN || pattern == url
}

#[async_trait]
impl RouteTransport for InMemoryTransport {
    async fn route(&self, pattern: &str, handler: Arc<dyn RouteHandler>) -> anyhow::Result<()> {
        debug!("Installing route rule for {}", pattern);
        let mut rules = self.rules.lock();
        // Reinstalling a pattern moves it to the front
        rules.shift_remove(pattern);
        rules.insert(pattern.to_string(), handler);
        Ok(())
    }

    async fn unroute(&self, pattern: &str) -> anyhow::Result<()> {
        debug!("Removing route rule for {}", pattern);
        self.rules.lock().shift_remove(pattern);
        Ok(())
    }
}
