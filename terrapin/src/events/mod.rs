// File: terrapin/src/events/mod.rs
//
// Event Listener
//
// Buffers blockchain events emitted during a test and lets assertions query
// them afterwards or wait for future ones. Events reach the listener through
// `emit`, an `EventEmitter` handle, or an `EventSource` poller.

/// Polling of external event sources
pub mod poller;
mod waiter;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use log::{debug, info, trace};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, TerrapinError};
use waiter::{PendingWait, Registration};

pub use poller::{EventPoller, EventSource};

/// Callbacks registered under this type receive every event
pub const WILDCARD: &str = "*";

/// Default time a wait may take
pub const DEFAULT_EVENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default delay between two polls of an `EventSource`
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A blockchain event as observed by the test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiEvent {
    /// Event type, e.g. `Transfer` or a fully qualified Move event type
    #[serde(rename = "type")]
    pub event_type: String,
    /// Package that emitted the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
    /// Module of the emitting transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_module: Option<String>,
    /// Sender address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// Milliseconds since the unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    /// Decoded event payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_json: Option<Map<String, Value>>,
}

impl SuiEvent {
    /// Event of the given type with no other field set
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            package_id: None,
            transaction_module: None,
            sender: None,
            timestamp: None,
            parsed_json: None,
        }
    }

    /// Set the sender
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Set the emitting package and module
    pub fn with_origin(mut self, package_id: impl Into<String>, module: impl Into<String>) -> Self {
        self.package_id = Some(package_id.into());
        self.transaction_module = Some(module.into());
        self
    }

    /// Set the timestamp
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the payload; non-object values are ignored
    pub fn with_parsed_json(mut self, payload: Value) -> Self {
        if let Value::Object(map) = payload {
            self.parsed_json = Some(map);
        }
        self
    }

    /// Field of the payload, if any
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.parsed_json.as_ref().and_then(|json| json.get(key))
    }
}

/// Callback invoked synchronously for each matching event
///
/// Identity is the `Arc` pointer: keep a clone to deregister it with `off`.
pub type EventCallback = Arc<dyn Fn(&SuiEvent) + Send + Sync>;

/// Predicate selecting events
pub type EventFilter = Arc<dyn Fn(&SuiEvent) -> bool + Send + Sync>;

/// Listener options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventListenerOptions {
    /// Default bound of `wait_for_event`
    #[serde(with = "crate::config::millis")]
    pub timeout: Duration,
    /// Delay between two polls of an `EventSource`
    #[serde(with = "crate::config::millis")]
    pub poll_interval: Duration,
}

impl Default for EventListenerOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_EVENT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Options of a single wait
#[derive(Clone, Default)]
pub struct WaitOptions {
    /// Bound of the wait, the listener default when unset
    pub timeout: Option<Duration>,
    /// Only events passing the filter resolve the wait
    pub filter: Option<EventFilter>,
}

impl WaitOptions {
    /// Listener defaults, no filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bound
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the filter
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&SuiEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }
}

#[derive(Default)]
pub(crate) struct ListenerState {
    events: Vec<SuiEvent>,
    callbacks: HashMap<String, Vec<EventCallback>>,
}

impl ListenerState {
    fn add_callback(&mut self, event_type: &str, callback: EventCallback) {
        self.callbacks
            .entry(event_type.to_string())
            .or_default()
            .push(callback);
    }

    fn remove_callback(&mut self, event_type: &str, callback: &EventCallback) {
        if let Some(callbacks) = self.callbacks.get_mut(event_type) {
            callbacks.retain(|cb| !Arc::ptr_eq(cb, callback));
            if callbacks.is_empty() {
                self.callbacks.remove(event_type);
            }
        }
    }

    fn callback_count(&self, event_type: &str) -> usize {
        self.callbacks.get(event_type).map_or(0, Vec::len)
    }

    // Buffers the event and returns the callbacks to invoke, type-specific
    // first then wildcard, each in registration order.
    fn record(&mut self, event: &SuiEvent) -> Vec<EventCallback> {
        self.events.push(event.clone());

        let mut snapshot = self
            .callbacks
            .get(&event.event_type)
            .cloned()
            .unwrap_or_default();

        if event.event_type != WILDCARD {
            if let Some(wildcard) = self.callbacks.get(WILDCARD) {
                snapshot.extend(wildcard.iter().cloned());
            }
        }

        snapshot
    }
}

fn dispatch(state: &Mutex<ListenerState>, event: SuiEvent) {
    debug!("Event emitted: {}", event.event_type);
    trace!("Event payload: {:?}", event);

    // Invoke outside the lock so callbacks may call on/off/clear_events/emit
    let callbacks = state.lock().record(&event);
    for callback in callbacks {
        callback(&event);
    }
}

/// Handle given to the component producing events
///
/// Cheap to clone; every clone feeds the same listener.
#[derive(Clone)]
pub struct EventEmitter {
    state: Arc<Mutex<ListenerState>>,
}

impl EventEmitter {
    /// Record an event and notify callbacks
    pub fn emit(&self, event: SuiEvent) {
        dispatch(&self.state, event);
    }
}

/// Event bus for a test session
///
/// Clones share the same buffer and callbacks.
///
/// ```rust,ignore
/// let listener = create_event_listener(EventListenerOptions::default());
/// let emitter = listener.emitter();
///
/// tokio::spawn(async move {
///     emitter.emit(SuiEvent::new("Transfer").with_sender("0x123"));
/// });
///
/// let event = listener
///     .wait_for_event("Transfer", WaitOptions::new().with_timeout(Duration::from_secs(5)))
///     .await?;
/// ```
#[derive(Clone)]
pub struct SuiEventListener {
    state: Arc<Mutex<ListenerState>>,
    options: EventListenerOptions,
}

impl SuiEventListener {
    /// Create an empty listener
    pub fn new(options: EventListenerOptions) -> Self {
        info!(
            "Started listening for Sui events (timeout: {:?}, poll interval: {:?})",
            options.timeout, options.poll_interval
        );

        Self {
            state: Arc::new(Mutex::new(ListenerState::default())),
            options,
        }
    }

    /// Listener options
    pub fn options(&self) -> &EventListenerOptions {
        &self.options
    }

    /// Handle for an event producer
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            state: self.state.clone(),
        }
    }

    /// Record an event and synchronously notify the callbacks registered for
    /// its type, then the wildcard callbacks
    pub fn emit(&self, event: SuiEvent) {
        dispatch(&self.state, event);
    }

    /// Poll `source` every `poll_interval` and emit what it returns
    pub fn spawn_poller(&self, source: Arc<dyn EventSource>) -> EventPoller {
        EventPoller::spawn(self.emitter(), source, self.options.poll_interval)
    }

    /// Wait for the first event of `event_type` passing the filter
    ///
    /// Buffered events are checked first, so an event emitted before the
    /// call resolves it immediately.
    ///
    /// # Errors
    ///
    /// `Timeout` naming `event_type` when nothing matches in time.
    pub async fn wait_for_event(&self, event_type: &str, options: WaitOptions) -> Result<SuiEvent> {
        let timeout = options.timeout.unwrap_or(self.options.timeout);
        let filter = options.filter.unwrap_or_else(|| Arc::new(|_: &SuiEvent| true));

        debug!(
            "Waiting for event: {} (timeout: {:?})",
            event_type, timeout
        );

        let (wait, mut receiver) = PendingWait::new(filter.clone());
        let callback: EventCallback = {
            let wait = wait.clone();
            Arc::new(move |event: &SuiEvent| {
                wait.try_resolve(event);
            })
        };

        // Registering and snapshotting under one lock: every event is either
        // in the snapshot or delivered to the callback
        let buffered: Vec<SuiEvent> = {
            let mut state = self.state.lock();
            state.add_callback(event_type, callback.clone());
            state
                .events
                .iter()
                .filter(|e| e.event_type == event_type)
                .cloned()
                .collect()
        };
        let _registration = Registration::new(self.state.clone(), event_type.to_string(), callback);

        if let Some(existing) = buffered.iter().find(|e| filter(*e)) {
            wait.try_resolve(existing);
        }

        match tokio::time::timeout(timeout, &mut receiver).await {
            Ok(Ok(event)) => Ok(event),
            _ if !wait.time_out() => {
                // Resolved at the deadline
                receiver
                    .try_recv()
                    .map_err(|_| TerrapinError::event_timeout(event_type, timeout))
            }
            _ => {
                debug!("Timeout waiting for event: {}", event_type);
                Err(TerrapinError::event_timeout(event_type, timeout))
            }
        }
    }

    /// Wait concurrently for one event of each type
    ///
    /// Results follow the order of `event_types`; the first failing wait
    /// fails the whole call.
    pub async fn wait_for_events(
        &self,
        event_types: &[&str],
        options: WaitOptions,
    ) -> Result<Vec<SuiEvent>> {
        try_join_all(
            event_types
                .iter()
                .map(|event_type| self.wait_for_event(event_type, options.clone())),
        )
        .await
    }

    /// Copy of the buffered events, all of them or those of `event_type`
    pub fn get_events(&self, event_type: Option<&str>) -> Vec<SuiEvent> {
        let state = self.state.lock();
        match event_type {
            None => state.events.clone(),
            Some(event_type) => state
                .events
                .iter()
                .filter(|e| e.event_type == event_type)
                .cloned()
                .collect(),
        }
    }

    /// Most recently emitted event of `event_type`
    pub fn get_last_event(&self, event_type: &str) -> Option<SuiEvent> {
        self.state
            .lock()
            .events
            .iter()
            .rev()
            .find(|e| e.event_type == event_type)
            .cloned()
    }

    /// Whether an event of `event_type` was emitted
    pub fn has_event(&self, event_type: &str) -> bool {
        self.state
            .lock()
            .events
            .iter()
            .any(|e| e.event_type == event_type)
    }

    /// Whether an event of `event_type` passing `predicate` was emitted
    pub fn has_event_matching<F>(&self, event_type: &str, predicate: F) -> bool
    where
        F: Fn(&SuiEvent) -> bool,
    {
        // Predicates run on a copy, never under the lock
        self.get_events(Some(event_type)).iter().any(predicate)
    }

    /// Number of buffered events, all of them or those of `event_type`
    pub fn get_event_count(&self, event_type: Option<&str>) -> usize {
        let state = self.state.lock();
        match event_type {
            None => state.events.len(),
            Some(event_type) => state
                .events
                .iter()
                .filter(|e| e.event_type == event_type)
                .count(),
        }
    }

    /// Register a callback for `event_type`, or for every event with `"*"`
    pub fn on(&self, event_type: &str, callback: EventCallback) {
        self.state.lock().add_callback(event_type, callback);
    }

    /// Deregister a callback by identity; unknown callbacks are ignored
    pub fn off(&self, event_type: &str, callback: &EventCallback) {
        self.state.lock().remove_callback(event_type, callback);
    }

    /// Number of callbacks registered for `event_type`, pending waits included
    pub fn callback_count(&self, event_type: &str) -> usize {
        self.state.lock().callback_count(event_type)
    }

    /// Drop every buffered event, callbacks stay registered
    pub fn clear_events(&self) {
        self.state.lock().events.clear();
        info!("Cleared all events");
    }
}

impl Default for SuiEventListener {
    fn default() -> Self {
        Self::new(EventListenerOptions::default())
    }
}

/// Create an event listener
pub fn create_event_listener(options: EventListenerOptions) -> SuiEventListener {
    SuiEventListener::new(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter_callback(counter: &Arc<AtomicUsize>) -> EventCallback {
        let counter = counter.clone();
        Arc::new(move |_: &SuiEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_get_events_filters_by_type() {
        let listener = SuiEventListener::default();
        listener.emit(SuiEvent::new("Transfer").with_sender("0x123"));
        listener.emit(SuiEvent::new("ObjectCreated").with_sender("0x456"));
        listener.emit(SuiEvent::new("Transfer").with_sender("0x789"));

        assert_eq!(listener.get_events(None).len(), 3);

        let transfers = listener.get_events(Some("Transfer"));
        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0].sender.as_deref(), Some("0x123"));
        assert_eq!(transfers[1].sender.as_deref(), Some("0x789"));

        assert_eq!(listener.get_event_count(None), 3);
        assert_eq!(listener.get_event_count(Some("Transfer")), 2);
        assert_eq!(listener.get_event_count(Some("Missing")), 0);
    }

    #[test]
    fn test_get_events_returns_a_copy() {
        let listener = SuiEventListener::default();
        listener.emit(SuiEvent::new("Transfer"));

        let mut events = listener.get_events(None);
        events.clear();
        events.push(SuiEvent::new("Forged"));

        assert_eq!(listener.get_events(None), vec![SuiEvent::new("Transfer")]);
    }

    #[test]
    fn test_last_event_and_has_event() {
        let listener = SuiEventListener::default();
        assert!(listener.get_last_event("Transfer").is_none());
        assert!(!listener.has_event("Transfer"));

        listener.emit(SuiEvent::new("Transfer").with_sender("0x123"));
        listener.emit(SuiEvent::new("Transfer").with_sender("0x456"));
        listener.emit(SuiEvent::new("ObjectCreated").with_sender("0x789"));

        let last = listener.get_last_event("Transfer").unwrap();
        assert_eq!(last.sender.as_deref(), Some("0x456"));
        assert!(listener.has_event("Transfer"));
        assert!(listener.has_event_matching("Transfer", |e| e.sender.as_deref() == Some("0x123")));
        assert!(!listener.has_event_matching("Transfer", |e| e.sender.as_deref() == Some("0x789")));
    }

    #[test]
    fn test_callbacks_and_wildcard_order() {
        let listener = SuiEventListener::default();
        let order = Arc::new(Mutex::new(Vec::new()));

        let push = |label: &'static str| -> EventCallback {
            let order = order.clone();
            Arc::new(move |_: &SuiEvent| order.lock().push(label))
        };

        listener.on(WILDCARD, push("wildcard"));
        listener.on("Transfer", push("first"));
        listener.on("Transfer", push("second"));

        listener.emit(SuiEvent::new("Transfer"));
        listener.emit(SuiEvent::new("ObjectCreated"));

        assert_eq!(
            *order.lock(),
            vec!["first", "second", "wildcard", "wildcard"]
        );
    }

    #[test]
    fn test_off_removes_by_identity() {
        let listener = SuiEventListener::default();
        let counter = Arc::new(AtomicUsize::new(0));
        let callback = counter_callback(&counter);
        let other = counter_callback(&counter);

        listener.on("Transfer", callback.clone());
        listener.on("Transfer", other.clone());
        listener.emit(SuiEvent::new("Transfer"));
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        listener.off("Transfer", &callback);
        listener.emit(SuiEvent::new("Transfer"));
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        // Unknown callback or type is a no-op
        listener.off("Transfer", &callback);
        listener.off("Missing", &other);
        assert_eq!(listener.callback_count("Transfer"), 1);
    }

    #[test]
    fn test_callback_may_deregister_itself_during_emit() {
        let listener = SuiEventListener::default();
        let counter = Arc::new(AtomicUsize::new(0));

        let slot: Arc<Mutex<Option<EventCallback>>> = Arc::new(Mutex::new(None));
        let callback: EventCallback = {
            let listener = listener.clone();
            let slot = slot.clone();
            let counter = counter.clone();
            Arc::new(move |_: &SuiEvent| {
                counter.fetch_add(1, Ordering::SeqCst);
                if let Some(me) = slot.lock().as_ref() {
                    listener.off("Transfer", me);
                }
                listener.clear_events();
            })
        };
        *slot.lock() = Some(callback.clone());
        let later = counter_callback(&counter);

        listener.on("Transfer", callback);
        listener.on("Transfer", later);

        // Both run on the first emit: dispatch iterates a snapshot
        listener.emit(SuiEvent::new("Transfer"));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(listener.get_event_count(None), 0);

        listener.emit(SuiEvent::new("Transfer"));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_clear_events_keeps_callbacks() {
        let listener = SuiEventListener::default();
        let counter = Arc::new(AtomicUsize::new(0));
        listener.on("Transfer", counter_callback(&counter));

        listener.emit(SuiEvent::new("Transfer"));
        listener.clear_events();
        assert!(listener.get_events(None).is_empty());

        listener.emit(SuiEvent::new("Transfer"));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_emitter_feeds_listener() {
        let listener = SuiEventListener::default();
        let emitter = listener.emitter();
        emitter.emit(
            SuiEvent::new("Transfer")
                .with_origin("0x2", "coin")
                .with_timestamp(1_700_000_000_000)
                .with_parsed_json(json!({ "amount": 100 })),
        );

        let event = listener.get_last_event("Transfer").unwrap();
        assert_eq!(event.field("amount"), Some(&json!(100)));
        assert_eq!(event.package_id.as_deref(), Some("0x2"));
    }

    #[test]
    fn test_event_serde_uses_sdk_field_names() {
        let event: SuiEvent = serde_json::from_value(json!({
            "type": "0x2::coin::Transfer",
            "sender": "0x1",
            "transactionModule": "coin",
            "parsedJson": { "amount": "5" }
        }))
        .unwrap();

        assert_eq!(event.event_type, "0x2::coin::Transfer");
        assert_eq!(event.transaction_module.as_deref(), Some("coin"));
        assert_eq!(event.field("amount"), Some(&json!("5")));
    }

    #[tokio::test]
    async fn test_wait_resolves_from_buffer() {
        let listener = SuiEventListener::default();
        listener.emit(SuiEvent::new("Transfer").with_sender("0x1"));

        let event = listener
            .wait_for_event("Transfer", WaitOptions::new())
            .await
            .unwrap();
        assert_eq!(event.sender.as_deref(), Some("0x1"));
        assert_eq!(listener.callback_count("Transfer"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_and_cleans_up() {
        let listener = SuiEventListener::default();

        let error = listener
            .wait_for_event(
                "Transfer",
                WaitOptions::new().with_timeout(Duration::from_millis(100)),
            )
            .await
            .unwrap_err();

        assert!(error.is_timeout());
        assert!(error.to_string().contains("Transfer"));
        assert_eq!(listener.callback_count("Transfer"), 0);
    }
}
