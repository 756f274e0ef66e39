//! Event listener behaviour as seen by a test harness
//!
//! Time-based cases run on paused tokio time, so 10 second timeouts cost
//! nothing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use tortoise_terrapin::events::{
    create_event_listener, EventCallback, EventListenerOptions, SuiEvent, SuiEventListener,
    WaitOptions,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn transfer(sender: &str) -> SuiEvent {
    SuiEvent::new("Transfer").with_sender(sender)
}

#[test]
fn test_last_event_after_emit() {
    let listener = create_event_listener(EventListenerOptions::default());
    listener.emit(transfer("0x123"));

    assert_eq!(listener.get_last_event("Transfer"), Some(transfer("0x123")));
    assert!(listener.has_event("Transfer"));
    assert!(!listener.has_event("Swap"));
}

#[test]
fn test_get_events_returns_fresh_containers() {
    let listener = SuiEventListener::default();
    listener.emit(transfer("0x1"));

    let mut first = listener.get_events(Some("Transfer"));
    first.push(transfer("0x2"));

    assert_eq!(listener.get_events(Some("Transfer")).len(), 1);
    assert_eq!(listener.get_events(None).len(), 1);
}

#[test]
fn test_off_stops_invocation() {
    let listener = SuiEventListener::default();
    let calls = Arc::new(AtomicUsize::new(0));
    let callback: EventCallback = {
        let calls = calls.clone();
        Arc::new(move |_: &SuiEvent| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
    };

    listener.on("Transfer", callback.clone());
    listener.emit(transfer("0x1"));
    listener.off("Transfer", &callback);
    listener.emit(transfer("0x2"));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(listener.get_event_count(Some("Transfer")), 2);
}

#[tokio::test]
async fn test_wait_resolves_immediately_for_buffered_match() {
    init_logger();
    let listener = SuiEventListener::default();
    listener.emit(transfer("0x1"));
    listener.emit(transfer("0xabc"));

    let event = assert_ok!(
        listener
            .wait_for_event(
                "Transfer",
                WaitOptions::new().with_filter(|e| e.sender.as_deref() == Some("0xabc")),
            )
            .await
    );
    assert_eq!(event, transfer("0xabc"));
}

#[tokio::test(start_paused = true)]
async fn test_wait_times_out_before_late_event() {
    init_logger();
    let listener = SuiEventListener::default();
    let emitter = listener.emitter();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        emitter.emit(transfer("0x1"));
    });

    let error = assert_err!(
        listener
            .wait_for_event(
                "Transfer",
                WaitOptions::new().with_timeout(Duration::from_millis(100)),
            )
            .await
    );
    assert!(error.is_timeout());
    assert!(error.to_string().contains("Transfer"));
    assert_eq!(listener.callback_count("Transfer"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_wait_resolves_with_event_arriving_in_time() {
    let listener = SuiEventListener::default();
    let emitter = listener.emitter();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        emitter.emit(SuiEvent::new("ObjectCreated"));
        emitter.emit(transfer("0x9"));
    });

    let event = assert_ok!(
        listener
            .wait_for_event(
                "Transfer",
                WaitOptions::new().with_timeout(Duration::from_millis(100)),
            )
            .await
    );
    assert_eq!(event.sender.as_deref(), Some("0x9"));
    assert_eq!(listener.callback_count("Transfer"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_default_timeout_comes_from_options() {
    let listener = create_event_listener(EventListenerOptions {
        timeout: Duration::from_millis(250),
        ..Default::default()
    });

    let start = tokio::time::Instant::now();
    assert_err!(listener.wait_for_event("Never", WaitOptions::new()).await);
    assert!(start.elapsed() >= Duration::from_millis(250));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_waits_each_resolve_once() {
    let listener = SuiEventListener::default();
    let first = listener.clone();
    let second = listener.clone();

    let a = tokio::spawn(async move { first.wait_for_event("Transfer", WaitOptions::new()).await });
    let b = tokio::spawn(async move { second.wait_for_event("Transfer", WaitOptions::new()).await });

    // Let both waits register before emitting
    tokio::time::sleep(Duration::from_millis(10)).await;
    listener.emit(transfer("0x1"));
    listener.emit(transfer("0x2"));

    let a = a.await.unwrap().unwrap();
    let b = b.await.unwrap().unwrap();
    assert_eq!(a, transfer("0x1"));
    assert_eq!(b, transfer("0x1"));
    assert_eq!(listener.callback_count("Transfer"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_events_preserves_order() {
    let listener = SuiEventListener::default();
    let emitter = listener.emitter();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        emitter.emit(SuiEvent::new("Swap").with_parsed_json(json!({ "amountIn": 10 })));
        emitter.emit(SuiEvent::new("Deposit"));
    });

    let events = assert_ok!(
        listener
            .wait_for_events(&["Deposit", "Swap"], WaitOptions::new())
            .await
    );
    assert_eq!(events[0].event_type, "Deposit");
    assert_eq!(events[1].field("amountIn"), Some(&json!(10)));
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_events_fails_when_one_times_out() {
    let listener = SuiEventListener::default();
    listener.emit(SuiEvent::new("Deposit"));

    let error = assert_err!(
        listener
            .wait_for_events(
                &["Deposit", "Withdraw"],
                WaitOptions::new().with_timeout(Duration::from_secs(1)),
            )
            .await
    );
    assert!(error.to_string().contains("Withdraw"));
}

#[tokio::test(start_paused = true)]
async fn test_dropped_wait_deregisters() {
    let listener = SuiEventListener::default();

    let wait = listener.wait_for_event("Transfer", WaitOptions::new());
    let _ = tokio::time::timeout(Duration::from_millis(10), wait).await;

    assert_eq!(listener.callback_count("Transfer"), 0);
}
