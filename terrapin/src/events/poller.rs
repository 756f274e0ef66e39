use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, trace, warn};
use tokio::task::JoinHandle;

use super::{EventEmitter, SuiEvent};

/// Source of events queried periodically, e.g. a node's event query endpoint
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Events observed since the previous call
    async fn poll_events(&self) -> anyhow::Result<Vec<SuiEvent>>;
}

/// Background task feeding a listener from an `EventSource`
///
/// The task stops when `stop` is called or the poller is dropped.
pub struct EventPoller {
    handle: Option<JoinHandle<()>>,
}

impl EventPoller {
    pub(super) fn spawn(
        emitter: EventEmitter,
        source: Arc<dyn EventSource>,
        poll_interval: Duration,
    ) -> Self {
        debug!("Starting event poller (interval: {:?})", poll_interval);

        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(poll_interval).await;

                match source.poll_events().await {
                    Ok(events) => {
                        trace!("Polled {} events", events.len());
                        for event in events {
                            emitter.emit(event);
                        }
                    }
                    // A failed poll is retried on the next tick
                    Err(e) => warn!("Error while polling events: {:#}", e),
                }
            }
        });

        Self {
            handle: Some(handle),
        }
    }

    /// Whether the polling task is still alive
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop polling
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("Stopping event poller");
            handle.abort();
        }
    }
}

impl Drop for EventPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
