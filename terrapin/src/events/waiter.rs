// File: terrapin/src/events/waiter.rs
//
// Pending waits on the event bus
//
// A wait is a small state machine: Pending -> Resolved | TimedOut. Whichever
// transition happens first wins, the other becomes a no-op, so a wait
// resolves at most once even when a buffered match and a fresh emission race.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::{EventCallback, EventFilter, ListenerState, SuiEvent};

enum WaitState {
    Pending(oneshot::Sender<SuiEvent>),
    Resolved,
    TimedOut,
}

pub(super) struct PendingWait {
    state: Mutex<WaitState>,
    filter: EventFilter,
}

impl PendingWait {
    pub(super) fn new(filter: EventFilter) -> (Arc<Self>, oneshot::Receiver<SuiEvent>) {
        let (sender, receiver) = oneshot::channel();
        let wait = Arc::new(Self {
            state: Mutex::new(WaitState::Pending(sender)),
            filter,
        });
        (wait, receiver)
    }

    // Resolve with `event` if it passes the filter and the wait is still pending
    pub(super) fn try_resolve(&self, event: &SuiEvent) -> bool {
        // The filter is user code, keep it outside the state lock
        if !(self.filter)(event) {
            return false;
        }

        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, WaitState::Resolved) {
            WaitState::Pending(sender) => {
                // The receiver may already be gone if the wait was dropped
                let _ = sender.send(event.clone());
                true
            }
            terminal => {
                *state = terminal;
                false
            }
        }
    }

    // Returns false when the wait was resolved first
    pub(super) fn time_out(&self) -> bool {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, WaitState::TimedOut) {
            WaitState::Pending(_) => true,
            terminal => {
                *state = terminal;
                false
            }
        }
    }

    #[cfg(test)]
    fn is_pending(&self) -> bool {
        matches!(*self.state.lock(), WaitState::Pending(_))
    }
}

// Deregisters the wait callback when the wait ends, whichever way it ends,
// including when the waiting future is dropped.
pub(super) struct Registration {
    state: Arc<Mutex<ListenerState>>,
    event_type: String,
    callback: EventCallback,
}

impl Registration {
    pub(super) fn new(
        state: Arc<Mutex<ListenerState>>,
        event_type: String,
        callback: EventCallback,
    ) -> Self {
        Self {
            state,
            event_type,
            callback,
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.state
            .lock()
            .remove_callback(&self.event_type, &self.callback);
    }
}
