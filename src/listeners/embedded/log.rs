//! # LogFinalizer: terminal event logger
//!
//! A minimal finalizer that writes one `tracing` record per finished event.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! INFO evswitch: event resolved event_id=3 event_type="order.placed" listeners=2
//! WARN evswitch: event failed event_id=4 event_type="order.placed" failed=["mailer"]
//! INFO evswitch: event aborted event_id=10 event_type="order.placed" reason="sampled out"
//! ```

use async_trait::async_trait;

use crate::events::{EventRef, EventState};
use crate::listeners::Finalize;

/// Finalizer that logs every terminal event.
#[derive(Default)]
pub struct LogFinalizer;

impl LogFinalizer {
    /// Construct a new [`LogFinalizer`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Finalize for LogFinalizer {
    async fn finalize(&self, e: EventRef) {
        match e.state() {
            EventState::Resolved => {
                tracing::info!(
                    event_id = e.id(),
                    event_type = e.event_type(),
                    listeners = e.total_listeners(),
                    "event resolved"
                );
            }
            EventState::Error => {
                let mut failed: Vec<String> = e
                    .states()
                    .into_iter()
                    .filter(|(_, s)| *s == EventState::Error)
                    .map(|(k, _)| k)
                    .collect();
                failed.sort_unstable();
                tracing::warn!(
                    event_id = e.id(),
                    event_type = e.event_type(),
                    failed = ?failed,
                    "event failed"
                );
            }
            EventState::Aborted => {
                tracing::info!(
                    event_id = e.id(),
                    event_type = e.event_type(),
                    reason = e.abort_reason().as_deref().unwrap_or("unknown"),
                    "event aborted"
                );
            }
            EventState::Emitted => {
                tracing::debug!(event_id = e.id(), "finalize called on a live event");
            }
        }
    }
}
