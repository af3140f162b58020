//! # Intake loop and per-event orchestration.
//!
//! The intake loop is the single logical reader of the intake channel. For every event
//! it pulls, it spawns one orchestration task. The envelope's tracker token moves into
//! that task, so the event stays counted as live until the task ends.
//!
//! ## Orchestration (one task per event)
//! ```text
//! envelope { event, token }                  (token held until the task ends)
//!   │
//!   ├─► state == Aborted? ──► finalize ──► done          (aborted while buffered)
//!   │
//!   ├─► for interceptor in ascending priority:          (sequential)
//!   │      run_listener(interceptor)
//!   │      state == Aborted? ──► finalize ──► done
//!   │
//!   ├─► lock_for_delivery()                              (abort/metadata now refused)
//!   │      refused (Aborted)? ──► finalize ──► done
//!   │
//!   ├─► no receivers? ──► settle ──► finalize ──► done
//!   │
//!   └─► JoinSet: one task per receiver                  (concurrent, unordered)
//!          run_listener(receiver) ──► finalize (first caller after terminal wins)
//! ```
//!
//! ## Rules
//! - `stop` ends the loop without draining the buffer; already spawned orchestrations
//!   run to completion on their own.
//! - An orchestration task only ends after every receiver task it spawned ended.

use std::sync::Arc;

use flume::Receiver;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::core::boundary::{finalize, run_listener};
use crate::core::registry::Routing;
use crate::events::{Envelope, EventRef, EventState};

/// Routes events pulled from the intake to their listeners.
pub(crate) struct Dispatcher {
    routing: Arc<Routing>,
}

impl Dispatcher {
    pub(crate) fn new(routing: Arc<Routing>) -> Self {
        Self { routing }
    }

    /// Pulls events until `stop` is cancelled or the intake is released.
    pub(crate) async fn intake_loop(self, rx: Receiver<Envelope>, stop: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                msg = rx.recv_async() => match msg {
                    Ok(envelope) => {
                        let routing = Arc::clone(&self.routing);
                        tokio::spawn(orchestrate(routing, envelope));
                    }
                    Err(_) => break,
                },
            }
        }
        tracing::debug!(buffered = rx.len(), "intake loop stopped");
    }
}

async fn orchestrate(routing: Arc<Routing>, envelope: Envelope) {
    let Envelope {
        event,
        token: _token,
    } = envelope;

    if event.state() == EventState::Aborted {
        finalize(&event).await;
        return;
    }

    for interceptor in &routing.interceptors {
        run_listener(
            &event,
            interceptor.key(),
            interceptor.intercept(Arc::clone(&event)),
        )
        .await;

        if event.state() == EventState::Aborted {
            finalize(&event).await;
            return;
        }
    }

    // abort and lock race under the event mutex; whichever lands first wins
    if !event.lock_for_delivery() {
        finalize(&event).await;
        return;
    }
    tracing::debug!(
        event_id = event.id(),
        event_type = event.event_type(),
        "event locked for delivery"
    );

    let receivers = routing.receivers_for(event.event_type());
    if receivers.is_empty() {
        event.settle();
        finalize(&event).await;
        return;
    }

    let mut set = JoinSet::new();
    for receiver in receivers {
        let receiver = Arc::clone(receiver);
        let event = Arc::clone(&event);
        set.spawn(async move {
            run_listener(&event, receiver.key(), receiver.receive(Arc::clone(&event))).await;
            finalize(&event).await;
        });
    }
    while let Some(res) = set.join_next().await {
        if let Err(err) = res {
            tracing::error!(event_id = event.id(), error = %err, "receiver task failed");
        }
    }

    if !event.state().is_terminal() {
        warn_unsettled(&event);
    }
}

// Listener counts are stamped at emission; an event emitted before a restart with a
// different registry may expect listeners that are no longer routed.
fn warn_unsettled(event: &EventRef) {
    tracing::warn!(
        event_id = event.id(),
        event_type = event.event_type(),
        expected = event.total_listeners(),
        reported = event.states().len(),
        "event left without a terminal state"
    );
}
