//! # Intake channel between emitters and the dispatcher.
//!
//! [`Intake`] is a thin wrapper around a bounded [`flume`] channel. Emitters push
//! stamped events; the switch's intake loop is the single logical reader.
//!
//! ## Architecture
//! ```text
//! Emitters (many):                       Reader (one):
//!   Emitter 1 ──┐
//!   Emitter 2 ──┼──► Intake (bounded) ───► intake loop ───► orchestration task per event
//!   Emitter N ──┘
//! ```
//!
//! ## Rules
//! - **Backpressure**: `push()` waits while the buffer is full; it is the only throttle.
//! - **Rendezvous**: capacity `0` hands each event directly to the reader.
//! - **Accounting**: every envelope carries a [`TaskTrackerToken`] from the moment it is
//!   accepted until its orchestration task ends; graceful close waits on those tokens.
//! - **No persistence**: buffered events are dropped when the intake is released.

use flume::{Receiver, Sender};
use tokio_util::task::{TaskTracker, task_tracker::TaskTrackerToken};

use crate::error::EmitError;
use crate::events::event::EventRef;

/// An event travelling through the intake, with its live-event token.
pub(crate) struct Envelope {
    pub(crate) event: EventRef,
    pub(crate) token: TaskTrackerToken,
}

/// Sending half handed to emitters.
#[derive(Clone)]
pub(crate) struct IntakeSender {
    tx: Sender<Envelope>,
    tracker: TaskTracker,
}

impl IntakeSender {
    /// Pushes an event, waiting for buffer space.
    pub(crate) async fn push(&self, event: EventRef) -> Result<(), EmitError> {
        let envelope = Envelope {
            event,
            token: self.tracker.token(),
        };
        self.tx
            .send_async(envelope)
            .await
            .map_err(|_| EmitError::Closed)
    }

    /// Returns `false` once the switch dropped its end of the intake.
    pub(crate) fn is_open(&self) -> bool {
        !self.tx.is_disconnected()
    }

    /// Pushes an event from synchronous code, blocking the current thread.
    pub(crate) fn push_blocking(&self, event: EventRef) -> Result<(), EmitError> {
        let envelope = Envelope {
            event,
            token: self.tracker.token(),
        };
        self.tx.send(envelope).map_err(|_| EmitError::Closed)
    }
}

/// Bounded intake channel owned by the switch.
pub(crate) struct Intake {
    tx: Sender<Envelope>,
    rx: Receiver<Envelope>,
    tracker: TaskTracker,
}

impl Intake {
    /// Creates a channel with the given capacity (`0` = rendezvous).
    pub(crate) fn new(capacity: usize, tracker: TaskTracker) -> Self {
        let (tx, rx) = flume::bounded(capacity);
        Self { tx, rx, tracker }
    }

    pub(crate) fn sender(&self) -> IntakeSender {
        IntakeSender {
            tx: self.tx.clone(),
            tracker: self.tracker.clone(),
        }
    }

    pub(crate) fn receiver(&self) -> Receiver<Envelope> {
        self.rx.clone()
    }

    /// Number of events waiting to be pulled.
    pub(crate) fn len(&self) -> usize {
        self.rx.len()
    }
}
