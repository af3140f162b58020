//! # Per-listener failure boundary.
//!
//! Runs one listener invocation for one event and records its outcome in the event's
//! per-listener state. Nothing that happens inside the handler escapes this boundary.
//!
//! ## Outcome mapping
//! ```text
//! report(key, Emitted)
//!   handler ─► Ok(())         → Emitted → Resolved (only if still Emitted)
//!           ─► Err(e)         → Error   (warn!)
//!           ─► panic!(..)     → Error   (error!, panic text captured)
//! ```
//!
//! ## Rules
//! - A panic is caught here only; siblings, the dispatcher and the emitter never see it.
//! - [`finalize`] runs the event's finalizer at most once, and only once the aggregate
//!   state is terminal. A panicking finalizer is logged and swallowed.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::error::HandlerError;
use crate::events::{EventRef, EventState};

/// Runs `fut` (the handler of listener `key`) inside the failure boundary.
pub(crate) async fn run_listener<F>(event: &EventRef, key: &str, fut: F)
where
    F: Future<Output = Result<(), HandlerError>>,
{
    event.report(key, EventState::Emitted);

    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(())) => {
            event.report_if(key, EventState::Emitted, EventState::Resolved);
        }
        Ok(Err(err)) => {
            tracing::warn!(
                event_id = event.id(),
                event_type = event.event_type(),
                listener = key,
                error = %err,
                "listener failed"
            );
            event.report(key, EventState::Error);
        }
        Err(panic_err) => {
            tracing::error!(
                event_id = event.id(),
                event_type = event.event_type(),
                listener = key,
                panic = %panic_message(panic_err.as_ref()),
                "listener panicked"
            );
            event.report(key, EventState::Error);
        }
    }
}

/// Invokes the event's finalizer if the event is terminal and nobody finalized it yet.
pub(crate) async fn finalize(event: &EventRef) {
    if !event.take_finalize() {
        return;
    }
    tracing::debug!(
        event_id = event.id(),
        event_type = event.event_type(),
        state = event.state().as_label(),
        "event finalized"
    );

    let Some(finalizer) = event.finalizer().cloned() else {
        return;
    };
    let fut = finalizer.finalize(Arc::clone(event));
    if let Err(panic_err) = AssertUnwindSafe(fut).catch_unwind().await {
        tracing::error!(
            event_id = event.id(),
            event_type = event.event_type(),
            panic = %panic_message(panic_err.as_ref()),
            "finalizer panicked"
        );
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
