//! # Finalizer trait.
//!
//! A [`Finalize`] implementation is bound to the switch (one per switch) and snapshotted
//! into every event at emission time, so reconfiguring the switch never affects events
//! already in flight.
//!
//! ## Rules
//! - Invoked **exactly once** per event, after its aggregate state became terminal
//!   (`Resolved`, `Error` or `Aborted`).
//! - Runs in the task that completed the event; panics are caught and logged.
//! - Events dropped by [`EventSwitch::close`](crate::EventSwitch::close) are never finalized.

use async_trait::async_trait;

use crate::events::EventRef;

/// Terminal callback invoked once per event.
#[async_trait]
pub trait Finalize: Send + Sync + 'static {
    async fn finalize(&self, event: EventRef);
}
