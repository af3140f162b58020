//! Events: data model, identifiers and the intake path.
//!
//! This module groups the **event** (payload plus shared dispatch metadata), its
//! **state** accounting, the **generator** of identifiers, and the **emitter** /
//! **intake** pair that moves stamped events into the switch.
//!
//! ## Contents
//! - [`Event`], [`EventRef`] the unit of dispatch
//! - [`EventState`] per-listener and aggregate states
//! - [`IdGenerator`], [`SequenceGenerator`] identifier sources
//! - [`Emitter`] producer handle
//!
//! See `core/mod.rs` for the system-level wiring diagram.

mod emitter;
mod event;
mod generator;
mod intake;
mod state;

pub use emitter::Emitter;
pub use event::{Event, EventRef};
pub use generator::{IdGenerator, SequenceGenerator};
pub use state::EventState;

pub(crate) use emitter::{Binding, ListenerCounts};
pub(crate) use intake::{Envelope, Intake};
