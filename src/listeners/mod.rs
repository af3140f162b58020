//! # Listener contracts for the event switch.
//!
//! Participants plug into the switch through capability traits:
//!
//! ## Architecture
//! ```text
//! Emitter ──► intake ──► Intercept (sequential, by priority) ──► lock
//!                                   │                             │
//!                                   └── abort ──┐                 ▼
//!                                               │       Receive (concurrent fan-out)
//!                                               ▼                 │
//!                                            Finalize ◄───────────┘  (once per event)
//! ```
//!
//! ## Contracts
//! - [`Identify`] / [`Prioritize`] naming and ordering
//! - [`Receive`] subscriber for declared event types
//! - [`Intercept`] gatekeeper that may abort events
//! - [`Finalize`] terminal callback
//! - [`OnInit`] / [`OnClose`] lifecycle hooks
//! - [`Component`] bundles any subset of the above for [`register`](crate::EventSwitch::register)
//!
//! ## Function-backed adapters
//! [`ReceiverFn`], [`InterceptorFn`], [`FinalizerFn`] wrap closures.

mod component;
mod contracts;
mod finalizer;
mod interceptor;
mod listener_fn;
mod receiver;

#[cfg(feature = "logging")]
mod embedded;

pub use component::{Capabilities, Component};
pub use contracts::{Identify, OnClose, OnInit, Prioritize};
pub use finalizer::Finalize;
pub use interceptor::{Intercept, Verdict};
pub use listener_fn::{FinalizerFn, InterceptorFn, ReceiverFn};
pub use receiver::Receive;

#[cfg(feature = "logging")]
pub use embedded::LogFinalizer;
