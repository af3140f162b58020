//! # evswitch
//!
//! **evswitch** is an in-process event switch for async Rust.
//!
//! Producers emit typed events into a bounded intake; each event is run through an
//! ordered chain of interceptors that may veto it, then fanned out concurrently to every
//! receiver subscribed to its type. Per-listener and aggregate state is tracked on the
//! event itself, listener failures (errors and panics) are isolated, and a finalizer is
//! called exactly once per event. Shutdown is either abrupt (`close`) or a full drain
//! (`close_gracefully`).
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Emitter    │   │   Emitter    │   │   Emitter    │
//!     │ (producer 1) │   │ (producer 2) │   │ (producer N) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │ emit(event): id, listener count, finalizer, token
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                Intake (bounded channel, backpressure)             │
//! │                  (capacity: SwitchConfig::buffer_size)            │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │      intake loop       │
//!                       │  (one task per event)  │
//!                       └───────────┬────────────┘
//!                                   ▼
//!              Interceptor(p=-5) ─► Interceptor(p=0) ─► Interceptor(p=10)
//!                (sequential; any of them may abort the event)
//!                                   │
//!                  aborted ◄────────┤ locked
//!                     │             ▼
//!                     │   ┌─────────┼─────────┐
//!                     │   ▼         ▼         ▼
//!                     │ recv 1    recv 2    recv N     (concurrent, isolated)
//!                     │   └─────────┼─────────┘
//!                     ▼             ▼
//!                  Finalizer (exactly once per event)
//! ```
//!
//! ### Event states
//! ```text
//! per listener:  Emitted ──► Resolved | Error
//! aggregate:     Emitted ──► Aborted                     (interceptor veto)
//!                        └─► Resolved | Error            (all listeners reported)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Switch**        | Registration, start/stop, abrupt and graceful close.         | [`EventSwitch`], [`EventSwitchBuilder`]     |
//! | **Events**        | Typed payload, shared dispatch state, metadata.              | [`Event`], [`EventRef`], [`EventState`]     |
//! | **Producers**     | Bounded, backpressured emission.                             | [`Emitter`], [`IdGenerator`]                |
//! | **Listeners**     | Receivers, interceptors, finalizers and closure adapters.    | [`Receive`], [`Intercept`], [`Finalize`]    |
//! | **Components**    | Capability discovery and lifecycle hooks.                    | [`Component`], [`OnInit`], [`OnClose`]      |
//! | **Errors**        | Typed configuration, emission and handler errors.            | [`ConfigError`], [`EmitError`], [`SwitchError`] |
//! | **Configuration** | Buffer size, seed, grace period.                             | [`SwitchConfig`]                            |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogFinalizer`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use evswitch::{
//!     Event, EventRef, EventState, EventSwitch, HandlerError, InterceptorFn, ReceiverFn,
//!     SwitchConfig, Verdict,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let switch = EventSwitch::builder(SwitchConfig::default())
//!         .with_interceptor(InterceptorFn::arc("auth", 0, |ev: EventRef| async move {
//!             if ev.payload().contains_key("token") {
//!                 Ok::<_, HandlerError>(Verdict::Pass)
//!             } else {
//!                 Ok(Verdict::Abort("missing token".into()))
//!             }
//!         }))
//!         .with_receiver(ReceiverFn::arc("audit", ["order.placed"], |ev: EventRef| async move {
//!             println!("order event {}", ev.id());
//!             Ok::<_, HandlerError>(())
//!         }))
//!         .build()?;
//!
//!     let emitter = switch.emitter()?;
//!     switch.start().await?;
//!
//!     let ok = emitter
//!         .emit(Event::new("order.placed").with_payload("token", "t-1"))
//!         .await?;
//!     let denied = emitter.emit(Event::new("order.placed")).await?;
//!
//!     switch.close_gracefully().await?;
//!     assert_eq!(ok.state(), EventState::Resolved);
//!     assert_eq!(denied.state(), EventState::Aborted);
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod listeners;

// ---- Public re-exports ----

pub use core::{EventSwitch, EventSwitchBuilder, SwitchConfig};
pub use error::{ConfigError, EmitError, HandlerError, SwitchError};
pub use events::{Emitter, Event, EventRef, EventState, IdGenerator, SequenceGenerator};
pub use listeners::{
    Capabilities, Component, Finalize, FinalizerFn, Identify, Intercept, InterceptorFn, OnClose,
    OnInit, Prioritize, Receive, ReceiverFn, Verdict,
};

// Optional: expose a simple built-in logging finalizer (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use listeners::LogFinalizer;
