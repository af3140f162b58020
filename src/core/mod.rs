//! Runtime core: registry, dispatch and lifecycle.
//!
//! The only public API from this module is [`EventSwitch`] (with its builder and
//! [`SwitchConfig`]), which owns registration, dispatch and shutdown.
//!
//! Internal modules:
//! - [`registry`]: listeners registered while stopped, frozen into a routing table on start;
//! - [`dispatch`]: intake loop and per-event orchestration;
//! - [`boundary`]: per-listener panic/error isolation and exactly-once finalization;
//! - [`switch`]: lifecycle state machine and graceful drain;
//! - [`builder`]: up-front registration.
//!
//! ## System wiring
//! ```text
//!   Emitter::emit ──► Intake (bounded, flume) ──► intake loop ──► orchestrate(event)
//!                                                                     │
//!                         interceptors (ascending priority, one at a time)
//!                                                                     │
//!                                         abort? ──► finalize         │ lock
//!                                                                     ▼
//!                                                  receivers (JoinSet, concurrent)
//!                                                                     │
//!                                                       finalize (exactly once)
//! ```

mod boundary;
mod builder;
mod config;
mod dispatch;
mod registry;
mod switch;

pub use builder::EventSwitchBuilder;
pub use config::SwitchConfig;
pub use switch::EventSwitch;
