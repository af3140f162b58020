//! # Capability discovery.
//!
//! A [`Component`] is an application object that may play several roles at once.
//! Each role is an optional projection; [`EventSwitch::register`](crate::EventSwitch::register)
//! asks for every projection and registers the ones that are present.
//!
//! ```text
//! register(component)
//!     ├─► as_emitter()      → add_emitter
//!     ├─► as_receiver()     → add_receiver
//!     ├─► as_interceptor()  → add_interceptor
//!     ├─► as_finalizer()    → with_finalizer
//!     ├─► as_initializer()  → init hook (run on start)
//!     └─► as_closer()       → close hook (run on close)
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use evswitch::{Component, EventRef, HandlerError, Identify, Receive};
//!
//! struct Audit;
//!
//! impl Identify for Audit {
//!     fn key(&self) -> &str { "audit" }
//! }
//!
//! #[async_trait]
//! impl Receive for Audit {
//!     fn event_types(&self) -> Vec<String> { vec!["order.placed".into()] }
//!     async fn receive(&self, _event: EventRef) -> Result<(), HandlerError> { Ok(()) }
//! }
//!
//! impl Component for Audit {
//!     /// Receiver role.
//!     fn as_receiver(self: Arc<Self>) -> Option<Arc<dyn Receive>> { Some(self) }
//! }
//! ```

use std::sync::Arc;

use crate::events::Emitter;
use crate::listeners::{Finalize, Identify, Intercept, OnClose, OnInit, Receive};

/// Application object exposing any subset of the switch capabilities.
pub trait Component: Identify + Send + Sync + 'static {
    /// Emitter to bind on start.
    fn as_emitter(&self) -> Option<Emitter> {
        None
    }

    fn as_receiver(self: Arc<Self>) -> Option<Arc<dyn Receive>> {
        None
    }

    /// Interceptor role.
    fn as_interceptor(self: Arc<Self>) -> Option<Arc<dyn Intercept>> {
        None
    }

    /// Event finalizer; replaces any finalizer set before.
    fn as_finalizer(self: Arc<Self>) -> Option<Arc<dyn Finalize>> {
        None
    }

    /// Hook run once, on the first successful start.
    fn as_initializer(self: Arc<Self>) -> Option<Arc<dyn OnInit>> {
        None
    }

    /// Hook run once, on close.
    fn as_closer(self: Arc<Self>) -> Option<Arc<dyn OnClose>> {
        None
    }
}

/// Roles found on a registered [`Component`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub emitter: bool,
    pub receiver: bool,
    pub interceptor: bool,
    pub finalizer: bool,
    pub initializer: bool,
    pub closer: bool,
}

impl Capabilities {
    /// Returns `true` if the component exposed no role at all.
    pub fn is_empty(&self) -> bool {
        *self == Capabilities::default()
    }
}
