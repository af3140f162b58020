//! # Interceptor trait.
//!
//! Every event handled by the switch goes through all interceptors before any receiver
//! sees it. Interceptors run **sequentially**, in ascending
//! [`intercept_priority`](Intercept::intercept_priority); priorities are unique per switch.
//!
//! ## Flow
//! ```text
//! event ──► interceptor(p=1) ──► interceptor(p=5) ──► interceptor(p=9) ──► lock ──► receivers
//!                 │                     │
//!                 └── abort ────────────┴──► Aborted ──► finalizer (no receiver runs)
//! ```
//!
//! An interceptor vetoes an event with [`Event::abort`](crate::Event::abort).

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::events::EventRef;
use crate::listeners::Identify;

/// Priority-ordered gatekeeper that runs before receivers and may abort an event.
///
/// # Example
/// ```rust
/// use async_trait::async_trait;
/// use evswitch::{EventRef, HandlerError, Identify, Intercept};
///
/// struct RateGate;
///
/// impl Identify for RateGate {}
///
/// #[async_trait]
/// impl Intercept for RateGate {
///     fn intercept_priority(&self) -> i32 { 10 }
///
///     async fn intercept(&self, event: EventRef) -> Result<(), HandlerError> {
///         if event.id() % 10 == 0 {
///             event.abort(self, "sampled out");
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Intercept: Identify + Send + Sync + 'static {
    /// Position in the interceptor chain; lower runs first.
    fn intercept_priority(&self) -> i32;

    /// Inspects (and possibly aborts) one event.
    async fn intercept(&self, event: EventRef) -> Result<(), HandlerError>;
}

/// Outcome of a function-backed interceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Let the event continue.
    Pass,
    /// Abort the event with the given reason.
    Abort(String),
}
