//! # Event receiver trait.
//!
//! Provides [`Receive`], the subscriber side of the switch.
//!
//! Each receiver gets:
//! - **One task per event** (fan-out is concurrent and unordered across receivers)
//! - **Panic isolation** (a panic marks this receiver's state `Error` for that event)
//! - **Events only after interceptors passed** (the event is locked by then)
//!
//! ## Architecture
//! ```text
//! orchestration ──► receivers_for(event_type)
//!                      ├──► task ──► receiver1.receive(event)
//!                      ├──► task ──► receiver2.receive(event)
//!                      └──► task ──► receiverN.receive(event)
//!                                      └─► Ok → Resolved, Err/panic → Error
//! ```
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use evswitch::{EventRef, HandlerError, Identify, Receive};
//!
//! struct Mailer;
//!
//! impl Identify for Mailer {
//!     fn key(&self) -> &str { "mailer" }
//! }
//!
//! #[async_trait]
//! impl Receive for Mailer {
//!     fn event_types(&self) -> Vec<String> {
//!         vec!["user.created".into()]
//!     }
//!
//!     async fn receive(&self, event: EventRef) -> Result<(), HandlerError> {
//!         let email = event.payload().get("email").ok_or_else(|| HandlerError::rejected("no email"))?;
//!         // send the mail...
//!         let _ = email;
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::events::EventRef;
use crate::listeners::Identify;

/// Subscriber invoked asynchronously for every event of the types it declares.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Return errors instead of panicking; both are recorded as `Error`, but only
///   errors carry a readable reason into the logs.
#[async_trait]
pub trait Receive: Identify + Send + Sync + 'static {
    /// Event types this receiver subscribes to. Read once, at registration.
    fn event_types(&self) -> Vec<String>;

    /// Handles one event.
    async fn receive(&self, event: EventRef) -> Result<(), HandlerError>;
}
