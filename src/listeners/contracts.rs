//! # Identity and lifecycle contracts.
//!
//! Small capabilities any participant may implement:
//! - [`Identify`] names a participant; the key indexes per-listener event state.
//! - [`Prioritize`] orders init hooks (lower runs first).
//! - [`OnInit`] / [`OnClose`] hooks driven by the switch lifecycle.
//!
//! Default implementations are provided, so `impl Identify for MyType {}` is enough
//! to get a key derived from the type name.

use async_trait::async_trait;

use crate::error::HandlerError;

/// Names a participant.
pub trait Identify {
    /// Returns the key used to index this participant's per-listener state.
    ///
    /// Keys must be unique among the listeners of a switch. The default uses
    /// `type_name::<Self>()`; override it when several instances of one type are registered.
    fn key(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Orders participants; lower is sooner. Default is `0`.
pub trait Prioritize {
    fn priority(&self) -> i32 {
        0
    }
}

/// Hook run during the first successful [`EventSwitch::start`](crate::EventSwitch::start).
///
/// Hooks run sequentially in ascending [`Prioritize::priority`]; the first failure
/// aborts the start and leaves the switch stopped.
#[async_trait]
pub trait OnInit: Identify + Prioritize + Send + Sync + 'static {
    async fn on_init(&self) -> Result<(), HandlerError>;
}

/// Hook run once when the switch is closed. Failures are logged.
#[async_trait]
pub trait OnClose: Identify + Send + Sync + 'static {
    async fn on_close(&self) -> Result<(), HandlerError>;
}
