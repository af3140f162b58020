//! Error types used by the event switch and its listeners.
//!
//! This module defines four enums:
//!
//! - [`ConfigError`]: configuration mistakes reported synchronously to the caller
//!   (registering while running, duplicate priorities, reseeding, locked metadata).
//! - [`EmitError`]: an emitter could not hand an event to the switch.
//! - [`HandlerError`]: returned by receivers, interceptors and lifecycle hooks.
//! - [`SwitchError`]: failures of the switch lifecycle itself.
//!
//! None of them is fatal to the switch. Every enum provides `as_label` for logs/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Configuration errors.
///
/// Raised at the point of the offending call; the switch keeps its current state.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A registration or configuration call was made while the switch is running.
    #[error("can't {action} while the switch is running")]
    AlreadyRunning {
        /// What the caller tried to do (e.g. "add a receiver").
        action: &'static str,
    },

    /// The switch has been closed and can no longer be configured or started.
    #[error("can't {action}: the switch is closed")]
    Closed {
        /// What the caller tried to do.
        action: &'static str,
    },

    /// Another interceptor already holds this priority.
    #[error("another interceptor ({existing}) already declared on priority {priority}")]
    DuplicatePriority {
        /// The contested priority.
        priority: i32,
        /// Key of the interceptor that owns it.
        existing: String,
    },

    /// A listener with the same key is already registered.
    #[error("a listener with key '{key}' is already registered")]
    DuplicateKey {
        /// The contested key.
        key: String,
    },

    /// The generator seed was already set once.
    #[error("generator seed can be changed only once")]
    SeedAlreadySet,

    /// The generator already issued identifiers; reseeding would break ordering.
    #[error("generator seed can't be changed after identifiers were issued")]
    SeedAfterIssue,

    /// Metadata mutation on an event that already passed its interceptors.
    #[error("event id {id} already locked")]
    EventLocked {
        /// Identifier of the locked event.
        id: u64,
    },

    /// Metadata key set twice on the same event.
    #[error("the key '{key}' already exists on event id {id}")]
    DuplicateMetadata {
        /// Identifier of the event.
        id: u64,
        /// The contested metadata key.
        key: String,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use evswitch::ConfigError;
    ///
    /// let err = ConfigError::AlreadyRunning { action: "add a receiver" };
    /// assert_eq!(err.as_label(), "config_already_running");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::AlreadyRunning { .. } => "config_already_running",
            ConfigError::Closed { .. } => "config_closed",
            ConfigError::DuplicatePriority { .. } => "config_duplicate_priority",
            ConfigError::DuplicateKey { .. } => "config_duplicate_key",
            ConfigError::SeedAlreadySet => "config_seed_already_set",
            ConfigError::SeedAfterIssue => "config_seed_after_issue",
            ConfigError::EventLocked { .. } => "config_event_locked",
            ConfigError::DuplicateMetadata { .. } => "config_duplicate_metadata",
        }
    }
}

/// Error returned by [`Emitter::emit`](crate::Emitter::emit).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitError {
    /// The emitter was never handed to a started switch.
    #[error("emitter is not bound to a started switch")]
    NotBound,

    /// The switch was closed; its intake channel is gone.
    #[error("event switch closed")]
    Closed,
}

impl EmitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EmitError::NotBound => "emit_not_bound",
            EmitError::Closed => "emit_closed",
        }
    }
}

/// # Errors returned by listeners and lifecycle hooks.
///
/// A handler error marks that listener's state as `Error` for the event.
/// It is logged and never propagated to the emitter or to sibling listeners.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The handler failed while processing.
    #[error("handler failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// The handler refused the event (bad payload, unexpected type, ...).
    #[error("event rejected: {reason}")]
    Rejected {
        /// Why the event was refused.
        reason: String,
    },
}

impl HandlerError {
    /// Shorthand for [`HandlerError::Failed`].
    pub fn failed(error: impl Into<String>) -> Self {
        HandlerError::Failed {
            error: error.into(),
        }
    }

    /// Shorthand for [`HandlerError::Rejected`].
    pub fn rejected(reason: impl Into<String>) -> Self {
        HandlerError::Rejected {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use evswitch::HandlerError;
    ///
    /// assert_eq!(HandlerError::failed("boom").as_label(), "handler_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Failed { .. } => "handler_failed",
            HandlerError::Rejected { .. } => "handler_rejected",
        }
    }
}

/// # Errors produced by the switch lifecycle.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SwitchError {
    /// A configuration error surfaced by a lifecycle call.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An init hook failed during `start`; the switch stayed stopped.
    #[error("init hook of '{key}' failed: {error}")]
    Init {
        /// Key of the component whose hook failed.
        key: String,
        /// The hook's error.
        error: HandlerError,
    },

    /// Graceful close did not drain within the configured grace period.
    #[error("graceful close timeout {grace:?} exceeded; {in_flight} events still in flight")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Events still accounted for when the switch was closed.
        in_flight: usize,
    },
}

impl SwitchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SwitchError::Config(e) => e.as_label(),
            SwitchError::Init { .. } => "switch_init_failed",
            SwitchError::GraceExceeded { .. } => "switch_grace_exceeded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::DuplicatePriority {
            priority: 3,
            existing: "audit".into(),
        };
        assert_eq!(
            err.to_string(),
            "another interceptor (audit) already declared on priority 3"
        );
        assert_eq!(err.as_label(), "config_duplicate_priority");

        let err = ConfigError::EventLocked { id: 42 };
        assert_eq!(err.to_string(), "event id 42 already locked");
    }

    #[test]
    fn test_switch_error_wraps_config_label() {
        let err: SwitchError = ConfigError::Closed { action: "start" }.into();
        assert_eq!(err.as_label(), "config_closed");
        assert_eq!(err.to_string(), "can't start: the switch is closed");
    }

    #[test]
    fn test_handler_error_helpers() {
        assert_eq!(
            HandlerError::rejected("bad payload").to_string(),
            "event rejected: bad payload"
        );
        assert_eq!(EmitError::Closed.as_label(), "emit_closed");
    }
}
