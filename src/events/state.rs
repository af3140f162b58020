//! # Per-event dispatch state.
//!
//! [`EventState`] is used twice: once per listener key (how far that listener got)
//! and once for the event as a whole (the aggregate).
//!
//! ## Aggregate rules
//! ```text
//! Emitted ──► Aborted   (interceptor veto, bypasses listener accounting)
//!    │
//!    └──────► Resolved  (every expected listener reported, none failed)
//!    └──────► Error     (every expected listener reported, at least one failed)
//! ```
//! - A terminal aggregate never changes again.
//! - `Resolved`/`Error` require `Resolved + Error == total_listeners`
//!   and no listener left in `Emitted`.
//! - The finalizer is released once, to whichever caller first observes the
//!   terminal aggregate through [`Tracking::take_finalize`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Dispatch state of an event, for one listener or for the whole event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventState {
    /// In flight (default).
    #[default]
    Emitted,
    /// Listener succeeded, or every listener of the event succeeded.
    Resolved,
    /// An interceptor vetoed further processing.
    Aborted,
    /// A listener returned an error or panicked.
    Error,
}

impl EventState {
    /// Returns `true` for every state except [`EventState::Emitted`].
    #[inline]
    pub fn is_terminal(self) -> bool {
        !matches!(self, EventState::Emitted)
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            EventState::Emitted => "emitted",
            EventState::Resolved => "resolved",
            EventState::Aborted => "aborted",
            EventState::Error => "error",
        }
    }
}

/// Mutable part of an event's metadata, always accessed under the event lock.
#[derive(Debug, Default)]
pub(crate) struct Tracking {
    pub(crate) state: EventState,
    pub(crate) states: HashMap<String, EventState>,
    pub(crate) locked: bool,
    pub(crate) abort_reason: Option<String>,
    pub(crate) data: HashMap<String, Value>,
    finalized: bool,
}

impl Tracking {
    pub(crate) fn with_capacity(listeners: usize) -> Self {
        Self {
            states: HashMap::with_capacity(listeners),
            ..Self::default()
        }
    }

    /// Records `state` for `key` and recomputes the aggregate.
    ///
    /// Returns `true` only for the call that moved the aggregate to a terminal state.
    pub(crate) fn report(&mut self, key: &str, state: EventState, total: usize) -> bool {
        self.states.insert(key.to_owned(), state);
        self.settle(total)
    }

    /// Like [`report`](Self::report), but only if `key` is currently in `expected`.
    pub(crate) fn report_if(
        &mut self,
        key: &str,
        expected: EventState,
        state: EventState,
        total: usize,
    ) -> bool {
        if self.states.get(key).copied().unwrap_or_default() != expected {
            return false;
        }
        self.report(key, state, total)
    }

    /// Recomputes the aggregate from listener states.
    ///
    /// A terminal aggregate short-circuits: returns `false` without touching it.
    pub(crate) fn settle(&mut self, total: usize) -> bool {
        if self.state.is_terminal() || self.states.len() < total {
            return false;
        }

        let mut resolved = 0;
        let mut errors = 0;
        for s in self.states.values() {
            match s {
                EventState::Resolved => resolved += 1,
                EventState::Error => errors += 1,
                EventState::Emitted => return false,
                EventState::Aborted => {}
            }
        }
        if resolved + errors != total {
            return false;
        }

        self.state = if errors > 0 {
            EventState::Error
        } else {
            EventState::Resolved
        };
        true
    }

    /// Moves the aggregate to `Aborted` unless the event is locked or already terminal.
    pub(crate) fn abort(&mut self, reason: String) -> bool {
        if self.locked || self.state.is_terminal() {
            return false;
        }
        self.state = EventState::Aborted;
        self.abort_reason = Some(reason);
        true
    }

    /// Locks the event for delivery unless it was aborted first.
    ///
    /// Returns `false` for an aborted event; it stays unlocked and must not reach receivers.
    pub(crate) fn lock(&mut self) -> bool {
        if self.state == EventState::Aborted {
            return false;
        }
        self.locked = true;
        true
    }

    /// Hands out the right to run the finalizer, at most once and only once terminal.
    pub(crate) fn take_finalize(&mut self) -> bool {
        if !self.state.is_terminal() || self.finalized {
            return false;
        }
        self.finalized = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_once_all_listeners_report() {
        let mut t = Tracking::with_capacity(2);
        assert!(!t.report("a", EventState::Emitted, 2));
        assert!(!t.report("a", EventState::Resolved, 2));
        assert_eq!(t.state, EventState::Emitted);

        assert!(!t.report("b", EventState::Emitted, 2));
        assert!(t.report("b", EventState::Resolved, 2));
        assert_eq!(t.state, EventState::Resolved);

        // terminal aggregate never moves again
        assert!(!t.report("b", EventState::Error, 2));
        assert_eq!(t.state, EventState::Resolved);
    }

    #[test]
    fn test_any_error_makes_aggregate_error() {
        let mut t = Tracking::with_capacity(3);
        t.report("a", EventState::Resolved, 3);
        t.report("b", EventState::Error, 3);
        assert!(t.report("c", EventState::Resolved, 3));
        assert_eq!(t.state, EventState::Error);
    }

    #[test]
    fn test_pending_listener_blocks_aggregate() {
        let mut t = Tracking::with_capacity(2);
        t.report("a", EventState::Resolved, 2);
        t.report("b", EventState::Emitted, 2);
        assert!(!t.settle(2));
        assert_eq!(t.state, EventState::Emitted);
    }

    #[test]
    fn test_zero_listeners_settle_to_resolved() {
        let mut t = Tracking::with_capacity(0);
        assert!(t.settle(0));
        assert_eq!(t.state, EventState::Resolved);
    }

    #[test]
    fn test_report_if_only_promotes_expected_state() {
        let mut t = Tracking::with_capacity(1);
        t.report("a", EventState::Error, 1);
        assert!(!t.report_if("a", EventState::Emitted, EventState::Resolved, 1));
        assert_eq!(t.states["a"], EventState::Error);
    }

    #[test]
    fn test_abort_is_refused_when_locked() {
        let mut t = Tracking::with_capacity(1);
        t.locked = true;
        assert!(!t.abort("late".into()));
        assert_eq!(t.state, EventState::Emitted);
        assert!(t.abort_reason.is_none());
    }

    #[test]
    fn test_lock_refused_after_abort() {
        let mut t = Tracking::with_capacity(1);
        assert!(t.abort("vetoed".into()));
        assert!(!t.lock());
        assert!(!t.locked);
        assert_eq!(t.state, EventState::Aborted);

        let mut t = Tracking::with_capacity(1);
        assert!(t.lock());
        assert!(!t.abort("late".into()));
    }

    #[test]
    fn test_abort_short_circuits_accounting() {
        let mut t = Tracking::with_capacity(2);
        t.report("gate", EventState::Emitted, 2);
        assert!(t.abort("denied".into()));
        assert!(!t.report("gate", EventState::Resolved, 2));
        assert_eq!(t.state, EventState::Aborted);
        assert_eq!(t.abort_reason.as_deref(), Some("denied"));
    }

    #[test]
    fn test_finalize_handed_out_once() {
        let mut t = Tracking::with_capacity(0);
        assert!(!t.take_finalize());
        t.settle(0);
        assert!(t.take_finalize());
        assert!(!t.take_finalize());
    }
}
