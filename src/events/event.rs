//! # Events routed through the switch.
//!
//! An [`Event`] is built by application code with a type tag and a payload, then handed
//! to an [`Emitter`](crate::Emitter). Emission stamps it with an identifier, the number of
//! listeners expected to report, and the switch's finalizer; from then on it is shared
//! as an [`EventRef`] by the dispatcher, every listener and the caller.
//!
//! ## Metadata
//! - **Immutable after emission**: `id`, `event_type`, `payload`, `total_listeners`.
//! - **Guarded by the event lock**: aggregate state, per-listener states, lock flag,
//!   abort reason and the metadata bag.
//!
//! ## Rules
//! - The event is **locked** the instant it passes the interceptor phase.
//! - After the lock, [`Event::abort`] is a no-op and [`Event::add_metadata`] fails.
//! - Metadata keys are set **at most once**.
//!
//! ## Example
//! ```rust
//! use evswitch::{Event, EventState};
//! use serde_json::json;
//!
//! let ev = Event::new("user.created")
//!     .with_payload("user_id", json!(42))
//!     .with_payload("email", "alice@example.com");
//!
//! assert_eq!(ev.event_type(), "user.created");
//! assert_eq!(ev.payload()["user_id"], json!(42));
//! assert_eq!(ev.state(), EventState::Emitted);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::error::ConfigError;
use crate::events::state::{EventState, Tracking};
use crate::listeners::{Finalize, Intercept};

/// Shared handle to an emitted event.
pub type EventRef = Arc<Event>;

/// A typed message with payload and dispatch metadata.
pub struct Event {
    event_type: Arc<str>,
    payload: HashMap<String, Value>,

    id: u64,
    total_listeners: usize,
    finalizer: Option<Arc<dyn Finalize>>,
    tracking: Mutex<Tracking>,
}

impl Event {
    /// Creates an event of the given type with an empty payload.
    pub fn new(event_type: impl Into<Arc<str>>) -> Self {
        Self {
            event_type: event_type.into(),
            payload: HashMap::new(),
            id: 0,
            total_listeners: 0,
            finalizer: None,
            tracking: Mutex::new(Tracking::default()),
        }
    }

    /// Adds a payload entry.
    #[inline]
    pub fn with_payload(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Replaces the whole payload.
    #[inline]
    pub fn with_payload_map(mut self, payload: HashMap<String, Value>) -> Self {
        self.payload = payload;
        self
    }

    /// Identifier assigned by the emitting switch (`0` until emitted).
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Type tag used to route the event to receivers.
    #[inline]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Application payload.
    #[inline]
    pub fn payload(&self) -> &HashMap<String, Value> {
        &self.payload
    }

    /// Number of listener slots expected to report (interceptors + receivers of this type).
    #[inline]
    pub fn total_listeners(&self) -> usize {
        self.total_listeners
    }

    /// Current aggregate state.
    pub fn state(&self) -> EventState {
        self.tracking().state
    }

    /// Copy of the per-listener states, taken under the event lock.
    pub fn states(&self) -> HashMap<String, EventState> {
        self.tracking().states.clone()
    }

    /// State reported by one listener, if it touched this event.
    pub fn listener_state(&self, key: &str) -> Option<EventState> {
        self.tracking().states.get(key).copied()
    }

    /// Returns `true` once the event passed its interceptors.
    pub fn is_locked(&self) -> bool {
        self.tracking().locked
    }

    /// Reason recorded by the aborting interceptor, if any.
    pub fn abort_reason(&self) -> Option<String> {
        self.tracking().abort_reason.clone()
    }

    /// Stops the processing of the event.
    ///
    /// Only meaningful from an interceptor, before the event is locked: the aggregate
    /// state becomes [`EventState::Aborted`], no further interceptor or receiver runs and
    /// the finalizer is invoked once. On a locked event this is a no-op.
    pub fn abort<I>(&self, by: &I, reason: impl Into<String>)
    where
        I: Intercept + ?Sized,
    {
        let reason = reason.into();
        if self.tracking().abort(reason.clone()) {
            tracing::debug!(
                event_id = self.id,
                event_type = %self.event_type,
                listener = by.key(),
                reason = %reason,
                "event aborted"
            );
        }
    }

    /// Adds a metadata key/value pair.
    ///
    /// Fails with [`ConfigError::EventLocked`] once the event is locked, and with
    /// [`ConfigError::DuplicateMetadata`] if the key already exists.
    pub fn add_metadata(
        &self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), ConfigError> {
        let key = key.into();
        let mut t = self.tracking();
        if t.locked {
            return Err(ConfigError::EventLocked { id: self.id });
        }
        if t.data.contains_key(&key) {
            return Err(ConfigError::DuplicateMetadata { id: self.id, key });
        }
        t.data.insert(key, value.into());
        Ok(())
    }

    /// Returns a copy of a metadata value.
    pub fn metadata(&self, key: &str) -> Option<Value> {
        self.tracking().data.get(key).cloned()
    }

    // ---------------------------
    // Dispatcher side
    // ---------------------------

    /// Stamps emission metadata. Called by the emitter before the event is shared.
    pub(crate) fn stamp(
        &mut self,
        id: u64,
        total_listeners: usize,
        finalizer: Option<Arc<dyn Finalize>>,
    ) {
        self.id = id;
        self.total_listeners = total_listeners;
        self.finalizer = finalizer;
        *self.tracking.get_mut().unwrap_or_else(PoisonError::into_inner) =
            Tracking::with_capacity(total_listeners);
    }

    pub(crate) fn finalizer(&self) -> Option<&Arc<dyn Finalize>> {
        self.finalizer.as_ref()
    }

    /// Records a listener transition; `true` if it made the aggregate terminal.
    pub(crate) fn report(&self, key: &str, state: EventState) -> bool {
        self.tracking().report(key, state, self.total_listeners)
    }

    /// Records a transition only if the listener is still in `expected`.
    pub(crate) fn report_if(&self, key: &str, expected: EventState, state: EventState) -> bool {
        self.tracking()
            .report_if(key, expected, state, self.total_listeners)
    }

    /// Recomputes the aggregate without a listener transition.
    pub(crate) fn settle(&self) -> bool {
        self.tracking().settle(self.total_listeners)
    }

    /// Locks the event for receiver delivery.
    /// Locks the event unless it is already aborted; returns whether it was locked.
    pub(crate) fn lock_for_delivery(&self) -> bool {
        self.tracking().lock()
    }

    pub(crate) fn take_finalize(&self) -> bool {
        self.tracking().take_finalize()
    }

    // Critical sections never panic; a poisoned lock still holds consistent data.
    fn tracking(&self) -> MutexGuard<'_, Tracking> {
        self.tracking.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.tracking();
        f.debug_struct("Event")
            .field("id", &self.id)
            .field("event_type", &self.event_type)
            .field("payload", &self.payload)
            .field("state", &t.state)
            .field("states", &t.states)
            .field("locked", &t.locked)
            .field("total_listeners", &self.total_listeners)
            .field("abort_reason", &t.abort_reason)
            .finish()
    }
}
