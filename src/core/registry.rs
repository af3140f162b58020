//! # Listener registry.
//!
//! Holds everything registered on a stopped switch and freezes it into a read-only
//! [`Routing`] table when the switch starts.
//!
//! ## Architecture
//! ```text
//! add_receiver(r)    ──► receivers[type] += r   (for each declared type)
//! add_interceptor(i) ──► interceptors[priority] = i
//! add_emitter(e)     ──► emitters += e
//!          │
//!          ▼ start()
//! Routing { interceptors (ascending), receivers by type, ListenerCounts }
//! ```
//!
//! ## Rules
//! - Mutated only while the switch is stopped; `Routing` is shared read-only while running.
//! - Interceptor priorities are unique.
//! - Listener keys are unique across receivers and interceptors (they index event state).
//! - A receiver declaring the same type twice is subscribed once.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::error::ConfigError;
use crate::events::{Emitter, IdGenerator, ListenerCounts, SequenceGenerator};
use crate::listeners::{Capabilities, Component, Finalize, Intercept, OnClose, OnInit, Receive};

/// Read-only dispatch table used while the switch is running.
pub(crate) struct Routing {
    pub(crate) interceptors: Vec<Arc<dyn Intercept>>,
    pub(crate) receivers: HashMap<String, Vec<Arc<dyn Receive>>>,
    pub(crate) counts: Arc<ListenerCounts>,
}

impl Routing {
    /// Receivers subscribed to `event_type` (empty if none).
    pub(crate) fn receivers_for(&self, event_type: &str) -> &[Arc<dyn Receive>] {
        self.receivers
            .get(event_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Mutable registry of a stopped switch.
pub(crate) struct Registry {
    pub(crate) emitters: Vec<Emitter>,
    receivers: HashMap<String, Vec<Arc<dyn Receive>>>,
    interceptors: BTreeMap<i32, Arc<dyn Intercept>>,
    keys: HashSet<String>,
    pub(crate) generator: Arc<dyn IdGenerator>,
    pub(crate) finalizer: Option<Arc<dyn Finalize>>,
    initializers: Vec<Arc<dyn OnInit>>,
    closers: Vec<Arc<dyn OnClose>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            emitters: Vec::new(),
            receivers: HashMap::new(),
            interceptors: BTreeMap::new(),
            keys: HashSet::new(),
            generator: Arc::new(SequenceGenerator::new()),
            finalizer: None,
            initializers: Vec::new(),
            closers: Vec::new(),
        }
    }

    /// Adds an emitter; registering the same handle twice is a no-op.
    pub(crate) fn add_emitter(&mut self, emitter: &Emitter) {
        if !self.emitters.iter().any(|e| e.same(emitter)) {
            self.emitters.push(emitter.clone());
        }
    }

    pub(crate) fn add_receiver(&mut self, receiver: Arc<dyn Receive>) -> Result<(), ConfigError> {
        self.check_key(receiver.key())?;
        self.insert_receiver(receiver);
        Ok(())
    }

    pub(crate) fn add_interceptor(
        &mut self,
        interceptor: Arc<dyn Intercept>,
    ) -> Result<(), ConfigError> {
        self.check_interceptor(interceptor.as_ref())?;
        self.insert_interceptor(interceptor);
        Ok(())
    }

    /// Registers every capability `component` exposes, or none of them.
    pub(crate) fn register(
        &mut self,
        component: Arc<dyn Component>,
    ) -> Result<Capabilities, ConfigError> {
        let emitter = component.as_emitter();
        let receiver = Arc::clone(&component).as_receiver();
        let interceptor = Arc::clone(&component).as_interceptor();
        let finalizer = Arc::clone(&component).as_finalizer();
        let initializer = Arc::clone(&component).as_initializer();
        let closer = component.as_closer();

        if let Some(r) = &receiver {
            self.check_key(r.key())?;
        }
        if let Some(i) = &interceptor {
            self.check_interceptor(i.as_ref())?;
            if receiver.as_ref().is_some_and(|r| r.key() == i.key()) {
                return Err(ConfigError::DuplicateKey {
                    key: i.key().to_owned(),
                });
            }
        }

        let caps = Capabilities {
            emitter: emitter.is_some(),
            receiver: receiver.is_some(),
            interceptor: interceptor.is_some(),
            finalizer: finalizer.is_some(),
            initializer: initializer.is_some(),
            closer: closer.is_some(),
        };

        if let Some(e) = emitter {
            self.add_emitter(&e);
        }
        if let Some(r) = receiver {
            self.insert_receiver(r);
        }
        if let Some(i) = interceptor {
            self.insert_interceptor(i);
        }
        if let Some(f) = finalizer {
            self.finalizer = Some(f);
        }
        if let Some(h) = initializer {
            self.initializers.push(h);
        }
        if let Some(h) = closer {
            self.closers.push(h);
        }
        Ok(caps)
    }

    /// Init hooks in ascending priority (registration order among ties).
    pub(crate) fn initializers(&self) -> Vec<Arc<dyn OnInit>> {
        let mut hooks = self.initializers.clone();
        hooks.sort_by_key(|h| h.priority());
        hooks
    }

    /// Takes the close hooks; they run at most once.
    pub(crate) fn take_closers(&mut self) -> Vec<Arc<dyn OnClose>> {
        std::mem::take(&mut self.closers)
    }

    /// Freezes the registry into a dispatch table.
    pub(crate) fn freeze(&self) -> Routing {
        let interceptors: Vec<_> = self.interceptors.values().cloned().collect();
        let counts = ListenerCounts {
            interceptors: interceptors.len(),
            receivers: self
                .receivers
                .iter()
                .map(|(t, rs)| (t.clone(), rs.len()))
                .collect(),
        };
        Routing {
            interceptors,
            receivers: self.receivers.clone(),
            counts: Arc::new(counts),
        }
    }

    // ---------------------------
    // Helpers
    // ---------------------------

    fn check_key(&self, key: &str) -> Result<(), ConfigError> {
        if self.keys.contains(key) {
            return Err(ConfigError::DuplicateKey {
                key: key.to_owned(),
            });
        }
        Ok(())
    }

    fn check_interceptor(&self, interceptor: &dyn Intercept) -> Result<(), ConfigError> {
        let priority = interceptor.intercept_priority();
        if let Some(existing) = self.interceptors.get(&priority) {
            return Err(ConfigError::DuplicatePriority {
                priority,
                existing: existing.key().to_owned(),
            });
        }
        self.check_key(interceptor.key())
    }

    fn insert_receiver(&mut self, receiver: Arc<dyn Receive>) {
        self.keys.insert(receiver.key().to_owned());
        let types: HashSet<String> = receiver.event_types().into_iter().collect();
        for t in types {
            self.receivers
                .entry(t)
                .or_default()
                .push(Arc::clone(&receiver));
        }
    }

    fn insert_interceptor(&mut self, interceptor: Arc<dyn Intercept>) {
        self.keys.insert(interceptor.key().to_owned());
        self.interceptors
            .insert(interceptor.intercept_priority(), interceptor);
    }
}
