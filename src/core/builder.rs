use std::sync::Arc;

use crate::core::config::SwitchConfig;
use crate::core::switch::EventSwitch;
use crate::error::ConfigError;
use crate::events::{Emitter, IdGenerator};
use crate::listeners::{Component, Finalize, Intercept, Receive};

/// Builder for an [`EventSwitch`] with its listeners registered up front.
///
/// Every `with_*` call is only recorded; [`build`](Self::build) replays them through the
/// switch's checked registration methods, so the same errors apply.
pub struct EventSwitchBuilder {
    cfg: SwitchConfig,
    generator: Option<Arc<dyn IdGenerator>>,
    finalizer: Option<Arc<dyn Finalize>>,
    emitters: Vec<Emitter>,
    receivers: Vec<Arc<dyn Receive>>,
    interceptors: Vec<Arc<dyn Intercept>>,
    components: Vec<Arc<dyn Component>>,
}

impl EventSwitchBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SwitchConfig) -> Self {
        Self {
            cfg,
            generator: None,
            finalizer: None,
            emitters: Vec::new(),
            receivers: Vec::new(),
            interceptors: Vec::new(),
            components: Vec::new(),
        }
    }

    /// Replaces the default identifier generator.
    pub fn with_id_generator(mut self, generator: Arc<dyn IdGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Sets the event finalizer.
    pub fn with_finalizer(mut self, finalizer: Arc<dyn Finalize>) -> Self {
        self.finalizer = Some(finalizer);
        self
    }

    /// Binds `emitter` to the switch on every start.
    pub fn with_emitter(mut self, emitter: &Emitter) -> Self {
        self.emitters.push(emitter.clone());
        self
    }

    /// Adds a receiver; duplicate keys fail at build time.
    pub fn with_receiver(mut self, receiver: Arc<dyn Receive>) -> Self {
        self.receivers.push(receiver);
        self
    }

    /// Adds an interceptor; duplicate keys or priorities fail at build time.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Intercept>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Registers every capability of `component` at build time.
    pub fn with_component(mut self, component: Arc<dyn Component>) -> Self {
        self.components.push(component);
        self
    }

    /// Builds the (stopped) switch.
    ///
    /// Registration order: generator, finalizer, emitters, interceptors, receivers,
    /// components. The first configuration error is returned.
    pub fn build(self) -> Result<Arc<EventSwitch>, ConfigError> {
        let switch = EventSwitch::new(self.cfg);

        if let Some(generator) = self.generator {
            switch.with_id_generator(generator)?;
        }
        if let Some(finalizer) = self.finalizer {
            switch.with_finalizer(finalizer)?;
        }
        for emitter in &self.emitters {
            switch.add_emitter(emitter)?;
        }
        for interceptor in self.interceptors {
            switch.add_interceptor(interceptor)?;
        }
        for receiver in self.receivers {
            switch.add_receiver(receiver)?;
        }
        for component in self.components {
            switch.register(component)?;
        }
        Ok(Arc::new(switch))
    }
}
