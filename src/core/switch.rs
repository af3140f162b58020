//! # EventSwitch: registration, lifecycle and graceful drain.
//!
//! The [`EventSwitch`] owns the listener registry, the intake channel, the intake loop
//! and the live-event accounting. Emitters push into it; the dispatcher routes events
//! through interceptors and receivers and finalizes them.
//!
//! ## Key responsibilities
//! - accept registrations while **stopped** (emitters, receivers, interceptors,
//!   generator/seed, finalizer, whole components)
//! - on `start`: run init hooks once, freeze routing, bind emitters, launch the intake loop
//! - on `stop`: end the intake loop (buffered events stay where they are)
//! - on `close`: stop, release the intake and every emitter, run close hooks
//! - on `close_gracefully`: wait until every accepted event is finalized, then close
//!
//! ## Lifecycle
//! ```text
//!            start()                 stop()
//! Stopped ───────────► Running ───────────► Stopped
//!    │                    │
//!    │ close()            │ close() / close_gracefully()
//!    ▼                    ▼
//!  Closed ◄───────────────┘        (terminal: registration and start refused)
//! ```
//!
//! ## Live-event accounting
//! ```text
//! emit ──► token = tracker.token() ──► intake ──► orchestration task ──► drop(token)
//!
//! close_gracefully:
//!   tracker.close() ──► tracker.wait()          (buffered + in-flight reach zero)
//!       └─ grace > 0 and elapsed ──► close anyway, SwitchError::GraceExceeded
//! ```
//!
//! ## Rules
//! - Registration while running → [`ConfigError::AlreadyRunning`]; after close →
//!   [`ConfigError::Closed`]. Neither affects the running switch.
//! - Repeated `start` while running and repeated `stop`/`close` are no-ops.
//! - Lifecycle calls are serialized; registration calls never wait on them.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use evswitch::{
//!     Event, EventRef, EventSwitch, FinalizerFn, HandlerError, ReceiverFn, SwitchConfig,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let switch = EventSwitch::new(SwitchConfig::default());
//!
//!     switch.add_receiver(ReceiverFn::arc("mailer", ["user.created"], |ev: EventRef| async move {
//!         println!("welcome mail for event {}", ev.id());
//!         Ok::<_, HandlerError>(())
//!     }))?;
//!     switch.with_finalizer(FinalizerFn::arc(|ev: EventRef| async move {
//!         println!("event {} finished as {:?}", ev.id(), ev.state());
//!     }))?;
//!
//!     let emitter = switch.emitter()?;
//!     switch.start().await?;
//!
//!     emitter.emit(Event::new("user.created").with_payload("id", 7)).await?;
//!
//!     switch.close_gracefully().await?;
//!     assert!(!switch.running());
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::core::builder::EventSwitchBuilder;
use crate::core::config::SwitchConfig;
use crate::core::dispatch::Dispatcher;
use crate::core::registry::Registry;
use crate::error::{ConfigError, SwitchError};
use crate::events::{Binding, Emitter, IdGenerator, Intake};
use crate::listeners::{Capabilities, Component, Finalize, Intercept, OnClose, Receive};

enum Phase {
    Stopped,
    Running {
        stop: CancellationToken,
        intake_loop: JoinHandle<()>,
    },
    Closed,
}

struct Inner {
    registry: Registry,
    phase: Phase,
    intake: Option<Intake>,
    initialized: bool,
}

/// In-process event dispatcher.
pub struct EventSwitch {
    cfg: SwitchConfig,
    inner: Mutex<Inner>,
    lifecycle: tokio::sync::Mutex<()>,
    tracker: TaskTracker,
}

impl EventSwitch {
    /// Creates a stopped switch.
    ///
    /// A configured [`SwitchConfig::seed`] is applied to the default generator.
    pub fn new(cfg: SwitchConfig) -> Self {
        let registry = Registry::new();
        if let Some(seed) = cfg.seed {
            if let Err(err) = registry.generator.set_seed(seed) {
                tracing::warn!(seed, error = %err, "failed to seed the id generator");
            }
        }
        Self {
            cfg,
            inner: Mutex::new(Inner {
                registry,
                phase: Phase::Stopped,
                intake: None,
                initialized: false,
            }),
            lifecycle: tokio::sync::Mutex::new(()),
            tracker: TaskTracker::new(),
        }
    }

    /// Returns a builder that registers listeners before handing out the switch.
    pub fn builder(cfg: SwitchConfig) -> EventSwitchBuilder {
        EventSwitchBuilder::new(cfg)
    }

    /// Configuration the switch was built with.
    pub fn config(&self) -> &SwitchConfig {
        &self.cfg
    }

    /// Returns `true` between `start` and `stop`/`close`.
    pub fn running(&self) -> bool {
        matches!(self.lock().phase, Phase::Running { .. })
    }

    /// Returns `true` once the switch has been closed.
    pub fn closed(&self) -> bool {
        matches!(self.lock().phase, Phase::Closed)
    }

    /// Events accepted by an emitter and not yet finalized (buffered + in flight).
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Events waiting in the intake buffer.
    pub fn buffered(&self) -> usize {
        self.lock().intake.as_ref().map_or(0, Intake::len)
    }

    // ---------------------------
    // Registration
    // ---------------------------

    /// Registers a producer; it is bound to the intake on `start`.
    pub fn add_emitter(&self, emitter: &Emitter) -> Result<(), ConfigError> {
        let mut inner = self.configurable("add an emitter")?;
        inner.registry.add_emitter(emitter);
        tracing::debug!("emitter registered");
        Ok(())
    }

    /// Creates and registers a new emitter.
    pub fn emitter(&self) -> Result<Emitter, ConfigError> {
        let emitter = Emitter::new();
        self.add_emitter(&emitter)?;
        Ok(emitter)
    }

    /// Subscribes a receiver to the event types it declares.
    pub fn add_receiver(&self, receiver: Arc<dyn Receive>) -> Result<(), ConfigError> {
        let mut inner = self.configurable("add a receiver")?;
        let key = receiver.key().to_owned();
        inner.registry.add_receiver(receiver)?;
        tracing::debug!(listener = %key, "receiver registered");
        Ok(())
    }

    /// Adds an interceptor; its priority must be free.
    pub fn add_interceptor(&self, interceptor: Arc<dyn Intercept>) -> Result<(), ConfigError> {
        let mut inner = self.configurable("add an interceptor")?;
        let key = interceptor.key().to_owned();
        let priority = interceptor.intercept_priority();
        inner.registry.add_interceptor(interceptor)?;
        tracing::debug!(listener = %key, priority, "interceptor registered");
        Ok(())
    }

    /// Replaces the identifier generator.
    ///
    /// The configured [`SwitchConfig::seed`], if any, is applied to the new generator.
    pub fn with_id_generator(&self, generator: Arc<dyn IdGenerator>) -> Result<(), ConfigError> {
        let mut inner = self.configurable("replace the id generator")?;
        if let Some(seed) = self.cfg.seed {
            generator.set_seed(seed)?;
        }
        inner.registry.generator = generator;
        Ok(())
    }

    /// Seeds the identifier generator (once, before any identifier is issued).
    pub fn with_seed(&self, seed: u64) -> Result<(), ConfigError> {
        let inner = self.configurable("seed the id generator")?;
        inner.registry.generator.set_seed(seed)
    }

    /// Sets the finalizer stamped onto every event emitted after the next `start`.
    pub fn with_finalizer(&self, finalizer: Arc<dyn Finalize>) -> Result<(), ConfigError> {
        let mut inner = self.configurable("set the finalizer")?;
        inner.registry.finalizer = Some(finalizer);
        Ok(())
    }

    /// Registers every capability the component exposes.
    ///
    /// Either all of its roles are registered or, on error, none of them.
    pub fn register(&self, component: Arc<dyn Component>) -> Result<Capabilities, ConfigError> {
        let mut inner = self.configurable("register a component")?;
        let key = component.key().to_owned();
        let caps = inner.registry.register(component)?;
        if caps.is_empty() {
            tracing::warn!(component = %key, "component exposes no capability");
        } else {
            tracing::debug!(component = %key, ?caps, "component registered");
        }
        Ok(caps)
    }

    // ---------------------------
    // Lifecycle
    // ---------------------------

    /// Starts dispatching.
    ///
    /// On the first start, init hooks run in ascending priority; if one fails the
    /// switch stays stopped and [`SwitchError::Init`] is returned. A start while
    /// running is a no-op.
    pub async fn start(&self) -> Result<(), SwitchError> {
        let _guard = self.lifecycle.lock().await;

        let hooks = {
            let inner = self.lock();
            match inner.phase {
                Phase::Running { .. } => return Ok(()),
                Phase::Closed => return Err(ConfigError::Closed { action: "start" }.into()),
                Phase::Stopped => {}
            }
            if inner.initialized {
                Vec::new()
            } else {
                inner.registry.initializers()
            }
        };

        for hook in hooks {
            if let Err(error) = hook.on_init().await {
                let key = hook.key().to_owned();
                tracing::warn!(component = %key, error = %error, "init hook failed");
                return Err(SwitchError::Init { key, error });
            }
        }

        let mut inner = self.lock();
        inner.initialized = true;

        let routing = Arc::new(inner.registry.freeze());
        let Inner {
            registry, intake, ..
        } = &mut *inner;
        let intake =
            intake.get_or_insert_with(|| Intake::new(self.cfg.buffer_size, self.tracker.clone()));

        let binding = Binding {
            intake: intake.sender(),
            generator: Arc::clone(&registry.generator),
            counts: Arc::clone(&routing.counts),
            finalizer: registry.finalizer.clone(),
        };
        for emitter in &registry.emitters {
            emitter.bind(binding.clone());
        }

        let stop = CancellationToken::new();
        let rx = intake.receiver();
        let interceptors = routing.interceptors.len();
        let types = routing.receivers.len();
        let intake_loop = tokio::spawn(Dispatcher::new(routing).intake_loop(rx, stop.clone()));
        inner.phase = Phase::Running { stop, intake_loop };

        tracing::info!(
            interceptors,
            event_types = types,
            buffer_size = self.cfg.buffer_size,
            "event switch started"
        );
        Ok(())
    }

    /// Stops the intake loop.
    ///
    /// Events already pulled keep running to completion; buffered events are not pulled
    /// (a later `start` resumes from the buffer, `close` discards it).
    pub async fn stop(&self) {
        let _guard = self.lifecycle.lock().await;
        self.stop_inner().await;
    }

    /// Stops and releases the switch.
    ///
    /// Buffered events are dropped without being dispatched or finalized; emitters report
    /// [`EmitError::Closed`](crate::EmitError::Closed) afterwards.
    pub async fn close(&self) {
        let _guard = self.lifecycle.lock().await;
        self.close_inner().await;
    }

    /// Waits until every accepted event is finalized, then closes.
    ///
    /// With [`SwitchConfig::grace`] set, gives up after that long, closes anyway and
    /// returns [`SwitchError::GraceExceeded`]. On a stopped switch this is a plain close.
    pub async fn close_gracefully(&self) -> Result<(), SwitchError> {
        let _guard = self.lifecycle.lock().await;

        let running = self.running();
        if !running {
            self.close_inner().await;
            return Ok(());
        }

        self.tracker.close();
        let drained = match self.cfg.grace_limit() {
            None => {
                self.tracker.wait().await;
                Ok(())
            }
            Some(grace) => tokio::time::timeout(grace, self.tracker.wait())
                .await
                .map_err(|_| SwitchError::GraceExceeded {
                    grace,
                    in_flight: self.tracker.len(),
                }),
        };

        match &drained {
            Ok(()) => tracing::info!("event switch drained"),
            Err(err) => tracing::warn!(error = %err, "event switch closed before draining"),
        }
        self.close_inner().await;
        drained
    }

    // ---------------------------
    // Helpers
    // ---------------------------

    async fn stop_inner(&self) {
        let (stop, intake_loop) = {
            let mut inner = self.lock();
            if !matches!(inner.phase, Phase::Running { .. }) {
                return;
            }
            match std::mem::replace(&mut inner.phase, Phase::Stopped) {
                Phase::Running { stop, intake_loop } => (stop, intake_loop),
                _ => return,
            }
        };

        stop.cancel();
        if let Err(err) = intake_loop.await {
            tracing::error!(error = %err, "intake loop ended abnormally");
        }
        tracing::info!(in_flight = self.tracker.len(), "event switch stopped");
    }

    async fn close_inner(&self) {
        if self.closed() {
            return;
        }
        self.stop_inner().await;

        let closers: Vec<Arc<dyn OnClose>> = {
            let mut inner = self.lock();
            for emitter in &inner.registry.emitters {
                emitter.release();
            }
            inner.intake = None;
            inner.phase = Phase::Closed;
            inner.registry.take_closers()
        };

        for hook in closers {
            if let Err(err) = hook.on_close().await {
                tracing::warn!(component = hook.key(), error = %err, "close hook failed");
            }
        }
        tracing::info!("event switch closed");
    }

    /// Locks the registry for a registration call made while stopped.
    fn configurable(&self, action: &'static str) -> Result<MutexGuard<'_, Inner>, ConfigError> {
        let inner = self.lock();
        match inner.phase {
            Phase::Stopped => Ok(inner),
            Phase::Running { .. } => Err(ConfigError::AlreadyRunning { action }),
            Phase::Closed => Err(ConfigError::Closed { action }),
        }
    }

    // Critical sections never await; a poisoned lock still holds consistent data.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for EventSwitch {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Phase::Running { stop, .. } = &inner.phase {
            stop.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::events::{Event, EventRef, EventState};
    use crate::listeners::{Identify, OnInit, Prioritize, ReceiverFn};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop(key: &'static str, ty: &'static str) -> Arc<dyn Receive> {
        ReceiverFn::arc(key, [ty], |_ev: EventRef| async { Ok::<_, HandlerError>(()) })
    }

    struct Hook {
        key: &'static str,
        priority: i32,
        fail: bool,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Identify for Hook {
        fn key(&self) -> &str {
            self.key
        }
    }

    impl Prioritize for Hook {
        fn priority(&self) -> i32 {
            self.priority
        }
    }

    #[async_trait]
    impl OnInit for Hook {
        async fn on_init(&self) -> Result<(), HandlerError> {
            self.order.lock().unwrap().push(self.key);
            if self.fail {
                return Err(HandlerError::failed("not ready"));
            }
            Ok(())
        }
    }

    impl Component for Hook {
        fn as_initializer(self: Arc<Self>) -> Option<Arc<dyn OnInit>> {
            Some(self)
        }
    }

    #[tokio::test]
    async fn test_registration_refused_while_running() {
        let switch = EventSwitch::new(SwitchConfig::default());
        switch.start().await.unwrap();
        assert!(switch.running());

        let err = switch.add_receiver(noop("late", "a")).unwrap_err();
        assert_eq!(err.as_label(), "config_already_running");
        assert!(switch.emitter().is_err());

        switch.stop().await;
        assert!(!switch.running());
        switch.add_receiver(noop("late", "a")).unwrap();

        switch.close().await;
        let err = switch.add_receiver(noop("later", "a")).unwrap_err();
        assert_eq!(err, ConfigError::Closed { action: "add a receiver" });
        assert!(matches!(
            switch.start().await,
            Err(SwitchError::Config(ConfigError::Closed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_repeated_transitions_are_noops() {
        let switch = EventSwitch::new(SwitchConfig::default());
        switch.stop().await;
        switch.start().await.unwrap();
        switch.start().await.unwrap();
        assert!(switch.running());
        switch.stop().await;
        switch.stop().await;
        switch.close().await;
        switch.close().await;
        assert!(switch.closed());
    }

    #[tokio::test]
    async fn test_init_hooks_run_in_priority_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let switch = EventSwitch::new(SwitchConfig::default());
        for (key, priority, fail) in [("db", 2, false), ("cfg", -1, false), ("cache", 5, true)] {
            switch
                .register(Arc::new(Hook {
                    key,
                    priority,
                    fail,
                    order: Arc::clone(&order),
                }))
                .unwrap();
        }

        match switch.start().await {
            Err(SwitchError::Init { key, .. }) => assert_eq!(key, "cache"),
            other => panic!("unexpected start result: {other:?}"),
        }
        assert!(!switch.running());
        assert_eq!(*order.lock().unwrap(), ["cfg", "db", "cache"]);
    }

    #[tokio::test]
    async fn test_seed_from_config() {
        let cfg = SwitchConfig {
            seed: Some(500),
            ..SwitchConfig::default()
        };
        let switch = EventSwitch::new(cfg);
        assert_eq!(switch.with_seed(1), Err(ConfigError::SeedAlreadySet));

        let emitter = switch.emitter().unwrap();
        switch.start().await.unwrap();
        let ev = emitter.emit(Event::new("x")).await.unwrap();
        assert_eq!(ev.id(), 500);
        switch.close_gracefully().await.unwrap();
        assert_eq!(ev.state(), EventState::Resolved);
    }

    #[tokio::test]
    async fn test_close_gracefully_waits_for_receivers() {
        let done = Arc::new(AtomicUsize::new(0));
        let d = Arc::clone(&done);
        let switch = EventSwitch::new(SwitchConfig::default());
        switch
            .add_receiver(ReceiverFn::arc("slow", ["job"], move |_ev: EventRef| {
                let d = Arc::clone(&d);
                async move {
                    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                    d.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, HandlerError>(())
                }
            }))
            .unwrap();
        let emitter = switch.emitter().unwrap();
        switch.start().await.unwrap();

        for _ in 0..5 {
            emitter.emit(Event::new("job")).await.unwrap();
        }
        switch.close_gracefully().await.unwrap();

        assert_eq!(done.load(Ordering::SeqCst), 5);
        assert_eq!(switch.in_flight(), 0);
        assert!(!emitter.is_bound());
    }
}
