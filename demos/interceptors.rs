//! # Example: interceptors
//!
//! A priority-ordered interceptor chain in front of a receiver:
//! - `enrich` (priority -10) attaches metadata;
//! - `sampler` (priority 0) aborts every event whose id is divisible by 10;
//! - `orders` receives whatever survives.
//!
//! Prints `received + aborted == emitted`.
//!
//! ## Run
//! ```bash
//! cargo run --example interceptors
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use evswitch::{
    Component, Event, EventRef, EventState, EventSwitch, FinalizerFn, HandlerError, Identify,
    Intercept, InterceptorFn, ReceiverFn, SwitchConfig, Verdict,
};

/// Interceptor implemented as a component.
struct Sampler;

impl Identify for Sampler {
    fn key(&self) -> &str {
        "sampler"
    }
}

#[async_trait]
impl Intercept for Sampler {
    fn intercept_priority(&self) -> i32 {
        0
    }

    async fn intercept(&self, event: EventRef) -> Result<(), HandlerError> {
        if event.id() % 10 == 0 {
            event.abort(self, "sampled out");
        }
        Ok(())
    }
}

impl Component for Sampler {
    fn as_interceptor(self: Arc<Self>) -> Option<Arc<dyn Intercept>> {
        Some(self)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let received = Arc::new(AtomicUsize::new(0));
    let aborted = Arc::new(AtomicUsize::new(0));
    let (rx, ab) = (Arc::clone(&received), Arc::clone(&aborted));

    let switch = EventSwitch::builder(SwitchConfig::default())
        .with_interceptor(InterceptorFn::arc("enrich", -10, |ev: EventRef| async move {
            ev.add_metadata("region", "eu-west")
                .map_err(|e| HandlerError::failed(e.to_string()))?;
            Ok::<_, HandlerError>(Verdict::Pass)
        }))
        .with_component(Arc::new(Sampler))
        .with_receiver(ReceiverFn::arc("orders", ["order.placed"], move |ev: EventRef| {
            let rx = Arc::clone(&rx);
            async move {
                rx.fetch_add(1, Ordering::SeqCst);
                println!("[orders] #{} region={:?}", ev.id(), ev.metadata("region"));
                Ok::<_, HandlerError>(())
            }
        }))
        .with_finalizer(FinalizerFn::arc(move |ev: EventRef| {
            let ab = Arc::clone(&ab);
            async move {
                if ev.state() == EventState::Aborted {
                    ab.fetch_add(1, Ordering::SeqCst);
                }
            }
        }))
        .build()?;

    let emitter = switch.emitter()?;
    switch.start().await?;

    let emitted = 25;
    for n in 0..emitted {
        emitter
            .emit(Event::new("order.placed").with_payload("n", n))
            .await?;
    }
    switch.close_gracefully().await?;

    let (r, a) = (received.load(Ordering::SeqCst), aborted.load(Ordering::SeqCst));
    println!("emitted={emitted} received={r} aborted={a}");
    assert_eq!(r + a, emitted);
    Ok(())
}
