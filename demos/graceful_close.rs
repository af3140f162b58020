//! # Example: graceful_close
//!
//! Compares `close` and `close_gracefully` on the same workload: a slow interceptor
//! and 50 events. The abrupt close drops what is still buffered; the graceful one
//! waits for every event to be finalized.
//!
//! Uses the built-in [`LogFinalizer`] to log every terminal event.
//!
//! ## Run
//! ```bash
//! RUST_LOG=evswitch=info cargo run --example graceful_close --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use evswitch::{
    Event, EventRef, EventSwitch, HandlerError, InterceptorFn, LogFinalizer, ReceiverFn,
    SwitchConfig, Verdict,
};

async fn run(graceful: bool) -> anyhow::Result<usize> {
    let processed = Arc::new(AtomicUsize::new(0));
    let p = Arc::clone(&processed);

    let switch = EventSwitch::builder(SwitchConfig {
        buffer_size: 64,
        grace: Duration::from_secs(5),
        ..SwitchConfig::default()
    })
    .with_interceptor(InterceptorFn::arc("slow", 0, |_ev: EventRef| async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok::<_, HandlerError>(Verdict::Pass)
    }))
    .with_receiver(ReceiverFn::arc("count", ["tick"], move |_ev: EventRef| {
        let p = Arc::clone(&p);
        async move {
            p.fetch_add(1, Ordering::SeqCst);
            Ok::<_, HandlerError>(())
        }
    }))
    .with_finalizer(Arc::new(LogFinalizer::new()))
    .build()?;

    let emitter = switch.emitter()?;
    switch.start().await?;
    for i in 0..50 {
        emitter.emit(Event::new("tick").with_payload("i", i)).await?;
    }

    if graceful {
        switch.close_gracefully().await?;
    } else {
        switch.close().await;
    }
    Ok(processed.load(Ordering::SeqCst))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let abrupt = run(false).await?;
    let graceful = run(true).await?;
    println!("close: {abrupt}/50 processed, close_gracefully: {graceful}/50 processed");
    Ok(())
}
