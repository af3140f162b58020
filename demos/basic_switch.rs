//! # Example: basic_switch
//!
//! Two receivers subscribed to one event type, a finalizer counting terminal states,
//! and a graceful close.
//!
//! ## Flow
//! ```text
//! emitter ──► intake ──► [mailer, audit] (concurrent) ──► finalizer
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=evswitch=debug cargo run --example basic_switch
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use evswitch::{
    Event, EventRef, EventState, EventSwitch, FinalizerFn, HandlerError, ReceiverFn, SwitchConfig,
};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cfg = SwitchConfig {
        buffer_size: 16,
        ..SwitchConfig::default()
    };
    let switch = EventSwitch::new(cfg);

    switch.add_receiver(ReceiverFn::arc(
        "mailer",
        ["user.created"],
        |ev: EventRef| async move {
            let email = ev
                .payload()
                .get("email")
                .and_then(|v| v.as_str())
                .ok_or_else(|| HandlerError::rejected("missing email"))?;
            tokio::time::sleep(Duration::from_millis(30)).await;
            println!("[mailer] welcome mail to {email} (event {})", ev.id());
            Ok::<_, HandlerError>(())
        },
    ))?;

    switch.add_receiver(ReceiverFn::arc(
        "audit",
        ["user.created"],
        |ev: EventRef| async move {
            println!("[audit] user.created #{} {:?}", ev.id(), ev.payload());
            Ok::<_, HandlerError>(())
        },
    ))?;

    let resolved = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let (r, f) = (Arc::clone(&resolved), Arc::clone(&failed));
    switch.with_finalizer(FinalizerFn::arc(move |ev: EventRef| {
        let (r, f) = (Arc::clone(&r), Arc::clone(&f));
        async move {
            match ev.state() {
                EventState::Resolved => r.fetch_add(1, Ordering::SeqCst),
                _ => f.fetch_add(1, Ordering::SeqCst),
            };
        }
    }))?;

    let emitter = switch.emitter()?;
    switch.start().await?;

    for i in 0..5 {
        let mut ev = Event::new("user.created").with_payload("user_id", json!(i));
        if i != 3 {
            ev = ev.with_payload("email", format!("user{i}@example.com"));
        }
        emitter.emit(ev).await?;
    }

    switch.close_gracefully().await?;
    println!(
        "resolved={} failed={}",
        resolved.load(Ordering::SeqCst),
        failed.load(Ordering::SeqCst)
    );
    Ok(())
}
