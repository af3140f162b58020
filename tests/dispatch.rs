use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use evswitch::{
    ConfigError, Event, EventRef, EventState, EventSwitch, Finalize, FinalizerFn, HandlerError,
    Identify, Intercept, InterceptorFn, ReceiverFn, SwitchConfig, Verdict,
};
use tokio::time::timeout;

const LIMIT: Duration = Duration::from_secs(10);

fn counting_finalizer(count: &Arc<AtomicUsize>) -> Arc<dyn Finalize> {
    let count = Arc::clone(count);
    FinalizerFn::arc(move |_ev: EventRef| {
        count.fetch_add(1, Ordering::SeqCst);
        async {}
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_event_reaches_its_receiver_once() -> anyhow::Result<()> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);

    let switch = EventSwitch::new(SwitchConfig::default());
    switch.add_receiver(ReceiverFn::arc("collect", ["n"], move |ev: EventRef| {
        let s = Arc::clone(&s);
        async move {
            s.lock().unwrap().push(ev.id());
            Ok::<_, HandlerError>(())
        }
    }))?;
    let emitter = switch.emitter()?;
    switch.start().await?;

    const N: usize = 500;
    for i in 0..N {
        emitter.emit(Event::new("n").with_payload("i", i)).await?;
    }
    timeout(LIMIT, switch.close_gracefully()).await??;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), N);
    assert_eq!(seen.iter().collect::<HashSet<_>>().len(), N);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn aborted_and_received_add_up_with_one_finalize_each() -> anyhow::Result<()> {
    let received = Arc::new(AtomicUsize::new(0));
    let aborted = Arc::new(AtomicUsize::new(0));
    let finalized = Arc::new(AtomicUsize::new(0));
    let (r, a, f) = (
        Arc::clone(&received),
        Arc::clone(&aborted),
        Arc::clone(&finalized),
    );

    let switch = EventSwitch::builder(SwitchConfig {
        buffer_size: 8,
        ..SwitchConfig::default()
    })
    .with_interceptor(InterceptorFn::arc("tens", 0, |ev: EventRef| async move {
        if ev.id() % 10 == 0 {
            return Ok(Verdict::Abort(format!("id {} sampled out", ev.id())));
        }
        Ok::<_, HandlerError>(Verdict::Pass)
    }))
    .with_receiver(ReceiverFn::arc("rx", ["t"], move |_ev: EventRef| {
        let r = Arc::clone(&r);
        async move {
            r.fetch_add(1, Ordering::SeqCst);
            Ok::<_, HandlerError>(())
        }
    }))
    .with_finalizer(FinalizerFn::arc(move |ev: EventRef| {
        let (a, f) = (Arc::clone(&a), Arc::clone(&f));
        async move {
            if ev.state() == EventState::Aborted {
                a.fetch_add(1, Ordering::SeqCst);
            }
            f.fetch_add(1, Ordering::SeqCst);
        }
    }))
    .build()?;

    let emitter = switch.emitter()?;
    switch.start().await?;

    let emitted = 200;
    let mut producers = Vec::new();
    for _ in 0..4 {
        let emitter = emitter.clone();
        producers.push(tokio::spawn(async move {
            for _ in 0..emitted / 4 {
                emitter.emit(Event::new("t")).await?;
            }
            Ok::<_, evswitch::EmitError>(())
        }));
    }
    for p in producers {
        p.await??;
    }
    timeout(LIMIT, switch.close_gracefully()).await??;

    let (r, a) = (received.load(Ordering::SeqCst), aborted.load(Ordering::SeqCst));
    assert_eq!(r + a, emitted);
    assert_eq!(a, emitted / 10);
    assert_eq!(finalized.load(Ordering::SeqCst), emitted);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn panicking_receiver_does_not_starve_its_sibling() -> anyhow::Result<()> {
    let good = Arc::new(AtomicUsize::new(0));
    let g = Arc::clone(&good);
    let events = Arc::new(Mutex::new(Vec::<EventRef>::new()));

    let switch = EventSwitch::new(SwitchConfig::default());
    switch.add_receiver(ReceiverFn::arc("crashy", ["job"], |_ev: EventRef| async {
        if true {
            panic!("receiver bug");
        }
        Ok::<_, HandlerError>(())
    }))?;
    switch.add_receiver(ReceiverFn::arc("steady", ["job"], move |_ev: EventRef| {
        let g = Arc::clone(&g);
        async move {
            g.fetch_add(1, Ordering::SeqCst);
            Ok::<_, HandlerError>(())
        }
    }))?;
    let emitter = switch.emitter()?;
    switch.start().await?;

    for _ in 0..20 {
        let ev = emitter.emit(Event::new("job")).await?;
        events.lock().unwrap().push(ev);
    }
    timeout(LIMIT, switch.close_gracefully()).await??;

    assert_eq!(good.load(Ordering::SeqCst), 20);
    for ev in events.lock().unwrap().iter() {
        assert_eq!(ev.listener_state("crashy"), Some(EventState::Error));
        assert_eq!(ev.listener_state("steady"), Some(EventState::Resolved));
        assert_eq!(ev.state(), EventState::Error);
    }
    Ok(())
}

#[tokio::test]
async fn failing_receiver_marks_event_error_and_finalizes_once() -> anyhow::Result<()> {
    let finalized = Arc::new(AtomicUsize::new(0));
    let switch = EventSwitch::new(SwitchConfig::default());
    switch.add_receiver(ReceiverFn::arc("strict", ["doc"], |ev: EventRef| async move {
        if ev.payload().contains_key("title") {
            Ok(())
        } else {
            Err(HandlerError::rejected("untitled"))
        }
    }))?;
    switch.with_finalizer(counting_finalizer(&finalized))?;
    let emitter = switch.emitter()?;
    switch.start().await?;

    let good = emitter
        .emit(Event::new("doc").with_payload("title", "hello"))
        .await?;
    let bad = emitter.emit(Event::new("doc")).await?;
    timeout(LIMIT, switch.close_gracefully()).await??;

    assert_eq!(good.state(), EventState::Resolved);
    assert_eq!(bad.state(), EventState::Error);
    assert_eq!(bad.listener_state("strict"), Some(EventState::Error));
    assert_eq!(finalized.load(Ordering::SeqCst), 2);
    Ok(())
}

struct Gate;

impl Identify for Gate {
    fn key(&self) -> &str {
        "gate"
    }
}

#[async_trait]
impl Intercept for Gate {
    fn intercept_priority(&self) -> i32 {
        0
    }

    async fn intercept(&self, event: EventRef) -> Result<(), HandlerError> {
        event
            .add_metadata("checked_by", "gate")
            .map_err(|e| HandlerError::failed(e.to_string()))
    }
}

#[tokio::test]
async fn abort_after_lock_is_a_noop() -> anyhow::Result<()> {
    let gate = Arc::new(Gate);
    let late = Arc::new(Mutex::new(None::<ConfigError>));
    let (g, l) = (Arc::clone(&gate), Arc::clone(&late));

    let switch = EventSwitch::new(SwitchConfig::default());
    switch.add_interceptor(Arc::clone(&gate) as Arc<dyn Intercept>)?;
    switch.add_receiver(ReceiverFn::arc("rx", ["a"], move |ev: EventRef| {
        let (g, l) = (Arc::clone(&g), Arc::clone(&l));
        async move {
            ev.abort(g.as_ref(), "too late");
            *l.lock().unwrap() = ev.add_metadata("late", true).err();
            Ok::<_, HandlerError>(())
        }
    }))?;
    let emitter = switch.emitter()?;
    switch.start().await?;

    let ev = emitter.emit(Event::new("a")).await?;
    timeout(LIMIT, switch.close_gracefully()).await??;

    assert!(ev.is_locked());
    assert_eq!(ev.state(), EventState::Resolved);
    assert_eq!(ev.abort_reason(), None);
    assert_eq!(ev.metadata("checked_by"), Some(serde_json::json!("gate")));
    assert!(matches!(
        *late.lock().unwrap(),
        Some(ConfigError::EventLocked { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn interceptors_without_receivers_still_finalize() -> anyhow::Result<()> {
    let finalized = Arc::new(AtomicUsize::new(0));
    let switch = EventSwitch::new(SwitchConfig::default());
    for (key, priority) in [("first", 1), ("second", 2)] {
        switch.add_interceptor(InterceptorFn::arc(key, priority, |_ev: EventRef| async {
            Ok::<_, HandlerError>(Verdict::Pass)
        }))?;
    }
    switch.add_receiver(ReceiverFn::arc("other", ["routed"], |_ev: EventRef| async {
        Ok::<_, HandlerError>(())
    }))?;
    switch.with_finalizer(counting_finalizer(&finalized))?;
    let emitter = switch.emitter()?;
    switch.start().await?;

    let orphan = emitter.emit(Event::new("unrouted")).await?;
    assert_eq!(orphan.total_listeners(), 2);
    timeout(LIMIT, switch.close_gracefully()).await??;

    assert_eq!(orphan.state(), EventState::Resolved);
    assert_eq!(orphan.states().len(), 2);
    assert_eq!(finalized.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn event_without_any_listener_resolves() -> anyhow::Result<()> {
    let finalized = Arc::new(AtomicUsize::new(0));
    let switch = EventSwitch::new(SwitchConfig::default());
    switch.with_finalizer(counting_finalizer(&finalized))?;
    let emitter = switch.emitter()?;
    switch.start().await?;

    let ev = emitter.emit(Event::new("void")).await?;
    timeout(LIMIT, switch.close_gracefully()).await??;

    assert_eq!(ev.total_listeners(), 0);
    assert_eq!(ev.state(), EventState::Resolved);
    assert_eq!(finalized.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failing_interceptor_does_not_stop_delivery() -> anyhow::Result<()> {
    let delivered = Arc::new(AtomicUsize::new(0));
    let d = Arc::clone(&delivered);

    let switch = EventSwitch::new(SwitchConfig::default());
    switch.add_interceptor(InterceptorFn::arc("flaky", 0, |_ev: EventRef| async {
        Err::<Verdict, _>(HandlerError::failed("backend down"))
    }))?;
    switch.add_receiver(ReceiverFn::arc("rx", ["e"], move |_ev: EventRef| {
        let d = Arc::clone(&d);
        async move {
            d.fetch_add(1, Ordering::SeqCst);
            Ok::<_, HandlerError>(())
        }
    }))?;
    let emitter = switch.emitter()?;
    switch.start().await?;

    let ev = emitter.emit(Event::new("e")).await?;
    timeout(LIMIT, switch.close_gracefully()).await??;

    assert_eq!(delivered.load(Ordering::SeqCst), 1);
    assert_eq!(ev.listener_state("flaky"), Some(EventState::Error));
    assert_eq!(ev.state(), EventState::Error);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn event_aborted_while_buffered_never_reaches_receivers() -> anyhow::Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let finalized = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);

    let switch = EventSwitch::new(SwitchConfig::default());
    switch.add_receiver(ReceiverFn::arc("rx", ["v"], move |_ev: EventRef| {
        let c = Arc::clone(&c);
        async move {
            c.fetch_add(1, Ordering::SeqCst);
            Ok::<_, HandlerError>(())
        }
    }))?;
    switch.with_finalizer(counting_finalizer(&finalized))?;
    let emitter = switch.emitter()?;
    switch.start().await?;
    switch.stop().await;

    let ev = emitter.emit(Event::new("v")).await?;
    ev.abort(&Gate, "vetoed");
    assert_eq!(ev.state(), EventState::Aborted);

    switch.start().await?;
    timeout(LIMIT, switch.close_gracefully()).await??;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!ev.is_locked());
    assert_eq!(ev.state(), EventState::Aborted);
    assert_eq!(ev.abort_reason().as_deref(), Some("vetoed"));
    assert!(ev.states().is_empty());
    assert_eq!(finalized.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_receivers_finalize_each_event_once() -> anyhow::Result<()> {
    let finals = Arc::new(Mutex::new(Vec::<(u64, EventState, usize)>::new()));
    let f = Arc::clone(&finals);

    let switch = EventSwitch::builder(SwitchConfig {
        buffer_size: 32,
        ..SwitchConfig::default()
    })
    .with_receiver(ReceiverFn::arc("ok", ["job"], |_ev: EventRef| async {
        tokio::task::yield_now().await;
        Ok::<_, HandlerError>(())
    }))
    .with_receiver(ReceiverFn::arc("odd-fails", ["job"], |ev: EventRef| async move {
        if ev.id() % 2 == 1 {
            return Err(HandlerError::failed("odd id"));
        }
        Ok(())
    }))
    .with_receiver(ReceiverFn::arc("sevens-panic", ["job"], |ev: EventRef| async move {
        if ev.id() % 7 == 0 {
            panic!("bad luck");
        }
        Ok::<_, HandlerError>(())
    }))
    .with_receiver(ReceiverFn::arc("quick", ["job"], |_ev: EventRef| async {
        Ok::<_, HandlerError>(())
    }))
    .with_finalizer(FinalizerFn::arc(move |ev: EventRef| {
        f.lock()
            .unwrap()
            .push((ev.id(), ev.state(), ev.states().len()));
        async {}
    }))
    .build()?;

    let emitter = switch.emitter()?;
    switch.start().await?;

    const N: u64 = 300;
    for _ in 0..N {
        emitter.emit(Event::new("job")).await?;
    }
    timeout(LIMIT, switch.close_gracefully()).await??;

    let finals = finals.lock().unwrap();
    assert_eq!(finals.len(), N as usize);
    assert_eq!(
        finals.iter().map(|(id, ..)| id).collect::<HashSet<_>>().len(),
        N as usize
    );
    for &(id, state, reported) in finals.iter() {
        assert_eq!(reported, 4);
        let expected = if id % 2 == 1 || id % 7 == 0 {
            EventState::Error
        } else {
            EventState::Resolved
        };
        assert_eq!(state, expected, "event {id}");
    }
    Ok(())
}
