//! # Function-backed listeners.
//!
//! [`ReceiverFn`], [`InterceptorFn`] and [`FinalizerFn`] wrap closures
//! `F: Fn(EventRef) -> Fut`, producing a fresh future per event. No state is shared
//! between invocations unless the closure captures an `Arc<...>` explicitly.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use evswitch::{EventRef, HandlerError, InterceptorFn, ReceiverFn, Verdict};
//!
//! let printer = ReceiverFn::arc("printer", ["order.placed"], |ev: EventRef| async move {
//!     println!("order {}", ev.id());
//!     Ok::<_, HandlerError>(())
//! });
//!
//! let gate = InterceptorFn::arc("gate", 1, |ev: EventRef| async move {
//!     if ev.payload().contains_key("blocked") {
//!         return Ok(Verdict::Abort("blocked".into()));
//!     }
//!     Ok::<_, HandlerError>(Verdict::Pass)
//! });
//! # let _ = (printer, gate);
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::events::EventRef;
use crate::listeners::{Finalize, Identify, Intercept, Receive, Verdict};

/// Function-backed receiver.
pub struct ReceiverFn<F> {
    key: Cow<'static, str>,
    event_types: Vec<String>,
    f: F,
}

impl<F> ReceiverFn<F> {
    /// Creates a receiver subscribed to `event_types`.
    ///
    /// Prefer [`ReceiverFn::arc`] when you immediately register it.
    pub fn new<I, S>(key: impl Into<Cow<'static, str>>, event_types: I, f: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            event_types: event_types.into_iter().map(Into::into).collect(),
            f,
        }
    }

    /// Creates the receiver as a shared handle.
    pub fn arc<I, S>(key: impl Into<Cow<'static, str>>, event_types: I, f: F) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self::new(key, event_types, f))
    }
}

impl<F> Identify for ReceiverFn<F> {
    fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl<F, Fut> Receive for ReceiverFn<F>
where
    F: Fn(EventRef) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    fn event_types(&self) -> Vec<String> {
        self.event_types.clone()
    }

    async fn receive(&self, event: EventRef) -> Result<(), HandlerError> {
        (self.f)(event).await
    }
}

/// Function-backed interceptor; the closure answers with a [`Verdict`].
pub struct InterceptorFn<F> {
    key: Cow<'static, str>,
    priority: i32,
    f: F,
}

impl<F> InterceptorFn<F> {
    /// Creates an interceptor at the given priority.
    pub fn new(key: impl Into<Cow<'static, str>>, priority: i32, f: F) -> Self {
        Self {
            key: key.into(),
            priority,
            f,
        }
    }

    /// Creates the interceptor as a shared handle.
    pub fn arc(key: impl Into<Cow<'static, str>>, priority: i32, f: F) -> Arc<Self> {
        Arc::new(Self::new(key, priority, f))
    }
}

impl<F> Identify for InterceptorFn<F> {
    fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl<F, Fut> Intercept for InterceptorFn<F>
where
    F: Fn(EventRef) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Verdict, HandlerError>> + Send + 'static,
{
    fn intercept_priority(&self) -> i32 {
        self.priority
    }

    async fn intercept(&self, event: EventRef) -> Result<(), HandlerError> {
        match (self.f)(Arc::clone(&event)).await? {
            Verdict::Pass => {}
            Verdict::Abort(reason) => event.abort(self, reason),
        }
        Ok(())
    }
}

/// Function-backed finalizer.
pub struct FinalizerFn<F> {
    f: F,
}

impl<F> FinalizerFn<F> {
    /// Creates a finalizer from a closure called once per terminal event.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the finalizer as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Finalize for FinalizerFn<F>
where
    F: Fn(EventRef) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn finalize(&self, event: EventRef) {
        (self.f)(event).await
    }
}
