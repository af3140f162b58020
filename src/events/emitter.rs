//! # Producer handle.
//!
//! An [`Emitter`] is created by application code, registered with a switch before it
//! starts, and bound by [`EventSwitch::start`](crate::EventSwitch::start) to the intake
//! channel, the identifier generator, the per-type listener counts and the finalizer.
//!
//! ## Emission
//! ```text
//! emit(event)
//!   ├─► id = generator.next_id()
//!   ├─► total = interceptors + receivers(event_type)
//!   ├─► stamp(id, total, finalizer)        (state = Emitted, empty listener map)
//!   └─► intake.push(event)                 (waits while the buffer is full)
//! ```
//!
//! ## Rules
//! - Emitters are cheap to clone; clones share one binding.
//! - Before `start` an emitter is unbound ([`EmitError::NotBound`]).
//! - After `close` it is released ([`EmitError::Closed`]).

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::EmitError;
use crate::events::event::{Event, EventRef};
use crate::events::generator::IdGenerator;
use crate::events::intake::IntakeSender;
use crate::listeners::Finalize;

/// Listener counts frozen at `start`.
#[derive(Debug, Default)]
pub(crate) struct ListenerCounts {
    pub(crate) interceptors: usize,
    pub(crate) receivers: HashMap<String, usize>,
}

impl ListenerCounts {
    /// Number of listener slots expected to report for an event of `event_type`.
    pub(crate) fn total_for(&self, event_type: &str) -> usize {
        self.interceptors + self.receivers.get(event_type).copied().unwrap_or(0)
    }
}

/// Everything an emitter needs from a running switch.
#[derive(Clone)]
pub(crate) struct Binding {
    pub(crate) intake: IntakeSender,
    pub(crate) generator: Arc<dyn IdGenerator>,
    pub(crate) counts: Arc<ListenerCounts>,
    pub(crate) finalizer: Option<Arc<dyn Finalize>>,
}

impl Binding {
    fn prepare(&self, mut event: Event) -> EventRef {
        let id = self.generator.next_id();
        let total = self.counts.total_for(event.event_type());
        event.stamp(id, total, self.finalizer.clone());
        Arc::new(event)
    }
}

#[derive(Clone, Default)]
enum Slot {
    #[default]
    Unbound,
    Bound(Binding),
    Released,
}

/// Handle used by producers to push events into a switch.
///
/// # Example
/// ```rust
/// use evswitch::{Emitter, EventSwitch, SwitchConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let switch = EventSwitch::new(SwitchConfig::default());
/// let emitter = Emitter::new();
/// switch.add_emitter(&emitter)?;
///
/// switch.start().await?;
/// let ev = emitter.emit(evswitch::Event::new("ping")).await?;
/// assert_eq!(ev.id(), 0);
///
/// switch.close_gracefully().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct Emitter {
    slot: Arc<RwLock<Slot>>,
}

impl Emitter {
    /// Creates an unbound emitter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps the event and pushes it to the intake channel.
    ///
    /// Waits while the intake buffer is full. Returns the shared event so the caller can
    /// observe its dispatch state.
    ///
    /// A closed intake is refused before an id is drawn. A close that lands while the
    /// push is waiting still fails with [`EmitError::Closed`] and leaves a gap in the
    /// id sequence.
    pub async fn emit(&self, event: Event) -> Result<EventRef, EmitError> {
        let binding = self.open_binding()?;
        let event = binding.prepare(event);
        binding.intake.push(Arc::clone(&event)).await?;
        Ok(event)
    }

    /// Same as [`emit`](Self::emit), blocking the current thread instead of awaiting.
    ///
    /// Must not be called from inside an async context.
    pub fn blocking_emit(&self, event: Event) -> Result<EventRef, EmitError> {
        let binding = self.open_binding()?;
        let event = binding.prepare(event);
        binding.intake.push_blocking(Arc::clone(&event))?;
        Ok(event)
    }

    /// Returns `true` while bound to a started (not yet closed) switch.
    pub fn is_bound(&self) -> bool {
        matches!(*self.read_slot(), Slot::Bound(_))
    }

    pub(crate) fn bind(&self, binding: Binding) {
        *self.write_slot() = Slot::Bound(binding);
    }

    pub(crate) fn release(&self) {
        *self.write_slot() = Slot::Released;
    }

    /// Returns `true` if both handles share one binding.
    pub(crate) fn same(&self, other: &Emitter) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }

    fn binding(&self) -> Result<Binding, EmitError> {
        match &*self.read_slot() {
            Slot::Bound(b) => Ok(b.clone()),
            Slot::Unbound => Err(EmitError::NotBound),
            Slot::Released => Err(EmitError::Closed),
        }
    }

    fn open_binding(&self) -> Result<Binding, EmitError> {
        let binding = self.binding()?;
        if !binding.intake.is_open() {
            return Err(EmitError::Closed);
        }
        Ok(binding)
    }

    fn read_slot(&self) -> std::sync::RwLockReadGuard<'_, Slot> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_slot(&self) -> std::sync::RwLockWriteGuard<'_, Slot> {
        self.slot.write().unwrap_or_else(PoisonError::into_inner)
    }
}
