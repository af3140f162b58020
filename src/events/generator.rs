//! # Event identifier generation.
//!
//! [`IdGenerator`] hands out event identifiers; the default [`SequenceGenerator`] is a
//! cursor behind a single lock, strictly increasing across any number of emitters.
//!
//! ## Rules
//! - The seed can be set **once**, and only **before** the first identifier is issued.
//! - Without a seed the cursor starts at `0`.

use std::sync::{Mutex, PoisonError};

use crate::error::ConfigError;

/// Source of event identifiers.
///
/// Implementations must be thread-safe: every emitter bound to a switch shares one generator.
pub trait IdGenerator: Send + Sync + 'static {
    /// Sets the cursor's starting value. Allowed once, before any identifier is issued.
    fn set_seed(&self, seed: u64) -> Result<(), ConfigError>;

    /// Returns the next identifier.
    fn next_id(&self) -> u64;
}

#[derive(Debug, Default)]
struct Cursor {
    next: u64,
    seeded: bool,
    issued: bool,
}

/// Default monotonic generator.
///
/// # Example
/// ```rust
/// use evswitch::{IdGenerator, SequenceGenerator};
///
/// let ids = SequenceGenerator::new();
/// ids.set_seed(100).unwrap();
/// assert_eq!(ids.next_id(), 100);
/// assert_eq!(ids.next_id(), 101);
/// assert!(ids.set_seed(5).is_err());
/// ```
#[derive(Debug, Default)]
pub struct SequenceGenerator {
    cursor: Mutex<Cursor>,
}

impl SequenceGenerator {
    /// Creates a generator starting at `0`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequenceGenerator {
    fn set_seed(&self, seed: u64) -> Result<(), ConfigError> {
        let mut c = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        if c.seeded {
            return Err(ConfigError::SeedAlreadySet);
        }
        if c.issued {
            return Err(ConfigError::SeedAfterIssue);
        }
        c.seeded = true;
        c.next = seed;
        Ok(())
    }

    fn next_id(&self) -> u64 {
        let mut c = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        let id = c.next;
        c.next = c.next.wrapping_add(1);
        c.issued = true;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_starts_at_zero() {
        let g = SequenceGenerator::new();
        assert_eq!(g.next_id(), 0);
        assert_eq!(g.next_id(), 1);
    }

    #[test]
    fn test_seed_only_once() {
        let g = SequenceGenerator::new();
        g.set_seed(10).unwrap();
        assert_eq!(g.set_seed(20), Err(ConfigError::SeedAlreadySet));
        assert_eq!(g.next_id(), 10);
    }

    #[test]
    fn test_seed_refused_after_issue() {
        let g = SequenceGenerator::new();
        g.next_id();
        assert_eq!(g.set_seed(10), Err(ConfigError::SeedAfterIssue));
    }

    #[test]
    fn test_unique_across_threads() {
        let g = Arc::new(SequenceGenerator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let g = Arc::clone(&g);
                std::thread::spawn(move || (0..1000).map(|_| g.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 8000);
    }
}
