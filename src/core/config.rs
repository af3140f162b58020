//! # Switch configuration.
//!
//! Provides [`SwitchConfig`], the settings fixed when an [`EventSwitch`](crate::EventSwitch)
//! is constructed.
//!
//! ## Sentinel values
//! - `buffer_size = 0` → rendezvous intake (every `emit` waits for the intake loop)
//! - `grace = 0s` → `close_gracefully` waits without limit

use std::time::Duration;

/// Construction-time configuration of an event switch.
///
/// ## Field semantics
/// - `buffer_size`: intake channel capacity; a full buffer blocks emitters (backpressure)
/// - `seed`: starting identifier for the default generator (`None` = start at 0)
/// - `grace`: upper bound for `close_gracefully` (`0s` = unbounded)
#[derive(Clone, Debug)]
pub struct SwitchConfig {
    /// Capacity of the intake channel.
    ///
    /// - `0` = rendezvous: each `emit` waits until the intake loop takes the event
    /// - `n > 0` = up to `n` events buffered before emitters wait
    pub buffer_size: usize,

    /// Seed applied to the identifier generator when the switch is built.
    pub seed: Option<u64>,

    /// Maximum time `close_gracefully` waits for in-flight events.
    ///
    /// - `Duration::ZERO` = wait until every accepted event is finalized
    /// - `> 0` = close anyway after `grace` and return `SwitchError::GraceExceeded`
    pub grace: Duration,
}

impl SwitchConfig {
    /// Returns the graceful-close bound as an `Option`.
    ///
    /// - `None` → wait without limit
    /// - `Some(d)` → give up after `d`
    #[inline]
    pub fn grace_limit(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }
}

impl Default for SwitchConfig {
    /// Default configuration:
    ///
    /// - `buffer_size = 1024`
    /// - `seed = None`
    /// - `grace = 0s` (unbounded drain)
    fn default() -> Self {
        Self {
            buffer_size: 1024,
            seed: None,
            grace: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grace_sentinel() {
        let mut cfg = SwitchConfig::default();
        assert_eq!(cfg.grace_limit(), None);

        cfg.grace = Duration::from_millis(250);
        assert_eq!(cfg.grace_limit(), Some(Duration::from_millis(250)));
    }
}
