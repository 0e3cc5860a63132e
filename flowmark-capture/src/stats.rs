//! Engine-level capture statistics
//!
//! Counters maintained by the capture engine itself, independent of the
//! per-stream counters the receive loop keeps.

use std::fmt;

/// Snapshot of the capture engine's own counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Packets received by the capture engine
    pub received: u64,
    /// Packets dropped by the engine or kernel buffer
    pub dropped: u64,
    /// Packets dropped by the interface or its driver
    pub if_dropped: u64,
}

impl EngineStats {
    /// Difference against an earlier snapshot of the same handle.
    ///
    /// Counters are monotonic for the lifetime of a handle; the baseline is
    /// zeroed whenever a handle is re-opened.
    pub fn delta_since(&self, baseline: &EngineStats) -> EngineStats {
        EngineStats {
            received: self.received.saturating_sub(baseline.received),
            dropped: self.dropped.saturating_sub(baseline.dropped),
            if_dropped: self.if_dropped.saturating_sub(baseline.if_dropped),
        }
    }

    /// Whether every counter is zero
    pub fn is_zero(&self) -> bool {
        *self == EngineStats::default()
    }
}

impl fmt::Display for EngineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "recv: {} drop: {} ifdrop: {}",
            self.received, self.dropped, self.if_dropped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_since() {
        let baseline = EngineStats {
            received: 100,
            dropped: 10,
            if_dropped: 1,
        };
        let current = EngineStats {
            received: 250,
            dropped: 15,
            if_dropped: 1,
        };

        let delta = current.delta_since(&baseline);
        assert_eq!(delta.received, 150);
        assert_eq!(delta.dropped, 5);
        assert_eq!(delta.if_dropped, 0);
    }

    #[test]
    fn test_delta_against_self_is_zero() {
        let stats = EngineStats {
            received: 42,
            dropped: 3,
            if_dropped: 0,
        };
        assert!(stats.delta_since(&stats).is_zero());
    }

    #[test]
    fn test_delta_saturates_across_reopen() {
        // A fresh handle restarts its counters below the stale baseline
        let baseline = EngineStats {
            received: 1000,
            dropped: 0,
            if_dropped: 0,
        };
        let current = EngineStats {
            received: 5,
            dropped: 0,
            if_dropped: 0,
        };
        assert_eq!(current.delta_since(&baseline).received, 0);
    }

    #[test]
    fn test_display_format() {
        let stats = EngineStats {
            received: 7,
            dropped: 2,
            if_dropped: 1,
        };
        assert_eq!(stats.to_string(), "recv: 7 drop: 2 ifdrop: 1");
    }
}
