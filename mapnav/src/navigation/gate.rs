//! Forwarding gate: minimum spacing between updates pushed into a session.
//!
//! Every sample updates the displayed position, but only samples that pass
//! the gate reach the tracking session, where each one may cost a re-route
//! and ETA recompute on the SDK's routing backend.
//!
//! The gate is armed when the session is created, so the first forwarded
//! sample is the first one at least one interval after creation.

use std::time::Duration;

use tokio::time::Instant;

/// Lets one sample through per interval.
#[derive(Debug, Clone)]
pub struct ForwardingGate {
    interval: Duration,
    last_passed: Instant,
}

impl ForwardingGate {
    /// Create a gate as if a sample had passed at `armed_at`.
    pub fn armed(interval: Duration, armed_at: Instant) -> Self {
        Self {
            interval,
            last_passed: armed_at,
        }
    }

    /// Returns `true` (and restarts the interval) if at least one interval
    /// has elapsed since the last sample passed.
    pub fn try_pass(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_passed) < self.interval {
            return false;
        }
        self.last_passed = now;
        true
    }

    /// When the last sample passed (or the gate was armed).
    pub fn last_passed(&self) -> Instant {
        self.last_passed
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(15_000);

    fn at(origin: Instant, ms: u64) -> Instant {
        origin + Duration::from_millis(ms)
    }

    #[test]
    fn test_blocks_inside_interval() {
        let t0 = Instant::now();
        let mut gate = ForwardingGate::armed(INTERVAL, t0);

        assert!(!gate.try_pass(at(t0, 2_000)));
        assert!(!gate.try_pass(at(t0, 14_999)));
    }

    #[test]
    fn test_passes_at_interval_boundary() {
        let t0 = Instant::now();
        let mut gate = ForwardingGate::armed(INTERVAL, t0);

        assert!(gate.try_pass(at(t0, 15_000)));
        assert_eq!(gate.last_passed(), at(t0, 15_000));
    }

    #[test]
    fn test_interval_restarts_from_last_pass() {
        let t0 = Instant::now();
        let mut gate = ForwardingGate::armed(INTERVAL, t0);

        assert!(!gate.try_pass(at(t0, 2_000)));
        assert!(gate.try_pass(at(t0, 16_000)));
        assert!(!gate.try_pass(at(t0, 30_000)));
        assert!(gate.try_pass(at(t0, 31_000)));
    }

    #[test]
    fn test_rejected_samples_do_not_restart_interval() {
        let t0 = Instant::now();
        let mut gate = ForwardingGate::armed(INTERVAL, t0);

        for ms in (1_000..15_000).step_by(1_000) {
            assert!(!gate.try_pass(at(t0, ms)));
        }
        assert!(gate.try_pass(at(t0, 15_000)));
    }

    #[test]
    fn test_clock_going_backwards_is_blocked() {
        let t0 = Instant::now();
        let mut gate = ForwardingGate::armed(INTERVAL, at(t0, 10_000));
        assert!(!gate.try_pass(t0));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// In any window of T ms, at most floor(T / interval) + 1 samples pass.
            #[test]
            fn test_throttle_floor(
                mut offsets in prop::collection::vec(0u64..120_000, 0..200),
                window_start in 0u64..120_000,
                window_len in 0u64..60_000,
            ) {
                offsets.sort_unstable();
                let t0 = Instant::now();
                let mut gate = ForwardingGate::armed(INTERVAL, t0);

                let passed: Vec<u64> = offsets
                    .iter()
                    .copied()
                    .filter(|ms| gate.try_pass(at(t0, *ms)))
                    .collect();

                let window_end = window_start + window_len;
                let in_window = passed
                    .iter()
                    .filter(|ms| **ms >= window_start && **ms <= window_end)
                    .count() as u64;
                let bound = window_len / INTERVAL.as_millis() as u64 + 1;

                prop_assert!(
                    in_window <= bound,
                    "{} passes in [{}, {}] exceeds bound {}",
                    in_window, window_start, window_end, bound
                );
            }

            /// Consecutive passes are always at least one interval apart.
            #[test]
            fn test_passes_are_spaced(
                mut offsets in prop::collection::vec(0u64..120_000, 0..200),
            ) {
                offsets.sort_unstable();
                let t0 = Instant::now();
                let mut gate = ForwardingGate::armed(INTERVAL, t0);

                let mut previous = 0u64;
                for ms in offsets {
                    if gate.try_pass(at(t0, ms)) {
                        prop_assert!(ms - previous >= INTERVAL.as_millis() as u64);
                        previous = ms;
                    }
                }
            }
        }
    }
}
