//! Pulse timer: per-binding timed ON-then-OFF state machine
//!
//! Replaces the callback-timer pattern with an explicit state machine
//! polled once per cycle, so retrigger semantics and missed wakeups are
//! deterministic. The clock source is monotonic (`Instant`); the minimum
//! achievable pulse width is one polling cycle, since expiry is only
//! observed at tick time.

use crate::engine::types::RetriggerPolicy;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Idle,
    Armed { release_at: Instant },
}

/// Outcome of an arm request while the timer may already be running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOutcome {
    /// Timer was idle; a fresh pulse starts now.
    Started,
    /// Timer was armed and the policy restarted the full window.
    Restarted,
    /// Timer was armed and the policy dropped the new trigger.
    Ignored,
}

#[derive(Debug, Clone, Copy)]
pub struct PulseTimer {
    state: TimerState,
}

impl Default for PulseTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseTimer {
    pub fn new() -> Self {
        Self {
            state: TimerState::Idle,
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, TimerState::Armed { .. })
    }

    /// Arms (or re-arms) the timer to release at `now + width`.
    ///
    /// With `Restart` a second trigger before the pending release moves the
    /// deadline to the new trigger time plus the full width and no OFF is
    /// emitted at the original deadline. With `Ignore` the pending release
    /// stands.
    pub fn arm(&mut self, now: Instant, width: Duration, policy: RetriggerPolicy) -> ArmOutcome {
        match self.state {
            TimerState::Idle => {
                self.state = TimerState::Armed {
                    release_at: now + width,
                };
                ArmOutcome::Started
            }
            TimerState::Armed { .. } => match policy {
                RetriggerPolicy::Restart => {
                    self.state = TimerState::Armed {
                        release_at: now + width,
                    };
                    ArmOutcome::Restarted
                }
                RetriggerPolicy::Ignore => ArmOutcome::Ignored,
            },
        }
    }

    /// Checks for expiry. Returns true exactly once per pulse, at the first
    /// poll at or past the deadline — a clock gap spanning the deadline
    /// several times over still yields a single release.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state {
            TimerState::Armed { release_at } if now >= release_at => {
                self.state = TimerState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Forces the timer back to idle, reporting whether it was armed.
    /// Used by the shutdown release-all pass.
    pub fn cancel(&mut self) -> bool {
        let was_armed = self.is_armed();
        self.state = TimerState::Idle;
        was_armed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: Duration = Duration::from_millis(100);

    #[test]
    fn releases_once_at_deadline() {
        let t0 = Instant::now();
        let mut timer = PulseTimer::new();
        assert_eq!(timer.arm(t0, WIDTH, RetriggerPolicy::Restart), ArmOutcome::Started);

        assert!(!timer.poll(t0 + Duration::from_millis(99)));
        assert!(timer.poll(t0 + Duration::from_millis(100)));
        assert!(!timer.poll(t0 + Duration::from_millis(101)));
        assert!(!timer.is_armed());
    }

    #[test]
    fn restart_moves_deadline_and_swallows_nothing() {
        let t0 = Instant::now();
        let mut timer = PulseTimer::new();
        timer.arm(t0, WIDTH, RetriggerPolicy::Restart);

        let t50 = t0 + Duration::from_millis(50);
        assert_eq!(timer.arm(t50, WIDTH, RetriggerPolicy::Restart), ArmOutcome::Restarted);

        // No release at the original deadline; release exactly at t50 + width.
        assert!(!timer.poll(t0 + Duration::from_millis(100)));
        assert!(timer.poll(t50 + WIDTH));
    }

    #[test]
    fn ignore_keeps_original_deadline() {
        let t0 = Instant::now();
        let mut timer = PulseTimer::new();
        timer.arm(t0, WIDTH, RetriggerPolicy::Ignore);

        let t50 = t0 + Duration::from_millis(50);
        assert_eq!(timer.arm(t50, WIDTH, RetriggerPolicy::Ignore), ArmOutcome::Ignored);
        assert!(timer.poll(t0 + WIDTH));
    }

    #[test]
    fn long_gap_releases_exactly_once() {
        let t0 = Instant::now();
        let mut timer = PulseTimer::new();
        timer.arm(t0, WIDTH, RetriggerPolicy::Restart);

        // Process suspended well past several pulse widths.
        assert!(timer.poll(t0 + Duration::from_secs(10)));
        assert!(!timer.poll(t0 + Duration::from_secs(20)));
    }

    #[test]
    fn cancel_reports_armed_state() {
        let t0 = Instant::now();
        let mut timer = PulseTimer::new();
        assert!(!timer.cancel());
        timer.arm(t0, WIDTH, RetriggerPolicy::Restart);
        assert!(timer.cancel());
        assert!(!timer.is_armed());
    }
}
