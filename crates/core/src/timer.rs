//! Game clock toggled by piip events.

use crate::constants::COUNTDOWN_DURATION;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    NotStarted,
    Running {
        started: Instant,
        paused_total: Duration,
    },
    Paused {
        started: Instant,
        paused_at: Instant,
        paused_total: Duration,
    },
}

/// Elapsed-time accumulator that excludes every paused interval.
#[derive(Debug)]
pub struct SessionTimer {
    state: TimerState,
    countdown: Duration,
    last_piip: bool,
}

impl Default for SessionTimer {
    fn default() -> Self {
        Self::new(COUNTDOWN_DURATION)
    }
}

impl SessionTimer {
    pub fn new(countdown: Duration) -> Self {
        Self {
            state: TimerState::NotStarted,
            countdown,
            last_piip: false,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Feeds the current piip flag. A false→true edge starts, pauses or
    /// resumes the clock; returns `true` when it did.
    pub fn toggle_on_rising_edge(&mut self, piip_active: bool, now: Instant) -> bool {
        let rising = piip_active && !self.last_piip;
        self.last_piip = piip_active;
        if rising {
            self.toggle(now);
        }
        rising
    }

    pub fn toggle(&mut self, now: Instant) {
        self.state = match self.state {
            TimerState::NotStarted => TimerState::Running {
                started: now,
                paused_total: Duration::ZERO,
            },
            TimerState::Running {
                started,
                paused_total,
            } => TimerState::Paused {
                started,
                paused_at: now,
                paused_total,
            },
            TimerState::Paused {
                started,
                paused_at,
                paused_total,
            } => TimerState::Running {
                started,
                paused_total: paused_total + now.saturating_duration_since(paused_at),
            },
        };
    }

    /// Running time so far, clamped to the countdown length.
    pub fn elapsed(&self, now: Instant) -> Duration {
        let elapsed = match self.state {
            TimerState::NotStarted => Duration::ZERO,
            TimerState::Running {
                started,
                paused_total,
            } => now
                .saturating_duration_since(started)
                .saturating_sub(paused_total),
            TimerState::Paused {
                started,
                paused_at,
                paused_total,
            } => paused_at
                .saturating_duration_since(started)
                .saturating_sub(paused_total),
        };
        elapsed.min(self.countdown)
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.countdown.saturating_sub(self.elapsed(now))
    }

    /// Remaining time as `MM:SS`, floored to whole seconds.
    pub fn display_text(&self, now: Instant) -> String {
        let secs = self.remaining(now).as_secs();
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_not_started_shows_full_countdown() {
        let timer = SessionTimer::default();
        let now = Instant::now();
        assert_eq!(timer.elapsed(now), Duration::ZERO);
        assert_eq!(timer.display_text(now), "15:00");
    }

    #[test]
    fn test_pause_is_excluded_from_elapsed() {
        let mut timer = SessionTimer::default();
        let t0 = Instant::now();
        timer.toggle(t0);
        timer.toggle(t0 + secs(10));
        assert_eq!(timer.elapsed(t0 + secs(14)), secs(10));
        timer.toggle(t0 + secs(15));
        assert_eq!(timer.elapsed(t0 + secs(20)), secs(15));
    }

    #[test]
    fn test_rising_edge_only() {
        let mut timer = SessionTimer::default();
        let t0 = Instant::now();
        assert!(timer.toggle_on_rising_edge(true, t0));
        // Flag still held: no further toggles
        for ms in 1..100 {
            assert!(!timer.toggle_on_rising_edge(true, t0 + Duration::from_millis(ms)));
        }
        assert!(matches!(timer.state(), TimerState::Running { .. }));

        assert!(!timer.toggle_on_rising_edge(false, t0 + secs(1)));
        assert!(timer.toggle_on_rising_edge(true, t0 + secs(2)));
        assert!(matches!(timer.state(), TimerState::Paused { .. }));
    }

    #[test]
    fn test_display_floors_seconds() {
        let mut timer = SessionTimer::default();
        let t0 = Instant::now();
        timer.toggle(t0);
        assert_eq!(timer.display_text(t0 + Duration::from_millis(400)), "14:59");
        assert_eq!(timer.display_text(t0 + Duration::from_millis(1_000)), "14:59");
        assert_eq!(timer.display_text(t0 + Duration::from_millis(1_001)), "14:58");
        assert_eq!(timer.display_text(t0 + secs(61)), "13:59");
    }

    #[test]
    fn test_elapsed_clamps_to_countdown() {
        let mut timer = SessionTimer::new(secs(60));
        let t0 = Instant::now();
        timer.toggle(t0);
        assert_eq!(timer.elapsed(t0 + secs(3_600)), secs(60));
        assert_eq!(timer.display_text(t0 + secs(3_600)), "00:00");
    }

    #[test]
    fn test_paused_clock_is_frozen() {
        let mut timer = SessionTimer::default();
        let t0 = Instant::now();
        timer.toggle(t0);
        timer.toggle(t0 + secs(30));
        assert_eq!(timer.display_text(t0 + secs(30)), "14:30");
        assert_eq!(timer.display_text(t0 + secs(300)), "14:30");
    }
}
