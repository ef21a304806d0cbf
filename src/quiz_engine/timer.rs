use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A one-second-resolution countdown advanced by explicit ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    remaining: u64,
}

impl Countdown {
    pub fn new(seconds: u64) -> Self {
        Countdown { remaining: seconds }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// Consume one second; returns `true` once the countdown has run out.
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.is_expired()
    }
}

/// `HH:MM:SS`, hours not wrapped at 24.
pub fn format_clock(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

/// Wall-clock source for timestamps and elapsed time.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn starting_at(ms: i64) -> Self {
        ManualClock { now: Arc::new(AtomicI64::new(ms)) }
    }

    pub fn advance_secs(&self, secs: i64) {
        self.now.fetch_add(secs * 1000, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_expires_after_exactly_n_ticks() {
        let mut c = Countdown::new(3);
        assert!(!c.tick());
        assert!(!c.tick());
        assert!(c.tick());
        assert!(c.tick(), "stays expired");
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn format_clock_pads_fields() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(59), "00:00:59");
        assert_eq!(format_clock(3 * 3600), "03:00:00");
        assert_eq!(format_clock(3661), "01:01:01");
        assert_eq!(format_clock(100 * 3600), "100:00:00");
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::starting_at(1_000);
        let other = clock.clone();
        clock.advance_secs(5);
        assert_eq!(other.now_ms(), 6_000);
    }
}
