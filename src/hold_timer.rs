use serde::{Deserialize, Serialize};

/// Accrual clock for held positions.
///
/// Time only accumulates while consecutive ticks report correct form; any
/// other tick folds the open segment into `accumulated_ms` and stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HoldTimer {
    accumulated_ms: u64,
    /// Start of the open segment; `Some` exactly while running
    segment_started_at: Option<u64>,
}

/// What a tick did to the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldTick {
    Started,
    Running,
    Paused,
    Idle,
}

impl HoldTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.segment_started_at.is_some()
    }

    pub fn accumulated_ms(&self) -> u64 {
        self.accumulated_ms
    }

    pub fn segment_started_at(&self) -> Option<u64> {
        self.segment_started_at
    }

    pub fn tick(&mut self, is_correct: bool, now_ms: u64) -> HoldTick {
        match (is_correct, self.segment_started_at) {
            (true, None) => {
                self.segment_started_at = Some(now_ms);
                log::debug!("hold started at {now_ms}ms");
                HoldTick::Started
            }
            (true, Some(_)) => HoldTick::Running,
            (false, Some(_)) => {
                self.pause(now_ms);
                HoldTick::Paused
            }
            (false, None) => HoldTick::Idle,
        }
    }

    /// Folds the open segment into the total. Returns false if nothing was running.
    pub fn pause(&mut self, now_ms: u64) -> bool {
        match self.segment_started_at.take() {
            Some(started) => {
                self.accumulated_ms += now_ms.saturating_sub(started);
                log::debug!(
                    "hold paused at {now_ms}ms, {}ms banked",
                    self.accumulated_ms
                );
                true
            }
            None => false,
        }
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        let open = self
            .segment_started_at
            .map_or(0, |started| now_ms.saturating_sub(started));
        self.accumulated_ms + open
    }

    /// Whole seconds held so far, rounded down
    pub fn elapsed_seconds(&self, now_ms: u64) -> u64 {
        self.elapsed_ms(now_ms) / 1000
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_timer_is_idle() {
        let t = HoldTimer::new();
        assert!(!t.is_running());
        assert_eq!(t.elapsed_seconds(10_000), 0);
    }

    #[test]
    fn test_accrues_while_correct() {
        let mut t = HoldTimer::new();
        assert_eq!(t.tick(true, 1_000), HoldTick::Started);
        assert_eq!(t.tick(true, 1_500), HoldTick::Running);
        assert!(t.is_running());
        assert_eq!(t.segment_started_at(), Some(1_000));
        assert_eq!(t.elapsed_ms(3_999), 2_999);
        assert_eq!(t.elapsed_seconds(3_999), 2);
        assert_eq!(t.elapsed_seconds(4_000), 3);
    }

    #[test]
    fn test_pause_banks_segment() {
        let mut t = HoldTimer::new();
        t.tick(true, 0);
        assert_eq!(t.tick(false, 3_000), HoldTick::Paused);
        assert!(!t.is_running());
        assert_eq!(t.segment_started_at(), None);
        assert_eq!(t.accumulated_ms(), 3_000);
        // no accrual while paused
        assert_eq!(t.tick(false, 3_400), HoldTick::Idle);
        assert_eq!(t.elapsed_ms(3_500), 3_000);
    }

    #[test]
    fn test_segments_add_up() {
        let mut t = HoldTimer::new();
        let mut now = 0;
        while now < 3_000 {
            t.tick(true, now);
            now += 100;
        }
        while now < 3_500 {
            t.tick(false, now);
            now += 100;
        }
        while now < 5_500 {
            t.tick(true, now);
            now += 100;
        }
        assert_eq!(t.elapsed_seconds(5_500), 5);
    }

    #[test]
    fn test_pause_when_idle_is_noop() {
        let mut t = HoldTimer::new();
        assert!(!t.pause(100));
        assert_eq!(t.accumulated_ms(), 0);
    }

    #[test]
    fn test_clock_going_backwards_saturates() {
        let mut t = HoldTimer::new();
        t.tick(true, 5_000);
        assert_eq!(t.elapsed_ms(4_000), 0);
        t.pause(4_000);
        assert_eq!(t.accumulated_ms(), 0);
    }

    #[test]
    fn test_reset() {
        let mut t = HoldTimer::new();
        t.tick(true, 0);
        t.tick(false, 2_500);
        t.tick(true, 3_000);
        t.reset();
        assert_eq!(t, HoldTimer::default());
    }
}
