//! Frame clock: elapsed time, delta time and a tick counter.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Frame clock owned by the [`EngineContext`](crate::EngineContext).
///
/// `tick()` is called once per frame; between ticks, [`delta_secs`](Self::delta_secs)
/// and [`time_secs`](Self::time_secs) are stable values.
#[derive(Debug)]
pub struct Clock {
    start: Instant,
    started_at: SystemTime,
    last_tick: Instant,
    time: Duration,
    delta: Duration,
    ticks: u64,
}

impl Clock {
    /// Create a new clock, starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            started_at: SystemTime::now(),
            last_tick: now,
            time: Duration::ZERO,
            delta: Duration::ZERO,
            ticks: 0,
        }
    }

    /// Advance the clock to the current instant.
    ///
    /// Returns the delta since the previous tick.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        self.advance(now - self.last_tick);
        self.last_tick = now;
        self.delta
    }

    /// Advance the clock by a fixed step without reading the system time.
    pub fn advance(&mut self, delta: Duration) {
        self.delta = delta;
        self.time += delta;
        self.ticks += 1;
    }

    /// Time accumulated by ticks, in seconds.
    pub fn time_secs(&self) -> f32 {
        self.time.as_secs_f32()
    }

    /// Duration of the last tick, in seconds.
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Wall-clock time since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Number of ticks so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// A seed derived from the wall-clock time at which the clock was created.
    pub fn start_seed(&self) -> u64 {
        self.started_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    }

    /// Reset the clock to the current time.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clock_is_zeroed() {
        let clock = Clock::new();
        assert_eq!(clock.ticks(), 0);
        assert_eq!(clock.delta_secs(), 0.0);
        assert_eq!(clock.time_secs(), 0.0);
    }

    #[test]
    fn test_advance_accumulates() {
        let mut clock = Clock::new();
        clock.advance(Duration::from_millis(250));
        clock.advance(Duration::from_millis(500));

        assert_eq!(clock.ticks(), 2);
        assert!((clock.delta_secs() - 0.5).abs() < 1e-6);
        assert!((clock.time_secs() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_tick_is_monotonic() {
        let mut clock = Clock::new();
        std::thread::sleep(Duration::from_millis(2));
        let delta = clock.tick();
        assert!(delta >= Duration::from_millis(2), "Expected >= 2ms, got {:?}", delta);
        assert_eq!(clock.ticks(), 1);
    }

    #[test]
    fn test_reset() {
        let mut clock = Clock::new();
        clock.advance(Duration::from_secs(1));
        clock.reset();
        assert_eq!(clock.ticks(), 0);
        assert_eq!(clock.time_secs(), 0.0);
    }
}
