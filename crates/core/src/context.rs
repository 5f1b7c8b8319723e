//! Explicit services passed to code that needs time or randomness.

use crate::{Clock, Random};

/// Clock and random services, created once at startup.
#[derive(Debug)]
pub struct EngineContext {
    pub clock: Clock,
    pub random: Random,
}

impl EngineContext {
    /// Creates a context whose random generator is seeded from the clock's start time.
    pub fn new() -> Self {
        let clock = Clock::new();
        let random = Random::from_seed(clock.start_seed());
        Self { clock, random }
    }

    /// Creates a context with a fixed random seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            clock: Clock::new(),
            random: Random::from_seed(seed),
        }
    }

    /// Advances the clock and returns the frame delta in seconds.
    pub fn tick(&mut self) -> f32 {
        self.clock.tick();
        self.clock.delta_secs()
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_seed_is_reproducible() {
        let mut a = EngineContext::with_seed(1);
        let mut b = EngineContext::with_seed(1);
        assert_eq!(a.random.value(), b.random.value());
    }

    #[test]
    fn test_tick_counts() {
        let mut ctx = EngineContext::with_seed(0);
        let dt = ctx.tick();
        assert!(dt >= 0.0);
        assert_eq!(ctx.clock.ticks(), 1);
    }
}
