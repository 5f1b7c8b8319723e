//! Seedable random number service.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const VALUE_RESOLUTION: u32 = 1_000_000;

/// Random number source owned by the [`EngineContext`](crate::EngineContext).
#[derive(Debug, Clone)]
pub struct Random {
    rng: StdRng,
}

impl Random {
    /// Create a deterministic generator from a seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create a generator seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Returns a value in `[0.0, 1.0]`, both ends inclusive, with six decimal places.
    pub fn value(&mut self) -> f32 {
        self.rng.gen_range(0..=VALUE_RESOLUTION) as f32 / VALUE_RESOLUTION as f32
    }

    /// Returns a value in `[min, max]`.
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        self.value() * (max - min) + min
    }

    /// Returns an integer in `[min, max)`.
    ///
    /// Returns `min` when the range is empty.
    pub fn int_range(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    /// Returns an angle in `[0, 2π]` radians.
    pub fn angle_radians(&mut self) -> f32 {
        self.value() * TAU
    }

    /// Returns a point with both components in `[0, 1]`.
    pub fn in_unit_square(&mut self) -> Vec2 {
        Vec2::new(self.value(), self.value())
    }

    /// Returns a point with all components in `[0, 1]`.
    pub fn in_unit_cube(&mut self) -> Vec3 {
        Vec3::new(self.value(), self.value(), self.value())
    }

    /// Returns a point with every component in `[-extent, extent]`.
    pub fn in_cube(&mut self, extent: f32) -> Vec3 {
        Vec3::new(
            self.range(-extent, extent),
            self.range(-extent, extent),
            self.range(-extent, extent),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_in_unit_interval() {
        let mut random = Random::from_seed(7);
        for _ in 0..1000 {
            let v = random.value();
            assert!((0.0..=1.0).contains(&v), "Expected [0, 1], got {}", v);
        }
    }

    #[test]
    fn test_range_bounds() {
        let mut random = Random::from_seed(11);
        for _ in 0..1000 {
            let v = random.range(-3.0, 3.0);
            assert!((-3.0..=3.0).contains(&v), "Expected [-3, 3], got {}", v);
        }
    }

    #[test]
    fn test_int_range_excludes_max() {
        let mut random = Random::from_seed(3);
        let mut seen = [false; 4];
        for _ in 0..1000 {
            let v = random.int_range(2, 6);
            assert!((2..6).contains(&v), "Expected [2, 6), got {}", v);
            seen[(v - 2) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_int_range_empty() {
        let mut random = Random::from_seed(3);
        assert_eq!(random.int_range(5, 5), 5);
    }

    #[test]
    fn test_angle_bounds() {
        let mut random = Random::from_seed(5);
        for _ in 0..1000 {
            let a = random.angle_radians();
            assert!((0.0..=TAU).contains(&a));
        }
    }

    #[test]
    fn test_seed_is_deterministic() {
        let mut a = Random::from_seed(42);
        let mut b = Random::from_seed(42);
        for _ in 0..16 {
            assert_eq!(a.value(), b.value());
        }
        assert_eq!(a.in_unit_cube(), b.in_unit_cube());
    }

    #[test]
    fn test_unit_square_bounds() {
        let mut random = Random::from_seed(13);
        for _ in 0..100 {
            let p = random.in_unit_square();
            assert!(p.min_element() >= 0.0 && p.max_element() <= 1.0, "Expected [0, 1], got {:?}", p);
        }
    }

    #[test]
    fn test_in_cube_bounds() {
        let mut random = Random::from_seed(9);
        for _ in 0..100 {
            let p = random.in_cube(2.0);
            assert!(p.abs().max_element() <= 2.0, "Expected within 2.0, got {:?}", p);
        }
    }
}
