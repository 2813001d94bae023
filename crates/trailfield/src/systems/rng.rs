//! Seedable pseudo-random number generator (xorshift64).
//! Deterministic and fast; every random draw in the simulation goes through it.

use std::f32::consts::TAU;

use glam::Vec2;

#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Rng {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generate a random number in [0, upper_bound).
    pub fn next_int(&mut self, upper_bound: u32) -> u32 {
        if upper_bound == 0 {
            return 0;
        }
        (self.next_u64() % upper_bound as u64) as u32
    }

    /// Uniform float in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        // Top 24 bits give an exactly representable f32 mantissa.
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform float in [min, max]. A reversed range is swapped.
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        (lo + self.next_f32() * (hi - lo)).min(hi)
    }

    /// Uniform angle in [0, 2π).
    pub fn angle(&mut self) -> f32 {
        self.next_f32() * TAU
    }

    /// Vector with random direction and a magnitude drawn from `speed`.
    pub fn radial(&mut self, speed: (f32, f32)) -> Vec2 {
        let magnitude = self.range(speed.0, speed.1);
        Vec2::from_angle(self.angle()) * magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rng_deterministic() {
        let mut rng1 = Rng::new(42);
        let mut rng2 = Rng::new(42);
        for _ in 0..10 {
            assert_eq!(rng1.next_int(1000), rng2.next_int(1000));
        }
    }

    #[test]
    fn rng_zero_seed_handled() {
        let mut rng = Rng::new(0);
        let _ = rng.next_int(100);
        assert_eq!(rng.next_int(0), 0);
    }

    #[test]
    fn floats_stay_in_unit_interval() {
        let mut rng = Rng::new(7);
        for _ in 0..10_000 {
            let f = rng.next_f32();
            assert!((0.0..1.0).contains(&f), "{}", f);
        }
    }

    #[test]
    fn range_respects_bounds_even_when_reversed() {
        let mut rng = Rng::new(99);
        for _ in 0..1000 {
            let a = rng.range(8.0, 12.0);
            assert!((8.0..=12.0).contains(&a));
            let b = rng.range(12.0, 8.0);
            assert!((8.0..=12.0).contains(&b));
        }
    }

    #[test]
    fn radial_magnitude_within_speed_range() {
        let mut rng = Rng::new(3);
        for _ in 0..1000 {
            let v = rng.radial((10.0, 15.0));
            let len = v.length();
            assert!(len >= 10.0 - 1e-3 && len <= 15.0 + 1e-3, "{}", len);
        }
    }
}
