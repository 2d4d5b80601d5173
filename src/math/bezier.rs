/// A cubic bezier curve in one dimension.
#[derive(Copy, Clone, Debug)]
pub struct CubicBezier1d {
    points: [f64; 4],
}

impl CubicBezier1d {
    pub const fn new(points: &[f64; 4]) -> Self {
        Self { points: *points }
    }

    /// An S-shaped curve between `start` and `end`, with the inner control
    /// points placed 30% and 70% of the way along.
    pub fn ease(start: f64, end: f64) -> Self {
        let d = end - start;
        Self {
            points: [start, start + 0.3 * d, start + 0.7 * d, end],
        }
    }

    pub fn sample(&self, t: f64) -> f64 {
        let t1 = 1.0 - t;
        t1 * t1 * t1 * self.points[0]
            + 3.0 * t1 * t1 * t * self.points[1]
            + 3.0 * t1 * t * t * self.points[2]
            + t * t * t * self.points[3]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::{Rng, SeedableRng};

    #[test]
    fn ease_hits_its_endpoints_and_midpoint() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _i in 0..100 {
            let start = rng.gen_range(-500.0..500.0);
            let end = rng.gen_range(-500.0..500.0);
            let curve = CubicBezier1d::ease(start, end);
            assert_approx_eq!(curve.sample(0.0), start, 1e-9);
            assert_approx_eq!(curve.sample(1.0), end, 1e-9);
            assert_approx_eq!(curve.sample(0.5), 0.5 * (start + end), 1e-9);
        }
    }

    #[test]
    fn ease_is_monotonic() {
        let curve = CubicBezier1d::ease(0.0, 90.0);
        let mut prev = curve.sample(0.0);
        for i in 1..=50 {
            let y = curve.sample(i as f64 / 50.0);
            assert!(y >= prev);
            prev = y;
        }
    }
}
