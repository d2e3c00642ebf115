//! Discretized universes of discourse

use serde::{Deserialize, Serialize};

use crate::error::{FuzzyError, FuzzyResult};

/// Tolerance used when deciding how many steps fit between the bounds.
const STEP_EPSILON: f64 = 1e-9;

/// Upper bound on the number of sample points of one universe.
pub const MAX_POINTS: usize = 1_000_000;

/// An ordered, evenly spaced sequence of sample points `start, start + step, ..`
/// up to and including `end` (when `end` lies on the grid).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    start: f64,
    step: f64,
    len: usize,
}

impl Universe {
    pub fn new(start: f64, end: f64, step: f64) -> FuzzyResult<Self> {
        let valid = start.is_finite() && end.is_finite() && step.is_finite();
        if !valid || step <= 0.0 || end < start {
            return Err(FuzzyError::invalid_universe(start, end, step));
        }
        let steps = ((end - start) / step + STEP_EPSILON).floor();
        let len = if steps.is_finite() && steps < MAX_POINTS as f64 {
            (steps as usize).checked_add(1)
        } else {
            None
        };
        match len {
            Some(len) => Ok(Self { start, step, len }),
            None => Err(FuzzyError::invalid_universe(start, end, step)
                .with_hint(format!("Use a step that yields at most {} points", MAX_POINTS))),
        }
    }

    /// Integer universe `lo..=hi`
    pub fn integers(lo: i64, hi: i64) -> FuzzyResult<Self> {
        Self::new(lo as f64, hi as f64, 1.0)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// The `i`-th sample point. Computed from the index, not accumulated.
    pub fn point(&self, i: usize) -> f64 {
        self.start + i as f64 * self.step
    }

    pub fn points(&self) -> impl ExactSizeIterator<Item = f64> + '_ {
        (0..self.len).map(move |i| self.point(i))
    }

    /// `(first, last)` sample points
    pub fn bounds(&self) -> (f64, f64) {
        (self.start, self.point(self.len - 1))
    }

    pub fn contains(&self, x: f64) -> bool {
        let (lo, hi) = self.bounds();
        x >= lo && x <= hi
    }

    pub fn clamp(&self, x: f64) -> f64 {
        let (lo, hi) = self.bounds();
        x.clamp(lo, hi)
    }

    pub fn midpoint(&self) -> f64 {
        let (lo, hi) = self.bounds();
        (lo + hi) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_universe() {
        let u = Universe::integers(0, 10).unwrap();
        assert_eq!(u.len(), 11);
        assert_eq!(u.bounds(), (0.0, 10.0));
        let points: Vec<f64> = u.points().collect();
        assert_eq!(points.first(), Some(&0.0));
        assert_eq!(points.last(), Some(&10.0));
        assert!(points.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_fractional_step_includes_end() {
        let u = Universe::new(0.0, 10.0, 0.2).unwrap();
        assert_eq!(u.len(), 51);
        assert!((u.bounds().1 - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_and_contains() {
        let u = Universe::integers(0, 25).unwrap();
        assert!(u.contains(12.5));
        assert!(!u.contains(-0.1));
        assert_eq!(u.clamp(30.0), 25.0);
        assert_eq!(u.clamp(-3.0), 0.0);
        assert_eq!(u.midpoint(), 12.5);
    }

    #[test]
    fn test_invalid_universe() {
        assert!(Universe::new(0.0, 10.0, 0.0).is_err());
        assert!(Universe::new(10.0, 0.0, 1.0).is_err());
        assert!(Universe::new(0.0, f64::INFINITY, 1.0).is_err());
    }

    #[test]
    fn test_tiny_step_is_rejected() {
        for step in [1e-300, f64::MIN_POSITIVE, 1e-6] {
            let err = Universe::new(0.0, 10.0, step).unwrap_err();
            assert_eq!(err.code, crate::error::ErrorCode::InvalidUniverse);
            assert!(err.hint.is_some());
        }
        // Range too wide for its step
        assert!(Universe::new(-1e308, 1e308, 1.0).is_err());
    }

    #[test]
    fn test_point_limit_is_inclusive() {
        let step = 10.0 / (MAX_POINTS - 1) as f64;
        assert_eq!(Universe::new(0.0, 10.0, step).unwrap().len(), MAX_POINTS);
    }
}
