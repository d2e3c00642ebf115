//! Fuzzy truth values and triangular membership functions

use serde::{Deserialize, Serialize};

use crate::error::{FuzzyError, FuzzyResult};

/// A fuzzy truth value in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FuzzyValue(f64);

impl FuzzyValue {
    pub const ZERO: FuzzyValue = FuzzyValue(0.0);
    pub const ONE: FuzzyValue = FuzzyValue(1.0);

    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Fuzzy NOT (complement)
    pub fn not(&self) -> Self {
        Self::new(1.0 - self.0)
    }

    /// Fuzzy AND (t-norm) - minimum
    pub fn and(&self, other: &Self) -> Self {
        Self::new(self.0.min(other.0))
    }

    /// Fuzzy OR (t-conorm) - maximum
    pub fn or(&self, other: &Self) -> Self {
        Self::new(self.0.max(other.0))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

impl From<f64> for FuzzyValue {
    fn from(v: f64) -> Self {
        Self::new(v)
    }
}

impl From<FuzzyValue> for f64 {
    fn from(v: FuzzyValue) -> Self {
        v.0
    }
}

/// Triangular membership function with breakpoints `(a, b, c)`.
///
/// Membership rises linearly from 0 at `a` to 1 at `b`, then falls back to 0
/// at `c`. When `a == b` the left edge is a vertical step to the peak (a left
/// shoulder such as `(0, 0, 5)`), likewise for `b == c` on the right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangular {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Triangular {
    /// Build a triangle, checking that the breakpoints are finite and ordered.
    ///
    /// `set` only names the set in the error message.
    pub fn new(set: &str, a: f64, b: f64, c: f64) -> FuzzyResult<Self> {
        let finite = a.is_finite() && b.is_finite() && c.is_finite();
        if !finite || a > b || b > c {
            return Err(FuzzyError::invalid_breakpoints(set, a, b, c));
        }
        Ok(Self { a, b, c })
    }

    /// Evaluate membership for a crisp value.
    ///
    /// The peak is tested first so shoulders reach 1 at their vertical edge.
    pub fn evaluate(&self, x: f64) -> FuzzyValue {
        let Triangular { a, b, c } = *self;
        let degree = if x == b {
            1.0
        } else if x <= a || x >= c {
            0.0
        } else if x < b {
            // a < x < b implies a != b
            (x - a) / (b - a)
        } else {
            (c - x) / (c - b)
        };
        FuzzyValue::new(degree)
    }

    /// Core interval (membership = 1)
    pub fn core(&self) -> (f64, f64) {
        (self.b, self.b)
    }

    /// Support interval (membership > 0), including a shoulder's peak edge
    pub fn support(&self) -> (f64, f64) {
        (self.a, self.c)
    }

    pub fn breakpoints(&self) -> (f64, f64, f64) {
        (self.a, self.b, self.c)
    }
}
