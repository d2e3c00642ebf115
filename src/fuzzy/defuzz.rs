//! Defuzzification of an aggregated output curve

use serde::{Deserialize, Serialize};

/// Defuzzification method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Defuzzifier {
    /// Center of gravity of the piecewise-linear curve (area centroid)
    #[default]
    Centroid,
    /// Membership-weighted mean of the sample points: Σ x·μ / Σ μ
    WeightedMean,
}

impl Defuzzifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Defuzzifier::Centroid => "centroid",
            Defuzzifier::WeightedMean => "weighted-mean",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "centroid" | "cog" | "center-of-gravity" => Some(Defuzzifier::Centroid),
            "weighted-mean" | "weighted_mean" | "mean" => Some(Defuzzifier::WeightedMean),
            _ => None,
        }
    }

    /// Whether the engine should insert the points where clipped sets change
    /// slope before aggregating. Only the area centroid benefits from them.
    pub fn wants_refined_universe(&self) -> bool {
        matches!(self, Defuzzifier::Centroid)
    }

    /// Crisp value of the curve, or `None` if it has no mass
    pub fn defuzzify(&self, curve: &[(f64, f64)]) -> Option<f64> {
        match self {
            Defuzzifier::Centroid => centroid(curve),
            Defuzzifier::WeightedMean => weighted_mean(curve),
        }
    }
}

/// What to do when no rule fired and the aggregated curve is zero everywhere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroAreaPolicy {
    /// Fail with a defuzzification error
    #[default]
    Error,
    /// Return the midpoint of the output universe
    Midpoint,
}

/// Area centroid of a piecewise-linear curve given as sorted `(x, μ)` points.
///
/// Each segment is a trapezoid with parallel sides `y1`, `y2` over `[x1, x2]`;
/// its centroid sits at `x1 + (x2 - x1)(y1 + 2·y2) / 3(y1 + y2)`.
pub fn centroid(curve: &[(f64, f64)]) -> Option<f64> {
    if let [(x, y)] = curve {
        return (*y > 0.0).then_some(*x);
    }

    let mut moment = 0.0;
    let mut area = 0.0;
    for pair in curve.windows(2) {
        let (x1, y1) = pair[0];
        let (x2, y2) = pair[1];
        let width = x2 - x1;
        if (y1 == 0.0 && y2 == 0.0) || width == 0.0 {
            continue;
        }
        let segment_area = 0.5 * width * (y1 + y2);
        let segment_centroid = x1 + width * (y1 + 2.0 * y2) / (3.0 * (y1 + y2));
        moment += segment_centroid * segment_area;
        area += segment_area;
    }

    (area > 0.0).then(|| moment / area)
}

/// Discrete weighted mean `Σ x·μ / Σ μ` over the sample points
pub fn weighted_mean(curve: &[(f64, f64)]) -> Option<f64> {
    let (numerator, denominator) = curve
        .iter()
        .fold((0.0, 0.0), |(num, den), (x, m)| (num + x * m, den + m));
    (denominator > 0.0).then(|| numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baja() -> Vec<(f64, f64)> {
        // (0, 0, 13) on 0..=25
        (0..=25)
            .map(|i| {
                let x = i as f64;
                (x, if x < 13.0 { (13.0 - x) / 13.0 } else { 0.0 })
            })
            .collect()
    }

    #[test]
    fn test_centroid_of_left_triangle() {
        let c = centroid(&baja()).unwrap();
        assert!((c - 13.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_mean_of_left_triangle() {
        // Σ x(13-x) / Σ (13-x) for x in 0..=13 = 28 / 7
        let c = weighted_mean(&baja()).unwrap();
        assert!((c - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_centroid_of_rectangle() {
        let curve = vec![(2.0, 0.0), (2.0, 0.5), (6.0, 0.5), (6.0, 0.0)];
        assert!((centroid(&curve).unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_curve_has_no_value() {
        let flat: Vec<(f64, f64)> = (0..10).map(|i| (i as f64, 0.0)).collect();
        assert_eq!(centroid(&flat), None);
        assert_eq!(weighted_mean(&flat), None);
        assert_eq!(Defuzzifier::Centroid.defuzzify(&[]), None);
    }

    #[test]
    fn test_single_point() {
        assert_eq!(centroid(&[(3.0, 0.4)]), Some(3.0));
        assert_eq!(centroid(&[(3.0, 0.0)]), None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!(Defuzzifier::from_str("centroid"), Some(Defuzzifier::Centroid));
        assert_eq!(Defuzzifier::from_str("Weighted-Mean"), Some(Defuzzifier::WeightedMean));
        assert_eq!(Defuzzifier::from_str("bisector"), None);
    }
}
