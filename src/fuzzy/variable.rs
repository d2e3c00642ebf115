//! Linguistic variables and their fuzzy sets

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{FuzzyError, FuzzyResult};
use crate::fuzzy_ensure;

use super::membership::{FuzzyValue, Triangular};
use super::universe::Universe;

/// How the engine uses a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Crisp input, fuzzified before rule evaluation
    Antecedent,
    /// Output, aggregated and defuzzified
    Consequent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Antecedent => "antecedent",
            Role::Consequent => "consequent",
        }
    }
}

/// Static description of a fuzzy set, as written in a definition table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetSpec<'a> {
    pub name: &'a str,
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl<'a> SetSpec<'a> {
    pub const fn new(name: &'a str, a: f64, b: f64, c: f64) -> Self {
        Self { name, a, b, c }
    }
}

/// A named fuzzy set (term) with a triangular membership function
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuzzySet {
    /// Name of the fuzzy set (e.g., "mala", "excelente")
    pub name: String,
    /// The membership function
    pub membership: Triangular,
}

impl FuzzySet {
    pub fn new(name: impl Into<String>, membership: Triangular) -> Self {
        Self {
            name: name.into(),
            membership,
        }
    }

    /// Get membership degree for a value
    pub fn membership_of(&self, x: f64) -> FuzzyValue {
        self.membership.evaluate(x)
    }
}

/// A linguistic variable: a universe and its named fuzzy sets in definition order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinguisticVariable {
    name: String,
    role: Role,
    universe: Universe,
    sets: IndexMap<String, FuzzySet>,
}

impl LinguisticVariable {
    /// Define a variable from a table of triangular sets.
    ///
    /// Fails if any set has unordered breakpoints or if a name repeats.
    pub fn define(
        name: impl Into<String>,
        role: Role,
        universe: Universe,
        specs: &[SetSpec<'_>],
    ) -> FuzzyResult<Self> {
        let name = name.into();
        let mut sets: IndexMap<String, FuzzySet> = IndexMap::with_capacity(specs.len());

        for spec in specs {
            let membership = Triangular::new(spec.name, spec.a, spec.b, spec.c)
                .map_err(|e| e.with_context("variable", name.as_str()))?;
            fuzzy_ensure!(
                !sets.contains_key(spec.name),
                FuzzyError::duplicate_set(&name, spec.name)
            );
            sets.insert(spec.name.to_string(), FuzzySet::new(spec.name, membership));
        }

        Ok(Self {
            name,
            role,
            universe,
            sets,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn set(&self, set_name: &str) -> FuzzyResult<&FuzzySet> {
        self.sets
            .get(set_name)
            .ok_or_else(|| FuzzyError::unknown_set(&self.name, set_name))
    }

    pub fn sets(&self) -> impl Iterator<Item = &FuzzySet> {
        self.sets.values()
    }

    pub fn set_names(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }

    pub fn has_set(&self, set_name: &str) -> bool {
        self.sets.contains_key(set_name)
    }

    /// Membership of `x` in the named set, with `x` clamped to the universe
    pub fn membership(&self, set_name: &str, x: f64) -> FuzzyResult<FuzzyValue> {
        let set = self.set(set_name)?;
        Ok(set.membership_of(self.universe.clamp(x)))
    }

    /// Fuzzify a crisp value: degree in every set, in definition order.
    /// `x` is expected to already lie inside the universe.
    pub fn fuzzify(&self, x: f64) -> IndexMap<String, FuzzyValue> {
        self.sets
            .iter()
            .map(|(name, set)| (name.clone(), set.membership_of(x)))
            .collect()
    }

    /// The set with the highest membership for a value (first one on ties)
    pub fn dominant_set(&self, x: f64) -> Option<(&str, FuzzyValue)> {
        let x = self.universe.clamp(x);
        self.sets
            .iter()
            .map(|(name, set)| (name.as_str(), set.membership_of(x)))
            .fold(None, |best, (name, degree)| match best {
                Some((_, top)) if top >= degree => best,
                _ => Some((name, degree)),
            })
    }

    /// Membership curve of a set sampled on the universe
    pub fn curve(&self, set_name: &str) -> FuzzyResult<Vec<(f64, f64)>> {
        let set = self.set(set_name)?;
        Ok(self
            .universe
            .points()
            .map(|x| (x, set.membership_of(x).value()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn quality() -> LinguisticVariable {
        LinguisticVariable::define(
            "calidad_servicio",
            Role::Antecedent,
            Universe::integers(0, 10).unwrap(),
            &[
                SetSpec::new("mala", 0.0, 0.0, 5.0),
                SetSpec::new("aceptable", 0.0, 5.0, 10.0),
                SetSpec::new("excelente", 5.0, 10.0, 10.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_definition_order_is_kept() {
        let var = quality();
        let names: Vec<&str> = var.set_names().collect();
        assert_eq!(names, vec!["mala", "aceptable", "excelente"]);
        assert_eq!(var.role(), Role::Antecedent);
    }

    #[test]
    fn test_duplicate_set_rejected() {
        let err = LinguisticVariable::define(
            "calidad_comida",
            Role::Antecedent,
            Universe::integers(0, 10).unwrap(),
            &[
                SetSpec::new("mala", 0.0, 0.0, 5.0),
                SetSpec::new("mala", 0.0, 5.0, 10.0),
            ],
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateSet);
    }

    #[test]
    fn test_bad_breakpoints_name_the_variable() {
        let err = LinguisticVariable::define(
            "propina",
            Role::Consequent,
            Universe::integers(0, 25).unwrap(),
            &[SetSpec::new("media", 13.0, 0.0, 25.0)],
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidBreakpoints);
        assert_eq!(err.field("variable"), Some("propina"));
    }

    #[test]
    fn test_membership_clamps_to_universe() {
        let var = quality();
        assert_eq!(var.membership("excelente", 14.0).unwrap().value(), 1.0);
        assert_eq!(var.membership("mala", -2.0).unwrap().value(), 1.0);
    }

    #[test]
    fn test_unknown_set() {
        let err = quality().membership("regular", 3.0).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownSet);
    }

    #[test]
    fn test_membership_bounds_over_universe() {
        let var = quality();
        for x in var.universe().points() {
            for set in var.sets() {
                let m = set.membership_of(x).value();
                assert!((0.0..=1.0).contains(&m), "{} at {} = {}", set.name, x, m);
            }
        }
    }

    #[test]
    fn test_partition_of_unity() {
        let var = quality();
        for i in 0..=100 {
            let x = i as f64 * 0.1;
            let total: f64 = var.fuzzify(x).values().map(|v| v.value()).sum();
            assert!((total - 1.0).abs() < 1e-9, "sum at {} = {}", x, total);
        }
        // Adjacent sets cross at 0.5
        let m = var.membership("mala", 2.5).unwrap().value();
        let a = var.membership("aceptable", 2.5).unwrap().value();
        assert!((m - 0.5).abs() < 1e-12 && (a - 0.5).abs() < 1e-12);
        let a = var.membership("aceptable", 7.5).unwrap().value();
        let e = var.membership("excelente", 7.5).unwrap().value();
        assert!((a - 0.5).abs() < 1e-12 && (e - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_dominant_set() {
        let var = quality();
        assert_eq!(var.dominant_set(1.0).map(|(n, _)| n), Some("mala"));
        assert_eq!(var.dominant_set(5.0).map(|(n, _)| n), Some("aceptable"));
        assert_eq!(var.dominant_set(9.0).map(|(n, _)| n), Some("excelente"));
    }

    #[test]
    fn test_curve_samples_universe() {
        let curve = quality().curve("aceptable").unwrap();
        assert_eq!(curve.len(), 11);
        assert_eq!(curve[5], (5.0, 1.0));
        assert_eq!(curve[0], (0.0, 0.0));
    }
}
