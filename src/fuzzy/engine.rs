//! Mamdani inference engine
//!
//! Evaluation runs as a single-shot pipeline:
//!
//! ```text
//! crisp inputs ──► input policy ──► fuzzify ──► fire rules ──► clip & aggregate ──► defuzzify
//!                  (clamp/reject)   (per set)   (OR=max,       (min per set,        (crisp output
//!                                                AND=min)       max across sets)     + curve)
//! ```
//!
//! The [`InferenceSystem`] is immutable once built. All per-call state lives
//! in an [`EvaluationContext`], so one system can be shared across threads.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ErrorCode, FuzzyError, FuzzyResult};
use crate::fuzzy_ensure;

use super::defuzz::{Defuzzifier, ZeroAreaPolicy};
use super::membership::FuzzyValue;
use super::rule::{Rule, SetRef};
use super::variable::{LinguisticVariable, Role};

/// Two sample points closer than this are treated as the same point.
const POINT_EPSILON: f64 = 1e-12;

/// Handling of crisp inputs outside a variable's universe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputPolicy {
    /// Clamp to the nearest bound and log a warning
    #[default]
    Clamp,
    /// Fail with an input range error
    Reject,
}

impl InputPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputPolicy::Clamp => "clamp",
            InputPolicy::Reject => "reject",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "clamp" | "clip" => Some(InputPolicy::Clamp),
            "reject" | "strict" => Some(InputPolicy::Reject),
            _ => None,
        }
    }
}

/// Engine behaviour knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub input_policy: InputPolicy,
    pub defuzzifier: Defuzzifier,
    pub zero_area: ZeroAreaPolicy,
}

/// Result of one evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// Crisp output value
    pub output: f64,
    /// Aggregated output membership curve as `(x, degree)` pairs
    pub curve: Vec<(f64, f64)>,
    /// Activation level of every consequent set, in definition order
    pub activations: IndexMap<String, f64>,
    /// Names of inputs that were clamped into their universe
    pub clamped: Vec<String>,
    /// Number of rules with a non-zero firing degree
    pub rules_fired: usize,
}

/// Per-call scratch state. Reset at the start of every evaluation.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    inputs: IndexMap<String, f64>,
    clamped: Vec<String>,
    fuzzified: IndexMap<String, IndexMap<String, FuzzyValue>>,
    activations: IndexMap<String, FuzzyValue>,
    rules_fired: usize,
    output: Option<Evaluation>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.inputs.clear();
        self.clamped.clear();
        self.fuzzified.clear();
        self.activations.clear();
        self.rules_fired = 0;
        self.output = None;
    }

    /// Effective crisp inputs after the input policy was applied
    pub fn inputs(&self) -> &IndexMap<String, f64> {
        &self.inputs
    }

    /// Fuzzified degrees: variable -> set -> degree
    pub fn fuzzified(&self) -> &IndexMap<String, IndexMap<String, FuzzyValue>> {
        &self.fuzzified
    }

    pub fn activations(&self) -> &IndexMap<String, FuzzyValue> {
        &self.activations
    }

    pub fn output(&self) -> Option<&Evaluation> {
        self.output.as_ref()
    }

    pub fn take_output(&mut self) -> Option<Evaluation> {
        self.output.take()
    }
}

/// Fuzzy inference system: antecedents, one consequent, rules and settings
#[derive(Debug, Clone)]
pub struct InferenceSystem {
    antecedents: IndexMap<String, LinguisticVariable>,
    consequent: LinguisticVariable,
    rules: Vec<Rule>,
    settings: EngineSettings,
}

impl InferenceSystem {
    /// Build a system, checking roles, names and every rule reference.
    pub fn new(
        antecedents: Vec<LinguisticVariable>,
        consequent: LinguisticVariable,
        rules: Vec<Rule>,
        settings: EngineSettings,
    ) -> FuzzyResult<Self> {
        fuzzy_ensure!(
            consequent.role() == Role::Consequent,
            role_mismatch(consequent.name(), Role::Consequent)
        );
        fuzzy_ensure!(
            !rules.is_empty(),
            FuzzyError::new(ErrorCode::EmptyRuleBase, "An inference system needs at least one rule")
        );

        let mut by_name: IndexMap<String, LinguisticVariable> =
            IndexMap::with_capacity(antecedents.len());
        for var in antecedents {
            fuzzy_ensure!(
                var.role() == Role::Antecedent,
                role_mismatch(var.name(), Role::Antecedent)
            );
            fuzzy_ensure!(
                var.name() != consequent.name() && !by_name.contains_key(var.name()),
                FuzzyError::duplicate_variable(var.name())
            );
            by_name.insert(var.name().to_string(), var);
        }

        let system = Self {
            antecedents: by_name,
            consequent,
            rules,
            settings,
        };
        for rule in &system.rules {
            system.check_rule(rule)?;
        }
        Ok(system)
    }

    fn check_rule(&self, rule: &Rule) -> FuzzyResult<()> {
        for r in rule.antecedent.references() {
            let var = match self.antecedents.get(&r.variable) {
                Some(var) => var,
                None if r.variable == self.consequent.name() => {
                    return Err(role_mismatch(&r.variable, Role::Antecedent)
                        .with_context("rule", rule.label.as_str()));
                }
                None => {
                    return Err(FuzzyError::unknown_variable(&r.variable)
                        .with_context("rule", rule.label.as_str()));
                }
            };
            if !var.has_set(&r.set) {
                return Err(FuzzyError::unknown_set(&r.variable, &r.set)
                    .with_context("rule", rule.label.as_str()));
            }
        }

        let SetRef { variable, set } = &rule.consequent;
        if variable != self.consequent.name() {
            let err = if self.antecedents.contains_key(variable) {
                role_mismatch(variable, Role::Consequent)
            } else {
                FuzzyError::unknown_variable(variable)
            };
            return Err(err.with_context("rule", rule.label.as_str()));
        }
        if !self.consequent.has_set(set) {
            return Err(FuzzyError::unknown_set(variable, set)
                .with_context("rule", rule.label.as_str()));
        }
        Ok(())
    }

    pub fn antecedents(&self) -> impl Iterator<Item = &LinguisticVariable> {
        self.antecedents.values()
    }

    pub fn antecedent(&self, name: &str) -> FuzzyResult<&LinguisticVariable> {
        self.antecedents
            .get(name)
            .ok_or_else(|| FuzzyError::unknown_variable(name))
    }

    pub fn consequent(&self) -> &LinguisticVariable {
        &self.consequent
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Evaluate with a fresh context
    pub fn evaluate(&self, inputs: &[(&str, f64)]) -> FuzzyResult<Evaluation> {
        let mut ctx = EvaluationContext::new();
        self.evaluate_with(&mut ctx, inputs)?;
        ctx.take_output()
            .ok_or_else(|| FuzzyError::internal("evaluation finished without an output"))
    }

    /// Evaluate into a caller-owned context. The context is reset first.
    pub fn evaluate_with<'c>(
        &self,
        ctx: &'c mut EvaluationContext,
        inputs: &[(&str, f64)],
    ) -> FuzzyResult<&'c Evaluation> {
        ctx.reset();

        for (i, (name, _)) in inputs.iter().enumerate() {
            fuzzy_ensure!(
                self.antecedents.contains_key(*name),
                FuzzyError::unknown_variable(name)
            );
            fuzzy_ensure!(
                inputs[..i].iter().all(|(seen, _)| seen != name),
                FuzzyError::duplicate_variable(name)
                    .with_hint("Supply each input variable exactly once")
            );
        }

        // Fuzzification
        for (name, var) in &self.antecedents {
            let raw = inputs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| *v)
                .ok_or_else(|| FuzzyError::missing_input(name))?;
            let x = self.admit_input(var, raw, &mut ctx.clamped)?;
            ctx.inputs.insert(name.clone(), x);
            ctx.fuzzified.insert(name.clone(), var.fuzzify(x));
        }

        // Rule evaluation and aggregation per consequent set
        for name in self.consequent.set_names() {
            ctx.activations.insert(name.to_string(), FuzzyValue::ZERO);
        }
        for rule in &self.rules {
            let degree = rule.antecedent.degree(&ctx.fuzzified)?;
            if !degree.is_zero() {
                ctx.rules_fired += 1;
            }
            let slot = ctx
                .activations
                .get_mut(&rule.consequent.set)
                .ok_or_else(|| FuzzyError::unknown_set(self.consequent.name(), &rule.consequent.set))?;
            *slot = slot.or(&degree);
        }

        // Implication and aggregation over the output universe
        let points = self.sample_points(&ctx.activations);
        let curve: Vec<(f64, f64)> = points
            .into_iter()
            .map(|x| (x, self.aggregate_at(&ctx.activations, x)))
            .collect();

        // Defuzzification
        let output = match self.settings.defuzzifier.defuzzify(&curve) {
            Some(value) => value,
            None => match self.settings.zero_area {
                ZeroAreaPolicy::Error => {
                    return Err(FuzzyError::defuzzification(self.consequent.name()));
                }
                ZeroAreaPolicy::Midpoint => {
                    let mid = self.consequent.universe().midpoint();
                    warn!(
                        variable = self.consequent.name(),
                        fallback = mid,
                        "no rule fired, using universe midpoint"
                    );
                    mid
                }
            },
        };

        debug!(
            inputs = ?ctx.inputs,
            rules_fired = ctx.rules_fired,
            output,
            "evaluated {}",
            self.consequent.name()
        );

        ctx.output = Some(Evaluation {
            output,
            curve,
            activations: ctx
                .activations
                .iter()
                .map(|(name, v)| (name.clone(), v.value()))
                .collect(),
            clamped: ctx.clamped.clone(),
            rules_fired: ctx.rules_fired,
        });
        ctx.output
            .as_ref()
            .ok_or_else(|| FuzzyError::internal("evaluation output missing"))
    }

    /// Apply the input policy to one crisp input
    fn admit_input(
        &self,
        var: &LinguisticVariable,
        x: f64,
        clamped: &mut Vec<String>,
    ) -> FuzzyResult<f64> {
        fuzzy_ensure!(x.is_finite(), FuzzyError::non_finite(var.name(), x));

        let universe = var.universe();
        if universe.contains(x) {
            return Ok(x);
        }

        let (lo, hi) = universe.bounds();
        match self.settings.input_policy {
            InputPolicy::Reject => Err(FuzzyError::input_range(var.name(), x, lo, hi)
                .with_hint("Use the clamp input policy to accept out-of-range values")),
            InputPolicy::Clamp => {
                let clamped_x = universe.clamp(x);
                warn!(
                    variable = var.name(),
                    value = x,
                    clamped = clamped_x,
                    "input outside universe [{}, {}], clamping",
                    lo,
                    hi
                );
                clamped.push(var.name().to_string());
                Ok(clamped_x)
            }
        }
    }

    /// Output sample points: the universe, plus for the area centroid the
    /// breakpoints and level crossings of every activated set.
    fn sample_points(&self, activations: &IndexMap<String, FuzzyValue>) -> Vec<f64> {
        let universe = self.consequent.universe();
        let mut points: Vec<f64> = universe.points().collect();

        if self.settings.defuzzifier.wants_refined_universe() {
            for set in self.consequent.sets() {
                let alpha = activations
                    .get(&set.name)
                    .map(FuzzyValue::value)
                    .unwrap_or(0.0);
                if alpha <= 0.0 {
                    continue;
                }
                let (a, b, c) = set.membership.breakpoints();
                points.extend([a, b, c]);
                if alpha < 1.0 {
                    if a < b {
                        points.push(a + alpha * (b - a));
                    }
                    if b < c {
                        points.push(c - alpha * (c - b));
                    }
                }
            }
            points.retain(|x| universe.contains(*x));
            points.sort_by(f64::total_cmp);
            points.dedup_by(|x, prev| (*x - *prev).abs() < POINT_EPSILON);
        }

        points
    }

    /// Aggregated membership at `x`: max over sets of min(activation, μ(x))
    fn aggregate_at(&self, activations: &IndexMap<String, FuzzyValue>, x: f64) -> f64 {
        self.consequent
            .sets()
            .filter_map(|set| {
                activations
                    .get(&set.name)
                    .map(|alpha| alpha.and(&set.membership_of(x)))
            })
            .fold(FuzzyValue::ZERO, |acc, v| acc.or(&v))
            .value()
    }
}

fn role_mismatch(variable: &str, expected: Role) -> FuzzyError {
    FuzzyError::new(
        ErrorCode::RoleMismatch,
        format!("Variable '{}' must be used as {}", variable, expected.as_str()),
    )
    .with_context("variable", variable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::rule::Expr;
    use crate::fuzzy::universe::Universe;
    use crate::fuzzy::variable::SetSpec;

    fn input(name: &str) -> LinguisticVariable {
        LinguisticVariable::define(
            name,
            Role::Antecedent,
            Universe::integers(0, 10).unwrap(),
            &[
                SetSpec::new("low", 0.0, 0.0, 4.0),
                SetSpec::new("high", 6.0, 10.0, 10.0),
            ],
        )
        .unwrap()
    }

    fn output() -> LinguisticVariable {
        LinguisticVariable::define(
            "out",
            Role::Consequent,
            Universe::integers(0, 20).unwrap(),
            &[
                SetSpec::new("small", 0.0, 0.0, 10.0),
                SetSpec::new("large", 10.0, 20.0, 20.0),
            ],
        )
        .unwrap()
    }

    fn system(rules: Vec<Rule>, settings: EngineSettings) -> FuzzyResult<InferenceSystem> {
        InferenceSystem::new(vec![input("x"), input("y")], output(), rules, settings)
    }

    fn small_if_low_x() -> Rule {
        Rule::new("R1", Expr::term("x", "low"), SetRef::new("out", "small"))
    }

    #[test]
    fn test_system_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InferenceSystem>();
    }

    #[test]
    fn test_single_rule_centroid() {
        let sys = system(vec![small_if_low_x()], EngineSettings::default()).unwrap();
        let eval = sys.evaluate(&[("x", 0.0), ("y", 5.0)]).unwrap();
        assert!((eval.output - 10.0 / 3.0).abs() < 1e-9);
        assert_eq!(eval.rules_fired, 1);
        assert_eq!(eval.activations.get("small"), Some(&1.0));
        assert_eq!(eval.activations.get("large"), Some(&0.0));
    }

    #[test]
    fn test_rules_on_same_set_aggregate_with_max() {
        let rules = vec![
            small_if_low_x(),
            Rule::new("R2", Expr::term("y", "low"), SetRef::new("out", "small")),
        ];
        let sys = system(rules, EngineSettings::default()).unwrap();
        // x=3 -> low 0.25, y=1 -> low 0.75
        let eval = sys.evaluate(&[("x", 3.0), ("y", 1.0)]).unwrap();
        assert!((eval.activations["small"] - 0.75).abs() < 1e-12);
        assert_eq!(eval.rules_fired, 2);
        let peak = eval.curve.iter().map(|(_, m)| *m).fold(0.0, f64::max);
        assert!((peak - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_and_connective() {
        let rules = vec![Rule::new(
            "R1",
            Expr::term("x", "high").and(Expr::term("y", "high")),
            SetRef::new("out", "large"),
        )];
        let sys = system(rules, EngineSettings::default()).unwrap();
        // x=8 -> high 0.5, y=9 -> high 0.75
        let eval = sys.evaluate(&[("x", 8.0), ("y", 9.0)]).unwrap();
        assert!((eval.activations["large"] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_refined_curve_contains_crossings() {
        let sys = system(vec![small_if_low_x()], EngineSettings::default()).unwrap();
        // x=1 -> low 0.75, small crosses 0.75 at 2.5
        let eval = sys.evaluate(&[("x", 1.0), ("y", 0.0)]).unwrap();
        assert!(eval.curve.iter().any(|(x, _)| (*x - 2.5).abs() < 1e-12));
        assert!(eval.curve.windows(2).all(|w| w[1].0 > w[0].0));
    }

    #[test]
    fn test_weighted_mean_uses_plain_universe() {
        let settings = EngineSettings {
            defuzzifier: Defuzzifier::WeightedMean,
            ..EngineSettings::default()
        };
        let sys = system(vec![small_if_low_x()], settings).unwrap();
        let eval = sys.evaluate(&[("x", 1.0), ("y", 0.0)]).unwrap();
        assert_eq!(eval.curve.len(), 21);
    }

    #[test]
    fn test_zero_area_is_an_error_by_default() {
        let sys = system(vec![small_if_low_x()], EngineSettings::default()).unwrap();
        let err = sys.evaluate(&[("x", 8.0), ("y", 0.0)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::DefuzzificationError);
    }

    #[test]
    fn test_zero_area_midpoint_fallback() {
        let settings = EngineSettings {
            zero_area: ZeroAreaPolicy::Midpoint,
            ..EngineSettings::default()
        };
        let sys = system(vec![small_if_low_x()], settings).unwrap();
        let eval = sys.evaluate(&[("x", 8.0), ("y", 0.0)]).unwrap();
        assert_eq!(eval.output, 10.0);
        assert_eq!(eval.rules_fired, 0);
    }

    #[test]
    fn test_clamp_policy_records_clamped_inputs() {
        let sys = system(vec![small_if_low_x()], EngineSettings::default()).unwrap();
        let eval = sys.evaluate(&[("x", -4.0), ("y", 42.0)]).unwrap();
        assert_eq!(eval.clamped, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(eval.activations["small"], 1.0);
    }

    #[test]
    fn test_reject_policy() {
        let settings = EngineSettings {
            input_policy: InputPolicy::Reject,
            ..EngineSettings::default()
        };
        let sys = system(vec![small_if_low_x()], settings).unwrap();
        let err = sys.evaluate(&[("x", 10.5), ("y", 0.0)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InputRange);
        assert!(sys.evaluate(&[("x", 0.0), ("y", 10.0)]).is_ok());
    }

    #[test]
    fn test_non_finite_input_always_rejected() {
        let sys = system(vec![small_if_low_x()], EngineSettings::default()).unwrap();
        let err = sys.evaluate(&[("x", f64::NAN), ("y", 0.0)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::NonFiniteInput);
    }

    #[test]
    fn test_missing_and_unknown_inputs() {
        let sys = system(vec![small_if_low_x()], EngineSettings::default()).unwrap();
        assert_eq!(
            sys.evaluate(&[("x", 1.0)]).unwrap_err().code,
            ErrorCode::MissingInput
        );
        assert_eq!(
            sys.evaluate(&[("x", 1.0), ("y", 1.0), ("z", 1.0)]).unwrap_err().code,
            ErrorCode::UnknownVariable
        );
    }

    #[test]
    fn test_repeated_input_is_rejected() {
        let sys = system(vec![small_if_low_x()], EngineSettings::default()).unwrap();
        let err = sys
            .evaluate(&[("x", 1.0), ("y", 1.0), ("x", 9.0)])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateVariable);
        assert_eq!(err.field("variable"), Some("x"));
    }

    #[test]
    fn test_build_rejects_bad_references() {
        let bad_set = Rule::new("R", Expr::term("x", "medium"), SetRef::new("out", "small"));
        assert_eq!(
            system(vec![bad_set], EngineSettings::default()).unwrap_err().code,
            ErrorCode::UnknownSet
        );

        let bad_var = Rule::new("R", Expr::term("z", "low"), SetRef::new("out", "small"));
        assert_eq!(
            system(vec![bad_var], EngineSettings::default()).unwrap_err().code,
            ErrorCode::UnknownVariable
        );

        let wrong_role = Rule::new("R", Expr::term("x", "low"), SetRef::new("y", "low"));
        assert_eq!(
            system(vec![wrong_role], EngineSettings::default()).unwrap_err().code,
            ErrorCode::RoleMismatch
        );

        let bad_output = Rule::new("R", Expr::term("x", "low"), SetRef::new("out", "huge"));
        let err = system(vec![bad_output], EngineSettings::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownSet);
        assert_eq!(err.field("rule"), Some("R"));
    }

    #[test]
    fn test_build_rejects_bad_variables() {
        assert_eq!(
            system(Vec::new(), EngineSettings::default()).unwrap_err().code,
            ErrorCode::EmptyRuleBase
        );

        let err = InferenceSystem::new(
            vec![input("x"), input("x")],
            output(),
            vec![small_if_low_x()],
            EngineSettings::default(),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateVariable);

        let err = InferenceSystem::new(
            vec![input("x")],
            input("y"),
            vec![small_if_low_x()],
            EngineSettings::default(),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleMismatch);
    }

    #[test]
    fn test_context_reuse_does_not_carry_state() {
        let sys = system(vec![small_if_low_x()], EngineSettings::default()).unwrap();
        let mut ctx = EvaluationContext::new();

        let first = sys.evaluate_with(&mut ctx, &[("x", -1.0), ("y", 0.0)]).unwrap().clone();
        assert_eq!(first.clamped, vec!["x".to_string()]);

        let second = sys.evaluate_with(&mut ctx, &[("x", 2.0), ("y", 0.0)]).unwrap().clone();
        assert!(second.clamped.is_empty());
        assert!((ctx.inputs()["x"] - 2.0).abs() < 1e-12);

        let fresh = sys.evaluate(&[("x", 2.0), ("y", 0.0)]).unwrap();
        assert_eq!(second, fresh);

        ctx.reset();
        assert!(ctx.output().is_none());
        assert!(ctx.fuzzified().is_empty());
    }
}
