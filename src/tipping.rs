//! The tipping inference system
//!
//! Two antecedents rated 0..10 (`calidad_servicio`, `calidad_comida`), one
//! consequent in percent 0..25 (`propina`) and three rules:
//!
//! ```text
//! R1: servicio[mala]      OR comida[mala]      => propina[baja]
//! R2: servicio[aceptable]                      => propina[media]
//! R3: servicio[excelente] OR comida[excelente] => propina[alta]
//! ```

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::FuzzyResult;
use crate::fuzzy::{
    EngineSettings, Evaluation, EvaluationContext, Expr, InferenceSystem, LinguisticVariable,
    Role, Rule, SetRef, SetSpec, Universe,
};

pub const SERVICE: &str = "calidad_servicio";
pub const FOOD: &str = "calidad_comida";
pub const TIP: &str = "propina";

const QUALITY_SETS: [SetSpec<'static>; 3] = [
    SetSpec::new("mala", 0.0, 0.0, 5.0),
    SetSpec::new("aceptable", 0.0, 5.0, 10.0),
    SetSpec::new("excelente", 5.0, 10.0, 10.0),
];

const TIP_SETS: [SetSpec<'static>; 3] = [
    SetSpec::new("baja", 0.0, 0.0, 13.0),
    SetSpec::new("media", 0.0, 13.0, 25.0),
    SetSpec::new("alta", 13.0, 25.0, 25.0),
];

/// Crisp tip with the aggregated output curve it was computed from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TipOutcome {
    /// Suggested tip in percent
    pub tip: f64,
    /// Aggregated `propina` membership curve as `(percent, degree)`
    pub output_curve: Vec<(f64, f64)>,
    /// Activation of `baja`, `media` and `alta`
    pub activations: IndexMap<String, f64>,
    /// Inputs that were clamped into 0..10
    pub clamped: Vec<String>,
}

impl From<Evaluation> for TipOutcome {
    fn from(eval: Evaluation) -> Self {
        Self {
            tip: eval.output,
            output_curve: eval.curve,
            activations: eval.activations,
            clamped: eval.clamped,
        }
    }
}

/// The fixed tipping configuration, built once and shared read-only
#[derive(Debug, Clone)]
pub struct TipSystem {
    system: InferenceSystem,
}

impl TipSystem {
    pub fn new(settings: EngineSettings) -> FuzzyResult<Self> {
        let quality = Universe::integers(0, 10)?;
        let servicio = LinguisticVariable::define(SERVICE, Role::Antecedent, quality, &QUALITY_SETS)?;
        let comida = LinguisticVariable::define(FOOD, Role::Antecedent, quality, &QUALITY_SETS)?;
        let propina = LinguisticVariable::define(
            TIP,
            Role::Consequent,
            Universe::integers(0, 25)?,
            &TIP_SETS,
        )?;

        let system = InferenceSystem::new(vec![servicio, comida], propina, rules(), settings)?;
        Ok(Self { system })
    }

    /// Build with default engine settings (clamp inputs, area centroid)
    pub fn standard() -> FuzzyResult<Self> {
        Self::new(EngineSettings::default())
    }

    /// Suggested tip for a service and a food rating
    pub fn evaluate(&self, servicio: f64, comida: f64) -> FuzzyResult<TipOutcome> {
        self.system
            .evaluate(&[(SERVICE, servicio), (FOOD, comida)])
            .map(TipOutcome::from)
    }

    /// Same as [`evaluate`](Self::evaluate), reusing a caller-owned context
    pub fn evaluate_with(
        &self,
        ctx: &mut EvaluationContext,
        servicio: f64,
        comida: f64,
    ) -> FuzzyResult<TipOutcome> {
        self.system
            .evaluate_with(ctx, &[(SERVICE, servicio), (FOOD, comida)])
            .map(|eval| TipOutcome::from(eval.clone()))
    }

    pub fn system(&self) -> &InferenceSystem {
        &self.system
    }

    pub fn service(&self) -> FuzzyResult<&LinguisticVariable> {
        self.system.antecedent(SERVICE)
    }

    pub fn food(&self) -> FuzzyResult<&LinguisticVariable> {
        self.system.antecedent(FOOD)
    }

    pub fn tip(&self) -> &LinguisticVariable {
        self.system.consequent()
    }
}

fn rules() -> Vec<Rule> {
    vec![
        Rule::new(
            "R1",
            Expr::term(SERVICE, "mala").or(Expr::term(FOOD, "mala")),
            SetRef::new(TIP, "baja"),
        ),
        Rule::new("R2", Expr::term(SERVICE, "aceptable"), SetRef::new(TIP, "media")),
        Rule::new(
            "R3",
            Expr::term(SERVICE, "excelente").or(Expr::term(FOOD, "excelente")),
            SetRef::new(TIP, "alta"),
        ),
    ]
}
