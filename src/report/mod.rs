//! Diagnostic reporting for the tipping system
//!
//! Produces the data series behind the usual fuzzy-controller diagnostics and
//! writes them as JSON documents:
//!
//! | file                          | content                                    |
//! |-------------------------------|--------------------------------------------|
//! | `funciones_pertenencia.json`  | membership curves of every set             |
//! | `resultado_ejemplo.json`      | one inference with clipped/aggregated sets |
//! | `superficie_control.json`     | tip over a servicio × comida grid          |
//! | `analisis_sensibilidad.json`  | tip along one input with the other fixed   |
//! | `casos.json`                  | the evaluated cases                        |
//!
//! The reporter only uses the public API of [`TipSystem`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{AnalysisConfig, CaseConfig};
use crate::error::FuzzyError;
use crate::fuzzy::{EvaluationContext, LinguisticVariable, Role, Universe};
use crate::tipping::{TipOutcome, TipSystem};

pub const MEMBERSHIP_FILE: &str = "funciones_pertenencia.json";
pub const SNAPSHOT_FILE: &str = "resultado_ejemplo.json";
pub const SURFACE_FILE: &str = "superficie_control.json";
pub const SENSITIVITY_FILE: &str = "analisis_sensibilidad.json";
pub const CASES_FILE: &str = "casos.json";

/// Rating scale swept by the surface and sensitivity analyses
const RATING_RANGE: (f64, f64) = (0.0, 10.0);

/// Finest grid step accepted by the surface and sensitivity analyses
/// (1001 points per axis).
pub const MIN_GRID_STEP: f64 = 0.01;

/// Report error type
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Inference failed: {0}")]
    Inference(#[from] FuzzyError),

    #[error("Cannot create output directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Cannot write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Cannot serialize {name}: {source}")]
    Serialize {
        name: &'static str,
        source: serde_json::Error,
    },
}

pub type ReportResult<T> = Result<T, ReportError>;

/// One evaluated case
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseResult {
    pub descripcion: String,
    pub servicio: f64,
    pub comida: f64,
    /// Suggested tip in percent
    pub propina: f64,
    /// Inputs clamped into the rating scale
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub clamped: Vec<String>,
}

/// Membership curves of one variable, keyed by set name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableCurves {
    pub variable: String,
    pub role: Role,
    pub sets: IndexMap<String, Vec<(f64, f64)>>,
}

/// A single inference laid out for inspection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceSnapshot {
    pub servicio: f64,
    pub comida: f64,
    pub propina: f64,
    /// Firing level of every output set
    pub activations: IndexMap<String, f64>,
    /// Each output set clipped at its firing level
    pub clipped: IndexMap<String, Vec<(f64, f64)>>,
    /// Union of the clipped sets
    pub aggregated: Vec<(f64, f64)>,
}

/// Tip over a grid of both inputs. `propina[i][j]` is the tip for
/// `servicio[i]` and `comida[j]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlSurface {
    pub servicio: Vec<f64>,
    pub comida: Vec<f64>,
    pub propina: Vec<Vec<f64>>,
}

/// One sweep of an input with the other held fixed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sweep {
    /// Name of the swept input
    pub variable: String,
    /// Value the other input is held at
    pub fixed: f64,
    pub inputs: Vec<f64>,
    pub propina: Vec<f64>,
}

/// Sensitivity of the tip to each input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sensitivity {
    pub servicio: Sweep,
    pub comida: Sweep,
}

/// Builds the report series for a [`TipSystem`]
#[derive(Debug, Clone)]
pub struct Reporter<'a> {
    system: &'a TipSystem,
    analysis: AnalysisConfig,
    cases: Vec<CaseConfig>,
}

impl<'a> Reporter<'a> {
    /// Reporter with the default analysis parameters and reference cases
    pub fn new(system: &'a TipSystem) -> Self {
        Self {
            system,
            analysis: AnalysisConfig::default(),
            cases: CaseConfig::reference_cases(),
        }
    }

    pub fn with_analysis(mut self, analysis: AnalysisConfig) -> Self {
        self.analysis = analysis;
        self
    }

    pub fn with_cases(mut self, cases: Vec<CaseConfig>) -> Self {
        self.cases = cases;
        self
    }

    pub fn cases(&self) -> &[CaseConfig] {
        &self.cases
    }

    /// Evaluate a list of cases in order
    pub fn evaluate_cases(&self, cases: &[CaseConfig]) -> ReportResult<Vec<CaseResult>> {
        let mut ctx = EvaluationContext::new();
        cases
            .iter()
            .map(|case| -> ReportResult<CaseResult> {
                let outcome = self.system.evaluate_with(&mut ctx, case.servicio, case.comida)?;
                Ok(CaseResult {
                    descripcion: case.descripcion.clone(),
                    servicio: case.servicio,
                    comida: case.comida,
                    propina: outcome.tip,
                    clamped: outcome.clamped,
                })
            })
            .collect()
    }

    /// Membership curves of every set of the three variables
    pub fn membership_functions(&self) -> ReportResult<Vec<VariableCurves>> {
        let variables = [self.system.service()?, self.system.food()?, self.system.tip()];
        variables.into_iter().map(variable_curves).collect()
    }

    /// One inference with the clipped output sets and their union
    pub fn inference_snapshot(&self, servicio: f64, comida: f64) -> ReportResult<InferenceSnapshot> {
        let TipOutcome {
            tip,
            output_curve,
            activations,
            ..
        } = self.system.evaluate(servicio, comida)?;

        let mut clipped = IndexMap::new();
        for set in self.system.tip().sets() {
            let alpha = activations.get(&set.name).copied().unwrap_or(0.0);
            let curve: Vec<(f64, f64)> = output_curve
                .iter()
                .map(|&(x, _)| (x, set.membership_of(x).value().min(alpha)))
                .collect();
            clipped.insert(set.name.clone(), curve);
        }

        Ok(InferenceSnapshot {
            servicio,
            comida,
            propina: tip,
            activations,
            clipped,
            aggregated: output_curve,
        })
    }

    /// Tip over the `[0, 10]` × `[0, 10]` grid, both ends included
    pub fn control_surface(&self, step: f64) -> ReportResult<ControlSurface> {
        let axis = rating_grid(step)?;
        let mut ctx = EvaluationContext::new();
        let mut propina = Vec::with_capacity(axis.len());
        for &servicio in &axis {
            let row = axis
                .iter()
                .map(|&comida| -> ReportResult<f64> {
                    Ok(self.system.evaluate_with(&mut ctx, servicio, comida)?.tip)
                })
                .collect::<ReportResult<Vec<f64>>>()?;
            propina.push(row);
        }
        debug!(points = axis.len() * axis.len(), step, "control surface computed");

        Ok(ControlSurface {
            servicio: axis.clone(),
            comida: axis,
            propina,
        })
    }

    /// Sweep each input over `[0, 10]` with the other held fixed
    pub fn sensitivity(
        &self,
        fixed_servicio: f64,
        fixed_comida: f64,
        step: f64,
    ) -> ReportResult<Sensitivity> {
        let axis = rating_grid(step)?;
        let mut ctx = EvaluationContext::new();

        let mut along_service = Vec::with_capacity(axis.len());
        let mut along_food = Vec::with_capacity(axis.len());
        for &x in &axis {
            along_service.push(self.system.evaluate_with(&mut ctx, x, fixed_comida)?.tip);
            along_food.push(self.system.evaluate_with(&mut ctx, fixed_servicio, x)?.tip);
        }

        Ok(Sensitivity {
            servicio: Sweep {
                variable: crate::tipping::SERVICE.to_string(),
                fixed: fixed_comida,
                inputs: axis.clone(),
                propina: along_service,
            },
            comida: Sweep {
                variable: crate::tipping::FOOD.to_string(),
                fixed: fixed_servicio,
                inputs: axis,
                propina: along_food,
            },
        })
    }

    /// Compute every series with the configured parameters and write them to
    /// `dir`, creating it if missing. Returns the written paths.
    pub fn write_all(&self, dir: &Path) -> ReportResult<Vec<PathBuf>> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|source| ReportError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
            info!(dir = %dir.display(), "created output directory");
        }

        let analysis = &self.analysis;
        let mut written = Vec::with_capacity(5);
        written.push(write_json(dir, MEMBERSHIP_FILE, &self.membership_functions()?)?);
        written.push(write_json(
            dir,
            SNAPSHOT_FILE,
            &self.inference_snapshot(analysis.snapshot_servicio, analysis.snapshot_comida)?,
        )?);
        written.push(write_json(
            dir,
            SURFACE_FILE,
            &self.control_surface(analysis.surface_step)?,
        )?);
        written.push(write_json(
            dir,
            SENSITIVITY_FILE,
            &self.sensitivity(
                analysis.fixed_servicio,
                analysis.fixed_comida,
                analysis.sensitivity_step,
            )?,
        )?);
        written.push(write_json(dir, CASES_FILE, &self.evaluate_cases(&self.cases)?)?);

        Ok(written)
    }
}

/// Console rendering of evaluated cases
pub fn render_cases(results: &[CaseResult]) -> String {
    let mut out = String::new();
    for (i, case) in results.iter().enumerate() {
        out.push_str(&format!("Caso {}: {}\n", i + 1, case.descripcion));
        out.push_str(&format!("  Servicio: {}/10\n", case.servicio));
        out.push_str(&format!("  Comida: {}/10\n", case.comida));
        out.push_str(&format!("  → Propina sugerida: {:.2}%\n", case.propina));
        if !case.clamped.is_empty() {
            out.push_str(&format!("  (ajustado a 0..10: {})\n", case.clamped.join(", ")));
        }
        out.push('\n');
    }
    out
}

fn variable_curves(var: &LinguisticVariable) -> ReportResult<VariableCurves> {
    let mut sets = IndexMap::new();
    for name in var.set_names() {
        sets.insert(name.to_string(), var.curve(name)?);
    }
    Ok(VariableCurves {
        variable: var.name().to_string(),
        role: var.role(),
        sets,
    })
}

/// Evenly spaced ratings over `[0, 10]`, both ends included. Points past 10
/// would only repeat the clamped value at 10, so the grid stops there.
fn rating_grid(step: f64) -> ReportResult<Vec<f64>> {
    let (lo, hi) = RATING_RANGE;
    if step < MIN_GRID_STEP {
        return Err(FuzzyError::invalid_universe(lo, hi, step)
            .with_hint(format!("Grid step must be at least {}", MIN_GRID_STEP))
            .into());
    }
    Ok(Universe::new(lo, hi, step)?.points().collect())
}

fn write_json<T: Serialize>(dir: &Path, name: &'static str, value: &T) -> ReportResult<PathBuf> {
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(value)
        .map_err(|source| ReportError::Serialize { name, source })?;
    fs::write(&path, json).map_err(|source| ReportError::Write {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), "report file written");
    Ok(path)
}
