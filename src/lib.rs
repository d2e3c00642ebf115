//! fuzzy-tip - Mamdani fuzzy inference for tip suggestions
//!
//! Suggests a tip percentage (0-25%) from two quality ratings on a 0-10 scale.
//!
//! # Architecture
//!
//! - [`fuzzy`] - Generic Mamdani machinery: membership functions, universes,
//!   linguistic variables, rules, the inference engine and defuzzification
//! - [`tipping`] - The fixed tipping system built on top of it
//! - [`report`] - Diagnostic data series (cases, membership curves, control
//!   surface, sensitivity) written as JSON
//! - [`config`] - TOML configuration with environment overrides
//! - [`error`] - Structured error type with numeric codes
//!
//! # Example
//!
//! ```rust
//! use fuzzy_tip::TipSystem;
//!
//! let system = TipSystem::standard().unwrap();
//! let outcome = system.evaluate(6.5, 9.5).unwrap();
//! assert!((outcome.tip - 14.76).abs() < 0.05);
//! ```

pub mod config;
pub mod error;
pub mod fuzzy;
pub mod report;
pub mod tipping;

// Re-export the inference building blocks
pub use fuzzy::{
    Defuzzifier, EngineSettings, Evaluation, EvaluationContext, Expr, FuzzySet, FuzzyValue,
    InferenceSystem, InputPolicy, LinguisticVariable, Role, Rule, SetRef, SetSpec, Triangular,
    Universe, ZeroAreaPolicy,
};

// Re-export the tipping system
pub use tipping::{TipOutcome, TipSystem};

// Re-export reporting types
pub use report::{CaseResult, Reporter, ReportError};

// Re-export configuration types
pub use config::{
    AnalysisConfig, CaseConfig, ConfigError, GeneralConfig, LogLevel, OutputFormat, TipConfig,
};

// Re-export error types
pub use error::{ErrorCode, ErrorContext, FuzzyError, FuzzyResult};
