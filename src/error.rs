//! Structured Error Handling for fuzzy-tip
//!
//! Provides a single error type for the inference core with:
//! - Error codes for programmatic handling
//! - Structured, JSON-friendly error values
//! - Context preservation (fields, source location)
//!
//! # Error Categories
//!
//! - `Definition` - Malformed universes, breakpoints or duplicate set names
//! - `Reference` - A rule or caller names a variable/set that does not exist
//! - `Input` - Crisp inputs outside a variable's universe, or not finite
//! - `Defuzzification` - The aggregated output curve has no area
//!
//! Configuration loading and report output have their own error types in
//! [`crate::config`] and [`crate::report`].
//!
//! Every failure of the core is raised synchronously to the immediate caller.
//! Definition and reference errors indicate a configuration bug, input errors
//! indicate a bad caller value; none of them are transient.
//!
//! # Example
//!
//! ```rust,ignore
//! use fuzzy_tip::error::{FuzzyError, ErrorCode};
//!
//! fn check(x: f64) -> Result<(), FuzzyError> {
//!     if !x.is_finite() {
//!         return Err(FuzzyError::non_finite("calidad_servicio", x)
//!             .with_hint("Inputs must be real numbers"));
//!     }
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Serialize};

// ============================================================================
// Error Codes
// ============================================================================

/// Unique error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Definition errors (1xxx)
    /// Breakpoints are not non-decreasing or not finite
    InvalidBreakpoints = 1001,
    /// Set name declared twice on one variable
    DuplicateSet = 1002,
    /// Universe bounds or step are unusable
    InvalidUniverse = 1003,
    /// Variable declared twice in one system
    DuplicateVariable = 1004,
    /// Rule list is empty
    EmptyRuleBase = 1005,

    // Reference errors (2xxx)
    /// Set not defined on the variable
    UnknownSet = 2000,
    /// Variable not declared in the system
    UnknownVariable = 2001,
    /// Variable used in the wrong role (antecedent vs consequent)
    RoleMismatch = 2002,

    // Input errors (3xxx)
    /// Crisp input outside the universe bounds
    InputRange = 3000,
    /// Crisp input is NaN or infinite
    NonFiniteInput = 3001,
    /// A required input was not supplied
    MissingInput = 3002,

    // Defuzzification errors (4xxx)
    /// Aggregated curve has zero area
    DefuzzificationError = 4000,

    // Internal errors (9xxx)
    /// Internal error
    InternalError = 9000,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a short description of the error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::InvalidBreakpoints => "Invalid membership breakpoints",
            ErrorCode::DuplicateSet => "Duplicate fuzzy set",
            ErrorCode::InvalidUniverse => "Invalid universe",
            ErrorCode::DuplicateVariable => "Duplicate variable",
            ErrorCode::EmptyRuleBase => "Empty rule base",

            ErrorCode::UnknownSet => "Unknown fuzzy set",
            ErrorCode::UnknownVariable => "Unknown variable",
            ErrorCode::RoleMismatch => "Variable role mismatch",

            ErrorCode::InputRange => "Input out of range",
            ErrorCode::NonFiniteInput => "Input is not finite",
            ErrorCode::MissingInput => "Missing input",

            ErrorCode::DefuzzificationError => "Defuzzification failed",

            ErrorCode::InternalError => "Internal error",
        }
    }

    /// True for errors caused by a value the caller passed at evaluation time
    pub fn is_input_error(&self) -> bool {
        (3000..4000).contains(&self.code())
    }

    /// True for errors that reveal a broken variable or rule configuration
    pub fn is_configuration_error(&self) -> bool {
        (1000..3000).contains(&self.code())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Error Context
// ============================================================================

/// Additional context information for an error
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Key-value pairs of context information
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, String>,
    /// Source location (file:line)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

// ============================================================================
// Main Error Type
// ============================================================================

/// The error type of the fuzzy inference core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyError {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
    /// Hint for resolving the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl FuzzyError {
    /// Create a new error with a code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
        }
    }

    // ========================================================================
    // Factory methods
    // ========================================================================

    /// Breakpoints `(a, b, c)` of `set` are not usable
    pub fn invalid_breakpoints(set: &str, a: f64, b: f64, c: f64) -> Self {
        Self::new(
            ErrorCode::InvalidBreakpoints,
            format!(
                "Fuzzy set '{}' has breakpoints ({}, {}, {}); expected finite a <= b <= c",
                set, a, b, c
            ),
        )
        .with_context("set", set)
    }

    /// `set` is declared twice on `variable`
    pub fn duplicate_set(variable: &str, set: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateSet,
            format!("Fuzzy set '{}' is defined more than once on '{}'", set, variable),
        )
        .with_context("variable", variable)
        .with_context("set", set)
    }

    /// Universe bounds or step are unusable
    pub fn invalid_universe(start: f64, end: f64, step: f64) -> Self {
        Self::new(
            ErrorCode::InvalidUniverse,
            format!(
                "Universe [{}, {}] with step {} is not a finite increasing range",
                start, end, step
            ),
        )
    }

    /// `variable` is declared twice in one system
    pub fn duplicate_variable(variable: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateVariable,
            format!("Variable '{}' is declared more than once", variable),
        )
        .with_context("variable", variable)
    }

    /// `set` is not defined on `variable`
    pub fn unknown_set(variable: &str, set: &str) -> Self {
        Self::new(
            ErrorCode::UnknownSet,
            format!("Fuzzy set '{}' is not defined on variable '{}'", set, variable),
        )
        .with_context("variable", variable)
        .with_context("set", set)
    }

    /// `variable` is not declared
    pub fn unknown_variable(variable: &str) -> Self {
        Self::new(
            ErrorCode::UnknownVariable,
            format!("Variable '{}' is not declared", variable),
        )
        .with_context("variable", variable)
    }

    /// Crisp input outside `[lo, hi]`
    pub fn input_range(variable: &str, value: f64, lo: f64, hi: f64) -> Self {
        Self::new(
            ErrorCode::InputRange,
            format!(
                "Input {} for '{}' is outside the universe [{}, {}]",
                value, variable, lo, hi
            ),
        )
        .with_context("variable", variable)
        .with_context("value", value.to_string())
    }

    /// Crisp input is NaN or infinite
    pub fn non_finite(variable: &str, value: f64) -> Self {
        Self::new(
            ErrorCode::NonFiniteInput,
            format!("Input for '{}' is not a finite number: {}", variable, value),
        )
        .with_context("variable", variable)
    }

    /// No crisp input supplied for `variable`
    pub fn missing_input(variable: &str) -> Self {
        Self::new(
            ErrorCode::MissingInput,
            format!("No input supplied for '{}'", variable),
        )
        .with_context("variable", variable)
    }

    /// Aggregated output curve of `variable` has zero area
    pub fn defuzzification(variable: &str) -> Self {
        Self::new(
            ErrorCode::DefuzzificationError,
            format!(
                "Aggregated output for '{}' is zero everywhere; no rule fired",
                variable
            ),
        )
        .with_context("variable", variable)
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Add context to the error
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.fields.insert(key.into(), value.into());
        self
    }

    /// Add source location
    pub fn at(mut self, location: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.location = Some(location.into());
        self
    }

    /// Add a hint for resolving the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Look up a context field
    pub fn field(&self, key: &str) -> Option<&str> {
        self.context
            .as_ref()
            .and_then(|ctx| ctx.fields.get(key))
            .map(String::as_str)
    }

    pub fn is_input_error(&self) -> bool {
        self.code.is_input_error()
    }

    pub fn is_configuration_error(&self) -> bool {
        self.code.is_configuration_error()
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":"INTERNAL_ERROR","message":"{}"}}"#, self.message)
        })
    }
}

impl fmt::Display for FuzzyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;

        if let Some(loc) = self.context.as_ref().and_then(|ctx| ctx.location.as_ref()) {
            write!(f, " at {}", loc)?;
        }

        if let Some(ref hint) = self.hint {
            write!(f, "\nHint: {}", hint)?;
        }

        Ok(())
    }
}

impl std::error::Error for FuzzyError {}

/// A Result type using FuzzyError
pub type FuzzyResult<T> = Result<T, FuzzyError>;

// ============================================================================
// Macros
// ============================================================================

/// Create a FuzzyError tagged with the current source location
#[macro_export]
macro_rules! fuzzy_error {
    ($err:expr) => {
        $err.at(format!("{}:{}", file!(), line!()))
    };
}

/// Bail out early with an error
#[macro_export]
macro_rules! fuzzy_bail {
    ($err:expr) => {
        return Err($crate::fuzzy_error!($err))
    };
}

/// Ensure a condition holds, or return an error
#[macro_export]
macro_rules! fuzzy_ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            $crate::fuzzy_bail!($err);
        }
    };
}

// ============================================================================
// Tests
// ============================================================================
