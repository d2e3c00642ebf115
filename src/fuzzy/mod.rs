//! Fuzzy Logic Module
//!
//! Building blocks of a Mamdani fuzzy inference system:
//! - Fuzzy truth values and triangular membership functions
//! - Discretized universes of discourse
//! - Linguistic variables (antecedents and consequents)
//! - Rules with OR/AND antecedent expressions
//! - The inference engine (fuzzification, implication, aggregation)
//! - Defuzzification methods

pub mod defuzz;
pub mod engine;
pub mod membership;
pub mod rule;
pub mod universe;
pub mod variable;

pub use defuzz::{Defuzzifier, ZeroAreaPolicy};
pub use engine::{EngineSettings, Evaluation, EvaluationContext, InferenceSystem, InputPolicy};
pub use membership::{FuzzyValue, Triangular};
pub use rule::{Expr, Rule, SetRef};
pub use universe::Universe;
pub use variable::{FuzzySet, LinguisticVariable, Role, SetSpec};
