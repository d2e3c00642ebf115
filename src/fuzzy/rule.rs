//! Fuzzy rules: antecedent expressions and consequent set references

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{FuzzyError, FuzzyResult};

use super::membership::FuzzyValue;

/// Reference to a fuzzy set on a named variable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SetRef {
    pub variable: String,
    pub set: String,
}

impl SetRef {
    pub fn new(variable: impl Into<String>, set: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            set: set.into(),
        }
    }
}

impl fmt::Display for SetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.variable, self.set)
    }
}

/// Antecedent expression tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Expr {
    /// Membership of the variable's crisp input in a set
    Term(SetRef),
    /// Fuzzy OR (max)
    Or(Box<Expr>, Box<Expr>),
    /// Fuzzy AND (min)
    And(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn term(variable: impl Into<String>, set: impl Into<String>) -> Self {
        Expr::Term(SetRef::new(variable, set))
    }

    pub fn or(self, other: Expr) -> Self {
        Expr::Or(Box::new(self), Box::new(other))
    }

    pub fn and(self, other: Expr) -> Self {
        Expr::And(Box::new(self), Box::new(other))
    }

    /// Firing degree given the fuzzified inputs (variable -> set -> degree)
    pub fn degree(
        &self,
        fuzzified: &IndexMap<String, IndexMap<String, FuzzyValue>>,
    ) -> FuzzyResult<FuzzyValue> {
        match self {
            Expr::Term(r) => {
                let sets = fuzzified
                    .get(&r.variable)
                    .ok_or_else(|| FuzzyError::unknown_variable(&r.variable))?;
                sets.get(&r.set)
                    .copied()
                    .ok_or_else(|| FuzzyError::unknown_set(&r.variable, &r.set))
            }
            Expr::Or(lhs, rhs) => Ok(lhs.degree(fuzzified)?.or(&rhs.degree(fuzzified)?)),
            Expr::And(lhs, rhs) => Ok(lhs.degree(fuzzified)?.and(&rhs.degree(fuzzified)?)),
        }
    }

    /// All set references in the expression, left to right
    pub fn references(&self) -> Vec<&SetRef> {
        let mut refs = Vec::new();
        self.collect_refs(&mut refs);
        refs
    }

    fn collect_refs<'a>(&'a self, out: &mut Vec<&'a SetRef>) {
        match self {
            Expr::Term(r) => out.push(r),
            Expr::Or(lhs, rhs) | Expr::And(lhs, rhs) => {
                lhs.collect_refs(out);
                rhs.collect_refs(out);
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Term(r) => write!(f, "{}", r),
            Expr::Or(lhs, rhs) => write!(f, "({} OR {})", lhs, rhs),
            Expr::And(lhs, rhs) => write!(f, "({} AND {})", lhs, rhs),
        }
    }
}

/// A fuzzy rule: IF antecedent THEN consequent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    /// Rule name/label
    pub label: String,
    pub antecedent: Expr,
    pub consequent: SetRef,
}

impl Rule {
    pub fn new(label: impl Into<String>, antecedent: Expr, consequent: SetRef) -> Self {
        Self {
            label: label.into(),
            antecedent,
            consequent,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: IF {} THEN {}", self.label, self.antecedent, self.consequent)
    }
}
