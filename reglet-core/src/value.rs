//! Unit-tagged evaluation results and their source spans.

use crate::Unit;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte range into the original expression text.
///
/// Carried for diagnostics and tracing only; it never influences
/// evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Smallest span containing both operands.
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// The result of evaluating an expression or any of its sub-expressions.
///
/// `unit` of `None` means the magnitude is unit-less; it adopts a
/// sibling's unit when combined with `+`, `-` or `/`. After any
/// successful operation the unit is well-defined, never ambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Value {
    pub magnitude: f64,
    pub unit: Option<Unit>,
    pub span: Span,
}

impl Value {
    pub fn new(magnitude: f64, unit: Option<Unit>, span: Span) -> Self {
        Value {
            magnitude,
            unit,
            span,
        }
    }

    /// A unit-less value, ready to adopt a sibling's unit.
    pub fn dimensionless(magnitude: f64, span: Span) -> Self {
        Value::new(magnitude, None, span)
    }

    /// The unit token, empty for unit-less values.
    pub fn unit_symbol(&self) -> &'static str {
        self.unit.map(|u| u.symbol()).unwrap_or("")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit_symbol())
    }
}
