//! Structured errors for expression evaluation and pixel conversion.
//!
//! Every failure is returned immediately to the caller; there is no
//! retry, no partial result, and no recovery inside the engine. Each
//! message carries the offending token or byte offset so the problem
//! can be diagnosed without re-running under trace.

use crate::Unit;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error from a standalone pixel conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ConversionError {
    /// The requested unit is outside the supported set.
    #[error("unknown unit: {unit:?}")]
    UnknownUnit { unit: String },
}

/// Error from evaluating an expression.
///
/// Syntax variants describe malformed input; the remaining variants are
/// semantic rule violations found on well-formed input.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum EvalError {
    #[error("empty expression")]
    EmptyInput,

    #[error("unexpected character {ch:?} at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEnd { offset: usize },

    #[error("missing closing parenthesis for group opened at offset {offset}")]
    UnclosedParen { offset: usize },

    #[error("empty parentheses at offset {offset}")]
    EmptyParens { offset: usize },

    #[error("trailing input {rest:?} at offset {offset}")]
    TrailingInput { offset: usize, rest: String },

    #[error("invalid number {text:?} at offset {offset}")]
    InvalidNumber { text: String, offset: usize },

    #[error("double negative is not allowed at offset {offset}")]
    DoubleNegative { offset: usize },

    #[error("invalid unit {token:?} at offset {offset}")]
    InvalidUnit { token: String, offset: usize },

    #[error("mismatched units: cannot apply '{op}' to {left} and {right}")]
    MismatchedUnits { op: char, left: Unit, right: Unit },

    #[error("cannot multiply {left} by {right}: at most one operand may carry a unit")]
    MultiplyWithUnits { left: Unit, right: Unit },

    #[error("division by zero at offset {offset}")]
    DivisionByZero { offset: usize },

    #[error("conflicting unit suffix {suffix} on a group that already evaluated to {group}")]
    ConflictingSuffix { group: Unit, suffix: Unit },

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}
