//! The closed set of length units the engine understands.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A physical or typographic length unit.
///
/// The set is closed: any other token is rejected during parsing rather
/// than passed through. A unit-less magnitude is represented as
/// `Option<Unit>::None` and adopts a sibling's unit during arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Millimeter
    Mm,
    /// Centimeter
    Cm,
    /// Inch
    In,
    /// Pica (1/6 inch)
    Pc,
    /// Point (1/72 inch)
    Pt,
    /// Pixel
    Px,
    /// Em, fixed at 16 pixels regardless of resolution
    Em,
    /// Root em, fixed at 16 pixels regardless of resolution
    Rem,
}

impl Unit {
    /// Every unit the engine accepts, for diagnostics.
    pub const ALL: [Unit; 8] = [
        Unit::Mm,
        Unit::Cm,
        Unit::In,
        Unit::Pc,
        Unit::Pt,
        Unit::Px,
        Unit::Em,
        Unit::Rem,
    ];

    /// Parse a unit token. The token is lowercased first, so `IN`, `In`
    /// and `in` all resolve to the same unit.
    pub fn parse(token: &str) -> Option<Unit> {
        match token.to_ascii_lowercase().as_str() {
            "mm" => Some(Unit::Mm),
            "cm" => Some(Unit::Cm),
            "in" => Some(Unit::In),
            "pc" => Some(Unit::Pc),
            "pt" => Some(Unit::Pt),
            "px" => Some(Unit::Px),
            "em" => Some(Unit::Em),
            "rem" => Some(Unit::Rem),
            _ => None,
        }
    }

    /// The canonical lowercase token.
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Mm => "mm",
            Unit::Cm => "cm",
            Unit::In => "in",
            Unit::Pc => "pc",
            Unit::Pt => "pt",
            Unit::Px => "px",
            Unit::Em => "em",
            Unit::Rem => "rem",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
