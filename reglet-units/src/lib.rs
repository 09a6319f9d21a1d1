//! Reglet Units - pixel conversion at a fixed resolution
//!
//! Pure conversion functions between the closed length-unit set and
//! pixels, parameterized by PPI. Used by the expression parser for
//! cross-unit arithmetic and standalone by callers that only need
//! `unit -> pixels` or `pixels -> unit` without expression syntax.

mod convert;

pub use convert::{UnitConverter, EM_PIXELS};
