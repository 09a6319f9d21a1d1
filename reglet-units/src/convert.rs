//! Unit/pixel conversion formulas.

use reglet_core::{ConversionError, Unit};
use serde::{Deserialize, Serialize};

/// Pixels in one em (and one rem), independent of resolution.
pub const EM_PIXELS: f64 = 16.0;

const MM_PER_INCH: f64 = 25.4;
const CM_PER_INCH: f64 = 2.54;
const POINTS_PER_INCH: f64 = 72.0;
const PICAS_PER_INCH: f64 = 6.0;

/// Converts between length units and pixels at a fixed resolution.
///
/// Holds nothing but the PPI, so it is cheap to construct per call,
/// reusable across calls at the same resolution, and safe to share
/// between threads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitConverter {
    ppi: f64,
}

impl UnitConverter {
    pub fn new(ppi: f64) -> Self {
        UnitConverter { ppi }
    }

    pub fn ppi(&self) -> f64 {
        self.ppi
    }

    pub fn from_inch(&self, value: f64) -> f64 {
        value * self.ppi
    }

    pub fn from_centimeter(&self, value: f64) -> f64 {
        value * self.ppi / CM_PER_INCH
    }

    pub fn from_millimeter(&self, value: f64) -> f64 {
        value * self.ppi / MM_PER_INCH
    }

    pub fn from_point(&self, value: f64) -> f64 {
        value * self.ppi / POINTS_PER_INCH
    }

    pub fn from_pica(&self, value: f64) -> f64 {
        value * self.ppi / PICAS_PER_INCH
    }

    pub fn from_em(&self, value: f64) -> f64 {
        value * EM_PIXELS
    }

    pub fn from_rem(&self, value: f64) -> f64 {
        value * EM_PIXELS
    }

    pub fn from_pixel(&self, value: f64) -> f64 {
        value
    }

    /// Pixels in one unit of `unit`.
    fn pixels_per(&self, unit: Unit) -> f64 {
        match unit {
            Unit::In => self.ppi,
            Unit::Cm => self.ppi / CM_PER_INCH,
            Unit::Mm => self.ppi / MM_PER_INCH,
            Unit::Pt => self.ppi / POINTS_PER_INCH,
            Unit::Pc => self.ppi / PICAS_PER_INCH,
            Unit::Em | Unit::Rem => EM_PIXELS,
            Unit::Px => 1.0,
        }
    }

    /// Forward conversion. A missing unit means the magnitude is
    /// already in pixels.
    pub fn to_pixels(&self, magnitude: f64, unit: Option<Unit>) -> f64 {
        match unit {
            Some(unit) => magnitude * self.pixels_per(unit),
            None => magnitude,
        }
    }

    /// Reverse conversion over the full unit set.
    ///
    /// Internal counterpart of [`from_pixels`](Self::from_pixels): the
    /// parser needs every unit reversible to align `+`/`-` operands,
    /// while the public reverse surface stays restricted.
    pub fn pixels_to(&self, pixels: f64, unit: Unit) -> f64 {
        pixels / self.pixels_per(unit)
    }

    /// Re-express `magnitude` of `from` in `to`, through pixels.
    pub fn convert(&self, magnitude: f64, from: Unit, to: Unit) -> f64 {
        self.pixels_to(self.to_pixels(magnitude, Some(from)), to)
    }

    /// Render a pixel count in `unit` with two decimals, e.g. `"10.00mm"`.
    ///
    /// Only mm, in, pc and px support the reverse direction; any other
    /// token fails with an unknown-unit error rather than guessing.
    pub fn from_pixels(&self, pixels: f64, unit: &str) -> Result<String, ConversionError> {
        let target = match unit.to_ascii_lowercase().as_str() {
            "mm" => Unit::Mm,
            "in" => Unit::In,
            "pc" => Unit::Pc,
            "px" => Unit::Px,
            _ => {
                return Err(ConversionError::UnknownUnit {
                    unit: unit.to_string(),
                })
            }
        };
        Ok(format!("{:.2}{}", self.pixels_to(pixels, target), target))
    }
}
