//! Reglet - length-expression evaluation for pixel-based layout
//!
//! Evaluates arithmetic over physical and typographic length units
//! ("1in + 5mm") down to a single pixel value at a caller-supplied
//! resolution, so a layout description can speak in human units while
//! the renderer works exclusively in pixels.
//!
//! ```
//! use reglet::Reglet;
//!
//! let engine = Reglet::new(96.0);
//! let pixels = engine.to_pixels("10px / (2 + 3)").unwrap();
//! assert_eq!(pixels, 2.0);
//! ```

mod parser;

pub use parser::ExpressionParser;
pub use reglet_core::{ConversionError, EvalError, Span, Unit, Value};
pub use reglet_units::{UnitConverter, EM_PIXELS};

/// Resolution assumed by CLI-facing wrappers when none is given.
/// The core itself never defaults: [`Reglet::new`] takes an explicit PPI.
pub const DEFAULT_PPI: f64 = 96.0;

/// Main engine: owns a resolution and a trace flag.
///
/// Evaluations share nothing but this configuration; each call builds
/// its own parser state, so concurrent use needs no coordination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reglet {
    ppi: f64,
    trace: bool,
}

impl Reglet {
    pub fn new(ppi: f64) -> Self {
        Reglet { ppi, trace: false }
    }

    /// Enable step-by-step parser diagnostics. Observational only;
    /// results are identical either way.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn ppi(&self) -> f64 {
        self.ppi
    }

    /// Evaluate an expression to a unit-tagged value.
    pub fn evaluate(&self, expression: &str) -> Result<Value, EvalError> {
        ExpressionParser::new(expression, self.ppi)
            .with_trace(self.trace)
            .parse()
    }

    /// Evaluate an expression and reduce it to pixels, discarding the
    /// unit tag.
    pub fn to_pixels(&self, expression: &str) -> Result<f64, EvalError> {
        let value = self.evaluate(expression)?;
        Ok(UnitConverter::new(self.ppi).to_pixels(value.magnitude, value.unit))
    }

    /// Render a pixel count in `unit` (mm, in, pc or px), e.g. `"10.00mm"`.
    pub fn from_pixels(&self, pixels: f64, unit: &str) -> Result<String, ConversionError> {
        UnitConverter::new(self.ppi).from_pixels(pixels, unit)
    }
}

/// Evaluate `expression` at `ppi`, stateless form of [`Reglet::evaluate`].
pub fn evaluate(expression: &str, ppi: f64, trace: bool) -> Result<Value, EvalError> {
    Reglet::new(ppi).with_trace(trace).evaluate(expression)
}

/// Stateless form of [`Reglet::to_pixels`].
pub fn to_pixels(expression: &str, ppi: f64) -> Result<f64, EvalError> {
    Reglet::new(ppi).to_pixels(expression)
}

/// Stateless form of [`Reglet::from_pixels`].
pub fn from_pixels(pixels: f64, unit: &str, ppi: f64) -> Result<String, ConversionError> {
    Reglet::new(ppi).from_pixels(pixels, unit)
}
