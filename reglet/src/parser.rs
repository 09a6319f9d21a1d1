//! Recursive-descent evaluator for length expressions.
//!
//! Parse and evaluate are fused: every grammar rule returns a [`Value`]
//! directly, there is no intermediate AST. The grammar, highest to
//! lowest binding:
//!
//! ```text
//! expression := term (('+' | '-') term)*
//! term       := factor (('*' | '/') factor)*
//! factor     := number [unit] | '(' expression ')' [unit] | '-' factor
//! number     := digits ['.' digits] | '.' digits | digits '.'
//! unit       := letters, lowercased, one of mm cm in pc pt px em rem
//! ```
//!
//! Whitespace is skippable anywhere between tokens, including between a
//! number and its unit and between `)` and a trailing unit. Numbers may
//! carry an exponent (`1.5e10`); the `e` only starts an exponent when an
//! optionally signed digit follows, so `5em` still reads as `5` + `em`.
//!
//! The parser stops at the first rule violation. No backtracking, no
//! partial recovery.

use reglet_core::{EvalError, Span, Unit, Value};
use reglet_units::UnitConverter;
use tracing::debug;

/// Single-use parser state.
///
/// Built fresh for every evaluation and discarded on return; nothing
/// persists across calls. The recursion depth exists only to indent
/// trace output.
pub struct ExpressionParser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
    trace: bool,
    converter: UnitConverter,
}

impl<'a> ExpressionParser<'a> {
    pub fn new(input: &'a str, ppi: f64) -> Self {
        ExpressionParser {
            input,
            pos: 0,
            depth: 0,
            trace: false,
            converter: UnitConverter::new(ppi),
        }
    }

    /// Enable step-by-step diagnostics on the `reglet::parser` target.
    /// Observational only; results are identical either way.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Consume the whole input and produce a single value.
    pub fn parse(mut self) -> Result<Value, EvalError> {
        self.skip_whitespace();
        if self.at_end() {
            return Err(EvalError::EmptyInput);
        }
        let value = self.expression()?;
        self.skip_whitespace();
        if !self.at_end() {
            return Err(EvalError::TrailingInput {
                offset: self.pos,
                rest: self.input[self.pos..].to_string(),
            });
        }
        Ok(value)
    }

    fn expression(&mut self) -> Result<Value, EvalError> {
        self.trace_enter("expression");
        let mut left = self.term()?;
        loop {
            self.skip_whitespace();
            let op = match self.peek() {
                Some(c @ ('+' | '-')) => c,
                _ => break,
            };
            self.bump();
            let right = self.term()?;
            left = self.add_sub(op, left, right);
        }
        self.trace_leave("expression", &left);
        Ok(left)
    }

    fn term(&mut self) -> Result<Value, EvalError> {
        self.trace_enter("term");
        let mut left = self.factor()?;
        loop {
            self.skip_whitespace();
            let op = match self.peek() {
                Some(c @ ('*' | '/')) => c,
                _ => break,
            };
            self.bump();
            let right = self.factor()?;
            left = if op == '*' {
                self.multiply(left, right)?
            } else {
                self.divide(left, right)?
            };
        }
        self.trace_leave("term", &left);
        Ok(left)
    }

    fn factor(&mut self) -> Result<Value, EvalError> {
        self.trace_enter("factor");
        self.skip_whitespace();
        let start = self.pos;
        let value = match self.peek() {
            None => return Err(EvalError::UnexpectedEnd { offset: self.pos }),
            Some('-') => {
                self.bump();
                self.skip_whitespace();
                if self.peek() == Some('-') {
                    return Err(EvalError::DoubleNegative { offset: self.pos });
                }
                let inner = self.factor()?;
                Value::new(
                    -inner.magnitude,
                    inner.unit,
                    Span::new(start, inner.span.end),
                )
            }
            Some('(') => self.group(start)?,
            Some(c) if c.is_ascii_digit() || c == '.' => {
                let magnitude = self.number()?;
                let unit = self.unit_suffix()?;
                Value::new(magnitude, unit, Span::new(start, self.pos))
            }
            Some(c) => {
                return Err(EvalError::UnexpectedChar {
                    ch: c,
                    offset: self.pos,
                })
            }
        };
        self.trace_leave("factor", &value);
        Ok(value)
    }

    /// `'(' expression ')'` with an optional unit suffix after the `)`.
    /// The cursor sits on the opening parenthesis at `start`.
    fn group(&mut self, start: usize) -> Result<Value, EvalError> {
        self.bump();
        self.skip_whitespace();
        if self.peek() == Some(')') {
            return Err(EvalError::EmptyParens { offset: start });
        }
        let inner = self.expression()?;
        self.skip_whitespace();
        if self.peek() != Some(')') {
            return Err(EvalError::UnclosedParen { offset: start });
        }
        self.bump();

        let mut value = Value::new(inner.magnitude, inner.unit, Span::new(start, self.pos));
        if let Some(suffix) = self.unit_suffix()? {
            // a suffix may assign a unit to the group's result, or
            // restate the one it already has; it may not contradict it
            match value.unit {
                None => value.unit = Some(suffix),
                Some(unit) if unit == suffix => {}
                Some(unit) => {
                    return Err(EvalError::ConflictingSuffix {
                        group: unit,
                        suffix,
                    })
                }
            }
            value.span.end = self.pos;
        }
        Ok(value)
    }

    /// Scan a numeric literal. `.5` and `1.` are both legal; a second
    /// decimal point is an invalid number rather than a fresh token.
    fn number(&mut self) -> Result<f64, EvalError> {
        let start = self.pos;
        self.digits();
        if self.peek() == Some('.') {
            self.bump();
            self.digits();
        }
        if self.peek() == Some('.') {
            while matches!(self.peek(), Some(c) if c == '.' || c.is_ascii_digit()) {
                self.bump();
            }
            return Err(EvalError::InvalidNumber {
                text: self.input[start..self.pos].to_string(),
                offset: start,
            });
        }
        // exponent, only when the 'e' is followed by a signed digit;
        // otherwise the letters belong to a unit token like "em"
        if matches!(self.peek(), Some('e' | 'E')) {
            let mark = self.pos;
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            if matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.digits();
            } else {
                self.pos = mark;
            }
        }
        let text = &self.input[start..self.pos];
        text.parse::<f64>().map_err(|_| EvalError::InvalidNumber {
            text: text.to_string(),
            offset: start,
        })
    }

    fn digits(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
    }

    /// Read an optional unit token, validated against the closed set.
    /// Whitespace before the token is allowed; if no letters follow,
    /// the cursor is restored so the operator scan sees the input
    /// unchanged.
    fn unit_suffix(&mut self) -> Result<Option<Unit>, EvalError> {
        let mark = self.pos;
        self.skip_whitespace();
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphabetic()) {
            self.bump();
        }
        if self.pos == start {
            self.pos = mark;
            return Ok(None);
        }
        let token = &self.input[start..self.pos];
        match Unit::parse(token) {
            Some(unit) => {
                self.trace_token(token, start);
                Ok(Some(unit))
            }
            None => Err(EvalError::InvalidUnit {
                token: token.to_string(),
                offset: start,
            }),
        }
    }

    /// `+` / `-`. An empty unit adopts the other operand's; two
    /// different units align by converting the right operand into the
    /// left's unit. With the closed length-only unit set that
    /// conversion is total, so unit handling here cannot fail.
    fn add_sub(&self, op: char, left: Value, right: Value) -> Value {
        let (unit, rhs) = match (left.unit, right.unit) {
            (Some(l), Some(r)) if l != r => {
                (Some(l), self.converter.convert(right.magnitude, r, l))
            }
            (None, unit @ Some(_)) => (unit, right.magnitude),
            (unit, _) => (unit, right.magnitude),
        };
        let magnitude = if op == '+' {
            left.magnitude + rhs
        } else {
            left.magnitude - rhs
        };
        Value::new(magnitude, unit, left.span.cover(right.span))
    }

    /// `*`: at most one operand may carry a unit.
    fn multiply(&self, left: Value, right: Value) -> Result<Value, EvalError> {
        let unit = match (left.unit, right.unit) {
            (Some(l), Some(r)) => {
                return Err(EvalError::MultiplyWithUnits { left: l, right: r })
            }
            (unit, None) | (None, unit) => unit,
        };
        Ok(Value::new(
            left.magnitude * right.magnitude,
            unit,
            left.span.cover(right.span),
        ))
    }

    /// `/`: an empty unit adopts the other operand's; two different
    /// units are an error (no implicit conversion on divide), and a
    /// zero divisor is rejected before units are considered.
    fn divide(&self, left: Value, right: Value) -> Result<Value, EvalError> {
        if right.magnitude == 0.0 {
            return Err(EvalError::DivisionByZero {
                offset: right.span.start,
            });
        }
        let unit = match (left.unit, right.unit) {
            (Some(l), Some(r)) if l != r => {
                return Err(EvalError::MismatchedUnits {
                    op: '/',
                    left: l,
                    right: r,
                })
            }
            (None, unit) => unit,
            (unit, _) => unit,
        };
        Ok(Value::new(
            left.magnitude / right.magnitude,
            unit,
            left.span.cover(right.span),
        ))
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn trace_enter(&mut self, rule: &str) {
        if self.trace {
            debug!(
                target: "reglet::parser",
                "{}{} @ {}",
                "  ".repeat(self.depth),
                rule,
                self.pos
            );
        }
        self.depth += 1;
    }

    fn trace_leave(&mut self, rule: &str, value: &Value) {
        self.depth = self.depth.saturating_sub(1);
        if self.trace {
            debug!(
                target: "reglet::parser",
                "{}{} -> {} [{}..{}]",
                "  ".repeat(self.depth),
                rule,
                value,
                value.span.start,
                value.span.end
            );
        }
    }

    fn trace_token(&self, token: &str, offset: usize) {
        if self.trace {
            debug!(
                target: "reglet::parser",
                "{}unit {:?} @ {}",
                "  ".repeat(self.depth),
                token,
                offset
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PPI: f64 = 96.0;

    fn eval(input: &str) -> Value {
        ExpressionParser::new(input, PPI)
            .parse()
            .unwrap_or_else(|e| panic!("{input:?}: {e}"))
    }

    fn pixels(input: &str) -> f64 {
        let value = eval(input);
        UnitConverter::new(PPI).to_pixels(value.magnitude, value.unit)
    }

    fn eval_err(input: &str) -> EvalError {
        match ExpressionParser::new(input, PPI).parse() {
            Ok(value) => panic!("{input:?} should fail, got {value}"),
            Err(e) => e,
        }
    }

    fn assert_close(got: f64, want: f64) {
        assert!((got - want).abs() < 1e-6, "got {got}, want {want}");
    }

    #[test]
    fn single_values() {
        let uc = UnitConverter::new(PPI);
        assert_close(pixels("10in"), uc.from_inch(10.0));
        assert_close(pixels("2.54cm"), uc.from_centimeter(2.54));
        assert_close(pixels("100px"), 100.0);
        assert_close(pixels("10"), 10.0);
        assert_close(pixels("0in"), 0.0);
        assert_close(pixels("-5mm"), -uc.from_millimeter(5.0));
    }

    #[test]
    fn arithmetic_over_mixed_units() {
        let uc = UnitConverter::new(PPI);
        assert_close(
            pixels("1in + 2.54cm"),
            uc.from_inch(1.0) + uc.from_centimeter(2.54),
        );
        assert_close(pixels("3mm * 4"), uc.from_millimeter(3.0) * 4.0);
        assert_close(pixels("10pt / 2"), uc.from_point(10.0) / 2.0);
        assert_close(pixels("5em - 2rem"), uc.from_em(5.0) - uc.from_rem(2.0));
        assert_close(
            pixels("1pc + 2pt + 3px"),
            uc.from_pica(1.0) + uc.from_point(2.0) + 3.0,
        );
        assert_close(
            pixels("2.5in * 3 + 1cm"),
            uc.from_inch(2.5) * 3.0 + uc.from_centimeter(1.0),
        );
    }

    #[test]
    fn parentheses_and_precedence() {
        let uc = UnitConverter::new(PPI);
        assert_close(
            pixels("(1in + 2.54cm) * 3"),
            (uc.from_inch(1.0) + uc.from_centimeter(2.54)) * 3.0,
        );
        assert_close(
            pixels("(10 + 5) * (2in - 1cm)"),
            15.0 * (uc.from_inch(2.0) - uc.from_centimeter(1.0)),
        );
        assert_close(pixels("100px / (2 + 3)"), 20.0);
        assert_close(pixels("(1in)"), uc.from_inch(1.0));
        assert_close(pixels("((((1in))))"), uc.from_inch(1.0));
        assert_close(
            pixels("(1in + 2cm) * 3 - (4mm + 5pt) * 2"),
            (uc.from_inch(1.0) + uc.from_centimeter(2.0)) * 3.0
                - (uc.from_millimeter(4.0) + uc.from_point(5.0)) * 2.0,
        );
        assert_close(
            pixels("10 * (5em - 2rem) + 3pc / (1 + 0.5)"),
            10.0 * (uc.from_em(5.0) - uc.from_em(2.0)) + uc.from_pica(3.0) / 1.5,
        );
        assert_close(
            pixels("(((1in + 2cm) * 3) - 4mm) - (5pt / 2)"),
            ((uc.from_inch(1.0) + uc.from_centimeter(2.0)) * 3.0 - uc.from_millimeter(4.0))
                - uc.from_point(5.0) / 2.0,
        );
    }

    #[test]
    fn whitespace_is_skippable_between_tokens() {
        let uc = UnitConverter::new(PPI);
        assert_close(
            pixels("  10in  +  5cm  "),
            uc.from_inch(10.0) + uc.from_centimeter(5.0),
        );
        assert_close(pixels("1in+2cm"), uc.from_inch(1.0) + uc.from_centimeter(2.0));
        assert_close(
            pixels("3mm *\t4 + \n5px"),
            uc.from_millimeter(3.0) * 4.0 + 5.0,
        );
        assert_close(pixels("10 mm"), uc.from_millimeter(10.0));
        assert_close(pixels(" 10 mm "), uc.from_millimeter(10.0));
    }

    #[test]
    fn unit_tokens_are_case_normalized() {
        let uc = UnitConverter::new(PPI);
        assert_close(
            pixels("1IN + 2CM"),
            uc.from_inch(1.0) + uc.from_centimeter(2.0),
        );
        assert_close(pixels("3Mm * 4"), uc.from_millimeter(3.0) * 4.0);
        assert_close(pixels("5Em - 2rEm"), uc.from_em(5.0) - uc.from_em(2.0));
        assert_close(pixels("10MM"), uc.from_millimeter(10.0));
    }

    #[test]
    fn unitless_operands_adopt_the_sibling_unit() {
        let uc = UnitConverter::new(PPI);
        assert_close(pixels("1in + 2"), uc.from_inch(1.0) + uc.from_inch(2.0));
        assert_close(pixels("1 + 2 in"), uc.from_inch(3.0));
        assert_close(pixels("1 px + 2 in"), uc.from_inch(2.0) + 1.0);
        assert_close(pixels("1/12 in"), uc.from_inch(1.0 / 12.0));
        assert_eq!(eval("1in + 2").unit, Some(Unit::In));
        assert_eq!(eval("2 + 1in").unit, Some(Unit::In));
        assert_eq!(eval("6in / 2").unit, Some(Unit::In));
        assert_eq!(eval("10 + 5").unit, None);
    }

    #[test]
    fn unit_suffix_after_group() {
        let uc = UnitConverter::new(PPI);
        assert_close(pixels("(1 + 2) in"), uc.from_inch(3.0));
        assert_close(
            pixels("(1 + 2) in + (2 + 3) cm"),
            uc.from_inch(3.0) + uc.from_centimeter(5.0),
        );
        assert_close(
            pixels("(2 + 3) cm + 4"),
            uc.from_centimeter(5.0) + uc.from_centimeter(4.0),
        );
        assert_close(
            pixels("(2 + 3) cm + 4 px"),
            uc.from_centimeter(5.0) + 4.0,
        );
        assert_close(
            pixels("(1 + 2) + (2 + 3) cm"),
            uc.from_centimeter(3.0) + uc.from_centimeter(5.0),
        );
        // restating the group's unit is legal
        assert_close(pixels("(1in + 2) in"), uc.from_inch(3.0));
        // contradicting it is not
        assert!(matches!(
            eval_err("(1in + 2cm) px"),
            EvalError::ConflictingSuffix { .. }
        ));
    }

    #[test]
    fn negation() {
        let uc = UnitConverter::new(PPI);
        assert_close(pixels("-(-(-1in))"), uc.from_inch(-1.0));
        assert_close(pixels("- 5mm"), -uc.from_millimeter(5.0));
        assert_close(pixels("-(1in + 2cm)"), -(uc.from_inch(1.0) + uc.from_centimeter(2.0)));
        assert!(matches!(
            eval_err("--1in"),
            EvalError::DoubleNegative { .. }
        ));
        assert!(matches!(
            eval_err("1in + --2cm"),
            EvalError::DoubleNegative { .. }
        ));
    }

    #[test]
    fn number_edge_forms() {
        let uc = UnitConverter::new(PPI);
        assert_close(pixels(".5in"), uc.from_inch(0.5));
        assert_close(pixels("1."), 1.0);
        assert_close(pixels("0.0000001mm"), uc.from_millimeter(0.0000001));
        assert_close(pixels("9999999px"), 9999999.0);
        assert_close(pixels("1.5e2px"), 150.0);
        assert_close(pixels("1.5e+2px"), 150.0);
    }

    #[test]
    fn boundary_magnitudes() {
        let uc = UnitConverter::new(300.0);
        let value = ExpressionParser::new("1.7976931348623157e+308mm", 300.0)
            .parse()
            .unwrap();
        assert!(uc.to_pixels(value.magnitude, value.unit).is_infinite());

        let value = ExpressionParser::new("4.9406564584124654e-324mm", 300.0)
            .parse()
            .unwrap();
        assert!(uc.to_pixels(value.magnitude, value.unit).abs() < 1e-9);
    }

    #[test]
    fn syntax_errors() {
        for input in [
            "",
            "   ",
            "in",
            "1in + ",
            "1in +",
            "1in 2cm",
            "(1in + 2cm",
            "1in + 2cm)",
            "1in + *2cm",
            "1in + 2cm *",
            "1in + #2cm",
            "1.2.3in",
            "1e10e20in",
            "()",
            "1in + ()",
            "1in + (2cm",
            "1in + 2cm + ",
            ".",
            "+",
        ] {
            eval_err(input);
        }
    }

    #[test]
    fn syntax_error_kinds() {
        assert!(matches!(eval_err(""), EvalError::EmptyInput));
        assert!(matches!(eval_err("   "), EvalError::EmptyInput));
        assert!(matches!(eval_err("()"), EvalError::EmptyParens { .. }));
        assert!(matches!(
            eval_err("(1in + 2cm"),
            EvalError::UnclosedParen { offset: 0 }
        ));
        assert!(matches!(
            eval_err("1in + 2cm)"),
            EvalError::TrailingInput { offset: 9, .. }
        ));
        assert!(matches!(
            eval_err("1in 2cm"),
            EvalError::TrailingInput { .. }
        ));
        assert!(matches!(
            eval_err("1in + "),
            EvalError::UnexpectedEnd { .. }
        ));
        assert!(matches!(
            eval_err("1in + *2cm"),
            EvalError::UnexpectedChar { ch: '*', .. }
        ));
        assert!(matches!(
            eval_err("1.2.3in"),
            EvalError::InvalidNumber { .. }
        ));
        assert!(matches!(eval_err("in"), EvalError::UnexpectedChar { .. }));
    }

    #[test]
    fn semantic_errors() {
        assert!(matches!(
            eval_err("10kg"),
            EvalError::InvalidUnit { ref token, .. } if token == "kg"
        ));
        assert!(matches!(eval_err("10unknown"), EvalError::InvalidUnit { .. }));
        assert!(matches!(
            eval_err("1/0in"),
            EvalError::DivisionByZero { .. }
        ));
        assert!(matches!(
            eval_err("1in / 0"),
            EvalError::DivisionByZero { .. }
        ));
        assert!(matches!(
            eval_err("10mm / 5px"),
            EvalError::MismatchedUnits {
                op: '/',
                left: Unit::Mm,
                right: Unit::Px
            }
        ));
        assert!(matches!(
            eval_err("6in / 2cm"),
            EvalError::MismatchedUnits { .. }
        ));
        assert!(matches!(
            eval_err("2in * 3cm"),
            EvalError::MultiplyWithUnits { .. }
        ));
        // two units in a product fail even when they agree
        assert!(matches!(
            eval_err("2in * 3in"),
            EvalError::MultiplyWithUnits { .. }
        ));
        assert!(matches!(
            eval_err("(2in + 3cm) * 4mm"),
            EvalError::MultiplyWithUnits { .. }
        ));
        assert!(matches!(
            eval_err("((2in + 3cm) * 4) / 5mm"),
            EvalError::MismatchedUnits { .. }
        ));
    }

    #[test]
    fn division_allows_matching_units() {
        assert_close(pixels("6in / 2"), UnitConverter::new(PPI).from_inch(3.0));
        let value = eval("6in / 2in");
        assert_close(value.magnitude, 3.0);
        assert_eq!(value.unit, Some(Unit::In));
    }

    #[test]
    fn spans_track_the_source_text() {
        assert_eq!(eval("1in + 2cm").span, Span::new(0, 9));
        assert_eq!(eval("  10in ").span, Span::new(2, 6));
        assert_eq!(eval("(1 + 2) in").span, Span::new(0, 10));
        assert_eq!(eval("-5mm").span, Span::new(0, 4));
    }

    #[test]
    fn errors_report_offsets() {
        match eval_err("1in + #2cm") {
            EvalError::UnexpectedChar { ch, offset } => {
                assert_eq!(ch, '#');
                assert_eq!(offset, 6);
            }
            other => panic!("unexpected error: {other}"),
        }
        match eval_err("10kg + 1in") {
            EvalError::InvalidUnit { token, offset } => {
                assert_eq!(token, "kg");
                assert_eq!(offset, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
