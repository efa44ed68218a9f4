//! CSS Values & Units Level 3: §7.1 Angle Units
//! Reference: <https://www.w3.org/TR/css-values-3/#angles>

use crate::ParseError;
use core::f64::consts::PI;
use cssparser::{Parser, ParserInput, Token};

/// Angle units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AngleUnit {
    Deg,
    Grad,
    Rad,
    Turn,
}

impl AngleUnit {
    /// Map a unit suffix to an angle unit.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Some(match suffix.to_ascii_lowercase().as_str() {
            "deg" => Self::Deg,
            "grad" => Self::Grad,
            "rad" => Self::Rad,
            "turn" => Self::Turn,
            _ => return None,
        })
    }

    /// Unit suffix as written in CSS.
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Deg => "deg",
            Self::Grad => "grad",
            Self::Rad => "rad",
            Self::Turn => "turn",
        }
    }

    /// The unit following this one when the user cycles units.
    pub const fn next(self) -> Self {
        match self {
            Self::Deg => Self::Grad,
            Self::Grad => Self::Rad,
            Self::Rad => Self::Turn,
            Self::Turn => Self::Deg,
        }
    }

    const fn per_turn(self) -> f64 {
        match self {
            Self::Deg => 360.0,
            Self::Grad => 400.0,
            Self::Rad => 2.0 * PI,
            Self::Turn => 1.0,
        }
    }
}

/// A CSS <angle> value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Angle {
    pub value: f64,
    pub unit: AngleUnit,
}

impl Angle {
    /// Value in degrees.
    pub fn to_degrees(self) -> f64 {
        self.value * 360.0 / self.unit.per_turn()
    }

    /// Convert to another unit.
    pub fn convert(self, unit: AngleUnit) -> Self {
        Self {
            value: self.to_degrees() * unit.per_turn() / 360.0,
            unit,
        }
    }

    /// Serialize with at most four fraction digits.
    pub fn to_css_text(self) -> String {
        let rounded = (self.value * 10_000.0).round() / 10_000.0;
        let rounded = if rounded.abs() < f64::EPSILON { 0.0 } else { rounded };
        format!("{rounded}{}", self.unit.suffix())
    }
}

/// Parse a CSS <angle> token.
///
/// # Errors
/// Returns `ParseError::UnexpectedToken` when the next token is not an angle dimension.
pub fn parse_angle(input: &mut Parser) -> Result<Angle, ParseError> {
    match input.next() {
        Ok(Token::Dimension { value, unit, .. }) => {
            let unit_kind = AngleUnit::from_suffix(unit).ok_or(ParseError::UnexpectedToken)?;
            Ok(Angle {
                value: f64::from(*value),
                unit: unit_kind,
            })
        }
        Ok(_) | Err(_) => Err(ParseError::UnexpectedToken),
    }
}

/// Parse a standalone angle literal such as `45deg`.
pub fn parse_angle_text(text: &str) -> Option<Angle> {
    let mut input = ParserInput::new(text.trim());
    let mut parser = Parser::new(&mut input);
    let angle = parse_angle(&mut parser).ok()?;
    parser.is_exhausted().then_some(angle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_between_units() {
        let angle = parse_angle_text("90deg");
        let as_turns = angle.map(|parsed| parsed.convert(AngleUnit::Turn).to_css_text());
        assert_eq!(as_turns.as_deref(), Some("0.25turn"));
        let as_grads = angle.map(|parsed| parsed.convert(AngleUnit::Grad).to_css_text());
        assert_eq!(as_grads.as_deref(), Some("100grad"));
        assert!(parse_angle_text("90px").is_none());
        assert!(parse_angle_text("90deg 1").is_none());
    }
}
