//! CSS Values & Units Level 3: §6 Dimensions (Lengths subset)
//! Reference: <https://www.w3.org/TR/css-values-3/#lengths>

use crate::ParseError;
use cssparser::{Parser, Token};

/// Supported subset of CSS <length> units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LengthUnit {
    Pixels,
    Ems,
    RootEms,
    Percent,
    ViewportWidth,
    ViewportHeight,
    Points,
    Characters,
}

impl LengthUnit {
    /// Map a unit suffix to a length unit.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Some(match suffix.to_ascii_lowercase().as_str() {
            "px" => Self::Pixels,
            "em" => Self::Ems,
            "rem" => Self::RootEms,
            "%" => Self::Percent,
            "vw" => Self::ViewportWidth,
            "vh" => Self::ViewportHeight,
            "pt" => Self::Points,
            "ch" => Self::Characters,
            _ => return None,
        })
    }
}

/// Whether `suffix` is a length unit this module knows about.
#[inline]
pub fn is_length_unit(suffix: &str) -> bool {
    LengthUnit::from_suffix(suffix).is_some()
}

/// A CSS <length> value with unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Length {
    pub value: f32,
    pub unit: LengthUnit,
}

/// Parse a CSS <length> (§6.2), accepting unitless zero.
///
/// # Errors
/// Returns `ParseError::UnexpectedToken` when the next token is not a supported `<length>`.
pub fn parse_length(input: &mut Parser) -> Result<Length, ParseError> {
    match input.next() {
        Ok(Token::Dimension { value, unit, .. }) => {
            let unit_kind = LengthUnit::from_suffix(unit).ok_or(ParseError::UnexpectedToken)?;
            Ok(Length {
                value: *value,
                unit: unit_kind,
            })
        }
        Ok(Token::Percentage { unit_value, .. }) => Ok(Length {
            value: *unit_value * 100.0,
            unit: LengthUnit::Percent,
        }),
        Ok(Token::Number { value, .. }) if value.abs() < f32::EPSILON => Ok(Length {
            value: 0.0,
            unit: LengthUnit::Pixels,
        }),
        Ok(_) | Err(_) => Err(ParseError::UnexpectedToken),
    }
}
