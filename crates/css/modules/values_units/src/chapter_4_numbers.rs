//! CSS Values & Units Level 3: §4 Numbers
//! Reference: <https://www.w3.org/TR/css-values-3/#numeric-types>

use crate::ParseError;
use cssparser::Parser;
use cssparser::Token;

/// A CSS <number>
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Number(pub f32);

/// Parse a CSS <number> (§4.2). Accepts integer or real numbers.
///
/// # Errors
/// Returns `ParseError::UnexpectedToken` when the next token is not a `<number>`.
pub fn parse_number(input: &mut Parser) -> Result<Number, ParseError> {
    input.next().map_or(Err(ParseError::UnexpectedToken), |token| {
        if let Token::Number { value, .. } = token.clone() {
            Ok(Number(value))
        } else {
            Err(ParseError::UnexpectedToken)
        }
    })
}

/// A word split into the parts around its leading number, e.g. `-1.5em`.
#[derive(Clone, Debug, PartialEq)]
pub struct NumericToken {
    /// Text before the number (such as `calc(`).
    pub prefix: String,
    /// The number itself.
    pub value: f64,
    /// Digits after the decimal point in the source text.
    pub precision: usize,
    /// Text after the number, usually a unit.
    pub suffix: String,
}

/// Locate the first number in `word` and split around it.
pub fn split_numeric_token(word: &str) -> Option<NumericToken> {
    let bytes = word.as_bytes();
    let start = bytes.iter().enumerate().position(|(index, byte)| {
        byte.is_ascii_digit()
            || (matches!(byte, b'-' | b'+' | b'.')
                && bytes
                    .get(index.saturating_add(1))
                    .is_some_and(|next| next.is_ascii_digit() || *next == b'.'))
    })?;
    let mut end = start.saturating_add(1);
    let mut seen_dot = bytes.get(start) == Some(&b'.');
    while let Some(byte) = bytes.get(end) {
        if byte.is_ascii_digit() || (*byte == b'.' && !seen_dot) {
            seen_dot |= *byte == b'.';
            end = end.saturating_add(1);
        } else {
            break;
        }
    }
    let number_text = word.get(start..end)?;
    let value: f64 = number_text.parse().ok()?;
    let precision = number_text
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.len());
    Some(NumericToken {
        prefix: word.get(..start)?.to_owned(),
        value,
        precision,
        suffix: word.get(end..)?.to_owned(),
    })
}

/// Add `delta` to the number in `word`, keeping prefix and suffix.
///
/// The result keeps as many fraction digits as the larger of the source and
/// the delta need, and drops a trailing `.0`.
pub fn modify_numeric_token(word: &str, delta: f64) -> Option<String> {
    let token = split_numeric_token(word)?;
    let delta_precision = if delta.fract().abs() > f64::EPSILON { 1 } else { 0 };
    let precision = token.precision.max(delta_precision);
    let scale = 10f64.powi(precision as i32);
    let updated = ((token.value + delta) * scale).round() / scale;
    let mut number = format!("{updated:.precision$}");
    if number.contains('.') {
        number = number.trim_end_matches('0').trim_end_matches('.').to_owned();
    }
    if number == "-0" {
        number = "0".to_owned();
    }
    Some(format!("{}{number}{}", token.prefix, token.suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifies_number_keeping_unit() {
        assert_eq!(modify_numeric_token("10px", 1.0).as_deref(), Some("11px"));
        assert_eq!(modify_numeric_token("1.5em", -10.0).as_deref(), Some("-8.5em"));
        assert_eq!(modify_numeric_token("0.2", 0.1).as_deref(), Some("0.3"));
        assert_eq!(modify_numeric_token("auto", 1.0), None);
    }
}
