//! CSS Values and Units Module Level 3: Numeric value types used by inline value editors.
//! Reference: <https://www.w3.org/TR/css-values-3/>

#![forbid(unsafe_code)]

// Per-chapter modules mirroring the chapters of CSS Values and Units.
pub mod chapter_4_numbers;
pub mod chapter_6_dimensions;
pub mod chapter_7_angles;

pub use chapter_4_numbers::{Number, NumericToken, modify_numeric_token, parse_number, split_numeric_token};
pub use chapter_6_dimensions::{Length, LengthUnit, is_length_unit, parse_length};
pub use chapter_7_angles::{Angle, AngleUnit, parse_angle, parse_angle_text};

/// Parse error for Values & Units parsing utilities in this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// The next token did not match the expected grammar.
    UnexpectedToken,
}
