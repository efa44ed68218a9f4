//! Error taxonomy and advisory row warnings.

use crate::property::PropertyPath;
use crate::section::SectionId;
use core::error::Error;
use core::fmt;
use serde::Serialize;

/// Failures raised while rendering or editing styles.
///
/// Every variant is recovered where it is raised: rows fall back to plain
/// text, edits roll back. Host-facing calls surface only the stale-handle
/// variants through `anyhow`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InspectorError {
    /// Declaration text the backend kept but could not parse.
    ParseFailure {
        name: String,
        value: String,
        unknown_property: bool,
    },
    /// A `var()` reference has no computed value.
    UnresolvedVariable { reference: String },
    /// The backend rejected a declaration edit.
    StyleApplyFailed { text: String },
    /// The backend rejected a selector or key text edit.
    SelectorApplyFailed { selector: String },
    /// The backend rejected a media query edit.
    MediaApplyFailed { media: String },
    /// A section handle that no longer exists.
    UnknownSection(SectionId),
    /// A property handle that no longer exists.
    UnknownProperty(PropertyPath),
    /// Editing was requested on a read-only row or section.
    NotEditable,
}

impl fmt::Display for InspectorError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseFailure {
                unknown_property: true,
                ..
            } => formatter.write_str("Unknown property name"),
            Self::ParseFailure { .. } => formatter.write_str("Invalid property value"),
            Self::UnresolvedVariable { reference } => {
                write!(formatter, "unable to compute a value for `{reference}`")
            }
            Self::StyleApplyFailed { text } => {
                write!(formatter, "backend rejected style text `{text}`")
            }
            Self::SelectorApplyFailed { selector } => {
                write!(formatter, "backend rejected selector `{selector}`")
            }
            Self::MediaApplyFailed { media } => {
                write!(formatter, "backend rejected media query `{media}`")
            }
            Self::UnknownSection(section) => write!(formatter, "no section {}", section.0),
            Self::UnknownProperty(path) => write!(
                formatter,
                "no property {} in section {}",
                path.index, path.section.0
            ),
            Self::NotEditable => formatter.write_str("target is not editable"),
        }
    }
}

impl Error for InspectorError {}

/// A `font-variation-settings` axis value outside a font face's range.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FontVariationWarning {
    pub tag: String,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub family: String,
}

impl fmt::Display for FontVariationWarning {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "Value for setting \u{201c}{}\u{201d} {} is outside the supported range [{}, {}] for font-family \u{201c}{}\u{201d}.",
            self.tag, self.value, self.min, self.max, self.family
        )
    }
}

/// Inline indicator attached to a rendered row.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum RowWarning {
    /// Declaration did not parse; the message names the reason.
    ParseFailure { message: String },
    /// Advisory only.
    FontVariationOutOfRange(FontVariationWarning),
}

impl RowWarning {
    /// Tooltip text for the indicator.
    pub fn message(&self) -> String {
        match self {
            Self::ParseFailure { message } => message.clone(),
            Self::FontVariationOutOfRange(warning) => warning.to_string(),
        }
    }
}
