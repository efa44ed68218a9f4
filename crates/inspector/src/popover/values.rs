//! Values edited by the swatch popovers.

use crate::renderer::split_top_level_commas;
use css_color::{ColorFormat, ParsedColor, Rgba8, format_color, parse_color_literal};
use css_values_units::{Angle, parse_angle_text};
use css_variables::parse_var_function;
use serde::Serialize;
use std::collections::BTreeMap;

/// A custom property offered by the color picker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaletteEntry {
    pub name: String,
    pub rgba: Rgba8Snapshot,
}

/// Channels of a palette color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Rgba8Snapshot {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl From<Rgba8> for Rgba8Snapshot {
    fn from(rgba: Rgba8) -> Self {
        Self {
            red: rgba.red,
            green: rgba.green,
            blue: rgba.blue,
            alpha: rgba.alpha,
        }
    }
}

/// What the pane knows when a popover opens.
#[derive(Clone, Debug, Default)]
pub struct EditorContext {
    pub palette: Vec<PaletteEntry>,
    /// Font properties of the anchor's section, by name.
    pub font_properties: BTreeMap<String, String>,
}

/// Data handed to the popover helper to draw an editor.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum EditorWidget {
    ColorPicker {
        color: Option<Rgba8Snapshot>,
        text: String,
        palette: Vec<PaletteEntry>,
    },
    BezierEditor {
        points: [f64; 4],
    },
    ShadowEditor {
        shadows: Vec<ShadowModel>,
    },
    AngleClock {
        degrees: f64,
        text: String,
    },
    FontEditor {
        properties: BTreeMap<String, String>,
    },
}

/// A value type one popover edits.
pub trait PopoverValue: Sized {
    fn parse_text(text: &str, property_name: &str) -> Option<Self>;

    fn serialize_text(&self) -> String;

    fn build_editor(&self, context: &EditorContext) -> EditorWidget;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColorValue {
    Literal(ParsedColor),
    /// `var(--name)` picked from the palette.
    Variable(String),
}

impl ColorValue {
    /// Same notation, new channels.
    #[must_use]
    pub fn with_rgba(&self, rgba: Rgba8) -> Self {
        let format = match self {
            Self::Literal(color) => color.format,
            Self::Variable(_) => ColorFormat::Hex,
        };
        Self::Literal(ParsedColor {
            rgba,
            format,
            original: format_color(rgba, format),
        })
    }
}

impl PopoverValue for ColorValue {
    fn parse_text(text: &str, _property_name: &str) -> Option<Self> {
        if let Some(reference) = parse_var_function(text) {
            return Some(Self::Variable(reference.name));
        }
        parse_color_literal(text.trim()).map(Self::Literal)
    }

    fn serialize_text(&self) -> String {
        match self {
            Self::Literal(color) => color.original.clone(),
            Self::Variable(name) => format!("var({name})"),
        }
    }

    fn build_editor(&self, context: &EditorContext) -> EditorWidget {
        let color = match self {
            Self::Literal(color) => Some(color.rgba.into()),
            Self::Variable(name) => context
                .palette
                .iter()
                .find(|entry| entry.name == *name)
                .map(|entry| entry.rgba),
        };
        EditorWidget::ColorPicker {
            color,
            text: self.serialize_text(),
            palette: context.palette.clone(),
        }
    }
}

const BEZIER_PRESETS: &[(&str, [f64; 4])] = &[
    ("linear", [0.0, 0.0, 1.0, 1.0]),
    ("ease", [0.25, 0.1, 0.25, 1.0]),
    ("ease-in", [0.42, 0.0, 1.0, 1.0]),
    ("ease-out", [0.0, 0.0, 0.58, 1.0]),
    ("ease-in-out", [0.42, 0.0, 0.58, 1.0]),
];

/// Timing function control points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BezierValue {
    pub points: [f64; 4],
}

impl PopoverValue for BezierValue {
    fn parse_text(text: &str, _property_name: &str) -> Option<Self> {
        let text = text.trim().to_ascii_lowercase();
        if let Some((_, points)) = BEZIER_PRESETS.iter().find(|(name, _)| *name == text) {
            return Some(Self { points: *points });
        }
        let inner = text.strip_prefix("cubic-bezier(")?.strip_suffix(')')?;
        let numbers: Vec<f64> = inner
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;
        let [x1, y1, x2, y2] = numbers.as_slice() else {
            return None;
        };
        if !(0.0..=1.0).contains(x1) || !(0.0..=1.0).contains(x2) {
            return None;
        }
        Some(Self {
            points: [*x1, *y1, *x2, *y2],
        })
    }

    fn serialize_text(&self) -> String {
        if let Some((name, _)) = BEZIER_PRESETS.iter().find(|(_, points)| same_points(points, &self.points)) {
            return (*name).to_owned();
        }
        let [x1, y1, x2, y2] = self.points.map(|point| (point * 100.0).round() / 100.0);
        format!("cubic-bezier({x1}, {y1}, {x2}, {y2})")
    }

    fn build_editor(&self, _context: &EditorContext) -> EditorWidget {
        EditorWidget::BezierEditor { points: self.points }
    }
}

fn same_points(left: &[f64; 4], right: &[f64; 4]) -> bool {
    left.iter()
        .zip(right)
        .all(|(one, other)| (one - other).abs() < 1e-6)
}

/// One entry of a `box-shadow` / `text-shadow` list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ShadowModel {
    pub inset: bool,
    /// Offset x, offset y, then optional blur and spread.
    pub lengths: Vec<String>,
    pub color: Option<String>,
}

impl ShadowModel {
    fn parse(text: &str, allow_inset_and_spread: bool) -> Option<Self> {
        let mut shadow = Self {
            inset: false,
            lengths: Vec::new(),
            color: None,
        };
        for word in split_top_level_words(text) {
            if word.eq_ignore_ascii_case("inset") {
                if !allow_inset_and_spread || shadow.inset {
                    return None;
                }
                shadow.inset = true;
            } else if is_length_word(word) {
                shadow.lengths.push(word.to_owned());
            } else if parse_color_literal(word).is_some() || parse_var_function(word).is_some() {
                if shadow.color.is_some() {
                    return None;
                }
                shadow.color = Some(word.to_owned());
            } else {
                return None;
            }
        }
        let max_lengths = if allow_inset_and_spread { 4 } else { 3 };
        (2..=max_lengths)
            .contains(&shadow.lengths.len())
            .then_some(shadow)
    }

    fn to_css_text(&self) -> String {
        let mut parts = Vec::new();
        if self.inset {
            parts.push("inset".to_owned());
        }
        parts.extend(self.lengths.iter().cloned());
        parts.extend(self.color.iter().cloned());
        parts.join(" ")
    }
}

fn is_length_word(word: &str) -> bool {
    let digits_end = word
        .find(|character: char| !(character.is_ascii_digit() || matches!(character, '.' | '-' | '+')))
        .unwrap_or(word.len());
    let (number, unit) = word.split_at(digits_end);
    let Ok(parsed) = number.parse::<f64>() else {
        return false;
    };
    if unit.is_empty() {
        return parsed.abs() < f64::EPSILON;
    }
    unit.chars().all(|character| character.is_ascii_alphabetic())
}

/// Split on whitespace outside parentheses.
fn split_top_level_words(text: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    for (offset, character) in text.char_indices() {
        match character {
            '(' => {
                depth += 1;
                start.get_or_insert(offset);
            }
            ')' => depth = depth.saturating_sub(1),
            _ if character.is_whitespace() && depth == 0 => {
                if let Some(begin) = start.take()
                    && let Some(word) = text.get(begin..offset)
                {
                    words.push(word);
                }
            }
            _ => {
                start.get_or_insert(offset);
            }
        }
    }
    if let Some(begin) = start
        && let Some(word) = text.get(begin..)
    {
        words.push(word);
    }
    words
}

/// The whole shadow list of a value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShadowValue {
    pub shadows: Vec<ShadowModel>,
}

impl PopoverValue for ShadowValue {
    fn parse_text(text: &str, property_name: &str) -> Option<Self> {
        let allow_inset_and_spread = property_name != "text-shadow";
        let shadows = split_top_level_commas(text)
            .into_iter()
            .map(|range| {
                text.get(range)
                    .and_then(|part| ShadowModel::parse(part.trim(), allow_inset_and_spread))
            })
            .collect::<Option<Vec<_>>>()?;
        (!shadows.is_empty()).then_some(Self { shadows })
    }

    fn serialize_text(&self) -> String {
        self.shadows
            .iter()
            .map(ShadowModel::to_css_text)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn build_editor(&self, _context: &EditorContext) -> EditorWidget {
        EditorWidget::ShadowEditor {
            shadows: self.shadows.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AngleValue(pub Angle);

impl PopoverValue for AngleValue {
    fn parse_text(text: &str, _property_name: &str) -> Option<Self> {
        parse_angle_text(text.trim()).map(Self)
    }

    fn serialize_text(&self) -> String {
        self.0.to_css_text()
    }

    fn build_editor(&self, _context: &EditorContext) -> EditorWidget {
        EditorWidget::AngleClock {
            degrees: self.0.to_degrees(),
            text: self.serialize_text(),
        }
    }
}

/// Font properties of one section, as `name: value; …` text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FontValue {
    pub properties: BTreeMap<String, String>,
}

impl PopoverValue for FontValue {
    fn parse_text(text: &str, _property_name: &str) -> Option<Self> {
        let mut properties = BTreeMap::new();
        for entry in text.split(';').map(str::trim).filter(|entry| !entry.is_empty()) {
            let (name, value) = entry.split_once(':')?;
            properties.insert(name.trim().to_owned(), value.trim().to_owned());
        }
        Some(Self { properties })
    }

    fn serialize_text(&self) -> String {
        self.properties
            .iter()
            .map(|(name, value)| format!("{name}: {value};"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build_editor(&self, _context: &EditorContext) -> EditorWidget {
        EditorWidget::FontEditor {
            properties: self.properties.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bezier_presets_serialize_as_keywords() {
        let parsed = BezierValue::parse_text("cubic-bezier(0.42, 0, 0.58, 1)", "transition");
        assert_eq!(parsed.map(|value| value.serialize_text()).as_deref(), Some("ease-in-out"));
        let custom = BezierValue { points: [0.1, 0.7, 1.0, 0.1] };
        assert_eq!(custom.serialize_text(), "cubic-bezier(0.1, 0.7, 1, 0.1)");
        assert_eq!(BezierValue::parse_text("cubic-bezier(2, 0, 0, 1)", "transition"), None);
    }

    #[test]
    fn shadow_list_parses_each_entry() {
        let value = ShadowValue::parse_text("inset 1px 2px red, 0 0 4px rgb(0, 0, 0)", "box-shadow");
        let shadows = value.map(|value| value.shadows).unwrap_or_default();
        assert_eq!(shadows.len(), 2);
        assert_eq!(shadows.first().map(|shadow| shadow.inset), Some(true));
        assert_eq!(
            shadows.get(1).and_then(|shadow| shadow.color.clone()).as_deref(),
            Some("rgb(0, 0, 0)")
        );
        assert_eq!(ShadowValue::parse_text("inset 1px 1px", "text-shadow"), None);
    }

    #[test]
    fn color_variable_round_trips() {
        let value = ColorValue::parse_text("var(--accent)", "color");
        assert_eq!(value, Some(ColorValue::Variable("--accent".to_owned())));
        assert_eq!(value.map(|value| value.serialize_text()).as_deref(), Some("var(--accent)"));
    }

    #[test]
    fn font_value_keeps_each_property() {
        let value = FontValue::parse_text("font-size: 12px; font-weight: 700;", "font-size");
        assert_eq!(
            value.map(|value| value.serialize_text()).as_deref(),
            Some("font-size: 12px; font-weight: 700;")
        );
    }
}
