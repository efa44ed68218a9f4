//! Property value splitting.
//!
//! A value is cut into an ordered list of segments by a fixed, priority
//! ordered set of matchers. Each matched segment is handed to the caller's
//! [`ValueHandler`], unmatched text becomes plain text. Shadow and
//! grid-template values are taken over whole before any scanning.

use crate::error::InspectorError;
use crate::metadata;
use core::ops::Range;
use css_values_units::parse_angle_text;
use css_variables::find_var_functions;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static URL_REGEX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"(?i)url\(\s*(?:'[^']*'|"[^"]*"|[^)]+)\s*\)"#).ok());

static BEZIER_REGEX: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)cubic-bezier\([^)]+\)|\b(?:linear|ease-in-out|ease-in|ease-out|ease)\b").ok()
});

static COLOR_REGEX: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:rgb|hsl)a?\([^)]+\)|#[0-9a-f]{8}\b|#[0-9a-f]{6}\b|#[0-9a-f]{3,4}\b|\b[a-z]+\b",
    )
    .ok()
});

static ANGLE_REGEX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)[+-]?\d*\.?\d+(?:deg|grad|rad|turn)\b").ok());

static FONT_FAMILY_REGEX: Lazy<Option<Regex>> = Lazy::new(|| {
    let family = r#"(?:"[\w\s-]+"|'[\w\s-]+'|[\w-]+(?:\s+[\w-]+)*)"#;
    Regex::new(&format!(r"^{family}(?:\s*,\s*{family})*$")).ok()
});

static FONT_PROPERTIES_REGEX: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^(?:[a-zA-Z][a-zA-Z-]*|[+-]?(?:\d+\.?\d*|\.\d+)[a-zA-Z%]*)$").ok()
});

static GRID_ROW_REGEX: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r#"(?:\[[\w\- ]+\]\s*)*(?:"[^"]+"|'[^']+')[^'"\[]*\[?[\w\- ]*\]?"#).ok()
});

/// Kind of a matched value segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Var,
    Url,
    Bezier,
    Color,
    Angle,
    Font,
    Shadow,
    Grid,
}

impl TokenKind {
    const fn bit(self) -> u8 {
        match self {
            Self::Var => 1,
            Self::Url => 1 << 1,
            Self::Bezier => 1 << 2,
            Self::Color => 1 << 3,
            Self::Angle => 1 << 4,
            Self::Font => 1 << 5,
            Self::Shadow => 1 << 6,
            Self::Grid => 1 << 7,
        }
    }
}

/// Set of handlers the caller registered. `var()` and `url()` are always scanned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EnabledHandlers(u8);

impl EnabledHandlers {
    pub const fn none() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(u8::MAX)
    }

    #[must_use]
    pub const fn with(self, kind: TokenKind) -> Self {
        Self(self.0 | kind.bit())
    }

    pub const fn contains(self, kind: TokenKind) -> bool {
        self.0 & kind.bit() != 0
    }
}

/// One piece of a split value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueSegment {
    /// `None` for plain text.
    pub kind: Option<TokenKind>,
    /// Byte range into the value.
    pub range: Range<usize>,
}

/// Materializes segments into the caller's node type.
pub trait ValueHandler {
    type Node;

    /// Plain text between matches.
    fn text(&mut self, text: &str) -> Self::Node;

    /// A matched segment.
    ///
    /// # Errors
    /// Implementations return [`InspectorError::UnresolvedVariable`] when a
    /// `var()` cannot be computed; rendering then fails as a whole.
    fn token(&mut self, kind: TokenKind, text: &str) -> Result<Self::Node, InspectorError>;
}

fn regex_ranges(regex: &Lazy<Option<Regex>>, text: &str) -> Vec<Range<usize>> {
    regex
        .as_ref()
        .map(|regex| regex.find_iter(text).map(|found| found.range()).collect())
        .unwrap_or_default()
}

/// Not glued to an identifier on either side.
fn standalone(text: &str, range: &Range<usize>) -> bool {
    let before = text.get(..range.start).and_then(|head| head.chars().next_back());
    let after = text.get(range.end..).and_then(|tail| tail.chars().next());
    before != Some('-') && !matches!(after, Some('-' | '('))
}

fn find_ranges(kind: TokenKind, property_name: &str, text: &str) -> Vec<Range<usize>> {
    match kind {
        TokenKind::Var => find_var_functions(text),
        TokenKind::Url => regex_ranges(&URL_REGEX, text),
        TokenKind::Bezier => regex_ranges(&BEZIER_REGEX, text)
            .into_iter()
            .filter(|range| {
                let matched = text.get(range.clone()).unwrap_or_default();
                matched.ends_with(')') || standalone(text, range)
            })
            .collect(),
        TokenKind::Color => regex_ranges(&COLOR_REGEX, text)
            .into_iter()
            .filter(|range| {
                let matched = text.get(range.clone()).unwrap_or_default();
                (matched.ends_with(')') || standalone(text, range))
                    && css_color::parse_color_literal(matched).is_some()
            })
            .collect(),
        TokenKind::Angle => regex_ranges(&ANGLE_REGEX, text)
            .into_iter()
            .filter(|range| {
                text.get(range.clone())
                    .and_then(parse_angle_text)
                    .is_some()
            })
            .collect(),
        TokenKind::Font => {
            let regex = if property_name.eq_ignore_ascii_case("font-family") {
                &FONT_FAMILY_REGEX
            } else {
                &FONT_PROPERTIES_REGEX
            };
            regex_ranges(regex, text)
        }
        TokenKind::Shadow | TokenKind::Grid => Vec::new(),
    }
}

/// Kinds scanned for a property, in priority order.
fn scan_order(property_name: &str, enabled: EnabledHandlers) -> Vec<TokenKind> {
    let mut kinds = vec![TokenKind::Var, TokenKind::Url];
    if enabled.contains(TokenKind::Bezier) && metadata::is_bezier_aware(property_name) {
        kinds.push(TokenKind::Bezier);
    }
    if enabled.contains(TokenKind::Color) && metadata::is_color_aware(property_name) {
        kinds.push(TokenKind::Color);
    }
    if enabled.contains(TokenKind::Angle) && metadata::is_angle_aware(property_name) {
        kinds.push(TokenKind::Angle);
    }
    if enabled.contains(TokenKind::Font) && metadata::is_font_aware(property_name) {
        kinds.push(TokenKind::Font);
    }
    kinds
}

/// Split `value` into ordered segments covering it end to end.
pub fn split_value(property_name: &str, value: &str, enabled: EnabledHandlers) -> Vec<ValueSegment> {
    if value.is_empty() {
        return Vec::new();
    }
    let whole = |kind| {
        vec![ValueSegment {
            kind: Some(kind),
            range: 0..value.len(),
        }]
    };
    if enabled.contains(TokenKind::Shadow)
        && metadata::is_shadow_property(property_name)
        && find_var_functions(value).is_empty()
    {
        return whole(TokenKind::Shadow);
    }
    if enabled.contains(TokenKind::Grid) && metadata::is_grid_area_defining(property_name) {
        return whole(TokenKind::Grid);
    }
    let mut segments = vec![ValueSegment {
        kind: None,
        range: 0..value.len(),
    }];
    for kind in scan_order(property_name, enabled) {
        let mut next = Vec::with_capacity(segments.len());
        for segment in segments {
            if segment.kind.is_some() {
                next.push(segment);
                continue;
            }
            let base = segment.range.start;
            let text = value.get(segment.range.clone()).unwrap_or_default();
            let mut cursor = 0;
            for found in find_ranges(kind, property_name, text) {
                if found.start > cursor {
                    next.push(ValueSegment {
                        kind: None,
                        range: base + cursor..base + found.start,
                    });
                }
                next.push(ValueSegment {
                    kind: Some(kind),
                    range: base + found.start..base + found.end,
                });
                cursor = found.end;
            }
            if cursor < text.len() {
                next.push(ValueSegment {
                    kind: None,
                    range: base + cursor..segment.range.end,
                });
            }
        }
        segments = next;
    }
    segments
}

/// Split `value` and materialize every segment through `handler`.
///
/// # Errors
/// Propagates the first handler error; callers fall back to plain text.
pub fn render_value<H: ValueHandler>(
    property_name: &str,
    value: &str,
    enabled: EnabledHandlers,
    handler: &mut H,
) -> Result<Vec<H::Node>, InspectorError> {
    split_value(property_name, value, enabled)
        .into_iter()
        .map(|segment| {
            let text = value.get(segment.range).unwrap_or_default();
            match segment.kind {
                Some(kind) => handler.token(kind, text),
                None => Ok(handler.text(text)),
            }
        })
        .collect()
}

/// Rows of a grid-template-areas style value, trimmed. One row means no split.
pub fn split_grid_rows(value: &str) -> Vec<String> {
    regex_ranges(&GRID_ROW_REGEX, value)
        .into_iter()
        .filter_map(|range| value.get(range).map(|row| row.trim().to_owned()))
        .collect()
}

/// Split a value list at top-level commas, returning trimmed-start ranges.
pub fn split_top_level_commas(value: &str) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, character) in value.char_indices() {
        match character {
            '(' => depth = depth.saturating_add(1),
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                out.push(start..index);
                start = index + 1;
            }
            _ => {}
        }
    }
    out.push(start..value.len());
    out.into_iter()
        .map(|range| {
            let text = value.get(range.clone()).unwrap_or_default();
            let leading = text.len() - text.trim_start().len();
            let trailing = text.len() - text.trim_end().len();
            range.start + leading..range.end - trailing
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(name: &str, value: &str) -> Vec<(Option<TokenKind>, String)> {
        split_value(name, value, EnabledHandlers::all())
            .into_iter()
            .map(|segment| (segment.kind, value.get(segment.range).unwrap_or_default().to_owned()))
            .collect()
    }

    #[test]
    fn color_and_var_split_in_priority_order() {
        assert_eq!(
            kinds("border", "1px solid var(--edge, red) #abc"),
            vec![
                (None, "1px solid ".to_owned()),
                (Some(TokenKind::Var), "var(--edge, red)".to_owned()),
                (None, " ".to_owned()),
                (Some(TokenKind::Color), "#abc".to_owned()),
            ]
        );
    }

    #[test]
    fn words_glued_to_hyphens_are_not_colors() {
        let split = kinds("background", "linear-gradient(45deg, red, blue)");
        assert!(split.contains(&(Some(TokenKind::Angle), "45deg".to_owned())));
        assert!(split.contains(&(Some(TokenKind::Color), "red".to_owned())));
        assert!(!split.iter().any(|(_, text)| text == "linear"));
    }

    #[test]
    fn shadow_takeover_skipped_with_var() {
        assert_eq!(
            kinds("box-shadow", "0 0 2px red"),
            vec![(Some(TokenKind::Shadow), "0 0 2px red".to_owned())]
        );
        assert!(
            kinds("box-shadow", "var(--shadow)")
                .contains(&(Some(TokenKind::Var), "var(--shadow)".to_owned()))
        );
    }

    #[test]
    fn disabled_handlers_leave_text() {
        let split = split_value("color", "red", EnabledHandlers::none());
        assert_eq!(split, vec![ValueSegment { kind: None, range: 0..3 }]);
        let bezier = split_value(
            "transition",
            "opacity 1s ease-in-out",
            EnabledHandlers::none().with(TokenKind::Bezier),
        );
        assert_eq!(bezier.last().and_then(|segment| segment.kind), Some(TokenKind::Bezier));
    }

    #[test]
    fn grid_rows_and_commas() {
        assert_eq!(
            split_grid_rows("\"a a\" \"b b\""),
            vec!["\"a a\"".to_owned(), "\"b b\"".to_owned()]
        );
        assert_eq!(split_top_level_commas("a, rgb(1, 2, 3) b"), vec![0..1, 3..17]);
    }
}
