//! Rendered value tokens.
//!
//! The row's [`ValueHandler`] turns every split segment into a
//! [`RenderedToken`] carrying enough data for the host to draw a swatch and
//! for popovers to splice an edited token back into the value text.

use crate::error::InspectorError;
use crate::model::{CascadeModel, StyleId};
use crate::renderer::{
    EnabledHandlers, TokenKind, ValueHandler, render_value, split_grid_rows,
    split_top_level_commas,
};
use core::ops::Range;
use css_color::{ColorFormat, ParsedColor, Rgba8, format_color, next_format, parse_color_literal};
use css_values_units::{Angle, parse_angle_text};
use log::trace;

/// A color swatch; the display format can differ from the written one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorSwatch {
    pub color: ParsedColor,
    pub display_format: ColorFormat,
}

impl ColorSwatch {
    pub fn new(color: ParsedColor) -> Self {
        Self {
            display_format: color.format,
            color,
        }
    }

    pub fn display_text(&self) -> String {
        if self.display_format == self.color.format {
            return self.color.original.clone();
        }
        format_color(self.color.rgba, self.display_format)
    }

    /// Switch to the next notation able to express the color.
    pub fn cycle_format(&mut self) {
        self.display_format = next_format(self.display_format, self.color.rgba);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValueToken {
    Text(String),
    Var {
        text: String,
        computed: String,
        from_fallback: bool,
        /// Set when the computed value is a color.
        color: Option<Rgba8>,
    },
    Url(String),
    Color(ColorSwatch),
    Bezier(String),
    Angle {
        text: String,
        angle: Angle,
    },
    Font(String),
    /// One entry per comma separated shadow.
    Shadow(Vec<String>),
    /// Rows of a grid template, drawn one per line.
    Grid { rows: Vec<String>, indent: String },
}

impl ValueToken {
    /// Text the row shows for this token.
    pub fn display_text(&self) -> String {
        match self {
            Self::Text(text)
            | Self::Var { text, .. }
            | Self::Url(text)
            | Self::Bezier(text)
            | Self::Angle { text, .. }
            | Self::Font(text) => text.clone(),
            Self::Color(swatch) => swatch.display_text(),
            Self::Shadow(parts) => parts.join(", "),
            Self::Grid { rows, indent } => rows
                .iter()
                .map(|row| format!("\n{indent}{row}"))
                .collect(),
        }
    }

    /// Whether clicking the token opens an editor.
    pub const fn is_swatch(&self) -> bool {
        matches!(
            self,
            Self::Color(_) | Self::Bezier(_) | Self::Angle { .. } | Self::Shadow(_)
        )
    }
}

/// A token plus its byte range in the declaration's value.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedToken {
    pub range: Range<usize>,
    pub token: ValueToken,
}

/// Handler building row tokens against the backend.
struct RowValueHandler<'ctx, M> {
    model: &'ctx M,
    style: StyleId,
    indent: &'ctx str,
    cursor: usize,
    font_seen: bool,
}

impl<M> RowValueHandler<'_, M> {
    fn advance(&mut self, text: &str) -> Range<usize> {
        let start = self.cursor;
        self.cursor += text.len();
        start..self.cursor
    }
}

impl<M: CascadeModel> ValueHandler for RowValueHandler<'_, M> {
    type Node = RenderedToken;

    fn text(&mut self, text: &str) -> RenderedToken {
        RenderedToken {
            range: self.advance(text),
            token: ValueToken::Text(text.to_owned()),
        }
    }

    fn token(&mut self, kind: TokenKind, text: &str) -> Result<RenderedToken, InspectorError> {
        let range = self.advance(text);
        let token = match kind {
            TokenKind::Var => {
                let resolved = self
                    .model
                    .compute_single_variable(self.style, text)
                    .ok_or_else(|| InspectorError::UnresolvedVariable {
                        reference: text.to_owned(),
                    })?;
                let color = parse_color_literal(&resolved.value).map(|parsed| parsed.rgba);
                ValueToken::Var {
                    text: text.to_owned(),
                    computed: resolved.value,
                    from_fallback: resolved.from_fallback,
                    color,
                }
            }
            TokenKind::Url => ValueToken::Url(text.to_owned()),
            TokenKind::Color => parse_color_literal(text).map_or_else(
                || ValueToken::Text(text.to_owned()),
                |parsed| ValueToken::Color(ColorSwatch::new(parsed)),
            ),
            TokenKind::Bezier => ValueToken::Bezier(text.to_owned()),
            TokenKind::Angle => parse_angle_text(text).map_or_else(
                || ValueToken::Text(text.to_owned()),
                |angle| ValueToken::Angle {
                    text: text.to_owned(),
                    angle,
                },
            ),
            TokenKind::Font => {
                self.font_seen = true;
                ValueToken::Font(text.to_owned())
            }
            TokenKind::Shadow => ValueToken::Shadow(
                split_top_level_commas(text)
                    .into_iter()
                    .filter_map(|part| text.get(part).map(ToOwned::to_owned))
                    .collect(),
            ),
            TokenKind::Grid => {
                let rows = split_grid_rows(text);
                if rows.len() <= 1 {
                    ValueToken::Text(text.to_owned())
                } else {
                    ValueToken::Grid {
                        rows,
                        indent: self.indent.to_owned(),
                    }
                }
            }
        };
        Ok(RenderedToken { range, token })
    }
}

/// Result of rendering one declaration value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderedValue {
    pub tokens: Vec<RenderedToken>,
    /// A font token was produced; the row registers with the section font editor.
    pub has_font: bool,
}

/// Render a value, falling back to a single text token when a `var()` does not resolve.
pub fn render_row_value<M: CascadeModel>(
    model: &M,
    style: StyleId,
    name: &str,
    value: &str,
    enabled: EnabledHandlers,
    indent: &str,
) -> RenderedValue {
    let mut handler = RowValueHandler {
        model,
        style,
        indent,
        cursor: 0,
        font_seen: false,
    };
    match render_value(name, value, enabled, &mut handler) {
        Ok(tokens) => RenderedValue {
            tokens,
            has_font: handler.font_seen,
        },
        Err(error) => {
            trace!("rendering `{name}` as text: {error}");
            let tokens = if value.is_empty() {
                Vec::new()
            } else {
                vec![RenderedToken {
                    range: 0..value.len(),
                    token: ValueToken::Text(value.to_owned()),
                }]
            };
            RenderedValue {
                tokens,
                has_font: false,
            }
        }
    }
}

/// Value text as currently displayed by the tokens.
pub fn rendered_value_text(tokens: &[RenderedToken]) -> String {
    tokens
        .iter()
        .map(|rendered| match &rendered.token {
            ValueToken::Grid { rows, .. } => rows.join(" "),
            token => token.display_text(),
        })
        .collect()
}
