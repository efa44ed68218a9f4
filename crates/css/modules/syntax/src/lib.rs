//! CSS Syntax Module Level 3: Parsing of declaration blocks and style sheets.
//! Reference: <https://www.w3.org/TR/css-syntax-3/>
//!
//! Besides whole style sheets this crate parses the free-standing declaration
//! text an editor produces (`name: value;`, possibly several, possibly wrapped
//! in a comment when the declaration is disabled).

#![forbid(unsafe_code)]

use core::error::Error;
use core::fmt;
use core::slice;
use cssparser::AtRuleParser as CssAtRuleParser;
use cssparser::BasicParseErrorKind;
use cssparser::CowRcStr;
use cssparser::DeclarationParser as CssDeclarationParser;
use cssparser::ParseError;
use cssparser::Parser;
use cssparser::ParserInput;
use cssparser::ParserState;
use cssparser::QualifiedRuleParser as CssQualifiedRuleParser;
use cssparser::RuleBodyItemParser as CssRuleBodyItemParser;
use cssparser::RuleBodyParser as CssRuleBodyParser;
use cssparser::SourceLocation;
use cssparser::StyleSheetParser;

/// A single CSS declaration (property: value [!important]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// Property name. Custom properties keep their case, others are lowercased.
    pub name: String,
    /// Raw value text (without trailing !important).
    pub value: String,
    /// Whether the declaration was marked as `!important`.
    pub important: bool,
    /// Whether the declaration sits inside a comment (`/* name: value; */`).
    pub disabled: bool,
}

impl Declaration {
    /// Serialize back to `name: value[ !important];`, commented out when disabled.
    pub fn to_css_text(&self) -> String {
        let important = if self.important { " !important" } else { "" };
        let body = format!("{}: {}{important};", self.name, self.value);
        if self.disabled {
            format!("/* {body} */")
        } else {
            body
        }
    }
}

/// Zero-based line/column position inside a style sheet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct TextPosition {
    /// Zero-based line.
    pub line: u32,
    /// Zero-based column.
    pub column: u32,
}

impl From<SourceLocation> for TextPosition {
    #[inline]
    fn from(location: SourceLocation) -> Self {
        Self {
            line: location.line,
            column: location.column.saturating_sub(1),
        }
    }
}

/// A single style rule with a raw prelude and parsed declarations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleRule {
    /// Raw prelude text (the selector list, or a keyframe key list).
    pub prelude: String,
    /// Declarations within the rule block.
    pub declarations: Vec<Declaration>,
    /// Where the rule starts.
    pub start: TextPosition,
    /// Where the rule body ends (just before the closing brace).
    pub end: TextPosition,
}

/// An `@keyframes` rule and its keyframe blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyframesRule {
    /// Animation name.
    pub name: String,
    /// One entry per keyframe block; `prelude` holds the key text.
    pub keyframes: Vec<StyleRule>,
}

/// An `@media` rule and the style rules inside it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaRule {
    /// Media query list as written, without `@media`.
    pub query: String,
    /// Style rules nested in the block.
    pub rules: Vec<StyleRule>,
    /// Where the `@media` keyword starts.
    pub start: TextPosition,
}

/// Top-level rule kinds understood by this parser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rule {
    /// A qualified style rule.
    Style(StyleRule),
    /// An `@keyframes` block.
    Keyframes(KeyframesRule),
    /// An `@media` block.
    Media(MediaRule),
}

/// A parsed stylesheet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stylesheet {
    /// Top-level rules in source order.
    pub rules: Vec<Rule>,
}

impl Stylesheet {
    /// Iterate over the style rules, those nested in `@media` included.
    pub fn style_rules(&self) -> impl Iterator<Item = &StyleRule> {
        self.rules.iter().flat_map(|rule| match rule {
            Rule::Style(style) => slice::from_ref(style),
            Rule::Media(media) => media.rules.as_slice(),
            Rule::Keyframes(_) => &[],
        })
    }
}

/// Parse `!important` at the end of a value, returning (`value_without_important`, `important_flag`).
fn split_important_tail(value: &str) -> (String, bool) {
    let trimmed = value.trim();
    if let Some(pos) = trimmed.rfind('!')
        && let Some(prefix) = trimmed.get(..pos)
        && let Some(flag) = trimmed.get(pos.saturating_add(1)..)
        && flag.trim().eq_ignore_ascii_case("important")
    {
        return (prefix.trim_end().to_owned(), true);
    }
    (trimmed.to_owned(), false)
}

/// Normalize a property name: custom properties are case-sensitive.
fn normalize_name(name: &str) -> String {
    if name.starts_with("--") {
        name.to_owned()
    } else {
        name.to_ascii_lowercase()
    }
}

/// A declaration parser that records property name and its raw value.
struct BodyDeclParser;

impl CssDeclarationParser<'_> for BodyDeclParser {
    type Declaration = Declaration;
    type Error = ();

    fn parse_value<'input>(
        &mut self,
        name: CowRcStr<'input>,
        input: &mut Parser<'input, '_>,
        _decl_start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'input, Self::Error>> {
        let start = input.position();
        while input.next_including_whitespace_and_comments().is_ok() {}
        let raw = input.slice_from(start);
        let (value, important) = split_important_tail(raw);
        Ok(Declaration {
            name: normalize_name(&name),
            value,
            important,
            disabled: false,
        })
    }
}

impl CssAtRuleParser<'_> for BodyDeclParser {
    type Prelude = ();
    type AtRule = Declaration;
    type Error = ();

    #[inline]
    fn parse_prelude<'input>(
        &mut self,
        _name: CowRcStr<'input>,
        _input: &mut Parser<'input, '_>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        Ok(())
    }

    #[inline]
    fn parse_block<'input>(
        &mut self,
        _prelude: Self::Prelude,
        _state: &ParserState,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::AtRule, ParseError<'input, Self::Error>> {
        Err(input.new_error(BasicParseErrorKind::AtRuleBodyInvalid))
    }

    #[inline]
    fn rule_without_block(
        &mut self,
        _prelude: Self::Prelude,
        _state: &ParserState,
    ) -> Result<Self::AtRule, Self::Error> {
        Err(())
    }
}

impl CssQualifiedRuleParser<'_> for BodyDeclParser {
    type Prelude = ();
    type QualifiedRule = Declaration;
    type Error = ();

    #[inline]
    fn parse_prelude<'input>(
        &mut self,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        Err(input.new_error(BasicParseErrorKind::QualifiedRuleInvalid))
    }

    #[inline]
    fn parse_block<'input>(
        &mut self,
        _prelude: Self::Prelude,
        _state: &ParserState,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::QualifiedRule, ParseError<'input, Self::Error>> {
        Err(input.new_error(BasicParseErrorKind::QualifiedRuleInvalid))
    }
}

impl CssRuleBodyItemParser<'_, Declaration, ()> for BodyDeclParser {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Prelude of a top-level rule.
enum TopLevelPrelude {
    /// Raw selector text.
    Selector(String),
    /// `@keyframes` animation name.
    Keyframes(String),
    /// Raw `@media` query list.
    Media(String),
}

/// Top-level parser that builds `Rule` items.
struct TopLevelParser;

impl CssAtRuleParser<'_> for TopLevelParser {
    type Prelude = TopLevelPrelude;
    type AtRule = Rule;
    type Error = ();

    #[inline]
    fn parse_prelude<'input>(
        &mut self,
        name: CowRcStr<'input>,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        let lower = name.to_ascii_lowercase();
        if lower == "media" {
            return Ok(TopLevelPrelude::Media(raw_prelude(input)));
        }
        if lower != "keyframes" && lower != "-webkit-keyframes" {
            return Err(input.new_error(BasicParseErrorKind::AtRuleInvalid(name)));
        }
        let animation = (**input.expect_ident_or_string()?).to_owned();
        Ok(TopLevelPrelude::Keyframes(animation))
    }

    #[inline]
    fn parse_block<'input>(
        &mut self,
        prelude: Self::Prelude,
        state: &ParserState,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::AtRule, ParseError<'input, Self::Error>> {
        let mut nested = Self;
        let rules = StyleSheetParser::new(input, &mut nested)
            .flatten()
            .filter_map(|rule| match rule {
                Rule::Style(style) => Some(style),
                Rule::Keyframes(_) | Rule::Media(_) => None,
            })
            .collect();
        match prelude {
            TopLevelPrelude::Keyframes(name) => Ok(Rule::Keyframes(KeyframesRule {
                name,
                keyframes: rules,
            })),
            TopLevelPrelude::Media(query) => Ok(Rule::Media(MediaRule {
                query,
                rules,
                start: state.source_location().into(),
            })),
            TopLevelPrelude::Selector(_) => {
                Err(input.new_error(BasicParseErrorKind::AtRuleBodyInvalid))
            }
        }
    }

    #[inline]
    fn rule_without_block(
        &mut self,
        _prelude: Self::Prelude,
        _state: &ParserState,
    ) -> Result<Self::AtRule, Self::Error> {
        Err(())
    }
}

impl CssQualifiedRuleParser<'_> for TopLevelParser {
    type Prelude = TopLevelPrelude;
    type QualifiedRule = Rule;
    type Error = ();

    #[inline]
    fn parse_prelude<'input>(
        &mut self,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        Ok(TopLevelPrelude::Selector(raw_prelude(input)))
    }

    #[inline]
    fn parse_block<'input>(
        &mut self,
        prelude: Self::Prelude,
        state: &ParserState,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::QualifiedRule, ParseError<'input, Self::Error>> {
        let TopLevelPrelude::Selector(prelude) = prelude else {
            return Err(input.new_error(BasicParseErrorKind::QualifiedRuleInvalid));
        };
        let declarations = parse_declarations_from_block(input);
        Ok(Rule::Style(StyleRule {
            prelude,
            declarations,
            start: state.source_location().into(),
            end: input.current_source_location().into(),
        }))
    }
}

/// Remaining prelude tokens as written, trimmed.
fn raw_prelude(input: &mut Parser) -> String {
    let start = input.state();
    while input.next_including_whitespace_and_comments().is_ok() {}
    input.slice_from(start.position()).trim().to_owned()
}

/// Parse declarations from a rule block using `cssparser` body parser.
fn parse_declarations_from_block(block: &mut Parser) -> Vec<Declaration> {
    let mut body = BodyDeclParser;
    CssRuleBodyParser::new(block, &mut body).flatten().collect()
}

/// Parse a full stylesheet into a `Stylesheet` using cssparser.
pub fn parse_stylesheet(css: &str) -> Stylesheet {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut top = TopLevelParser;
    Stylesheet {
        rules: StyleSheetParser::new(&mut parser, &mut top)
            .flatten()
            .collect(),
    }
}

/// Failure to parse an edited declaration text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeclarationTextError {
    /// Text contains a block delimiter that would escape the rule.
    UnbalancedBlock,
    /// A non-empty segment could not be read as `name: value`.
    Malformed(String),
}

impl fmt::Display for DeclarationTextError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnbalancedBlock => formatter.write_str("declaration text leaves its rule block"),
            Self::Malformed(segment) => write!(formatter, "malformed declaration `{segment}`"),
        }
    }
}

impl Error for DeclarationTextError {}

/// Parse declaration text as typed by a user into zero or more declarations.
///
/// Commented-out declarations (`/* color: red; */`) come back with
/// `disabled` set. An empty or whitespace-only text yields an empty list.
///
/// # Errors
/// Returns [`DeclarationTextError`] when the text contains `{`/`}` or a
/// segment that is not a declaration.
pub fn parse_declaration_text(text: &str) -> Result<Vec<Declaration>, DeclarationTextError> {
    if text.contains(['{', '}']) {
        return Err(DeclarationTextError::UnbalancedBlock);
    }
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("/*") {
        let (before, after_open) = rest.split_at(open);
        parse_active_segment(before, &mut out)?;
        let inner_start = after_open.get(2..).unwrap_or_default();
        let Some(close) = inner_start.find("*/") else {
            return Err(DeclarationTextError::Malformed(after_open.to_owned()));
        };
        let inner = inner_start.get(..close).unwrap_or_default();
        let mut commented = Vec::new();
        if parse_active_segment(inner, &mut commented).is_ok() {
            out.extend(commented.into_iter().map(|decl| Declaration {
                disabled: true,
                ..decl
            }));
        }
        rest = inner_start.get(close.saturating_add(2)..).unwrap_or_default();
    }
    parse_active_segment(rest, &mut out)?;
    Ok(out)
}

/// Parse an uncommented run of declarations, appending them to `out`.
fn parse_active_segment(
    segment: &str,
    out: &mut Vec<Declaration>,
) -> Result<(), DeclarationTextError> {
    if segment.trim().trim_matches(';').trim().is_empty() {
        return Ok(());
    }
    let mut input = ParserInput::new(segment);
    let mut parser = Parser::new(&mut input);
    let mut body = BodyDeclParser;
    for item in CssRuleBodyParser::new(&mut parser, &mut body) {
        match item {
            Ok(decl) => out.push(decl),
            Err((_, slice)) => {
                let slice = slice.trim().trim_end_matches(';').trim();
                if !slice.is_empty() {
                    return Err(DeclarationTextError::Malformed(slice.to_owned()));
                }
            }
        }
    }
    Ok(())
}

/// Split pasted text at its first `:` into a trimmed (name, value) pair.
///
/// A trailing `;` on the value is dropped.
pub fn split_name_value(text: &str) -> Option<(String, String)> {
    let (name, value) = text.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = value.trim().trim_end_matches(';').trim_end();
    Some((name.to_owned(), value.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_text_with_disabled_and_important() {
        let parsed = parse_declaration_text("color: red !important; /* margin: 0; */ --Gap: 4px")
            .unwrap_or_default();
        assert_eq!(parsed.len(), 3);
        assert!(parsed[0].important);
        assert_eq!(parsed[0].value, "red");
        assert!(parsed[1].disabled);
        assert_eq!(parsed[1].name, "margin");
        assert_eq!(parsed[2].name, "--Gap");
    }

    #[test]
    fn declaration_text_rejects_braces() {
        assert_eq!(
            parse_declaration_text("color: red; } a {"),
            Err(DeclarationTextError::UnbalancedBlock)
        );
        assert_eq!(parse_declaration_text("  ;  "), Ok(Vec::new()));
    }

    #[test]
    fn stylesheet_with_keyframes() {
        let sheet = parse_stylesheet(
            "div { color: red }\n@keyframes spin { from { rotate: 0deg } to { rotate: 1turn } }",
        );
        assert_eq!(sheet.rules.len(), 2);
        assert!(matches!(
            sheet.rules.get(1),
            Some(Rule::Keyframes(frames))
                if frames.name == "spin" && frames.keyframes.len() == 2 && frames.keyframes[1].prelude == "to"
        ));
    }

    #[test]
    fn media_blocks_keep_query_and_rules() {
        let sheet = parse_stylesheet("@media (min-width: 600px) {\n  .box { color: red }\n  .wide { margin: 0 }\n}");
        assert!(matches!(
            sheet.rules.first(),
            Some(Rule::Media(media))
                if media.query == "(min-width: 600px)" && media.start.line == 0 && media.start.column == 0
        ));
        let preludes: Vec<&str> = sheet.style_rules().map(|rule| rule.prelude.as_str()).collect();
        assert_eq!(preludes, [".box", ".wide"]);
    }

    #[test]
    fn paste_split_uses_first_colon() {
        assert_eq!(
            split_name_value("background: url(a:b);"),
            Some(("background".to_owned(), "url(a:b)".to_owned()))
        );
        assert_eq!(split_name_value(": red"), None);
    }
}
