//! The cascade backend contract and the data it hands out.
//!
//! The inspector never owns style data. It reads declarations through a
//! [`CascadeModel`] and sends every edit back through it as text.

use css_cascade::ElementView;
use css_variables::ResolvedVariable;
use serde::Serialize;
use std::collections::BTreeMap;

/// Resolved property values of an element.
pub type ComputedStyle = BTreeMap<String, String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StyleId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StyleSheetId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

/// Zero-based text range inside a style sheet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SourceRange {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl SourceRange {
    pub const fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// An empty range at a position.
    pub const fn collapsed(line: u32, column: u32) -> Self {
        Self::new(line, column, line, column)
    }

    pub const fn collapse_to_end(self) -> Self {
        Self::collapsed(self.end_line, self.end_column)
    }

    const fn start_key(self) -> (u32, u32) {
        (self.start_line, self.start_column)
    }

    const fn end_key(self) -> (u32, u32) {
        (self.end_line, self.end_column)
    }

    /// Shift this range after `old` was replaced by text now spanning `new`.
    ///
    /// Ranges entirely before the edit are untouched. Ranges after it move by
    /// the line delta, and by the column delta when they start on the edit's
    /// last line.
    pub fn rebase(&mut self, old: SourceRange, new: SourceRange) {
        if self.start_key() < old.end_key() {
            return;
        }
        let line_delta = i64::from(new.end_line) - i64::from(old.end_line);
        let column_delta = i64::from(new.end_column) - i64::from(old.end_column);
        let shift = |line: u32, column: u32| {
            let shifted_column = if line == old.end_line {
                (i64::from(column) + column_delta).max(0) as u32
            } else {
                column
            };
            ((i64::from(line) + line_delta).max(0) as u32, shifted_column)
        };
        let (start_line, start_column) = shift(self.start_line, self.start_column);
        let (end_line, end_column) = shift(self.end_line, self.end_column);
        *self = Self::new(start_line, start_column, end_line, end_column);
    }
}

/// Notification that a style sheet's text changed under `old`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StyleSheetEdit {
    pub sheet: StyleSheetId,
    pub old: SourceRange,
    pub new: SourceRange,
}

/// A CSS property as the backend reports it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub name: String,
    pub value: String,
    pub important: bool,
    pub disabled: bool,
    pub parsed_ok: bool,
    /// Produced by shorthand expansion rather than written by the author.
    pub implicit: bool,
    /// Position inside the owning style.
    pub index: usize,
    pub owner_style: StyleId,
    pub range: Option<SourceRange>,
}

impl Declaration {
    /// A blank declaration about to be inserted at `index`.
    pub fn blank(owner_style: StyleId, index: usize) -> Self {
        Self {
            name: String::new(),
            value: String::new(),
            important: false,
            disabled: false,
            parsed_ok: true,
            implicit: false,
            index,
            owner_style,
            range: None,
        }
    }

    /// Source text of the declaration, commented out when disabled.
    pub fn property_text(&self) -> String {
        if self.name.is_empty() {
            return String::new();
        }
        let important = if self.important { " !important" } else { "" };
        let body = format!("{}: {}{important};", self.name, self.value);
        if self.disabled {
            format!("/* {body} */")
        } else {
            body
        }
    }
}

/// Where a style comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum StyleOrigin {
    UserAgent,
    Injected,
    /// The inspector's own style sheet, used for rules created from the pane.
    Inspector,
    Regular,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum StyleKind {
    /// `style` attribute.
    Inline,
    /// Presentational attributes (`width=`, `bgcolor=`).
    Attributes,
    Rule { selector_text: String },
    Keyframe { key_text: String },
}

/// `@media` rule a style sits in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MediaInfo {
    /// Query list without the `@media` keyword.
    pub text: String,
    pub range: Option<SourceRange>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StyleInfo {
    pub id: StyleId,
    pub kind: StyleKind,
    pub origin: StyleOrigin,
    pub sheet: Option<StyleSheetId>,
    /// Range of the declaration block.
    pub range: Option<SourceRange>,
    /// Range of the selector or key text.
    pub header_range: Option<SourceRange>,
    pub media: Option<MediaInfo>,
}

impl StyleInfo {
    /// Whether declarations of this style may be edited.
    pub fn is_editable(&self) -> bool {
        match self.kind {
            StyleKind::Inline => true,
            StyleKind::Attributes => false,
            StyleKind::Rule { .. } | StyleKind::Keyframe { .. } => {
                self.sheet.is_some()
                    && self.range.is_some()
                    && !matches!(self.origin, StyleOrigin::UserAgent | StyleOrigin::Injected)
            }
        }
    }

    pub fn selector_text(&self) -> Option<&str> {
        match &self.kind {
            StyleKind::Rule { selector_text } => Some(selector_text),
            StyleKind::Keyframe { key_text } => Some(key_text),
            StyleKind::Inline | StyleKind::Attributes => None,
        }
    }
}

/// The element a style applies to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NodeInfo {
    pub id: NodeId,
    pub tag_name: String,
    pub element_id: Option<String>,
    pub classes: Vec<String>,
    pub is_svg: bool,
    pub parent: Option<NodeId>,
    /// Set when the selected node is a pseudo element such as `before`.
    pub pseudo_type: Option<String>,
}

impl NodeInfo {
    /// Selector that picks this node out: `tag#id`, else `tag.class…`, else `tag`.
    pub fn simple_selector(&self) -> String {
        let tag = self.tag_name.to_ascii_lowercase();
        if let Some(id) = &self.element_id {
            return format!("{tag}#{id}");
        }
        let classes: String = self
            .classes
            .iter()
            .map(|class| format!(".{class}"))
            .collect();
        format!("{tag}{classes}")
    }
}

impl ElementView for NodeInfo {
    fn tag_name(&self) -> &str {
        &self.tag_name
    }

    fn element_id(&self) -> Option<&str> {
        self.element_id.as_deref()
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|own| own == class)
    }
}

/// A style matched for the selected node or one of its ancestors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchedStyle {
    pub style: StyleId,
    /// Node the style was matched for; differs from the selected node for
    /// inherited styles.
    pub node: NodeId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PseudoStyles {
    /// Pseudo element name without colons.
    pub pseudo: String,
    pub styles: Vec<StyleId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyframesStyles {
    pub name: String,
    pub keyframes: Vec<StyleId>,
}

/// Snapshot of the cascade for the selected node, highest priority first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchedStyles {
    pub node: NodeInfo,
    /// Parent first, root last.
    pub ancestors: Vec<NodeInfo>,
    /// Own styles first, then each ancestor's, nearest ancestor first.
    pub node_styles: Vec<MatchedStyle>,
    pub pseudo_styles: Vec<PseudoStyles>,
    pub keyframes: Vec<KeyframesStyles>,
}

impl MatchedStyles {
    /// Node a style was matched for.
    pub fn node_for_style(&self, style: StyleId) -> Option<NodeId> {
        self.node_styles
            .iter()
            .find(|matched| matched.style == style)
            .map(|matched| matched.node)
    }

    /// Whether the style belongs to an ancestor of the selected node.
    pub fn is_inherited(&self, style: StyleId) -> bool {
        self.node_for_style(style)
            .is_some_and(|node| node != self.node.id)
    }

    /// The selected node or one of its ancestors.
    pub fn node_info(&self, node: NodeId) -> Option<&NodeInfo> {
        if node == self.node.id {
            return Some(&self.node);
        }
        self.ancestors.iter().find(|ancestor| ancestor.id == node)
    }

    pub fn has_matched_styles(&self) -> bool {
        !self.node_styles.is_empty()
            || self.pseudo_styles.iter().any(|pseudo| !pseudo.styles.is_empty())
    }
}

/// Whether a declaration takes effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PropertyState {
    Active,
    Overloaded,
}

/// One variation axis of a font face.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VariationAxis {
    pub tag: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FontFace {
    pub family: String,
    pub axes: Vec<VariationAxis>,
}

/// Backend holding the real cascade.
///
/// Queries are synchronous reads of the last fetched state; everything that
/// round-trips to the style engine is async. Implementations serialize their
/// own mutations, the inspector only awaits them.
#[allow(
    async_fn_in_trait,
    reason = "The inspector runs on a single-threaded executor, futures need not be Send"
)]
pub trait CascadeModel {
    /// Fetch the cascade for the selected node; `None` when nothing is selected.
    async fn fetch_matched_styles(&mut self) -> Option<MatchedStyles>;

    fn style(&self, style: StyleId) -> Option<StyleInfo>;

    /// Declarations as written, one per source declaration.
    fn leading_declarations(&self, style: StyleId) -> Vec<Declaration>;

    /// Longhand expansion of a shorthand declaration; empty for longhands.
    fn longhands(&self, declaration: &Declaration) -> Vec<Declaration>;

    /// `None` for styles outside the node cascade, such as keyframes.
    fn property_state(&self, declaration: &Declaration) -> Option<PropertyState>;

    /// Whether the declaration wins among same-named ones in its own style.
    fn is_active_in_style(&self, declaration: &Declaration) -> bool;

    /// Value with every `var()` substituted.
    fn compute_value(&self, style: StyleId, value: &str) -> Option<String>;

    fn compute_variable(&self, style: StyleId, name: &str) -> Option<String>;

    fn compute_single_variable(&self, style: StyleId, text: &str) -> Option<ResolvedVariable>;

    /// Custom property names visible from a style.
    fn available_variables(&self, style: StyleId) -> Vec<String>;

    fn computed_style(&self, node: NodeId) -> Option<ComputedStyle>;

    fn font_faces(&self) -> Vec<FontFace>;

    /// Drop cached active-property results after a priority change.
    fn reset_active_properties(&mut self);

    /// Replace (`overwrite`) or insert the declaration at `index` with `text`.
    ///
    /// Atomic: on `false` nothing changed.
    async fn set_declaration_text(
        &mut self,
        style: StyleId,
        index: usize,
        text: &str,
        major: bool,
        overwrite: bool,
    ) -> bool;

    async fn set_disabled(&mut self, style: StyleId, index: usize, disabled: bool) -> bool;

    /// Insert a rule into a sheet at `location`; returns the new style.
    async fn add_rule(
        &mut self,
        sheet: StyleSheetId,
        rule_text: &str,
        location: SourceRange,
    ) -> Option<StyleId>;

    async fn set_selector_text(&mut self, style: StyleId, text: &str) -> bool;

    async fn set_key_text(&mut self, style: StyleId, text: &str) -> bool;

    /// Replace the query of the `@media` rule around `style`.
    ///
    /// Every rule in that block sees the new text.
    async fn set_media_text(&mut self, style: StyleId, text: &str) -> bool;

    /// Whether a (possibly re-selected) rule matches the selected node.
    fn rule_matches_node(&self, style: StyleId) -> bool;

    /// Sheet used for rules created from the pane, created on demand.
    async fn inspector_stylesheet(&mut self) -> Option<StyleSheetId>;

    /// Range covering the end of a sheet's text.
    fn stylesheet_end(&self, sheet: StyleSheetId) -> Option<SourceRange>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebase_moves_following_ranges_only() {
        let mut before = SourceRange::new(0, 0, 0, 5);
        let mut after = SourceRange::new(2, 4, 3, 1);
        let old = SourceRange::new(1, 0, 2, 2);
        let new = SourceRange::new(1, 0, 1, 7);
        before.rebase(old, new);
        after.rebase(old, new);
        assert_eq!(before, SourceRange::new(0, 0, 0, 5));
        assert_eq!(after, SourceRange::new(1, 9, 2, 1));
    }

    #[test]
    fn simple_selector_prefers_id() {
        let mut node = NodeInfo {
            id: NodeId(1),
            tag_name: "DIV".to_owned(),
            element_id: None,
            classes: vec!["a".to_owned(), "b".to_owned()],
            is_svg: false,
            parent: None,
            pseudo_type: None,
        };
        assert_eq!(node.simple_selector(), "div.a.b");
        node.element_id = Some("main".to_owned());
        assert_eq!(node.simple_selector(), "div#main");
    }
}
