//! Rule sections.
//!
//! A [`SectionModel`] shows one style: a matched rule, an inline style, a
//! keyframe, or a blank rule still waiting for its selector. It owns the
//! top-level property rows of that style; longhands nest under their
//! shorthand rows.

use crate::config::InspectorConfig;
use crate::model::{
    CascadeModel, ComputedStyle, FontFace, NodeId, NodeInfo, SourceRange, StyleId, StyleInfo,
    StyleKind, StyleOrigin, StyleSheetEdit, StyleSheetId,
};
use crate::property::{PropertyNode, RowContext};
use css_cascade::parse_selector_list;
use log::debug;
use regex::Regex;
use serde::Serialize;

/// Arena handle of a section inside the pane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SectionId(pub usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SectionVariant {
    Regular,
    /// A rule that exists only once its selector is committed.
    Blank {
        sheet: StyleSheetId,
        location: SourceRange,
        /// Flips once, when the rule has been created.
        normal: bool,
    },
    Keyframe,
}

/// Everything a section reads while rendering its rows.
pub struct SectionEnv<'ctx, M> {
    pub model: &'ctx M,
    pub computed: Option<&'ctx ComputedStyle>,
    pub parent_computed: Option<&'ctx ComputedStyle>,
    pub font_faces: &'ctx [FontFace],
    pub config: &'ctx InspectorConfig,
    /// Selected node followed by its ancestors.
    pub chain: &'ctx [NodeInfo],
}

/// Text produced by the copy actions of a section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CopiedRule {
    pub all_declaration_text: String,
    pub rule_text: String,
}

/// One rule in the pane.
#[derive(Clone, Debug)]
pub struct SectionModel {
    id: SectionId,
    style: Option<StyleId>,
    info: Option<StyleInfo>,
    variant: SectionVariant,
    /// Node the style was matched for.
    node: NodeId,
    /// The style belongs to an ancestor of the selected node.
    inherited: bool,
    pub(crate) properties: Vec<PropertyNode>,
    original_properties_count: usize,
    max_properties: usize,
    force_show_all: bool,
    hidden_count: usize,
    font_properties: Vec<usize>,
    hidden: bool,
    selector_text: String,
    /// Selector text before editing started.
    selector_edit: Option<String>,
    /// The rule's selector does not match the selected node.
    no_affect: bool,
    /// Pseudo element the rule targets.
    pseudo: Option<String>,
    /// One flag per selector in the list: does it match the node.
    matching_selectors: Vec<bool>,
    /// Media text before editing started.
    media_edit: Option<String>,
}

impl SectionModel {
    /// Section for an existing style.
    pub fn new<M: CascadeModel>(
        id: SectionId,
        info: StyleInfo,
        node: &NodeInfo,
        inherited: bool,
        pseudo: Option<&str>,
        env: &SectionEnv<'_, M>,
    ) -> Self {
        let variant = if matches!(info.kind, StyleKind::Keyframe { .. }) {
            SectionVariant::Keyframe
        } else {
            SectionVariant::Regular
        };
        let original_properties_count = env.model.leading_declarations(info.id).len();
        let selector_text = header_text(&info, node, inherited);
        let mut section = Self {
            id,
            style: Some(info.id),
            info: Some(info),
            variant,
            node: node.id,
            inherited,
            properties: Vec::new(),
            original_properties_count,
            max_properties: env.config.max_properties,
            force_show_all: false,
            hidden_count: 0,
            font_properties: Vec::new(),
            hidden: false,
            selector_text,
            selector_edit: None,
            no_affect: false,
            pseudo: pseudo.map(ToOwned::to_owned),
            matching_selectors: Vec::new(),
            media_edit: None,
        };
        section.mark_matching_selectors(env);
        section.populate(env);
        section
    }

    /// Blank section for a rule to be inserted at `location` in `sheet`.
    pub fn blank(
        id: SectionId,
        default_selector: &str,
        node: NodeId,
        sheet: StyleSheetId,
        location: SourceRange,
        max_properties: usize,
    ) -> Self {
        Self {
            id,
            style: None,
            info: None,
            variant: SectionVariant::Blank {
                sheet,
                location,
                normal: false,
            },
            node,
            inherited: false,
            properties: Vec::new(),
            original_properties_count: 0,
            max_properties,
            force_show_all: false,
            hidden_count: 0,
            font_properties: Vec::new(),
            hidden: false,
            selector_text: default_selector.to_owned(),
            selector_edit: None,
            no_affect: false,
            pseudo: None,
            matching_selectors: Vec::new(),
            media_edit: None,
        }
    }

    pub const fn id(&self) -> SectionId {
        self.id
    }

    pub const fn style(&self) -> Option<StyleId> {
        self.style
    }

    pub const fn info(&self) -> Option<&StyleInfo> {
        self.info.as_ref()
    }

    pub const fn variant(&self) -> &SectionVariant {
        &self.variant
    }

    pub const fn node(&self) -> NodeId {
        self.node
    }

    pub const fn is_inherited(&self) -> bool {
        self.inherited
    }

    pub fn properties(&self) -> &[PropertyNode] {
        &self.properties
    }

    pub fn property(&self, index: usize) -> Option<&PropertyNode> {
        self.properties.get(index)
    }

    pub(crate) fn property_mut(&mut self, index: usize) -> Option<&mut PropertyNode> {
        self.properties.get_mut(index)
    }

    /// Rows left out by the display cap.
    pub const fn hidden_count(&self) -> usize {
        self.hidden_count
    }

    /// Label of the "show all" affordance, if it is shown.
    pub fn show_all_label(&self) -> Option<String> {
        (self.hidden_count > 0).then(|| format!("Show All Properties ({} more)", self.hidden_count))
    }

    /// Rows whose value registered with the section font editor.
    pub fn font_properties(&self) -> &[usize] {
        &self.font_properties
    }

    pub const fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn selector_text(&self) -> &str {
        &self.selector_text
    }

    pub const fn is_editing_selector(&self) -> bool {
        self.selector_edit.is_some()
    }

    pub const fn no_affect(&self) -> bool {
        self.no_affect
    }

    /// Per selector of the rule's list, whether it matches the node; empty for non-rules.
    pub fn matching_selectors(&self) -> &[bool] {
        &self.matching_selectors
    }

    /// Query of the enclosing `@media` rule, shown above the selector.
    pub fn media_text(&self) -> Option<&str> {
        self.info
            .as_ref()
            .and_then(|info| info.media.as_ref())
            .map(|media| media.text.as_str())
    }

    pub const fn is_editing_media(&self) -> bool {
        self.media_edit.is_some()
    }

    /// Still waiting for the first selector commit.
    pub const fn is_blank(&self) -> bool {
        matches!(self.variant, SectionVariant::Blank { normal: false, .. })
    }

    pub const fn is_keyframe(&self) -> bool {
        matches!(self.variant, SectionVariant::Keyframe)
    }

    /// Whether rows and header may be edited.
    pub fn is_editable(&self) -> bool {
        if self.is_blank() {
            return true;
        }
        self.info.as_ref().is_some_and(StyleInfo::is_editable)
    }

    /// Whether the header is a selector or key text rather than a label.
    pub fn has_selector(&self) -> bool {
        self.is_blank()
            || self.info.as_ref().is_some_and(|info| {
                matches!(info.kind, StyleKind::Rule { .. } | StyleKind::Keyframe { .. })
            })
    }

    pub(crate) fn row_context<'ctx, M: CascadeModel>(&self, env: &SectionEnv<'ctx, M>) -> RowContext<'ctx, M> {
        RowContext {
            model: env.model,
            computed: env.computed,
            parent_computed: env.parent_computed,
            font_faces: env.font_faces,
            indent: &env.config.indent,
            section_inherited: self.inherited,
            keyframe: self.is_keyframe(),
        }
    }

    /// Rebuild the rows from the style's leading declarations.
    pub fn populate<M: CascadeModel>(&mut self, env: &SectionEnv<'_, M>) {
        self.properties.clear();
        self.font_properties.clear();
        self.hidden_count = 0;
        let Some(style) = self.style else {
            return;
        };
        let context = self.row_context(env);
        let user_agent = self
            .info
            .as_ref()
            .is_some_and(|info| info.origin == StyleOrigin::UserAgent);
        let declarations = env.model.leading_declarations(style);
        let total = declarations.len();
        let cap = self.max_properties + total.saturating_sub(self.original_properties_count);
        let mut count = 0;
        for declaration in declarations {
            if !self.force_show_all && count >= cap {
                break;
            }
            count += 1;
            let inherited = context.shown_inherited(&declaration.name);
            if user_agent && inherited {
                continue;
            }
            let is_shorthand = !env.model.longhands(&declaration).is_empty();
            let overloaded = context.is_overloaded(&declaration);
            let mut row = PropertyNode::new(declaration, is_shorthand, inherited, overloaded, false);
            if row.update_title(&context) {
                self.font_properties.push(self.properties.len());
            }
            self.properties.push(row);
        }
        self.hidden_count = total - count;
    }

    /// Refresh header and rows; `full` repopulates, otherwise only overload marks change.
    pub fn update<M: CascadeModel>(&mut self, full: bool, env: &SectionEnv<'_, M>) {
        if let Some(style) = self.style
            && let Some(info) = env.model.style(style)
        {
            if self.selector_edit.is_none()
                && let Some(text) = info.selector_text()
            {
                text.clone_into(&mut self.selector_text);
            }
            self.no_affect = matches!(info.kind, StyleKind::Rule { .. })
                && !self.inherited
                && !env.model.rule_matches_node(style);
            self.info = Some(info);
            self.mark_matching_selectors(env);
        }
        if full {
            self.populate(env);
            return;
        }
        let context = self.row_context(env);
        for row in &mut self.properties {
            row.set_overloaded(context.is_overloaded(row.declaration()));
            for index in 0..row.children().len() {
                if let Some(child) = row.child_mut(index) {
                    child.set_overloaded(context.is_overloaded(child.declaration()));
                }
            }
        }
    }

    /// Re-render rows whose `var()` values changed, except `edited`.
    pub fn update_var_functions<M: CascadeModel>(&mut self, edited: Option<usize>, env: &SectionEnv<'_, M>) {
        let context = self.row_context(env);
        for (index, row) in self.properties.iter_mut().enumerate() {
            if Some(index) != edited && !row.is_editing() {
                row.update_title_if_computed_value_changed(&context);
            }
        }
    }

    pub fn show_all<M: CascadeModel>(&mut self, env: &SectionEnv<'_, M>) {
        self.force_show_all = true;
        self.populate(env);
    }

    /// Insert an uncommitted row at `position` (end when `None`).
    pub fn add_blank_property(&mut self, position: Option<usize>, total_declarations: usize) -> Option<usize> {
        let style = self.style?;
        let position = position.unwrap_or(self.properties.len()).min(self.properties.len());
        // Past the last shown row the declaration goes right after it, ahead of hidden ones.
        let index = match self.properties.get(position) {
            Some(row) => row.declaration().index,
            None if self.hidden_count > 0 => self
                .properties
                .last()
                .map_or(0, |row| row.declaration().index + 1),
            None => total_declarations,
        };
        self.properties.insert(position, PropertyNode::blank(style, index));
        Some(position)
    }

    /// Drop a row and pull later declaration indices back by one.
    pub(crate) fn remove_property(&mut self, position: usize, shift_later: bool) -> Option<PropertyNode> {
        if position >= self.properties.len() {
            return None;
        }
        let removed = self.properties.remove(position);
        self.font_properties.retain(|row| *row != position);
        for row in &mut self.font_properties {
            if *row > position {
                *row -= 1;
            }
        }
        if shift_later {
            self.shift_indices_after(removed.declaration().index, false, None);
        }
        Some(removed)
    }

    /// Move declaration indices of rows at or after `from` by one.
    pub(crate) fn shift_indices_after(&mut self, from: usize, forward: bool, skip: Option<usize>) {
        for (position, row) in self.properties.iter_mut().enumerate() {
            if Some(position) != skip && row.declaration().index >= from && !row.is_new() {
                row.shift_index(forward);
            }
        }
    }

    /// First non-inherited row at or after / before `position`.
    pub fn find_sibling(&self, position: usize, forward: bool) -> Option<usize> {
        if forward {
            (position + 1..self.properties.len())
                .find(|candidate| self.properties.get(*candidate).is_some_and(|row| !row.is_inherited()))
        } else {
            (0..position)
                .rev()
                .find(|candidate| self.properties.get(*candidate).is_some_and(|row| !row.is_inherited()))
        }
    }

    /// Mark filter matches; returns whether the section stays visible.
    pub fn update_filter<M: CascadeModel>(&mut self, regex: Option<&Regex>, env: &SectionEnv<'_, M>) -> bool {
        if regex.is_some() && self.hidden_count > 0 {
            self.show_all(env);
        }
        let context = self.row_context(env);
        let mut has_matching_row = false;
        for row in &mut self.properties {
            has_matching_row |= row.update_filter(regex, &context);
        }
        let hide = !has_matching_row && regex.is_some_and(|pattern| !pattern.is_match(&self.text_content()));
        self.hidden = hide;
        !hide
    }

    /// Header and row text as shown.
    fn text_content(&self) -> String {
        let mut text = self.selector_text.clone();
        for row in &self.properties {
            text.push('\n');
            text.push_str(&format!("{}: {};", row.name(), row.value()));
        }
        text
    }

    pub(crate) fn begin_selector_edit(&mut self) -> bool {
        if !self.is_editable() || !self.has_selector() {
            return false;
        }
        self.selector_edit = Some(self.selector_text.clone());
        true
    }

    /// Leave selector editing, returning the text it started from.
    pub(crate) fn end_selector_edit(&mut self) -> Option<String> {
        self.selector_edit.take()
    }

    pub(crate) fn set_selector_text(&mut self, text: &str) {
        text.clone_into(&mut self.selector_text);
    }

    pub(crate) fn begin_media_edit(&mut self) -> bool {
        if self.is_blank() || !self.is_editable() {
            return false;
        }
        let Some(text) = self.media_text().map(ToOwned::to_owned) else {
            return false;
        };
        self.media_edit = Some(text);
        true
    }

    /// Leave media editing, returning the text it started from.
    pub(crate) fn end_media_edit(&mut self) -> Option<String> {
        self.media_edit.take()
    }

    /// Match each selector of the list against the node the style was matched for.
    fn mark_matching_selectors<M>(&mut self, env: &SectionEnv<'_, M>) {
        self.matching_selectors.clear();
        let Some(StyleKind::Rule { selector_text }) = self.info.as_ref().map(|info| &info.kind) else {
            return;
        };
        let Some(start) = env.chain.iter().position(|node| node.id == self.node) else {
            return;
        };
        let chain = env.chain.get(start..).unwrap_or_default();
        let list = parse_selector_list(selector_text);
        let matching = list.matching_indices(chain, self.pseudo.as_deref());
        self.matching_selectors = (0..list.selectors.len())
            .map(|index| matching.contains(&index))
            .collect();
    }

    /// Turn a blank section into a regular one backed by `info`.
    pub(crate) fn make_normal(&mut self, info: StyleInfo, matches_node: bool) {
        if let SectionVariant::Blank { normal, .. } = &mut self.variant {
            *normal = true;
        }
        debug!("blank section {} now backs style {}", self.id.0, info.id.0);
        self.style = Some(info.id);
        if let Some(text) = info.selector_text() {
            text.clone_into(&mut self.selector_text);
        }
        self.info = Some(info);
        self.no_affect = !matches_node;
    }

    /// Shift ranges after an edit to the style sheet text.
    pub fn style_sheet_edited(&mut self, edit: &StyleSheetEdit) {
        let Some(info) = self.info.as_mut() else {
            return;
        };
        if info.sheet != Some(edit.sheet) {
            return;
        }
        for range in [info.range.as_mut(), info.header_range.as_mut()].into_iter().flatten() {
            range.rebase(edit.old, edit.new);
        }
        for row in &mut self.properties {
            if let Some(range) = row.declaration.range.as_mut() {
                range.rebase(edit.old, edit.new);
            }
        }
    }

    /// Copy text of the whole rule and of its declarations.
    pub fn format_leading_properties<M: CascadeModel>(&self, model: &M, indent: &str) -> CopiedRule {
        let lines: Vec<String> = self
            .style
            .map(|style| model.leading_declarations(style))
            .unwrap_or_default()
            .iter()
            .map(|declaration| {
                if declaration.disabled {
                    format!("{indent}/* {}: {}; */", declaration.name, declaration.value)
                } else {
                    format!("{indent}{}: {};", declaration.name, declaration.value)
                }
            })
            .collect();
        let all_declaration_text = lines.join("\n");
        let rule_text = format!("{} {{\n{all_declaration_text}\n}}", self.selector_text);
        CopiedRule {
            all_declaration_text,
            rule_text,
        }
    }

    /// Where "insert style rule below" puts its rule.
    pub fn rule_end(&self) -> Option<(StyleSheetId, SourceRange)> {
        match &self.variant {
            SectionVariant::Blank { sheet, location, .. } if self.info.is_none() => {
                Some((*sheet, *location))
            }
            SectionVariant::Regular | SectionVariant::Keyframe | SectionVariant::Blank { .. } => {
                let info = self.info.as_ref()?;
                Some((info.sheet?, info.range?.collapse_to_end()))
            }
        }
    }
}

/// Header label of a style.
pub fn header_text(info: &StyleInfo, node: &NodeInfo, inherited: bool) -> String {
    match &info.kind {
        StyleKind::Inline if inherited => "Style Attribute".to_owned(),
        StyleKind::Inline => "element.style".to_owned(),
        StyleKind::Attributes => format!("{}[Attributes Style]", node.tag_name),
        StyleKind::Rule { selector_text } => selector_text.clone(),
        StyleKind::Keyframe { key_text } => key_text.clone(),
    }
}

/// Text prepended to a new rule so it does not touch the previous one.
pub fn rule_prefix(location: SourceRange) -> &'static str {
    if location.start_line == 0 && location.start_column == 0 {
        ""
    } else {
        "\n\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_prefix_only_at_origin_is_empty() {
        assert_eq!(rule_prefix(SourceRange::collapsed(0, 0)), "");
        assert_eq!(rule_prefix(SourceRange::collapsed(3, 1)), "\n\n");
    }

    #[test]
    fn blank_section_waits_for_selector() {
        let section = SectionModel::blank(
            SectionId(0),
            "div#main",
            NodeId(0),
            StyleSheetId(0),
            SourceRange::collapsed(0, 0),
            50,
        );
        assert!(section.is_blank());
        assert!(section.is_editable());
        assert!(section.has_selector());
        assert_eq!(section.style(), None);
        assert_eq!(section.selector_text(), "div#main");
    }
}
