//! The styles pane.
//!
//! [`PaneController`] owns every section in an arena indexed by
//! [`SectionId`], the blocks that order them, the single popover slot and
//! the single "editing style" flag. Hosts drive it through the methods here
//! and in the `editing`, `navigation` and `popovers` submodules.

pub mod editing;
pub mod navigation;
pub mod popovers;

use crate::block::{BlockKind, SectionBlock, sort_pseudo_names};
use crate::config::InspectorConfig;
use crate::error::InspectorError;
use crate::idle::{LoadingIndicator, RebuildGeneration, RebuildToken, with_loading_indicator};
use crate::metadata;
use crate::model::{
    CascadeModel, ComputedStyle, Declaration, FontFace, MatchedStyles, NodeId, NodeInfo,
    SourceRange, StyleId, StyleSheetEdit, StyleSheetId,
};
use crate::popover::{AnyPopover, PopoverHelper};
use crate::prompt::{Completion, CompletionRequest, CompletionStyles, completions};
use crate::property::editing::EditField;
use crate::property::{PropertyNode, PropertyPath};
use crate::section::{SectionEnv, SectionId, SectionModel};
use anyhow::Result;
use log::{debug, trace};
use regex::Regex;
use serde::Serialize;
use core::{iter, mem};
use std::sync::Arc;
use tracing::{Instrument as _, info_span};

/// Notifications recorded for the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PaneEvent {
    InitialUpdateCompleted,
    StylesUpdateCompleted { has_matched_styles: bool },
}

/// Overlay request for the hovered row or selector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HighlightRequest {
    pub node: NodeId,
    pub mode: String,
    pub selector_list: Option<String>,
}

/// Where a new rule goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleLocation {
    /// Right after the rule of a section, in the same sheet.
    Below(SectionId),
    /// At the end of a sheet; the inspector's own sheet when `None`.
    StyleSheetEnd(Option<StyleSheetId>),
}

/// Data fetched with the last cascade snapshot.
#[derive(Debug, Default)]
struct PaneCache {
    matched: Option<MatchedStyles>,
    computed: Option<ComputedStyle>,
    parent_computed: Option<ComputedStyle>,
    font_faces: Vec<FontFace>,
    chain: Vec<NodeInfo>,
}

fn section_env<'ctx, M>(
    model: &'ctx M,
    cache: &'ctx PaneCache,
    config: &'ctx InspectorConfig,
) -> SectionEnv<'ctx, M> {
    SectionEnv {
        model,
        computed: cache.computed.as_ref(),
        parent_computed: cache.parent_computed.as_ref(),
        font_faces: &cache.font_faces,
        config,
        chain: &cache.chain,
    }
}

fn slot(sections: &[Option<SectionModel>], id: SectionId) -> Option<&SectionModel> {
    sections.get(id.0).and_then(Option::as_ref)
}

fn slot_mut(sections: &mut [Option<SectionModel>], id: SectionId) -> Option<&mut SectionModel> {
    sections.get_mut(id.0).and_then(Option::as_mut)
}

/// A section to build, in display order.
struct PlannedSection {
    style: StyleId,
    node: NodeId,
    inherited: bool,
}

/// Group a snapshot into blocks: own styles, one block per inheriting
/// ancestor, pseudo elements, then keyframes.
fn plan_blocks(matched: &MatchedStyles) -> Vec<(BlockKind, Vec<PlannedSection>)> {
    let mut blocks = vec![(BlockKind::Own, Vec::new())];
    let mut last_node = matched.node.id;
    for matched_style in &matched.node_styles {
        let inherited = matched_style.node != matched.node.id;
        if inherited && matched_style.node != last_node {
            if let Some(node) = matched.node_info(matched_style.node) {
                blocks.push((BlockKind::Inherited { node: node.clone() }, Vec::new()));
            }
            last_node = matched_style.node;
        }
        if let Some((_, sections)) = blocks.last_mut() {
            sections.push(PlannedSection {
                style: matched_style.style,
                node: matched_style.node,
                inherited,
            });
        }
    }

    let mut pseudo_names: Vec<String> = matched
        .pseudo_styles
        .iter()
        .map(|pseudo| pseudo.pseudo.clone())
        .collect();
    sort_pseudo_names(&mut pseudo_names);
    for name in pseudo_names {
        let styles = matched
            .pseudo_styles
            .iter()
            .filter(|pseudo| pseudo.pseudo == name)
            .flat_map(|pseudo| pseudo.styles.iter())
            .map(|style| PlannedSection {
                style: *style,
                node: matched.node.id,
                inherited: false,
            })
            .collect();
        blocks.push((BlockKind::Pseudo { pseudo: name }, styles));
    }

    for keyframes in &matched.keyframes {
        let styles = keyframes
            .keyframes
            .iter()
            .map(|style| PlannedSection {
                style: *style,
                node: matched.node.id,
                inherited: false,
            })
            .collect();
        blocks.push((
            BlockKind::Keyframes {
                name: keyframes.name.clone(),
            },
            styles,
        ));
    }
    blocks
}

/// Top-level controller of the styles pane.
pub struct PaneController<M, P> {
    model: M,
    popover_helper: P,
    config: InspectorConfig,
    sections: Vec<Option<SectionModel>>,
    blocks: Vec<SectionBlock>,
    cache: PaneCache,
    /// Set while a row, selector or popover edit is open; background refreshes stay away.
    is_editing_style: bool,
    /// Set while the pane itself mutates the backend.
    user_operation: bool,
    filter: Option<Regex>,
    no_matches: bool,
    events: Vec<PaneEvent>,
    popover: Option<AnyPopover>,
    /// Row whose name or value is being edited.
    editing: Option<PropertyPath>,
    focused_section: Option<SectionId>,
    revealed: Option<PropertyPath>,
    generation: Arc<RebuildGeneration>,
    loading: LoadingIndicator,
    initial_update_done: bool,
}

impl<M: CascadeModel, P: PopoverHelper> PaneController<M, P> {
    pub fn new(model: M, popover_helper: P, config: InspectorConfig) -> Self {
        Self {
            model,
            popover_helper,
            config,
            sections: Vec::new(),
            blocks: Vec::new(),
            cache: PaneCache::default(),
            is_editing_style: false,
            user_operation: false,
            filter: None,
            no_matches: false,
            events: Vec::new(),
            popover: None,
            editing: None,
            focused_section: None,
            revealed: None,
            generation: Arc::new(RebuildGeneration::new()),
            loading: LoadingIndicator::default(),
            initial_update_done: false,
        }
    }

    pub const fn model(&self) -> &M {
        &self.model
    }

    pub const fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub const fn popover_helper(&self) -> &P {
        &self.popover_helper
    }

    pub const fn config(&self) -> &InspectorConfig {
        &self.config
    }

    pub fn section(&self, id: SectionId) -> Option<&SectionModel> {
        slot(&self.sections, id)
    }

    pub fn blocks(&self) -> &[SectionBlock] {
        &self.blocks
    }

    /// Sections in display order.
    pub fn section_ids(&self) -> Vec<SectionId> {
        self.blocks
            .iter()
            .flat_map(|block| block.sections().iter().copied())
            .filter(|id| self.section(*id).is_some())
            .collect()
    }

    /// Section whose header reads `selector`, first in display order.
    pub fn find_section(&self, selector: &str) -> Option<SectionId> {
        self.section_ids()
            .into_iter()
            .find(|id| self.section(*id).is_some_and(|section| section.selector_text() == selector))
    }

    pub fn property(&self, path: PropertyPath) -> Option<&PropertyNode> {
        let row = self.section(path.section)?.property(path.index)?;
        match path.child {
            Some(child) => row.children().get(child),
            None => Some(row),
        }
    }

    pub(crate) fn property_mut(&mut self, path: PropertyPath) -> Option<&mut PropertyNode> {
        let row = slot_mut(&mut self.sections, path.section)?.property_mut(path.index)?;
        match path.child {
            Some(child) => row.child_mut(child),
            None => Some(row),
        }
    }

    fn require_property(&self, path: PropertyPath) -> Result<&PropertyNode> {
        Ok(self.property(path).ok_or(InspectorError::UnknownProperty(path))?)
    }

    fn require_section(&self, id: SectionId) -> Result<&SectionModel> {
        Ok(self.section(id).ok_or(InspectorError::UnknownSection(id))?)
    }

    pub const fn is_editing_style(&self) -> bool {
        self.is_editing_style
    }

    pub const fn editing_property(&self) -> Option<PropertyPath> {
        self.editing
    }

    pub const fn focused_section(&self) -> Option<SectionId> {
        self.focused_section
    }

    pub const fn revealed_property(&self) -> Option<PropertyPath> {
        self.revealed
    }

    pub const fn no_matches(&self) -> bool {
        self.no_matches
    }

    pub const fn active_popover(&self) -> Option<&AnyPopover> {
        self.popover.as_ref()
    }

    pub fn events(&self) -> &[PaneEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<PaneEvent> {
        mem::take(&mut self.events)
    }

    /// Flag the host polls to draw the loading affordance.
    pub fn loading_indicator(&self) -> LoadingIndicator {
        self.loading.clone()
    }

    /// Handle a host can use to abandon a running rebuild.
    pub fn rebuild_generation(&self) -> Arc<RebuildGeneration> {
        Arc::clone(&self.generation)
    }

    /// Fetch the cascade and rebuild every section.
    pub async fn update(&mut self) -> Result<()> {
        let token = self.generation.begin();
        self.rebuild(token).instrument(info_span!("styles.rebuild")).await
    }

    /// Rebuild even while an edit is open, dropping the open popover.
    pub async fn force_update(&mut self) -> Result<()> {
        self.close_popover();
        self.update().await
    }

    /// Sections are built aside and swapped in whole, so a superseded
    /// rebuild leaves the previous sections in place.
    async fn rebuild(&mut self, token: RebuildToken) -> Result<()> {
        let delay = self.config.loading_indicator_delay();
        let matched =
            with_loading_indicator(self.model.fetch_matched_styles(), delay, &self.loading).await;
        if token.is_cancelled() {
            trace!("dropping superseded cascade snapshot");
            return Ok(());
        }
        let Some(matched) = matched else {
            self.reset_sections(PaneCache::default(), Vec::new(), Vec::new());
            self.finish_update(false);
            return Ok(());
        };
        debug!("rebuilding styles for node {}", matched.node.id.0);
        let mut cache = PaneCache {
            matched: None,
            computed: self.model.computed_style(matched.node.id),
            parent_computed: matched
                .node
                .parent
                .and_then(|parent| self.model.computed_style(parent)),
            font_faces: self.model.font_faces(),
            chain: iter::once(matched.node.clone())
                .chain(matched.ancestors.iter().cloned())
                .collect(),
        };

        let mut sections = Vec::new();
        let mut blocks = Vec::new();
        for (kind, planned) in plan_blocks(&matched) {
            let pseudo = match &kind {
                BlockKind::Pseudo { pseudo } => Some(pseudo.clone()),
                BlockKind::Own => matched.node.pseudo_type.clone(),
                BlockKind::Inherited { .. } | BlockKind::Keyframes { .. } => None,
            };
            let mut block = SectionBlock::new(kind);
            for entry in planned {
                if !token.checkpoint(sections.len(), self.config.idle_batch).await {
                    trace!("rebuild cancelled after {} sections", sections.len());
                    return Ok(());
                }
                let (Some(info), Some(node)) =
                    (self.model.style(entry.style), matched.node_info(entry.node))
                else {
                    continue;
                };
                let id = SectionId(sections.len());
                let env = section_env(&self.model, &cache, &self.config);
                let section = SectionModel::new(id, info, node, entry.inherited, pseudo.as_deref(), &env);
                sections.push(Some(section));
                block.push(id);
            }
            if matches!(block.kind(), BlockKind::Own) || !block.sections().is_empty() {
                blocks.push(block);
            }
        }
        let has_matched_styles = matched.has_matched_styles();
        cache.matched = Some(matched);
        debug!("built {} sections in {} blocks", sections.len(), blocks.len());
        self.reset_sections(cache, sections, blocks);
        self.apply_filter();
        self.finish_update(has_matched_styles);
        Ok(())
    }

    fn reset_sections(
        &mut self,
        cache: PaneCache,
        sections: Vec<Option<SectionModel>>,
        blocks: Vec<SectionBlock>,
    ) {
        self.close_popover();
        self.cache = cache;
        self.sections = sections;
        self.blocks = blocks;
        self.editing = None;
        self.focused_section = None;
        self.is_editing_style = false;
    }

    fn finish_update(&mut self, has_matched_styles: bool) {
        if !self.initial_update_done {
            self.initial_update_done = true;
            self.events.push(PaneEvent::InitialUpdateCompleted);
        }
        self.events
            .push(PaneEvent::StylesUpdateCompleted { has_matched_styles });
    }

    /// Backend notification: a sheet changed, with the edit when known.
    pub async fn on_css_model_changed(&mut self, edit: Option<StyleSheetEdit>) -> Result<()> {
        if let Some(edit) = edit {
            for section in self.sections.iter_mut().flatten() {
                section.style_sheet_edited(&edit);
            }
            return Ok(());
        }
        if self.user_operation || self.is_editing_style {
            trace!("refresh suppressed while editing");
            return Ok(());
        }
        self.update().await
    }

    /// Update overload state everywhere and rebuild `edited` unless an edit is open.
    pub(crate) fn refresh_after_edit(&mut self, edited: SectionId, edited_row: Option<usize>) {
        let env = section_env(&self.model, &self.cache, &self.config);
        let full = !self.is_editing_style;
        for section in self.sections.iter_mut().flatten() {
            if section.is_blank() {
                continue;
            }
            let is_edited = section.id() == edited;
            section.update(is_edited && full, &env);
            section.update_var_functions(if is_edited { edited_row } else { None }, &env);
        }
        self.apply_filter();
    }

    /// Filter by user text, case-insensitively; empty text clears it.
    pub fn set_filter_text(&mut self, text: &str) {
        let regex = if text.is_empty() {
            None
        } else {
            Regex::new(&format!("(?i){}", regex::escape(text))).ok()
        };
        self.filter_regex(regex);
    }

    pub fn filter_regex(&mut self, regex: Option<Regex>) {
        self.filter = regex;
        self.apply_filter();
    }

    fn apply_filter(&mut self) {
        let env = section_env(&self.model, &self.cache, &self.config);
        let regex = self.filter.as_ref();
        for section in self.sections.iter_mut().flatten() {
            section.update_filter(regex, &env);
        }
        let mut any_visible = false;
        for block in &mut self.blocks {
            any_visible |= block.update_filter(regex, self.sections.iter().flatten());
        }
        self.no_matches = regex.is_some() && !any_visible;
    }

    /// Locate the row of a declaration, showing hidden rows if needed.
    pub fn reveal_property(&mut self, declaration: &Declaration) -> Option<PropertyPath> {
        let path = self.find_declaration(declaration).or_else(|| {
            let id = self.section_ids().into_iter().find(|id| {
                self.section(*id)
                    .is_some_and(|section| section.style() == Some(declaration.owner_style))
            })?;
            self.show_all(id);
            self.find_declaration(declaration)
        })?;
        self.revealed = Some(path);
        Some(path)
    }

    fn find_declaration(&self, declaration: &Declaration) -> Option<PropertyPath> {
        self.section_ids().into_iter().find_map(|id| {
            let section = self.section(id)?;
            if section.style() != Some(declaration.owner_style) {
                return None;
            }
            section
                .properties()
                .iter()
                .position(|row| row.declaration().index == declaration.index)
                .map(|index| PropertyPath::new(id, index))
        })
    }

    /// Reveal the first row named like `name` (text after `:` is ignored).
    pub fn jump_to_property(&mut self, name: &str) -> bool {
        let wanted = name
            .split_once(':')
            .map_or(name, |(head, _)| head)
            .trim()
            .to_ascii_lowercase();
        let found = self.section_ids().into_iter().find_map(|id| {
            let section = self.section(id)?;
            section.style().and_then(|style| {
                self.model
                    .leading_declarations(style)
                    .into_iter()
                    .find(|declaration| declaration.name == wanted)
            })
        });
        found.is_some_and(|declaration| self.reveal_property(&declaration).is_some())
    }

    pub fn show_all(&mut self, id: SectionId) {
        let env = section_env(&self.model, &self.cache, &self.config);
        if let Some(section) = slot_mut(&mut self.sections, id) {
            section.show_all(&env);
        }
    }

    pub fn expand(&mut self, path: PropertyPath) -> Result<()> {
        self.require_property(path)?;
        let env = section_env(&self.model, &self.cache, &self.config);
        if let Some(section) = slot_mut(&mut self.sections, path.section) {
            let context = section.row_context(&env);
            if let Some(row) = section.property_mut(path.index) {
                row.expand(&context);
            }
        }
        Ok(())
    }

    pub fn collapse(&mut self, path: PropertyPath) -> Result<()> {
        self.require_property(path)?;
        if let Some(row) = self.property_mut(path.top_level()) {
            row.collapse();
        }
        Ok(())
    }

    /// Comment or uncomment a declaration.
    pub async fn toggle_disabled(&mut self, path: PropertyPath) -> Result<bool> {
        let row = self.require_property(path)?;
        let section = self.require_section(path.section)?;
        if row.is_longhand() || row.is_new() || !section.is_editable() {
            return Ok(false);
        }
        let declaration = row.declaration().clone();
        self.user_operation = true;
        let success = self
            .model
            .set_disabled(declaration.owner_style, declaration.index, !declaration.disabled)
            .await;
        self.user_operation = false;
        debug!(
            "set_disabled({}, {}) -> {success}",
            declaration.name, !declaration.disabled
        );
        if success {
            self.model.reset_active_properties();
            self.refresh_after_edit(path.section, None);
        }
        Ok(success)
    }

    /// Insert a blank rule and start editing its selector.
    pub async fn add_blank_section(&mut self, location: RuleLocation) -> Result<Option<SectionId>> {
        let Some(node) = self.cache.matched.as_ref().map(|matched| matched.node.clone()) else {
            return Ok(None);
        };
        let below = match location {
            RuleLocation::Below(id) => Some(id),
            RuleLocation::StyleSheetEnd(_) => None,
        };
        let rule_end = below
            .and_then(|id| self.section(id))
            .and_then(SectionModel::rule_end);
        let target = if rule_end.is_some() {
            rule_end
        } else {
            self.stylesheet_end_target(location).await
        };
        let Some((sheet, range)) = target else {
            return Ok(None);
        };

        let id = SectionId(self.sections.len());
        let section = SectionModel::blank(
            id,
            &node.simple_selector(),
            node.id,
            sheet,
            range,
            self.config.max_properties,
        );
        self.sections.push(Some(section));
        let anchor = below.or_else(|| {
            self.blocks
                .first()
                .and_then(|block| block.sections().first().copied())
        });
        let block = self
            .blocks
            .iter_mut()
            .find(|block| anchor.is_some_and(|anchor_id| block.contains(anchor_id)));
        if let Some(block) = block {
            block.insert_after(anchor, id);
        } else if let Some(own) = self.blocks.first_mut() {
            own.insert_after(None, id);
        } else {
            let mut own = SectionBlock::new(BlockKind::Own);
            own.push(id);
            self.blocks.push(own);
        }
        self.start_editing_selector(id);
        Ok(Some(id))
    }

    /// End of the requested sheet, or of the inspector's own sheet.
    async fn stylesheet_end_target(
        &mut self,
        location: RuleLocation,
    ) -> Option<(StyleSheetId, SourceRange)> {
        let requested = match location {
            RuleLocation::StyleSheetEnd(sheet) => sheet,
            RuleLocation::Below(_) => None,
        };
        let sheet = if requested.is_some() {
            requested
        } else {
            self.model.inspector_stylesheet().await
        }?;
        let end = self.model.stylesheet_end(sheet)?;
        Some((sheet, end))
    }

    pub(crate) fn remove_section(&mut self, id: SectionId) {
        if let Some(entry) = self.sections.get_mut(id.0) {
            *entry = None;
        }
        for block in &mut self.blocks {
            block.remove(id);
        }
        if self.focused_section == Some(id) {
            self.focused_section = None;
        }
    }

    /// Overlay request for hovering a row; `None` hides the overlay.
    pub fn set_active_property(&self, path: Option<PropertyPath>) -> Option<HighlightRequest> {
        let path = path?;
        let section = self.section(path.section)?;
        let row = self.property(path)?;
        if section.is_keyframe() || row.is_overloaded() || row.is_inherited() {
            return None;
        }
        let mode = metadata::highlight_mode(row.name())?;
        Some(HighlightRequest {
            node: section.node(),
            mode: mode.to_owned(),
            selector_list: None,
        })
    }

    /// Overlay request for hovering a section selector.
    pub fn highlight_selector(&self, id: SectionId) -> Option<HighlightRequest> {
        let section = self.section(id)?;
        if section.is_keyframe() || !section.has_selector() {
            return None;
        }
        Some(HighlightRequest {
            node: section.node(),
            mode: "all".to_owned(),
            selector_list: Some(section.selector_text().to_owned()),
        })
    }

    /// Suggestions for the field being edited.
    pub fn completions(&self, path: PropertyPath, field: EditField, query: &str) -> Vec<Completion> {
        let (Some(section), Some(row)) = (self.section(path.section), self.property(path)) else {
            return Vec::new();
        };
        let Some(style) = section.style() else {
            return Vec::new();
        };
        let node_is_svg = self
            .cache
            .matched
            .as_ref()
            .is_some_and(|matched| matched.node.is_svg);
        let request = CompletionRequest {
            editing_name: field == EditField::Name,
            property_name: row.field_text(EditField::Name),
            query,
            node_is_svg,
            svg_properties_for_html: self.config.svg_properties_for_html,
        };
        let styles = CompletionStyles {
            computed: self.cache.computed.as_ref(),
            parent_computed: self.cache.parent_computed.as_ref(),
        };
        completions(&self.model, style, &request, styles)
    }

    /// Whether the section shows styles of a pseudo element.
    fn is_pseudo_section(&self, id: SectionId) -> bool {
        let selected_is_pseudo = self
            .cache
            .matched
            .as_ref()
            .is_some_and(|matched| matched.node.pseudo_type.is_some());
        selected_is_pseudo
            || self
                .blocks
                .iter()
                .any(|block| matches!(block.kind(), BlockKind::Pseudo { .. }) && block.contains(id))
    }

    fn close_popover(&mut self) {
        if self.popover.take().is_some() {
            self.popover_helper.hide();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchedStyle, NodeInfo, PseudoStyles};

    fn node(id: u32, tag: &str) -> NodeInfo {
        NodeInfo {
            id: NodeId(id),
            tag_name: tag.to_owned(),
            element_id: None,
            classes: Vec::new(),
            is_svg: false,
            parent: None,
            pseudo_type: None,
        }
    }

    #[test]
    fn blocks_follow_owning_ancestor() {
        let matched = MatchedStyles {
            node: node(2, "span"),
            ancestors: vec![node(1, "div"), node(0, "body")],
            node_styles: vec![
                MatchedStyle { style: StyleId(0), node: NodeId(2) },
                MatchedStyle { style: StyleId(1), node: NodeId(1) },
                MatchedStyle { style: StyleId(2), node: NodeId(1) },
                MatchedStyle { style: StyleId(3), node: NodeId(0) },
            ],
            pseudo_styles: vec![
                PseudoStyles { pseudo: "marker".to_owned(), styles: vec![StyleId(4)] },
                PseudoStyles { pseudo: "before".to_owned(), styles: vec![StyleId(5)] },
            ],
            keyframes: Vec::new(),
        };
        let plan = plan_blocks(&matched);
        let shape: Vec<(Option<String>, usize)> = plan
            .iter()
            .map(|(kind, sections)| (SectionBlock::new(kind.clone()).title(), sections.len()))
            .collect();
        assert_eq!(
            shape,
            [
                (None, 1),
                (Some("Inherited from div".to_owned()), 2),
                (Some("Inherited from body".to_owned()), 1),
                (Some("Pseudo ::before element".to_owned()), 1),
                (Some("Pseudo ::marker element".to_owned()), 1),
            ]
        );
    }
}
