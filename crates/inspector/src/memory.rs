//! In-memory [`CascadeModel`].
//!
//! Keeps a small element tree, style sheets and inline styles, and answers
//! cascade queries with the `css_cascade` priority rules. Every mutation is
//! recorded so callers can assert on what reached the backend, and failures
//! can be injected to exercise rollback paths.

use crate::metadata;
use crate::model::{
    CascadeModel, ComputedStyle, Declaration, FontFace, KeyframesStyles, MatchedStyle,
    MatchedStyles, MediaInfo, NodeId, NodeInfo, PropertyState, PseudoStyles, SourceRange, StyleId,
    StyleInfo, StyleKind, StyleOrigin, StyleSheetId,
};
use css_cascade::{
    CascadePriority, Origin, SelectorList, Specificity, compare_priority, is_inherited_property,
    longhands_of, parse_selector_list,
};
use css_syntax::{Rule, parse_declaration_text, parse_stylesheet};
use css_variables::{
    CustomProperties, ResolvedVariable, is_custom_property, resolve_single_variable,
    resolve_vars_in_value,
};
use log::debug;
use core::mem;
use std::collections::{BTreeSet, HashMap};

/// Shorthands whose four longhands follow the top/right/bottom/left value rule.
const BOX_SHORTHANDS: &[&str] = &[
    "margin",
    "padding",
    "inset",
    "border-width",
    "border-style",
    "border-color",
    "border-radius",
];

const BORDER_STYLES: &[&str] = &[
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];

/// A call that reached the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    SetDeclarationText {
        style: StyleId,
        index: usize,
        text: String,
        major: bool,
        overwrite: bool,
        success: bool,
    },
    SetDisabled {
        style: StyleId,
        index: usize,
        disabled: bool,
        success: bool,
    },
    AddRule {
        sheet: StyleSheetId,
        rule_text: String,
        style: Option<StyleId>,
    },
    SetSelectorText {
        style: StyleId,
        text: String,
        success: bool,
    },
    SetKeyText {
        style: StyleId,
        text: String,
        success: bool,
    },
    SetMediaText {
        style: StyleId,
        text: String,
        success: bool,
    },
}

#[derive(Clone, Debug)]
struct MemoryNode {
    info: NodeInfo,
    inline: Option<StyleId>,
    computed_overrides: ComputedStyle,
}

#[derive(Clone, Debug)]
struct MemoryStyle {
    info: StyleInfo,
    declarations: Vec<css_syntax::Declaration>,
    cascade_origin: Origin,
    selectors: Option<SelectorList>,
    /// Owning element of an inline style.
    owner_node: Option<NodeId>,
    /// Index into the cascade's `@media` rules.
    media_rule: Option<usize>,
    order: u32,
}

#[derive(Clone, Debug)]
struct MemorySheet {
    id: StyleSheetId,
    origin: StyleOrigin,
    cascade_origin: Origin,
    /// First free line after the last rule.
    end_line: u32,
    keyframes: Vec<(String, Vec<StyleId>)>,
}

/// Reference backend holding the whole cascade in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryCascade {
    nodes: Vec<MemoryNode>,
    styles: Vec<MemoryStyle>,
    sheets: Vec<MemorySheet>,
    selected: Option<NodeId>,
    font_faces: Vec<FontFace>,
    failures_remaining: usize,
    mutations: Vec<Mutation>,
    active_resets: usize,
    fetches: usize,
    inspector_sheet: Option<StyleSheetId>,
    /// Media queries never filter rules out, there is no viewport to test them against.
    media_rules: Vec<MediaInfo>,
}

/// Declaration currently winning a longhand.
#[derive(Clone, Debug)]
struct Winner {
    /// Cascade level, lower wins.
    level: usize,
    priority: CascadePriority,
    style: StyleId,
    index: usize,
    value: String,
}

/// Cascade context a style takes part in.
enum Participation {
    /// Level 0 is the selected node, higher levels are ancestors.
    Node(usize),
    Pseudo(String),
}

impl MemoryCascade {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element; `parent` must already exist.
    pub fn add_element(
        &mut self,
        parent: Option<NodeId>,
        tag_name: &str,
        element_id: Option<&str>,
        classes: &[&str],
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let tag = tag_name.to_ascii_lowercase();
        let is_svg = matches!(
            tag.as_str(),
            "svg" | "path" | "circle" | "rect" | "g" | "line" | "polygon" | "ellipse"
        );
        self.nodes.push(MemoryNode {
            info: NodeInfo {
                id,
                tag_name: tag,
                element_id: element_id.map(ToOwned::to_owned),
                classes: classes.iter().map(|class| (*class).to_owned()).collect(),
                is_svg,
                parent,
                pseudo_type: None,
            },
            inline: None,
            computed_overrides: ComputedStyle::new(),
        });
        id
    }

    /// Set the `style` attribute of an element. Unparseable text yields an empty style.
    pub fn set_inline_style(&mut self, node: NodeId, text: &str) -> StyleId {
        let declarations = parse_declaration_text(text).unwrap_or_default();
        let id = StyleId(self.styles.len() as u32);
        self.styles.push(MemoryStyle {
            info: StyleInfo {
                id,
                kind: StyleKind::Inline,
                origin: StyleOrigin::Regular,
                sheet: None,
                range: Some(SourceRange::collapsed(0, 0)),
                header_range: None,
                media: None,
            },
            declarations,
            cascade_origin: Origin::Author,
            selectors: None,
            owner_node: Some(node),
            media_rule: None,
            order: id.0,
        });
        if let Some(entry) = self.nodes.get_mut(node.0 as usize) {
            entry.inline = Some(id);
        }
        id
    }

    /// Parse and register a style sheet.
    pub fn add_stylesheet(&mut self, origin: StyleOrigin, css: &str) -> StyleSheetId {
        let id = StyleSheetId(self.sheets.len() as u32);
        let cascade_origin = match origin {
            StyleOrigin::UserAgent => Origin::UserAgent,
            StyleOrigin::Injected => Origin::User,
            StyleOrigin::Inspector | StyleOrigin::Regular => Origin::Author,
        };
        self.sheets.push(MemorySheet {
            id,
            origin,
            cascade_origin,
            end_line: 0,
            keyframes: Vec::new(),
        });
        self.append_rules(id, css, 0);
        id
    }

    /// Select the node the next fetch reports on.
    pub fn select(&mut self, node: NodeId) {
        self.selected = Some(node);
    }

    /// Force a computed value, as layout-dependent values cannot be derived here.
    pub fn set_computed(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(entry) = self.nodes.get_mut(node.0 as usize) {
            entry
                .computed_overrides
                .insert(name.to_owned(), value.to_owned());
        }
    }

    pub fn add_font_face(&mut self, face: FontFace) {
        self.font_faces.push(face);
    }

    /// Make the next `count` mutations fail without changing anything.
    pub fn fail_next_mutations(&mut self, count: usize) {
        self.failures_remaining = count;
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// Number of declaration text mutations recorded so far.
    pub fn text_mutation_count(&self) -> usize {
        self.mutations
            .iter()
            .filter(|mutation| matches!(mutation, Mutation::SetDeclarationText { .. }))
            .count()
    }

    pub fn active_property_resets(&self) -> usize {
        self.active_resets
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    /// Declarations of a style serialized the way a sheet would hold them.
    pub fn style_text(&self, style: StyleId) -> String {
        self.style_entry(style)
            .map(|entry| {
                entry
                    .declarations
                    .iter()
                    .map(css_syntax::Declaration::to_css_text)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default()
    }

    /// Style ids of the rules in a sheet, in source order.
    pub fn sheet_styles(&self, sheet: StyleSheetId) -> Vec<StyleId> {
        self.styles
            .iter()
            .filter(|entry| entry.info.sheet == Some(sheet))
            .map(|entry| entry.info.id)
            .collect()
    }

    fn append_rules(&mut self, sheet: StyleSheetId, css: &str, first_line: u32) -> Vec<StyleId> {
        let parsed = parse_stylesheet(css);
        let mut created = Vec::new();
        for rule in parsed.rules {
            match rule {
                Rule::Style(style_rule) => {
                    created.push(self.push_style_rule(sheet, &style_rule, first_line, None));
                }
                Rule::Media(media_rule) => {
                    let line = first_line + media_rule.start.line;
                    let column = media_rule.start.column + "@media ".len() as u32;
                    let media = self.media_rules.len();
                    self.media_rules.push(MediaInfo {
                        range: Some(SourceRange::new(
                            line,
                            column,
                            line,
                            column + media_rule.query.len() as u32,
                        )),
                        text: media_rule.query,
                    });
                    for style_rule in &media_rule.rules {
                        created.push(self.push_style_rule(sheet, style_rule, first_line, Some(media)));
                    }
                }
                Rule::Keyframes(keyframes_rule) => {
                    let mut keyframes = Vec::new();
                    for keyframe in &keyframes_rule.keyframes {
                        keyframes.push(self.push_rule(
                            sheet,
                            StyleKind::Keyframe {
                                key_text: keyframe.prelude.clone(),
                            },
                            keyframe,
                            first_line,
                            None,
                        ));
                    }
                    if let Some(entry) = self.sheets.get_mut(sheet.0 as usize) {
                        entry.keyframes.push((keyframes_rule.name, keyframes));
                    }
                }
            }
        }
        let line_count = css.lines().count() as u32;
        if let Some(entry) = self.sheets.get_mut(sheet.0 as usize) {
            entry.end_line = entry.end_line.max(first_line + line_count);
        }
        created
    }

    fn push_style_rule(
        &mut self,
        sheet: StyleSheetId,
        rule: &css_syntax::StyleRule,
        first_line: u32,
        media_rule: Option<usize>,
    ) -> StyleId {
        let kind = StyleKind::Rule {
            selector_text: rule.prelude.clone(),
        };
        self.push_rule(sheet, kind, rule, first_line, media_rule)
    }

    fn push_rule(
        &mut self,
        sheet: StyleSheetId,
        kind: StyleKind,
        rule: &css_syntax::StyleRule,
        first_line: u32,
        media_rule: Option<usize>,
    ) -> StyleId {
        let id = StyleId(self.styles.len() as u32);
        let (origin, cascade_origin) = self
            .sheets
            .get(sheet.0 as usize)
            .map_or((StyleOrigin::Regular, Origin::Author), |entry| {
                (entry.origin, entry.cascade_origin)
            });
        let selectors = match &kind {
            StyleKind::Rule { selector_text } => Some(parse_selector_list(selector_text)),
            StyleKind::Inline | StyleKind::Attributes | StyleKind::Keyframe { .. } => None,
        };
        let start_line = first_line + rule.start.line;
        let header_end = rule.start.column + rule.prelude.len() as u32;
        self.styles.push(MemoryStyle {
            info: StyleInfo {
                id,
                kind,
                origin,
                sheet: Some(sheet),
                range: Some(SourceRange::new(
                    start_line,
                    header_end,
                    first_line + rule.end.line,
                    rule.end.column,
                )),
                header_range: Some(SourceRange::new(
                    start_line,
                    rule.start.column,
                    start_line,
                    header_end,
                )),
                media: None,
            },
            declarations: rule.declarations.clone(),
            cascade_origin,
            selectors,
            owner_node: None,
            media_rule,
            order: id.0,
        });
        id
    }

    fn style_entry(&self, style: StyleId) -> Option<&MemoryStyle> {
        self.styles.get(style.0 as usize)
    }

    fn node_info(&self, node: NodeId) -> Option<&NodeInfo> {
        self.nodes.get(node.0 as usize).map(|entry| &entry.info)
    }

    /// `node` followed by its ancestors.
    fn ancestor_chain(&self, node: NodeId) -> Vec<NodeInfo> {
        let mut chain = Vec::new();
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            let Some(info) = self.node_info(current) else {
                break;
            };
            chain.push(info.clone());
            cursor = info.parent;
        }
        chain
    }

    fn take_failure(&mut self) -> bool {
        if self.failures_remaining == 0 {
            return false;
        }
        self.failures_remaining -= 1;
        true
    }

    /// Specificity under which a style applies to `node`, if it does.
    fn applicable_specificity(
        &self,
        entry: &MemoryStyle,
        node: NodeId,
        pseudo: Option<&str>,
    ) -> Option<Specificity> {
        match &entry.info.kind {
            StyleKind::Inline | StyleKind::Attributes => {
                (pseudo.is_none() && entry.owner_node == Some(node)).then_some(Specificity(0, 0, 0))
            }
            StyleKind::Rule { .. } => entry
                .selectors
                .as_ref()?
                .matching_specificity(&self.ancestor_chain(node), pseudo),
            StyleKind::Keyframe { .. } => None,
        }
    }

    fn priority(
        &self,
        entry: &MemoryStyle,
        node: NodeId,
        pseudo: Option<&str>,
        important: bool,
        index: usize,
    ) -> Option<CascadePriority> {
        let specificity = self.applicable_specificity(entry, node, pseudo)?;
        Some(CascadePriority {
            origin: entry.cascade_origin,
            important,
            inline: matches!(entry.info.kind, StyleKind::Inline),
            specificity,
            source_order: entry.order * 10_000 + index as u32,
        })
    }

    /// Styles applying to `node`, highest priority first.
    fn styles_for(&self, node: NodeId, pseudo: Option<&str>) -> Vec<StyleId> {
        let mut matched: Vec<(StyleId, CascadePriority)> = self
            .styles
            .iter()
            .filter_map(|entry| {
                self.priority(entry, node, pseudo, false, 0)
                    .map(|priority| (entry.info.id, priority))
            })
            .collect();
        matched.sort_by(|(_, left), (_, right)| compare_priority(right, left));
        matched.into_iter().map(|(id, _)| id).collect()
    }

    fn pseudo_names(&self) -> BTreeSet<String> {
        self.styles
            .iter()
            .filter_map(|entry| entry.selectors.as_ref())
            .flat_map(|list| list.selectors.iter())
            .filter_map(|selector| selector.pseudo_element().map(ToOwned::to_owned))
            .collect()
    }

    fn participation(&self, style: StyleId) -> Option<Participation> {
        let selected = self.selected?;
        let chain = self.ancestor_chain(selected);
        for (level, node) in chain.iter().enumerate() {
            if self.styles_for(node.id, None).contains(&style) {
                return Some(Participation::Node(level));
            }
        }
        self.pseudo_names()
            .into_iter()
            .find(|pseudo| self.styles_for(selected, Some(pseudo)).contains(&style))
            .map(Participation::Pseudo)
    }

    /// Longhand names and values a declaration sets.
    fn expanded(declaration: &css_syntax::Declaration) -> Vec<(String, String)> {
        if longhands_of(&declaration.name).is_empty() {
            return vec![(declaration.name.clone(), declaration.value.clone())];
        }
        expand_shorthand(&declaration.name, &declaration.value)
    }

    /// Winning `(style, index)` per longhand for a set of cascade levels.
    fn winners(
        &self,
        levels: &[(NodeId, Vec<StyleId>, bool)],
        pseudo: Option<&str>,
    ) -> HashMap<String, Winner> {
        let mut winners: HashMap<String, Winner> = HashMap::new();
        for (level, (node, styles, inherited_only)) in levels.iter().enumerate() {
            for style in styles {
                let Some(entry) = self.style_entry(*style) else {
                    continue;
                };
                for (index, declaration) in entry.declarations.iter().enumerate() {
                    if declaration.disabled || !declaration_parsed_ok(declaration) {
                        continue;
                    }
                    let Some(priority) =
                        self.priority(entry, *node, pseudo, declaration.important, index)
                    else {
                        continue;
                    };
                    for (longhand, value) in Self::expanded(declaration) {
                        if *inherited_only && !is_inherited_property(&longhand) {
                            continue;
                        }
                        let replace = winners.get(&longhand).is_none_or(|current| {
                            level < current.level
                                || (level == current.level
                                    && compare_priority(&priority, &current.priority).is_gt())
                        });
                        if replace {
                            winners.insert(
                                longhand,
                                Winner {
                                    level,
                                    priority,
                                    style: *style,
                                    index,
                                    value,
                                },
                            );
                        }
                    }
                }
            }
        }
        winners
    }

    fn node_levels(&self, selected: NodeId) -> Vec<(NodeId, Vec<StyleId>, bool)> {
        self.ancestor_chain(selected)
            .into_iter()
            .enumerate()
            .map(|(level, node)| (node.id, self.styles_for(node.id, None), level > 0))
            .collect()
    }

    /// Custom properties visible on `node`, inherited ones included.
    fn custom_properties_for(&self, node: NodeId, pseudo: Option<&str>) -> CustomProperties {
        let mut levels = vec![(node, self.styles_for(node, None), false)];
        if let Some(pseudo_name) = pseudo {
            levels.insert(0, (node, self.styles_for(node, Some(pseudo_name)), false));
        }
        let mut properties = self
            .node_info(node)
            .and_then(|info| info.parent)
            .map(|parent| self.custom_properties_for(parent, None))
            .unwrap_or_default();
        let own = if pseudo.is_some() {
            let own_pseudo = self.winners(&levels[..1], pseudo);
            let mut merged = self.winners(&levels[1..], None);
            merged.extend(own_pseudo);
            merged
        } else {
            self.winners(&levels, None)
        };
        for (name, winner) in own {
            if is_custom_property(&name) {
                properties.insert(name, winner.value);
            }
        }
        properties
    }

    /// Node and pseudo element whose variables a style sees.
    fn variable_scope(&self, style: StyleId) -> Option<(NodeId, Option<String>)> {
        let selected = self.selected?;
        Some(match self.participation(style) {
            Some(Participation::Node(level)) => {
                let node = self
                    .ancestor_chain(selected)
                    .get(level)
                    .map_or(selected, |info| info.id);
                (node, None)
            }
            Some(Participation::Pseudo(pseudo)) => (selected, Some(pseudo)),
            None => (selected, None),
        })
    }

    fn variables_for_style(&self, style: StyleId) -> CustomProperties {
        self.variable_scope(style)
            .map(|(node, pseudo)| self.custom_properties_for(node, pseudo.as_deref()))
            .unwrap_or_default()
    }

    fn to_declaration(
        entry: &MemoryStyle,
        index: usize,
        declaration: &css_syntax::Declaration,
    ) -> Declaration {
        let base_line = entry.info.range.map_or(0, |range| range.start_line);
        let line = base_line + index as u32 + 1;
        let text_len = declaration.to_css_text().len() as u32;
        Declaration {
            name: declaration.name.clone(),
            value: declaration.value.clone(),
            important: declaration.important,
            disabled: declaration.disabled,
            parsed_ok: declaration_parsed_ok(declaration),
            implicit: false,
            index,
            owner_style: entry.info.id,
            range: Some(SourceRange::new(line, 2, line, 2 + text_len)),
        }
    }

    fn referenced_animations(&self, selected: NodeId) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for style in self.styles_for(selected, None) {
            let Some(entry) = self.style_entry(style) else {
                continue;
            };
            for declaration in &entry.declarations {
                if declaration.disabled
                    || !matches!(declaration.name.as_str(), "animation" | "animation-name")
                {
                    continue;
                }
                names.extend(
                    declaration
                        .value
                        .split([',', ' '])
                        .filter(|word| !word.is_empty())
                        .map(ToOwned::to_owned),
                );
            }
        }
        names
    }
}

fn declaration_parsed_ok(declaration: &css_syntax::Declaration) -> bool {
    metadata::is_known_property(&declaration.name)
        && (is_custom_property(&declaration.name)
            || metadata::is_valid_value(&declaration.name, &declaration.value))
}

/// Split at top-level whitespace, keeping function arguments together.
fn split_components(value: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for character in value.chars() {
        match character {
            '(' => depth = depth.saturating_add(1),
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if character.is_whitespace() && depth == 0 {
            if !current.is_empty() {
                parts.push(mem::take(&mut current));
            }
        } else {
            current.push(character);
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Longhand values of a shorthand, `initial` where the value leaves one out.
pub fn expand_shorthand(name: &str, value: &str) -> Vec<(String, String)> {
    let longhands = longhands_of(name);
    let components = split_components(value);
    let lower = value.trim().to_ascii_lowercase();
    if metadata::GLOBAL_KEYWORDS.contains(&lower.as_str()) || lower.contains("var(") {
        return longhands
            .iter()
            .map(|longhand| (longhand.clone(), value.trim().to_owned()))
            .collect();
    }
    if BOX_SHORTHANDS.contains(&name) && longhands.len() == 4 {
        let pick = |position: usize| -> String {
            let index = match (components.len(), position) {
                (1, _) | (2, 0 | 2) | (3, 0) => 0,
                (2 | 3, 1 | 3) => 1,
                (3, 2) => 2,
                _ => position,
            };
            components
                .get(index)
                .cloned()
                .unwrap_or_else(|| "initial".to_owned())
        };
        return longhands
            .iter()
            .enumerate()
            .map(|(position, longhand)| (longhand.clone(), pick(position)))
            .collect();
    }
    let by_category = longhands.iter().all(|longhand| {
        longhand.ends_with("-width") || longhand.ends_with("-style") || longhand.ends_with("-color")
    });
    if by_category {
        let mut width = None;
        let mut style = None;
        let mut color = None;
        for component in &components {
            let lower_component = component.to_ascii_lowercase();
            if BORDER_STYLES.contains(&lower_component.as_str()) {
                style = Some(component.clone());
            } else if css_color::parse_css_color(component).is_some() {
                color = Some(component.clone());
            } else {
                width = Some(component.clone());
            }
        }
        return longhands
            .iter()
            .map(|longhand| {
                let picked = if longhand.ends_with("-width") {
                    &width
                } else if longhand.ends_with("-style") {
                    &style
                } else {
                    &color
                };
                (
                    longhand.clone(),
                    picked.clone().unwrap_or_else(|| "initial".to_owned()),
                )
            })
            .collect();
    }
    longhands
        .iter()
        .enumerate()
        .map(|(position, longhand)| {
            (
                longhand.clone(),
                components
                    .get(position)
                    .cloned()
                    .unwrap_or_else(|| "initial".to_owned()),
            )
        })
        .collect()
}

impl CascadeModel for MemoryCascade {
    async fn fetch_matched_styles(&mut self) -> Option<MatchedStyles> {
        self.fetches += 1;
        let selected = self.selected?;
        let node = self.node_info(selected)?.clone();
        let mut node_styles = Vec::new();
        let chain = self.ancestor_chain(selected);
        for (level, ancestor) in chain.iter().enumerate() {
            for style in self.styles_for(ancestor.id, None) {
                let has_inherited = self.style_entry(style).is_some_and(|entry| {
                    entry
                        .declarations
                        .iter()
                        .any(|declaration| is_inherited_property(&declaration.name))
                });
                if level == 0 || has_inherited {
                    node_styles.push(MatchedStyle {
                        style,
                        node: ancestor.id,
                    });
                }
            }
        }
        let pseudo_styles = self
            .pseudo_names()
            .into_iter()
            .map(|pseudo| PseudoStyles {
                styles: self.styles_for(selected, Some(&pseudo)),
                pseudo,
            })
            .filter(|pseudo| !pseudo.styles.is_empty())
            .collect();
        let referenced = self.referenced_animations(selected);
        let keyframes = self
            .sheets
            .iter()
            .flat_map(|sheet| sheet.keyframes.iter())
            .filter(|(name, _)| referenced.contains(name))
            .map(|(name, keyframes)| KeyframesStyles {
                name: name.clone(),
                keyframes: keyframes.clone(),
            })
            .collect();
        debug!("memory cascade fetched styles for node {}", selected.0);
        Some(MatchedStyles {
            node,
            ancestors: chain.into_iter().skip(1).collect(),
            node_styles,
            pseudo_styles,
            keyframes,
        })
    }

    fn style(&self, style: StyleId) -> Option<StyleInfo> {
        self.style_entry(style).map(|entry| StyleInfo {
            media: entry
                .media_rule
                .and_then(|media| self.media_rules.get(media))
                .cloned(),
            ..entry.info.clone()
        })
    }

    fn leading_declarations(&self, style: StyleId) -> Vec<Declaration> {
        self.style_entry(style)
            .map(|entry| {
                entry
                    .declarations
                    .iter()
                    .enumerate()
                    .map(|(index, declaration)| Self::to_declaration(entry, index, declaration))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn longhands(&self, declaration: &Declaration) -> Vec<Declaration> {
        if longhands_of(&declaration.name).is_empty() {
            return Vec::new();
        }
        expand_shorthand(&declaration.name, &declaration.value)
            .into_iter()
            .map(|(name, value)| Declaration {
                name,
                value,
                important: declaration.important,
                disabled: declaration.disabled,
                parsed_ok: true,
                implicit: true,
                index: declaration.index,
                owner_style: declaration.owner_style,
                range: None,
            })
            .collect()
    }

    fn property_state(&self, declaration: &Declaration) -> Option<PropertyState> {
        let selected = self.selected?;
        let entry = self.style_entry(declaration.owner_style)?;
        if matches!(entry.info.kind, StyleKind::Keyframe { .. }) {
            return None;
        }
        let winners = match self.participation(declaration.owner_style)? {
            Participation::Node(_) => self.winners(&self.node_levels(selected), None),
            Participation::Pseudo(pseudo) => self.winners(
                &[(selected, self.styles_for(selected, Some(&pseudo)), false)],
                Some(&pseudo),
            ),
        };
        let names: Vec<String> = if declaration.implicit || longhands_of(&declaration.name).is_empty() {
            vec![declaration.name.clone()]
        } else {
            longhands_of(&declaration.name).to_vec()
        };
        let active = names.iter().any(|name| {
            winners.get(name).is_some_and(|winner| {
                winner.style == declaration.owner_style && winner.index == declaration.index
            })
        });
        Some(if active {
            PropertyState::Active
        } else {
            PropertyState::Overloaded
        })
    }

    fn is_active_in_style(&self, declaration: &Declaration) -> bool {
        let Some(entry) = self.style_entry(declaration.owner_style) else {
            return false;
        };
        entry
            .declarations
            .iter()
            .enumerate()
            .filter(|(_, candidate)| {
                candidate.name == declaration.name
                    && !candidate.disabled
                    && declaration_parsed_ok(candidate)
            })
            .max_by_key(|(index, candidate)| (candidate.important, *index))
            .is_some_and(|(index, _)| index == declaration.index)
    }

    fn compute_value(&self, style: StyleId, value: &str) -> Option<String> {
        let variables = self.variables_for_style(style);
        let lookup = |name: &str| variables.get(name).cloned();
        resolve_vars_in_value(value, &lookup)
    }

    fn compute_variable(&self, style: StyleId, name: &str) -> Option<String> {
        let variables = self.variables_for_style(style);
        let raw = variables.get(name)?;
        let lookup = |inner: &str| variables.get(inner).cloned();
        resolve_vars_in_value(raw, &lookup)
    }

    fn compute_single_variable(&self, style: StyleId, text: &str) -> Option<ResolvedVariable> {
        let variables = self.variables_for_style(style);
        let lookup = |name: &str| variables.get(name).cloned();
        resolve_single_variable(text, &lookup)
    }

    fn available_variables(&self, style: StyleId) -> Vec<String> {
        let mut names: Vec<String> = self.variables_for_style(style).into_keys().collect();
        names.sort();
        names
    }

    fn computed_style(&self, node: NodeId) -> Option<ComputedStyle> {
        let info = self.node_info(node)?;
        let mut computed: ComputedStyle = info
            .parent
            .and_then(|parent| self.computed_style(parent))
            .unwrap_or_default()
            .into_iter()
            .filter(|(name, _)| is_inherited_property(name))
            .collect();
        let variables = self.custom_properties_for(node, None);
        let lookup = |name: &str| variables.get(name).cloned();
        let own = self.winners(&[(node, self.styles_for(node, None), false)], None);
        for (name, winner) in own {
            let resolved = resolve_vars_in_value(&winner.value, &lookup).unwrap_or(winner.value);
            computed.insert(name, resolved);
        }
        if let Some(entry) = self.nodes.get(node.0 as usize) {
            computed.extend(entry.computed_overrides.clone());
        }
        Some(computed)
    }

    fn font_faces(&self) -> Vec<FontFace> {
        self.font_faces.clone()
    }

    fn reset_active_properties(&mut self) {
        self.active_resets += 1;
    }

    async fn set_declaration_text(
        &mut self,
        style: StyleId,
        index: usize,
        text: &str,
        major: bool,
        overwrite: bool,
    ) -> bool {
        let failed = self.take_failure();
        let parsed = if failed {
            None
        } else {
            parse_declaration_text(text).ok()
        };
        let success = match (parsed, self.styles.get_mut(style.0 as usize)) {
            (Some(declarations), Some(entry)) if entry.info.is_editable() => {
                let at = index.min(entry.declarations.len());
                if overwrite && at < entry.declarations.len() {
                    entry.declarations.splice(at..=at, declarations);
                } else {
                    entry.declarations.splice(at..at, declarations);
                }
                true
            }
            _ => false,
        };
        debug!("set_declaration_text({}, {index}, {text:?}) -> {success}", style.0);
        self.mutations.push(Mutation::SetDeclarationText {
            style,
            index,
            text: text.to_owned(),
            major,
            overwrite,
            success,
        });
        success
    }

    async fn set_disabled(&mut self, style: StyleId, index: usize, disabled: bool) -> bool {
        let failed = self.take_failure();
        let success = !failed
            && self
                .styles
                .get_mut(style.0 as usize)
                .filter(|entry| entry.info.is_editable())
                .and_then(|entry| entry.declarations.get_mut(index))
                .map(|declaration| declaration.disabled = disabled)
                .is_some();
        self.mutations.push(Mutation::SetDisabled {
            style,
            index,
            disabled,
            success,
        });
        success
    }

    async fn add_rule(
        &mut self,
        sheet: StyleSheetId,
        rule_text: &str,
        location: SourceRange,
    ) -> Option<StyleId> {
        let created = if self.take_failure() || self.sheets.get(sheet.0 as usize).is_none() {
            None
        } else {
            self.append_rules(sheet, rule_text, location.start_line)
                .first()
                .copied()
        };
        self.mutations.push(Mutation::AddRule {
            sheet,
            rule_text: rule_text.to_owned(),
            style: created,
        });
        created
    }

    async fn set_selector_text(&mut self, style: StyleId, text: &str) -> bool {
        let failed = self.take_failure();
        let selectors = parse_selector_list(text);
        let success = !failed
            && !selectors.selectors.is_empty()
            && self
                .styles
                .get_mut(style.0 as usize)
                .filter(|entry| matches!(entry.info.kind, StyleKind::Rule { .. }))
                .map(|entry| {
                    entry.info.kind = StyleKind::Rule {
                        selector_text: text.trim().to_owned(),
                    };
                    entry.selectors = Some(selectors);
                })
                .is_some();
        self.mutations.push(Mutation::SetSelectorText {
            style,
            text: text.to_owned(),
            success,
        });
        success
    }

    async fn set_key_text(&mut self, style: StyleId, text: &str) -> bool {
        let failed = self.take_failure();
        let valid = text.split(',').all(|key| {
            let key = key.trim().to_ascii_lowercase();
            key == "from"
                || key == "to"
                || key
                    .strip_suffix('%')
                    .and_then(|number| number.parse::<f32>().ok())
                    .is_some_and(|number| (0.0..=100.0).contains(&number))
        });
        let success = !failed
            && valid
            && self
                .styles
                .get_mut(style.0 as usize)
                .filter(|entry| matches!(entry.info.kind, StyleKind::Keyframe { .. }))
                .map(|entry| {
                    entry.info.kind = StyleKind::Keyframe {
                        key_text: text.trim().to_owned(),
                    };
                })
                .is_some();
        self.mutations.push(Mutation::SetKeyText {
            style,
            text: text.to_owned(),
            success,
        });
        success
    }

    async fn set_media_text(&mut self, style: StyleId, text: &str) -> bool {
        let failed = self.take_failure();
        let query = text.trim();
        let valid = !query.is_empty() && !query.contains(['{', '}', ';']);
        let media = self.style_entry(style).and_then(|entry| entry.media_rule);
        let success = !failed
            && valid
            && media
                .and_then(|index| self.media_rules.get_mut(index))
                .map(|rule| {
                    query.clone_into(&mut rule.text);
                    if let Some(range) = rule.range.as_mut() {
                        range.end_column = range.start_column + query.len() as u32;
                    }
                })
                .is_some();
        self.mutations.push(Mutation::SetMediaText {
            style,
            text: text.to_owned(),
            success,
        });
        success
    }

    fn rule_matches_node(&self, style: StyleId) -> bool {
        let Some(selected) = self.selected else {
            return false;
        };
        self.style_entry(style)
            .is_some_and(|entry| self.applicable_specificity(entry, selected, None).is_some())
    }

    async fn inspector_stylesheet(&mut self) -> Option<StyleSheetId> {
        if self.inspector_sheet.is_none() {
            self.inspector_sheet = Some(self.add_stylesheet(StyleOrigin::Inspector, ""));
        }
        self.inspector_sheet
    }

    fn stylesheet_end(&self, sheet: StyleSheetId) -> Option<SourceRange> {
        self.sheets
            .iter()
            .find(|entry| entry.id == sheet)
            .map(|entry| SourceRange::collapsed(entry.end_line, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_shorthand_follows_side_rules() {
        let expanded = expand_shorthand("margin", "1px 2px 3px");
        let values: Vec<&str> = expanded.iter().map(|(_, value)| value.as_str()).collect();
        assert_eq!(values, vec!["1px", "2px", "3px", "2px"]);
    }

    #[test]
    fn border_components_are_classified() {
        let expanded = expand_shorthand("border-top", "solid red 2px");
        assert_eq!(
            expanded,
            vec![
                ("border-top-width".to_owned(), "2px".to_owned()),
                ("border-top-style".to_owned(), "solid".to_owned()),
                ("border-top-color".to_owned(), "red".to_owned()),
            ]
        );
    }

    #[test]
    fn missing_positions_are_initial() {
        let expanded = expand_shorthand("flex-flow", "column");
        assert_eq!(expanded.get(1).map(|(_, value)| value.as_str()), Some("initial"));
    }
}
