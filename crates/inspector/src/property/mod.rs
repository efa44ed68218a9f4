//! Property rows.
//!
//! A [`PropertyNode`] wraps one declaration of a section's style. Shorthands
//! grow one generation of read-only longhand children on first expand. The
//! row keeps its rendered tokens, state flags and warnings up to date from
//! the backend; edits are driven by the pane through [`editing`].

pub mod editing;
pub mod throttle;
pub mod tokens;

use crate::error::{FontVariationWarning, InspectorError, RowWarning};
use crate::icon_resolver::{IconInfo, find_icon};
use crate::metadata;
use crate::model::{CascadeModel, ComputedStyle, Declaration, FontFace, PropertyState, StyleId};
use crate::renderer::EnabledHandlers;
use crate::section::SectionId;
use css_cascade::is_inherited_property;
use editing::{EditField, EditSession};
use regex::Regex;
use serde::Serialize;
use throttle::ApplyThrottler;
use tokens::{RenderedToken, render_row_value, rendered_value_text};

/// Handle of a row: section, top-level position, and longhand position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct PropertyPath {
    pub section: SectionId,
    pub index: usize,
    pub child: Option<usize>,
}

impl PropertyPath {
    pub const fn new(section: SectionId, index: usize) -> Self {
        Self {
            section,
            index,
            child: None,
        }
    }

    #[must_use]
    pub const fn longhand(self, child: usize) -> Self {
        Self {
            child: Some(child),
            ..self
        }
    }

    #[must_use]
    pub const fn top_level(self) -> Self {
        Self {
            child: None,
            ..self
        }
    }
}

/// Visual state of a row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RowFlags {
    pub implicit: bool,
    pub has_ignorable_error: bool,
    pub inherited: bool,
    pub overloaded: bool,
    pub disabled: bool,
    /// Loses to a same-named declaration of its own style.
    pub inactive: bool,
    pub not_parsed_ok: bool,
}

/// Read access a row needs while rendering.
pub struct RowContext<'ctx, M> {
    pub model: &'ctx M,
    pub computed: Option<&'ctx ComputedStyle>,
    pub parent_computed: Option<&'ctx ComputedStyle>,
    pub font_faces: &'ctx [FontFace],
    pub indent: &'ctx str,
    /// The section shows an ancestor's style.
    pub section_inherited: bool,
    /// Keyframe rows skip cascade state.
    pub keyframe: bool,
}

impl<M: CascadeModel> RowContext<'_, M> {
    /// Whether a row of this section is drawn as inherited.
    ///
    /// Inside an ancestor's section the meaning flips: properties that really
    /// inherit are drawn normally and the rest are dimmed.
    pub fn shown_inherited(&self, name: &str) -> bool {
        self.section_inherited && !is_inherited_property(name)
    }

    pub fn is_overloaded(&self, declaration: &Declaration) -> bool {
        !self.keyframe && self.model.property_state(declaration) == Some(PropertyState::Overloaded)
    }
}

/// One declaration row.
#[derive(Clone, Debug)]
pub struct PropertyNode {
    pub(crate) declaration: Declaration,
    is_shorthand: bool,
    longhand: bool,
    inherited: bool,
    overloaded: bool,
    pub(crate) new_property: bool,
    expanded: bool,
    expanded_due_to_filter: bool,
    children: Vec<PropertyNode>,
    children_populated: bool,
    tokens: Vec<RenderedToken>,
    flags: RowFlags,
    warnings: Vec<RowWarning>,
    icon: Option<IconInfo>,
    filter_match: bool,
    last_computed_value: Option<String>,
    /// Texts of the name and value spans, diverging from the declaration while editing.
    pub(crate) name_text: String,
    pub(crate) value_text: String,
    pub(crate) edit: Option<EditSession>,
    pub(crate) edited_incrementally: bool,
    pub(crate) original_property_text: String,
    pub(crate) throttle: ApplyThrottler,
}

impl PropertyNode {
    pub fn new(
        declaration: Declaration,
        is_shorthand: bool,
        inherited: bool,
        overloaded: bool,
        new_property: bool,
    ) -> Self {
        Self {
            name_text: declaration.name.clone(),
            value_text: declaration.value.clone(),
            declaration,
            is_shorthand,
            longhand: false,
            inherited,
            overloaded,
            new_property,
            expanded: false,
            expanded_due_to_filter: false,
            children: Vec::new(),
            children_populated: false,
            tokens: Vec::new(),
            flags: RowFlags::default(),
            warnings: Vec::new(),
            icon: None,
            filter_match: false,
            last_computed_value: None,
            edit: None,
            edited_incrementally: false,
            original_property_text: String::new(),
            throttle: ApplyThrottler::default(),
        }
    }

    /// A fresh row for a declaration about to be typed in.
    pub fn blank(style: StyleId, index: usize) -> Self {
        Self::new(Declaration::blank(style, index), false, false, false, true)
    }

    pub const fn declaration(&self) -> &Declaration {
        &self.declaration
    }

    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    pub fn value(&self) -> &str {
        &self.declaration.value
    }

    pub const fn flags(&self) -> RowFlags {
        self.flags
    }

    pub fn tokens(&self) -> &[RenderedToken] {
        &self.tokens
    }

    pub(crate) fn tokens_mut(&mut self) -> &mut Vec<RenderedToken> {
        &mut self.tokens
    }

    pub fn warnings(&self) -> &[RowWarning] {
        &self.warnings
    }

    pub const fn icon(&self) -> Option<&IconInfo> {
        self.icon.as_ref()
    }

    pub fn children(&self) -> &[Self] {
        &self.children
    }

    pub(crate) fn child_mut(&mut self, index: usize) -> Option<&mut Self> {
        self.children.get_mut(index)
    }

    pub const fn is_shorthand(&self) -> bool {
        self.is_shorthand
    }

    /// Longhand rows nested under a shorthand are read-only.
    pub const fn is_longhand(&self) -> bool {
        self.longhand
    }

    pub const fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub const fn is_new(&self) -> bool {
        self.new_property
    }

    pub const fn is_inherited(&self) -> bool {
        self.inherited
    }

    pub const fn is_overloaded(&self) -> bool {
        self.overloaded
    }

    pub const fn is_editing(&self) -> bool {
        self.edit.is_some()
    }

    pub const fn edit_session(&self) -> Option<&EditSession> {
        self.edit.as_ref()
    }

    pub const fn filter_match(&self) -> bool {
        self.filter_match
    }

    pub const fn edited_incrementally(&self) -> bool {
        self.edited_incrementally
    }

    pub const fn throttle(&self) -> &ApplyThrottler {
        &self.throttle
    }

    pub fn field_text(&self, field: EditField) -> &str {
        match field {
            EditField::Name => &self.name_text,
            EditField::Value => &self.value_text,
        }
    }

    pub(crate) fn set_field_text(&mut self, field: EditField, text: &str) {
        match field {
            EditField::Name => text.clone_into(&mut self.name_text),
            EditField::Value => text.clone_into(&mut self.value_text),
        }
    }

    pub(crate) fn set_overloaded(&mut self, overloaded: bool) {
        self.overloaded = overloaded;
        self.flags.overloaded = overloaded;
    }

    pub(crate) fn set_inherited(&mut self, inherited: bool) {
        self.inherited = inherited;
        self.flags.inherited = inherited;
    }

    /// `name: value` as the tokens currently display it.
    pub fn rendered_property_text(&self) -> String {
        format!("{}: {}", self.declaration.name, rendered_value_text(&self.tokens))
    }

    /// Text copied by "Copy declaration".
    pub fn copy_declaration(&self) -> String {
        self.declaration.property_text()
    }

    pub fn copy_property(&self) -> String {
        self.declaration.name.clone()
    }

    pub fn copy_value(&self) -> String {
        self.declaration.value.clone()
    }

    /// Re-render name, value, flags and warnings from the declaration.
    ///
    /// Returns whether the value holds a font token, so the section can
    /// register the row with its font editor.
    pub fn update_title<M: CascadeModel>(&mut self, context: &RowContext<'_, M>) -> bool {
        let declaration = &self.declaration;
        self.declaration.name.clone_into(&mut self.name_text);
        self.declaration.value.clone_into(&mut self.value_text);
        let ignorable =
            !declaration.parsed_ok && metadata::ignore_errors_for_property(&declaration.name, &declaration.value);
        self.flags = RowFlags {
            implicit: declaration.implicit,
            has_ignorable_error: ignorable,
            inherited: self.inherited,
            overloaded: self.overloaded,
            disabled: declaration.disabled,
            inactive: !self.longhand
                && !declaration.name.is_empty()
                && !context.model.is_active_in_style(declaration),
            not_parsed_ok: !declaration.parsed_ok && !ignorable,
        };

        let enabled = if declaration.parsed_ok {
            EnabledHandlers::all()
        } else {
            EnabledHandlers::none()
        };
        let rendered = render_row_value(
            context.model,
            declaration.owner_style,
            &declaration.name,
            &declaration.value,
            enabled,
            context.indent,
        );
        self.tokens = rendered.tokens;

        self.warnings.clear();
        if self.flags.not_parsed_ok {
            let failure = InspectorError::ParseFailure {
                name: declaration.name.clone(),
                value: declaration.value.clone(),
                unknown_property: !metadata::is_known_property(&declaration.name),
            };
            self.warnings.push(RowWarning::ParseFailure {
                message: failure.to_string(),
            });
        }
        if declaration.name == "font-variation-settings" {
            self.warnings.extend(
                font_variation_warnings(&declaration.value, context.computed, context.font_faces)
                    .into_iter()
                    .map(RowWarning::FontVariationOutOfRange),
            );
        }

        self.icon = if context.keyframe {
            None
        } else {
            find_icon(
                &format!("{}: {}", declaration.name, declaration.value),
                context.computed,
                context.parent_computed,
            )
        };
        self.last_computed_value = context
            .model
            .compute_value(declaration.owner_style, &declaration.value);
        rendered.has_font
    }

    /// Re-render when the value's `var()` substitution changed.
    pub fn update_title_if_computed_value_changed<M: CascadeModel>(
        &mut self,
        context: &RowContext<'_, M>,
    ) -> bool {
        let computed = context
            .model
            .compute_value(self.declaration.owner_style, &self.declaration.value);
        if computed == self.last_computed_value {
            return false;
        }
        self.update_title(context);
        true
    }

    /// Build the longhand children, once.
    pub fn populate_children<M: CascadeModel>(&mut self, context: &RowContext<'_, M>) {
        if !self.is_shorthand || self.children_populated {
            return;
        }
        self.children_populated = true;
        for longhand in context.model.longhands(&self.declaration) {
            let inherited = context.shown_inherited(&longhand.name);
            let overloaded = context.is_overloaded(&longhand);
            let mut child = Self::new(longhand, false, inherited, overloaded, false);
            child.longhand = true;
            child.update_title(context);
            self.children.push(child);
        }
    }

    pub fn expand<M: CascadeModel>(&mut self, context: &RowContext<'_, M>) {
        self.populate_children(context);
        self.expanded = self.is_shorthand;
    }

    pub fn collapse(&mut self) {
        self.expanded = false;
    }

    /// Mark filter matches; shorthands open while a longhand matches.
    pub fn update_filter<M: CascadeModel>(
        &mut self,
        regex: Option<&Regex>,
        context: &RowContext<'_, M>,
    ) -> bool {
        let matches = regex.is_some_and(|pattern| {
            pattern.is_match(&self.declaration.name) || pattern.is_match(&self.declaration.value)
        });
        self.filter_match = matches;
        self.populate_children(context);
        let mut children_match = false;
        for child in &mut self.children {
            children_match |= child.update_filter(regex, context);
        }
        if regex.is_none() {
            if self.expanded_due_to_filter {
                self.collapse();
            }
            self.expanded_due_to_filter = false;
        } else if children_match && !self.expanded {
            self.expand(context);
            self.expanded_due_to_filter = true;
        } else if !children_match && self.expanded && self.expanded_due_to_filter {
            self.collapse();
            self.expanded_due_to_filter = false;
        }
        matches
    }

    /// Enter editing; longhands never do.
    pub(crate) fn begin_edit(&mut self, field: EditField) -> bool {
        if self.longhand {
            return false;
        }
        let has_children = self.is_shorthand;
        let session = EditSession::new(field, &self.declaration, has_children, self.expanded);
        if !self.edited_incrementally {
            self.original_property_text = self.declaration.property_text();
        }
        if !self.new_property {
            self.name_text.clone_from(&self.declaration.name);
            self.value_text.clone_from(&self.declaration.value);
        }
        self.expanded = false;
        self.edit = Some(session);
        true
    }

    /// Leave editing, restoring the expansion state it started with.
    pub(crate) fn end_edit(&mut self) -> Option<EditSession> {
        let session = self.edit.take()?;
        if session.expanded {
            self.expanded = true;
        }
        Some(session)
    }

    /// Point the row at the declaration now at its index.
    pub(crate) fn rebind(&mut self, declaration: Declaration) {
        self.declaration = declaration;
        self.new_property = false;
    }

    pub(crate) fn shift_index(&mut self, forward: bool) {
        let index = &mut self.declaration.index;
        *index = if forward {
            index.saturating_add(1)
        } else {
            index.saturating_sub(1)
        };
        for child in &mut self.children {
            child.declaration.index = self.declaration.index;
        }
    }
}

fn unquote(text: &str) -> &str {
    text.trim().trim_matches(&['"', '\''][..])
}

/// Axis values of `font-variation-settings` outside the matching faces' ranges.
pub fn font_variation_warnings(
    value: &str,
    computed: Option<&ComputedStyle>,
    font_faces: &[FontFace],
) -> Vec<FontVariationWarning> {
    let Some(font_family) = computed.and_then(|style| style.get("font-family")) else {
        return Vec::new();
    };
    if value.trim() == "normal" {
        return Vec::new();
    }
    let families: Vec<&str> = font_family.split(',').map(unquote).collect();
    let settings: Vec<(String, f64)> = value
        .split(',')
        .filter_map(|setting| {
            let mut parts = setting.split_whitespace();
            let tag = unquote(parts.next()?).to_owned();
            let number = parts.next()?.parse::<f64>().ok()?;
            Some((tag, number))
        })
        .collect();
    let mut warnings = Vec::new();
    for (tag, number) in &settings {
        for face in font_faces
            .iter()
            .filter(|face| families.contains(&face.family.as_str()))
        {
            let Some(axis) = face.axes.iter().find(|axis| axis.tag == *tag) else {
                continue;
            };
            if *number < axis.min || *number > axis.max {
                warnings.push(FontVariationWarning {
                    tag: tag.clone(),
                    value: *number,
                    min: axis.min,
                    max: axis.max,
                    family: face.family.clone(),
                });
            }
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VariationAxis;

    #[test]
    fn variation_outside_axis_warns() {
        let mut computed = ComputedStyle::new();
        computed.insert("font-family".to_owned(), "\"Roboto Flex\", sans-serif".to_owned());
        let faces = vec![FontFace {
            family: "Roboto Flex".to_owned(),
            axes: vec![VariationAxis {
                tag: "wght".to_owned(),
                min: 100.0,
                max: 1000.0,
            }],
        }];
        let warnings = font_variation_warnings("\"wght\" 1200, \"wdth\" 50", Some(&computed), &faces);
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings.first().map(ToString::to_string).as_deref(),
            Some(
                "Value for setting \u{201c}wght\u{201d} 1200 is outside the supported range [100, 1000] for font-family \u{201c}Roboto Flex\u{201d}."
            )
        );
        assert!(font_variation_warnings("normal", Some(&computed), &faces).is_empty());
    }

    #[test]
    fn paths_nest_longhands() {
        let path = PropertyPath::new(SectionId(2), 4).longhand(1);
        assert_eq!(path.child, Some(1));
        assert_eq!(path.top_level(), PropertyPath::new(SectionId(2), 4));
    }
}
