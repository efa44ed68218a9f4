//! Row and selector editing.

use super::{PaneController, section_env, slot_mut};
use crate::error::InspectorError;
use crate::model::{CascadeModel, StyleId};
use crate::popover::PopoverHelper;
use crate::property::PropertyPath;
use crate::property::editing::{
    CommitInput, CommitOutcome, Continuation, EditField, KeyAction, KeyInput, MoveDirection,
    ValueModification, continue_after_commit, key_action, modify_value_at, plan_commit,
    split_property_text, terminates_field,
};
use crate::section::{SectionId, SectionVariant, rule_prefix};
use anyhow::Result;
use core::ops::Range;
use log::{debug, trace, warn};
use tracing::{Instrument as _, info_span};

/// How an applied text ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The declaration (or the uncommitted row) is gone.
    Removed,
    /// The backend rejected the text; the row was rolled back.
    Failed,
}

/// Result of a key press inside an edited field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    Committed(Continuation),
    Cancelled,
    Modified(ValueModification),
    Ignored,
}

/// Collapse whitespace runs and terminate with `;`.
fn normalize_style_text(text: &str) -> String {
    let mut normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if !normalized.is_empty() && !normalized.ends_with(';') {
        normalized.push(';');
    }
    normalized
}

impl<M: CascadeModel, P: PopoverHelper> PaneController<M, P> {
    /// Open the name or value of a top-level row for editing.
    pub async fn start_editing(&mut self, path: PropertyPath, field: EditField) -> Result<bool> {
        self.require_property(path)?;
        if let Some(current) = self.editing
            && current != path
        {
            self.commit_editing(None).await?;
        }
        Ok(self.begin_row_edit(path, field))
    }

    fn begin_row_edit(&mut self, path: PropertyPath, field: EditField) -> bool {
        let Some(section) = self.section(path.section) else {
            return false;
        };
        if path.child.is_some() || !section.is_editable() || section.is_blank() {
            return false;
        }
        self.close_popover();
        let Some(row) = self.property_mut(path) else {
            return false;
        };
        if !row.begin_edit(field) {
            return false;
        }
        self.editing = Some(path);
        self.is_editing_style = true;
        self.focused_section = Some(path.section);
        true
    }

    /// The edited field's text changed; values are queued as free-flow edits.
    ///
    /// A name that gained a `:` is committed forward at once.
    pub async fn edit_text_changed(&mut self, text: &str) -> Result<Option<Continuation>> {
        let Some(path) = self.editing else {
            return Ok(None);
        };
        let pseudo = self.is_pseudo_section(path.section);
        let row = self
            .property_mut(path)
            .ok_or(InspectorError::UnknownProperty(path))?;
        let Some(field) = row.edit_session().map(|session| session.field()) else {
            return Ok(None);
        };
        row.set_field_text(field, text);
        if field == EditField::Name {
            if text.contains(':') {
                return Ok(Some(self.commit_editing(Some(MoveDirection::Forward)).await?));
            }
            if row.edited_incrementally && !row.original_property_text.is_empty() {
                let original = row.original_property_text.clone();
                row.throttle.schedule(original, false);
            }
            return Ok(None);
        }
        if text.contains(';') {
            trace!("not applying `{text}` live, it spans several declarations");
            return Ok(None);
        }
        let name = row.field_text(EditField::Name).to_owned();
        let property_text = format!("{name}: {text}");
        let lower = property_text.trim().to_ascii_lowercase();
        if pseudo
            && (name.eq_ignore_ascii_case("content")
                || lower.starts_with("content:")
                || lower == "display: none")
        {
            trace!("skipping free-flow edit of `{name}` on a pseudo element");
            return Ok(None);
        }
        row.throttle.schedule(property_text, false);
        Ok(None)
    }

    /// Apply every queued free-flow edit.
    pub async fn flush_pending_edits(&mut self) -> Result<()> {
        let pending: Vec<PropertyPath> = self
            .sections
            .iter()
            .flatten()
            .flat_map(|section| {
                section
                    .properties()
                    .iter()
                    .enumerate()
                    .filter(|(_, row)| row.throttle().has_pending())
                    .map(|(index, _)| PropertyPath::new(section.id(), index))
                    .collect::<Vec<_>>()
            })
            .collect();
        for path in pending {
            let Some(apply) = self.property_mut(path).and_then(|row| row.throttle.take()) else {
                continue;
            };
            self.apply_style_text(path, &apply.text, apply.major).await?;
        }
        Ok(())
    }

    pub async fn key_down(&mut self, input: KeyInput) -> Result<KeyOutcome> {
        let Some(path) = self.editing else {
            return Ok(KeyOutcome::Ignored);
        };
        let row = self.require_property(path)?;
        let Some(session) = row.edit_session() else {
            return Ok(KeyOutcome::Ignored);
        };
        let editing_name = session.is_editing_name;
        match key_action(&input, editing_name, row.is_new()) {
            KeyAction::Commit(direction) => {
                if let Some(edited) = self.property_mut(path) {
                    edited.set_field_text(session_field(editing_name), &input.text);
                }
                Ok(KeyOutcome::Committed(self.commit_editing(Some(direction)).await?))
            }
            KeyAction::Cancel => {
                self.cancel_editing().await?;
                Ok(KeyOutcome::Cancelled)
            }
            KeyAction::Modify(step) => {
                let name = row.field_text(EditField::Name).to_owned();
                let Some(modification) =
                    modify_value_at(&name, &input.text, input.caret, step, input.modifiers)
                else {
                    return Ok(KeyOutcome::Ignored);
                };
                self.edit_text_changed(&modification.text).await?;
                Ok(KeyOutcome::Modified(modification))
            }
            KeyAction::None => Ok(KeyOutcome::Ignored),
        }
    }

    /// A printable character was typed; `:` and `;` may end the field.
    pub async fn key_press(&mut self, character: char, text: &str, caret: usize) -> Result<Option<Continuation>> {
        let Some(path) = self.editing else {
            return Ok(None);
        };
        let editing_name = self
            .require_property(path)?
            .edit_session()
            .is_some_and(|session| session.is_editing_name);
        if !terminates_field(character, editing_name, text, caret) {
            return Ok(None);
        }
        if let Some(edited) = self.property_mut(path) {
            edited.set_field_text(session_field(editing_name), text);
        }
        Ok(Some(self.commit_editing(Some(MoveDirection::Forward)).await?))
    }

    /// Paste over `selection` of the edited field; `name: value` in the name field fills both.
    pub async fn paste(&mut self, text: &str, selection: Range<usize>) -> Result<Option<Continuation>> {
        let Some(path) = self.editing else {
            return Ok(None);
        };
        let row = self
            .property_mut(path)
            .ok_or(InspectorError::UnknownProperty(path))?;
        let editing_name = row.edit_session().is_some_and(|session| session.is_editing_name);
        let split = split_property_text(text).filter(|_| editing_name);
        let Some((name, value)) = split else {
            let current = row.field_text(session_field(editing_name));
            let start = selection.start.min(current.len());
            let end = selection.end.clamp(start, current.len());
            let (Some(before), Some(after)) = (current.get(..start), current.get(end..)) else {
                return Ok(None);
            };
            let combined = format!("{before}{text}{after}");
            return self.edit_text_changed(&combined).await;
        };
        let original_name = row.field_text(EditField::Name).to_owned();
        let original_value = row.field_text(EditField::Value).to_owned();
        if let Some(session) = row.edit.as_mut() {
            session.remember_original(&original_name, &original_value);
        }
        row.set_field_text(EditField::Name, &name);
        row.set_field_text(EditField::Value, &value);
        Ok(Some(self.commit_editing(Some(MoveDirection::Forward)).await?))
    }

    /// Focus left the field: commit without moving.
    pub async fn blur(&mut self) -> Result<()> {
        if self.editing.is_some() {
            self.commit_editing(None).await?;
        }
        Ok(())
    }

    /// Commit the edited row and move focus as the commit decides.
    pub async fn commit_editing(&mut self, direction: Option<MoveDirection>) -> Result<Continuation> {
        let Some(path) = self.editing.take() else {
            return Ok(Continuation::Done);
        };
        let span = info_span!("styles.commit", section = path.section.0, row = path.index);
        self.commit_row(path, direction).instrument(span).await
    }

    async fn commit_row(&mut self, path: PropertyPath, direction: Option<MoveDirection>) -> Result<Continuation> {
        let sibling = {
            let section = self.require_section(path.section)?;
            match direction {
                Some(MoveDirection::Backward) => section.find_sibling(path.index, false),
                Some(MoveDirection::Forward) | None => section.find_sibling(path.index, true),
            }
        };
        let row = self
            .property_mut(path)
            .ok_or(InspectorError::UnknownProperty(path))?;
        let Some(session) = row.end_edit() else {
            self.is_editing_style = false;
            return Ok(Continuation::Done);
        };
        drop(row.throttle.take());
        let user_input = row.field_text(session.field()).trim().to_owned();
        let already_new = row.is_new();
        let name_text = row.field_text(EditField::Name).to_owned();
        let value_text = row.field_text(EditField::Value).to_owned();
        let plan = plan_commit(&CommitInput {
            user_input: &user_input,
            session: &session,
            direction,
            new_property: already_new,
            name_text: &name_text,
            value_text: &value_text,
            current_name: &name_text,
            current_value: &value_text,
            row: path.index,
            sibling,
        });
        self.is_editing_style = false;

        let applied = if let Some(text) = &plan.apply_text {
            Some(self.apply_style_text(path, text, true).await?)
        } else {
            if !already_new {
                self.update_row_title(path);
            }
            None
        };
        let row_count = self
            .section(path.section)
            .map_or(0, |section| section.properties().len());
        let outcome = CommitOutcome {
            direction,
            editing_name: session.is_editing_name,
            already_new,
            value_changed: user_input != session.previous_content,
            rows_rebuilt: applied.is_some(),
            row_count,
            sibling_after_abandon: sibling.is_some(),
        };
        let continuation = continue_after_commit(&plan, &outcome);
        debug!("commit of row {} continues with {continuation:?}", path.index);
        self.continue_editing(path.section, continuation).await?;
        Ok(continuation)
    }

    async fn continue_editing(&mut self, section: SectionId, continuation: Continuation) -> Result<()> {
        match continuation {
            Continuation::Done => {}
            Continuation::EditRow { row, field } => {
                self.begin_row_edit(PropertyPath::new(section, row), field);
            }
            Continuation::AddBlankProperty => {
                self.add_blank_property(section, None)?;
            }
            Continuation::Selector {
                next_section,
                direction,
            } => {
                let target = if next_section {
                    match direction {
                        MoveDirection::Forward => self.next_editable_sibling(section),
                        MoveDirection::Backward => self.previous_editable_sibling(section),
                    }
                } else {
                    Some(section)
                };
                if let Some(target) = target {
                    self.start_editing_selector(target);
                }
            }
        }
        Ok(())
    }

    /// Insert an uncommitted row (at the end when `position` is `None`) and edit its name.
    pub fn add_blank_property(&mut self, id: SectionId, position: Option<usize>) -> Result<Option<PropertyPath>> {
        let section = self.require_section(id)?;
        if !section.is_editable() || section.is_blank() {
            return Ok(None);
        }
        let total = section
            .style()
            .map_or(0, |style| self.model.leading_declarations(style).len());
        let Some(index) =
            slot_mut(&mut self.sections, id).and_then(|target| target.add_blank_property(position, total))
        else {
            return Ok(None);
        };
        let path = PropertyPath::new(id, index);
        self.begin_row_edit(path, EditField::Name);
        Ok(Some(path))
    }

    /// Escape: restore the text the row had before editing.
    pub async fn cancel_editing(&mut self) -> Result<()> {
        let Some(path) = self.editing.take() else {
            return Ok(());
        };
        self.is_editing_style = false;
        let row = self
            .property_mut(path)
            .ok_or(InspectorError::UnknownProperty(path))?;
        row.end_edit();
        drop(row.throttle.take());
        if row.edited_incrementally {
            let original = row.original_property_text.clone();
            let outcome = self.apply_style_text(path, &original, false).await?;
            if outcome == ApplyOutcome::Applied
                && let Some(restored) = self.property_mut(path)
            {
                restored.edited_incrementally = false;
            }
            self.refresh_after_edit(path.section, None);
        } else if row.is_new() {
            if let Some(section) = slot_mut(&mut self.sections, path.section) {
                section.remove_property(path.index, false);
            }
        } else {
            self.update_row_title(path);
        }
        Ok(())
    }

    pub(crate) fn update_row_title(&mut self, path: PropertyPath) {
        let env = section_env(&self.model, &self.cache, &self.config);
        if let Some(section) = slot_mut(&mut self.sections, path.section) {
            let context = section.row_context(&env);
            if let Some(row) = section.property_mut(path.index) {
                row.update_title(&context);
            }
        }
    }

    /// Send `name: value` text for a row to the backend and reconcile.
    pub async fn apply_style_text(&mut self, path: PropertyPath, text: &str, major: bool) -> Result<ApplyOutcome> {
        let style_text = normalize_style_text(text);
        let row = self.require_property(path)?;
        let style = row.declaration().owner_style;
        let index = row.declaration().index;
        let new_property = row.is_new();
        let incremental = row.edited_incrementally();
        let original_text = row.original_property_text.clone();

        if style_text.is_empty() && major && new_property && !incremental {
            if let Some(section) = slot_mut(&mut self.sections, path.section) {
                section.remove_property(path.index, false);
            }
            return Ok(ApplyOutcome::Removed);
        }

        let overwrite = !new_property || incremental;
        let before = self.model.leading_declarations(style).len();
        self.user_operation = true;
        let success = self
            .model
            .set_declaration_text(style, index, &style_text, major, overwrite)
            .await;
        self.user_operation = false;
        debug!("set_declaration_text({index}, `{style_text}`, major: {major}) -> {success}");

        if !success {
            warn!(
                "{}; rolling back",
                InspectorError::StyleApplyFailed {
                    text: style_text.clone()
                }
            );
            if major {
                self.roll_back(path, incremental, &original_text).await;
            }
            return Ok(ApplyOutcome::Failed);
        }

        self.model.reset_active_properties();
        let after = self.model.leading_declarations(style).len();
        let removed = style_text.is_empty();
        self.reindex_after_apply(path, style, index, before, after, overwrite);

        let outcome = if removed {
            if let Some(section) = slot_mut(&mut self.sections, path.section) {
                section.remove_property(path.index, false);
            }
            ApplyOutcome::Removed
        } else {
            let declaration = self.model.leading_declarations(style).into_iter().nth(index);
            if let Some(applied) = self.property_mut(path) {
                applied.edited_incrementally = !major;
                if let Some(declaration) = declaration {
                    applied.rebind(declaration);
                }
                applied.new_property = new_property && !major;
            }
            ApplyOutcome::Applied
        };
        self.refresh_after_edit(path.section, (!removed).then_some(path.index));
        Ok(outcome)
    }

    /// Move declaration indices of every row sharing `style` after an apply.
    fn reindex_after_apply(
        &mut self,
        path: PropertyPath,
        style: StyleId,
        index: usize,
        before: usize,
        after: usize,
        overwrite: bool,
    ) {
        let forward = after > before;
        let steps = after.abs_diff(before);
        let from = if overwrite { index + 1 } else { index };
        for section in self.sections.iter_mut().flatten() {
            if section.style() != Some(style) {
                continue;
            }
            let skip = (section.id() == path.section).then_some(path.index);
            for _ in 0..steps {
                section.shift_indices_after(from, forward, skip);
            }
        }
    }

    async fn roll_back(&mut self, path: PropertyPath, incremental: bool, original_text: &str) {
        if incremental && !original_text.is_empty() {
            let Some(declaration) = self.property(path).map(|row| row.declaration().clone()) else {
                return;
            };
            let style = declaration.owner_style;
            let index = declaration.index;
            let restored = self
                .model
                .set_declaration_text(style, index, original_text, false, true)
                .await;
            debug!("restoring `{original_text}` -> {restored}");
            if restored {
                self.model.reset_active_properties();
                let current = self.model.leading_declarations(style).into_iter().nth(index);
                if let Some(row) = self.property_mut(path) {
                    row.edited_incrementally = false;
                    if let Some(current) = current {
                        row.rebind(current);
                    }
                }
                self.refresh_after_edit(path.section, None);
                return;
            }
        }
        if self.property(path).is_some_and(|row| row.is_new()) {
            if let Some(section) = slot_mut(&mut self.sections, path.section) {
                section.remove_property(path.index, false);
            }
        } else {
            self.update_row_title(path);
        }
    }

    pub fn start_editing_selector(&mut self, id: SectionId) -> bool {
        let Some(section) = slot_mut(&mut self.sections, id) else {
            return false;
        };
        if !section.begin_selector_edit() {
            return false;
        }
        self.focused_section = Some(id);
        self.is_editing_style = true;
        true
    }

    /// Commit a selector or key text; blank sections create their rule here.
    pub async fn commit_selector(&mut self, id: SectionId, text: &str) -> Result<bool> {
        let span = info_span!("styles.commit_selector", section = id.0);
        self.commit_selector_inner(id, text.trim()).instrument(span).await
    }

    async fn commit_selector_inner(&mut self, id: SectionId, text: &str) -> Result<bool> {
        let edited = slot_mut(&mut self.sections, id).ok_or(InspectorError::UnknownSection(id))?;
        let Some(previous) = edited.end_selector_edit() else {
            return Ok(false);
        };
        self.is_editing_style = false;

        if let SectionVariant::Blank {
            sheet,
            location,
            normal: false,
        } = *edited.variant()
        {
            let rule_text = format!("{}{text} {{}}", rule_prefix(location));
            self.user_operation = true;
            let created = self.model.add_rule(sheet, &rule_text, location).await;
            self.user_operation = false;
            let info = created.and_then(|style| self.model.style(style));
            let Some(info) = info else {
                warn!(
                    "{}",
                    InspectorError::SelectorApplyFailed {
                        selector: text.to_owned()
                    }
                );
                if let Some(blank) = slot_mut(&mut self.sections, id) {
                    blank.set_selector_text(text);
                }
                self.start_editing_selector(id);
                return Ok(false);
            };
            let matches = self.model.rule_matches_node(info.id);
            if let Some(created_section) = slot_mut(&mut self.sections, id) {
                created_section.make_normal(info, matches);
            }
            self.model.reset_active_properties();
            self.refresh_after_edit(id, None);
            return Ok(true);
        }

        if text == previous || text.is_empty() {
            edited.set_selector_text(&previous);
            return Ok(text == previous);
        }
        let Some(style) = edited.style() else {
            return Ok(false);
        };
        let keyframe = edited.is_keyframe();
        self.user_operation = true;
        let success = if keyframe {
            self.model.set_key_text(style, text).await
        } else {
            self.model.set_selector_text(style, text).await
        };
        self.user_operation = false;
        debug!("set selector of style {} to `{text}` -> {success}", style.0);
        let Some(target) = slot_mut(&mut self.sections, id) else {
            return Ok(success);
        };
        if !success {
            warn!(
                "{}",
                InspectorError::SelectorApplyFailed {
                    selector: text.to_owned()
                }
            );
            target.set_selector_text(&previous);
            return Ok(false);
        }
        target.set_selector_text(text);
        self.model.reset_active_properties();
        let env = section_env(&self.model, &self.cache, &self.config);
        for other in self.sections.iter_mut().flatten() {
            if !other.is_blank() {
                other.update(other.id() == id, &env);
            }
        }
        self.apply_filter();
        Ok(true)
    }

    /// Escape in the selector; a still blank section goes away.
    pub fn cancel_selector(&mut self, id: SectionId) -> Result<()> {
        let section = slot_mut(&mut self.sections, id).ok_or(InspectorError::UnknownSection(id))?;
        let Some(previous) = section.end_selector_edit() else {
            return Ok(());
        };
        self.is_editing_style = false;
        if section.is_blank() {
            self.remove_section(id);
        } else {
            section.set_selector_text(&previous);
        }
        Ok(())
    }

    /// Open the `@media` query above a rule's selector for editing.
    pub fn start_editing_media(&mut self, id: SectionId) -> bool {
        let Some(section) = slot_mut(&mut self.sections, id) else {
            return false;
        };
        if !section.begin_media_edit() {
            return false;
        }
        self.focused_section = Some(id);
        self.is_editing_style = true;
        true
    }

    /// Commit a media query; every section inside the same `@media` rule follows.
    pub async fn commit_media(&mut self, id: SectionId, text: &str) -> Result<bool> {
        let span = info_span!("styles.commit_media", section = id.0);
        self.commit_media_inner(id, text.trim()).instrument(span).await
    }

    async fn commit_media_inner(&mut self, id: SectionId, text: &str) -> Result<bool> {
        let edited = slot_mut(&mut self.sections, id).ok_or(InspectorError::UnknownSection(id))?;
        let Some(previous) = edited.end_media_edit() else {
            return Ok(false);
        };
        self.is_editing_style = false;
        if text == previous {
            return Ok(true);
        }
        let Some(style) = edited.style() else {
            return Ok(false);
        };
        self.user_operation = true;
        let success = self.model.set_media_text(style, text).await;
        self.user_operation = false;
        debug!("set media of style {} to `{text}` -> {success}", style.0);
        if !success {
            warn!(
                "{}",
                InspectorError::MediaApplyFailed {
                    media: text.to_owned()
                }
            );
            return Ok(false);
        }
        self.model.reset_active_properties();
        let env = section_env(&self.model, &self.cache, &self.config);
        for other in self.sections.iter_mut().flatten() {
            if !other.is_blank() {
                other.update(false, &env);
            }
        }
        self.apply_filter();
        Ok(true)
    }

    /// Escape in the media query; the shown text never changed.
    pub fn cancel_media(&mut self, id: SectionId) -> Result<()> {
        let section = slot_mut(&mut self.sections, id).ok_or(InspectorError::UnknownSection(id))?;
        if section.end_media_edit().is_some() {
            self.is_editing_style = false;
        }
        Ok(())
    }
}

const fn session_field(editing_name: bool) -> EditField {
    if editing_name {
        EditField::Name
    } else {
        EditField::Value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_text_is_normalized() {
        assert_eq!(normalize_style_text("  color:\n  red "), "color: red;");
        assert_eq!(normalize_style_text("color: red;"), "color: red;");
        assert_eq!(normalize_style_text("   "), "");
    }
}
