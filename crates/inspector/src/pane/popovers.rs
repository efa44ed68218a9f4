//! Swatch popovers opened from row tokens.

use super::PaneController;
use super::editing::ApplyOutcome;
use crate::error::InspectorError;
use crate::model::CascadeModel;
use crate::popover::values::{EditorContext, PaletteEntry, Rgba8Snapshot};
use crate::popover::{AnyPopover, PopoverHelper, PopoverKind};
use crate::property::PropertyPath;
use crate::property::tokens::ValueToken;
use crate::section::SectionId;
use anyhow::Result;
use css_color::parse_css_color;
use log::debug;
use std::collections::BTreeMap;
use tracing::{Instrument as _, info_span};

impl<M: CascadeModel, P: PopoverHelper> PaneController<M, P> {
    /// Open the editor for a swatch token; a click while one is shown only closes it.
    pub async fn open_popover(&mut self, path: PropertyPath, token_index: usize) -> Result<bool> {
        if self.popover.is_some() || self.popover_helper.is_showing() {
            self.popover_hidden(true).await?;
            return Ok(false);
        }
        let row = self.require_property(path)?;
        let Some(rendered) = row.tokens().get(token_index) else {
            return Ok(false);
        };
        let kind = match &rendered.token {
            ValueToken::Color(_) => PopoverKind::Color,
            ValueToken::Bezier(_) => PopoverKind::Bezier,
            ValueToken::Shadow(_) => PopoverKind::Shadow,
            ValueToken::Angle { .. } => PopoverKind::Angle,
            ValueToken::Font(_) => PopoverKind::Font,
            ValueToken::Text(_) | ValueToken::Var { .. } | ValueToken::Url(_) | ValueToken::Grid { .. } => {
                return Ok(false);
            }
        };
        let name = row.name().to_owned();
        let style = row.declaration().owner_style;
        let original_property_text = row.declaration().property_text();
        let font_properties = self.section_font_properties(path.section);
        let (value_text, range) = if kind == PopoverKind::Font {
            let text = font_properties
                .iter()
                .map(|(font_name, value)| format!("{font_name}: {value};"))
                .collect::<Vec<_>>()
                .join(" ");
            let len = text.len();
            (text, 0..len)
        } else {
            (row.value().to_owned(), rendered.range.clone())
        };

        let palette = self
            .model
            .available_variables(style)
            .into_iter()
            .filter(|variable| *variable != name)
            .filter_map(|variable| {
                let color = parse_css_color(&self.model.compute_variable(style, &variable)?)?;
                Some(PaletteEntry {
                    name: variable,
                    rgba: Rgba8Snapshot::from(color),
                })
            })
            .collect();
        let context = EditorContext {
            palette,
            font_properties,
        };
        let Some(popover) =
            AnyPopover::open(kind, path, &name, &value_text, range, original_property_text.clone())
        else {
            return Ok(false);
        };
        debug!("opening {kind:?} popover for `{name}`");
        self.popover_helper.show(popover.editor(&context), path);
        self.popover = Some(popover);
        self.is_editing_style = true;
        if let Some(anchored) = self.property_mut(path)
            && !anchored.edited_incrementally
        {
            anchored.original_property_text = original_property_text;
        }
        Ok(true)
    }

    fn section_font_properties(&self, id: SectionId) -> BTreeMap<String, String> {
        self.section(id)
            .map(|section| {
                section
                    .font_properties()
                    .iter()
                    .filter_map(|index| section.property(*index))
                    .map(|row| (row.name().to_owned(), row.value().to_owned()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn important_suffix(&self, path: PropertyPath) -> &'static str {
        if self.property(path).is_some_and(|row| row.declaration().important) {
            " !important"
        } else {
            ""
        }
    }

    /// The editor produced new text; applied as a free-flow edit.
    pub async fn popover_value_changed(&mut self, text: &str) -> Result<bool> {
        let Some(popover) = self.popover.as_mut() else {
            return Ok(false);
        };
        if !popover.set_from_text(text) {
            return Ok(false);
        }
        let anchor = popover.anchor();
        if let AnyPopover::Font(controller) = &*popover {
            let properties = controller.value().properties.clone();
            return self.apply_font_properties(anchor.section, properties).await;
        }
        let base_text = popover.property_text();
        let property_text = format!("{base_text}{}", self.important_suffix(anchor));
        let outcome = self
            .apply_style_text(anchor, &property_text, false)
            .instrument(info_span!("styles.popover_change"))
            .await?;
        Ok(outcome == ApplyOutcome::Applied)
    }

    /// Write font editor values back to the rows of the section, adding missing ones.
    async fn apply_font_properties(&mut self, id: SectionId, properties: BTreeMap<String, String>) -> Result<bool> {
        let section = self.require_section(id)?;
        let Some(style) = section.style() else {
            return Ok(false);
        };
        let existing: Vec<(usize, String, String)> = section
            .font_properties()
            .iter()
            .filter_map(|index| {
                section
                    .property(*index)
                    .map(|row| (*index, row.name().to_owned(), row.value().to_owned()))
            })
            .collect();
        let mut updates = Vec::new();
        let mut inserts = Vec::new();
        for (name, value) in properties {
            let row = existing.iter().find(|(_, existing_name, _)| *existing_name == name);
            if let Some((index, _, current)) = row {
                if *current == value {
                    continue;
                }
                let text = if value.is_empty() {
                    String::new()
                } else {
                    format!("{name}: {value}")
                };
                updates.push((*index, text));
            } else if !value.is_empty() {
                inserts.push(format!("{name}: {value};"));
            }
        }
        // Deleting a row moves later positions, so go back to front.
        updates.sort_by(|left, right| right.0.cmp(&left.0));
        let mut changed = false;
        for (index, text) in updates {
            let outcome = self.apply_style_text(PropertyPath::new(id, index), &text, false).await?;
            changed |= outcome != ApplyOutcome::Failed;
        }
        for text in inserts {
            let index = self.model.leading_declarations(style).len();
            if self.model.set_declaration_text(style, index, &text, false, false).await {
                self.model.reset_active_properties();
                changed = true;
            }
        }
        Ok(changed)
    }

    /// Close the popover, committing its value or restoring the original text.
    pub async fn popover_hidden(&mut self, commit: bool) -> Result<()> {
        let Some(popover) = self.popover.take() else {
            if self.popover_helper.is_showing() {
                self.popover_helper.hide();
            }
            return Ok(());
        };
        self.popover_helper.hide();
        self.is_editing_style = false;
        let anchor = popover.anchor();
        if popover.kind() == PopoverKind::Font {
            self.refresh_after_edit(anchor.section, None);
            return Ok(());
        }
        let suffix = self.important_suffix(anchor);
        let committed = format!("{}{suffix};", popover.property_text());
        let text = if commit {
            committed
        } else {
            popover.original_property_text().to_owned()
        };
        let unchanged = self
            .property(anchor)
            .is_some_and(|row| !row.edited_incrementally() && row.declaration().property_text() == text);
        if unchanged {
            self.update_row_title(anchor);
            return Ok(());
        }
        let outcome = self.apply_style_text(anchor, &text, true).await?;
        if outcome == ApplyOutcome::Applied
            && let Some(row) = self.property_mut(anchor)
        {
            row.edited_incrementally = false;
        }
        Ok(())
    }

    /// Shift-click on a swatch: colors change notation, angles change unit.
    pub async fn cycle_token_format(&mut self, path: PropertyPath, token_index: usize) -> Result<bool> {
        let row = self
            .property_mut(path)
            .ok_or(InspectorError::UnknownProperty(path))?;
        let Some(rendered) = row.tokens_mut().get_mut(token_index) else {
            return Ok(false);
        };
        match &mut rendered.token {
            ValueToken::Color(swatch) => {
                swatch.cycle_format();
                Ok(true)
            }
            ValueToken::Angle { angle, .. } => {
                let converted = angle.convert(angle.unit.next()).to_css_text();
                let range = rendered.range.clone();
                let value = row.value();
                let (Some(before), Some(after)) = (value.get(..range.start), value.get(range.end..)) else {
                    return Ok(false);
                };
                let important = if row.declaration().important { " !important" } else { "" };
                let text = format!("{}: {before}{converted}{after}{important}", row.name());
                let outcome = self.apply_style_text(path, &text, true).await?;
                Ok(outcome == ApplyOutcome::Applied)
            }
            ValueToken::Text(_)
            | ValueToken::Var { .. }
            | ValueToken::Url(_)
            | ValueToken::Bezier(_)
            | ValueToken::Font(_)
            | ValueToken::Shadow(_)
            | ValueToken::Grid { .. } => Ok(false),
        }
    }

    /// Keep the popover attached to its row while the pane scrolls.
    pub fn on_scroll(&mut self) {
        if self.popover.is_some() {
            self.popover_helper.reposition();
        }
    }
}
