//! Keyboard movement between sections.

use super::PaneController;
use crate::model::CascadeModel;
use crate::popover::PopoverHelper;
use crate::property::PropertyPath;
use crate::property::editing::EditField;
use crate::section::SectionId;
use anyhow::Result;

/// Keys handled on a focused section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionKey {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    Enter,
}

impl<M: CascadeModel, P: PopoverHelper> PaneController<M, P> {
    pub fn first_sibling(&self) -> Option<SectionId> {
        self.section_ids().first().copied()
    }

    pub fn last_sibling(&self) -> Option<SectionId> {
        self.section_ids().last().copied()
    }

    /// Section after `id` in display order.
    pub fn next_sibling(&self, id: SectionId) -> Option<SectionId> {
        let ids = self.section_ids();
        let position = ids.iter().position(|candidate| *candidate == id)?;
        ids.get(position + 1).copied()
    }

    pub fn previous_sibling(&self, id: SectionId) -> Option<SectionId> {
        let ids = self.section_ids();
        let position = ids.iter().position(|candidate| *candidate == id)?;
        ids.get(position.checked_sub(1)?).copied()
    }

    /// Next section whose selector can be edited, wrapping around.
    pub fn next_editable_sibling(&self, id: SectionId) -> Option<SectionId> {
        let ids = self.section_ids();
        let position = ids.iter().position(|candidate| *candidate == id)?;
        ids.iter()
            .cycle()
            .skip(position + 1)
            .take(ids.len())
            .copied()
            .find(|candidate| self.is_selector_editable(*candidate))
    }

    pub fn previous_editable_sibling(&self, id: SectionId) -> Option<SectionId> {
        let ids = self.section_ids();
        let position = ids.iter().position(|candidate| *candidate == id)?;
        ids.iter()
            .rev()
            .cycle()
            .skip(ids.len() - position)
            .take(ids.len())
            .copied()
            .find(|candidate| self.is_selector_editable(*candidate))
    }

    fn is_selector_editable(&self, id: SectionId) -> bool {
        self.section(id)
            .is_some_and(|section| section.is_editable() && section.has_selector() && !section.is_inherited())
    }

    /// Row to edit when focus lands at `index`; past the end means the last row.
    pub fn closest_property_for_editing(&self, id: SectionId, index: usize) -> Option<PropertyPath> {
        let count = self.section(id)?.properties().len();
        if count == 0 {
            return None;
        }
        Some(PropertyPath::new(id, index.min(count - 1)))
    }

    /// Move focus between sections; returns the focused section afterwards.
    pub async fn section_key_down(&mut self, id: SectionId, key: SectionKey) -> Result<Option<SectionId>> {
        self.require_section(id)?;
        let target = match key {
            SectionKey::ArrowUp | SectionKey::ArrowLeft => {
                self.previous_sibling(id).or_else(|| self.last_sibling())
            }
            SectionKey::ArrowDown | SectionKey::ArrowRight => {
                self.next_sibling(id).or_else(|| self.first_sibling())
            }
            SectionKey::Home => self.first_sibling(),
            SectionKey::End => self.last_sibling(),
            SectionKey::Enter => {
                if let Some(path) = self.closest_property_for_editing(id, 0) {
                    self.start_editing(path, EditField::Name).await?;
                } else {
                    self.add_blank_property(id, None)?;
                }
                Some(id)
            }
        };
        if target.is_some() {
            self.focused_section = target;
        }
        Ok(self.focused_section)
    }
}
