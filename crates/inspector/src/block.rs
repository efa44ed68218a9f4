//! Titled groups of sections.

use crate::model::NodeInfo;
use crate::section::{SectionId, SectionModel};
use regex::Regex;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockKind {
    /// Styles of the selected node; untitled.
    Own,
    Inherited { node: NodeInfo },
    Pseudo { pseudo: String },
    Keyframes { name: String },
}

/// A run of sections sharing a title.
#[derive(Clone, Debug)]
pub struct SectionBlock {
    kind: BlockKind,
    sections: Vec<SectionId>,
    title_hidden: bool,
}

impl SectionBlock {
    pub const fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            sections: Vec::new(),
            title_hidden: false,
        }
    }

    pub const fn kind(&self) -> &BlockKind {
        &self.kind
    }

    pub fn sections(&self) -> &[SectionId] {
        &self.sections
    }

    pub(crate) fn push(&mut self, section: SectionId) {
        self.sections.push(section);
    }

    /// Insert `section` right after `after`, or at the front when `after` is not here.
    pub(crate) fn insert_after(&mut self, after: Option<SectionId>, section: SectionId) {
        let position = after
            .and_then(|anchor| self.sections.iter().position(|id| *id == anchor))
            .map_or(0, |position| position + 1);
        self.sections.insert(position, section);
    }

    pub(crate) fn remove(&mut self, section: SectionId) -> bool {
        let before = self.sections.len();
        self.sections.retain(|id| *id != section);
        before != self.sections.len()
    }

    pub fn contains(&self, section: SectionId) -> bool {
        self.sections.contains(&section)
    }

    pub fn title(&self) -> Option<String> {
        match &self.kind {
            BlockKind::Own => None,
            BlockKind::Inherited { node } => Some(format!("Inherited from {}", node.simple_selector())),
            BlockKind::Pseudo { pseudo } => Some(format!("Pseudo ::{pseudo} element")),
            BlockKind::Keyframes { name } => Some(format!("@keyframes {name}")),
        }
    }

    pub const fn is_title_hidden(&self) -> bool {
        self.title_hidden
    }

    /// Hide the title when the filter left none of the sections visible.
    pub(crate) fn update_filter<'sections>(
        &mut self,
        regex: Option<&Regex>,
        sections: impl Iterator<Item = &'sections SectionModel>,
    ) -> bool {
        let any_visible = sections
            .filter(|section| self.sections.contains(&section.id()))
            .any(|section| !section.is_hidden());
        self.title_hidden = regex.is_some() && !any_visible;
        any_visible || regex.is_none()
    }
}

/// Pseudo element order in the pane: `before` first, then by name.
pub fn sort_pseudo_names(names: &mut [String]) {
    names.sort_by(|left, right| {
        (left != "before", left.as_str()).cmp(&(right != "before", right.as_str()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeId;

    #[test]
    fn titles_by_kind() {
        let node = NodeInfo {
            id: NodeId(1),
            tag_name: "body".to_owned(),
            element_id: None,
            classes: vec!["page".to_owned()],
            is_svg: false,
            parent: None,
            pseudo_type: None,
        };
        assert_eq!(
            SectionBlock::new(BlockKind::Inherited { node }).title().as_deref(),
            Some("Inherited from body.page")
        );
        assert_eq!(
            SectionBlock::new(BlockKind::Pseudo {
                pseudo: "after".to_owned()
            })
            .title()
            .as_deref(),
            Some("Pseudo ::after element")
        );
        assert_eq!(SectionBlock::new(BlockKind::Own).title(), None);
    }

    #[test]
    fn before_sorts_first() {
        let mut names = vec!["marker".to_owned(), "after".to_owned(), "before".to_owned()];
        sort_pseudo_names(&mut names);
        assert_eq!(names, ["before", "after", "marker"]);
    }

    #[test]
    fn insert_after_anchor() {
        let mut block = SectionBlock::new(BlockKind::Own);
        block.push(SectionId(0));
        block.push(SectionId(1));
        block.insert_after(Some(SectionId(0)), SectionId(5));
        block.insert_after(None, SectionId(6));
        assert_eq!(block.sections(), [SectionId(6), SectionId(0), SectionId(5), SectionId(1)]);
        assert!(block.remove(SectionId(5)));
        assert!(!block.contains(SectionId(5)));
    }
}
