//! Swatch popovers.
//!
//! One generic [`PopoverEditorController`] drives every editor; the value
//! type decides how token text is parsed, serialized and drawn. The pane
//! holds at most one [`AnyPopover`] at a time.

pub mod values;

use crate::property::PropertyPath;
use core::ops::Range;
use values::{
    AngleValue, BezierValue, ColorValue, EditorContext, EditorWidget, FontValue, PopoverValue,
    ShadowValue,
};

/// Host-side popover surface.
pub trait PopoverHelper {
    fn show(&mut self, widget: EditorWidget, anchor: PropertyPath);

    fn hide(&mut self);

    fn is_showing(&self) -> bool;

    /// Keep the popover next to its anchor after scrolling.
    fn reposition(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PopoverKind {
    Color,
    Bezier,
    Shadow,
    Angle,
    Font,
}

/// Edits one token of one row through a popover.
#[derive(Clone, Debug, PartialEq)]
pub struct PopoverEditorController<V> {
    anchor: PropertyPath,
    property_name: String,
    /// Value text the popover opened on.
    original_value: String,
    /// Byte range of the edited token inside `original_value`.
    token_range: Range<usize>,
    original_property_text: String,
    value: V,
}

impl<V: PopoverValue> PopoverEditorController<V> {
    /// Parse the token at `token_range`; `None` when it is not a `V`.
    pub fn new(
        anchor: PropertyPath,
        property_name: &str,
        value_text: &str,
        token_range: Range<usize>,
        original_property_text: String,
    ) -> Option<Self> {
        let value = V::parse_text(value_text.get(token_range.clone())?, property_name)?;
        Some(Self {
            anchor,
            property_name: property_name.to_owned(),
            original_value: value_text.to_owned(),
            token_range,
            original_property_text,
            value,
        })
    }

    pub const fn anchor(&self) -> PropertyPath {
        self.anchor
    }

    pub const fn value(&self) -> &V {
        &self.value
    }

    pub fn set_value(&mut self, value: V) {
        self.value = value;
    }

    /// Replace the value from editor text; `false` when it does not parse.
    pub fn set_from_text(&mut self, text: &str) -> bool {
        let Some(value) = V::parse_text(text, &self.property_name) else {
            return false;
        };
        self.value = value;
        true
    }

    /// Row value with the edited token spliced in.
    pub fn value_text(&self) -> String {
        let before = self.original_value.get(..self.token_range.start).unwrap_or_default();
        let after = self.original_value.get(self.token_range.end..).unwrap_or_default();
        format!("{before}{}{after}", self.value.serialize_text())
    }

    pub fn property_text(&self) -> String {
        format!("{}: {}", self.property_name, self.value_text())
    }

    pub fn original_property_text(&self) -> &str {
        &self.original_property_text
    }

    pub fn editor(&self, context: &EditorContext) -> EditorWidget {
        self.value.build_editor(context)
    }
}

/// The one open popover.
#[derive(Clone, Debug, PartialEq)]
pub enum AnyPopover {
    Color(PopoverEditorController<ColorValue>),
    Bezier(PopoverEditorController<BezierValue>),
    Shadow(PopoverEditorController<ShadowValue>),
    Angle(PopoverEditorController<AngleValue>),
    Font(PopoverEditorController<FontValue>),
}

macro_rules! each_popover {
    ($popover:expr, $controller:ident => $body:expr) => {
        match $popover {
            AnyPopover::Color($controller) => $body,
            AnyPopover::Bezier($controller) => $body,
            AnyPopover::Shadow($controller) => $body,
            AnyPopover::Angle($controller) => $body,
            AnyPopover::Font($controller) => $body,
        }
    };
}

impl AnyPopover {
    /// Open a controller of `kind` on a token of a row value.
    pub fn open(
        kind: PopoverKind,
        anchor: PropertyPath,
        property_name: &str,
        value_text: &str,
        token_range: Range<usize>,
        original_property_text: String,
    ) -> Option<Self> {
        Some(match kind {
            PopoverKind::Color => Self::Color(PopoverEditorController::new(
                anchor,
                property_name,
                value_text,
                token_range,
                original_property_text,
            )?),
            PopoverKind::Bezier => Self::Bezier(PopoverEditorController::new(
                anchor,
                property_name,
                value_text,
                token_range,
                original_property_text,
            )?),
            PopoverKind::Shadow => Self::Shadow(PopoverEditorController::new(
                anchor,
                property_name,
                value_text,
                token_range,
                original_property_text,
            )?),
            PopoverKind::Angle => Self::Angle(PopoverEditorController::new(
                anchor,
                property_name,
                value_text,
                token_range,
                original_property_text,
            )?),
            PopoverKind::Font => Self::Font(PopoverEditorController::new(
                anchor,
                property_name,
                value_text,
                token_range,
                original_property_text,
            )?),
        })
    }

    pub const fn kind(&self) -> PopoverKind {
        match self {
            Self::Color(_) => PopoverKind::Color,
            Self::Bezier(_) => PopoverKind::Bezier,
            Self::Shadow(_) => PopoverKind::Shadow,
            Self::Angle(_) => PopoverKind::Angle,
            Self::Font(_) => PopoverKind::Font,
        }
    }

    pub fn anchor(&self) -> PropertyPath {
        each_popover!(self, controller => controller.anchor())
    }

    pub fn set_from_text(&mut self, text: &str) -> bool {
        each_popover!(self, controller => controller.set_from_text(text))
    }

    pub fn property_text(&self) -> String {
        each_popover!(self, controller => controller.property_text())
    }

    pub fn original_property_text(&self) -> &str {
        each_popover!(self, controller => controller.original_property_text())
    }

    pub fn editor(&self, context: &EditorContext) -> EditorWidget {
        each_popover!(self, controller => controller.editor(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::SectionId;

    #[test]
    fn color_edit_splices_token() {
        let anchor = PropertyPath::new(SectionId(0), 0);
        let mut popover = AnyPopover::open(
            PopoverKind::Color,
            anchor,
            "border",
            "1px solid red",
            10..13,
            "border: 1px solid red;".to_owned(),
        );
        assert!(popover.as_mut().is_some_and(|popover| popover.set_from_text("#00ff00")));
        assert_eq!(
            popover.map(|popover| popover.property_text()).as_deref(),
            Some("border: 1px solid #00ff00")
        );
    }

    #[test]
    fn wrong_token_type_does_not_open() {
        let anchor = PropertyPath::new(SectionId(0), 0);
        assert!(
            AnyPopover::open(PopoverKind::Angle, anchor, "color", "red", 0..3, String::new()).is_none()
        );
    }
}
