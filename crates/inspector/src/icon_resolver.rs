//! Directional glyphs for flexbox declarations.
//!
//! Maps `name: value` text plus the element's computed style to an icon name
//! and the rotation/flip that makes the glyph point along the physical flex
//! axis under the current `direction` and `writing-mode`.

use crate::model::ComputedStyle;
use serde::Serialize;

const VERTICAL_WRITING_MODES: &[&str] = &["tb", "tb-rl", "vertical-lr", "vertical-rl"];

/// A flex axis expressed on the screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PhysicalFlexDirection {
    LeftToRight,
    RightToLeft,
    BottomToTop,
    TopToBottom,
}

impl PhysicalFlexDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LeftToRight => "left-to-right",
            Self::RightToLeft => "right-to-left",
            Self::BottomToTop => "bottom-to-top",
            Self::TopToBottom => "top-to-bottom",
        }
    }

    pub const fn reverse(self) -> Self {
        match self {
            Self::LeftToRight => Self::RightToLeft,
            Self::RightToLeft => Self::LeftToRight,
            Self::TopToBottom => Self::BottomToTop,
            Self::BottomToTop => Self::TopToBottom,
        }
    }
}

/// Physical directions of the `row` and `column` flex axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FlexDirections {
    pub row: PhysicalFlexDirection,
    pub column: PhysicalFlexDirection,
}

impl FlexDirections {
    /// Direction for a `flex-direction` keyword, including the reversed ones.
    pub fn for_keyword(self, keyword: &str) -> Option<PhysicalFlexDirection> {
        match keyword {
            "row" => Some(self.row),
            "column" => Some(self.column),
            "row-reverse" => Some(self.row.reverse()),
            "column-reverse" => Some(self.column.reverse()),
            _ => None,
        }
    }

    /// Cross-axis direction for alignment icons given the main-axis keyword.
    fn cross_axis(self, flex_direction: &str) -> Option<PhysicalFlexDirection> {
        match flex_direction {
            "column" | "column-reverse" => Some(self.row),
            "row" | "row-reverse" => Some(self.column),
            _ => None,
        }
    }
}

/// Icon plus the transform to apply to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IconInfo {
    pub icon_name: String,
    pub rotate: i32,
    pub scale_x: i32,
    pub scale_y: i32,
}

/// Physical `row`/`column` directions from `direction` and `writing-mode`.
pub fn actual_flex_directions(direction: Option<&str>, writing_mode: Option<&str>) -> FlexDirections {
    let is_rtl = direction == Some("rtl");
    let vertical = writing_mode.filter(|mode| VERTICAL_WRITING_MODES.contains(mode));
    if let Some(mode) = vertical {
        return FlexDirections {
            row: if is_rtl {
                PhysicalFlexDirection::BottomToTop
            } else {
                PhysicalFlexDirection::TopToBottom
            },
            column: if mode == "vertical-lr" {
                PhysicalFlexDirection::LeftToRight
            } else {
                PhysicalFlexDirection::RightToLeft
            },
        };
    }
    FlexDirections {
        row: if is_rtl {
            PhysicalFlexDirection::RightToLeft
        } else {
            PhysicalFlexDirection::LeftToRight
        },
        column: PhysicalFlexDirection::TopToBottom,
    }
}

fn directions_of(computed: &ComputedStyle) -> FlexDirections {
    actual_flex_directions(
        computed.get("direction").map(String::as_str),
        computed.get("writing-mode").map(String::as_str),
    )
}

/// Rotate the flex-direction glyph, which points top-down by default.
pub fn rotate_flex_direction_icon(direction: PhysicalFlexDirection) -> IconInfo {
    let (rotate, scale_x, scale_y) = match direction {
        PhysicalFlexDirection::LeftToRight => (-90, -1, 1),
        PhysicalFlexDirection::RightToLeft => (90, 1, 1),
        PhysicalFlexDirection::TopToBottom => (0, 1, 1),
        PhysicalFlexDirection::BottomToTop => (0, 1, -1),
    };
    IconInfo {
        icon_name: "flex-direction-icon".to_owned(),
        rotate,
        scale_x,
        scale_y,
    }
}

pub fn rotate_align_content_icon(icon_name: &str, direction: PhysicalFlexDirection) -> IconInfo {
    IconInfo {
        icon_name: icon_name.to_owned(),
        rotate: match direction {
            PhysicalFlexDirection::RightToLeft => 90,
            PhysicalFlexDirection::LeftToRight => -90,
            PhysicalFlexDirection::TopToBottom | PhysicalFlexDirection::BottomToTop => 0,
        },
        scale_x: 1,
        scale_y: 1,
    }
}

pub fn rotate_justify_content_icon(icon_name: &str, direction: PhysicalFlexDirection) -> IconInfo {
    IconInfo {
        icon_name: icon_name.to_owned(),
        rotate: match direction {
            PhysicalFlexDirection::TopToBottom => 90,
            PhysicalFlexDirection::BottomToTop => -90,
            PhysicalFlexDirection::LeftToRight | PhysicalFlexDirection::RightToLeft => 0,
        },
        scale_x: if direction == PhysicalFlexDirection::RightToLeft {
            -1
        } else {
            1
        },
        scale_y: 1,
    }
}

/// Align-items glyphs rotate like align-content ones.
pub fn rotate_align_items_icon(icon_name: &str, direction: PhysicalFlexDirection) -> IconInfo {
    rotate_align_content_icon(icon_name, direction)
}

fn baseline_icon() -> IconInfo {
    IconInfo {
        icon_name: "baseline-icon".to_owned(),
        rotate: 0,
        scale_x: 1,
        scale_y: 1,
    }
}

fn computed_flex_direction(computed: &ComputedStyle) -> &str {
    computed.get("flex-direction").map_or("row", String::as_str)
}

fn cross_axis_icon(icon_name: &str, computed: &ComputedStyle) -> Option<IconInfo> {
    let direction = directions_of(computed).cross_axis(computed_flex_direction(computed))?;
    Some(rotate_align_items_icon(icon_name, direction))
}

/// Resolve the glyph for `name: value` declaration text.
///
/// `align-self` is resolved against the parent's computed style since it
/// aligns along the container's cross axis.
pub fn find_icon(
    text: &str,
    computed: Option<&ComputedStyle>,
    parent_computed: Option<&ComputedStyle>,
) -> Option<IconInfo> {
    let empty = ComputedStyle::new();
    let computed = computed.unwrap_or(&empty);
    let parent_computed = parent_computed.unwrap_or(&empty);
    let (name, value) = text.split_once(':')?;
    let value = value.trim();
    match (name.trim(), value) {
        ("flex-direction", "row" | "column" | "row-reverse" | "column-reverse") => {
            let direction = directions_of(computed).for_keyword(value)?;
            Some(rotate_flex_direction_icon(direction))
        }
        ("flex-direction", "initial" | "unset" | "revert") => {
            Some(rotate_flex_direction_icon(directions_of(computed).row))
        }
        ("align-items" | "align-content" | "align-self", "baseline") => Some(baseline_icon()),
        ("align-content", keyword) => {
            let icon_name = match keyword {
                "center" => "flex-align-content-center-icon",
                "space-around" => "flex-align-content-space-around-icon",
                "space-between" => "flex-align-content-space-between-icon",
                "space-evenly" => "flex-align-content-space-evenly-icon",
                "flex-end" => "flex-align-content-end-icon",
                "flex-start" => "flex-align-content-start-icon",
                "stretch" | "normal" | "revert" | "unset" | "initial" => {
                    "flex-align-content-stretch-icon"
                }
                _ => return None,
            };
            let direction = directions_of(computed).cross_axis(computed_flex_direction(computed))?;
            Some(rotate_align_content_icon(icon_name, direction))
        }
        (
            "justify-content",
            keyword @ ("center" | "space-around" | "space-between" | "space-evenly" | "flex-end"
            | "flex-start"),
        ) => {
            let direction = directions_of(computed).for_keyword(computed_flex_direction(computed))?;
            Some(rotate_justify_content_icon(
                &format!("flex-justify-content-{keyword}-icon"),
                direction,
            ))
        }
        ("align-items", keyword @ ("stretch" | "flex-end" | "flex-start" | "center")) => {
            cross_axis_icon(&format!("flex-align-items-{keyword}-icon"), computed)
        }
        ("align-self", keyword @ ("center" | "flex-start" | "flex-end" | "stretch")) => {
            cross_axis_icon(&format!("flex-align-self-{keyword}-icon"), parent_computed)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_is_an_involution() {
        for direction in [
            PhysicalFlexDirection::LeftToRight,
            PhysicalFlexDirection::RightToLeft,
            PhysicalFlexDirection::TopToBottom,
            PhysicalFlexDirection::BottomToTop,
        ] {
            assert_eq!(direction.reverse().reverse(), direction);
            assert_ne!(direction.reverse(), direction);
        }
    }

    #[test]
    fn unknown_text_has_no_icon() {
        assert_eq!(find_icon("display: flex", None, None), None);
        assert_eq!(find_icon("align-content: start", None, None), None);
        assert_eq!(find_icon("no separator", None, None), None);
    }
}
