//! Property tables: inheritance and shorthand expansion.
//! Reference: <https://www.w3.org/TR/css-cascade-4/#shorthand>

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Properties inherited by default.
/// §7: Inheritance
static INHERITED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "border-collapse",
        "border-spacing",
        "caret-color",
        "color",
        "cursor",
        "direction",
        "empty-cells",
        "fill",
        "fill-opacity",
        "fill-rule",
        "font",
        "font-family",
        "font-feature-settings",
        "font-kerning",
        "font-size",
        "font-size-adjust",
        "font-stretch",
        "font-style",
        "font-variant",
        "font-variation-settings",
        "font-weight",
        "hyphens",
        "letter-spacing",
        "line-height",
        "list-style",
        "list-style-image",
        "list-style-position",
        "list-style-type",
        "orphans",
        "quotes",
        "stroke",
        "stroke-width",
        "tab-size",
        "text-align",
        "text-indent",
        "text-rendering",
        "text-shadow",
        "text-transform",
        "visibility",
        "white-space",
        "widows",
        "word-break",
        "word-spacing",
        "writing-mode",
    ]
    .into_iter()
    .collect()
});

/// Whether a property is inherited by default. Custom properties always inherit.
pub fn is_inherited_property(property_name: &str) -> bool {
    property_name.starts_with("--")
        || INHERITED.contains(property_name.to_ascii_lowercase().as_str())
}

fn sides(prefix: &'static str, suffix: &'static str) -> Vec<String> {
    ["top", "right", "bottom", "left"]
        .iter()
        .map(|side| {
            if suffix.is_empty() {
                format!("{prefix}-{side}")
            } else {
                format!("{prefix}-{side}-{suffix}")
            }
        })
        .collect()
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_owned()).collect()
}

/// Shorthand name to ordered longhand names.
static SHORTHANDS: Lazy<HashMap<&'static str, Vec<String>>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert("margin", sides("margin", ""));
    table.insert("padding", sides("padding", ""));
    table.insert("inset", owned(&["top", "right", "bottom", "left"]));
    table.insert("border-width", sides("border", "width"));
    table.insert("border-style", sides("border", "style"));
    table.insert("border-color", sides("border", "color"));
    for name in ["border-top", "border-right", "border-bottom", "border-left"] {
        table.insert(
            name,
            vec![
                format!("{name}-width"),
                format!("{name}-style"),
                format!("{name}-color"),
            ],
        );
    }
    let mut border = sides("border", "width");
    border.extend(sides("border", "style"));
    border.extend(sides("border", "color"));
    table.insert("border", border);
    table.insert(
        "border-radius",
        owned(&[
            "border-top-left-radius",
            "border-top-right-radius",
            "border-bottom-right-radius",
            "border-bottom-left-radius",
        ]),
    );
    table.insert(
        "background",
        owned(&[
            "background-image",
            "background-position-x",
            "background-position-y",
            "background-size",
            "background-repeat",
            "background-attachment",
            "background-origin",
            "background-clip",
            "background-color",
        ]),
    );
    table.insert(
        "font",
        owned(&[
            "font-style",
            "font-variant",
            "font-weight",
            "font-stretch",
            "font-size",
            "line-height",
            "font-family",
        ]),
    );
    table.insert("flex", owned(&["flex-grow", "flex-shrink", "flex-basis"]));
    table.insert("flex-flow", owned(&["flex-direction", "flex-wrap"]));
    table.insert("gap", owned(&["row-gap", "column-gap"]));
    table.insert("grid-gap", owned(&["grid-row-gap", "grid-column-gap"]));
    table.insert(
        "grid-template",
        owned(&["grid-template-rows", "grid-template-columns", "grid-template-areas"]),
    );
    table.insert(
        "grid-area",
        owned(&["grid-row-start", "grid-column-start", "grid-row-end", "grid-column-end"]),
    );
    table.insert("grid-row", owned(&["grid-row-start", "grid-row-end"]));
    table.insert("grid-column", owned(&["grid-column-start", "grid-column-end"]));
    table.insert("place-items", owned(&["align-items", "justify-items"]));
    table.insert("place-content", owned(&["align-content", "justify-content"]));
    table.insert("place-self", owned(&["align-self", "justify-self"]));
    table.insert("overflow", owned(&["overflow-x", "overflow-y"]));
    table.insert("outline", owned(&["outline-color", "outline-style", "outline-width"]));
    table.insert(
        "list-style",
        owned(&["list-style-position", "list-style-image", "list-style-type"]),
    );
    table.insert(
        "text-decoration",
        owned(&[
            "text-decoration-line",
            "text-decoration-thickness",
            "text-decoration-style",
            "text-decoration-color",
        ]),
    );
    table.insert(
        "transition",
        owned(&[
            "transition-property",
            "transition-duration",
            "transition-timing-function",
            "transition-delay",
        ]),
    );
    table.insert(
        "animation",
        owned(&[
            "animation-duration",
            "animation-timing-function",
            "animation-delay",
            "animation-iteration-count",
            "animation-direction",
            "animation-fill-mode",
            "animation-play-state",
            "animation-name",
        ]),
    );
    table.insert("columns", owned(&["column-width", "column-count"]));
    table
});

/// Longhands a shorthand expands to, in canonical order. Empty for longhands.
pub fn longhands_of(property_name: &str) -> &'static [String] {
    SHORTHANDS
        .get(property_name.to_ascii_lowercase().as_str())
        .map_or(&[][..], Vec::as_slice)
}

/// Whether `property_name` is a shorthand.
#[inline]
pub fn is_shorthand(property_name: &str) -> bool {
    !longhands_of(property_name).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margin_expands_to_four_sides() {
        assert_eq!(
            longhands_of("MARGIN"),
            ["margin-top", "margin-right", "margin-bottom", "margin-left"]
        );
        assert!(longhands_of("margin-top").is_empty());
        assert_eq!(longhands_of("border").len(), 12);
    }

    #[test]
    fn inheritance_table() {
        assert!(is_inherited_property("color"));
        assert!(is_inherited_property("--accent"));
        assert!(!is_inherited_property("margin"));
    }
}
