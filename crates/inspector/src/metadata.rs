//! Property metadata: known names, value keywords and the capability sets
//! that decide which inline editors a value gets.

use css_cascade::longhands_of;
use css_variables::is_custom_property;
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap, HashSet};

/// CSS-wide keywords accepted by every property.
pub const GLOBAL_KEYWORDS: &[&str] = &["inherit", "initial", "revert", "unset"];

/// Generic font families offered for `font-family`.
pub const GENERIC_FONT_FAMILIES: &[&str] = &[
    "serif",
    "sans-serif",
    "cursive",
    "fantasy",
    "monospace",
    "system-ui",
];

const COLOR_AWARE: &[&str] = &[
    "accent-color",
    "background",
    "background-color",
    "background-image",
    "border",
    "border-block-color",
    "border-bottom",
    "border-bottom-color",
    "border-color",
    "border-image",
    "border-image-source",
    "border-inline-color",
    "border-left",
    "border-left-color",
    "border-right",
    "border-right-color",
    "border-top",
    "border-top-color",
    "box-shadow",
    "caret-color",
    "color",
    "column-rule",
    "column-rule-color",
    "fill",
    "flood-color",
    "lighting-color",
    "outline",
    "outline-color",
    "stop-color",
    "stroke",
    "text-decoration",
    "text-decoration-color",
    "text-emphasis",
    "text-emphasis-color",
    "text-shadow",
    "-webkit-border-after-color",
    "-webkit-border-before-color",
    "-webkit-box-shadow",
    "-webkit-tap-highlight-color",
    "-webkit-text-fill-color",
    "-webkit-text-stroke",
    "-webkit-text-stroke-color",
];

const BEZIER_AWARE: &[&str] = &[
    "animation",
    "animation-timing-function",
    "transition",
    "transition-timing-function",
    "-webkit-animation",
    "-webkit-animation-timing-function",
    "-webkit-transition",
    "-webkit-transition-timing-function",
];

const ANGLE_AWARE: &[&str] = &[
    "-webkit-border-image",
    "-webkit-mask-image",
    "background",
    "background-image",
    "border-image",
    "border-image-source",
    "content",
    "filter",
    "image-orientation",
    "list-style-image",
    "offset-path",
    "offset-rotate",
    "rotate",
    "transform",
];

const FONT_AWARE: &[&str] = &[
    "font-family",
    "font-size",
    "font-weight",
    "letter-spacing",
    "line-height",
];

const SHADOW: &[&str] = &["box-shadow", "text-shadow", "-webkit-box-shadow"];

const GRID_AREA_DEFINING: &[&str] = &["grid", "grid-template", "grid-template-areas"];

const SVG_ONLY: &[&str] = &[
    "alignment-baseline",
    "baseline-shift",
    "buffered-rendering",
    "clip-rule",
    "color-interpolation",
    "color-interpolation-filters",
    "color-rendering",
    "cx",
    "cy",
    "d",
    "dominant-baseline",
    "fill",
    "fill-opacity",
    "fill-rule",
    "flood-color",
    "flood-opacity",
    "lighting-color",
    "marker",
    "marker-end",
    "marker-mid",
    "marker-start",
    "mask-type",
    "paint-order",
    "r",
    "rx",
    "ry",
    "shape-rendering",
    "stop-color",
    "stop-opacity",
    "stroke",
    "stroke-dasharray",
    "stroke-dashoffset",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-opacity",
    "stroke-width",
    "text-anchor",
    "vector-effect",
    "x",
    "y",
];

const DISTANCE: &[&str] = &[
    "background-position",
    "border-spacing",
    "bottom",
    "column-gap",
    "column-width",
    "flex-basis",
    "font-size",
    "gap",
    "grid-column-gap",
    "grid-gap",
    "grid-row-gap",
    "height",
    "inset",
    "left",
    "letter-spacing",
    "max-height",
    "max-width",
    "min-height",
    "min-width",
    "outline-offset",
    "outline-width",
    "perspective",
    "right",
    "row-gap",
    "text-indent",
    "top",
    "width",
    "word-spacing",
];

const OTHER_PROPERTIES: &[&str] = &[
    "align-content",
    "align-items",
    "align-self",
    "animation-name",
    "appearance",
    "aspect-ratio",
    "backdrop-filter",
    "backface-visibility",
    "background-attachment",
    "background-blend-mode",
    "background-clip",
    "background-origin",
    "background-repeat",
    "background-size",
    "box-sizing",
    "clear",
    "clip-path",
    "columns",
    "contain",
    "content",
    "counter-increment",
    "counter-reset",
    "cursor",
    "direction",
    "display",
    "empty-cells",
    "filter",
    "flex",
    "flex-direction",
    "flex-flow",
    "flex-grow",
    "flex-shrink",
    "flex-wrap",
    "float",
    "font",
    "font-feature-settings",
    "font-kerning",
    "font-stretch",
    "font-style",
    "font-variant",
    "font-variation-settings",
    "grid-area",
    "grid-auto-columns",
    "grid-auto-flow",
    "grid-auto-rows",
    "grid-column",
    "grid-row",
    "grid-template-columns",
    "grid-template-rows",
    "hyphens",
    "isolation",
    "justify-content",
    "justify-items",
    "justify-self",
    "list-style",
    "mix-blend-mode",
    "object-fit",
    "object-position",
    "opacity",
    "order",
    "orphans",
    "overflow",
    "overflow-wrap",
    "place-content",
    "place-items",
    "place-self",
    "pointer-events",
    "position",
    "quotes",
    "resize",
    "scroll-behavior",
    "tab-size",
    "table-layout",
    "text-align",
    "text-overflow",
    "text-rendering",
    "text-transform",
    "touch-action",
    "transform-origin",
    "transform-style",
    "user-select",
    "vertical-align",
    "visibility",
    "white-space",
    "widows",
    "will-change",
    "word-break",
    "writing-mode",
    "z-index",
    "zoom",
];

/// Every property name offered as a completion.
static ALL_PROPERTIES: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    let mut names: BTreeSet<&'static str> = COLOR_AWARE
        .iter()
        .chain(BEZIER_AWARE)
        .chain(ANGLE_AWARE)
        .chain(FONT_AWARE)
        .chain(SHADOW)
        .chain(GRID_AREA_DEFINING)
        .chain(SVG_ONLY)
        .chain(DISTANCE)
        .chain(OTHER_PROPERTIES)
        .copied()
        .collect();
    let shorthands: Vec<&'static str> = names.iter().copied().collect();
    for shorthand in shorthands {
        names.extend(longhands_of(shorthand).iter().map(String::as_str));
    }
    names
});

static LENGTH_PROPERTIES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut names: HashSet<&'static str> = DISTANCE.iter().copied().collect();
    for shorthand in ["margin", "padding", "border-width", "border-radius", "inset"] {
        names.insert(shorthand);
        names.extend(longhands_of(shorthand).iter().map(String::as_str));
    }
    names
});

/// Keyword values per property.
static PROPERTY_VALUES: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
    let alignment: &'static [&'static str] = &[
        "baseline",
        "center",
        "end",
        "flex-end",
        "flex-start",
        "normal",
        "start",
        "stretch",
    ];
    let distribution: &'static [&'static str] = &[
        "center",
        "flex-end",
        "flex-start",
        "normal",
        "space-around",
        "space-between",
        "space-evenly",
        "stretch",
    ];
    let timing: &'static [&'static str] = &[
        "ease",
        "ease-in",
        "ease-in-out",
        "ease-out",
        "linear",
        "step-end",
        "step-start",
        "cubic-bezier",
    ];
    let border_style: &'static [&'static str] = &[
        "dashed", "dotted", "double", "groove", "hidden", "inset", "none", "outset", "ridge",
        "solid",
    ];
    table.insert(
        "display",
        &[
            "block",
            "contents",
            "flex",
            "flow-root",
            "grid",
            "inline",
            "inline-block",
            "inline-flex",
            "inline-grid",
            "list-item",
            "none",
            "table",
            "table-cell",
            "table-row",
        ][..],
    );
    table.insert("position", &["absolute", "fixed", "relative", "static", "sticky"][..]);
    table.insert(
        "flex-direction",
        &["column", "column-reverse", "row", "row-reverse"][..],
    );
    table.insert("flex-wrap", &["nowrap", "wrap", "wrap-reverse"][..]);
    table.insert("align-items", alignment);
    table.insert("align-self", alignment);
    table.insert("align-content", distribution);
    table.insert("justify-content", distribution);
    table.insert("visibility", &["collapse", "hidden", "visible"][..]);
    table.insert("float", &["left", "none", "right"][..]);
    table.insert("clear", &["both", "left", "none", "right"][..]);
    table.insert("box-sizing", &["border-box", "content-box"][..]);
    table.insert("direction", &["ltr", "rtl"][..]);
    table.insert(
        "writing-mode",
        &["horizontal-tb", "vertical-lr", "vertical-rl"][..],
    );
    table.insert(
        "text-transform",
        &["capitalize", "lowercase", "none", "uppercase"][..],
    );
    table.insert(
        "white-space",
        &["break-spaces", "normal", "nowrap", "pre", "pre-line", "pre-wrap"][..],
    );
    table.insert("text-align", &["center", "end", "justify", "left", "right", "start"][..]);
    table.insert(
        "overflow",
        &["auto", "clip", "hidden", "overlay", "scroll", "visible"][..],
    );
    table.insert("font-style", &["italic", "normal", "oblique"][..]);
    table.insert(
        "font-weight",
        &["100", "200", "300", "400", "500", "600", "700", "800", "900", "bold", "bolder", "lighter", "normal"][..],
    );
    table.insert("font-family", GENERIC_FONT_FAMILIES);
    table.insert("border-style", border_style);
    table.insert("outline-style", border_style);
    table.insert("animation-timing-function", timing);
    table.insert("transition-timing-function", timing);
    table.insert(
        "cursor",
        &["auto", "default", "grab", "move", "none", "pointer", "text", "wait"][..],
    );
    table.insert(
        "color",
        &["currentcolor", "transparent", "black", "blue", "green", "red", "white"][..],
    );
    table.insert(
        "background-color",
        &["currentcolor", "transparent", "black", "blue", "green", "red", "white"][..],
    );
    table
});

/// Properties whose single-identifier values must come from their keyword list.
const KEYWORD_ONLY: &[&str] = &[
    "box-sizing",
    "clear",
    "direction",
    "display",
    "flex-direction",
    "flex-wrap",
    "float",
    "position",
    "text-transform",
    "visibility",
    "white-space",
];

/// Ready-made `name: value` pairs offered while editing a name.
pub const NAME_VALUE_PRESETS: &[&str] = &[
    "align-items: center",
    "display: block",
    "display: flex",
    "display: grid",
    "display: none",
    "flex-direction: column",
    "justify-content: center",
    "position: absolute",
    "position: relative",
];

/// Usage weight ranking prefix matches while completing names.
const USAGE_WEIGHTS: &[(&str, u32)] = &[
    ("display", 90),
    ("width", 85),
    ("height", 84),
    ("color", 83),
    ("margin", 82),
    ("padding", 81),
    ("position", 80),
    ("background-color", 79),
    ("font-size", 78),
    ("border", 77),
    ("top", 70),
    ("left", 69),
    ("background", 68),
    ("font-weight", 67),
    ("text-align", 66),
    ("opacity", 60),
];

/// Overlay highlight modes, keyed by the properties that trigger them.
const HIGHLIGHTABLE_PROPERTIES: &[(&str, &[&str])] = &[
    ("padding", &["padding"]),
    ("border", &["border"]),
    ("margin", &["margin"]),
    ("gap", &["gap", "grid-gap"]),
    ("column-gap", &["column-gap", "grid-column-gap"]),
    ("row-gap", &["row-gap", "grid-row-gap"]),
    ("grid-template-columns", &["grid-template-columns"]),
    ("grid-template-rows", &["grid-template-rows"]),
    ("grid-template-areas", &["grid-areas"]),
    ("justify-content", &["justify-content"]),
    ("align-content", &["align-content"]),
    ("align-items", &["align-items"]),
    ("flexibility", &["flex", "flex-basis", "flex-grow", "flex-shrink"]),
];

#[inline]
fn contains(table: &[&str], name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    table.contains(&lower.as_str())
}

/// Whether color literals in this property's value get a swatch.
pub fn is_color_aware(name: &str) -> bool {
    contains(COLOR_AWARE, name) || is_custom_property(name)
}

/// Whether timing functions in this property's value get a bezier swatch.
pub fn is_bezier_aware(name: &str) -> bool {
    contains(BEZIER_AWARE, name) || is_custom_property(name)
}

/// Whether angles in this property's value get an angle clock.
pub fn is_angle_aware(name: &str) -> bool {
    contains(ANGLE_AWARE, name)
}

/// Whether the property participates in the section font editor.
pub fn is_font_aware(name: &str) -> bool {
    contains(FONT_AWARE, name)
}

pub fn is_shadow_property(name: &str) -> bool {
    contains(SHADOW, name)
}

pub fn is_grid_area_defining(name: &str) -> bool {
    contains(GRID_AREA_DEFINING, name)
}

pub fn is_svg_only(name: &str) -> bool {
    contains(SVG_ONLY, name)
}

/// Whether unitless numbers typed into this property should get `px`.
pub fn is_length_property(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower != "line-height" && LENGTH_PROPERTIES.contains(lower.as_str())
}

/// Whether the name is a property the inspector knows about.
pub fn is_known_property(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    is_custom_property(name) || ALL_PROPERTIES.contains(lower.as_str())
}

/// All known property names in sorted order.
pub fn all_properties() -> impl Iterator<Item = &'static str> {
    ALL_PROPERTIES.iter().copied()
}

/// Keyword completions for a property value, global keywords last.
pub fn property_values(name: &str) -> Vec<&'static str> {
    let lower = name.to_ascii_lowercase();
    let mut values: Vec<&'static str> = PROPERTY_VALUES
        .get(lower.as_str())
        .map_or_else(Vec::new, |values| values.to_vec());
    values.extend(GLOBAL_KEYWORDS);
    values
}

/// Completion priority for a property name.
pub fn usage_weight(name: &str) -> u32 {
    USAGE_WEIGHTS
        .iter()
        .find(|(known, _)| *known == name)
        .map_or(1, |(_, weight)| *weight)
}

/// Whether `value` is acceptable for `name` as far as keyword tables can tell.
pub fn is_valid_value(name: &str, value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return false;
    }
    let lower_name = name.to_ascii_lowercase();
    if !KEYWORD_ONLY.contains(&lower_name.as_str())
        || trimmed.contains(char::is_whitespace)
        || trimmed.contains('(')
    {
        return true;
    }
    let lower_value = trimmed.to_ascii_lowercase();
    property_values(&lower_name).contains(&lower_value.as_str())
}

/// Overlay highlight mode for a property row, if it has one.
pub fn highlight_mode(name: &str) -> Option<&'static str> {
    HIGHLIGHTABLE_PROPERTIES
        .iter()
        .find(|(_, properties)| properties.contains(&name))
        .map(|(mode, _)| *mode)
}

/// Whether a parse failure on this declaration is a known hack to ignore.
pub fn ignore_errors_for_property(name: &str, value: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    if lower.starts_with('_') || lower == "filter" || lower.starts_with("scrollbar-") {
        return true;
    }
    if lower.starts_with('-') && !lower.starts_with("-webkit-") && !lower.starts_with("--") {
        return true;
    }
    value.trim_end().ends_with("\\9")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_sets_include_custom_properties() {
        assert!(is_color_aware("--accent"));
        assert!(is_color_aware("Background-Color"));
        assert!(!is_angle_aware("--spin"));
        assert!(is_length_property("margin-top"));
        assert!(!is_length_property("line-height"));
        assert!(is_known_property("margin-left"));
        assert!(!is_known_property("colour"));
    }

    #[test]
    fn keyword_only_values_are_checked() {
        assert!(is_valid_value("display", "flex"));
        assert!(is_valid_value("display", "inherit"));
        assert!(!is_valid_value("display", "flexy"));
        assert!(is_valid_value("color", "banana"));
        assert!(!is_valid_value("color", "  "));
    }

    #[test]
    fn hacks_are_ignored() {
        assert!(ignore_errors_for_property("_zoom", "1"));
        assert!(ignore_errors_for_property("-moz-appearance", "none"));
        assert!(!ignore_errors_for_property("-webkit-appearance", "none"));
        assert!(ignore_errors_for_property("width", "10px\\9"));
        assert_eq!(highlight_mode("grid-gap"), Some("gap"));
        assert_eq!(highlight_mode("color"), None);
    }
}
