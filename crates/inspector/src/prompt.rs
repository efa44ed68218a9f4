//! Autocompletion for the name and value fields.

use crate::icon_resolver::{IconInfo, find_icon};
use crate::metadata::{self, NAME_VALUE_PRESETS};
use crate::model::{CascadeModel, ComputedStyle, StyleId};
use crate::popover::values::Rgba8Snapshot;
use css_color::parse_css_color;
use css_variables::is_custom_property;
use serde::Serialize;

/// One suggestion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub text: String,
    /// Shown instead of `text`, for `name: value` presets.
    pub title: Option<String>,
    pub priority: u32,
    pub color: Option<Rgba8Snapshot>,
    pub icon: Option<IconInfo>,
    pub hide_ghost_text: bool,
}

impl Completion {
    fn plain(text: String, priority: u32) -> Self {
        Self {
            text,
            title: None,
            priority,
            color: None,
            icon: None,
            hide_ghost_text: false,
        }
    }
}

/// What the user is completing.
#[derive(Clone, Copy, Debug)]
pub struct CompletionRequest<'req> {
    pub editing_name: bool,
    /// Property whose value is being edited; ignored for names.
    pub property_name: &'req str,
    /// Text before the caret in the current word.
    pub query: &'req str,
    pub node_is_svg: bool,
    pub svg_properties_for_html: bool,
}

/// Computed styles used for flex icons on value suggestions.
#[derive(Clone, Copy, Debug, Default)]
pub struct CompletionStyles<'ctx> {
    pub computed: Option<&'ctx ComputedStyle>,
    pub parent_computed: Option<&'ctx ComputedStyle>,
}

fn variable_color<M: CascadeModel>(model: &M, style: StyleId, name: &str) -> Option<Rgba8Snapshot> {
    model
        .compute_variable(style, name)
        .and_then(|value| parse_css_color(&value))
        .map(Rgba8Snapshot::from)
}

/// Whether a query is typed in capitals, so suggestions follow suit.
fn is_uppercase_query(query: &str) -> bool {
    query.chars().any(|character| character.is_ascii_alphabetic())
        && !query.chars().any(|character| character.is_ascii_lowercase())
}

/// Rank `candidates` against `query`: prefix matches first, then substring matches.
fn filter_by_query(candidates: Vec<Completion>, query: &str) -> Vec<Completion> {
    let lower_query = query.to_ascii_lowercase();
    let (mut prefix, mut anywhere): (Vec<Completion>, Vec<Completion>) = candidates
        .into_iter()
        .filter(|completion| completion.text.to_ascii_lowercase().contains(&lower_query))
        .partition(|completion| completion.text.to_ascii_lowercase().starts_with(&lower_query));
    prefix.sort_by(|left, right| right.priority.cmp(&left.priority));
    anywhere.sort_by(|left, right| right.priority.cmp(&left.priority));
    prefix.extend(anywhere);
    prefix
}

/// Suggestions for the field being edited in a row of `style`.
pub fn completions<M: CascadeModel>(
    model: &M,
    style: StyleId,
    request: &CompletionRequest<'_>,
    styles: CompletionStyles<'_>,
) -> Vec<Completion> {
    let variables = model.available_variables(style);
    let lower_query = request.query.to_ascii_lowercase();

    let mut results = if request.editing_name {
        name_completions(request, &variables)
    } else if let Some(variable_query) = lower_query.strip_prefix("var(") {
        let candidates = variables
            .iter()
            .map(|name| Completion {
                color: variable_color(model, style, name),
                ..Completion::plain(format!("{name})"), 0)
            })
            .collect();
        filter_by_query(candidates, variable_query)
    } else {
        value_completions(model, style, request, &variables, styles)
    };

    if !request.editing_name
        && results.is_empty()
        && request.query.len() > 1
        && "!important".starts_with(&lower_query)
    {
        results.push(Completion::plain("!important".to_owned(), 0));
    }

    if is_uppercase_query(request.query) {
        for completion in &mut results {
            if !is_custom_property(&completion.text) {
                completion.text = completion.text.to_ascii_uppercase();
            }
        }
    }
    results
}

fn name_completions(request: &CompletionRequest<'_>, variables: &[String]) -> Vec<Completion> {
    let offer_svg = request.node_is_svg || request.svg_properties_for_html;
    let mut candidates: Vec<Completion> = metadata::all_properties()
        .filter(|name| offer_svg || !metadata::is_svg_only(name))
        .map(|name| Completion::plain(name.to_owned(), metadata::usage_weight(name)))
        .collect();
    candidates.extend(variables.iter().map(|name| Completion::plain(name.clone(), 1)));
    let mut results = filter_by_query(candidates, request.query);
    if !request.query.is_empty() {
        let lower_query = request.query.to_ascii_lowercase();
        results.extend(
            NAME_VALUE_PRESETS
                .iter()
                .filter(|preset| preset.starts_with(&lower_query))
                .map(|preset| Completion {
                    title: Some((*preset).to_owned()),
                    hide_ghost_text: true,
                    ..Completion::plain((*preset).to_owned(), 0)
                }),
        );
    }
    results
}

fn value_completions<M: CascadeModel>(
    model: &M,
    style: StyleId,
    request: &CompletionRequest<'_>,
    variables: &[String],
    styles: CompletionStyles<'_>,
) -> Vec<Completion> {
    let name = request.property_name;
    let mut candidates: Vec<Completion> = metadata::property_values(name)
        .into_iter()
        .map(|value| Completion {
            icon: find_icon(&format!("{name}: {value}"), styles.computed, styles.parent_computed),
            ..Completion::plain(value.to_owned(), 0)
        })
        .collect();
    if name.eq_ignore_ascii_case("font-family") {
        let mut families: Vec<String> = model
            .font_faces()
            .into_iter()
            .map(|face| format!("\"{}\"", face.family))
            .collect();
        families.sort();
        families.dedup();
        candidates.extend(families.into_iter().map(|family| Completion::plain(family, 0)));
    }
    let color_aware = metadata::is_color_aware(name);
    candidates.extend(variables.iter().map(|variable| {
        let color = color_aware.then(|| variable_color(model, style, variable)).flatten();
        Completion {
            color,
            ..Completion::plain(format!("var({variable})"), u32::from(color.is_some()))
        }
    }));
    filter_by_query(candidates, request.query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uppercase_queries_are_recognised() {
        assert!(is_uppercase_query("BLO"));
        assert!(!is_uppercase_query("Blo"));
        assert!(!is_uppercase_query("12"));
    }

    #[test]
    fn prefix_matches_precede_substring_matches() {
        let ranked = filter_by_query(
            vec![
                Completion::plain("inline-block".to_owned(), 5),
                Completion::plain("block".to_owned(), 0),
                Completion::plain("flex".to_owned(), 9),
            ],
            "bl",
        );
        let texts: Vec<&str> = ranked.iter().map(|completion| completion.text.as_str()).collect();
        assert_eq!(texts, ["block", "inline-block"]);
    }
}
