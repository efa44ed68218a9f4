//! CSS Custom Properties for Cascading Variables Module Level 1: CSS variables.
//! Reference: <https://www.w3.org/TR/css-variables-1/>

#![forbid(unsafe_code)]

use core::ops::Range;
use std::collections::HashMap;

/// Alias used by helpers that operate on a set of custom properties.
/// Keys are property names (including the leading `--`); values are raw token strings.
pub type CustomProperties = HashMap<String, String>;

/// Whether `name` is a custom property name.
#[inline]
pub fn is_custom_property(name: &str) -> bool {
    name.starts_with("--")
}

/// Extract custom properties (`--*`) from ordered declarations; later entries win.
///
/// See <https://www.w3.org/TR/css-variables-1/#custom-properties>
pub fn extract_custom_properties<'decl, I>(declarations: I) -> CustomProperties
where
    I: IntoIterator<Item = (&'decl str, &'decl str)>,
{
    declarations
        .into_iter()
        .filter(|(name, _)| is_custom_property(name))
        .map(|(name, value)| (name.to_owned(), value.trim().to_owned()))
        .collect()
}

/// A `var()` reference: `var(--name)` or `var(--name, fallback)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VarReference {
    /// Referenced custom property name.
    pub name: String,
    /// Fallback text, if any.
    pub fallback: Option<String>,
}

/// Result of resolving a single `var()` reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedVariable {
    /// Fully substituted value.
    pub value: String,
    /// Whether the fallback supplied the value.
    pub from_fallback: bool,
}

/// Find the byte offset of the `)` that closes a `(` opened just before `text`.
fn closing_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (index, character) in text.char_indices() {
        match (quote, character) {
            (Some(open), current) if current == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(character),
            (None, '(') => depth = depth.saturating_add(1),
            (None, ')') if depth == 0 => return Some(index),
            (None, ')') => depth = depth.saturating_sub(1),
            (None, _) => {}
        }
    }
    None
}

/// Split at the first top-level comma.
fn split_top_level_comma(text: &str) -> (&str, Option<&str>) {
    let mut depth = 0usize;
    for (index, character) in text.char_indices() {
        match character {
            '(' => depth = depth.saturating_add(1),
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                return (
                    text.get(..index).unwrap_or(text),
                    text.get(index.saturating_add(1)..),
                );
            }
            _ => {}
        }
    }
    (text, None)
}

/// Parse text that is exactly one `var()` function.
pub fn parse_var_function(text: &str) -> Option<VarReference> {
    let trimmed = text.trim();
    let head = trimmed.get(..4)?;
    if !head.eq_ignore_ascii_case("var(") {
        return None;
    }
    let inner_and_tail = trimmed.get(4..)?;
    let close = closing_paren(inner_and_tail)?;
    if close.saturating_add(1) != inner_and_tail.len() {
        return None;
    }
    let (name, fallback) = split_top_level_comma(inner_and_tail.get(..close)?);
    let name = name.trim();
    if !is_custom_property(name) {
        return None;
    }
    Some(VarReference {
        name: name.to_owned(),
        fallback: fallback.map(|text| text.trim().to_owned()),
    })
}

/// Byte ranges of every top-level `var()` function in `text`.
pub fn find_var_functions(text: &str) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let lower = text.to_ascii_lowercase();
    let mut cursor = 0;
    while let Some(offset) = lower.get(cursor..).and_then(|rest| rest.find("var(")) {
        let start = cursor.saturating_add(offset);
        let body_start = start.saturating_add(4);
        let Some(close) = text.get(body_start..).and_then(closing_paren) else {
            break;
        };
        let end = body_start.saturating_add(close).saturating_add(1);
        out.push(start..end);
        cursor = end;
    }
    out
}

/// Resolve every `var()` in `value_text` with `lookup`.
///
/// Returns `None` when a reference cannot be resolved and has no fallback, or
/// when a cycle is detected without a fallback (the value is then invalid at
/// computed-value time).
///
/// See <https://www.w3.org/TR/css-variables-1/#using-variables>
pub fn resolve_vars_in_value<F>(value_text: &str, lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    resolve_vars_internal(value_text, lookup, &mut Vec::new())
}

/// Resolve text that is exactly one `var()` and report whether the fallback was used.
pub fn resolve_single_variable<F>(text: &str, lookup: &F) -> Option<ResolvedVariable>
where
    F: Fn(&str) -> Option<String>,
{
    let reference = parse_var_function(text)?;
    let mut stack = Vec::new();
    if let Some(value) = resolve_reference_value(&reference.name, lookup, &mut stack) {
        return Some(ResolvedVariable {
            value,
            from_fallback: false,
        });
    }
    let fallback = reference.fallback?;
    let value = resolve_vars_internal(&fallback, lookup, &mut stack)?;
    Some(ResolvedVariable {
        value,
        from_fallback: true,
    })
}

/// Internal recursive resolver that carries the resolution stack for cycle detection.
///
/// See <https://www.w3.org/TR/css-variables-1/#cycles>
fn resolve_vars_internal<F>(value_text: &str, lookup: &F, stack: &mut Vec<String>) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let ranges = find_var_functions(value_text);
    if ranges.is_empty() {
        return Some(value_text.to_owned());
    }
    let mut out = String::with_capacity(value_text.len());
    let mut cursor = 0;
    for range in ranges {
        out.push_str(value_text.get(cursor..range.start)?);
        let function = value_text.get(range.clone())?;
        let reference = parse_var_function(function)?;
        let resolved = match resolve_reference_value(&reference.name, lookup, stack) {
            Some(resolved) => resolved,
            None => resolve_vars_internal(&reference.fallback?, lookup, stack)?,
        };
        out.push_str(&resolved);
        cursor = range.end;
    }
    out.push_str(value_text.get(cursor..)?);
    Some(out)
}

/// Look up and recursively expand one custom property.
fn resolve_reference_value<F>(name: &str, lookup: &F, stack: &mut Vec<String>) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    if stack.iter().any(|entry| entry == name) {
        return None;
    }
    let raw = lookup(name)?;
    stack.push(name.to_owned());
    let expanded = resolve_vars_internal(&raw, lookup, stack);
    stack.pop();
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> CustomProperties {
        extract_custom_properties(pairs.iter().copied())
    }

    #[test]
    fn nested_fallback_with_parentheses() {
        let props = env(&[("--a", "var(--b)"), ("--b", "4px")]);
        let lookup = |name: &str| props.get(name).cloned();
        assert_eq!(
            resolve_vars_in_value("calc(var(--a) + var(--missing, rgb(1, 2, 3)))", &lookup)
                .as_deref(),
            Some("calc(4px + rgb(1, 2, 3))")
        );
        assert_eq!(resolve_vars_in_value("var(--missing)", &lookup), None);
    }

    #[test]
    fn single_variable_reports_fallback_use() {
        let props = env(&[("--x", "var(--y)"), ("--y", "var(--x)"), ("--c", "red")]);
        let lookup = |name: &str| props.get(name).cloned();
        assert_eq!(
            resolve_single_variable("var(--x, blue)", &lookup),
            Some(ResolvedVariable {
                value: "blue".to_owned(),
                from_fallback: true
            })
        );
        assert_eq!(
            resolve_single_variable("var(--c)", &lookup).map(|resolved| resolved.from_fallback),
            Some(false)
        );
        assert!(parse_var_function("var(--c) x").is_none());
    }
}
