//! Inline editing of a property row.
//!
//! Everything here is pure: the session snapshot taken when editing starts,
//! the decision table run when an edit is committed, where focus goes next,
//! and the Up/Down value modification. The pane executes the outcome.

use crate::metadata;
use crate::model::Declaration;
use core::ops::Range;
use css_values_units::{modify_numeric_token, split_numeric_token};

const VALUE_DELIMITERS: &[char] = &[
    ' ', '\u{a0}', '\t', '\n', '"', '\'', ':', ';', ',', '/', '(', ')',
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveDirection {
    Forward,
    Backward,
}

/// Which span of a row is edited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditField {
    Name,
    Value,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl_or_meta: bool,
    pub alt: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Tab,
    Backspace,
    ArrowUp,
    ArrowDown,
    PageUp,
    PageDown,
    Other,
}

/// A key press inside an edited field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub modifiers: Modifiers,
    /// Field text at the time of the press.
    pub text: String,
    /// Caret byte offset into `text`.
    pub caret: usize,
}

impl KeyInput {
    pub fn new(key: Key, text: &str, caret: usize) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
            text: text.to_owned(),
            caret,
        }
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// State captured when a row enters editing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditSession {
    pub is_editing_name: bool,
    pub has_children: bool,
    pub expanded: bool,
    /// Field text when editing started.
    pub previous_content: String,
    /// Name and value before a `name: value` paste split them.
    pub original_name: Option<String>,
    pub original_value: Option<String>,
    pub original_property: Declaration,
}

impl EditSession {
    pub fn new(field: EditField, declaration: &Declaration, has_children: bool, expanded: bool) -> Self {
        let is_editing_name = field == EditField::Name;
        Self {
            is_editing_name,
            has_children,
            expanded,
            previous_content: if is_editing_name {
                declaration.name.clone()
            } else {
                declaration.value.clone()
            },
            original_name: None,
            original_value: None,
            original_property: declaration.clone(),
        }
    }

    pub const fn field(&self) -> EditField {
        if self.is_editing_name {
            EditField::Name
        } else {
            EditField::Value
        }
    }

    /// Remember the pre-paste pair once.
    pub fn remember_original(&mut self, name: &str, value: &str) {
        if self.original_name.is_none() {
            self.original_name = Some(name.to_owned());
            self.original_value = Some(value.to_owned());
        }
    }
}

/// Row facts the commit decision needs.
#[derive(Clone, Debug)]
pub struct CommitInput<'input> {
    pub user_input: &'input str,
    pub session: &'input EditSession,
    pub direction: Option<MoveDirection>,
    pub new_property: bool,
    /// Current name and value spans, after any paste split.
    pub name_text: &'input str,
    pub value_text: &'input str,
    /// Declaration name and value the text is combined with.
    pub current_name: &'input str,
    pub current_value: &'input str,
    pub row: usize,
    /// Nearest non-inherited sibling in the commit direction.
    pub sibling: Option<usize>,
}

/// What a commit does before focus moves on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitPlan {
    /// Text to apply as a major change; `None` only updates the row locally.
    pub apply_text: Option<String>,
    /// Row to continue editing, by position before the commit.
    pub move_to: Option<usize>,
    pub create_new_property: bool,
    pub move_to_selector: bool,
    pub abandon_new_property: bool,
    pub property_split_paste: bool,
    pub blank_input: bool,
}

fn is_blank(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

/// Decide how a committed edit is applied.
pub fn plan_commit(input: &CommitInput<'_>) -> CommitPlan {
    let session = input.session;
    let editing_name = session.is_editing_name;
    let data_pasted = session.original_name.is_some();
    let original_value = session.original_value.as_deref().unwrap_or_default();
    let dirty_via_paste = data_pasted
        && (Some(input.name_text) != session.original_name.as_deref()
            || input.value_text != original_value);
    let property_split_paste = data_pasted && editing_name && input.value_text != original_value;
    let forward = input.direction == Some(MoveDirection::Forward);
    let backward = input.direction == Some(MoveDirection::Backward);
    let move_to_other = editing_name != forward;
    let abandon_new_property =
        input.new_property && input.user_input.is_empty() && (move_to_other || editing_name);

    let mut plan = CommitPlan {
        move_to: Some(input.row),
        abandon_new_property,
        property_split_paste,
        blank_input: is_blank(input.user_input),
        ..CommitPlan::default()
    };
    if (forward && (!editing_name || property_split_paste)) || (backward && editing_name) {
        plan.move_to = input.sibling;
        if plan.move_to.is_none() {
            if forward && (!input.new_property || !input.user_input.is_empty()) {
                plan.create_new_property = true;
            } else if backward {
                plan.move_to_selector = true;
            }
        }
    }

    // A colon typed into the name field turns it into a whole declaration.
    let name_value_entered = editing_name && input.name_text.contains(':');
    let commit_new_property = input.new_property
        && (property_split_paste
            || move_to_other
            || (input.direction.is_none() && !editing_name)
            || (editing_name && plan.blank_input)
            || name_value_entered);
    let changed = input.user_input != session.previous_content || dirty_via_paste;
    if (changed && !input.new_property) || commit_new_property {
        let text = if name_value_entered {
            input.name_text.to_owned()
        } else if plan.blank_input || (input.new_property && is_blank(input.value_text)) {
            String::new()
        } else if editing_name {
            format!("{}: {}", input.user_input, input.current_value)
        } else {
            format!("{}: {}", input.current_name, input.user_input)
        };
        plan.apply_text = Some(text);
    }
    plan
}

/// Where focus goes once the commit settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Continuation {
    Done,
    EditRow { row: usize, field: EditField },
    AddBlankProperty,
    /// Edit the selector of the current or the next editable section.
    Selector {
        next_section: bool,
        direction: MoveDirection,
    },
}

/// Section facts after the commit was applied.
#[derive(Clone, Copy, Debug)]
pub struct CommitOutcome {
    pub direction: Option<MoveDirection>,
    pub editing_name: bool,
    /// The row was new when the commit started.
    pub already_new: bool,
    pub value_changed: bool,
    /// Rows were rebuilt, so `move_to` must be re-resolved by position.
    pub rows_rebuilt: bool,
    pub row_count: usize,
    /// A sibling exists next to an abandoned new row.
    pub sibling_after_abandon: bool,
}

/// Resolve the focus move that follows a commit.
pub fn continue_after_commit(plan: &CommitPlan, outcome: &CommitOutcome) -> Continuation {
    let Some(direction) = outcome.direction else {
        return Continuation::Done;
    };
    let editing_name = outcome.editing_name;
    let mut create_new_property = plan.create_new_property;
    let mut move_to_selector = plan.move_to_selector;
    if let Some(target) = plan.move_to {
        if !outcome.rows_rebuilt && target < outcome.row_count {
            let field = if editing_name {
                EditField::Value
            } else {
                EditField::Name
            };
            return Continuation::EditRow { row: target, field };
        }
        let mut index = target as isize;
        if direction == MoveDirection::Forward && plan.blank_input && !editing_name {
            index -= 1;
        }
        if index >= outcome.row_count as isize && !outcome.already_new {
            create_new_property = true;
        } else if index >= 0 && (index as usize) < outcome.row_count {
            let mut field = if !editing_name || plan.property_split_paste {
                EditField::Name
            } else {
                EditField::Value
            };
            if outcome.already_new && plan.blank_input {
                field = if direction == MoveDirection::Forward {
                    EditField::Name
                } else {
                    EditField::Value
                };
            }
            return Continuation::EditRow {
                row: index as usize,
                field,
            };
        } else if !outcome.already_new {
            move_to_selector = true;
        }
    }
    if create_new_property {
        if outcome.already_new
            && !outcome.value_changed
            && (editing_name != (direction == MoveDirection::Backward))
        {
            return Continuation::Done;
        }
        return Continuation::AddBlankProperty;
    }
    if plan.abandon_new_property {
        return Continuation::Selector {
            next_section: !(outcome.sibling_after_abandon || direction == MoveDirection::Backward),
            direction,
        };
    }
    if move_to_selector {
        return Continuation::Selector {
            next_section: false,
            direction,
        };
    }
    Continuation::Done
}

/// Key-down outcome for an edited field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Commit(MoveDirection),
    Cancel,
    /// Up/Down style value step.
    Modify(ValueStep),
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueStep {
    Up,
    Down,
    PageUp,
    PageDown,
}

/// Map a key press to an editing action.
pub fn key_action(input: &KeyInput, editing_name: bool, new_property: bool) -> KeyAction {
    match input.key {
        Key::Enter if !input.modifiers.shift => KeyAction::Commit(MoveDirection::Forward),
        Key::Escape => KeyAction::Cancel,
        Key::Backspace if !editing_name && new_property && input.caret == 0 => {
            KeyAction::Commit(MoveDirection::Backward)
        }
        Key::Tab if input.modifiers.shift => KeyAction::Commit(MoveDirection::Backward),
        Key::Tab => KeyAction::Commit(MoveDirection::Forward),
        Key::ArrowUp if !editing_name => KeyAction::Modify(ValueStep::Up),
        Key::ArrowDown if !editing_name => KeyAction::Modify(ValueStep::Down),
        Key::PageUp if !editing_name => KeyAction::Modify(ValueStep::PageUp),
        Key::PageDown if !editing_name => KeyAction::Modify(ValueStep::PageDown),
        Key::Enter
        | Key::Backspace
        | Key::ArrowUp
        | Key::ArrowDown
        | Key::PageUp
        | Key::PageDown
        | Key::Other => KeyAction::None,
    }
}

/// Whether a `;` typed at `caret` ends the value, i.e. is not inside a string.
pub fn semicolon_commits_value(text: &str, caret: usize) -> bool {
    let mut open_quote: Option<char> = None;
    let mut chars = text.get(..caret).unwrap_or(text).chars();
    while let Some(character) = chars.next() {
        match (open_quote, character) {
            (Some(_), '\\') => {
                chars.next();
            }
            (None, '"' | '\'') => open_quote = Some(character),
            (Some(quote), current) if quote == current => open_quote = None,
            _ => {}
        }
    }
    open_quote.is_none()
}

/// Whether a typed character terminates the field.
pub fn terminates_field(character: char, editing_name: bool, text: &str, caret: usize) -> bool {
    if editing_name {
        character == ':'
    } else {
        character == ';' && semicolon_commits_value(text, caret)
    }
}

/// Split pasted or typed `name: value` text at the first colon.
pub fn split_property_text(text: &str) -> Option<(String, String)> {
    let (name, value) = text.split_once(':')?;
    Some((name.trim().to_owned(), value.trim().to_owned()))
}

/// Result of an Up/Down modification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueModification {
    pub text: String,
    /// Range of the replaced word in the new text.
    pub word: Range<usize>,
}

fn word_around(text: &str, caret: usize) -> Range<usize> {
    let caret = caret.min(text.len());
    let start = text
        .get(..caret)
        .and_then(|head| head.rfind(VALUE_DELIMITERS))
        .map_or(0, |position| position + 1);
    let end = text
        .get(caret..)
        .and_then(|tail| tail.find(VALUE_DELIMITERS))
        .map_or(text.len(), |position| caret + position);
    start..end.max(start)
}

fn number_delta(step: ValueStep, modifiers: Modifiers) -> f64 {
    let mut delta = if modifiers.ctrl_or_meta {
        100.0
    } else if modifiers.shift {
        10.0
    } else if modifiers.alt {
        0.1
    } else {
        1.0
    };
    if matches!(step, ValueStep::PageUp | ValueStep::PageDown) {
        delta *= 10.0;
    }
    if matches!(step, ValueStep::Down | ValueStep::PageDown) {
        delta = -delta;
    }
    delta
}

/// Step one hex color, channel chosen by the modifiers.
pub fn modify_hex(hex: &str, step: ValueStep, modifiers: Modifiers) -> Option<String> {
    let number = i64::from_str_radix(hex, 16).ok()?;
    let channel_len = match hex.len() {
        3 => 1,
        6 => 2,
        _ => return None,
    };
    let mut delta = 0i64;
    if modifiers.ctrl_or_meta {
        delta += 16i64.pow(channel_len * 2);
    }
    if modifiers.shift {
        delta += 16i64.pow(channel_len);
    }
    if modifiers.alt {
        delta += 1;
    }
    if delta == 0 {
        delta = 1;
    }
    if matches!(step, ValueStep::Down | ValueStep::PageDown) {
        delta = -delta;
    }
    let max = 16i64.pow(hex.len() as u32) - 1;
    let result = (number + delta).clamp(0, max);
    Some(format!("{result:0width$X}", width = hex.len()))
}

/// Increment or decrement the number or hex color under the caret.
pub fn modify_value_at(
    property_name: &str,
    text: &str,
    caret: usize,
    step: ValueStep,
    modifiers: Modifiers,
) -> Option<ValueModification> {
    let word_range = word_around(text, caret);
    let word = text.get(word_range.clone())?;
    if word.is_empty() {
        return None;
    }
    let replacement = if let Some(hash) = word.find('#')
        && let Some(hex_tail) = word.get(hash + 1..)
        && !hex_tail.is_empty()
        && hex_tail.chars().all(|character| character.is_ascii_hexdigit())
    {
        let modified = modify_hex(hex_tail, step, modifiers)?;
        format!("{}{modified}", word.get(..=hash)?)
    } else {
        let token = split_numeric_token(word)?;
        let mut modified = modify_numeric_token(word, number_delta(step, modifiers))?;
        let is_zero = split_numeric_token(&modified)
            .is_some_and(|updated| updated.value.abs() < f64::EPSILON);
        if token.suffix.is_empty()
            && !is_zero
            && metadata::is_length_property(property_name)
            && !text.trim_start().to_ascii_lowercase().starts_with("calc(")
        {
            modified.push_str("px");
        }
        modified
    };
    let mut updated = String::with_capacity(text.len() + replacement.len());
    updated.push_str(text.get(..word_range.start)?);
    updated.push_str(&replacement);
    updated.push_str(text.get(word_range.end..)?);
    Some(ValueModification {
        word: word_range.start..word_range.start + replacement.len(),
        text: updated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StyleId;

    fn session(editing_name: bool, previous: &str) -> EditSession {
        let mut declaration = Declaration::blank(StyleId(0), 0);
        declaration.name = "color".to_owned();
        declaration.value = "red".to_owned();
        let mut created = EditSession::new(
            if editing_name { EditField::Name } else { EditField::Value },
            &declaration,
            false,
            false,
        );
        created.previous_content = previous.to_owned();
        created
    }

    fn input<'input>(session: &'input EditSession, user_input: &'input str) -> CommitInput<'input> {
        CommitInput {
            user_input,
            session,
            direction: Some(MoveDirection::Forward),
            new_property: false,
            name_text: "color",
            value_text: "red",
            current_name: "color",
            current_value: "red",
            row: 0,
            sibling: None,
        }
    }

    #[test]
    fn colon_in_name_replaces_whole_declaration() {
        let edit = session(true, "color");
        let mut commit = input(&edit, "padding: 4px");
        commit.name_text = "padding: 4px";
        commit.direction = None;
        let plan = plan_commit(&commit);
        assert_eq!(plan.apply_text.as_deref(), Some("padding: 4px"));

        commit.new_property = true;
        commit.value_text = "";
        let fresh = plan_commit(&commit);
        assert_eq!(fresh.apply_text.as_deref(), Some("padding: 4px"));
    }

    #[test]
    fn unchanged_value_is_a_noop() {
        let edit = session(false, "red");
        let plan = plan_commit(&input(&edit, "red"));
        assert_eq!(plan.apply_text, None);
        assert!(plan.create_new_property);
    }

    #[test]
    fn changed_value_applies_name_and_value() {
        let edit = session(false, "red");
        let plan = plan_commit(&input(&edit, "blue"));
        assert_eq!(plan.apply_text.as_deref(), Some("color: blue"));
    }

    #[test]
    fn blank_value_deletes() {
        let edit = session(false, "red");
        let plan = plan_commit(&input(&edit, "  "));
        assert_eq!(plan.apply_text.as_deref(), Some(""));
        assert!(plan.blank_input);
    }

    #[test]
    fn new_property_name_tab_moves_to_value() {
        let edit = session(true, "");
        let mut commit = input(&edit, "margin");
        commit.new_property = true;
        let plan = plan_commit(&commit);
        assert_eq!(plan.apply_text, None);
        let next = continue_after_commit(
            &plan,
            &CommitOutcome {
                direction: Some(MoveDirection::Forward),
                editing_name: true,
                already_new: true,
                value_changed: false,
                rows_rebuilt: false,
                row_count: 1,
                sibling_after_abandon: false,
            },
        );
        assert_eq!(
            next,
            Continuation::EditRow {
                row: 0,
                field: EditField::Value
            }
        );
    }

    #[test]
    fn semicolon_inside_string_does_not_commit() {
        assert!(!semicolon_commits_value("url(\"a;", 7));
        assert!(semicolon_commits_value("\"a\" b", 5));
        assert!(terminates_field(':', true, "color", 5));
    }

    #[test]
    fn number_steps_follow_modifiers() {
        let shifted = Modifiers {
            shift: true,
            ..Modifiers::default()
        };
        let step = |text: &str, caret, modifiers| {
            modify_value_at("margin-top", text, caret, ValueStep::Up, modifiers)
                .map(|modified| modified.text)
        };
        assert_eq!(step("10px", 1, Modifiers::default()).as_deref(), Some("11px"));
        assert_eq!(step("10px", 1, shifted).as_deref(), Some("20px"));
        assert_eq!(step("1", 0, Modifiers::default()).as_deref(), Some("2px"));
        assert_eq!(step("calc(1 + 2px)", 5, Modifiers::default()).as_deref(), Some("calc(2 + 2px)"));
        assert_eq!(step("auto", 1, Modifiers::default()), None);
    }

    #[test]
    fn hex_channels_follow_modifiers() {
        let ctrl = Modifiers {
            ctrl_or_meta: true,
            ..Modifiers::default()
        };
        assert_eq!(modify_hex("000000", ValueStep::Up, ctrl).as_deref(), Some("010000"));
        assert_eq!(modify_hex("fff", ValueStep::Up, Modifiers::default()).as_deref(), Some("FFF"));
        assert_eq!(modify_hex("000", ValueStep::Down, Modifiers::default()).as_deref(), Some("000"));
    }
}
