#![cfg(test)]
#![allow(
    clippy::missing_errors_doc,
    reason = "Test helpers return Result for clear propagation"
)]
#![allow(
    clippy::too_many_lines,
    reason = "Integration-style test setup is verbose"
)]

use core::error::Error;
use css_inspector::memory::Mutation;
use css_inspector::model::{NodeId, StyleOrigin, StyleSheetId};
use css_inspector::popover::values::EditorWidget;
use css_inspector::property::editing::{Continuation, EditField, Key, KeyInput, MoveDirection};
use css_inspector::{
    InspectorConfig, KeyOutcome, MemoryCascade, PaneController, PopoverHelper, PropertyPath,
    SectionId,
};

#[derive(Default)]
struct NoPopover;

impl PopoverHelper for NoPopover {
    fn show(&mut self, _widget: EditorWidget, _anchor: PropertyPath) {}

    fn hide(&mut self) {}

    fn is_showing(&self) -> bool {
        false
    }

    fn reposition(&mut self) {}
}

type Pane = PaneController<MemoryCascade, NoPopover>;

/// `<html><body><div id=main class=box>` selected, with one author sheet.
fn cascade_with(css: &str) -> (MemoryCascade, NodeId, StyleSheetId) {
    let mut cascade = MemoryCascade::new();
    let html = cascade.add_element(None, "html", None, &[]);
    let body = cascade.add_element(Some(html), "body", None, &[]);
    let div = cascade.add_element(Some(body), "div", Some("main"), &["box"]);
    let sheet = cascade.add_stylesheet(StyleOrigin::Regular, css);
    cascade.select(div);
    (cascade, div, sheet)
}

async fn pane_with(css: &str) -> Result<(Pane, SectionId), Box<dyn Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let (cascade, _, _) = cascade_with(css);
    let mut pane = PaneController::new(cascade, NoPopover, InspectorConfig::default());
    pane.update().await?;
    let id = pane.find_section(".box").ok_or("missing .box section")?;
    Ok((pane, id))
}

fn style_text(pane: &Pane, id: SectionId) -> Result<String, Box<dyn Error>> {
    let style = pane.section(id).and_then(|section| section.style()).ok_or("no style")?;
    Ok(pane.model().style_text(style))
}

#[tokio::test]
async fn committed_value_reaches_backend_and_row() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box {\n  color: red;\n  margin: 1px;\n}").await?;
    let path = PropertyPath::new(id, 0);
    assert!(pane.start_editing(path, EditField::Value).await?);
    assert!(pane.is_editing_style());
    pane.edit_text_changed("blue").await?;
    let continuation = pane.commit_editing(Some(MoveDirection::Forward)).await?;

    assert_eq!(
        continuation,
        Continuation::EditRow {
            row: 1,
            field: EditField::Name
        }
    );
    assert_eq!(pane.editing_property(), Some(PropertyPath::new(id, 1)));
    assert_eq!(pane.property(path).map(|row| row.value().to_owned()).as_deref(), Some("blue"));
    assert_eq!(style_text(&pane, id)?, "color: blue; margin: 1px;");
    assert!(pane.model().mutations().iter().any(|mutation| matches!(
        mutation,
        Mutation::SetDeclarationText { text, major: true, overwrite: true, success: true, .. }
            if text == "color: blue;"
    )));
    Ok(())
}

#[tokio::test]
async fn unchanged_commit_sends_nothing() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { color: red }").await?;
    let path = PropertyPath::new(id, 0);
    pane.start_editing(path, EditField::Value).await?;
    pane.edit_text_changed("red").await?;
    pane.blur().await?;
    assert_eq!(pane.model().text_mutation_count(), 0);
    assert_eq!(pane.editing_property(), None);
    assert!(!pane.is_editing_style());
    Ok(())
}

#[tokio::test]
async fn emptied_value_deletes_row_and_shifts_indices() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { color: red; margin: 1px; padding: 2px; }").await?;
    pane.start_editing(PropertyPath::new(id, 0), EditField::Value).await?;
    pane.edit_text_changed("").await?;
    pane.commit_editing(None).await?;

    let section = pane.section(id).ok_or("section vanished")?;
    let rows: Vec<(&str, usize)> = section
        .properties()
        .iter()
        .map(|row| (row.name(), row.declaration().index))
        .collect();
    assert_eq!(rows, vec![("margin", 0), ("padding", 1)]);
    assert_eq!(style_text(&pane, id)?, "margin: 1px; padding: 2px;");
    Ok(())
}

#[tokio::test]
async fn tab_past_last_value_adds_blank_row() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { color: red; margin: 1px; }").await?;
    pane.start_editing(PropertyPath::new(id, 1), EditField::Value).await?;
    let outcome = pane.key_down(KeyInput::new(Key::Tab, "2px", 3)).await?;

    assert_eq!(outcome, KeyOutcome::Committed(Continuation::AddBlankProperty));
    let section = pane.section(id).ok_or("section vanished")?;
    assert_eq!(section.properties().len(), 3);
    assert!(section.property(2).is_some_and(|row| row.is_new() && row.is_editing()));
    assert_eq!(pane.editing_property(), Some(PropertyPath::new(id, 2)));
    assert_eq!(style_text(&pane, id)?, "color: red; margin: 2px;");
    Ok(())
}

#[tokio::test]
async fn pasted_declaration_fills_name_and_value() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { color: red; }").await?;
    let blank = pane.add_blank_property(id, None)?.ok_or("no blank row")?;
    assert_eq!(blank, PropertyPath::new(id, 1));

    let continuation = pane.paste("background: green", 0..0).await?;
    assert_eq!(continuation, Some(Continuation::AddBlankProperty));
    assert_eq!(style_text(&pane, id)?, "color: red; background: green;");
    let section = pane.section(id).ok_or("section vanished")?;
    assert_eq!(section.property(1).map(|row| row.value().to_owned()).as_deref(), Some("green"));
    assert!(section.property(2).is_some_and(|row| row.is_new()));
    Ok(())
}

#[tokio::test]
async fn typing_colon_moves_to_value() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { color: red; }").await?;
    let blank = pane.add_blank_property(id, None)?.ok_or("no blank row")?;
    pane.edit_text_changed("width").await?;
    let continuation = pane.key_press(':', "width", 5).await?;
    assert_eq!(
        continuation,
        Some(Continuation::EditRow {
            row: blank.index,
            field: EditField::Value
        })
    );
    assert_eq!(
        pane.property(blank)
            .and_then(|row| row.edit_session())
            .map(|session| session.is_editing_name),
        Some(false)
    );
    assert_eq!(pane.model().text_mutation_count(), 0);

    pane.edit_text_changed("10px").await?;
    pane.key_press(';', "10px", 4).await?;
    assert_eq!(style_text(&pane, id)?, "color: red; width: 10px;");
    Ok(())
}

#[tokio::test]
async fn free_flow_edits_collapse_and_cancel_restores() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { color: red; margin: 1px; }").await?;
    let path = PropertyPath::new(id, 0);
    pane.start_editing(path, EditField::Value).await?;
    pane.edit_text_changed("b").await?;
    pane.edit_text_changed("bl").await?;
    pane.edit_text_changed("blue").await?;
    let row = pane.property(path).ok_or("row vanished")?;
    assert_eq!(row.throttle().superseded(), 2);
    assert!(row.throttle().has_pending());

    pane.flush_pending_edits().await?;
    assert_eq!(pane.model().text_mutation_count(), 1);
    assert_eq!(style_text(&pane, id)?, "color: blue; margin: 1px;");
    assert!(pane.property(path).is_some_and(|row| row.edited_incrementally()));

    pane.cancel_editing().await?;
    assert_eq!(style_text(&pane, id)?, "color: red; margin: 1px;");
    assert_eq!(pane.property(path).map(|row| row.value().to_owned()).as_deref(), Some("red"));
    assert!(!pane.is_editing_style());
    Ok(())
}

#[tokio::test]
async fn rejected_commit_rolls_back() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { color: red; }").await?;
    let path = PropertyPath::new(id, 0);
    pane.start_editing(path, EditField::Value).await?;
    pane.edit_text_changed("green").await?;
    pane.model_mut().fail_next_mutations(1);
    pane.commit_editing(None).await?;

    assert_eq!(style_text(&pane, id)?, "color: red;");
    let row = pane.property(path).ok_or("row vanished")?;
    assert_eq!(row.value(), "red");
    assert_eq!(row.field_text(EditField::Value), "red");
    Ok(())
}

#[tokio::test]
async fn rejected_commit_after_live_edit_restores_original() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { color: red; margin: 1px; }").await?;
    let path = PropertyPath::new(id, 0);
    pane.start_editing(path, EditField::Value).await?;
    pane.edit_text_changed("green").await?;
    pane.flush_pending_edits().await?;
    assert_eq!(style_text(&pane, id)?, "color: green; margin: 1px;");

    pane.edit_text_changed("blue").await?;
    pane.model_mut().fail_next_mutations(1);
    pane.commit_editing(None).await?;

    assert_eq!(style_text(&pane, id)?, "color: red; margin: 1px;");
    let row = pane.property(path).ok_or("row vanished")?;
    assert_eq!(row.value(), "red");
    assert!(!row.edited_incrementally());
    assert!(matches!(
        pane.model().mutations().last(),
        Some(Mutation::SetDeclarationText { text, major: false, success: true, .. })
            if text == "color: red;"
    ));
    Ok(())
}

#[tokio::test]
async fn colon_in_name_replaces_declaration() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { color: red; margin: 1px; }").await?;
    let path = PropertyPath::new(id, 1);
    pane.start_editing(path, EditField::Name).await?;
    let continuation = pane.edit_text_changed("padding: 4px").await?;

    assert_eq!(
        continuation,
        Some(Continuation::EditRow {
            row: 1,
            field: EditField::Value
        })
    );
    assert_eq!(style_text(&pane, id)?, "color: red; padding: 4px;");
    pane.blur().await?;
    assert_eq!(style_text(&pane, id)?, "color: red; padding: 4px;");
    let row = pane.property(path).ok_or("row vanished")?;
    assert_eq!((row.name(), row.value()), ("padding", "4px"));
    Ok(())
}

#[tokio::test]
async fn colon_in_new_row_name_creates_declaration() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { color: red; }").await?;
    let blank = pane.add_blank_property(id, None)?.ok_or("no blank row")?;
    pane.edit_text_changed("width: 3px").await?;
    assert_eq!(style_text(&pane, id)?, "color: red; width: 3px;");
    assert_eq!(pane.editing_property(), Some(blank));
    pane.blur().await?;
    assert_eq!(style_text(&pane, id)?, "color: red; width: 3px;");
    let row = pane.property(blank).ok_or("row vanished")?;
    assert!(!row.is_new());
    assert_eq!(row.declaration().index, 1);
    Ok(())
}

#[tokio::test]
async fn multi_declaration_values_are_not_applied_live() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { color: red; margin: 1px; }").await?;
    let path = PropertyPath::new(id, 0);
    pane.start_editing(path, EditField::Value).await?;
    pane.paste("blue; width: 3px", 0..3).await?;

    let row = pane.property(path).ok_or("row vanished")?;
    assert_eq!(row.field_text(EditField::Value), "blue; width: 3px");
    assert!(!row.throttle().has_pending());
    pane.flush_pending_edits().await?;
    assert_eq!(pane.model().text_mutation_count(), 0);

    pane.cancel_editing().await?;
    assert_eq!(style_text(&pane, id)?, "color: red; margin: 1px;");
    let section = pane.section(id).ok_or("section vanished")?;
    let rows: Vec<(&str, usize)> = section
        .properties()
        .iter()
        .map(|row| (row.name(), row.declaration().index))
        .collect();
    assert_eq!(rows, vec![("color", 0), ("margin", 1)]);
    Ok(())
}

#[tokio::test]
async fn paste_replaces_selected_value_text() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { margin: 10px; }").await?;
    let path = PropertyPath::new(id, 0);
    pane.start_editing(path, EditField::Value).await?;
    pane.paste("25", 0..2).await?;
    pane.paste(" auto", 4..4).await?;

    let row = pane.property(path).ok_or("row vanished")?;
    assert_eq!(row.field_text(EditField::Value), "25px auto");
    pane.flush_pending_edits().await?;
    assert_eq!(style_text(&pane, id)?, "margin: 25px auto;");
    Ok(())
}

#[tokio::test]
async fn abandoned_blank_row_is_removed() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { color: red; }").await?;
    pane.add_blank_property(id, None)?;
    pane.cancel_editing().await?;
    assert_eq!(pane.section(id).map(|section| section.properties().len()), Some(1));
    assert_eq!(pane.model().text_mutation_count(), 0);
    Ok(())
}

#[tokio::test]
async fn arrow_keys_step_numbers_under_caret() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { margin: 10px; }").await?;
    let path = PropertyPath::new(id, 0);
    pane.start_editing(path, EditField::Value).await?;
    let outcome = pane.key_down(KeyInput::new(Key::ArrowUp, "10px", 2)).await?;
    let KeyOutcome::Modified(modification) = outcome else {
        return Err(format!("unexpected outcome {outcome:?}").into());
    };
    assert_eq!(modification.text, "11px");
    assert_eq!(
        pane.property(path).map(|row| row.field_text(EditField::Value).to_owned()).as_deref(),
        Some("11px")
    );
    assert!(pane.property(path).is_some_and(|row| row.throttle().has_pending()));
    Ok(())
}

#[tokio::test]
async fn toggling_comments_out_declaration() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { color: red; margin: 1px; }").await?;
    let path = PropertyPath::new(id, 0);
    assert!(pane.toggle_disabled(path).await?);
    assert_eq!(style_text(&pane, id)?, "/* color: red; */ margin: 1px;");
    assert!(pane.property(path).is_some_and(|row| row.flags().disabled));
    assert!(pane.model().active_property_resets() > 0);
    Ok(())
}

#[tokio::test]
async fn longhands_are_not_editable() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { margin: 1px 2px; }").await?;
    let path = PropertyPath::new(id, 0);
    pane.expand(path)?;
    assert!(!pane.start_editing(path.longhand(0), EditField::Value).await?);
    assert_eq!(pane.editing_property(), None);
    Ok(())
}
