#![cfg(test)]
#![allow(
    clippy::missing_errors_doc,
    reason = "Test helpers return Result for clear propagation"
)]

use core::error::Error;
use css_inspector::memory::Mutation;
use css_inspector::model::StyleOrigin;
use css_inspector::popover::values::EditorWidget;
use css_inspector::property::tokens::ValueToken;
use css_inspector::{
    InspectorConfig, MemoryCascade, PaneController, PopoverHelper, PopoverKind, PropertyPath,
    SectionId,
};

/// Popover host that remembers what the pane asked of it.
#[derive(Default)]
struct RecordingHelper {
    shown: Vec<(EditorWidget, PropertyPath)>,
    hides: usize,
    repositions: usize,
    showing: bool,
}

impl PopoverHelper for RecordingHelper {
    fn show(&mut self, widget: EditorWidget, anchor: PropertyPath) {
        self.shown.push((widget, anchor));
        self.showing = true;
    }

    fn hide(&mut self) {
        self.hides += 1;
        self.showing = false;
    }

    fn is_showing(&self) -> bool {
        self.showing
    }

    fn reposition(&mut self) {
        self.repositions += 1;
    }
}

type Pane = PaneController<MemoryCascade, RecordingHelper>;

async fn pane_with(css: &str) -> Result<(Pane, SectionId), Box<dyn Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut cascade = MemoryCascade::new();
    let html = cascade.add_element(None, "html", None, &[]);
    let body = cascade.add_element(Some(html), "body", None, &[]);
    let div = cascade.add_element(Some(body), "div", Some("main"), &["box"]);
    cascade.add_stylesheet(StyleOrigin::Regular, css);
    cascade.select(div);
    let mut pane = PaneController::new(cascade, RecordingHelper::default(), InspectorConfig::default());
    pane.update().await?;
    let id = pane.find_section(".box").ok_or("missing .box section")?;
    Ok((pane, id))
}

fn style_text(pane: &Pane, id: SectionId) -> Result<String, Box<dyn Error>> {
    let style = pane.section(id).and_then(|section| section.style()).ok_or("no style")?;
    Ok(pane.model().style_text(style))
}

fn token_index(
    pane: &Pane,
    path: PropertyPath,
    wanted: fn(&ValueToken) -> bool,
) -> Result<usize, Box<dyn Error>> {
    let row = pane.property(path).ok_or("row vanished")?;
    Ok(row
        .tokens()
        .iter()
        .position(|rendered| wanted(&rendered.token))
        .ok_or("token not rendered")?)
}

const fn is_color(token: &ValueToken) -> bool {
    matches!(token, ValueToken::Color(_))
}

const fn is_angle(token: &ValueToken) -> bool {
    matches!(token, ValueToken::Angle { .. })
}

#[tokio::test]
async fn color_swatch_opens_picker_with_palette() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { color: red; --accent: #00f; }").await?;
    let path = PropertyPath::new(id, 0);
    let index = token_index(&pane, path, is_color)?;
    assert!(pane.open_popover(path, index).await?);

    assert!(pane.is_editing_style());
    assert_eq!(pane.active_popover().map(|popover| popover.kind()), Some(PopoverKind::Color));
    let (widget, anchor) = pane.popover_helper().shown.first().ok_or("nothing shown")?;
    assert_eq!(*anchor, path);
    let json = serde_json::to_value(widget)?;
    assert!(json.get("ColorPicker").is_some());
    let EditorWidget::ColorPicker { text, palette, .. } = widget else {
        return Err(format!("unexpected widget {widget:?}").into());
    };
    assert_eq!(text, "red");
    let names: Vec<&str> = palette.iter().map(|entry| entry.name.as_str()).collect();
    assert_eq!(names, ["--accent"]);
    Ok(())
}

#[tokio::test]
async fn picker_changes_apply_live_and_cancel_restores() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { color: red; margin: 1px; }").await?;
    let path = PropertyPath::new(id, 0);
    let index = token_index(&pane, path, is_color)?;
    pane.open_popover(path, index).await?;

    assert!(pane.popover_value_changed("#00ff00").await?);
    assert_eq!(style_text(&pane, id)?, "color: #00ff00; margin: 1px;");
    assert!(pane.model().mutations().iter().any(|mutation| matches!(
        mutation,
        Mutation::SetDeclarationText { major: false, success: true, .. }
    )));

    pane.popover_hidden(false).await?;
    assert_eq!(style_text(&pane, id)?, "color: red; margin: 1px;");
    assert!(!pane.is_editing_style());
    assert!(pane.active_popover().is_none());
    assert_eq!(pane.popover_helper().hides, 1);
    Ok(())
}

#[tokio::test]
async fn closing_picker_commits_value() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { color: red !important; }").await?;
    let path = PropertyPath::new(id, 0);
    let index = token_index(&pane, path, is_color)?;
    pane.open_popover(path, index).await?;
    pane.popover_value_changed("blue").await?;
    pane.popover_hidden(true).await?;

    assert_eq!(style_text(&pane, id)?, "color: blue !important;");
    assert!(matches!(
        pane.model().mutations().last(),
        Some(Mutation::SetDeclarationText { major: true, success: true, text, .. })
            if text == "color: blue !important;"
    ));
    assert!(pane.property(path).is_some_and(|row| !row.edited_incrementally()));
    Ok(())
}

#[tokio::test]
async fn second_click_only_closes_open_popover() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { color: red; }").await?;
    let path = PropertyPath::new(id, 0);
    let index = token_index(&pane, path, is_color)?;
    assert!(pane.open_popover(path, index).await?);
    assert!(!pane.open_popover(path, index).await?);

    assert!(pane.active_popover().is_none());
    assert_eq!(pane.popover_helper().shown.len(), 1);
    assert_eq!(pane.popover_helper().hides, 1);
    assert_eq!(pane.model().text_mutation_count(), 0);
    Ok(())
}

#[tokio::test]
async fn shift_click_on_angle_changes_unit() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) =
        pane_with(".box { background-image: linear-gradient(45deg, red, blue); }").await?;
    let path = PropertyPath::new(id, 0);
    let index = token_index(&pane, path, is_angle)?;
    assert!(pane.cycle_token_format(path, index).await?);
    assert_eq!(
        style_text(&pane, id)?,
        "background-image: linear-gradient(50grad, red, blue);"
    );
    Ok(())
}

#[tokio::test]
async fn shift_click_on_color_only_changes_display() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { color: red; }").await?;
    let path = PropertyPath::new(id, 0);
    let index = token_index(&pane, path, is_color)?;
    assert!(pane.cycle_token_format(path, index).await?);

    assert_eq!(pane.model().text_mutation_count(), 0);
    let row = pane.property(path).ok_or("row vanished")?;
    let Some(ValueToken::Color(swatch)) = row.tokens().get(index).map(|rendered| &rendered.token) else {
        return Err("color token vanished".into());
    };
    assert_ne!(swatch.display_format, swatch.color.format);
    assert_eq!(row.value(), "red");
    Ok(())
}

#[tokio::test]
async fn scrolling_repositions_only_open_popover() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { color: red; }").await?;
    pane.on_scroll();
    assert_eq!(pane.popover_helper().repositions, 0);

    let path = PropertyPath::new(id, 0);
    let index = token_index(&pane, path, is_color)?;
    pane.open_popover(path, index).await?;
    pane.on_scroll();
    assert_eq!(pane.popover_helper().repositions, 1);
    Ok(())
}

#[tokio::test]
async fn plain_text_tokens_open_nothing() -> Result<(), Box<dyn Error>> {
    let (mut pane, id) = pane_with(".box { margin: 1px; }").await?;
    assert!(!pane.open_popover(PropertyPath::new(id, 0), 0).await?);
    assert!(pane.popover_helper().shown.is_empty());
    assert!(!pane.is_editing_style());
    Ok(())
}
