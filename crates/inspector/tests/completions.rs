#![cfg(test)]
#![allow(
    clippy::missing_errors_doc,
    reason = "Test helpers return Result for clear propagation"
)]

use core::error::Error;
use css_inspector::model::{FontFace, StyleOrigin};
use css_inspector::popover::values::EditorWidget;
use css_inspector::property::editing::EditField;
use css_inspector::{InspectorConfig, MemoryCascade, PaneController, PopoverHelper, PropertyPath, SectionId};

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

async fn pane_for(tag: &str, css: &str, config: InspectorConfig) -> Result<(Pane, SectionId), Box<dyn Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut cascade = MemoryCascade::new();
    let html = cascade.add_element(None, "html", None, &[]);
    let body = cascade.add_element(Some(html), "body", None, &[]);
    let target = cascade.add_element(Some(body), tag, None, &["box"]);
    cascade.add_stylesheet(StyleOrigin::Regular, css);
    cascade.add_font_face(FontFace {
        family: "Inter".to_owned(),
        axes: Vec::new(),
    });
    cascade.select(target);
    let mut pane = PaneController::new(cascade, NoPopover, config);
    pane.update().await?;
    let id = pane.find_section(".box").ok_or("missing .box section")?;
    Ok((pane, id))
}

fn texts(pane: &Pane, path: PropertyPath, field: EditField, query: &str) -> Vec<String> {
    pane.completions(path, field, query)
        .into_iter()
        .map(|completion| completion.text)
        .collect()
}

#[tokio::test]
async fn names_rank_prefix_matches_first() -> Result<(), Box<dyn Error>> {
    let (pane, id) = pane_for("div", ".box { color: red; --accent: #00f; }", InspectorConfig::default()).await?;
    let path = PropertyPath::new(id, 0);
    let names = texts(&pane, path, EditField::Name, "disp");
    assert_eq!(names.first().map(String::as_str), Some("display"));
    assert!(names.iter().any(|name| name == "display: flex"));

    let custom = texts(&pane, path, EditField::Name, "--acc");
    assert_eq!(custom, ["--accent"]);
    Ok(())
}

#[tokio::test]
async fn svg_only_names_need_svg_or_opt_in() -> Result<(), Box<dyn Error>> {
    let (html_pane, html_id) = pane_for("div", ".box { color: red; }", InspectorConfig::default()).await?;
    let html_path = PropertyPath::new(html_id, 0);
    assert!(!texts(&html_pane, html_path, EditField::Name, "fill").iter().any(|name| name == "fill"));

    let (svg_pane, svg_id) = pane_for("svg", ".box { color: red; }", InspectorConfig::default()).await?;
    let svg_path = PropertyPath::new(svg_id, 0);
    assert!(texts(&svg_pane, svg_path, EditField::Name, "fill").iter().any(|name| name == "fill"));

    let opted_in = InspectorConfig {
        svg_properties_for_html: true,
        ..InspectorConfig::default()
    };
    let (open_pane, open_id) = pane_for("div", ".box { color: red; }", opted_in).await?;
    let open_path = PropertyPath::new(open_id, 0);
    assert!(texts(&open_pane, open_path, EditField::Name, "fill").iter().any(|name| name == "fill"));
    Ok(())
}

#[tokio::test]
async fn var_queries_list_variables_with_colors() -> Result<(), Box<dyn Error>> {
    let (pane, id) = pane_for(
        "div",
        ".box { color: red; --accent: #00f; --gap: 4px; }",
        InspectorConfig::default(),
    )
    .await?;
    let suggestions = pane.completions(PropertyPath::new(id, 0), EditField::Value, "var(--a");
    assert_eq!(suggestions.len(), 1);
    let accent = suggestions.first().ok_or("no suggestion")?;
    assert_eq!(accent.text, "--accent)");
    assert!(accent.color.is_some());
    Ok(())
}

#[tokio::test]
async fn important_offered_when_nothing_else_matches() -> Result<(), Box<dyn Error>> {
    let (pane, id) = pane_for("div", ".box { color: red; }", InspectorConfig::default()).await?;
    let path = PropertyPath::new(id, 0);
    assert_eq!(texts(&pane, path, EditField::Value, "!imp"), ["!important"]);
    assert!(!texts(&pane, path, EditField::Value, "!").iter().any(|text| text == "!important"));
    Ok(())
}

#[tokio::test]
async fn uppercase_queries_get_uppercase_values() -> Result<(), Box<dyn Error>> {
    let (pane, id) = pane_for("div", ".box { display: flex; }", InspectorConfig::default()).await?;
    let values = texts(&pane, PropertyPath::new(id, 0), EditField::Value, "BL");
    assert_eq!(values.first().map(String::as_str), Some("BLOCK"));
    assert!(values.iter().all(|value| value.chars().all(|character| !character.is_ascii_lowercase())));
    Ok(())
}

#[tokio::test]
async fn font_family_values_include_loaded_faces() -> Result<(), Box<dyn Error>> {
    let (pane, id) = pane_for("div", ".box { font-family: serif; }", InspectorConfig::default()).await?;
    let values = texts(&pane, PropertyPath::new(id, 0), EditField::Value, "\"In");
    assert_eq!(values, ["\"Inter\""]);
    Ok(())
}
