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
use css_inspector::block::BlockKind;
use css_inspector::memory::Mutation;
use css_inspector::model::{NodeId, StyleOrigin, StyleSheetId};
use css_inspector::pane::HighlightRequest;
use css_inspector::popover::values::EditorWidget;
use css_inspector::{
    IconInfo, InspectorConfig, MemoryCascade, PaneController, PaneEvent, PopoverHelper,
    PropertyPath, RuleLocation, SectionId, SectionKey,
};
use tokio::task;

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

struct Page {
    cascade: MemoryCascade,
    body: NodeId,
    div: NodeId,
    sheet: StyleSheetId,
}

/// `<html><body><div id=main class=box>` with `css` as the only author sheet.
fn page(css: &str) -> Page {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut cascade = MemoryCascade::new();
    let html = cascade.add_element(None, "html", None, &[]);
    let body = cascade.add_element(Some(html), "body", None, &[]);
    let div = cascade.add_element(Some(body), "div", Some("main"), &["box"]);
    let sheet = cascade.add_stylesheet(StyleOrigin::Regular, css);
    cascade.select(div);
    Page {
        cascade,
        body,
        div,
        sheet,
    }
}

async fn open(cascade: MemoryCascade) -> Result<Pane, Box<dyn Error>> {
    let mut pane = PaneController::new(cascade, NoPopover, InspectorConfig::default());
    pane.update().await?;
    Ok(pane)
}

fn section_of(pane: &Pane, selector: &str) -> Result<SectionId, Box<dyn Error>> {
    Ok(pane
        .find_section(selector)
        .ok_or_else(|| format!("no section for {selector}"))?)
}

#[tokio::test]
async fn long_rules_hide_rows_until_show_all() -> Result<(), Box<dyn Error>> {
    let body: String = (0..60).map(|index| format!("--v{index}: {index}; ")).collect();
    let mut pane = open(page(&format!(".box {{ {body}}}")).cascade).await?;
    let id = section_of(&pane, ".box")?;

    let section = pane.section(id).ok_or("missing section")?;
    assert_eq!(section.properties().len(), 50);
    assert_eq!(section.hidden_count(), 10);
    assert_eq!(
        section.show_all_label().as_deref(),
        Some("Show All Properties (10 more)")
    );

    pane.show_all(id);
    let section = pane.section(id).ok_or("missing section")?;
    assert_eq!(section.properties().len(), 60);
    assert_eq!(section.show_all_label(), None);
    Ok(())
}

#[tokio::test]
async fn added_rows_stay_visible_in_capped_rules() -> Result<(), Box<dyn Error>> {
    let body: String = (0..55).map(|index| format!("--v{index}: {index}; ")).collect();
    let mut pane = open(page(&format!(".box {{ {body}}}")).cascade).await?;
    let id = section_of(&pane, ".box")?;

    let blank = pane.add_blank_property(id, None)?.ok_or("no blank row")?;
    assert_eq!(blank.index, 50);
    pane.edit_text_changed("width").await?;
    pane.key_press(':', "width", 5).await?;
    pane.edit_text_changed("3px").await?;
    pane.blur().await?;

    let section = pane.section(id).ok_or("missing section")?;
    assert_eq!(section.properties().len(), 51);
    assert_eq!(section.hidden_count(), 5);
    let added = section.property(50).ok_or("added row hidden")?;
    assert_eq!((added.name(), added.value()), ("width", "3px"));
    assert_eq!(added.declaration().index, 50);
    Ok(())
}

#[tokio::test]
async fn shorthand_children_are_built_once() -> Result<(), Box<dyn Error>> {
    let mut pane = open(page(".box { margin: 1px 2px; }").cascade).await?;
    let path = PropertyPath::new(section_of(&pane, ".box")?, 0);
    assert!(pane.property(path).is_some_and(|row| row.is_shorthand()));

    pane.expand(path)?;
    pane.collapse(path)?;
    pane.expand(path)?;
    let row = pane.property(path).ok_or("missing row")?;
    assert!(row.is_expanded());
    let longhands: Vec<(&str, &str)> = row
        .children()
        .iter()
        .map(|child| (child.name(), child.value()))
        .collect();
    assert_eq!(
        longhands,
        vec![
            ("margin-top", "1px"),
            ("margin-right", "2px"),
            ("margin-bottom", "1px"),
            ("margin-left", "2px"),
        ]
    );
    assert!(
        pane.property(path.longhand(0))
            .is_some_and(|child| child.is_longhand() && child.flags().implicit)
    );
    Ok(())
}

#[tokio::test]
async fn flex_direction_icon_follows_text_direction() -> Result<(), Box<dyn Error>> {
    let css = ".box { display: flex; flex-direction: row; }";
    let pane = open(page(css).cascade).await?;
    let path = PropertyPath::new(section_of(&pane, ".box")?, 1);
    assert_eq!(
        pane.property(path).and_then(|row| row.icon().cloned()),
        Some(IconInfo {
            icon_name: "flex-direction-icon".to_owned(),
            rotate: -90,
            scale_x: -1,
            scale_y: 1,
        })
    );

    let mut rtl = page(css);
    rtl.cascade.set_computed(rtl.div, "direction", "rtl");
    let pane = open(rtl.cascade).await?;
    let path = PropertyPath::new(section_of(&pane, ".box")?, 1);
    assert_eq!(
        pane.property(path).and_then(|row| row.icon()).map(|icon| icon.rotate),
        Some(90)
    );
    assert_eq!(
        pane.property(PropertyPath::new(path.section, 0))
            .and_then(|row| row.icon().cloned()),
        None
    );
    Ok(())
}

#[tokio::test]
async fn ancestors_get_their_own_blocks() -> Result<(), Box<dyn Error>> {
    let fixture = page(".box { color: red; }\nbody { color: green; margin: 0; }");
    let body = fixture.body;
    let pane = open(fixture.cascade).await?;

    let titles: Vec<Option<String>> = pane.blocks().iter().map(|block| block.title()).collect();
    assert_eq!(titles, vec![None, Some("Inherited from body".to_owned())]);
    assert!(matches!(
        pane.blocks().get(1).map(|block| block.kind()),
        Some(BlockKind::Inherited { node }) if node.id == body
    ));

    let id = section_of(&pane, "body")?;
    let section = pane.section(id).ok_or("missing section")?;
    assert!(section.is_inherited());
    assert!(section.property(0).is_some_and(|row| !row.is_inherited()));
    assert!(section.property(1).is_some_and(|row| row.is_inherited()));
    assert!(
        pane.property(PropertyPath::new(section_of(&pane, ".box")?, 0))
            .is_some_and(|row| !row.is_overloaded())
    );
    assert!(pane.property(PropertyPath::new(id, 0)).is_some_and(|row| row.is_overloaded()));
    Ok(())
}

#[tokio::test]
async fn blank_rule_is_created_on_selector_commit() -> Result<(), Box<dyn Error>> {
    let fixture = page(".box { color: red; }");
    let sheet = fixture.sheet;
    let mut pane = open(fixture.cascade).await?;
    let anchor = section_of(&pane, ".box")?;

    let id = pane
        .add_blank_section(RuleLocation::Below(anchor))
        .await?
        .ok_or("no blank section")?;
    assert_eq!(pane.section_ids(), vec![anchor, id]);
    let section = pane.section(id).ok_or("missing section")?;
    assert!(section.is_blank());
    assert!(section.is_editing_selector());
    assert_eq!(section.selector_text(), "div#main");
    assert!(pane.add_blank_property(id, None)?.is_none());

    assert!(pane.commit_selector(id, "div#main").await?);
    let section = pane.section(id).ok_or("missing section")?;
    assert!(!section.is_blank());
    assert!(!section.no_affect());
    assert_eq!(section.selector_text(), "div#main");
    assert_eq!(pane.model().sheet_styles(sheet).len(), 2);
    assert!(pane.model().mutations().iter().any(|mutation| matches!(
        mutation,
        Mutation::AddRule { rule_text, style: Some(_), .. } if rule_text == "\n\ndiv#main {}"
    )));

    let path = pane.add_blank_property(id, None)?.ok_or("no blank row")?;
    pane.paste("outline: none", 0..0).await?;
    let style = pane.section(id).and_then(|section| section.style()).ok_or("no style")?;
    assert_eq!(pane.model().style_text(style), "outline: none;");
    assert!(pane.property(path).is_some_and(|row| row.name() == "outline"));
    Ok(())
}

#[tokio::test]
async fn cancelled_blank_rule_disappears() -> Result<(), Box<dyn Error>> {
    let mut pane = open(page(".box { color: red; }").cascade).await?;
    let id = pane
        .add_blank_section(RuleLocation::StyleSheetEnd(None))
        .await?
        .ok_or("no blank section")?;
    assert!(pane.is_editing_style());
    pane.cancel_selector(id)?;
    assert!(pane.section(id).is_none());
    assert!(!pane.section_ids().contains(&id));
    assert!(!pane.is_editing_style());
    assert!(
        !pane
            .model()
            .mutations()
            .iter()
            .any(|mutation| matches!(mutation, Mutation::AddRule { .. }))
    );
    Ok(())
}

#[tokio::test]
async fn failed_blank_rule_keeps_editing() -> Result<(), Box<dyn Error>> {
    let mut pane = open(page(".box { color: red; }").cascade).await?;
    let id = pane
        .add_blank_section(RuleLocation::StyleSheetEnd(None))
        .await?
        .ok_or("no blank section")?;
    pane.model_mut().fail_next_mutations(1);
    assert!(!pane.commit_selector(id, "section > p").await?);
    let section = pane.section(id).ok_or("missing section")?;
    assert!(section.is_blank());
    assert!(section.is_editing_selector());
    assert_eq!(section.selector_text(), "section > p");
    Ok(())
}

#[tokio::test]
async fn selector_edits_apply_or_revert() -> Result<(), Box<dyn Error>> {
    let mut pane = open(page(".box { color: red; }\n#main { margin: 0; }").cascade).await?;
    let id = section_of(&pane, ".box")?;

    assert!(pane.start_editing_selector(id));
    assert!(pane.commit_selector(id, "div.box").await?);
    assert_eq!(pane.section(id).map(|section| section.selector_text()), Some("div.box"));

    assert!(pane.start_editing_selector(id));
    assert!(pane.commit_selector(id, "p.other").await?);
    assert!(pane.section(id).is_some_and(|section| section.no_affect()));

    assert!(pane.start_editing_selector(id));
    pane.model_mut().fail_next_mutations(1);
    assert!(!pane.commit_selector(id, "div").await?);
    assert_eq!(pane.section(id).map(|section| section.selector_text()), Some("p.other"));
    Ok(())
}

#[tokio::test]
async fn selector_lists_mark_matching_selectors() -> Result<(), Box<dyn Error>> {
    let css = ".box, p, div > .other, body .box { color: red; }\nspan, body { color: blue; }";
    let mut pane = open(page(css).cascade).await?;
    let own = section_of(&pane, ".box, p, div > .other, body .box")?;
    let inherited = section_of(&pane, "span, body")?;
    assert_eq!(
        pane.section(own).map(|section| section.matching_selectors().to_vec()),
        Some(vec![true, false, false, true])
    );
    assert_eq!(
        pane.section(inherited).map(|section| section.matching_selectors().to_vec()),
        Some(vec![false, true])
    );

    assert!(pane.start_editing_selector(own));
    assert!(pane.commit_selector(own, "p, div#main").await?);
    assert_eq!(
        pane.section(own).map(|section| section.matching_selectors().to_vec()),
        Some(vec![false, true])
    );
    Ok(())
}

#[tokio::test]
async fn media_queries_edit_every_rule_inside() -> Result<(), Box<dyn Error>> {
    let css = "@media (min-width: 600px) {\n  .box { color: red; }\n  #main { margin: 1px; }\n}\ndiv { padding: 0; }";
    let mut pane = open(page(css).cascade).await?;
    let boxed = section_of(&pane, ".box")?;
    let by_id = section_of(&pane, "#main")?;
    let plain = section_of(&pane, "div")?;
    let media_of = |pane: &Pane, id: SectionId| {
        pane.section(id)
            .and_then(|section| section.media_text())
            .map(ToOwned::to_owned)
    };
    assert_eq!(media_of(&pane, boxed).as_deref(), Some("(min-width: 600px)"));
    assert_eq!(media_of(&pane, plain), None);
    assert!(!pane.start_editing_media(plain));

    assert!(pane.start_editing_media(boxed));
    assert!(pane.is_editing_style());
    assert!(pane.commit_media(boxed, " print ").await?);
    assert!(!pane.is_editing_style());
    assert_eq!(media_of(&pane, boxed).as_deref(), Some("print"));
    assert_eq!(media_of(&pane, by_id).as_deref(), Some("print"));
    assert!(matches!(
        pane.model().mutations().last(),
        Some(Mutation::SetMediaText { success: true, text, .. }) if text == "print"
    ));

    assert!(pane.start_editing_media(by_id));
    assert!(!pane.commit_media(by_id, "screen { color").await?);
    assert_eq!(media_of(&pane, by_id).as_deref(), Some("print"));
    assert!(!pane.is_editing_style());
    Ok(())
}

#[tokio::test]
async fn keyframes_follow_the_animation() -> Result<(), Box<dyn Error>> {
    let css = ".box { animation: spin 1s; }\n@keyframes spin { from { opacity: 0; } to { opacity: 1; } }\n@keyframes unused { to { opacity: 1; } }";
    let mut pane = open(page(css).cascade).await?;

    let titles: Vec<Option<String>> = pane.blocks().iter().map(|block| block.title()).collect();
    assert_eq!(titles, vec![None, Some("@keyframes spin".to_owned())]);
    let id = section_of(&pane, "from")?;
    let section = pane.section(id).ok_or("missing section")?;
    assert!(section.is_keyframe());
    assert!(section.property(0).is_some_and(|row| !row.is_overloaded()));
    assert_eq!(pane.highlight_selector(id), None);

    assert!(pane.start_editing_selector(id));
    assert!(pane.commit_selector(id, "0%").await?);
    assert_eq!(pane.section(id).map(|section| section.selector_text()), Some("0%"));

    assert!(pane.start_editing_selector(id));
    assert!(!pane.commit_selector(id, "halfway").await?);
    assert_eq!(pane.section(id).map(|section| section.selector_text()), Some("0%"));
    Ok(())
}

#[tokio::test]
async fn filter_hides_sections_without_matches() -> Result<(), Box<dyn Error>> {
    let mut pane = open(page(".box { color: red; }\n#main { padding: 2px; }").cascade).await?;
    let boxed = section_of(&pane, ".box")?;
    let main = section_of(&pane, "#main")?;

    pane.set_filter_text("PADD");
    assert!(pane.section(boxed).is_some_and(|section| section.is_hidden()));
    assert!(pane.section(main).is_some_and(|section| !section.is_hidden()));
    assert!(pane.property(PropertyPath::new(main, 0)).is_some_and(|row| row.filter_match()));
    assert!(!pane.no_matches());

    pane.set_filter_text("zzz");
    assert!(pane.no_matches());

    pane.set_filter_text("");
    assert!(pane.section(boxed).is_some_and(|section| !section.is_hidden()));
    assert!(!pane.no_matches());
    Ok(())
}

#[tokio::test]
async fn updates_report_completion_events() -> Result<(), Box<dyn Error>> {
    let mut pane = open(page(".box { color: red; }").cascade).await?;
    assert_eq!(
        pane.take_events(),
        vec![
            PaneEvent::InitialUpdateCompleted,
            PaneEvent::StylesUpdateCompleted {
                has_matched_styles: true
            },
        ]
    );
    pane.update().await?;
    assert_eq!(
        pane.take_events(),
        vec![PaneEvent::StylesUpdateCompleted {
            has_matched_styles: true
        }]
    );
    assert_eq!(pane.model().fetch_count(), 2);

    let mut empty = PaneController::new(MemoryCascade::new(), NoPopover, InspectorConfig::default());
    empty.update().await?;
    assert_eq!(
        empty.events().last(),
        Some(&PaneEvent::StylesUpdateCompleted {
            has_matched_styles: false
        })
    );
    assert!(empty.section_ids().is_empty());
    Ok(())
}

#[tokio::test]
async fn cancelled_rebuild_keeps_previous_sections() -> Result<(), Box<dyn Error>> {
    let css = ".box { color: red; } div { margin: 1px; } #main { padding: 1px; } \
               .box { width: 1px; } div { height: 1px; } body { color: blue; }";
    let config = InspectorConfig {
        idle_batch: 1,
        ..InspectorConfig::default()
    };
    let mut pane = PaneController::new(page(css).cascade, NoPopover, config);
    pane.update().await?;
    let before = pane.section_ids();
    let blocks = pane.blocks().len();
    assert!(before.len() > 3);
    pane.take_events();

    let generation = pane.rebuild_generation();
    let (updated, ()) = tokio::join!(pane.update(), async {
        task::yield_now().await;
        generation.cancel();
    });
    updated?;
    assert_eq!(pane.section_ids(), before);
    assert_eq!(pane.blocks().len(), blocks);
    assert!(pane.find_section(".box").is_some());
    assert!(pane.take_events().is_empty());

    pane.update().await?;
    assert_eq!(pane.section_ids(), before);
    Ok(())
}

#[tokio::test]
async fn model_changes_wait_for_edits() -> Result<(), Box<dyn Error>> {
    let mut pane = open(page(".box { color: red; }").cascade).await?;
    let id = section_of(&pane, ".box")?;
    pane.start_editing_selector(id);
    pane.on_css_model_changed(None).await?;
    assert_eq!(pane.model().fetch_count(), 1);

    pane.cancel_selector(id)?;
    pane.on_css_model_changed(None).await?;
    assert_eq!(pane.model().fetch_count(), 2);
    Ok(())
}

#[tokio::test]
async fn arrow_keys_cycle_sections() -> Result<(), Box<dyn Error>> {
    let mut pane = open(page(".box { color: red; }\n#main { margin: 0; }").cascade).await?;
    let ids = pane.section_ids();
    let (Some(first), Some(last)) = (ids.first().copied(), ids.last().copied()) else {
        return Err("expected two sections".into());
    };
    assert_ne!(first, last);

    assert_eq!(pane.section_key_down(first, SectionKey::ArrowDown).await?, Some(last));
    assert_eq!(pane.section_key_down(last, SectionKey::ArrowDown).await?, Some(first));
    assert_eq!(pane.section_key_down(first, SectionKey::ArrowUp).await?, Some(last));
    assert_eq!(pane.section_key_down(last, SectionKey::Home).await?, Some(first));
    assert_eq!(pane.next_editable_sibling(last), Some(first));

    pane.section_key_down(first, SectionKey::Enter).await?;
    assert_eq!(pane.editing_property(), Some(PropertyPath::new(first, 0)));
    Ok(())
}

#[tokio::test]
async fn hovering_rows_requests_overlays() -> Result<(), Box<dyn Error>> {
    let fixture = page(".box { padding: 2px; color: red; }");
    let div = fixture.div;
    let pane = open(fixture.cascade).await?;
    let id = section_of(&pane, ".box")?;

    assert_eq!(
        pane.set_active_property(Some(PropertyPath::new(id, 0))),
        Some(HighlightRequest {
            node: div,
            mode: "padding".to_owned(),
            selector_list: None,
        })
    );
    assert_eq!(pane.set_active_property(Some(PropertyPath::new(id, 1))), None);
    assert_eq!(
        pane.highlight_selector(id).and_then(|request| request.selector_list),
        Some(".box".to_owned())
    );
    Ok(())
}
