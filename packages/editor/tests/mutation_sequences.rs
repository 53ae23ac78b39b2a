//! Undo/redo behaviour across mutation sequences
//!
//! This tests:
//! - Undo and redo reproduce snapshots byte-for-byte for every mutation
//! - History limits and FIFO eviction
//! - Redo invalidation
//! - No-op and rejected mutations cost no undo step
//! - Text-only elements and the nesting limit keep snapshots re-parseable

use pagecraft_editor::{
    EditorConfig, EditorError, EditorSession, Field, FieldValues, HistoryDirection,
    MemorySource, Mutation, MutationError, MutationOutcome, NodePath, SitePath, Snapshot,
};
use pagecraft_html::{ParseError, MAX_DEPTH};
use std::sync::Arc;

const PAGE: &str = r#"<html><head><title>Shop</title></head><body><header id="top"><img src="img/a.png" alt="A"></header><ul><li>one</li><li>two</li><li>three</li></ul><p><span class="x" id="y">hello</span></p></body></html>"#;

async fn loaded(config: EditorConfig) -> EditorSession {
    let source = MemorySource::new()
        .with_file("shop.html", PAGE)
        .with_file("components/badge.html", "<em>new</em>");
    let mut session = EditorSession::new(Arc::new(source), config);
    session
        .load(&SitePath::new("shop.html").unwrap())
        .await
        .unwrap();
    session
}

fn node(raw: &str) -> NodePath {
    raw.parse().unwrap()
}

fn snapshot(session: &EditorSession) -> Snapshot {
    session.snapshot().unwrap()
}

/// Paths in PAGE once loaded: title 0.1 (after the injected base), header 1.0,
/// ul 1.1, p 1.2
fn cases() -> Vec<(&'static str, Option<&'static str>, Mutation)> {
    vec![
        (
            "inspector",
            Some("1.2.0"),
            Mutation::ApplyInspector(
                FieldValues::new()
                    .with(Field::Tag, "div")
                    .with(Field::attribute("id"), "")
                    .with(Field::attribute("class"), "z"),
            ),
        ),
        ("delete", Some("1.1.1"), Mutation::Delete),
        ("delete body", Some("1"), Mutation::Delete),
        ("insert", None, Mutation::InsertElement { tag: "h2".to_string() }),
        ("insert into selection", Some("1.1"), Mutation::InsertElement { tag: "li".to_string() }),
        ("wrap", Some("1.1.2"), Mutation::Wrap),
        ("move up", Some("1.1.2"), Mutation::MoveUp),
        ("move down", Some("1.1.0"), Mutation::MoveDown),
        ("duplicate", Some("1.0"), Mutation::Duplicate),
        (
            "fragment",
            Some("1.2"),
            Mutation::InsertFragment(pagecraft_editor::Fragment::parse("<b>x</b> y").unwrap()),
        ),
        (
            "image",
            Some("1.0.0"),
            Mutation::SetImageSource { src: "img/b.png".to_string() },
        ),
        (
            "head",
            None,
            Mutation::ReplaceHead(pagecraft_editor::Fragment::parse("<title>New</title>").unwrap()),
        ),
        (
            "title text",
            Some("0.1"),
            Mutation::ApplyInspector(FieldValues::new().with(Field::Text, "a < b & </title>")),
        ),
        (
            "tag to textarea",
            Some("1.2.0"),
            Mutation::ApplyInspector(FieldValues::new().with(Field::Tag, "textarea")),
        ),
        (
            "markup becomes text",
            Some("1.0"),
            Mutation::ApplyInspector(
                FieldValues::new()
                    .with(Field::Tag, "textarea")
                    .with(Field::Text, "<img src=x>"),
            ),
        ),
    ]
}

#[tokio::test]
async fn test_undo_redo_are_exact_inverses() {
    for editable in [false, true] {
        for (name, selection, mutation) in cases() {
            let mut session = loaded(EditorConfig::default()).await;
            session.set_editable(editable);
            session.set_select_mode(editable);
            if let Some(path) = selection {
                session.select(Some(&node(path))).unwrap();
            }

            let before = snapshot(&session);
            let outcome = session.mutate(mutation).unwrap();
            assert_eq!(outcome, MutationOutcome::Applied, "{name}");
            let after = snapshot(&session);
            assert_ne!(before, after, "{name}");

            session.undo().unwrap();
            assert_eq!(snapshot(&session), before, "{name}: undo");
            assert!(session.selection().is_none(), "{name}");

            session.redo().unwrap();
            assert_eq!(snapshot(&session), after, "{name}: redo");

            session.undo().unwrap();
            assert_eq!(snapshot(&session), before, "{name}: second undo");
        }
    }
}

#[tokio::test]
async fn test_tag_change_example() {
    let mut session = loaded(EditorConfig::default()).await;
    session.select(Some(&node("1.2.0"))).unwrap();
    let mut values = FieldValues::from(session.inspect().unwrap());
    values.set(Field::Tag, "div");
    values.set(Field::attribute("id"), "");
    values.set(Field::attribute("class"), "z");
    session.apply_inspector(values).unwrap();

    session.select(None).unwrap();
    let html = session.preview().unwrap();
    assert!(html.contains(r#"<p><div class="z">hello</div></p>"#), "{html}");
}

#[tokio::test]
async fn test_selection_follows_mutations() {
    let mut session = loaded(EditorConfig::default()).await;

    session.select(Some(&node("1.1.1"))).unwrap();
    session.delete_selected().unwrap();
    assert_eq!(session.selection(), Some(node("1.1")));

    session.insert_element("li").unwrap();
    assert_eq!(session.selection(), Some(node("1.1.2")));

    session.wrap_selected().unwrap();
    assert_eq!(session.selection(), Some(node("1.1.2")));
    let crumbs: Vec<String> = session.breadcrumbs().into_iter().map(|b| b.label).collect();
    assert_eq!(crumbs, vec!["body", "ul", "div"]);

    session.duplicate().unwrap();
    assert_eq!(session.selection(), Some(node("1.1.3")));

    session.move_up().unwrap();
    assert_eq!(session.selection(), Some(node("1.1.2")));

    session.select(Some(&node("1"))).unwrap();
    session.delete_selected().unwrap();
    assert_eq!(session.selection(), None);
    assert!(session.tree().unwrap().body().is_some());
}

#[tokio::test]
async fn test_undo_limit_evicts_oldest() {
    let mut session = loaded(EditorConfig::default()).await;
    let original = snapshot(&session);

    let mut states = vec![original.clone()];
    for _ in 0..51 {
        session.insert_element("p").unwrap();
        states.push(snapshot(&session));
    }
    let history = session.history().unwrap();
    assert_eq!(history.undo_levels(), 50);

    for _ in 0..50 {
        session.undo().unwrap();
    }
    // The first recorded state was evicted; the oldest reachable one is
    // the state after the first insert
    assert_eq!(snapshot(&session), states[1]);
    assert_ne!(snapshot(&session), original);
    assert!(matches!(
        session.undo(),
        Err(EditorError::EmptyHistory(HistoryDirection::Undo))
    ));
}

#[tokio::test]
async fn test_configured_undo_limit() {
    let config = EditorConfig {
        undo_limit: 3,
        ..EditorConfig::default()
    };
    let mut session = loaded(config).await;
    for _ in 0..5 {
        session.insert_element("p").unwrap();
    }
    assert_eq!(session.history().unwrap().undo_levels(), 3);
}

#[tokio::test]
async fn test_mutation_clears_redo_but_history_steps_do_not() {
    let mut session = loaded(EditorConfig::default()).await;
    session.insert_element("p").unwrap();
    session.insert_element("p").unwrap();

    session.undo().unwrap();
    session.undo().unwrap();
    assert_eq!(session.history().unwrap().redo_levels(), 2);

    session.redo().unwrap();
    assert_eq!(session.history().unwrap().redo_levels(), 1);
    assert_eq!(session.history().unwrap().undo_levels(), 1);

    session.insert_element("section").unwrap();
    assert!(!session.can_redo());
    assert!(matches!(
        session.redo(),
        Err(EditorError::EmptyHistory(HistoryDirection::Redo))
    ));
}

#[tokio::test]
async fn test_no_op_moves_record_nothing() {
    let mut session = loaded(EditorConfig::default()).await;
    session.select(Some(&node("1.1.0"))).unwrap();
    let before = snapshot(&session);

    assert_eq!(session.move_up().unwrap(), MutationOutcome::Unchanged);
    assert_eq!(snapshot(&session), before);
    assert!(!session.can_undo());

    session.select(Some(&node("1.1.2"))).unwrap();
    assert_eq!(session.move_down().unwrap(), MutationOutcome::Unchanged);
    assert!(!session.can_undo());
}

#[tokio::test]
async fn test_rejected_mutations_record_nothing() {
    let mut session = loaded(EditorConfig::default()).await;

    assert!(matches!(
        session.wrap_selected(),
        Err(EditorError::Mutation(MutationError::NoSelection))
    ));
    assert!(matches!(
        session.apply_asset_to_image("img/b.png"),
        Err(EditorError::Mutation(MutationError::NoSelection))
    ));

    session.select(Some(&node("1.0"))).unwrap();
    assert!(matches!(
        session.apply_asset_to_image("img/b.png"),
        Err(EditorError::Mutation(MutationError::InvalidTarget(_)))
    ));
    assert!(matches!(
        session.insert_element("not a tag"),
        Err(EditorError::Mutation(MutationError::InvalidTagName(_)))
    ));
    let bad_tag = FieldValues::new().with(Field::Tag, "9lives");
    assert!(matches!(
        session.apply_inspector(bad_tag),
        Err(EditorError::Mutation(MutationError::InvalidTagName(_)))
    ));
    assert!(!session.can_undo());
}

#[tokio::test]
async fn test_text_only_elements_reject_markup() {
    let mut session = loaded(EditorConfig::default()).await;

    session.select(Some(&node("0.1"))).unwrap();
    assert!(matches!(
        session.insert_element("b"),
        Err(EditorError::Mutation(MutationError::InvalidTarget(_)))
    ));

    // header holds an <img>
    session.select(Some(&node("1.0"))).unwrap();
    for tag in ["textarea", "title", "script", "style"] {
        let values = FieldValues::new().with(Field::Tag, tag);
        assert!(
            matches!(
                session.apply_inspector(values),
                Err(EditorError::Mutation(MutationError::InvalidTarget(_)))
            ),
            "{tag}"
        );
    }

    session.select(Some(&node("1.2.0"))).unwrap();
    let values = FieldValues::new()
        .with(Field::Tag, "script")
        .with(Field::Text, "document.write('</script>')");
    assert!(matches!(
        session.apply_inspector(values),
        Err(EditorError::Mutation(MutationError::InvalidTarget(_)))
    ));
    assert!(!session.can_undo());
}

async fn deep_session(levels: usize) -> Result<EditorSession, EditorError> {
    let page = format!(
        "<html><head></head><body>{}<span>deep</span>{}</body></html>",
        "<div>".repeat(levels),
        "</div>".repeat(levels)
    );
    let source = MemorySource::new().with_file("deep.html", page);
    let mut session = EditorSession::new(Arc::new(source), EditorConfig::default());
    session.load(&SitePath::new("deep.html").unwrap()).await?;
    Ok(session)
}

#[tokio::test]
async fn test_nesting_limit_holds_through_edits() {
    assert!(matches!(
        deep_session(MAX_DEPTH - 2).await,
        Err(EditorError::Parse(ParseError::NestingTooDeep { .. }))
    ));

    // html and body put the span at exactly MAX_DEPTH
    let levels = MAX_DEPTH - 3;
    let mut session = deep_session(levels).await.unwrap();
    let span = format!("1{}", ".0".repeat(levels + 1));
    session.select(Some(&node(&span))).unwrap();
    assert!(matches!(
        session.insert_element("b"),
        Err(EditorError::Mutation(MutationError::NestingTooDeep(_)))
    ));
    assert!(matches!(
        session.wrap_selected(),
        Err(EditorError::Mutation(MutationError::NestingTooDeep(_)))
    ));
    assert!(!session.can_undo());

    let parent = format!("1{}", ".0".repeat(levels));
    session.select(Some(&node(&parent))).unwrap();
    let before = snapshot(&session);
    session.insert_element("b").unwrap();
    session.undo().unwrap();
    assert_eq!(snapshot(&session), before);
}

#[tokio::test]
async fn test_history_resets_on_load() {
    let mut session = loaded(EditorConfig::default()).await;
    session.insert_element("p").unwrap();
    session.undo().unwrap();
    assert!(session.can_redo());

    session
        .load(&SitePath::new("shop.html").unwrap())
        .await
        .unwrap();
    assert!(!session.can_undo());
    assert!(!session.can_redo());
}
