use super::*;
use crate::engine::test_helpers::{ScriptedEngine, svg_for};
use crate::services::persistence::test_helpers::MemoryStore;
use crate::services::persistence::{TEXT_KEY, THEME_KEY};

// =============================================================================
// HELPERS
// =============================================================================

fn options() -> EditorOptions {
    EditorOptions { debounce: Duration::from_millis(300), zoom: ZoomBounds::default() }
}

fn start(store: MemoryStore, engine: ScriptedEngine) -> (EditorHandle, Arc<ScriptedEngine>, Arc<MemoryStore>) {
    let engine = Arc::new(engine);
    let store = Arc::new(store);
    let handle = spawn_editor(options(), engine.clone(), store.clone());
    (handle, engine, store)
}

/// Let the session, the debounce window and every scripted render run out.
async fn settle() {
    tokio::time::sleep(Duration::from_secs(5)).await;
}

fn drain(rx: &mut broadcast::Receiver<EditorEvent>) -> Vec<EditorEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn artifact(snapshot: &EditorSnapshot) -> Option<&str> {
    snapshot.artifact.as_deref()
}

// =============================================================================
// STARTUP
// =============================================================================

#[tokio::test(start_paused = true)]
async fn startup_renders_persisted_text_with_persisted_theme() {
    let (editor, engine, _store) = start(
        MemoryStore::with(&[(TEXT_KEY, "pie\n  \"a\": 1\n"), (THEME_KEY, "dark")]),
        ScriptedEngine::new(),
    );
    settle().await;

    let snap = editor.snapshot().await.unwrap();
    assert_eq!(snap.theme, Theme::Dark);
    assert_eq!(artifact(&snap), Some(svg_for("pie\n  \"a\": 1", Theme::Dark).as_str()));
    assert_eq!(snap.status, STATUS_RENDERED);

    let calls = engine.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].theme, Theme::Dark);
    assert!(calls[0].render_id.starts_with("mermaid-"));
}

#[tokio::test(start_paused = true)]
async fn startup_without_settings_renders_default_template() {
    let (editor, engine, _store) = start(MemoryStore::default(), ScriptedEngine::new());
    settle().await;

    let snap = editor.snapshot().await.unwrap();
    assert_eq!(snap.text, templates::default_text());
    assert_eq!(snap.theme, Theme::Default);
    assert_eq!(engine.calls()[0].source, templates::default_text().trim());
}

// =============================================================================
// DEBOUNCE + FRESHNESS
// =============================================================================

#[tokio::test(start_paused = true)]
async fn burst_of_edits_renders_once_after_quiet_window() {
    let (editor, engine, _store) = start(MemoryStore::default(), ScriptedEngine::new());
    settle().await;
    assert_eq!(engine.calls().len(), 1);

    for text in ["graph TD\nA", "graph TD\nA-->B", "graph TD\nA-->B-->C"] {
        let snap = editor.edit(text).await.unwrap();
        assert!(snap.render_pending);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    // 100ms have passed since the last edit.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(engine.calls().len(), 1);

    settle().await;
    let calls = engine.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].source, "graph TD\nA-->B-->C");

    let snap = editor.snapshot().await.unwrap();
    assert!(!snap.render_pending);
    assert_eq!(artifact(&snap), Some(svg_for("graph TD\nA-->B-->C", Theme::Default).as_str()));
}

#[tokio::test(start_paused = true)]
async fn slow_stale_result_never_replaces_newer_one() {
    let engine = ScriptedEngine::new().with_delay("graph TD\nSLOW", Duration::from_millis(500));
    let (editor, _engine, store) = start(MemoryStore::default(), engine);
    settle().await;
    let mut events = editor.subscribe();

    let slow = editor.load("graph TD\nSLOW").await.unwrap();
    let fast = editor.load("graph TD\nFAST").await.unwrap();
    assert!(fast.latest_request_id > slow.latest_request_id);
    settle().await;

    let snap = editor.snapshot().await.unwrap();
    assert_eq!(artifact(&snap), Some(svg_for("graph TD\nFAST", Theme::Default).as_str()));
    assert_eq!(snap.latest_request_id, fast.latest_request_id);

    let rendered: Vec<u64> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            EditorEvent::Rendered { request_id, .. } => Some(request_id),
            _ => None,
        })
        .collect();
    assert_eq!(rendered, vec![fast.latest_request_id]);
    assert!(!store.writes_for(TEXT_KEY).iter().any(|t| t.contains("SLOW")));
}

#[tokio::test(start_paused = true)]
async fn load_supersedes_pending_edit() {
    let (editor, engine, _store) = start(MemoryStore::default(), ScriptedEngine::new());
    settle().await;

    editor.edit("graph TD\nTYPED").await.unwrap();
    let snap = editor.load("graph TD\nLOADED").await.unwrap();
    assert!(!snap.render_pending);
    settle().await;

    let sources: Vec<String> = engine.calls().into_iter().map(|c| c.source).collect();
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[1], "graph TD\nLOADED");
}

// =============================================================================
// CLEAR + ERRORS
// =============================================================================

#[tokio::test(start_paused = true)]
async fn blank_input_clears_display_without_engine_call() {
    let (editor, engine, _store) = start(MemoryStore::default(), ScriptedEngine::new());
    settle().await;
    let mut events = editor.subscribe();

    editor.edit("  \n\t").await.unwrap();
    settle().await;

    let snap = editor.snapshot().await.unwrap();
    assert_eq!(snap.artifact, None);
    assert_eq!(snap.error, None);
    assert_eq!(engine.calls().len(), 1);
    assert!(
        drain(&mut events)
            .iter()
            .any(|e| matches!(e, EditorEvent::Cleared { placeholder } if *placeholder == PLACEHOLDER))
    );
}

#[tokio::test(start_paused = true)]
async fn clearing_retires_render_in_flight() {
    let engine = ScriptedEngine::new().with_delay("graph TD\nSLOW", Duration::from_secs(1));
    let (editor, _engine, _store) = start(MemoryStore::default(), engine);
    settle().await;

    editor.load("graph TD\nSLOW").await.unwrap();
    editor.edit("").await.unwrap();
    settle().await;

    let snap = editor.snapshot().await.unwrap();
    assert_eq!(snap.artifact, None);
}

#[tokio::test(start_paused = true)]
async fn syntax_error_keeps_previous_artifact() {
    let (editor, _engine, store) = start(MemoryStore::default(), ScriptedEngine::new());
    settle().await;

    editor.load("graph TD\nA-->B").await.unwrap();
    settle().await;
    let mut events = editor.subscribe();
    editor.load("graph TD\nA-->").await.unwrap();
    settle().await;

    let snap = editor.snapshot().await.unwrap();
    let good = svg_for("graph TD\nA-->B", Theme::Default);
    assert_eq!(artifact(&snap), Some(good.as_str()));
    assert_eq!(snap.error.as_deref(), Some("Parse error on line 2"));
    assert_eq!(snap.status, STATUS_SYNTAX_ERROR);
    assert!(
        drain(&mut events)
            .iter()
            .any(|e| matches!(e, EditorEvent::RenderFailed { message, .. } if message == "Parse error on line 2"))
    );

    // Export still serves the last good diagram.
    let file = editor.export_svg().await.unwrap();
    assert_eq!(file.bytes, good.as_bytes());
    assert_eq!(editor.snapshot().await.unwrap().status, STATUS_SVG_EXPORTED);

    // Only successful renders are persisted.
    assert_eq!(store.writes_for(TEXT_KEY).last().map(String::as_str), Some("graph TD\nA-->B"));
    assert!(!store.writes_for(TEXT_KEY).iter().any(|t| t == "graph TD\nA-->"));
}

#[tokio::test(start_paused = true)]
async fn persisted_text_keeps_surrounding_whitespace() {
    let (editor, engine, store) = start(MemoryStore::default(), ScriptedEngine::new());
    settle().await;

    editor.edit("\n  graph TD\n    A-->B\n\n").await.unwrap();
    settle().await;

    assert_eq!(engine.calls().last().map(|c| c.source.as_str()), Some("graph TD\n    A-->B"));
    assert_eq!(
        store.writes_for(TEXT_KEY).last().map(String::as_str),
        Some("\n  graph TD\n    A-->B\n\n")
    );
}

#[tokio::test(start_paused = true)]
async fn missing_renderer_is_not_reported_as_syntax_error() {
    let (editor, _engine, store) = start(MemoryStore::default(), ScriptedEngine::new().offline());
    settle().await;

    let snap = editor.snapshot().await.unwrap();
    assert_eq!(snap.status, STATUS_RENDERER_UNAVAILABLE);
    assert_eq!(snap.artifact, None);
    assert!(snap.error.as_deref().is_some_and(|e| e.starts_with("renderer unavailable")), "{:?}", snap.error);
    assert!(store.writes_for(TEXT_KEY).is_empty());
}

#[test]
fn failure_status_follows_engine_error() {
    assert_eq!(failure_status(&EngineError::Syntax { message: "x".into() }), STATUS_SYNTAX_ERROR);
    assert_eq!(failure_status(&EngineError::Unavailable("mmdc".into())), STATUS_RENDERER_UNAVAILABLE);
    let io = std::io::Error::other("disk full");
    assert_eq!(failure_status(&EngineError::Io(io)), STATUS_RENDER_FAILED);
}

#[tokio::test(start_paused = true)]
async fn next_successful_render_clears_error() {
    let (editor, _engine, _store) = start(MemoryStore::with(&[(TEXT_KEY, "graph TD\nA-->")]), ScriptedEngine::new());
    settle().await;
    assert!(editor.snapshot().await.unwrap().error.is_some());

    editor.load("graph TD\nA-->B").await.unwrap();
    settle().await;
    assert_eq!(editor.snapshot().await.unwrap().error, None);
}

#[tokio::test(start_paused = true)]
async fn export_without_artifact_is_rejected() {
    let (editor, _engine, _store) = start(MemoryStore::with(&[(TEXT_KEY, "graph TD\nA-->")]), ScriptedEngine::new());
    settle().await;

    let err = editor.export_svg().await.unwrap_err();
    assert!(matches!(err, EditorError::Export(ExportError::NoArtifact)), "got {err:?}");
    assert_eq!(err.error_code(), "E_NO_ARTIFACT");

    let rasterizer = Rasterizer::new(Duration::from_secs(10), 4096);
    let err = editor.export_png(&rasterizer).await.unwrap_err();
    assert!(matches!(err, EditorError::Export(ExportError::NoArtifact)), "got {err:?}");
}

// =============================================================================
// THEME + TEMPLATES
// =============================================================================

#[tokio::test(start_paused = true)]
async fn theme_change_persists_and_rerenders_once() {
    let (editor, engine, store) = start(MemoryStore::default(), ScriptedEngine::new());
    settle().await;

    let snap = editor.set_theme(Theme::Forest).await.unwrap();
    assert_eq!(snap.theme, Theme::Forest);
    settle().await;

    let calls = engine.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].theme, Theme::Forest);
    assert_eq!(calls[1].source, calls[0].source);
    assert_eq!(store.writes_for(THEME_KEY), vec!["forest".to_owned()]);

    let snap = editor.snapshot().await.unwrap();
    assert_eq!(artifact(&snap), Some(svg_for(&calls[1].source, Theme::Forest).as_str()));
}

#[tokio::test(start_paused = true)]
async fn template_replaces_text_and_renders() {
    let (editor, engine, _store) = start(MemoryStore::default(), ScriptedEngine::new());
    settle().await;

    let snap = editor.load_template("sequence").await.unwrap();
    assert_eq!(Some(snap.text.as_str()), templates::template("sequence"));
    settle().await;
    assert_eq!(engine.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn unknown_template_is_an_error() {
    let (editor, engine, _store) = start(MemoryStore::default(), ScriptedEngine::new());
    settle().await;

    let err = editor.load_template("gantt-ish").await.unwrap_err();
    assert!(matches!(&err, EditorError::UnknownTemplate(name) if name == "gantt-ish"));
    assert_eq!(err.error_code(), "E_UNKNOWN_TEMPLATE");
    settle().await;
    assert_eq!(engine.calls().len(), 1);
}

// =============================================================================
// VIEW
// =============================================================================

#[tokio::test(start_paused = true)]
async fn zoom_clamps_and_is_reapplied_after_render() {
    let (editor, _engine, _store) = start(MemoryStore::default(), ScriptedEngine::new());
    settle().await;
    let mut events = editor.subscribe();

    assert_eq!(editor.adjust_zoom(75).await.unwrap().view.zoom_percent(), 175);
    assert_eq!(editor.zoom_in().await.unwrap().view.zoom_percent(), 200);
    let snap = editor.zoom_in().await.unwrap();
    assert_eq!(snap.view.zoom_percent(), 200);
    assert_eq!(snap.zoom.css, "scale(2)");
    assert_eq!(snap.zoom.label, "200%");

    editor.load("graph LR\nX-->Y").await.unwrap();
    settle().await;
    let zoom_on_render = drain(&mut events).into_iter().find_map(|e| match e {
        EditorEvent::Rendered { zoom, .. } => Some(zoom.percent),
        _ => None,
    });
    assert_eq!(zoom_on_render, Some(200));

    assert_eq!(editor.reset_zoom().await.unwrap().view.zoom_percent(), 100);
    assert_eq!(editor.zoom_out().await.unwrap().view.zoom_percent(), 75);
}

#[tokio::test(start_paused = true)]
async fn fullscreen_toggle_requests_and_host_corrects() {
    let (editor, _engine, _store) = start(MemoryStore::default(), ScriptedEngine::new());
    settle().await;
    let mut events = editor.subscribe();

    let snap = editor.toggle_fullscreen().await.unwrap();
    assert!(snap.view.is_fullscreen());
    assert!(
        drain(&mut events)
            .iter()
            .any(|e| matches!(e, EditorEvent::FullscreenRequested { active: true }))
    );

    // Host exited fullscreen on its own (e.g. Escape).
    let snap = editor.fullscreen_changed(false).await.unwrap();
    assert!(!snap.view.is_fullscreen());

    let snap = editor.toggle_fullscreen().await.unwrap();
    assert!(snap.view.is_fullscreen());
}

#[tokio::test(start_paused = true)]
async fn set_status_is_broadcast() {
    let (editor, _engine, _store) = start(MemoryStore::default(), ScriptedEngine::new());
    settle().await;
    let mut events = editor.subscribe();

    let snap = editor.set_status("Saved flow.mmd").await.unwrap();
    assert_eq!(snap.status, "Saved flow.mmd");
    assert!(
        drain(&mut events)
            .iter()
            .any(|e| matches!(e, EditorEvent::Status { message } if message == "Saved flow.mmd"))
    );
}

#[test]
fn events_serialize_with_kind_tag() {
    let event = EditorEvent::FullscreenRequested { active: true };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["kind"], "fullscreen_requested");
    assert_eq!(json["active"], true);
}
