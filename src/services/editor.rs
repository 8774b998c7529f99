//! Editor session — single owner of the live editing state.
//!
//! ARCHITECTURE
//! ============
//! One Tokio task owns an `EditorSession`: the source text, debounce gate,
//! render coordinator, view state and persistence adapter. Everything else
//! talks to it through a cloneable `EditorHandle` that sends commands and
//! awaits a snapshot reply. Engine calls run as separate tasks and post
//! their outcome back to the session, which applies the freshness check
//! before anything becomes visible.
//!
//! LIFECYCLE
//! =========
//! 1. Spawn → load persisted text/theme → configure engine → first render
//! 2. `edit` → re-arm debounce → gate fires → render
//! 3. `load`/`template`/`set_theme` → render immediately
//! 4. Engine completion → coordinator → event broadcast (+ persist on success)
//! 5. Last handle dropped → task exits; in-flight engine calls finish unobserved

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::engine::{EngineError, EngineSettings, RenderEngine};
use crate::frame::ErrorCode;
use crate::services::debounce::{DebounceGate, sleep_until_due};
use crate::services::export::{self, ExportError, ExportFile, Rasterizer};
use crate::services::persistence::{KeyValueStore, PersistenceAdapter};
use crate::services::render::{Completion, RenderCoordinator, RenderRequest, RenderResult, RenderStep};
use crate::services::templates;
use crate::services::themes::Theme;
use crate::services::view::{ViewState, ZoomBounds, ZoomTransform};

const COMMAND_QUEUE_CAPACITY: usize = 256;
const EVENT_QUEUE_CAPACITY: usize = 256;

pub const PLACEHOLDER: &str = "Enter Mermaid code to see the diagram";
pub const STATUS_READY: &str = "Ready";
pub const STATUS_RENDERED: &str = "Rendered successfully";
pub const STATUS_SYNTAX_ERROR: &str = "Syntax error";
pub const STATUS_RENDERER_UNAVAILABLE: &str = "Renderer unavailable";
pub const STATUS_RENDER_FAILED: &str = "Render failed";
pub const STATUS_SVG_EXPORTED: &str = "SVG exported";
pub const STATUS_PNG_EXPORTED: &str = "PNG exported";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct EditorOptions {
    pub debounce: Duration,
    pub zoom: ZoomBounds,
}

/// Pushed to every subscriber.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditorEvent {
    Rendered { request_id: u64, svg: Arc<str>, zoom: ZoomTransform },
    RenderFailed { request_id: u64, message: String },
    Cleared { placeholder: &'static str },
    ViewChanged { view: ViewState, zoom: ZoomTransform },
    /// Ask clients to enter or leave host fullscreen.
    FullscreenRequested { active: bool },
    Status { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct EditorSnapshot {
    pub text: String,
    pub theme: Theme,
    pub status: String,
    pub error: Option<String>,
    pub artifact: Option<Arc<str>>,
    pub view: ViewState,
    pub zoom: ZoomTransform,
    pub latest_request_id: u64,
    /// An edit is waiting for its debounce window.
    pub render_pending: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    #[error("editor session closed")]
    Closed,

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl ErrorCode for EditorError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownTemplate(_) => "E_UNKNOWN_TEMPLATE",
            Self::Closed => "E_SESSION_CLOSED",
            Self::Export(e) => e.error_code(),
        }
    }
}

#[derive(Debug)]
enum Op {
    Edit(String),
    Load(String),
    Template(String),
    SetTheme(Theme),
    AdjustZoom(i32),
    ZoomIn,
    ZoomOut,
    ResetZoom,
    ToggleFullscreen,
    FullscreenChanged(bool),
    SetStatus(String),
    Snapshot,
}

struct Command {
    op: Op,
    reply: oneshot::Sender<Result<EditorSnapshot, EditorError>>,
}

struct RenderCompletion {
    request: RenderRequest,
    outcome: Result<Arc<str>, EngineError>,
}

// =============================================================================
// SESSION
// =============================================================================

struct EditorSession {
    text: String,
    theme: Theme,
    status: String,
    gate: DebounceGate<String>,
    coordinator: RenderCoordinator,
    view: ViewState,
    persistence: PersistenceAdapter,
    engine: Arc<dyn RenderEngine>,
    completions: mpsc::UnboundedSender<RenderCompletion>,
    events: broadcast::Sender<EditorEvent>,
}

impl EditorSession {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>, mut completions: mpsc::UnboundedReceiver<RenderCompletion>) {
        let initial = self.text.clone();
        self.render(&initial);

        loop {
            let deadline = self.gate.deadline();
            tokio::select! {
                command = commands.recv() => {
                    let Some(Command { op, reply }) = command else { break };
                    let result = self.apply(op).map(|()| self.snapshot());
                    let _ = reply.send(result);
                }
                Some(done) = completions.recv() => self.on_completed(done),
                () = sleep_until_due(deadline) => {
                    if let Some(text) = self.gate.take_due(Instant::now()) {
                        self.render(&text);
                    }
                }
            }
        }
        info!("editor session stopped");
    }

    fn apply(&mut self, op: Op) -> Result<(), EditorError> {
        match op {
            Op::Edit(text) => {
                self.text.clone_from(&text);
                self.gate.notify(text);
            }
            Op::Load(text) => self.load_text(text),
            Op::Template(name) => {
                let body = templates::template(&name).ok_or(EditorError::UnknownTemplate(name))?;
                self.load_text(body.to_owned());
            }
            Op::SetTheme(theme) => {
                self.persistence.save_theme(theme);
                self.theme = theme;
                self.engine.configure(EngineSettings { theme });
                info!(%theme, "theme changed");
                self.render_now();
            }
            Op::AdjustZoom(delta) => {
                self.view.adjust_zoom(delta);
                self.emit_view();
            }
            Op::ZoomIn => {
                let step = self.zoom_step();
                self.view.adjust_zoom(step);
                self.emit_view();
            }
            Op::ZoomOut => {
                let step = self.zoom_step();
                self.view.adjust_zoom(-step);
                self.emit_view();
            }
            Op::ResetZoom => {
                self.view.reset_zoom();
                self.emit_view();
            }
            Op::ToggleFullscreen => {
                let active = self.view.toggle_fullscreen();
                self.emit(EditorEvent::FullscreenRequested { active });
                self.emit_view();
            }
            Op::FullscreenChanged(active) => {
                self.view.fullscreen_changed(active);
                self.emit_view();
            }
            Op::SetStatus(message) => self.set_status(message),
            Op::Snapshot => {}
        }
        Ok(())
    }

    fn zoom_step(&self) -> i32 {
        i32::try_from(self.view.bounds().step).unwrap_or(i32::MAX)
    }

    fn load_text(&mut self, text: String) {
        self.text = text;
        self.render_now();
    }

    /// Render the current text right away; a pending debounced edit carries
    /// the same text and is dropped.
    fn render_now(&mut self) {
        self.gate.cancel();
        let text = self.text.clone();
        self.render(&text);
    }

    fn render(&mut self, text: &str) {
        match self.coordinator.begin(text) {
            RenderStep::Cleared => {
                debug!(request_id = self.coordinator.latest_request_id(), "blank input; display cleared");
                self.emit(EditorEvent::Cleared { placeholder: PLACEHOLDER });
            }
            RenderStep::Issued(request) => self.dispatch(request),
        }
    }

    fn dispatch(&self, request: RenderRequest) {
        debug!(request_id = request.request_id, render_id = %request.render_id, "render issued");
        let engine = Arc::clone(&self.engine);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let outcome = engine
                .render(&request.render_id, &request.text)
                .await
                .map(|markup| Arc::<str>::from(markup.svg));
            let _ = completions.send(RenderCompletion { request, outcome });
        });
    }

    fn on_completed(&mut self, done: RenderCompletion) {
        let request_id = done.request.request_id;
        let (result, status) = match done.outcome {
            Ok(artifact) => (RenderResult::Success { artifact }, STATUS_RENDERED),
            Err(e) => (RenderResult::Failure { message: e.to_string() }, failure_status(&e)),
        };
        match self.coordinator.complete(request_id, result) {
            Completion::Stale { request_id, latest } => {
                debug!(request_id, latest, "stale render result discarded");
            }
            Completion::Rendered { artifact } => {
                self.persistence.save_text(&done.request.input);
                let zoom = self.view.apply_zoom();
                self.emit(EditorEvent::Rendered { request_id, svg: artifact, zoom });
                self.set_status(status.to_owned());
            }
            Completion::Failed { message } => {
                info!(request_id, error = %message, "render rejected");
                self.emit(EditorEvent::RenderFailed { request_id, message });
                self.set_status(status.to_owned());
            }
        }
    }

    fn set_status(&mut self, message: String) {
        self.status.clone_from(&message);
        self.emit(EditorEvent::Status { message });
    }

    fn emit_view(&self) {
        debug!(zoom = self.view.zoom_percent(), fullscreen = self.view.is_fullscreen(), "view changed");
        self.emit(EditorEvent::ViewChanged { view: self.view, zoom: self.view.apply_zoom() });
    }

    fn emit(&self, event: EditorEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            text: self.text.clone(),
            theme: self.theme,
            status: self.status.clone(),
            error: self.coordinator.error().map(str::to_owned),
            artifact: self.coordinator.displayed().cloned(),
            view: self.view,
            zoom: self.view.apply_zoom(),
            latest_request_id: self.coordinator.latest_request_id(),
            render_pending: self.gate.is_armed(),
        }
    }
}

fn failure_status(err: &EngineError) -> &'static str {
    match err {
        EngineError::Syntax { .. } => STATUS_SYNTAX_ERROR,
        EngineError::Unavailable(_) => STATUS_RENDERER_UNAVAILABLE,
        EngineError::Io(_) => STATUS_RENDER_FAILED,
    }
}

// =============================================================================
// HANDLE
// =============================================================================

/// Cloneable front door to the editor task.
#[derive(Clone)]
pub struct EditorHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<EditorEvent>,
}

/// Start the editor task and render the restored text.
pub fn spawn_editor(options: EditorOptions, engine: Arc<dyn RenderEngine>, store: Arc<dyn KeyValueStore>) -> EditorHandle {
    let persistence = PersistenceAdapter::new(store);
    let settings = persistence.load();
    engine.configure(EngineSettings { theme: settings.theme });

    let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
    let (completion_tx, completion_rx) = mpsc::unbounded_channel();
    let (events, _) = broadcast::channel(EVENT_QUEUE_CAPACITY);

    info!(
        theme = %settings.theme,
        text_bytes = settings.last_text.len(),
        debounce_ms = u64::try_from(options.debounce.as_millis()).unwrap_or(u64::MAX),
        "editor session starting"
    );

    let session = EditorSession {
        text: settings.last_text,
        theme: settings.theme,
        status: STATUS_READY.to_owned(),
        gate: DebounceGate::new(options.debounce),
        coordinator: RenderCoordinator::new(),
        view: ViewState::new(options.zoom),
        persistence,
        engine,
        completions: completion_tx,
        events: events.clone(),
    };
    tokio::spawn(session.run(command_rx, completion_rx));

    EditorHandle { commands: command_tx, events }
}

impl EditorHandle {
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }

    async fn call(&self, op: Op) -> Result<EditorSnapshot, EditorError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command { op, reply })
            .await
            .map_err(|_| EditorError::Closed)?;
        rx.await.map_err(|_| EditorError::Closed)?
    }

    /// Raw text change from the editing surface; rendered after the debounce window.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the session task has stopped.
    pub async fn edit(&self, text: impl Into<String>) -> Result<EditorSnapshot, EditorError> {
        self.call(Op::Edit(text.into())).await
    }

    /// Programmatic text replacement (file load); rendered immediately.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the session task has stopped.
    pub async fn load(&self, text: impl Into<String>) -> Result<EditorSnapshot, EditorError> {
        self.call(Op::Load(text.into())).await
    }

    /// # Errors
    ///
    /// `UnknownTemplate` if `name` is not in the catalog.
    pub async fn load_template(&self, name: &str) -> Result<EditorSnapshot, EditorError> {
        self.call(Op::Template(name.to_owned())).await
    }

    /// Persist the theme, re-initialize the engine and re-render.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the session task has stopped.
    pub async fn set_theme(&self, theme: Theme) -> Result<EditorSnapshot, EditorError> {
        self.call(Op::SetTheme(theme)).await
    }

    /// # Errors
    ///
    /// Returns `Closed` if the session task has stopped.
    pub async fn adjust_zoom(&self, delta: i32) -> Result<EditorSnapshot, EditorError> {
        self.call(Op::AdjustZoom(delta)).await
    }

    /// # Errors
    ///
    /// Returns `Closed` if the session task has stopped.
    pub async fn zoom_in(&self) -> Result<EditorSnapshot, EditorError> {
        self.call(Op::ZoomIn).await
    }

    /// # Errors
    ///
    /// Returns `Closed` if the session task has stopped.
    pub async fn zoom_out(&self) -> Result<EditorSnapshot, EditorError> {
        self.call(Op::ZoomOut).await
    }

    /// # Errors
    ///
    /// Returns `Closed` if the session task has stopped.
    pub async fn reset_zoom(&self) -> Result<EditorSnapshot, EditorError> {
        self.call(Op::ResetZoom).await
    }

    /// # Errors
    ///
    /// Returns `Closed` if the session task has stopped.
    pub async fn toggle_fullscreen(&self) -> Result<EditorSnapshot, EditorError> {
        self.call(Op::ToggleFullscreen).await
    }

    /// Report the fullscreen state the client actually reached.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the session task has stopped.
    pub async fn fullscreen_changed(&self, active: bool) -> Result<EditorSnapshot, EditorError> {
        self.call(Op::FullscreenChanged(active)).await
    }

    /// # Errors
    ///
    /// Returns `Closed` if the session task has stopped.
    pub async fn set_status(&self, message: impl Into<String>) -> Result<EditorSnapshot, EditorError> {
        self.call(Op::SetStatus(message.into())).await
    }

    /// # Errors
    ///
    /// Returns `Closed` if the session task has stopped.
    pub async fn snapshot(&self) -> Result<EditorSnapshot, EditorError> {
        self.call(Op::Snapshot).await
    }

    /// Copy of the displayed artifact as an SVG download.
    ///
    /// # Errors
    ///
    /// `Export(NoArtifact)` before the first successful render.
    pub async fn export_svg(&self) -> Result<ExportFile, EditorError> {
        let snapshot = self.snapshot().await?;
        let file = export::export_vector(snapshot.artifact.as_ref())?;
        self.set_status(STATUS_SVG_EXPORTED).await?;
        Ok(file)
    }

    /// Displayed artifact rasterized to PNG.
    ///
    /// # Errors
    ///
    /// `Export(NoArtifact)` before the first successful render, other
    /// `Export` variants when rasterization fails or times out.
    pub async fn export_png(&self, rasterizer: &Rasterizer) -> Result<ExportFile, EditorError> {
        let snapshot = self.snapshot().await?;
        let file = rasterizer.export_raster(snapshot.artifact).await?;
        self.set_status(STATUS_PNG_EXPORTED).await?;
        Ok(file)
    }
}

#[cfg(test)]
#[path = "editor_test.rs"]
mod tests;
