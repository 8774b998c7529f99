//! WebSocket handler — live editor event stream and command channel.
//!
//! DESIGN
//! ======
//! On upgrade, subscribes to the editor's event broadcast and enters a
//! `select!` loop:
//! - Incoming client frames → parse + dispatch by syscall prefix → reply
//! - Editor events (render outcomes, view changes) → push as frames
//!
//! Handlers only translate between frames and `EditorHandle` calls; every
//! reply carries the session snapshot taken after the command ran.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → send `session:connected` with `client_id` and snapshot
//! 2. Client sends frames → dispatch → done/error reply to sender
//! 3. Editor events → pushed to every connected client
//! 4. Close → drop subscription

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::frame::{Data, Frame, Status};
use crate::services::editor::{EditorEvent, EditorSnapshot};
use crate::services::themes::Theme;
use crate::state::AppState;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();
    let mut events = state.editor.subscribe();

    let welcome = match state.editor.snapshot().await {
        Ok(snapshot) => Frame::request("session:connected", to_data(&snapshot)),
        Err(e) => {
            warn!(%client_id, error = %e, "ws: editor unavailable");
            return;
        }
    }
    .with_data("client_id", client_id.to_string());
    if send_frame(&mut socket, &welcome).await.is_err() {
        return;
    }

    info!(%client_id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        for frame in process_inbound_text(&state, client_id, text.as_str()).await {
                            let _ = send_frame(&mut socket, &frame).await;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            event = events.recv() => match event {
                Ok(event) => {
                    if send_frame(&mut socket, &event_frame(&event)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%client_id, skipped, "ws: client lagging; events dropped");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    info!(%client_id, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse and process one inbound text frame and return frames for the sender.
async fn process_inbound_text(state: &AppState, client_id: Uuid, text: &str) -> Vec<Frame> {
    let req: Frame = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound frame");
            let err = Frame::request("gateway:error", Data::new()).with_data("message", format!("invalid json: {e}"));
            return vec![err];
        }
    };

    debug!(%client_id, id = %req.id, syscall = %req.syscall, "ws: recv frame");

    let result = match req.prefix() {
        "editor" => handle_editor(state, &req).await,
        "view" => handle_view(state, &req).await,
        prefix => Err(req.error(format!("unknown prefix: {prefix}"))),
    };

    match result {
        Ok(snapshot) => vec![req.done_with(to_data(&snapshot))],
        Err(err_frame) => vec![err_frame],
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn handle_editor(state: &AppState, req: &Frame) -> Result<EditorSnapshot, Frame> {
    let editor = &state.editor;
    let result = match req.verb() {
        "edit" | "set" => {
            let Some(text) = req.str_field("text") else {
                return Err(req.error("text required"));
            };
            if req.verb() == "edit" { editor.edit(text).await } else { editor.load(text).await }
        }
        "template" => {
            let Some(name) = req.str_field("name") else {
                return Err(req.error("name required"));
            };
            editor.load_template(name).await
        }
        "theme" => {
            let Some(raw) = req.str_field("theme") else {
                return Err(req.error("theme required"));
            };
            let theme = raw.parse::<Theme>().map_err(|e| req.error_from(&e))?;
            editor.set_theme(theme).await
        }
        "snapshot" => editor.snapshot().await,
        op => return Err(req.error(format!("unknown editor op: {op}"))),
    };
    result.map_err(|e| req.error_from(&e))
}

async fn handle_view(state: &AppState, req: &Frame) -> Result<EditorSnapshot, Frame> {
    let editor = &state.editor;
    let result = match req.verb() {
        "zoom" => {
            let Some(delta) = req.i64_field("delta").and_then(|d| i32::try_from(d).ok()) else {
                return Err(req.error("delta required"));
            };
            editor.adjust_zoom(delta).await
        }
        "zoom_in" => editor.zoom_in().await,
        "zoom_out" => editor.zoom_out().await,
        "reset" => editor.reset_zoom().await,
        "fullscreen" => editor.toggle_fullscreen().await,
        "fullscreen_changed" => {
            let Some(active) = req.bool_field("active") else {
                return Err(req.error("active required"));
            };
            editor.fullscreen_changed(active).await
        }
        op => return Err(req.error(format!("unknown view op: {op}"))),
    };
    result.map_err(|e| req.error_from(&e))
}

// =============================================================================
// EVENTS
// =============================================================================

fn event_syscall(event: &EditorEvent) -> &'static str {
    match event {
        EditorEvent::Rendered { .. } => "render:done",
        EditorEvent::RenderFailed { .. } => "render:error",
        EditorEvent::Cleared { .. } => "render:cleared",
        EditorEvent::ViewChanged { .. } => "view:changed",
        EditorEvent::FullscreenRequested { .. } => "view:fullscreen_request",
        EditorEvent::Status { .. } => "editor:status",
    }
}

/// Server-pushed frame for an editor event.
fn event_frame(event: &EditorEvent) -> Frame {
    let mut data = to_data(event);
    data.remove("kind");
    Frame::request(event_syscall(event), data)
}

fn to_data(value: &impl Serialize) -> Data {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
        Ok(_) => Data::new(),
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize payload");
            Data::new()
        }
    }
}

// =============================================================================
// SEND
// =============================================================================

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };
    if frame.status == Status::Error {
        let code = frame.str_field("code").unwrap_or("-");
        let message = frame.str_field("message").unwrap_or("-");
        info!(syscall = %frame.syscall, %code, %message, "ws: send error frame");
    }
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
