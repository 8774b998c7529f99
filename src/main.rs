mod config;
mod engine;
mod frame;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use crate::config::EditorConfig;
use crate::engine::MmdcEngine;
use crate::services::editor::spawn_editor;
use crate::services::export::Rasterizer;
use crate::services::files::DiagramFiles;
use crate::services::persistence::JsonFileStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = EditorConfig::from_env()?;

    let engine = MmdcEngine::new(&config.mmdc_path)?;
    tracing::info!(cli = %engine.cli_path().display(), "mermaid renderer configured");

    let store = JsonFileStore::open(&config.settings_path);
    let editor = spawn_editor(config.editor_options(), Arc::new(engine), Arc::new(store));

    let rasterizer = Rasterizer::new(config.raster_timeout, config.raster_max_dimension).with_system_fonts();
    let files = DiagramFiles::new(&config.root_dir);
    let state = state::AppState::new(editor, files, rasterizer);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    tracing::info!(port = config.port, dir = %config.root_dir.display(), "mermaid-live listening");
    axum::serve(listener, app).await?;
    Ok(())
}
