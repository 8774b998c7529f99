//! Mermaid CLI (`mmdc`) engine.
//!
//! Each call gets its own input, config and output files inside a private
//! work directory, named after the caller's render id, so concurrent calls
//! never share state. The theme is written into a per-call config file
//! because the CLI's `--theme` flag does not accept every theme. HTML labels
//! are switched off there too, so labels survive PNG export.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::RwLock;
use std::time::Instant;

use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{EngineError, EngineSettings, RenderEngine, RenderedMarkup};

const FALLBACK_SYNTAX_MESSAGE: &str = "Invalid Mermaid syntax";

pub struct MmdcEngine {
    cli_path: PathBuf,
    settings: RwLock<EngineSettings>,
    work_dir: tempfile::TempDir,
}

impl MmdcEngine {
    /// # Errors
    ///
    /// Returns an error if the private work directory cannot be created.
    pub fn new(cli_path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let work_dir = tempfile::Builder::new().prefix("mermaid-live-").tempdir()?;
        Ok(Self { cli_path: cli_path.into(), settings: RwLock::new(EngineSettings::default()), work_dir })
    }

    #[must_use]
    pub fn cli_path(&self) -> &Path {
        &self.cli_path
    }

    fn settings(&self) -> EngineSettings {
        self.settings
            .read()
            .map(|s| *s)
            .unwrap_or_default()
    }

    async fn run_cli(&self, stem: &str, source: &str, settings: EngineSettings) -> Result<RenderedMarkup, EngineError> {
        let input = self.work_dir.path().join(format!("{stem}.mmd"));
        let config = self.work_dir.path().join(format!("{stem}.json"));
        let output = self.work_dir.path().join(format!("{stem}.svg"));

        tokio::fs::write(&input, source).await?;
        let config_body = cli_config(settings);
        tokio::fs::write(&config, config_body.to_string()).await?;

        let result = Command::new(&self.cli_path)
            .arg("--input")
            .arg(&input)
            .arg("--output")
            .arg(&output)
            .arg("--outputFormat")
            .arg("svg")
            .arg("--configFile")
            .arg(&config)
            .arg("--quiet")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let outcome = match result {
            Ok(out) if out.status.success() => tokio::fs::read_to_string(&output)
                .await
                .map(|svg| RenderedMarkup { svg })
                .map_err(EngineError::Io),
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                debug!(exit_code = ?out.status.code(), stderr = %stderr, "mmdc rejected diagram");
                Err(EngineError::Syntax { message: syntax_message(&stderr) })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(EngineError::Unavailable(format!("{}: {e}", self.cli_path.display())))
            }
            Err(e) => Err(EngineError::Io(e)),
        };

        for path in [&input, &config, &output] {
            if let Err(e) = tokio::fs::remove_file(path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "mmdc scratch cleanup failed");
                }
            }
        }

        outcome
    }
}

#[async_trait::async_trait]
impl RenderEngine for MmdcEngine {
    fn configure(&self, settings: EngineSettings) {
        match self.settings.write() {
            Ok(mut current) => *current = settings,
            Err(_) => warn!("mmdc settings lock poisoned; keeping previous settings"),
        }
    }

    async fn render(&self, render_id: &str, source: &str) -> Result<RenderedMarkup, EngineError> {
        let started = Instant::now();
        let settings = self.settings();
        let stem = file_stem(render_id);
        let result = self.run_cli(&stem, source, settings).await;

        match &result {
            Ok(markup) => info!(
                render_id,
                theme = %settings.theme,
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                svg_bytes = markup.svg.len(),
                "mmdc render complete"
            ),
            Err(e) => info!(
                render_id,
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                error = %e,
                "mmdc render failed"
            ),
        }
        result
    }
}

/// Per-call Mermaid config. Labels are plain SVG text so the PNG rasterizer,
/// which ignores `<foreignObject>`, still draws them.
fn cli_config(settings: EngineSettings) -> serde_json::Value {
    serde_json::json!({
        "theme": settings.theme.as_str(),
        "htmlLabels": false,
        "flowchart": { "htmlLabels": false },
    })
}

/// Reduce a render id to a safe file name.
fn file_stem(render_id: &str) -> String {
    let stem: String = render_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() { "render".to_owned() } else { stem }
}

/// Pull a user-facing message out of CLI stderr.
fn syntax_message(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .filter(|l| !l.trim_start().starts_with("at "))
        .collect();
    if lines.is_empty() {
        return FALLBACK_SYNTAX_MESSAGE.to_owned();
    }
    lines
        .into_iter()
        .map(|l| l.strip_prefix("Error: ").unwrap_or(l))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[path = "mmdc_test.rs"]
mod tests;
