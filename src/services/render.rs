//! Render coordinator — request sequencing and freshness checks.
//!
//! DESIGN
//! ======
//! The coordinator is a synchronous state machine. `begin` turns the text
//! into either a cleared display or a new `RenderRequest` with a strictly
//! increasing `request_id`; the caller runs the engine call however it
//! likes and hands the outcome back to `complete`. Only a completion whose
//! id equals the latest issued id may touch the displayed artifact, so
//! engine calls are free to finish in any order.
//!
//! Clearing the display also advances the latest id, which retires any
//! call still in flight for the text that was just erased.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counter for renderer identifiers.
static RENDER_SEQ: AtomicU64 = AtomicU64::new(1);

fn next_render_id() -> String {
    format!("mermaid-{}", RENDER_SEQ.fetch_add(1, Ordering::Relaxed))
}

// =============================================================================
// TYPES
// =============================================================================

/// Immutable snapshot handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub request_id: u64,
    /// Identifier passed to the engine; unique across the process.
    pub render_id: String,
    /// Trimmed text sent to the engine.
    pub text: String,
    /// Text as the user entered it.
    pub input: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderResult {
    Success { artifact: Arc<str> },
    Failure { message: String },
}

/// What `begin` decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderStep {
    /// Input was blank; the display has been cleared.
    Cleared,
    /// A new request must be sent to the engine.
    Issued(RenderRequest),
}

/// What `complete` did with an engine outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// A newer request exists; the outcome was dropped.
    Stale { request_id: u64, latest: u64 },
    Rendered { artifact: Arc<str> },
    /// Engine rejected the input; the previous artifact stays displayed.
    Failed { message: String },
}

// =============================================================================
// COORDINATOR
// =============================================================================

#[derive(Debug, Default)]
pub struct RenderCoordinator {
    latest_issued: u64,
    displayed: Option<Arc<str>>,
    error: Option<String>,
}

impl RenderCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn latest_request_id(&self) -> u64 {
        self.latest_issued
    }

    /// Last successfully rendered vector markup.
    #[must_use]
    pub fn displayed(&self) -> Option<&Arc<str>> {
        self.displayed.as_ref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn begin(&mut self, text: &str) -> RenderStep {
        self.latest_issued += 1;
        if text.trim().is_empty() {
            self.displayed = None;
            self.error = None;
            return RenderStep::Cleared;
        }
        RenderStep::Issued(RenderRequest {
            request_id: self.latest_issued,
            render_id: next_render_id(),
            text: text.trim().to_owned(),
            input: text.to_owned(),
        })
    }

    pub fn complete(&mut self, request_id: u64, result: RenderResult) -> Completion {
        if request_id != self.latest_issued {
            return Completion::Stale { request_id, latest: self.latest_issued };
        }
        match result {
            RenderResult::Success { artifact } => {
                self.displayed = Some(Arc::clone(&artifact));
                self.error = None;
                Completion::Rendered { artifact }
            }
            RenderResult::Failure { message } => {
                self.error = Some(message.clone());
                Completion::Failed { message }
            }
        }
    }
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
