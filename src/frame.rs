//! Frame — the websocket message type for the live editor.
//!
//! ARCHITECTURE
//! ============
//! Browser clients send request frames over the websocket, the server
//! dispatches them by syscall prefix (`editor:`, `view:`), and answers with
//! done/error frames. Render outcomes and view changes are pushed as
//! unsolicited request frames (`render:done`, `view:changed`, ...).
//!
//! DESIGN
//! ======
//! - Flat data: payload is always `Map<String, Value>`.
//! - Responses correlate to requests via `parent_id`.
//! - The websocket handler routes on `syscall` prefix and leaves `data`
//!   interpretation to the per-prefix handlers.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// FIELD CONSTANTS
// =============================================================================

/// Frame data key for error messages.
pub const FRAME_MESSAGE: &str = "message";

/// Frame data key for grepable error codes.
pub const FRAME_CODE: &str = "code";

/// Frame data key for the retryable flag on error frames.
pub const FRAME_RETRYABLE: &str = "retryable";

// =============================================================================
// TYPES
// =============================================================================

/// Flat key-value payload.
pub type Data = HashMap<String, serde_json::Value>;

/// Lifecycle position of a frame in a request/response exchange.
///
/// Every exchange is `request → done` or `request → error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Request,
    Done,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub id: Uuid,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    /// Milliseconds since Unix epoch.
    #[serde(default)]
    pub ts: i64,
    pub syscall: String,
    pub status: Status,
    #[serde(default)]
    pub data: Data,
}

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and retryable flag for structured error frames.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// CONSTRUCTORS
// =============================================================================

fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

impl Frame {
    /// Create a request frame. Also used for server-pushed events.
    pub fn request(syscall: impl Into<String>, data: Data) -> Self {
        Self { id: Uuid::new_v4(), parent_id: None, ts: now_ms(), syscall: syscall.into(), status: Status::Request, data }
    }

    /// Terminal success reply carrying `data`.
    #[must_use]
    pub fn done_with(&self, data: Data) -> Self {
        self.reply(Status::Done, data)
    }

    /// Terminal error reply from a plain message.
    #[must_use]
    pub fn error(&self, message: impl Into<String>) -> Self {
        let mut data = Data::new();
        data.insert(FRAME_MESSAGE.into(), serde_json::Value::String(message.into()));
        self.reply(Status::Error, data)
    }

    /// Terminal error reply from a typed error.
    #[must_use]
    pub fn error_from(&self, err: &(impl ErrorCode + ?Sized)) -> Self {
        let mut data = Data::new();
        data.insert(FRAME_CODE.into(), serde_json::Value::String(err.error_code().to_string()));
        data.insert(FRAME_MESSAGE.into(), serde_json::Value::String(err.to_string()));
        data.insert(FRAME_RETRYABLE.into(), serde_json::Value::Bool(err.retryable()));
        self.reply(Status::Error, data)
    }

    fn reply(&self, status: Status, data: Data) -> Self {
        Self { id: Uuid::new_v4(), parent_id: Some(self.id), ts: now_ms(), syscall: self.syscall.clone(), status, data }
    }
}

// =============================================================================
// BUILDERS + ACCESSORS
// =============================================================================

impl Frame {
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Extract the syscall prefix (everything before the first ':').
    #[must_use]
    pub fn prefix(&self) -> &str {
        let Some((prefix, _)) = self.syscall.split_once(':') else {
            return &self.syscall;
        };
        prefix
    }

    /// Extract the syscall verb (everything after the first ':').
    #[must_use]
    pub fn verb(&self) -> &str {
        self.syscall
            .split_once(':')
            .map_or("", |(_, verb)| verb)
    }

    #[must_use]
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(serde_json::Value::as_str)
    }

    #[must_use]
    pub fn i64_field(&self, key: &str) -> Option<i64> {
        self.data.get(key).and_then(serde_json::Value::as_i64)
    }

    #[must_use]
    pub fn bool_field(&self, key: &str) -> Option<bool> {
        self.data.get(key).and_then(serde_json::Value::as_bool)
    }
}

#[cfg(test)]
#[path = "frame_test.rs"]
mod tests;
