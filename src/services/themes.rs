//! Mermaid theme names accepted by the renderer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Forest,
    Dark,
    Neutral,
    Base,
}

impl Theme {
    pub const ALL: [Theme; 5] = [Theme::Default, Theme::Forest, Theme::Dark, Theme::Neutral, Theme::Base];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Default => "default",
            Theme::Forest => "forest",
            Theme::Dark => "dark",
            Theme::Neutral => "neutral",
            Theme::Base => "base",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme: {0}")]
pub struct UnknownTheme(pub String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        Theme::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(raw))
            .ok_or_else(|| UnknownTheme(raw.to_owned()))
    }
}

impl crate::frame::ErrorCode for UnknownTheme {
    fn error_code(&self) -> &'static str {
        "E_UNKNOWN_THEME"
    }
}
