use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryRole {
    Player,
    Narrator,
}

/// One transcript entry. The transcript is append-only; prompts only ever
/// see the trailing window, never the whole thing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    pub text: String,

    /// Illustration for narrator entries, when the reconciliation payload
    /// carried an image prompt. The presentation layer decides whether to
    /// fetch it.
    pub image_url: Option<String>,
}

impl HistoryEntry {
    pub fn player(text: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::Player,
            text: text.into(),
            image_url: None,
        }
    }

    pub fn narrator(text: impl Into<String>, image_url: Option<String>) -> Self {
        Self {
            role: HistoryRole::Narrator,
            text: text.into(),
            image_url,
        }
    }
}
