use serde::{Deserialize, Serialize};

/// Severity of a server-pushed event, also used to style its notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
    #[default]
    Default,
}

/// A server-originated push event.
///
/// The wire shape carries the severity under `type`, a human-readable message,
/// and an optional opaque metadata object the core never interprets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    #[serde(rename = "type", default)]
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl RealtimeEvent {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            meta: None,
        }
    }
}
