use std::fmt;

use serde::{Deserialize, Serialize};

/// A named, payload-less toolbar command.
///
/// The toolbar vocabulary is fixed; anything else arrives as a normalized
/// free-form label (lowercased, whitespace collapsed to hyphens).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum CommandKey {
    Refresh,
    AddNew,
    Sort,
    ManageColumns,
    ChartStats,
    Filter,
    Custom(String),
}

impl CommandKey {
    /// Parse a toolbar label into a command key.
    ///
    /// Known labels map to their variants; unknown labels are normalized and
    /// kept as `Custom`.
    pub fn from_label(label: &str) -> Self {
        let normalized = normalize_label(label);
        match normalized.as_str() {
            "refresh" => CommandKey::Refresh,
            "add-new" => CommandKey::AddNew,
            "sort" => CommandKey::Sort,
            "manage-columns" => CommandKey::ManageColumns,
            // The toolbar renders this one as "chart/stats".
            "chart-stats" | "chart/stats" => CommandKey::ChartStats,
            "filter" => CommandKey::Filter,
            _ => CommandKey::Custom(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CommandKey::Refresh => "refresh",
            CommandKey::AddNew => "add-new",
            CommandKey::Sort => "sort",
            CommandKey::ManageColumns => "manage-columns",
            CommandKey::ChartStats => "chart-stats",
            CommandKey::Filter => "filter",
            CommandKey::Custom(label) => label,
        }
    }
}

impl fmt::Display for CommandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CommandKey> for String {
    fn from(key: CommandKey) -> Self {
        key.as_str().to_string()
    }
}

impl From<String> for CommandKey {
    fn from(label: String) -> Self {
        CommandKey::from_label(&label)
    }
}

/// Lowercase and collapse whitespace runs to single hyphens.
fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}
