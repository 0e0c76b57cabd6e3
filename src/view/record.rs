use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A row in a list view: an opaque record of named fields with one identifier
/// unique within the view's row set. No other cross-field invariant exists.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> String;
    fn field(&self, key: &str) -> FieldValue;
}

/// One field of a record, reduced to the shapes the engine compares.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Missing,
}

impl FieldValue {
    /// String form used for search matching; missing values coerce to "".
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Missing => String::new(),
        }
    }

    /// Ordering used by sort: numeric for number pairs, lexicographic
    /// code-point order otherwise (after empty-string coercion).
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
            _ => self.as_text().cmp(&other.as_text()),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Row adapter for JSON objects, so wire payloads can back a view directly.
///
/// The identifier is the `id` field's string form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonRecord(pub serde_json::Value);

impl Record for JsonRecord {
    fn id(&self) -> String {
        self.field("id").as_text()
    }

    fn field(&self, key: &str) -> FieldValue {
        match self.0.get(key) {
            Some(serde_json::Value::String(s)) => FieldValue::Text(s.clone()),
            Some(serde_json::Value::Number(n)) => {
                n.as_f64().map(FieldValue::Number).unwrap_or(FieldValue::Missing)
            }
            Some(serde_json::Value::Bool(b)) => FieldValue::Text(b.to_string()),
            Some(serde_json::Value::Null) | None => FieldValue::Missing,
            Some(other) => FieldValue::Text(other.to_string()),
        }
    }
}
