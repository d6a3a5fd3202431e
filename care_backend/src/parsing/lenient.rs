//! Tolerant field deserializers for legacy data-file rows.
//!
//! Rows written by different generations of the data scripts disagree on the
//! JSON type of the same field: booleans arrive as `true`, `"true"` or `1`,
//! priorities as `7`, `"7"` or `"Hög"`. The helpers here are meant for
//! `#[serde(default, deserialize_with = "...")]` on `Option` fields and never
//! fail on an unexpected value; they return `None` and let the normalizer apply
//! its defaults instead.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::core::domain::Priority;

/// A priority as found in a raw row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawPriority {
    /// Numeric level, already clamped into `0..=10`.
    Level(Priority),
    /// Legacy "high" label (`Akut`, `Hög`, `high`). Resolved through the
    /// configured legacy priority.
    High,
    /// Legacy "normal" label (`Normal`, `Låg`, `low`). Resolves to 0.
    Normal,
}

impl RawPriority {
    fn from_label(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(level) = trimmed.parse::<f64>() {
            return Some(RawPriority::Level(Priority::from_f64(level)));
        }
        match trimmed.to_lowercase().as_str() {
            "akut" | "hög" | "hog" | "high" | "urgent" => Some(RawPriority::High),
            "normal" | "låg" | "lag" | "low" => Some(RawPriority::Normal),
            _ => None,
        }
    }

    /// Numeric level with `High` mapped to `high_level`.
    pub fn resolve(self, high_level: Priority) -> Priority {
        match self {
            RawPriority::Level(p) => p,
            RawPriority::High => high_level,
            RawPriority::Normal => Priority::NONE,
        }
    }
}

/// Accepts `true`/`false`, numbers (0 is false) and the strings
/// `true`/`false`/`yes`/`no`/`1`/`0`. Anything else reads as missing.
pub fn opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(bool_from_value(&value))
}

pub(crate) fn bool_from_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Accepts numbers, numeric strings and the legacy priority labels.
pub fn opt_priority<'de, D>(deserializer: D) -> Result<Option<RawPriority>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().map(|f| RawPriority::Level(Priority::from_f64(f))),
        Value::String(s) => RawPriority::from_label(&s),
        _ => None,
    })
}

/// Accepts strings and numbers; blank strings read as missing.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Accepts an array of strings or a single comma-separated string.
///
/// Non-string array entries are skipped. `null` reads as missing, so the
/// normalizer can still derive the list from task notes.
pub fn opt_string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect(),
        ),
        Value::String(s) => Some(split_list(&s)),
        _ => None,
    })
}

/// Splits on commas, trims and drops empty entries.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
