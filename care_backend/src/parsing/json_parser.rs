use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::core::domain::{Assignment, RecordId};
use crate::parsing::lenient::{self, RawPriority};

/// Raw visit row as stored under `events.rows`.
///
/// Every field the normalizer writes back is declared here, so `extra` only
/// ever holds fields this crate does not interpret.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVisitRow {
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub required_role: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string_list")]
    pub required_skills: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub task_notes: Option<String>,
    /// Single-valued status used before the boolean flags existed.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub visit_status: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub is_mandatory: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub is_optional: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub is_extra: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub is_cancelled: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub is_absent: Option<bool>,
    /// Generator-era `mandatory` flag, read when `isMandatory` is missing.
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub mandatory: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_priority")]
    pub priority: Option<RawPriority>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub visit_recurrence: Option<String>,
    /// Always re-derived; read only so it is not duplicated on write-back.
    #[serde(default)]
    pub visit_category: Option<Value>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub staffing_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub pinned: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub movable: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub service_area_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawVisitRow {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            required_role: None,
            required_skills: None,
            task_notes: None,
            visit_status: None,
            is_mandatory: None,
            is_optional: None,
            is_extra: None,
            is_cancelled: None,
            is_absent: None,
            mandatory: None,
            priority: None,
            visit_recurrence: None,
            visit_category: None,
            staffing_type: None,
            pinned: None,
            movable: None,
            service_area_id: None,
            extra: Map::new(),
        }
    }

    /// True when the row carries any canonical base-status information.
    pub fn has_base_flags(&self) -> bool {
        self.is_mandatory.is_some() || self.is_optional.is_some() || self.mandatory.is_some()
    }

    /// True when no status information of any kind is present.
    pub fn lacks_status(&self) -> bool {
        self.visit_status.is_none()
            && !self.has_base_flags()
            && self.is_extra.is_none()
            && self.is_cancelled.is_none()
            && self.is_absent.is_none()
    }
}

/// Raw employee row as stored under `resources.rows`.
///
/// Written back as read (plus fixture service areas), so the transport label
/// keeps its original spelling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEmployeeRow {
    pub id: RecordId,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub transport_mode: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub service_area_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawEmployeeRow {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            role: None,
            transport_mode: None,
            service_area_id: None,
            extra: Map::new(),
        }
    }
}

/// Raw assignment row. Older files use `event`/`resource`, newer ones
/// `eventId`/`resourceId`; both spellings are accepted.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAssignmentRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<RecordId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawAssignmentRow {
    /// The (employee, visit) link, or `None` when either end is missing.
    pub fn to_assignment(&self) -> Option<Assignment> {
        let visit_id = self.event_id.as_ref().or(self.event.as_ref())?;
        let employee_id = self.resource_id.as_ref().or(self.resource.as_ref())?;
        Some(Assignment::new(employee_id.clone(), visit_id.clone()))
    }
}

/// A `{ "rows": [...] }` store section. Sibling keys are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct RowSection<T> {
    #[serde(default = "Vec::new")]
    pub rows: Vec<T>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl<T> RowSection<T> {
    pub fn new(rows: Vec<T>) -> Self {
        Self {
            rows,
            other: Map::new(),
        }
    }
}

/// Container for a scheduler data file.
///
/// Every section is optional; keys other than `events`, `resources` and
/// `assignments` (e.g. `success`, `project`, `dependencies`) are preserved in
/// `other`.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetFile {
    #[serde(default)]
    pub events: Option<RowSection<RawVisitRow>>,
    #[serde(default)]
    pub resources: Option<RowSection<RawEmployeeRow>>,
    #[serde(default)]
    pub assignments: Option<RowSection<RawAssignmentRow>>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl DatasetFile {
    pub fn from_rows(
        visits: Vec<RawVisitRow>,
        employees: Vec<RawEmployeeRow>,
        assignments: Vec<RawAssignmentRow>,
    ) -> Self {
        Self {
            events: Some(RowSection::new(visits)),
            resources: Some(RowSection::new(employees)),
            assignments: Some(RowSection::new(assignments)),
            other: Map::new(),
        }
    }

    pub fn visit_rows(&self) -> &[RawVisitRow] {
        self.events.as_ref().map(|s| s.rows.as_slice()).unwrap_or(&[])
    }

    pub fn employee_rows(&self) -> &[RawEmployeeRow] {
        self.resources
            .as_ref()
            .map(|s| s.rows.as_slice())
            .unwrap_or(&[])
    }

    pub fn assignment_rows(&self) -> &[RawAssignmentRow] {
        self.assignments
            .as_ref()
            .map(|s| s.rows.as_slice())
            .unwrap_or(&[])
    }
}

const DATASET_KEYS: [&str; 3] = ["events", "resources", "assignments"];

/// Parse a scheduler data file
pub fn parse_dataset_json(json_path: &Path) -> Result<DatasetFile> {
    let json_content = std::fs::read_to_string(json_path)
        .with_context(|| format!("Failed to read JSON file: {}", json_path.display()))?;

    parse_dataset_json_str(&json_content)
        .with_context(|| format!("Failed to parse dataset: {}", json_path.display()))
}

/// Parse a scheduler data file from a string
pub fn parse_dataset_json_str(json_str: &str) -> Result<DatasetFile> {
    // Syntax first, so the error can show where the text breaks
    let json_value: Value = serde_json::from_str(json_str).with_context(|| {
        let preview: String = json_str.chars().take(200).collect();
        format!("Invalid JSON syntax. First 200 chars: {}", preview)
    })?;

    let Some(root) = json_value.as_object() else {
        anyhow::bail!("Dataset must be a JSON object, found {}", type_name(&json_value));
    };

    if !DATASET_KEYS.iter().any(|key| root.contains_key(*key)) {
        anyhow::bail!(
            "Dataset must contain at least one of {:?}. Found keys: {:?}",
            DATASET_KEYS,
            root.keys().collect::<Vec<_>>()
        );
    }

    serde_path_to_error::deserialize(json_value).map_err(|e| {
        anyhow::anyhow!("Invalid dataset field at '{}': {}", e.path(), e.inner())
    })
}

/// Parse a bare array of visit rows, the in-memory form used by tests and hosts
pub fn parse_visit_rows_str(json_str: &str) -> Result<Vec<RawVisitRow>> {
    let de = &mut serde_json::Deserializer::from_str(json_str);
    serde_path_to_error::deserialize(de)
        .map_err(|e| anyhow::anyhow!("Invalid visit row at '{}': {}", e.path(), e.inner()))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
