//! Domain models for home-care visit planning.
//!
//! This module provides the canonical record shapes the rest of the crate works on:
//! visits, employees, the assignment link between them, and service areas. Every
//! record here is already normalized; raw import rows live in
//! [`crate::parsing::json_parser`] and are turned into these types by
//! [`crate::preprocessing::NormalizePipeline`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Identifier of a visit, employee or assignment row.
///
/// Source data mixes integer ids (`"id": 12`) with string ids (`"id": "12"`).
/// The original JSON form is kept so rows can be written back unchanged, while
/// equality and hashing use the textual form: `Int(12) == Text("12")`.
///
/// # Examples
///
/// ```
/// use care_planner::core::domain::RecordId;
///
/// assert_eq!(RecordId::Int(12), RecordId::from("12"));
/// assert_eq!(RecordId::from("v-1").to_string(), "v-1");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    /// Textual form used for comparisons and lookups.
    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            RecordId::Int(i) => Cow::Owned(i.to_string()),
            RecordId::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RecordId::Int(a), RecordId::Int(b)) => a == b,
            _ => self.as_key() == other.as_key(),
        }
    }
}

impl Eq for RecordId {}

impl Hash for RecordId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_key().hash(state);
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::Text(s)
    }
}

impl From<i64> for RecordId {
    fn from(i: i64) -> Self {
        RecordId::Int(i)
    }
}

/// Base status of a visit. Every visit is exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseStatus {
    Mandatory,
    Optional,
}

/// Overlay flags that layer on top of the base status. Any combination is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OverlayFlags {
    pub extra: bool,
    pub cancelled: bool,
    pub absent: bool,
}

/// Visit priority level, always in `0..=10`. Zero means "no explicit priority".
///
/// # Examples
///
/// ```
/// use care_planner::core::domain::Priority;
///
/// assert_eq!(Priority::new(14).value(), 10);
/// assert_eq!(Priority::new(-3).value(), 0);
/// assert_eq!(Priority::from_f64(6.6).value(), 7);
/// assert!(!Priority::NONE.is_set());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Priority(u8);

impl Priority {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 10;
    pub const NONE: Priority = Priority(0);
    pub const HIGHEST: Priority = Priority(Self::MAX);

    /// Clamps `level` into the valid range.
    pub fn new(level: i64) -> Self {
        Priority(level.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    /// Rounds and clamps a floating value. Non-finite input yields [`Priority::NONE`].
    pub fn from_f64(level: f64) -> Self {
        if !level.is_finite() {
            return Self::NONE;
        }
        Priority(level.round().clamp(Self::MIN as f64, Self::MAX as f64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_set(self) -> bool {
        self.0 > 0
    }
}

/// Cadence class of a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Recurrence {
    Daily,
    Weekly,
    BiWeekly,
    Monthly,
    Other,
}

impl Recurrence {
    /// Parses a stored recurrence value.
    ///
    /// Blank strings mean "no recurrence" and return `None`; any other value the
    /// known vocabulary doesn't cover becomes [`Recurrence::Other`].
    ///
    /// # Examples
    ///
    /// ```
    /// use care_planner::core::domain::Recurrence;
    ///
    /// assert_eq!(Recurrence::parse("bi-weekly"), Some(Recurrence::BiWeekly));
    /// assert_eq!(Recurrence::parse("Biweekly"), Some(Recurrence::BiWeekly));
    /// assert_eq!(Recurrence::parse("quarterly"), Some(Recurrence::Other));
    /// assert_eq!(Recurrence::parse("  "), None);
    /// ```
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "" => None,
            "daily" => Some(Recurrence::Daily),
            "weekly" => Some(Recurrence::Weekly),
            "bi-weekly" | "biweekly" | "bi_weekly" => Some(Recurrence::BiWeekly),
            "monthly" => Some(Recurrence::Monthly),
            _ => Some(Recurrence::Other),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::BiWeekly => "bi-weekly",
            Recurrence::Monthly => "monthly",
            Recurrence::Other => "other",
        }
    }
}

/// Display grouping derived from the recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitCategory {
    Daily,
    Recurring,
}

impl VisitCategory {
    /// `Daily` for no recurrence, daily or other; `Recurring` for weekly, bi-weekly
    /// and monthly cadences.
    pub fn from_recurrence(recurrence: Option<Recurrence>) -> Self {
        match recurrence {
            Some(Recurrence::Weekly | Recurrence::BiWeekly | Recurrence::Monthly) => {
                VisitCategory::Recurring
            }
            None | Some(Recurrence::Daily | Recurrence::Other) => VisitCategory::Daily,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffingType {
    #[default]
    Single,
    Double,
}

impl FromStr for StaffingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(StaffingType::Single),
            "double" => Ok(StaffingType::Double),
            other => Err(format!("Unknown staffing type: {}", other)),
        }
    }
}

/// How an employee travels between visits.
///
/// Accepts the English names as well as the Swedish labels used by the
/// scheduling data (`Bil`, `Cykel`, `Promenad`, `Kollektivtrafik`).
///
/// # Examples
///
/// ```
/// use care_planner::core::domain::TransportMode;
///
/// assert_eq!("Cykel".parse::<TransportMode>(), Ok(TransportMode::Bike));
/// assert_eq!("public-transit".parse::<TransportMode>(), Ok(TransportMode::PublicTransit));
/// assert!("hovercraft".parse::<TransportMode>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportMode {
    Car,
    Bike,
    Walk,
    PublicTransit,
}

impl TransportMode {
    pub const ALL: [TransportMode; 4] = [
        TransportMode::Car,
        TransportMode::Bike,
        TransportMode::Walk,
        TransportMode::PublicTransit,
    ];
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "car" | "bil" => Ok(TransportMode::Car),
            "bike" | "bicycle" | "cykel" => Ok(TransportMode::Bike),
            "walk" | "walking" | "promenad" => Ok(TransportMode::Walk),
            "public-transit" | "public_transit" | "publictransit" | "kollektivtrafik" => {
                Ok(TransportMode::PublicTransit)
            }
            other => Err(format!("Unknown transport mode: {}", other)),
        }
    }
}

/// A geographic or organizational partition label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceArea {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ServiceArea {
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.map(str::to_string),
        }
    }
}

/// A normalized home-care visit.
///
/// # Fields
///
/// * `base_status` - Mandatory or optional, never both
/// * `overlays` - Extra/cancelled/absent flags
/// * `priority` - Level in `0..=10`
/// * `recurrence` - Cadence class, `None` when the visit does not recur
/// * `category` - Derived from `recurrence`
/// * `movable` - Whether the visit may be moved to another day; always `false` for daily visits
/// * `extra` - Row fields this crate does not interpret, kept for write-back
#[derive(Debug, Clone, PartialEq)]
pub struct Visit {
    pub id: RecordId,
    pub name: Option<String>,
    pub required_role: Option<String>,
    pub required_skills: Vec<String>,
    pub task_notes: Option<String>,
    pub base_status: BaseStatus,
    pub overlays: OverlayFlags,
    pub priority: Priority,
    pub recurrence: Option<Recurrence>,
    pub category: VisitCategory,
    pub staffing_type: StaffingType,
    pub pinned: bool,
    pub movable: bool,
    pub service_area_id: Option<String>,
    pub extra: Map<String, Value>,
}

impl Visit {
    /// Creates a visit with the record defaults: optional, no overlays, priority 0,
    /// no recurrence, single staffing, unpinned and movable.
    ///
    /// # Examples
    ///
    /// ```
    /// use care_planner::core::domain::{Visit, VisitCategory};
    ///
    /// let visit = Visit::new("v-1");
    /// assert!(visit.is_optional());
    /// assert!(!visit.is_mandatory());
    /// assert_eq!(visit.category, VisitCategory::Daily);
    /// assert!(visit.required_skills.is_empty());
    /// ```
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            required_role: None,
            required_skills: Vec::new(),
            task_notes: None,
            base_status: BaseStatus::Optional,
            overlays: OverlayFlags::default(),
            priority: Priority::NONE,
            recurrence: None,
            category: VisitCategory::Daily,
            staffing_type: StaffingType::Single,
            pinned: false,
            movable: true,
            service_area_id: None,
            extra: Map::new(),
        }
    }

    pub fn is_mandatory(&self) -> bool {
        self.base_status == BaseStatus::Mandatory
    }

    pub fn is_optional(&self) -> bool {
        self.base_status == BaseStatus::Optional
    }

    pub fn is_extra(&self) -> bool {
        self.overlays.extra
    }

    pub fn is_cancelled(&self) -> bool {
        self.overlays.cancelled
    }

    pub fn is_absent(&self) -> bool {
        self.overlays.absent
    }

    /// Recurrence used for filtering. A visit without a known cadence counts as daily.
    pub fn effective_recurrence(&self) -> Recurrence {
        match self.recurrence {
            None | Some(Recurrence::Other) => Recurrence::Daily,
            Some(known) => known,
        }
    }

    /// Serializes the visit back into a data-file row.
    pub fn to_row(&self) -> Value {
        // VisitRow only holds strings, numbers and maps, so serialization cannot fail.
        serde_json::to_value(VisitRow::from(self)).unwrap_or(Value::Null)
    }
}

/// Borrowed wire form of a [`Visit`] using the data-file field names.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VisitRow<'a> {
    id: &'a RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    required_role: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_notes: Option<&'a str>,
    is_mandatory: bool,
    is_optional: bool,
    is_extra: bool,
    is_cancelled: bool,
    is_absent: bool,
    priority: Priority,
    visit_recurrence: Option<&'static str>,
    visit_category: VisitCategory,
    staffing_type: StaffingType,
    pinned: bool,
    movable: bool,
    required_skills: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    service_area_id: Option<&'a str>,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

impl<'a> From<&'a Visit> for VisitRow<'a> {
    fn from(visit: &'a Visit) -> Self {
        Self {
            id: &visit.id,
            name: visit.name.as_deref(),
            required_role: visit.required_role.as_deref(),
            task_notes: visit.task_notes.as_deref(),
            is_mandatory: visit.is_mandatory(),
            is_optional: visit.is_optional(),
            is_extra: visit.overlays.extra,
            is_cancelled: visit.overlays.cancelled,
            is_absent: visit.overlays.absent,
            priority: visit.priority,
            visit_recurrence: visit.recurrence.map(Recurrence::as_str),
            visit_category: visit.category,
            staffing_type: visit.staffing_type,
            pinned: visit.pinned,
            movable: visit.movable,
            required_skills: &visit.required_skills,
            service_area_id: visit.service_area_id.as_deref(),
            extra: &visit.extra,
        }
    }
}

/// A care worker that visits can be assigned to.
#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    pub id: RecordId,
    pub name: Option<String>,
    pub role: Option<String>,
    /// `None` when the source mode is missing or not recognised.
    pub transport_mode: Option<TransportMode>,
    pub service_area_id: Option<String>,
    pub extra: Map<String, Value>,
}

impl Employee {
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

/// Links one visit to one employee. Double staffing is two assignments to the same visit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Assignment {
    pub employee_id: RecordId,
    pub visit_id: RecordId,
}

impl Assignment {
    pub fn new(employee_id: impl Into<RecordId>, visit_id: impl Into<RecordId>) -> Self {
        Self {
            employee_id: employee_id.into(),
            visit_id: visit_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_record_id_mixed_forms_hash_together() {
        let mut ids = HashSet::new();
        ids.insert(RecordId::Int(7));
        assert!(ids.contains(&RecordId::from("7")));
        assert!(!ids.contains(&RecordId::from("07")));
    }

    #[test]
    fn test_record_id_keeps_json_form() {
        assert_eq!(serde_json::to_value(RecordId::Int(3)).unwrap(), serde_json::json!(3));
        assert_eq!(
            serde_json::to_value(RecordId::from("3")).unwrap(),
            serde_json::json!("3")
        );
    }

    #[test]
    fn test_visit_category_from_recurrence() {
        assert_eq!(VisitCategory::from_recurrence(None), VisitCategory::Daily);
        assert_eq!(
            VisitCategory::from_recurrence(Some(Recurrence::Other)),
            VisitCategory::Daily
        );
        assert_eq!(
            VisitCategory::from_recurrence(Some(Recurrence::Monthly)),
            VisitCategory::Recurring
        );
    }

    #[test]
    fn test_visit_row_field_names() {
        let mut visit = Visit::new(RecordId::Int(1));
        visit.base_status = BaseStatus::Mandatory;
        visit.recurrence = Some(Recurrence::BiWeekly);
        visit.category = VisitCategory::Recurring;
        visit.required_skills = vec!["Sårvård".to_string()];
        visit
            .extra
            .insert("patient".to_string(), Value::String("Elsa Demba".to_string()));

        let row = visit.to_row();
        assert_eq!(row["id"], 1);
        assert_eq!(row["isMandatory"], true);
        assert_eq!(row["isOptional"], false);
        assert_eq!(row["visitRecurrence"], "bi-weekly");
        assert_eq!(row["visitCategory"], "recurring");
        assert_eq!(row["staffingType"], "single");
        assert_eq!(row["requiredSkills"][0], "Sårvård");
        assert_eq!(row["patient"], "Elsa Demba");
        assert!(row.get("serviceAreaId").is_none());
    }

    #[test]
    fn test_visit_row_null_recurrence() {
        let row = Visit::new("a").to_row();
        assert!(row["visitRecurrence"].is_null());
        assert_eq!(row["priority"], 0);
    }
}
