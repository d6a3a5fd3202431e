use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::Path;

use crate::config::{NormalizerConfig, PlannerConfig};
use crate::core::domain::{Assignment, Employee, ServiceArea, TransportMode, Visit};
use crate::core::snapshot::ScheduleSnapshot;
use crate::parsing::json_parser::{
    self, DatasetFile, RawAssignmentRow, RawEmployeeRow, RawVisitRow,
};
use crate::preprocessing::enricher::VisitEnricher;
use crate::preprocessing::fixtures::{round_robin_area, IndexedFixtureStrategy, StatusSynthesizer};
use crate::preprocessing::status::{resolve_status, StatusSource};
use crate::preprocessing::validator::{DatasetValidator, ValidationResult};

/// Counts of how each visit's status was obtained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub legacy_migrated: usize,
    pub canonical: usize,
    pub synthesized: usize,
    pub defaulted: usize,
    /// Assignment rows missing an event or resource reference.
    pub incomplete_assignments: usize,
}

impl NormalizeStats {
    fn record(&mut self, source: StatusSource) {
        match source {
            StatusSource::Legacy => self.legacy_migrated += 1,
            StatusSource::Canonical => self.canonical += 1,
            StatusSource::Synthesized => self.synthesized += 1,
            StatusSource::Defaulted => self.defaulted += 1,
        }
    }
}

/// Parts of a data file the normalizer does not rewrite, kept for write-back.
#[derive(Debug, Clone, Default)]
struct DatasetFrame {
    other: Map<String, Value>,
    events: Option<Map<String, Value>>,
    resources: Option<Map<String, Value>>,
    assignments: Option<Map<String, Value>>,
    employee_rows: Vec<RawEmployeeRow>,
    assignment_rows: Vec<RawAssignmentRow>,
}

/// Result of a normalization pass
#[derive(Debug, Clone)]
pub struct NormalizeResult {
    pub visits: Vec<Visit>,
    pub employees: Vec<Employee>,
    pub assignments: Vec<Assignment>,
    pub validation: ValidationResult,
    pub stats: NormalizeStats,
    frame: DatasetFrame,
}

impl NormalizeResult {
    /// The normalized data file: canonical visit rows, employee and assignment
    /// rows as read, and every other key preserved.
    pub fn to_document(&self) -> Value {
        let mut root = self.frame.other.clone();

        let mut section = |key: &str, siblings: &Option<Map<String, Value>>, rows: Vec<Value>| {
            if siblings.is_none() && rows.is_empty() {
                return;
            }
            let mut map = Map::new();
            map.insert("rows".to_string(), Value::Array(rows));
            if let Some(siblings) = siblings {
                map.extend(siblings.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            root.insert(key.to_string(), Value::Object(map));
        };

        section(
            "resources",
            &self.frame.resources,
            self.frame
                .employee_rows
                .iter()
                .map(|row| serde_json::to_value(row).unwrap_or(Value::Null))
                .collect(),
        );
        section(
            "events",
            &self.frame.events,
            self.visits.iter().map(Visit::to_row).collect(),
        );
        section(
            "assignments",
            &self.frame.assignments,
            self.frame
                .assignment_rows
                .iter()
                .map(|row| serde_json::to_value(row).unwrap_or(Value::Null))
                .collect(),
        );

        Value::Object(root)
    }

    /// Build the immutable snapshot the filter engine evaluates.
    pub fn into_snapshot(self, service_areas: Vec<ServiceArea>) -> ScheduleSnapshot {
        ScheduleSnapshot::new(self.visits, self.employees, self.assignments, service_areas)
    }
}

/// Options for a normalization pass
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub validate: bool,
    /// Round-robin the configured service areas onto every row.
    pub assign_service_areas: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            validate: true,
            assign_service_areas: false,
        }
    }
}

/// Drives status migration and enrichment over whole datasets
pub struct NormalizePipeline {
    normalizer: NormalizerConfig,
    service_areas: Vec<ServiceArea>,
    options: NormalizeOptions,
    enricher: VisitEnricher,
    synthesizer: Option<Box<dyn StatusSynthesizer>>,
}

impl NormalizePipeline {
    /// Create a pipeline from planner configuration with default options
    pub fn new(config: &PlannerConfig) -> Result<Self> {
        let options = NormalizeOptions {
            assign_service_areas: config.batch.assign_service_areas,
            ..NormalizeOptions::default()
        };
        Self::with_options(config, options)
    }

    /// Create a pipeline with explicit options
    pub fn with_options(config: &PlannerConfig, options: NormalizeOptions) -> Result<Self> {
        let enricher = VisitEnricher::new(&config.normalizer)
            .context("Failed to build visit enricher")?;

        let synthesizer: Option<Box<dyn StatusSynthesizer>> =
            if config.normalizer.synthesize_missing_status {
                Some(Box::new(IndexedFixtureStrategy))
            } else {
                None
            };

        Ok(Self {
            normalizer: config.normalizer.clone(),
            service_areas: config.service_areas.clone(),
            options,
            enricher,
            synthesizer,
        })
    }

    /// Replace the fixture strategy used for status-less rows
    pub fn with_synthesizer(mut self, synthesizer: Option<Box<dyn StatusSynthesizer>>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn service_areas(&self) -> &[ServiceArea] {
        &self.service_areas
    }

    /// Normalize one visit row. `index` is the row's position in its collection.
    pub fn normalize_visit(&self, row: RawVisitRow, index: usize) -> Visit {
        self.build_visit(row, index).0
    }

    /// Normalize an in-memory collection of visit rows
    pub fn normalize_visits(&self, rows: Vec<RawVisitRow>) -> Vec<Visit> {
        rows.into_iter()
            .enumerate()
            .map(|(index, row)| self.normalize_visit(row, index))
            .collect()
    }

    /// Normalize one employee row
    pub fn normalize_employee(&self, row: &RawEmployeeRow) -> Employee {
        let transport_mode = row.transport_mode.as_deref().and_then(|mode| {
            mode.parse::<TransportMode>()
                .map_err(|e| log::debug!("Employee {}: {}", row.id, e))
                .ok()
        });

        Employee {
            id: row.id.clone(),
            name: row.name.clone(),
            role: row.role.clone(),
            transport_mode,
            service_area_id: row.service_area_id.clone(),
            extra: row.extra.clone(),
        }
    }

    /// Normalize a parsed data file
    pub fn process(&self, dataset: DatasetFile) -> NormalizeResult {
        let DatasetFile {
            events,
            resources,
            assignments,
            other,
        } = dataset;

        let (mut visit_rows, events) = split_section(events);
        let (mut employee_rows, resources) = split_section(resources);
        let (assignment_rows, assignments) = split_section(assignments);

        if self.options.assign_service_areas {
            self.assign_areas(&mut visit_rows, &mut employee_rows);
        }

        let mut stats = NormalizeStats::default();
        let visits: Vec<Visit> = visit_rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| {
                let (visit, source) = self.build_visit(row, index);
                stats.record(source);
                visit
            })
            .collect();

        let employees: Vec<Employee> = employee_rows
            .iter()
            .map(|row| self.normalize_employee(row))
            .collect();

        let links: Vec<Assignment> = assignment_rows
            .iter()
            .filter_map(RawAssignmentRow::to_assignment)
            .collect();
        stats.incomplete_assignments = assignment_rows.len() - links.len();
        if stats.incomplete_assignments > 0 {
            log::warn!(
                "Ignoring {} assignment rows without an event or resource",
                stats.incomplete_assignments
            );
        }

        let validation = if self.options.validate {
            DatasetValidator::validate(&visits, &employees, &self.service_areas)
        } else {
            ValidationResult::new()
        };

        log::debug!(
            "Normalized {} visits ({} legacy, {} canonical, {} synthesized, {} defaulted), {} employees, {} assignments",
            visits.len(),
            stats.legacy_migrated,
            stats.canonical,
            stats.synthesized,
            stats.defaulted,
            employees.len(),
            links.len()
        );

        NormalizeResult {
            visits,
            employees,
            assignments: links,
            validation,
            stats,
            frame: DatasetFrame {
                other,
                events,
                resources,
                assignments,
                employee_rows,
                assignment_rows,
            },
        }
    }

    /// Normalize a data file given as a JSON string
    pub fn process_json_str(&self, json_str: &str) -> Result<NormalizeResult> {
        let dataset = json_parser::parse_dataset_json_str(json_str)
            .context("Failed to parse dataset JSON")?;
        Ok(self.process(dataset))
    }

    /// Normalize a data file on disk
    pub fn process_file(&self, path: &Path) -> Result<NormalizeResult> {
        let dataset = json_parser::parse_dataset_json(path)?;
        Ok(self.process(dataset))
    }

    fn build_visit(&self, mut row: RawVisitRow, index: usize) -> (Visit, StatusSource) {
        let status = resolve_status(
            &row,
            index,
            self.normalizer.legacy_priority(),
            self.synthesizer.as_deref(),
        );
        let attributes = self.enricher.enrich(&mut row);

        let visit = Visit {
            id: row.id,
            name: row.name,
            required_role: row.required_role,
            required_skills: attributes.required_skills,
            task_notes: row.task_notes,
            base_status: status.base,
            overlays: status.overlays,
            priority: status.priority,
            recurrence: attributes.recurrence,
            category: attributes.category,
            staffing_type: attributes.staffing_type,
            pinned: row.pinned.unwrap_or(false),
            movable: attributes.movable,
            service_area_id: row.service_area_id,
            extra: row.extra,
        };
        (visit, status.source)
    }

    fn assign_areas(&self, visits: &mut [RawVisitRow], employees: &mut [RawEmployeeRow]) {
        for (index, row) in employees.iter_mut().enumerate() {
            if let Some(area) = round_robin_area(&self.service_areas, index) {
                row.service_area_id = Some(area.id.clone());
                stamp_area(&mut row.extra, area);
            }
        }
        for (index, row) in visits.iter_mut().enumerate() {
            if let Some(area) = round_robin_area(&self.service_areas, index) {
                row.service_area_id = Some(area.id.clone());
                stamp_area(&mut row.extra, area);
            }
        }
    }
}

fn split_section<T>(
    section: Option<json_parser::RowSection<T>>,
) -> (Vec<T>, Option<Map<String, Value>>) {
    match section {
        Some(section) => (section.rows, Some(section.other)),
        None => (Vec::new(), None),
    }
}

fn stamp_area(extra: &mut Map<String, Value>, area: &ServiceArea) {
    extra.insert("serviceAreaName".to_string(), Value::String(area.name.clone()));
    match &area.color {
        Some(color) => extra.insert("serviceAreaColor".to_string(), Value::String(color.clone())),
        None => extra.remove("serviceAreaColor"),
    };
}

/// Normalize a data file with the given configuration
pub fn normalize_dataset(path: &Path, config: &PlannerConfig) -> Result<NormalizeResult> {
    NormalizePipeline::new(config)?.process_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{BaseStatus, Priority, RecordId, Recurrence};

    fn pipeline() -> NormalizePipeline {
        NormalizePipeline::new(&PlannerConfig::default()).unwrap()
    }

    const DATASET: &str = r#"{
        "success": true,
        "resources": { "rows": [
            { "id": 1, "name": "Anna", "transportMode": "Bil" },
            { "id": 2, "name": "Erik", "transportMode": "Segway" }
        ] },
        "events": { "rows": [
            { "id": 1, "name": "Insulin", "visitStatus": "priority",
              "taskNotes": "Insulin för Sven. Kräver: Medicin, Insulin." },
            { "id": 2, "name": "Städning", "visitStatus": "cancelled", "movable": true },
            { "id": 3, "name": "Sällskap" }
        ], "syncDataOnLoad": false },
        "assignments": { "rows": [
            { "id": 1, "event": 1, "resource": 2 },
            { "id": 2, "event": 3 }
        ] }
    }"#;

    #[test]
    fn test_process_dataset() {
        let result = pipeline().process_json_str(DATASET).unwrap();

        assert_eq!(result.visits.len(), 3);
        assert_eq!(result.employees.len(), 2);
        assert_eq!(result.assignments.len(), 1);
        assert_eq!(result.stats.legacy_migrated, 2);
        assert_eq!(result.stats.synthesized, 1);
        assert_eq!(result.stats.incomplete_assignments, 1);

        let insulin = &result.visits[0];
        assert_eq!(insulin.priority, Priority::new(7));
        assert_eq!(insulin.recurrence, Some(Recurrence::Daily));
        assert!(!insulin.movable);
        assert_eq!(insulin.required_skills, vec!["Medicin", "Insulin"]);

        let cleaning = &result.visits[1];
        assert!(cleaning.is_cancelled());
        assert_eq!(cleaning.base_status, BaseStatus::Optional);
        assert!(cleaning.movable);

        // Index 2: mandatory under the fixture ratio, cancelled (2 % 20 == 2)
        let company = &result.visits[2];
        assert!(company.is_mandatory());
        assert!(company.is_cancelled());
        assert_eq!(company.recurrence, None);
    }

    #[test]
    fn test_employee_transport_modes() {
        let result = pipeline().process_json_str(DATASET).unwrap();
        assert_eq!(result.employees[0].transport_mode, Some(TransportMode::Car));
        assert_eq!(result.employees[1].transport_mode, None);
        assert_eq!(result.validation.stats.employees_without_transport, 1);
    }

    #[test]
    fn test_document_round_trip_is_stable() {
        let first = pipeline().process_json_str(DATASET).unwrap().to_document();
        let text = serde_json::to_string_pretty(&first).unwrap();
        let second = pipeline().process_json_str(&text).unwrap().to_document();
        assert_eq!(first, second);
    }

    #[test]
    fn test_document_keeps_unknown_keys() {
        let doc = pipeline().process_json_str(DATASET).unwrap().to_document();
        assert_eq!(doc["success"], true);
        assert_eq!(doc["events"]["syncDataOnLoad"], false);
        assert_eq!(doc["resources"]["rows"][0]["transportMode"], "Bil");
        assert_eq!(doc["assignments"]["rows"][0]["resource"], 2);

        let visit = &doc["events"]["rows"][0];
        assert!(visit.get("visitStatus").is_none());
        assert_eq!(visit["isOptional"], true);
        assert_eq!(visit["priority"], 7);
        assert_eq!(visit["visitRecurrence"], "daily");
    }

    #[test]
    fn test_missing_sections_not_invented() {
        let doc = pipeline()
            .process_json_str(r#"{ "events": { "rows": [ { "id": 1 } ] } }"#)
            .unwrap()
            .to_document();
        assert!(doc.get("resources").is_none());
        assert!(doc.get("assignments").is_none());
    }

    #[test]
    fn test_without_synthesis() {
        let mut config = PlannerConfig::default();
        config.normalizer.synthesize_missing_status = false;
        let result = NormalizePipeline::new(&config)
            .unwrap()
            .process_json_str(DATASET)
            .unwrap();
        let company = &result.visits[2];
        assert!(company.is_optional());
        assert!(!company.is_cancelled());
        assert_eq!(result.stats.defaulted, 1);
    }

    #[test]
    fn test_assign_service_areas() {
        let options = NormalizeOptions {
            validate: true,
            assign_service_areas: true,
        };
        let result = NormalizePipeline::with_options(&PlannerConfig::default(), options)
            .unwrap()
            .process_json_str(DATASET)
            .unwrap();

        let areas: Vec<_> = result
            .visits
            .iter()
            .map(|v| v.service_area_id.clone().unwrap())
            .collect();
        assert_eq!(areas, vec!["area-1", "area-2", "area-3"]);
        assert_eq!(result.employees[1].service_area_id.as_deref(), Some("area-2"));
        assert_eq!(result.visits[0].extra["serviceAreaName"], "Västra");
        assert_eq!(result.validation.stats.missing_service_area, 0);
    }

    #[test]
    fn test_normalize_in_memory_rows() {
        let rows = json_parser::parse_visit_rows_str(
            r#"[ { "id": 1, "isMandatory": true }, { "id": 2, "visitStatus": "optional" } ]"#,
        )
        .unwrap();
        let visits = pipeline().normalize_visits(rows);
        assert!(visits[0].is_mandatory());
        assert!(visits[1].is_optional());
        assert_eq!(visits[1].id, RecordId::Int(2));
    }

    #[test]
    fn test_into_snapshot() {
        let result = pipeline().process_json_str(DATASET).unwrap();
        let snapshot = result.into_snapshot(crate::config::default_service_areas());
        assert_eq!(snapshot.assignment_count(&RecordId::Int(1)), 1);
        assert!(snapshot.is_unplanned(&RecordId::Int(3)));
    }
}
