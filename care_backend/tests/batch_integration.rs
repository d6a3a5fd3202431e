//! Integration tests for in-place batch normalization.
//!
//! These tests ensure that:
//! 1. Legacy files are rewritten with canonical visit attributes
//! 2. A second run leaves already-normalized files untouched
//! 3. Missing and broken files are reported without stopping the batch
//! 4. Unknown keys survive the rewrite

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

use care_planner::config::PlannerConfig;
use care_planner::io::batch::{BatchError, BatchNormalizer, FileOutcome};
use care_planner::io::loaders::DatasetLoader;
use care_planner::preprocessing::pipeline::{NormalizeOptions, NormalizePipeline};
use care_planner::transformations::{filter_snapshot, FilterConfig, ServiceAreaSelection};

// ==================== Helper Functions ====================

const LEGACY_FILE: &str = r#"{
  "success": true,
  "project": { "calendar": "general" },
  "resources": {
    "rows": [
      { "id": 1, "name": "Anna Svensson", "role": "Undersköterska", "transportMode": "Bil" },
      { "id": 2, "name": "Erik Johansson", "role": "Sjuksköterska", "transportMode": "Cykel" }
    ]
  },
  "events": {
    "rows": [
      {
        "id": 1,
        "name": "Morgonomsorg",
        "visitStatus": "mandatory",
        "taskNotes": "Morgonomsorg för Maj-Britt. Kräver: Personlig omvårdnad, Dusch.",
        "startDate": "2025-01-13T08:00:00",
        "duration": 45
      },
      { "id": 2, "name": "Städning", "visitStatus": "cancelled", "priority": "Låg" },
      { "id": 3, "name": "Provtagning", "mandatory": true, "priority": "Akut" }
    ]
  },
  "assignments": {
    "rows": [
      { "id": 1, "event": 1, "resource": 1 },
      { "id": 2, "event": 3, "resource": 2 }
    ]
  }
}"#;

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn normalizer() -> BatchNormalizer {
    BatchNormalizer::new(&PlannerConfig::default()).unwrap()
}

// ==================== Tests ====================

#[test]
fn test_legacy_file_is_rewritten() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "homecare.json", LEGACY_FILE);

    let report = normalizer().run(&[&path]).unwrap();
    assert_eq!(report.files[0].outcome, FileOutcome::Updated);
    assert_eq!(report.files[0].visits, 3);
    assert_eq!(report.files[0].employees, 2);

    let doc = read_json(&path);
    let rows = doc["events"]["rows"].as_array().unwrap();

    let care = &rows[0];
    assert_eq!(care["isMandatory"], true);
    assert_eq!(care["isOptional"], false);
    assert_eq!(care["visitRecurrence"], "daily");
    assert_eq!(care["visitCategory"], "daily");
    assert_eq!(care["movable"], false);
    assert_eq!(care["requiredSkills"][0], "Personlig omvårdnad");
    assert_eq!(care["startDate"], "2025-01-13T08:00:00");
    assert!(care.get("visitStatus").is_none());

    let cleaning = &rows[1];
    assert_eq!(cleaning["isOptional"], true);
    assert_eq!(cleaning["isCancelled"], true);
    assert_eq!(cleaning["priority"], 0);
    assert_eq!(cleaning["visitCategory"], "recurring");

    let sample = &rows[2];
    assert_eq!(sample["isMandatory"], true);
    assert_eq!(sample["priority"], 7);
    assert_eq!(sample["visitRecurrence"], "monthly");
    assert!(sample.get("mandatory").is_none());

    assert_eq!(doc["success"], true);
    assert_eq!(doc["project"]["calendar"], "general");
    assert_eq!(doc["resources"]["rows"][1]["transportMode"], "Cykel");
    assert_eq!(doc["assignments"]["rows"][1]["event"], 3);
}

#[test]
fn test_second_run_is_unchanged() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "homecare.json", LEGACY_FILE);

    normalizer().run(&[&path]).unwrap();
    let first = fs::read_to_string(&path).unwrap();

    let report = normalizer().run(&[&path]).unwrap();
    assert_eq!(report.files[0].outcome, FileOutcome::Unchanged);
    assert_eq!(fs::read_to_string(&path).unwrap(), first);
}

#[test]
fn test_batch_continues_past_bad_files() {
    let dir = TempDir::new().unwrap();
    let good = write_file(dir.path(), "homecare.json", LEGACY_FILE);
    let broken = write_file(dir.path(), "broken.json", "{ \"events\": ");
    let wrong_shape = write_file(dir.path(), "list.json", "[1, 2, 3]");
    let missing = dir.path().join("homecare-complete.json");

    let report = normalizer()
        .run(&[&missing, &broken, &wrong_shape, &good])
        .unwrap();

    assert_eq!(report.files[0].outcome, FileOutcome::Skipped);
    assert!(matches!(report.files[1].outcome, FileOutcome::Failed(_)));
    assert!(matches!(report.files[2].outcome, FileOutcome::Failed(_)));
    assert_eq!(report.files[3].outcome, FileOutcome::Updated);
    assert_eq!(report.failed(), 2);

    // Broken files are left as they were
    assert_eq!(fs::read_to_string(&broken).unwrap(), "{ \"events\": ");
}

#[test]
fn test_unreadable_batch_fails() {
    let dir = TempDir::new().unwrap();
    let paths = [dir.path().join("a.json"), dir.path().join("b.json")];

    let err = normalizer().run(&paths).unwrap_err();
    assert!(matches!(err, BatchError::NothingProcessed { skipped: 2, failed: 0 }));
}

#[test]
fn test_failed_parse_still_counts_as_read() {
    let dir = TempDir::new().unwrap();
    let broken = write_file(dir.path(), "broken.json", "not json");

    let report = normalizer().run(&[&broken]).unwrap();
    assert!(report.files[0].read);
    assert!(matches!(report.files[0].outcome, FileOutcome::Failed(_)));
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "homecare.json", LEGACY_FILE);

    let report = normalizer().dry_run(true).run(&[&path]).unwrap();
    assert_eq!(report.files[0].outcome, FileOutcome::Updated);
    assert_eq!(fs::read_to_string(&path).unwrap(), LEGACY_FILE);
}

#[test]
fn test_service_area_assignment_then_filter() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "homecare.json", LEGACY_FILE);
    let config = PlannerConfig::default();

    let options = NormalizeOptions {
        assign_service_areas: true,
        ..NormalizeOptions::default()
    };
    let pipeline = NormalizePipeline::with_options(&config, options).unwrap();
    BatchNormalizer::with_pipeline(pipeline).run(&[&path]).unwrap();

    let doc = read_json(&path);
    assert_eq!(doc["events"]["rows"][2]["serviceAreaId"], "area-3");
    assert_eq!(doc["events"]["rows"][2]["serviceAreaName"], "Södra");
    assert_eq!(doc["resources"]["rows"][1]["serviceAreaColor"], "#10b981");

    let loaded = DatasetLoader::load_from_file(&path, &config).unwrap();
    let filter = FilterConfig::show_all().with_service_areas(ServiceAreaSelection::only(["area-1"]));
    let outcome = filter_snapshot(&loaded.snapshot, &filter);
    assert_eq!(outcome.visible_visit_count(), 1);
    assert_eq!(outcome.visible_employees.len(), 1);
}
