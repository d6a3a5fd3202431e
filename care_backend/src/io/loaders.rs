use anyhow::{Context, Result};
use std::path::Path;

use crate::config::PlannerConfig;
use crate::core::snapshot::ScheduleSnapshot;
use crate::parsing::json_parser::{self, DatasetFile, RawVisitRow};
use crate::preprocessing::pipeline::{NormalizePipeline, NormalizeStats};
use crate::preprocessing::validator::ValidationResult;

/// Shape of the loaded JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetSourceType {
    /// A scheduler data file with `events`/`resources`/`assignments` sections.
    Dataset,
    /// A bare array of visit rows.
    VisitRows,
}

/// Result of loading and normalizing a dataset
#[derive(Debug)]
pub struct DatasetLoadResult {
    pub snapshot: ScheduleSnapshot,
    pub validation: ValidationResult,
    pub stats: NormalizeStats,
    pub source_type: DatasetSourceType,
}

/// Loads data files into normalized, filter-ready snapshots
pub struct DatasetLoader;

impl DatasetLoader {
    /// Load a JSON file, accepting either a data file or a bare visit-row array
    pub fn load_from_file(path: &Path, config: &PlannerConfig) -> Result<DatasetLoadResult> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .context("File has no extension")?;
        if !extension.eq_ignore_ascii_case("json") {
            anyhow::bail!("Unsupported file format: {}", extension);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read JSON file: {}", path.display()))?;

        Self::load_from_json_str(&content, config)
            .with_context(|| format!("Failed to load dataset: {}", path.display()))
    }

    /// Load from a JSON string
    pub fn load_from_json_str(json_str: &str, config: &PlannerConfig) -> Result<DatasetLoadResult> {
        if json_str.trim_start().starts_with('[') {
            let rows = json_parser::parse_visit_rows_str(json_str)
                .context("Failed to parse visit rows")?;
            return Self::load_visit_rows(rows, config);
        }

        let dataset =
            json_parser::parse_dataset_json_str(json_str).context("Failed to parse JSON string")?;
        Self::load_dataset(dataset, config, DatasetSourceType::Dataset)
    }

    /// Normalize an in-memory collection of visit rows
    pub fn load_visit_rows(
        rows: Vec<RawVisitRow>,
        config: &PlannerConfig,
    ) -> Result<DatasetLoadResult> {
        let dataset = DatasetFile::from_rows(rows, Vec::new(), Vec::new());
        Self::load_dataset(dataset, config, DatasetSourceType::VisitRows)
    }

    fn load_dataset(
        dataset: DatasetFile,
        config: &PlannerConfig,
        source_type: DatasetSourceType,
    ) -> Result<DatasetLoadResult> {
        let pipeline = NormalizePipeline::new(config)?;
        let result = pipeline.process(dataset);

        for warning in &result.validation.warnings {
            log::warn!("{}", warning);
        }
        for error in &result.validation.errors {
            log::warn!("Validation error: {}", error);
        }

        let validation = result.validation.clone();
        let stats = result.stats.clone();
        let snapshot = result.into_snapshot(config.service_areas.clone());

        log::info!(
            "Loaded {} visits, {} employees, {} assignments",
            snapshot.visits().len(),
            snapshot.employees().len(),
            snapshot.assignments().len()
        );

        Ok(DatasetLoadResult {
            snapshot,
            validation,
            stats,
            source_type,
        })
    }
}
