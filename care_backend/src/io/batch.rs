//! In-place normalization of a set of data files.
//!
//! Every file is handled independently: a missing file is skipped, a file that
//! fails to read, parse or write is reported and the batch moves on. The batch
//! itself only fails when none of its files could be read.

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::PlannerConfig;
use crate::io::checksum::calculate_checksum;
use crate::preprocessing::pipeline::{NormalizePipeline, NormalizeResult};

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("No file in the batch could be read ({skipped} skipped, {failed} failed)")]
    NothingProcessed { skipped: usize, failed: usize },
}

/// How one file ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Normalized content differed and was written.
    Updated,
    /// Normalized content was byte-identical to the file.
    Unchanged,
    /// The file does not exist.
    Skipped,
    Failed(String),
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOutcome::Updated => write!(f, "updated"),
            FileOutcome::Unchanged => write!(f, "unchanged"),
            FileOutcome::Skipped => write!(f, "skipped"),
            FileOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
    /// Whether the file content was read, even if later steps failed.
    pub read: bool,
    pub visits: usize,
    pub employees: usize,
}

impl FileReport {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            outcome: FileOutcome::Skipped,
            read: false,
            visits: 0,
            employees: 0,
        }
    }
}

/// Outcomes of a whole batch, in input order
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn count(&self, outcome: &FileOutcome) -> usize {
        self.files.iter().filter(|f| &f.outcome == outcome).count()
    }

    pub fn failed(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Failed(_)))
            .count()
    }
}

/// Rewrites data files with canonical visit attributes
pub struct BatchNormalizer {
    pipeline: NormalizePipeline,
    dry_run: bool,
}

impl BatchNormalizer {
    pub fn new(config: &PlannerConfig) -> Result<Self> {
        Ok(Self::with_pipeline(NormalizePipeline::new(config)?))
    }

    pub fn with_pipeline(pipeline: NormalizePipeline) -> Self {
        Self {
            pipeline,
            dry_run: false,
        }
    }

    /// Report outcomes without writing anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Normalize every file in `paths`.
    pub fn run<P: AsRef<Path>>(&self, paths: &[P]) -> Result<BatchReport, BatchError> {
        let report = BatchReport {
            files: paths.iter().map(|p| self.normalize_file(p.as_ref())).collect(),
        };

        log::info!(
            "Batch done: {} updated, {} unchanged, {} skipped, {} failed",
            report.count(&FileOutcome::Updated),
            report.count(&FileOutcome::Unchanged),
            report.count(&FileOutcome::Skipped),
            report.failed()
        );

        if !report.files.iter().any(|f| f.read) {
            return Err(BatchError::NothingProcessed {
                skipped: report.count(&FileOutcome::Skipped),
                failed: report.failed(),
            });
        }
        Ok(report)
    }

    /// Normalize one file in place. Never fails; problems end up in the outcome.
    pub fn normalize_file(&self, path: &Path) -> FileReport {
        let mut report = FileReport::new(path);

        if !path.exists() {
            log::warn!("Skipping {}: file not found", path.display());
            return report;
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                report.outcome = FileOutcome::Failed(e.to_string());
                return report;
            }
        };
        report.read = true;

        match self.rewrite(path, &content) {
            Ok((outcome, result)) => {
                report.visits = result.visits.len();
                report.employees = result.employees.len();
                match outcome {
                    FileOutcome::Unchanged => {
                        log::info!("{} already normalized", path.display())
                    }
                    _ => log::info!(
                        "Updated {} visits and {} employees in {}",
                        report.visits,
                        report.employees,
                        path.display()
                    ),
                }
                report.outcome = outcome;
            }
            Err(e) => {
                log::warn!("Failed to process {}: {:#}", path.display(), e);
                report.outcome = FileOutcome::Failed(format!("{:#}", e));
            }
        }

        report
    }

    fn rewrite(&self, path: &Path, content: &str) -> Result<(FileOutcome, NormalizeResult)> {
        let result = self.pipeline.process_json_str(content)?;
        let output = serde_json::to_string_pretty(&result.to_document())
            .context("Failed to serialize normalized dataset")?;

        if calculate_checksum(&output) == calculate_checksum(content) {
            return Ok((FileOutcome::Unchanged, result));
        }

        if !self.dry_run {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        Ok((FileOutcome::Updated, result))
    }
}
