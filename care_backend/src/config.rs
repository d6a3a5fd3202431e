//! Planner configuration file support.
//!
//! Settings are read from `planner.toml`. Every section is optional and falls
//! back to the values the bundled data files were prepared with.
//!
//! ```toml
//! [normalizer]
//! skill_markers = ["Kräver", "Requires"]
//! legacy_priority_default = 7
//!
//! [normalizer.recurrence_keywords]
//! weekly = ["Städning", "Inköp"]
//!
//! [[service_areas]]
//! id = "area-1"
//! name = "Västra"
//! color = "#3b82f6"
//!
//! [batch]
//! data_dir = "public/data"
//! files = ["homecare.json"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::domain::{Priority, ServiceArea, StaffingType};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "PLANNER_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level planner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub normalizer: NormalizerConfig,
    #[serde(default = "default_service_areas")]
    pub service_areas: Vec<ServiceArea>,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Settings for the visit attribute normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Marker words that introduce a skill list in task notes (`Kräver: A, B.`).
    #[serde(default = "default_skill_markers")]
    pub skill_markers: Vec<String>,
    /// Priority given to rows whose legacy status was `priority`.
    #[serde(default = "default_legacy_priority")]
    pub legacy_priority_default: u8,
    /// Backfill status flags for rows that carry no status data at all.
    #[serde(default = "default_true")]
    pub synthesize_missing_status: bool,
    /// Infer the recurrence class from the visit name when none is stored.
    #[serde(default = "default_true")]
    pub infer_recurrence: bool,
    #[serde(default)]
    pub default_staffing: StaffingType,
    #[serde(default)]
    pub recurrence_keywords: RecurrenceKeywords,
}

/// Name keywords per recurrence class, matched case-insensitively in this
/// order: daily, weekly, bi-weekly, monthly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceKeywords {
    #[serde(default = "default_daily_keywords")]
    pub daily: Vec<String>,
    #[serde(default = "default_weekly_keywords")]
    pub weekly: Vec<String>,
    #[serde(default = "default_bi_weekly_keywords")]
    pub bi_weekly: Vec<String>,
    #[serde(default = "default_monthly_keywords")]
    pub monthly: Vec<String>,
}

/// Settings for the batch normalizer binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_batch_files")]
    pub files: Vec<String>,
    /// Round-robin service areas onto rows (fixture data only).
    #[serde(default)]
    pub assign_service_areas: bool,
}

fn default_true() -> bool {
    true
}

fn default_legacy_priority() -> u8 {
    7
}

fn default_skill_markers() -> Vec<String> {
    strings(&["Kräver", "Requires"])
}

fn default_daily_keywords() -> Vec<String> {
    strings(&[
        "Morgonomsorg",
        "Kvällsomvårdnad",
        "Insulin",
        "Medicin morgon",
        "Medicin kväll",
        "Morning care",
        "Evening care",
    ])
}

fn default_weekly_keywords() -> Vec<String> {
    strings(&["Städning", "Rengöring", "Inköp", "Cleaning", "Shopping"])
}

fn default_bi_weekly_keywords() -> Vec<String> {
    strings(&["Promenad", "Träning", "Walk", "Exercise"])
}

fn default_monthly_keywords() -> Vec<String> {
    strings(&["Provtagning", "Sårbyte", "Blood test", "Wound dressing"])
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("public/data")
}

fn default_batch_files() -> Vec<String> {
    strings(&[
        "data.json",
        "homecare-complete.json",
        "homecare-realistic.json",
        "homecare-revision2.json",
        "homecare-revision3.json",
        "homecare.json",
        "visits_data.json",
        "visits-generated.json",
    ])
}

/// The three areas the bundled fixture data is partitioned into.
pub fn default_service_areas() -> Vec<ServiceArea> {
    vec![
        ServiceArea::new("area-1", "Västra", Some("#3b82f6")),
        ServiceArea::new("area-2", "Östra", Some("#10b981")),
        ServiceArea::new("area-3", "Södra", Some("#f59e0b")),
    ]
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            skill_markers: default_skill_markers(),
            legacy_priority_default: default_legacy_priority(),
            synthesize_missing_status: true,
            infer_recurrence: true,
            default_staffing: StaffingType::Single,
            recurrence_keywords: RecurrenceKeywords::default(),
        }
    }
}

impl NormalizerConfig {
    pub fn legacy_priority(&self) -> Priority {
        Priority::new(self.legacy_priority_default as i64)
    }
}

impl Default for RecurrenceKeywords {
    fn default() -> Self {
        Self {
            daily: default_daily_keywords(),
            weekly: default_weekly_keywords(),
            bi_weekly: default_bi_weekly_keywords(),
            monthly: default_monthly_keywords(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            files: default_batch_files(),
            assign_service_areas: false,
        }
    }
}

impl BatchConfig {
    /// Batch file names resolved against `data_dir`.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| self.data_dir.join(f)).collect()
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            normalizer: NormalizerConfig::default(),
            service_areas: default_service_areas(),
            batch: BatchConfig::default(),
        }
    }
}

impl PlannerConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: PlannerConfig =
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: PlannerConfig =
            toml::from_str(content).map_err(|source| ConfigError::Parse {
                path: PathBuf::from("<string>"),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location.
    ///
    /// Searches, in order:
    /// 1. The file named by `$PLANNER_CONFIG`
    /// 2. `planner.toml` in the current directory
    /// 3. `care_backend/planner.toml`
    ///
    /// Falls back to [`PlannerConfig::default`] when none exists. A file that
    /// exists but cannot be parsed is an error.
    pub fn from_default_location() -> Result<Self, ConfigError> {
        if let Ok(explicit) = std::env::var(CONFIG_ENV_VAR) {
            return Self::from_file(explicit);
        }

        let search_paths = [
            PathBuf::from("planner.toml"),
            PathBuf::from("care_backend/planner.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                log::info!("Loading planner config from {}", path.display());
                return Self::from_file(&path);
            }
        }

        log::debug!("No planner.toml found, using defaults");
        Ok(Self::default())
    }

    /// Check the values serde cannot constrain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let markers = &self.normalizer.skill_markers;
        if markers.is_empty() {
            return Err(ConfigError::Invalid(
                "normalizer.skill_markers must not be empty".to_string(),
            ));
        }
        if markers.iter().any(|m| m.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "normalizer.skill_markers must not contain blank entries".to_string(),
            ));
        }

        if self.normalizer.legacy_priority_default > Priority::MAX {
            return Err(ConfigError::Invalid(format!(
                "normalizer.legacy_priority_default must be at most {}, got {}",
                Priority::MAX,
                self.normalizer.legacy_priority_default
            )));
        }

        let mut seen = HashSet::new();
        for area in &self.service_areas {
            if area.id.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "service area ids must not be blank".to_string(),
                ));
            }
            if !seen.insert(area.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate service area id: {}",
                    area.id
                )));
            }
        }

        Ok(())
    }
}
