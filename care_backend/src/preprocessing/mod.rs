//! Visit attribute normalization.
//!
//! Turns raw data-file rows into canonical [`Visit`](crate::core::domain::Visit)
//! records: legacy status migration, fixture backfill for status-less rows,
//! skill extraction, recurrence inference and movability.

pub mod enricher;
pub mod fixtures;
pub mod pipeline;
pub mod status;
pub mod validator;

pub use enricher::{VisitAttributes, VisitEnricher};
pub use fixtures::{round_robin_area, IndexedFixtureStrategy, StatusSynthesizer, SyntheticStatus};
pub use pipeline::{
    normalize_dataset, NormalizeOptions, NormalizePipeline, NormalizeResult, NormalizeStats,
};
pub use status::{resolve_status, LegacyStatus, ResolvedStatus, StatusSource};
pub use validator::{DatasetValidator, ValidationResult, ValidationStats};
