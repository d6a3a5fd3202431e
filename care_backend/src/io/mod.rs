//! Loading datasets and rewriting data files.
//!
//! # Example
//!
//! ```no_run
//! use care_planner::config::PlannerConfig;
//! use care_planner::io::loaders::DatasetLoader;
//! use std::path::Path;
//!
//! let result = DatasetLoader::load_from_file(Path::new("homecare.json"), &PlannerConfig::default())
//!     .expect("Failed to load");
//! println!("Loaded {} visits", result.snapshot.visits().len());
//! ```

pub mod batch;
pub mod checksum;
pub mod loaders;


pub use batch::{BatchError, BatchNormalizer, BatchReport, FileOutcome, FileReport};
pub use checksum::calculate_checksum;
pub use loaders::{DatasetLoadResult, DatasetLoader, DatasetSourceType};
