//! Parsers for scheduler data files.
//!
//! Data files follow the scheduler store layout: an object with `events`,
//! `resources` and `assignments` sections, each holding a `rows` array.
//! Rows are parsed into raw, loosely-typed structures; turning them into
//! canonical records is the job of [`crate::preprocessing`].
//!
//! - [`json_parser`]: Parse data files into [`json_parser::DatasetFile`]
//! - [`lenient`]: Field deserializers that tolerate legacy value shapes
//!
//! # Example
//!
//! ```no_run
//! use care_planner::parsing::json_parser::parse_dataset_json;
//! use std::path::Path;
//!
//! let dataset = parse_dataset_json(Path::new("homecare.json"))
//!     .expect("Failed to parse dataset");
//! println!("{} visit rows", dataset.visit_rows().len());
//! ```

pub mod json_parser;
pub mod lenient;


pub use json_parser::{
    DatasetFile, RawAssignmentRow, RawEmployeeRow, RawVisitRow, RowSection,
};
pub use lenient::RawPriority;
