//! Filtering and derived views over loaded snapshots.
//!
//! # Modules
//!
//! - [`filter_config`]: The filter configuration value and its toggle-id form
//! - [`filtering`]: Visit and employee visibility
//! - [`catalog`]: Skill catalog and unplanned visits by role
//! - [`cleaning`]: Assignment de-duplication
//!
//! # Example
//!
//! ```
//! use care_planner::core::{ScheduleSnapshot, Visit};
//! use care_planner::transformations::{filter_snapshot, FilterConfig};
//!
//! let snapshot = ScheduleSnapshot::new(vec![Visit::new("v1")], vec![], vec![], vec![]);
//! let outcome = filter_snapshot(&snapshot, &FilterConfig::show_all());
//! assert_eq!(outcome.visible_visit_count(), 1);
//! ```

pub mod catalog;
pub mod cleaning;
pub mod filter_config;
pub mod filtering;

pub use catalog::{collect_skills, unplanned_by_role};
pub use cleaning::{clean_assignments, CleanedAssignments};
pub use filter_config::{FilterConfig, PriorityRange, ServiceAreaSelection, StaffingFilter, StatusFilter};
pub use filtering::{filter_snapshot, visible_visits, FilterDimension, FilterOutcome, VisitFilter};
