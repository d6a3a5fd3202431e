//! Core domain models for home-care visit planning.
//!
//! This module defines the typed records used throughout the crate and the
//! immutable snapshot the filter engine evaluates against.

pub mod domain;
pub mod snapshot;

pub use domain::{
    Assignment, BaseStatus, Employee, OverlayFlags, Priority, RecordId, Recurrence, ServiceArea,
    StaffingType, TransportMode, Visit, VisitCategory,
};
pub use snapshot::ScheduleSnapshot;
