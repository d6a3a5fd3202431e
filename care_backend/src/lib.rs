//! Care planner backend: visit attribute normalization and visit filtering
//! for home-care scheduling data.
//!
//! Data files are parsed into raw rows ([`parsing`]), normalized into canonical
//! visits ([`preprocessing`]), collected into an immutable
//! [`ScheduleSnapshot`](core::ScheduleSnapshot) ([`io`]) and filtered by a
//! [`FilterConfig`](transformations::FilterConfig) ([`transformations`]).

pub mod config;
pub mod core;
pub mod io;
pub mod parsing;
pub mod preprocessing;
pub mod transformations;
