//! Filter configuration as an immutable value.
//!
//! A [`FilterConfig`] is built once per UI state change and handed to the
//! evaluator by reference. Construction never fails: out-of-range priorities are
//! clamped, inverted ranges are swapped and unknown toggle ids are ignored.

use std::collections::BTreeSet;

use crate::core::domain::{Priority, Recurrence, TransportMode};

/// Base-status and overlay toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusFilter {
    Optional,
    Mandatory,
    Extra,
    Cancelled,
    Absent,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 5] = [
        StatusFilter::Optional,
        StatusFilter::Mandatory,
        StatusFilter::Extra,
        StatusFilter::Cancelled,
        StatusFilter::Absent,
    ];
}

/// Staffing and pinned toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StaffingFilter {
    Single,
    Double,
    Pinned,
}

impl StaffingFilter {
    pub const ALL: [StaffingFilter; 3] = [
        StaffingFilter::Single,
        StaffingFilter::Double,
        StaffingFilter::Pinned,
    ];
}

/// Recurrence classes a filter can select. `Other` is folded into daily.
pub const RECURRENCE_CLASSES: [Recurrence; 4] = [
    Recurrence::Daily,
    Recurrence::Weekly,
    Recurrence::BiWeekly,
    Recurrence::Monthly,
];

/// Inclusive priority bounds, always ordered and within `[0, 10]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityRange {
    min: Priority,
    max: Priority,
}

impl PriorityRange {
    pub const FULL: PriorityRange = PriorityRange {
        min: Priority::NONE,
        max: Priority::HIGHEST,
    };

    /// Bounds are clamped into `[0, 10]` and swapped when given in reverse.
    pub fn new(a: i64, b: i64) -> Self {
        let (a, b) = (Priority::new(a), Priority::new(b));
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn min(&self) -> Priority {
        self.min
    }

    pub fn max(&self) -> Priority {
        self.max
    }

    pub fn contains(&self, priority: Priority) -> bool {
        self.min <= priority && priority <= self.max
    }

    pub fn is_full(&self) -> bool {
        *self == Self::FULL
    }
}

impl Default for PriorityRange {
    fn default() -> Self {
        Self::FULL
    }
}

/// Which service areas are shown.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ServiceAreaSelection {
    /// No area filtering.
    #[default]
    All,
    /// Only the listed area ids. Listing every known area is the same as `All`;
    /// an empty list hides everything.
    Only(BTreeSet<String>),
}

impl ServiceAreaSelection {
    pub fn only<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ServiceAreaSelection::Only(ids.into_iter().map(Into::into).collect())
    }
}

/// The full set of filter options for one evaluation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    pub status: BTreeSet<StatusFilter>,
    pub priority: PriorityRange,
    pub recurrence: BTreeSet<Recurrence>,
    pub staffing: BTreeSet<StaffingFilter>,
    pub transport: BTreeSet<TransportMode>,
    pub skills: BTreeSet<String>,
    pub service_areas: ServiceAreaSelection,
}

impl FilterConfig {
    /// Every toggle on, full priority range, no skill or area selection.
    pub fn show_all() -> Self {
        Self {
            status: StatusFilter::ALL.into_iter().collect(),
            priority: PriorityRange::FULL,
            recurrence: RECURRENCE_CLASSES.into_iter().collect(),
            staffing: StaffingFilter::ALL.into_iter().collect(),
            transport: TransportMode::ALL.into_iter().collect(),
            skills: BTreeSet::new(),
            service_areas: ServiceAreaSelection::All,
        }
    }

    /// Build from the UI's flat set of active toggle ids.
    ///
    /// Only toggles listed are on; priority, skills and areas keep their
    /// defaults. Unknown ids are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use care_planner::transformations::filter_config::{FilterConfig, StatusFilter};
    ///
    /// let config = FilterConfig::from_toggle_ids(["status-mandatory", "recurrence-weekly", "bogus"]);
    /// assert!(config.status.contains(&StatusFilter::Mandatory));
    /// assert!(!config.status.contains(&StatusFilter::Optional));
    /// assert_eq!(config.recurrence.len(), 1);
    /// ```
    pub fn from_toggle_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = Self {
            status: BTreeSet::new(),
            recurrence: BTreeSet::new(),
            staffing: BTreeSet::new(),
            transport: BTreeSet::new(),
            ..Self::show_all()
        };

        for id in ids {
            match id.as_ref().trim() {
                "status-optional" => config.status.insert(StatusFilter::Optional),
                "status-mandatory" => config.status.insert(StatusFilter::Mandatory),
                "status-extra" => config.status.insert(StatusFilter::Extra),
                "status-cancelled" => config.status.insert(StatusFilter::Cancelled),
                "status-absent" => config.status.insert(StatusFilter::Absent),
                "recurrence-daily" => config.recurrence.insert(Recurrence::Daily),
                "recurrence-weekly" => config.recurrence.insert(Recurrence::Weekly),
                "recurrence-biweekly" => config.recurrence.insert(Recurrence::BiWeekly),
                "recurrence-monthly" => config.recurrence.insert(Recurrence::Monthly),
                "single-staffing" => config.staffing.insert(StaffingFilter::Single),
                "double-staffing" => config.staffing.insert(StaffingFilter::Double),
                "pinned-filter" => config.staffing.insert(StaffingFilter::Pinned),
                "transport-bil" => config.transport.insert(TransportMode::Car),
                "transport-cykel" => config.transport.insert(TransportMode::Bike),
                "transport-promenad" => config.transport.insert(TransportMode::Walk),
                "transport-kollektivtrafik" => config.transport.insert(TransportMode::PublicTransit),
                other => {
                    log::debug!("Ignoring unknown filter toggle '{}'", other);
                    false
                }
            };
        }

        config
    }

    pub fn with_priority_range(mut self, min: i64, max: i64) -> Self {
        self.priority = PriorityRange::new(min, max);
        self
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_service_areas(mut self, selection: ServiceAreaSelection) -> Self {
        self.service_areas = selection;
        self
    }

    pub fn with_recurrence<I: IntoIterator<Item = Recurrence>>(mut self, classes: I) -> Self {
        self.recurrence = classes.into_iter().collect();
        self
    }

    pub fn with_status<I: IntoIterator<Item = StatusFilter>>(mut self, toggles: I) -> Self {
        self.status = toggles.into_iter().collect();
        self
    }

    pub fn with_staffing<I: IntoIterator<Item = StaffingFilter>>(mut self, toggles: I) -> Self {
        self.staffing = toggles.into_iter().collect();
        self
    }

    pub fn with_transport<I: IntoIterator<Item = TransportMode>>(mut self, modes: I) -> Self {
        self.transport = modes.into_iter().collect();
        self
    }

    pub fn shows(&self, toggle: StatusFilter) -> bool {
        self.status.contains(&toggle)
    }

    pub fn shows_staffing(&self, toggle: StaffingFilter) -> bool {
        self.staffing.contains(&toggle)
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::show_all()
    }
}
