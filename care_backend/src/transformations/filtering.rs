use std::collections::{BTreeMap, BTreeSet};

use crate::core::domain::{BaseStatus, Employee, RecordId, StaffingType, TransportMode, Visit};
use crate::core::snapshot::ScheduleSnapshot;
use crate::transformations::filter_config::{
    FilterConfig, ServiceAreaSelection, StaffingFilter, StatusFilter,
};

/// The filter dimension that rejected a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterDimension {
    BaseStatus,
    Overlay,
    Priority,
    Recurrence,
    Staffing,
    Skills,
    Transport,
    ServiceArea,
}

/// Area filter after resolving the selection against the known areas.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AreaFilter {
    Off,
    HideAll,
    Only(BTreeSet<String>),
}

/// Visit/employee visibility predicate bound to one snapshot and configuration.
///
/// Building the filter resolves the snapshot-dependent parts of the
/// configuration once (whether the skill and area selections are partial);
/// each check afterwards only reads the visit and its assignments.
pub struct VisitFilter<'a> {
    snapshot: &'a ScheduleSnapshot,
    config: &'a FilterConfig,
    skills: Option<BTreeSet<String>>,
    areas: AreaFilter,
}

impl<'a> VisitFilter<'a> {
    pub fn new(snapshot: &'a ScheduleSnapshot, config: &'a FilterConfig) -> Self {
        Self {
            snapshot,
            config,
            skills: partial_skill_selection(&config.skills, snapshot.skill_catalog()),
            areas: resolve_areas(&config.service_areas, snapshot),
        }
    }

    /// First dimension that hides `visit`, or `None` if it is visible.
    ///
    /// The seven attribute dimensions are checked before the service-area pass.
    pub fn rejection(&self, visit: &Visit) -> Option<FilterDimension> {
        if !self.passes_base_status(visit) {
            return Some(FilterDimension::BaseStatus);
        }
        if !self.passes_overlays(visit) {
            return Some(FilterDimension::Overlay);
        }
        if !self.config.priority.contains(visit.priority) {
            return Some(FilterDimension::Priority);
        }
        if !self.config.recurrence.contains(&visit.effective_recurrence()) {
            return Some(FilterDimension::Recurrence);
        }
        if !self.passes_staffing(visit) {
            return Some(FilterDimension::Staffing);
        }
        if !self.passes_skills(visit) {
            return Some(FilterDimension::Skills);
        }
        if !self.passes_transport(visit) {
            return Some(FilterDimension::Transport);
        }
        if !self.passes_service_area(visit.service_area_id.as_deref()) {
            return Some(FilterDimension::ServiceArea);
        }
        None
    }

    pub fn is_visit_visible(&self, visit: &Visit) -> bool {
        self.rejection(visit).is_none()
    }

    /// Employees are filtered by service area only.
    pub fn is_employee_visible(&self, employee: &Employee) -> bool {
        self.passes_service_area(employee.service_area_id.as_deref())
    }

    pub fn passes_base_status(&self, visit: &Visit) -> bool {
        match visit.base_status {
            BaseStatus::Optional => self.config.shows(StatusFilter::Optional),
            BaseStatus::Mandatory => self.config.shows(StatusFilter::Mandatory),
        }
    }

    pub fn passes_overlays(&self, visit: &Visit) -> bool {
        let overlays = visit.overlays;
        !(overlays.extra && !self.config.shows(StatusFilter::Extra)
            || overlays.cancelled && !self.config.shows(StatusFilter::Cancelled)
            || overlays.absent && !self.config.shows(StatusFilter::Absent))
    }

    /// Hides a visit only when it has an attribute whose toggle is off.
    pub fn passes_staffing(&self, visit: &Visit) -> bool {
        let staffing = match visit.staffing_type {
            StaffingType::Single => StaffingFilter::Single,
            StaffingType::Double => StaffingFilter::Double,
        };
        if !self.config.shows_staffing(staffing) {
            return false;
        }
        !visit.pinned || self.config.shows_staffing(StaffingFilter::Pinned)
    }

    /// Visits without required skills always pass.
    pub fn passes_skills(&self, visit: &Visit) -> bool {
        let Some(selected) = &self.skills else {
            return true;
        };
        let mut required = visit
            .required_skills
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .peekable();
        required.peek().is_none() || required.any(|skill| selected.contains(skill))
    }

    /// Unplanned visits always pass; so does every visit while no transport
    /// toggle is on or while all of them are.
    pub fn passes_transport(&self, visit: &Visit) -> bool {
        if self.config.transport.is_empty()
            || self.config.transport.len() == TransportMode::ALL.len()
            || self.snapshot.is_unplanned(&visit.id)
        {
            return true;
        }
        self.snapshot
            .assigned_employees(&visit.id)
            .filter_map(|e| e.transport_mode)
            .any(|mode| self.config.transport.contains(&mode))
    }

    pub fn passes_service_area(&self, area_id: Option<&str>) -> bool {
        match &self.areas {
            AreaFilter::Off => true,
            AreaFilter::HideAll => false,
            AreaFilter::Only(ids) => area_id.is_some_and(|id| ids.contains(id)),
        }
    }

    /// Evaluate every visit and employee in the snapshot.
    pub fn evaluate(&self) -> FilterOutcome {
        let mut outcome = FilterOutcome {
            total_visits: self.snapshot.visits().len(),
            total_employees: self.snapshot.employees().len(),
            ..FilterOutcome::default()
        };

        for visit in self.snapshot.visits() {
            match self.rejection(visit) {
                None => outcome.visible_visits.push(visit.id.clone()),
                Some(dimension) => *outcome.hidden_by.entry(dimension).or_insert(0) += 1,
            }
        }

        outcome.visible_employees = self
            .snapshot
            .employees()
            .iter()
            .filter(|e| self.is_employee_visible(e))
            .map(|e| e.id.clone())
            .collect();

        log::debug!(
            "Filter pass: {}/{} visits visible, {}/{} employees visible, hidden by {:?}",
            outcome.visible_visits.len(),
            outcome.total_visits,
            outcome.visible_employees.len(),
            outcome.total_employees,
            outcome.hidden_by
        );

        outcome
    }
}

/// Visibility of a whole snapshot under one configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Visible visit ids in snapshot order.
    pub visible_visits: Vec<RecordId>,
    /// Visible employee ids in snapshot order.
    pub visible_employees: Vec<RecordId>,
    pub total_visits: usize,
    pub total_employees: usize,
    /// Hidden visit counts keyed by the first dimension that rejected them.
    pub hidden_by: BTreeMap<FilterDimension, usize>,
}

impl FilterOutcome {
    pub fn visible_visit_count(&self) -> usize {
        self.visible_visits.len()
    }

    pub fn hidden_visit_count(&self) -> usize {
        self.total_visits - self.visible_visits.len()
    }

    pub fn is_visit_visible(&self, id: &RecordId) -> bool {
        self.visible_visits.contains(id)
    }
}

/// Evaluate `config` against `snapshot`
pub fn filter_snapshot(snapshot: &ScheduleSnapshot, config: &FilterConfig) -> FilterOutcome {
    VisitFilter::new(snapshot, config).evaluate()
}

/// Visible visits of `snapshot`, in order
pub fn visible_visits<'a>(snapshot: &'a ScheduleSnapshot, config: &FilterConfig) -> Vec<&'a Visit> {
    let filter = VisitFilter::new(snapshot, config);
    snapshot
        .visits()
        .iter()
        .filter(|v| filter.is_visit_visible(v))
        .collect()
}

/// The selected skills when they form a genuine partial selection. Empty and
/// complete selections both mean "no skill filtering".
fn partial_skill_selection(
    selected: &BTreeSet<String>,
    catalog: &BTreeSet<String>,
) -> Option<BTreeSet<String>> {
    let selected: BTreeSet<String> = selected
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if selected.is_empty() || selected == *catalog {
        None
    } else {
        Some(selected)
    }
}

fn resolve_areas(selection: &ServiceAreaSelection, snapshot: &ScheduleSnapshot) -> AreaFilter {
    match selection {
        ServiceAreaSelection::All => AreaFilter::Off,
        ServiceAreaSelection::Only(ids) => {
            let known = snapshot.service_area_ids();
            if ids.len() == known.len() && ids.iter().all(|id| known.contains(id.as_str())) {
                AreaFilter::Off
            } else if ids.is_empty() {
                AreaFilter::HideAll
            } else {
                AreaFilter::Only(ids.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{
        Assignment, Priority, Recurrence, ServiceArea, VisitCategory,
    };
    use crate::transformations::filter_config::PriorityRange;

    fn visit(id: &str) -> Visit {
        let mut v = Visit::new(id);
        v.recurrence = Some(Recurrence::Weekly);
        v.category = VisitCategory::Recurring;
        v.service_area_id = Some("area-1".to_string());
        v
    }

    fn employee(id: &str, mode: Option<TransportMode>, area: &str) -> Employee {
        let mut e = Employee::new(id);
        e.transport_mode = mode;
        e.service_area_id = Some(area.to_string());
        e
    }

    fn areas() -> Vec<ServiceArea> {
        vec![
            ServiceArea::new("area-1", "Västra", Some("#3b82f6")),
            ServiceArea::new("area-2", "Östra", Some("#10b981")),
        ]
    }

    fn snapshot(visits: Vec<Visit>) -> ScheduleSnapshot {
        ScheduleSnapshot::new(visits, vec![], vec![], areas())
    }

    fn visible(snapshot: &ScheduleSnapshot, config: &FilterConfig) -> Vec<String> {
        visible_visits(snapshot, config)
            .into_iter()
            .map(|v| v.id.to_string())
            .collect()
    }

    /// Mandatory, priority 7, weekly, single, unpinned, requires wound-care.
    fn wound_care() -> Visit {
        let mut v = visit("wc");
        v.base_status = BaseStatus::Mandatory;
        v.priority = Priority::new(7);
        v.required_skills = vec!["wound-care".to_string()];
        v
    }

    fn wound_care_config() -> FilterConfig {
        FilterConfig::show_all()
            .with_status([StatusFilter::Mandatory])
            .with_priority_range(5, 10)
            .with_recurrence([Recurrence::Weekly])
            .with_staffing([StaffingFilter::Single])
            .with_skills(["wound-care"])
    }

    #[test]
    fn test_wound_care_scenario_visible() {
        let mut other = visit("other");
        other.required_skills = vec!["dusch".to_string()];
        let snap = snapshot(vec![wound_care(), other]);
        let filter_config = wound_care_config();
        let filter = VisitFilter::new(&snap, &filter_config);
        assert!(filter.is_visit_visible(&snap.visits()[0]));
    }

    #[test]
    fn test_wound_care_scenario_priority_fails() {
        let snap = snapshot(vec![wound_care()]);
        let config = wound_care_config().with_priority_range(0, 4);
        let filter = VisitFilter::new(&snap, &config);
        assert_eq!(
            filter.rejection(&snap.visits()[0]),
            Some(FilterDimension::Priority)
        );
    }

    #[test]
    fn test_base_status() {
        let mut mandatory = visit("m");
        mandatory.base_status = BaseStatus::Mandatory;
        let snap = snapshot(vec![mandatory, visit("o")]);

        let config = FilterConfig::show_all().with_status([StatusFilter::Optional]);
        assert_eq!(visible(&snap, &config), vec!["o"]);

        let config = FilterConfig::show_all().with_status(Vec::<StatusFilter>::new());
        assert!(visible(&snap, &config).is_empty());
    }

    #[test]
    fn test_overlays_hide_independently() {
        let mut cancelled = visit("c");
        cancelled.overlays.cancelled = true;
        let mut extra_absent = visit("ea");
        extra_absent.overlays.extra = true;
        extra_absent.overlays.absent = true;
        let snap = snapshot(vec![cancelled, extra_absent, visit("plain")]);

        let config = FilterConfig::show_all().with_status([
            StatusFilter::Optional,
            StatusFilter::Extra,
            StatusFilter::Cancelled,
        ]);
        assert_eq!(visible(&snap, &config), vec!["c", "plain"]);
    }

    #[test]
    fn test_missing_recurrence_counts_as_daily() {
        let mut none = visit("none");
        none.recurrence = None;
        let mut other = visit("other");
        other.recurrence = Some(Recurrence::Other);
        let snap = snapshot(vec![none, other, visit("weekly")]);

        let config = FilterConfig::show_all().with_recurrence([Recurrence::Daily]);
        assert_eq!(visible(&snap, &config), vec!["none", "other"]);
    }

    #[test]
    fn test_empty_recurrence_hides_all() {
        let snap = snapshot(vec![visit("a"), visit("b")]);
        let outcome = filter_snapshot(&snap, &FilterConfig::show_all().with_recurrence(Vec::<Recurrence>::new()));
        assert_eq!(outcome.visible_visit_count(), 0);
        assert_eq!(outcome.hidden_by[&FilterDimension::Recurrence], 2);
    }

    #[test]
    fn test_staffing_hides_on_attribute_present() {
        let mut double = visit("double");
        double.staffing_type = StaffingType::Double;
        let mut pinned = visit("pinned");
        pinned.pinned = true;
        let snap = snapshot(vec![visit("single"), double, pinned]);

        let config =
            FilterConfig::show_all().with_staffing([StaffingFilter::Double, StaffingFilter::Pinned]);
        assert_eq!(visible(&snap, &config), vec!["double"]);

        let config = FilterConfig::show_all().with_staffing([StaffingFilter::Single]);
        assert_eq!(visible(&snap, &config), vec!["single"]);
    }

    #[test]
    fn test_skills_partial_selection() {
        let mut insulin = visit("insulin");
        insulin.required_skills = vec!["Insulin".to_string()];
        let mut shower = visit("shower");
        shower.required_skills = vec![" Dusch ".to_string(), "Lyft".to_string()];
        let snap = snapshot(vec![insulin, shower, visit("none")]);

        let config = FilterConfig::show_all().with_skills(["Insulin"]);
        assert_eq!(visible(&snap, &config), vec!["insulin", "none"]);

        let config = FilterConfig::show_all().with_skills(["Dusch"]);
        assert_eq!(visible(&snap, &config), vec!["shower", "none"]);
    }

    #[test]
    fn test_skills_empty_and_full_selection_equivalent() {
        let mut insulin = visit("insulin");
        insulin.required_skills = vec!["Insulin".to_string()];
        let mut shower = visit("shower");
        shower.required_skills = vec!["Dusch".to_string()];
        let snap = snapshot(vec![insulin, shower]);

        let empty = filter_snapshot(&snap, &FilterConfig::show_all());
        let full = filter_snapshot(&snap, &FilterConfig::show_all().with_skills(["Dusch", "Insulin"]));
        assert_eq!(empty, full);
        assert_eq!(full.visible_visit_count(), 2);
    }

    fn assigned_snapshot() -> ScheduleSnapshot {
        ScheduleSnapshot::new(
            vec![visit("by-car"), visit("by-bike"), visit("unplanned"), visit("no-mode")],
            vec![
                employee("e1", Some(TransportMode::Car), "area-1"),
                employee("e2", Some(TransportMode::Bike), "area-2"),
                employee("e3", None, "area-1"),
            ],
            vec![
                Assignment::new("e1", "by-car"),
                Assignment::new("e2", "by-bike"),
                Assignment::new("e3", "no-mode"),
            ],
            areas(),
        )
    }

    #[test]
    fn test_transport_filter() {
        let snap = assigned_snapshot();

        let config = FilterConfig::show_all().with_transport([TransportMode::Bike]);
        assert_eq!(visible(&snap, &config), vec!["by-bike", "unplanned"]);

        // No transport toggle on disables the dimension
        let config = FilterConfig::show_all().with_transport(Vec::<TransportMode>::new());
        assert_eq!(visible(&snap, &config).len(), 4);

        // An employee without a known mode never matches a partial selection
        let config = FilterConfig::show_all()
            .with_transport([TransportMode::Car, TransportMode::Bike, TransportMode::Walk]);
        assert_eq!(visible(&snap, &config), vec!["by-car", "by-bike", "unplanned"]);

        // Every toggle on disables the dimension as well
        let outcome = filter_snapshot(&snap, &FilterConfig::show_all());
        assert_eq!(outcome.visible_visit_count(), 4);
        assert!(outcome.is_visit_visible(&RecordId::from("no-mode")));
        assert_eq!(outcome, filter_snapshot(&snap, &FilterConfig::default()));
    }

    #[test]
    fn test_show_all_with_unknown_mode_employee() {
        let snap = ScheduleSnapshot::new(
            vec![visit("v1")],
            vec![Employee::new("e1")],
            vec![Assignment::new("e1", "v1")],
            areas(),
        );
        let outcome = filter_snapshot(&snap, &FilterConfig::show_all());
        assert_eq!(outcome.visible_visits, vec![RecordId::from("v1")]);
        assert!(outcome.hidden_by.is_empty());
    }

    #[test]
    fn test_double_staffed_transport_any_match() {
        let snap = ScheduleSnapshot::new(
            vec![visit("pair")],
            vec![
                employee("e1", Some(TransportMode::Car), "area-1"),
                employee("e2", Some(TransportMode::Walk), "area-1"),
            ],
            vec![Assignment::new("e1", "pair"), Assignment::new("e2", "pair")],
            areas(),
        );
        let config = FilterConfig::show_all().with_transport([TransportMode::Walk]);
        assert_eq!(visible(&snap, &config), vec!["pair"]);
    }

    #[test]
    fn test_service_area_pass() {
        let snap = assigned_snapshot();
        let mut unzoned = visit("unzoned");
        unzoned.service_area_id = None;
        let mut visits = snap.visits().to_vec();
        visits.push(unzoned);
        let snap = ScheduleSnapshot::new(
            visits,
            snap.employees().to_vec(),
            snap.assignments().to_vec(),
            areas(),
        );
        let base = FilterConfig::show_all().with_transport(Vec::<TransportMode>::new());

        let only_east = base
            .clone()
            .with_service_areas(ServiceAreaSelection::only(["area-2"]));
        let outcome = filter_snapshot(&snap, &only_east);
        assert_eq!(outcome.visible_visit_count(), 0);
        assert_eq!(outcome.visible_employees, vec![RecordId::from("e2")]);
        assert_eq!(outcome.hidden_by[&FilterDimension::ServiceArea], 5);

        // Selecting every area is the same as no selection, unzoned rows included
        let every = base
            .clone()
            .with_service_areas(ServiceAreaSelection::only(["area-1", "area-2"]));
        assert_eq!(filter_snapshot(&snap, &every), filter_snapshot(&snap, &base));
        assert_eq!(filter_snapshot(&snap, &every).visible_visit_count(), 5);

        let none = base.with_service_areas(ServiceAreaSelection::only(Vec::<String>::new()));
        let outcome = filter_snapshot(&snap, &none);
        assert_eq!(outcome.visible_visit_count(), 0);
        assert!(outcome.visible_employees.is_empty());
    }

    #[test]
    fn test_empty_area_selection_without_known_areas() {
        let snap = ScheduleSnapshot::new(
            vec![visit("v1")],
            vec![employee("e1", None, "area-1")],
            vec![],
            vec![],
        );
        let config =
            FilterConfig::show_all().with_service_areas(ServiceAreaSelection::only(Vec::<String>::new()));
        let outcome = filter_snapshot(&snap, &config);
        assert_eq!(outcome.visible_visit_count(), 1);
        assert_eq!(outcome.visible_employees.len(), 1);
    }

    #[test]
    fn test_outcome_counts() {
        let mut cancelled = visit("c");
        cancelled.overlays.cancelled = true;
        let mut low = visit("low");
        low.priority = Priority::new(1);
        let snap = snapshot(vec![cancelled, low, visit("ok")]);

        let mut config = FilterConfig::show_all().with_status([StatusFilter::Optional]);
        config.priority = PriorityRange::new(0, 0);
        let outcome = filter_snapshot(&snap, &config);

        assert_eq!(outcome.total_visits, 3);
        assert_eq!(outcome.visible_visits, vec![RecordId::from("ok")]);
        assert_eq!(outcome.hidden_visit_count(), 2);
        assert_eq!(outcome.hidden_by[&FilterDimension::Overlay], 1);
        assert_eq!(outcome.hidden_by[&FilterDimension::Priority], 1);
    }
}
