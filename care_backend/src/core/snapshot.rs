//! Immutable view over one loaded dataset.
//!
//! A [`ScheduleSnapshot`] owns the visits, employees and service areas of a single
//! dataset and indexes the assignment relation. Filter passes borrow a snapshot, so
//! records cannot change underneath an evaluation; a data reload builds a new
//! snapshot instead of mutating the old one.

use std::collections::{BTreeSet, HashMap};

use crate::core::domain::{Assignment, Employee, RecordId, ServiceArea, Visit};
use crate::transformations::catalog::collect_skills;
use crate::transformations::cleaning::clean_assignments;

#[derive(Debug, Clone)]
pub struct ScheduleSnapshot {
    visits: Vec<Visit>,
    employees: Vec<Employee>,
    assignments: Vec<Assignment>,
    service_areas: Vec<ServiceArea>,
    employee_index: HashMap<RecordId, usize>,
    assigned_employees: HashMap<RecordId, Vec<RecordId>>,
    skill_catalog: BTreeSet<String>,
}

impl ScheduleSnapshot {
    /// Builds a snapshot, dropping duplicate and dangling assignments.
    pub fn new(
        visits: Vec<Visit>,
        employees: Vec<Employee>,
        assignments: Vec<Assignment>,
        service_areas: Vec<ServiceArea>,
    ) -> Self {
        let cleaned = clean_assignments(assignments, &visits, &employees);

        let employee_index = employees
            .iter()
            .enumerate()
            .map(|(idx, e)| (e.id.clone(), idx))
            .collect();

        let mut assigned_employees: HashMap<RecordId, Vec<RecordId>> = HashMap::new();
        for assignment in &cleaned.kept {
            assigned_employees
                .entry(assignment.visit_id.clone())
                .or_default()
                .push(assignment.employee_id.clone());
        }

        let skill_catalog = collect_skills(&visits);

        Self {
            visits,
            employees,
            assignments: cleaned.kept,
            service_areas,
            employee_index,
            assigned_employees,
            skill_catalog,
        }
    }

    pub fn visits(&self) -> &[Visit] {
        &self.visits
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn service_areas(&self) -> &[ServiceArea] {
        &self.service_areas
    }

    pub fn employee(&self, id: &RecordId) -> Option<&Employee> {
        self.employee_index.get(id).map(|&idx| &self.employees[idx])
    }

    /// Employees assigned to `visit_id`, in assignment order. Empty for unplanned visits.
    pub fn assigned_employees<'a>(
        &'a self,
        visit_id: &RecordId,
    ) -> impl Iterator<Item = &'a Employee> + 'a {
        self.assigned_employees
            .get(visit_id)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.employee(id))
    }

    pub fn assignment_count(&self, visit_id: &RecordId) -> usize {
        self.assigned_employees
            .get(visit_id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn is_unplanned(&self, visit_id: &RecordId) -> bool {
        self.assignment_count(visit_id) == 0
    }

    /// Every skill required by any visit in the snapshot, trimmed and sorted.
    pub fn skill_catalog(&self) -> &BTreeSet<String> {
        &self.skill_catalog
    }

    pub fn service_area_ids(&self) -> BTreeSet<&str> {
        self.service_areas.iter().map(|a| a.id.as_str()).collect()
    }
}
