//! Dataset validation with detailed error and warning reporting.
//!
//! This module checks normalized visits and employees for consistency and
//! data quality: duplicate ids, derived fields that disagree with their
//! source, and references to unknown service areas.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::core::domain::{Employee, RecordId, Recurrence, ServiceArea, Visit, VisitCategory};

/// How many individual issues of one kind are reported before summarising.
const MAX_REPORTED: usize = 5;

/// Validation result with categorized issues and statistics.
///
/// Errors make `is_valid` false, while warnings are informational and don't
/// fail validation.
///
/// # Fields
///
/// * `is_valid` - `false` if any errors were found, `true` otherwise
/// * `errors` - Broken invariants (e.g., duplicate ids, a movable daily visit)
/// * `warnings` - Data quality issues worth reviewing (e.g., no service area)
/// * `stats` - Summary statistics about the validated data
///
/// # Examples
///
/// ```
/// use care_planner::preprocessing::validator::ValidationResult;
///
/// let mut result = ValidationResult::new();
/// assert!(result.is_valid);
///
/// result.add_error("Duplicate visit id: 7".to_string());
/// assert!(!result.is_valid);
/// assert_eq!(result.errors.len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: ValidationStats,
}

/// Summary statistics computed during validation.
///
/// # Fields
///
/// * `total_visits` / `total_employees` - Row counts
/// * `mandatory_visits` / `optional_visits` - Base status split
/// * `extra_visits`, `cancelled_visits`, `absent_visits` - Overlay counts
/// * `prioritized_visits` - Visits with a priority above 0
/// * `recurring_visits` - Visits in the recurring category
/// * `visits_without_skills` - Visits with an empty skill requirement
/// * `missing_service_area` - Visits and employees without a service area
/// * `unknown_service_area` - Visits and employees referencing an unconfigured area
/// * `employees_without_transport` - Employees with a missing or unrecognised transport mode
/// * `duplicate_ids` - Duplicate visit or employee ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationStats {
    pub total_visits: usize,
    pub total_employees: usize,
    pub mandatory_visits: usize,
    pub optional_visits: usize,
    pub extra_visits: usize,
    pub cancelled_visits: usize,
    pub absent_visits: usize,
    pub prioritized_visits: usize,
    pub recurring_visits: usize,
    pub visits_without_skills: usize,
    pub missing_service_area: usize,
    pub unknown_service_area: usize,
    pub employees_without_transport: usize,
    pub duplicate_ids: usize,
}

impl ValidationResult {
    /// Creates a valid result with empty error and warning lists.
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            stats: ValidationStats::default(),
        }
    }

    /// Adds an error and marks the result as invalid.
    pub fn add_error(&mut self, error: String) {
        self.is_valid = false;
        self.errors.push(error);
    }

    /// Adds a warning without invalidating the result.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validator for normalized planning data.
///
/// # Examples
///
/// ```
/// use care_planner::core::domain::{Employee, Visit};
/// use care_planner::preprocessing::validator::DatasetValidator;
///
/// let visits = vec![Visit::new("v1"), Visit::new("v1")];
/// let employees = vec![Employee::new("e1")];
///
/// let result = DatasetValidator::validate(&visits, &employees, &[]);
/// assert!(!result.is_valid);
/// assert_eq!(result.stats.duplicate_ids, 1);
/// ```
pub struct DatasetValidator;

impl DatasetValidator {
    /// Validates visits and employees against each other and the configured
    /// service areas. An empty `service_areas` slice skips the area reference check.
    pub fn validate(
        visits: &[Visit],
        employees: &[Employee],
        service_areas: &[ServiceArea],
    ) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.stats.total_visits = visits.len();
        result.stats.total_employees = employees.len();

        let known_areas: HashSet<&str> = service_areas.iter().map(|a| a.id.as_str()).collect();

        let visit_ids = visits.iter().map(|v| &v.id);
        let employee_ids = employees.iter().map(|e| &e.id);
        result.stats.duplicate_ids = Self::check_duplicates("visit", visit_ids, &mut result)
            + Self::check_duplicates("employee", employee_ids, &mut result);

        let mut area_issues = AreaIssues::default();

        for visit in visits {
            Self::validate_visit(visit, &mut result);
            area_issues.check("Visit", &visit.id, visit.service_area_id.as_deref(), &known_areas);
        }

        for employee in employees {
            if employee.transport_mode.is_none() {
                result.stats.employees_without_transport += 1;
            }
            area_issues.check(
                "Employee",
                &employee.id,
                employee.service_area_id.as_deref(),
                &known_areas,
            );
        }

        if result.stats.employees_without_transport > 0 {
            result.add_warning(format!(
                "{} employees have no recognised transport mode and never match a transport filter",
                result.stats.employees_without_transport
            ));
        }

        area_issues.report(&mut result);
        result
    }

    fn validate_visit(visit: &Visit, result: &mut ValidationResult) {
        let stats = &mut result.stats;
        if visit.is_mandatory() {
            stats.mandatory_visits += 1;
        } else {
            stats.optional_visits += 1;
        }
        stats.extra_visits += visit.is_extra() as usize;
        stats.cancelled_visits += visit.is_cancelled() as usize;
        stats.absent_visits += visit.is_absent() as usize;
        stats.prioritized_visits += visit.priority.is_set() as usize;
        stats.recurring_visits += (visit.category == VisitCategory::Recurring) as usize;
        stats.visits_without_skills += visit.required_skills.is_empty() as usize;

        if visit.category != VisitCategory::from_recurrence(visit.recurrence) {
            result.add_error(format!(
                "Visit {} has category {:?} but recurrence {:?}",
                visit.id, visit.category, visit.recurrence
            ));
        }

        if visit.movable && visit.recurrence == Some(Recurrence::Daily) {
            result.add_error(format!("Visit {} recurs daily but is movable", visit.id));
        }
    }

    /// Reports each duplicated id once and returns the number of surplus rows.
    fn check_duplicates<'a>(
        kind: &str,
        ids: impl Iterator<Item = &'a RecordId>,
        result: &mut ValidationResult,
    ) -> usize {
        let mut counts: HashMap<&RecordId, usize> = HashMap::new();
        for id in ids {
            *counts.entry(id).or_default() += 1;
        }

        let mut duplicates: Vec<(&RecordId, usize)> =
            counts.into_iter().filter(|(_, n)| *n > 1).collect();
        duplicates.sort_by_key(|(id, _)| id.to_string());

        for (id, n) in &duplicates {
            result.add_error(format!("Duplicate {} id: {} ({} rows)", kind, id, n));
        }
        duplicates.iter().map(|(_, n)| n - 1).sum()
    }
}

#[derive(Default)]
struct AreaIssues {
    missing: usize,
    unknown: Vec<String>,
}

impl AreaIssues {
    fn check(&mut self, kind: &str, id: &RecordId, area: Option<&str>, known: &HashSet<&str>) {
        match area {
            None => self.missing += 1,
            Some(area) if !known.is_empty() && !known.contains(area) => {
                self.unknown
                    .push(format!("{} {} references unknown service area '{}'", kind, id, area));
            }
            Some(_) => {}
        }
    }

    fn report(self, result: &mut ValidationResult) {
        result.stats.missing_service_area = self.missing;
        result.stats.unknown_service_area = self.unknown.len();

        if self.missing > 0 {
            result.add_warning(format!(
                "{} rows have no service area and are hidden by any area selection",
                self.missing
            ));
        }

        let total = self.unknown.len();
        for warning in self.unknown.into_iter().take(MAX_REPORTED) {
            result.add_warning(warning);
        }
        if total > MAX_REPORTED {
            result.add_warning(format!(
                "Total unknown service area references: {} (showing first {})",
                total, MAX_REPORTED
            ));
        }
    }
}
