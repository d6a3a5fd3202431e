use std::collections::HashSet;

use crate::core::domain::{Assignment, Employee, RecordId, Visit};

/// Assignments kept for a snapshot and what was dropped on the way
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanedAssignments {
    pub kept: Vec<Assignment>,
    /// Repeated (employee, visit) pairs.
    pub duplicates: usize,
    /// Assignments naming a visit or employee that does not exist.
    pub dangling: usize,
}

/// Drop duplicate (employee, visit) pairs and references to unknown records.
///
/// The first occurrence of a pair is kept, so assignment order is preserved.
pub fn clean_assignments(
    assignments: Vec<Assignment>,
    visits: &[Visit],
    employees: &[Employee],
) -> CleanedAssignments {
    let visit_ids: HashSet<&RecordId> = visits.iter().map(|v| &v.id).collect();
    let employee_ids: HashSet<&RecordId> = employees.iter().map(|e| &e.id).collect();

    let mut seen: HashSet<(RecordId, RecordId)> = HashSet::new();
    let mut cleaned = CleanedAssignments::default();

    for assignment in assignments {
        if !visit_ids.contains(&assignment.visit_id)
            || !employee_ids.contains(&assignment.employee_id)
        {
            log::warn!(
                "Dropping assignment of employee {} to visit {}: unknown reference",
                assignment.employee_id,
                assignment.visit_id
            );
            cleaned.dangling += 1;
            continue;
        }

        let key = (assignment.employee_id.clone(), assignment.visit_id.clone());
        if !seen.insert(key) {
            cleaned.duplicates += 1;
            continue;
        }
        cleaned.kept.push(assignment);
    }

    if cleaned.duplicates > 0 {
        log::debug!("Dropped {} duplicate assignments", cleaned.duplicates);
    }

    cleaned
}
