//! Derived views over a loaded snapshot.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::domain::Visit;
use crate::core::snapshot::ScheduleSnapshot;

/// Sorted, de-duplicated union of every visit's required skills, trimmed.
pub fn collect_skills(visits: &[Visit]) -> BTreeSet<String> {
    visits
        .iter()
        .flat_map(|v| v.required_skills.iter())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Visits without any assignment, grouped by required role.
///
/// Visits without a role are grouped under the empty string.
pub fn unplanned_by_role(snapshot: &ScheduleSnapshot) -> BTreeMap<String, Vec<&Visit>> {
    let mut groups: BTreeMap<String, Vec<&Visit>> = BTreeMap::new();
    for visit in snapshot.visits() {
        if snapshot.is_unplanned(&visit.id) {
            let role = visit.required_role.clone().unwrap_or_default();
            groups.entry(role).or_default().push(visit);
        }
    }
    groups
}
