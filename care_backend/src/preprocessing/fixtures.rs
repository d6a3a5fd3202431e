//! Fixture-data generation strategies.
//!
//! Demo and test data files often lack status information entirely. The
//! strategies here backfill it deterministically from a row's position so the
//! filters have something to act on. They encode demo ratios, not domain rules,
//! and are only applied to rows without any status data of their own.

use crate::core::domain::{BaseStatus, OverlayFlags, Priority, ServiceArea};

/// Status fields produced for a row with no status data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticStatus {
    pub base: BaseStatus,
    pub overlays: OverlayFlags,
    pub priority: Priority,
}

/// Backfills status for status-less rows.
pub trait StatusSynthesizer: Send + Sync {
    fn synthesize(&self, index: usize) -> SyntheticStatus;
}

/// Index-seeded variety:
///
/// * 60% mandatory (`index % 10 < 6`), the rest optional
/// * extra on every 10th row (`index % 10 == 0`)
/// * cancelled on every 20th row from 2 (`index % 20 == 2`)
/// * absent on every 30th row from 5 (`index % 30 == 5`)
/// * a priority in `1..=10` for 30% of rows (`index % 10 < 3`), else 0
///
/// # Examples
///
/// ```
/// use care_planner::core::domain::BaseStatus;
/// use care_planner::preprocessing::fixtures::{IndexedFixtureStrategy, StatusSynthesizer};
///
/// let status = IndexedFixtureStrategy.synthesize(2);
/// assert_eq!(status.base, BaseStatus::Mandatory);
/// assert!(status.overlays.cancelled);
/// assert_eq!(status.priority.value(), 7);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexedFixtureStrategy;

impl StatusSynthesizer for IndexedFixtureStrategy {
    fn synthesize(&self, index: usize) -> SyntheticStatus {
        let decile = index % 10;
        let base = if decile < 6 {
            BaseStatus::Mandatory
        } else {
            BaseStatus::Optional
        };

        let overlays = OverlayFlags {
            extra: decile == 0,
            cancelled: index % 20 == 2,
            absent: index % 30 == 5,
        };

        // 1, 4, 7 for deciles 0, 1, 2
        let priority = if decile < 3 {
            Priority::new((decile as f64 * 3.33).floor() as i64 + 1)
        } else {
            Priority::NONE
        };

        SyntheticStatus {
            base,
            overlays,
            priority,
        }
    }
}

/// Round-robin service area for the row at `index`. `None` when `areas` is empty.
pub fn round_robin_area(areas: &[ServiceArea], index: usize) -> Option<&ServiceArea> {
    if areas.is_empty() {
        None
    } else {
        Some(&areas[index % areas.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_ratio() {
        let mandatory = (0..100)
            .filter(|&i| IndexedFixtureStrategy.synthesize(i).base == BaseStatus::Mandatory)
            .count();
        assert_eq!(mandatory, 60);
    }

    #[test]
    fn test_overlay_positions() {
        let s = IndexedFixtureStrategy;
        assert!(s.synthesize(0).overlays.extra);
        assert!(s.synthesize(10).overlays.extra);
        assert!(!s.synthesize(1).overlays.extra);
        assert!(s.synthesize(22).overlays.cancelled);
        assert!(!s.synthesize(12).overlays.cancelled);
        assert!(s.synthesize(35).overlays.absent);
        assert!(!s.synthesize(15).overlays.absent);
    }

    #[test]
    fn test_priority_levels() {
        let levels: Vec<u8> = (0..10)
            .map(|i| IndexedFixtureStrategy.synthesize(i).priority.value())
            .collect();
        assert_eq!(levels, vec![1, 4, 7, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_round_robin_area() {
        let areas = vec![
            ServiceArea::new("area-1", "Västra", None),
            ServiceArea::new("area-2", "Östra", None),
        ];
        assert_eq!(round_robin_area(&areas, 0).unwrap().id, "area-1");
        assert_eq!(round_robin_area(&areas, 3).unwrap().id, "area-2");
        assert!(round_robin_area(&[], 3).is_none());
    }
}
