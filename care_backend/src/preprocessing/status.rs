//! Status migration for visit rows.
//!
//! Resolves the base status, overlay flags and priority of one raw row. Rows
//! with a legacy `visitStatus` are migrated from it; rows with any canonical
//! flag are repaired so exactly one base status holds; rows with no status
//! data at all are handed to a [`StatusSynthesizer`] when one is configured.

use std::str::FromStr;

use crate::core::domain::{BaseStatus, OverlayFlags, Priority};
use crate::parsing::json_parser::RawVisitRow;
use crate::preprocessing::fixtures::StatusSynthesizer;

/// Values of the legacy single-valued `visitStatus` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyStatus {
    Optional,
    Mandatory,
    Extra,
    Cancelled,
    Absent,
    Priority,
}

impl FromStr for LegacyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "optional" => Ok(LegacyStatus::Optional),
            "mandatory" => Ok(LegacyStatus::Mandatory),
            "extra" => Ok(LegacyStatus::Extra),
            "cancelled" | "canceled" => Ok(LegacyStatus::Cancelled),
            "absent" => Ok(LegacyStatus::Absent),
            "priority" => Ok(LegacyStatus::Priority),
            other => Err(format!("Unknown visit status: {}", other)),
        }
    }
}

/// Where a resolved status came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusSource {
    /// Migrated from `visitStatus`.
    Legacy,
    /// Canonical flags present on the row (possibly repaired).
    Canonical,
    /// Backfilled by a fixture strategy.
    Synthesized,
    /// No status data and no synthesis: plain defaults.
    Defaulted,
}

/// Canonical status fields for one visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedStatus {
    pub base: BaseStatus,
    pub overlays: OverlayFlags,
    pub priority: Priority,
    pub source: StatusSource,
}

/// Resolve the status group of `row`.
///
/// * `index` - Position of the row in its collection, only used for synthesis
/// * `legacy_priority` - Priority for legacy `priority` rows without one
pub fn resolve_status(
    row: &RawVisitRow,
    index: usize,
    legacy_priority: Priority,
    synthesizer: Option<&dyn StatusSynthesizer>,
) -> ResolvedStatus {
    let existing_priority = row.priority.map(|p| p.resolve(legacy_priority));

    if let Some(label) = row.visit_status.as_deref() {
        match label.parse::<LegacyStatus>() {
            Ok(legacy) => return migrate_legacy(row, legacy, existing_priority, legacy_priority),
            Err(e) => log::warn!("Visit {}: {}; ignoring visitStatus", row.id, e),
        }
    }

    if row.lacks_status() {
        if let Some(synthesizer) = synthesizer {
            let synthetic = synthesizer.synthesize(index);
            return ResolvedStatus {
                base: synthetic.base,
                overlays: synthetic.overlays,
                priority: existing_priority.unwrap_or(synthetic.priority),
                source: StatusSource::Synthesized,
            };
        }
        return ResolvedStatus {
            base: BaseStatus::Optional,
            overlays: OverlayFlags::default(),
            priority: existing_priority.unwrap_or(Priority::NONE),
            source: StatusSource::Defaulted,
        };
    }

    ResolvedStatus {
        base: existing_base(row).unwrap_or(BaseStatus::Optional),
        overlays: existing_overlays(row),
        priority: existing_priority.unwrap_or(Priority::NONE),
        source: StatusSource::Canonical,
    }
}

/// Base status from the canonical flags, `isMandatory` taking precedence.
///
/// A row marked both mandatory and optional resolves to mandatory; one marked
/// neither resolves to optional.
fn existing_base(row: &RawVisitRow) -> Option<BaseStatus> {
    let from_mandatory = |m: bool| {
        if m {
            BaseStatus::Mandatory
        } else {
            BaseStatus::Optional
        }
    };

    if let Some(mandatory) = row.is_mandatory.or(row.mandatory) {
        return Some(from_mandatory(mandatory));
    }
    row.is_optional.map(|optional| from_mandatory(!optional))
}

fn existing_overlays(row: &RawVisitRow) -> OverlayFlags {
    OverlayFlags {
        extra: row.is_extra.unwrap_or(false),
        cancelled: row.is_cancelled.unwrap_or(false),
        absent: row.is_absent.unwrap_or(false),
    }
}

fn migrate_legacy(
    row: &RawVisitRow,
    legacy: LegacyStatus,
    existing_priority: Option<Priority>,
    legacy_priority: Priority,
) -> ResolvedStatus {
    let base = match legacy {
        LegacyStatus::Mandatory => BaseStatus::Mandatory,
        LegacyStatus::Optional => BaseStatus::Optional,
        // Overlay values say nothing about the base status
        _ => existing_base(row).unwrap_or(BaseStatus::Optional),
    };

    let mut overlays = existing_overlays(row);
    match legacy {
        LegacyStatus::Extra => overlays.extra = true,
        LegacyStatus::Cancelled => overlays.cancelled = true,
        LegacyStatus::Absent => overlays.absent = true,
        _ => {}
    }

    let priority = match (legacy, existing_priority) {
        (LegacyStatus::Priority, Some(p)) if p.is_set() => p,
        (LegacyStatus::Priority, _) => legacy_priority,
        (_, p) => p.unwrap_or(Priority::NONE),
    };

    ResolvedStatus {
        base,
        overlays,
        priority,
        source: StatusSource::Legacy,
    }
}
