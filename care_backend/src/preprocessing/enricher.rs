use anyhow::{Context, Result};
use regex::Regex;
use serde_json::{Map, Value};

use crate::config::NormalizerConfig;
use crate::core::domain::{Recurrence, StaffingType, VisitCategory};
use crate::parsing::json_parser::RawVisitRow;
use crate::parsing::lenient::split_list;

/// Field name older data files used for the recurrence class. It collides with
/// the scheduler's own recurrence rule, so it is only consumed when it holds
/// a known cadence.
const LEGACY_RECURRENCE_FIELD: &str = "recurrence";

/// Derived scheduling attributes of one visit.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitAttributes {
    pub required_skills: Vec<String>,
    pub recurrence: Option<Recurrence>,
    pub category: VisitCategory,
    pub movable: bool,
    pub staffing_type: StaffingType,
}

/// Enricher deriving skills, recurrence, category, movability and staffing
pub struct VisitEnricher {
    skill_pattern: Regex,
    keywords: Vec<(Recurrence, Vec<String>)>,
    infer_recurrence: bool,
    default_staffing: StaffingType,
}

impl VisitEnricher {
    /// Create an enricher from normalizer settings
    pub fn new(config: &NormalizerConfig) -> Result<Self> {
        let markers = config
            .skill_markers
            .iter()
            .map(|m| regex::escape(m.trim()))
            .collect::<Vec<_>>()
            .join("|");
        // Lazy list up to the first full stop or end of line
        let skill_pattern = Regex::new(&format!(r"(?im)(?:{})\s*:\s*(.+?)(?:\.|$)", markers))
            .with_context(|| {
                format!("Invalid skill marker pattern from {:?}", config.skill_markers)
            })?;

        let lower = |words: &[String]| words.iter().map(|w| w.to_lowercase()).collect::<Vec<_>>();
        let kw = &config.recurrence_keywords;
        let keywords = vec![
            (Recurrence::Daily, lower(&kw.daily)),
            (Recurrence::Weekly, lower(&kw.weekly)),
            (Recurrence::BiWeekly, lower(&kw.bi_weekly)),
            (Recurrence::Monthly, lower(&kw.monthly)),
        ];

        Ok(Self {
            skill_pattern,
            keywords,
            infer_recurrence: config.infer_recurrence,
            default_staffing: config.default_staffing,
        })
    }

    /// Skill list introduced by a marker in free-text notes.
    ///
    /// Returns an empty list when no marker is present.
    pub fn extract_skills(&self, notes: &str) -> Vec<String> {
        self.skill_pattern
            .captures(notes)
            .and_then(|caps| caps.get(1))
            .map(|list| split_list(list.as_str()))
            .unwrap_or_default()
    }

    /// First recurrence class with a keyword contained in `name`.
    pub fn infer_recurrence(&self, name: &str) -> Option<Recurrence> {
        let name = name.to_lowercase();
        self.keywords
            .iter()
            .find(|(_, words)| words.iter().any(|w| !w.is_empty() && name.contains(w.as_str())))
            .map(|(class, _)| *class)
    }

    /// Derive every attribute for `row`.
    ///
    /// Consumes a legacy `recurrence` cadence from `row.extra` when present.
    pub fn enrich(&self, row: &mut RawVisitRow) -> VisitAttributes {
        let required_skills = match &row.required_skills {
            Some(skills) => skills.clone(),
            None => row
                .task_notes
                .as_deref()
                .map(|notes| self.extract_skills(notes))
                .unwrap_or_default(),
        };

        let recurrence = self.resolve_recurrence(row);
        let category = VisitCategory::from_recurrence(recurrence);

        // Daily visits cannot be moved to another day
        let movable = recurrence != Some(Recurrence::Daily) && row.movable.unwrap_or(true);

        let staffing_type = match row.staffing_type.as_deref() {
            None => self.default_staffing,
            Some(label) => label.parse::<StaffingType>().unwrap_or_else(|e| {
                log::warn!("Visit {}: {}; using {:?}", row.id, e, self.default_staffing);
                self.default_staffing
            }),
        };

        VisitAttributes {
            required_skills,
            recurrence,
            category,
            movable,
            staffing_type,
        }
    }

    /// Stored `visitRecurrence`, then a legacy `recurrence` cadence, then inference.
    fn resolve_recurrence(&self, row: &mut RawVisitRow) -> Option<Recurrence> {
        let legacy = take_legacy_recurrence(&mut row.extra);

        if let Some(stored) = row.visit_recurrence.as_deref() {
            return Recurrence::parse(stored);
        }
        if legacy.is_some() {
            return legacy;
        }
        if self.infer_recurrence {
            return row.name.as_deref().and_then(|name| self.infer_recurrence(name));
        }
        None
    }
}

fn take_legacy_recurrence(extra: &mut Map<String, Value>) -> Option<Recurrence> {
    let recurrence = extra
        .get(LEGACY_RECURRENCE_FIELD)
        .and_then(Value::as_str)
        .and_then(Recurrence::parse)
        .filter(|r| *r != Recurrence::Other)?;
    extra.remove(LEGACY_RECURRENCE_FIELD);
    Some(recurrence)
}
