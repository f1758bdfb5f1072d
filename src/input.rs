//! Input document schema (schema ~v0.43-0.70) and the typed `Context` it's
//! lowered into. This is the "tagged deserialisation layer" called for in
//! SPEC_FULL.md §9: dynamic `.get` chains on the source become `Option<T>`
//! fields with explicit `#[serde(default)]`.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::{Blacklist, Employee, GenderRequirement, Rank, SchemeRequirement, Whitelist};
use crate::error::{Result, RosterError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlanningHorizon {
    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,
    #[serde(rename = "endDate")]
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftDetail {
    #[serde(rename = "shiftCode")]
    pub shift_code: String,
    pub start: String,
    pub end: String,
    #[serde(rename = "nextDay", default)]
    pub next_day: bool,
}

/// `coverageDays` accepts either an array of weekday names or a legacy
/// integer count (meaning "the first N days of Mon..Sun").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoverageDays {
    Names(Vec<String>),
    Count(i64),
}

impl Default for CoverageDays {
    fn default() -> Self {
        CoverageDays::Count(7)
    }
}

fn day_name_to_weekday(name: &str) -> Option<Weekday> {
    match name {
        "Mon" => Some(Weekday::Mon),
        "Tue" => Some(Weekday::Tue),
        "Wed" => Some(Weekday::Wed),
        "Thu" => Some(Weekday::Thu),
        "Fri" => Some(Weekday::Fri),
        "Sat" => Some(Weekday::Sat),
        "Sun" => Some(Weekday::Sun),
        _ => None,
    }
}

const WEEK_ORDER: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

impl CoverageDays {
    pub fn weekdays(&self) -> HashSet<Weekday> {
        match self {
            CoverageDays::Names(names) => {
                names.iter().filter_map(|n| day_name_to_weekday(n)).collect()
            }
            CoverageDays::Count(n) => {
                let n = (*n).clamp(0, 7) as usize;
                WEEK_ORDER[..n]
                    .iter()
                    .filter_map(|n| day_name_to_weekday(n))
                    .collect()
            }
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftGroup {
    #[serde(rename = "shiftDetails", default)]
    pub shift_details: Vec<ShiftDetail>,
    #[serde(rename = "coverageDays", default)]
    pub coverage_days: CoverageDays,
    #[serde(rename = "coverageAnchor", default)]
    pub coverage_anchor: Option<NaiveDate>,
    #[serde(rename = "includePublicHolidays", default = "default_true")]
    pub include_public_holidays: bool,
    #[serde(rename = "includeEveOfPublicHolidays", default = "default_true")]
    pub include_eve_of_public_holidays: bool,
    #[serde(rename = "preferredTeams", default)]
    pub preferred_teams: Vec<String>,
    #[serde(default)]
    pub whitelist: Whitelist,
    #[serde(default)]
    pub blacklist: Blacklist,
}

fn default_headcount() -> usize {
    1
}

fn default_gender_requirement() -> GenderRequirement {
    GenderRequirement::Any
}

fn default_scheme_requirement() -> SchemeRequirement {
    SchemeRequirement::Global
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    #[serde(rename = "requirementId")]
    pub requirement_id: String,
    #[serde(rename = "productTypeId")]
    pub product_type_id: String,
    #[serde(rename = "rankId")]
    pub rank_id: Rank,
    #[serde(default = "default_headcount")]
    pub headcount: usize,
    #[serde(default = "default_gender_requirement")]
    pub gender: GenderRequirement,
    #[serde(rename = "Scheme", default = "default_scheme_requirement")]
    pub scheme: SchemeRequirement,
    #[serde(rename = "requiredQualifications", default)]
    pub required_qualifications: Vec<String>,
    /// Accepts either the new `workPattern` field name or the legacy
    /// `rotationSequence` name (both carry the same cyclic list of shift
    /// codes / `"O"`).
    #[serde(rename = "workPattern", alias = "rotationSequence", default)]
    pub work_pattern: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandItem {
    #[serde(rename = "demandId")]
    pub demand_id: String,
    #[serde(rename = "locationId")]
    pub location_id: String,
    #[serde(rename = "ouId")]
    pub ou_id: String,
    #[serde(rename = "shiftStartDate")]
    pub shift_start_date: NaiveDate,
    #[serde(default)]
    pub shifts: Vec<ShiftGroup>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputDocument {
    #[serde(rename = "schemaVersion", default)]
    pub schema_version: Option<String>,
    #[serde(rename = "planningReference", default)]
    pub planning_reference: Option<String>,
    #[serde(rename = "planningHorizon")]
    pub planning_horizon: PlanningHorizon,
    #[serde(rename = "publicHolidays", default)]
    pub public_holidays: Vec<NaiveDate>,
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(rename = "demandItems", default)]
    pub demand_items: Vec<DemandItem>,
    #[serde(rename = "solverScoreConfig", default)]
    pub solver_score_config: Option<serde_json::Value>,
    #[serde(rename = "timeLimit", default)]
    pub time_limit: Option<u64>,
    #[serde(rename = "fixedRotationOffset", default)]
    pub fixed_rotation_offset: Option<bool>,
}

/// Fully typed, validated planning context. Everything downstream (B..H)
/// reads from this; nothing mutates it.
#[derive(Debug, Clone)]
pub struct Context {
    pub planning_reference: String,
    pub horizon: PlanningHorizon,
    pub public_holidays: HashSet<NaiveDate>,
    pub employees: Vec<Employee>,
    pub demand_items: Vec<DemandItem>,
    pub time_limit_seconds: u64,
}

pub const DEFAULT_TIME_LIMIT_SECONDS: u64 = 15;
pub const MIN_TIME_LIMIT_SECONDS: u64 = 1;
pub const MAX_TIME_LIMIT_SECONDS: u64 = 120;

impl InputDocument {
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(RosterError::Json)
    }

    /// Lowers the raw document into a validated [`Context`]. Rejects
    /// `fixedRotationOffset=false` rather than silently solving for offsets
    /// (SPEC_FULL.md §9).
    pub fn into_context(self) -> Result<Context> {
        if self.planning_horizon.end_date < self.planning_horizon.start_date {
            return Err(RosterError::Input(
                "planningHorizon.endDate precedes startDate".into(),
            ));
        }
        if self.fixed_rotation_offset == Some(false) {
            return Err(RosterError::Input(
                "fixedRotationOffset=false requests offset optimisation, which this engine does not support; supply input-fixed rotationOffset values instead".into(),
            ));
        }

        let time_limit_seconds = self
            .time_limit
            .unwrap_or(DEFAULT_TIME_LIMIT_SECONDS)
            .clamp(MIN_TIME_LIMIT_SECONDS, MAX_TIME_LIMIT_SECONDS);

        Ok(Context {
            planning_reference: self
                .planning_reference
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            horizon: self.planning_horizon,
            public_holidays: self.public_holidays.into_iter().collect(),
            employees: self.employees,
            demand_items: self.demand_items,
            time_limit_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_days_count_maps_first_n_weekdays() {
        let cd = CoverageDays::Count(5);
        let days = cd.weekdays();
        assert!(days.contains(&Weekday::Mon));
        assert!(days.contains(&Weekday::Fri));
        assert!(!days.contains(&Weekday::Sat));
    }

    #[test]
    fn coverage_days_names_parsed() {
        let cd = CoverageDays::Names(vec!["Mon".into(), "Wed".into(), "Fri".into()]);
        let days = cd.weekdays();
        assert_eq!(days.len(), 3);
        assert!(days.contains(&Weekday::Wed));
    }

    #[test]
    fn fixed_rotation_offset_false_is_rejected() {
        let doc = InputDocument {
            schema_version: None,
            planning_reference: None,
            planning_horizon: PlanningHorizon {
                start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 1, 7).unwrap(),
            },
            public_holidays: vec![],
            employees: vec![],
            demand_items: vec![],
            solver_score_config: None,
            time_limit: None,
            fixed_rotation_offset: Some(false),
        };
        assert!(doc.into_context().is_err());
    }
}
