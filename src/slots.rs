//! Component B: slot expansion.
//!
//! Turns demand items + requirements into the atomic `Slot`s the solver
//! assigns employees to. One slot per (requirement, shift code, calendar
//! day, headcount position). Deterministic: no random suffix on `slot_id`,
//! unlike the source this is grounded on.

use chrono::{Datelike, NaiveDate, NaiveTime};
use std::collections::HashSet;

use crate::domain::Slot;
use crate::input::{Context, DemandItem, Requirement, ShiftDetail, ShiftGroup};

/// Shift codes actually worked in a rotation sequence, in first-seen order,
/// with `"O"` (day off — never has its own slot) excluded.
fn rotation_shift_codes(work_pattern: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut codes = Vec::new();
    for code in work_pattern {
        if code == "O" {
            continue;
        }
        if seen.insert(code.clone()) {
            codes.push(code.clone());
        }
    }
    codes
}

fn day_is_covered(
    date: NaiveDate,
    weekdays: &HashSet<chrono::Weekday>,
    public_holidays: &HashSet<NaiveDate>,
    shift_group: &ShiftGroup,
) -> bool {
    if !weekdays.contains(&date.weekday()) {
        return false;
    }
    if !shift_group.include_public_holidays && public_holidays.contains(&date) {
        return false;
    }
    if !shift_group.include_eve_of_public_holidays {
        if let Some(next) = date.succ_opt() {
            if public_holidays.contains(&next) {
                return false;
            }
        }
    }
    true
}

fn parse_hm(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

/// Combines a calendar day with a shift detail's start/end clock times,
/// rolling `end` to the next day whenever the shift crosses midnight
/// (`nextDay` flag set, or `end <= start`).
fn shift_span(date: NaiveDate, detail: &ShiftDetail) -> Option<(chrono::NaiveDateTime, chrono::NaiveDateTime)> {
    let start_t = parse_hm(&detail.start)?;
    let end_t = parse_hm(&detail.end)?;
    let start = date.and_time(start_t);
    let end_date = if detail.next_day || end_t <= start_t {
        date.succ_opt()?
    } else {
        date
    };
    let end = end_date.and_time(end_t);
    Some((start, end))
}

fn build_slots_for_requirement(
    demand: &DemandItem,
    shift_group: &ShiftGroup,
    requirement: &Requirement,
    ctx: &Context,
    out: &mut Vec<Slot>,
) {
    let anchor = shift_group.coverage_anchor.unwrap_or(demand.shift_start_date);
    let weekdays = shift_group.coverage_days.weekdays();
    let codes = rotation_shift_codes(&requirement.work_pattern);

    for code in &codes {
        let Some(detail) = shift_group
            .shift_details
            .iter()
            .find(|d| &d.shift_code == code)
        else {
            tracing::warn!(
                demand_id = %demand.demand_id,
                requirement_id = %requirement.requirement_id,
                shift_code = %code,
                "rotation references a shift code with no matching shiftDetail; skipping"
            );
            continue;
        };

        let mut date = ctx.horizon.start_date.max(demand.shift_start_date);
        while date <= ctx.horizon.end_date {
            if day_is_covered(date, &weekdays, &ctx.public_holidays, shift_group) {
                if let Some((start, end)) = shift_span(date, detail) {
                    for position in 0..requirement.headcount {
                        out.push(Slot {
                            slot_id: format!(
                                "{}-{}-{}-P{}-{}",
                                demand.demand_id, requirement.requirement_id, code, position, date
                            ),
                            demand_id: demand.demand_id.clone(),
                            requirement_id: requirement.requirement_id.clone(),
                            date,
                            shift_code: code.clone(),
                            start,
                            end,
                            location_id: demand.location_id.clone(),
                            ou_id: demand.ou_id.clone(),
                            product_type_id: requirement.product_type_id.clone(),
                            rank_id: requirement.rank_id,
                            gender_requirement: requirement.gender,
                            scheme_requirement: requirement.scheme,
                            required_qualifications: requirement.required_qualifications.clone(),
                            rotation_sequence: requirement.work_pattern.clone(),
                            coverage_anchor: anchor,
                            preferred_teams: shift_group.preferred_teams.clone(),
                            whitelist: shift_group.whitelist.clone(),
                            blacklist: shift_group.blacklist.clone(),
                            position,
                        });
                    }
                }
            }
            date = match date.succ_opt() {
                Some(d) => d,
                None => break,
            };
        }
    }
}

/// Expands every demand item's shift groups x requirements into slots
/// spanning the planning horizon. Order is demand-item order, then
/// shift-group order, then requirement order, then date order, then
/// position order — stable across runs given the same input.
pub fn build_slots(ctx: &Context) -> Vec<Slot> {
    let mut slots = Vec::new();
    for demand in &ctx.demand_items {
        for shift_group in &demand.shifts {
            for requirement in &demand.requirements {
                build_slots_for_requirement(demand, shift_group, requirement, ctx, &mut slots);
            }
        }
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GenderRequirement, Rank, SchemeRequirement, Whitelist, Blacklist};
    use crate::input::{CoverageDays, PlanningHorizon};

    fn ctx_with(demand: DemandItem, start: NaiveDate, end: NaiveDate) -> Context {
        Context {
            planning_reference: "T".into(),
            horizon: PlanningHorizon {
                start_date: start,
                end_date: end,
            },
            public_holidays: HashSet::new(),
            employees: vec![],
            demand_items: vec![demand],
            time_limit_seconds: 15,
        }
    }

    fn sample_demand() -> DemandItem {
        DemandItem {
            demand_id: "D1".into(),
            location_id: "L1".into(),
            ou_id: "OU1".into(),
            shift_start_date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            shifts: vec![ShiftGroup {
                shift_details: vec![
                    ShiftDetail {
                        shift_code: "D".into(),
                        start: "07:00".into(),
                        end: "19:00".into(),
                        next_day: false,
                    },
                    ShiftDetail {
                        shift_code: "N".into(),
                        start: "19:00".into(),
                        end: "07:00".into(),
                        next_day: false,
                    },
                ],
                coverage_days: CoverageDays::Count(7),
                coverage_anchor: Some(NaiveDate::from_ymd_opt(2025, 12, 1).unwrap()),
                include_public_holidays: true,
                include_eve_of_public_holidays: true,
                preferred_teams: vec![],
                whitelist: Whitelist::default(),
                blacklist: Blacklist::default(),
            }],
            requirements: vec![Requirement {
                requirement_id: "R1".into(),
                product_type_id: "PT1".into(),
                rank_id: Rank::Avso,
                headcount: 2,
                gender: GenderRequirement::Any,
                scheme: SchemeRequirement::Global,
                required_qualifications: vec![],
                work_pattern: vec!["D".into(), "D".into(), "N".into(), "N".into(), "O".into(), "O".into()],
            }],
        }
    }

    #[test]
    fn no_slots_created_for_off_days() {
        let demand = sample_demand();
        let ctx = ctx_with(
            demand,
            NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 7).unwrap(),
        );
        let slots = build_slots(&ctx);
        // Two shift codes (D, N) x headcount 2 x 7 days = 28 slots, "O" excluded.
        assert_eq!(slots.len(), 28);
        assert!(slots.iter().all(|s| s.shift_code != "O"));
    }

    #[test]
    fn overnight_shift_rolls_to_next_day() {
        let demand = sample_demand();
        let ctx = ctx_with(
            demand,
            NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
        );
        let slots = build_slots(&ctx);
        let night = slots.iter().find(|s| s.shift_code == "N").unwrap();
        assert_eq!(night.end.date(), NaiveDate::from_ymd_opt(2025, 12, 2).unwrap());
    }

    #[test]
    fn slot_id_is_deterministic() {
        let demand = sample_demand();
        let ctx = ctx_with(
            demand,
            NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
        );
        let first = build_slots(&ctx);
        let second = build_slots(&ctx);
        assert_eq!(
            first.iter().map(|s| &s.slot_id).collect::<Vec<_>>(),
            second.iter().map(|s| &s.slot_id).collect::<Vec<_>>()
        );
        assert!(first[0].slot_id.starts_with("D1-R1-D-P0-2025-12-01"));
    }
}
