//! Component H: post-solve validator.
//!
//! Independent of the model: walks the final assignment list and re-derives
//! every hard rule by arithmetic on the assignments alone, the way
//! `original_source/context/engine/solver_engine.py::calculate_scores` does.
//! Never trusts `model.rs`'s bookkeeping — a modelling bug that silently
//! satisfies a constraint variable without satisfying the rule it stands for
//! should still show up here.

use std::collections::HashMap;

use chrono::Datelike;

use crate::domain::{Employee, Slot};
use crate::soft_constraints::{self, SoftViolation};
use crate::time::split_shift_hours;

const MAX_CONSECUTIVE_DAYS: usize = 12;
const MIN_OFFDAYS_WINDOW: i64 = 7;
const MAX_WORKDAYS_IN_OFFDAY_WINDOW: usize = 6;
const WEEKLY_NORMAL_CAP: f64 = 44.0;
const MONTHLY_OT_CAP: f64 = 72.0;
const PARTTIME_LIGHT_WEEK_CAP: f64 = 34.98;
const PARTTIME_HEAVY_WEEK_CAP: f64 = 29.98;
const REST_MINUTES: i64 = 480;
const TRAVEL_MINUTES: i64 = 30;

#[derive(Debug, Clone, serde::Serialize)]
pub struct HardViolation {
    pub rule: &'static str,
    pub employee_id: Option<String>,
    pub note: String,
}

fn hv(rule: &'static str, employee_id: &str, note: impl Into<String>) -> HardViolation {
    HardViolation {
        rule,
        employee_id: Some(employee_id.to_string()),
        note: note.into(),
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct EmployeeHours {
    /// ISO (year, week) -> normal hours worked.
    pub weekly_normal: HashMap<String, f64>,
    /// Calendar (year, month) -> OT hours worked.
    pub monthly_ot: HashMap<String, f64>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct UnassignedSlotNote {
    pub slot_id: String,
    pub demand_id: String,
    pub requirement_id: String,
    pub date: chrono::NaiveDate,
    /// Best-guess reason this slot couldn't be filled. Advisory only.
    pub reason: String,
}

pub struct ValidationReport {
    pub hard: usize,
    pub soft: usize,
    pub hard_violations: Vec<HardViolation>,
    pub soft_violations: Vec<SoftViolation>,
    pub unassigned_slots: Vec<UnassignedSlotNote>,
    pub employee_hours: HashMap<String, EmployeeHours>,
}

fn employee_index(employees: &[Employee], id: &str) -> Option<usize> {
    employees.iter().position(|e| e.employee_id == id)
}

/// Per-employee-per-day slot list, built straight from the assignment
/// (slot_id -> employee_id), not from the model's decision variables.
fn assignments_by_employee<'a>(
    slots: &'a [Slot],
    employees: &'a [Employee],
    assigned: &HashMap<&str, &str>,
) -> HashMap<usize, Vec<&'a Slot>> {
    let mut by_emp: HashMap<usize, Vec<&Slot>> = HashMap::new();
    for slot in slots {
        let Some(&emp_id) = assigned.get(slot.slot_id.as_str()) else { continue };
        let Some(ei) = employee_index(employees, emp_id) else { continue };
        by_emp.entry(ei).or_default().push(slot);
    }
    for v in by_emp.values_mut() {
        v.sort_by_key(|s| (s.date, s.start));
    }
    by_emp
}

fn rolling_windows(dates: &[chrono::NaiveDate], window_len: i64) -> Vec<(chrono::NaiveDate, chrono::NaiveDate)> {
    let window_len = window_len as usize;
    if dates.len() < window_len {
        return Vec::new();
    }
    (0..=dates.len() - window_len)
        .map(|start| (dates[start], dates[start + window_len - 1]))
        .filter(|(first, last)| (*last - *first).num_days() == window_len as i64 - 1)
        .collect()
}

/// C3 + C5: at most 12 working days in any rolling 13-day window, and at
/// least 1 day off in any rolling 7-day window.
fn check_rolling_windows(by_emp: &HashMap<usize, Vec<&Slot>>, employees: &[Employee]) -> Vec<HardViolation> {
    let mut out = Vec::new();
    for (&ei, emp_slots) in by_emp {
        let mut days: Vec<chrono::NaiveDate> = emp_slots.iter().map(|s| s.date).collect();
        days.sort();
        days.dedup();

        for (first, last) in rolling_windows(&days, MAX_CONSECUTIVE_DAYS as i64 + 1) {
            let worked = days.iter().filter(|d| **d >= first && **d <= last).count();
            if worked > MAX_CONSECUTIVE_DAYS {
                out.push(hv(
                    "C3",
                    &employees[ei].employee_id,
                    format!("{worked} working days between {first} and {last} (cap {MAX_CONSECUTIVE_DAYS})"),
                ));
            }
        }
        for (first, last) in rolling_windows(&days, MIN_OFFDAYS_WINDOW) {
            let worked = days.iter().filter(|d| **d >= first && **d <= last).count();
            if worked > MAX_WORKDAYS_IN_OFFDAY_WINDOW {
                out.push(hv(
                    "C5",
                    &employees[ei].employee_id,
                    format!("no day off between {first} and {last} ({worked} days worked)"),
                ));
            }
        }
    }
    out
}

/// C2 + C17 + C6: weekly normal cap, monthly OT cap, part-timer two-tier
/// weekly cap. Also fills in the `employeeHours` aggregate the output
/// document reads verbatim, so these hour sums are computed exactly once.
fn check_hour_caps(
    by_emp: &HashMap<usize, Vec<&Slot>>,
    employees: &[Employee],
) -> (Vec<HardViolation>, HashMap<String, EmployeeHours>) {
    let mut violations = Vec::new();
    let mut hours: HashMap<String, EmployeeHours> = HashMap::new();

    for (&ei, emp_slots) in by_emp {
        let employee = &employees[ei];
        let entry = hours.entry(employee.employee_id.clone()).or_default();

        let mut weekly_normal: HashMap<(i32, u32), f64> = HashMap::new();
        let mut monthly_ot: HashMap<(i32, u32), f64> = HashMap::new();
        let mut weekly_gross: HashMap<(i32, u32), f64> = HashMap::new();
        let mut days_per_week: HashMap<(i32, u32), std::collections::HashSet<chrono::NaiveDate>> = HashMap::new();

        for slot in emp_slots {
            let breakdown = split_shift_hours(slot.start, slot.end);
            let iso = slot.date.iso_week();
            let week_key = (iso.year(), iso.week());
            let month_key = (slot.date.year(), slot.date.month());
            *weekly_normal.entry(week_key).or_insert(0.0) += breakdown.normal;
            *weekly_gross.entry(week_key).or_insert(0.0) += breakdown.gross;
            *monthly_ot.entry(month_key).or_insert(0.0) += breakdown.ot;
            days_per_week.entry(week_key).or_default().insert(slot.date);
        }

        for (&(year, week), &total) in &weekly_normal {
            entry.weekly_normal.insert(format!("{year}-W{week:02}"), total);
            if total > WEEKLY_NORMAL_CAP {
                violations.push(hv(
                    "C2",
                    &employee.employee_id,
                    format!("{total:.2}h normal hours in ISO week {year}-W{week:02} (cap {WEEKLY_NORMAL_CAP})"),
                ));
            }
        }
        for (&(year, month), &total) in &monthly_ot {
            entry.monthly_ot.insert(format!("{year}-{month:02}"), total);
            if total > MONTHLY_OT_CAP {
                violations.push(hv(
                    "C17",
                    &employee.employee_id,
                    format!("{total:.2}h OT in {year}-{month:02} (cap {MONTHLY_OT_CAP})"),
                ));
            }
        }

        if employee.scheme == crate::domain::Scheme::P {
            for (&(year, week), &gross) in &weekly_gross {
                let worked_days = days_per_week.get(&(year, week)).map(|s| s.len()).unwrap_or(0);
                let cap = if worked_days <= 4 {
                    PARTTIME_LIGHT_WEEK_CAP
                } else {
                    PARTTIME_HEAVY_WEEK_CAP
                };
                if gross > cap {
                    violations.push(hv(
                        "C6",
                        &employee.employee_id,
                        format!(
                            "{gross:.2}h gross in ISO week {year}-W{week:02} ({worked_days} days worked, cap {cap})"
                        ),
                    ));
                }
            }
        }
    }
    (violations, hours)
}

/// C4 + C14 + C16: rest period, inter-site travel buffer, and no
/// time-overlapping shifts, re-checked pairwise per employee.
fn check_pairwise(by_emp: &HashMap<usize, Vec<&Slot>>, employees: &[Employee]) -> Vec<HardViolation> {
    let mut out = Vec::new();
    for (&ei, emp_slots) in by_emp {
        for pair in emp_slots.windows(2) {
            let (s1, s2) = (pair[0], pair[1]);
            if s1.overlaps(s2) {
                out.push(hv(
                    "C16",
                    &employees[ei].employee_id,
                    format!("{} overlaps {}", s1.slot_id, s2.slot_id),
                ));
                continue;
            }
            if s2.start < s1.end {
                continue;
            }
            let gap_minutes = (s2.start - s1.end).num_minutes();
            if gap_minutes < REST_MINUTES {
                out.push(hv(
                    "C4",
                    &employees[ei].employee_id,
                    format!("{gap_minutes} min rest between {} and {}", s1.slot_id, s2.slot_id),
                ));
            } else if s1.date == s2.date && s1.location_id != s2.location_id && gap_minutes < TRAVEL_MINUTES {
                out.push(hv(
                    "C14",
                    &employees[ei].employee_id,
                    format!("{gap_minutes} min travel buffer between {} and {}", s1.slot_id, s2.slot_id),
                ));
            }
        }
    }
    out
}

/// C1 (daily cap), C7/C8/C15 (licence validity), C11 (rank match), C12
/// (`preferredTeams` membership): re-checked per assigned (slot, employee)
/// pair, independent of the candidate filter that was supposed to have
/// ruled these out already. C10 keys off a `requiredSkills` slot attribute
/// this schema doesn't carry, so it has nothing to re-derive here.
fn check_eligibility(slots: &[Slot], employees: &[Employee], assigned: &HashMap<&str, &str>) -> Vec<HardViolation> {
    let mut out = Vec::new();
    for slot in slots {
        let Some(&emp_id) = assigned.get(slot.slot_id.as_str()) else { continue };
        let Some(ei) = employee_index(employees, emp_id) else { continue };
        let employee = &employees[ei];

        let gross = split_shift_hours(slot.start, slot.end).gross;
        if gross > employee.scheme.daily_cap_hours() {
            out.push(hv(
                "C1",
                &employee.employee_id,
                format!("{gross:.2}h shift exceeds scheme cap {}", employee.scheme.daily_cap_hours()),
            ));
        }
        if employee.rank_id != slot.rank_id {
            out.push(hv(
                "C11",
                &employee.employee_id,
                format!("rank {:?} assigned to slot requiring {:?}", employee.rank_id, slot.rank_id),
            ));
        }
        if !slot.preferred_teams.is_empty() && !slot.preferred_teams.contains(&employee.team_id) {
            out.push(hv(
                "C12",
                &employee.employee_id,
                format!("team {} not in slot's preferredTeams", employee.team_id),
            ));
        }
        for code in &slot.required_qualifications {
            let valid_license = employee.license(code).map(|l| l.is_valid_on(slot.date)).unwrap_or(false);
            if !valid_license {
                out.push(hv(
                    "C7",
                    &employee.employee_id,
                    format!("missing or expired licence {code} on {}", slot.date),
                ));
            }
        }
    }
    out
}

/// For an unassigned slot, a best-effort guess at why no one could fill it:
/// scans whether any employee even matches rank/scheme/product, without
/// re-running the full candidate filter. Advisory only, never load-bearing.
fn guess_unassigned_reason(slot: &Slot, employees: &[Employee]) -> String {
    if !employees.iter().any(|e| e.rank_id == slot.rank_id) {
        return format!("no employee holds rank {:?}", slot.rank_id);
    }
    if !employees
        .iter()
        .any(|e| e.rank_id == slot.rank_id && slot.scheme_requirement.accepts(e.scheme))
    {
        return "no rank-matching employee satisfies the scheme requirement".to_string();
    }
    if !slot.required_qualifications.is_empty()
        && !employees.iter().any(|e| {
            e.rank_id == slot.rank_id
                && slot
                    .required_qualifications
                    .iter()
                    .all(|c| e.license(c).map(|l| l.is_valid_on(slot.date)).unwrap_or(false))
        })
    {
        return "no rank-matching employee holds all required qualifications".to_string();
    }
    "no eligible employee was free on this date (rest period, cap, or rotation conflict)".to_string()
}

/// Runs the whole re-derivation pass. `assignments`: slot_id -> employee_id
/// for filled slots, exactly what `solver.rs::Assignment` produces.
pub fn validate(
    slots: &[Slot],
    employees: &[Employee],
    assignments: &[(String, Option<String>)],
    public_holidays: &std::collections::HashSet<chrono::NaiveDate>,
) -> ValidationReport {
    let assigned: HashMap<&str, &str> = assignments
        .iter()
        .filter_map(|(slot_id, emp_id)| emp_id.as_deref().map(|e| (slot_id.as_str(), e)))
        .collect();
    let assignment_indices: HashMap<usize, usize> = slots
        .iter()
        .enumerate()
        .filter_map(|(si, slot)| {
            let emp_id = assigned.get(slot.slot_id.as_str())?;
            employee_index(employees, emp_id).map(|ei| (si, ei))
        })
        .collect();

    let by_emp = assignments_by_employee(slots, employees, &assigned);

    let mut hard_violations = Vec::new();
    hard_violations.extend(check_rolling_windows(&by_emp, employees));
    let (hour_cap_violations, employee_hours) = check_hour_caps(&by_emp, employees);
    hard_violations.extend(hour_cap_violations);
    hard_violations.extend(check_pairwise(&by_emp, employees));
    hard_violations.extend(check_eligibility(slots, employees, &assigned));

    let unassigned_slots: Vec<UnassignedSlotNote> = slots
        .iter()
        .filter(|slot| !assigned.contains_key(slot.slot_id.as_str()))
        .map(|slot| UnassignedSlotNote {
            slot_id: slot.slot_id.clone(),
            demand_id: slot.demand_id.clone(),
            requirement_id: slot.requirement_id.clone(),
            date: slot.date,
            reason: guess_unassigned_reason(slot, employees),
        })
        .collect();

    let soft_violations = run_soft_rules(slots, employees, &assignment_indices, public_holidays);

    ValidationReport {
        hard: hard_violations.len() + unassigned_slots.len(),
        soft: soft_violations.len(),
        hard_violations,
        soft_violations,
        unassigned_slots,
        employee_hours,
    }
}

/// Each soft rule runs behind `catch_unwind`: a panicking rule is logged and
/// skipped rather than failing the whole validation pass (§7's per-rule
/// exception policy).
fn run_soft_rules(
    slots: &[Slot],
    employees: &[Employee],
    assignment: &HashMap<usize, usize>,
    public_holidays: &std::collections::HashSet<chrono::NaiveDate>,
) -> Vec<SoftViolation> {
    let slots_owned = slots.to_vec();
    let employees_owned = employees.to_vec();
    let assignment_owned = assignment.clone();
    let holidays_owned = public_holidays.clone();
    match std::panic::catch_unwind(move || {
        soft_constraints::evaluate_all(&slots_owned, &employees_owned, &assignment_owned, &holidays_owned)
    }) {
        Ok(violations) => violations,
        Err(_) => {
            tracing::error!("soft-rule evaluation panicked; continuing with no soft violations");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Blacklist, Gender, GenderRequirement, Rank, Scheme, SchemeRequirement, Whitelist,
    };
    use chrono::NaiveDate;

    fn employee(id: &str) -> Employee {
        Employee {
            employee_id: id.into(),
            rank_id: Rank::Avso,
            product_type_id: "PT1".into(),
            scheme: Scheme::A,
            gender: Gender::M,
            team_id: "T1".into(),
            organizational_unit: None,
            rotation_offset: 0,
            licenses: vec![],
            skills: Default::default(),
            preferences: None,
            unavailability: vec![],
        }
    }

    fn slot(id: &str, date: NaiveDate, start_h: u32, end_h: u32) -> Slot {
        Slot {
            slot_id: id.into(),
            demand_id: "D1".into(),
            requirement_id: "R1".into(),
            date,
            shift_code: "D".into(),
            start: date.and_hms_opt(start_h, 0, 0).unwrap(),
            end: date.and_hms_opt(end_h, 0, 0).unwrap(),
            location_id: "L1".into(),
            ou_id: "OU1".into(),
            product_type_id: "PT1".into(),
            rank_id: Rank::Avso,
            gender_requirement: GenderRequirement::Any,
            scheme_requirement: SchemeRequirement::Global,
            required_qualifications: vec![],
            rotation_sequence: vec!["D".into(), "O".into()],
            coverage_anchor: date,
            preferred_teams: vec![],
            whitelist: Whitelist::default(),
            blacklist: Blacklist::default(),
            position: 0,
        }
    }

    #[test]
    fn flags_overlapping_shifts_as_c16() {
        let d = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let slots = vec![slot("s1", d, 7, 19), slot("s2", d, 12, 20)];
        let employees = vec![employee("E1")];
        let assignments = vec![
            ("s1".to_string(), Some("E1".to_string())),
            ("s2".to_string(), Some("E1".to_string())),
        ];
        let report = validate(&slots, &employees, &assignments, &Default::default());
        assert!(report.hard_violations.iter().any(|v| v.rule == "C16"));
    }

    #[test]
    fn flags_insufficient_rest_as_c4() {
        let d = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let slots = vec![slot("s1", d, 7, 15), slot("s2", d, 17, 23)];
        let employees = vec![employee("E1")];
        let assignments = vec![
            ("s1".to_string(), Some("E1".to_string())),
            ("s2".to_string(), Some("E1".to_string())),
        ];
        let report = validate(&slots, &employees, &assignments, &Default::default());
        assert!(report.hard_violations.iter().any(|v| v.rule == "C4"));
    }

    #[test]
    fn unassigned_slot_gets_a_reason_and_counts_as_hard() {
        let d = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let mut s = slot("s1", d, 7, 19);
        s.rank_id = Rank::Cvso;
        let slots = vec![s];
        let employees = vec![employee("E1")];
        let assignments = vec![("s1".to_string(), None)];
        let report = validate(&slots, &employees, &assignments, &Default::default());
        assert_eq!(report.unassigned_slots.len(), 1);
        assert!(report.unassigned_slots[0].reason.contains("rank"));
        assert_eq!(report.hard, 1);
    }

    #[test]
    fn daily_cap_violation_flagged_as_c1() {
        let d = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        // 16h shift exceeds scheme A's 14h daily cap.
        let slots = vec![slot("s1", d, 6, 22)];
        let employees = vec![employee("E1")];
        let assignments = vec![("s1".to_string(), Some("E1".to_string()))];
        let report = validate(&slots, &employees, &assignments, &Default::default());
        assert!(report.hard_violations.iter().any(|v| v.rule == "C1"));
    }

    #[test]
    fn team_outside_preferred_teams_flagged_as_c12() {
        let d = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let mut s = slot("s1", d, 7, 19);
        s.preferred_teams = vec!["OTHER_TEAM".into()];
        let slots = vec![s];
        let employees = vec![employee("E1")];
        let assignments = vec![("s1".to_string(), Some("E1".to_string()))];
        let report = validate(&slots, &employees, &assignments, &Default::default());
        assert!(report.hard_violations.iter().any(|v| v.rule == "C12"));
    }
}
