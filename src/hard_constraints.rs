//! Component E: hard rule families C1-C17 (C13 dropped — see DESIGN.md).
//!
//! C1, C7, C8, C9 (M/F), C11, C12, C15 are pre-filters baked into
//! `candidates.rs` (daily cap, qualification holding, provisional expiry,
//! single-gender requirement, rank match, `preferredTeams` membership, and
//! expiry override): the cheapest way to enforce "var must be 0" in a MILP
//! is to never create the variable. C10 keys off a `requiredSkills` slot
//! attribute this schema doesn't carry and is inert, as in the source it's
//! grounded on. What's left here needs to reason across more than one
//! (slot, employee) pair at a time — rolling windows, pairwise time
//! conflicts, per-group sums — so it has to live at the model level as
//! linear constraints.

use chrono::{Datelike, NaiveDate};
use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, Variable};
use std::collections::HashMap;

use crate::domain::{Employee, Gender, GenderRequirement, Slot};
use crate::time::split_shift_hours;

pub type VarMap = HashMap<(usize, usize), Variable>;
pub type DayWorkedMap = HashMap<(usize, NaiveDate), Variable>;

const REST_MINUTES: i64 = 480;
const TRAVEL_MINUTES: i64 = 30;
const MAX_CONSECUTIVE_DAYS: usize = 12;
const MIN_OFFDAYS_WINDOW: i64 = 7;
const MAX_WORKDAYS_IN_OFFDAY_WINDOW: usize = 6;
const WEEKLY_NORMAL_CAP: f64 = 44.0;
const MONTHLY_OT_CAP: f64 = 72.0;
const PARTTIME_LIGHT_WEEK_CAP: f64 = 34.98;
const PARTTIME_HEAVY_WEEK_CAP: f64 = 29.98;
const BIG_M_DAYS: f64 = 10.0;
const BIG_M_HOURS: f64 = 200.0;

/// C5 shares its day-worked indicators with C3 and C6: one binary var per
/// (employee, date) that's 1 iff that employee has any slot assigned that
/// day, channelled both ways so the solver can't cheat either direction.
pub fn build_day_worked(
    vars: &mut ProblemVariables,
    slots: &[Slot],
    employees: &[Employee],
    x: &VarMap,
) -> (DayWorkedMap, Vec<Constraint>) {
    let mut by_emp_date: HashMap<(usize, NaiveDate), Vec<Variable>> = HashMap::new();
    for (si, slot) in slots.iter().enumerate() {
        for ei in 0..employees.len() {
            if let Some(&v) = x.get(&(si, ei)) {
                by_emp_date.entry((ei, slot.date)).or_default().push(v);
            }
        }
    }

    let mut day_vars = HashMap::new();
    let mut constraints = Vec::new();
    for ((ei, date), slot_vars) in by_emp_date {
        let day_var = vars.add(variable().binary().name(format!("day_worked_{ei}_{date}")));
        for &sv in &slot_vars {
            constraints.push(constraint!(day_var >= sv));
        }
        let sum: Expression = slot_vars.into_iter().sum();
        constraints.push(constraint!(sum >= day_var));
        day_vars.insert((ei, date), day_var);
    }
    (day_vars, constraints)
}

fn rolling_windows(dates: &[NaiveDate], window_len: i64) -> Vec<&[NaiveDate]> {
    let window_len = window_len as usize;
    if dates.len() < window_len {
        return Vec::new();
    }
    (0..=dates.len() - window_len)
        .map(|start| &dates[start..start + window_len])
        .filter(|w| (w[w.len() - 1] - w[0]).num_days() == window_len as i64 - 1)
        .collect()
}

/// C3: at most 12 working days in any rolling 13 calendar-day window.
pub fn c3_max_consecutive_days(employees: &[Employee], day_vars: &DayWorkedMap) -> Vec<Constraint> {
    let mut dates: Vec<NaiveDate> = day_vars.keys().map(|(_, d)| *d).collect();
    dates.sort();
    dates.dedup();

    let mut constraints = Vec::new();
    for window in rolling_windows(&dates, MAX_CONSECUTIVE_DAYS as i64 + 1) {
        for ei in 0..employees.len() {
            let vars_in_window: Vec<Variable> = window
                .iter()
                .filter_map(|d| day_vars.get(&(ei, *d)).copied())
                .collect();
            if vars_in_window.len() > MAX_CONSECUTIVE_DAYS {
                let sum: Expression = vars_in_window.into_iter().sum();
                constraints.push(constraint!(sum <= MAX_CONSECUTIVE_DAYS as f64));
            }
        }
    }
    constraints
}

/// C5: at least 1 day off in any rolling 7 calendar-day window.
pub fn c5_min_offday_per_week(employees: &[Employee], day_vars: &DayWorkedMap) -> Vec<Constraint> {
    let mut dates: Vec<NaiveDate> = day_vars.keys().map(|(_, d)| *d).collect();
    dates.sort();
    dates.dedup();

    let mut constraints = Vec::new();
    for window in rolling_windows(&dates, MIN_OFFDAYS_WINDOW) {
        for ei in 0..employees.len() {
            let vars_in_window: Vec<Variable> = window
                .iter()
                .filter_map(|d| day_vars.get(&(ei, *d)).copied())
                .collect();
            if vars_in_window.len() >= MIN_OFFDAYS_WINDOW as usize {
                let sum: Expression = vars_in_window.into_iter().sum();
                constraints.push(constraint!(sum <= MAX_WORKDAYS_IN_OFFDAY_WINDOW as f64));
            }
        }
    }
    constraints
}

/// C2: weekly normal (non-OT, non-lunch) hours capped at 44h per ISO week.
pub fn c2_weekly_normal_cap(slots: &[Slot], employees: &[Employee], x: &VarMap) -> Vec<Constraint> {
    let mut by_emp_week: HashMap<(usize, i32, u32), Vec<(Variable, f64)>> = HashMap::new();
    for (si, slot) in slots.iter().enumerate() {
        let normal = split_shift_hours(slot.start, slot.end).normal;
        if normal <= 0.0 {
            continue;
        }
        let iso = slot.date.iso_week();
        for ei in 0..employees.len() {
            if let Some(&v) = x.get(&(si, ei)) {
                by_emp_week
                    .entry((ei, iso.year(), iso.week()))
                    .or_default()
                    .push((v, normal));
            }
        }
    }
    by_emp_week
        .into_values()
        .map(|terms| {
            let expr: Expression = terms.into_iter().map(|(v, h)| v * h).sum();
            constraint!(expr <= WEEKLY_NORMAL_CAP)
        })
        .collect()
}

/// C17: monthly OT hours capped at 72h per calendar month.
pub fn c17_monthly_ot_cap(slots: &[Slot], employees: &[Employee], x: &VarMap) -> Vec<Constraint> {
    let mut by_emp_month: HashMap<(usize, i32, u32), Vec<(Variable, f64)>> = HashMap::new();
    for (si, slot) in slots.iter().enumerate() {
        let ot = split_shift_hours(slot.start, slot.end).ot;
        if ot <= 0.0 {
            continue;
        }
        for ei in 0..employees.len() {
            if let Some(&v) = x.get(&(si, ei)) {
                by_emp_month
                    .entry((ei, slot.date.year(), slot.date.month()))
                    .or_default()
                    .push((v, ot));
            }
        }
    }
    by_emp_month
        .into_values()
        .map(|terms| {
            let expr: Expression = terms.into_iter().map(|(v, h)| v * h).sum();
            constraint!(expr <= MONTHLY_OT_CAP)
        })
        .collect()
}

/// C6: Scheme P (part-time) employees get a two-tier weekly cap — 34.98h if
/// working 4 days or fewer that week, 29.98h otherwise. Modelled with a
/// per-employee-week binary `is_light` and a standard big-M indicator pair,
/// rather than CP-SAT's `OnlyEnforceIf`, which `good_lp`'s LP/MILP backends
/// don't expose.
pub fn c6_parttimer_weekly_cap(
    vars: &mut ProblemVariables,
    slots: &[Slot],
    employees: &[Employee],
    x: &VarMap,
    day_vars: &DayWorkedMap,
) -> Vec<Constraint> {
    let mut constraints = Vec::new();

    let mut by_emp_week: HashMap<(usize, i32, u32), Vec<(Variable, f64)>> = HashMap::new();
    let mut weeks_per_emp: HashMap<usize, std::collections::HashSet<(i32, u32)>> = HashMap::new();
    for (si, slot) in slots.iter().enumerate() {
        let gross = split_shift_hours(slot.start, slot.end).gross;
        let iso = slot.date.iso_week();
        for (ei, employee) in employees.iter().enumerate() {
            if employee.scheme != crate::domain::Scheme::P {
                continue;
            }
            if let Some(&v) = x.get(&(si, ei)) {
                by_emp_week
                    .entry((ei, iso.year(), iso.week()))
                    .or_default()
                    .push((v, gross));
                weeks_per_emp
                    .entry(ei)
                    .or_default()
                    .insert((iso.year(), iso.week()));
            }
        }
    }

    for ((ei, year, week), hour_terms) in by_emp_week {
        let days_this_week: Vec<Variable> = day_vars
            .iter()
            .filter(|((e, d), _)| *e == ei && d.iso_week().year() == year && d.iso_week().week() == week)
            .map(|(_, v)| *v)
            .collect();
        if days_this_week.is_empty() {
            continue;
        }

        let is_light = vars.add(
            variable()
                .binary()
                .name(format!("parttime_light_{ei}_{year}w{week}")),
        );
        let days_expr: Expression = days_this_week.into_iter().sum();
        constraints.push(constraint!(
            days_expr.clone() <= 4.0 + BIG_M_DAYS * (1.0 - is_light)
        ));
        constraints.push(constraint!(days_expr >= 5.0 * (1.0 - is_light)));

        let hours_expr: Expression = hour_terms.into_iter().map(|(v, h)| v * h).sum();
        constraints.push(constraint!(
            hours_expr.clone() <= PARTTIME_LIGHT_WEEK_CAP + BIG_M_HOURS * (1.0 - is_light)
        ));
        constraints.push(constraint!(
            hours_expr <= PARTTIME_HEAVY_WEEK_CAP + BIG_M_HOURS * is_light
        ));
    }
    constraints
}

fn pairwise_disjunctive<F>(slots: &[Slot], employees: &[Employee], x: &VarMap, conflicts: F) -> Vec<Constraint>
where
    F: Fn(&Slot, &Slot) -> bool,
{
    let mut constraints = Vec::new();
    for ei in 0..employees.len() {
        let mut emp_slots: Vec<(usize, &Slot)> = slots
            .iter()
            .enumerate()
            .filter(|(si, _)| x.contains_key(&(*si, ei)))
            .collect();
        emp_slots.sort_by_key(|(_, s)| (s.date, s.end));

        for i in 0..emp_slots.len() {
            for j in (i + 1)..emp_slots.len() {
                let (si1, s1) = emp_slots[i];
                let (si2, s2) = emp_slots[j];
                if conflicts(s1, s2) {
                    let v1 = x[&(si1, ei)];
                    let v2 = x[&(si2, ei)];
                    constraints.push(constraint!(v1 + v2 <= 1));
                }
            }
        }
    }
    constraints
}

/// C4: at least 8h rest between any two shifts worked by the same employee.
pub fn c4_rest_period(slots: &[Slot], employees: &[Employee], x: &VarMap) -> Vec<Constraint> {
    pairwise_disjunctive(slots, employees, x, |s1, s2| {
        s2.start >= s1.end && (s2.start - s1.end).num_minutes() < REST_MINUTES
    })
}

/// C14: at least 30 minutes between shifts at different sites, same day.
pub fn c14_travel_time(slots: &[Slot], employees: &[Employee], x: &VarMap) -> Vec<Constraint> {
    pairwise_disjunctive(slots, employees, x, |s1, s2| {
        s1.date == s2.date
            && s1.location_id != s2.location_id
            && s2.start >= s1.end
            && (s2.start - s1.end).num_minutes() < TRAVEL_MINUTES
    })
}

/// C16: no employee may hold two time-overlapping shifts.
pub fn c16_no_overlap(slots: &[Slot], employees: &[Employee], x: &VarMap) -> Vec<Constraint> {
    pairwise_disjunctive(slots, employees, x, |s1, s2| s1.overlaps(s2))
}

/// C9 (Mix half): slots requiring a gender mix must draw at least one male
/// and one female from the same (date, demand, requirement) group. The M/F
/// single-gender half of C9 is a candidate pre-filter, not a model constraint.
pub fn c9_gender_mix(slots: &[Slot], employees: &[Employee], x: &VarMap) -> Vec<Constraint> {
    let mut groups: HashMap<(NaiveDate, &str, &str), Vec<usize>> = HashMap::new();
    for (si, slot) in slots.iter().enumerate() {
        if slot.gender_requirement == GenderRequirement::Mix {
            groups
                .entry((slot.date, &slot.demand_id, &slot.requirement_id))
                .or_default()
                .push(si);
        }
    }

    let mut constraints = Vec::new();
    for slot_indices in groups.into_values() {
        if slot_indices.len() < 2 {
            continue;
        }
        let mut male_vars = Vec::new();
        let mut female_vars = Vec::new();
        for si in slot_indices {
            for (ei, employee) in employees.iter().enumerate() {
                if let Some(&v) = x.get(&(si, ei)) {
                    match employee.gender {
                        Gender::M => male_vars.push(v),
                        Gender::F => female_vars.push(v),
                        Gender::U => {}
                    }
                }
            }
        }
        if !male_vars.is_empty() && !female_vars.is_empty() {
            let male_sum: Expression = male_vars.into_iter().sum();
            let female_sum: Expression = female_vars.into_iter().sum();
            constraints.push(constraint!(male_sum >= 1));
            constraints.push(constraint!(female_sum >= 1));
        }
    }
    constraints
}
