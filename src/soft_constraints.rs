//! Component F: soft rule families S1-S16.
//!
//! None of these touch the model — every one is a pure post-solve scoring
//! pass over the final assignment, exactly as the source registers `S*`
//! modules with a no-op `add_constraints` and does the real work in
//! `score_violations`. `validator.rs` calls these once per solve.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate, Weekday};

use crate::domain::{Employee, Slot};
use crate::time::span_hours;
use crate::time::split_shift_hours;

/// One soft-rule hit, tagged with the rule family it came from.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SoftViolation {
    pub rule: &'static str,
    pub slot_id: String,
    pub employee_id: Option<String>,
    pub detail: String,
}

fn v(rule: &'static str, slot_id: &str, employee_id: &str, detail: impl Into<String>) -> SoftViolation {
    SoftViolation {
        rule,
        slot_id: slot_id.to_string(),
        employee_id: Some(employee_id.to_string()),
        detail: detail.into(),
    }
}

/// `assignment`: slot index -> employee index, for slots that were filled.
/// `public_holidays`: the calendar's declared holiday dates, needed by S12's
/// allowance-shift classification.
pub fn evaluate_all(
    slots: &[Slot],
    employees: &[Employee],
    assignment: &HashMap<usize, usize>,
    public_holidays: &HashSet<NaiveDate>,
) -> Vec<SoftViolation> {
    let mut out = Vec::new();
    out.extend(s1_rotation_pattern(slots, employees, assignment));
    out.extend(s2_preferences(slots, employees, assignment));
    out.extend(s3_consistent_start(slots, employees, assignment));
    out.extend(s4_min_short_gaps(slots, employees, assignment));
    out.extend(s5_officer_continuity(slots, employees, assignment));
    out.extend(s6_minimize_team_changes(slots, employees, assignment));
    out.extend(s7_zone_preference(slots, employees, assignment));
    out.extend(s8_team_size_feasibility(slots, assignment));
    out.extend(s9_travel_slack(slots, employees, assignment));
    out.extend(s10_fair_ot(slots, employees, assignment));
    let holiday_indices: Vec<usize> = slots
        .iter()
        .enumerate()
        .filter(|(_, slot)| public_holidays.contains(&slot.date))
        .map(|(si, _)| si)
        .collect();
    let holiday_slots: Vec<Slot> = holiday_indices.iter().map(|&si| slots[si].clone()).collect();
    let old_to_new: HashMap<usize, usize> = holiday_indices.iter().enumerate().map(|(new_si, &old_si)| (old_si, new_si)).collect();
    let holiday_assignment: HashMap<usize, usize> = assignment
        .iter()
        .filter_map(|(&old_si, &ei)| old_to_new.get(&old_si).map(|&new_si| (new_si, ei)))
        .collect();
    out.extend(s11_public_holiday_coverage(&holiday_slots, &holiday_assignment));
    out.extend(s12_allowance_concentration(slots, employees, assignment, public_holidays));
    out.extend(s13_substitute_logic(slots, employees, assignment));
    out.extend(s14_midmonth_coverage(slots, assignment));
    out.extend(s15_demand_coverage_ratio(slots, assignment));
    out.extend(s16_whitelist_blacklist(slots, employees, assignment));
    out
}

fn assigned_pairs<'a>(
    slots: &'a [Slot],
    employees: &'a [Employee],
    assignment: &HashMap<usize, usize>,
) -> Vec<(&'a Slot, &'a Employee)> {
    assignment
        .iter()
        .map(|(&si, &ei)| (&slots[si], &employees[ei]))
        .collect()
}

/// S1: a slot's own shift code should match its requirement's rotation
/// sequence for that date (coverage days and rotation are independent
/// axes in `slots.rs`, so this can genuinely diverge — see
/// `Slot::violates_rotation`). Distinct from the hard, employee-specific
/// rotation gate in `candidates.rs::matches_rotation_pattern`: that one
/// asks "is today an 'on' day for this employee", this one asks "does the
/// slot that got filled match what the cycle called for on this date".
/// The same check also feeds the model objective's `rotationViolations`
/// term in `model.rs`; this is its independent post-solve re-derivation.
pub fn s1_rotation_pattern(
    slots: &[Slot],
    employees: &[Employee],
    assignment: &HashMap<usize, usize>,
) -> Vec<SoftViolation> {
    assigned_pairs(slots, employees, assignment)
        .into_iter()
        .filter(|(slot, _)| slot.violates_rotation())
        .map(|(slot, emp)| {
            v(
                "S1",
                &slot.slot_id,
                &emp.employee_id,
                format!("shift {} does not match rotation sequence for {}", slot.shift_code, slot.date),
            )
        })
        .collect()
}

/// S2: assignment lands on a site/zone/team/shift/OU the employee marked
/// unpreferred (one penalty per unpreferred-list match), or off a
/// non-empty preferred list (one penalty per preferred-list miss).
pub fn s2_preferences(
    slots: &[Slot],
    employees: &[Employee],
    assignment: &HashMap<usize, usize>,
) -> Vec<SoftViolation> {
    let mut out = Vec::new();
    for (slot, emp) in assigned_pairs(slots, employees, assignment) {
        let Some(prefs) = &emp.preferences else { continue };
        if prefs.unpreferred_sites.contains(&slot.location_id) {
            out.push(v("S2", &slot.slot_id, &emp.employee_id, "unpreferred site"));
        }
        if prefs.unpreferred_shifts.contains(&slot.shift_code) {
            out.push(v("S2", &slot.slot_id, &emp.employee_id, "unpreferred shift code"));
        }
        if prefs.unpreferred_ous.contains(&slot.ou_id) {
            out.push(v("S2", &slot.slot_id, &emp.employee_id, "unpreferred OU"));
        }
        if prefs.unpreferred_teams.contains(&emp.team_id) {
            out.push(v("S2", &slot.slot_id, &emp.employee_id, "unpreferred team"));
        }
        if !prefs.preferred_shifts.is_empty() && !prefs.preferred_shifts.contains(&slot.shift_code) {
            out.push(v("S2", &slot.slot_id, &emp.employee_id, "off preferred-shift list"));
        }
        if !prefs.preferred_teams.is_empty() && !prefs.preferred_teams.contains(&emp.team_id) {
            out.push(v("S2", &slot.slot_id, &emp.employee_id, "off preferred-team list"));
        }
        if !prefs.preferred_sites.is_empty() && !prefs.preferred_sites.contains(&slot.location_id) {
            out.push(v("S2", &slot.slot_id, &emp.employee_id, "off preferred-site list"));
        }
    }
    out
}

/// S3: an employee should work the same shift start time consistently.
pub fn s3_consistent_start(
    slots: &[Slot],
    employees: &[Employee],
    assignment: &HashMap<usize, usize>,
) -> Vec<SoftViolation> {
    let mut starts_by_emp: HashMap<usize, HashSet<chrono::NaiveTime>> = HashMap::new();
    for (&si, &ei) in assignment {
        starts_by_emp
            .entry(ei)
            .or_default()
            .insert(slots[si].start.time());
    }
    starts_by_emp
        .into_iter()
        .filter(|(_, starts)| starts.len() > 1)
        .map(|(ei, starts)| {
            v(
                "S3",
                "",
                &employees[ei].employee_id,
                format!("{} distinct start times across the horizon", starts.len()),
            )
        })
        .collect()
}

/// S4: soft echo of C4 — flag gaps under 8h that C4 happened not to forbid
/// (e.g. across an unassigned slot that freed up an otherwise-tight pair).
pub fn s4_min_short_gaps(
    slots: &[Slot],
    employees: &[Employee],
    assignment: &HashMap<usize, usize>,
) -> Vec<SoftViolation> {
    let mut by_emp: HashMap<usize, Vec<&Slot>> = HashMap::new();
    for (&si, &ei) in assignment {
        by_emp.entry(ei).or_default().push(&slots[si]);
    }
    let mut out = Vec::new();
    for (ei, mut emp_slots) in by_emp {
        emp_slots.sort_by_key(|s| (s.date, s.end));
        for pair in emp_slots.windows(2) {
            let (s1, s2) = (pair[0], pair[1]);
            if s2.start >= s1.end && (s2.start - s1.end).num_hours() < 8 {
                out.push(v(
                    "S4",
                    &s2.slot_id,
                    &employees[ei].employee_id,
                    "gap under 8h since previous shift",
                ));
            }
        }
    }
    out
}

/// S5: prefer the same officer at a demand on consecutive days.
pub fn s5_officer_continuity(
    slots: &[Slot],
    employees: &[Employee],
    assignment: &HashMap<usize, usize>,
) -> Vec<SoftViolation> {
    let mut by_demand: HashMap<&str, Vec<(&Slot, &Employee)>> = HashMap::new();
    for (slot, emp) in assigned_pairs(slots, employees, assignment) {
        by_demand.entry(&slot.demand_id).or_default().push((slot, emp));
    }
    let mut out = Vec::new();
    for mut entries in by_demand.into_values() {
        entries.sort_by_key(|(s, _)| s.date);
        for pair in entries.windows(2) {
            let ((s1, e1), (s2, e2)) = (pair[0], pair[1]);
            if (s2.date - s1.date).num_days() == 1 && e1.employee_id != e2.employee_id {
                out.push(v(
                    "S5",
                    &s2.slot_id,
                    &e2.employee_id,
                    format!("officer changed from {} on consecutive day", e1.employee_id),
                ));
            }
        }
    }
    out
}

/// S6: an employee spread across many teams loses cohesion.
pub fn s6_minimize_team_changes(
    slots: &[Slot],
    employees: &[Employee],
    assignment: &HashMap<usize, usize>,
) -> Vec<SoftViolation> {
    let mut teams_by_emp: HashMap<usize, HashSet<&str>> = HashMap::new();
    for (&si, &ei) in assignment {
        teams_by_emp
            .entry(ei)
            .or_default()
            .insert(&slots[si].ou_id);
    }
    teams_by_emp
        .into_iter()
        .filter(|(_, teams)| teams.len() > 1)
        .map(|(ei, teams)| {
            v(
                "S6",
                "",
                &employees[ei].employee_id,
                format!("worked across {} organizational units", teams.len()),
            )
        })
        .collect()
}

/// S7: assignment lands outside every zone the employee prefers.
pub fn s7_zone_preference(
    slots: &[Slot],
    employees: &[Employee],
    assignment: &HashMap<usize, usize>,
) -> Vec<SoftViolation> {
    assigned_pairs(slots, employees, assignment)
        .into_iter()
        .filter_map(|(slot, emp)| {
            let prefs = emp.preferences.as_ref()?;
            if prefs.preferred_zones.is_empty() {
                return None;
            }
            if !prefs.preferred_zones.contains(&slot.ou_id) {
                Some(v("S7", &slot.slot_id, &emp.employee_id, "outside preferred zone"))
            } else {
                None
            }
        })
        .collect()
}

/// S8: slots left unassigned beyond the headcount is already a hard
/// shortfall; this tracks under-target coverage per (demand, requirement, date).
pub fn s8_team_size_feasibility(slots: &[Slot], assignment: &HashMap<usize, usize>) -> Vec<SoftViolation> {
    let mut required: HashMap<(&str, &str, chrono::NaiveDate), usize> = HashMap::new();
    let mut filled: HashMap<(&str, &str, chrono::NaiveDate), usize> = HashMap::new();
    for (si, slot) in slots.iter().enumerate() {
        let key = (slot.demand_id.as_str(), slot.requirement_id.as_str(), slot.date);
        *required.entry(key).or_insert(0) += 1;
        if assignment.contains_key(&si) {
            *filled.entry(key).or_insert(0) += 1;
        }
    }
    required
        .into_iter()
        .filter_map(|(key, req)| {
            let have = filled.get(&key).copied().unwrap_or(0);
            if have < req {
                Some(v(
                    "S8",
                    "",
                    "",
                    format!(
                        "{}/{} filled for {}-{} on {}",
                        have, req, key.0, key.1, key.2
                    ),
                ))
            } else {
                None
            }
        })
        .collect()
}

/// S9: soft buffer beyond C14's 30-minute travel-time floor — flag gaps
/// under 60 minutes between different-site shifts that C14 let through.
pub fn s9_travel_slack(
    slots: &[Slot],
    employees: &[Employee],
    assignment: &HashMap<usize, usize>,
) -> Vec<SoftViolation> {
    let mut by_emp: HashMap<usize, Vec<&Slot>> = HashMap::new();
    for (&si, &ei) in assignment {
        by_emp.entry(ei).or_default().push(&slots[si]);
    }
    let mut out = Vec::new();
    for (ei, mut emp_slots) in by_emp {
        emp_slots.sort_by_key(|s| (s.date, s.start));
        for pair in emp_slots.windows(2) {
            let (s1, s2) = (pair[0], pair[1]);
            if s1.date == s2.date && s1.location_id != s2.location_id && s2.start >= s1.end {
                let gap = (s2.start - s1.end).num_minutes();
                if gap < 60 {
                    out.push(v(
                        "S9",
                        &s2.slot_id,
                        &employees[ei].employee_id,
                        format!("{gap} min travel buffer between sites"),
                    ));
                }
            }
        }
    }
    out
}

/// S10: flag employees whose monthly OT is far from the group's average.
pub fn s10_fair_ot(
    slots: &[Slot],
    employees: &[Employee],
    assignment: &HashMap<usize, usize>,
) -> Vec<SoftViolation> {
    let mut ot_by_emp: HashMap<usize, f64> = HashMap::new();
    for (&si, &ei) in assignment {
        let ot = split_shift_hours(slots[si].start, slots[si].end).ot;
        *ot_by_emp.entry(ei).or_insert(0.0) += ot;
    }
    if ot_by_emp.len() < 2 {
        return Vec::new();
    }
    let total: f64 = ot_by_emp.values().sum();
    let mean = total / ot_by_emp.len() as f64;
    ot_by_emp
        .into_iter()
        .filter(|(_, ot)| (*ot - mean).abs() > mean.max(4.0))
        .map(|(ei, ot)| {
            v(
                "S10",
                "",
                &employees[ei].employee_id,
                format!("{ot:.2}h OT vs {mean:.2}h average"),
            )
        })
        .collect()
}

/// S11: every public-holiday slot should be filled, not just statistically likely to be.
pub fn s11_public_holiday_coverage(slots: &[Slot], assignment: &HashMap<usize, usize>) -> Vec<SoftViolation> {
    // Slots don't carry an "isPublicHoliday" flag directly; callers that know
    // the holiday calendar should filter `slots` to that subset before calling
    // this, which is what `validator.rs` does.
    slots
        .iter()
        .enumerate()
        .filter(|(si, _)| !assignment.contains_key(si))
        .map(|(_, slot)| v("S11", &slot.slot_id, "", "public holiday slot left unassigned"))
        .collect()
}

/// S12: flag employees whose allowance-eligible hours (night shifts,
/// weekends, public holidays) sit far above the group average — a sign
/// the higher-cost shifts are concentrating on a few people rather than
/// spreading across the roster.
pub fn s12_allowance_concentration(
    slots: &[Slot],
    employees: &[Employee],
    assignment: &HashMap<usize, usize>,
    public_holidays: &HashSet<NaiveDate>,
) -> Vec<SoftViolation> {
    let mut hours_by_emp: HashMap<usize, f64> = HashMap::new();
    for (&si, &ei) in assignment {
        let slot = &slots[si];
        let is_allowance_shift = slot.shift_code == "N"
            || slot.shift_code == "NIGHT"
            || matches!(slot.date.weekday(), Weekday::Sat | Weekday::Sun)
            || public_holidays.contains(&slot.date);
        if is_allowance_shift {
            *hours_by_emp.entry(ei).or_insert(0.0) += span_hours(slot.start, slot.end);
        }
    }
    if hours_by_emp.len() < 2 {
        return Vec::new();
    }
    let total: f64 = hours_by_emp.values().sum();
    let avg = total / hours_by_emp.len() as f64;
    if avg == 0.0 {
        return Vec::new();
    }
    hours_by_emp
        .into_iter()
        .filter(|(_, hours)| *hours > avg * 2.0)
        .map(|(ei, hours)| {
            v(
                "S12",
                "",
                &employees[ei].employee_id,
                format!("allowance hours {hours:.1}h significantly above average {avg:.1}h"),
            )
        })
        .collect()
}

/// S14: mid-month inserts (new joiners added after the roster was first
/// built) tend to land unevenly; this checks that each demand's coverage
/// during days 11-20 doesn't dip well below its coverage over the rest of
/// the horizon.
pub fn s14_midmonth_coverage(slots: &[Slot], assignment: &HashMap<usize, usize>) -> Vec<SoftViolation> {
    let mut coverage_by_demand: HashMap<&str, HashMap<u32, usize>> = HashMap::new();
    for (si, slot) in slots.iter().enumerate() {
        if assignment.contains_key(&si) {
            *coverage_by_demand
                .entry(&slot.demand_id)
                .or_default()
                .entry(slot.date.day())
                .or_insert(0) += 1;
        }
    }
    let mut out = Vec::new();
    for (demand_id, coverage_by_day) in coverage_by_demand {
        let total: usize = coverage_by_day.values().sum();
        let num_days = coverage_by_day.len();
        if num_days == 0 {
            continue;
        }
        let avg = total as f64 / num_days as f64;
        let midmonth: Vec<usize> = coverage_by_day
            .iter()
            .filter(|(&day, _)| (11..=20).contains(&day))
            .map(|(_, &count)| count)
            .collect();
        if midmonth.is_empty() || avg == 0.0 {
            continue;
        }
        let midmonth_avg = midmonth.iter().sum::<usize>() as f64 / midmonth.len() as f64;
        if midmonth_avg < 0.7 * avg {
            out.push(v(
                "S14",
                "",
                "",
                format!(
                    "demand {demand_id} mid-month coverage ({midmonth_avg:.1}) is {:.0}% of average ({avg:.1})",
                    midmonth_avg / avg * 100.0
                ),
            ));
        }
    }
    out
}

/// S15: aggregate coverage ratio per demand per day, across every
/// requirement the demand carries. Coarser than S8 (which breaks out by
/// requirement): a demand can clear S8 on every individual requirement yet
/// still read low in aggregate if one requirement in the group is heavily
/// short while the others are fully staffed — unlikely but this catches it.
pub fn s15_demand_coverage_ratio(slots: &[Slot], assignment: &HashMap<usize, usize>) -> Vec<SoftViolation> {
    let mut required: HashMap<(&str, NaiveDate), usize> = HashMap::new();
    let mut filled: HashMap<(&str, NaiveDate), usize> = HashMap::new();
    for (si, slot) in slots.iter().enumerate() {
        let key = (slot.demand_id.as_str(), slot.date);
        *required.entry(key).or_insert(0) += 1;
        if assignment.contains_key(&si) {
            *filled.entry(key).or_insert(0) += 1;
        }
    }
    required
        .into_iter()
        .filter_map(|(key, req)| {
            if req == 0 {
                return None;
            }
            let have = filled.get(&key).copied().unwrap_or(0);
            let ratio = have as f64 / req as f64;
            if ratio < 0.8 {
                Some(v(
                    "S15",
                    "",
                    "",
                    format!(
                        "demand {} on {}: {}/{} filled ({:.0}% coverage)",
                        key.0,
                        key.1,
                        have,
                        req,
                        ratio * 100.0
                    ),
                ))
            } else {
                None
            }
        })
        .collect()
}

/// S13: an employee assigned during their own declared unavailability window.
/// Should never fire given `candidates.rs` excludes these pairs outright —
/// kept as an independent re-derivation, the way `validator.rs` re-derives
/// every hard rule rather than trusting the model's bookkeeping.
pub fn s13_substitute_logic(
    slots: &[Slot],
    employees: &[Employee],
    assignment: &HashMap<usize, usize>,
) -> Vec<SoftViolation> {
    assigned_pairs(slots, employees, assignment)
        .into_iter()
        .filter(|(slot, emp)| emp.is_unavailable_on(slot.date))
        .map(|(slot, emp)| v("S13", &slot.slot_id, &emp.employee_id, "assigned during unavailability"))
        .collect()
}

/// S16: soft echo of whitelist/blacklist — should also never fire given the
/// candidate filter, kept for the same independent-re-derivation reason as S13.
pub fn s16_whitelist_blacklist(
    slots: &[Slot],
    employees: &[Employee],
    assignment: &HashMap<usize, usize>,
) -> Vec<SoftViolation> {
    assigned_pairs(slots, employees, assignment)
        .into_iter()
        .filter(|(slot, emp)| {
            let blacklisted = slot.blacklist.employee_ids.iter().any(|b| {
                b.employee_id == emp.employee_id
                    && b.blacklist_start_date <= slot.date
                    && slot.date <= b.blacklist_end_date
            });
            let whitelist_violation = !slot.whitelist.is_empty()
                && !slot.whitelist.employee_ids.contains(&emp.employee_id)
                && !slot.whitelist.team_ids.contains(&emp.team_id);
            blacklisted || whitelist_violation
        })
        .map(|(slot, emp)| v("S16", &slot.slot_id, &emp.employee_id, "whitelist/blacklist violation"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Blacklist, Gender, GenderRequirement, Rank, Scheme, SchemeRequirement, Whitelist};
    use chrono::NaiveDate;

    fn employee(id: &str, offset: usize) -> Employee {
        Employee {
            employee_id: id.into(),
            rank_id: Rank::Avso,
            product_type_id: "PT1".into(),
            scheme: Scheme::A,
            gender: Gender::M,
            team_id: "T1".into(),
            organizational_unit: None,
            rotation_offset: offset,
            licenses: vec![],
            skills: Default::default(),
            preferences: None,
            unavailability: vec![],
        }
    }

    fn slot(id: &str, date: NaiveDate, shift_code: &str) -> Slot {
        Slot {
            slot_id: id.into(),
            demand_id: "D1".into(),
            requirement_id: "R1".into(),
            date,
            shift_code: shift_code.into(),
            start: date.and_hms_opt(7, 0, 0).unwrap(),
            end: date.and_hms_opt(19, 0, 0).unwrap(),
            location_id: "L1".into(),
            ou_id: "OU1".into(),
            product_type_id: "PT1".into(),
            rank_id: Rank::Avso,
            gender_requirement: GenderRequirement::Any,
            scheme_requirement: SchemeRequirement::Global,
            required_qualifications: vec![],
            rotation_sequence: vec!["D".into(), "D".into(), "O".into()],
            coverage_anchor: date - chrono::Duration::days(2),
            preferred_teams: vec![],
            whitelist: Whitelist::default(),
            blacklist: Blacklist::default(),
            position: 0,
        }
    }

    #[test]
    fn s1_flags_rotation_mismatch() {
        let d = NaiveDate::from_ymd_opt(2025, 12, 3).unwrap();
        // coverage_anchor two days before date -> expected_entry(0) is "O"
        // (cycle position 2 of ["D","D","O"]), but the slot is coded "D".
        let slots = vec![slot("s1", d, "D")];
        let employees = vec![employee("E1", 0)];
        let assignment: HashMap<usize, usize> = [(0, 0)].into_iter().collect();
        let violations = s1_rotation_pattern(&slots, &employees, &assignment);
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn s11_flags_unassigned_holiday_slot() {
        let d = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();
        let slots = vec![slot("s1", d, "D")];
        let assignment: HashMap<usize, usize> = HashMap::new();
        let violations = s11_public_holiday_coverage(&slots, &assignment);
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn s2_flags_unpreferred_site() {
        let d = NaiveDate::from_ymd_opt(2025, 12, 3).unwrap();
        let slots = vec![slot("s1", d, "D")];
        let mut emp = employee("E1", 0);
        emp.preferences = Some(crate::domain::Preferences {
            unpreferred_sites: ["L1".to_string()].into_iter().collect(),
            ..Default::default()
        });
        let employees = vec![emp];
        let assignment: HashMap<usize, usize> = [(0, 0)].into_iter().collect();
        let violations = s2_preferences(&slots, &employees, &assignment);
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn s2_flags_off_preferred_team_list() {
        let d = NaiveDate::from_ymd_opt(2025, 12, 3).unwrap();
        let slots = vec![slot("s1", d, "D")];
        let mut emp = employee("E1", 0);
        emp.preferences = Some(crate::domain::Preferences {
            preferred_teams: ["OTHER_TEAM".to_string()].into_iter().collect(),
            ..Default::default()
        });
        let employees = vec![emp];
        let assignment: HashMap<usize, usize> = [(0, 0)].into_iter().collect();
        let violations = s2_preferences(&slots, &employees, &assignment);
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn s2_silent_when_preferred_list_empty() {
        let d = NaiveDate::from_ymd_opt(2025, 12, 3).unwrap();
        let slots = vec![slot("s1", d, "D")];
        let emp = employee("E1", 0);
        let employees = vec![emp];
        let assignment: HashMap<usize, usize> = [(0, 0)].into_iter().collect();
        let violations = s2_preferences(&slots, &employees, &assignment);
        assert_eq!(violations.len(), 0);
    }

    #[test]
    fn s12_flags_allowance_concentration() {
        let d = NaiveDate::from_ymd_opt(2025, 12, 3).unwrap();
        // E1 works five night shifts (60h allowance), E2/E3 work one each
        // (12h) -- average is 28h, well under E1's concentration.
        let slots: Vec<Slot> = (0..7).map(|i| slot(&format!("s{i}"), d, "N")).collect();
        let employees = vec![employee("E1", 0), employee("E2", 0), employee("E3", 0)];
        let assignment: HashMap<usize, usize> =
            [(0, 0), (1, 0), (2, 0), (3, 0), (4, 0), (5, 1), (6, 2)].into_iter().collect();
        let violations = s12_allowance_concentration(&slots, &employees, &assignment, &HashSet::new());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].employee_id.as_deref(), Some("E1"));
    }

    #[test]
    fn s14_flags_low_midmonth_coverage() {
        let d1 = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2025, 12, 2).unwrap();
        let d3 = NaiveDate::from_ymd_opt(2025, 12, 3).unwrap();
        let d15 = NaiveDate::from_ymd_opt(2025, 12, 15).unwrap();
        let slots = vec![
            slot("s1", d1, "D"),
            slot("s2", d1, "D"),
            slot("s3", d2, "D"),
            slot("s4", d2, "D"),
            slot("s5", d3, "D"),
            slot("s6", d3, "D"),
            slot("s7", d15, "D"),
        ];
        let employees = vec![employee("E1", 0)];
        let assignment: HashMap<usize, usize> = (0..7).map(|i| (i, 0)).collect();
        let violations = s14_midmonth_coverage(&slots, &assignment);
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn s15_flags_under_covered_demand() {
        let d = NaiveDate::from_ymd_opt(2025, 12, 3).unwrap();
        let slots: Vec<Slot> = (0..5).map(|i| slot(&format!("s{i}"), d, "D")).collect();
        let employees = vec![employee("E1", 0)];
        let assignment: HashMap<usize, usize> = [(0, 0), (1, 0), (2, 0)].into_iter().collect();
        let violations = s15_demand_coverage_ratio(&slots, &assignment);
        assert_eq!(violations.len(), 1);
    }
}
