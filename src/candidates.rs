//! Component C: candidate-pair filtering.
//!
//! Cuts the (slot, employee) cross product down before the model is built.
//! Every check here is a hard eligibility gate, never a preference — soft
//! preferences live entirely in `soft_constraints.rs`.

use crate::domain::{Employee, Gender, GenderRequirement, Slot};
use crate::time::span_hours;

/// C1: per-shift gross hours must not exceed the employee's scheme cap.
pub fn within_daily_cap(slot: &Slot, employee: &Employee) -> bool {
    span_hours(slot.start, slot.end) <= employee.scheme.daily_cap_hours()
}

/// C7+C8+C15 unified: every qualification the slot requires must be held
/// and valid (unexpired, or covered by a temporary approval) on the slot's
/// date. C10 keys off a separate `requiredSkills` slot attribute that this
/// schema doesn't carry, so it has nothing to check here and is inert, as
/// in the source it's grounded on.
///
/// C11 (rank match) and C12 (`preferredTeams` membership) are separate
/// checks in `is_candidate`, not folded in here.
pub fn qualifications_satisfied(slot: &Slot, employee: &Employee) -> bool {
    slot.required_qualifications.iter().all(|code| {
        employee
            .license(code)
            .map(|license| license.is_valid_on(slot.date))
            .unwrap_or(false)
    })
}

/// Work-pattern enforcement (hard): an employee's rotation cycle, anchored
/// at the requirement's own pattern and the employee's fixed offset, tells
/// us whether today is an "on" day for them. If it says `"O"`, they cannot
/// be assigned here, no matter which shift code this particular slot is.
/// Matches the fixed-offset branch of the original's rotation enforcement —
/// the variable-offset branch is unreachable since `fixedRotationOffset`
/// is always true in this implementation.
pub fn matches_rotation_pattern(slot: &Slot, employee: &Employee) -> bool {
    slot.expected_entry(employee.rotation_offset) != "O"
}

pub fn is_candidate(slot: &Slot, employee: &Employee) -> bool {
    if slot.rank_id != employee.rank_id {
        return false;
    }
    if !matches_rotation_pattern(slot, employee) {
        return false;
    }
    if slot.product_type_id != employee.product_type_id {
        return false;
    }
    if !slot.scheme_requirement.accepts(employee.scheme) {
        return false;
    }
    match slot.gender_requirement {
        GenderRequirement::Any | GenderRequirement::Mix => {}
        GenderRequirement::M => {
            if employee.gender != Gender::M {
                return false;
            }
        }
        GenderRequirement::F => {
            if employee.gender != Gender::F {
                return false;
            }
        }
    }
    if !within_daily_cap(slot, employee) {
        return false;
    }
    if !qualifications_satisfied(slot, employee) {
        return false;
    }
    if !slot.preferred_teams.is_empty() && !slot.preferred_teams.contains(&employee.team_id) {
        return false;
    }
    if !slot.whitelist.is_empty() {
        let team_ok = slot.whitelist.team_ids.contains(&employee.team_id);
        let employee_ok = slot.whitelist.employee_ids.contains(&employee.employee_id);
        if !(team_ok || employee_ok) {
            return false;
        }
    }
    for entry in &slot.blacklist.employee_ids {
        if entry.employee_id == employee.employee_id
            && entry.blacklist_start_date <= slot.date
            && slot.date <= entry.blacklist_end_date
        {
            return false;
        }
    }
    if employee.is_unavailable_on(slot.date) {
        return false;
    }
    true
}

/// Candidate employee indices per slot, in slot order, employee order
/// within each slot preserved from the input employee list.
pub fn build_candidates(slots: &[Slot], employees: &[Employee]) -> Vec<Vec<usize>> {
    slots
        .iter()
        .map(|slot| {
            employees
                .iter()
                .enumerate()
                .filter(|(_, employee)| is_candidate(slot, employee))
                .map(|(idx, _)| idx)
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Blacklist, BlacklistEntry, License, LicenseType, Rank, Scheme, SchemeRequirement,
        UnavailabilityRange, Whitelist,
    };
    use chrono::NaiveDate;

    fn employee() -> Employee {
        Employee {
            employee_id: "E1".into(),
            rank_id: Rank::Avso,
            product_type_id: "PT1".into(),
            scheme: Scheme::A,
            gender: Gender::M,
            team_id: "T1".into(),
            organizational_unit: None,
            rotation_offset: 0,
            licenses: vec![License {
                code: "PDL".into(),
                license_type: LicenseType::Standard,
                expiry_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
                approval_code: None,
                temporary_approval_expiry: None,
            }],
            skills: ["PDL".to_string()].into_iter().collect(),
            preferences: None,
            unavailability: vec![],
        }
    }

    fn slot() -> Slot {
        Slot {
            slot_id: "s".into(),
            demand_id: "D1".into(),
            requirement_id: "R1".into(),
            date: NaiveDate::from_ymd_opt(2025, 12, 5).unwrap(),
            shift_code: "D".into(),
            start: NaiveDate::from_ymd_opt(2025, 12, 5)
                .unwrap()
                .and_hms_opt(7, 0, 0)
                .unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 12, 5)
                .unwrap()
                .and_hms_opt(19, 0, 0)
                .unwrap(),
            location_id: "L1".into(),
            ou_id: "OU1".into(),
            product_type_id: "PT1".into(),
            rank_id: Rank::Avso,
            gender_requirement: GenderRequirement::Any,
            scheme_requirement: SchemeRequirement::Global,
            required_qualifications: vec!["PDL".into()],
            rotation_sequence: vec!["D".into(), "O".into()],
            coverage_anchor: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            preferred_teams: vec![],
            whitelist: Whitelist::default(),
            blacklist: Blacklist::default(),
            position: 0,
        }
    }

    #[test]
    fn matches_on_rank_product_scheme_and_qualification() {
        assert!(is_candidate(&slot(), &employee()));
    }

    #[test]
    fn rank_mismatch_excludes() {
        let mut e = employee();
        e.rank_id = Rank::Cvso;
        assert!(!is_candidate(&slot(), &e));
    }

    #[test]
    fn missing_qualification_excludes() {
        let mut e = employee();
        e.licenses.clear();
        assert!(!is_candidate(&slot(), &e));
    }

    #[test]
    fn gender_requirement_excludes_wrong_gender() {
        let mut s = slot();
        s.gender_requirement = GenderRequirement::F;
        assert!(!is_candidate(&s, &employee()));
    }

    #[test]
    fn preferred_teams_excludes_non_members() {
        let mut s = slot();
        s.preferred_teams = vec!["OTHER_TEAM".into()];
        assert!(!is_candidate(&s, &employee()));
    }

    #[test]
    fn preferred_teams_admits_members() {
        let mut s = slot();
        s.preferred_teams = vec!["T1".into()];
        assert!(is_candidate(&s, &employee()));
    }

    #[test]
    fn whitelist_restricts_to_members() {
        let mut s = slot();
        s.whitelist = Whitelist {
            team_ids: vec!["OTHER_TEAM".into()],
            employee_ids: vec![],
        };
        assert!(!is_candidate(&s, &employee()));
    }

    #[test]
    fn blacklist_window_excludes_within_range() {
        let mut s = slot();
        s.blacklist = Blacklist {
            employee_ids: vec![BlacklistEntry {
                employee_id: "E1".into(),
                blacklist_start_date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
                blacklist_end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            }],
        };
        assert!(!is_candidate(&s, &employee()));
    }

    #[test]
    fn unavailability_excludes() {
        let mut e = employee();
        e.unavailability.push(UnavailabilityRange {
            start_date: NaiveDate::from_ymd_opt(2025, 12, 5).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 12, 5).unwrap(),
            reason: None,
        });
        assert!(!is_candidate(&slot(), &e));
    }
}
