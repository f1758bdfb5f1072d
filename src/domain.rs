//! Domain model for the roster engine.
//!
//! Typed entities shared by every component. Built once from the input
//! document (`input.rs`) and never mutated afterwards (§3 life-cycle).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    #[serde(rename = "AVSO")]
    Avso,
    #[serde(rename = "CVSO")]
    Cvso,
    #[serde(rename = "APO")]
    Apo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scheme {
    A,
    B,
    P,
}

impl Scheme {
    /// Daily gross-hour cap for C1.
    pub fn daily_cap_hours(self) -> f64 {
        match self {
            Scheme::A => 14.0,
            Scheme::B => 13.0,
            Scheme::P => 9.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    M,
    F,
    U,
}

/// `slot.genderRequirement`: broader than [`Gender`] because `Any`/`Mix` are
/// not genders an employee can have, they're requirements a slot can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenderRequirement {
    Any,
    M,
    F,
    Mix,
}

/// `slot.schemeRequirement`: `Global` accepts any employee scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemeRequirement {
    A,
    B,
    P,
    Global,
}

impl SchemeRequirement {
    pub fn accepts(self, scheme: Scheme) -> bool {
        match self {
            SchemeRequirement::Global => true,
            SchemeRequirement::A => scheme == Scheme::A,
            SchemeRequirement::B => scheme == Scheme::B,
            SchemeRequirement::P => scheme == Scheme::P,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LicenseType {
    #[serde(rename = "PDL")]
    Pdl,
    #[serde(rename = "PROVISIONAL")]
    Provisional,
    #[serde(other)]
    Standard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    pub code: String,
    #[serde(rename = "type", default = "default_license_type")]
    pub license_type: LicenseType,
    #[serde(rename = "expiryDate")]
    pub expiry_date: NaiveDate,
    #[serde(rename = "approvalCode", default)]
    pub approval_code: Option<String>,
    #[serde(rename = "temporaryApprovalExpiry", default)]
    pub temporary_approval_expiry: Option<NaiveDate>,
}

impl License {
    pub fn is_provisional(&self) -> bool {
        matches!(
            self.license_type,
            LicenseType::Pdl | LicenseType::Provisional
        )
    }

    /// A license covers `date` if it hasn't expired, or if an unexpired
    /// temporary approval extends it. Unifies C7 (validity), C8 (provisional
    /// expiry) and C15 (expiry override): all three read the same two dates.
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        if date <= self.expiry_date {
            return true;
        }
        self.temporary_approval_expiry
            .map(|approval| date <= approval)
            .unwrap_or(false)
    }
}

fn default_license_type() -> LicenseType {
    LicenseType::Standard
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(rename = "preferredShifts", default)]
    pub preferred_shifts: HashSet<String>,
    #[serde(rename = "preferredTeams", default)]
    pub preferred_teams: HashSet<String>,
    #[serde(rename = "preferredSites", default)]
    pub preferred_sites: HashSet<String>,
    #[serde(rename = "preferredZones", default)]
    pub preferred_zones: HashSet<String>,
    #[serde(rename = "preferredOUs", default)]
    pub preferred_ous: HashSet<String>,
    #[serde(rename = "unpreferredShifts", default)]
    pub unpreferred_shifts: HashSet<String>,
    #[serde(rename = "unpreferredTeams", default)]
    pub unpreferred_teams: HashSet<String>,
    #[serde(rename = "unpreferredSites", default)]
    pub unpreferred_sites: HashSet<String>,
    #[serde(rename = "unpreferredZones", default)]
    pub unpreferred_zones: HashSet<String>,
    #[serde(rename = "unpreferredOUs", default)]
    pub unpreferred_ous: HashSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnavailabilityRange {
    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,
    #[serde(rename = "endDate")]
    pub end_date: NaiveDate,
    #[serde(default)]
    pub reason: Option<String>,
}

impl UnavailabilityRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    #[serde(rename = "employeeId")]
    pub employee_id: String,
    #[serde(rename = "rankId")]
    pub rank_id: Rank,
    #[serde(rename = "productTypeId")]
    pub product_type_id: String,
    pub scheme: Scheme,
    pub gender: Gender,
    #[serde(rename = "teamId")]
    pub team_id: String,
    #[serde(rename = "organizationalUnit", default)]
    pub organizational_unit: Option<String>,
    #[serde(rename = "rotationOffset", default)]
    pub rotation_offset: usize,
    #[serde(default)]
    pub licenses: Vec<License>,
    #[serde(default)]
    pub skills: HashSet<String>,
    #[serde(default)]
    pub preferences: Option<Preferences>,
    #[serde(default)]
    pub unavailability: Vec<UnavailabilityRange>,
}

impl Employee {
    pub fn license(&self, code: &str) -> Option<&License> {
        self.licenses.iter().find(|l| l.code == code)
    }

    pub fn is_unavailable_on(&self, date: NaiveDate) -> bool {
        self.unavailability.iter().any(|u| u.contains(date))
    }
}

/// Whitelist carried by a slot: if either set is non-empty, only members pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Whitelist {
    #[serde(rename = "teamIds", default)]
    pub team_ids: Vec<String>,
    #[serde(rename = "employeeIds", default)]
    pub employee_ids: Vec<String>,
}

impl Whitelist {
    pub fn is_empty(&self) -> bool {
        self.team_ids.is_empty() && self.employee_ids.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistEntry {
    #[serde(rename = "employeeId")]
    pub employee_id: String,
    #[serde(rename = "blacklistStartDate")]
    pub blacklist_start_date: NaiveDate,
    #[serde(rename = "blacklistEndDate")]
    pub blacklist_end_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Blacklist {
    #[serde(rename = "employeeIds", default)]
    pub employee_ids: Vec<BlacklistEntry>,
}

/// Component B's atomic decision unit: exactly one position to fill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    #[serde(rename = "slotId")]
    pub slot_id: String,
    #[serde(rename = "demandId")]
    pub demand_id: String,
    #[serde(rename = "requirementId")]
    pub requirement_id: String,
    pub date: NaiveDate,
    #[serde(rename = "shiftCode")]
    pub shift_code: String,
    pub start: chrono::NaiveDateTime,
    pub end: chrono::NaiveDateTime,
    #[serde(rename = "locationId")]
    pub location_id: String,
    #[serde(rename = "ouId")]
    pub ou_id: String,
    #[serde(rename = "productTypeId")]
    pub product_type_id: String,
    #[serde(rename = "rankId")]
    pub rank_id: Rank,
    #[serde(rename = "genderRequirement")]
    pub gender_requirement: GenderRequirement,
    #[serde(rename = "schemeRequirement")]
    pub scheme_requirement: SchemeRequirement,
    #[serde(rename = "requiredQualifications")]
    pub required_qualifications: Vec<String>,
    #[serde(rename = "rotationSequence")]
    pub rotation_sequence: Vec<String>,
    #[serde(rename = "coverageAnchor")]
    pub coverage_anchor: NaiveDate,
    #[serde(rename = "preferredTeams", default)]
    pub preferred_teams: Vec<String>,
    #[serde(default)]
    pub whitelist: Whitelist,
    #[serde(default)]
    pub blacklist: Blacklist,
    /// 0-based position index within the requirement's headcount; part of
    /// `slot_id`, not otherwise load-bearing.
    pub position: usize,
}

impl Slot {
    /// Cycle day of the rotation sequence for a given employee's anchor offset.
    pub fn cycle_day(&self, rotation_offset: usize) -> usize {
        let len = self.rotation_sequence.len().max(1);
        let k = (self.date - self.coverage_anchor).num_days();
        let k_mod = k.rem_euclid(len as i64) as usize;
        (k_mod + len - (rotation_offset % len)) % len
    }

    /// The rotation-sequence entry an employee with this offset is expected
    /// to work on this slot's date (could be a shift code, or `"O"`).
    pub fn expected_entry(&self, rotation_offset: usize) -> &str {
        self.rotation_sequence
            .get(self.cycle_day(rotation_offset))
            .map(|s| s.as_str())
            .unwrap_or("O")
    }

    pub fn overlaps(&self, other: &Slot) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Demand-level rotation compliance: does this slot's own shift code
    /// match what the requirement's rotation sequence expects on this date
    /// (cycle computed at offset 0, i.e. independent of any one employee)?
    /// Slots are built per coverage day for every code in the work pattern
    /// (coverage and rotation are orthogonal — see `slots.rs`), so this can
    /// genuinely be false: e.g. an "O"-day still gets D/N slots built for
    /// headcount purposes, and filling them is a rotation violation.
    pub fn violates_rotation(&self) -> bool {
        self.expected_entry(0) != self.shift_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_slot() -> Slot {
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
            required_qualifications: vec![],
            rotation_sequence: vec![
                "D".into(),
                "D".into(),
                "N".into(),
                "N".into(),
                "O".into(),
                "O".into(),
            ],
            coverage_anchor: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            preferred_teams: vec![],
            whitelist: Whitelist::default(),
            blacklist: Blacklist::default(),
            position: 0,
        }
    }

    #[test]
    fn rotation_cycle_day_matches_scenario() {
        // 2025-12-01 is a Monday (anchor). 2025-12-05 is day offset 4.
        let mut slot = base_slot();
        slot.date = NaiveDate::from_ymd_opt(2025, 12, 5).unwrap();
        assert_eq!(slot.expected_entry(0), "O");

        slot.date = NaiveDate::from_ymd_opt(2025, 12, 3).unwrap();
        assert_eq!(slot.expected_entry(0), "N");
    }
}
