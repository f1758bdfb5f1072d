//! Synthetic input document generation.
//!
//! Produces a fully-formed `InputDocument` the same way the engine's own
//! input parser would accept it from a real client, so `/solve?demo=SMALL`
//! and the CLI's `--demo` flag exercise the real pipeline end to end rather
//! than a separate fixture format.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::domain::{Employee, Gender, License, LicenseType, Rank, Scheme};
use crate::input::{CoverageDays, DemandItem, InputDocument, PlanningHorizon, Requirement, ShiftDetail, ShiftGroup};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoData {
    Small,
    Large,
}

impl std::str::FromStr for DemoData {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SMALL" => Ok(DemoData::Small),
            "LARGE" => Ok(DemoData::Large),
            _ => Err(()),
        }
    }
}

impl DemoData {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemoData::Small => "SMALL",
            DemoData::Large => "LARGE",
        }
    }

    fn parameters(&self) -> DemoDataParameters {
        match self {
            DemoData::Small => DemoDataParameters {
                locations: vec!["Terminal 1".to_string(), "Cargo Gate".to_string()],
                required_qualifications: vec!["FIREARMS".to_string(), "FIRSTAID".to_string()],
                optional_qualifications: vec!["K9".to_string(), "CLOSEPROTECTION".to_string()],
                days_in_schedule: 14,
                employee_count: 12,
                optional_qual_distribution: vec![(0, 2.0), (1, 3.0), (2, 1.0)],
                license_expiry_offset_distribution: vec![(-10, 1.0), (30, 3.0), (180, 4.0), (365, 2.0)],
            },
            DemoData::Large => DemoDataParameters {
                locations: vec![
                    "Terminal 1".to_string(),
                    "Terminal 2".to_string(),
                    "Cargo Gate".to_string(),
                    "Perimeter North".to_string(),
                    "Perimeter South".to_string(),
                ],
                required_qualifications: vec!["FIREARMS".to_string(), "FIRSTAID".to_string()],
                optional_qualifications: vec![
                    "K9".to_string(),
                    "CLOSEPROTECTION".to_string(),
                    "EXPLOSIVES".to_string(),
                ],
                days_in_schedule: 28,
                employee_count: 45,
                optional_qual_distribution: vec![(0, 2.0), (1, 3.0), (2, 2.0)],
                license_expiry_offset_distribution: vec![(-10, 1.0), (30, 3.0), (180, 4.0), (365, 3.0)],
            },
        }
    }
}

struct DemoDataParameters {
    locations: Vec<String>,
    required_qualifications: Vec<String>,
    optional_qualifications: Vec<String>,
    days_in_schedule: i64,
    employee_count: usize,
    optional_qual_distribution: Vec<(i64, f64)>,
    /// Days relative to the planning horizon start a licence expires on;
    /// negative entries deliberately generate some already-expired licences
    /// so C7/C8 have something to reject in the demo data.
    license_expiry_offset_distribution: Vec<(i64, f64)>,
}

/// List of available demo data sets.
pub fn list_demo_data() -> Vec<&'static str> {
    vec!["SMALL", "LARGE"]
}

const RANKS: [Rank; 3] = [Rank::Avso, Rank::Cvso, Rank::Apo];
const SCHEMES: [Scheme; 3] = [Scheme::A, Scheme::B, Scheme::P];
const ROTATION_PATTERNS: [[&str; 6]; 2] = [["D", "D", "N", "N", "O", "O"], ["D", "N", "O", "D", "N", "O"]];

/// Generates a demo input document for the given size.
pub fn generate(demo: DemoData) -> InputDocument {
    let params = demo.parameters();
    let mut rng = StdRng::seed_from_u64(0);

    let start_date = find_next_monday(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    let end_date = start_date + Duration::days(params.days_in_schedule - 1);

    let name_permutations = generate_name_permutations(&mut rng);

    let mut employees = Vec::with_capacity(params.employee_count);
    for i in 0..params.employee_count {
        let name = &name_permutations[i % name_permutations.len()];
        let rank = RANKS[i % RANKS.len()];
        let scheme = SCHEMES[i % SCHEMES.len()];
        let gender = if i % 2 == 0 { Gender::M } else { Gender::F };
        let pattern = &ROTATION_PATTERNS[i % ROTATION_PATTERNS.len()];

        let optional_count = pick_count(&mut rng, &params.optional_qual_distribution) as usize;
        let mut skills: HashSet<String> = params
            .optional_qualifications
            .choose_multiple(&mut rng, optional_count.min(params.optional_qualifications.len()))
            .cloned()
            .collect();
        skills.insert(params.required_qualifications[i % params.required_qualifications.len()].clone());

        let expiry_offset = pick_count(&mut rng, &params.license_expiry_offset_distribution);
        let licenses: Vec<License> = skills
            .iter()
            .map(|code| License {
                code: code.clone(),
                license_type: if i % 5 == 0 { LicenseType::Pdl } else { LicenseType::Standard },
                expiry_date: start_date + Duration::days(expiry_offset),
                approval_code: None,
                temporary_approval_expiry: None,
            })
            .collect();

        employees.push(Employee {
            employee_id: format!("{name}-{i:03}"),
            rank_id: rank,
            product_type_id: "SECURITY".to_string(),
            scheme,
            gender,
            team_id: format!("TEAM-{}", i % 3),
            organizational_unit: None,
            rotation_offset: i % pattern.len(),
            licenses,
            skills,
            preferences: None,
            unavailability: Vec::new(),
        });
    }

    let demand_items: Vec<DemandItem> = params
        .locations
        .iter()
        .enumerate()
        .map(|(loc_idx, location)| {
            let pattern = &ROTATION_PATTERNS[loc_idx % ROTATION_PATTERNS.len()];
            let work_pattern: Vec<String> = pattern.iter().map(|s| s.to_string()).collect();

            let shift_group = ShiftGroup {
                shift_details: vec![
                    ShiftDetail {
                        shift_code: "D".to_string(),
                        start: "07:00".to_string(),
                        end: "19:00".to_string(),
                        next_day: false,
                    },
                    ShiftDetail {
                        shift_code: "N".to_string(),
                        start: "19:00".to_string(),
                        end: "07:00".to_string(),
                        next_day: true,
                    },
                ],
                coverage_days: CoverageDays::Count(7),
                coverage_anchor: Some(start_date),
                include_public_holidays: true,
                include_eve_of_public_holidays: true,
                preferred_teams: Vec::new(),
                whitelist: Default::default(),
                blacklist: Default::default(),
            };

            let requirements = RANKS
                .iter()
                .map(|&rank| Requirement {
                    requirement_id: format!("REQ-{loc_idx}-{rank:?}"),
                    product_type_id: "SECURITY".to_string(),
                    rank_id: rank,
                    headcount: 2,
                    gender: crate::domain::GenderRequirement::Any,
                    scheme: crate::domain::SchemeRequirement::Global,
                    required_qualifications: vec![params.required_qualifications[0].clone()],
                    work_pattern: work_pattern.clone(),
                })
                .collect();

            DemandItem {
                demand_id: format!("DEMAND-{loc_idx}"),
                location_id: location.clone(),
                ou_id: format!("OU-{loc_idx}"),
                shift_start_date: start_date,
                shifts: vec![shift_group],
                requirements,
            }
        })
        .collect();

    InputDocument {
        schema_version: Some("0.43".to_string()),
        planning_reference: Some(format!("DEMO-{}", demo.as_str())),
        planning_horizon: PlanningHorizon { start_date, end_date },
        public_holidays: Vec::new(),
        employees,
        demand_items,
        solver_score_config: None,
        time_limit: None,
        fixed_rotation_offset: Some(true),
    }
}

fn find_next_monday(date: NaiveDate) -> NaiveDate {
    let days_until_monday = match date.weekday() {
        Weekday::Mon => 0,
        Weekday::Tue => 6,
        Weekday::Wed => 5,
        Weekday::Thu => 4,
        Weekday::Fri => 3,
        Weekday::Sat => 2,
        Weekday::Sun => 1,
    };
    date + Duration::days(days_until_monday)
}

/// Pick a value based on a weighted distribution.
fn pick_count(rng: &mut StdRng, distribution: &[(i64, f64)]) -> i64 {
    let total_weight: f64 = distribution.iter().map(|(_, w)| w).sum();
    let mut choice = rng.gen::<f64>() * total_weight;

    for (value, weight) in distribution {
        if choice < *weight {
            return *value;
        }
        choice -= weight;
    }
    distribution.last().map(|(v, _)| *v).unwrap_or(0)
}

const FIRST_NAMES: &[&str] = &[
    "Amy", "Beth", "Carl", "Dan", "Elsa", "Flo", "Gus", "Hugo", "Ivy", "Jay",
];
const LAST_NAMES: &[&str] = &[
    "Cole", "Fox", "Green", "Jones", "King", "Li", "Poe", "Rye", "Smith", "Watt",
];

fn generate_name_permutations(rng: &mut StdRng) -> Vec<String> {
    let mut names = Vec::with_capacity(FIRST_NAMES.len() * LAST_NAMES.len());
    for first in FIRST_NAMES {
        for last in LAST_NAMES {
            names.push(format!("{first}{last}"));
        }
    }
    names.shuffle(rng);
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_small() {
        let doc = generate(DemoData::Small);
        assert_eq!(doc.employees.len(), 12);
        assert_eq!(doc.demand_items.len(), 2);
        for item in &doc.demand_items {
            assert_eq!(item.requirements.len(), 3);
        }
    }

    #[test]
    fn test_generate_large() {
        let doc = generate(DemoData::Large);
        assert_eq!(doc.employees.len(), 45);
        assert_eq!(doc.demand_items.len(), 5);
    }

    #[test]
    fn test_employees_have_required_qualification() {
        let doc = generate(DemoData::Small);
        for employee in &doc.employees {
            assert!(
                employee.skills.contains("FIREARMS") || employee.skills.contains("FIRSTAID"),
                "employee {} has no required qualification",
                employee.employee_id
            );
        }
    }

    #[test]
    fn test_some_licenses_are_already_expired() {
        let doc = generate(DemoData::Large);
        let any_expired = doc
            .employees
            .iter()
            .flat_map(|e| e.licenses.iter())
            .any(|l| l.expiry_date < doc.planning_horizon.start_date);
        assert!(any_expired, "demo data should exercise expired-licence handling");
    }

    #[test]
    fn test_demo_data_from_str() {
        assert_eq!("SMALL".parse::<DemoData>(), Ok(DemoData::Small));
        assert_eq!("small".parse::<DemoData>(), Ok(DemoData::Small));
        assert_eq!("LARGE".parse::<DemoData>(), Ok(DemoData::Large));
        assert!("invalid".parse::<DemoData>().is_err());
    }

    #[test]
    fn test_valid_context() {
        let doc = generate(DemoData::Small);
        assert!(doc.into_context().is_ok());
    }
}
