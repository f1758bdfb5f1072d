//! Output document assembly, mirroring `original_source/src/output_builder.py`
//! so the CLI and HTTP frontends produce byte-identical shapes from the same
//! solve.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::solver::{Assignment, SolverStatus};
use crate::time::{split_shift_hours, HourBreakdown};
use crate::validator::ValidationReport;

/// Keys that exist only on the in-memory runtime context, never on the
/// wire-format input document, and so must be excluded before hashing.
const RUNTIME_KEYS: &[&str] = &[
    "slots",
    "x",
    "model",
    "timeLimit",
    "unassigned",
    "offset_vars",
    "optimized_offsets",
    "total_unassigned",
];

/// `sha256:` + hex digest of the canonical (sorted-key, compact) JSON form
/// of the raw input document with runtime keys stripped. `serde_json::Value`
/// objects are backed by a `BTreeMap` (this crate enables no
/// `preserve_order` feature), so round-tripping through `Value` already
/// yields sorted keys with `serde_json`'s default compact separators.
pub fn compute_input_hash(raw_input: &serde_json::Value) -> String {
    let mut clean = raw_input.clone();
    if let Some(obj) = clean.as_object_mut() {
        for key in RUNTIME_KEYS {
            obj.remove(*key);
        }
    }
    let canonical = serde_json::to_string(&clean).unwrap_or_default();
    let digest = Sha256::digest(canonical.as_bytes());
    format!("sha256:{digest:x}")
}

#[derive(Debug, Serialize)]
pub struct SolverRun {
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(rename = "solverVersion")]
    pub solver_version: String,
    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,
    pub ended: DateTime<Utc>,
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: f64,
    pub status: SolverStatus,
}

#[derive(Debug, Serialize)]
pub struct Score {
    pub overall: f64,
    pub hard: usize,
    pub soft: usize,
}

#[derive(Debug, Serialize)]
pub struct HardBreakdown {
    pub violations: Vec<crate::validator::HardViolation>,
}

#[derive(Debug, Serialize)]
pub struct SoftBreakdown {
    #[serde(rename = "totalPenalty")]
    pub total_penalty: usize,
    pub details: Vec<crate::soft_constraints::SoftViolation>,
}

#[derive(Debug, Serialize)]
pub struct UnassignedBreakdown {
    pub count: usize,
    pub total: usize,
    pub percentage: f64,
    pub slots: Vec<crate::validator::UnassignedSlotNote>,
}

#[derive(Debug, Serialize)]
pub struct ScoreBreakdown {
    pub hard: HardBreakdown,
    pub soft: SoftBreakdown,
    #[serde(rename = "unassignedSlots")]
    pub unassigned_slots: UnassignedBreakdown,
}

#[derive(Debug, Serialize)]
pub struct AssignmentRecord {
    #[serde(rename = "assignmentId")]
    pub assignment_id: String,
    #[serde(rename = "demandId")]
    pub demand_id: String,
    #[serde(rename = "requirementId")]
    pub requirement_id: String,
    pub date: chrono::NaiveDate,
    #[serde(rename = "shiftCode")]
    pub shift_code: String,
    #[serde(rename = "slotId")]
    pub slot_id: String,
    #[serde(rename = "startDateTime")]
    pub start_date_time: chrono::NaiveDateTime,
    #[serde(rename = "endDateTime")]
    pub end_date_time: chrono::NaiveDateTime,
    #[serde(rename = "employeeId")]
    pub employee_id: Option<String>,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub hours: HourBreakdown,
}

#[derive(Debug, Serialize)]
pub struct Meta {
    #[serde(rename = "inputHash")]
    pub input_hash: String,
    #[serde(rename = "generatedAt")]
    pub generated_at: DateTime<Utc>,
    #[serde(rename = "employeeHours")]
    pub employee_hours: HashMap<String, crate::validator::EmployeeHours>,
    #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct OutputDocument {
    #[serde(rename = "schemaVersion")]
    pub schema_version: &'static str,
    #[serde(rename = "planningReference")]
    pub planning_reference: String,
    #[serde(rename = "solverRun")]
    pub solver_run: SolverRun,
    pub score: Score,
    #[serde(rename = "scoreBreakdown")]
    pub score_breakdown: ScoreBreakdown,
    pub assignments: Vec<AssignmentRecord>,
    #[serde(rename = "unmetDemand")]
    pub unmet_demand: Vec<serde_json::Value>,
    pub meta: Meta,
}

fn assignment_record(slots: &[crate::domain::Slot], a: &Assignment, unassigned_reason: Option<String>) -> AssignmentRecord {
    let slot = slots
        .iter()
        .find(|s| s.slot_id == a.slot_id)
        .expect("every Assignment is built from the same slot list it's paired with");
    AssignmentRecord {
        assignment_id: format!("{}-{}", a.demand_id, a.slot_id),
        demand_id: a.demand_id.clone(),
        requirement_id: a.requirement_id.clone(),
        date: slot.date,
        shift_code: slot.shift_code.clone(),
        slot_id: a.slot_id.clone(),
        start_date_time: slot.start,
        end_date_time: slot.end,
        employee_id: a.employee_id.clone(),
        status: if a.assigned { "ASSIGNED" } else { "UNASSIGNED" },
        reason: if a.assigned { None } else { unassigned_reason },
        hours: split_shift_hours(slot.start, slot.end),
    }
}

pub struct BuildOutputArgs<'a> {
    pub raw_input: &'a serde_json::Value,
    pub planning_reference: &'a str,
    pub run_id: String,
    pub solver_version: &'static str,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub status: SolverStatus,
    pub slots: &'a [crate::domain::Slot],
    pub assignments: &'a [Assignment],
    pub report: &'a ValidationReport,
    pub request_id: Option<String>,
    pub warnings: Vec<String>,
}

pub fn build_output(args: BuildOutputArgs) -> OutputDocument {
    let total = args.assignments.len();
    let unassigned_count = args.report.unassigned_slots.len();
    let unassigned_by_slot: HashMap<&str, &crate::validator::UnassignedSlotNote> = args
        .report
        .unassigned_slots
        .iter()
        .map(|u| (u.slot_id.as_str(), u))
        .collect();

    let assignments: Vec<AssignmentRecord> = args
        .assignments
        .iter()
        .map(|a| {
            let reason = unassigned_by_slot.get(a.slot_id.as_str()).map(|u| u.reason.clone());
            assignment_record(args.slots, a, reason)
        })
        .collect();

    let percentage = if total == 0 {
        0.0
    } else {
        unassigned_count as f64 / total as f64 * 100.0
    };

    let duration_seconds = (args.ended_at - args.started_at).num_milliseconds() as f64 / 1000.0;

    OutputDocument {
        schema_version: "0.43",
        planning_reference: args.planning_reference.to_string(),
        solver_run: SolverRun {
            run_id: args.run_id,
            solver_version: args.solver_version.to_string(),
            started_at: args.started_at,
            ended: args.ended_at,
            duration_seconds,
            status: args.status,
        },
        score: Score {
            overall: -(args.report.hard as f64) * 1_000_000.0 - args.report.soft as f64,
            hard: args.report.hard,
            soft: args.report.soft,
        },
        score_breakdown: ScoreBreakdown {
            hard: HardBreakdown {
                violations: args.report.hard_violations.clone(),
            },
            soft: SoftBreakdown {
                total_penalty: args.report.soft,
                details: args.report.soft_violations.clone(),
            },
            unassigned_slots: UnassignedBreakdown {
                count: unassigned_count,
                total,
                percentage,
                slots: args.report.unassigned_slots.clone(),
            },
        },
        assignments,
        unmet_demand: Vec::new(),
        meta: Meta {
            input_hash: compute_input_hash(args.raw_input),
            generated_at: Utc::now(),
            employee_hours: args.report.employee_hours.clone(),
            request_id: args.request_id,
            warnings: args.warnings,
        },
    }
}
