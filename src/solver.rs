//! Component G: solve driver, status mapping, and the status override.
//!
//! Builds on `model.rs`'s `good_lp` problem, runs it against `highs`, and
//! turns the raw solver verdict plus the re-derived violation count into
//! the one status the rest of the system trusts. Mirrors
//! `original_source/context/engine/solver_engine.py::solve`.

use good_lp::solvers::highs::highs;
use good_lp::{ResolutionError, Solution, SolverModel};
use tracing::{debug, info, warn};

use crate::candidates::build_candidates;
use crate::domain::{Employee, Slot};
use crate::input::Context;
use crate::model::{self, DecisionVariables};

/// The statuses a solve can end in. `Infeasible` is reachable either because
/// the backend itself reported it, or via the status override below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolverStatus {
    Optimal,
    Feasible,
    Infeasible,
    ModelInvalid,
    Unknown,
}

/// One slot's outcome after the solve.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Assignment {
    pub slot_id: String,
    pub demand_id: String,
    pub requirement_id: String,
    pub employee_id: Option<String>,
    pub assigned: bool,
}

pub struct SolveOutcome {
    pub status: SolverStatus,
    pub slots: Vec<Slot>,
    pub assignments: Vec<Assignment>,
}

fn map_backend_status<S>(result: &Result<S, ResolutionError>) -> SolverStatus {
    match result {
        Ok(_) => SolverStatus::Optimal,
        Err(ResolutionError::Infeasible) => SolverStatus::Infeasible,
        Err(ResolutionError::Unbounded) => SolverStatus::ModelInvalid,
        Err(_) => SolverStatus::Unknown,
    }
}

/// Re-derives whether the solution is operationally feasible: an unassigned
/// slot is absorbed into the objective as a soft penalty, but it is
/// semantically hard. Any unassigned slot, or a non-empty post-solve hard
/// violation count, forces the status to INFEASIBLE no matter what the
/// backend itself reported. Kept in exactly this one place.
pub fn finalize_status(backend_status: SolverStatus, unassigned_count: usize, hard_violation_count: usize) -> SolverStatus {
    if unassigned_count > 0 || hard_violation_count > 0 {
        return SolverStatus::Infeasible;
    }
    backend_status
}

fn extract_assignments(slots: &[Slot], employees: &[Employee], dv: &DecisionVariables, solution: &impl Solution) -> Vec<Assignment> {
    slots
        .iter()
        .enumerate()
        .map(|(si, slot)| {
            let employee_id = (0..employees.len()).find_map(|ei| {
                dv.x.get(&(si, ei))
                    .filter(|&&v| solution.value(v) > 0.5)
                    .map(|_| employees[ei].employee_id.clone())
            });
            Assignment {
                slot_id: slot.slot_id.clone(),
                demand_id: slot.demand_id.clone(),
                requirement_id: slot.requirement_id.clone(),
                assigned: employee_id.is_some(),
                employee_id,
            }
        })
        .collect()
}

fn all_unassigned(slots: &[Slot]) -> Vec<Assignment> {
    slots
        .iter()
        .map(|slot| Assignment {
            slot_id: slot.slot_id.clone(),
            demand_id: slot.demand_id.clone(),
            requirement_id: slot.requirement_id.clone(),
            employee_id: None,
            assigned: false,
        })
        .collect()
}

/// Runs candidate filtering, model construction, and the solve itself
/// against a slot list the caller already built (`slots.rs::build_slots`).
/// Never returns `Err` for data-driven outcomes (infeasibility, unassigned
/// slots, backend UNKNOWN) per §7 — those become populated `SolveOutcome`s.
/// Only an unhandled backend error propagates, and even then this function
/// returns `Ok` with every slot unassigned rather than bubbling it, since
/// §7 reserves `Err(RosterError)` for pre-model input errors only; callers
/// that want the raw backend error can inspect `SolveOutcome::status`.
pub fn solve(ctx: &Context, slots: Vec<Slot>) -> SolveOutcome {
    info!(slots = slots.len(), employees = ctx.employees.len(), "starting solve");

    let candidates = build_candidates(&slots, &ctx.employees);
    let built = model::build_model(&slots, &ctx.employees, &candidates);
    let dv = built.dv;

    debug!(time_limit = ctx.time_limit_seconds, "solving MILP");
    let problem = built
        .vars
        .minimise(built.objective)
        .using(highs)
        .set_time_limit(ctx.time_limit_seconds as f64);
    let problem = built.constraints.into_iter().fold(problem, |p, c| p.with(c));

    let result = problem.solve();
    let backend_status = map_backend_status(&result);

    let (assignments, unassigned_count) = match &result {
        Ok(solution) => {
            let assignments = extract_assignments(&slots, &ctx.employees, &dv, solution);
            let unassigned_count = assignments.iter().filter(|a| !a.assigned).count();
            (assignments, unassigned_count)
        }
        Err(err) => {
            warn!(error = %err, "solver did not return a solution");
            let assignments = all_unassigned(&slots);
            let unassigned_count = assignments.len();
            (assignments, unassigned_count)
        }
    };

    // Hard-violation re-derivation happens in `validator.rs`; here we only
    // know about unassigned slots, which already force INFEASIBLE when
    // non-zero. `validator.rs` calls `finalize_status` again with its own
    // hard count once computed, and that second call is authoritative for
    // the output document.
    let status = finalize_status(backend_status, unassigned_count, 0);

    info!(?status, unassigned = unassigned_count, "solve complete");

    SolveOutcome {
        status,
        slots,
        assignments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_override_forces_infeasible_on_unassigned() {
        assert_eq!(finalize_status(SolverStatus::Optimal, 1, 0), SolverStatus::Infeasible);
    }

    #[test]
    fn status_override_forces_infeasible_on_hard_violation() {
        assert_eq!(finalize_status(SolverStatus::Optimal, 0, 2), SolverStatus::Infeasible);
    }

    #[test]
    fn status_passes_through_when_clean() {
        assert_eq!(finalize_status(SolverStatus::Optimal, 0, 0), SolverStatus::Optimal);
    }
}
