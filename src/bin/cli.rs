//! CLI entry point: `--in FILE --out FILE? --time SECS`.
//!
//! Exits 0 on any terminating solve, including INFEASIBLE — a completed
//! run with zero assignments is still a successful invocation of the tool.
//! A non-zero exit means the run itself never completed (bad input file,
//! unparseable JSON, I/O failure writing the result).

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use uuid::Uuid;

use roster_engine::input::InputDocument;
use roster_engine::output::{self, BuildOutputArgs};
use roster_engine::{slots, solver, validator};

#[derive(Parser, Debug)]
#[command(author, version, about = "Workforce shift-scheduling engine for regulated security-officer rosters")]
struct Cli {
    /// Input planning document (JSON).
    #[arg(long = "in")]
    input: PathBuf,

    /// Output document path. Defaults to `output_DDMM_HHMM.json` in the
    /// current directory.
    #[arg(long = "out")]
    output: Option<PathBuf>,

    /// Solver time limit in seconds. Overrides the input document's own
    /// `timeLimit` field when set.
    #[arg(long = "time")]
    time: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    run(Cli::parse())
}

fn run(cli: Cli) -> Result<()> {
    let raw_text = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("reading input file {}", cli.input.display()))?;
    let raw: serde_json::Value =
        serde_json::from_str(&raw_text).with_context(|| "input file is not valid JSON")?;

    let mut doc = InputDocument::parse(&raw_text)?;
    if let Some(time) = cli.time {
        doc.time_limit = Some(time);
    }
    let ctx = doc.into_context()?;

    let run_id = Uuid::new_v4().to_string();
    let started_at = Utc::now();
    tracing::info!(run_id, input = %cli.input.display(), "solve starting");

    let built_slots = slots::build_slots(&ctx);
    let outcome = solver::solve(&ctx, built_slots);

    let assignment_pairs: Vec<(String, Option<String>)> = outcome
        .assignments
        .iter()
        .map(|a| (a.slot_id.clone(), a.employee_id.clone()))
        .collect();
    let report = validator::validate(&outcome.slots, &ctx.employees, &assignment_pairs, &ctx.public_holidays);
    let status = solver::finalize_status(outcome.status, report.unassigned_slots.len(), report.hard_violations.len());

    let ended_at = Utc::now();
    tracing::info!(run_id, ?status, "solve complete");

    let output_doc = output::build_output(BuildOutputArgs {
        raw_input: &raw,
        planning_reference: &ctx.planning_reference,
        run_id,
        solver_version: env!("CARGO_PKG_VERSION"),
        started_at,
        ended_at,
        status,
        slots: &outcome.slots,
        assignments: &outcome.assignments,
        report: &report,
        request_id: None,
        warnings: Vec::new(),
    });

    let out_path = cli.output.unwrap_or_else(|| default_output_path(ended_at));
    let json = serde_json::to_string_pretty(&output_doc)?;
    std::fs::write(&out_path, json).with_context(|| format!("writing output file {}", out_path.display()))?;

    println!("wrote {}", out_path.display());
    Ok(())
}

fn default_output_path(at: chrono::DateTime<Utc>) -> PathBuf {
    PathBuf::from(format!("output_{}.json", at.format("%d%m_%H%M")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_engine::demo_data::{self, DemoData};

    #[test]
    fn round_trips_demo_data_through_the_real_file_system() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("input.json");
        let output_path = dir.path().join("output.json");

        let doc = demo_data::generate(DemoData::Small);
        std::fs::write(&input_path, serde_json::to_string(&doc).unwrap()).unwrap();

        let cli = Cli {
            input: input_path,
            output: Some(output_path.clone()),
            time: Some(5),
        };
        run(cli).expect("a demo-data solve should always complete");

        let written = std::fs::read_to_string(&output_path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert!(value.get("solverRun").is_some());
        assert!(value.get("assignments").is_some());
        assert!(value.get("meta").and_then(|m| m.get("inputHash")).is_some());
    }
}
