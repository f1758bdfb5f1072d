//! HTTP surface: `GET /health`, `GET /version`, `POST /solve`, `POST
//! /configure` (stub), `GET /schema`. Thin — every handler delegates
//! straight to the core pipeline (`slots` -> `solver` -> `validator` ->
//! `output`) and adds nothing of its own beyond request plumbing.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::input::InputDocument;
use crate::output::{self, BuildOutputArgs};
use crate::solver::{self, SolverStatus};
use crate::validator;

const REQUEST_ID_HEADER: &str = "x-request-id";
const SOLVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The only shared mutable state in the process: a bounded history of
/// recent solves, keyed by run id, for operator diagnostics. Nothing reads
/// it back over HTTP today; it exists so a future `/solves/{id}` lookup
/// doesn't need a second store.
pub struct AppState {
    recent: RwLock<HashMap<String, serde_json::Value>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            recent: RwLock::new(HashMap::new()),
        }
    }

    fn remember(&self, run_id: String, doc: &serde_json::Value) {
        let mut recent = self.recent.write();
        if recent.len() > 200 {
            recent.clear();
        }
        recent.insert(run_id, doc.clone());
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/solve", post(solve))
        .route("/configure", post(configure))
        .route("/schema", get(schema))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VersionResponse {
    name: &'static str,
    version: &'static str,
    output_schema_version: &'static str,
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        name: "roster-engine",
        version: SOLVER_VERSION,
        output_schema_version: "0.43",
    })
}

#[derive(Debug, Deserialize)]
struct SolveQuery {
    #[serde(default)]
    time_limit: Option<u64>,
    #[serde(default)]
    strict: bool,
    #[serde(default = "default_true")]
    validate: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// POST /solve - runs the full pipeline synchronously and returns the
/// output document. `time_limit` overrides the input document's own
/// `timeLimit`; `strict` turns a final INFEASIBLE status into HTTP 422
/// instead of 200; `validate` toggles the independent post-solve
/// re-derivation pass (on by default).
async fn solve(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SolveQuery>,
    headers: HeaderMap,
    Json(raw): Json<serde_json::Value>,
) -> (StatusCode, HeaderMap, Json<serde_json::Value>) {
    let req_id = request_id(&headers);
    let mut response_headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&req_id) {
        response_headers.insert(REQUEST_ID_HEADER, value);
    }

    let mut doc: InputDocument = match serde_json::from_value(raw.clone()) {
        Ok(doc) => doc,
        Err(err) => {
            warn!(request_id = %req_id, error = %err, "input document failed to parse");
            return (
                StatusCode::BAD_REQUEST,
                response_headers,
                Json(serde_json::to_value(ErrorResponse { error: err.to_string() }).unwrap()),
            );
        }
    };
    if let Some(time_limit) = query.time_limit {
        doc.time_limit = Some(time_limit);
    }

    let ctx = match doc.into_context() {
        Ok(ctx) => ctx,
        Err(err) => {
            warn!(request_id = %req_id, error = %err, "input document rejected");
            return (
                StatusCode::BAD_REQUEST,
                response_headers,
                Json(serde_json::to_value(ErrorResponse { error: err.to_string() }).unwrap()),
            );
        }
    };

    let run_id = Uuid::new_v4().to_string();
    let started_at = Utc::now();
    info!(request_id = %req_id, run_id, "solve requested");

    let slots = crate::slots::build_slots(&ctx);
    let outcome = solver::solve(&ctx, slots);

    let assignment_pairs: Vec<(String, Option<String>)> = outcome
        .assignments
        .iter()
        .map(|a| (a.slot_id.clone(), a.employee_id.clone()))
        .collect();

    let (status, report) = if query.validate {
        let report = validator::validate(&outcome.slots, &ctx.employees, &assignment_pairs, &ctx.public_holidays);
        let status = solver::finalize_status(outcome.status, report.unassigned_slots.len(), report.hard_violations.len());
        (status, report)
    } else {
        let unassigned_slots = outcome
            .assignments
            .iter()
            .filter(|a| !a.assigned)
            .map(|a| validator::UnassignedSlotNote {
                slot_id: a.slot_id.clone(),
                demand_id: a.demand_id.clone(),
                requirement_id: a.requirement_id.clone(),
                date: outcome
                    .slots
                    .iter()
                    .find(|s| s.slot_id == a.slot_id)
                    .map(|s| s.date)
                    .unwrap_or(ctx.horizon.start_date),
                reason: "validation skipped (validate=false)".to_string(),
            })
            .collect::<Vec<_>>();
        let unassigned_count = unassigned_slots.len();
        let report = validator::ValidationReport {
            hard: unassigned_count,
            soft: 0,
            hard_violations: Vec::new(),
            soft_violations: Vec::new(),
            unassigned_slots,
            employee_hours: HashMap::new(),
        };
        (outcome.status, report)
    };

    let ended_at = Utc::now();
    info!(request_id = %req_id, run_id, ?status, "solve complete");

    let output_doc = output::build_output(BuildOutputArgs {
        raw_input: &raw,
        planning_reference: &ctx.planning_reference,
        run_id: run_id.clone(),
        solver_version: SOLVER_VERSION,
        started_at,
        ended_at,
        status,
        slots: &outcome.slots,
        assignments: &outcome.assignments,
        report: &report,
        request_id: Some(req_id),
        warnings: Vec::new(),
    });

    let output_value = serde_json::to_value(output_doc).expect("OutputDocument always serializes");
    state.remember(run_id, &output_value);

    let http_status = if query.strict && status == SolverStatus::Infeasible {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };

    (http_status, response_headers, Json(output_value))
}

/// POST /configure - stub. The real configuration optimiser (workforce
/// sizing) lives outside this engine's scope; this endpoint exists as a
/// documented collaborator boundary rather than a 404.
async fn configure(Json(body): Json<serde_json::Value>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "not_implemented",
        "request": body,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SchemaResponse {
    input_schema_version_range: &'static str,
    output_schema_version: &'static str,
    notes: &'static str,
}

async fn schema() -> Json<SchemaResponse> {
    Json(SchemaResponse {
        input_schema_version_range: "0.43-0.70",
        output_schema_version: "0.43",
        notes: "full JSON Schema documents are not generated; see the InputDocument/OutputDocument types for the authoritative shape",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_validate_is_true() {
        let query: SolveQuery = serde_json::from_str("{}").unwrap();
        assert!(query.validate);
        assert!(!query.strict);
        assert_eq!(query.time_limit, None);
    }

    #[test]
    fn query_params_parse() {
        let query: SolveQuery =
            serde_json::from_str(r#"{"time_limit":30,"strict":true,"validate":false}"#).unwrap();
        assert_eq!(query.time_limit, Some(30));
        assert!(query.strict);
        assert!(!query.validate);
    }
}
