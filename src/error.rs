//! Error types for the roster engine.
//!
//! Library code returns [`RosterError`] only for programmer/input errors that
//! occur before a model can even be built. Data-driven outcomes (infeasibility,
//! unassigned slots, backend UNKNOWN) are never errors — see `solver.rs`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("invalid input: {0}")]
    Input(String),

    #[error("invalid date/time: {0}")]
    DateTime(String),

    #[error("solver backend error: {0}")]
    Backend(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RosterError>;
