//! Roster engine: a workforce shift-scheduling MILP for a regulated
//! security-officer operation.
//!
//! Pipeline: `input` parses and validates the planning document into a
//! typed `Context`; `slots` expands demand into atomic decision units;
//! `candidates` and `model` build the `good_lp` problem (structural
//! constraints plus the hard-constraint catalogue in `hard_constraints`);
//! `solver` runs it; `validator` independently re-derives every hard rule
//! and scores the soft-rule catalogue in `soft_constraints`; `output`
//! assembles the result document. `api` and `bin/cli.rs` are thin
//! frontends over that pipeline.

pub mod api;
pub mod candidates;
pub mod demo_data;
pub mod domain;
pub mod error;
pub mod hard_constraints;
pub mod input;
pub mod model;
pub mod output;
pub mod slots;
pub mod soft_constraints;
pub mod solver;
pub mod time;
pub mod validator;
