//! Run manifest types.

use mp_sim::{SimFailure, Termination, Trajectory};
use serde::{Deserialize, Serialize};

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Cancelled,
    Failed { step: u64, t: f64, error: String },
}

impl From<Termination> for RunOutcome {
    fn from(termination: Termination) -> Self {
        match termination {
            Termination::Completed => RunOutcome::Completed,
            Termination::Cancelled => RunOutcome::Cancelled,
        }
    }
}

impl From<&SimFailure> for RunOutcome {
    fn from(failure: &SimFailure) -> Self {
        RunOutcome::Failed {
            step: failure.step,
            t: failure.t,
            error: failure.error.to_string(),
        }
    }
}

/// Metadata written next to the CSV output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    /// RFC 3339 creation time (UTC).
    pub created: String,
    pub engine_version: String,
    pub outcome: RunOutcome,
    /// Accepted steps written to the CSV.
    pub rows: usize,
    pub columns: Vec<String>,
    pub t_start: f64,
    pub dt: f64,
    pub t_end: f64,
}

impl RunManifest {
    pub fn new(
        run_id: String,
        engine_version: &str,
        outcome: RunOutcome,
        trajectory: &Trajectory,
        dt: f64,
        t_end: f64,
    ) -> Self {
        Self {
            run_id,
            created: chrono::Utc::now().to_rfc3339(),
            engine_version: engine_version.to_string(),
            outcome,
            rows: trajectory.len(),
            columns: trajectory.columns().into_iter().map(String::from).collect(),
            t_start: trajectory.initial().t,
            dt,
            t_end,
        }
    }
}
