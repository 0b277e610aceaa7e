//! Append-only record of accepted steps.

use mp_core::{ControlCommand, StateLayout, StateVector};

/// State of the coupled system after one accepted step.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    /// Step index after advancing (the first accepted step is 1).
    pub step: u64,
    /// Simulation time (seconds).
    pub t: f64,
    /// Composite state, in layout order.
    pub state: StateVector,
    /// Command held during the step that produced this snapshot.
    pub control: ControlCommand,
}

impl Snapshot {
    fn bits(&self) -> impl Iterator<Item = u64> + '_ {
        std::iter::once(self.step)
            .chain(std::iter::once(self.t.to_bits()))
            .chain(self.state.iter().map(|v| v.to_bits()))
            .chain(self.control.components().into_iter().map(f64::to_bits))
    }
}

/// Ordered time series produced by a run.
///
/// Rows are accepted steps only; the initial condition is kept separately.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    state_columns: Vec<String>,
    initial: Snapshot,
    rows: Vec<Snapshot>,
}

impl Trajectory {
    pub fn new(layout: &StateLayout, initial: Snapshot) -> Self {
        Self {
            state_columns: layout.names().to_vec(),
            initial,
            rows: Vec::new(),
        }
    }

    /// Append an accepted step.
    pub fn push(&mut self, snapshot: Snapshot) {
        debug_assert_eq!(snapshot.state.len(), self.state_columns.len());
        debug_assert!(snapshot.t > self.last_time(), "time must increase");
        self.rows.push(snapshot);
    }

    pub fn initial(&self) -> &Snapshot {
        &self.initial
    }

    pub fn rows(&self) -> &[Snapshot] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.rows.last()
    }

    /// Time of the last row, or of the initial condition.
    pub fn last_time(&self) -> f64 {
        self.rows.last().map_or(self.initial.t, |s| s.t)
    }

    pub fn state_columns(&self) -> &[String] {
        &self.state_columns
    }

    /// Full output header: `t`, state variables, control components.
    pub fn columns(&self) -> Vec<&str> {
        std::iter::once("t")
            .chain(self.state_columns.iter().map(String::as_str))
            .chain(ControlCommand::COLUMNS.iter().copied())
            .collect()
    }

    /// Values of one state variable over all rows.
    pub fn series(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.state_columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|s| s.state[idx]).collect())
    }

    pub fn times(&self) -> Vec<f64> {
        self.rows.iter().map(|s| s.t).collect()
    }

    pub fn controls(&self) -> Vec<f64> {
        self.rows.iter().map(|s| s.control.value()).collect()
    }

    /// Bit-for-bit equality, including the sign of zero and NaN payloads.
    pub fn bitwise_eq(&self, other: &Trajectory) -> bool {
        self.state_columns == other.state_columns
            && self.rows.len() == other.rows.len()
            && self.initial.bits().eq(other.initial.bits())
            && self
                .rows
                .iter()
                .zip(&other.rows)
                .all(|(a, b)| a.bits().eq(b.bits()))
    }
}
