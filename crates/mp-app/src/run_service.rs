//! Run execution: load, assemble, run, write.

use std::path::{Path, PathBuf};
use std::time::Instant;

use mp_project::ScenarioConfig;
use mp_results::{OutputSink, RunManifest, RunOutcome, compute_run_id};
use mp_sim::{SimProgress, StopToken};
use tracing::{info, warn};

use crate::error::{AppError, AppResult, exit_code};
use crate::scenario::build_simulation;

/// Version recorded in run manifests and mixed into run ids.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone)]
pub struct RunRequest<'a> {
    pub scenario_path: &'a Path,
    /// CSV output path.
    pub output_path: &'a Path,
    /// Also write `<output>.manifest.json`.
    pub write_manifest: bool,
}

/// Outcome of a run that produced output.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub outcome: RunOutcome,
    pub rows: usize,
    pub csv_path: PathBuf,
    pub manifest_path: Option<PathBuf>,
    pub elapsed_wall_s: f64,
}

impl RunSummary {
    pub fn exit_code(&self) -> u8 {
        match self.outcome {
            RunOutcome::Cancelled => exit_code::CANCELLED,
            _ => exit_code::OK,
        }
    }
}

/// What a scenario would run, without running it.
#[derive(Debug, Clone)]
pub struct ScenarioSummary {
    pub modules: Vec<&'static str>,
    pub columns: Vec<String>,
    pub total_steps: u64,
    pub run_id: String,
}

/// Load and assemble a scenario to check it end to end.
pub fn validate_scenario(path: &Path) -> AppResult<ScenarioSummary> {
    let config = mp_project::load(path)?;
    let sim = build_simulation(&config)?;
    let columns = std::iter::once("t".to_string())
        .chain(sim.layout().names().iter().cloned())
        .chain(mp_core::ControlCommand::COLUMNS.iter().map(|c| c.to_string()))
        .collect();
    Ok(ScenarioSummary {
        modules: sim.model().module_names(),
        columns,
        total_steps: sim.total_steps(),
        run_id: compute_run_id(&config, ENGINE_VERSION)?,
    })
}

pub fn run_scenario(request: &RunRequest<'_>, stop: &StopToken) -> AppResult<RunSummary> {
    run_scenario_with_progress(request, stop, None)
}

pub fn run_scenario_with_progress(
    request: &RunRequest<'_>,
    stop: &StopToken,
    progress: Option<&mut dyn FnMut(&SimProgress)>,
) -> AppResult<RunSummary> {
    let config = mp_project::load(request.scenario_path)?;
    info!(path = %request.scenario_path.display(), "scenario loaded");

    let sink = if request.write_manifest {
        OutputSink::with_manifest(request.output_path.to_path_buf())
    } else {
        OutputSink::new(request.output_path.to_path_buf())
    };
    run_config(&config, &sink, stop, progress)
}

/// Run an already loaded scenario and write its trajectory to `sink`.
///
/// A failed run still writes every step accepted before the failure. If
/// that write fails too, the error is [`AppError::SimulationUnsaved`].
pub fn run_config(
    config: &ScenarioConfig,
    sink: &OutputSink,
    stop: &StopToken,
    progress: Option<&mut dyn FnMut(&SimProgress)>,
) -> AppResult<RunSummary> {
    let started = Instant::now();
    let sim = build_simulation(config)?;
    let run_id = compute_run_id(config, ENGINE_VERSION)?;

    let report = match sim.run_with_progress(stop, progress) {
        Ok(report) => report,
        Err(failure) => {
            let manifest = RunManifest::new(
                run_id,
                ENGINE_VERSION,
                RunOutcome::from(&failure),
                &failure.trajectory,
                config.dt,
                config.t_end,
            );
            let failure = Box::new(failure);
            return match sink.save(&failure.trajectory, &manifest) {
                Ok(()) => {
                    info!(
                        rows = failure.trajectory.len(),
                        path = %sink.csv_path().display(),
                        "partial trajectory written"
                    );
                    Err(AppError::Simulation(failure))
                }
                Err(source) => {
                    warn!(error = %source, "could not write partial trajectory");
                    Err(AppError::SimulationUnsaved { failure, source })
                }
            };
        }
    };

    let outcome = RunOutcome::from(report.termination);
    let manifest = RunManifest::new(
        run_id.clone(),
        ENGINE_VERSION,
        outcome.clone(),
        &report.trajectory,
        config.dt,
        config.t_end,
    );
    sink.save(&report.trajectory, &manifest)?;

    let summary = RunSummary {
        run_id,
        outcome,
        rows: report.trajectory.len(),
        csv_path: sink.csv_path().to_path_buf(),
        manifest_path: sink.manifest_path().map(Path::to_path_buf),
        elapsed_wall_s: started.elapsed().as_secs_f64(),
    };
    info!(
        run_id = %summary.run_id,
        rows = summary.rows,
        outcome = ?summary.outcome,
        elapsed_s = summary.elapsed_wall_s,
        "results written"
    );
    Ok(summary)
}
