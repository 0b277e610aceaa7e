//! End-to-end runs of the demo scenarios.

use std::path::{Path, PathBuf};

use mp_app::{AppError, RunRequest, run_scenario, run_scenario_with_progress, validate_scenario};
use mp_results::{RunOutcome, load_manifest};
use mp_sim::{SimError, StopToken};

fn demo(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name)
}

fn out_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("mp_app_tests").join(test);
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn coupled_demo_runs_to_completion() {
    let scenario = demo("coupled.yaml");
    let output = out_dir("coupled").join("run.csv");
    let request = RunRequest {
        scenario_path: &scenario,
        output_path: &output,
        write_manifest: true,
    };

    let summary = run_scenario(&request, &StopToken::new()).unwrap();
    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(summary.rows, 1000);

    let csv = std::fs::read_to_string(&output).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("t,n,E,q,i,u"));
    assert_eq!(lines.count(), 1000);

    let manifest = load_manifest(summary.manifest_path.as_deref().unwrap()).unwrap();
    assert_eq!(manifest.run_id, summary.run_id);
    assert_eq!(manifest.rows, 1000);
}

#[test]
fn identical_scenarios_write_identical_csv() {
    let scenario = demo("oscillator.json");
    let dir = out_dir("determinism");
    let run = |name: &str| {
        let output = dir.join(name);
        let request = RunRequest {
            scenario_path: &scenario,
            output_path: &output,
            write_manifest: false,
        };
        let summary = run_scenario(&request, &StopToken::new()).unwrap();
        assert!(summary.manifest_path.is_none());
        std::fs::read_to_string(&output).unwrap()
    };
    assert_eq!(run("a.csv"), run("b.csv"));
}

#[test]
fn runaway_demo_flushes_partial_trajectory() {
    let scenario = demo("runaway.yaml");
    let output = out_dir("runaway").join("run.csv");
    let request = RunRequest {
        scenario_path: &scenario,
        output_path: &output,
        write_manifest: true,
    };

    let err = run_scenario(&request, &StopToken::new()).unwrap_err();
    assert_eq!(err.exit_code(), 3);
    let failure = match err {
        AppError::Simulation(failure) => failure,
        other => panic!("unexpected error: {other}"),
    };
    assert!(matches!(failure.error, SimError::NumericalDivergence { .. }));

    let csv = std::fs::read_to_string(&output).unwrap();
    let rows = csv.lines().count() - 1;
    assert_eq!(rows, failure.trajectory.len());
    assert_eq!(rows as u64, failure.step - 1);
    assert!(!csv.contains("inf") && !csv.contains("NaN"));

    let manifest = load_manifest(&output.with_extension("manifest.json")).unwrap();
    assert!(matches!(manifest.outcome, RunOutcome::Failed { step, .. } if step == failure.step));
}

#[test]
fn cancelled_run_exits_with_cancelled_code() {
    let scenario = demo("coupled.yaml");
    let output = out_dir("cancelled").join("run.csv");
    let request = RunRequest {
        scenario_path: &scenario,
        output_path: &output,
        write_manifest: false,
    };

    let stop = StopToken::new();
    let remote = stop.clone();
    let mut on_progress = |p: &mp_sim::SimProgress| {
        if p.step == 10 {
            remote.request_stop();
        }
    };
    let summary = run_scenario_with_progress(&request, &stop, Some(&mut on_progress)).unwrap();
    assert_eq!(summary.outcome, RunOutcome::Cancelled);
    assert_eq!(summary.exit_code(), 5);
    assert_eq!(summary.rows, 10);
}

#[test]
fn config_errors_exit_with_config_code() {
    let dir = out_dir("bad_config");
    std::fs::create_dir_all(&dir).unwrap();
    let scenario = dir.join("bad.yaml");
    std::fs::write(
        &scenario,
        std::fs::read_to_string(demo("coupled.yaml"))
            .unwrap()
            .replace("dt: 0.01", "dt: -0.01"),
    )
    .unwrap();
    let output = dir.join("run.csv");
    let request = RunRequest {
        scenario_path: &scenario,
        output_path: &output,
        write_manifest: false,
    };

    let err = run_scenario(&request, &StopToken::new()).unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
    assert_eq!(err.exit_code(), 2);
    assert!(!output.exists());
}

#[test]
fn unwritable_output_exits_with_io_code() {
    let dir = out_dir("unwritable");
    std::fs::create_dir_all(&dir).unwrap();
    let blocker = dir.join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    let scenario = demo("oscillator.json");
    let output = blocker.join("run.csv");
    let request = RunRequest {
        scenario_path: &scenario,
        output_path: &output,
        write_manifest: false,
    };

    let err = run_scenario(&request, &StopToken::new()).unwrap_err();
    assert!(matches!(err, AppError::Results(_)));
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn failed_run_with_unwritable_output_keeps_divergence_code() {
    let dir = out_dir("runaway_unwritable");
    std::fs::create_dir_all(&dir).unwrap();
    let blocker = dir.join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    let scenario = demo("runaway.yaml");
    let output = blocker.join("run.csv");
    let request = RunRequest {
        scenario_path: &scenario,
        output_path: &output,
        write_manifest: false,
    };

    let err = run_scenario(&request, &StopToken::new()).unwrap_err();
    assert!(matches!(err, AppError::SimulationUnsaved { .. }));
    assert_eq!(err.exit_code(), 3);
    let failure = err.failure().unwrap();
    assert!(matches!(failure.error, SimError::NumericalDivergence { .. }));
    assert!(!output.exists());
}

#[test]
fn validate_reports_columns_and_steps() {
    let summary = validate_scenario(&demo("coupled.yaml")).unwrap();
    assert_eq!(summary.modules, vec!["fusion0d", "oscillator"]);
    assert_eq!(summary.columns, vec!["t", "n", "E", "q", "i", "u"]);
    assert_eq!(summary.total_steps, 1000);
}
