use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use mp_app::{AppError, AppResult, RunRequest, RunSummary, exit_code, run_service};
use mp_sim::{SimProgress, StopToken};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mp-cli")]
#[command(about = "Multiphysics CLI - coupled fusion/EM simulation with PID control", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and write its trajectory as CSV
    Run {
        /// Path to the scenario file (.yaml, .yml or .json)
        scenario_path: PathBuf,
        /// Output CSV file path
        #[arg(short, long, default_value = "trajectory.csv")]
        out: PathBuf,
        /// Also write <out>.manifest.json
        #[arg(long)]
        manifest: bool,
        /// Show a progress bar
        #[arg(long)]
        progress: bool,
        /// Stop the run after this many wall-clock seconds
        #[arg(long)]
        wall_timeout: Option<f64>,
    },
    /// Validate a scenario without running it
    Validate {
        /// Path to the scenario file
        scenario_path: PathBuf,
    },
    /// Print the CSV columns a scenario would produce
    Columns {
        /// Path to the scenario file
        scenario_path: PathBuf,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            scenario_path,
            out,
            manifest,
            progress,
            wall_timeout,
        } => cmd_run(&scenario_path, &out, manifest, progress, wall_timeout),
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path).map(|_| exit_code::OK),
        Commands::Columns { scenario_path } => cmd_columns(&scenario_path).map(|_| exit_code::OK),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            report_error(&e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn cmd_run(
    scenario_path: &Path,
    out: &Path,
    manifest: bool,
    progress: bool,
    wall_timeout: Option<f64>,
) -> AppResult<u8> {
    println!("Running scenario: {}", scenario_path.display());

    let request = RunRequest {
        scenario_path,
        output_path: out,
        write_manifest: manifest,
    };
    let stop = StopToken::new();
    let deadline = wall_timeout.and_then(|s| Duration::try_from_secs_f64(s).ok());

    let started = Instant::now();
    let mut last_emit = Instant::now();
    let mut last_fraction = -1.0f64;
    let mut on_progress = |p: &SimProgress| {
        if deadline.is_some_and(|d| started.elapsed() >= d) && !stop.is_stop_requested() {
            warn!(step = p.step, t = p.t, "wall-clock timeout reached, stopping run");
            stop.request_stop();
        }
        if progress
            && ((p.fraction_complete - last_fraction).abs() >= 0.005
                || last_emit.elapsed().as_millis() >= 100)
        {
            render_progress(p, started.elapsed().as_secs_f64());
            last_fraction = p.fraction_complete;
            last_emit = Instant::now();
        }
    };

    let result = run_service::run_scenario_with_progress(&request, &stop, Some(&mut on_progress));
    if progress {
        clear_progress_line();
    }
    let summary = result?;
    print_summary(&summary);
    Ok(summary.exit_code())
}

fn cmd_validate(scenario_path: &Path) -> AppResult<()> {
    println!("Validating scenario: {}", scenario_path.display());
    let summary = run_service::validate_scenario(scenario_path)?;
    println!("✓ Scenario is valid");
    println!("  Modules: {}", summary.modules.join(", "));
    println!("  Steps: {}", summary.total_steps);
    println!("  Run id: {}", summary.run_id);
    Ok(())
}

fn cmd_columns(scenario_path: &Path) -> AppResult<()> {
    let summary = run_service::validate_scenario(scenario_path)?;
    println!("{}", summary.columns.join(","));
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    match summary.exit_code() {
        exit_code::CANCELLED => println!("✗ Run cancelled: {}", summary.run_id),
        _ => println!("✓ Simulation completed: {}", summary.run_id),
    }
    println!("  Rows: {}", summary.rows);
    println!("  CSV: {}", summary.csv_path.display());
    if let Some(path) = &summary.manifest_path {
        println!("  Manifest: {}", path.display());
    }
    println!("  Elapsed: {:.3} s", summary.elapsed_wall_s);
}

fn report_error(e: &AppError) {
    match e {
        AppError::Simulation(failure) => {
            eprintln!("✗ {}", failure.error);
            eprintln!(
                "  Failed at step {} (t = {}); {} rows written",
                failure.step,
                failure.t,
                failure.trajectory.len()
            );
        }
        AppError::SimulationUnsaved { failure, source } => {
            eprintln!("✗ {}", failure.error);
            eprintln!(
                "  Failed at step {} (t = {}); partial trajectory not written: {}",
                failure.step, failure.t, source
            );
        }
        other => eprintln!("✗ {other}"),
    }
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(100));
    let _ = io::stdout().flush();
}

fn render_progress(p: &SimProgress, elapsed_s: f64) {
    let width = 28usize;
    let filled = ((p.fraction_complete * width as f64).round() as usize).min(width);
    let bar = format!(
        "{}{}",
        "#".repeat(filled),
        "-".repeat(width.saturating_sub(filled))
    );
    print!(
        "\r[{}] {:>6.2}%  t={:.3}/{:.3}s  step={}/{}  elapsed={:.1}s",
        bar,
        p.fraction_complete * 100.0,
        p.t,
        p.t_end,
        p.step,
        p.total_steps,
        elapsed_s
    );
    let _ = io::stdout().flush();
}
