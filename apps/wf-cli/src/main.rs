mod case;
mod error;

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Instant;
use tracing::info;
use wf_sim::{CouplingProgress, RunStatus, write_table};

use crate::case::Case;
use crate::error::{CliError, CliResult};

#[derive(Parser)]
#[command(name = "wf-cli")]
#[command(about = "wellflow CLI - coupled reservoir and well network simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a case file and build its model without running it
    Check {
        /// Path to the case YAML file
        case_path: PathBuf,
    },
    /// Run a coupled simulation and write the results table
    Run {
        /// Path to the case YAML file
        case_path: PathBuf,
        /// Output table path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Column delimiter
        #[arg(short, long, default_value = "\t")]
        delimiter: String,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { case_path } => cmd_check(&case_path),
        Commands::Run {
            case_path,
            output,
            delimiter,
        } => cmd_run(&case_path, output.as_deref(), &delimiter),
    }
}

fn cmd_check(case_path: &Path) -> CliResult<()> {
    eprintln!("Checking case: {}", case_path.display());
    let case = Case::load(case_path)?;
    let coupled = case.build()?;
    let grid = coupled.reservoir().grid();
    eprintln!("✓ Case '{}' is valid", case.name);
    eprintln!("  Grid: {} x {} cells", grid.ni(), grid.nj());
    eprintln!(
        "  Production elements: {}",
        coupled.production().elements().len()
    );
    if let Some(inj) = coupled.injection() {
        eprintln!("  Injection elements: {}", inj.elements().len());
    }
    Ok(())
}

fn cmd_run(case_path: &Path, output: Option<&Path>, delimiter: &str) -> CliResult<()> {
    let case = Case::load(case_path)?;
    let mut coupled = case.build()?;
    eprintln!("Running case: {}", case.name);
    eprintln!(
        "  dt = {:.3} d, t_end = {:.1} d",
        coupled.options().dt,
        coupled.options().t_end
    );

    let started = Instant::now();
    let mut last_emit = Instant::now();
    let mut last_fraction = -1.0f64;
    let cancel = AtomicBool::new(false);
    let status = coupled.run_with(&cancel, |p| {
        let emit_now = (p.fraction_complete - last_fraction).abs() >= 0.005
            || last_emit.elapsed().as_millis() >= 100;
        if emit_now {
            render_progress(p, started.elapsed().as_secs_f64());
            last_fraction = p.fraction_complete;
            last_emit = Instant::now();
        }
    })?;
    clear_progress_line();

    match status {
        RunStatus::Completed => eprintln!("✓ Simulation completed"),
        RunStatus::Cancelled => eprintln!("Simulation cancelled at t = {:.2} d", coupled.time()),
        RunStatus::StepLimit => eprintln!(
            "Step limit reached at t = {:.2} d (max_steps = {})",
            coupled.time(),
            coupled.options().max_steps
        ),
    }
    let records = coupled.records();
    let cutbacks: usize = records.iter().map(|r| r.cutbacks).sum();
    eprintln!("  Steps: {}", records.len());
    eprintln!("  Timestep cuts: {}", cutbacks);
    eprintln!("  Wall time: {:.2} s", started.elapsed().as_secs_f64());

    match output {
        Some(path) => {
            let file = File::create(path).map_err(|source| CliError::ReportWrite {
                path: path.to_path_buf(),
                source,
            })?;
            let mut writer = BufWriter::new(file);
            write_table(records, &mut writer, delimiter)?;
            writer.flush().map_err(|source| CliError::ReportWrite {
                path: path.to_path_buf(),
                source,
            })?;
            info!(path = %path.display(), rows = records.len(), "results table written");
            eprintln!("  Results written to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write_table(records, &mut lock, delimiter)?;
        }
    }
    Ok(())
}

fn clear_progress_line() {
    eprint!("\r{}\r", " ".repeat(120));
    let _ = io::stderr().flush();
}

fn render_progress(p: &CouplingProgress, elapsed_s: f64) {
    let width = 28usize;
    let filled = ((p.fraction_complete * width as f64).round() as usize).min(width);
    let bar = format!(
        "{}{}",
        "#".repeat(filled),
        "-".repeat(width.saturating_sub(filled))
    );
    eprint!(
        "\r[{}] {:>6.2}%  t={:.2}/{:.2}d  dt={:.3}d  step={}  cutbacks={}  elapsed={:.1}s",
        bar,
        p.fraction_complete * 100.0,
        p.time,
        p.t_end,
        p.dt,
        p.step,
        p.cutbacks,
        elapsed_s
    );
    let _ = io::stderr().flush();
}
