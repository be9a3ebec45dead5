//! Fest - festival work-hierarchy CLI.
//!
//! Thin presentation layer over the library: every command prints either
//! a human-readable summary or the structured result object as JSON.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use fest::cancel::CancelToken;
use fest::progress::store::ProgressStore;
use fest::selector::{NextTaskResult, OrdinalGraph, Selector};
use fest::{aggregate, FestConfig};

#[derive(Parser)]
#[command(name = "fest")]
#[command(version = "0.1.0")]
#[command(about = "Festival work hierarchies: what's next, and what's truly done", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Festival root directory (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    festival: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend the next unit of work
    Next {
        /// Location to judge context from (defaults to the festival root)
        #[arg(short, long)]
        location: Option<PathBuf>,

        /// Emit the structured result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show completion rollups for the festival
    Status {
        /// Restrict to one phase (festival-relative path)
        #[arg(long)]
        phase: Option<String>,

        /// Emit the rollup as JSON
        #[arg(long)]
        json: bool,
    },

    /// Recommend the next task within one sequence
    Sequence {
        /// Sequence to scope to (festival-relative path)
        sequence: String,

        /// Emit the structured result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record festival completion once every tracked task is done
    CompleteCheck,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {e}", "error:".red().bold());
        std::process::exit(e.exit_code());
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_filter = if verbose { "fest=debug" } else { "fest=warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> fest::Result<()> {
    let cancel = CancelToken::new();
    let config = FestConfig::load(&cli.festival);

    match &cli.command {
        Commands::Next { location, json } => {
            let mut graph = OrdinalGraph::new();
            let mut selector =
                Selector::with_config(&cli.festival, config, &mut graph);
            let location = location.clone().unwrap_or_else(|| cli.festival.clone());
            let result = selector.find_next(&location, &cancel)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }
        }
        Commands::Status { phase, json } => {
            let store = ProgressStore::load(&cli.festival, &config, &cancel)?;
            let rollup = match phase {
                Some(phase) => aggregate::phase_rollup(
                    &cli.festival,
                    &cli.festival.join(phase),
                    store.data(),
                    &cancel,
                )?,
                None => aggregate::festival_rollup(&cli.festival, store.data(), &cancel)?,
            };
            if *json {
                println!("{}", serde_json::to_string_pretty(&rollup)?);
            } else {
                print_rollup(&rollup);
            }
        }
        Commands::Sequence { sequence, json } => {
            let mut graph = OrdinalGraph::new();
            let mut selector =
                Selector::with_config(&cli.festival, config, &mut graph);
            let result = selector.find_next_in_sequence(sequence, &cancel)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }
        }
        Commands::CompleteCheck => {
            let completed =
                ProgressStore::with_lock(&cli.festival, &config, &cancel, |store| {
                    store.check_and_set_completion(chrono::Utc::now(), &cancel)
                })?;
            if completed {
                println!("{}", "festival completion recorded".green().bold());
            } else {
                println!("festival not complete (or already recorded)");
            }
        }
    }
    Ok(())
}

fn print_result(result: &NextTaskResult) {
    match result {
        NextTaskResult::Task {
            task,
            parallel,
            reason,
            progress_percent,
            ..
        } => {
            println!("{} {}", "next:".green().bold(), task.id);
            println!("  {reason}");
            for sibling in parallel {
                println!("  {} {}", "parallel:".cyan(), sibling.id);
            }
            if let Some(percent) = progress_percent {
                println!("  overall progress: {percent}%");
            }
        }
        NextTaskResult::Gate { gate, reason, .. } => {
            println!(
                "{} {} ({})",
                "gate:".yellow().bold(),
                gate.phase_path,
                gate.marker
            );
            println!("  {reason}");
        }
        NextTaskResult::Planning { report, reason, .. } => {
            println!(
                "{} {}/{} objectives resolved",
                "planning:".cyan().bold(),
                report.resolved,
                report.total
            );
            println!("  {reason}");
            if report.graduation_ready {
                println!("  {}", "ready to graduate".green());
            }
        }
        NextTaskResult::FestivalComplete { reason, .. } => {
            println!("{} {reason}", "complete:".green().bold());
        }
        NextTaskResult::NoTasksReady { reason, .. } => {
            println!("{} {reason}", "waiting:".yellow().bold());
        }
    }
}

fn print_rollup(rollup: &aggregate::ProgressRollup) {
    println!(
        "{} {}% ({}/{} tasks)",
        "progress:".bold(),
        rollup.percent(),
        rollup.completed,
        rollup.total
    );
    println!(
        "  in progress: {}  blocked: {}  pending: {}  minutes spent: {}",
        rollup.in_progress, rollup.blocked, rollup.pending, rollup.minutes_spent
    );
    for blocked in &rollup.blocked_tasks {
        match &blocked.blocker {
            Some(message) => println!("  {} {} - {message}", "blocked:".red(), blocked.task_id),
            None => println!("  {} {}", "blocked:".red(), blocked.task_id),
        }
    }
}
