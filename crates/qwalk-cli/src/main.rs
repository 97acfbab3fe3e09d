//! qwalk Command-Line Interface
//!
//! Runs continuous-time quantum walks over genotype spaces and reports
//! phenotype hitting times.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::run::{OutputFormat, RunOptions};
use commands::{inspect, run, version};

/// qwalk - quantum walks on genotype networks
#[derive(Parser)]
#[command(name = "qwalk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation until its simulated-time or wall-clock budget is spent
    Run {
        /// Genotype space file (JSON)
        #[arg(short, long)]
        space: String,

        /// Simulation config file (YAML)
        #[arg(short, long)]
        config: Option<String>,

        /// Checkpoint directory (defaults to ~/.qwalk/)
        #[arg(long, conflicts_with = "no_store")]
        store: Option<String>,

        /// Keep checkpoints in memory only
        #[arg(long)]
        no_store: bool,

        /// Mutation rate
        #[arg(short, long)]
        gamma: Option<f64>,

        /// Generator matrix (adjacency, laplacian)
        #[arg(short, long)]
        matrix: Option<String>,

        /// Starting genotype index
        #[arg(short, long)]
        initial: Option<usize>,

        /// Phenotype to track (repeatable; all when omitted)
        #[arg(short, long = "phenotype")]
        phenotypes: Vec<String>,

        /// Simulated-time budget
        #[arg(long)]
        max_time: Option<f64>,

        /// Mean waiting time between measurements
        #[arg(long)]
        rate: Option<f64>,

        /// Wall-clock budget in seconds
        #[arg(long)]
        max_wall: Option<f64>,

        /// RNG seed
        #[arg(long)]
        seed: Option<u64>,

        /// Record every measurement outcome
        #[arg(long)]
        trajectory: bool,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Summarize a genotype space
    Inspect {
        /// Genotype space file (JSON)
        #[arg(short, long)]
        space: String,

        /// Show one genotype and its one-mutation neighbours
        #[arg(short, long)]
        genotype: Option<usize>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Run {
            space,
            config,
            store,
            no_store,
            gamma,
            matrix,
            initial,
            phenotypes,
            max_time,
            rate,
            max_wall,
            seed,
            trajectory,
            format,
        } => run::execute(&RunOptions {
            space,
            config,
            store,
            no_store,
            gamma,
            matrix,
            initial,
            phenotypes,
            max_time,
            rate,
            max_wall,
            seed,
            trajectory,
            format,
        }),

        Commands::Inspect {
            space,
            genotype,
            format,
        } => inspect::execute(&space, genotype, format),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
