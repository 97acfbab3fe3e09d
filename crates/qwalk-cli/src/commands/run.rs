//! Run command implementation.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::ValueEnum;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use qwalk_sim::{CheckpointSink, JsonStore, MatrixKind, MemorySink, Simulation, SimulationConfig};

use super::common::{default_state_dir, load_config, load_space, print_report};

/// How run results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Arguments of `qwalk run`.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub space: String,
    pub config: Option<String>,
    pub store: Option<String>,
    pub no_store: bool,
    pub gamma: Option<f64>,
    pub matrix: Option<String>,
    pub initial: Option<usize>,
    pub phenotypes: Vec<String>,
    pub max_time: Option<f64>,
    pub rate: Option<f64>,
    pub max_wall: Option<f64>,
    pub seed: Option<u64>,
    pub trajectory: bool,
    pub format: OutputFormat,
}

/// Layer command-line overrides on top of a file-loaded config.
pub fn apply_overrides(mut config: SimulationConfig, opts: &RunOptions) -> Result<SimulationConfig> {
    if let Some(gamma) = opts.gamma {
        config.gamma = gamma;
    }
    if let Some(matrix) = &opts.matrix {
        config.matrix_kind = matrix.parse::<MatrixKind>()?;
    }
    if let Some(initial) = opts.initial {
        config.initial_genotype = initial;
    }
    if !opts.phenotypes.is_empty() {
        config.phenotypes = Some(opts.phenotypes.clone());
    }
    if let Some(t) = opts.max_time {
        config.max_simulated_time = t;
    }
    if let Some(rate) = opts.rate {
        config.measurement_rate = rate;
    }
    if let Some(secs) = opts.max_wall {
        config.max_execution_time_secs = secs;
    }
    if opts.seed.is_some() {
        config.seed = opts.seed;
    }
    if opts.trajectory {
        config.record_trajectory = true;
    }
    Ok(config)
}

/// Execute the run command.
pub fn execute(opts: &RunOptions) -> Result<()> {
    let space = load_space(&opts.space)?;
    let base = match &opts.config {
        Some(path) => load_config(path)?,
        None => SimulationConfig::default(),
    };
    let config = apply_overrides(base, opts)?;

    let sink: Box<dyn CheckpointSink> = if opts.no_store {
        Box::new(MemorySink::new())
    } else {
        let root = match &opts.store {
            Some(dir) => PathBuf::from(dir),
            None => default_state_dir()?,
        };
        let store = JsonStore::new(&root)?;
        info!(root = %store.root().display(), "checkpointing to JSON store");
        Box::new(store)
    };

    let table = opts.format == OutputFormat::Table;
    if table {
        println!(
            "{} Walking {} ({} genotypes, {} mutations) from genotype {}",
            style("→").cyan().bold(),
            style(space.name()).green(),
            space.len(),
            space.num_mutations(),
            style(config.initial_genotype).yellow()
        );
        println!(
            "  gamma {}, {} generator, t_max {}, rate {}",
            config.gamma, config.matrix_kind, config.max_simulated_time, config.measurement_rate
        );
    }

    let simulation = Simulation::new(&space, config)?;

    let spinner = if table {
        ProgressBar::new_spinner()
    } else {
        ProgressBar::hidden()
    };
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(format!("Running simulation {}...", simulation.id()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let report = simulation.run(sink.as_ref());
    spinner.finish_and_clear();
    let report = report?;

    match opts.format {
        OutputFormat::Table => print_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}
