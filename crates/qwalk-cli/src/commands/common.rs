//! Shared helpers for CLI commands.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;

use qwalk_sim::{CheckpointSnapshot, GenotypeSpace, SimulationConfig, SimulationReport};

/// Load a genotype space from a JSON file.
pub fn load_space(path: &str) -> Result<GenotypeSpace> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }

    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;
    GenotypeSpace::from_json_str(&source)
        .with_context(|| format!("Invalid genotype space: {path}"))
}

/// Load a simulation config from a YAML file; missing keys take defaults.
pub fn load_config(path: &str) -> Result<SimulationConfig> {
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read config: {path}"))?;
    parse_config(&source).with_context(|| format!("Invalid config: {path}"))
}

/// Parse a YAML simulation config.
pub fn parse_config(source: &str) -> Result<SimulationConfig> {
    if source.trim().is_empty() {
        return Ok(SimulationConfig::default());
    }
    Ok(serde_yaml_ng::from_str(source)?)
}

/// Return the default qwalk state directory (~/.qwalk/).
pub fn default_state_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    let state_dir = home.join(".qwalk");
    if !state_dir.exists() {
        fs::create_dir_all(&state_dir).with_context(|| {
            format!("Failed to create state directory: {}", state_dir.display())
        })?;
    }
    Ok(state_dir)
}

/// Print the per-phenotype hitting times of a snapshot.
pub fn print_phenotypes(snapshot: &CheckpointSnapshot) {
    let width = snapshot
        .phenotypes
        .keys()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max("phenotype".len());

    println!(
        "  {:<width$}  {:>12}  {:>12}  {:>10}",
        style("phenotype").bold(),
        style("tau").bold(),
        style("measurements").bold(),
        style("mutations").bold(),
    );
    for (name, stats) in &snapshot.phenotypes {
        let tau = format!("{:.4}", stats.tau);
        let tau = if stats.discovered {
            style(tau).green()
        } else {
            style(format!(">{tau}")).dim()
        };
        println!(
            "  {:<width$}  {:>12}  {:>12}  {:>10}",
            style(name).cyan(),
            tau,
            opt(stats.measurements),
            opt(stats.mutations),
        );
    }
}

/// Print a run report in table format.
pub fn print_report(report: &SimulationReport) {
    let summary = &report.summary;

    println!(
        "\n{} Simulation {} finished: {}",
        style("✓").green().bold(),
        style(summary.simulation_id.to_string()).cyan(),
        style(report.stop_reason.to_string()).yellow()
    );
    println!(
        "  Space: {}, initial genotype {} ({})",
        style(&summary.space).green(),
        summary.initial.index,
        summary.initial.sequence
    );
    println!(
        "  Measurements: {}, mutations: {}, simulated time: {:.4}",
        summary.total_measurements, summary.total_mutations, summary.simulated_time
    );
    println!(
        "  Discovered: {}/{} phenotypes",
        summary.discovered(),
        summary.phenotypes.len()
    );
    println!();
    print_phenotypes(summary);

    println!(
        "\n  Checkpoints: {} written, {} failed",
        report.checkpoints_written, report.checkpoints_failed
    );
    println!(
        "  Computing time: {} s",
        style(format!("{:.3}", summary.computing_time_secs)).yellow()
    );
}

fn opt(v: Option<u64>) -> String {
    v.map_or_else(|| "-".to_string(), |n| n.to_string())
}
