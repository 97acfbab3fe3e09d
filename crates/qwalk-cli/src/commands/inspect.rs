//! Inspect command implementation.

use anyhow::Result;
use console::style;

use qwalk_sim::GenotypeSpace;

use super::common::load_space;
use super::run::OutputFormat;

/// Degree statistics of a genotype space: (min, max, mean).
pub fn degree_stats(space: &GenotypeSpace) -> Result<(usize, usize, f64)> {
    let degrees = (0..space.len())
        .map(|i| space.degree(i))
        .collect::<Result<Vec<_>, _>>()?;
    let min = degrees.iter().copied().min().unwrap_or(0);
    let max = degrees.iter().copied().max().unwrap_or(0);
    let mean = if degrees.is_empty() {
        0.0
    } else {
        degrees.iter().sum::<usize>() as f64 / degrees.len() as f64
    };
    Ok((min, max, mean))
}

/// Execute the inspect command.
pub fn execute(path: &str, genotype: Option<usize>, format: OutputFormat) -> Result<()> {
    let space = load_space(path)?;

    if format == OutputFormat::Json {
        // Normalized layout: duplicate edges collapsed, `u < v`.
        println!("{}", serde_json::to_string_pretty(&space.to_file())?);
        return Ok(());
    }

    match genotype {
        Some(index) => print_genotype(&space, index),
        None => print_summary(&space),
    }
}

fn print_summary(space: &GenotypeSpace) -> Result<()> {
    let (min, max, mean) = degree_stats(space)?;

    println!(
        "{} Genotype space {}",
        style("✓").green().bold(),
        style(space.name()).cyan().bold()
    );
    println!("  Genotypes:  {}", space.len());
    println!("  Mutations:  {}", space.num_mutations());
    println!("  Degree:     min {min}, max {max}, mean {mean:.2}");

    let phenotypes = space.phenotype_names();
    println!("  Phenotypes: {}", phenotypes.len());
    for name in &phenotypes {
        let count = (0..space.len())
            .filter(|&i| {
                space
                    .phenotypes_of(i)
                    .is_ok_and(|p| p.iter().any(|q| q == name))
            })
            .count();
        println!("    {:<20} {:>6} genotypes", style(name).yellow(), count);
    }

    Ok(())
}

fn print_genotype(space: &GenotypeSpace, index: usize) -> Result<()> {
    let genotype = space.genotype(index)?;
    println!(
        "{} Genotype {} ({})",
        style("✓").green().bold(),
        style(index).cyan().bold(),
        genotype.sequence
    );
    println!("  Phenotypes: {}", genotype.phenotypes.join(", "));

    let neighbors = space.neighbors(index)?;
    println!("  Neighbours: {}", neighbors.len());
    for n in neighbors {
        let g = space.genotype(n)?;
        println!(
            "    {:>6}  {:<20} {}",
            n,
            style(&g.sequence).yellow(),
            g.phenotypes.join(", ")
        );
    }

    Ok(())
}
