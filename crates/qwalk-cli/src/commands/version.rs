//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - continuous-time quantum walks on genotype networks",
        style("qwalk").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qwalk-sim   Walk engine, hitting-time tracking, checkpoints");
    println!("  qwalk-cli   Command-line interface");
    println!();
    println!(
        "Repository: {}",
        style("https://github.com/qwalk-lab/qwalk").underlined()
    );
    println!("License:    {}", style("Apache-2.0").dim());
}
