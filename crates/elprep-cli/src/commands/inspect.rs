//! Network inspection: counts, topology and invariant checks.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use elprep_cli::OutputFormat;
use elprep_core::{topology_stats, Diagnostics, Network, NetworkStats, TopologyStats};
use serde::Serialize;
use tabwriter::TabWriter;

#[derive(Serialize)]
struct InspectReport {
    name: String,
    stats: NetworkStats,
    topology: TopologyStats,
    years_factor: f64,
    diagnostics: Diagnostics,
}

/// Read without the load-time validation so that broken files can be inspected.
fn read_network(path: &Path) -> Result<Network> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading network '{}'", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing network '{}'", path.display()))
}

pub fn handle(path: &Path, format: OutputFormat) -> Result<()> {
    let network = read_network(path)?;
    let mut diagnostics = Diagnostics::new();
    network.validate_into(&mut diagnostics);
    let report = InspectReport {
        name: network.name.clone(),
        stats: network.stats(),
        topology: topology_stats(&network),
        years_factor: network.years_factor(),
        diagnostics,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_table(&report)?,
    }
    Ok(())
}

fn print_table(report: &InspectReport) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    let stats = &report.stats;
    let topology = &report.topology;
    writeln!(writer, "Network\t{}", report.name)?;
    writeln!(writer, "Snapshots\t{}", stats.num_snapshots)?;
    writeln!(writer, "Years factor\t{:.4}", report.years_factor)?;
    writeln!(writer, "Buses\t{}", stats.num_buses)?;
    writeln!(writer, "Lines\t{}", stats.num_lines)?;
    writeln!(writer, "Links\t{}", stats.num_links)?;
    writeln!(writer, "Generators\t{}", stats.num_generators)?;
    writeln!(writer, "Storage units\t{}", stats.num_storage_units)?;
    writeln!(writer, "Stores\t{}", stats.num_stores)?;
    writeln!(writer, "Loads\t{}", stats.num_loads)?;
    writeln!(writer, "Global constraints\t{}", stats.num_global_constraints)?;
    writeln!(writer, "Connected components\t{}", topology.connected_components)?;
    writeln!(writer, "Isolated buses\t{}", topology.isolated_buses)?;
    writeln!(writer, "Cross-border branches\t{}", topology.cross_border_branches)?;
    writer.flush()?;

    let diagnostics = &report.diagnostics;
    println!("\nDiagnostics: {}", diagnostics.summary());
    for (category, count) in diagnostics.by_category() {
        println!("  {}: {}", category, count);
    }
    for issue in diagnostics.errors().chain(diagnostics.warnings()) {
        println!("  {}", issue);
    }
    Ok(())
}
