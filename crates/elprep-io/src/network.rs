use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use elprep_core::{Diagnostics, Network};
use tracing::{info, warn};

/// Load a network from its JSON representation and check the model invariants.
///
/// Warnings are logged; any error-level issue rejects the file.
pub fn load_network(path: &Path) -> Result<Network> {
    let file = File::open(path)
        .with_context(|| format!("opening network '{}'", path.display()))?;
    let network: Network = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing network '{}'", path.display()))?;

    let mut diag = Diagnostics::new();
    network.validate_into(&mut diag);
    let warnings = diag
        .into_result()
        .with_context(|| format!("network '{}' is inconsistent", path.display()))?;
    for issue in warnings {
        warn!(category = %issue.category, entity = ?issue.entity, "{}", issue.message);
    }
    info!(path = %path.display(), "loaded network: {}", network.stats());
    Ok(network)
}

/// Write a network as pretty-printed JSON, creating parent directories.
pub fn save_network(network: &Network, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory '{}'", parent.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("creating network file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, network)
        .with_context(|| format!("serializing network to '{}'", path.display()))?;
    writer.flush()?;
    info!(path = %path.display(), "wrote network");
    Ok(())
}
