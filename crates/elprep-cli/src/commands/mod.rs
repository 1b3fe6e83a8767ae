use std::path::Path;

use anyhow::Result;
use elprep_scenarios::{load_config_from_path, PrepareConfig};
use tracing::info;

pub mod inspect;
pub mod options;
pub mod prepare;

/// Configuration from file, or the defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<PrepareConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            load_config_from_path(path)
        }
        None => Ok(PrepareConfig::default()),
    }
}
