use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Serialization format of a structured document, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredFormat {
    Yaml,
    Json,
    /// Unknown extension: try YAML, then JSON
    Guess,
}

impl StructuredFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                StructuredFormat::Yaml
            }
            Some(ext) if ext.eq_ignore_ascii_case("json") => StructuredFormat::Json,
            _ => StructuredFormat::Guess,
        }
    }
}

/// Read a YAML or JSON document into `T`.
pub fn read_structured<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading '{}'", path.display()))?;
    match StructuredFormat::from_path(path) {
        StructuredFormat::Yaml => serde_yaml::from_str(&data)
            .with_context(|| format!("parsing yaml '{}'", path.display())),
        StructuredFormat::Json => serde_json::from_str(&data)
            .with_context(|| format!("parsing json '{}'", path.display())),
        StructuredFormat::Guess => serde_yaml::from_str(&data)
            .or_else(|_| serde_json::from_str(&data))
            .with_context(|| format!("parsing '{}'", path.display())),
    }
}
