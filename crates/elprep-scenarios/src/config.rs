use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use elprep_core::components::unbounded;
use serde::{de, Deserialize, Deserializer, Serialize};

/// Run configuration for `prepare_network`. Every section has defaults so a
/// partial file (or none at all) is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareConfig {
    pub lines: LinesConfig,
    pub links: LinksConfig,
    pub snapshots: SnapshotsConfig,
    pub electricity: ElectricityConfig,
    pub costs: CostsConfig,
    pub autarky: AutarkyConfig,
    pub solving: SolvingConfig,
    /// Registry name of the segmentation backend
    pub segmentation_backend: String,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            lines: LinesConfig::default(),
            links: LinksConfig::default(),
            snapshots: SnapshotsConfig::default(),
            electricity: ElectricityConfig::default(),
            costs: CostsConfig::default(),
            autarky: AutarkyConfig::default(),
            solving: SolvingConfig::default(),
            segmentation_backend: "agglomerative".into(),
        }
    }
}

fn infinite() -> f64 {
    f64::INFINITY
}

fn default_s_max_pu() -> f64 {
    0.7
}

fn default_factor() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinesConfig {
    /// N-1 security margin applied to every line
    #[serde(default = "default_s_max_pu")]
    pub s_max_pu: f64,
    /// Absolute ceiling on line capacity
    #[serde(default = "infinite", with = "unbounded")]
    pub s_nom_max: f64,
    /// Allowed extension above the current capacity
    #[serde(default = "infinite", with = "unbounded")]
    pub max_extension: f64,
    /// Detour factor the network builder already folded into line lengths.
    /// Kept for the run metadata; transmission costs use stored lengths.
    #[serde(default = "default_factor")]
    pub length_factor: f64,
}

impl Default for LinesConfig {
    fn default() -> Self {
        Self {
            s_max_pu: default_s_max_pu(),
            s_nom_max: infinite(),
            max_extension: infinite(),
            length_factor: default_factor(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksConfig {
    #[serde(default = "infinite", with = "unbounded")]
    pub p_nom_max: f64,
    #[serde(default = "infinite", with = "unbounded")]
    pub max_extension: f64,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            p_nom_max: infinite(),
            max_extension: infinite(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotsConfig {
    /// Averaging bucket such as `3h`
    #[serde(deserialize_with = "value_or_false")]
    pub resolution: Option<String>,
    /// Number of segments for segment aggregation
    #[serde(deserialize_with = "value_or_false")]
    pub segmentation: Option<usize>,
}

/// Accept `false` (and null) for a switched-off option.
fn value_or_false<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Flag(bool),
        Value(T),
    }
    match Option::<Raw<T>>::deserialize(deserializer)? {
        None | Some(Raw::Flag(false)) => Ok(None),
        Some(Raw::Flag(true)) => Err(de::Error::custom("expected a value or false")),
        Some(Raw::Value(value)) => Ok(Some(value)),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectricityConfig {
    pub co2limit_enable: bool,
    /// Absolute annual CO2 limit
    pub co2limit: f64,
    /// Reference emissions that a `Co2L<x>` share is taken of
    pub co2base: f64,
    pub gaslimit_enable: bool,
    #[serde(with = "unbounded")]
    pub gaslimit: f64,
    /// Energy-to-power ratio per storage technology
    pub max_hours: BTreeMap<String, f64>,
}

impl Default for ElectricityConfig {
    fn default() -> Self {
        Self {
            co2limit_enable: false,
            co2limit: 7.75e7,
            co2base: 1.487e9,
            gaslimit_enable: false,
            gaslimit: f64::INFINITY,
            max_hours: BTreeMap::from([("battery".to_string(), 6.0), ("H2".to_string(), 168.0)]),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionPricesConfig {
    pub enable: bool,
    /// Static CO2 price per tonne
    pub co2: f64,
    /// Use the time-varying CO2 price series
    pub co2_monthly_prices: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CostsConfig {
    /// Assumption year and data version of the cost table. They only
    /// identify the inputs and are carried into the run metadata.
    pub year: u32,
    pub version: Option<String>,
    /// Defaults for parameters a technology does not list
    pub fill_values: BTreeMap<String, f64>,
    pub emission_prices: EmissionPricesConfig,
    /// Per-technology overrides applied after cost processing
    pub marginal_cost: BTreeMap<String, f64>,
    pub capital_cost: BTreeMap<String, f64>,
}

impl Default for CostsConfig {
    fn default() -> Self {
        let fill_values = [
            ("FOM", 0.0),
            ("VOM", 0.0),
            ("efficiency", 1.0),
            ("fuel", 0.0),
            ("investment", 0.0),
            ("lifetime", 25.0),
            ("CO2 intensity", 0.0),
            ("discount rate", 0.07),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self {
            year: 2030,
            version: None,
            fill_values,
            emission_prices: EmissionPricesConfig::default(),
            marginal_cost: BTreeMap::new(),
            capital_cost: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutarkyConfig {
    pub enable: bool,
    /// Only remove cross-border transmission
    pub by_country: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SolvingConfig {
    pub solver: SolverConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub name: String,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { name: "cbc".into() }
    }
}

/// Load a run configuration from YAML or JSON.
pub fn load_config_from_path(path: &Path) -> Result<PrepareConfig> {
    elprep_io::read_structured(path)
}
