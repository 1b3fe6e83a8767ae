//! Options and configuration resolved into one typed plan before the
//! pipeline touches the network.

use std::collections::BTreeMap;

use chrono::Duration;
use elprep_core::{PrepError, PrepResult};
use elprep_ts::{parse_rule, SegmentationKind};
use serde::{Deserialize, Serialize};

use crate::config::PrepareConfig;
use crate::options::{CarrierScaling, ScenarioOptions, TransmissionLimit};
use crate::transmission::NomMaxLimits;

/// The `opts` and `ll` strings a run was started with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wildcards {
    pub opts: String,
    pub ll: String,
}

impl Wildcards {
    pub fn new(opts: impl Into<String>, ll: impl Into<String>) -> Self {
        Self {
            opts: opts.into(),
            ll: ll.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "method")]
pub enum TemporalReduction {
    Averaging { label: String, period_seconds: i64 },
    Segmentation { segments: usize, backend: String, solver: String },
}

impl TemporalReduction {
    pub fn averaging_period(&self) -> Option<Duration> {
        match self {
            TemporalReduction::Averaging { period_seconds, .. } => {
                Some(Duration::seconds(*period_seconds))
            }
            TemporalReduction::Segmentation { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EmissionPricing {
    /// Price per emission type, applied to static marginal costs
    Static { prices: BTreeMap<String, f64> },
    /// Time-varying CO2 price series
    Dynamic,
}

/// Everything `prepare_network` will do, in typed form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparePlan {
    pub s_max_pu: f64,
    pub temporal: Option<TemporalReduction>,
    /// Annual CO2 limit
    pub co2limit: Option<f64>,
    /// Annual gas usage limit
    pub gaslimit: Option<f64>,
    pub scalings: Vec<CarrierScaling>,
    pub emission_pricing: Option<EmissionPricing>,
    pub transmission: TransmissionLimit,
    #[serde(skip)]
    pub nom_max: NomMaxLimits,
    /// `Some(only_crossborder)` when autarky is enforced
    pub autarky: Option<bool>,
    pub ignored_options: Vec<String>,
}

impl PreparePlan {
    /// Combine option tokens with configuration fallbacks. Tokens win when
    /// both are present.
    pub fn resolve(config: &PrepareConfig, wildcards: &Wildcards) -> PrepResult<Self> {
        let options = ScenarioOptions::parse(&wildcards.opts)?;
        let transmission = TransmissionLimit::parse(&wildcards.ll)?;
        Self::from_parts(config, options, transmission)
    }

    pub fn from_parts(
        config: &PrepareConfig,
        options: ScenarioOptions,
        transmission: TransmissionLimit,
    ) -> PrepResult<Self> {
        let averaging = match (options.resolution_hours, &config.snapshots.resolution) {
            (Some(hours), _) => Some(TemporalReduction::Averaging {
                label: format!("{}h", hours),
                period_seconds: i64::from(hours) * 3600,
            }),
            (None, Some(rule)) => Some(TemporalReduction::Averaging {
                label: rule.clone(),
                period_seconds: parse_rule(rule)?.num_seconds(),
            }),
            (None, None) => None,
        };
        let segmentation = options
            .segments
            .or(config.snapshots.segmentation)
            .map(|segments| -> PrepResult<TemporalReduction> {
                SegmentationKind::from_str(&config.segmentation_backend)?;
                Ok(TemporalReduction::Segmentation {
                    segments,
                    backend: config.segmentation_backend.clone(),
                    solver: config.solving.solver.name.clone(),
                })
            })
            .transpose()?;
        let temporal = match (averaging, segmentation) {
            (Some(_), Some(_)) => {
                return Err(PrepError::Config(
                    "time averaging and segmentation are mutually exclusive".into(),
                ))
            }
            (averaging, segmentation) => averaging.or(segmentation),
        };

        let electricity = &config.electricity;
        let co2limit = (options.co2limit.is_on() || electricity.co2limit_enable).then(|| {
            options
                .co2limit
                .value()
                .map(|share| share * electricity.co2base)
                .unwrap_or(electricity.co2limit)
        });
        let gaslimit = (options.gaslimit.is_on() || electricity.gaslimit_enable).then(|| {
            options
                .gaslimit
                .value()
                .map(|millions| millions * 1e6)
                .unwrap_or(electricity.gaslimit)
        });

        let prices = &config.costs.emission_prices;
        let emission_pricing = if options.dynamic_emission_prices || prices.co2_monthly_prices {
            Some(EmissionPricing::Dynamic)
        } else if options.emission_prices.is_on() || prices.enable {
            let co2 = options.emission_prices.value().unwrap_or(prices.co2);
            Some(EmissionPricing::Static {
                prices: BTreeMap::from([("co2".to_string(), co2)]),
            })
        } else {
            None
        };

        let autarky = (options.autarky || config.autarky.enable)
            .then_some(options.autarky_by_country || config.autarky.by_country);

        Ok(Self {
            s_max_pu: config.lines.s_max_pu,
            temporal,
            co2limit,
            gaslimit,
            scalings: options.scalings,
            emission_pricing,
            transmission,
            nom_max: NomMaxLimits::from_config(&config.lines, &config.links),
            autarky,
            ignored_options: options.ignored,
        })
    }
}
