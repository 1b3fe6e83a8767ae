use elprep_core::{Network, PrepError, PrepResult};
use elprep_io::{CostRecord, PriceSeries};
use elprep_ts::{apply_time_segmentation, average_every_nhours, SegmentationKind};
use serde_json::Value;
use tracing::{info, warn};

use crate::autarky::enforce_autarky;
use crate::config::PrepareConfig;
use crate::constraints::{
    add_co2limit, add_dynamic_emission_prices, add_emission_prices, add_gaslimit,
};
use crate::costs::CostTable;
use crate::plan::{EmissionPricing, PreparePlan, TemporalReduction, Wildcards};
use crate::scaling::apply_carrier_scaling;
use crate::transmission::{set_line_nom_max, set_line_s_max_pu, set_transmission_limit};

/// Inputs of one preparation run besides the network itself.
#[derive(Debug, Clone, Copy)]
pub struct PrepareContext<'a> {
    pub config: &'a PrepareConfig,
    pub wildcards: &'a Wildcards,
    pub cost_records: &'a [CostRecord],
    /// Required when dynamic emission prices are enabled
    pub co2_price: Option<&'a PriceSeries>,
}

/// Run configuration merged with the wildcards, attached to the output network.
pub fn build_meta(config: &PrepareConfig, wildcards: &Wildcards) -> PrepResult<Value> {
    let mut meta = serde_json::to_value(config)?;
    match meta.as_object_mut() {
        Some(object) => {
            object.insert("wildcards".into(), serde_json::to_value(wildcards)?);
            Ok(meta)
        }
        None => Err(PrepError::Other("configuration did not serialize to an object".into())),
    }
}

/// Prepare a network for optimization.
///
/// Steps, each conditional on the resolved [`PreparePlan`]:
/// 1. line security margin
/// 2. time averaging or segmentation
/// 3. CO2 limit
/// 4. gas limit
/// 5. carrier attribute scaling
/// 6. emission prices, dynamic before static
/// 7. transmission expansion limit
/// 8. line and link capacity ceilings
/// 9. autarky
///
/// The years factor and the cost table are computed from the network as
/// loaded, before any temporal reduction.
pub fn prepare_network(network: Network, ctx: &PrepareContext<'_>) -> PrepResult<Network> {
    let config = ctx.config;
    let plan = PreparePlan::resolve(config, ctx.wildcards)?;
    for token in &plan.ignored_options {
        warn!(token = %token, "option token has no effect");
    }

    let backend = match &plan.temporal {
        Some(TemporalReduction::Segmentation { backend, .. }) => {
            Some(SegmentationKind::from_str(backend)?.build_backend()?)
        }
        _ => None,
    };
    if plan.emission_pricing == Some(EmissionPricing::Dynamic) && ctx.co2_price.is_none() {
        return Err(PrepError::Config(
            "time-dependent emission prices need a CO2 price series".into(),
        ));
    }

    let years_factor = network.years_factor();
    let costs = CostTable::from_records(
        ctx.cost_records,
        &config.costs,
        &config.electricity.max_hours,
        years_factor,
    )?;
    info!(
        year = config.costs.year,
        version = config.costs.version.as_deref().unwrap_or("unversioned"),
        years_factor,
        technologies = costs.technologies().count(),
        "loaded costs"
    );

    let mut network = network;
    set_line_s_max_pu(&mut network, plan.s_max_pu);

    match (&plan.temporal, &backend) {
        (Some(TemporalReduction::Averaging { period_seconds, .. }), _) => {
            network = average_every_nhours(&network, chrono::Duration::seconds(*period_seconds))?;
        }
        (Some(TemporalReduction::Segmentation { segments, solver, .. }), Some(backend)) => {
            network = apply_time_segmentation(&network, *segments, solver, backend.as_ref())?;
        }
        _ => {}
    }

    if let Some(limit) = plan.co2limit {
        add_co2limit(&mut network, limit, years_factor)?;
        info!(limit, "Setting CO2 limit");
    }
    if let Some(limit) = plan.gaslimit {
        add_gaslimit(&mut network, limit, years_factor)?;
        info!(limit, "Setting gas usage limit");
    }

    for scaling in &plan.scalings {
        apply_carrier_scaling(&mut network, scaling)?;
    }

    match (&plan.emission_pricing, ctx.co2_price) {
        (Some(EmissionPricing::Dynamic), Some(series)) => {
            add_dynamic_emission_prices(&mut network, series)?;
        }
        (Some(EmissionPricing::Static { prices }), _) => {
            info!(?prices, "Setting emission prices");
            add_emission_prices(&mut network, prices, false)?;
        }
        _ => {}
    }

    set_transmission_limit(&mut network, &plan.transmission, &costs)?;
    set_line_nom_max(&mut network, &plan.nom_max);

    if let Some(only_crossborder) = plan.autarky {
        enforce_autarky(&mut network, only_crossborder);
    }

    network.meta = build_meta(config, ctx.wildcards)?;
    info!("prepared network: {}", network.stats());
    Ok(network)
}
