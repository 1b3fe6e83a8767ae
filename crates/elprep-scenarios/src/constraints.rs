//! Global emission and fuel limits and emission price adjustments.

use std::collections::BTreeMap;

use elprep_core::{
    GlobalConstraint, Network, PrepError, PrepResult, SeriesTable, Timestamp, EMISSIONS_SUFFIX,
};
use elprep_io::PriceSeries;
use tracing::{debug, info};

pub const CO2_LIMIT: &str = "CO2Limit";
pub const GAS_LIMIT: &str = "GasLimit";

/// Carriers that burn natural gas.
pub const GAS_CARRIERS: [&str; 3] = ["OCGT", "CCGT", "CHP"];

/// Cap total CO2 emissions at `limit` per year, scaled to the modelled horizon.
pub fn add_co2limit(network: &mut Network, limit: f64, years_factor: f64) -> PrepResult<()> {
    network.add_global_constraint(
        CO2_LIMIT,
        GlobalConstraint::primary_energy("co2_emissions", limit * years_factor),
    )
}

/// Flag the gas-fired carriers with `gas_usage = 1` and cap their fuel use.
pub fn add_gaslimit(network: &mut Network, limit: f64, years_factor: f64) -> PrepResult<()> {
    if network.global_constraints.contains_key(GAS_LIMIT) {
        return Err(PrepError::Validation(format!(
            "global constraint '{}' already exists",
            GAS_LIMIT
        )));
    }
    for name in GAS_CARRIERS {
        if let Some(carrier) = network.carriers.get_mut(name) {
            carrier.set_attribute("gas_usage", 1.0);
        }
    }
    network.add_global_constraint(
        GAS_LIMIT,
        GlobalConstraint::primary_energy("gas_usage", limit * years_factor),
    )
}

/// Price of all priced emissions per unit of primary energy of each carrier.
fn carrier_emission_costs(
    network: &Network,
    prices: &BTreeMap<String, f64>,
    exclude_co2: bool,
) -> BTreeMap<String, f64> {
    network
        .carriers
        .iter()
        .map(|(name, carrier)| {
            let cost = prices
                .iter()
                .filter(|(kind, _)| !(exclude_co2 && kind.as_str() == "co2"))
                .map(|(kind, price)| {
                    price * carrier.attribute(&format!("{}{}", kind, EMISSIONS_SUFFIX))
                })
                .sum::<f64>();
            (name.clone(), cost)
        })
        .collect()
}

fn check_efficiency(kind: &str, name: &str, efficiency: f64) -> PrepResult<()> {
    if efficiency > 0.0 && efficiency.is_finite() {
        Ok(())
    } else {
        Err(PrepError::Validation(format!(
            "{} '{}' has non-positive efficiency {}",
            kind, name, efficiency
        )))
    }
}

/// Add static emission prices to marginal costs.
///
/// Each generator pays the summed emission price of its carrier divided by
/// its efficiency, on the static marginal cost and on any existing column of
/// the time-varying marginal cost. Storage units pay the same per unit of
/// discharge efficiency, static only. Carriers without emission attributes
/// contribute nothing.
pub fn add_emission_prices(
    network: &mut Network,
    prices: &BTreeMap<String, f64>,
    exclude_co2: bool,
) -> PrepResult<()> {
    let ep = carrier_emission_costs(network, prices, exclude_co2);
    let carrier_cost = |carrier: &str| ep.get(carrier).copied().unwrap_or(0.0);

    let mut gen_ep = BTreeMap::new();
    for (name, gen) in network.generators.iter() {
        check_efficiency("generator", name, gen.efficiency)?;
        gen_ep.insert(name.to_string(), carrier_cost(&gen.carrier) / gen.efficiency);
    }
    let mut su_ep = BTreeMap::new();
    for (name, su) in network.storage_units.iter() {
        check_efficiency("storage unit", name, su.efficiency_dispatch)?;
        su_ep.insert(
            name.to_string(),
            carrier_cost(&su.carrier) / su.efficiency_dispatch,
        );
    }

    for (name, gen) in network.generators.iter_mut() {
        gen.marginal_cost += gen_ep[name];
    }
    if let Some(table) = network.generators.series_mut("marginal_cost") {
        for (name, addend) in &gen_ep {
            if let Some(column) = table.column_mut(name) {
                column.iter_mut().for_each(|v| *v += addend);
            }
        }
    }
    for (name, su) in network.storage_units.iter_mut() {
        su.marginal_cost += su_ep[name];
    }
    info!(
        generators = gen_ep.len(),
        storage_units = su_ep.len(),
        "added emission prices to marginal costs"
    );
    Ok(())
}

/// Align a price series to the snapshots: exact labels only, then fill gaps
/// forward and finally backward.
pub fn align_prices(series: &PriceSeries, snapshots: &[Timestamp]) -> PrepResult<Vec<f64>> {
    let lookup: BTreeMap<_, _> = series.points.iter().copied().collect();
    let mut aligned: Vec<Option<f64>> = snapshots.iter().map(|ts| lookup.get(ts).copied()).collect();

    let mut last = None;
    for value in aligned.iter_mut() {
        match value {
            Some(v) => last = Some(*v),
            None => *value = last,
        }
    }
    let mut next = None;
    for value in aligned.iter_mut().rev() {
        match value {
            Some(v) => next = Some(*v),
            None => *value = next,
        }
    }
    aligned
        .into_iter()
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(|| {
            PrepError::Validation(format!(
                "price series '{}' has no value at any snapshot",
                series.name
            ))
        })
}

/// Add a time-varying CO2 price to generator marginal costs.
///
/// The dense marginal cost (time-varying where present, static otherwise)
/// plus `price(t) * co2_emissions / efficiency` replaces the time-varying
/// table; columns identical to the static value at every snapshot are dropped.
pub fn add_dynamic_emission_prices(network: &mut Network, co2_price: &PriceSeries) -> PrepResult<()> {
    let prices = align_prices(co2_price, &network.snapshots)?;
    let snapshots = network.snapshots.clone();
    let existing = network.generators.series("marginal_cost");

    let mut table = SeriesTable::new(snapshots.clone());
    for (name, gen) in network.generators.iter() {
        check_efficiency("generator", name, gen.efficiency)?;
        let intensity = network
            .carriers
            .get(&gen.carrier)
            .map(|c| c.attribute("co2_emissions"))
            .unwrap_or(0.0)
            / gen.efficiency;
        let dynamic = existing.and_then(|t| t.column(name).map(|col| (t, col)));

        let values: Vec<f64> = snapshots
            .iter()
            .zip(&prices)
            .map(|(ts, price)| {
                let base = dynamic
                    .and_then(|(t, col)| t.position(ts).map(|row| col[row]))
                    .unwrap_or(gen.marginal_cost);
                base + price * intensity
            })
            .collect();
        if values.iter().any(|v| *v != gen.marginal_cost) {
            table.insert_column(name, values)?;
        }
    }

    debug!(columns = table.column_count(), "time-varying marginal costs");
    if table.column_count() == 0 {
        network.generators.series.remove("marginal_cost");
    } else {
        network.generators.set_series("marginal_cost", table);
    }
    info!("Set time dependent emission prices from '{}'", co2_price.name);
    Ok(())
}
