use elprep_core::{Asset, Component, Network, PrepError, PrepResult};
use tracing::{debug, info};

use crate::options::{CarrierScaling, ScaledAttribute};

fn scale_asset<T: Asset>(asset: &mut T, scaling: &CarrierScaling) -> PrepResult<()> {
    let target = match scaling.attribute {
        ScaledAttribute::Potential => asset.potential_mut(),
        ScaledAttribute::CapitalCost => asset.capital_cost_mut(),
        ScaledAttribute::MarginalCost => asset.marginal_cost_mut().ok_or_else(|| {
            PrepError::Config(format!(
                "'{}': {} have no marginal cost to scale",
                scaling.token,
                T::KIND.list_name()
            ))
        })?,
    };
    *target *= scaling.factor;
    Ok(())
}

fn scale_matching<T: Asset>(component: &mut Component<T>, scaling: &CarrierScaling) -> PrepResult<usize> {
    let mut scaled = 0;
    for (name, asset) in component.iter_mut() {
        if asset.carrier().contains(scaling.carrier.as_str()) {
            scale_asset(asset, scaling)?;
            debug!(component = T::KIND.list_name(), name, "scaled");
            scaled += 1;
        }
    }
    Ok(scaled)
}

/// Apply a `<carrier>+<code><factor>` token.
///
/// The token only applies when its carrier starts with the base name (the
/// part before the first `-`) of a carrier in the network. `AC` scales lines;
/// any other carrier scales generators, links, storage units and stores whose
/// carrier name contains it. Returns the number of scaled entities, or `None`
/// when the carrier is not in the network.
pub fn apply_carrier_scaling(
    network: &mut Network,
    scaling: &CarrierScaling,
) -> PrepResult<Option<usize>> {
    let known = network
        .carriers
        .keys()
        .filter_map(|name| name.split('-').next())
        .any(|base| !base.is_empty() && scaling.carrier.starts_with(base));
    if !known {
        debug!(token = %scaling.token, "carrier not in network; scaling skipped");
        return Ok(None);
    }

    let scaled = if scaling.carrier == "AC" {
        if scaling.attribute == ScaledAttribute::MarginalCost {
            return Err(PrepError::Config(format!(
                "'{}': lines have no marginal cost to scale",
                scaling.token
            )));
        }
        let mut count = 0;
        for (_, line) in network.lines.iter_mut() {
            scale_asset(line, scaling)?;
            count += 1;
        }
        count
    } else {
        scale_matching(&mut network.generators, scaling)?
            + scale_matching(&mut network.links, scaling)?
            + scale_matching(&mut network.storage_units, scaling)?
            + scale_matching(&mut network.stores, scaling)?
    };
    info!(token = %scaling.token, entities = scaled, "applied carrier scaling");
    Ok(Some(scaled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use elprep_core::{Carrier, Generator, Line, Store};

    fn network() -> Network {
        let mut network = Network::new();
        for carrier in ["AC", "onwind", "offwind-ac", "H2"] {
            network.carriers.insert(carrier.into(), Carrier::default());
        }
        network.lines.insert(
            "1",
            Line { s_nom_max: 100.0, capital_cost: 10.0, ..Line::default() },
        );
        for (name, carrier) in [("a", "offwind-ac"), ("b", "offwind-dc"), ("c", "onwind")] {
            network.generators.insert(
                name,
                Generator {
                    carrier: carrier.into(),
                    p_nom_max: 100.0,
                    marginal_cost: 2.0,
                    ..Generator::default()
                },
            );
        }
        network.stores.insert(
            "h2",
            Store { carrier: "H2".into(), e_nom_max: 1000.0, ..Store::default() },
        );
        network
    }

    #[test]
    fn scales_every_carrier_containing_the_token() {
        let mut network = network();
        let scaling = CarrierScaling::parse("offwind+p0.5").unwrap();
        assert_eq!(apply_carrier_scaling(&mut network, &scaling).unwrap(), Some(2));
        assert_eq!(network.generators.get("a").unwrap().p_nom_max, 50.0);
        assert_eq!(network.generators.get("b").unwrap().p_nom_max, 50.0);
        assert_eq!(network.generators.get("c").unwrap().p_nom_max, 100.0);
    }

    #[test]
    fn ac_scales_lines() {
        let mut network = network();
        let scaling = CarrierScaling::parse("AC+c2").unwrap();
        apply_carrier_scaling(&mut network, &scaling).unwrap();
        assert_eq!(network.lines.get("1").unwrap().capital_cost, 20.0);
        let scaling = CarrierScaling::parse("AC+p3").unwrap();
        apply_carrier_scaling(&mut network, &scaling).unwrap();
        assert_eq!(network.lines.get("1").unwrap().s_nom_max, 300.0);
    }

    #[test]
    fn ac_marginal_cost_is_a_config_error() {
        let mut network = network();
        let scaling = CarrierScaling::parse("AC+m2").unwrap();
        assert!(matches!(
            apply_carrier_scaling(&mut network, &scaling),
            Err(PrepError::Config(_))
        ));
    }

    #[test]
    fn store_potential_is_energy_capacity() {
        let mut network = network();
        let scaling = CarrierScaling::parse("H2+p0.1").unwrap();
        apply_carrier_scaling(&mut network, &scaling).unwrap();
        assert_eq!(network.stores.get("h2").unwrap().e_nom_max, 100.0);
    }

    #[test]
    fn unknown_carrier_is_skipped() {
        let mut network = network();
        let scaling = CarrierScaling::parse("nuclear+m2").unwrap();
        assert_eq!(apply_carrier_scaling(&mut network, &scaling).unwrap(), None);
        assert_eq!(network.generators.get("c").unwrap().marginal_cost, 2.0);
    }
}
