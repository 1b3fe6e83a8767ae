//! Transmission expansion limits and line/link capacity bounds.

use std::collections::BTreeMap;

use elprep_core::{GlobalConstraint, Line, Network, PrepError, PrepResult, Sense};
use tracing::{debug, info};

use crate::config::{LinesConfig, LinksConfig};
use crate::costs::CostTable;
use crate::options::{LimitFactor, LimitKind, TransmissionLimit};

/// Apply the N-1 security margin to every line.
pub fn set_line_s_max_pu(network: &mut Network, s_max_pu: f64) {
    for (_, line) in network.lines.iter_mut() {
        line.s_max_pu = s_max_pu;
    }
    info!("N-1 security margin of lines set to {}", s_max_pu);
}

/// Thermal capacity of a line: `√3 · i_nom · num_parallel · v_nom(bus0)` for
/// typed lines, `s_nom` for lines without a standard type.
pub fn line_capacity(network: &Network, name: &str, line: &Line) -> PrepResult<f64> {
    if line.line_type.is_empty() {
        return Ok(line.s_nom);
    }
    let line_type = network.line_types.get(&line.line_type).ok_or_else(|| {
        PrepError::Validation(format!(
            "line '{}' has unknown type '{}'",
            name, line.line_type
        ))
    })?;
    let bus = network.buses.get(&line.bus0).ok_or_else(|| {
        PrepError::Validation(format!("line '{}' references unknown bus '{}'", name, line.bus0))
    })?;
    Ok(3f64.sqrt() * line_type.i_nom * line.num_parallel * bus.v_nom)
}

/// Reprice lines and DC links from the cost table.
///
/// Lines pay `length · length_factor · HVAC overhead`. DC links pay the
/// overhead and submarine costs in proportion to their underwater share, plus
/// one inverter pair.
pub fn update_transmission_costs(
    network: &mut Network,
    costs: &CostTable,
    length_factor: f64,
) -> PrepResult<()> {
    let hvac = if network.lines.is_empty() {
        0.0
    } else {
        costs.require("HVAC overhead", "capital_cost")?
    };
    let has_dc = network.links.iter().any(|(_, link)| link.is_dc());
    let hvdc = if has_dc {
        Some((
            costs.require("HVDC overhead", "capital_cost")?,
            costs.require("HVDC submarine", "capital_cost")?,
            costs.require("HVDC inverter pair", "capital_cost")?,
        ))
    } else {
        None
    };

    for (_, line) in network.lines.iter_mut() {
        line.capital_cost = line.length * length_factor * hvac;
    }
    if let Some((overhead, submarine, inverter)) = hvdc {
        for (_, link) in network.links.iter_mut().filter(|(_, l)| l.is_dc()) {
            let uwf = link.underwater_fraction;
            link.capital_cost =
                link.length * length_factor * ((1.0 - uwf) * overhead + uwf * submarine)
                    + inverter;
        }
    }
    Ok(())
}

/// Name of the global constraint added for a limit kind (`lv_limit`, `lc_limit`).
pub fn limit_constraint_name(kind: LimitKind) -> String {
    format!("l{}_limit", kind.code())
}

fn limit_constraint_type(kind: LimitKind) -> &'static str {
    match kind {
        LimitKind::Cost => "transmission_expansion_cost_limit",
        LimitKind::Volume => "transmission_volume_expansion_limit",
    }
}

/// Bound transmission expansion relative to the current grid.
///
/// The reference is `Σ capacity · capital_cost` (cost limit) or
/// `Σ capacity · length` (volume limit) over lines and DC links, taken before
/// capital costs are refreshed at plain length. With `opt` or a factor above 1 every line and
/// DC link becomes extendable from its current capacity. Any numeric factor,
/// including those above 1, also adds a `≤ factor · reference` constraint.
pub fn set_transmission_limit(
    network: &mut Network,
    limit: &TransmissionLimit,
    costs: &CostTable,
) -> PrepResult<()> {
    let mut capacities = BTreeMap::new();
    for (name, line) in network.lines.iter() {
        capacities.insert(name.to_string(), line_capacity(network, name, line)?);
    }

    let weight = |capital_cost: f64, length: f64| match limit.kind {
        LimitKind::Cost => capital_cost,
        LimitKind::Volume => length,
    };
    let line_ref: f64 = network
        .lines
        .iter()
        .map(|(name, line)| capacities[name] * weight(line.capital_cost, line.length))
        .sum();
    let link_ref: f64 = network
        .links
        .iter()
        .filter(|(_, link)| link.is_dc())
        .map(|(_, link)| link.p_nom * weight(link.capital_cost, link.length))
        .sum();
    let reference = line_ref + link_ref;
    debug!(reference, kind = ?limit.kind, "transmission reference");

    let name = limit_constraint_name(limit.kind);
    if matches!(limit.factor, LimitFactor::Value(_)) && network.global_constraints.contains_key(&name) {
        return Err(PrepError::Validation(format!(
            "global constraint '{}' already exists",
            name
        )));
    }

    // Stored lengths already include the detour factor.
    update_transmission_costs(network, costs, 1.0)?;

    if limit.allows_expansion() {
        for (name, line) in network.lines.iter_mut() {
            line.s_nom_min = capacities[name];
            line.s_nom_extendable = true;
        }
        for (_, link) in network.links.iter_mut().filter(|(_, l)| l.is_dc()) {
            link.p_nom_min = link.p_nom;
            link.p_nom_extendable = true;
        }
    }

    if let LimitFactor::Value(factor) = limit.factor {
        network.add_global_constraint(
            name,
            GlobalConstraint {
                kind: limit_constraint_type(limit.kind).into(),
                carrier_attribute: "AC, DC".into(),
                sense: Sense::LessEqual,
                constant: factor * reference,
            },
        )?;
    }
    Ok(())
}

/// Absolute ceilings and extension budgets for line and link capacities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NomMaxLimits {
    pub s_nom_max: f64,
    pub p_nom_max: f64,
    pub s_nom_max_extension: f64,
    pub p_nom_max_extension: f64,
}

impl Default for NomMaxLimits {
    fn default() -> Self {
        Self {
            s_nom_max: f64::INFINITY,
            p_nom_max: f64::INFINITY,
            s_nom_max_extension: f64::INFINITY,
            p_nom_max_extension: f64::INFINITY,
        }
    }
}

impl NomMaxLimits {
    pub fn from_config(lines: &LinesConfig, links: &LinksConfig) -> Self {
        Self {
            s_nom_max: lines.s_nom_max,
            p_nom_max: links.p_nom_max,
            s_nom_max_extension: lines.max_extension,
            p_nom_max_extension: links.max_extension,
        }
    }
}

fn is_budget(extension: f64) -> bool {
    extension.is_finite() && extension > 0.0
}

/// Raise upper bounds to capacity plus extension budget where a finite
/// positive budget is set, then cap every line and link at the ceilings.
pub fn set_line_nom_max(network: &mut Network, limits: &NomMaxLimits) {
    if is_budget(limits.s_nom_max_extension) {
        info!("Limiting line extensions to {} MW", limits.s_nom_max_extension);
        for (_, line) in network.lines.iter_mut() {
            line.s_nom_max = line.s_nom + limits.s_nom_max_extension;
        }
    }
    if is_budget(limits.p_nom_max_extension) {
        info!("Limiting DC link extensions to {} MW", limits.p_nom_max_extension);
        for (_, link) in network.links.iter_mut().filter(|(_, l)| l.is_dc()) {
            link.p_nom_max = link.p_nom + limits.p_nom_max_extension;
        }
    }

    for (_, line) in network.lines.iter_mut() {
        line.s_nom_max = line.s_nom_max.min(limits.s_nom_max);
    }
    for (_, link) in network.links.iter_mut() {
        link.p_nom_max = link.p_nom_max.min(limits.p_nom_max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elprep_core::{Bus, LineType, Link};

    fn costs() -> CostTable {
        let mut costs = CostTable::default();
        costs.set("HVAC overhead", "capital_cost", 10.0);
        costs.set("HVDC overhead", "capital_cost", 20.0);
        costs.set("HVDC submarine", "capital_cost", 60.0);
        costs.set("HVDC inverter pair", "capital_cost", 1000.0);
        costs
    }

    fn network() -> Network {
        let mut network = Network::new();
        network.buses.insert("a", Bus { v_nom: 380.0, ..Bus::default() });
        network.buses.insert("b", Bus { v_nom: 380.0, ..Bus::default() });
        network.line_types.insert(
            "Al/St 240/40 4-bundle 380.0".into(),
            LineType { i_nom: 2.58, ..LineType::default() },
        );
        network.lines.insert(
            "typed",
            Line {
                bus0: "a".into(),
                bus1: "b".into(),
                line_type: "Al/St 240/40 4-bundle 380.0".into(),
                num_parallel: 2.0,
                length: 100.0,
                s_nom: 1.0,
                capital_cost: 3.0,
                ..Line::default()
            },
        );
        network.lines.insert(
            "plain",
            Line {
                bus0: "a".into(),
                bus1: "b".into(),
                length: 50.0,
                s_nom: 400.0,
                capital_cost: 2.0,
                ..Line::default()
            },
        );
        network.links.insert(
            "dc",
            Link {
                bus0: "a".into(),
                bus1: "b".into(),
                carrier: "DC".into(),
                p_nom: 500.0,
                length: 200.0,
                underwater_fraction: 0.5,
                capital_cost: 4.0,
                ..Link::default()
            },
        );
        network.links.insert(
            "h2",
            Link {
                bus0: "a".into(),
                bus1: "b".into(),
                carrier: "H2 pipeline".into(),
                p_nom: 100.0,
                length: 10.0,
                ..Link::default()
            },
        );
        network
    }

    fn typed_capacity() -> f64 {
        3f64.sqrt() * 2.58 * 2.0 * 380.0
    }

    #[test]
    fn typed_lines_use_thermal_capacity() {
        let network = network();
        let line = network.lines.get("typed").unwrap();
        assert!((line_capacity(&network, "typed", line).unwrap() - typed_capacity()).abs() < 1e-9);
        let plain = network.lines.get("plain").unwrap();
        assert_eq!(line_capacity(&network, "plain", plain).unwrap(), 400.0);
    }

    #[test]
    fn transmission_costs_follow_length_and_underwater_share() {
        let mut network = network();
        update_transmission_costs(&mut network, &costs(), 1.25).unwrap();
        assert!(
            (network.lines.get("typed").unwrap().capital_cost - (100.0 * 1.25 * 10.0)).abs() < 1e-9
        );
        // 200 * 1.25 * (0.5 * 20 + 0.5 * 60) + 1000
        assert!((network.links.get("dc").unwrap().capital_cost - 11_000.0).abs() < 1e-9);
        assert_eq!(network.links.get("h2").unwrap().capital_cost, 0.0);
    }

    #[test]
    fn missing_cost_leaves_network_untouched() {
        let mut network = network();
        let mut costs = CostTable::default();
        costs.set("HVAC overhead", "capital_cost", 10.0);
        assert!(update_transmission_costs(&mut network, &costs, 1.0).is_err());
        assert_eq!(network.lines.get("plain").unwrap().capital_cost, 2.0);
    }

    #[test]
    fn volume_limit_above_one_extends_and_constrains() {
        let mut network = network();
        let limit = TransmissionLimit::parse("v2.0").unwrap();
        set_transmission_limit(&mut network, &limit, &costs()).unwrap();

        let typed = network.lines.get("typed").unwrap();
        assert!(typed.s_nom_extendable);
        assert!((typed.s_nom_min - typed_capacity()).abs() < 1e-9);
        assert_eq!(network.lines.get("plain").unwrap().s_nom_min, 400.0);
        let dc = network.links.get("dc").unwrap();
        assert!(dc.p_nom_extendable);
        assert_eq!(dc.p_nom_min, 500.0);
        assert!(!network.links.get("h2").unwrap().p_nom_extendable);

        let reference = typed_capacity() * 100.0 + 400.0 * 50.0 + 500.0 * 200.0;
        let gc = &network.global_constraints["lv_limit"];
        assert_eq!(gc.kind, "transmission_volume_expansion_limit");
        assert_eq!(gc.carrier_attribute, "AC, DC");
        assert!((gc.constant - (2.0 * reference)).abs() < 1e-12 * (2.0 * reference).abs());
    }

    #[test]
    fn cost_limit_uses_costs_before_refresh() {
        let mut network = network();
        let limit = TransmissionLimit::parse("c1.0").unwrap();
        set_transmission_limit(&mut network, &limit, &costs()).unwrap();

        let reference = typed_capacity() * 3.0 + 400.0 * 2.0 + 500.0 * 4.0;
        let gc = &network.global_constraints["lc_limit"];
        assert_eq!(gc.kind, "transmission_expansion_cost_limit");
        assert!((gc.constant - reference).abs() < 1e-12 * reference.abs());
        assert!(!network.lines.get("plain").unwrap().s_nom_extendable);
        assert_eq!(network.lines.get("plain").unwrap().capital_cost, 500.0);
    }

    #[test]
    fn volume_limit_at_or_below_one_constrains_without_extension() {
        for factor in [1.0, 0.8] {
            let mut network = network();
            let limit = TransmissionLimit::parse(&format!("v{}", factor)).unwrap();
            set_transmission_limit(&mut network, &limit, &costs()).unwrap();

            let reference = typed_capacity() * 100.0 + 400.0 * 50.0 + 500.0 * 200.0;
            let gc = &network.global_constraints["lv_limit"];
            assert!((gc.constant - factor * reference).abs() < 1e-12 * reference);
            assert!(network.lines.iter().all(|(_, l)| !l.s_nom_extendable));
            assert!(network.links.iter().all(|(_, l)| !l.p_nom_extendable));
            assert_eq!(network.lines.get("plain").unwrap().s_nom_min, 0.0);
        }
    }

    #[test]
    fn refresh_uses_stored_length() {
        let mut network = network();
        let limit = TransmissionLimit::parse("v1.0").unwrap();
        set_transmission_limit(&mut network, &limit, &costs()).unwrap();
        assert_eq!(network.lines.get("plain").unwrap().capital_cost, 50.0 * 10.0);
        // 200 * (0.5 * 20 + 0.5 * 60) + 1000
        assert_eq!(network.links.get("dc").unwrap().capital_cost, 9_000.0);
    }

    #[test]
    fn optimize_extends_without_constraint() {
        let mut network = network();
        let limit = TransmissionLimit::parse("vopt").unwrap();
        set_transmission_limit(&mut network, &limit, &costs()).unwrap();
        assert!(network.global_constraints.is_empty());
        assert!(network.lines.iter().all(|(_, l)| l.s_nom_extendable));
    }

    #[test]
    fn extension_budget_then_ceiling() {
        let mut network = network();
        let limits = NomMaxLimits {
            s_nom_max: 450.0,
            p_nom_max: 550.0,
            s_nom_max_extension: 100.0,
            p_nom_max_extension: 100.0,
        };
        set_line_nom_max(&mut network, &limits);
        assert_eq!(network.lines.get("plain").unwrap().s_nom_max, 450.0);
        assert_eq!(network.lines.get("typed").unwrap().s_nom_max, 101.0);
        assert_eq!(network.links.get("dc").unwrap().p_nom_max, 550.0);
        assert_eq!(network.links.get("h2").unwrap().p_nom_max, 550.0);

        let before = network.clone();
        set_line_nom_max(
            &mut network,
            &NomMaxLimits { s_nom_max: 450.0, p_nom_max: 550.0, ..NomMaxLimits::default() },
        );
        assert_eq!(network.lines.get("plain"), before.lines.get("plain"));
        assert_eq!(network.links.get("dc"), before.links.get("dc"));
    }

    #[test]
    fn security_margin_applies_to_all_lines() {
        let mut network = network();
        set_line_s_max_pu(&mut network, 0.7);
        assert!(network.lines.iter().all(|(_, l)| l.s_max_pu == 0.7));
    }
}
