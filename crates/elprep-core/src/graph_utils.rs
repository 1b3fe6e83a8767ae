use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::Serialize;

use crate::Network;

/// Topology summary: buses as nodes, lines and links as edges.
///
/// Used to report how autarky enforcement splits the grid into islands.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TopologyStats {
    pub bus_count: usize,
    pub branch_count: usize,
    pub connected_components: usize,
    pub isolated_buses: usize,
    /// Lines and links whose endpoints sit in different countries
    pub cross_border_branches: usize,
    pub countries: BTreeSet<String>,
}

/// Buses become nodes and every line or link an edge; a bus without any
/// branch is isolated, and autarky shows up as extra components.
pub fn topology_stats(network: &Network) -> TopologyStats {
    let mut graph: UnGraph<&str, ()> = UnGraph::new_undirected();
    let mut nodes: BTreeMap<&str, NodeIndex> = BTreeMap::new();
    for (name, _) in network.buses.iter() {
        nodes.insert(name, graph.add_node(name));
    }

    let endpoints = network
        .lines
        .iter()
        .map(|(_, line)| (line.bus0.as_str(), line.bus1.as_str()))
        .chain(
            network
                .links
                .iter()
                .map(|(_, link)| (link.bus0.as_str(), link.bus1.as_str())),
        );

    let mut branch_count = 0;
    let mut cross_border_branches = 0;
    for (bus0, bus1) in endpoints {
        branch_count += 1;
        if let (Some(a), Some(b)) = (nodes.get(bus0), nodes.get(bus1)) {
            graph.add_edge(*a, *b, ());
        }
        if network.bus_country(bus0) != network.bus_country(bus1) {
            cross_border_branches += 1;
        }
    }

    let isolated_buses = graph
        .node_indices()
        .filter(|idx| graph.neighbors(*idx).next().is_none())
        .count();

    TopologyStats {
        bus_count: graph.node_count(),
        branch_count,
        connected_components: connected_components(&graph),
        isolated_buses,
        cross_border_branches,
        countries: network
            .buses
            .iter()
            .map(|(_, bus)| bus.country.clone())
            .filter(|c| !c.is_empty())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bus, Line, Link};

    fn bus(country: &str) -> Bus {
        Bus {
            country: country.into(),
            ..Bus::default()
        }
    }

    #[test]
    fn counts_islands_and_cross_border_branches() {
        let mut network = Network::new();
        network.buses.insert("DE0 0", bus("DE"));
        network.buses.insert("DE0 1", bus("DE"));
        network.buses.insert("FR0 0", bus("FR"));
        network.buses.insert("PL0 0", bus("PL"));
        network.lines.insert(
            "1",
            Line {
                bus0: "DE0 0".into(),
                bus1: "DE0 1".into(),
                ..Line::default()
            },
        );
        network.links.insert(
            "DC 1",
            Link {
                bus0: "DE0 1".into(),
                bus1: "FR0 0".into(),
                carrier: "DC".into(),
                ..Link::default()
            },
        );

        let stats = topology_stats(&network);
        assert_eq!(stats.bus_count, 4);
        assert_eq!(stats.branch_count, 2);
        assert_eq!(stats.connected_components, 2);
        assert_eq!(stats.isolated_buses, 1);
        assert_eq!(stats.cross_border_branches, 1);
        assert_eq!(stats.countries.len(), 3);
    }

    #[test]
    fn empty_network_has_no_components() {
        let stats = topology_stats(&Network::new());
        assert_eq!(stats.connected_components, 0);
        assert_eq!(stats.branch_count, 0);
    }
}
