use elprep_core::{ComponentKind, Network};
use tracing::info;

/// Remove transmission so that regions must balance themselves.
///
/// With `only_crossborder`, removes every line and DC link whose endpoints lie
/// in different countries (an unknown bus counts as a different country).
/// Otherwise removes all lines and all DC links. Time series of removed
/// entities go with them. Returns the number of removed branches.
pub fn enforce_autarky(network: &mut Network, only_crossborder: bool) -> usize {
    let crosses = |bus0: &str, bus1: &str| {
        let c0 = network.bus_country(bus0);
        let c1 = network.bus_country(bus1);
        c0.is_none() || c1.is_none() || c0 != c1
    };

    let (lines, links) = if only_crossborder {
        (
            network.lines.select(|l| crosses(&l.bus0, &l.bus1)),
            network
                .links
                .select(|l| l.is_dc() && crosses(&l.bus0, &l.bus1)),
        )
    } else {
        (
            network.lines.select(|_| true),
            network.links.select(|l| l.is_dc()),
        )
    };

    let removed = network.remove(ComponentKind::Line, &lines)
        + network.remove(ComponentKind::Link, &links);
    info!(
        lines = lines.len(),
        links = links.len(),
        only_crossborder,
        "Enforced autarky"
    );
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use elprep_core::{Bus, Line, Link, SeriesTable};

    fn network() -> Network {
        let mut network = Network::new();
        let t0 = Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap();
        network.set_snapshots(vec![t0], None).unwrap();
        for (name, country) in [("DE0", "DE"), ("DE1", "DE"), ("FR0", "FR")] {
            network
                .buses
                .insert(name, Bus { country: country.into(), ..Bus::default() });
        }
        let line = |a: &str, b: &str| Line { bus0: a.into(), bus1: b.into(), ..Line::default() };
        network.lines.insert("domestic", line("DE0", "DE1"));
        network.lines.insert("border", line("DE1", "FR0"));
        let link = |a: &str, b: &str, carrier: &str| Link {
            bus0: a.into(),
            bus1: b.into(),
            carrier: carrier.into(),
            ..Link::default()
        };
        network.links.insert("dc domestic", link("DE0", "DE1", "DC"));
        network.links.insert("dc border", link("DE0", "FR0", "DC"));
        network.links.insert("h2 border", link("DE0", "FR0", "H2 pipeline"));

        let mut s_max_pu = SeriesTable::new(vec![t0]);
        s_max_pu.insert_column("border", vec![0.5]).unwrap();
        s_max_pu.insert_column("domestic", vec![0.6]).unwrap();
        network.lines.set_series("s_max_pu", s_max_pu);
        network
    }

    #[test]
    fn crossborder_only_removes_international_branches() {
        let mut network = network();
        let removed = enforce_autarky(&mut network, true);
        assert_eq!(removed, 2);
        assert!(network.lines.contains("domestic"));
        assert!(!network.lines.contains("border"));
        assert!(network.links.contains("dc domestic"));
        assert!(!network.links.contains("dc border"));
        assert!(network.links.contains("h2 border"));
        let series = network.lines.series("s_max_pu").unwrap();
        assert!(!series.has_column("border"));
        assert!(series.has_column("domestic"));
    }

    #[test]
    fn full_autarky_removes_all_lines_and_dc_links() {
        let mut network = network();
        let removed = enforce_autarky(&mut network, false);
        assert_eq!(removed, 4);
        assert!(network.lines.is_empty());
        assert_eq!(
            network.links.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            vec!["h2 border"]
        );
    }

    #[test]
    fn unknown_bus_counts_as_foreign() {
        let mut network = network();
        network.lines.insert(
            "dangling",
            Line { bus0: "DE0".into(), bus1: "XX".into(), ..Line::default() },
        );
        enforce_autarky(&mut network, true);
        assert!(!network.lines.contains("dangling"));
    }
}
