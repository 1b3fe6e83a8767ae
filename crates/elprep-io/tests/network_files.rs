use chrono::{Duration, TimeZone, Utc};
use elprep_core::{Bus, Generator, Line, Network, SeriesTable, Weighting};
use elprep_io::{load_network, save_network};

fn sample() -> Network {
    let start = Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap();
    let snapshots: Vec<_> = (0..3).map(|h| start + Duration::hours(h)).collect();
    let mut network = Network::new();
    network.name = "sample".into();
    network
        .set_snapshots(snapshots.clone(), Some(vec![Weighting::uniform(2.0); 3]))
        .unwrap();
    network.buses.insert("DE0 0", Bus { country: "DE".into(), ..Bus::default() });
    network.buses.insert("FR0 0", Bus { country: "FR".into(), ..Bus::default() });
    network.lines.insert(
        "1",
        Line {
            bus0: "DE0 0".into(),
            bus1: "FR0 0".into(),
            s_nom: 500.0,
            ..Line::default()
        },
    );
    network.generators.insert(
        "DE0 0 onwind",
        Generator {
            bus: "DE0 0".into(),
            carrier: "onwind".into(),
            ..Generator::default()
        },
    );
    let mut p_max_pu = SeriesTable::new(snapshots);
    p_max_pu
        .insert_column("DE0 0 onwind", vec![0.2, 0.5, 0.9])
        .unwrap();
    network.generators.set_series("p_max_pu", p_max_pu);
    network
}

#[test]
fn saved_network_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/elec.json");
    let network = sample();
    save_network(&network, &path).unwrap();

    let loaded = load_network(&path).unwrap();
    assert_eq!(loaded.name, "sample");
    assert_eq!(loaded.snapshots, network.snapshots);
    assert_eq!(loaded.objective_weight_sum(), 6.0);
    assert_eq!(loaded.lines.get("1"), network.lines.get("1"));
    assert_eq!(
        loaded.generators.series("p_max_pu"),
        network.generators.series("p_max_pu")
    );
}

#[test]
fn dangling_bus_reference_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    let mut network = sample();
    network.lines.get_mut("1").unwrap().bus1 = "XX".into();
    save_network(&network, &path).unwrap();

    let err = load_network(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("inconsistent"));
}

#[test]
fn missing_file_mentions_path() {
    let err = load_network(std::path::Path::new("/nonexistent/elec.json")).unwrap_err();
    assert!(format!("{:#}", err).contains("/nonexistent/elec.json"));
}
