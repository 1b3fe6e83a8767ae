use std::collections::BTreeMap;

use chrono::{Duration, DurationRound};
use elprep_core::{Network, PrepError, PrepResult, SeriesTable, Timestamp, Weighting};
use tracing::{debug, info};

/// Parse a bucket rule such as `3h`, `30m` or `1d` into a duration.
pub fn parse_rule(rule: &str) -> PrepResult<Duration> {
    let trimmed = rule.trim().to_ascii_lowercase();
    if trimmed.is_empty() {
        return Err(PrepError::Config("resample rule cannot be empty".into()));
    }
    let (value_str, unit) = match trimmed.chars().last() {
        Some(ch) if ch.is_ascii_alphabetic() => (&trimmed[..trimmed.len() - 1], Some(ch)),
        _ => (trimmed.as_str(), None),
    };

    let value = value_str
        .parse::<i64>()
        .map_err(|err| PrepError::Config(format!("parsing rule duration '{}': {}", rule, err)))?;
    let duration = match unit.unwrap_or('h') {
        's' => Duration::seconds(value),
        'm' => Duration::minutes(value),
        'h' => Duration::hours(value),
        'd' => Duration::days(value),
        other => {
            return Err(PrepError::Config(format!(
                "unsupported time unit '{}'; expected s/m/h/d",
                other
            )));
        }
    };
    if duration <= Duration::zero() {
        return Err(PrepError::Config("resample rule must be positive".into()));
    }
    Ok(duration)
}

/// Bins are anchored at midnight of the first snapshot's day.
fn bucket_origin(first: Timestamp) -> PrepResult<Timestamp> {
    first
        .duration_trunc(Duration::days(1))
        .map_err(|err| PrepError::Validation(format!("truncating first snapshot: {}", err)))
}

fn floor_bucket(ts: Timestamp, origin: Timestamp, period: Duration) -> PrepResult<Timestamp> {
    let period_s = period.num_seconds();
    if period_s <= 0 {
        return Err(PrepError::Config("bucket size must be at least one second".into()));
    }
    let offset = (ts - origin).num_seconds();
    Ok(origin + Duration::seconds(offset - offset.rem_euclid(period_s)))
}

#[derive(Default)]
struct BucketStats {
    count: usize,
    sums: Vec<f64>,
}

/// Average all time-varying data over fixed-size buckets.
///
/// Returns a new network whose snapshots are the bucket starts. Weightings
/// are summed within each bucket so the represented hours are conserved;
/// every non-empty time-varying table is averaged per bucket. Static data is
/// copied unchanged.
pub fn average_every_nhours(network: &Network, offset: Duration) -> PrepResult<Network> {
    info!("Resampling the network to {} h buckets", offset.num_minutes() as f64 / 60.0);
    let Some(first) = network.snapshots.first().copied() else {
        return Ok(network.clone());
    };
    if network.snapshot_weightings.len() != network.snapshots.len() {
        return Err(PrepError::Validation(
            "snapshot weightings do not match snapshots".into(),
        ));
    }
    let origin = bucket_origin(first)?;

    let mut weightings: BTreeMap<Timestamp, Weighting> = BTreeMap::new();
    for (ts, weight) in network.snapshots.iter().zip(&network.snapshot_weightings) {
        let bucket = floor_bucket(*ts, origin, offset)?;
        weightings
            .entry(bucket)
            .or_insert_with(Weighting::zero)
            .accumulate(weight);
    }

    let mut resampled = network.copy_without_time();
    let (snapshots, weights): (Vec<_>, Vec<_>) = weightings.into_iter().unzip();
    resampled.set_snapshots(snapshots, Some(weights))?;

    for (kind, attr, table) in network.series_tables() {
        if table.is_empty() {
            continue;
        }
        let averaged = average_table(table, origin, offset)?;
        debug!(
            component = kind.list_name(),
            attr,
            rows = averaged.len(),
            "averaged time-varying table"
        );
        resampled
            .series_map_mut(kind)
            .insert(attr.to_string(), averaged);
    }

    Ok(resampled)
}

fn average_table(table: &SeriesTable, origin: Timestamp, offset: Duration) -> PrepResult<SeriesTable> {
    let names: Vec<&str> = table.column_names().collect();
    let columns: Vec<&[f64]> = names
        .iter()
        .filter_map(|name| table.column(name))
        .collect();

    let mut buckets: BTreeMap<Timestamp, BucketStats> = BTreeMap::new();
    for (row, ts) in table.index().iter().enumerate() {
        let bucket = floor_bucket(*ts, origin, offset)?;
        let entry = buckets.entry(bucket).or_insert_with(|| BucketStats {
            count: 0,
            sums: vec![0.0; columns.len()],
        });
        entry.count += 1;
        for (sum, values) in entry.sums.iter_mut().zip(&columns) {
            *sum += values[row];
        }
    }

    let index: Vec<Timestamp> = buckets.keys().copied().collect();
    let mut averaged = SeriesTable::new(index);
    for (col, name) in names.iter().enumerate() {
        let means = buckets
            .values()
            .map(|stats| stats.sums[col] / stats.count as f64)
            .collect();
        averaged.insert_column(*name, means)?;
    }
    Ok(averaged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use elprep_core::{ComponentKind, Generator, Load};

    fn hourly(n: i64) -> Vec<Timestamp> {
        let start = Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|h| start + Duration::hours(h)).collect()
    }

    fn network_with_series(n: i64) -> Network {
        let mut network = Network::new();
        network.set_snapshots(hourly(n), None).unwrap();
        network.generators.insert("wind", Generator::default());
        network.loads.insert("load", Load::default());
        let mut p_max_pu = SeriesTable::new(network.snapshots.clone());
        p_max_pu
            .insert_column("wind", (0..n).map(|h| h as f64).collect())
            .unwrap();
        network.generators.set_series("p_max_pu", p_max_pu);
        let mut p_set = SeriesTable::new(network.snapshots.clone());
        p_set.insert_column("load", vec![100.0; n as usize]).unwrap();
        network.loads.set_series("p_set", p_set);
        network
    }

    #[test]
    fn parse_rule_units() {
        assert_eq!(parse_rule("3h").unwrap(), Duration::hours(3));
        assert_eq!(parse_rule("3H").unwrap(), Duration::hours(3));
        assert_eq!(parse_rule("30m").unwrap(), Duration::minutes(30));
        assert_eq!(parse_rule("2").unwrap(), Duration::hours(2));
        assert!(parse_rule("0h").is_err());
        assert!(parse_rule("3w").is_err());
        assert!(parse_rule("").is_err());
    }

    #[test]
    fn weightings_are_summed_and_conserved() {
        let network = network_with_series(10);
        let resampled = average_every_nhours(&network, Duration::hours(3)).unwrap();
        // ceil(10 / 3)
        assert_eq!(resampled.snapshots.len(), 4);
        assert!((resampled.objective_weight_sum() - network.objective_weight_sum()).abs() < 1e-9);
        let objective: Vec<f64> = resampled
            .snapshot_weightings
            .iter()
            .map(|w| w.objective)
            .collect();
        assert_eq!(objective, vec![3.0, 3.0, 3.0, 1.0]);
    }

    #[test]
    fn series_are_bucket_means() {
        let network = network_with_series(10);
        let resampled = average_every_nhours(&network, Duration::hours(3)).unwrap();
        let wind = resampled
            .generators
            .series("p_max_pu")
            .unwrap()
            .column("wind")
            .unwrap();
        assert_eq!(wind, &[1.0, 4.0, 7.0, 9.0]);
        let load = resampled.loads.series("p_set").unwrap().column("load").unwrap();
        assert!(load.iter().all(|v| (*v - 100.0).abs() < 1e-12));
        assert_eq!(
            resampled.generators.series("p_max_pu").unwrap().index(),
            resampled.snapshots.as_slice()
        );
    }

    #[test]
    fn static_tables_and_empty_series_are_handled() {
        let mut network = network_with_series(4);
        let snapshots = network.snapshots.clone();
        network
            .series_map_mut(ComponentKind::Generator)
            .insert("marginal_cost".into(), SeriesTable::new(snapshots));
        let resampled = average_every_nhours(&network, Duration::hours(2)).unwrap();
        assert_eq!(resampled.generators.len(), 1);
        assert!(resampled.generators.series("marginal_cost").is_none());
    }

    #[test]
    fn buckets_anchor_at_start_of_day() {
        let mut network = Network::new();
        let start = Utc.with_ymd_and_hms(2013, 1, 1, 1, 0, 0).unwrap();
        let snapshots: Vec<_> = (0..4).map(|h| start + Duration::hours(h)).collect();
        network.set_snapshots(snapshots, None).unwrap();
        let resampled = average_every_nhours(&network, Duration::hours(2)).unwrap();
        assert_eq!(
            resampled.snapshots.first().copied(),
            Some(Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap())
        );
        let objective: Vec<f64> = resampled
            .snapshot_weightings
            .iter()
            .map(|w| w.objective)
            .collect();
        assert_eq!(objective, vec![1.0, 2.0, 1.0]);
    }
}
