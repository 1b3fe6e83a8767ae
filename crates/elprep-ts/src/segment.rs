//! Segment aggregation: replace the snapshot sequence with a few
//! variable-length segments chosen from the normalized renewable, demand and
//! inflow profiles.

use std::collections::BTreeMap;

use chrono::Duration;
use elprep_core::{ComponentKind, Network, PrepError, PrepResult, SeriesTable, Timestamp, Weighting};
use tracing::{debug, info, warn};

/// Time-varying tables that drive the segmentation, in concatenation order.
pub const SEGMENTED_SERIES: [(ComponentKind, &str); 3] = [
    (ComponentKind::Generator, "p_max_pu"),
    (ComponentKind::Load, "p_set"),
    (ComponentKind::StorageUnit, "inflow"),
];

/// Row-major multivariate series handed to a backend. Every column is scaled
/// by its maximum so that no profile dominates the distance measure.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSeries {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl NormalizedSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

/// Result of a backend run: one duration (in original snapshots) and one
/// representative row per segment, in time order.
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    pub durations: Vec<usize>,
    pub values: Vec<Vec<f64>>,
}

impl Segmentation {
    fn check(&self, input: &NormalizedSeries, segments: usize) -> PrepResult<()> {
        if self.durations.len() != segments || self.values.len() != segments {
            return Err(PrepError::Validation(format!(
                "backend returned {} durations and {} rows for {} segments",
                self.durations.len(),
                self.values.len(),
                segments
            )));
        }
        if self.durations.iter().any(|d| *d == 0) {
            return Err(PrepError::Validation("segment with zero duration".into()));
        }
        let covered: usize = self.durations.iter().sum();
        if covered != input.len() {
            return Err(PrepError::Validation(format!(
                "segments cover {} snapshots but the input has {}",
                covered,
                input.len()
            )));
        }
        if self.values.iter().any(|row| row.len() != input.width()) {
            return Err(PrepError::Validation(
                "segment representative has the wrong number of columns".into(),
            ));
        }
        Ok(())
    }
}

/// A segmentation algorithm. Backends receive normalized input and only
/// decide where segments start and what each one looks like.
pub trait SegmentationBackend {
    fn name(&self) -> &str;

    /// Partition `series` into exactly `segments` contiguous segments.
    ///
    /// `solver_name` is passed through for backends that formulate the
    /// partition as an optimization problem.
    fn segment(
        &self,
        series: &NormalizedSeries,
        segments: usize,
        solver_name: &str,
    ) -> PrepResult<Segmentation>;
}

struct Scaled {
    kind: ComponentKind,
    attr: &'static str,
    columns: Vec<(String, f64)>,
}

fn scale_factor(max: f64) -> f64 {
    if max.is_finite() && max > 0.0 {
        max
    } else {
        1.0
    }
}

/// Aggregate the network into `segments` variable-length segments.
///
/// Segment durations become the weightings of the new snapshots, which are
/// placed at the first snapshot plus the cumulative duration of the
/// preceding segments. The driving tables are replaced by the de-normalized
/// representatives; every other time-varying table is averaged over the
/// original snapshots of each segment.
pub fn apply_time_segmentation(
    network: &Network,
    segments: usize,
    solver_name: &str,
    backend: &dyn SegmentationBackend,
) -> PrepResult<Network> {
    info!(
        "Aggregating time series to {} segments with backend '{}'",
        segments,
        backend.name()
    );
    if segments == 0 {
        return Err(PrepError::Config("number of segments must be positive".into()));
    }
    let snapshots = &network.snapshots;
    if snapshots.is_empty() {
        return Err(PrepError::Validation("cannot segment a network without snapshots".into()));
    }
    if segments > snapshots.len() {
        return Err(PrepError::Config(format!(
            "{} segments requested but the network has only {} snapshots",
            segments,
            snapshots.len()
        )));
    }

    let mut scaled = Vec::new();
    let mut input = NormalizedSeries {
        columns: Vec::new(),
        rows: vec![Vec::new(); snapshots.len()],
    };
    for (kind, attr) in SEGMENTED_SERIES {
        let Some(table) = network.series_map(kind).get(attr) else {
            continue;
        };
        if table.is_empty() {
            continue;
        }
        // Snapshots without a row take the column mean.
        let source_rows: Vec<Option<usize>> =
            snapshots.iter().map(|ts| table.position(ts)).collect();
        let covered = source_rows.iter().flatten().count();
        if covered != table.len() {
            return Err(PrepError::Validation(format!(
                "{}.{} has rows that are not network snapshots",
                kind.list_name(),
                attr
            )));
        }
        if covered < snapshots.len() {
            debug!(
                table = %format!("{}.{}", kind.list_name(), attr),
                missing = snapshots.len() - covered,
                "filling sparse profile with column means"
            );
        }
        let mut columns = Vec::with_capacity(table.column_count());
        for (name, max) in table.column_maxima() {
            let factor = scale_factor(max);
            let values = table.column(&name).unwrap_or_default();
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            for (row, &source) in input.rows.iter_mut().zip(&source_rows) {
                let value = source.map_or(mean, |r| values[r]);
                row.push(value / factor);
            }
            input.columns.push(format!("{}::{}", kind.list_name(), name));
            columns.push((name, factor));
        }
        scaled.push(Scaled { kind, attr, columns });
    }
    if input.width() == 0 {
        warn!("No renewable, load or inflow profiles found; segmenting on a constant series");
    }

    let result = backend.segment(&input, segments, solver_name)?;
    result.check(&input, segments)?;
    debug!(durations = ?result.durations, "segmentation finished");

    let step = snapshot_step(snapshots);
    let first = snapshots[0];
    let mut new_snapshots = Vec::with_capacity(segments);
    let mut weightings = Vec::with_capacity(segments);
    let mut membership = Vec::with_capacity(snapshots.len());
    let mut offset = 0usize;
    for (segment, duration) in result.durations.iter().enumerate() {
        new_snapshots.push(first + step * offset as i32);
        weightings.push(Weighting::uniform(*duration as f64));
        membership.extend(std::iter::repeat(segment).take(*duration));
        offset += duration;
    }

    let mut segmented = network.copy_without_time();
    segmented.set_snapshots(new_snapshots.clone(), Some(weightings))?;

    let mut col = 0;
    for entry in &scaled {
        let mut table = SeriesTable::new(new_snapshots.clone());
        for (name, factor) in &entry.columns {
            let values = result.values.iter().map(|row| row[col] * factor).collect();
            table.insert_column(name.clone(), values)?;
            col += 1;
        }
        segmented
            .series_map_mut(entry.kind)
            .insert(entry.attr.to_string(), table);
    }

    let positions: BTreeMap<Timestamp, usize> = snapshots
        .iter()
        .enumerate()
        .map(|(row, ts)| (*ts, membership[row]))
        .collect();
    for (kind, attr, table) in network.series_tables() {
        let drives_segmentation = SEGMENTED_SERIES
            .iter()
            .any(|(k, a)| *k == kind && *a == attr);
        if table.is_empty() || drives_segmentation {
            continue;
        }
        let migrated = segment_means(table, &positions, &new_snapshots)?;
        segmented.series_map_mut(kind).insert(attr.to_string(), migrated);
    }

    Ok(segmented)
}

/// Spacing of the original snapshots; hourly when it cannot be inferred.
fn snapshot_step(snapshots: &[Timestamp]) -> Duration {
    match snapshots {
        [a, b, ..] => *b - *a,
        _ => Duration::hours(1),
    }
}

fn segment_means(
    table: &SeriesTable,
    membership: &BTreeMap<Timestamp, usize>,
    segment_starts: &[Timestamp],
) -> PrepResult<SeriesTable> {
    let mut rows_by_segment: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (row, ts) in table.index().iter().enumerate() {
        let segment = membership.get(ts).ok_or_else(|| {
            PrepError::Validation(format!("series row {} is not a network snapshot", ts))
        })?;
        rows_by_segment.entry(*segment).or_default().push(row);
    }

    let index = rows_by_segment.keys().map(|s| segment_starts[*s]).collect();
    let mut out = SeriesTable::new(index);
    for (name, values) in table.columns() {
        let means = rows_by_segment
            .values()
            .map(|rows| rows.iter().map(|r| values[*r]).sum::<f64>() / rows.len() as f64)
            .collect();
        out.insert_column(name, means)?;
    }
    Ok(out)
}
