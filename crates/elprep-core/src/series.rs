//! Snapshot-indexed tables.
//!
//! A [`SeriesTable`] holds one time-varying attribute for many entities of the
//! same component kind (e.g. `p_max_pu` for every variable generator). Rows are
//! snapshots in ascending order, columns are entity names. Every column has
//! exactly one value per row.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PrepError, PrepResult};

/// Time label of one snapshot.
pub type Timestamp = DateTime<Utc>;

/// Hours in a non-leap year, used to turn summed objective weights into a years factor.
pub const HOURS_PER_YEAR: f64 = 8760.0;

/// Weights attached to one snapshot.
///
/// `objective` annualizes costs in the optimizer objective; `stores` and
/// `generators` scale storage state changes and generator energy sums.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weighting {
    pub objective: f64,
    #[serde(default = "default_weight")]
    pub stores: f64,
    #[serde(default = "default_weight")]
    pub generators: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Default for Weighting {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

impl Weighting {
    /// Same weight in every column.
    pub fn uniform(weight: f64) -> Self {
        Self {
            objective: weight,
            stores: weight,
            generators: weight,
        }
    }

    pub fn zero() -> Self {
        Self::uniform(0.0)
    }

    /// Column-wise sum, used when several snapshots collapse into one bucket.
    pub fn accumulate(&mut self, other: &Weighting) {
        self.objective += other.objective;
        self.stores += other.stores;
        self.generators += other.generators;
    }

    pub fn is_non_negative(&self) -> bool {
        self.objective >= 0.0 && self.stores >= 0.0 && self.generators >= 0.0
    }
}

#[derive(Deserialize)]
struct RawSeriesTable {
    index: Vec<Timestamp>,
    #[serde(default)]
    columns: BTreeMap<String, Vec<f64>>,
}

/// A snapshot × entity table of one attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeriesTable")]
pub struct SeriesTable {
    index: Vec<Timestamp>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl TryFrom<RawSeriesTable> for SeriesTable {
    type Error = PrepError;

    fn try_from(raw: RawSeriesTable) -> PrepResult<Self> {
        SeriesTable::from_columns(raw.index, raw.columns)
    }
}

impl SeriesTable {
    /// Empty table over the given row index.
    pub fn new(index: Vec<Timestamp>) -> Self {
        Self {
            index,
            columns: BTreeMap::new(),
        }
    }

    /// Build a table and check that the index is strictly ascending and every
    /// column matches its length.
    pub fn from_columns(
        index: Vec<Timestamp>,
        columns: BTreeMap<String, Vec<f64>>,
    ) -> PrepResult<Self> {
        if index.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(PrepError::Validation(
                "series index must be strictly ascending".into(),
            ));
        }
        let mut table = Self::new(index);
        for (name, values) in columns {
            table.insert_column(name, values)?;
        }
        Ok(table)
    }

    pub fn index(&self) -> &[Timestamp] {
        &self.index
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True if the table has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty() || self.columns.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Mutable access to one column; the slice keeps the row count fixed.
    pub fn column_mut(&mut self, name: &str) -> Option<&mut [f64]> {
        self.columns.get_mut(name).map(Vec::as_mut_slice)
    }

    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> PrepResult<()> {
        let name = name.into();
        if values.len() != self.index.len() {
            return Err(PrepError::Validation(format!(
                "column '{}' has {} values but the index has {} rows",
                name,
                values.len(),
                self.index.len()
            )));
        }
        self.columns.insert(name, values);
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Vec<f64>> {
        self.columns.remove(name)
    }

    /// Keep only the columns for which `keep` returns true.
    pub fn retain_columns(&mut self, mut keep: impl FnMut(&str, &[f64]) -> bool) {
        self.columns.retain(|name, values| keep(name, values));
    }

    /// Row position of a snapshot, if present.
    pub fn position(&self, snapshot: &Timestamp) -> Option<usize> {
        self.index.binary_search(snapshot).ok()
    }

    pub fn value(&self, column: &str, snapshot: &Timestamp) -> Option<f64> {
        let row = self.position(snapshot)?;
        self.columns.get(column).map(|values| values[row])
    }

    /// Maximum of each column; used to normalize series before segmentation.
    pub fn column_maxima(&self) -> BTreeMap<String, f64> {
        self.columns
            .iter()
            .map(|(name, values)| {
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (name.clone(), max)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hours(n: usize) -> Vec<Timestamp> {
        let start = Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|h| start + chrono::Duration::hours(h as i64))
            .collect()
    }

    #[test]
    fn insert_column_checks_length() {
        let mut table = SeriesTable::new(hours(3));
        assert!(table.insert_column("wind", vec![0.1, 0.2, 0.3]).is_ok());
        assert!(table.insert_column("solar", vec![0.1]).is_err());
        assert_eq!(table.column_count(), 1);
    }

    #[test]
    fn empty_means_no_rows_or_no_columns() {
        let table = SeriesTable::new(hours(3));
        assert!(table.is_empty());
        let mut table = SeriesTable::new(Vec::new());
        table.insert_column("wind", Vec::new()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn rejects_unsorted_index() {
        let mut index = hours(3);
        index.swap(0, 2);
        assert!(SeriesTable::from_columns(index, BTreeMap::new()).is_err());
    }

    #[test]
    fn value_lookup_by_snapshot() {
        let index = hours(3);
        let mut table = SeriesTable::new(index.clone());
        table.insert_column("wind", vec![0.1, 0.2, 0.3]).unwrap();
        assert_eq!(table.value("wind", &index[1]), Some(0.2));
        assert_eq!(table.value("solar", &index[1]), None);
    }

    #[test]
    fn deserialization_validates_column_lengths() {
        let json = r#"{"index":["2013-01-01T00:00:00Z"],"columns":{"wind":[0.1,0.2]}}"#;
        assert!(serde_json::from_str::<SeriesTable>(json).is_err());
    }

    #[test]
    fn weighting_accumulates_columnwise() {
        let mut w = Weighting::zero();
        w.accumulate(&Weighting::uniform(1.0));
        w.accumulate(&Weighting {
            objective: 2.0,
            stores: 1.0,
            generators: 0.5,
        });
        assert_eq!(w.objective, 3.0);
        assert_eq!(w.stores, 2.0);
        assert_eq!(w.generators, 1.5);
    }
}
