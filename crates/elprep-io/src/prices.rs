use std::{collections::HashSet, path::Path};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use elprep_core::Timestamp;
use tracing::debug;

/// A time-indexed price series, one value per unique label in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    pub name: String,
    pub points: Vec<(Timestamp, f64)>,
}

impl PriceSeries {
    /// Build from raw points; a repeated time label keeps its first value.
    pub fn from_points(name: impl Into<String>, raw: impl IntoIterator<Item = (Timestamp, f64)>) -> Self {
        let mut seen = HashSet::new();
        let points = raw.into_iter().filter(|(ts, _)| seen.insert(*ts)).collect();
        Self {
            name: name.into(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Value at an exact time label.
    pub fn get(&self, ts: &Timestamp) -> Option<f64> {
        self.points
            .iter()
            .find(|(label, _)| label == ts)
            .map(|(_, value)| *value)
    }
}

/// Parse timestamps as written by common spreadsheet and dataframe exports.
/// Naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<Timestamp> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&chrono::Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| anyhow!("unrecognized timestamp '{}'", raw))?;
    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| anyhow!("unrecognized timestamp '{}'", raw))
}

/// Read a price CSV whose first column is the time label and second column
/// the price. Further columns are ignored; the header names the series.
pub fn read_price_series(path: &Path) -> Result<PriceSeries> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening price CSV: {}", path.display()))?;
    let name = reader
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?
        .get(1)
        .ok_or_else(|| anyhow!("price CSV {} needs a value column", path.display()))?
        .to_string();

    let mut raw = Vec::new();
    for result in reader.records() {
        let record = result.with_context(|| "reading price CSV record")?;
        let label = record
            .get(0)
            .ok_or_else(|| anyhow!("missing time column"))?;
        let ts = parse_timestamp(label)?;
        let value: f64 = record
            .get(1)
            .ok_or_else(|| anyhow!("missing value column"))?
            .parse()
            .with_context(|| format!("parsing price at {}", label))?;
        raw.push((ts, value));
    }

    let total = raw.len();
    let series = PriceSeries::from_points(name, raw);
    if series.len() < total {
        debug!(dropped = total - series.len(), "dropped duplicate price labels");
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::fs;

    #[test]
    fn timestamps_in_several_layouts() {
        let expected = Utc.with_ymd_and_hms(2013, 1, 1, 6, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2013-01-01 06:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2013-01-01T06:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2013-01-01T06:00:00Z").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2013-01-01").unwrap(),
            Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap()
        );
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn duplicates_keep_first_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("co2_price.csv");
        fs::write(
            &path,
            "time,co2_price\n2013-01-01,10\n2013-01-01,99\n2013-02-01,20\n",
        )
        .unwrap();
        let series = read_price_series(&path).unwrap();
        assert_eq!(series.name, "co2_price");
        assert_eq!(series.len(), 2);
        let jan = Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(series.get(&jan), Some(10.0));
    }

    #[test]
    fn missing_value_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("co2_price.csv");
        fs::write(&path, "time\n2013-01-01\n").unwrap();
        assert!(read_price_series(&path).is_err());
    }
}
