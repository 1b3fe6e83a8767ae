use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One row of a technology cost-assumption table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    pub technology: String,
    pub parameter: String,
    pub value: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub source: String,
    #[serde(default, rename = "further description")]
    pub further_description: String,
}

/// Read `technology,parameter,value,unit[,source,further description]` rows.
pub fn read_cost_records(path: &Path) -> Result<Vec<CostRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening cost CSV: {}", path.display()))?;

    let mut records = Vec::new();
    for (line, result) in reader.deserialize::<CostRecord>().enumerate() {
        let record = result
            .with_context(|| format!("reading cost record {} of {}", line + 1, path.display()))?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_rows_with_optional_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("costs.csv");
        fs::write(
            &path,
            "technology,parameter,value,unit,source,further description\n\
             onwind,investment,1100,EUR/kW,DEA,\n\
             onwind,lifetime,30,years,DEA,\"incl. repowering\"\n",
        )
        .unwrap();
        let records = read_cost_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].unit, "EUR/kW");
        assert_eq!(records[1].value, 30.0);
        assert_eq!(records[1].further_description, "incl. repowering");
    }

    #[test]
    fn minimal_columns_are_enough() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("costs.csv");
        fs::write(&path, "technology,parameter,value\nCCGT,efficiency,0.5\n").unwrap();
        let records = read_cost_records(&path).unwrap();
        assert_eq!(records[0].unit, "");
    }

    #[test]
    fn bad_value_is_reported_with_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("costs.csv");
        fs::write(&path, "technology,parameter,value\nCCGT,efficiency,high\n").unwrap();
        let err = read_cost_records(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("cost record 1"));
    }
}
