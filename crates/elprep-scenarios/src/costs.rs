//! Technology cost table: raw assumptions turned into annualized capital
//! costs and marginal costs per technology.

use std::collections::BTreeMap;

use elprep_core::{PrepError, PrepResult};
use elprep_io::CostRecord;
use tracing::debug;

use crate::config::CostsConfig;

/// Annuity factor for a lifetime of `n` years at discount rate `r`.
pub fn annuity(n: f64, r: f64) -> f64 {
    if r > 0.0 {
        r / (1.0 - 1.0 / (1.0 + r).powf(n))
    } else {
        1.0 / n
    }
}

/// Technology × parameter table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostTable {
    rows: BTreeMap<String, BTreeMap<String, f64>>,
}

impl CostTable {
    /// Pivot raw records and derive `capital_cost`, `marginal_cost` and
    /// `co2_emissions` for every technology.
    ///
    /// Values quoted per kW are converted to per MW. `years_factor` scales the
    /// annualized capital cost to the modelled horizon. `max_hours` sizes the
    /// composite battery and hydrogen storage technologies.
    pub fn from_records(
        records: &[CostRecord],
        config: &CostsConfig,
        max_hours: &BTreeMap<String, f64>,
        years_factor: f64,
    ) -> PrepResult<Self> {
        let mut raw: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        for record in records {
            let value = if record.unit.contains("/kW") {
                record.value * 1e3
            } else {
                record.value
            };
            raw.entry(record.technology.clone())
                .or_default()
                .entry(record.parameter.clone())
                .or_insert(value);
        }

        let mut table = CostTable::default();
        for (tech, params) in raw {
            let param = |name: &str| -> PrepResult<f64> {
                params
                    .get(name)
                    .or_else(|| config.fill_values.get(name))
                    .copied()
                    .ok_or_else(|| {
                        PrepError::Validation(format!(
                            "technology '{}' has no '{}' and no fill value is configured",
                            tech, name
                        ))
                    })
            };
            let capital_cost = (annuity(param("lifetime")?, param("discount rate")?)
                + param("FOM")? / 100.0)
                * param("investment")?
                * years_factor;
            let mut row = params.clone();
            row.insert("capital_cost".into(), capital_cost);
            row.insert("co2_emissions".into(), param("CO2 intensity")?);
            row.insert("efficiency".into(), param("efficiency")?);
            row.insert("VOM".into(), param("VOM")?);
            row.insert("fuel".into(), param("fuel")?);
            table.rows.insert(tech, row);
        }

        // Gas turbines burn the generic gas fuel.
        let gas = table.get("gas", "fuel").zip(table.get("gas", "co2_emissions"));
        if let Some((fuel, co2)) = gas {
            for tech in ["OCGT", "CCGT"] {
                if let Some(row) = table.rows.get_mut(tech) {
                    row.insert("fuel".into(), fuel);
                    row.insert("co2_emissions".into(), co2);
                }
            }
        }
        for row in table.rows.values_mut() {
            let marginal = row["VOM"] + row["fuel"] / row["efficiency"];
            row.insert("marginal_cost".into(), marginal);
        }

        if let (Some(rooftop), Some(utility)) = (
            table.get("solar-rooftop", "capital_cost"),
            table.get("solar-utility", "capital_cost"),
        ) {
            table.set("solar", "capital_cost", 0.5 * (rooftop + utility));
        }
        if let Some(hours) = max_hours.get("battery") {
            table.add_storage("battery", "battery storage", &["battery inverter"], *hours);
        }
        if let Some(hours) = max_hours.get("H2") {
            table.add_storage(
                "H2",
                "hydrogen storage underground",
                &["fuel cell", "electrolysis"],
                *hours,
            );
        }

        for (tech, value) in &config.marginal_cost {
            table.set(tech, "marginal_cost", *value);
        }
        for (tech, value) in &config.capital_cost {
            table.set(tech, "capital_cost", *value);
        }
        debug!(technologies = table.rows.len(), "processed cost assumptions");
        Ok(table)
    }

    /// Composite storage: converters plus `max_hours` of energy capacity.
    fn add_storage(&mut self, name: &str, store: &str, converters: &[&str], max_hours: f64) {
        let Some(store_cost) = self.get(store, "capital_cost") else {
            return;
        };
        let converter_costs: Option<Vec<f64>> = converters
            .iter()
            .map(|tech| self.get(tech, "capital_cost"))
            .collect();
        let Some(converter_costs) = converter_costs else {
            return;
        };
        let row = self.rows.entry(name.to_string()).or_default();
        row.insert(
            "capital_cost".into(),
            converter_costs.iter().sum::<f64>() + max_hours * store_cost,
        );
        row.insert("marginal_cost".into(), 0.0);
        row.insert("co2_emissions".into(), 0.0);
        row.insert("max_hours".into(), max_hours);
    }

    pub fn get(&self, technology: &str, parameter: &str) -> Option<f64> {
        self.rows.get(technology)?.get(parameter).copied()
    }

    /// Like [`CostTable::get`], but a missing entry is an error.
    pub fn require(&self, technology: &str, parameter: &str) -> PrepResult<f64> {
        self.get(technology, parameter).ok_or_else(|| {
            PrepError::Validation(format!(
                "cost table has no '{}' for technology '{}'",
                parameter, technology
            ))
        })
    }

    pub fn set(&mut self, technology: &str, parameter: &str, value: f64) {
        self.rows
            .entry(technology.to_string())
            .or_default()
            .insert(parameter.to_string(), value);
    }

    pub fn technologies(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(tech: &str, param: &str, value: f64, unit: &str) -> CostRecord {
        CostRecord {
            technology: tech.into(),
            parameter: param.into(),
            value,
            unit: unit.into(),
            source: String::new(),
            further_description: String::new(),
        }
    }

    #[test]
    fn annuity_with_and_without_discounting() {
        assert!((annuity(20.0, 0.0) - 0.05).abs() < 1e-9);
        assert!((annuity(1.0, 0.07) - 1.07).abs() < 1e-12);
        assert!(annuity(25.0, 0.07) > 1.0 / 25.0);
    }

    #[test]
    fn capital_cost_is_annualized_and_scaled() {
        let records = vec![
            record("onwind", "investment", 1000.0, "EUR/kW"),
            record("onwind", "lifetime", 20.0, "years"),
            record("onwind", "discount rate", 0.0, "per unit"),
            record("onwind", "FOM", 2.0, "%/year"),
        ];
        let table =
            CostTable::from_records(&records, &CostsConfig::default(), &BTreeMap::new(), 0.5)
                .unwrap();
        // (1/20 + 0.02) * 1e6 * 0.5
        assert!((table.get("onwind", "capital_cost").unwrap() - 35_000.0).abs() < 1e-6);
        assert_eq!(table.get("onwind", "marginal_cost"), Some(0.0));
    }

    #[test]
    fn gas_turbines_inherit_gas_fuel() {
        let records = vec![
            record("gas", "fuel", 20.0, "EUR/MWh_th"),
            record("gas", "CO2 intensity", 0.2, "tCO2/MWh_th"),
            record("OCGT", "efficiency", 0.4, "per unit"),
            record("OCGT", "VOM", 4.0, "EUR/MWh"),
        ];
        let table =
            CostTable::from_records(&records, &CostsConfig::default(), &BTreeMap::new(), 1.0)
                .unwrap();
        assert!((table.get("OCGT", "marginal_cost").unwrap() - (4.0 + 20.0 / 0.4)).abs() < 1e-9);
        assert!((table.get("OCGT", "co2_emissions").unwrap() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn storage_and_overrides() {
        let mut config = CostsConfig::default();
        config.fill_values.insert("discount rate".into(), 0.0);
        config.fill_values.insert("lifetime".into(), 10.0);
        config.capital_cost.insert("onwind".into(), 1.0);
        let records = vec![
            record("battery storage", "investment", 100.0, "EUR/MWh"),
            record("battery inverter", "investment", 200.0, "EUR/MW"),
            record("onwind", "investment", 5.0, "EUR/MW"),
        ];
        let max_hours = BTreeMap::from([("battery".to_string(), 6.0)]);
        let table = CostTable::from_records(&records, &config, &max_hours, 1.0).unwrap();
        assert!((table.get("battery", "capital_cost").unwrap() - (20.0 + 6.0 * 10.0)).abs() < 1e-9);
        assert_eq!(table.get("onwind", "capital_cost"), Some(1.0));
        assert!(table.get("H2", "capital_cost").is_none());
    }

    #[test]
    fn missing_parameter_without_fill_value() {
        let mut config = CostsConfig::default();
        config.fill_values.clear();
        let records = vec![record("onwind", "investment", 1.0, "EUR/MW")];
        let err =
            CostTable::from_records(&records, &config, &BTreeMap::new(), 1.0).unwrap_err();
        assert!(matches!(err, PrepError::Validation(_)));
    }

    #[test]
    fn require_reports_missing_technology() {
        let table = CostTable::default();
        assert!(table.require("HVAC overhead", "capital_cost").is_err());
    }
}
