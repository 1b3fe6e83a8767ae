//! Typed static tables, one struct per component kind.
//!
//! Attribute names follow the conventions of linear-optimization energy models
//! (`p_nom`, `s_nom_max`, `marginal_cost`, ...) so serialized networks stay
//! recognizable to the downstream solver tooling.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::series::SeriesTable;

/// Upper bounds may be unbounded; JSON has no infinity, so `null` stands in for it.
pub mod unbounded {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

fn infinite() -> f64 {
    f64::INFINITY
}

fn one() -> f64 {
    1.0
}

fn ac() -> String {
    "AC".to_string()
}

/// The component kinds that carry static and time-varying tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Bus,
    Line,
    Link,
    Generator,
    StorageUnit,
    Store,
    Load,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 7] = [
        ComponentKind::Bus,
        ComponentKind::Line,
        ComponentKind::Link,
        ComponentKind::Generator,
        ComponentKind::StorageUnit,
        ComponentKind::Store,
        ComponentKind::Load,
    ];

    /// Plural table name, e.g. `storage_units`.
    pub fn list_name(&self) -> &'static str {
        match self {
            ComponentKind::Bus => "buses",
            ComponentKind::Line => "lines",
            ComponentKind::Link => "links",
            ComponentKind::Generator => "generators",
            ComponentKind::StorageUnit => "storage_units",
            ComponentKind::Store => "stores",
            ComponentKind::Load => "loads",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ComponentKind::Bus => "Bus",
            ComponentKind::Line => "Line",
            ComponentKind::Link => "Link",
            ComponentKind::Generator => "Generator",
            ComponentKind::StorageUnit => "StorageUnit",
            ComponentKind::Store => "Store",
            ComponentKind::Load => "Load",
        };
        f.write_str(name)
    }
}

/// Static entity table plus its time-varying tables keyed by attribute name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component<T> {
    #[serde(default = "BTreeMap::new")]
    pub entities: BTreeMap<String, T>,
    #[serde(default)]
    pub series: BTreeMap<String, SeriesTable>,
}

impl<T> Default for Component<T> {
    fn default() -> Self {
        Self {
            entities: BTreeMap::new(),
            series: BTreeMap::new(),
        }
    }
}

impl<T> Component<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn insert(&mut self, name: impl Into<String>, entity: T) {
        self.entities.insert(name.into(), entity);
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entities.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.entities.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entities.iter().map(|(name, entity)| (name.as_str(), entity))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut T)> {
        self.entities
            .iter_mut()
            .map(|(name, entity)| (name.as_str(), entity))
    }

    /// Time-varying table for one attribute.
    pub fn series(&self, attr: &str) -> Option<&SeriesTable> {
        self.series.get(attr)
    }

    pub fn series_mut(&mut self, attr: &str) -> Option<&mut SeriesTable> {
        self.series.get_mut(attr)
    }

    pub fn set_series(&mut self, attr: impl Into<String>, table: SeriesTable) {
        self.series.insert(attr.into(), table);
    }

    /// Names of entities matching a predicate.
    pub fn select(&self, mut predicate: impl FnMut(&T) -> bool) -> Vec<String> {
        self.entities
            .iter()
            .filter(|(_, entity)| predicate(entity))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Remove entities and their columns from every time-varying table.
    /// Returns the number of entities actually removed.
    pub fn remove(&mut self, names: &[String]) -> usize {
        let mut removed = 0;
        for name in names {
            if self.entities.remove(name).is_some() {
                removed += 1;
            }
        }
        for table in self.series.values_mut() {
            table.retain_columns(|column, _| !names.iter().any(|n| n == column));
        }
        removed
    }
}

/// Access to the attributes that carrier-targeted scaling may touch.
pub trait Asset {
    const KIND: ComponentKind;

    fn carrier(&self) -> &str;

    fn capital_cost_mut(&mut self) -> &mut f64;

    /// `None` for components without an operating cost (lines).
    fn marginal_cost_mut(&mut self) -> Option<&mut f64>;

    /// Maximum installable capacity (`p_nom_max`, `s_nom_max` or `e_nom_max`).
    fn potential_mut(&mut self) -> &mut f64;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    /// Nominal voltage (kV)
    pub v_nom: f64,
    #[serde(default)]
    pub country: String,
    #[serde(default = "ac")]
    pub carrier: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl Default for Bus {
    fn default() -> Self {
        Self {
            v_nom: 380.0,
            country: String::new(),
            carrier: ac(),
            x: 0.0,
            y: 0.0,
        }
    }
}

/// Standard conductor type referenced by [`Line::line_type`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineType {
    /// Rated current per circuit (kA)
    pub i_nom: f64,
    #[serde(default)]
    pub f_nom: f64,
    #[serde(default)]
    pub r_per_length: f64,
    #[serde(default)]
    pub x_per_length: f64,
    #[serde(default)]
    pub c_per_length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub bus0: String,
    pub bus1: String,
    /// Standard type name; empty when `s_nom` is given directly.
    #[serde(rename = "type", default)]
    pub line_type: String,
    #[serde(default = "one")]
    pub num_parallel: f64,
    /// Length (km)
    #[serde(default)]
    pub length: f64,
    /// Nominal apparent power capacity (MVA)
    #[serde(default)]
    pub s_nom: f64,
    #[serde(default)]
    pub s_nom_min: f64,
    #[serde(with = "unbounded", default = "infinite")]
    pub s_nom_max: f64,
    #[serde(default)]
    pub s_nom_extendable: bool,
    /// Per-unit loading limit; below 1.0 reserves N-1 headroom.
    #[serde(default = "one")]
    pub s_max_pu: f64,
    #[serde(default)]
    pub capital_cost: f64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub r: f64,
}

impl Default for Line {
    fn default() -> Self {
        Self {
            bus0: String::new(),
            bus1: String::new(),
            line_type: String::new(),
            num_parallel: 1.0,
            length: 0.0,
            s_nom: 0.0,
            s_nom_min: 0.0,
            s_nom_max: f64::INFINITY,
            s_nom_extendable: false,
            s_max_pu: 1.0,
            capital_cost: 0.0,
            x: 0.0,
            r: 0.0,
        }
    }
}

impl Asset for Line {
    const KIND: ComponentKind = ComponentKind::Line;

    fn carrier(&self) -> &str {
        "AC"
    }

    fn capital_cost_mut(&mut self) -> &mut f64 {
        &mut self.capital_cost
    }

    fn marginal_cost_mut(&mut self) -> Option<&mut f64> {
        None
    }

    fn potential_mut(&mut self) -> &mut f64 {
        &mut self.s_nom_max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub bus0: String,
    pub bus1: String,
    #[serde(default)]
    pub carrier: String,
    /// Nominal power capacity (MW)
    #[serde(default)]
    pub p_nom: f64,
    #[serde(default)]
    pub p_nom_min: f64,
    #[serde(with = "unbounded", default = "infinite")]
    pub p_nom_max: f64,
    #[serde(default)]
    pub p_nom_extendable: bool,
    #[serde(default)]
    pub length: f64,
    /// Share of the route laid as submarine cable
    #[serde(default)]
    pub underwater_fraction: f64,
    #[serde(default = "one")]
    pub efficiency: f64,
    #[serde(default)]
    pub capital_cost: f64,
    #[serde(default)]
    pub marginal_cost: f64,
}

impl Default for Link {
    fn default() -> Self {
        Self {
            bus0: String::new(),
            bus1: String::new(),
            carrier: String::new(),
            p_nom: 0.0,
            p_nom_min: 0.0,
            p_nom_max: f64::INFINITY,
            p_nom_extendable: false,
            length: 0.0,
            underwater_fraction: 0.0,
            efficiency: 1.0,
            capital_cost: 0.0,
            marginal_cost: 0.0,
        }
    }
}

impl Link {
    pub fn is_dc(&self) -> bool {
        self.carrier == "DC"
    }
}

impl Asset for Link {
    const KIND: ComponentKind = ComponentKind::Link;

    fn carrier(&self) -> &str {
        &self.carrier
    }

    fn capital_cost_mut(&mut self) -> &mut f64 {
        &mut self.capital_cost
    }

    fn marginal_cost_mut(&mut self) -> Option<&mut f64> {
        Some(&mut self.marginal_cost)
    }

    fn potential_mut(&mut self) -> &mut f64 {
        &mut self.p_nom_max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub bus: String,
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub p_nom: f64,
    #[serde(default)]
    pub p_nom_min: f64,
    #[serde(with = "unbounded", default = "infinite")]
    pub p_nom_max: f64,
    #[serde(default)]
    pub p_nom_extendable: bool,
    #[serde(default = "one")]
    pub efficiency: f64,
    #[serde(default)]
    pub marginal_cost: f64,
    #[serde(default)]
    pub capital_cost: f64,
}

impl Default for Generator {
    fn default() -> Self {
        Self {
            bus: String::new(),
            carrier: String::new(),
            p_nom: 0.0,
            p_nom_min: 0.0,
            p_nom_max: f64::INFINITY,
            p_nom_extendable: false,
            efficiency: 1.0,
            marginal_cost: 0.0,
            capital_cost: 0.0,
        }
    }
}

impl Asset for Generator {
    const KIND: ComponentKind = ComponentKind::Generator;

    fn carrier(&self) -> &str {
        &self.carrier
    }

    fn capital_cost_mut(&mut self) -> &mut f64 {
        &mut self.capital_cost
    }

    fn marginal_cost_mut(&mut self) -> Option<&mut f64> {
        Some(&mut self.marginal_cost)
    }

    fn potential_mut(&mut self) -> &mut f64 {
        &mut self.p_nom_max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageUnit {
    pub bus: String,
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub p_nom: f64,
    #[serde(with = "unbounded", default = "infinite")]
    pub p_nom_max: f64,
    #[serde(default)]
    pub p_nom_extendable: bool,
    #[serde(default = "one")]
    pub efficiency_store: f64,
    #[serde(default = "one")]
    pub efficiency_dispatch: f64,
    /// Energy-to-power ratio (h)
    #[serde(default = "one")]
    pub max_hours: f64,
    #[serde(default)]
    pub marginal_cost: f64,
    #[serde(default)]
    pub capital_cost: f64,
}

impl Default for StorageUnit {
    fn default() -> Self {
        Self {
            bus: String::new(),
            carrier: String::new(),
            p_nom: 0.0,
            p_nom_max: f64::INFINITY,
            p_nom_extendable: false,
            efficiency_store: 1.0,
            efficiency_dispatch: 1.0,
            max_hours: 1.0,
            marginal_cost: 0.0,
            capital_cost: 0.0,
        }
    }
}

impl Asset for StorageUnit {
    const KIND: ComponentKind = ComponentKind::StorageUnit;

    fn carrier(&self) -> &str {
        &self.carrier
    }

    fn capital_cost_mut(&mut self) -> &mut f64 {
        &mut self.capital_cost
    }

    fn marginal_cost_mut(&mut self) -> Option<&mut f64> {
        Some(&mut self.marginal_cost)
    }

    fn potential_mut(&mut self) -> &mut f64 {
        &mut self.p_nom_max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub bus: String,
    #[serde(default)]
    pub carrier: String,
    /// Nominal energy capacity (MWh)
    #[serde(default)]
    pub e_nom: f64,
    #[serde(with = "unbounded", default = "infinite")]
    pub e_nom_max: f64,
    #[serde(default)]
    pub e_nom_extendable: bool,
    #[serde(default)]
    pub marginal_cost: f64,
    #[serde(default)]
    pub capital_cost: f64,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            bus: String::new(),
            carrier: String::new(),
            e_nom: 0.0,
            e_nom_max: f64::INFINITY,
            e_nom_extendable: false,
            marginal_cost: 0.0,
            capital_cost: 0.0,
        }
    }
}

impl Asset for Store {
    const KIND: ComponentKind = ComponentKind::Store;

    fn carrier(&self) -> &str {
        &self.carrier
    }

    fn capital_cost_mut(&mut self) -> &mut f64 {
        &mut self.capital_cost
    }

    fn marginal_cost_mut(&mut self) -> Option<&mut f64> {
        Some(&mut self.marginal_cost)
    }

    fn potential_mut(&mut self) -> &mut f64 {
        &mut self.e_nom_max
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Load {
    pub bus: String,
    #[serde(default)]
    pub carrier: String,
    /// Static demand (MW), used when no `p_set` series exists
    #[serde(default)]
    pub p_set: f64,
}

/// Energy carrier with numeric attributes such as `co2_emissions` (t/MWh_th)
/// or `gas_usage`. Missing attributes read as 0.0.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Carrier {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub nice_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub color: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, f64>,
}

/// Suffix shared by emission-intensity attributes (`co2_emissions`, `ch4_emissions`, ...).
pub const EMISSIONS_SUFFIX: &str = "_emissions";

impl Carrier {
    pub fn with_attribute(mut self, name: impl Into<String>, value: f64) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn attribute(&self, name: &str) -> f64 {
        self.attributes.get(name).copied().unwrap_or(0.0)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: f64) {
        self.attributes.insert(name.into(), value);
    }

    /// Emission intensities keyed by emission kind (`co2`, `ch4`, ...).
    pub fn emission_intensities(&self) -> impl Iterator<Item = (&str, f64)> {
        self.attributes.iter().filter_map(|(name, value)| {
            name.strip_suffix(EMISSIONS_SUFFIX)
                .map(|kind| (kind, *value))
        })
    }
}

/// Comparison sense of a global constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    #[serde(rename = "<=")]
    LessEqual,
    #[serde(rename = ">=")]
    GreaterEqual,
    #[serde(rename = "==")]
    Equal,
}

impl std::fmt::Display for Sense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Sense::LessEqual => "<=",
            Sense::GreaterEqual => ">=",
            Sense::Equal => "==",
        };
        f.write_str(symbol)
    }
}

/// Scenario-level linear constraint evaluated by the optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalConstraint {
    /// Constraint type, e.g. `primary_energy` or `transmission_volume_expansion_limit`
    #[serde(rename = "type", default = "primary_energy")]
    pub kind: String,
    /// Carrier attribute (or carrier list for transmission limits) the constraint selects
    pub carrier_attribute: String,
    pub sense: Sense,
    pub constant: f64,
}

fn primary_energy() -> String {
    "primary_energy".to_string()
}

impl GlobalConstraint {
    /// Upper bound on a carrier attribute summed over primary energy use.
    pub fn primary_energy(carrier_attribute: impl Into<String>, constant: f64) -> Self {
        Self {
            kind: primary_energy(),
            carrier_attribute: carrier_attribute.into(),
            sense: Sense::LessEqual,
            constant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn unbounded_round_trips_through_null() {
        let line = Line::default();
        let json = serde_json::to_value(&line).unwrap();
        assert!(json["s_nom_max"].is_null());
        let back: Line = serde_json::from_value(json).unwrap();
        assert!(back.s_nom_max.is_infinite());
    }

    #[test]
    fn missing_bounds_default_to_unbounded() {
        let gen: Generator = serde_json::from_str(r#"{"bus":"DE0 0","carrier":"solar"}"#).unwrap();
        assert!(gen.p_nom_max.is_infinite());
        assert_eq!(gen.efficiency, 1.0);
    }

    #[test]
    fn carrier_attributes_flatten() {
        let carrier: Carrier =
            serde_json::from_str(r#"{"nice_name":"Open-Cycle Gas","co2_emissions":0.187}"#)
                .unwrap();
        assert_eq!(carrier.attribute("co2_emissions"), 0.187);
        assert_eq!(carrier.attribute("gas_usage"), 0.0);
        let kinds: Vec<_> = carrier.emission_intensities().collect();
        assert_eq!(kinds, vec![("co2", 0.187)]);
    }

    #[test]
    fn removing_entities_drops_their_series_columns() {
        let mut links: Component<Link> = Component::new();
        links.insert("DC 1", Link::default());
        links.insert("DC 2", Link::default());
        let index = vec![Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap()];
        let mut table = SeriesTable::new(index);
        table.insert_column("DC 1", vec![1.0]).unwrap();
        table.insert_column("DC 2", vec![1.0]).unwrap();
        links.set_series("p_max_pu", table);

        let removed = links.remove(&["DC 1".to_string(), "missing".to_string()]);
        assert_eq!(removed, 1);
        assert!(!links.contains("DC 1"));
        let table = links.series("p_max_pu").unwrap();
        assert!(!table.has_column("DC 1"));
        assert!(table.has_column("DC 2"));
    }

    #[test]
    fn sense_serializes_as_symbol() {
        let gc = GlobalConstraint::primary_energy("co2_emissions", 1.0);
        let json = serde_json::to_value(&gc).unwrap();
        assert_eq!(json["sense"], "<=");
        assert_eq!(json["type"], "primary_energy");
    }
}
