//! # elprep-core: Network Model for Optimization Preparation
//!
//! Provides the data structures the preparation pipeline rewrites before an
//! energy-system model is handed to a linear-optimization solver.
//!
//! ## Design Philosophy
//!
//! A [`Network`] is a set of **strongly-typed tables**, one per component kind:
//! - **Static tables**: one row per entity keyed by unique name ([`Bus`], [`Line`],
//!   [`Link`], [`Generator`], [`StorageUnit`], [`Store`], [`Load`])
//! - **Time-varying tables**: per component kind, a map from attribute name to a
//!   snapshot × entity [`SeriesTable`]
//! - **Snapshots**: ordered time labels with one [`Weighting`] each
//! - **Global constraints**: scenario-level limits consumed by the optimizer
//!
//! Code that must touch every time-varying table (temporal aggregation,
//! validation) iterates [`ComponentKind::ALL`] through [`Network::series_map`]
//! instead of looking attributes up by string.
//!
//! ## Quick Start
//!
//! ```rust
//! use elprep_core::*;
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let mut network = Network::new();
//! let start = Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap();
//! let snapshots: Vec<_> = (0..24).map(|h| start + Duration::hours(h)).collect();
//! network.set_snapshots(snapshots, None).unwrap();
//!
//! network.buses.insert("DE0 0", Bus { country: "DE".into(), ..Bus::default() });
//! network.buses.insert("FR0 0", Bus { country: "FR".into(), ..Bus::default() });
//! network.lines.insert(
//!     "1",
//!     Line { bus0: "DE0 0".into(), bus1: "FR0 0".into(), s_nom: 1000.0, ..Line::default() },
//! );
//!
//! assert_eq!(network.snapshots.len(), 24);
//! assert_eq!(network.years_factor(), 24.0 / 8760.0);
//! ```
//!
//! ## Modules
//!
//! - [`components`] - Typed static tables and the [`Asset`] accessor trait
//! - [`series`] - Snapshot-indexed tables and weightings
//! - [`diagnostics`] - Invariant checks and reporting
//! - [`graph_utils`] - Topology summary (connected components) via petgraph

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

pub mod components;
pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod series;

pub use components::{
    Asset, Bus, Carrier, Component, ComponentKind, Generator, GlobalConstraint, Line, LineType,
    Link, Load, Sense, StorageUnit, Store, EMISSIONS_SUFFIX,
};
pub use diagnostics::{Category, DiagnosticIssue, Diagnostics, Severity};
pub use error::{PrepError, PrepResult};
pub use graph_utils::{topology_stats, TopologyStats};
pub use series::{SeriesTable, Timestamp, Weighting, HOURS_PER_YEAR};

/// The energy network being prepared for optimization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Network {
    pub name: String,
    /// Ordered time steps, strictly ascending
    pub snapshots: Vec<Timestamp>,
    /// One weighting per snapshot
    pub snapshot_weightings: Vec<Weighting>,
    pub buses: Component<Bus>,
    pub carriers: BTreeMap<String, Carrier>,
    pub line_types: BTreeMap<String, LineType>,
    pub lines: Component<Line>,
    pub links: Component<Link>,
    pub generators: Component<Generator>,
    pub storage_units: Component<StorageUnit>,
    pub stores: Component<Store>,
    pub loads: Component<Load>,
    pub global_constraints: BTreeMap<String, GlobalConstraint>,
    /// Run metadata attached by the pipeline before serialization
    pub meta: serde_json::Value,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot sequence. Without explicit weightings every
    /// snapshot gets weight 1.0. All time-varying tables are left as they are;
    /// callers that change resolution must rebuild them.
    pub fn set_snapshots(
        &mut self,
        snapshots: Vec<Timestamp>,
        weightings: Option<Vec<Weighting>>,
    ) -> PrepResult<()> {
        if snapshots.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(PrepError::Validation(
                "snapshots must be strictly ascending".into(),
            ));
        }
        let weightings = weightings.unwrap_or_else(|| vec![Weighting::default(); snapshots.len()]);
        if weightings.len() != snapshots.len() {
            return Err(PrepError::Validation(format!(
                "{} weightings given for {} snapshots",
                weightings.len(),
                snapshots.len()
            )));
        }
        if weightings.iter().any(|w| !w.is_non_negative()) {
            return Err(PrepError::Validation(
                "snapshot weightings must be non-negative".into(),
            ));
        }
        self.snapshots = snapshots;
        self.snapshot_weightings = weightings;
        Ok(())
    }

    /// Sum of the objective weightings (hours represented by the model).
    pub fn objective_weight_sum(&self) -> f64 {
        self.snapshot_weightings.iter().map(|w| w.objective).sum()
    }

    /// Modelled share of a year; scales annual limits to the modelled horizon.
    pub fn years_factor(&self) -> f64 {
        self.objective_weight_sum() / HOURS_PER_YEAR
    }

    /// Copy of all static data with no snapshots and no time-varying tables.
    pub fn copy_without_time(&self) -> Network {
        let mut copy = self.clone();
        copy.snapshots.clear();
        copy.snapshot_weightings.clear();
        for kind in ComponentKind::ALL {
            copy.series_map_mut(kind).clear();
        }
        copy
    }

    /// Time-varying tables of one component kind.
    pub fn series_map(&self, kind: ComponentKind) -> &BTreeMap<String, SeriesTable> {
        match kind {
            ComponentKind::Bus => &self.buses.series,
            ComponentKind::Line => &self.lines.series,
            ComponentKind::Link => &self.links.series,
            ComponentKind::Generator => &self.generators.series,
            ComponentKind::StorageUnit => &self.storage_units.series,
            ComponentKind::Store => &self.stores.series,
            ComponentKind::Load => &self.loads.series,
        }
    }

    pub fn series_map_mut(&mut self, kind: ComponentKind) -> &mut BTreeMap<String, SeriesTable> {
        match kind {
            ComponentKind::Bus => &mut self.buses.series,
            ComponentKind::Line => &mut self.lines.series,
            ComponentKind::Link => &mut self.links.series,
            ComponentKind::Generator => &mut self.generators.series,
            ComponentKind::StorageUnit => &mut self.storage_units.series,
            ComponentKind::Store => &mut self.stores.series,
            ComponentKind::Load => &mut self.loads.series,
        }
    }

    /// Every time-varying table in the network, tagged with its kind and attribute.
    pub fn series_tables(&self) -> impl Iterator<Item = (ComponentKind, &str, &SeriesTable)> + '_ {
        ComponentKind::ALL.into_iter().flat_map(move |kind| {
            self.series_map(kind)
                .iter()
                .map(move |(attr, table)| (kind, attr.as_str(), table))
        })
    }

    /// Entity names of one component kind.
    pub fn entity_names(&self, kind: ComponentKind) -> BTreeSet<&str> {
        fn names<T>(component: &Component<T>) -> BTreeSet<&str> {
            component.entities.keys().map(String::as_str).collect()
        }
        match kind {
            ComponentKind::Bus => names(&self.buses),
            ComponentKind::Line => names(&self.lines),
            ComponentKind::Link => names(&self.links),
            ComponentKind::Generator => names(&self.generators),
            ComponentKind::StorageUnit => names(&self.storage_units),
            ComponentKind::Store => names(&self.stores),
            ComponentKind::Load => names(&self.loads),
        }
    }

    /// Remove entities of one kind together with their time series.
    pub fn remove(&mut self, kind: ComponentKind, names: &[String]) -> usize {
        match kind {
            ComponentKind::Bus => self.buses.remove(names),
            ComponentKind::Line => self.lines.remove(names),
            ComponentKind::Link => self.links.remove(names),
            ComponentKind::Generator => self.generators.remove(names),
            ComponentKind::StorageUnit => self.storage_units.remove(names),
            ComponentKind::Store => self.stores.remove(names),
            ComponentKind::Load => self.loads.remove(names),
        }
    }

    /// Register a global constraint; names are unique.
    pub fn add_global_constraint(
        &mut self,
        name: impl Into<String>,
        constraint: GlobalConstraint,
    ) -> PrepResult<()> {
        let name = name.into();
        if self.global_constraints.contains_key(&name) {
            return Err(PrepError::Validation(format!(
                "global constraint '{}' already exists",
                name
            )));
        }
        self.global_constraints.insert(name, constraint);
        Ok(())
    }

    /// Country of a bus, if the bus exists.
    pub fn bus_country(&self, bus: &str) -> Option<&str> {
        self.buses.get(bus).map(|b| b.country.as_str())
    }

    /// Compute basic statistics about the network
    pub fn stats(&self) -> NetworkStats {
        NetworkStats {
            num_snapshots: self.snapshots.len(),
            total_objective_weight: self.objective_weight_sum(),
            num_buses: self.buses.len(),
            num_lines: self.lines.len(),
            num_links: self.links.len(),
            num_generators: self.generators.len(),
            num_storage_units: self.storage_units.len(),
            num_stores: self.stores.len(),
            num_loads: self.loads.len(),
            num_series_tables: self.series_tables().count(),
            num_global_constraints: self.global_constraints.len(),
        }
    }

    /// Check the data-model invariants and record violations.
    pub fn validate_into(&self, diag: &mut Diagnostics) {
        if self.snapshots.is_empty() {
            diag.warn(Category::Snapshots, "network has no snapshots");
        }
        if self.snapshot_weightings.len() != self.snapshots.len() {
            diag.error(
                Category::Snapshots,
                format!(
                    "{} weightings for {} snapshots",
                    self.snapshot_weightings.len(),
                    self.snapshots.len()
                ),
            );
        }
        if self.snapshots.windows(2).any(|pair| pair[0] >= pair[1]) {
            diag.error(Category::Snapshots, "snapshots are not strictly ascending");
        }
        if self.snapshot_weightings.iter().any(|w| !w.is_non_negative()) {
            diag.error(Category::Snapshots, "negative snapshot weighting");
        }

        let snapshots: BTreeSet<&Timestamp> = self.snapshots.iter().collect();
        for (kind, attr, table) in self.series_tables() {
            let entity = format!("{}.{}", kind.list_name(), attr);
            if table.index().iter().any(|ts| !snapshots.contains(ts)) {
                diag.error_on(
                    Category::Series,
                    entity.as_str(),
                    "row index contains labels that are not snapshots",
                );
            }
            let known = self.entity_names(kind);
            for column in table.column_names().filter(|c| !known.contains(*c)) {
                diag.warn_on(
                    Category::Series,
                    entity.as_str(),
                    format!("column '{}' has no static entity", column),
                );
            }
        }

        for (name, line) in self.lines.iter() {
            self.check_bus_refs(diag, ComponentKind::Line, name, &[&line.bus0, &line.bus1]);
            if !line.line_type.is_empty() && !self.line_types.contains_key(&line.line_type) {
                diag.error_on(
                    Category::Reference,
                    format!("lines.{}", name),
                    format!("unknown line type '{}'", line.line_type),
                );
            }
        }
        for (name, link) in self.links.iter() {
            self.check_bus_refs(diag, ComponentKind::Link, name, &[&link.bus0, &link.bus1]);
        }
        for (name, gen) in self.generators.iter() {
            self.check_bus_refs(diag, ComponentKind::Generator, name, &[&gen.bus]);
            if !gen.carrier.is_empty() && !self.carriers.contains_key(&gen.carrier) {
                diag.warn_on(
                    Category::Reference,
                    format!("generators.{}", name),
                    format!("carrier '{}' is not defined", gen.carrier),
                );
            }
            if gen.efficiency <= 0.0 {
                diag.error_on(
                    Category::Physical,
                    format!("generators.{}", name),
                    "efficiency must be positive",
                );
            }
        }
        for (name, su) in self.storage_units.iter() {
            self.check_bus_refs(diag, ComponentKind::StorageUnit, name, &[&su.bus]);
        }
        for (name, store) in self.stores.iter() {
            self.check_bus_refs(diag, ComponentKind::Store, name, &[&store.bus]);
        }
        for (name, load) in self.loads.iter() {
            self.check_bus_refs(diag, ComponentKind::Load, name, &[&load.bus]);
        }
    }

    fn check_bus_refs(
        &self,
        diag: &mut Diagnostics,
        kind: ComponentKind,
        name: &str,
        buses: &[&String],
    ) {
        for bus in buses.iter().filter(|bus| !self.buses.contains(bus.as_str())) {
            diag.error_on(
                Category::Reference,
                format!("{}.{}", kind.list_name(), name),
                format!("unknown bus '{}'", bus),
            );
        }
    }
}

/// Statistics about a network's size and temporal resolution
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkStats {
    pub num_snapshots: usize,
    pub total_objective_weight: f64,
    pub num_buses: usize,
    pub num_lines: usize,
    pub num_links: usize,
    pub num_generators: usize,
    pub num_storage_units: usize,
    pub num_stores: usize,
    pub num_loads: usize,
    pub num_series_tables: usize,
    pub num_global_constraints: usize,
}

impl std::fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} snapshots ({:.0} h), {} buses, {} lines, {} links, {} generators, {} storage units, {} stores, {} loads, {} global constraints",
            self.num_snapshots,
            self.total_objective_weight,
            self.num_buses,
            self.num_lines,
            self.num_links,
            self.num_generators,
            self.num_storage_units,
            self.num_stores,
            self.num_loads,
            self.num_global_constraints
        )
    }
}
