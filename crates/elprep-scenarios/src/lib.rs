//! Network preparation pipeline: option grammar, run configuration, cost
//! processing and the transforms applied by [`prepare_network`].

pub mod apply;
pub mod autarky;
pub mod config;
pub mod constraints;
pub mod costs;
pub mod options;
pub mod plan;
pub mod scaling;
pub mod transmission;

pub use apply::{build_meta, prepare_network, PrepareContext};
pub use autarky::enforce_autarky;
pub use config::{load_config_from_path, PrepareConfig};
pub use constraints::{
    add_co2limit, add_dynamic_emission_prices, add_emission_prices, add_gaslimit, align_prices,
};
pub use costs::{annuity, CostTable};
pub use options::{
    CarrierScaling, LimitFactor, LimitKind, ScaledAttribute, ScenarioOptions, Switch,
    TransmissionLimit,
};
pub use plan::{EmissionPricing, PreparePlan, TemporalReduction, Wildcards};
pub use scaling::apply_carrier_scaling;
pub use transmission::{
    line_capacity, set_line_nom_max, set_line_s_max_pu, set_transmission_limit,
    update_transmission_costs, NomMaxLimits,
};
