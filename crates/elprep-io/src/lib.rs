//! File formats around the preparation pipeline.
//!
//! - [`network`]: network model JSON load/save
//! - [`costs`]: technology cost assumptions CSV
//! - [`prices`]: time-indexed price series CSV
//! - [`structured`]: YAML/JSON documents such as the run configuration

pub mod costs;
pub mod network;
pub mod prices;
pub mod structured;

pub use costs::{read_cost_records, CostRecord};
pub use network::{load_network, save_network};
pub use prices::{parse_timestamp, read_price_series, PriceSeries};
pub use structured::{read_structured, StructuredFormat};
