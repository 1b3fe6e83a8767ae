//! Error type shared by the preparation crates.
//!
//! Transforms return [`PrepResult`] and either succeed completely or fail
//! before the network is left half-rewritten. File-level context is added by
//! the I/O and CLI layers, which use `anyhow`.
//!
//! ```ignore
//! use elprep_core::PrepResult;
//!
//! fn prepare(network: &mut Network) -> PrepResult<()> {
//!     add_co2limit(network, 1.0e8, 1.0)?;
//!     enforce_autarky(network, true);
//!     Ok(())
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrepError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON or timestamps
    #[error("parse error: {0}")]
    Parse(String),

    /// Model data violating an invariant: missing cost rows, series shape
    /// mismatches, duplicate constraint names
    #[error("invalid network data: {0}")]
    Validation(String),

    /// Contradictory or out-of-range settings
    #[error("configuration error: {0}")]
    Config(String),

    /// An option token that has a known shape but cannot be interpreted
    #[error("unrecognized option token '{token}': {reason}")]
    UnrecognizedOption { token: String, reason: String },

    /// A feature that is recognized but not compiled in
    #[error("capability unavailable: {capability}; {hint}")]
    CapabilityUnavailable { capability: String, hint: String },

    #[error("{0}")]
    Other(String),
}

impl PrepError {
    pub fn is_capability_unavailable(&self) -> bool {
        matches!(self, PrepError::CapabilityUnavailable { .. })
    }
}

pub type PrepResult<T> = Result<T, PrepError>;

impl From<serde_json::Error> for PrepError {
    fn from(err: serde_json::Error) -> Self {
        PrepError::Parse(err.to_string())
    }
}

impl From<anyhow::Error> for PrepError {
    fn from(err: anyhow::Error) -> Self {
        PrepError::Other(format!("{:#}", err))
    }
}

impl From<String> for PrepError {
    fn from(message: String) -> Self {
        PrepError::Other(message)
    }
}

impl From<&str> for PrepError {
    fn from(message: &str) -> Self {
        PrepError::Other(message.to_string())
    }
}
