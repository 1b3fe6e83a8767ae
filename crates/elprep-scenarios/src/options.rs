//! Scenario option tokens.
//!
//! A run is parameterized by a dash-separated list of short codes
//! (`Co2L0.5-3h-ATK-solar+p3`) and a transmission token (`v1.25`, `copt`).
//! Both are parsed once, up front, into [`ScenarioOptions`] and
//! [`TransmissionLimit`]; the pipeline never looks at raw strings.

use elprep_core::{PrepError, PrepResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// An option that may be switched on with or without a numeric argument.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Switch {
    #[default]
    Off,
    On,
    Value(f64),
}

impl Switch {
    pub fn is_on(&self) -> bool {
        !matches!(self, Switch::Off)
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Switch::Value(v) => Some(*v),
            _ => None,
        }
    }
}

/// Attribute addressed by a carrier scaling token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaledAttribute {
    /// Capacity upper bound (`p`)
    Potential,
    /// `c`
    CapitalCost,
    /// `m`
    MarginalCost,
}

impl ScaledAttribute {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'p' => Some(ScaledAttribute::Potential),
            'c' => Some(ScaledAttribute::CapitalCost),
            'm' => Some(ScaledAttribute::MarginalCost),
            _ => None,
        }
    }

    pub fn code(&self) -> char {
        match self {
            ScaledAttribute::Potential => 'p',
            ScaledAttribute::CapitalCost => 'c',
            ScaledAttribute::MarginalCost => 'm',
        }
    }
}

/// `<carrier>+<code><factor>`, e.g. `offwind+p0.5`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierScaling {
    pub token: String,
    pub carrier: String,
    pub attribute: ScaledAttribute,
    pub factor: f64,
}

impl CarrierScaling {
    pub fn parse(token: &str) -> PrepResult<Self> {
        let unrecognized = |reason: &str| PrepError::UnrecognizedOption {
            token: token.to_string(),
            reason: reason.to_string(),
        };
        let mut parts = token.split('+');
        let carrier = parts.next().unwrap_or_default();
        let spec = parts.next().unwrap_or_default();
        if carrier.is_empty() {
            return Err(unrecognized("missing carrier before '+'"));
        }
        let mut chars = spec.chars();
        let code = chars
            .next()
            .ok_or_else(|| unrecognized("missing attribute code after '+'"))?;
        let attribute = ScaledAttribute::from_code(code)
            .ok_or_else(|| unrecognized("attribute code must be one of p, c, m"))?;
        let factor = chars
            .as_str()
            .parse::<f64>()
            .map_err(|_| unrecognized("scaling factor is not a number"))?;
        Ok(Self {
            token: token.to_string(),
            carrier: carrier.to_string(),
            attribute,
            factor,
        })
    }
}

/// Typed form of the `opts` wildcard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOptions {
    /// Averaging bucket from a `<n>h` token
    pub resolution_hours: Option<u32>,
    /// Segment count from a `<n>seg` token
    pub segments: Option<usize>,
    /// `Co2L[<x>]`; the value is a share of the CO2 base
    pub co2limit: Switch,
    /// `CH4L[<x>]`; the value is in million units
    pub gaslimit: Switch,
    /// `Ep[<x>]`; the value is the CO2 price
    pub emission_prices: Switch,
    /// `Ept`
    pub dynamic_emission_prices: bool,
    /// `ATK`
    pub autarky: bool,
    /// `ATKc`
    pub autarky_by_country: bool,
    pub scalings: Vec<CarrierScaling>,
    /// Tokens that matched nothing
    pub ignored: Vec<String>,
}

/// Parse the number at the end of a token (`Co2L0.05` gives 0.05).
pub fn trailing_number(token: &str) -> Option<f64> {
    let bytes = token.as_bytes();
    let mut start = bytes.len();
    while start > 0 && bytes[start - 1].is_ascii_digit() {
        start -= 1;
    }
    if start == bytes.len() {
        return None;
    }
    if start > 0 && bytes[start - 1] == b'.' {
        let mut int_start = start - 1;
        while int_start > 0 && bytes[int_start - 1].is_ascii_digit() {
            int_start -= 1;
        }
        start = int_start;
    }
    token[start..].parse().ok()
}

/// `<digits><suffix>` exactly, e.g. `24h` or `100seg`.
fn counted(token: &str, suffix: &str) -> Option<u64> {
    let digits = token.strip_suffix(suffix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn switch_for(token: &str) -> Switch {
    match trailing_number(token) {
        Some(value) => Switch::Value(value),
        None => Switch::On,
    }
}

impl ScenarioOptions {
    /// Parse a dash-separated token list. For every option the first matching
    /// token wins. Unknown tokens are kept in `ignored` and logged.
    pub fn parse(opts: &str) -> PrepResult<Self> {
        let mut parsed = ScenarioOptions::default();
        for token in opts.split('-').map(str::trim).filter(|t| !t.is_empty()) {
            if let Some(hours) = counted(token, "h") {
                let hours = u32::try_from(hours).map_err(|_| PrepError::UnrecognizedOption {
                    token: token.to_string(),
                    reason: "resolution is too large".into(),
                })?;
                if hours == 0 {
                    return Err(PrepError::UnrecognizedOption {
                        token: token.to_string(),
                        reason: "resolution must be at least one hour".into(),
                    });
                }
                parsed.resolution_hours.get_or_insert(hours);
            } else if let Some(segments) = counted(token, "seg") {
                parsed.segments.get_or_insert(segments as usize);
            } else if token.contains('+') {
                parsed.scalings.push(CarrierScaling::parse(token)?);
            } else if token.contains("Co2L") {
                if !parsed.co2limit.is_on() {
                    parsed.co2limit = switch_for(token);
                }
            } else if token.contains("CH4L") {
                if !parsed.gaslimit.is_on() {
                    parsed.gaslimit = switch_for(token);
                }
            } else if token == "Ept" {
                parsed.dynamic_emission_prices = true;
            } else if token.contains("Ep") {
                if !parsed.emission_prices.is_on() {
                    parsed.emission_prices = switch_for(token);
                }
            } else if token == "ATK" {
                parsed.autarky = true;
            } else if token == "ATKc" {
                parsed.autarky_by_country = true;
            } else {
                warn!(token, "ignoring unrecognized scenario option");
                parsed.ignored.push(token.to_string());
            }
        }
        Ok(parsed)
    }
}

/// What the transmission expansion limit is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKind {
    /// `c`: capacity times capital cost
    Cost,
    /// `v`: capacity times length
    Volume,
}

impl LimitKind {
    pub fn code(&self) -> char {
        match self {
            LimitKind::Cost => 'c',
            LimitKind::Volume => 'v',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitFactor {
    /// `opt`: expansion is left to the optimizer, no limit constraint
    Optimize,
    Value(f64),
}

/// Typed form of the `ll` wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransmissionLimit {
    pub kind: LimitKind,
    pub factor: LimitFactor,
}

impl TransmissionLimit {
    pub fn parse(ll: &str) -> PrepResult<Self> {
        let ll = ll.trim();
        let unrecognized = |reason: &str| PrepError::UnrecognizedOption {
            token: ll.to_string(),
            reason: reason.to_string(),
        };
        let mut chars = ll.chars();
        let kind = match chars.next() {
            Some('c') => LimitKind::Cost,
            Some('v') => LimitKind::Volume,
            _ => return Err(unrecognized("transmission limit must start with 'c' or 'v'")),
        };
        let factor = match chars.as_str() {
            "opt" => LimitFactor::Optimize,
            raw => LimitFactor::Value(
                raw.parse()
                    .map_err(|_| unrecognized("factor must be a number or 'opt'"))?,
            ),
        };
        Ok(Self { kind, factor })
    }

    /// Expansion is allowed for `opt` and for any factor above 1.
    pub fn allows_expansion(&self) -> bool {
        match self.factor {
            LimitFactor::Optimize => true,
            LimitFactor::Value(factor) => factor > 1.0,
        }
    }
}

impl Default for TransmissionLimit {
    fn default() -> Self {
        Self {
            kind: LimitKind::Volume,
            factor: LimitFactor::Value(1.0),
        }
    }
}
