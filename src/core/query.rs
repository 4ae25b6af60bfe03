//! Query parameter parsing for data and anomaly requests.
//!
//! Raw parameters arrive as strings. Empty or missing values fall back to the
//! defaults; anything else must parse and validate or the request is rejected.

use crate::core::downsample::Density;
use crate::core::error::{EngineError, EngineResult};
use crate::core::range::{EndBound, TimeRange, DEFAULT_LIMIT};
use crate::core::sample::parse_timestamp;
use std::collections::HashMap;

/// Service-wide parsing options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub end_bound: EndBound,
    /// Cap used when `limit` is not given
    pub default_limit: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            end_bound: EndBound::default(),
            default_limit: DEFAULT_LIMIT,
        }
    }
}

/// Parameters of a data query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataQuery {
    pub range: TimeRange,
    pub limit: usize,
    pub density: Density,
}

impl Default for DataQuery {
    fn default() -> Self {
        Self {
            range: TimeRange::all(),
            limit: DEFAULT_LIMIT,
            density: Density::default(),
        }
    }
}

impl DataQuery {
    /// Parse `start_date`, `end_date`, `limit` and `density`.
    pub fn from_params(params: &HashMap<String, String>, options: &QueryOptions) -> EngineResult<Self> {
        let limit = match param(params, "limit") {
            Some(raw) => parse_limit(raw)?,
            None => options.default_limit,
        };
        let density = match param(params, "density") {
            Some(raw) => {
                let factor = raw
                    .parse::<u32>()
                    .map_err(|e| EngineError::invalid("density", raw, e.to_string()))?;
                Density::new(factor)?
            }
            None => Density::default(),
        };

        Ok(Self {
            range: parse_range(params, options.end_bound)?,
            limit,
            density,
        })
    }
}

/// Parameters of an anomaly query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnomalyQuery {
    pub range: TimeRange,
}

impl AnomalyQuery {
    /// Parse `start_date` and `end_date`.
    pub fn from_params(params: &HashMap<String, String>, options: &QueryOptions) -> EngineResult<Self> {
        Ok(Self {
            range: parse_range(params, options.end_bound)?,
        })
    }
}

/// A parameter's raw value, treating empty as absent.
fn param<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .map(|v| v.as_str())
        .filter(|v| !v.is_empty())
}

fn parse_range(params: &HashMap<String, String>, end_bound: EndBound) -> EngineResult<TimeRange> {
    let start = param(params, "start_date")
        .map(|raw| parse_timestamp("start_date", raw))
        .transpose()?;
    let end = param(params, "end_date")
        .map(|raw| parse_timestamp("end_date", raw))
        .transpose()?;

    Ok(TimeRange::new(start, end).with_end_bound(end_bound))
}

fn parse_limit(raw: &str) -> EngineResult<usize> {
    let limit = raw
        .parse::<i64>()
        .map_err(|e| EngineError::invalid("limit", raw, e.to_string()))?;
    if limit < 1 {
        return Err(EngineError::invalid("limit", raw, "must be a positive integer"));
    }
    usize::try_from(limit).map_err(|e| EngineError::invalid("limit", raw, e.to_string()))
}
