//! Positional decimation of a filtered sample sequence.

use crate::core::error::{EngineError, EngineResult};
use crate::core::sample::Sample;

/// Smallest accepted density.
pub const MIN_DENSITY: u32 = 1;
/// Largest accepted density.
pub const MAX_DENSITY: u32 = 16;

/// Keep every Nth sample, `1..=16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Density(u8);

impl Density {
    /// Validate a density factor. Out-of-range values are rejected, never clamped.
    pub fn new(factor: u32) -> EngineResult<Self> {
        if (MIN_DENSITY..=MAX_DENSITY).contains(&factor) {
            Ok(Self(factor as u8))
        } else {
            Err(EngineError::invalid(
                "density",
                factor.to_string(),
                format!("must be between {MIN_DENSITY} and {MAX_DENSITY}"),
            ))
        }
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl Default for Density {
    fn default() -> Self {
        Self(1)
    }
}

/// Keep the samples at positions `0, d, 2d, …`.
pub fn decimate(samples: Vec<Sample>, density: Density) -> Vec<Sample> {
    if density.get() == 1 {
        return samples;
    }
    samples.into_iter().step_by(density.get()).collect()
}
