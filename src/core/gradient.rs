//! Gradient annotation at ingestion time.
//!
//! Each sample's gradient is the rate of change against its immediate
//! predecessor in the full series. It is computed once, here, and never
//! recomputed for a queried sub-window.

use crate::core::error::{EngineError, EngineResult};
use crate::core::sample::{RawSample, Sample};
use chrono::Duration;

/// Decimal digits kept in a gradient.
const GRADIENT_PRECISION: i32 = 5;

/// Round to five decimal digits, halves away from zero.
pub fn round5(x: f64) -> f64 {
    let scale = 10f64.powi(GRADIENT_PRECISION);
    (x * scale).round() / scale
}

/// Gradient between two samples, in value units per second.
///
/// Returns `None` when `current` does not come strictly after `previous`.
/// Sub-second deltas count with their fractional part.
pub fn gradient_between(previous: &RawSample, current: &RawSample) -> Option<f64> {
    let delta = current.date - previous.date;
    if delta <= Duration::zero() {
        return None;
    }
    // nanosecond count overflows only past ~292 years
    let seconds = delta
        .num_nanoseconds()
        .map_or(delta.num_seconds() as f64, |nanos| nanos as f64 / 1e9);
    Some(round5((current.value - previous.value) / seconds))
}

/// Annotate an ascending raw series with gradients.
///
/// Sample ids are assigned sequentially from `first_id`. The first sample's
/// gradient is 0. A repeated or decreasing timestamp rejects the whole series.
pub fn annotate(sensor_id: u32, first_id: u64, raw: &[RawSample]) -> EngineResult<Vec<Sample>> {
    let mut samples = Vec::with_capacity(raw.len());

    for (index, current) in raw.iter().enumerate() {
        let gradient = match index.checked_sub(1).map(|prev| &raw[prev]) {
            None => 0.0,
            Some(previous) => gradient_between(previous, current).ok_or(
                EngineError::NonAscendingTimestamps {
                    sensor_id,
                    index,
                    date: current.date,
                },
            )?,
        };

        samples.push(Sample {
            id: first_id + index as u64,
            sensor_id,
            value: current.value,
            gradient,
            date: current.date,
        });
    }

    Ok(samples)
}
