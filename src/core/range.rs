//! Time-range selection over a sensor's ascending sample series.
//!
//! The resolver applies the result cap differently depending on which bounds
//! the caller supplied:
//!
//! | start | end | selection                                  |
//! |-------|-----|--------------------------------------------|
//! | -     | -   | the `limit` most recent samples            |
//! | set   | -   | the first `limit` samples at/after `start` |
//! | -     | set | the `limit` most recent samples up to `end`|
//! | set   | set | every sample in the window, uncapped       |
//!
//! Output is always ascending by timestamp.

use crate::core::sample::Sample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of samples returned by a data query.
pub const DEFAULT_LIMIT: usize = 1000;

/// Whether a sample stamped exactly at the end bound belongs to the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndBound {
    /// `date < end`
    #[default]
    Exclusive,
    /// `date <= end`
    Inclusive,
}

/// Optional start/end bounds on a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    /// Inclusive lower bound
    pub start: Option<DateTime<Utc>>,
    /// Upper bound, see `end_bound`
    pub end: Option<DateTime<Utc>>,
    pub end_bound: EndBound,
}

impl TimeRange {
    /// Create a range with the default end-bound policy.
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self {
            start,
            end,
            end_bound: EndBound::default(),
        }
    }

    /// The unbounded range.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_end_bound(mut self, end_bound: EndBound) -> Self {
        self.end_bound = end_bound;
        self
    }

    /// Check if a timestamp falls within this range.
    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        let after_start = self.start.map_or(true, |start| date >= start);
        let before_end = self.end.map_or(true, |end| match self.end_bound {
            EndBound::Exclusive => date < end,
            EndBound::Inclusive => date <= end,
        });
        after_start && before_end
    }

    /// The contiguous slice of an ascending series inside this range.
    pub fn window<'a>(&self, samples: &'a [Sample]) -> &'a [Sample] {
        let lo = self
            .start
            .map_or(0, |start| samples.partition_point(|s| s.date < start));
        let hi = self.end.map_or(samples.len(), |end| match self.end_bound {
            EndBound::Exclusive => samples.partition_point(|s| s.date < end),
            EndBound::Inclusive => samples.partition_point(|s| s.date <= end),
        });

        if lo >= hi {
            &[]
        } else {
            &samples[lo..hi]
        }
    }

    /// Select samples from an ascending series, applying `limit` per the table above.
    pub fn resolve(&self, samples: &[Sample], limit: usize) -> Vec<Sample> {
        let window = self.window(samples);

        let selected = match (self.start, self.end) {
            // earliest after start, capped
            (Some(_), None) => &window[..limit.min(window.len())],
            // most recent, capped
            (None, _) => &window[window.len().saturating_sub(limit)..],
            (Some(_), Some(_)) => window,
        };

        tracing::debug!(
            window = window.len(),
            selected = selected.len(),
            limit,
            "resolved time range"
        );

        selected.to_vec()
    }
}
