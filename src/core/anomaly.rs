//! Threshold-violation interval detection.
//!
//! A single left-to-right pass keeps one run tracker per anomaly class. A run
//! opens on the first violating sample, extends while the class stays active
//! and is emitted on the first sample that no longer violates. Runs still open
//! after the last sample are flushed in [`AnomalyKind::ALL`] order.
//!
//! Classes are independent: one sample may belong to several runs and the
//! resulting anomalies are never merged.

use crate::core::sample::Sample;
use crate::core::threshold::Thresholds;
use serde::{Deserialize, Serialize};

/// Threshold class of an anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnomalyKind {
    #[serde(rename = "Below Lower Limit")]
    BelowLower,
    #[serde(rename = "Above Upper Limit")]
    AboveUpper,
    #[serde(rename = "High Upward Gradient")]
    UpwardGradient,
    #[serde(rename = "High Downward Gradient")]
    DownwardGradient,
}

impl AnomalyKind {
    /// All classes, in end-of-scan flush order.
    pub const ALL: [AnomalyKind; 4] = [
        AnomalyKind::BelowLower,
        AnomalyKind::AboveUpper,
        AnomalyKind::UpwardGradient,
        AnomalyKind::DownwardGradient,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Whether `sample` violates this class. Unset bounds never do.
    pub fn is_violated_by(self, sample: &Sample, thresholds: &Thresholds) -> bool {
        match self {
            Self::BelowLower => thresholds
                .lower_bound
                .is_some_and(|bound| sample.value < bound),
            Self::AboveUpper => thresholds
                .upper_bound
                .is_some_and(|bound| sample.value > bound),
            Self::UpwardGradient => thresholds
                .gradient_bound
                .is_some_and(|bound| sample.gradient >= 0.0 && sample.gradient > bound),
            Self::DownwardGradient => thresholds
                .gradient_bound
                .is_some_and(|bound| sample.gradient < 0.0 && sample.gradient < -bound),
        }
    }

    /// Strictly more extreme by this class's comparator. Ties keep the earlier peak.
    fn is_more_extreme(self, candidate: &Sample, peak: &Sample) -> bool {
        match self {
            Self::BelowLower => candidate.value < peak.value,
            Self::AboveUpper => candidate.value > peak.value,
            Self::UpwardGradient => candidate.gradient > peak.gradient,
            Self::DownwardGradient => candidate.gradient < peak.gradient,
        }
    }
}

/// A maximal run of samples violating one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    /// First violating sample
    pub start: Sample,
    /// Last violating sample, absent for a single-sample run
    pub end: Option<Sample>,
    /// Most extreme sample of the run
    pub peak: Sample,
}

impl Anomaly {
    /// The last sample of the run (the start for a single-sample run).
    pub fn last(&self) -> &Sample {
        self.end.as_ref().unwrap_or(&self.start)
    }
}

/// An open run, borrowing from the scanned series.
#[derive(Debug, Clone, Copy)]
struct Run<'a> {
    start: &'a Sample,
    end: &'a Sample,
    peak: &'a Sample,
    len: usize,
}

impl<'a> Run<'a> {
    fn open(sample: &'a Sample) -> Self {
        Self {
            start: sample,
            end: sample,
            peak: sample,
            len: 1,
        }
    }

    fn extend(&mut self, kind: AnomalyKind, sample: &'a Sample) {
        self.end = sample;
        self.len += 1;
        if kind.is_more_extreme(sample, self.peak) {
            self.peak = sample;
        }
    }

    fn close(self, kind: AnomalyKind) -> Anomaly {
        Anomaly {
            kind,
            start: self.start.clone(),
            end: (self.len > 1).then(|| self.end.clone()),
            peak: self.peak.clone(),
        }
    }
}

/// Incremental anomaly scanner over an ascending series.
///
/// Feed samples with [`push`](Self::push), then call [`finish`](Self::finish)
/// to flush open runs and take every anomaly in emission order.
#[derive(Debug)]
pub struct AnomalyScanner<'a> {
    thresholds: Thresholds,
    runs: [Option<Run<'a>>; 4],
    completed: Vec<Anomaly>,
}

impl<'a> AnomalyScanner<'a> {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            runs: [None; 4],
            completed: Vec::new(),
        }
    }

    /// Process the next sample of the series.
    pub fn push(&mut self, sample: &'a Sample) {
        for kind in AnomalyKind::ALL {
            let slot = &mut self.runs[kind.index()];

            if kind.is_violated_by(sample, &self.thresholds) {
                match slot {
                    Some(run) => run.extend(kind, sample),
                    None => *slot = Some(Run::open(sample)),
                }
            } else if let Some(run) = slot.take() {
                self.completed.push(run.close(kind));
            }
        }
    }

    /// Number of anomalies emitted so far (excluding open runs).
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Flush open runs in class order and return all anomalies.
    pub fn finish(mut self) -> Vec<Anomaly> {
        for kind in AnomalyKind::ALL {
            if let Some(run) = self.runs[kind.index()].take() {
                self.completed.push(run.close(kind));
            }
        }
        self.completed
    }
}

/// Detect anomaly intervals in an ascending series.
pub fn detect(samples: &[Sample], thresholds: &Thresholds) -> Vec<Anomaly> {
    let mut scanner = AnomalyScanner::new(*thresholds);
    for sample in samples {
        scanner.push(sample);
    }
    let anomalies = scanner.finish();

    tracing::debug!(
        samples = samples.len(),
        anomalies = anomalies.len(),
        "anomaly scan complete"
    );

    anomalies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gradient::annotate;
    use crate::core::sample::RawSample;
    use chrono::{Duration, TimeZone, Utc};

    /// Series one second apart, so gradients equal value differences.
    fn per_second(values: &[f64]) -> Vec<Sample> {
        let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let raw: Vec<RawSample> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| RawSample::new(v, t0 + Duration::seconds(i as i64)))
            .collect();
        annotate(1, 0, &raw).unwrap()
    }

    fn reference_series() -> Vec<Sample> {
        let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let raw: Vec<RawSample> = [7.836, 7.856, 7.8]
            .iter()
            .enumerate()
            .map(|(i, &v)| RawSample::new(v, t0 + Duration::minutes(i as i64)))
            .collect();
        annotate(1, 1, &raw).unwrap()
    }

    fn bounds(lower: Option<f64>, upper: Option<f64>, gradient: Option<f64>) -> Thresholds {
        Thresholds {
            lower_bound: lower,
            upper_bound: upper,
            gradient_bound: gradient,
        }
    }

    fn summary(anomalies: &[Anomaly]) -> Vec<(AnomalyKind, u64, Option<u64>, u64)> {
        anomalies
            .iter()
            .map(|a| (a.kind, a.start.id, a.end.as_ref().map(|e| e.id), a.peak.id))
            .collect()
    }

    #[test]
    fn test_reference_lower_bound() {
        let samples = reference_series();
        let anomalies = detect(&samples, &bounds(Some(7.81), None, None));

        assert_eq!(anomalies.len(), 1);
        let anomaly = &anomalies[0];
        assert_eq!(anomaly.kind, AnomalyKind::BelowLower);
        assert_eq!(anomaly.start, samples[2]);
        assert_eq!(anomaly.end, None);
        assert_eq!(anomaly.peak, samples[2]);
        assert_eq!(anomaly.peak.value, 7.8);
    }

    #[test]
    fn test_reference_gradient_bound() {
        let samples = reference_series();
        let anomalies = detect(&samples, &bounds(None, None, Some(0.0005)));

        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].kind, AnomalyKind::DownwardGradient);
        assert_eq!(anomalies[0].start, samples[2]);
        assert_eq!(anomalies[0].end, None);
        assert_eq!(anomalies[0].peak.gradient, -0.00093);
    }

    #[test]
    fn test_run_merges_into_one_interval() {
        let samples = per_second(&[10.0, 4.0, 2.0, 3.0, 10.0]);
        let anomalies = detect(&samples, &bounds(Some(5.0), None, None));

        assert_eq!(summary(&anomalies), vec![(AnomalyKind::BelowLower, 1, Some(3), 2)]);
        assert_eq!(anomalies[0].peak.value, 2.0);
    }

    #[test]
    fn test_classes_are_independent() {
        // second sample is above 10 and rises by 20 in one second
        let samples = per_second(&[0.0, 20.0]);
        let anomalies = detect(&samples, &bounds(None, Some(10.0), Some(5.0)));

        assert_eq!(
            summary(&anomalies),
            vec![
                (AnomalyKind::AboveUpper, 1, None, 1),
                (AnomalyKind::UpwardGradient, 1, None, 1),
            ]
        );
    }

    #[test]
    fn test_disabled_classes_never_fire() {
        let samples = per_second(&[-100.0, 100.0, -100.0]);
        assert!(detect(&samples, &Thresholds::default()).is_empty());

        let anomalies = detect(&samples, &bounds(None, Some(0.0), None));
        assert!(anomalies.iter().all(|a| a.kind == AnomalyKind::AboveUpper));
    }

    #[test]
    fn test_emission_order_follows_run_closure() {
        // gradients: 0, 20, 0, -25, 0, 8
        let samples = per_second(&[0.0, 20.0, 20.0, -5.0, -5.0, 3.0]);
        let anomalies = detect(&samples, &bounds(Some(0.0), Some(10.0), Some(5.0)));

        assert_eq!(
            summary(&anomalies),
            vec![
                (AnomalyKind::UpwardGradient, 1, None, 1),
                (AnomalyKind::AboveUpper, 1, Some(2), 1),
                (AnomalyKind::DownwardGradient, 3, None, 3),
                (AnomalyKind::BelowLower, 3, Some(4), 3),
                (AnomalyKind::UpwardGradient, 5, None, 5),
            ]
        );
    }

    #[test]
    fn test_open_runs_flush_in_class_order() {
        // lower > upper so every value is both below and above
        let samples = per_second(&[0.0, 5.0, 2.0]);
        let anomalies = detect(&samples, &bounds(Some(10.0), Some(0.0), Some(1.0)));

        assert_eq!(
            summary(&anomalies),
            vec![
                (AnomalyKind::UpwardGradient, 1, None, 1),
                (AnomalyKind::BelowLower, 0, Some(2), 0),
                (AnomalyKind::AboveUpper, 1, Some(2), 1),
                (AnomalyKind::DownwardGradient, 2, None, 2),
            ]
        );
    }

    #[test]
    fn test_peak_tracks_most_extreme_gradient() {
        // gradients: 0, 2, 6, 3, -1
        let samples = per_second(&[0.0, 2.0, 8.0, 11.0, 10.0]);
        let anomalies = detect(&samples, &bounds(None, None, Some(1.0)));

        assert_eq!(summary(&anomalies), vec![(AnomalyKind::UpwardGradient, 1, Some(3), 2)]);
        assert_eq!(anomalies[0].last().id, 3);
    }

    #[test]
    fn test_scanner_is_incremental() {
        let samples = per_second(&[0.0, -3.0, 0.0, -3.0]);
        let mut scanner = AnomalyScanner::new(bounds(Some(-1.0), None, None));

        scanner.push(&samples[0]);
        scanner.push(&samples[1]);
        assert_eq!(scanner.completed_count(), 0);
        scanner.push(&samples[2]);
        assert_eq!(scanner.completed_count(), 1);
        scanner.push(&samples[3]);

        let anomalies = scanner.finish();
        assert_eq!(anomalies.len(), 2);
        assert_eq!(anomalies[1].start.id, 3);
    }

    #[test]
    fn test_anomaly_json_shape() {
        let samples = reference_series();
        let anomalies = detect(&samples, &bounds(Some(7.81), None, None));
        let value = serde_json::to_value(&anomalies[0]).unwrap();

        assert_eq!(value["type"], "Below Lower Limit");
        assert_eq!(value["end"], serde_json::Value::Null);
        assert_eq!(value["start"]["date"], "2020-01-01T00:02:00Z");
        assert_eq!(value["peak"]["value"], 7.8);
    }
}
