//! Ratios of each channel against a baseline channel.
//!
//! The central tendency is the arithmetic mean of a channel's samples.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregate::AggregateResult;
use crate::error::BenchError;

/// Arithmetic mean, `None` for an empty sequence.
pub fn mean(samples: &[u64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let sum: f64 = samples.iter().map(|&s| s as f64).sum();
    Some(sum / samples.len() as f64)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuiteRatios {
    pub suite: String,
    /// Channel name to `mean(channel) / mean(baseline)`.
    pub ratios: BTreeMap<String, f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Normalized {
    pub baseline: String,
    pub suites: Vec<SuiteRatios>,
}

impl Normalized {
    pub fn ratio(&self, suite: &str, channel: &str) -> Option<f64> {
        self.suites
            .iter()
            .find(|s| s.suite == suite)
            .and_then(|s| s.ratios.get(channel).copied())
    }
}

/// Divides every channel's mean by the baseline channel's mean, per suite.
///
/// Suites are matched by name. A suite without baseline samples, or whose
/// baseline mean is zero, gets no ratios.
pub fn normalize(aggregate: &AggregateResult, baseline: &str) -> Result<Normalized, BenchError> {
    let base = aggregate
        .get(baseline)
        .ok_or_else(|| BenchError::UnknownBaseline(baseline.to_string()))?;

    let mut suites = Vec::new();
    for entry in &base.entries {
        let base_mean = match mean(&entry.samples) {
            Some(m) if m > 0.0 => m,
            _ => {
                tracing::warn!(suite = %entry.suite, baseline, "baseline mean is zero or undefined; skipping suite");
                continue;
            }
        };

        let mut ratios = BTreeMap::new();
        for series in &aggregate.channels {
            let Some(own) = series.entries.iter().find(|e| e.suite == entry.suite) else {
                continue;
            };
            if let Some(m) = mean(&own.samples) {
                ratios.insert(series.channel.clone(), m / base_mean);
            }
        }
        suites.push(SuiteRatios {
            suite: entry.suite.clone(),
            ratios,
        });
    }

    for name in aggregate.suite_names() {
        if !base.entries.iter().any(|e| e.suite == name) {
            tracing::warn!(suite = name, baseline, "suite has no baseline samples; skipping");
        }
    }

    Ok(Normalized {
        baseline: baseline.to_string(),
        suites,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn agg(rows: &[(&str, &str, Vec<u64>)]) -> AggregateResult {
        rows.iter()
            .map(|(c, s, v)| (c.to_string(), s.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn ratios_against_baseline() {
        let a = agg(&[
            ("A", "suite0", vec![10]),
            ("A", "suite1", vec![20]),
            ("B", "suite0", vec![5]),
            ("B", "suite1", vec![40]),
        ]);
        let n = normalize(&a, "A").unwrap();
        assert_eq!(n.ratio("suite0", "B"), Some(0.5));
        assert_eq!(n.ratio("suite1", "B"), Some(2.0));
        assert_eq!(n.ratio("suite0", "A"), Some(1.0));
        assert_eq!(n.ratio("suite1", "A"), Some(1.0));
        let order: Vec<_> = n.suites.iter().map(|s| s.suite.as_str()).collect();
        assert_eq!(order, ["suite0", "suite1"]);
    }

    #[test]
    fn uses_mean_of_samples() {
        let a = agg(&[("A", "s", vec![10, 30]), ("B", "s", vec![1, 2, 3])]);
        let n = normalize(&a, "A").unwrap();
        assert_eq!(n.ratio("s", "B"), Some(0.1));
    }

    #[test]
    fn unknown_baseline_fails_without_touching_input() {
        let a = agg(&[("A", "s", vec![1])]);
        let before = a.clone();
        let err = normalize(&a, "C").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownBaseline);
        assert_eq!(a, before);
    }

    #[test]
    fn aligns_by_suite_name_when_channels_partially_overlap() {
        let a = agg(&[
            ("A", "s0", vec![10]),
            ("A", "s1", vec![20]),
            ("B", "s1", vec![10]),
        ]);
        let n = normalize(&a, "A").unwrap();
        assert_eq!(n.ratio("s0", "B"), None);
        assert_eq!(n.ratio("s1", "B"), Some(0.5));
    }

    #[test]
    fn zero_or_missing_baseline_is_skipped() {
        let a = agg(&[
            ("A", "zero", vec![0, 0]),
            ("B", "zero", vec![4]),
            ("B", "orphan", vec![4]),
        ]);
        let n = normalize(&a, "A").unwrap();
        assert!(n.suites.is_empty());
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2, 4]), Some(3.0));
    }
}
