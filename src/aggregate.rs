//! Regrouping per-suite results by channel.

use serde::{Deserialize, Serialize};

use crate::harness::SampleSequence;
use crate::suite::SuiteRecord;

/// One suite's samples inside a [`ChannelSeries`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuiteSamples {
    pub suite: String,
    pub samples: SampleSequence,
}

/// All suites' samples for one channel, in suite run order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelSeries {
    pub channel: String,
    pub entries: Vec<SuiteSamples>,
}

/// Channel name to per-suite samples.
///
/// Channels appear in order of first declaration. A suite that did not
/// produce a channel has no entry for it, so entries are keyed by suite name
/// rather than position.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub channels: Vec<ChannelSeries>,
}

impl AggregateResult {
    pub fn get(&self, channel: &str) -> Option<&ChannelSeries> {
        self.channels.iter().find(|c| c.channel == channel)
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|c| c.channel.as_str())
    }

    /// Sample sequences of `channel`, one per suite that produced it.
    pub fn sequences(&self, channel: &str) -> Vec<&[u64]> {
        self.get(channel)
            .map(|series| series.entries.iter().map(|e| e.samples.as_slice()).collect())
            .unwrap_or_default()
    }

    /// Suite names in first-seen order across all channels.
    pub fn suite_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entry in self.channels.iter().flat_map(|c| c.entries.iter()) {
            if !names.contains(&entry.suite.as_str()) {
                names.push(&entry.suite);
            }
        }
        names
    }

    fn push(&mut self, channel: &str, suite: &str, samples: SampleSequence) {
        let entry = SuiteSamples {
            suite: suite.to_string(),
            samples,
        };
        match self.channels.iter_mut().find(|c| c.channel == channel) {
            Some(series) => series.entries.push(entry),
            None => self.channels.push(ChannelSeries {
                channel: channel.to_string(),
                entries: vec![entry],
            }),
        }
    }
}

pub fn aggregate(records: &[SuiteRecord]) -> AggregateResult {
    let mut result = AggregateResult::default();
    for record in records {
        for channel in &record.channels {
            result.push(&channel.channel, &record.name, channel.samples.clone());
        }
    }
    result
}

impl FromIterator<(String, String, SampleSequence)> for AggregateResult {
    /// Builds from `(channel, suite, samples)` triples in suite order.
    fn from_iter<I: IntoIterator<Item = (String, String, SampleSequence)>>(iter: I) -> Self {
        let mut result = AggregateResult::default();
        for (channel, suite, samples) in iter {
            result.push(&channel, &suite, samples);
        }
        result
    }
}
