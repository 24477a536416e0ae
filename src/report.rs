//! Human-readable rendering of a run.

use crate::aggregate::AggregateResult;
use crate::normalize::{mean, Normalized};
use crate::suite::ChannelFailure;

/// Table of mean time per suite and channel, with the ratio to the baseline
/// when one is available, followed by any failures.
pub fn format_table(
    title: &str,
    aggregate: &AggregateResult,
    normalized: Option<&Normalized>,
    failures: &[ChannelFailure],
) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str(title);
    output.push('\n');
    output.push_str(&"=".repeat(72));
    output.push('\n');

    if let Some(n) = normalized {
        output.push_str(&format!("baseline: {}\n", n.baseline));
    }

    output.push_str(&format!(
        "{:<28} {:<16} {:>14} {:>10}\n",
        "suite", "channel", "mean (ns)", "ratio"
    ));
    output.push_str(&"-".repeat(72));
    output.push('\n');

    for suite in aggregate.suite_names() {
        for series in &aggregate.channels {
            let Some(entry) = series.entries.iter().find(|e| e.suite == suite) else {
                continue;
            };
            let mean_ns = mean(&entry.samples)
                .map(|m| format!("{m:.0}"))
                .unwrap_or_else(|| "-".to_string());
            let ratio = normalized
                .and_then(|n| n.ratio(suite, &series.channel))
                .map(|r| format!("{r:.3}x"))
                .unwrap_or_else(|| "-".to_string());
            output.push_str(&format!(
                "{:<28} {:<16} {:>14} {:>10}\n",
                suite, series.channel, mean_ns, ratio
            ));
        }
    }

    if !failures.is_empty() {
        output.push('\n');
        output.push_str(&format!("Failures ({})\n", failures.len()));
        output.push_str(&"-".repeat(72));
        output.push('\n');
        for f in failures {
            output.push_str(&format!(
                "  ✗ {} / {} [{}]: {}\n",
                f.suite, f.channel, f.kind, f.message
            ));
        }
    }

    output
}
