use serde::{Deserialize, Serialize};

use crate::normalize::Normalized;
use crate::suite::{ChannelFailure, SuiteRecord};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub schema_version: u32,
    pub bench_version: String,
    pub profile: String,
    pub seed: u64,
    pub trials: u64,
    pub warmup: u64,
    pub baseline: String,
    /// Unit of every sample in the report.
    pub unit: String,
    pub timestamp_utc: String,
    pub git_sha: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParityReport {
    pub run: RunMeta,
    pub suites: Vec<SuiteRecord>,
    pub failures: Vec<ChannelFailure>,
    /// Absent when normalization itself failed.
    pub normalized: Option<Normalized>,
}
