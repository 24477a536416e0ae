use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Error returned by an in-process benchmark body.
pub type BodyError = Box<dyn std::error::Error + Send + Sync>;

/// Which half of a measured channel a body call belonged to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Warmup,
    Trial,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Warmup => f.write_str("warmup"),
            Phase::Trial => f.write_str("trial"),
        }
    }
}

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("build of target `{target}` failed: {reason}")]
    Build { target: String, reason: String },

    #[error("protocol error from {}: {reason}", executable.display())]
    Protocol { executable: PathBuf, reason: String },

    #[error("body failed on {phase} call {index}: {message}")]
    Measurement {
        phase: Phase,
        index: u64,
        message: String,
    },

    #[error("suite setup failed: {0}")]
    Setup(String),

    #[error("unknown baseline channel `{0}`")]
    UnknownBaseline(String),
}

/// Stable classification of a [`BenchError`], as written into reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Build,
    Protocol,
    Measurement,
    Setup,
    UnknownBaseline,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Build => "build",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Measurement => "measurement",
            ErrorKind::Setup => "setup",
            ErrorKind::UnknownBaseline => "unknown_baseline",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BenchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BenchError::Build { .. } => ErrorKind::Build,
            BenchError::Protocol { .. } => ErrorKind::Protocol,
            BenchError::Measurement { .. } => ErrorKind::Measurement,
            BenchError::Setup(_) => ErrorKind::Setup,
            BenchError::UnknownBaseline(_) => ErrorKind::UnknownBaseline,
        }
    }

    pub(crate) fn protocol(executable: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        BenchError::Protocol {
            executable: executable.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn build(target: &str, reason: impl Into<String>) -> Self {
        BenchError::Build {
            target: target.to_string(),
            reason: reason.into(),
        }
    }
}
