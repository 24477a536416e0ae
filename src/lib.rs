//! Cross-runtime micro-benchmark harness.
//!
//! Suites declare named channels: in-process channels time a local body,
//! external channels build a target once and parse the samples it prints.
//! Results are regrouped per channel and normalized against a baseline.

pub mod aggregate;
pub mod error;
pub mod external;
pub mod harness;
pub mod kernels;
pub mod normalize;
pub mod report;
pub mod runner;
pub mod schema;
pub mod suite;
pub mod suites;

pub use aggregate::{aggregate, AggregateResult};
pub use error::{BenchError, BodyError, ErrorKind};
pub use external::{run_external, BuildTool, CargoBuild, ExecutableCache};
pub use harness::{measure, BenchConfig, Profile, SampleSequence};
pub use normalize::{normalize, Normalized};
pub use runner::{RunReport, Runner};
pub use suite::{Suite, SuiteDef};
