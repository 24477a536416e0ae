//! Benchmark suites and their measurement channels.

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, BodyError, ErrorKind};
use crate::harness::{measure, SampleSequence};

/// How a channel produces its samples.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelKind {
    /// Timed calls of a local body.
    InProcess,
    /// One invocation of an externally built target, passed the suite id.
    External { target: String },
}

/// Declared channel of a suite, in run order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelDecl {
    pub name: String,
    pub kind: ChannelKind,
}

/// A suite as seen by the runner.
///
/// `setup` is called once per run before any channel; in-process channels
/// then reuse that state for every warmup and trial call.
pub trait Suite {
    fn name(&self) -> &str;

    /// Key shared with the external counterpart; passed as its first argument.
    fn id(&self) -> u32;

    fn channels(&self) -> Vec<ChannelDecl>;

    fn setup(&mut self) -> Result<(), BodyError>;

    /// Measures the in-process channel at `index` in [`Suite::channels`].
    fn run_in_process(
        &mut self,
        index: usize,
        warmup: u64,
        trials: u64,
    ) -> Result<SampleSequence, BenchError>;

    /// Drops the state built by `setup`.
    fn teardown(&mut self) {}
}

type Setup<S> = Box<dyn Fn() -> Result<S, BodyError>>;
type Body<S> = Box<dyn FnMut(&mut S) -> Result<(), BodyError>>;

enum Channel<S> {
    InProcess { name: String, body: Body<S> },
    External { name: String, target: String },
}

/// A suite built from a setup closure plus named channels.
///
/// ```
/// use parity_bench::suite::{Suite, SuiteDef};
///
/// let suite = SuiteDef::new("sum", 3, || Ok(vec![1u64; 1024]))
///     .in_process("Reference CPU", |v| {
///         std::hint::black_box(v.iter().sum::<u64>());
///         Ok(())
///     })
///     .external("Compiled CPU", "sum");
/// assert_eq!(suite.channels().len(), 2);
/// ```
pub struct SuiteDef<S> {
    name: String,
    id: u32,
    setup: Setup<S>,
    channels: Vec<Channel<S>>,
    state: Option<S>,
}

impl<S> SuiteDef<S> {
    pub fn new(
        name: impl Into<String>,
        id: u32,
        setup: impl Fn() -> Result<S, BodyError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            id,
            setup: Box::new(setup),
            channels: Vec::new(),
            state: None,
        }
    }

    pub fn in_process(
        mut self,
        name: impl Into<String>,
        body: impl FnMut(&mut S) -> Result<(), BodyError> + 'static,
    ) -> Self {
        self.channels.push(Channel::InProcess {
            name: name.into(),
            body: Box::new(body),
        });
        self
    }

    pub fn external(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.channels.push(Channel::External {
            name: name.into(),
            target: target.into(),
        });
        self
    }

    /// Type-erases the definition for a suite list.
    pub fn boxed(self) -> Box<dyn Suite>
    where
        S: 'static,
    {
        Box::new(self)
    }
}

impl<S> Suite for SuiteDef<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn channels(&self) -> Vec<ChannelDecl> {
        self.channels
            .iter()
            .map(|c| match c {
                Channel::InProcess { name, .. } => ChannelDecl {
                    name: name.clone(),
                    kind: ChannelKind::InProcess,
                },
                Channel::External { name, target } => ChannelDecl {
                    name: name.clone(),
                    kind: ChannelKind::External {
                        target: target.clone(),
                    },
                },
            })
            .collect()
    }

    fn setup(&mut self) -> Result<(), BodyError> {
        self.state = Some((self.setup)()?);
        Ok(())
    }

    fn run_in_process(
        &mut self,
        index: usize,
        warmup: u64,
        trials: u64,
    ) -> Result<SampleSequence, BenchError> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| BenchError::Setup("suite state not initialised".to_string()))?;
        match self.channels.get_mut(index) {
            Some(Channel::InProcess { body, .. }) => measure(state, |s| body(s), warmup, trials),
            _ => Err(BenchError::Setup(format!(
                "channel {index} is not an in-process channel"
            ))),
        }
    }

    fn teardown(&mut self) {
        self.state = None;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuiteStatus {
    Completed,
    Failed,
}

/// Samples produced by one channel of one suite.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelSamples {
    pub channel: String,
    pub samples: SampleSequence,
}

/// A channel that produced no samples, and why.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelFailure {
    pub suite: String,
    pub channel: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl ChannelFailure {
    pub fn new(suite: &str, channel: &str, err: &BenchError) -> Self {
        Self {
            suite: suite.to_string(),
            channel: channel.to_string(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Outcome of running every channel of one suite.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuiteRecord {
    pub name: String,
    pub id: u32,
    pub status: SuiteStatus,
    /// Successful channels, in declared order.
    pub channels: Vec<ChannelSamples>,
    pub failures: Vec<ChannelFailure>,
}

impl SuiteRecord {
    pub fn samples(&self, channel: &str) -> Option<&[u64]> {
        self.channels
            .iter()
            .find(|c| c.channel == channel)
            .map(|c| c.samples.as_slice())
    }
}
