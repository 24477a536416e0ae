use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate, AggregateResult};
use crate::error::BenchError;
use crate::external::{run_external, BuildTool, CargoBuild, ExecutableCache};
use crate::harness::{BenchConfig, SampleSequence};
use crate::suite::{
    ChannelDecl, ChannelFailure, ChannelKind, ChannelSamples, Suite, SuiteRecord, SuiteStatus,
};

/// Everything one run produced.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub suites: Vec<SuiteRecord>,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &ChannelFailure> {
        self.suites.iter().flat_map(|s| s.failures.iter())
    }

    pub fn aggregate(&self) -> AggregateResult {
        aggregate(&self.suites)
    }
}

/// Drives suites sequentially and owns the executable cache for the run.
pub struct Runner<B = CargoBuild> {
    config: BenchConfig,
    cache: ExecutableCache<B>,
}

impl<B: BuildTool> Runner<B> {
    pub fn new(config: BenchConfig, tool: B) -> Self {
        Self {
            config,
            cache: ExecutableCache::new(tool),
        }
    }

    pub fn cache(&self) -> &ExecutableCache<B> {
        &self.cache
    }

    pub fn run_all(&mut self, suites: &mut [Box<dyn Suite>]) -> RunReport {
        let suites = suites
            .iter_mut()
            .map(|suite| self.run_suite(suite.as_mut()))
            .collect();
        RunReport { suites }
    }

    /// Runs every declared channel of `suite` in order. A failing channel is
    /// recorded and the remaining channels still run.
    pub fn run_suite(&mut self, suite: &mut dyn Suite) -> SuiteRecord {
        let name = suite.name().to_string();
        let id = suite.id();
        let decls = suite.channels();
        let mut record = SuiteRecord {
            name: name.clone(),
            id,
            status: SuiteStatus::Completed,
            channels: Vec::with_capacity(decls.len()),
            failures: Vec::new(),
        };

        tracing::info!(suite = %name, id, channels = decls.len(), "setting up suite");
        if let Err(e) = suite.setup() {
            let err = BenchError::Setup(e.to_string());
            tracing::warn!(suite = %name, error = %err, "suite setup failed");
            record.failures = decls
                .iter()
                .map(|d| ChannelFailure::new(&name, &d.name, &err))
                .collect();
            record.status = SuiteStatus::Failed;
            return record;
        }

        for (index, decl) in decls.iter().enumerate() {
            tracing::info!(suite = %name, channel = %decl.name, "measuring channel");
            match self.run_channel(suite, id, index, decl) {
                Ok(samples) => {
                    tracing::info!(
                        suite = %name,
                        channel = %decl.name,
                        samples = samples.len(),
                        "channel complete"
                    );
                    record.channels.push(ChannelSamples {
                        channel: decl.name.clone(),
                        samples,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        suite = %name,
                        channel = %decl.name,
                        kind = %err.kind(),
                        error = %err,
                        "channel failed"
                    );
                    record.failures.push(ChannelFailure::new(&name, &decl.name, &err));
                    record.status = SuiteStatus::Failed;
                }
            }
        }

        suite.teardown();
        record
    }

    fn run_channel(
        &mut self,
        suite: &mut dyn Suite,
        id: u32,
        index: usize,
        decl: &ChannelDecl,
    ) -> Result<SampleSequence, BenchError> {
        let trials = self.config.trials();
        let warmup = self.config.warmup();
        match &decl.kind {
            ChannelKind::InProcess => suite.run_in_process(index, warmup, trials),
            ChannelKind::External { target } => {
                let executable = self.cache.resolve_executable(target)?;
                run_external(&executable, [id.to_string()], trials, warmup)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::suite::SuiteDef;
    use std::path::PathBuf;

    struct NoBuild;

    impl BuildTool for NoBuild {
        fn build(&self, target: &str) -> Result<PathBuf, BenchError> {
            Err(BenchError::Build {
                target: target.to_string(),
                reason: "no toolchain".into(),
            })
        }
    }

    fn config(trials: u64, warmup: u64) -> BenchConfig {
        BenchConfig {
            trials: Some(trials),
            warmup: Some(warmup),
            ..BenchConfig::default()
        }
    }

    #[test]
    fn failing_channel_does_not_stop_siblings() {
        let mut suites = vec![
            SuiteDef::new("first", 0, || Ok(()))
                .in_process("A", |_| Ok(()))
                .external("B", "missing")
                .in_process("C", |_| Ok(()))
                .boxed(),
            SuiteDef::new("second", 1, || Ok(()))
                .in_process("A", |_| Ok(()))
                .boxed(),
        ];

        let mut runner = Runner::new(config(3, 1), NoBuild);
        let report = runner.run_all(&mut suites);

        let first = &report.suites[0];
        assert_eq!(first.status, SuiteStatus::Failed);
        assert_eq!(first.samples("A").map(<[u64]>::len), Some(3));
        assert_eq!(first.samples("C").map(<[u64]>::len), Some(3));
        assert!(first.samples("B").is_none());
        assert_eq!(first.failures.len(), 1);
        assert_eq!(first.failures[0].channel, "B");
        assert_eq!(first.failures[0].kind, ErrorKind::Build);

        assert_eq!(report.suites[1].status, SuiteStatus::Completed);
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn setup_failure_fails_every_channel() {
        let mut suites = vec![SuiteDef::new("broken", 0, || -> Result<(), _> {
            Err("out of memory".into())
        })
        .in_process("A", |_| Ok(()))
        .external("B", "t")
        .boxed()];

        let report = Runner::new(config(1, 0), NoBuild).run_all(&mut suites);
        let record = &report.suites[0];
        assert_eq!(record.status, SuiteStatus::Failed);
        assert!(record.channels.is_empty());
        let kinds: Vec<_> = record.failures.iter().map(|f| f.kind).collect();
        assert_eq!(kinds, [ErrorKind::Setup, ErrorKind::Setup]);
        assert!(record.failures[0].message.contains("out of memory"));
    }

    #[test]
    fn measurement_failure_names_suite_and_channel() {
        let mut suites = vec![SuiteDef::new("flaky", 4, || Ok(0u32))
            .in_process("A", |n| {
                *n += 1;
                if *n == 2 {
                    return Err("nan in output".into());
                }
                Ok(())
            })
            .boxed()];

        let report = Runner::new(config(5, 0), NoBuild).run_all(&mut suites);
        let failure = report.failures().next().unwrap();
        assert_eq!(failure.suite, "flaky");
        assert_eq!(failure.channel, "A");
        assert_eq!(failure.kind, ErrorKind::Measurement);
    }
}
