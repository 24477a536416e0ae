//! Full runs: suites with an in-process and an external channel, through
//! aggregation and normalization.
#![cfg(unix)]

mod common;

use common::{fixed_worker, serial};
use parity_bench::normalize::{mean, normalize};
use parity_bench::suite::SuiteStatus;
use parity_bench::{BenchConfig, BenchError, BuildTool, ErrorKind, Runner, Suite, SuiteDef};
use std::cell::Cell;
use std::path::PathBuf;
use std::time::Duration;

const TRIALS: u64 = 5;
const WARMUP: u64 = 2;
const STUB_NS: u64 = 250_000;

/// Hands out a prebuilt stub and counts how often it is asked to build.
struct StubBuild {
    executable: PathBuf,
    calls: Cell<usize>,
}

impl BuildTool for StubBuild {
    fn build(&self, target: &str) -> Result<PathBuf, BenchError> {
        self.calls.set(self.calls.get() + 1);
        if target != "worker" {
            return Err(BenchError::Build {
                target: target.to_string(),
                reason: "unknown target".into(),
            });
        }
        Ok(self.executable.clone())
    }
}

fn config() -> BenchConfig {
    BenchConfig {
        trials: Some(TRIALS),
        warmup: Some(WARMUP),
        ..BenchConfig::default()
    }
}

fn sleeping_suite(name: &str, id: u32, target: &str) -> Box<dyn Suite> {
    SuiteDef::new(name, id, || Ok(0u64))
        .in_process("in-process", |calls| {
            *calls += 1;
            std::thread::sleep(Duration::from_millis(1));
            Ok(())
        })
        .external("external", target)
        .boxed()
}

#[test]
fn fixed_delay_against_fixed_stub() {
    let _guard = serial();
    let dir = tempfile::tempdir().unwrap();
    let worker = fixed_worker(dir.path(), 0, STUB_NS);

    let mut suites = vec![sleeping_suite("delay", 0, "worker")];
    let mut runner = Runner::new(
        config(),
        StubBuild {
            executable: worker,
            calls: Cell::new(0),
        },
    );
    let report = runner.run_all(&mut suites);

    let record = &report.suites[0];
    assert_eq!(record.status, SuiteStatus::Completed);
    let local = record.samples("in-process").unwrap();
    let external = record.samples("external").unwrap();
    assert_eq!(local.len() as u64, TRIALS);
    assert_eq!(external, &[STUB_NS; TRIALS as usize]);
    assert!(local.iter().all(|&ns| ns >= 1_000_000));

    let agg = report.aggregate();
    let normalized = normalize(&agg, "in-process").unwrap();
    let expected = STUB_NS as f64 / mean(local).unwrap();
    let ratio = normalized.ratio("delay", "external").unwrap();
    assert!((ratio - expected).abs() < 1e-12);
    assert!(ratio > 0.0 && ratio <= 0.25);
    assert_eq!(normalized.ratio("delay", "in-process"), Some(1.0));
}

#[test]
fn shared_target_is_built_once() {
    let _guard = serial();
    let dir = tempfile::tempdir().unwrap();
    // The stub only accepts id 0, so the second suite's external channel
    // fails after resolving from the cache.
    let worker = fixed_worker(dir.path(), 0, STUB_NS);

    let mut suites = vec![
        sleeping_suite("first", 0, "worker"),
        sleeping_suite("second", 1, "worker"),
    ];
    let mut runner = Runner::new(
        config(),
        StubBuild {
            executable: worker,
            calls: Cell::new(0),
        },
    );
    let report = runner.run_all(&mut suites);

    assert_eq!(runner.cache().tool().calls.get(), 1);
    assert_eq!(report.suites[0].status, SuiteStatus::Completed);

    let second = &report.suites[1];
    assert_eq!(second.status, SuiteStatus::Failed);
    assert!(second.samples("in-process").is_some());
    assert_eq!(second.failures[0].kind, ErrorKind::Protocol);

    // The failed channel is absent for that suite only.
    let agg = report.aggregate();
    assert_eq!(agg.sequences("in-process").len(), 2);
    assert_eq!(agg.sequences("external").len(), 1);

    let normalized = normalize(&agg, "in-process").unwrap();
    assert!(normalized.ratio("first", "external").is_some());
    assert!(normalized.ratio("second", "external").is_none());
}

#[test]
fn build_failure_keeps_in_process_results() {
    let _guard = serial();
    let mut suites = vec![sleeping_suite("orphan", 0, "not-a-target")];
    let mut runner = Runner::new(
        config(),
        StubBuild {
            executable: PathBuf::from("/unused"),
            calls: Cell::new(0),
        },
    );
    let report = runner.run_all(&mut suites);

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].suite, "orphan");
    assert_eq!(failures[0].channel, "external");
    assert_eq!(failures[0].kind, ErrorKind::Build);
    assert_eq!(
        report.suites[0].samples("in-process").map(<[u64]>::len),
        Some(TRIALS as usize)
    );

    let err = normalize(&report.aggregate(), "external").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownBaseline);
}

#[test]
fn warmup_calls_do_not_produce_samples() {
    let calls = std::rc::Rc::new(Cell::new(0u64));
    let seen = calls.clone();
    let mut suites = vec![SuiteDef::new("count", 0, || Ok(()))
        .in_process("in-process", move |_| {
            seen.set(seen.get() + 1);
            Ok(())
        })
        .boxed()];

    let report = Runner::new(
        config(),
        StubBuild {
            executable: PathBuf::from("/unused"),
            calls: Cell::new(0),
        },
    )
    .run_all(&mut suites);

    assert_eq!(calls.get(), WARMUP + TRIALS);
    assert_eq!(
        report.suites[0].samples("in-process").map(<[u64]>::len),
        Some(TRIALS as usize)
    );
}
