//! External worker for the backward-pass suites.
//!
//! Usage: `backwards <suite_id> <trials> <warmup>`. Runs the warmup and trial
//! loop itself and prints one nanosecond sample per line on stdout. Inputs
//! are always drawn from `WORKER_SEED`.

use clap::Parser;
use parity_bench::harness::{measure, BenchConfig, SampleSequence};
use parity_bench::kernels::{AffineBackwards, ArithmeticBackwards};
use parity_bench::suites::{AFFINE_ID, ARITHMETIC_ID, WORKER_SEED};
use std::hint::black_box;
use std::io::{self, BufWriter, Write};

#[derive(Parser, Debug)]
#[command(name = "backwards")]
#[command(about = "Backward-pass benchmark worker (one sample per line)")]
struct Args {
    suite_id: u32,
    trials: u64,
    warmup: u64,
}

fn run(args: &Args) -> anyhow::Result<SampleSequence> {
    let cfg = BenchConfig {
        seed: WORKER_SEED,
        ..BenchConfig::default()
    };
    let mut rng = cfg.rng();
    let samples = match args.suite_id {
        ARITHMETIC_ID => {
            let mut k = ArithmeticBackwards::new(&mut rng);
            measure(&mut k, |k| Ok(black_box(k.step())), args.warmup, args.trials)?
        }
        AFFINE_ID => {
            let mut k = AffineBackwards::new(&mut rng);
            measure(&mut k, |k| Ok(black_box(k.step())), args.warmup, args.trials)?
        }
        other => anyhow::bail!("unknown suite id {other}"),
    };
    Ok(samples)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let samples = run(&args)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for ns in samples {
        writeln!(out, "{ns}")?;
    }
    out.flush()?;
    Ok(())
}
