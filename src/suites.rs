//! Autograd backward-pass suites: reference kernels measured in-process
//! against the compiled `backwards` worker.

use std::hint::black_box;

use crate::harness::BenchConfig;
use crate::kernels::{AffineBackwards, ArithmeticBackwards};
use crate::suite::{Suite, SuiteDef};

pub const REFERENCE_CHANNEL: &str = "Reference CPU";
pub const COMPILED_CHANNEL: &str = "Compiled CPU";

/// Worker binary serving the external channel of every suite below.
pub const WORKER_TARGET: &str = "backwards";

/// Seed the worker draws its inputs from. The positional protocol carries no
/// seed, so the external channel always sees these inputs; the in-process
/// channel matches them only when the run uses the same seed.
pub const WORKER_SEED: u64 = 0;

pub const ARITHMETIC_ID: u32 = 0;
pub const AFFINE_ID: u32 = 1;

pub fn arithmetic(cfg: &BenchConfig) -> SuiteDef<ArithmeticBackwards> {
    let cfg = cfg.clone();
    SuiteDef::new("Arithmetic Backwards", ARITHMETIC_ID, move || {
        Ok(ArithmeticBackwards::new(&mut cfg.rng()))
    })
    .in_process(REFERENCE_CHANNEL, |k| {
        black_box(k.step());
        Ok(())
    })
    .external(COMPILED_CHANNEL, WORKER_TARGET)
}

pub fn affine(cfg: &BenchConfig) -> SuiteDef<AffineBackwards> {
    let cfg = cfg.clone();
    SuiteDef::new("Ax + b", AFFINE_ID, move || {
        Ok(AffineBackwards::new(&mut cfg.rng()))
    })
    .in_process(REFERENCE_CHANNEL, |k| {
        black_box(k.step());
        Ok(())
    })
    .external(COMPILED_CHANNEL, WORKER_TARGET)
}

/// Every backward-pass suite, in report order.
pub fn backwards(cfg: &BenchConfig) -> Vec<Box<dyn Suite>> {
    vec![arithmetic(cfg).boxed(), affine(cfg).boxed()]
}
