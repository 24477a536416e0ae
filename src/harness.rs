use std::hint::black_box;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{BenchError, BodyError, Phase};

/// One timing sample, in nanoseconds.
pub type Sample = u64;

/// Samples of one channel in call order.
pub type SampleSequence = Vec<Sample>;

/// Upper bound on the sample buffer reserved up front.
const MAX_PREALLOC: usize = 1 << 20;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Quick,
    Full,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Quick => "quick",
            Profile::Full => "full",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct BenchConfig {
    pub profile: Profile,
    pub seed: u64,
    /// Overrides the profile's trial count.
    pub trials: Option<u64>,
    /// Overrides the profile's warmup count.
    pub warmup: Option<u64>,
}

impl BenchConfig {
    pub fn rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed)
    }

    pub fn warmup(&self) -> u64 {
        self.warmup.unwrap_or(match self.profile {
            Profile::Quick => 5,
            Profile::Full => 20,
        })
    }

    pub fn trials(&self) -> u64 {
        self.trials.unwrap_or(match self.profile {
            Profile::Quick => 20,
            Profile::Full => 200,
        })
    }
}

/// Runs `body` `warmup` times, discarding everything, then `trials` times
/// recording the wall-clock time of each call.
///
/// The same `state` is handed to every call; resetting it between trials is
/// the body's job. A body error or panic aborts the measurement.
pub fn measure<S, T>(
    state: &mut S,
    mut body: impl FnMut(&mut S) -> Result<T, BodyError>,
    warmup: u64,
    trials: u64,
) -> Result<SampleSequence, BenchError> {
    for index in 0..warmup {
        call(state, &mut body, Phase::Warmup, index)?;
    }

    let mut samples = Vec::with_capacity(usize::try_from(trials).unwrap_or(0).min(MAX_PREALLOC));
    for index in 0..trials {
        let start = Instant::now();
        call(state, &mut body, Phase::Trial, index)?;
        let elapsed = start.elapsed();
        samples.push(u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX));
    }

    Ok(samples)
}

fn call<S, T>(
    state: &mut S,
    body: &mut impl FnMut(&mut S) -> Result<T, BodyError>,
    phase: Phase,
    index: u64,
) -> Result<(), BenchError> {
    let outcome = catch_unwind(AssertUnwindSafe(|| body(state)));
    let message = match outcome {
        Ok(Ok(value)) => {
            black_box(value);
            return Ok(());
        }
        Ok(Err(err)) => err.to_string(),
        Err(panic) => {
            if let Some(s) = panic.downcast_ref::<&str>() {
                format!("panicked: {s}")
            } else if let Some(s) = panic.downcast_ref::<String>() {
                format!("panicked: {s}")
            } else {
                "panicked".to_string()
            }
        }
    };

    Err(BenchError::Measurement {
        phase,
        index,
        message,
    })
}
