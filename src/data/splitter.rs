// ============================================================
// Layer 4 — Train / Validation / Test Splitter
// ============================================================
// Shuffles with a seeded RNG and carves the data into three
// disjoint partitions in two steps:
//
//   all   ──(test_size)──────────▶  rest  + test
//   rest  ──(validation_size)────▶  train + validation
//
// so `validation_size` is a fraction of what remains after the
// test rows are removed. Held-out sizes are rounded up:
//
//   n = 100, test_size = 0.2, validation_size = 0.2
//   test = 20, validation = ceil(80 * 0.2) = 16, train = 64
//
// The same seed always yields the same partitions.
//
// Reference: rand crate documentation (SeedableRng, SliceRandom)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::error::{PipelineError, Result};

/// Seed used when the config does not name one
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, PartialEq)]
pub struct Split<T> {
    pub train:      Vec<T>,
    pub validation: Vec<T>,
    pub test:       Vec<T>,
}

impl<T> Split<T> {
    pub fn total(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }
}

/// Shuffle `samples` with `seed` and split off `held_out_fraction`
/// of them. Returns (kept, held_out).
pub fn split_off_fraction<T>(
    mut samples:       Vec<T>,
    held_out_fraction: f64,
    seed:              u64,
) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let held_out = ((total as f64) * held_out_fraction).ceil() as usize;
    let held_out = held_out.min(total);

    // split_off(n) leaves [0..n) in `samples`
    let held = samples.split_off(total - held_out);
    (samples, held)
}

/// Partition into train / validation / test.
pub fn split_three_way<T>(
    samples:         Vec<T>,
    test_size:       f64,
    validation_size: f64,
    seed:            u64,
) -> Result<Split<T>> {
    for (name, value) in [("test_size", test_size), ("validation_size", validation_size)] {
        if !(value > 0.0 && value < 1.0) {
            return Err(PipelineError::Data(format!("{name} must be in (0, 1), got {value}")));
        }
    }

    let total = samples.len();
    let (rest, test)        = split_off_fraction(samples, test_size, seed);
    let (train, validation) = split_off_fraction(rest, validation_size, seed);

    if train.is_empty() {
        return Err(PipelineError::Data(format!(
            "{total} rows leave no training rows with test_size={test_size} and validation_size={validation_size}"
        )));
    }

    tracing::debug!(
        train = train.len(),
        validation = validation.len(),
        test = test.len(),
        "Dataset split"
    );

    Ok(Split { train, validation, test })
}
