//! Synthetic operation generation.

use loadcell_core::WorkloadMix;
use rand::Rng;

/// One operation against the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    /// Point lookup by key.
    Read { key: u64 },
    /// Additive update of a numeric field by a signed delta.
    Write { key: u64, delta: f64 },
}

/// Stateless generator deciding, per issued operation, whether it is a
/// read or a write and which key it targets. Safe to use from any
/// number of workers as long as each brings its own `Rng`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationGenerator {
    mix: WorkloadMix,
}

impl OperationGenerator {
    pub fn new(mix: WorkloadMix) -> Self {
        Self { mix }
    }

    /// Draw the next operation: a read with probability
    /// `mix.read_fraction`, key uniform in `[1, keyspace_size]`, write
    /// delta uniform in `[-100, 100)`.
    pub fn next(&self, rng: &mut impl Rng, keyspace_size: u64) -> Operation {
        let key = rng.gen_range(1..=keyspace_size.max(1));
        if rng.gen::<f64>() < self.mix.read_fraction {
            Operation::Read { key }
        } else {
            Operation::Write {
                key,
                delta: rng.gen_range(-100.0..100.0),
            }
        }
    }
}
