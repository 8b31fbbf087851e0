//! Benchmark helpers for IndexGuard.

use indexguard_core::IndexUpdate;
use rand::Rng;

/// Generates a batch of `size` random additions.
pub fn random_batch(size: usize) -> Vec<IndexUpdate> {
    let mut rng = rand::thread_rng();
    (0..size)
        .map(|_| {
            let value: [u8; 8] = rng.gen();
            IndexUpdate::added(rng.gen_range(0..1_000_000), value)
        })
        .collect()
}
