//! Centroid mean recomputation and empty-cluster recovery.

use rand::Rng;
use tracing::debug;

use crate::cluster::state::{Centroids, SampleSet, CHANNELS};

/// Recomputes every centroid as the per-channel mean of its samples.
///
/// Sums accumulate in `f64`, so a full working set assigned to one cluster
/// at peak channel value stays exact. A cluster that received no samples
/// this iteration is not left where it was: it is reseeded from a uniformly
/// random working-set sample, so dead clusters never survive into the next
/// iteration. The zero-count branch also means the mean division can never
/// see a zero denominator.
pub fn update<R: Rng>(
    samples: &SampleSet,
    assignments: &[u32],
    centroids: &mut Centroids,
    rng: &mut R,
) {
    let k = centroids.k();
    let mut sums = vec![[0.0f64; CHANNELS]; k];
    let mut counts = vec![0u32; k];

    for (i, &id) in assignments.iter().enumerate() {
        let sample = samples.get(i);
        let id = id as usize;
        counts[id] += 1;
        for c in 0..CHANNELS {
            sums[id][c] += sample[c] as f64;
        }
    }

    for id in 0..k {
        if counts[id] == 0 {
            let fallback = rng.gen_range(0..samples.count());
            centroids.set(id, samples.get(fallback));
            debug!(cluster = id, sample = fallback, "reseeded empty cluster");
            continue;
        }
        let inv = 1.0 / counts[id] as f64;
        let mut mean = [0.0f32; CHANNELS];
        for c in 0..CHANNELS {
            mean[c] = (sums[id][c] * inv) as f32;
        }
        centroids.set(id, mean);
    }
}
