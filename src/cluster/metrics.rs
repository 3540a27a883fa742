//! Reconstruction-quality scoring for the terminal state.

use crate::cluster::state::{Centroids, SampleSet, CHANNELS};

/// Peak channel amplitude for PSNR.
const PEAK: f64 = 255.0;

/// Terminal reconstruction scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality {
    pub mse: f64,
    pub psnr: f64,
}

/// Mean squared error per channel slot, with the matching PSNR.
///
/// Error accumulates in `f64` over every channel of every sample against
/// its assigned centroid. `psnr` is `f64::INFINITY` when the
/// reconstruction is exact (`mse == 0`).
pub fn reconstruction_quality(
    samples: &SampleSet,
    centroids: &Centroids,
    assignments: &[u32],
) -> Quality {
    let mut sum_sq = 0.0f64;
    for (i, &id) in assignments.iter().enumerate() {
        let sample = samples.get(i);
        let centroid = centroids.get(id as usize);
        for c in 0..CHANNELS {
            let diff = sample[c] as f64 - centroid[c] as f64;
            sum_sq += diff * diff;
        }
    }

    let mse = sum_sq / (samples.count() * CHANNELS) as f64;
    let psnr = if mse == 0.0 {
        f64::INFINITY
    } else {
        20.0 * PEAK.log10() - 10.0 * mse.log10()
    };

    Quality { mse, psnr }
}
