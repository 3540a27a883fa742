//! Nearest-centroid assignment.

use crate::cluster::state::{distance_sq, Centroids, SampleSet};

/// Assigns every sample to its nearest centroid, in place.
///
/// Ascending scan with a strict `<` comparison, so equidistant centroids
/// resolve to the lowest index. Returns whether any sample switched
/// clusters relative to the previous contents of `assignments`, folded
/// into a single boolean as the scan goes (no second pass over the
/// buffers).
pub fn assign(samples: &SampleSet, centroids: &Centroids, assignments: &mut [u32]) -> bool {
    let k = centroids.k();
    let mut changed = false;

    for (i, slot) in assignments.iter_mut().enumerate() {
        let sample = samples.get(i);
        let mut best = 0u32;
        let mut best_d = f32::INFINITY;
        for c in 0..k {
            let d = distance_sq(sample, centroids.get(c));
            if d < best_d {
                best_d = d;
                best = c as u32;
            }
        }
        if *slot != best {
            *slot = best;
            changed = true;
        }
    }

    changed
}
