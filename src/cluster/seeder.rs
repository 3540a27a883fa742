//! k-means++ centroid initialization.

use rand::Rng;

use crate::cluster::state::{distance_sq, Centroids, SampleSet};

/// Seeds `k` centroids from the working set.
///
/// The first pick is uniform; each later pick is weighted by the sample's
/// distance to its nearest already-chosen centroid. The weight is the plain
/// Euclidean distance, not the squared form the textbook scheme uses, which
/// softens the pull toward far-out samples; that is the behavior this
/// engine ships with and downstream results depend on it.
///
/// Selection indices never repeat: a chosen sample's weight collapses to
/// zero, and the degenerate case (total weight zero, or a draw landing on a
/// zero-weight boundary) falls back to a uniform pick over the indices not
/// yet chosen, so the loop always makes forward progress.
pub fn kmeans_plus_plus<R: Rng>(samples: &SampleSet, k: usize, rng: &mut R) -> Centroids {
    let m = samples.count();
    let mut centroids = Centroids::with_capacity(k);
    let mut chosen = vec![false; m];

    // first centroid: uniform over the working set
    let first = rng.gen_range(0..m);
    chosen[first] = true;
    centroids.push(samples.get(first));

    // per-sample distance to the nearest chosen centroid
    let mut dist = vec![f32::INFINITY; m];

    for next in 1..k {
        // fold the newest centroid into the running minima
        let latest = centroids.get(next - 1);
        for (i, slot) in dist.iter_mut().enumerate() {
            let d = distance_sq(samples.get(i), latest).sqrt();
            if d < *slot {
                *slot = d;
            }
        }

        // cumulative-distribution draw over the distance mass
        let total: f64 = dist.iter().map(|&d| d as f64).sum();
        let pick = if total > 0.0 {
            weighted_pick(&dist, total, rng).filter(|&i| !chosen[i])
        } else {
            None
        };
        let pick = match pick {
            Some(i) => i,
            None => uniform_unchosen(&chosen, rng),
        };

        chosen[pick] = true;
        centroids.push(samples.get(pick));
    }

    centroids
}

/// First index whose cumulative weight meets a uniform draw in `[0, total)`.
///
/// Summation order matches the `total` computation, so the walk always
/// terminates inside the slice; `None` is reachable only through a
/// zero-weight boundary artifact and routes to the uniform fallback.
fn weighted_pick<R: Rng>(dist: &[f32], total: f64, rng: &mut R) -> Option<usize> {
    let draw = rng.gen_range(0.0..total);
    let mut cum = 0.0f64;
    for (i, &d) in dist.iter().enumerate() {
        cum += d as f64;
        if cum >= draw {
            return Some(i);
        }
    }
    None
}

/// Uniform pick among indices not yet selected. The seeding loop draws at
/// most `k - 1 < m` times, so at least one index is always open.
fn uniform_unchosen<R: Rng>(chosen: &[bool], rng: &mut R) -> usize {
    let open: Vec<usize> = (0..chosen.len()).filter(|&i| !chosen[i]).collect();
    open[rng.gen_range(0..open.len())]
}
