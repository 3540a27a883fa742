//! Working-set bounding: uniform subsampling without replacement.

use rand::Rng;

use crate::cluster::state::{SampleSet, CHANNELS};

/// Bounds `raw` to at most `cap` samples.
///
/// Populations at or under the cap pass through untouched and consume no
/// randomness. Larger populations are cut to exactly `cap` samples chosen
/// uniformly without replacement by a partial Fisher-Yates shuffle over an
/// index array, which terminates in `cap` swaps regardless of how the
/// population is distributed. The output order is the shuffle order:
/// arbitrary, but fully reproducible under a fixed seed.
pub fn subsample<R: Rng>(raw: SampleSet, cap: usize, rng: &mut R) -> SampleSet {
    let n = raw.count();
    if n <= cap {
        return raw;
    }

    let mut indices: Vec<usize> = (0..n).collect();
    for slot in 0..cap {
        let pick = rng.gen_range(slot..n);
        indices.swap(slot, pick);
    }

    let mut data = Vec::with_capacity(cap * CHANNELS);
    for &i in &indices[..cap] {
        data.extend_from_slice(&raw.get(i));
    }
    SampleSet::from_triples(data)
}
