//! Flat-buffer sample and centroid storage.
//!
//! Samples and centroids live as contiguous `f32` triples, matching the
//! wire layout, so message snapshots are plain buffer clones.

use crate::error::{EngineError, EngineResult};

/// Channels per sample (RGB).
pub const CHANNELS: usize = 3;

/// Immutable working-set storage: `count()` RGB triples in one flat buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    data: Vec<f32>,
}

impl SampleSet {
    /// Wraps a flat channel buffer, rejecting ragged lengths.
    pub fn from_flat(data: Vec<f32>) -> EngineResult<Self> {
        if data.len() % CHANNELS != 0 {
            return Err(EngineError::RaggedSamples(data.len()));
        }
        Ok(Self { data })
    }

    /// Infallible wrap for buffers whose length is valid by construction.
    pub(crate) fn from_triples(data: Vec<f32>) -> Self {
        debug_assert!(data.len() % CHANNELS == 0);
        Self { data }
    }

    /// Number of samples (triples), not floats.
    pub fn count(&self) -> usize {
        self.data.len() / CHANNELS
    }

    /// The `i`-th RGB triple.
    #[inline(always)]
    pub fn get(&self, i: usize) -> [f32; CHANNELS] {
        let at = i * CHANNELS;
        [self.data[at], self.data[at + 1], self.data[at + 2]]
    }

    pub fn as_flat(&self) -> &[f32] {
        &self.data
    }
}

/// Mutable centroid storage: `k()` RGB triples in one flat buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Centroids {
    data: Vec<f32>,
}

impl Centroids {
    pub fn with_capacity(k: usize) -> Self {
        Self {
            data: Vec::with_capacity(k * CHANNELS),
        }
    }

    pub fn push(&mut self, centroid: [f32; CHANNELS]) {
        self.data.extend_from_slice(&centroid);
    }

    /// Number of centroids currently stored.
    pub fn k(&self) -> usize {
        self.data.len() / CHANNELS
    }

    #[inline(always)]
    pub fn get(&self, id: usize) -> [f32; CHANNELS] {
        let at = id * CHANNELS;
        [self.data[at], self.data[at + 1], self.data[at + 2]]
    }

    #[inline(always)]
    pub fn set(&mut self, id: usize, centroid: [f32; CHANNELS]) {
        self.data[id * CHANNELS..][..CHANNELS].copy_from_slice(&centroid);
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.data.clone()
    }
}

/// Squared Euclidean distance over the three channels.
#[inline(always)]
pub fn distance_sq(a: [f32; CHANNELS], b: [f32; CHANNELS]) -> f32 {
    let mut acc = 0.0;
    for c in 0..CHANNELS {
        let diff = a[c] - b[c];
        acc += diff * diff;
    }
    acc
}
