//! The clustering run: a steppable assign/update state machine.

use rand::SeedableRng;
use rand_xoshiro::Xoroshiro128PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::cluster::state::{Centroids, SampleSet, CHANNELS};
use crate::cluster::{assigner, metrics, sampler, seeder, updater};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

/// Deterministic generator threaded through sampling, seeding, and
/// empty-cluster recovery: one sequential stream per run.
pub type EngineRng = Xoroshiro128PlusPlus;

/// One clustering request, as carried by the start command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRequest {
    /// Flat channel triples, `3 x sampleCount` values in `[0, 255]`.
    pub samples: Vec<f32>,
    pub k: usize,
    pub max_iterations: usize,
    /// Omitted seed means entropy seeding: valid, but not reproducible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl ClusterRequest {
    /// Argument screening, run before any task is scheduled. Every check is
    /// O(1); `k` is checked against the working-set size the sampler will
    /// actually produce, `min(N, cap)`.
    pub fn validate(&self, config: &EngineConfig) -> EngineResult<()> {
        if self.samples.is_empty() {
            return Err(EngineError::EmptySamples);
        }
        if self.samples.len() % CHANNELS != 0 {
            return Err(EngineError::RaggedSamples(self.samples.len()));
        }
        if self.max_iterations < 1 {
            return Err(EngineError::InvalidIterationBudget(self.max_iterations));
        }
        let bounded = (self.samples.len() / CHANNELS).min(config.sample_cap);
        if self.k < 1 || self.k > bounded {
            return Err(EngineError::InvalidK {
                k: self.k,
                max: bounded,
            });
        }
        Ok(())
    }
}

/// Where the iteration loop currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Assignments are still moving and budget remains.
    Running,
    /// No assignment changed between consecutive iterations; early exit.
    Converged,
    /// The iteration budget ran out before the assignments settled.
    Exhausted,
}

/// Per-iteration snapshot, one per completed iteration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    /// Flat `3 x k` centroid buffer, after this iteration's update pass.
    pub centroids: Vec<f32>,
    pub assignments: Vec<u32>,
    /// Literal `iteration / max_iterations`; stays below 1.0 when the run
    /// converges before exhausting its budget.
    pub progress: f32,
    pub current_iteration: usize,
}

/// Terminal snapshot with reconstruction scores.
///
/// `psnr` is `f64::INFINITY` for an exact reconstruction; serde_json
/// renders that sentinel as `null`, which consumers must read as "exact".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub centroids: Vec<f32>,
    pub assignments: Vec<u32>,
    pub mse: f64,
    pub current_iteration: usize,
    pub psnr: f64,
}

/// A single clustering run, stepped one iteration at a time so callers can
/// report progress between steps.
///
/// Construction subsamples and seeds; each [`step`](Run::step) is one
/// assignment pass plus one update pass. State is exclusive to the run and
/// dropped with it.
pub struct Run {
    samples: SampleSet,
    centroids: Centroids,
    assignments: Vec<u32>,
    iteration: usize,
    max_iterations: usize,
    phase: Phase,
    rng: EngineRng,
}

impl Run {
    /// Validates, bounds the population, and seeds the initial centroids.
    #[instrument(skip_all)]
    pub fn new(request: ClusterRequest, config: &EngineConfig) -> EngineResult<Self> {
        request.validate(config)?;
        let ClusterRequest {
            samples,
            k,
            max_iterations,
            seed,
        } = request;

        let mut rng = match seed {
            Some(seed) => EngineRng::seed_from_u64(seed),
            None => EngineRng::from_entropy(),
        };

        let raw = SampleSet::from_flat(samples)?;
        let raw_count = raw.count();
        let working = sampler::subsample(raw, config.sample_cap, &mut rng);
        let centroids = seeder::kmeans_plus_plus(&working, k, &mut rng);

        info!(
            k,
            max_iterations,
            raw_count,
            working = working.count(),
            seeded = seed.is_some(),
            "clustering run initialized"
        );

        Ok(Self {
            assignments: vec![0; working.count()],
            samples: working,
            centroids,
            iteration: 0,
            max_iterations,
            phase: Phase::Running,
            rng,
        })
    }

    /// One full iteration: assignment pass, update pass, phase transition.
    ///
    /// The first pass measures "changed" against the zero-initialized
    /// assignment buffer, so a run whose first pass assigns everything to
    /// cluster 0 converges immediately. Stepping a terminal run is a no-op.
    pub fn step(&mut self) -> Phase {
        if self.phase != Phase::Running {
            return self.phase;
        }

        self.iteration += 1;
        let changed = assigner::assign(&self.samples, &self.centroids, &mut self.assignments);
        updater::update(&self.samples, &self.assignments, &mut self.centroids, &mut self.rng);

        self.phase = if !changed {
            Phase::Converged
        } else if self.iteration >= self.max_iterations {
            Phase::Exhausted
        } else {
            Phase::Running
        };
        debug!(
            iteration = self.iteration,
            changed,
            phase = ?self.phase,
            "iteration complete"
        );
        self.phase
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Iterations completed so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Snapshot for the per-iteration progress record: the post-update
    /// centroids paired with the assignments computed just before that
    /// update, exactly as the loop produced them.
    pub fn progress(&self) -> ProgressUpdate {
        ProgressUpdate {
            centroids: self.centroids.to_vec(),
            assignments: self.assignments.clone(),
            progress: self.iteration as f32 / self.max_iterations as f32,
            current_iteration: self.iteration,
        }
    }

    /// Terminal record with reconstruction scores. Read-only with respect
    /// to the run state; meaningful once the phase is no longer `Running`.
    pub fn completion(&self) -> Completion {
        let quality =
            metrics::reconstruction_quality(&self.samples, &self.centroids, &self.assignments);
        info!(
            iterations = self.iteration,
            mse = quality.mse,
            psnr = quality.psnr,
            "clustering run complete"
        );
        Completion {
            centroids: self.centroids.to_vec(),
            assignments: self.assignments.clone(),
            mse: quality.mse,
            current_iteration: self.iteration,
            psnr: quality.psnr,
        }
    }

    /// Drives the loop to its terminal phase, collecting every progress
    /// record along the way. Worker-free entry point for synchronous
    /// callers.
    pub fn collect(mut self) -> (Vec<ProgressUpdate>, Completion) {
        let mut updates = Vec::new();
        loop {
            let phase = self.step();
            updates.push(self.progress());
            if phase != Phase::Running {
                break;
            }
        }
        let completion = self.completion();
        (updates, completion)
    }
}
