//! The color-quantization clustering engine.
//!
//! Pipeline: bound the population (sampler), pick k initial centroids
//! (seeder), then iterate assignment and update passes until the
//! assignment vector stabilizes or the iteration budget runs out. Each
//! stage is a standalone function over flat sample/centroid buffers;
//! [`Run`] wires them into a steppable loop and the `worker` module puts
//! that loop behind channels.

pub mod assigner;
pub mod metrics;
pub mod run;
pub mod sampler;
pub mod seeder;
pub mod state;
pub mod updater;


pub use run::{ClusterRequest, Completion, EngineRng, Phase, ProgressUpdate, Run};
pub use state::{Centroids, SampleSet, CHANNELS};
