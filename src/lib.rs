//! iris: a color-quantization clustering engine.
//!
//! Partitions flat RGB sample buffers into `k` clusters with k-means
//! (k-means++ seeding), streaming per-iteration progress over an async
//! channel and scoring the final reconstruction with MSE/PSNR. Runs are
//! deterministic under a caller-supplied seed.
//!
//! Two ways in:
//! - [`cluster::Run`]: the synchronous loop, stepped by the caller.
//! - [`worker::spawn`]: a Tokio task speaking the start/progress/complete
//!   message protocol over channels.
//!
//! ```no_run
//! use iris::{ClusterRequest, EngineConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (engine, mut events) = iris::worker::spawn(EngineConfig::default());
//! engine
//!     .submit(ClusterRequest {
//!         samples: vec![0.0, 0.0, 0.0, 255.0, 255.0, 255.0],
//!         k: 2,
//!         max_iterations: 20,
//!         seed: Some(42),
//!     })
//!     .unwrap();
//! while let Some(event) = events.recv().await {
//!     println!("{}", serde_json::to_string(&event).unwrap());
//! }
//! # }
//! ```

pub mod cluster;
pub mod config;
pub mod error;
pub mod worker;

pub use cluster::{ClusterRequest, Completion, Phase, ProgressUpdate, Run};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use worker::protocol::{Command, EngineEvent};
pub use worker::{EngineHandle, EventStream};
