//! Engine tuning knobs.

use serde::{Deserialize, Serialize};

/// Hard cap on the working set the engine will cluster, in samples.
pub const DEFAULT_SAMPLE_CAP: usize = 50_000;

/// In-flight starts (active plus queued) before `submit` rejects with `Busy`.
pub const DEFAULT_QUEUE_DEPTH: usize = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Populations larger than this are subsampled down to exactly this
    /// many samples before clustering.
    pub sample_cap: usize,
    /// Depth of the inbound command queue. A slot stays held until its run
    /// completes, so depth 1 rejects a second start while one is active;
    /// larger depths queue starts in order.
    pub queue_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_cap: DEFAULT_SAMPLE_CAP,
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}
