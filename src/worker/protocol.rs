//! Wire envelopes for the engine's message protocol.
//!
//! Transport-agnostic: the tagged `{type, payload}` JSON shape is the
//! contract, whatever carries it. Commands and events never share a
//! channel.

use serde::{Deserialize, Serialize};

use crate::cluster::{ClusterRequest, Completion, ProgressUpdate};

/// Caller to engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Command {
    Start(ClusterRequest),
}

/// Engine to caller. Progress records stream once per completed iteration;
/// exactly one terminal record (`Complete`, or `Cancelled` for an aborted
/// run) follows, after which the stream carries nothing further for that
/// run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum EngineEvent {
    Progress(ProgressUpdate),
    Complete(Completion),
    Cancelled(CancelNotice),
}

/// Payload of the terminal record for a cancelled run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CancelNotice {
    /// Iterations fully completed before the cancel flag was observed.
    pub current_iteration: usize,
}
