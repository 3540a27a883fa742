//! Task/channel worker wrapping the clustering loop.
//!
//! [`spawn`] starts one long-lived task owning a bounded command queue.
//! An accepted start occupies a submission slot until its run finishes,
//! so the default depth of one rejects a second start while a run is
//! active instead of queueing it behind the active one. Each run executes
//! on the blocking pool, streaming events back through an unbounded
//! sender: sends are fire-and-forget, so a slow consumer never stalls the
//! loop. Dropping the handle closes the queue and ends the task after any
//! in-flight run.

pub mod protocol;

#[cfg(test)]
mod tests;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, info, warn};

use crate::cluster::{ClusterRequest, Phase, Run};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::worker::protocol::{CancelNotice, Command, EngineEvent};

/// Receiving side of the event stream.
pub type EventStream = mpsc::UnboundedReceiver<EngineEvent>;

/// Cloneable caller-side handle: submit runs, cancel the active one.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<(Command, OwnedSemaphorePermit)>,
    config: EngineConfig,
    cancel: Arc<AtomicBool>,
    slots: Arc<Semaphore>,
}

impl EngineHandle {
    /// Validates and enqueues a start command.
    ///
    /// Validation happens here, synchronously: a rejected request returns
    /// the argument error and emits nothing on the event stream. Admission
    /// is slot-gated: an accepted start holds one slot until its run
    /// finishes, so [`EngineError::Busy`] covers a run that is still
    /// executing, not just one waiting in the queue.
    pub fn submit(&self, request: ClusterRequest) -> EngineResult<()> {
        request.validate(&self.config)?;
        let slot = self
            .slots
            .clone()
            .try_acquire_owned()
            .map_err(|_| EngineError::Busy)?;
        self.commands
            .try_send((Command::Start(request), slot))
            .map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => EngineError::Busy,
                mpsc::error::TrySendError::Closed(_) => EngineError::WorkerGone,
            })
    }

    /// Flags the active run to stop at the next iteration boundary, where
    /// it emits a terminal `cancelled` record instead of completing. No-op
    /// when nothing is running; a run still waiting in the queue is not
    /// affected.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

/// Launches the engine worker on the current Tokio runtime. Returns the
/// caller handle plus the event stream; drop the handle to shut the worker
/// down once it drains.
pub fn spawn(config: EngineConfig) -> (EngineHandle, EventStream) {
    let depth = config.queue_depth.max(1);
    let (cmd_tx, cmd_rx) = mpsc::channel(depth);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let cancel = Arc::new(AtomicBool::new(false));

    let handle = EngineHandle {
        commands: cmd_tx,
        config: config.clone(),
        cancel: cancel.clone(),
        slots: Arc::new(Semaphore::new(depth)),
    };
    tokio::spawn(worker_loop(config, cmd_rx, event_tx, cancel));

    (handle, event_rx)
}

async fn worker_loop(
    config: EngineConfig,
    mut commands: mpsc::Receiver<(Command, OwnedSemaphorePermit)>,
    events: mpsc::UnboundedSender<EngineEvent>,
    cancel: Arc<AtomicBool>,
) {
    while let Some((Command::Start(request), slot)) = commands.recv().await {
        // a cancel aimed at an earlier run must not kill this one
        cancel.store(false, Ordering::Relaxed);

        let run_config = config.clone();
        let run_events = events.clone();
        let run_cancel = cancel.clone();
        let outcome =
            tokio::task::spawn_blocking(move || execute(request, &run_config, &run_events, &run_cancel))
                .await;
        // the submission slot stays occupied for the whole run
        drop(slot);
        if let Err(err) = outcome {
            error!(error = %err, "clustering task failed");
        }
        if events.is_closed() {
            debug!("event stream dropped, worker shutting down");
            break;
        }
    }
    info!("engine worker stopped");
}

/// Synchronous run driver: step, emit, check the cancel flag, repeat.
fn execute(
    request: ClusterRequest,
    config: &EngineConfig,
    events: &mpsc::UnboundedSender<EngineEvent>,
    cancel: &AtomicBool,
) {
    let mut run = match Run::new(request, config) {
        Ok(run) => run,
        Err(err) => {
            // submit() validated already; reaching this means handle and
            // worker disagree on config
            error!(error = %err, "start command failed validation");
            return;
        }
    };

    loop {
        let phase = run.step();
        let _ = events.send(EngineEvent::Progress(run.progress()));
        if phase != Phase::Running {
            break;
        }
        if cancel.load(Ordering::Relaxed) {
            warn!(iteration = run.iteration(), "run cancelled");
            let _ = events.send(EngineEvent::Cancelled(CancelNotice {
                current_iteration: run.iteration(),
            }));
            return;
        }
    }

    let _ = events.send(EngineEvent::Complete(run.completion()));
}
