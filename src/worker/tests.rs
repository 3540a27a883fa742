//! Channel-semantics tests for the engine worker.

use std::time::Duration;

use rand::Rng;
use rand::SeedableRng;
use tokio::time::timeout;

use crate::cluster::{ClusterRequest, EngineRng};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::worker::protocol::{CancelNotice, Command, EngineEvent};
use crate::worker::{spawn, EventStream};

fn flat(points: &[[f32; 3]]) -> Vec<f32> {
    points.iter().flat_map(|p| p.iter().copied()).collect()
}

fn four_point_request(seed: u64) -> ClusterRequest {
    ClusterRequest {
        samples: flat(&[
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0],
            [100.0, 100.0, 100.0],
            [100.0, 100.0, 100.0],
        ]),
        k: 2,
        max_iterations: 10,
        seed: Some(seed),
    }
}

/// Uniform noise: converges slowly, so cancellation has room to land.
fn noisy_request(count: usize, k: usize, seed: u64) -> ClusterRequest {
    let mut rng = EngineRng::seed_from_u64(seed ^ 0xABCD);
    ClusterRequest {
        samples: (0..count * 3).map(|_| rng.gen_range(0.0f32..=255.0)).collect(),
        k,
        max_iterations: 100_000,
        seed: Some(seed),
    }
}

/// Receives until the run's terminal record (inclusive).
async fn drain_run(events: &mut EventStream) -> Vec<EngineEvent> {
    let mut seen = Vec::new();
    while let Some(event) = events.recv().await {
        let terminal = matches!(
            event,
            EngineEvent::Complete(_) | EngineEvent::Cancelled(_)
        );
        seen.push(event);
        if terminal {
            break;
        }
    }
    seen
}

#[tokio::test]
async fn run_streams_progress_then_exactly_one_completion() {
    let (engine, mut events) = spawn(EngineConfig::default());
    engine.submit(four_point_request(7)).unwrap();

    let seen = drain_run(&mut events).await;
    assert!(seen.len() >= 2);

    let (terminal, body) = seen.split_last().unwrap();
    for event in body {
        assert!(matches!(event, EngineEvent::Progress(_)));
    }
    let done = match terminal {
        EngineEvent::Complete(done) => done,
        other => panic!("expected completion, got {other:?}"),
    };

    // the completion snapshot matches the last progress record
    let last = match body.last().unwrap() {
        EngineEvent::Progress(update) => update,
        other => panic!("expected progress, got {other:?}"),
    };
    assert_eq!(done.current_iteration, last.current_iteration);
    assert_eq!(done.assignments, last.assignments);

    // nothing follows the terminal record for this run
    assert!(timeout(Duration::from_millis(50), events.recv()).await.is_err());
}

#[tokio::test]
async fn rejected_requests_emit_nothing() {
    let (engine, mut events) = spawn(EngineConfig::default());

    let mut bad = four_point_request(1);
    bad.k = 5;
    let err = engine.submit(bad).unwrap_err();
    assert_eq!(err, EngineError::InvalidK { k: 5, max: 4 });

    let err = engine
        .submit(ClusterRequest {
            samples: vec![],
            k: 1,
            max_iterations: 5,
            seed: None,
        })
        .unwrap_err();
    assert_eq!(err, EngineError::EmptySamples);

    assert!(timeout(Duration::from_millis(50), events.recv()).await.is_err());
}

#[tokio::test]
async fn second_start_while_active_is_rejected() {
    // the first start holds the only submission slot from the moment it
    // is accepted
    let (engine, mut events) = spawn(EngineConfig::default());
    engine.submit(four_point_request(3)).unwrap();
    let err = engine.submit(four_point_request(4)).unwrap_err();
    assert_eq!(err, EngineError::Busy);

    // the queued run is unaffected by the rejection
    let seen = drain_run(&mut events).await;
    assert!(matches!(seen.last(), Some(EngineEvent::Complete(_))));
}

#[tokio::test]
async fn submit_stays_rejected_while_the_run_is_executing() {
    let (engine, mut events) = spawn(EngineConfig::default());
    engine.submit(noisy_request(50_000, 64, 2)).unwrap();

    // the first progress record means the command has left the queue and
    // the run is executing; the slot must still be occupied
    match events.recv().await {
        Some(EngineEvent::Progress(update)) => assert_eq!(update.current_iteration, 1),
        other => panic!("expected first progress, got {other:?}"),
    }
    let err = engine.submit(four_point_request(8)).unwrap_err();
    assert_eq!(err, EngineError::Busy);

    engine.cancel();
    let seen = drain_run(&mut events).await;
    assert!(matches!(seen.last(), Some(EngineEvent::Cancelled(_))));

    // the slot frees once the worker retires the cancelled run
    let mut accepted = false;
    for _ in 0..200 {
        match engine.submit(four_point_request(9)) {
            Ok(()) => {
                accepted = true;
                break;
            }
            Err(EngineError::Busy) => tokio::time::sleep(Duration::from_millis(5)).await,
            Err(other) => panic!("unexpected submit error {other:?}"),
        }
    }
    assert!(accepted);
    let seen = drain_run(&mut events).await;
    assert!(matches!(seen.last(), Some(EngineEvent::Complete(_))));
}

#[tokio::test]
async fn cancel_interrupts_a_long_run() {
    let (engine, mut events) = spawn(EngineConfig::default());
    engine.submit(noisy_request(50_000, 64, 1)).unwrap();

    // let the run get going, then pull the plug
    match events.recv().await {
        Some(EngineEvent::Progress(update)) => assert_eq!(update.current_iteration, 1),
        other => panic!("expected first progress, got {other:?}"),
    }
    engine.cancel();

    let seen = drain_run(&mut events).await;
    let notice = match seen.last() {
        Some(EngineEvent::Cancelled(notice)) => notice,
        other => panic!("expected cancellation, got {other:?}"),
    };
    assert!(notice.current_iteration >= 1);
    assert!(seen.iter().all(|e| !matches!(e, EngineEvent::Complete(_))));
    assert!(timeout(Duration::from_millis(100), events.recv()).await.is_err());
}

#[tokio::test]
async fn worker_stops_once_the_event_stream_is_gone() {
    let (engine, events) = spawn(EngineConfig::default());
    drop(events);

    // first submit goes through; the worker notices the dead stream while
    // processing it and shuts down, after which submits report the loss
    engine.submit(four_point_request(5)).unwrap();

    let mut saw_gone = false;
    for _ in 0..200 {
        match engine.submit(four_point_request(6)) {
            Err(EngineError::WorkerGone) => {
                saw_gone = true;
                break;
            }
            _ => tokio::time::sleep(Duration::from_millis(5)).await,
        }
    }
    assert!(saw_gone);
}

#[test]
fn identical_seeds_are_identical_on_the_wire() {
    let run_once = || {
        tokio_test::block_on(async {
            let (engine, mut events) = spawn(EngineConfig::default());
            engine.submit(four_point_request(42)).unwrap();
            drain_run(&mut events)
                .await
                .iter()
                .map(|event| serde_json::to_string(event).unwrap())
                .collect::<Vec<_>>()
        })
    };
    assert_eq!(run_once(), run_once());
}

// ------------------------------------------------------------------
// Wire shape
// ------------------------------------------------------------------

#[test]
fn start_command_serializes_with_the_documented_envelope() {
    let cmd = Command::Start(ClusterRequest {
        samples: vec![0.0, 0.0, 0.0, 255.0, 255.0, 255.0],
        k: 2,
        max_iterations: 10,
        seed: Some(42),
    });
    assert_eq!(
        serde_json::to_value(&cmd).unwrap(),
        serde_json::json!({
            "type": "start",
            "payload": {
                "samples": [0.0, 0.0, 0.0, 255.0, 255.0, 255.0],
                "k": 2,
                "maxIterations": 10,
                "seed": 42,
            },
        })
    );

    // an omitted seed leaves the field off the wire entirely
    let cmd = Command::Start(ClusterRequest {
        samples: vec![0.0, 0.0, 0.0],
        k: 1,
        max_iterations: 1,
        seed: None,
    });
    let value = serde_json::to_value(&cmd).unwrap();
    assert!(value["payload"].get("seed").is_none());
}

#[test]
fn event_records_serialize_with_the_documented_envelopes() {
    let progress = EngineEvent::Progress(crate::cluster::ProgressUpdate {
        centroids: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        assignments: vec![0, 1],
        progress: 0.5,
        current_iteration: 5,
    });
    assert_eq!(
        serde_json::to_value(&progress).unwrap(),
        serde_json::json!({
            "type": "progress",
            "payload": {
                "centroids": [1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
                "assignments": [0, 1],
                "progress": 0.5,
                "currentIteration": 5,
            },
        })
    );

    let complete = EngineEvent::Complete(crate::cluster::Completion {
        centroids: vec![0.0, 0.0, 0.0],
        assignments: vec![0],
        mse: 12.5,
        current_iteration: 7,
        psnr: 37.25,
    });
    assert_eq!(
        serde_json::to_value(&complete).unwrap(),
        serde_json::json!({
            "type": "complete",
            "payload": {
                "centroids": [0.0, 0.0, 0.0],
                "assignments": [0],
                "mse": 12.5,
                "currentIteration": 7,
                "psnr": 37.25,
            },
        })
    );

    let cancelled = EngineEvent::Cancelled(CancelNotice { current_iteration: 3 });
    assert_eq!(
        serde_json::to_value(&cancelled).unwrap(),
        serde_json::json!({
            "type": "cancelled",
            "payload": { "currentIteration": 3 },
        })
    );
}

#[test]
fn start_command_round_trips_through_json() {
    let cmd = Command::Start(four_point_request(9));
    let wire = serde_json::to_string(&cmd).unwrap();
    let back: Command = serde_json::from_str(&wire).unwrap();
    assert_eq!(back, cmd);
}
