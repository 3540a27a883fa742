//! Demo driver: synthesizes a blob-structured RGB population, runs the
//! engine through the worker, streams progress to the log, and prints the
//! recovered palette as JSON.

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

use iris::cluster::EngineRng;
use iris::worker::{self, protocol::EngineEvent};
use iris::{ClusterRequest, Completion, EngineConfig};

struct DemoArgs {
    k: usize,
    max_iterations: usize,
    pixels: usize,
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = parse_args().context("usage: iris [k] [max-iterations] [pixels] [seed]")?;
    info!(
        k = args.k,
        max_iterations = args.max_iterations,
        pixels = args.pixels,
        seed = args.seed,
        "starting demo run"
    );

    let samples = synthesize_population(args.pixels, args.seed);
    let (engine, mut events) = worker::spawn(EngineConfig::default());
    engine.submit(ClusterRequest {
        samples,
        k: args.k,
        max_iterations: args.max_iterations,
        seed: args.seed,
    })?;

    while let Some(event) = events.recv().await {
        match event {
            EngineEvent::Progress(update) => {
                info!(
                    iteration = update.current_iteration,
                    progress = f64::from(update.progress),
                    "iteration"
                );
            }
            EngineEvent::Complete(done) => {
                info!(
                    iterations = done.current_iteration,
                    mse = done.mse,
                    psnr = done.psnr,
                    "run complete"
                );
                println!("{}", serde_json::to_string_pretty(&palette_json(&done))?);
                break;
            }
            EngineEvent::Cancelled(notice) => {
                info!(iteration = notice.current_iteration, "run cancelled");
                break;
            }
        }
    }

    Ok(())
}

fn parse_args() -> Result<DemoArgs> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    Ok(DemoArgs {
        k: parse_or(&args, 0, 16)?,
        max_iterations: parse_or(&args, 1, 20)?,
        pixels: parse_or(&args, 2, 120_000)?,
        seed: match args.get(3) {
            Some(raw) => Some(raw.parse::<u64>().with_context(|| format!("bad seed {raw:?}"))?),
            None => None,
        },
    })
}

fn parse_or(args: &[String], at: usize, default: usize) -> Result<usize> {
    match args.get(at) {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("bad numeric argument {raw:?}")),
        None => Ok(default),
    }
}

/// Population drawn around a handful of latent colors, so the recovered
/// palette has visible structure instead of uniform noise.
fn synthesize_population(pixels: usize, seed: Option<u64>) -> Vec<f32> {
    // offset keeps the population stream distinct from the engine's draws
    let mut rng = match seed {
        Some(seed) => EngineRng::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15),
        None => EngineRng::from_entropy(),
    };

    let blob_count = 8;
    let blobs: Vec<[f32; 3]> = (0..blob_count)
        .map(|_| {
            [
                rng.gen_range(0.0..=255.0),
                rng.gen_range(0.0..=255.0),
                rng.gen_range(0.0..=255.0),
            ]
        })
        .collect();

    let mut data = Vec::with_capacity(pixels * 3);
    for _ in 0..pixels {
        let blob = blobs[rng.gen_range(0..blob_count)];
        for channel in blob {
            data.push((channel + rng.gen_range(-12.0..12.0)).clamp(0.0, 255.0));
        }
    }
    data
}

fn palette_json(done: &Completion) -> serde_json::Value {
    let palette: Vec<[u8; 3]> = done
        .centroids
        .chunks_exact(3)
        .map(|c| [c[0].round() as u8, c[1].round() as u8, c[2].round() as u8])
        .collect();
    serde_json::json!({
        "palette": palette,
        "mse": done.mse,
        "psnr": if done.psnr.is_finite() {
            serde_json::json!(done.psnr)
        } else {
            serde_json::json!("inf")
        },
        "iterations": done.current_iteration,
    })
}
