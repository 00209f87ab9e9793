//! The greeting workload
//!
//! A greeting is deliberately CPU-bound: it estimates pi by Monte Carlo
//! sampling on the blocking pool, then reports where the work ran. The sample
//! count controls how long a call takes, which lets callers observe that
//! completions arrive out of submission order.

use asyncffi_core::{BridgeError, BridgeResult};
use rand::Rng;
use std::ops::Range;

/// Sample count range used when the caller passes zero
pub const RANDOM_SAMPLES: Range<usize> = 1_000..1_000_000;

/// Pick the sample count for a call; zero means "choose one at random"
pub fn resolve_samples(samples: usize) -> usize {
    if samples == 0 {
        rand::rng().random_range(RANDOM_SAMPLES)
    } else {
        samples
    }
}

/// Estimate pi from `samples` random points in the unit square
pub fn estimate_pi(samples: usize) -> f64 {
    if samples == 0 {
        return 0.0;
    }

    let mut rng = rand::rng();
    let inside = (0..samples)
        .filter(|_| {
            let x: f64 = rng.random();
            let y: f64 = rng.random();
            x * x + y * y <= 1.0
        })
        .count();

    4.0 * inside as f64 / samples as f64
}

/// Greet `who` after running the workload
///
/// Must run inside a Tokio runtime. The text has the shape
/// `[thread=..][task=..][samples=..][pi=..] Hello, {who}!`.
pub async fn say_hello(who: String, samples: usize) -> BridgeResult<String> {
    let samples = resolve_samples(samples);

    let (thread, pi) = tokio::task::spawn_blocking(move || {
        let thread = format!("{:?}", std::thread::current().id());
        (thread, estimate_pi(samples))
    })
    .await
    .map_err(|e| BridgeError::Internal(format!("greeting workload failed: {}", e)))?;

    let task = tokio::task::try_id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "none".to_string());

    tracing::debug!(who = %who, samples, "greeting computed");

    Ok(format!(
        "[thread={}][task={}][samples={}][pi={:.5}] Hello, {}!",
        thread, task, samples, pi, who
    ))
}
