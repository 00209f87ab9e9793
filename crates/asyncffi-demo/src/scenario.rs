//! Parallel and sequential greeting batches

use asyncffi::prelude::*;
use rand::Rng;
use std::time::{Duration, Instant};

/// Pair each name with its workload, drawn once so both batches do the same work
pub fn workloads(names: &[String], samples: Option<usize>) -> Vec<(String, usize)> {
    let mut rng = rand::rng();
    names
        .iter()
        .map(|name| {
            let samples = samples.unwrap_or_else(|| rng.random_range(1_000..1_000_000));
            (name.clone(), samples)
        })
        .collect()
}

/// Start every greeting before awaiting any of them
pub async fn run_parallel(
    bridge: &CompletionBridge,
    workloads: &[(String, usize)],
) -> BridgeResult<Duration> {
    let started = Instant::now();

    let handles: Vec<_> = workloads
        .iter()
        .enumerate()
        .map(|(run, (name, samples))| {
            let pending = bridge.call(name, Some(*samples));
            tokio::spawn(async move {
                let greeting = pending.await?;
                tracing::info!("##Run {}## {}", run + 1, greeting);
                Ok::<_, BridgeError>(())
            })
        })
        .collect();

    for handle in handles {
        handle
            .await
            .map_err(|e| BridgeError::Internal(format!("greeting task failed: {}", e)))??;
    }

    Ok(started.elapsed())
}

/// Await each greeting before starting the next
pub async fn run_sequential(
    bridge: &CompletionBridge,
    workloads: &[(String, usize)],
) -> BridgeResult<Duration> {
    let started = Instant::now();

    for (run, (name, samples)) in workloads.iter().enumerate() {
        let greeting = bridge.call(name, Some(*samples)).await?;
        tracing::info!("##Run {}## {}", run + 1, greeting);
    }

    Ok(started.elapsed())
}
