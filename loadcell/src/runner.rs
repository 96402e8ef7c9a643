//! The worker-pool run executor.
//!
//! One run drives a configurable read/write mix against a single
//! backend handle with N concurrent workers, in either count-bounded or
//! duration-bounded mode, and reduces the collected samples to
//! [`RunStats`]. Workers are fully independent while running: the only
//! shared mutable state is the one-shot stop flag (duration mode) and
//! the result buffer merged into once per worker.

use crate::backend::Backend;
use crate::generator::{Operation, OperationGenerator};
use crate::repeat::run_multiple;
use loadcell_core::{
    compute_stats, BenchParams, MultiRunConfig, OperationResult, RunStats, WorkloadMix,
    ERROR_SAMPLE_LIMIT,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
#[allow(unused_imports)]
use tracing::{debug, info, instrument, trace, warn};

/// Execute one workload run against `backend` and reduce the samples to
/// [`RunStats`] labelled `label`.
///
/// Mode is chosen from `params`: wall-clock bounded when
/// `run_duration` is set, otherwise count bounded. When
/// `run_repetitions` is above 1 the whole run is handed to
/// [`run_multiple`] with default cooldown and tolerance and the median
/// run is returned; call [`run_multiple`] directly to customize those.
#[instrument(skip(backend, params, mix))]
pub async fn run_workload<B: Backend>(
    backend: Arc<B>,
    params: &BenchParams,
    mix: WorkloadMix,
    label: &str,
) -> RunStats {
    let params = params.clone().normalized();
    if params.run_repetitions > 1 {
        let report = run_multiple(
            params.run_repetitions,
            MultiRunConfig::default(),
            label,
            |_| {
                let backend = backend.clone();
                let params = params.clone();
                async move { run_once(backend, &params, mix, label).await }
            },
        )
        .await;
        return report.stats;
    }
    run_once(backend, &params, mix, label).await
}

async fn run_once<B: Backend>(
    backend: Arc<B>,
    params: &BenchParams,
    mix: WorkloadMix,
    label: &str,
) -> RunStats {
    let (results, duration) = run_raw(backend, params, mix).await;
    surface_errors(&results);
    compute_stats(label, &results, duration)
}

/// Raw form of [`run_workload`]: the concatenated samples plus the
/// measured wall-clock duration (last worker completion minus timed
/// start). The fan-out orchestrator uses this to aggregate several
/// tenants under one clock.
pub async fn run_raw<B: Backend>(
    backend: Arc<B>,
    params: &BenchParams,
    mix: WorkloadMix,
) -> (Vec<OperationResult>, Duration) {
    let params = params.clone().normalized();
    let generator = OperationGenerator::new(mix);

    warmup(&backend, &params, generator).await;

    let start = Instant::now();
    let results = match params.run_duration.filter(|d| !d.is_zero()) {
        Some(duration) => run_timed(backend, &params, generator, duration).await,
        None => run_counted(backend, &params, generator).await,
    };
    (results, start.elapsed())
}

/// Issue `warmup_count` operations sequentially before the timed window
/// opens. Results are discarded and failures ignored; this exists only
/// to avoid cold-cache skew.
async fn warmup<B: Backend>(backend: &Arc<B>, params: &BenchParams, generator: OperationGenerator) {
    if params.warmup_count == 0 {
        return;
    }
    debug!(count = params.warmup_count, "warming up");
    let mut rng = SmallRng::from_entropy();
    for _ in 0..params.warmup_count {
        let op = generator.next(&mut rng, params.keyspace_size);
        let _ = issue(backend.as_ref(), op).await;
    }
}

/// Count-bounded mode: `operation_count` is floor-divided across
/// workers (the remainder is dropped, see
/// [`BenchParams::ops_per_worker`]); each worker issues its fixed share
/// sequentially into a private buffer. Buffers are concatenated in
/// dispatch order, so sample layout is deterministic by worker
/// assignment, not completion order.
async fn run_counted<B: Backend>(
    backend: Arc<B>,
    params: &BenchParams,
    generator: OperationGenerator,
) -> Vec<OperationResult> {
    let per_worker = params.ops_per_worker();
    debug!(
        workers = params.concurrency,
        per_worker, "dispatching count-bounded run"
    );

    let mut handles = Vec::with_capacity(params.concurrency);
    for _ in 0..params.concurrency {
        let backend = backend.clone();
        let keyspace = params.keyspace_size;
        handles.push(tokio::spawn(async move {
            let mut rng = SmallRng::from_entropy();
            let mut local = Vec::with_capacity(per_worker);
            for _ in 0..per_worker {
                let op = generator.next(&mut rng, keyspace);
                local.push(issue(backend.as_ref(), op).await);
            }
            local
        }));
    }

    let mut results = Vec::with_capacity(per_worker * params.concurrency);
    for handle in handles {
        match handle.await {
            Ok(local) => results.extend(local),
            Err(e) => warn!("worker panicked: {e}"),
        }
    }
    results
}

/// Duration-bounded mode: workers loop until a shared stop flag is set
/// by a timer task. The flag is flipped exactly once; workers poll it
/// per iteration, so in-flight operations complete. Each worker merges
/// its private buffer into the shared collection under the mutex once,
/// at loop exit.
async fn run_timed<B: Backend>(
    backend: Arc<B>,
    params: &BenchParams,
    generator: OperationGenerator,
    duration: Duration,
) -> Vec<OperationResult> {
    debug!(
        workers = params.concurrency,
        ?duration,
        "dispatching duration-bounded run"
    );

    let stopped = Arc::new(AtomicBool::new(false));
    let results: Arc<Mutex<Vec<OperationResult>>> = Arc::new(Mutex::new(Vec::new()));

    {
        let stopped = stopped.clone();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            stopped.store(true, Ordering::Relaxed);
        });
    }

    let mut handles = Vec::with_capacity(params.concurrency);
    for _ in 0..params.concurrency {
        let backend = backend.clone();
        let stopped = stopped.clone();
        let results = results.clone();
        let keyspace = params.keyspace_size;
        handles.push(tokio::spawn(async move {
            let mut rng = SmallRng::from_entropy();
            let mut local = Vec::new();
            while !stopped.load(Ordering::Relaxed) {
                let op = generator.next(&mut rng, keyspace);
                local.push(issue(backend.as_ref(), op).await);
            }
            results.lock().await.extend(local);
        }));
    }

    for handle in handles {
        if let Err(e) = handle.await {
            warn!("worker panicked: {e}");
        }
    }

    match Arc::try_unwrap(results) {
        Ok(mutex) => mutex.into_inner(),
        // Unreachable once all workers are joined, but don't panic over it.
        Err(shared) => shared.lock().await.drain(..).collect(),
    }
}

/// Issue one operation and record the outcome. A failed operation is a
/// data point, not a retryable event; the executor never retries.
pub(crate) async fn issue<B: Backend>(backend: &B, op: Operation) -> OperationResult {
    let at = Instant::now();
    let outcome = match op {
        Operation::Read { key } => backend.point_read(key).await.map(|_| ()),
        Operation::Write { key, delta } => backend.point_update(key, delta).await,
    };
    let latency = at.elapsed();
    match outcome {
        Ok(()) => OperationResult::ok(at, latency),
        Err(e) => OperationResult::err(at, latency, e),
    }
}

/// Log at most the first [`ERROR_SAMPLE_LIMIT`] operation errors; the
/// rest are only counted.
fn surface_errors(results: &[OperationResult]) {
    for r in results
        .iter()
        .filter(|r| r.is_err())
        .take(ERROR_SAMPLE_LIMIT)
    {
        warn!(error = r.error.as_deref().unwrap_or("?"), "operation failed");
    }
}
