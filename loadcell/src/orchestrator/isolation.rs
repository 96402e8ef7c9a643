//! Noisy-neighbor (isolation) mode.

use super::connect_tenants;
use crate::backend::Connector;
use crate::error::Error;
use crate::generator::OperationGenerator;
use crate::runner::{issue, run_workload};
use loadcell_core::{BenchParams, ConnConfig, IsolationConfig, RunStats, WorkloadMix};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
#[allow(unused_imports)]
use tracing::{debug, info, instrument, warn};

/// Classification of the victim's relative p50 regression under noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationVerdict {
    /// Impact below the isolated threshold.
    Isolated,
    /// Noticeable but bounded interference.
    ModerateImpact,
    /// Co-located load clearly degrades the victim.
    NoisyNeighbor,
}

impl IsolationVerdict {
    fn classify(impact: f64, config: &IsolationConfig) -> Self {
        if impact < config.isolated_impact {
            Self::Isolated
        } else if impact < config.moderate_impact {
            Self::ModerateImpact
        } else {
            Self::NoisyNeighbor
        }
    }
}

/// Result of one isolation run.
#[derive(Debug, Clone)]
pub struct IsolationReport {
    /// Victim measured alone.
    pub baseline: RunStats,
    /// Victim measured with identical parameters while the noise
    /// tenants were hammered with writes.
    pub under_noise: RunStats,
    /// `(under_noise.p50 - baseline.p50) / baseline.p50`.
    pub impact: f64,
    pub verdict: IsolationVerdict,
    pub noise_tenants: usize,
    pub noise_workers_total: usize,
}

/// Measure one victim tenant before and during sustained background
/// write load against every noise tenant.
///
/// The victim is measured with a small fixed concurrency decoupled from
/// the noise tenant count, both alone and under noise, with identical
/// parameters. Noise workers share a one-shot stop flag and are all
/// joined before the comparison is computed.
#[instrument(skip_all, fields(victim, noise = noise_tenants.len()))]
pub async fn run_isolation<C: Connector>(
    connector: &C,
    base: &ConnConfig,
    victim: &str,
    noise_tenants: &[String],
    params: &BenchParams,
    config: IsolationConfig,
) -> Result<IsolationReport, Error> {
    let params = params.clone().normalized();

    let victim_name = victim.to_string();
    let victim_backend = connect_tenants(
        connector,
        base,
        std::slice::from_ref(&victim_name),
        params.keyspace_size,
    )
    .await?
    .pop()
    .expect("one tenant requested");

    let noise_backends =
        connect_tenants(connector, base, noise_tenants, params.keyspace_size).await?;

    let victim_params = BenchParams {
        concurrency: config.victim_concurrency,
        run_repetitions: 1,
        ..params.clone()
    }
    .normalized();

    info!("measuring victim alone");
    let baseline = run_workload(
        victim_backend.clone(),
        &victim_params,
        config.mix,
        "victim alone",
    )
    .await;

    let stop = Arc::new(AtomicBool::new(false));
    let generator = OperationGenerator::new(WorkloadMix::write_only());
    let keyspace = params.keyspace_size;

    let mut noise_handles = Vec::with_capacity(noise_backends.len() * config.noise_workers);
    for backend in &noise_backends {
        for _ in 0..config.noise_workers.max(1) {
            let backend = backend.clone();
            let stop = stop.clone();
            noise_handles.push(tokio::spawn(async move {
                let mut rng = SmallRng::from_entropy();
                while !stop.load(Ordering::Relaxed) {
                    let op = generator.next(&mut rng, keyspace);
                    // Noise samples are deliberately discarded; only
                    // their effect on the victim matters.
                    let _ = issue(backend.as_ref(), op).await;
                }
            }));
        }
    }
    let noise_workers_total = noise_handles.len();

    debug!(workers = noise_workers_total, ramp_up = ?config.ramp_up, "noise launched");
    tokio::time::sleep(config.ramp_up).await;

    info!(workers = noise_workers_total, "measuring victim under noise");
    let under_noise = run_workload(
        victim_backend,
        &victim_params,
        config.mix,
        "victim under noise",
    )
    .await;

    // One-shot stop plus an explicit join barrier: every noise worker
    // must observably finish before the comparison is reported.
    stop.store(true, Ordering::Relaxed);
    for handle in noise_handles {
        if let Err(e) = handle.await {
            warn!("noise worker panicked: {e}");
        }
    }

    let impact = if baseline.latency_p50.is_zero() {
        0.0
    } else {
        (under_noise.latency_p50.as_secs_f64() - baseline.latency_p50.as_secs_f64())
            / baseline.latency_p50.as_secs_f64()
    };
    let verdict = IsolationVerdict::classify(impact, &config);

    info!(
        baseline_p50 = ?baseline.latency_p50,
        noise_p50 = ?under_noise.latency_p50,
        impact = format_args!("{:+.1}%", impact * 100.0),
        ?verdict,
        "isolation"
    );

    Ok(IsolationReport {
        baseline,
        under_noise,
        impact,
        verdict,
        noise_tenants: noise_tenants.len(),
        noise_workers_total,
    })
}
