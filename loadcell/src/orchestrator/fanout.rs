//! Fan-out (fairness) mode.

use super::connect_tenants;
use crate::backend::{Backend, Connector};
use crate::error::Error;
use crate::runner::run_raw;
use loadcell_core::{
    compute_stats, median_index, steady_state, BenchParams, ConnConfig, FanOutConfig,
    MultiRunConfig, RunStats, TenantRunStats,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
#[allow(unused_imports)]
use tracing::{debug, info, instrument, warn};

/// Classification of the slowest/fastest tenant p50 ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FairnessVerdict {
    /// All tenants within `fair_ratio` of each other.
    Fair,
    /// Some tenants noticeably slower.
    Moderate,
    /// Significant latency spread between tenants.
    Unfair,
}

impl FairnessVerdict {
    fn classify(ratio: f64, config: &FanOutConfig) -> Self {
        if ratio < config.fair_ratio {
            Self::Fair
        } else if ratio < config.moderate_ratio {
            Self::Moderate
        } else {
            Self::Unfair
        }
    }
}

/// Result of one fan-out run.
#[derive(Debug, Clone)]
pub struct FairnessReport {
    /// All tenants' samples merged under one clock.
    pub overall: RunStats,
    /// Per-tenant stats, ranked slowest-first by p50.
    pub tenants: Vec<TenantRunStats>,
    pub fastest_p50: Duration,
    pub median_p50: Duration,
    pub slowest_p50: Duration,
    /// Slowest tenant p50 / fastest tenant p50.
    pub ratio: f64,
    pub verdict: FairnessVerdict,
}

/// Run the executor against every tenant concurrently, splitting the
/// configured total concurrency and operation count evenly across them
/// (floored at one worker and a minimum operation share per tenant),
/// then rank the tenants by p50 latency.
///
/// When `run_repetitions` is above 1, the whole fan-out pass repeats
/// with a cooldown between passes and the median pass (by overall p50)
/// is reported, steady-state checked across the pass set. Per-tenant
/// runs inside a pass never self-repeat.
///
/// Connection or seeding failure for any tenant aborts the whole run.
#[instrument(skip_all, fields(tenants = tenant_names.len()))]
pub async fn run_fan_out<C: Connector>(
    connector: &C,
    base: &ConnConfig,
    tenant_names: &[String],
    params: &BenchParams,
    config: FanOutConfig,
) -> Result<FairnessReport, Error> {
    let params = params.clone().normalized();
    let backends = connect_tenants(connector, base, tenant_names, params.keyspace_size).await?;

    let mut per_tenant = params.per_tenant(tenant_names.len());
    // Warmup is a single-run concern; fan-out measures all tenants
    // under one shared clock.
    per_tenant.warmup_count = 0;

    info!(
        tenants = tenant_names.len(),
        per_tenant_workers = per_tenant.concurrency,
        per_tenant_ops = per_tenant.operation_count,
        timed = per_tenant.is_timed(),
        repetitions = params.run_repetitions,
        "fan-out starting"
    );

    let multi = MultiRunConfig::default();
    let mut passes = Vec::with_capacity(params.run_repetitions);
    for i in 0..params.run_repetitions {
        passes.push(fan_out_pass(&backends, tenant_names, &per_tenant, &config).await);
        if i < params.run_repetitions - 1 {
            debug!(cooldown = ?multi.cooldown, "cooling down");
            tokio::time::sleep(multi.cooldown).await;
        }
    }

    if passes.len() == 1 {
        return Ok(passes.pop().expect("one pass"));
    }

    let overalls: Vec<RunStats> = passes.iter().map(|p| p.overall.clone()).collect();
    let steady = steady_state(&overalls, multi.tolerance);
    if steady.steady {
        info!(
            max_deviation = format_args!("{:.1}%", steady.max_deviation * 100.0),
            "steady-state check passed"
        );
    } else {
        warn!(
            max_deviation = format_args!("{:.1}%", steady.max_deviation * 100.0),
            "steady-state check failed; results still reported as median"
        );
    }

    let mid = median_index(&overalls).expect("at least one pass");
    let mut report = passes.swap_remove(mid);
    report.overall.label = format!(
        "{} (median of {} runs)",
        report.overall.label, params.run_repetitions
    );
    Ok(report)
}

/// One fan-out measurement pass: every tenant driven concurrently under
/// a shared clock, reduced to a ranked [`FairnessReport`].
async fn fan_out_pass<B: Backend>(
    backends: &[Arc<B>],
    tenant_names: &[String],
    per_tenant: &BenchParams,
    config: &FanOutConfig,
) -> FairnessReport {
    let start = Instant::now();
    let mut handles = Vec::with_capacity(backends.len());
    for backend in backends {
        let backend = backend.clone();
        let p = per_tenant.clone();
        let mix = config.mix;
        handles.push(tokio::spawn(
            async move { run_raw(backend, &p, mix).await },
        ));
    }

    let mut collected = Vec::with_capacity(handles.len());
    for (name, handle) in tenant_names.iter().zip(handles) {
        match handle.await {
            Ok((results, _tenant_duration)) => collected.push((name.clone(), results)),
            Err(e) => warn!(tenant = %name, "tenant run panicked: {e}"),
        }
    }
    let total_duration = start.elapsed();

    // Per-tenant stats share the overall wall-clock duration so QPS
    // figures are comparable across tenants.
    let mut all = Vec::new();
    let mut tenants = Vec::with_capacity(collected.len());
    for (name, results) in collected {
        let stats = compute_stats(&name, &results, total_duration);
        all.extend_from_slice(&results);
        tenants.push(TenantRunStats {
            tenant: name,
            stats,
            results,
        });
    }

    let overall_label = format!(
        "fan-out ({} tenants, {} workers each)",
        tenants.len(),
        per_tenant.concurrency
    );
    let overall = compute_stats(&overall_label, &all, total_duration);

    tenants.sort_by(|a, b| b.stats.latency_p50.cmp(&a.stats.latency_p50));

    let mut p50s: Vec<Duration> = tenants.iter().map(|t| t.stats.latency_p50).collect();
    p50s.sort_unstable();
    let fastest_p50 = p50s.first().copied().unwrap_or_default();
    let slowest_p50 = p50s.last().copied().unwrap_or_default();
    let median_p50 = p50s.get(p50s.len() / 2).copied().unwrap_or_default();

    let ratio = if fastest_p50.is_zero() {
        if slowest_p50.is_zero() {
            1.0
        } else {
            f64::INFINITY
        }
    } else {
        slowest_p50.as_secs_f64() / fastest_p50.as_secs_f64()
    };
    let verdict = FairnessVerdict::classify(ratio, config);

    info!(
        qps = format_args!("{:.1}", overall.qps),
        ?fastest_p50,
        ?slowest_p50,
        ratio = format_args!("{:.1}x", ratio),
        ?verdict,
        "fairness"
    );
    for t in tenants.iter().take(5) {
        debug!(tenant = %t.tenant, p50 = ?t.stats.latency_p50, "slowest tenants");
    }

    FairnessReport {
        overall,
        tenants,
        fastest_p50,
        median_p50,
        slowest_p50,
        ratio,
        verdict,
    }
}
