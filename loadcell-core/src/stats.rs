use crate::data::OperationResult;
use std::fmt;
use std::time::Duration;

/// Aggregate statistics for one run. Derived data: recomputed fresh from
/// the full sample set for every run, never updated incrementally.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStats {
    pub label: String,
    pub total: usize,
    pub errors: usize,
    pub duration: Duration,
    /// Successful operations per second over the run's wall-clock
    /// duration. The denominator is the run duration, not the sum of
    /// latencies, so concurrency is captured.
    pub qps: f64,
    pub latency_avg: Duration,
    pub latency_min: Duration,
    pub latency_max: Duration,
    pub latency_p50: Duration,
    pub latency_p75: Duration,
    pub latency_p90: Duration,
    pub latency_p95: Duration,
    pub latency_p99: Duration,
}

impl RunStats {
    fn zeroed(label: &str, total: usize, duration: Duration) -> Self {
        Self {
            label: label.to_string(),
            total,
            errors: 0,
            duration,
            qps: 0.0,
            latency_avg: Duration::ZERO,
            latency_min: Duration::ZERO,
            latency_max: Duration::ZERO,
            latency_p50: Duration::ZERO,
            latency_p75: Duration::ZERO,
            latency_p90: Duration::ZERO,
            latency_p95: Duration::ZERO,
            latency_p99: Duration::ZERO,
        }
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: total={} errors={} qps={:.1} avg={} p50={} p95={} p99={} max={}",
            self.label,
            self.total,
            self.errors,
            self.qps,
            humantime::format_duration(self.latency_avg),
            humantime::format_duration(self.latency_p50),
            humantime::format_duration(self.latency_p95),
            humantime::format_duration(self.latency_p99),
            humantime::format_duration(self.latency_max),
        )
    }
}

/// A tenant's own run statistics plus the raw samples that produced
/// them. The samples are kept only so fairness ranking can be rederived
/// by callers.
#[derive(Debug, Clone)]
pub struct TenantRunStats {
    pub tenant: String,
    pub stats: RunStats,
    pub results: Vec<OperationResult>,
}

/// Reduce a sample set into [`RunStats`]. Deterministic and pure:
/// calling it twice on the same inputs yields identical output.
///
/// Errored samples count toward `total` and `errors` but are excluded
/// from all latency and QPS math. An all-error (or empty) sample set
/// yields zeroed latency fields rather than an error.
pub fn compute_stats(
    label: &str,
    results: &[OperationResult],
    total_duration: Duration,
) -> RunStats {
    let mut stats = RunStats::zeroed(label, results.len(), total_duration);

    let mut latencies: Vec<Duration> = results
        .iter()
        .filter(|r| !r.is_err())
        .map(|r| r.latency)
        .collect();
    stats.errors = results.len() - latencies.len();

    if latencies.is_empty() {
        return stats;
    }

    latencies.sort_unstable();

    let sum: Duration = latencies.iter().sum();
    stats.latency_avg = sum / latencies.len() as u32;
    stats.latency_min = latencies[0];
    stats.latency_max = latencies[latencies.len() - 1];
    stats.latency_p50 = percentile(&latencies, 50.0);
    stats.latency_p75 = percentile(&latencies, 75.0);
    stats.latency_p90 = percentile(&latencies, 90.0);
    stats.latency_p95 = percentile(&latencies, 95.0);
    stats.latency_p99 = percentile(&latencies, 99.0);
    if !total_duration.is_zero() {
        stats.qps = latencies.len() as f64 / total_duration.as_secs_f64();
    }

    stats
}

/// Nearest-rank percentile over an ascending-sorted slice:
/// `index = ceil(p/100 * n) - 1`, clamped to `[0, n-1]`. No
/// interpolation, so repeated computation is bit-identical.
pub fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = (p / 100.0 * sorted.len() as f64).ceil() as usize;
    sorted[idx.saturating_sub(1).min(sorted.len() - 1)]
}

/// Pick the representative run from a set: sort by p50 latency ascending
/// and take index `n / 2` (the upper median for even `n`).
pub fn median_stats(mut runs: Vec<RunStats>) -> Option<RunStats> {
    let idx = median_index(&runs)?;
    Some(runs.swap_remove(idx))
}

/// Index (into the unsorted slice) of the run [`median_stats`] would
/// pick. Callers holding richer per-run data keyed by position use this
/// to recover the rest of the representative run.
pub fn median_index(runs: &[RunStats]) -> Option<usize> {
    if runs.is_empty() {
        return None;
    }
    let mut order: Vec<usize> = (0..runs.len()).collect();
    order.sort_by_key(|&i| runs[i].latency_p50);
    Some(order[runs.len() / 2])
}

/// Outcome of the cross-run throughput stability check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteadyState {
    pub steady: bool,
    /// Largest `|qps - mean| / mean` observed across the runs.
    pub max_deviation: f64,
}

/// Check whether QPS across runs stays within `tolerance` of the mean.
/// Advisory only: callers report unsteady results, they do not retry.
pub fn steady_state(runs: &[RunStats], tolerance: f64) -> SteadyState {
    if runs.len() < 2 {
        return SteadyState {
            steady: true,
            max_deviation: 0.0,
        };
    }

    let mean = runs.iter().map(|r| r.qps).sum::<f64>() / runs.len() as f64;
    if mean == 0.0 {
        return SteadyState {
            steady: false,
            max_deviation: 0.0,
        };
    }

    let max_deviation = runs
        .iter()
        .map(|r| (r.qps - mean).abs() / mean)
        .fold(0.0, f64::max);

    SteadyState {
        steady: max_deviation <= tolerance,
        max_deviation,
    }
}
