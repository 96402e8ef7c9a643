//! The multi-run controller: repeat a run, check steady state, report
//! the median.

use loadcell_core::{median_stats, steady_state, MultiRunConfig, RunStats, SteadyState};
use std::future::Future;
#[allow(unused_imports)]
use tracing::{debug, info, instrument, warn};

/// Outcome of a median-of-N benchmark. `stats` is the representative
/// (median-by-p50) run; the full run set and the steady-state outcome
/// are kept so callers can audit the selection.
#[derive(Debug, Clone)]
pub struct MultiRunReport {
    pub stats: RunStats,
    pub runs: Vec<RunStats>,
    pub steady: SteadyState,
}

/// Execute `run_fn` `repetitions` times sequentially and report the
/// median run, relabelled `"<label> (median of N runs)"`.
///
/// A cooldown pause is inserted between passes (not after the last) to
/// let transient effects settle. The steady-state check is advisory: an
/// unsteady run set is logged but still reported as the median, never
/// retried or discarded.
#[instrument(skip(config, run_fn))]
pub async fn run_multiple<F, Fut>(
    repetitions: usize,
    config: MultiRunConfig,
    label: &str,
    mut run_fn: F,
) -> MultiRunReport
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = RunStats>,
{
    let repetitions = repetitions.max(1);
    if repetitions == 1 {
        let stats = run_fn(0).await;
        return MultiRunReport {
            runs: vec![stats.clone()],
            steady: SteadyState {
                steady: true,
                max_deviation: 0.0,
            },
            stats,
        };
    }

    info!(repetitions, "median-of-N benchmark starting");

    let mut runs = Vec::with_capacity(repetitions);
    for i in 0..repetitions {
        let stats = run_fn(i).await;
        info!(
            run = i + 1,
            repetitions,
            qps = format_args!("{:.1}", stats.qps),
            p50 = ?stats.latency_p50,
            p95 = ?stats.latency_p95,
            errors = stats.errors,
            "run complete"
        );
        runs.push(stats);

        if i < repetitions - 1 {
            debug!(cooldown = ?config.cooldown, "cooling down");
            tokio::time::sleep(config.cooldown).await;
        }
    }

    let steady = steady_state(&runs, config.tolerance);
    if steady.steady {
        info!(
            max_deviation = format_args!("{:.1}%", steady.max_deviation * 100.0),
            "steady-state check passed"
        );
    } else {
        warn!(
            max_deviation = format_args!("{:.1}%", steady.max_deviation * 100.0),
            tolerance = format_args!("{:.1}%", config.tolerance * 100.0),
            "steady-state check failed; results still reported as median"
        );
    }

    let mut stats = median_stats(runs.clone()).expect("at least one run");
    stats.label = format!("{label} (median of {repetitions} runs)");

    MultiRunReport {
        stats,
        runs,
        steady,
    }
}
