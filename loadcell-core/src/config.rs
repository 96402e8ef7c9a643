use crate::constants::*;
use std::time::Duration;

/// Connection parameters for one backend handle. The engine never
/// interprets these; it hands them to a `Connector` as an opaque key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl ConnConfig {
    /// Same endpoint, different logical database. Used to address
    /// individual tenants behind one proxy.
    pub fn with_database(&self, database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..self.clone()
        }
    }
}

/// Configuration for a single benchmark run. Immutable once a run
/// starts.
#[derive(Debug, Clone)]
pub struct BenchParams {
    /// Operations to issue in count-bounded mode. Ignored when
    /// `run_duration` is set.
    pub operation_count: usize,
    /// Concurrent workers.
    pub concurrency: usize,
    /// Operations issued (and discarded) before the timed window opens.
    pub warmup_count: usize,
    /// Upper bound for generated keys; keys are uniform in
    /// `[1, keyspace_size]`.
    pub keyspace_size: u64,
    /// When set and non-zero, the run is wall-clock bounded instead of
    /// count bounded.
    pub run_duration: Option<Duration>,
    /// Repetitions for median-of-N reporting. Values above 1 engage the
    /// multi-run controller.
    pub run_repetitions: usize,
}

impl Default for BenchParams {
    fn default() -> Self {
        Self {
            operation_count: 10_000,
            concurrency: 10,
            warmup_count: 100,
            keyspace_size: 10_000,
            run_duration: None,
            run_repetitions: 1,
        }
    }
}

impl BenchParams {
    /// Clamp out-of-range fields instead of failing. Long multi-tenant
    /// runs must not crash on a rounding edge case.
    pub fn normalized(mut self) -> Self {
        self.concurrency = self.concurrency.max(1);
        self.keyspace_size = self.keyspace_size.max(1);
        self.run_repetitions = self.run_repetitions.max(1);
        if let Some(d) = self.run_duration {
            if d.is_zero() {
                self.run_duration = None;
            }
        }
        self
    }

    /// Whether this run is wall-clock bounded.
    pub fn is_timed(&self) -> bool {
        matches!(self.run_duration, Some(d) if !d.is_zero())
    }

    /// Count-bounded share per worker. Floor division; when
    /// `operation_count` is not divisible by `concurrency` the remainder
    /// is dropped, not redistributed.
    pub fn ops_per_worker(&self) -> usize {
        self.operation_count / self.concurrency.max(1)
    }

    /// Derive the per-tenant parameters used by fan-out mode: the total
    /// concurrency and operation count split evenly across `tenants`,
    /// with a floor of one worker and [`MIN_OPS_PER_TENANT`] operations
    /// per tenant.
    pub fn per_tenant(&self, tenants: usize) -> Self {
        let tenants = tenants.max(1);
        let mut p = self.clone();
        p.concurrency = (self.concurrency / tenants).max(1);
        p.operation_count = (self.operation_count / tenants).max(MIN_OPS_PER_TENANT);
        p.run_repetitions = 1;
        p
    }
}

/// Read/write mix for generated operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkloadMix {
    /// Probability in `[0, 1]` that an operation is a point read.
    pub read_fraction: f64,
}

impl Default for WorkloadMix {
    fn default() -> Self {
        Self {
            read_fraction: DEFAULT_READ_FRACTION,
        }
    }
}

impl WorkloadMix {
    pub fn new(read_fraction: f64) -> Self {
        Self {
            read_fraction: read_fraction.clamp(0.0, 1.0),
        }
    }

    /// Pure update load, used for background noise generation.
    pub fn write_only() -> Self {
        Self { read_fraction: 0.0 }
    }
}

/// Settings for the multi-run controller.
#[derive(Debug, Clone, Copy)]
pub struct MultiRunConfig {
    /// Maximum relative QPS deviation for the run set to count as
    /// steady.
    pub tolerance: f64,
    /// Pause between passes (not applied after the last).
    pub cooldown: Duration,
}

impl Default for MultiRunConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_STEADY_TOLERANCE,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

/// Settings for fan-out (fairness) orchestration.
#[derive(Debug, Clone, Copy)]
pub struct FanOutConfig {
    pub mix: WorkloadMix,
    /// Ratio below which the tenant set is classified fair.
    pub fair_ratio: f64,
    /// Ratio below which the tenant set is classified moderate.
    pub moderate_ratio: f64,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            mix: WorkloadMix::default(),
            fair_ratio: DEFAULT_FAIR_RATIO,
            moderate_ratio: DEFAULT_MODERATE_RATIO,
        }
    }
}

/// Settings for noisy-neighbor (isolation) orchestration.
#[derive(Debug, Clone, Copy)]
pub struct IsolationConfig {
    pub mix: WorkloadMix,
    /// Workers measuring the victim, both alone and under noise.
    pub victim_concurrency: usize,
    /// Background write workers per noise tenant.
    pub noise_workers: usize,
    /// Pause after launching noise before re-measuring the victim.
    pub ramp_up: Duration,
    /// p50 impact below which the victim counts as isolated.
    pub isolated_impact: f64,
    /// p50 impact below which the interference counts as moderate.
    pub moderate_impact: f64,
}

impl Default for IsolationConfig {
    fn default() -> Self {
        Self {
            mix: WorkloadMix::default(),
            victim_concurrency: DEFAULT_VICTIM_CONCURRENCY,
            noise_workers: DEFAULT_NOISE_WORKERS,
            ramp_up: DEFAULT_RAMP_UP,
            isolated_impact: DEFAULT_ISOLATED_IMPACT,
            moderate_impact: DEFAULT_MODERATE_IMPACT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_clamps_to_minimums() {
        let p = BenchParams {
            concurrency: 0,
            keyspace_size: 0,
            run_repetitions: 0,
            run_duration: Some(Duration::ZERO),
            ..BenchParams::default()
        }
        .normalized();

        assert_eq!(p.concurrency, 1);
        assert_eq!(p.keyspace_size, 1);
        assert_eq!(p.run_repetitions, 1);
        assert!(!p.is_timed());
    }

    #[test]
    fn ops_per_worker_truncates_remainder() {
        let p = BenchParams {
            operation_count: 1_000,
            concurrency: 7,
            ..BenchParams::default()
        };
        // 1000 / 7 = 142; 6 operations are dropped by design.
        assert_eq!(p.ops_per_worker(), 142);
    }

    #[test]
    fn per_tenant_split_has_floors() {
        let p = BenchParams {
            operation_count: 50,
            concurrency: 4,
            ..BenchParams::default()
        };
        let t = p.per_tenant(10);
        assert_eq!(t.concurrency, 1);
        assert_eq!(t.operation_count, MIN_OPS_PER_TENANT);
    }

    #[test]
    fn mix_clamps_fraction() {
        assert_eq!(WorkloadMix::new(1.7).read_fraction, 1.0);
        assert_eq!(WorkloadMix::write_only().read_fraction, 0.0);
    }
}
