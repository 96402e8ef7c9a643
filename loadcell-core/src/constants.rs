use std::time::Duration;

/// Fraction of generated operations that are point reads; the remainder
/// are additive point updates.
pub const DEFAULT_READ_FRACTION: f64 = 0.8;

/// Maximum relative QPS deviation across repeated runs for the run set
/// to count as steady.
pub const DEFAULT_STEADY_TOLERANCE: f64 = 0.05;

/// Pause between repeated runs so cache warmth and connection churn
/// settle before the next pass.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(3);

/// Fairness ratio (slowest tenant p50 / fastest tenant p50) below which
/// a tenant set is classified as fair.
pub const DEFAULT_FAIR_RATIO: f64 = 3.0;

/// Fairness ratio below which a tenant set is classified as moderate.
pub const DEFAULT_MODERATE_RATIO: f64 = 5.0;

/// Relative p50 impact below which a victim tenant counts as isolated.
pub const DEFAULT_ISOLATED_IMPACT: f64 = 0.20;

/// Relative p50 impact below which interference counts as moderate.
pub const DEFAULT_MODERATE_IMPACT: f64 = 0.50;

/// Time allowed for background noise to reach steady load before the
/// victim is re-measured.
pub const DEFAULT_RAMP_UP: Duration = Duration::from_secs(2);

/// Workers used to measure the victim tenant, decoupled from the noise
/// tenant count.
pub const DEFAULT_VICTIM_CONCURRENCY: usize = 5;

/// Background write workers launched per noise tenant.
pub const DEFAULT_NOISE_WORKERS: usize = 5;

/// Floor for a single tenant's operation share in fan-out mode.
pub const MIN_OPS_PER_TENANT: usize = 10;

/// Operation errors surfaced in the logs per run; the rest are only
/// counted.
pub const ERROR_SAMPLE_LIMIT: usize = 5;
