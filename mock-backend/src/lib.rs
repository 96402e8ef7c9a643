//! In-memory mock backend for exercising the loadcell engine without a
//! real database.
//!
//! Latency is drawn from a skew-normal distribution per tenant profile,
//! errors can be injected at a configurable rate, and all tenants of a
//! [`MockCluster`] share an in-flight counter that inflates everyone's
//! latency under load — which gives the isolation scenarios genuine
//! interference to detect.

use async_trait::async_trait;
use loadcell::backend::{Backend, Connector};
use loadcell_core::ConnConfig;
use rand::Rng;
use rand_distr::{Distribution, SkewNormal};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum MockError {
    #[error("injected fault")]
    Injected,
    #[error("tenant `{0}` refused")]
    Refused(String),
    #[error("key {0} not found")]
    NotFound(u64),
}

/// Latency/error profile for one tenant's handles.
#[derive(Debug, Clone, Copy)]
pub struct MockProfile {
    pub mean_latency: Duration,
    pub latency_std: Duration,
    /// Probability in `[0, 1]` that an operation fails after its delay.
    pub error_rate: f64,
}

impl Default for MockProfile {
    fn default() -> Self {
        Self {
            mean_latency: Duration::from_millis(1),
            latency_std: Duration::ZERO,
            error_rate: 0.0,
        }
    }
}

impl MockProfile {
    pub fn fixed(mean_latency: Duration) -> Self {
        Self {
            mean_latency,
            ..Self::default()
        }
    }
}

/// Contention state shared by every backend handed out by one
/// connector: each concurrent in-flight operation anywhere in the
/// cluster adds `contention_per_op` to everyone's latency.
#[derive(Debug)]
pub struct MockCluster {
    inflight: AtomicU64,
    contention_per_op: Duration,
}

impl MockCluster {
    fn new(contention_per_op: Duration) -> Arc<Self> {
        Arc::new(Self {
            inflight: AtomicU64::new(0),
            contention_per_op,
        })
    }

    fn enter(self: &Arc<Self>) -> InflightGuard {
        self.inflight.fetch_add(1, Ordering::Relaxed);
        InflightGuard(self.clone())
    }

    fn penalty(&self) -> Duration {
        self.contention_per_op * self.inflight.load(Ordering::Relaxed) as u32
    }
}

struct InflightGuard(Arc<MockCluster>);

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.0.inflight.fetch_sub(1, Ordering::Relaxed);
    }
}

/// One tenant's backend handle: a balance table behind a lock plus the
/// simulated latency model.
#[derive(Debug)]
pub struct MockBackend {
    profile: MockProfile,
    cluster: Arc<MockCluster>,
    rows: RwLock<HashMap<u64, f64>>,
}

impl MockBackend {
    fn new(profile: MockProfile, cluster: Arc<MockCluster>) -> Self {
        Self {
            profile,
            cluster,
            rows: RwLock::new(HashMap::new()),
        }
    }

    async fn simulate(&self) -> Result<(), MockError> {
        let _inflight = self.cluster.enter();
        tokio::time::sleep(self.sample_latency()).await;
        if self.profile.error_rate > 0.0
            && rand::thread_rng().gen::<f64>() < self.profile.error_rate
        {
            return Err(MockError::Injected);
        }
        Ok(())
    }

    fn sample_latency(&self) -> Duration {
        let base = if self.profile.latency_std.is_zero() {
            self.profile.mean_latency
        } else {
            let skew = SkewNormal::new(
                self.profile.mean_latency.as_secs_f64(),
                self.profile.latency_std.as_secs_f64(),
                20.0,
            )
            .expect("valid distribution parameters");
            Duration::from_secs_f64(skew.sample(&mut rand::thread_rng()).max(0.0))
        };
        base + self.cluster.penalty()
    }
}

#[async_trait]
impl Backend for MockBackend {
    type Row = (u64, f64);
    type Error = MockError;

    async fn point_read(&self, key: u64) -> Result<(u64, f64), MockError> {
        self.simulate().await?;
        let rows = self.rows.read().unwrap();
        match rows.get(&key) {
            Some(balance) => Ok((key, *balance)),
            None => Err(MockError::NotFound(key)),
        }
    }

    async fn point_update(&self, key: u64, delta: f64) -> Result<(), MockError> {
        self.simulate().await?;
        let mut rows = self.rows.write().unwrap();
        *rows.entry(key).or_insert(0.0) += delta;
        Ok(())
    }

    async fn seed(&self, row_count: u64) -> Result<(), MockError> {
        let mut rows = self.rows.write().unwrap();
        if rows.len() as u64 >= row_count {
            debug!(rows = rows.len(), "already seeded");
            return Ok(());
        }
        for key in 1..=row_count {
            rows.entry(key).or_insert((key % 997) as f64);
        }
        Ok(())
    }
}

/// Connector handing out tenants of one shared cluster. Per-database
/// profile overrides let a test make a specific tenant slow or flaky,
/// and listed databases can refuse connections to exercise fail-fast
/// paths.
pub struct MockConnector {
    cluster: Arc<MockCluster>,
    default_profile: MockProfile,
    overrides: Mutex<HashMap<String, MockProfile>>,
    refused: Mutex<HashSet<String>>,
}

impl MockConnector {
    pub fn new(default_profile: MockProfile) -> Self {
        Self::with_contention(default_profile, Duration::ZERO)
    }

    /// A cluster where concurrent load measurably slows every tenant.
    pub fn with_contention(default_profile: MockProfile, contention_per_op: Duration) -> Self {
        Self {
            cluster: MockCluster::new(contention_per_op),
            default_profile,
            overrides: Mutex::new(HashMap::new()),
            refused: Mutex::new(HashSet::new()),
        }
    }

    /// Override the profile for one database.
    pub fn set_profile(&self, database: impl Into<String>, profile: MockProfile) {
        self.overrides.lock().unwrap().insert(database.into(), profile);
    }

    /// Make `connect` fail for one database.
    pub fn refuse(&self, database: impl Into<String>) {
        self.refused.lock().unwrap().insert(database.into());
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Backend = MockBackend;

    async fn connect(&self, config: &ConnConfig) -> Result<MockBackend, MockError> {
        if self.refused.lock().unwrap().contains(&config.database) {
            return Err(MockError::Refused(config.database.clone()));
        }
        let profile = self
            .overrides
            .lock()
            .unwrap()
            .get(&config.database)
            .copied()
            .unwrap_or(self.default_profile);
        Ok(MockBackend::new(profile, self.cluster.clone()))
    }
}

/// `ConnConfig` pointing at the in-process cluster.
pub fn conn_config(database: &str) -> ConnConfig {
    ConnConfig {
        host: "localhost".to_string(),
        port: 0,
        user: "bench".to_string(),
        password: String::new(),
        database: database.to_string(),
    }
}
