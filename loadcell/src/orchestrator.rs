//! Multi-tenant orchestration.
//!
//! Two protocols share the tenant connect/seed primitives in this
//! module: fan-out (fairness) mode runs the executor against every
//! tenant concurrently and ranks them; noisy-neighbor (isolation) mode
//! measures one victim tenant before and during sustained background
//! write load on all the others.

mod fanout;
mod isolation;

pub use fanout::{run_fan_out, FairnessReport, FairnessVerdict};
pub use isolation::{run_isolation, IsolationReport, IsolationVerdict};

use crate::backend::{Backend, Connector};
use crate::error::Error;
use loadcell_core::ConnConfig;
use std::sync::Arc;
use tokio::sync::Mutex;
#[allow(unused_imports)]
use tracing::{debug, info, warn};

/// Connect every tenant and seed each with `seed_rows` rows.
///
/// Connects are sequential and fail-fast; seeding runs in parallel with
/// failures collected under a mutex, and any failure aborts the whole
/// orchestration (setup errors are fatal, unlike operation errors).
pub(crate) async fn connect_tenants<C: Connector>(
    connector: &C,
    base: &ConnConfig,
    tenants: &[String],
    seed_rows: u64,
) -> Result<Vec<Arc<C::Backend>>, Error> {
    if tenants.is_empty() {
        return Err(Error::NoTenants);
    }

    let mut backends = Vec::with_capacity(tenants.len());
    for (i, tenant) in tenants.iter().enumerate() {
        debug!(tenant, n = i + 1, total = tenants.len(), "connecting");
        let cfg = base.with_database(tenant.clone());
        let backend = connector
            .connect(&cfg)
            .await
            .map_err(|e| Error::connect(tenant.clone(), e))?;
        backends.push(Arc::new(backend));
    }

    let failures: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let mut handles = Vec::with_capacity(tenants.len());
    for (tenant, backend) in tenants.iter().zip(&backends) {
        let tenant = tenant.clone();
        let backend = backend.clone();
        let failures = failures.clone();
        handles.push(tokio::spawn(async move {
            if let Err(e) = backend.seed(seed_rows).await {
                failures.lock().await.push((tenant, e.to_string()));
            }
        }));
    }
    for handle in handles {
        let _ = handle.await;
    }

    let mut failures = failures.lock().await;
    if let Some((tenant, message)) = failures.drain(..).next() {
        return Err(Error::seed(tenant, message));
    }

    info!(tenants = tenants.len(), seed_rows, "all tenants connected and seeded");
    Ok(backends)
}
