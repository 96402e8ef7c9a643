//! The capability seam between the engine and a concrete backend.
//!
//! The engine drives any store that can do a point lookup and an
//! additive point update; one adapter per backend implements this trait
//! and nothing else. Handles are shared across workers behind an `Arc`,
//! so implementations must be safe for concurrent use (connection pools
//! typically are).

use async_trait::async_trait;
use loadcell_core::ConnConfig;

/// Operations the engine needs from one backend handle.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Row type returned by point reads. The engine discards it; it
    /// exists so adapters can deserialize fully and keep the read
    /// honest.
    type Row: Send;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Point lookup by key.
    async fn point_read(&self, key: u64) -> Result<Self::Row, Self::Error>;

    /// Additive update of a numeric field by a signed delta.
    async fn point_update(&self, key: u64, delta: f64) -> Result<(), Self::Error>;

    /// Ensure the dataset holds at least `row_count` rows. Idempotent:
    /// a no-op when already seeded.
    async fn seed(&self, row_count: u64) -> Result<(), Self::Error>;
}

/// Obtains backend handles from opaque connection parameters. One
/// `ConnConfig` per tenant in multi-tenant modes.
#[async_trait]
pub trait Connector: Send + Sync {
    type Backend: Backend;

    async fn connect(
        &self,
        config: &ConnConfig,
    ) -> Result<Self::Backend, <Self::Backend as Backend>::Error>;
}
