use thiserror::Error;

type Source = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Setup-class failures. These abort the enclosing orchestration;
/// operation-level failures never appear here, they are recorded as
/// samples instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("connecting tenant `{tenant}` failed: {source}")]
    Connect { tenant: String, source: Source },

    #[error("seeding tenant `{tenant}` failed: {source}")]
    Seed { tenant: String, source: Source },

    #[error("no tenants configured")]
    NoTenants,
}

impl Error {
    pub(crate) fn connect(tenant: impl Into<String>, source: impl Into<Source>) -> Self {
        Self::Connect {
            tenant: tenant.into(),
            source: source.into(),
        }
    }

    pub(crate) fn seed(tenant: impl Into<String>, source: impl Into<Source>) -> Self {
        Self::Seed {
            tenant: tenant.into(),
            source: source.into(),
        }
    }
}
