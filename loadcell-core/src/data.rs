use std::time::{Duration, Instant};

/// One completed operation attempt: issue timestamp, observed latency
/// and the error (if any) rendered to a string. Created exactly once per
/// attempt and never mutated.
#[derive(Debug, Clone)]
pub struct OperationResult {
    pub at: Instant,
    pub latency: Duration,
    pub error: Option<String>,
}

impl OperationResult {
    pub fn ok(at: Instant, latency: Duration) -> Self {
        Self {
            at,
            latency,
            error: None,
        }
    }

    pub fn err(at: Instant, latency: Duration, error: impl std::fmt::Display) -> Self {
        Self {
            at,
            latency,
            error: Some(error.to_string()),
        }
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}
