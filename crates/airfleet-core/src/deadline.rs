//! Per-request time budget

use crate::error::{FleetError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Budget applied to a whole request when none is configured
pub const DEFAULT_REQUEST_BUDGET: Duration = Duration::from_secs(10);

/// Instant by which every store and cache call of one request must finish
///
/// Created once per request and passed by reference through each step, so a
/// multi-write protocol shares a single budget rather than one per call.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Fail with a timeout naming `stage` once the budget is spent
    pub fn check(&self, stage: &str) -> Result<()> {
        if self.is_expired() {
            return Err(FleetError::Timeout(stage.to_string()));
        }
        Ok(())
    }

    /// Run `fut` within the remaining budget
    pub async fn run<T, F>(&self, stage: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check(stage)?;
        match tokio::time::timeout_at(self.at, fut).await {
            Ok(result) => result,
            Err(_) => Err(FleetError::Timeout(stage.to_string())),
        }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::after(DEFAULT_REQUEST_BUDGET)
    }
}
