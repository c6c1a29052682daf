use std::future::Future;

use tracing::warn;

use crate::error::{EngineError, EngineResult};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Runs a read-validate-write operation with bounded retry on transient
/// failures. Contention windows are sub-second, so there is no backoff
/// between attempts.
#[derive(Debug, Clone, Copy)]
pub struct TxnCoordinator {
    max_attempts: u32,
}

impl Default for TxnCoordinator {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl TxnCoordinator {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Invoke `op` until it succeeds, fails non-transiently, or the attempt
    /// bound is reached. Each invocation must re-read fresh state.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> EngineResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = EngineResult<T>>,
    {
        let mut last = None;
        for attempt in 1..=self.max_attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => {
                    if attempt < self.max_attempts {
                        warn!(attempt, error = %err, "transaction attempt failed, retrying");
                    }
                    last = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last.unwrap_or(EngineError::Conflict))
    }
}
