use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;

use super::classify::classify;
use super::{StoreError, StoreResult};
use crate::constants::{DEFAULT_MAX_RETRIES, RETRY_BASE_DELAY_MS, RETRY_MAX_DELAY_MS};

/// Bounded exponential backoff for transient database failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 disables retrying)
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Cap applied to every delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
            max_delay: Duration::from_millis(RETRY_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt` (0-indexed): `min(base * 2^attempt, max)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Run `op` until it succeeds, fails permanently, or the retry budget is spent
///
/// Only failures classified as transient are retried. The caller sees either
/// the first success or the last error.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, sqlx::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let mut attempt = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.max_retries && classify(&err).is_transient() => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    "Connection error, retrying query ({}/{}) after {}ms: {}",
                    attempt + 1,
                    policy.max_retries,
                    delay.as_millis(),
                    err
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Executes queries against the pool under a [`RetryPolicy`]
///
/// Each operation receives its own handle to the pool so the closure can be
/// called again on retry.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    pool: PgPool,
    policy: RetryPolicy,
}

impl QueryExecutor {
    pub fn new(pool: PgPool, policy: RetryPolicy) -> Self {
        Self { pool, policy }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run<T, F, Fut>(&self, mut op: F) -> StoreResult<T>
    where
        F: FnMut(PgPool) -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        with_retry(&self.policy, || op(self.pool.clone()))
            .await
            .map_err(StoreError::from)
    }
}
