use crate::config::Config;
use async_trait::async_trait;
use std::time::Duration;

/// Exponential backoff for rate-limited calls: retry `n` (1-based) waits
/// `initial_delay * 2^(n - 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy {
            max_retries: 5,
            initial_delay: Duration::from_secs(2),
        }
    }
}

impl BackoffPolicy {
    pub fn from_config(config: &Config) -> Self {
        BackoffPolicy {
            max_retries: config.get_max_retries(),
            initial_delay: config.get_initial_retry_delay(),
        }
    }

    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1);
        let factor = 2u32.checked_pow(exponent).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor)
    }
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
