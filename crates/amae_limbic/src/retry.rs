//! Retry logic with exponential backoff for cache mirror calls.
//!
//! Retries while the cache is unavailable. Does NOT retry rejected writes or
//! encoding failures; those would fail the same way again.

use amae_core::{MirrorConfig, MirrorError};
use std::future::Future;
use std::time::Duration;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Initial delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier for each subsequent delay.
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&MirrorConfig::default())
    }
}

impl From<&MirrorConfig> for RetryConfig {
    fn from(config: &MirrorConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay: Duration::from_millis(config.initial_backoff_ms),
            max_delay: Duration::from_millis(config.max_backoff_ms),
            backoff_factor: if config.backoff_factor.is_finite() && config.backoff_factor >= 1.0 {
                config.backoff_factor
            } else {
                1.0
            },
        }
    }
}

fn is_retryable(err: &MirrorError) -> bool {
    matches!(err, MirrorError::Unavailable(_))
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// `max_attempts` is exhausted. Returns the last error in the latter case.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    target: &str,
    mut operation: F,
) -> Result<T, MirrorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, MirrorError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut delay = config.initial_delay;
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!("{} succeeded on attempt {}", target, attempt);
                }
                return Ok(value);
            }
            Err(e) if !is_retryable(&e) => return Err(e),
            Err(e) => {
                tracing::warn!(
                    "{} failed on attempt {}/{}: {}",
                    target,
                    attempt,
                    max_attempts,
                    e
                );
                last_error = Some(e);
            }
        }

        if attempt < max_attempts {
            let sleep_time = delay + jitter(delay);
            tracing::debug!(
                "{} retrying in {:.2}s (attempt {}/{})",
                target,
                sleep_time.as_secs_f64(),
                attempt + 1,
                max_attempts
            );
            tokio::time::sleep(sleep_time).await;

            delay = Duration::from_secs_f64(
                (delay.as_secs_f64() * config.backoff_factor).min(config.max_delay.as_secs_f64()),
            );
        }
    }

    Err(last_error.unwrap_or_else(|| MirrorError::Unavailable(format!("{}: no attempt made", target))))
}

/// Up to 10% of `delay`, using the clock's sub-second nanos as cheap randomness.
fn jitter(delay: Duration) -> Duration {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    delay.mul_f64((nanos % 100) as f64 / 1000.0)
}
