//! Backoff arithmetic and cancellable delays for the retry loop.
//!
//! Delays follow `min(base * multiplier^attempt, max)` where `attempt` is the
//! zero-based index of the attempt that just failed, so the default policy waits
//! 1s, 2s, 4s, ... before optional ±25% jitter.

use crate::config::RetryConfig;
use crate::error::{AuthenticationCode, ErrorCode, ResourceCode, TypedError};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Jitter spread either side of the computed delay.
pub const JITTER_FRACTION: f64 = 0.25;

/// Exponential delay before the retry that follows failed attempt `attempt`.
pub fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let delay_seconds =
        config.base_delay.as_secs_f64() * config.backoff_multiplier.powi(exponent);
    let capped = delay_seconds.min(config.max_delay.as_secs_f64());
    Duration::try_from_secs_f64(capped).unwrap_or(config.max_delay)
}

/// Perturb a delay uniformly within ±25%.
pub fn apply_jitter(delay: Duration) -> Duration {
    let factor = 1.0 + (fastrand::f64() * 2.0 - 1.0) * JITTER_FRACTION;
    Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(delay)
}

/// Delay actually slept before the next retry.
pub fn retry_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let delay = backoff_delay(config, attempt);
    if config.jitter_enabled {
        apply_jitter(delay)
    } else {
        delay
    }
}

/// Retry policy used when the caller supplies no condition: retryable network
/// errors, busy resources and authentication failures caused by the network.
pub fn default_should_retry(error: &TypedError) -> bool {
    match error.code() {
        ErrorCode::Network(_) => error.is_retryable(),
        ErrorCode::Resource(code) => code == ResourceCode::ResourceBusy,
        ErrorCode::Authentication(code) => code == AuthenticationCode::NetworkError,
        _ => false,
    }
}

/// Sleep for `delay` unless `token` is cancelled first. Returns `false` on cancellation.
pub async fn cancellable_sleep(delay: Duration, token: &CancellationToken) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = sleep(delay) => true,
    }
}
