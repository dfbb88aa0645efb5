//! Recovery engine: retry with backoff, per-operation circuit breaking, graceful
//! degradation and category-specific automatic recovery.
//!
//! # Example
//!
//! ```rust,no_run
//! use pipeline_resilience::config::{AutoRecoveryConfig, CircuitBreakerConfig, RetryConfig};
//! use pipeline_resilience::error::{NetworkCode, TypedError};
//! use pipeline_resilience::recovery::ErrorRecovery;
//!
//! # async fn example() {
//! let recovery =
//!     ErrorRecovery::new(CircuitBreakerConfig::default(), AutoRecoveryConfig::default());
//! let result = recovery
//!     .with_retry(
//!         || async { Err::<u32, _>(TypedError::network(NetworkCode::Timeout, "timed out")) },
//!         "listPipelines",
//!         &RetryConfig::default(),
//!     )
//!     .await;
//! assert!(!result.is_success());
//! # }
//! ```

use crate::config::{AutoRecoveryConfig, CircuitBreakerConfig, DegradationOptions, RetryConfig};
use crate::error::{
    AuthenticationCode, ErrorCode, ErrorResult, ExtensionCode, NetworkCode, ResourceCode,
    TypedError,
};
use crate::host::{commands, HostUi, Notification, NotificationLevel};
use crate::internals::circuit_breaker::{CircuitBreakerRegistry, CircuitState};
use crate::internals::retry::{cancellable_sleep, default_should_retry, retry_delay};
use crate::logging::{log_debug, log_error, log_info, log_warn};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const GENERIC_RECOVERY_ACTIONS: [&str; 3] = [
    "Check your internet connection",
    "Try again later",
    "Contact support if the problem persists",
];

const DEGRADED_RECOVERY_ACTIONS: [&str; 2] =
    ["Using cached data", "Limited functionality available"];

const DEFAULT_OFFLINE_MESSAGE: &str =
    "Unable to reach Azure DevOps. Showing cached data with limited functionality.";

/// Outcome of a recovery-managed operation.
#[derive(Debug)]
pub struct RecoveryResult<T> {
    /// The value, or the last error seen
    pub outcome: ErrorResult<T>,
    pub attempts_used: u32,
    /// Wall time from the first attempt to the result
    pub total_time: Duration,
    /// Suggestions for the user; empty on a clean success
    pub recovery_actions: Vec<String>,
}

impl<T> RecoveryResult<T> {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn value(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&TypedError> {
        self.outcome.as_ref().err()
    }

    pub fn into_result(self) -> ErrorResult<T> {
        self.outcome
    }
}

/// Retry, circuit-breaker and degradation policies shared by every Azure DevOps call.
pub struct ErrorRecovery {
    breakers: CircuitBreakerRegistry,
    auto_recovery: AutoRecoveryConfig,
    host: Option<Arc<dyn HostUi>>,
    shutdown: CancellationToken,
}

impl ErrorRecovery {
    pub fn new(circuit_breaker: CircuitBreakerConfig, auto_recovery: AutoRecoveryConfig) -> Self {
        Self {
            breakers: CircuitBreakerRegistry::new(circuit_breaker),
            auto_recovery,
            host: None,
            shutdown: CancellationToken::new(),
        }
    }

    /// Attach the host used for offline-mode and credential prompts.
    pub fn with_host(mut self, host: Arc<dyn HostUi>) -> Self {
        self.host = Some(host);
        self
    }

    /// Token cancelled when this engine is disposed. Callers can derive their own
    /// deadlines from it.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    /// Run `operation` with retries, exponential backoff and circuit breaking.
    ///
    /// The operation runs at most `config.max_retries + 1` times. Before every attempt
    /// the breaker for `operation_name` is consulted; an open breaker ends the call
    /// with a non-retryable failure without running the operation.
    pub async fn with_retry<F, Fut, T>(
        &self,
        mut operation: F,
        operation_name: &str,
        config: &RetryConfig,
    ) -> RecoveryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ErrorResult<T>>,
    {
        let start_time = Instant::now();
        let max_attempts = config.max_retries.saturating_add(1);
        let mut attempts = 0u32;

        loop {
            if self.shutdown.is_cancelled() {
                return Self::cancelled(operation_name, attempts, start_time);
            }
            if !self.breakers.try_acquire(operation_name) {
                return self.circuit_open(operation_name, None, attempts, start_time);
            }

            attempts += 1;
            log_debug!(
                operation = operation_name,
                attempt = attempts,
                max_attempts = max_attempts,
                "Executing operation with retry logic"
            );

            let error = match operation().await {
                Ok(value) => {
                    self.breakers.record_success(operation_name);
                    log_debug!(
                        operation = operation_name,
                        attempt = attempts,
                        duration_ms = start_time.elapsed().as_millis() as u64,
                        "Operation succeeded"
                    );
                    return RecoveryResult {
                        outcome: Ok(value),
                        attempts_used: attempts,
                        total_time: start_time.elapsed(),
                        recovery_actions: Vec::new(),
                    };
                }
                Err(error) => error,
            };

            self.breakers.record_failure(operation_name);

            let attempt_index = attempts - 1;
            let should_retry = match &config.retry_condition {
                Some(condition) => condition.should_retry(&error, attempt_index),
                None => default_should_retry(&error),
            };

            if !should_retry || attempts >= max_attempts {
                return Self::exhausted(operation_name, error, attempts, start_time);
            }
            if self.breakers.is_open(operation_name) {
                return self.circuit_open(operation_name, Some(error), attempts, start_time);
            }

            let delay = retry_delay(config, attempt_index);
            log_debug!(
                operation = operation_name,
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                error_code = %error.code(),
                "Operation failed, retrying after delay"
            );
            if !cancellable_sleep(delay, &self.shutdown).await {
                return Self::cancelled(operation_name, attempts, start_time);
            }
        }
    }

    fn exhausted<T>(
        operation_name: &str,
        error: TypedError,
        attempts: u32,
        start_time: Instant,
    ) -> RecoveryResult<T> {
        log_error!(
            operation = operation_name,
            attempts = attempts,
            total_duration_ms = start_time.elapsed().as_millis() as u64,
            error_code = %error.code(),
            error = %error,
            "Operation failed after all retry attempts"
        );
        let recovery_actions = if error.recovery_actions().is_empty() {
            GENERIC_RECOVERY_ACTIONS.iter().map(|s| (*s).to_string()).collect()
        } else {
            error.recovery_actions().to_vec()
        };
        RecoveryResult {
            outcome: Err(error),
            attempts_used: attempts,
            total_time: start_time.elapsed(),
            recovery_actions,
        }
    }

    fn circuit_open<T>(
        &self,
        operation_name: &str,
        last_error: Option<TypedError>,
        attempts: u32,
        start_time: Instant,
    ) -> RecoveryResult<T> {
        let mut error = TypedError::resource(
            ResourceCode::OperationFailed,
            format!("Circuit breaker is open for operation '{operation_name}'"),
        )
        .with_user_message(
            "Requests to Azure DevOps are paused after repeated failures. Try again shortly.",
        )
        .with_context("operation", operation_name)
        .with_context(
            "failureCount",
            self.breakers.failure_count(operation_name),
        );
        let mut recovery_actions = error.recovery_actions().to_vec();
        if let Some(last) = last_error {
            log_warn!(
                operation = operation_name,
                attempts = attempts,
                error_code = %last.code(),
                "Circuit breaker opened during retries"
            );
            error = error
                .with_context("lastError", last.to_string())
                .with_context("lastErrorCode", last.code().to_string());
            recovery_actions = last.recovery_actions().to_vec();
        }
        RecoveryResult {
            outcome: Err(error),
            attempts_used: attempts,
            total_time: start_time.elapsed(),
            recovery_actions,
        }
    }

    fn cancelled<T>(operation_name: &str, attempts: u32, start_time: Instant) -> RecoveryResult<T> {
        log_info!(
            operation = operation_name,
            attempts = attempts,
            "Retry loop cancelled"
        );
        let error = TypedError::extension(
            ExtensionCode::DisposalError,
            format!("Operation '{operation_name}' cancelled during shutdown"),
        )
        .with_context("operation", operation_name);
        RecoveryResult {
            outcome: Err(error),
            attempts_used: attempts,
            total_time: start_time.elapsed(),
            recovery_actions: Vec::new(),
        }
    }

    /// Run `primary`, falling back to `fallback` (usually cached data) if it fails.
    pub async fn with_graceful_degradation<P, PFut, B, BFut, T>(
        &self,
        primary: P,
        fallback: B,
        operation_name: &str,
        options: &DegradationOptions,
    ) -> RecoveryResult<T>
    where
        P: FnOnce() -> PFut,
        PFut: Future<Output = ErrorResult<T>>,
        B: FnOnce() -> BFut,
        BFut: Future<Output = ErrorResult<T>>,
    {
        let start_time = Instant::now();

        let primary_error = match primary().await {
            Ok(value) => {
                return RecoveryResult {
                    outcome: Ok(value),
                    attempts_used: 1,
                    total_time: start_time.elapsed(),
                    recovery_actions: Vec::new(),
                };
            }
            Err(error) => error,
        };

        log_warn!(
            operation = operation_name,
            error_code = %primary_error.code(),
            "Primary operation failed, using fallback"
        );

        match fallback().await {
            Ok(value) => {
                if options.show_offline_mode {
                    self.notify_degraded(options).await;
                }
                RecoveryResult {
                    outcome: Ok(value),
                    attempts_used: 2,
                    total_time: start_time.elapsed(),
                    recovery_actions: DEGRADED_RECOVERY_ACTIONS
                        .iter()
                        .map(|s| (*s).to_string())
                        .collect(),
                }
            }
            Err(fallback_error) => {
                log_error!(
                    operation = operation_name,
                    primary_error = %primary_error,
                    fallback_error = %fallback_error,
                    "Primary and fallback operations both failed"
                );
                let recovery_actions = primary_error.recovery_actions().to_vec();
                RecoveryResult {
                    outcome: Err(primary_error),
                    attempts_used: 2,
                    total_time: start_time.elapsed(),
                    recovery_actions,
                }
            }
        }
    }

    async fn notify_degraded(&self, options: &DegradationOptions) {
        let Some(host) = &self.host else {
            return;
        };
        let message = options
            .fallback_message
            .clone()
            .unwrap_or_else(|| DEFAULT_OFFLINE_MESSAGE.to_string());
        host.show_notification(Notification::new(NotificationLevel::Warning, message))
            .await;
    }

    /// Try to get past `error` without user involvement.
    ///
    /// Returns `true` once the caller may retry immediately; waits (cancellably) where
    /// the category calls for it. Never fails.
    pub async fn attempt_auto_recovery(&self, error: &TypedError) -> bool {
        let config = &self.auto_recovery;
        let wait = match error.code() {
            ErrorCode::Authentication(AuthenticationCode::NetworkError) => {
                Some(config.auth_network_delay)
            }
            ErrorCode::Authentication(_) => {
                self.prompt_for_credentials(error).await;
                None
            }
            ErrorCode::Network(NetworkCode::Timeout | NetworkCode::ConnectionRefused) => {
                Some(config.network_retry_delay)
            }
            ErrorCode::Network(NetworkCode::RateLimited) => {
                let hinted =
                    retry_after_hint(error).unwrap_or(config.default_rate_limit_wait);
                Some(hinted.min(config.max_rate_limit_wait))
            }
            ErrorCode::Network(
                NetworkCode::ServerError
                | NetworkCode::BadGateway
                | NetworkCode::ServiceUnavailable,
            ) => Some(config.server_error_delay),
            ErrorCode::Resource(ResourceCode::ResourceBusy) => Some(config.resource_busy_delay),
            _ => None,
        };

        let Some(delay) = wait else {
            log_debug!(
                error_code = %error.code(),
                "No automatic recovery available"
            );
            return false;
        };

        log_info!(
            error_code = %error.code(),
            delay_ms = delay.as_millis() as u64,
            "Waiting before automatic retry"
        );
        cancellable_sleep(delay, &self.shutdown).await
    }

    async fn prompt_for_credentials(&self, error: &TypedError) {
        let Some(host) = &self.host else {
            return;
        };
        if !self.auto_recovery.prompt_for_credentials {
            return;
        }
        let notification = Notification::new(
            NotificationLevel::Warning,
            "Your Azure DevOps credentials need attention.",
        )
        .with_detail(error.user_message().to_string())
        .with_actions(vec!["Configure".to_string()]);

        if host.show_notification(notification).await.as_deref() == Some("Configure") {
            if let Err(e) = host.execute_command(commands::CONFIGURE.to_string()).await {
                log_error!(error = %e, "Failed to open extension configuration");
            }
        }
    }

    pub fn circuit_state(&self, operation_name: &str) -> CircuitState {
        self.breakers.state(operation_name)
    }

    /// Force the breaker for `operation_name` closed.
    pub fn reset_circuit_breaker(&self, operation_name: &str) {
        self.breakers.reset(operation_name);
    }

    pub fn reset_all_circuit_breakers(&self) {
        self.breakers.reset_all();
    }

    /// Cancel in-flight waits and forget all breaker state.
    pub fn dispose(&self) {
        self.shutdown.cancel();
        self.breakers.reset_all();
    }
}

/// `retryAfter` context hint in seconds.
fn retry_after_hint(error: &TypedError) -> Option<Duration> {
    match error.context().get("retryAfter")? {
        Value::Number(n) => n
            .as_f64()
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
        Value::String(s) => s.trim().parse::<u64>().ok().map(Duration::from_secs),
        _ => None,
    }
}
