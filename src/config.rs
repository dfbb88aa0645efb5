//! Configuration value objects for retry, circuit breaking, rate limiting,
//! messaging and diagnostics.
//!
//! All types deserialize from the extension's settings payload with every field
//! optional; missing fields fall back to the `Default` impls below.

use crate::error::{ConfigurationCode, ErrorResult, ErrorSeverity, TypedError};
use crate::logging::log_debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Caller-supplied predicate deciding whether a failed attempt is retried.
///
/// Receives the error and the zero-based index of the attempt that failed.
#[derive(Clone)]
pub struct RetryCondition(Arc<dyn Fn(&TypedError, u32) -> bool + Send + Sync>);

impl RetryCondition {
    pub fn new(predicate: impl Fn(&TypedError, u32) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    pub fn should_retry(&self, error: &TypedError, attempt: u32) -> bool {
        (self.0)(error, attempt)
    }
}

impl fmt::Debug for RetryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RetryCondition(..)")
    }
}

/// Retry policy for [`ErrorRecovery::with_retry`](crate::recovery::ErrorRecovery::with_retry).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt; the operation runs at most `max_retries + 1` times
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Perturb each delay by up to ±25%
    pub jitter_enabled: bool,
    #[serde(skip)]
    pub retry_condition: Option<RetryCondition>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter_enabled: true,
            retry_condition: None,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_condition(
        mut self,
        predicate: impl Fn(&TypedError, u32) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.retry_condition = Some(RetryCondition::new(predicate));
        self
    }
}

/// Thresholds for the per-operation circuit breaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the breaker
    pub failure_threshold: u32,
    /// How long an open breaker blocks calls before admitting a probe
    pub recovery_timeout: Duration,
    /// Failures further apart than this restart the count
    pub monitoring_period: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
            monitoring_period: Duration::from_secs(300),
        }
    }
}

/// Options for [`ErrorRecovery::with_graceful_degradation`](crate::recovery::ErrorRecovery::with_graceful_degradation).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DegradationOptions {
    /// Tell the user the extension is running on fallback data
    pub show_offline_mode: bool,
    /// Replaces the default offline-mode notification text
    pub fallback_message: Option<String>,
}

/// Waits used by automatic recovery before signalling "retry now".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoRecoveryConfig {
    pub network_retry_delay: Duration,
    pub server_error_delay: Duration,
    pub resource_busy_delay: Duration,
    pub auth_network_delay: Duration,
    /// Used when a rate-limited error carries no `retryAfter` hint
    pub default_rate_limit_wait: Duration,
    /// Ceiling for any `retryAfter` hint
    pub max_rate_limit_wait: Duration,
    /// Offer to open the configuration when credentials need user action
    pub prompt_for_credentials: bool,
}

impl Default for AutoRecoveryConfig {
    fn default() -> Self {
        Self {
            network_retry_delay: Duration::from_secs(2),
            server_error_delay: Duration::from_secs(5),
            resource_busy_delay: Duration::from_secs(3),
            auth_network_delay: Duration::from_secs(2),
            default_rate_limit_wait: Duration::from_secs(60),
            max_rate_limit_wait: Duration::from_secs(300),
            prompt_for_credentials: true,
        }
    }
}

/// Session-level suppression of repeated errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_errors_per_session: u32,
    /// Identical errors inside this window are not handled again
    pub cooldown: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_errors_per_session: 50,
            cooldown: Duration::from_secs(5),
        }
    }
}

/// How loudly handled errors are surfaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub show_notifications: bool,
    /// Errors below this severity are log-only
    pub min_notification_severity: ErrorSeverity,
    pub log_to_output: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            show_notifications: true,
            min_notification_severity: ErrorSeverity::Medium,
            log_to_output: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    /// Prefix messages with the qualified error code
    pub include_error_codes: bool,
    /// Append the technical message after the friendly one
    pub include_technical_details: bool,
    pub max_technical_detail_length: usize,
    pub max_message_length: usize,
    /// Replace jargon in recovery suggestions
    pub simple_language: bool,
    pub show_recovery_actions: bool,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            include_error_codes: false,
            include_technical_details: false,
            max_technical_detail_length: 100,
            max_message_length: 200,
            simple_language: false,
            show_recovery_actions: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Ring buffer capacity
    pub max_history: usize,
    /// Records included in a diagnostic report
    pub max_report_errors: usize,
    pub spike_window: Duration,
    /// A spike needs strictly more than this many recent errors inside the window
    pub spike_threshold: usize,
    /// How many of the latest records pattern analysis looks at
    pub pattern_sample_size: usize,
    /// Response times kept for rolling performance metrics
    pub performance_sample_size: usize,
    pub user_agent: String,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            max_history: 100,
            max_report_errors: 20,
            spike_window: Duration::from_secs(300),
            spike_threshold: 5,
            pattern_sample_size: 10,
            performance_sample_size: 100,
            user_agent: format!("azure-pipelines-vscode/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Complete configuration for the error-handling services.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    pub retry: RetryConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub auto_recovery: AutoRecoveryConfig,
    pub rate_limit: RateLimitConfig,
    pub notifications: NotificationConfig,
    pub messages: MessageConfig,
    pub diagnostics: DiagnosticsConfig,
}

impl ResilienceConfig {
    /// Parse the JSON settings payload handed over by the host and validate it.
    ///
    /// # Errors
    ///
    /// Returns a Configuration/INVALID_CONFIG error if the payload is not valid JSON
    /// for this schema or fails [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> ErrorResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            TypedError::configuration(
                ConfigurationCode::InvalidConfig,
                format!("Failed to parse error handling settings: {e}"),
            )
        })?;
        config.validate()?;
        log_debug!(
            max_retries = config.retry.max_retries,
            failure_threshold = config.circuit_breaker.failure_threshold,
            max_errors_per_session = config.rate_limit.max_errors_per_session,
            "Loaded error handling configuration"
        );
        Ok(config)
    }

    /// Reject values that would make retry, breaker or messaging behave nonsensically.
    pub fn validate(&self) -> ErrorResult<()> {
        let invalid = |message: &str| {
            Err(TypedError::configuration(
                ConfigurationCode::InvalidConfig,
                message.to_string(),
            ))
        };

        if self.retry.backoff_multiplier < 1.0 {
            return invalid("retry.backoff_multiplier must be at least 1.0");
        }
        if self.retry.max_delay < self.retry.base_delay {
            return invalid("retry.max_delay must not be shorter than retry.base_delay");
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return invalid("circuit_breaker.failure_threshold must be greater than zero");
        }
        if self.auto_recovery.max_rate_limit_wait < self.auto_recovery.default_rate_limit_wait {
            return invalid(
                "auto_recovery.max_rate_limit_wait must not be shorter than default_rate_limit_wait",
            );
        }
        if self.messages.max_message_length < 10 {
            return invalid("messages.max_message_length must be at least 10 characters");
        }
        if self.diagnostics.max_history == 0 {
            return invalid("diagnostics.max_history must be greater than zero");
        }
        if self.diagnostics.pattern_sample_size == 0 {
            return invalid("diagnostics.pattern_sample_size must be greater than zero");
        }
        Ok(())
    }
}
