// Unit Tests for Configuration
//
// UNIT UNDER TEST: ResilienceConfig and its component configs
//
// BUSINESS RESPONSIBILITY:
//   - Provides production defaults for retry, breaker, rate-limit and messaging policy
//   - Accepts partial settings payloads from the host
//   - Rejects values that would make recovery behave nonsensically
//
// TEST COVERAGE:
//   - Default values
//   - Partial JSON payloads fall back to defaults
//   - Validation failures surface as configuration errors

use crate::config::*;
use crate::error::{ConfigurationCode, ErrorCode, ErrorSeverity};
use std::time::Duration;

#[cfg(test)]
mod default_tests {
    use super::*;

    #[test]
    fn test_retry_defaults_match_production_policy() {
        // Arrange & Act
        let config = RetryConfig::default();

        // Assert
        assert_eq!(config.max_retries, 3, "Should retry three times after the first attempt");
        assert_eq!(config.base_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert_eq!(config.backoff_multiplier, 2.0);
        assert!(config.jitter_enabled);
        assert!(config.retry_condition.is_none());
    }

    #[test]
    fn test_breaker_and_rate_limit_defaults() {
        // Arrange & Act
        let breaker = CircuitBreakerConfig::default();
        let rate_limit = RateLimitConfig::default();
        let notifications = NotificationConfig::default();

        // Assert
        assert_eq!(breaker.failure_threshold, 5);
        assert_eq!(breaker.recovery_timeout, Duration::from_secs(60));
        assert_eq!(breaker.monitoring_period, Duration::from_secs(300));
        assert_eq!(rate_limit.max_errors_per_session, 50);
        assert_eq!(rate_limit.cooldown, Duration::from_secs(5));
        assert_eq!(notifications.min_notification_severity, ErrorSeverity::Medium);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(ResilienceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_retry_condition_builder_installs_predicate() {
        // Arrange
        let config = RetryConfig::default()
            .with_max_retries(1)
            .with_retry_condition(|_, attempt| attempt == 0);

        // Act
        let condition = config.retry_condition.expect("condition installed");
        let error = crate::error::TypedError::network(
            crate::error::NetworkCode::Timeout,
            "timed out",
        );

        // Assert
        assert_eq!(config.max_retries, 1);
        assert!(condition.should_retry(&error, 0));
        assert!(!condition.should_retry(&error, 1));
        assert_eq!(format!("{condition:?}"), "RetryCondition(..)");
    }
}

#[cfg(test)]
mod parsing_tests {
    use super::*;

    #[test]
    fn test_partial_payload_falls_back_to_defaults() {
        // Arrange
        let json = r#"{
            "retry": { "max_retries": 5 },
            "notifications": { "min_notification_severity": "high" }
        }"#;

        // Act
        let config = ResilienceConfig::from_json_str(json).expect("payload is valid");

        // Assert
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.base_delay, Duration::from_secs(1), "Unset fields keep defaults");
        assert_eq!(
            config.notifications.min_notification_severity,
            ErrorSeverity::High
        );
        assert_eq!(config.circuit_breaker, CircuitBreakerConfig::default());
    }

    #[test]
    fn test_malformed_payload_is_invalid_config() {
        // Act
        let error = ResilienceConfig::from_json_str("{ retry: ").expect_err("not JSON");

        // Assert
        assert_eq!(error.code(), ErrorCode::from(ConfigurationCode::InvalidConfig));
    }
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    fn assert_invalid(config: ResilienceConfig, reason: &str) {
        let error = config.validate().expect_err(reason);
        assert_eq!(
            error.code(),
            ErrorCode::from(ConfigurationCode::InvalidConfig),
            "{reason}"
        );
    }

    #[test]
    fn test_rejects_shrinking_backoff() {
        let mut config = ResilienceConfig::default();
        config.retry.backoff_multiplier = 0.5;
        assert_invalid(config, "multiplier below 1.0");
    }

    #[test]
    fn test_rejects_max_delay_below_base_delay() {
        let mut config = ResilienceConfig::default();
        config.retry.max_delay = Duration::from_millis(100);
        assert_invalid(config, "max_delay shorter than base_delay");
    }

    #[test]
    fn test_rejects_zero_failure_threshold() {
        let mut config = ResilienceConfig::default();
        config.circuit_breaker.failure_threshold = 0;
        assert_invalid(config, "zero threshold");
    }

    #[test]
    fn test_rejects_empty_history() {
        let mut config = ResilienceConfig::default();
        config.diagnostics.max_history = 0;
        assert_invalid(config, "zero history");
    }
}
