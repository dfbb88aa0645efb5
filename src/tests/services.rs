// Unit Tests for ErrorServices
//
// UNIT UNDER TEST: ErrorServices (composition root)
//
// BUSINESS RESPONSIBILITY:
//   - Wires recovery, diagnostics, translation and handling around one host
//   - Refuses to start with invalid configuration
//   - Tears everything down on extension deactivation
//
// TEST COVERAGE:
//   - Construction with defaults and with invalid config
//   - Handled errors land in the shared diagnostics collector
//   - Dispose cancels recovery and clears state

use super::helpers::{fast_retry_config, RecordingHost};
use crate::config::ResilienceConfig;
use crate::diagnostics::EnvironmentInfo;
use crate::error::*;
use crate::handler::HandleOptions;
use crate::services::ErrorServices;

#[cfg(test)]
mod wiring_tests {
    use super::*;

    #[test]
    fn test_invalid_config_is_rejected() {
        // Arrange
        let mut config = ResilienceConfig::default();
        config.circuit_breaker.failure_threshold = 0;

        // Act
        let result = ErrorServices::new(config, RecordingHost::new(), EnvironmentInfo::default());

        // Assert
        assert_eq!(
            result.err().map(|e| e.code()),
            Some(ConfigurationCode::InvalidConfig.into())
        );
    }

    #[tokio::test]
    async fn test_handler_and_collector_share_history() {
        // Arrange
        let services = ErrorServices::new(
            ResilienceConfig::default(),
            RecordingHost::new(),
            EnvironmentInfo::default(),
        )
        .expect("default config is valid");

        // Act
        services
            .handler()
            .handle_error(
                TypedError::network(NetworkCode::Timeout, "timed out"),
                ErrorContext::new(),
                HandleOptions::default(),
            )
            .await;

        // Assert
        assert_eq!(services.diagnostics().len(), 1);
        assert_eq!(services.handler().get_statistics().session_error_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_clears_state_and_cancels_retries() {
        // Arrange
        let services = ErrorServices::new(
            ResilienceConfig::default(),
            RecordingHost::new(),
            EnvironmentInfo::default(),
        )
        .expect("default config is valid");
        services
            .handler()
            .handle_error_silently(
                TypedError::network(NetworkCode::Timeout, "timed out"),
                ErrorContext::new(),
            )
            .await;

        // Act
        services.dispose();
        let result = services
            .recovery()
            .with_retry(|| async { Ok::<_, TypedError>(()) }, "listRuns", &fast_retry_config(1))
            .await;

        // Assert
        assert!(services.diagnostics().is_empty());
        assert_eq!(services.handler().get_statistics().session_error_count, 0);
        assert_eq!(
            result.error().map(TypedError::code),
            Some(ExtensionCode::DisposalError.into())
        );
    }
}
