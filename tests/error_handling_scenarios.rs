//! End-to-end Scenarios for Error Handling and Recovery
//!
//! UNIT UNDER TEST: ErrorServices (public API)
//!
//! BUSINESS RESPONSIBILITY:
//!   - Tell users clearly when their credentials are wrong
//!   - Absorb transient network blips without any user-visible noise
//!   - Keep showing cached data when Azure DevOps is unreachable
//!   - Produce a support report after a burst of failures
//!
//! TEST COVERAGE:
//!   - Invalid PAT from credential validation through to the notification
//!   - Transient timeouts absorbed by retry
//!   - Degraded mode with offline notice
//!   - Spike detection and diagnostics export

mod common;

use common::{create_test_services, fast_retry_config};
use pipeline_resilience::credentials::validate_credentials_format;
use pipeline_resilience::diagnostics::DiagnosticReport;
use pipeline_resilience::{
    AuthenticationCode, DegradationOptions, ErrorContext, HandleOptions, NetworkCode,
    NotificationLevel, TypedError,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[tokio::test]
async fn test_invalid_pat_reaches_user_as_plain_language_error() {
    // Arrange
    let (services, host) = create_test_services();

    // Act
    let error = validate_credentials_format("org", "bad-token").expect_err("token is malformed");
    let outcome = services
        .handler()
        .handle_error(error, ErrorContext::new(), HandleOptions::default())
        .await;

    // Assert
    assert_eq!(outcome.error.code(), AuthenticationCode::InvalidPat.into());
    let notifications = host.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].level, NotificationLevel::Error);
    assert!(!notifications[0].modal);
    assert!(notifications[0]
        .message
        .contains("Personal Access Token appears to be invalid"));
    assert_eq!(services.diagnostics().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transient_network_blip_is_invisible_to_user() {
    // Arrange
    let (services, host) = create_test_services();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);

    // Act
    let result = services
        .recovery()
        .with_retry(
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(TypedError::network(NetworkCode::Timeout, "request timed out"))
                    } else {
                        Ok(vec!["CI", "Release"])
                    }
                }
            },
            "listPipelines",
            &fast_retry_config(3),
        )
        .await;

    // Assert
    assert!(result.is_success());
    assert_eq!(result.attempts_used, 3);
    assert!(host.notifications().is_empty(), "No notification for absorbed failures");
    assert!(services.diagnostics().is_empty());
}

#[tokio::test]
async fn test_unreachable_service_falls_back_to_cache() {
    // Arrange
    let (services, host) = create_test_services();
    let options = DegradationOptions {
        show_offline_mode: true,
        fallback_message: Some("Showing cached pipelines".to_string()),
    };

    // Act
    let result = services
        .recovery()
        .with_graceful_degradation(
            || async {
                Err(TypedError::network(
                    NetworkCode::ConnectionRefused,
                    "connect ECONNREFUSED",
                ))
            },
            || async { Ok(vec!["CI (cached)"]) },
            "listPipelines",
            &options,
        )
        .await;

    // Assert
    assert_eq!(result.value(), Some(&vec!["CI (cached)"]));
    assert_eq!(result.attempts_used, 2);
    let notifications = host.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].message, "Showing cached pipelines");
}

#[tokio::test]
async fn test_error_burst_is_visible_in_exported_report() {
    // Arrange
    let (services, _host) = create_test_services();
    for i in 0..6 {
        services
            .handler()
            .handle_error_silently(
                TypedError::network(NetworkCode::ServerError, format!("HTTP 500 on call {i}")),
                ErrorContext::new(),
            )
            .await;
    }

    // Act
    let json = services
        .diagnostics()
        .export_diagnostics()
        .expect("report serializes");

    // Assert
    let report: DiagnosticReport = serde_json::from_str(&json).expect("report parses");
    assert!(report.pattern_analysis.is_error_spike);
    assert_eq!(
        report.pattern_analysis.dominant_error_type.as_deref(),
        Some("NetworkError")
    );
    assert_eq!(report.recent_errors.len(), 6);
    assert_eq!(
        report.recent_errors,
        services.diagnostics().recent_records(20),
        "Exported records parse back unchanged"
    );
    assert_eq!(report.statistics.errors_by_code["NETWORK_SERVER_ERROR"], 6);
    assert_eq!(report.system_info.host_app_name, "Visual Studio Code");
}
