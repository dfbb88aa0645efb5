//! Test fixtures shared across unit test modules.
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

#![allow(dead_code)]

use crate::config::{
    AutoRecoveryConfig, CircuitBreakerConfig, DiagnosticsConfig, MessageConfig,
    NotificationConfig, RateLimitConfig, RetryConfig,
};
use crate::diagnostics::{DiagnosticsCollector, EnvironmentInfo};
use crate::error::ErrorResult;
use crate::handler::ErrorHandler;
use crate::host::{DocumentLanguage, HostUi, Notification};
use crate::messages::MessageTranslator;
use crate::recovery::ErrorRecovery;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Host that records every interaction and answers notifications with a fixed choice.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub notifications: Mutex<Vec<Notification>>,
    pub documents: Mutex<Vec<(String, DocumentLanguage)>>,
    pub commands: Mutex<Vec<String>>,
    pub output: Mutex<Vec<String>>,
    response: Mutex<Option<String>>,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Host whose notifications are answered by clicking `label`.
    pub fn answering(label: &str) -> Arc<Self> {
        let host = Self::default();
        *host.response.lock() = Some(label.to_string());
        Arc::new(host)
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }

    pub fn documents(&self) -> Vec<(String, DocumentLanguage)> {
        self.documents.lock().clone()
    }

    pub fn output(&self) -> Vec<String> {
        self.output.lock().clone()
    }
}

#[async_trait]
impl HostUi for RecordingHost {
    async fn show_notification(&self, notification: Notification) -> Option<String> {
        self.notifications.lock().push(notification);
        self.response.lock().clone()
    }

    async fn open_document(&self, content: String, language: DocumentLanguage) -> ErrorResult<()> {
        self.documents.lock().push((content, language));
        Ok(())
    }

    async fn execute_command(&self, command: String) -> ErrorResult<()> {
        self.commands.lock().push(command);
        Ok(())
    }

    fn append_output(&self, line: &str) {
        self.output.lock().push(line.to_string());
    }
}

/// Retry policy with short, deterministic delays.
pub fn fast_retry_config(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        backoff_multiplier: 2.0,
        jitter_enabled: false,
        retry_condition: None,
    }
}

pub fn test_recovery(host: Arc<dyn HostUi>) -> Arc<ErrorRecovery> {
    Arc::new(
        ErrorRecovery::new(CircuitBreakerConfig::default(), AutoRecoveryConfig::default())
            .with_host(host),
    )
}

pub fn test_diagnostics() -> Arc<DiagnosticsCollector> {
    Arc::new(DiagnosticsCollector::new(
        DiagnosticsConfig::default(),
        EnvironmentInfo::default(),
    ))
}

/// Handler wired to `host` with default configuration.
pub fn test_handler(host: Arc<dyn HostUi>) -> ErrorHandler {
    test_handler_with(host, RateLimitConfig::default(), NotificationConfig::default())
}

pub fn test_handler_with(
    host: Arc<dyn HostUi>,
    rate_limit: RateLimitConfig,
    notifications: NotificationConfig,
) -> ErrorHandler {
    ErrorHandler::new(
        rate_limit,
        notifications,
        Arc::clone(&host),
        test_recovery(host),
        test_diagnostics(),
        MessageTranslator::new(MessageConfig::default()),
    )
}
