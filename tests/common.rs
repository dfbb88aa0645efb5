//! Test helper utilities for pipeline-resilience integration tests
//!
//! This module provides a recording host and service builders shared by the
//! scenario tests.
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

// Allow dead code in test utilities - functions are used across different test files
#![allow(dead_code)]

use async_trait::async_trait;
use pipeline_resilience::{
    DocumentLanguage, EnvironmentInfo, ErrorResult, ErrorServices, HostUi, Notification,
    ResilienceConfig, RetryConfig,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Host that records notifications, documents and commands instead of showing them.
#[derive(Debug, Default)]
pub struct RecordingHost {
    notifications: Mutex<Vec<Notification>>,
    documents: Mutex<Vec<(String, DocumentLanguage)>>,
    commands: Mutex<Vec<String>>,
    output: Mutex<Vec<String>>,
}

impl RecordingHost {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().expect("lock poisoned").clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().expect("lock poisoned").clone()
    }

    pub fn documents(&self) -> Vec<(String, DocumentLanguage)> {
        self.documents.lock().expect("lock poisoned").clone()
    }

    pub fn output(&self) -> Vec<String> {
        self.output.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl HostUi for RecordingHost {
    async fn show_notification(&self, notification: Notification) -> Option<String> {
        self.notifications
            .lock()
            .expect("lock poisoned")
            .push(notification);
        None
    }

    async fn open_document(&self, content: String, language: DocumentLanguage) -> ErrorResult<()> {
        self.documents
            .lock()
            .expect("lock poisoned")
            .push((content, language));
        Ok(())
    }

    async fn execute_command(&self, command: String) -> ErrorResult<()> {
        self.commands.lock().expect("lock poisoned").push(command);
        Ok(())
    }

    fn append_output(&self, line: &str) {
        self.output
            .lock()
            .expect("lock poisoned")
            .push(line.to_string());
    }
}

/// Services with default configuration around a fresh recording host.
pub fn create_test_services() -> (ErrorServices, Arc<RecordingHost>) {
    let host = Arc::new(RecordingHost::default());
    let services = ErrorServices::new(
        ResilienceConfig::default(),
        host.clone(),
        EnvironmentInfo {
            host_app_name: "Visual Studio Code".to_string(),
            host_app_version: "1.95.0".to_string(),
            extension_version: "0.4.0".to_string(),
            registered_commands: vec!["azurePipelines.refresh".to_string()],
        },
    )
    .expect("default configuration is valid");
    (services, host)
}

/// Retry policy with the production shape but millisecond delays.
pub fn fast_retry_config(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(100),
        jitter_enabled: false,
        ..RetryConfig::default()
    }
}
