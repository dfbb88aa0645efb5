//! Host UI collaborator.
//!
//! The error-handling core never talks to the editor directly. Everything it needs
//! from the host (notifications, read-only documents, command execution, the output
//! channel) goes through [`HostUi`], so the core can run headless and in tests.

use crate::error::ErrorResult;
use crate::logging::{log_error, log_info, log_warn};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Visual level of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// A notification request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    /// Modal notifications block until the user responds
    pub modal: bool,
    pub message: String,
    pub detail: Option<String>,
    /// Button labels, in display order
    pub actions: Vec<String>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            modal: false,
            message: message.into(),
            detail: None,
            actions: Vec::new(),
        }
    }

    pub fn modal(mut self) -> Self {
        self.modal = true;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_actions(mut self, actions: Vec<String>) -> Self {
        self.actions = actions;
        self
    }
}

/// Content type of a read-only document opened in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentLanguage {
    Json,
    Markdown,
}

/// Capabilities the error-handling core consumes from the editor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HostUi: Send + Sync {
    /// Show a notification and wait for the user's choice, if any.
    async fn show_notification(&self, notification: Notification) -> Option<String>;

    /// Open a read-only document with the given content.
    async fn open_document(&self, content: String, language: DocumentLanguage) -> ErrorResult<()>;

    /// Run an editor or extension command by id.
    async fn execute_command(&self, command: String) -> ErrorResult<()>;

    /// Append one line to the extension's output channel.
    fn append_output(&self, line: &str);
}

/// Host that only writes to the tracing log. Used when no editor is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyHost;

#[async_trait]
impl HostUi for LogOnlyHost {
    async fn show_notification(&self, notification: Notification) -> Option<String> {
        match notification.level {
            NotificationLevel::Error => log_error!(
                modal = notification.modal,
                text = %notification.message,
                "Notification"
            ),
            NotificationLevel::Warning => {
                log_warn!(text = %notification.message, "Notification")
            }
            NotificationLevel::Info => log_info!(text = %notification.message, "Notification"),
        }
        None
    }

    async fn open_document(&self, content: String, language: DocumentLanguage) -> ErrorResult<()> {
        log_info!(language = ?language, bytes = content.len(), "Document requested");
        Ok(())
    }

    async fn execute_command(&self, command: String) -> ErrorResult<()> {
        log_info!(command = %command, "Command requested");
        Ok(())
    }

    fn append_output(&self, line: &str) {
        log_info!(target: "output", "{line}");
    }
}

/// Command ids the error-handling core asks the host to run.
pub mod commands {
    pub const CONFIGURE: &str = "azurePipelines.configure";
    pub const REFRESH: &str = "azurePipelines.refresh";
    pub const SHOW_ERROR_DETAILS: &str = "azurePipelines.showErrorDetails";
    pub const REPORT_ISSUE: &str = "azurePipelines.reportIssue";
    pub const OPEN_SETTINGS: &str = "workbench.action.openSettings";
    pub const RELOAD_WINDOW: &str = "workbench.action.reloadWindow";
}
