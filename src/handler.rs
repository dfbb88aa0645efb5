//! Central error handler.
//!
//! Every failure in the extension ends up here. The handler normalizes it into a
//! [`TypedError`], suppresses notification storms, logs a structured line, records
//! diagnostics and tells the user about it in proportion to its severity.

use crate::config::{NotificationConfig, RateLimitConfig};
use crate::diagnostics::DiagnosticsCollector;
use crate::error::{ErrorCode, ErrorContext, ErrorResult, ErrorSeverity, TypedError};
use crate::host::{DocumentLanguage, HostUi, Notification, NotificationLevel};
use crate::internals::classifier::classify;
use crate::logging::{log_debug, log_error, log_info, log_warn};
use crate::messages::{category_title, ContextualHelp, MessageTranslator, VIEW_DETAILS_LABEL};
use crate::recovery::ErrorRecovery;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::time::Instant;

pub const EXPORT_DIAGNOSTICS_LABEL: &str = "Export Diagnostics";

/// Per-call switches for [`ErrorHandler::handle_error`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleOptions {
    /// Skip the user notification
    pub silent: bool,
    /// Bypass rate limiting
    pub force: bool,
    /// Render the notification as critical whatever the error's severity
    pub force_modal: bool,
    /// Ask the recovery engine to wait out retryable errors before returning
    pub attempt_recovery: bool,
}

/// Why an error was not handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateLimitReason {
    /// The session already handled the configured maximum number of errors
    SessionLimitReached,
    /// The same code and message were handled within the cooldown window
    Cooldown,
}

/// What [`ErrorHandler::handle_error`] actually did.
#[derive(Debug, Clone)]
pub struct HandleOutcome {
    pub error: TypedError,
    pub handled: bool,
    pub rate_limited: Option<RateLimitReason>,
    pub logged: bool,
    pub diagnostics_recorded: bool,
    pub notified: bool,
    /// Label of the notification action the user picked
    pub user_action: Option<String>,
    pub recovery_attempted: bool,
    pub recovered: bool,
}

impl HandleOutcome {
    fn new(error: TypedError) -> Self {
        Self {
            error,
            handled: false,
            rate_limited: None,
            logged: false,
            diagnostics_recorded: false,
            notified: false,
            user_action: None,
            recovery_attempted: false,
            recovered: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerStatistics {
    pub session_error_count: u32,
    pub suppressed_count: u32,
    pub errors_by_type: BTreeMap<String, u32>,
    pub errors_by_code: BTreeMap<String, u32>,
}

#[derive(Debug, Default)]
struct HandlerState {
    stats: HandlerStatistics,
    last_seen: HashMap<(ErrorCode, String), Instant>,
}

pub struct ErrorHandler {
    rate_limit: RateLimitConfig,
    notifications: NotificationConfig,
    host: Arc<dyn HostUi>,
    recovery: Arc<ErrorRecovery>,
    diagnostics: Arc<DiagnosticsCollector>,
    translator: MessageTranslator,
    state: Mutex<HandlerState>,
}

impl ErrorHandler {
    pub fn new(
        rate_limit: RateLimitConfig,
        notifications: NotificationConfig,
        host: Arc<dyn HostUi>,
        recovery: Arc<ErrorRecovery>,
        diagnostics: Arc<DiagnosticsCollector>,
        translator: MessageTranslator,
    ) -> Self {
        Self {
            rate_limit,
            notifications,
            host,
            recovery,
            diagnostics,
            translator,
            state: Mutex::new(HandlerState::default()),
        }
    }

    pub fn translator(&self) -> &MessageTranslator {
        &self.translator
    }

    /// Classify, rate-limit, log, record and surface a failure.
    pub async fn handle_error(
        &self,
        error: impl Into<anyhow::Error>,
        context: ErrorContext,
        options: HandleOptions,
    ) -> HandleOutcome {
        let typed = classify(&error.into());
        let mut outcome = HandleOutcome::new(typed);
        let error = outcome.error.clone();

        let exempt = options.force || error.severity() == ErrorSeverity::Critical;
        if !exempt {
            if let Some(reason) = self.check_rate_limit(&error) {
                log_debug!(
                    error_code = %error.code(),
                    error_id = %error.error_id(),
                    reason = ?reason,
                    "Error suppressed by rate limiting"
                );
                outcome.rate_limited = Some(reason);
                return outcome;
            }
        } else {
            self.mark_seen(&error);
        }
        outcome.handled = true;

        self.log_error(&error, &context);
        outcome.logged = true;

        self.diagnostics.collect_error_diagnostics(&error, context);
        outcome.diagnostics_recorded = true;

        if options.attempt_recovery && error.is_retryable() {
            outcome.recovery_attempted = true;
            outcome.recovered = self.recovery.attempt_auto_recovery(&error).await;
        }

        let severity = if options.force_modal {
            ErrorSeverity::Critical
        } else {
            error.severity()
        };
        let show = options.force_modal || (!options.silent && self.should_notify(severity));
        if show {
            outcome.user_action = self.notify(&error, severity).await;
            outcome.notified = true;
        }

        self.count(&error);
        outcome
    }

    /// Handle an error as critical: never rate limited, always shown modally.
    pub async fn handle_critical_error(
        &self,
        error: impl Into<anyhow::Error>,
        context: ErrorContext,
    ) -> HandleOutcome {
        let options = HandleOptions {
            force: true,
            force_modal: true,
            ..HandleOptions::default()
        };
        self.handle_error(error, context, options).await
    }

    /// Handle an error without notifying the user.
    pub async fn handle_error_silently(
        &self,
        error: impl Into<anyhow::Error>,
        context: ErrorContext,
    ) -> HandleOutcome {
        let options = HandleOptions {
            silent: true,
            ..HandleOptions::default()
        };
        self.handle_error(error, context, options).await
    }

    fn should_notify(&self, severity: ErrorSeverity) -> bool {
        self.notifications.show_notifications
            && severity >= self.notifications.min_notification_severity
    }

    fn check_rate_limit(&self, error: &TypedError) -> Option<RateLimitReason> {
        let mut state = self.state.lock();
        let reason = if state.stats.session_error_count >= self.rate_limit.max_errors_per_session {
            Some(RateLimitReason::SessionLimitReached)
        } else {
            let key = (error.code(), error.message().to_string());
            let now = Instant::now();
            let recently_seen = state
                .last_seen
                .get(&key)
                .is_some_and(|seen| now.duration_since(*seen) < self.rate_limit.cooldown);
            if recently_seen {
                Some(RateLimitReason::Cooldown)
            } else {
                state.last_seen.insert(key, now);
                None
            }
        };
        if reason.is_some() {
            state.stats.suppressed_count += 1;
        }
        reason
    }

    fn mark_seen(&self, error: &TypedError) {
        self.state
            .lock()
            .last_seen
            .insert((error.code(), error.message().to_string()), Instant::now());
    }

    fn log_error(&self, error: &TypedError, context: &ErrorContext) {
        let mut merged = error.context().clone();
        merged.extend(context.clone());

        let line = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "severity": error.severity(),
            "code": error.code().to_string(),
            "errorId": error.error_id(),
            "message": error.message(),
            "userMessage": error.user_message(),
            "retryable": error.is_retryable(),
            "heuristic": error.is_heuristic(),
            "context": Value::Object(merged),
            "recoveryActions": error.recovery_actions(),
        });

        match error.severity() {
            ErrorSeverity::Critical | ErrorSeverity::High => log_error!(
                error_id = %error.error_id(),
                error_code = %error.code(),
                severity = %error.severity(),
                retryable = error.is_retryable(),
                error_message = %error.message(),
                "Error handled"
            ),
            ErrorSeverity::Medium => log_warn!(
                error_id = %error.error_id(),
                error_code = %error.code(),
                retryable = error.is_retryable(),
                error_message = %error.message(),
                "Error handled"
            ),
            ErrorSeverity::Low => log_info!(
                error_id = %error.error_id(),
                error_code = %error.code(),
                error_message = %error.message(),
                "Error handled"
            ),
        }

        if self.notifications.log_to_output {
            self.host.append_output(&line.to_string());
        }
    }

    async fn notify(&self, error: &TypedError, severity: ErrorSeverity) -> Option<String> {
        let help = self.translator.get_contextual_help(error);
        let suggestions = self.translator.get_recovery_suggestions(error);

        let notification = match severity {
            ErrorSeverity::Critical => {
                let mut actions = Vec::new();
                if let Some(primary) = help.primary_action() {
                    actions.push(primary.label.clone());
                }
                actions.push(EXPORT_DIAGNOSTICS_LABEL.to_string());
                actions.push(VIEW_DETAILS_LABEL.to_string());

                let mut notification = Notification::new(NotificationLevel::Error, &help.message)
                    .modal()
                    .with_actions(actions);
                if !suggestions.is_empty() {
                    notification = notification.with_detail(suggestions.join("\n"));
                }
                notification
            }
            ErrorSeverity::High => Notification::new(NotificationLevel::Error, &help.message)
                .with_actions(action_labels(&help)),
            ErrorSeverity::Medium => Notification::new(NotificationLevel::Warning, &help.message)
                .with_actions(action_labels(&help)),
            ErrorSeverity::Low => Notification::new(NotificationLevel::Info, &help.message),
        };

        let choice = self.host.show_notification(notification).await;
        if let Some(label) = &choice {
            if let Err(e) = self.run_action(error, &help, label).await {
                log_error!(
                    action = %label,
                    error = %e,
                    "Failed to run recovery action"
                );
            }
        }
        choice
    }

    async fn run_action(
        &self,
        error: &TypedError,
        help: &ContextualHelp,
        label: &str,
    ) -> ErrorResult<()> {
        match label {
            EXPORT_DIAGNOSTICS_LABEL => {
                let json = self.diagnostics.export_diagnostics()?;
                self.host.open_document(json, DocumentLanguage::Json).await
            }
            VIEW_DETAILS_LABEL => self.show_error_details(error).await,
            _ => match help.action(label).and_then(|a| a.command.clone()) {
                Some(command) => self.host.execute_command(command).await,
                None => Ok(()),
            },
        }
    }

    /// Open a read-only Markdown document describing `error`.
    pub async fn show_error_details(&self, error: &TypedError) -> ErrorResult<()> {
        let document = self.render_details(error);
        self.host
            .open_document(document, DocumentLanguage::Markdown)
            .await
    }

    fn render_details(&self, error: &TypedError) -> String {
        let mut doc = format!("# {}\n\n", category_title(error.category()));
        doc.push_str(&format!("- **Error ID:** {}\n", error.error_id()));
        doc.push_str(&format!("- **Code:** {}\n", error.code()));
        doc.push_str(&format!("- **Severity:** {}\n", error.severity()));
        doc.push_str(&format!("- **Time:** {}\n", error.timestamp().to_rfc3339()));
        doc.push_str(&format!("- **Retryable:** {}\n", error.is_retryable()));
        if error.is_heuristic() {
            doc.push_str("- **Classification:** heuristic\n");
        }
        doc.push_str("\n## What happened\n\n");
        doc.push_str(&self.translator.get_user_friendly_message(error));
        doc.push_str("\n\n## Technical details\n\n");
        doc.push_str(error.message());
        doc.push('\n');

        let suggestions = self.translator.get_recovery_suggestions(error);
        if !suggestions.is_empty() {
            doc.push_str("\n## Suggested actions\n\n");
            for suggestion in suggestions {
                doc.push_str(&format!("- {suggestion}\n"));
            }
        }

        if !error.context().is_empty() {
            let context = serde_json::to_string_pretty(error.context()).unwrap_or_default();
            doc.push_str(&format!("\n## Context\n\n```json\n{context}\n```\n"));
        }
        doc
    }

    fn count(&self, error: &TypedError) {
        let mut state = self.state.lock();
        state.stats.session_error_count += 1;
        *state
            .stats
            .errors_by_type
            .entry(error.category().type_name().to_string())
            .or_insert(0) += 1;
        *state
            .stats
            .errors_by_code
            .entry(error.code().to_string())
            .or_insert(0) += 1;
    }

    pub fn get_statistics(&self) -> HandlerStatistics {
        self.state.lock().stats.clone()
    }

    pub fn reset_statistics(&self) {
        let mut state = self.state.lock();
        state.stats = HandlerStatistics::default();
        state.last_seen.clear();
        log_debug!("Error handler statistics reset");
    }

    /// Clear all counters and rate-limit tables.
    pub fn dispose(&self) {
        *self.state.lock() = HandlerState::default();
    }
}

fn action_labels(help: &ContextualHelp) -> Vec<String> {
    help.actions.iter().map(|a| a.label.clone()).collect()
}
