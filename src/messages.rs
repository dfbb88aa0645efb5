//! User-facing message translation.
//!
//! Turns a [`TypedError`] into non-technical text, recovery suggestions and the
//! action buttons shown next to notifications.

use crate::config::MessageConfig;
use crate::error::{
    AuthenticationCode, ConfigurationCode, DataValidationCode, ErrorCategory, ErrorCode,
    ExtensionCode, NetworkCode, ResourceCode, TypedError,
};
use crate::host::commands;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Longest text the status bar shows.
pub const STATUS_BAR_MAX_LENGTH: usize = 50;

const ELLIPSIS: &str = "...";

pub const VIEW_DETAILS_LABEL: &str = "View Details";

static SIMPLIFICATIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"Personal Access Token", "access token"),
        (r"\bPAT\b", "access token"),
        (r"Build \(Read & Execute\) scope", "permission to run pipelines"),
        (r"\bDNS settings\b", "network name settings"),
        (r"proxy and firewall settings", "network settings"),
        (r"organization URL", "organization address"),
        (r"parallel job limits", "limits on jobs running at once"),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| {
        Regex::new(pattern).ok().map(|regex| (regex, replacement))
    })
    .collect()
});

/// A button offered alongside an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpAction {
    pub label: String,
    /// Host command run when the action is chosen
    pub command: Option<String>,
    pub primary: bool,
}

impl HelpAction {
    fn new(label: &str, command: &str, primary: bool) -> Self {
        Self {
            label: label.to_string(),
            command: Some(command.to_string()),
            primary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextualHelp {
    pub title: String,
    pub message: String,
    pub actions: Vec<HelpAction>,
}

impl ContextualHelp {
    pub fn primary_action(&self) -> Option<&HelpAction> {
        self.actions.iter().find(|a| a.primary)
    }

    pub fn action(&self, label: &str) -> Option<&HelpAction> {
        self.actions.iter().find(|a| a.label == label)
    }
}

/// Fixed, non-technical message for a code.
pub fn message_template(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::Authentication(c) => match c {
            AuthenticationCode::InvalidPat => {
                "Your Personal Access Token appears to be invalid. Please check your credentials."
            }
            AuthenticationCode::ExpiredPat => {
                "Your Personal Access Token has expired. Please create a new one."
            }
            AuthenticationCode::InsufficientPermissions => {
                "Your Personal Access Token does not have permission to access pipelines."
            }
            AuthenticationCode::InvalidOrganization => {
                "The Azure DevOps organization could not be found. Please check the organization name."
            }
            AuthenticationCode::TokenRevoked => {
                "Your Personal Access Token has been revoked. Please create a new one."
            }
            AuthenticationCode::NetworkError => {
                "Could not reach Azure DevOps to verify your credentials."
            }
        },
        ErrorCode::Network(c) => match c {
            NetworkCode::Timeout => "Azure DevOps took too long to respond.",
            NetworkCode::ConnectionRefused => "Could not connect to Azure DevOps.",
            NetworkCode::DnsError => "Could not resolve the Azure DevOps address.",
            NetworkCode::RateLimited => {
                "Azure DevOps is limiting requests. Updates will resume shortly."
            }
            NetworkCode::ServerError => "Azure DevOps reported a server error.",
            NetworkCode::BadGateway => "Azure DevOps returned a bad gateway response.",
            NetworkCode::ServiceUnavailable => "Azure DevOps is temporarily unavailable.",
        },
        ErrorCode::DataValidation(c) => match c {
            DataValidationCode::InvalidFormat => "Some data is not in the expected format.",
            DataValidationCode::MissingField => "Some required information is missing.",
            DataValidationCode::InvalidValue => "A value is not valid.",
            DataValidationCode::SchemaMismatch => {
                "Azure DevOps returned data this version of the extension does not understand."
            }
            DataValidationCode::ParsingError => "The response from Azure DevOps could not be read.",
        },
        ErrorCode::Configuration(c) => match c {
            ConfigurationCode::MissingConfig => {
                "The extension is not configured yet. Please run the Configure command."
            }
            ConfigurationCode::InvalidConfig => "The extension configuration is not valid.",
            ConfigurationCode::ConfigAccessError => "The extension settings could not be read.",
            ConfigurationCode::WorkspaceError => "There is a problem with the current workspace.",
        },
        ErrorCode::Resource(c) => match c {
            ResourceCode::NotFound => "The requested item could not be found.",
            ResourceCode::AccessDenied => "You do not have access to this item.",
            ResourceCode::ResourceBusy => "The item is busy. Please try again in a moment.",
            ResourceCode::QuotaExceeded => "Your organization has reached a usage limit.",
            ResourceCode::OperationFailed => "The operation could not be completed.",
        },
        ErrorCode::Extension(c) => match c {
            ExtensionCode::ActivationFailed => "The Azure Pipelines extension failed to start.",
            ExtensionCode::CommandError => "The command could not be completed.",
            ExtensionCode::WebviewError => "The pipeline view could not be displayed.",
            ExtensionCode::StorageError => "Extension data could not be saved or loaded.",
            ExtensionCode::DisposalError => "The extension did not shut down cleanly.",
        },
    }
}

/// Title shown above contextual help for a category.
pub fn category_title(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::Authentication => "Authentication Problem",
        ErrorCategory::Network => "Connection Problem",
        ErrorCategory::DataValidation => "Data Problem",
        ErrorCategory::Configuration => "Configuration Problem",
        ErrorCategory::Resource => "Resource Problem",
        ErrorCategory::Extension => "Extension Problem",
    }
}

/// Cut `text` to at most `max_chars` characters, ending with an ellipsis when cut.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let cut: String = text.chars().take(keep).collect();
    format!("{}{ELLIPSIS}", cut.trim_end())
}

/// Like [`truncate_with_ellipsis`] but prefers to cut at a word boundary.
pub fn truncate_at_word(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut chars = text.chars();
    let cut: String = chars.by_ref().take(keep).collect();
    let ends_on_word = chars.next().map_or(true, char::is_whitespace);
    let trimmed = match cut.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 && !ends_on_word => &cut[..idx],
        _ => cut.as_str(),
    };
    let trimmed = trimmed.trim_end_matches(|c: char| c.is_whitespace() || c == ',' || c == '.');
    format!("{trimmed}{ELLIPSIS}")
}

#[derive(Debug, Clone, Default)]
pub struct MessageTranslator {
    config: MessageConfig,
}

impl MessageTranslator {
    pub fn new(config: MessageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MessageConfig {
        &self.config
    }

    pub fn get_user_friendly_message(&self, error: &TypedError) -> String {
        let template = message_template(error.code());
        let mut message = if self.config.include_error_codes {
            format!("[{}] {template}", error.code())
        } else {
            template.to_string()
        };

        if self.config.include_technical_details && error.message() != template {
            let details =
                truncate_with_ellipsis(error.message(), self.config.max_technical_detail_length);
            message.push_str(&format!(" (Details: {details})"));
        }

        truncate_with_ellipsis(&message, self.config.max_message_length)
    }

    pub fn get_recovery_suggestions(&self, error: &TypedError) -> Vec<String> {
        if !self.config.show_recovery_actions {
            return Vec::new();
        }
        error
            .recovery_actions()
            .iter()
            .map(|action| {
                if self.config.simple_language {
                    simplify(action)
                } else {
                    action.clone()
                }
            })
            .collect()
    }

    pub fn get_contextual_help(&self, error: &TypedError) -> ContextualHelp {
        let mut actions = match error.category() {
            ErrorCategory::Authentication => vec![HelpAction::new(
                "Configure Extension",
                commands::CONFIGURE,
                true,
            )],
            ErrorCategory::Network => vec![HelpAction::new("Retry", commands::REFRESH, true)],
            ErrorCategory::DataValidation => vec![
                HelpAction::new("Refresh", commands::REFRESH, true),
                HelpAction::new("Report Issue", commands::REPORT_ISSUE, false),
            ],
            ErrorCategory::Configuration => vec![
                HelpAction::new("Open Settings", commands::OPEN_SETTINGS, true),
                HelpAction::new("Configure Extension", commands::CONFIGURE, false),
            ],
            ErrorCategory::Resource => vec![HelpAction::new("Refresh", commands::REFRESH, true)],
            ErrorCategory::Extension => vec![
                HelpAction::new("Reload Window", commands::RELOAD_WINDOW, true),
                HelpAction::new("Report Issue", commands::REPORT_ISSUE, false),
            ],
        };
        actions.push(HelpAction::new(
            VIEW_DETAILS_LABEL,
            commands::SHOW_ERROR_DETAILS,
            false,
        ));

        ContextualHelp {
            title: category_title(error.category()).to_string(),
            message: self.get_user_friendly_message(error),
            actions,
        }
    }

    pub fn get_status_bar_message(&self, error: &TypedError) -> String {
        truncate_at_word(message_template(error.code()), STATUS_BAR_MAX_LENGTH)
    }
}

fn simplify(text: &str) -> String {
    SIMPLIFICATIONS
        .iter()
        .fold(text.to_string(), |acc, (regex, replacement)| {
            regex.replace_all(&acc, *replacement).into_owned()
        })
}
