//! Error taxonomy for the pipelines extension.
//!
//! Every failure the extension reports is a [`TypedError`]: a category, a
//! category-scoped sub-code, and the severity, retryability and recovery actions that
//! the code implies. Call sites choose the code; everything else comes from the
//! lookup tables in this module so two errors with the same code always behave the
//! same way.
//!
//! # Example
//!
//! ```rust
//! use pipeline_resilience::error::{AuthenticationCode, ErrorSeverity, TypedError};
//!
//! let err = TypedError::authentication(AuthenticationCode::InvalidPat, "401 from _apis/projects");
//! assert_eq!(err.code().to_string(), "AUTH_INVALID_PAT");
//! assert_eq!(err.severity(), ErrorSeverity::High);
//! assert!(!err.is_retryable());
//! ```
//!
//! # Result Type
//!
//! Use [`ErrorResult<T>`] as a convenient alias for `Result<T, TypedError>`.

use crate::logging::{log_debug, log_error, log_warn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use uuid::Uuid;

/// Convenient result type for operations that fail with a [`TypedError`].
pub type ErrorResult<T> = std::result::Result<T, TypedError>;

/// Free-form diagnostic payload attached to errors and handler calls.
pub type ErrorContext = Map<String, Value>;

// ============================================================================
// Categories and severities
// ============================================================================

/// Top-level error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Credential problems: bad, expired or under-scoped tokens.
    Authentication,
    /// Transport failures and unhealthy Azure DevOps endpoints.
    Network,
    /// Responses or inputs that do not have the expected shape.
    DataValidation,
    /// Missing or invalid extension settings.
    Configuration,
    /// Projects, pipelines or runs that are missing, locked or over quota.
    Resource,
    /// Failures inside the extension itself.
    Extension,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 6] = [
        ErrorCategory::Authentication,
        ErrorCategory::Network,
        ErrorCategory::DataValidation,
        ErrorCategory::Configuration,
        ErrorCategory::Resource,
        ErrorCategory::Extension,
    ];

    /// Name used when grouping errors in statistics and reports.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Authentication => "AuthenticationError",
            Self::Network => "NetworkError",
            Self::DataValidation => "DataValidationError",
            Self::Configuration => "ConfigurationError",
            Self::Resource => "ResourceError",
            Self::Extension => "ExtensionError",
        }
    }

    fn code_prefix(self) -> &'static str {
        match self {
            Self::Authentication => "AUTH",
            Self::Network => "NETWORK",
            Self::DataValidation => "VALIDATION",
            Self::Configuration => "CONFIG",
            Self::Resource => "RESOURCE",
            Self::Extension => "EXTENSION",
        }
    }
}

/// Severity of an error, ordered from least to most severe.
///
/// The central handler scales its notification by severity: `Low` is log-only,
/// `Medium` a warning, `High` an error toast and `Critical` a modal dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    pub const ALL: [ErrorSeverity; 4] = [
        ErrorSeverity::Low,
        ErrorSeverity::Medium,
        ErrorSeverity::High,
        ErrorSeverity::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Sub-codes
// ============================================================================

macro_rules! sub_codes {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Sub-code without the category prefix, e.g. `INVALID_PAT`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }
        }
    };
}

sub_codes! {
    /// Authentication failure reasons.
    AuthenticationCode {
        InvalidPat => "INVALID_PAT",
        ExpiredPat => "EXPIRED_PAT",
        InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
        InvalidOrganization => "INVALID_ORGANIZATION",
        TokenRevoked => "TOKEN_REVOKED",
        NetworkError => "NETWORK_ERROR",
    }
}

sub_codes! {
    /// Network failure reasons.
    NetworkCode {
        Timeout => "TIMEOUT",
        ConnectionRefused => "CONNECTION_REFUSED",
        DnsError => "DNS_ERROR",
        RateLimited => "RATE_LIMITED",
        ServerError => "SERVER_ERROR",
        BadGateway => "BAD_GATEWAY",
        ServiceUnavailable => "SERVICE_UNAVAILABLE",
    }
}

sub_codes! {
    /// Data validation failure reasons.
    DataValidationCode {
        InvalidFormat => "INVALID_FORMAT",
        MissingField => "MISSING_FIELD",
        InvalidValue => "INVALID_VALUE",
        SchemaMismatch => "SCHEMA_MISMATCH",
        ParsingError => "PARSING_ERROR",
    }
}

sub_codes! {
    /// Configuration failure reasons.
    ConfigurationCode {
        MissingConfig => "MISSING_CONFIG",
        InvalidConfig => "INVALID_CONFIG",
        ConfigAccessError => "CONFIG_ACCESS_ERROR",
        WorkspaceError => "WORKSPACE_ERROR",
    }
}

sub_codes! {
    /// Resource failure reasons.
    ResourceCode {
        NotFound => "NOT_FOUND",
        AccessDenied => "ACCESS_DENIED",
        ResourceBusy => "RESOURCE_BUSY",
        QuotaExceeded => "QUOTA_EXCEEDED",
        OperationFailed => "OPERATION_FAILED",
    }
}

sub_codes! {
    /// Extension-internal failure reasons.
    ExtensionCode {
        ActivationFailed => "ACTIVATION_FAILED",
        CommandError => "COMMAND_ERROR",
        WebviewError => "WEBVIEW_ERROR",
        StorageError => "STORAGE_ERROR",
        DisposalError => "DISPOSAL_ERROR",
    }
}

/// A sub-code together with the category it belongs to.
///
/// Sub-code namespaces never overlap because each one lives inside its category's
/// variant; the qualified form (`NETWORK_TIMEOUT`) is what logs and reports show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "category", content = "sub_code", rename_all = "snake_case")]
pub enum ErrorCode {
    Authentication(AuthenticationCode),
    Network(NetworkCode),
    DataValidation(DataValidationCode),
    Configuration(ConfigurationCode),
    Resource(ResourceCode),
    Extension(ExtensionCode),
}

impl ErrorCode {
    pub fn category(self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::Network(_) => ErrorCategory::Network,
            Self::DataValidation(_) => ErrorCategory::DataValidation,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Resource(_) => ErrorCategory::Resource,
            Self::Extension(_) => ErrorCategory::Extension,
        }
    }

    /// Sub-code without the category prefix.
    pub fn sub_code(self) -> &'static str {
        match self {
            Self::Authentication(code) => code.as_str(),
            Self::Network(code) => code.as_str(),
            Self::DataValidation(code) => code.as_str(),
            Self::Configuration(code) => code.as_str(),
            Self::Resource(code) => code.as_str(),
            Self::Extension(code) => code.as_str(),
        }
    }

    /// Every code of every category, in declaration order.
    pub fn all() -> impl Iterator<Item = ErrorCode> {
        let auth = AuthenticationCode::ALL.iter().copied().map(Self::from);
        let network = NetworkCode::ALL.iter().copied().map(Self::from);
        let validation = DataValidationCode::ALL.iter().copied().map(Self::from);
        let config = ConfigurationCode::ALL.iter().copied().map(Self::from);
        let resource = ResourceCode::ALL.iter().copied().map(Self::from);
        let extension = ExtensionCode::ALL.iter().copied().map(Self::from);
        auth.chain(network)
            .chain(validation)
            .chain(config)
            .chain(resource)
            .chain(extension)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.category().code_prefix(), self.sub_code())
    }
}

impl From<AuthenticationCode> for ErrorCode {
    fn from(code: AuthenticationCode) -> Self {
        Self::Authentication(code)
    }
}

impl From<NetworkCode> for ErrorCode {
    fn from(code: NetworkCode) -> Self {
        Self::Network(code)
    }
}

impl From<DataValidationCode> for ErrorCode {
    fn from(code: DataValidationCode) -> Self {
        Self::DataValidation(code)
    }
}

impl From<ConfigurationCode> for ErrorCode {
    fn from(code: ConfigurationCode) -> Self {
        Self::Configuration(code)
    }
}

impl From<ResourceCode> for ErrorCode {
    fn from(code: ResourceCode) -> Self {
        Self::Resource(code)
    }
}

impl From<ExtensionCode> for ErrorCode {
    fn from(code: ExtensionCode) -> Self {
        Self::Extension(code)
    }
}

// ============================================================================
// Lookup tables
// ============================================================================

/// HTTP statuses that make a network error retryable regardless of its sub-code.
pub const RETRYABLE_HTTP_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Default severity for a code.
pub fn default_severity(code: ErrorCode) -> ErrorSeverity {
    use ErrorSeverity::{Critical, High, Low, Medium};

    match code {
        ErrorCode::Authentication(c) => match c {
            AuthenticationCode::NetworkError => Medium,
            AuthenticationCode::InvalidPat
            | AuthenticationCode::ExpiredPat
            | AuthenticationCode::InsufficientPermissions
            | AuthenticationCode::InvalidOrganization
            | AuthenticationCode::TokenRevoked => High,
        },
        ErrorCode::Network(c) => match c {
            NetworkCode::DnsError | NetworkCode::ServerError => High,
            NetworkCode::Timeout
            | NetworkCode::ConnectionRefused
            | NetworkCode::RateLimited
            | NetworkCode::BadGateway
            | NetworkCode::ServiceUnavailable => Medium,
        },
        ErrorCode::DataValidation(c) => match c {
            DataValidationCode::SchemaMismatch => High,
            _ => Medium,
        },
        ErrorCode::Configuration(c) => match c {
            ConfigurationCode::WorkspaceError => Medium,
            _ => High,
        },
        ErrorCode::Resource(c) => match c {
            ResourceCode::ResourceBusy => Low,
            ResourceCode::NotFound | ResourceCode::OperationFailed => Medium,
            ResourceCode::AccessDenied | ResourceCode::QuotaExceeded => High,
        },
        ErrorCode::Extension(c) => match c {
            ExtensionCode::ActivationFailed => Critical,
            ExtensionCode::StorageError => High,
            ExtensionCode::CommandError | ExtensionCode::WebviewError => Medium,
            ExtensionCode::DisposalError => Low,
        },
    }
}

/// Whether a failure with this code (and optional HTTP status) may succeed if retried.
pub fn is_code_retryable(code: ErrorCode, status_code: Option<u16>) -> bool {
    match code {
        ErrorCode::Authentication(c) => c == AuthenticationCode::NetworkError,
        ErrorCode::Network(c) => {
            matches!(
                c,
                NetworkCode::Timeout
                    | NetworkCode::ConnectionRefused
                    | NetworkCode::RateLimited
                    | NetworkCode::ServerError
                    | NetworkCode::BadGateway
                    | NetworkCode::ServiceUnavailable
            ) || status_code.is_some_and(|s| RETRYABLE_HTTP_STATUSES.contains(&s))
        }
        ErrorCode::Resource(c) => c == ResourceCode::ResourceBusy,
        ErrorCode::DataValidation(_) | ErrorCode::Configuration(_) | ErrorCode::Extension(_) => {
            false
        }
    }
}

/// Ordered recovery suggestions for a code.
pub fn recovery_actions_for(code: ErrorCode) -> &'static [&'static str] {
    match code {
        ErrorCode::Authentication(c) => match c {
            AuthenticationCode::InvalidPat => &[
                "Verify your Personal Access Token is correct",
                "Generate a new Personal Access Token in Azure DevOps",
                "Ensure the token has Build (Read & Execute) scope",
            ],
            AuthenticationCode::ExpiredPat => &[
                "Generate a new Personal Access Token in Azure DevOps",
                "Update the token in the extension configuration",
            ],
            AuthenticationCode::InsufficientPermissions => &[
                "Ensure your Personal Access Token has Build (Read & Execute) scope",
                "Ask a project administrator to grant pipeline permissions",
            ],
            AuthenticationCode::InvalidOrganization => &[
                "Check the organization name in the extension configuration",
                "Verify you can open the organization in a browser",
            ],
            AuthenticationCode::TokenRevoked => &[
                "Generate a new Personal Access Token in Azure DevOps",
                "Update the token in the extension configuration",
            ],
            AuthenticationCode::NetworkError => &[
                "Check your internet connection",
                "Retry the sign-in",
            ],
        },
        ErrorCode::Network(c) => match c {
            NetworkCode::Timeout => &[
                "Check your internet connection",
                "Try again in a few moments",
            ],
            NetworkCode::ConnectionRefused => &[
                "Check your internet connection",
                "Verify proxy and firewall settings",
            ],
            NetworkCode::DnsError => &[
                "Check your DNS settings",
                "Verify the organization URL is correct",
            ],
            NetworkCode::RateLimited => &[
                "Wait a moment before refreshing",
                "Reduce the auto-refresh frequency",
            ],
            NetworkCode::ServerError | NetworkCode::BadGateway => &[
                "Azure DevOps is having problems, try again later",
                "Check the Azure DevOps status page",
            ],
            NetworkCode::ServiceUnavailable => &[
                "Azure DevOps is temporarily unavailable, try again later",
                "Check the Azure DevOps status page",
            ],
        },
        ErrorCode::DataValidation(c) => match c {
            DataValidationCode::InvalidFormat | DataValidationCode::InvalidValue => &[
                "Check the entered value and try again",
            ],
            DataValidationCode::MissingField => &[
                "Fill in all required fields",
            ],
            DataValidationCode::SchemaMismatch | DataValidationCode::ParsingError => &[
                "Refresh the view",
                "Update the extension to the latest version",
            ],
        },
        ErrorCode::Configuration(c) => match c {
            ConfigurationCode::MissingConfig => &[
                "Run the Configure command to set up the extension",
            ],
            ConfigurationCode::InvalidConfig => &[
                "Review the extension settings",
                "Run the Configure command to reset the configuration",
            ],
            ConfigurationCode::ConfigAccessError => &[
                "Check file permissions for the settings file",
                "Restart the editor",
            ],
            ConfigurationCode::WorkspaceError => &[
                "Open a folder or workspace",
                "Reload the window",
            ],
        },
        ErrorCode::Resource(c) => match c {
            ResourceCode::NotFound => &[
                "Refresh the view",
                "Verify the project or pipeline still exists",
            ],
            ResourceCode::AccessDenied => &[
                "Ask a project administrator for access",
            ],
            ResourceCode::ResourceBusy => &[
                "Wait a moment and try again",
            ],
            ResourceCode::QuotaExceeded => &[
                "Check your organization's parallel job limits",
                "Try again after running jobs finish",
            ],
            ResourceCode::OperationFailed => &[
                "Try the operation again",
                "Check the pipeline in Azure DevOps",
            ],
        },
        ErrorCode::Extension(c) => match c {
            ExtensionCode::ActivationFailed => &[
                "Reload the window",
                "Reinstall the extension",
            ],
            ExtensionCode::CommandError | ExtensionCode::WebviewError => &[
                "Try the command again",
                "Reload the window",
            ],
            ExtensionCode::StorageError => &[
                "Reload the window",
                "Re-enter your credentials",
            ],
            ExtensionCode::DisposalError => &[
                "Reload the window",
            ],
        },
    }
}

// ============================================================================
// TypedError
// ============================================================================

static ERROR_SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn generate_error_id(code: ErrorCode) -> String {
    let sequence = ERROR_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{code}_{}_{sequence}_{}",
        Utc::now().timestamp_millis(),
        &suffix[..8]
    )
}

/// A categorized failure.
///
/// Created once at the failure site and immutable afterwards except for the
/// builder methods used while it is being constructed.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("[{code}] {message}")]
pub struct TypedError {
    error_id: String,
    timestamp: DateTime<Utc>,
    code: ErrorCode,
    severity: ErrorSeverity,
    message: String,
    user_message: String,
    recovery_actions: Vec<String>,
    retryable: bool,
    context: ErrorContext,
    status_code: Option<u16>,
    heuristic: bool,
}

impl TypedError {
    /// Create an error for `code`, deriving severity, retryability and recovery
    /// actions from the lookup tables. Logs at a level matching the severity.
    pub fn new(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        let code = code.into();
        let message = message.into();
        let error = Self {
            error_id: generate_error_id(code),
            timestamp: Utc::now(),
            code,
            severity: default_severity(code),
            user_message: message.clone(),
            message,
            recovery_actions: recovery_actions_for(code)
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            retryable: is_code_retryable(code, None),
            context: ErrorContext::new(),
            status_code: None,
            heuristic: false,
        };
        error.log_creation();
        error
    }

    pub fn authentication(code: AuthenticationCode, message: impl Into<String>) -> Self {
        Self::new(code, message)
    }

    pub fn network(code: NetworkCode, message: impl Into<String>) -> Self {
        Self::new(code, message)
    }

    pub fn data_validation(code: DataValidationCode, message: impl Into<String>) -> Self {
        Self::new(code, message)
    }

    pub fn configuration(code: ConfigurationCode, message: impl Into<String>) -> Self {
        Self::new(code, message)
    }

    pub fn resource(code: ResourceCode, message: impl Into<String>) -> Self {
        Self::new(code, message)
    }

    pub fn extension(code: ExtensionCode, message: impl Into<String>) -> Self {
        Self::new(code, message)
    }

    /// Map an Azure DevOps REST status to a typed error.
    pub fn from_http_status(status: u16, message: impl Into<String>) -> Self {
        let code: ErrorCode = match status {
            401 => AuthenticationCode::InvalidPat.into(),
            403 => AuthenticationCode::InsufficientPermissions.into(),
            404 => ResourceCode::NotFound.into(),
            408 | 504 => NetworkCode::Timeout.into(),
            409 | 423 => ResourceCode::ResourceBusy.into(),
            429 => NetworkCode::RateLimited.into(),
            400 | 422 => DataValidationCode::InvalidValue.into(),
            502 => NetworkCode::BadGateway.into(),
            503 => NetworkCode::ServiceUnavailable.into(),
            500..=599 => NetworkCode::ServerError.into(),
            _ => ResourceCode::OperationFailed.into(),
        };
        Self::new(code, message).with_status_code(status)
    }

    /// Human-facing text shown instead of the technical message.
    pub fn with_user_message(mut self, user_message: impl Into<String>) -> Self {
        self.user_message = user_message.into();
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attach the HTTP status that produced this error. Network retryability takes the
    /// status into account.
    pub fn with_status_code(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self.retryable = is_code_retryable(self.code, self.status_code);
        self.context
            .entry("statusCode")
            .or_insert_with(|| Value::from(status));
        self
    }

    pub(crate) fn mark_heuristic(mut self) -> Self {
        self.heuristic = true;
        self.context
            .insert("classification".to_string(), Value::from("heuristic"));
        self
    }

    #[cfg(test)]
    pub(crate) fn with_severity_override(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_retryable_override(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    fn log_creation(&self) {
        match self.severity {
            ErrorSeverity::Critical | ErrorSeverity::High => log_error!(
                error_id = %self.error_id,
                error_code = %self.code,
                severity = %self.severity,
                error_message = %self.message,
                "Typed error created"
            ),
            ErrorSeverity::Medium => log_warn!(
                error_id = %self.error_id,
                error_code = %self.code,
                error_message = %self.message,
                "Typed error created"
            ),
            ErrorSeverity::Low => log_debug!(
                error_id = %self.error_id,
                error_code = %self.code,
                error_message = %self.message,
                "Typed error created"
            ),
        }
    }

    pub fn error_id(&self) -> &str {
        &self.error_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn recovery_actions(&self) -> &[String] {
        &self.recovery_actions
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Whether the category was guessed from the message text rather than typed at
    /// the throw site.
    pub fn is_heuristic(&self) -> bool {
        self.heuristic
    }

    /// Read-only projection of every field, for diagnostics and export.
    pub fn get_diagnostic_info(&self) -> ErrorDiagnosticInfo {
        ErrorDiagnosticInfo {
            error_id: self.error_id.clone(),
            timestamp: self.timestamp,
            code: self.code,
            severity: self.severity,
            message: self.message.clone(),
            user_message: self.user_message.clone(),
            recovery_actions: self.recovery_actions.clone(),
            retryable: self.retryable,
            context: self.context.clone(),
            status_code: self.status_code,
            heuristic: self.heuristic,
        }
    }
}

impl From<serde_json::Error> for TypedError {
    fn from(err: serde_json::Error) -> Self {
        Self::data_validation(DataValidationCode::ParsingError, err.to_string())
    }
}

/// Serializable snapshot of a [`TypedError`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDiagnosticInfo {
    pub error_id: String,
    pub timestamp: DateTime<Utc>,
    pub code: ErrorCode,
    pub severity: ErrorSeverity,
    pub message: String,
    pub user_message: String,
    pub recovery_actions: Vec<String>,
    pub retryable: bool,
    pub context: ErrorContext,
    pub status_code: Option<u16>,
    pub heuristic: bool,
}

impl ErrorDiagnosticInfo {
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    pub fn error_type(&self) -> &'static str {
        self.code.category().type_name()
    }
}

// ============================================================================
// Type guards
// ============================================================================

/// Find the first [`TypedError`] in an error's source chain.
pub fn find_typed_error<'a>(err: &'a (dyn std::error::Error + 'static)) -> Option<&'a TypedError> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(typed) = e.downcast_ref::<TypedError>() {
            return Some(typed);
        }
        current = e.source();
    }
    None
}

fn has_category(err: &(dyn std::error::Error + 'static), category: ErrorCategory) -> bool {
    find_typed_error(err).is_some_and(|e| e.category() == category)
}

pub fn is_typed_error(err: &(dyn std::error::Error + 'static)) -> bool {
    find_typed_error(err).is_some()
}

pub fn is_authentication_error(err: &(dyn std::error::Error + 'static)) -> bool {
    has_category(err, ErrorCategory::Authentication)
}

pub fn is_network_error(err: &(dyn std::error::Error + 'static)) -> bool {
    has_category(err, ErrorCategory::Network)
}

pub fn is_data_validation_error(err: &(dyn std::error::Error + 'static)) -> bool {
    has_category(err, ErrorCategory::DataValidation)
}

pub fn is_configuration_error(err: &(dyn std::error::Error + 'static)) -> bool {
    has_category(err, ErrorCategory::Configuration)
}

pub fn is_resource_error(err: &(dyn std::error::Error + 'static)) -> bool {
    has_category(err, ErrorCategory::Resource)
}

pub fn is_extension_error(err: &(dyn std::error::Error + 'static)) -> bool {
    has_category(err, ErrorCategory::Extension)
}
