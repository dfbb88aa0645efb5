//! Last-resort classification of untyped failures.
//!
//! Leaf operations are expected to fail with a [`TypedError`]. When something else
//! reaches the central handler, the message text is matched against keyword patterns
//! and the resulting error is tagged as heuristic so nobody mistakes the guess for a
//! typed failure.

use crate::error::{
    AuthenticationCode, ConfigurationCode, DataValidationCode, ErrorCode, ExtensionCode,
    NetworkCode, ResourceCode, TypedError,
};
use crate::logging::log_warn;
use once_cell::sync::Lazy;
use regex::Regex;

static RULES: Lazy<Vec<(Regex, ErrorCode)>> = Lazy::new(|| {
    let table: [(&str, ErrorCode); 23] = [
        (r"(?i)\bexpired\b", AuthenticationCode::ExpiredPat.into()),
        (r"(?i)\brevoked\b", AuthenticationCode::TokenRevoked.into()),
        (
            r"(?i)\b(401|unauthori[sz]ed|authentication|personal access token|invalid pat)\b",
            AuthenticationCode::InvalidPat.into(),
        ),
        (
            r"(?i)\b(403|forbidden|insufficient permissions?|permission denied)\b",
            AuthenticationCode::InsufficientPermissions.into(),
        ),
        (
            r"(?i)\b(429|rate limit(ed)?|too many requests)\b",
            NetworkCode::RateLimited.into(),
        ),
        (r"(?i)(timed? ?out|etimedout)", NetworkCode::Timeout.into()),
        (
            r"(?i)(econnrefused|connection refused)",
            NetworkCode::ConnectionRefused.into(),
        ),
        (r"(?i)(enotfound|getaddrinfo|\bdns\b)", NetworkCode::DnsError.into()),
        (r"(?i)\b(502|bad gateway)\b", NetworkCode::BadGateway.into()),
        (
            r"(?i)\b(503|service unavailable)\b",
            NetworkCode::ServiceUnavailable.into(),
        ),
        (
            r"(?i)\b(500|internal server error|server error)\b",
            NetworkCode::ServerError.into(),
        ),
        (
            r"(?i)(\bnetwork\b|econnreset|socket hang up)",
            NetworkCode::ConnectionRefused.into(),
        ),
        (r"(?i)\b(404|not found)\b", ResourceCode::NotFound.into()),
        (r"(?i)\baccess denied\b", ResourceCode::AccessDenied.into()),
        (r"(?i)\b(busy|locked|in use)\b", ResourceCode::ResourceBusy.into()),
        (r"(?i)\bquota\b", ResourceCode::QuotaExceeded.into()),
        (r"(?i)\bworkspace\b", ConfigurationCode::WorkspaceError.into()),
        (
            r"(?i)\b(configuration|config|settings?)\b",
            ConfigurationCode::InvalidConfig.into(),
        ),
        (
            r"(?i)(unexpected token|\bjson\b|\bpars(e|ing)\b)",
            DataValidationCode::ParsingError.into(),
        ),
        (r"(?i)\b(required|missing)\b", DataValidationCode::MissingField.into()),
        (r"(?i)\b(invalid|validation)\b", DataValidationCode::InvalidFormat.into()),
        (r"(?i)\bwebview\b", ExtensionCode::WebviewError.into()),
        (r"(?i)\b(storage|secret)\b", ExtensionCode::StorageError.into()),
    ];

    table
        .into_iter()
        .filter_map(|(pattern, code)| Regex::new(pattern).ok().map(|regex| (regex, code)))
        .collect()
});

/// Code used when no keyword matches.
pub(crate) const FALLBACK_CODE: ErrorCode = ErrorCode::Extension(ExtensionCode::CommandError);

/// Guess an error code from free-form message text.
pub(crate) fn infer_code(message: &str) -> ErrorCode {
    RULES
        .iter()
        .find(|(regex, _)| regex.is_match(message))
        .map_or(FALLBACK_CODE, |(_, code)| *code)
}

/// Turn any failure into a [`TypedError`].
///
/// Typed errors anywhere in the chain are returned unchanged; everything else is
/// classified from its message and marked heuristic.
pub(crate) fn classify(error: &anyhow::Error) -> TypedError {
    if let Some(typed) = error
        .chain()
        .find_map(|e| e.downcast_ref::<TypedError>())
    {
        return typed.clone();
    }

    let message = format!("{error:#}");
    let code = infer_code(&message);
    log_warn!(
        error_code = %code,
        error_message = %message,
        "Untyped error heuristically classified"
    );
    TypedError::new(code, message.clone())
        .with_context("originalError", message)
        .mark_heuristic()
}
