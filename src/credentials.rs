//! Credential checks that run before anything talks to Azure DevOps.
//!
//! Format problems are caught locally; [`validate_credentials`] then asks a
//! [`ConnectionProbe`] (the REST client) for a status code and maps it to the
//! taxonomy.

use crate::error::{AuthenticationCode, ConfigurationCode, ErrorResult, TypedError};
use crate::logging::log_debug;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

static ORGANIZATION_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,48}[A-Za-z0-9])?$").ok());

// Classic tokens are 52 base32 characters, newer ones 84 alphanumerics.
static PAT_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9]{52}|[A-Za-z0-9]{84})$").ok());

static ORGANIZATION_URL_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^(?i)https?://(?:dev\.azure\.com/([^/\s]+)|([^./\s]+)\.visualstudio\.com)/?")
        .ok()
});

/// Something that can make an authenticated round trip to an organization.
#[async_trait]
pub trait ConnectionProbe: Send + Sync {
    /// HTTP status of an authenticated request against `organization`.
    async fn check_connection(&self, organization: &str, pat: &str) -> ErrorResult<u16>;
}

/// Accept a bare organization name or an organization URL and return the name.
pub fn normalize_organization(input: &str) -> String {
    let trimmed = input.trim();
    ORGANIZATION_URL_PATTERN
        .as_ref()
        .and_then(|re| re.captures(trimmed))
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map_or_else(|| trimmed.to_string(), |m| m.as_str().to_string())
}

fn matches(pattern: &Lazy<Option<Regex>>, value: &str) -> bool {
    pattern.as_ref().map_or(true, |re| re.is_match(value))
}

/// Local sanity check of an organization name and Personal Access Token.
pub fn validate_credentials_format(organization: &str, pat: &str) -> ErrorResult<()> {
    let organization = normalize_organization(organization);
    if organization.is_empty() {
        return Err(TypedError::configuration(
            ConfigurationCode::MissingConfig,
            "Azure DevOps organization is not configured",
        ));
    }
    if !matches(&ORGANIZATION_PATTERN, &organization) {
        return Err(TypedError::authentication(
            AuthenticationCode::InvalidOrganization,
            format!("'{organization}' is not a valid Azure DevOps organization name"),
        )
        .with_context("organization", organization));
    }

    let pat = pat.trim();
    if pat.is_empty() {
        return Err(TypedError::configuration(
            ConfigurationCode::MissingConfig,
            "Personal Access Token is not configured",
        ));
    }
    if !matches(&PAT_PATTERN, pat) {
        return Err(TypedError::authentication(
            AuthenticationCode::InvalidPat,
            format!(
                "Personal Access Token has an unexpected format ({} characters)",
                pat.chars().count()
            ),
        )
        .with_context("organization", organization));
    }
    Ok(())
}

/// Check the credentials locally, then against Azure DevOps.
pub async fn validate_credentials(
    probe: &dyn ConnectionProbe,
    organization: &str,
    pat: &str,
) -> ErrorResult<()> {
    validate_credentials_format(organization, pat)?;
    let organization = normalize_organization(organization);

    let status = probe.check_connection(&organization, pat.trim()).await?;
    log_debug!(
        organization = %organization,
        status = status,
        "Credential probe completed"
    );
    match status {
        // Azure DevOps answers an unrecognised token with a sign-in page.
        203 | 401 => Err(TypedError::authentication(
            AuthenticationCode::InvalidPat,
            format!("Azure DevOps rejected the Personal Access Token (HTTP {status})"),
        )
        .with_status_code(status)
        .with_context("organization", organization)),
        404 => Err(TypedError::authentication(
            AuthenticationCode::InvalidOrganization,
            format!("Organization '{organization}' was not found"),
        )
        .with_status_code(status)),
        200..=299 => Ok(()),
        _ => Err(TypedError::from_http_status(
            status,
            format!("Credential check for '{organization}' failed with HTTP {status}"),
        )),
    }
}
