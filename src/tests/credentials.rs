// Unit Tests for Credential Validation
//
// UNIT UNDER TEST: credentials
//
// BUSINESS RESPONSIBILITY:
//   - Catches malformed organization names and tokens before any network call
//   - Maps the Azure DevOps answer to a credential check onto the error taxonomy
//
// TEST COVERAGE:
//   - Organization normalization from URLs
//   - Local format failures per input
//   - Probe status mapping

use crate::credentials::*;
use crate::error::*;
use async_trait::async_trait;

const VALID_PAT: &str = "abcdefghijklmnopqrstuvwxyz0123456789abcdefghijklmnop";

struct FixedStatus(u16);

#[async_trait]
impl ConnectionProbe for FixedStatus {
    async fn check_connection(&self, _organization: &str, _pat: &str) -> ErrorResult<u16> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod format_tests {
    use super::*;

    #[test]
    fn test_organization_urls_are_normalized() {
        assert_eq!(normalize_organization("https://dev.azure.com/contoso/"), "contoso");
        assert_eq!(normalize_organization("https://contoso.visualstudio.com"), "contoso");
        assert_eq!(normalize_organization("  contoso "), "contoso");
    }

    #[test]
    fn test_malformed_token_is_invalid_pat() {
        // Act
        let error = validate_credentials_format("org", "bad-token").expect_err("bad format");

        // Assert
        assert_eq!(error.code(), AuthenticationCode::InvalidPat.into());
        assert!(is_authentication_error(&error));
    }

    #[test]
    fn test_missing_values_are_configuration_errors() {
        assert_eq!(
            validate_credentials_format("", VALID_PAT).map_err(|e| e.code()),
            Err(ConfigurationCode::MissingConfig.into())
        );
        assert_eq!(
            validate_credentials_format("contoso", "  ").map_err(|e| e.code()),
            Err(ConfigurationCode::MissingConfig.into())
        );
    }

    #[test]
    fn test_invalid_organization_name() {
        let error = validate_credentials_format("not a valid org!", VALID_PAT)
            .expect_err("spaces are not allowed");
        assert_eq!(error.code(), AuthenticationCode::InvalidOrganization.into());
    }

    #[test]
    fn test_well_formed_credentials_pass() {
        assert!(validate_credentials_format("contoso", VALID_PAT).is_ok());
    }
}

#[cfg(test)]
mod probe_tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_probe_accepts_credentials() {
        assert!(validate_credentials(&FixedStatus(200), "contoso", VALID_PAT)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_rejected_token_is_invalid_pat_with_status() {
        // Act
        let error = validate_credentials(&FixedStatus(401), "contoso", VALID_PAT)
            .await
            .expect_err("rejected");

        // Assert
        assert_eq!(error.code(), AuthenticationCode::InvalidPat.into());
        assert_eq!(error.status_code(), Some(401));
    }

    #[tokio::test]
    async fn test_sign_in_page_response_is_invalid_pat() {
        let error = validate_credentials(&FixedStatus(203), "contoso", VALID_PAT)
            .await
            .expect_err("sign-in page");
        assert_eq!(error.code(), AuthenticationCode::InvalidPat.into());
    }

    #[tokio::test]
    async fn test_unknown_organization() {
        let error = validate_credentials(&FixedStatus(404), "contoso", VALID_PAT)
            .await
            .expect_err("missing org");
        assert_eq!(error.code(), AuthenticationCode::InvalidOrganization.into());
    }

    #[tokio::test]
    async fn test_server_failure_maps_through_http_status() {
        let error = validate_credentials(&FixedStatus(503), "contoso", VALID_PAT)
            .await
            .expect_err("unavailable");
        assert_eq!(error.code(), NetworkCode::ServiceUnavailable.into());
        assert!(error.is_retryable());
    }
}
