// Unit Tests for Heuristic Classification
//
// UNIT UNDER TEST: internals::classifier
//
// BUSINESS RESPONSIBILITY:
//   - Gives untyped failures a best-guess category so they are still handled sensibly
//   - Leaves typed failures untouched, even when wrapped in context layers
//   - Marks guesses so diagnostics never confuse them with typed failures
//
// TEST COVERAGE:
//   - Keyword rules for common transport and service messages
//   - Fallback code for unrecognized text
//   - Typed errors pass through unchanged

use crate::error::*;
use crate::internals::classifier::{classify, infer_code, FALLBACK_CODE};
use anyhow::Context;

#[cfg(test)]
mod inference_tests {
    use super::*;

    #[test]
    fn test_common_messages_map_to_expected_codes() {
        // Arrange
        let cases: [(&str, ErrorCode); 10] = [
            ("Request failed with status 401", AuthenticationCode::InvalidPat.into()),
            ("Your token has expired", AuthenticationCode::ExpiredPat.into()),
            ("403 Forbidden", AuthenticationCode::InsufficientPermissions.into()),
            ("Too Many Requests", NetworkCode::RateLimited.into()),
            ("connect ETIMEDOUT 13.107.42.20:443", NetworkCode::Timeout.into()),
            ("connect ECONNREFUSED 127.0.0.1:8888", NetworkCode::ConnectionRefused.into()),
            ("getaddrinfo ENOTFOUND dev.azure.com", NetworkCode::DnsError.into()),
            ("503 Service Unavailable", NetworkCode::ServiceUnavailable.into()),
            ("Unexpected token < in JSON at position 0", DataValidationCode::ParsingError.into()),
            ("Pipeline 42 not found", ResourceCode::NotFound.into()),
        ];

        for (message, expected) in cases {
            // Act
            let code = infer_code(message);

            // Assert
            assert_eq!(code, expected, "'{message}'");
        }
    }

    #[test]
    fn test_unrecognized_text_uses_fallback() {
        assert_eq!(infer_code("something odd happened"), FALLBACK_CODE);
    }
}

#[cfg(test)]
mod classify_tests {
    use super::*;

    #[test]
    fn test_typed_errors_pass_through_unchanged() {
        // Arrange
        let typed = TypedError::resource(ResourceCode::QuotaExceeded, "parallel job limit");
        let id = typed.error_id().to_string();
        let wrapped: anyhow::Result<()> = Err(typed).context("queueing build");

        // Act
        let classified = classify(&wrapped.expect_err("wrapped error"));

        // Assert
        assert_eq!(classified.error_id(), id, "Same error instance identity");
        assert_eq!(classified.code(), ResourceCode::QuotaExceeded.into());
        assert!(!classified.is_heuristic());
    }

    #[test]
    fn test_untyped_errors_are_marked_heuristic() {
        // Arrange
        let error = anyhow::anyhow!("socket hang up");

        // Act
        let classified = classify(&error);

        // Assert
        assert!(classified.is_heuristic());
        assert_eq!(classified.category(), ErrorCategory::Network);
        assert_eq!(classified.context()["classification"], "heuristic");
        assert_eq!(classified.context()["originalError"], "socket hang up");
    }
}
