//! # pipeline-resilience
//!
//! Error handling and recovery for the Azure Pipelines IDE extension.
//!
//! ## Key Features
//!
//! - **Typed Errors**: Six categories with fixed sub-codes; severity, retryability and
//!   recovery actions follow from the code
//! - **Recovery**: Retry with exponential backoff, per-operation circuit breakers and
//!   graceful degradation to cached data
//! - **Diagnostics**: Bounded error history, statistics, spike detection and an
//!   exportable support report
//! - **Messaging**: Non-technical messages, recovery suggestions and contextual actions
//! - **Central Handler**: Classification, rate limiting and severity-scaled
//!   notifications through the host UI
//!
//! ## Example
//!
//! ```rust,no_run
//! use pipeline_resilience::{
//!     EnvironmentInfo, ErrorServices, LogOnlyHost, ResilienceConfig, TypedError,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let services = ErrorServices::new(
//!     ResilienceConfig::default(),
//!     Arc::new(LogOnlyHost),
//!     EnvironmentInfo::default(),
//! )?;
//!
//! let result = services
//!     .recovery()
//!     .with_retry(
//!         || async { Ok::<_, TypedError>(vec!["CI", "Release"]) },
//!         "listPipelines",
//!         &services.config().retry,
//!     )
//!     .await;
//!
//! if let Err(error) = result.into_result() {
//!     services
//!         .handler()
//!         .handle_error(error, Default::default(), Default::default())
//!         .await;
//! }
//! # Ok(())
//! # }
//! ```

// Allow missing errors documentation - errors are self-documenting via type signatures
#![allow(clippy::missing_errors_doc)]

// Logging utilities (re-exports tracing with log_* naming) - internal only
pub(crate) mod logging;

pub mod config;
pub mod credentials;
pub mod diagnostics;
pub mod error;
pub mod handler;
pub mod host;
pub mod internals;
pub mod messages;
pub mod recovery;
pub mod services;

#[cfg(test)]
pub mod tests;

// Re-export main types
pub use config::{
    AutoRecoveryConfig, CircuitBreakerConfig, DegradationOptions, DiagnosticsConfig,
    MessageConfig, NotificationConfig, RateLimitConfig, ResilienceConfig, RetryConfig,
};
pub use diagnostics::{DiagnosticReport, DiagnosticsCollector, EnvironmentInfo};
pub use error::{
    AuthenticationCode, ConfigurationCode, DataValidationCode, ErrorCategory, ErrorCode,
    ErrorContext, ErrorResult, ErrorSeverity, ExtensionCode, NetworkCode, ResourceCode,
    TypedError,
};
pub use handler::{ErrorHandler, HandleOptions, HandleOutcome};
pub use host::{DocumentLanguage, HostUi, LogOnlyHost, Notification, NotificationLevel};
pub use internals::circuit_breaker::{CircuitBreakerRegistry, CircuitState};
pub use messages::{ContextualHelp, HelpAction, MessageTranslator};
pub use recovery::{ErrorRecovery, RecoveryResult};
pub use services::ErrorServices;
