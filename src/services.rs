//! Composition root for the error-handling services.
//!
//! The extension builds one [`ErrorServices`] at activation and passes it (or its
//! parts) to whatever needs it. Tests build as many independent instances as they
//! like.

use crate::config::ResilienceConfig;
use crate::diagnostics::{DiagnosticsCollector, EnvironmentInfo};
use crate::error::ErrorResult;
use crate::handler::ErrorHandler;
use crate::host::HostUi;
use crate::logging::log_info;
use crate::messages::MessageTranslator;
use crate::recovery::ErrorRecovery;
use std::sync::Arc;

pub struct ErrorServices {
    config: ResilienceConfig,
    recovery: Arc<ErrorRecovery>,
    diagnostics: Arc<DiagnosticsCollector>,
    handler: Arc<ErrorHandler>,
}

impl ErrorServices {
    /// Wire the recovery engine, diagnostics collector, translator and handler
    /// together around one host.
    ///
    /// # Errors
    ///
    /// Returns a Configuration/INVALID_CONFIG error if `config` fails validation.
    pub fn new(
        config: ResilienceConfig,
        host: Arc<dyn HostUi>,
        environment: EnvironmentInfo,
    ) -> ErrorResult<Self> {
        config.validate()?;

        let recovery = Arc::new(
            ErrorRecovery::new(config.circuit_breaker.clone(), config.auto_recovery.clone())
                .with_host(Arc::clone(&host)),
        );
        let diagnostics = Arc::new(DiagnosticsCollector::new(
            config.diagnostics.clone(),
            environment,
        ));
        let handler = Arc::new(ErrorHandler::new(
            config.rate_limit.clone(),
            config.notifications.clone(),
            host,
            Arc::clone(&recovery),
            Arc::clone(&diagnostics),
            MessageTranslator::new(config.messages.clone()),
        ));

        log_info!(
            max_retries = config.retry.max_retries,
            failure_threshold = config.circuit_breaker.failure_threshold,
            history_capacity = config.diagnostics.max_history,
            "Error handling services initialized"
        );

        Ok(Self {
            config,
            recovery,
            diagnostics,
            handler,
        })
    }

    pub fn config(&self) -> &ResilienceConfig {
        &self.config
    }

    pub fn recovery(&self) -> &Arc<ErrorRecovery> {
        &self.recovery
    }

    pub fn diagnostics(&self) -> &Arc<DiagnosticsCollector> {
        &self.diagnostics
    }

    pub fn handler(&self) -> &Arc<ErrorHandler> {
        &self.handler
    }

    /// Cancel pending retries and clear every counter and history.
    pub fn dispose(&self) {
        self.recovery.dispose();
        self.handler.dispose();
        self.diagnostics.dispose();
        log_info!("Error handling services disposed");
    }
}
