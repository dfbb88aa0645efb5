//! Per-operation circuit breakers.
//!
//! A breaker exists only while an operation is failing: it is created on the first
//! failure and removed again on success or manual reset. An absent breaker is closed.

use crate::config::CircuitBreakerConfig;
use crate::logging::{log_debug, log_info, log_warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::time::Instant;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitState {
    Closed,   // Normal operation
    Open,     // Failing, blocking requests
    HalfOpen, // Recovery timeout elapsed, one probe allowed
}

#[derive(Debug)]
pub(crate) struct CircuitBreaker {
    pub(crate) state: CircuitState,
    pub(crate) failure_count: u32,
    pub(crate) last_failure_time: Option<Instant>,
    pub(crate) probe_started: Option<Instant>,
}

impl CircuitBreaker {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure_time: None,
            probe_started: None,
        }
    }

    fn recovery_elapsed(&self, config: &CircuitBreakerConfig, now: Instant) -> bool {
        self.last_failure_time
            .is_some_and(|last| now.duration_since(last) >= config.recovery_timeout)
    }

    /// Check if a request should be allowed through, claiming the probe slot when
    /// the breaker moves to half-open.
    fn should_allow_request(&mut self, config: &CircuitBreakerConfig, now: Instant) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                if !self.recovery_elapsed(config, now) {
                    return false;
                }
                log_debug!(
                    circuit_breaker = "transitioning_to_half_open",
                    recovery_timeout_ms = config.recovery_timeout.as_millis() as u64,
                    "Circuit breaker attempting recovery"
                );
                self.state = CircuitState::HalfOpen;
                self.probe_started = Some(now);
                true
            }
            CircuitState::HalfOpen => {
                // A probe whose caller vanished must not wedge the breaker.
                let stale = self
                    .probe_started
                    .map_or(true, |started| {
                        now.duration_since(started) >= config.recovery_timeout
                    });
                if stale {
                    self.probe_started = Some(now);
                }
                stale
            }
        }
    }

    fn record_failure(&mut self, config: &CircuitBreakerConfig, now: Instant) {
        let outside_window = self
            .last_failure_time
            .is_some_and(|last| now.duration_since(last) > config.monitoring_period);
        if self.state == CircuitState::Closed && outside_window {
            self.failure_count = 0;
        }

        self.failure_count = self.failure_count.saturating_add(1);
        self.last_failure_time = Some(now);
        self.probe_started = None;

        let reopen = self.state == CircuitState::HalfOpen;
        if reopen || self.failure_count >= config.failure_threshold {
            if self.state != CircuitState::Open {
                log_warn!(
                    circuit_breaker = "opened",
                    failure_count = self.failure_count,
                    failure_threshold = config.failure_threshold,
                    recovery_timeout_ms = config.recovery_timeout.as_millis() as u64,
                    "Circuit breaker opened due to repeated failures"
                );
            }
            self.state = CircuitState::Open;
        }
    }

    /// State as an observer sees it: an open breaker past its recovery timeout
    /// reports half-open even before the probe is claimed.
    fn observed_state(&self, config: &CircuitBreakerConfig, now: Instant) -> CircuitState {
        match self.state {
            CircuitState::Open if self.recovery_elapsed(config, now) => CircuitState::HalfOpen,
            state => state,
        }
    }
}

/// Circuit breakers keyed by operation name.
#[derive(Debug)]
pub struct CircuitBreakerRegistry {
    config: CircuitBreakerConfig,
    breakers: Mutex<HashMap<String, CircuitBreaker>>,
}

impl CircuitBreakerRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            breakers: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Whether a call for `operation` may proceed now.
    pub fn try_acquire(&self, operation: &str) -> bool {
        let mut breakers = self.breakers.lock();
        match breakers.get_mut(operation) {
            Some(breaker) => breaker.should_allow_request(&self.config, Instant::now()),
            None => true,
        }
    }

    pub fn record_success(&self, operation: &str) {
        if let Some(breaker) = self.breakers.lock().remove(operation) {
            if breaker.state != CircuitState::Closed {
                log_info!(
                    operation = operation,
                    circuit_breaker = "recovered",
                    "Circuit breaker recovered, returning to closed state"
                );
            }
        }
    }

    pub fn record_failure(&self, operation: &str) {
        let mut breakers = self.breakers.lock();
        breakers
            .entry(operation.to_string())
            .or_insert_with(CircuitBreaker::new)
            .record_failure(&self.config, Instant::now());
    }

    pub fn state(&self, operation: &str) -> CircuitState {
        self.breakers
            .lock()
            .get(operation)
            .map_or(CircuitState::Closed, |b| {
                b.observed_state(&self.config, Instant::now())
            })
    }

    pub fn is_open(&self, operation: &str) -> bool {
        self.state(operation) == CircuitState::Open
    }

    pub fn failure_count(&self, operation: &str) -> u32 {
        self.breakers
            .lock()
            .get(operation)
            .map_or(0, |b| b.failure_count)
    }

    /// Force the breaker for `operation` closed with a zero count.
    pub fn reset(&self, operation: &str) {
        if self.breakers.lock().remove(operation).is_some() {
            log_debug!(operation = operation, "Circuit breaker reset");
        }
    }

    pub fn reset_all(&self) {
        self.breakers.lock().clear();
    }

    /// Names of operations that currently have a breaker entry.
    pub fn tracked_operations(&self) -> Vec<String> {
        let mut names: Vec<String> = self.breakers.lock().keys().cloned().collect();
        names.sort();
        names
    }
}
