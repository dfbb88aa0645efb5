//! Internal building blocks for the recovery engine and the central handler.
//!
//! Some types are re-exported through `lib.rs` for public use (CircuitBreakerRegistry,
//! CircuitState).

pub mod circuit_breaker;
pub(crate) mod classifier;
pub mod retry;
