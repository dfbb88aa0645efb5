// Test modules for pipeline-resilience crate
//
// Test organization follows the template pattern where each source file
// has a corresponding test file that focuses on business logic verification.

// Shared fixtures (recording host, error builders)
pub mod helpers;

pub mod classifier;
pub mod config;
pub mod credentials;
pub mod services;
