//! Diagnostics collector.
//!
//! Keeps a bounded, most-recent-first history of handled errors, each enriched with a
//! snapshot of the system, network and extension state at the time it was recorded.
//! The history feeds aggregate statistics, simple spike/pattern analysis and the
//! diagnostic report users export when asking for support.

use crate::config::DiagnosticsConfig;
use crate::error::{
    ErrorCategory, ErrorCode, ErrorContext, ErrorDiagnosticInfo, ErrorResult, ErrorSeverity,
    ExtensionCode, TypedError,
};
use crate::logging::{log_debug, log_info};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;
use sysinfo::{ProcessesToUpdate, System};

/// Compiler version captured by the build script.
const RUNTIME_VERSION: &str = match option_env!("PIPELINE_RESILIENCE_RUSTC_VERSION") {
    Some(version) => version,
    None => "rustc unknown",
};

/// Static facts about the host and the extension, supplied at activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentInfo {
    pub host_app_name: String,
    pub host_app_version: String,
    pub extension_version: String,
    pub registered_commands: Vec<String>,
}

impl Default for EnvironmentInfo {
    fn default() -> Self {
        Self {
            host_app_name: "unknown".to_string(),
            host_app_version: "unknown".to_string(),
            extension_version: env!("CARGO_PKG_VERSION").to_string(),
            registered_commands: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySnapshot {
    pub total_bytes: u64,
    pub used_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub platform: String,
    pub arch: String,
    pub runtime_version: String,
    pub host_app_name: String,
    pub host_app_version: String,
    pub extension_version: String,
    pub memory: MemorySnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDiagnostics {
    pub consecutive_failures: u32,
    pub last_successful_request: Option<DateTime<Utc>>,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionDiagnostics {
    pub activation_time: DateTime<Utc>,
    pub registered_commands: Vec<String>,
    pub configuration_valid: bool,
    pub process_memory_bytes: Option<u64>,
}

/// One handled error plus the environment it happened in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDiagnosticRecord {
    pub error: ErrorDiagnosticInfo,
    pub context: ErrorContext,
    pub collected_at: DateTime<Utc>,
    pub system_info: SystemInfo,
    pub network_diagnostics: NetworkDiagnostics,
    pub extension_diagnostics: ExtensionDiagnostics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorStatistics {
    pub total_errors: usize,
    pub errors_by_type: BTreeMap<String, usize>,
    pub errors_by_code: BTreeMap<String, usize>,
    pub errors_by_severity: BTreeMap<String, usize>,
}

impl ErrorStatistics {
    /// Every known type, code and severity with a zero count.
    pub fn empty() -> Self {
        Self {
            total_errors: 0,
            errors_by_type: ErrorCategory::ALL
                .iter()
                .map(|c| (c.type_name().to_string(), 0))
                .collect(),
            errors_by_code: ErrorCode::all().map(|c| (c.to_string(), 0)).collect(),
            errors_by_severity: ErrorSeverity::ALL
                .iter()
                .map(|s| (s.as_str().to_string(), 0))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPatternAnalysis {
    pub is_error_spike: bool,
    /// Records among the latest sample that fall inside the spike window
    pub recent_error_count: usize,
    pub dominant_error_type: Option<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub total_requests: u64,
    pub failed_requests: u64,
    pub average_response_time_ms: f64,
    pub error_rate: f64,
    pub success_rate: f64,
}

/// Serializable support snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    pub generated_at: DateTime<Utc>,
    pub system_info: SystemInfo,
    pub network_info: NetworkDiagnostics,
    pub extension_info: ExtensionDiagnostics,
    pub recent_errors: Vec<ErrorDiagnosticRecord>,
    pub statistics: ErrorStatistics,
    pub performance_metrics: PerformanceMetrics,
    pub pattern_analysis: ErrorPatternAnalysis,
}

#[derive(Debug)]
struct DiagnosticsState {
    records: VecDeque<ErrorDiagnosticRecord>,
    registered_commands: Vec<String>,
    configuration_valid: bool,
    consecutive_failures: u32,
    last_successful_request: Option<DateTime<Utc>>,
    response_times: VecDeque<Duration>,
    total_requests: u64,
    failed_requests: u64,
}

pub struct DiagnosticsCollector {
    config: DiagnosticsConfig,
    environment: EnvironmentInfo,
    activation_time: DateTime<Utc>,
    state: Mutex<DiagnosticsState>,
    system: Mutex<System>,
}

impl DiagnosticsCollector {
    pub fn new(config: DiagnosticsConfig, environment: EnvironmentInfo) -> Self {
        let state = DiagnosticsState {
            records: VecDeque::with_capacity(config.max_history),
            registered_commands: environment.registered_commands.clone(),
            configuration_valid: true,
            consecutive_failures: 0,
            last_successful_request: None,
            response_times: VecDeque::with_capacity(config.performance_sample_size),
            total_requests: 0,
            failed_requests: 0,
        };
        Self {
            config,
            environment,
            activation_time: Utc::now(),
            state: Mutex::new(state),
            system: Mutex::new(System::new()),
        }
    }

    pub fn config(&self) -> &DiagnosticsConfig {
        &self.config
    }

    /// Record `error` at the front of the history, evicting the oldest record when
    /// the history is full.
    pub fn collect_error_diagnostics(&self, error: &TypedError, context: ErrorContext) {
        let system_info = self.system_info();
        let process_memory_bytes = self.process_memory();
        let mut state = self.state.lock();

        let record = ErrorDiagnosticRecord {
            error: error.get_diagnostic_info(),
            context,
            collected_at: Utc::now(),
            system_info,
            network_diagnostics: self.network_diagnostics(&state),
            extension_diagnostics: self.extension_diagnostics(&state, process_memory_bytes),
        };

        state.records.push_front(record);
        while state.records.len() > self.config.max_history {
            state.records.pop_back();
        }
        log_debug!(
            error_id = %error.error_id(),
            error_code = %error.code(),
            history_len = state.records.len(),
            "Error diagnostics collected"
        );
    }

    /// Feed the outcome of one Azure DevOps request into network and performance
    /// metrics.
    pub fn record_request(&self, success: bool, duration: Duration) {
        let mut state = self.state.lock();
        state.total_requests += 1;
        if success {
            state.consecutive_failures = 0;
            state.last_successful_request = Some(Utc::now());
        } else {
            state.failed_requests += 1;
            state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        }
        state.response_times.push_back(duration);
        while state.response_times.len() > self.config.performance_sample_size {
            state.response_times.pop_front();
        }
    }

    pub fn set_configuration_valid(&self, valid: bool) {
        self.state.lock().configuration_valid = valid;
    }

    pub fn register_commands(&self, commands: Vec<String>) {
        self.state.lock().registered_commands = commands;
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }

    /// Up to `limit` records, most recent first.
    pub fn recent_records(&self, limit: usize) -> Vec<ErrorDiagnosticRecord> {
        self.state.lock().records.iter().take(limit).cloned().collect()
    }

    pub fn get_error_statistics(&self) -> ErrorStatistics {
        let state = self.state.lock();
        let mut stats = ErrorStatistics::empty();
        for record in &state.records {
            stats.total_errors += 1;
            *stats
                .errors_by_type
                .entry(record.error.error_type().to_string())
                .or_insert(0) += 1;
            *stats
                .errors_by_code
                .entry(record.error.code.to_string())
                .or_insert(0) += 1;
            *stats
                .errors_by_severity
                .entry(record.error.severity.as_str().to_string())
                .or_insert(0) += 1;
        }
        stats
    }

    pub fn analyze_error_patterns(&self) -> ErrorPatternAnalysis {
        self.analyze_error_patterns_at(Utc::now())
    }

    /// Pattern analysis relative to `now`.
    pub fn analyze_error_patterns_at(&self, now: DateTime<Utc>) -> ErrorPatternAnalysis {
        let state = self.state.lock();
        let sample: Vec<&ErrorDiagnosticRecord> = state
            .records
            .iter()
            .take(self.config.pattern_sample_size)
            .collect();

        let window = chrono::Duration::from_std(self.config.spike_window)
            .unwrap_or_else(|_| chrono::Duration::minutes(5));
        let recent_error_count = sample
            .iter()
            .filter(|r| now.signed_duration_since(r.collected_at) <= window)
            .count();
        let is_error_spike = recent_error_count > self.config.spike_threshold;

        let dominant_error_type = dominant_type(&sample);

        let mut suggestions = Vec::new();
        if is_error_spike {
            suggestions.push(
                "Multiple errors occurred in the last few minutes. Azure DevOps may be experiencing issues."
                    .to_string(),
            );
        }
        match dominant_error_type.as_deref() {
            Some("NetworkError") => {
                suggestions.push(
                    "Most recent errors are network related. Check your internet connection and proxy settings."
                        .to_string(),
                );
                suggestions.push("Consider increasing the refresh interval.".to_string());
            }
            Some("AuthenticationError") => {
                suggestions.push(
                    "Most recent errors are authentication related. Verify your Personal Access Token and its scopes."
                        .to_string(),
                );
            }
            Some("ConfigurationError") => {
                suggestions.push("Review the extension configuration.".to_string());
            }
            Some("ResourceError") => {
                suggestions.push(
                    "Some projects or pipelines may no longer exist. Refresh the view.".to_string(),
                );
            }
            _ => {}
        }
        if suggestions.is_empty() {
            suggestions.push(
                "No specific error pattern detected. Export diagnostics if problems persist."
                    .to_string(),
            );
        }

        ErrorPatternAnalysis {
            is_error_spike,
            recent_error_count,
            dominant_error_type,
            suggestions,
        }
    }

    pub fn performance_metrics(&self) -> PerformanceMetrics {
        let state = self.state.lock();
        Self::performance_metrics_of(&state)
    }

    fn performance_metrics_of(state: &DiagnosticsState) -> PerformanceMetrics {
        let average_response_time_ms = if state.response_times.is_empty() {
            0.0
        } else {
            let total: f64 = state
                .response_times
                .iter()
                .map(|d| d.as_secs_f64() * 1000.0)
                .sum();
            total / state.response_times.len() as f64
        };
        let error_rate = if state.total_requests == 0 {
            0.0
        } else {
            state.failed_requests as f64 / state.total_requests as f64
        };
        PerformanceMetrics {
            total_requests: state.total_requests,
            failed_requests: state.failed_requests,
            average_response_time_ms,
            error_rate,
            success_rate: 1.0 - error_rate,
        }
    }

    pub fn generate_diagnostic_report(&self) -> DiagnosticReport {
        let system_info = self.system_info();
        let process_memory_bytes = self.process_memory();
        let statistics = self.get_error_statistics();
        let pattern_analysis = self.analyze_error_patterns();

        let state = self.state.lock();
        DiagnosticReport {
            generated_at: Utc::now(),
            system_info,
            network_info: self.network_diagnostics(&state),
            extension_info: self.extension_diagnostics(&state, process_memory_bytes),
            recent_errors: state
                .records
                .iter()
                .take(self.config.max_report_errors)
                .cloned()
                .collect(),
            statistics,
            performance_metrics: Self::performance_metrics_of(&state),
            pattern_analysis,
        }
    }

    /// The diagnostic report as pretty-printed JSON.
    pub fn export_diagnostics(&self) -> ErrorResult<String> {
        let report = self.generate_diagnostic_report();
        let json = serde_json::to_string_pretty(&report).map_err(|e| {
            TypedError::extension(
                ExtensionCode::CommandError,
                format!("Failed to serialize diagnostic report: {e}"),
            )
        })?;
        log_info!(
            recent_errors = report.recent_errors.len(),
            bytes = json.len(),
            "Diagnostics exported"
        );
        Ok(json)
    }

    /// Drop the error history.
    pub fn clear(&self) {
        self.state.lock().records.clear();
    }

    /// Drop the history and all request metrics.
    pub fn dispose(&self) {
        let mut state = self.state.lock();
        state.records.clear();
        state.response_times.clear();
        state.total_requests = 0;
        state.failed_requests = 0;
        state.consecutive_failures = 0;
        state.last_successful_request = None;
    }

    fn system_info(&self) -> SystemInfo {
        let mut system = self.system.lock();
        system.refresh_memory();
        SystemInfo {
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            runtime_version: RUNTIME_VERSION.to_string(),
            host_app_name: self.environment.host_app_name.clone(),
            host_app_version: self.environment.host_app_version.clone(),
            extension_version: self.environment.extension_version.clone(),
            memory: MemorySnapshot {
                total_bytes: system.total_memory(),
                used_bytes: system.used_memory(),
            },
        }
    }

    fn process_memory(&self) -> Option<u64> {
        let pid = sysinfo::get_current_pid().ok()?;
        let mut system = self.system.lock();
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        system.process(pid).map(|p| p.memory())
    }

    fn network_diagnostics(&self, state: &DiagnosticsState) -> NetworkDiagnostics {
        NetworkDiagnostics {
            consecutive_failures: state.consecutive_failures,
            last_successful_request: state.last_successful_request,
            user_agent: self.config.user_agent.clone(),
        }
    }

    fn extension_diagnostics(
        &self,
        state: &DiagnosticsState,
        process_memory_bytes: Option<u64>,
    ) -> ExtensionDiagnostics {
        ExtensionDiagnostics {
            activation_time: self.activation_time,
            registered_commands: state.registered_commands.clone(),
            configuration_valid: state.configuration_valid,
            process_memory_bytes,
        }
    }
}

/// Most frequent error type in `sample`; ties go to the type seen most recently.
fn dominant_type(sample: &[&ErrorDiagnosticRecord]) -> Option<String> {
    let mut counts: Vec<(&'static str, usize)> = Vec::new();
    for record in sample {
        let name = record.error.error_type();
        match counts.iter_mut().find(|(n, _)| *n == name) {
            Some((_, count)) => *count += 1,
            None => counts.push((name, 1)),
        }
    }

    let mut best: Option<(&'static str, usize)> = None;
    for (name, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((name, count));
        }
    }
    best.map(|(name, _)| name.to_string())
}
