//! Data models for the orchestration core.
//!
//! This module contains the value types shared by the resolver, the
//! specialist agents and the orchestrator: privacy modes, resolved backend
//! profiles, per-agent outcomes and the aggregated report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Caller-declared sensitivity level for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyMode {
    /// On-premise processing, data never leaves the site.
    Secure,
    /// Cloud-hosted, higher capability processing.
    Cloud,
}

impl PrivacyMode {
    /// Returns the opposite mode, used for the single fallback hop.
    pub fn other(self) -> Self {
        match self {
            PrivacyMode::Secure => PrivacyMode::Cloud,
            PrivacyMode::Cloud => PrivacyMode::Secure,
        }
    }

    /// Where data lives when this mode is honoured.
    pub fn residency(self) -> DataResidency {
        match self {
            PrivacyMode::Secure => DataResidency::OnPremise,
            PrivacyMode::Cloud => DataResidency::Cloud,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PrivacyMode::Secure => "secure",
            PrivacyMode::Cloud => "cloud",
        }
    }
}

impl fmt::Display for PrivacyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrivacyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "secure" => Ok(PrivacyMode::Secure),
            "cloud" => Ok(PrivacyMode::Cloud),
            other => Err(format!(
                "unknown privacy mode '{}' (expected 'secure' or 'cloud')",
                other
            )),
        }
    }
}

/// Backend provider identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Local,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => write!(f, "openai"),
            Provider::Local => write!(f, "local"),
        }
    }
}

/// Compliance tag attached to a resolved backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyLevel {
    HipaaCompliant,
    Standard,
}

impl fmt::Display for PrivacyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivacyLevel::HipaaCompliant => write!(f, "hipaa_compliant"),
            PrivacyLevel::Standard => write!(f, "standard"),
        }
    }
}

/// Where request data is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataResidency {
    OnPremise,
    Cloud,
}

impl fmt::Display for DataResidency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataResidency::OnPremise => write!(f, "on_premise"),
            DataResidency::Cloud => write!(f, "cloud"),
        }
    }
}

/// Capability flags of a backend profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub complex_reasoning: bool,
    pub multimodal: bool,
    pub context_window: u32,
}

/// A resolved backend profile.
///
/// Built fresh by the resolver for every run and shared read-only (behind an
/// `Arc`) by every agent in that run.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub provider: Provider,
    pub model: String,
    /// Remote API base URL (cloud profile).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Model weights location (local profile).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,
    /// Never serialized into reports.
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub privacy_level: PrivacyLevel,
    pub data_residency: DataResidency,
    pub capabilities: Capabilities,
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("model_path", &self.model_path)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("privacy_level", &self.privacy_level)
            .field("data_residency", &self.data_residency)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// Name and version of an agent, attached to every result for provenance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalyzerIdentity {
    pub name: String,
    pub version: String,
}

impl AnalyzerIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for AnalyzerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.name, self.version)
    }
}

/// Why an agent did not produce findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The agent exceeded its time budget.
    Timeout,
    /// The agent errored, panicked or returned malformed data.
    AnalyzerError,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "Timeout"),
            FailureKind::AnalyzerError => write!(f, "AnalyzerError"),
        }
    }
}

/// Outcome of a single agent for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnalysisResult {
    Success {
        analyzer: AnalyzerIdentity,
        payload: serde_json::Value,
        processing_time_ms: f64,
        backend: Arc<BackendConfig>,
    },
    Failure {
        analyzer: AnalyzerIdentity,
        kind: FailureKind,
        message: String,
    },
}

impl AnalysisResult {
    /// Creates a failed outcome.
    pub fn failure(analyzer: AnalyzerIdentity, kind: FailureKind, message: impl Into<String>) -> Self {
        AnalysisResult::Failure {
            analyzer,
            kind,
            message: message.into(),
        }
    }

    pub fn analyzer(&self) -> &AnalyzerIdentity {
        match self {
            AnalysisResult::Success { analyzer, .. } | AnalysisResult::Failure { analyzer, .. } => {
                analyzer
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisResult::Success { .. })
    }

    /// The failure kind, if this outcome is a failure.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            AnalysisResult::Failure { kind, .. } => Some(*kind),
            AnalysisResult::Success { .. } => None,
        }
    }

    /// The backend the findings were produced with, if any.
    pub fn backend(&self) -> Option<&BackendConfig> {
        match self {
            AnalysisResult::Success { backend, .. } => Some(backend),
            AnalysisResult::Failure { .. } => None,
        }
    }

    pub fn payload(&self) -> Option<&serde_json::Value> {
        match self {
            AnalysisResult::Success { payload, .. } => Some(payload),
            AnalysisResult::Failure { .. } => None,
        }
    }
}

/// One row of the aggregated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEntry {
    /// Agent name, unique within a run.
    pub name: String,
    /// Position in the registry; entries are sorted by it.
    pub registration_index: usize,
    /// Wall-clock time from dispatch to this agent's terminal outcome.
    pub elapsed_ms: f64,
    pub result: AnalysisResult,
}

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Every agent succeeded.
    Complete,
    /// At least one success and at least one failure.
    Partial,
    /// Every agent failed.
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Complete => write!(f, "complete"),
            RunStatus::Partial => write!(f, "partial"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

impl RunStatus {
    /// Returns an emoji representation of the status.
    pub fn emoji(&self) -> &'static str {
        match self {
            RunStatus::Complete => "🟢",
            RunStatus::Partial => "🟡",
            RunStatus::Failed => "🔴",
        }
    }
}

/// Outcome counts for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Subset of `failed` that hit the per-agent timeout.
    pub timed_out: usize,
}

/// The orchestrator's combined output for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedReport {
    pub subject: String,
    pub requested_mode: PrivacyMode,
    /// Mode actually used, after any fallback.
    pub mode_used: PrivacyMode,
    pub fell_back: bool,
    pub backend: Arc<BackendConfig>,
    pub started_at: DateTime<Utc>,
    pub status: RunStatus,
    pub summary: RunSummary,
    /// Sorted by registration order, never by completion order.
    pub entries: Vec<AgentEntry>,
    pub duration_ms: f64,
}

impl AggregatedReport {
    /// Look up an agent's outcome by name.
    pub fn get(&self, name: &str) -> Option<&AnalysisResult> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.result)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
