//! Multi-agent orchestration.
//!
//! Fans one subject out to every registered agent, runs them concurrently
//! against a single resolved backend, isolates per-agent failures and
//! timeouts, and folds the outcomes into an [`AggregatedReport`].

pub mod progress;

pub use progress::{NoProgress, ProgressNotifier};

use crate::agents::{default_registry, Analyzer};
use crate::analysis::{compute_status, summarize};
use crate::config::Config;
use crate::error::OrchestrationError;
use crate::models::{
    AgentEntry, AggregatedReport, AnalysisResult, AnalyzerIdentity, BackendConfig, FailureKind,
    PrivacyMode,
};
use crate::privacy::BackendProfileResolver;
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Longest accepted subject identifier, in characters.
pub const MAX_SUBJECT_LEN: usize = 256;

/// Owns the agent registry and runs orchestration requests.
///
/// Registration takes `&mut self` and runs take `&self`, so the registry
/// cannot change while a run is in flight.
pub struct AgentOrchestrator {
    resolver: BackendProfileResolver,
    analyzers: Vec<Arc<dyn Analyzer>>,
    timeout: Duration,
}

impl AgentOrchestrator {
    /// Create an orchestrator with an empty registry.
    pub fn new(resolver: BackendProfileResolver, per_agent_timeout: Duration) -> Self {
        Self {
            resolver,
            analyzers: Vec::new(),
            timeout: per_agent_timeout,
        }
    }

    /// Build an orchestrator with the agents and backends named in `config`.
    pub fn from_config(config: &Config) -> Result<Self, OrchestrationError> {
        let mut orchestrator = Self::new(
            BackendProfileResolver::from_config(config),
            config.orchestrator.timeout(),
        );
        for analyzer in default_registry(&config.orchestrator.agents, &config.simulation) {
            orchestrator.register(analyzer)?;
        }
        Ok(orchestrator)
    }

    /// Add an agent. Names must be unique.
    pub fn register(&mut self, analyzer: Arc<dyn Analyzer>) -> Result<(), OrchestrationError> {
        let identity = analyzer.identity();
        if self
            .analyzers
            .iter()
            .any(|existing| existing.identity().name == identity.name)
        {
            return Err(OrchestrationError::Configuration(format!(
                "agent '{}' is already registered",
                identity.name
            )));
        }

        debug!(agent = %identity, "Registered agent");
        self.analyzers.push(analyzer);
        Ok(())
    }

    /// Names of the registered agents, in registration order.
    pub fn agent_names(&self) -> Vec<String> {
        self.analyzers.iter().map(|a| a.identity().name).collect()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Boundary entry point: parse the mode string, then run.
    pub async fn orchestrate(
        &self,
        subject: &str,
        mode: &str,
    ) -> Result<AggregatedReport, OrchestrationError> {
        let mode = mode
            .parse::<PrivacyMode>()
            .map_err(OrchestrationError::InvalidMode)?;
        self.run(subject, mode).await
    }

    /// Run every registered agent against `subject`.
    pub async fn run(
        &self,
        subject: &str,
        mode: PrivacyMode,
    ) -> Result<AggregatedReport, OrchestrationError> {
        self.run_with_progress(subject, mode, Arc::new(NoProgress))
            .await
    }

    /// Run every registered agent, reporting lifecycle events to `progress`.
    ///
    /// Only configuration and subject problems are returned as errors; agent
    /// failures and timeouts end up in the report.
    pub async fn run_with_progress(
        &self,
        subject: &str,
        mode: PrivacyMode,
        progress: Arc<dyn ProgressNotifier>,
    ) -> Result<AggregatedReport, OrchestrationError> {
        let resolution = self.resolver.resolve(mode)?;
        let subject = validate_subject(subject)?;

        if self.analyzers.is_empty() {
            return Err(OrchestrationError::Configuration(
                "no agents registered".to_string(),
            ));
        }

        let total = self.analyzers.len();
        info!(
            subject = %subject,
            requested = %mode,
            mode_used = %resolution.used,
            model = %resolution.config.model,
            agents = total,
            "Starting orchestration run"
        );
        progress.on_run_start(subject, resolution.used, total);

        let identities: Vec<AnalyzerIdentity> =
            self.analyzers.iter().map(|a| a.identity()).collect();
        let started_at = Utc::now();
        let dispatched = Instant::now();

        // Dropping the set aborts whatever is still running.
        let mut join_set = JoinSet::new();
        for (index, analyzer) in self.analyzers.iter().enumerate() {
            let analyzer = Arc::clone(analyzer);
            let identity = identities[index].clone();
            let backend = Arc::clone(&resolution.config);
            let subject = subject.to_string();
            let progress = Arc::clone(&progress);
            let timeout = self.timeout;

            join_set.spawn(async move {
                let started = Instant::now();
                let model = backend.model.clone();
                debug!(
                    subject = %subject,
                    agent = %identity.name,
                    model = %model,
                    "agent started"
                );
                progress.on_agent_start(&identity.name);

                let result = run_agent(analyzer, identity, &subject, backend, timeout).await;

                debug!(
                    subject = %subject,
                    agent = %result.analyzer().name,
                    model = %model,
                    success = result.is_success(),
                    elapsed_ms = millis(started.elapsed()),
                    "agent completed"
                );
                progress.on_agent_complete(&result.analyzer().name, result.is_success());
                (index, result, Instant::now())
            });
        }

        let mut slots: Vec<Option<AgentEntry>> = vec![None; total];
        let mut last_outcome = dispatched;

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result, finished)) => {
                    last_outcome = last_outcome.max(finished);
                    if let AnalysisResult::Failure { kind, message, .. } = &result {
                        warn!(
                            agent = %identities[index].name,
                            kind = %kind,
                            "Agent failed: {}",
                            message
                        );
                    }
                    slots[index] = Some(AgentEntry {
                        name: identities[index].name.clone(),
                        registration_index: index,
                        elapsed_ms: millis(finished - dispatched),
                        result,
                    });
                }
                Err(e) => {
                    warn!("Agent task join error: {}", e);
                }
            }
        }

        // Every registered agent gets an entry, even if its task vanished.
        let entries: Vec<AgentEntry> = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| AgentEntry {
                    name: identities[index].name.clone(),
                    registration_index: index,
                    elapsed_ms: millis(last_outcome - dispatched),
                    result: AnalysisResult::failure(
                        identities[index].clone(),
                        FailureKind::AnalyzerError,
                        "agent task ended without reporting an outcome",
                    ),
                })
            })
            .collect();

        let status = compute_status(&entries);
        let summary = summarize(&entries);
        let duration_ms = millis(last_outcome - dispatched);

        info!(
            subject = %subject,
            status = %status,
            succeeded = summary.succeeded,
            failed = summary.failed,
            duration_ms,
            "Orchestration run finished"
        );
        progress.on_run_complete(status);

        Ok(AggregatedReport {
            subject: subject.to_string(),
            requested_mode: resolution.requested,
            mode_used: resolution.used,
            fell_back: resolution.fell_back(),
            backend: resolution.config,
            started_at,
            status,
            summary,
            entries,
            duration_ms,
        })
    }
}

/// Accept any trimmed, non-empty identifier without control characters.
pub fn validate_subject(subject: &str) -> Result<&str, OrchestrationError> {
    let trimmed = subject.trim();

    if trimmed.is_empty() {
        return Err(OrchestrationError::InvalidSubject(
            "subject is empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_SUBJECT_LEN {
        return Err(OrchestrationError::InvalidSubject(format!(
            "subject exceeds {} characters",
            MAX_SUBJECT_LEN
        )));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(OrchestrationError::InvalidSubject(
            "subject contains control characters".to_string(),
        ));
    }

    Ok(trimmed)
}

/// Run one agent under the time budget, turning panics and timeouts into
/// failure outcomes.
async fn run_agent(
    analyzer: Arc<dyn Analyzer>,
    identity: AnalyzerIdentity,
    subject: &str,
    backend: Arc<BackendConfig>,
    timeout: Duration,
) -> AnalysisResult {
    let call = AssertUnwindSafe(analyzer.analyze(subject, Arc::clone(&backend))).catch_unwind();

    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(result)) => verify_result(result, identity, &backend),
        Ok(Err(panic)) => AnalysisResult::failure(
            identity,
            FailureKind::AnalyzerError,
            format!("agent panicked: {}", panic_message(panic.as_ref())),
        ),
        Err(_) => AnalysisResult::failure(
            identity,
            FailureKind::Timeout,
            format!("no result within {}ms", timeout.as_millis()),
        ),
    }
}

/// Reject results that claim another identity or another backend.
fn verify_result(
    result: AnalysisResult,
    identity: AnalyzerIdentity,
    backend: &BackendConfig,
) -> AnalysisResult {
    if *result.analyzer() != identity {
        let message = format!(
            "malformed result: reported as {} instead of {}",
            result.analyzer(),
            identity
        );
        return AnalysisResult::failure(identity, FailureKind::AnalyzerError, message);
    }

    if let Some(used) = result.backend() {
        if used != backend {
            let message = format!(
                "malformed result: produced with {} ({}) but the run resolved {} ({})",
                used.model, used.data_residency, backend.model, backend.data_residency
            );
            return AnalysisResult::failure(identity, FailureKind::AnalyzerError, message);
        }
    }

    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DataResidency, RunStatus};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behavior {
        Succeed,
        Fail,
        Panic,
        Sleep(Duration),
        ForeignBackend,
        WrongName,
    }

    struct ScriptedAgent {
        name: &'static str,
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedAgent {
        fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                name,
                behavior,
                calls: Arc::new(AtomicUsize::new(0)),
            })
        }
    }

    #[async_trait]
    impl Analyzer for ScriptedAgent {
        fn identity(&self) -> AnalyzerIdentity {
            AnalyzerIdentity::new(self.name, "0.1.0")
        }

        async fn analyze(&self, subject: &str, backend: Arc<BackendConfig>) -> AnalysisResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let success = |backend: Arc<BackendConfig>| AnalysisResult::Success {
                analyzer: self.identity(),
                payload: serde_json::json!({ "molecule": subject }),
                processing_time_ms: 0.0,
                backend,
            };

            match &self.behavior {
                Behavior::Succeed => success(backend),
                Behavior::Fail => AnalysisResult::failure(
                    self.identity(),
                    FailureKind::AnalyzerError,
                    "no data for subject",
                ),
                Behavior::Panic => panic!("scripted panic"),
                Behavior::Sleep(delay) => {
                    tokio::time::sleep(*delay).await;
                    success(backend)
                }
                Behavior::ForeignBackend => {
                    let mut other = (*backend).clone();
                    other.model = "rogue-model".to_string();
                    other.data_residency = DataResidency::Cloud;
                    success(Arc::new(other))
                }
                Behavior::WrongName => AnalysisResult::Success {
                    analyzer: AnalyzerIdentity::new("Impostor", "9.9.9"),
                    payload: serde_json::Value::Null,
                    processing_time_ms: 0.0,
                    backend,
                },
            }
        }
    }

    fn orchestrator(timeout: Duration) -> AgentOrchestrator {
        AgentOrchestrator::new(
            BackendProfileResolver::from_config(&Config::default()),
            timeout,
        )
    }

    #[tokio::test]
    async fn test_all_succeed_is_complete() {
        let mut orch = orchestrator(Duration::from_secs(1));
        orch.register(ScriptedAgent::new("a", Behavior::Succeed)).unwrap();
        orch.register(ScriptedAgent::new("b", Behavior::Succeed)).unwrap();

        let report = orch.run("aspirin", PrivacyMode::Secure).await.unwrap();
        assert_eq!(report.status, RunStatus::Complete);
        assert_eq!(report.len(), 2);
        assert_eq!(report.mode_used, PrivacyMode::Secure);
        assert!(!report.fell_back);
        assert_eq!(report.summary.succeeded, 2);
    }

    #[tokio::test]
    async fn test_panic_is_isolated() {
        let mut orch = orchestrator(Duration::from_secs(1));
        orch.register(ScriptedAgent::new("steady", Behavior::Succeed)).unwrap();
        orch.register(ScriptedAgent::new("crashy", Behavior::Panic)).unwrap();

        let report = orch.run("aspirin", PrivacyMode::Cloud).await.unwrap();
        assert_eq!(report.status, RunStatus::Partial);

        let crashed = report.get("crashy").unwrap();
        assert_eq!(crashed.failure_kind(), Some(FailureKind::AnalyzerError));
        match crashed {
            AnalysisResult::Failure { message, .. } => assert!(message.contains("scripted panic")),
            _ => unreachable!(),
        }
        assert!(report.get("steady").unwrap().is_success());
    }

    #[tokio::test]
    async fn test_timeout_is_recorded() {
        let mut orch = orchestrator(Duration::from_millis(50));
        orch.register(ScriptedAgent::new("slow", Behavior::Sleep(Duration::from_secs(5))))
            .unwrap();

        let report = orch.run("aspirin", PrivacyMode::Cloud).await.unwrap();
        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(
            report.get("slow").unwrap().failure_kind(),
            Some(FailureKind::Timeout)
        );
        assert_eq!(report.summary.timed_out, 1);
        assert!(report.duration_ms < 2000.0);
    }

    #[tokio::test]
    async fn test_foreign_backend_is_rejected() {
        let mut orch = orchestrator(Duration::from_secs(1));
        orch.register(ScriptedAgent::new("rogue", Behavior::ForeignBackend))
            .unwrap();
        orch.register(ScriptedAgent::new("impostor", Behavior::WrongName))
            .unwrap();

        let report = orch.run("aspirin", PrivacyMode::Secure).await.unwrap();
        assert_eq!(report.status, RunStatus::Failed);
        for entry in &report.entries {
            assert_eq!(entry.result.failure_kind(), Some(FailureKind::AnalyzerError));
            assert_eq!(entry.result.analyzer().name, entry.name);
        }
    }

    #[tokio::test]
    async fn test_entries_follow_registration_order() {
        let mut orch = orchestrator(Duration::from_secs(1));
        orch.register(ScriptedAgent::new("first", Behavior::Sleep(Duration::from_millis(80))))
            .unwrap();
        orch.register(ScriptedAgent::new("second", Behavior::Fail)).unwrap();
        orch.register(ScriptedAgent::new("third", Behavior::Succeed)).unwrap();

        let report = orch.run("aspirin", PrivacyMode::Cloud).await.unwrap();
        let names: Vec<_> = report.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        assert!(report
            .entries
            .iter()
            .enumerate()
            .all(|(i, e)| e.registration_index == i));
    }

    #[tokio::test]
    async fn test_empty_subject_dispatches_nothing() {
        let agent = ScriptedAgent::new("counted", Behavior::Succeed);
        let calls = Arc::clone(&agent.calls);
        let mut orch = orchestrator(Duration::from_secs(1));
        orch.register(agent).unwrap();

        let err = orch.orchestrate("   ", "cloud").await.unwrap_err();
        assert!(matches!(err, OrchestrationError::InvalidSubject(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_mode_rejected() {
        let mut orch = orchestrator(Duration::from_secs(1));
        orch.register(ScriptedAgent::new("a", Behavior::Succeed)).unwrap();

        let err = orch.orchestrate("aspirin", "hybrid").await.unwrap_err();
        assert!(matches!(err, OrchestrationError::InvalidMode(_)));
    }

    #[tokio::test]
    async fn test_empty_registry_is_configuration_error() {
        let orch = orchestrator(Duration::from_secs(1));
        let err = orch.run("aspirin", PrivacyMode::Cloud).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::Configuration(_)));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut orch = orchestrator(Duration::from_secs(1));
        orch.register(ScriptedAgent::new("dup", Behavior::Succeed)).unwrap();
        let err = orch
            .register(ScriptedAgent::new("dup", Behavior::Fail))
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::Configuration(_)));
        assert_eq!(orch.agent_names(), vec!["dup"]);
    }

    #[test]
    fn test_validate_subject() {
        assert_eq!(validate_subject("  aspirin ").unwrap(), "aspirin");
        assert!(validate_subject("").is_err());
        assert!(validate_subject("asp\nirin").is_err());
        assert!(validate_subject(&"x".repeat(MAX_SUBJECT_LEN + 1)).is_err());
        assert!(validate_subject(&"x".repeat(MAX_SUBJECT_LEN)).is_ok());
    }

    #[test]
    fn test_from_config_registers_configured_agents() {
        let config = Config::default();
        let orch = AgentOrchestrator::from_config(&config).unwrap();
        assert_eq!(
            orch.agent_names(),
            vec!["ClinicalAgent", "PatentAgent", "MarketAgent", "VisionAgent"]
        );
        assert_eq!(orch.timeout(), Duration::from_secs(30));
    }
}
