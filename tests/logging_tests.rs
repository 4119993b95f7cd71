//! Structured log events emitted by the resolver and the orchestrator.

use async_trait::async_trait;
use pharmalens::config::{Config, SimulationConfig};
use pharmalens::{
    AgentOrchestrator, AnalysisResult, Analyzer, AnalyzerIdentity, AnalyzerKind, BackendConfig,
    BackendProfileResolver, FailureKind, PrivacyMode,
};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::Level;

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a debug-level subscriber writing into the returned buffer.
fn capture<F: FnOnce()>(f: F) -> CapturedLogs {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, f);
    logs
}

fn instant_config() -> Config {
    let mut config = Config::default();
    config.simulation = SimulationConfig {
        latency: false,
        seed: Some(3),
    };
    config
}

#[test]
fn fallback_emits_warning() {
    let mut config = instant_config();
    config.local.enabled = false;

    let logs = capture(|| {
        let resolution = BackendProfileResolver::from_config(&config)
            .resolve(PrivacyMode::Secure)
            .unwrap();
        assert!(resolution.fell_back());
    });

    let lines = logs.lines();
    let warning = lines
        .iter()
        .find(|line| line.contains("falling back"))
        .expect("no fallback event was logged");
    assert!(warning.contains("WARN"), "{}", warning);
    assert!(warning.contains("requested=secure"), "{}", warning);
    assert!(warning.contains("using=cloud"), "{}", warning);
}

#[test]
fn no_warning_without_fallback() {
    let config = instant_config();

    let logs = capture(|| {
        BackendProfileResolver::from_config(&config)
            .resolve(PrivacyMode::Secure)
            .unwrap();
    });

    assert!(logs.lines().iter().all(|line| !line.contains("WARN")));
}

#[test]
fn analysis_events_carry_subject_agent_and_model() {
    let mut config = instant_config();
    config.orchestrator.agents = vec![AnalyzerKind::Clinical, AnalyzerKind::Patent];

    let logs = capture(|| {
        let orchestrator = AgentOrchestrator::from_config(&config).unwrap();
        let report =
            tokio_test::block_on(orchestrator.run("aspirin", PrivacyMode::Secure)).unwrap();
        assert_eq!(report.summary.succeeded, 2);
    });

    let lines = logs.lines();
    let model = format!("model={}", config.local.model);
    for (agent, event) in [
        ("ClinicalAgent", "clinical analysis started"),
        ("ClinicalAgent", "clinical analysis completed"),
        ("PatentAgent", "patent analysis started"),
        ("PatentAgent", "patent analysis completed"),
        ("ClinicalAgent", "agent started"),
        ("ClinicalAgent", "agent completed"),
        ("PatentAgent", "agent started"),
        ("PatentAgent", "agent completed"),
    ] {
        let line = lines
            .iter()
            .find(|line| line.contains(event) && line.contains(agent))
            .unwrap_or_else(|| panic!("missing '{}' for {}: {:#?}", event, agent, lines));
        assert!(line.contains("subject=aspirin"), "{}", line);
        assert!(line.contains(&model), "{}", line);
    }
}

/// Agent that never logs on its own.
struct SilentAgent;

#[async_trait]
impl Analyzer for SilentAgent {
    fn identity(&self) -> AnalyzerIdentity {
        AnalyzerIdentity::new("SilentAgent", "0.1.0")
    }

    async fn analyze(&self, _subject: &str, _backend: Arc<BackendConfig>) -> AnalysisResult {
        AnalysisResult::failure(self.identity(), FailureKind::AnalyzerError, "no data")
    }
}

#[test]
fn custom_agents_get_lifecycle_events() {
    let config = instant_config();

    let logs = capture(|| {
        let mut orchestrator = AgentOrchestrator::new(
            BackendProfileResolver::from_config(&config),
            Duration::from_secs(1),
        );
        orchestrator.register(Arc::new(SilentAgent)).unwrap();
        tokio_test::block_on(orchestrator.run("ibuprofen", PrivacyMode::Cloud)).unwrap();
    });

    let lines = logs.lines();
    let model = format!("model={}", config.cloud.model);
    for event in ["agent started", "agent completed"] {
        let line = lines
            .iter()
            .find(|line| line.contains(event) && line.contains("SilentAgent"))
            .unwrap_or_else(|| panic!("missing '{}': {:#?}", event, lines));
        assert!(line.contains("subject=ibuprofen"), "{}", line);
        assert!(line.contains(&model), "{}", line);
    }

    let completed = lines
        .iter()
        .find(|line| line.contains("agent completed"))
        .unwrap();
    assert!(completed.contains("success=false"), "{}", completed);
}
