//! Specialist analysis agents.
//!
//! Every specialist implements [`Analyzer`]. The orchestrator only ever sees
//! `Arc<dyn Analyzer>`, never a concrete agent type. The shipped agents
//! fabricate plausible findings; their randomness stays behind the trait.

pub mod clinical;
pub mod market;
pub mod patent;
pub mod vision;

pub use clinical::ClinicalAgent;
pub use market::MarketAgent;
pub use patent::PatentAgent;
pub use vision::VisionAgent;

use crate::config::SimulationConfig;
use crate::models::{AnalysisResult, AnalyzerIdentity, BackendConfig, FailureKind};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// The uniform analysis contract.
///
/// Implementations must not block the executor, must report domain problems
/// as [`AnalysisResult::Failure`] rather than panicking, and must return the
/// backend they were given in any success.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Name and version used for provenance. Names are unique per registry.
    fn identity(&self) -> AnalyzerIdentity;

    /// Analyze `subject` using the run's backend profile.
    async fn analyze(&self, subject: &str, backend: Arc<BackendConfig>) -> AnalysisResult;
}

/// The specialists shipped with the crate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerKind {
    Clinical,
    Patent,
    Market,
    Vision,
}

impl AnalyzerKind {
    pub const ALL: [AnalyzerKind; 4] = [
        AnalyzerKind::Clinical,
        AnalyzerKind::Patent,
        AnalyzerKind::Market,
        AnalyzerKind::Vision,
    ];

    /// Build the agent for this kind.
    pub fn build(self, settings: &SimulationConfig) -> Arc<dyn Analyzer> {
        match self {
            AnalyzerKind::Clinical => Arc::new(ClinicalAgent::new(settings.clone())),
            AnalyzerKind::Patent => Arc::new(PatentAgent::new(settings.clone())),
            AnalyzerKind::Market => Arc::new(MarketAgent::new(settings.clone())),
            AnalyzerKind::Vision => Arc::new(VisionAgent::new(settings.clone())),
        }
    }
}

/// Build agents for `kinds`, preserving order.
pub fn default_registry(kinds: &[AnalyzerKind], settings: &SimulationConfig) -> Vec<Arc<dyn Analyzer>> {
    kinds.iter().map(|kind| kind.build(settings)).collect()
}

/// Random source for one analysis. Seeded runs are reproducible per agent
/// and subject.
pub(crate) fn rng_for(settings: &SimulationConfig, agent: &str, subject: &str) -> StdRng {
    match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ fnv1a(agent).rotate_left(17) ^ fnv1a(subject)),
        None => StdRng::from_entropy(),
    }
}

fn fnv1a(s: &str) -> u64 {
    s.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// Sleep for a processing time drawn from `range_ms`, if latency is enabled.
pub(crate) async fn simulate_latency(
    settings: &SimulationConfig,
    rng: &mut StdRng,
    range_ms: RangeInclusive<u64>,
) {
    if !settings.latency {
        return;
    }
    let delay = rng.gen_range(range_ms);
    debug!(delay_ms = delay, "Simulating processing latency");
    tokio::time::sleep(Duration::from_millis(delay)).await;
}

/// Wrap typed findings into a success, or an `AnalyzerError` if they cannot
/// be represented as JSON.
pub(crate) fn finish<T: Serialize>(
    identity: AnalyzerIdentity,
    findings: &T,
    started: Instant,
    backend: Arc<BackendConfig>,
) -> AnalysisResult {
    match serde_json::to_value(findings) {
        Ok(payload) => AnalysisResult::Success {
            analyzer: identity,
            payload,
            processing_time_ms: round_to(started.elapsed().as_secs_f64() * 1000.0, 2),
            backend,
        },
        Err(e) => AnalysisResult::failure(
            identity,
            FailureKind::AnalyzerError,
            format!("failed to encode findings: {}", e),
        ),
    }
}

pub(crate) fn pick(rng: &mut StdRng, items: &[&str]) -> String {
    items.choose(rng).copied().unwrap_or_default().to_string()
}

pub(crate) fn sample(rng: &mut StdRng, items: &[&str], count: usize) -> Vec<String> {
    items
        .choose_multiple(rng, count.min(items.len()))
        .map(|s| s.to_string())
        .collect()
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
