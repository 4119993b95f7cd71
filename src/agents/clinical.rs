//! Clinical trial analysis agent.
//!
//! Reports trial counts and phases, safety profile, efficacy and
//! regulatory status for a compound.

use super::{finish, pick, rng_for, round_to, sample, simulate_latency, Analyzer};
use crate::config::SimulationConfig;
use crate::models::{AnalysisResult, AnalyzerIdentity, BackendConfig};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

const NAME: &str = "ClinicalAgent";
const VERSION: &str = "1.0.0";

const INDICATIONS: &[&str] = &[
    "Non-Small Cell Lung Cancer",
    "Rheumatoid Arthritis",
    "Type 2 Diabetes",
    "Alzheimer's Disease",
    "Multiple Sclerosis",
    "Psoriasis",
    "Chronic Kidney Disease",
    "Heart Failure",
    "Major Depressive Disorder",
    "Parkinson's Disease",
    "Crohn's Disease",
    "Atopic Dermatitis",
];

const ADVERSE_EVENTS: &[(&str, &str, &str)] = &[
    ("Headache", "Common", "Mild"),
    ("Nausea", "Common", "Mild"),
    ("Fatigue", "Common", "Mild"),
    ("Dizziness", "Uncommon", "Mild"),
    ("Rash", "Uncommon", "Moderate"),
];

const APPROVAL_STATES: &[&str] = &["Approved", "Under Review", "Phase 3"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalFindings {
    pub molecule: String,
    pub analysis_date: DateTime<Utc>,
    pub total_trials_found: u32,
    pub active_trials: u32,
    pub completed_trials: u32,
    pub phase_distribution: PhaseDistribution,
    pub current_indications: Vec<String>,
    pub potential_new_indications: Vec<String>,
    pub safety_score: f64,
    pub adverse_events: Vec<AdverseEvent>,
    pub black_box_warning: bool,
    pub efficacy_rating: String,
    pub primary_endpoint_success_rate: String,
    pub regulatory_status: RegulatoryStatus,
    pub model_used: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseDistribution {
    pub phase_1: u32,
    pub phase_2: u32,
    pub phase_3: u32,
    pub phase_4: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdverseEvent {
    pub event: String,
    pub frequency: String,
    pub severity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegulatoryStatus {
    pub fda: String,
    pub ema: String,
    pub pmda: String,
}

/// Clinical trial and safety profiling agent.
#[derive(Debug, Clone)]
pub struct ClinicalAgent {
    settings: SimulationConfig,
}

impl ClinicalAgent {
    pub fn new(settings: SimulationConfig) -> Self {
        info!("Initialized {} v{}", NAME, VERSION);
        Self { settings }
    }

    fn generate(&self, subject: &str, model: &str, rng: &mut StdRng) -> ClinicalFindings {
        let total = rng.gen_range(15..=60);
        let active = rng.gen_range(3..=15);

        let mut events = ADVERSE_EVENTS.to_vec();
        rand::seq::SliceRandom::shuffle(events.as_mut_slice(), rng);
        events.truncate(rng.gen_range(2..=4));

        ClinicalFindings {
            molecule: subject.to_string(),
            analysis_date: Utc::now(),
            total_trials_found: total,
            active_trials: active,
            completed_trials: total - active,
            phase_distribution: PhaseDistribution {
                phase_1: rng.gen_range(5..=15),
                phase_2: rng.gen_range(8..=20),
                phase_3: rng.gen_range(3..=12),
                phase_4: rng.gen_range(2..=8),
            },
            current_indications: {
                let count = rng.gen_range(2..=4);
                sample(rng, INDICATIONS, count)
            },
            potential_new_indications: {
                let count = rng.gen_range(2..=5);
                sample(rng, INDICATIONS, count)
            },
            safety_score: round_to(rng.gen_range(7.0..=9.5), 1),
            adverse_events: events
                .into_iter()
                .map(|(event, frequency, severity)| AdverseEvent {
                    event: event.to_string(),
                    frequency: frequency.to_string(),
                    severity: severity.to_string(),
                })
                .collect(),
            black_box_warning: rng.gen_bool(0.25),
            efficacy_rating: pick(rng, &["High", "Moderate-High", "Moderate"]),
            primary_endpoint_success_rate: format!("{}%", rng.gen_range(55..=85)),
            regulatory_status: RegulatoryStatus {
                fda: pick(rng, APPROVAL_STATES),
                ema: pick(rng, APPROVAL_STATES),
                pmda: pick(rng, &["Approved", "Under Review", "Not Filed"]),
            },
            model_used: model.to_string(),
        }
    }
}

#[async_trait]
impl Analyzer for ClinicalAgent {
    fn identity(&self) -> AnalyzerIdentity {
        AnalyzerIdentity::new(NAME, VERSION)
    }

    async fn analyze(&self, subject: &str, backend: Arc<BackendConfig>) -> AnalysisResult {
        let started = Instant::now();
        info!(
            subject = %subject,
            agent = NAME,
            model = %backend.model,
            "clinical analysis started"
        );

        let mut rng = rng_for(&self.settings, NAME, subject);
        simulate_latency(&self.settings, &mut rng, 800..=2000).await;

        let findings = self.generate(subject, &backend.model, &mut rng);

        info!(
            subject = %subject,
            agent = NAME,
            model = %backend.model,
            trials_found = findings.total_trials_found,
            "clinical analysis completed"
        );

        finish(self.identity(), &findings, started, backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::{backend, instant_settings};
    use crate::models::PrivacyMode;

    #[tokio::test]
    async fn test_clinical_findings_shape() {
        let agent = ClinicalAgent::new(instant_settings(11));
        let backend = backend(PrivacyMode::Secure);
        let result = agent.analyze("metformin", Arc::clone(&backend)).await;

        assert!(result.is_success());
        assert_eq!(result.backend(), Some(&*backend));

        let payload = result.payload().unwrap();
        assert_eq!(payload["molecule"], "metformin");
        assert_eq!(payload["model_used"], backend.model.as_str());

        let total = payload["total_trials_found"].as_u64().unwrap();
        let active = payload["active_trials"].as_u64().unwrap();
        let completed = payload["completed_trials"].as_u64().unwrap();
        assert!((15..=60).contains(&total));
        assert_eq!(active + completed, total);

        let events = payload["adverse_events"].as_array().unwrap();
        assert!((2..=4).contains(&events.len()));
    }

    #[test]
    fn test_identity() {
        let agent = ClinicalAgent::new(instant_settings(1));
        assert_eq!(agent.identity(), AnalyzerIdentity::new("ClinicalAgent", "1.0.0"));
    }
}
