//! Intellectual property analysis agent.

use super::{finish, pick, rng_for, round_to, sample, simulate_latency, Analyzer};
use crate::config::SimulationConfig;
use crate::models::{AnalysisResult, AnalyzerIdentity, BackendConfig};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

const NAME: &str = "PatentAgent";
const VERSION: &str = "1.0.0";

const COMPANIES: &[&str] = &[
    "Pfizer",
    "Novartis",
    "Roche",
    "Merck",
    "AstraZeneca",
    "Sanofi",
    "GSK",
    "AbbVie",
    "Bristol-Myers Squibb",
    "Eli Lilly",
];

const CLAIM_TYPES: &[&str] = &["Composition", "Method of Use", "Formulation", "Process"];

const RECOMMENDATIONS: &[&str] = &[
    "Consider licensing agreement for key blocking patents",
    "Monitor upcoming patent expirations for market entry timing",
    "File patent applications for novel formulations",
    "Conduct detailed FTO analysis before Phase 3",
    "Explore patent term extension opportunities",
    "Evaluate design-around strategies for blocking claims",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatentFindings {
    pub molecule: String,
    pub analysis_date: DateTime<Utc>,
    pub total_patents: u32,
    pub active_patents: u32,
    pub pending_applications: u32,
    pub earliest_expiration: NaiveDate,
    pub latest_expiration: NaiveDate,
    pub patent_term_extensions: bool,
    pub freedom_to_operate: String,
    pub fto_score: f64,
    pub blocking_patents: u32,
    pub key_patent_holders: Vec<PatentHolder>,
    pub licensing_opportunities: String,
    pub geographic_coverage: GeographicCoverage,
    pub ip_risk_level: String,
    pub litigation_history: u32,
    pub strategy_recommendations: Vec<String>,
    pub model_used: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatentHolder {
    pub company: String,
    pub patent_count: u32,
    pub key_claims: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeographicCoverage {
    pub us: bool,
    pub eu: bool,
    pub japan: bool,
    pub china: bool,
    pub row: bool,
}

/// Patent landscape and freedom-to-operate agent.
#[derive(Debug, Clone)]
pub struct PatentAgent {
    settings: SimulationConfig,
}

impl PatentAgent {
    pub fn new(settings: SimulationConfig) -> Self {
        info!("Initialized {} v{}", NAME, VERSION);
        Self { settings }
    }

    fn generate(&self, subject: &str, model: &str, rng: &mut StdRng) -> PatentFindings {
        let today = Utc::now();
        let earliest = today + Duration::days(rng.gen_range(730..=2920));
        let latest = earliest + Duration::days(rng.gen_range(365..=1825));

        let active = rng.gen_range(5..=25);
        let total = active + rng.gen_range(5..=25);

        let holder_count = rng.gen_range(2..=4);
        let companies: Vec<&str> = COMPANIES.choose_multiple(rng, holder_count).copied().collect();
        let holders = companies
            .into_iter()
            .map(|company| PatentHolder {
                company: company.to_string(),
                patent_count: rng.gen_range(1..=8),
                key_claims: pick(rng, CLAIM_TYPES),
            })
            .collect();

        PatentFindings {
            molecule: subject.to_string(),
            analysis_date: today,
            total_patents: total,
            active_patents: active,
            pending_applications: rng.gen_range(2..=10),
            earliest_expiration: earliest.date_naive(),
            latest_expiration: latest.date_naive(),
            patent_term_extensions: rng.gen_bool(0.5),
            freedom_to_operate: pick(rng, &["Clear", "Moderate Risk", "High Risk"]),
            fto_score: round_to(rng.gen_range(6.0..=9.5), 1),
            blocking_patents: rng.gen_range(0..=3),
            key_patent_holders: holders,
            licensing_opportunities: pick(rng, &["Available", "Limited", "None"]),
            geographic_coverage: GeographicCoverage {
                us: true,
                eu: true,
                japan: rng.gen_bool(0.5),
                china: rng.gen_bool(0.5),
                row: rng.gen_bool(0.5),
            },
            ip_risk_level: pick(rng, &["Low", "Medium", "High"]),
            litigation_history: rng.gen_range(0..=5),
            strategy_recommendations: {
                let count = rng.gen_range(2..=4);
                sample(rng, RECOMMENDATIONS, count)
            },
            model_used: model.to_string(),
        }
    }
}

#[async_trait]
impl Analyzer for PatentAgent {
    fn identity(&self) -> AnalyzerIdentity {
        AnalyzerIdentity::new(NAME, VERSION)
    }

    async fn analyze(&self, subject: &str, backend: Arc<BackendConfig>) -> AnalysisResult {
        let started = Instant::now();
        info!(
            subject = %subject,
            agent = NAME,
            model = %backend.model,
            "patent analysis started"
        );

        let mut rng = rng_for(&self.settings, NAME, subject);
        simulate_latency(&self.settings, &mut rng, 500..=1200).await;

        let findings = self.generate(subject, &backend.model, &mut rng);

        info!(
            subject = %subject,
            agent = NAME,
            model = %backend.model,
            active_patents = findings.active_patents,
            "patent analysis completed"
        );

        finish(self.identity(), &findings, started, backend)
    }
}
