//! Commercial opportunity analysis agent.
//!
//! Estimates market size, growth, competition and pricing for a compound's
//! current and repurposed indications.

use super::{finish, pick, rng_for, round_to, sample, simulate_latency, Analyzer};
use crate::config::SimulationConfig;
use crate::models::{AnalysisResult, AnalyzerIdentity, BackendConfig};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

const NAME: &str = "MarketAgent";
const VERSION: &str = "1.0.0";

const COMPETITORS: &[(&str, &str)] = &[
    ("Pfizer", "Xeljanz"),
    ("AbbVie", "Humira"),
    ("Novo Nordisk", "Ozempic"),
    ("Eli Lilly", "Mounjaro"),
    ("Merck", "Keytruda"),
    ("Bristol-Myers Squibb", "Eliquis"),
    ("Johnson & Johnson", "Stelara"),
    ("Amgen", "Enbrel"),
];

const REGIONS: &[&str] = &[
    "United States",
    "European Union",
    "Japan",
    "China",
    "United Kingdom",
    "Brazil",
    "India",
];

const DRIVERS: &[&str] = &[
    "Aging population increases treatment-eligible cohort",
    "Loss of exclusivity for incumbent therapies",
    "Expanding diagnosis rates in emerging markets",
    "Payer preference for oral formulations",
    "Favourable real-world evidence from existing indication",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketFindings {
    pub molecule: String,
    pub analysis_date: DateTime<Utc>,
    pub total_addressable_market_usd_bn: f64,
    pub cagr_percent: f64,
    pub peak_sales_estimate_usd_m: u32,
    pub years_to_peak: u32,
    pub market_share_potential_percent: f64,
    pub competitors: Vec<Competitor>,
    pub pricing: PricingOutlook,
    pub key_markets: Vec<String>,
    pub growth_drivers: Vec<String>,
    pub opportunity_score: f64,
    pub model_used: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competitor {
    pub company: String,
    pub product: String,
    pub market_share_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingOutlook {
    pub annual_treatment_cost_usd: u32,
    pub reimbursement_outlook: String,
    pub generic_erosion_risk: String,
}

/// Market sizing and competitive landscape agent.
#[derive(Debug, Clone)]
pub struct MarketAgent {
    settings: SimulationConfig,
}

impl MarketAgent {
    pub fn new(settings: SimulationConfig) -> Self {
        info!("Initialized {} v{}", NAME, VERSION);
        Self { settings }
    }

    fn generate(&self, subject: &str, model: &str, rng: &mut StdRng) -> MarketFindings {
        let competitor_count = rng.gen_range(2..=4);
        let mut remaining_share = 70.0;
        let mut competitors = Vec::with_capacity(competitor_count);
        let picked: Vec<(&str, &str)> = COMPETITORS
            .choose_multiple(rng, competitor_count)
            .copied()
            .collect();
        for (company, product) in picked {
            let upper = (remaining_share / 2.0_f64).max(5.5);
            let share = round_to(rng.gen_range(5.0..=upper), 1);
            remaining_share -= share;
            competitors.push(Competitor {
                company: company.to_string(),
                product: product.to_string(),
                market_share_percent: share,
            });
        }
        competitors.sort_by(|a, b| {
            b.market_share_percent
                .partial_cmp(&a.market_share_percent)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        MarketFindings {
            molecule: subject.to_string(),
            analysis_date: Utc::now(),
            total_addressable_market_usd_bn: round_to(rng.gen_range(1.5..=45.0), 1),
            cagr_percent: round_to(rng.gen_range(2.5..=14.0), 1),
            peak_sales_estimate_usd_m: rng.gen_range(150..=4500),
            years_to_peak: rng.gen_range(4..=9),
            market_share_potential_percent: round_to(rng.gen_range(3.0..=25.0), 1),
            competitors,
            pricing: PricingOutlook {
                annual_treatment_cost_usd: rng.gen_range(1_200..=85_000),
                reimbursement_outlook: pick(rng, &["Favourable", "Neutral", "Challenging"]),
                generic_erosion_risk: pick(rng, &["Low", "Medium", "High"]),
            },
            key_markets: {
                let count = rng.gen_range(2..=4);
                sample(rng, REGIONS, count)
            },
            growth_drivers: {
                let count = rng.gen_range(2..=3);
                sample(rng, DRIVERS, count)
            },
            opportunity_score: round_to(rng.gen_range(5.5..=9.5), 1),
            model_used: model.to_string(),
        }
    }
}

#[async_trait]
impl Analyzer for MarketAgent {
    fn identity(&self) -> AnalyzerIdentity {
        AnalyzerIdentity::new(NAME, VERSION)
    }

    async fn analyze(&self, subject: &str, backend: Arc<BackendConfig>) -> AnalysisResult {
        let started = Instant::now();
        info!(
            subject = %subject,
            agent = NAME,
            model = %backend.model,
            "market analysis started"
        );

        let mut rng = rng_for(&self.settings, NAME, subject);
        simulate_latency(&self.settings, &mut rng, 600..=1500).await;

        let findings = self.generate(subject, &backend.model, &mut rng);

        info!(
            subject = %subject,
            agent = NAME,
            model = %backend.model,
            peak_sales_usd_m = findings.peak_sales_estimate_usd_m,
            "market analysis completed"
        );

        finish(self.identity(), &findings, started, backend)
    }
}
