//! PharmaLens - privacy-aware multi-agent drug analysis.
//!
//! A caller submits a molecule identifier and a privacy mode. The
//! [`BackendProfileResolver`] picks one backend for the run (on-premise for
//! `secure`, hosted for `cloud`, with a single fallback hop), and the
//! [`AgentOrchestrator`] fans the subject out to every registered specialist
//! concurrently, isolating failures and timeouts per agent before folding
//! everything into an [`AggregatedReport`].

pub mod agents;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod privacy;
pub mod report;

pub use agents::{Analyzer, AnalyzerKind};
pub use config::Config;
pub use error::OrchestrationError;
pub use models::{
    AgentEntry, AggregatedReport, AnalysisResult, AnalyzerIdentity, BackendConfig, FailureKind,
    PrivacyMode, RunStatus, RunSummary,
};
pub use orchestrator::{AgentOrchestrator, NoProgress, ProgressNotifier};
pub use privacy::{BackendProfileResolver, ModeAvailability, Resolution};
