//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::agents::AnalyzerKind;
use crate::models::{PrivacyMode, RunStatus};
use clap::Parser;
use std::path::PathBuf;

/// PharmaLens - privacy-aware multi-agent drug analysis
///
/// Fans a molecule out to clinical, patent, market and vision specialists
/// on a single backend chosen by privacy mode. Markdown/JSON reports.
///
/// Examples:
///   pharmalens aspirin
///   pharmalens metformin --mode cloud --format json
///   pharmalens aspirin --mode secure --no-local
///   pharmalens ibuprofen --agents clinical,patent --timeout-ms 5000
///   pharmalens --list-modes
///   pharmalens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Molecule or drug identifier to analyze
    #[arg(
        value_name = "MOLECULE",
        required_unless_present_any = ["init_config", "list_modes"]
    )]
    pub subject: Option<String>,

    /// Privacy mode (secure, cloud)
    ///
    /// `secure` keeps data on-premise, `cloud` uses the hosted model.
    /// Falls back to the other mode when the requested backend is disabled.
    #[arg(short, long, default_value = "secure", env = "PHARMALENS_MODE")]
    pub mode: String,

    /// Output file path for the report
    ///
    /// Defaults to the config file's `general.output`
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .pharmalens.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Cloud model override
    #[arg(long, value_name = "MODEL", env = "PHARMALENS_CLOUD_MODEL")]
    pub cloud_model: Option<String>,

    /// Local model override
    #[arg(long, value_name = "MODEL", env = "PHARMALENS_LOCAL_MODEL")]
    pub local_model: Option<String>,

    /// API key for the cloud backend
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Disable the cloud backend
    #[arg(long)]
    pub no_cloud: bool,

    /// Disable the on-premise backend
    #[arg(long)]
    pub no_local: bool,

    /// Per-agent timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Agents to run (comma-separated), in registration order
    ///
    /// Example: --agents clinical,patent
    #[arg(long, value_name = "AGENTS", value_delimiter = ',')]
    pub agents: Option<Vec<AnalyzerKind>>,

    /// Skip simulated processing latency
    #[arg(long)]
    pub no_latency: bool,

    /// Seed for reproducible mock findings
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Fail if the run status is at or below this level
    ///
    /// Useful for CI pipelines. Exit code 2 when the threshold is met.
    /// Values: partial, failed
    #[arg(long, value_name = "STATUS")]
    pub fail_on: Option<FailOnStatus>,

    /// Show which privacy modes are currently available and exit
    #[arg(long)]
    pub list_modes: bool,

    /// Generate a default .pharmalens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Run status threshold for --fail-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FailOnStatus {
    /// Fail on partial or failed runs
    Partial,
    /// Fail only when every agent failed
    Failed,
}

impl FailOnStatus {
    /// Whether a run with `status` meets this threshold.
    pub fn is_met_by(self, status: RunStatus) -> bool {
        match self {
            FailOnStatus::Partial => status != RunStatus::Complete,
            FailOnStatus::Failed => status == RunStatus::Failed,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The subject, or an empty string if none was given.
    pub fn subject(&self) -> &str {
        self.subject.as_deref().unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        self.mode.parse::<PrivacyMode>()?;

        if self.no_cloud && self.no_local {
            return Err("Cannot disable both the cloud and local backends".to_string());
        }

        if let Some(timeout) = self.timeout_ms {
            if timeout == 0 {
                return Err("Timeout must be at least 1 millisecond".to_string());
            }
        }

        if let Some(ref agents) = self.agents {
            if agents.is_empty() {
                return Err("At least one agent is required".to_string());
            }
            for (i, agent) in agents.iter().enumerate() {
                if agents[..i].contains(agent) {
                    return Err(format!("Agent listed twice: {:?}", agent));
                }
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            subject: Some("aspirin".to_string()),
            mode: "secure".to_string(),
            output: None,
            format: OutputFormat::Markdown,
            config: None,
            verbose: false,
            quiet: false,
            cloud_model: None,
            local_model: None,
            api_key: None,
            no_cloud: false,
            no_local: false,
            timeout_ms: None,
            agents: None,
            no_latency: false,
            seed: None,
            fail_on: None,
            list_modes: false,
            init_config: false,
        }
    }

    #[test]
    fn test_valid_args() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_mode() {
        let mut args = make_args();
        args.mode = "hybrid".to_string();
        let err = args.validate().unwrap_err();
        assert!(err.contains("hybrid"));
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.no_cloud = true;
        args.no_local = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_agents() {
        let mut args = make_args();
        args.agents = Some(vec![AnalyzerKind::Clinical, AnalyzerKind::Clinical]);
        assert!(args.validate().is_err());

        args.agents = Some(vec![AnalyzerKind::Clinical, AnalyzerKind::Vision]);
        assert!(args.validate().is_ok());

        args.timeout_ms = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args();
        args.subject = None;
        args.mode = "bogus".to_string();
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_fail_on_threshold() {
        assert!(FailOnStatus::Partial.is_met_by(RunStatus::Partial));
        assert!(FailOnStatus::Partial.is_met_by(RunStatus::Failed));
        assert!(!FailOnStatus::Partial.is_met_by(RunStatus::Complete));
        assert!(FailOnStatus::Failed.is_met_by(RunStatus::Failed));
        assert!(!FailOnStatus::Failed.is_met_by(RunStatus::Partial));
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "pharmalens",
            "metformin",
            "--mode",
            "cloud",
            "--agents",
            "clinical,market",
            "--fail-on",
            "partial",
        ])
        .unwrap();
        assert_eq!(args.subject(), "metformin");
        assert_eq!(args.mode, "cloud");
        assert_eq!(
            args.agents,
            Some(vec![AnalyzerKind::Clinical, AnalyzerKind::Market])
        );
        assert_eq!(args.fail_on, Some(FailOnStatus::Partial));
    }

    #[test]
    fn test_subject_required() {
        assert!(Args::try_parse_from(["pharmalens"]).is_err());
        assert!(Args::try_parse_from(["pharmalens", "--list-modes"]).is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
