//! PharmaLens - privacy-aware multi-agent drug analysis
//!
//! A CLI that resolves a backend from the requested privacy mode, runs the
//! specialist agents concurrently and writes an aggregated report.
//!
//! Exit codes:
//!   0 - Success (status below the --fail-on threshold, or no --fail-on set)
//!   1 - Runtime error (configuration, invalid subject or mode, I/O)
//!   2 - Run status met the --fail-on threshold

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use pharmalens::analysis::generate_summary_text;
use pharmalens::cli::{Args, OutputFormat};
use pharmalens::config::{Config, DEFAULT_CONFIG_FILE};
use pharmalens::report;
use pharmalens::{
    AgentOrchestrator, BackendProfileResolver, OrchestrationError, PrivacyMode, ProgressNotifier,
    RunStatus,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("PharmaLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_analysis(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .pharmalens.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize backends, agents, timeouts, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` takes precedence over the CLI verbosity flags.
fn init_logging(args: &Args) {
    let level = args.log_level().to_string().to_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run one orchestration and write the report. Returns exit code (0 or 2).
async fn run_analysis(args: Args) -> Result<i32> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    if args.list_modes {
        return handle_list_modes(&config);
    }

    let mode = args
        .mode
        .parse::<PrivacyMode>()
        .map_err(OrchestrationError::InvalidMode)?;

    let orchestrator = AgentOrchestrator::from_config(&config)?;

    println!("💊 Analyzing: {}", args.subject());
    println!("   Requested mode: {}", mode);
    println!("   Agents: {}", orchestrator.agent_names().join(", "));
    println!("   Timeout per agent: {}ms", config.orchestrator.timeout_ms);

    let progress = Arc::new(SpinnerProgress::new(!args.quiet));
    let report = match orchestrator
        .run_with_progress(args.subject(), mode, progress.clone())
        .await
    {
        Ok(report) => report,
        Err(e) => {
            progress.finish();
            return Err(e.into());
        }
    };
    progress.finish();

    if report.fell_back {
        println!(
            "\n⚠️  {} backend unavailable, ran in {} mode instead.",
            report.requested_mode, report.mode_used
        );
    }

    // Generate and save the report
    let output_path = PathBuf::from(&config.general.output);
    report::write_report(&report, &output_path, args.format == OutputFormat::Json)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    println!("\n📊 Analysis Summary:");
    println!("   Backend: {} ({})", report.backend.model, report.backend.provider);
    for line in generate_summary_text(&report).lines() {
        println!("   {}", line);
    }
    println!("   Duration: {:.1}ms", report.duration_ms);
    println!(
        "\n✅ Analysis complete! Report saved to: {}",
        output_path.display()
    );

    // Check --fail-on threshold
    if let Some(threshold) = args.fail_on {
        if threshold.is_met_by(report.status) {
            eprintln!(
                "\n⛔ Run status is {} ({:?} threshold). Failing (exit code 2).",
                report.status, threshold
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Handle --list-modes: print which privacy modes can be served.
fn handle_list_modes(config: &Config) -> Result<i32> {
    let resolver = BackendProfileResolver::from_config(config);
    let available = resolver.available_modes();

    println!("🔐 Privacy modes:");
    println!(
        "   secure: {} ({})",
        availability_label(available.secure),
        config.local.model
    );
    println!(
        "   cloud:  {} ({})",
        availability_label(available.cloud),
        config.cloud.model
    );

    Ok(0)
}

fn availability_label(available: bool) -> &'static str {
    if available {
        "available"
    } else {
        "disabled"
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

/// Terminal spinner driven by orchestration events.
struct SpinnerProgress {
    bar: Option<ProgressBar>,
}

impl SpinnerProgress {
    fn new(enabled: bool) -> Self {
        let bar = enabled.then(|| {
            let pb = ProgressBar::new(0);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            pb.set_style(style);
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });
        Self { bar }
    }

    fn finish(&self) {
        if let Some(ref pb) = self.bar {
            pb.finish_and_clear();
        }
    }
}

// Clears the bar on every exit path, including early returns.
impl Drop for SpinnerProgress {
    fn drop(&mut self) {
        self.finish();
    }
}

impl ProgressNotifier for SpinnerProgress {
    fn on_run_start(&self, _subject: &str, mode_used: PrivacyMode, total_agents: usize) {
        if let Some(ref pb) = self.bar {
            pb.set_length(total_agents as u64);
            pb.set_message(format!("running in {} mode", mode_used));
        }
    }

    fn on_agent_start(&self, agent: &str) {
        if let Some(ref pb) = self.bar {
            pb.set_message(format!("{} started", agent));
        }
    }

    fn on_agent_complete(&self, agent: &str, success: bool) {
        if let Some(ref pb) = self.bar {
            pb.inc(1);
            let marker = if success { "🟢" } else { "🔴" };
            pb.println(format!("   {} {}", marker, agent));
        }
    }

    fn on_run_complete(&self, status: RunStatus) {
        if let Some(ref pb) = self.bar {
            pb.set_message(format!("{}", status));
        }
    }
}
