//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.pharmalens.toml` files. Backend availability and connection
//! parameters live here and are handed to the resolver at construction.

use crate::agents::AnalyzerKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".pharmalens.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Cloud backend profile.
    #[serde(default)]
    pub cloud: CloudConfig,

    /// On-premise backend profile.
    #[serde(default)]
    pub local: LocalConfig,

    /// Orchestrator settings.
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Mock data generation settings for the specialist agents.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "pharmalens_report.md".to_string()
}

/// Cloud (GPT-4 class) backend settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_cloud_model")]
    pub model: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// API credential. Usually supplied via `OPENAI_API_KEY` instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_cloud_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_cloud_context_window")]
    pub context_window: u32,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: default_cloud_model(),
            api_base: default_api_base(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_cloud_max_tokens(),
            context_window: default_cloud_context_window(),
        }
    }
}

impl std::fmt::Debug for CloudConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudConfig")
            .field("enabled", &self.enabled)
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("context_window", &self.context_window)
            .finish()
    }
}

fn default_cloud_model() -> String {
    "gpt-4-turbo-preview".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_cloud_max_tokens() -> u32 {
    4096
}

fn default_cloud_context_window() -> u32 {
    128_000
}

/// On-premise (Llama 3 class) backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_local_model")]
    pub model: String,

    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_local_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_local_context_window")]
    pub context_window: u32,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: default_local_model(),
            model_path: default_model_path(),
            temperature: default_temperature(),
            max_tokens: default_local_max_tokens(),
            context_window: default_local_context_window(),
        }
    }
}

fn default_local_model() -> String {
    "llama-3-8b-instruct".to_string()
}

fn default_model_path() -> PathBuf {
    PathBuf::from("./models/llama-3-8b-instruct.Q4_K_M.gguf")
}

fn default_local_max_tokens() -> u32 {
    2048
}

fn default_local_context_window() -> u32 {
    8192
}

fn default_temperature() -> f32 {
    0.7
}

fn default_true() -> bool {
    true
}

/// Orchestrator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Per-agent time budget in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Agents to register, in registration order.
    #[serde(default = "default_agents")]
    pub agents: Vec<AnalyzerKind>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            agents: default_agents(),
        }
    }
}

impl OrchestratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_agents() -> Vec<AnalyzerKind> {
    AnalyzerKind::ALL.to_vec()
}

/// Mock data generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Sleep for a realistic processing time before answering.
    #[serde(default = "default_true")]
    pub latency: bool,

    /// Seed for reproducible mock findings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            latency: true,
            seed: None,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.pharmalens.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.cloud_model {
            self.cloud.model = model.clone();
        }
        if let Some(ref model) = args.local_model {
            self.local.model = model.clone();
        }
        if let Some(ref key) = args.api_key {
            self.cloud.api_key = Some(key.clone());
        }

        // Disable flags only ever switch a backend off
        if args.no_cloud {
            self.cloud.enabled = false;
        }
        if args.no_local {
            self.local.enabled = false;
        }

        if let Some(timeout) = args.timeout_ms {
            self.orchestrator.timeout_ms = timeout;
        }
        if let Some(ref agents) = args.agents {
            self.orchestrator.agents = agents.clone();
        }

        if args.no_latency {
            self.simulation.latency = false;
        }
        if let Some(seed) = args.seed {
            self.simulation.seed = Some(seed);
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
