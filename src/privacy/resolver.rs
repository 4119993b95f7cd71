//! Backend profile resolution.
//!
//! `secure` prefers the on-premise profile, `cloud` prefers the cloud
//! profile. When the preferred backend is disabled the resolver falls back
//! to the other one exactly once; when both are disabled it fails.

use crate::config::{CloudConfig, Config, LocalConfig};
use crate::error::OrchestrationError;
use crate::models::{
    BackendConfig, Capabilities, DataResidency, PrivacyLevel, PrivacyMode, Provider,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A resolved backend for one orchestration run.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub config: Arc<BackendConfig>,
    pub requested: PrivacyMode,
    pub used: PrivacyMode,
}

impl Resolution {
    /// Whether the requested mode was unavailable and the other one was used.
    pub fn fell_back(&self) -> bool {
        self.requested != self.used
    }
}

/// Availability of each privacy mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeAvailability {
    pub cloud: bool,
    pub secure: bool,
}

/// Resolves privacy modes to backend profiles.
///
/// Holds the enabled flags and connection parameters it was built with;
/// resolution never reads process-wide state, so the same mode always
/// yields the same profile.
#[derive(Debug, Clone)]
pub struct BackendProfileResolver {
    cloud: CloudConfig,
    local: LocalConfig,
}

impl BackendProfileResolver {
    pub fn new(cloud: CloudConfig, local: LocalConfig) -> Self {
        info!(
            cloud_available = cloud.enabled,
            local_available = local.enabled,
            "Backend profile resolver initialized"
        );
        Self { cloud, local }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cloud.clone(), config.local.clone())
    }

    /// Resolve `mode` to a fresh backend profile.
    pub fn resolve(&self, mode: PrivacyMode) -> Result<Resolution, OrchestrationError> {
        if self.validate_mode(mode) {
            debug!(mode = %mode, "Resolved requested backend");
            return Ok(self.resolution(mode, mode));
        }

        // One hop only: the fallback target is checked, never re-resolved.
        let fallback = mode.other();
        if self.validate_mode(fallback) {
            warn!(
                requested = %mode,
                using = %fallback,
                "{} mode requested but not enabled, falling back to {}",
                mode,
                fallback
            );
            return Ok(self.resolution(mode, fallback));
        }

        Err(OrchestrationError::Configuration(
            "no backend available: both cloud and local backends are disabled".to_string(),
        ))
    }

    /// Whether `mode` can be served without fallback.
    pub fn validate_mode(&self, mode: PrivacyMode) -> bool {
        match mode {
            PrivacyMode::Secure => self.local.enabled,
            PrivacyMode::Cloud => self.cloud.enabled,
        }
    }

    pub fn available_modes(&self) -> ModeAvailability {
        ModeAvailability {
            cloud: self.cloud.enabled,
            secure: self.local.enabled,
        }
    }

    fn resolution(&self, requested: PrivacyMode, used: PrivacyMode) -> Resolution {
        let config = match used {
            PrivacyMode::Secure => self.local_profile(),
            PrivacyMode::Cloud => self.cloud_profile(),
        };

        Resolution {
            config: Arc::new(config),
            requested,
            used,
        }
    }

    fn cloud_profile(&self) -> BackendConfig {
        BackendConfig {
            provider: Provider::OpenAi,
            model: self.cloud.model.clone(),
            api_base: Some(self.cloud.api_base.clone()),
            model_path: None,
            api_key: self.cloud.api_key.clone(),
            temperature: self.cloud.temperature,
            max_tokens: self.cloud.max_tokens,
            privacy_level: PrivacyLevel::Standard,
            data_residency: DataResidency::Cloud,
            capabilities: Capabilities {
                complex_reasoning: true,
                multimodal: true,
                context_window: self.cloud.context_window,
            },
        }
    }

    fn local_profile(&self) -> BackendConfig {
        BackendConfig {
            provider: Provider::Local,
            model: self.local.model.clone(),
            api_base: None,
            model_path: Some(self.local.model_path.clone()),
            api_key: None,
            temperature: self.local.temperature,
            max_tokens: self.local.max_tokens,
            privacy_level: PrivacyLevel::HipaaCompliant,
            data_residency: DataResidency::OnPremise,
            capabilities: Capabilities {
                complex_reasoning: true,
                multimodal: false,
                context_window: self.local.context_window,
            },
        }
    }
}
