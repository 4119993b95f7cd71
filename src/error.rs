//! Fatal errors surfaced to callers of the orchestration core.
//!
//! Per-agent problems (timeouts, agent errors) are not errors at this level:
//! they are recorded as [`crate::models::AnalysisResult::Failure`] entries.

use thiserror::Error;

/// Errors that abort an orchestration run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestrationError {
    /// No usable backend, or an invalid agent registry. Not retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The subject was empty or malformed.
    #[error("Invalid subject: {0}")]
    InvalidSubject(String),

    /// The caller asked for a privacy mode that does not exist.
    #[error("Invalid mode: {0}")]
    InvalidMode(String),
}

impl OrchestrationError {
    /// Returns true for errors the caller caused.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            OrchestrationError::InvalidSubject(_) | OrchestrationError::InvalidMode(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = OrchestrationError::Configuration("no backend available".to_string());
        assert_eq!(err.to_string(), "Configuration error: no backend available");
        assert!(!err.is_caller_error());

        let err = OrchestrationError::InvalidSubject("subject is empty".to_string());
        assert!(err.is_caller_error());
    }
}
