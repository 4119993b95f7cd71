//! Progress callbacks for orchestration runs.
//!
//! Callbacks fire from the agent tasks themselves, so implementations must
//! be thread-safe.

use crate::models::{PrivacyMode, RunStatus};

/// Receives lifecycle events from an orchestration run.
pub trait ProgressNotifier: Send + Sync {
    /// Called once after the backend is resolved, before dispatch.
    fn on_run_start(&self, _subject: &str, _mode_used: PrivacyMode, _total_agents: usize) {}

    fn on_agent_start(&self, _agent: &str) {}

    /// Called when an agent reaches a terminal outcome.
    fn on_agent_complete(&self, _agent: &str, _success: bool) {}

    fn on_run_complete(&self, _status: RunStatus) {}
}

/// Discards every event.
pub struct NoProgress;

impl ProgressNotifier for NoProgress {}
