//! Outcome aggregation and statistics.
//!
//! This module folds per-agent outcomes into a run status and summary,
//! and provides the lookups the report generator needs.

use crate::models::{AgentEntry, AggregatedReport, FailureKind, RunStatus, RunSummary};

/// Status of a run from its entries.
///
/// `Complete` iff every entry succeeded, `Failed` iff none did, otherwise
/// `Partial`. An empty run has no successes and counts as `Failed`.
pub fn compute_status(entries: &[AgentEntry]) -> RunStatus {
    let succeeded = entries.iter().filter(|e| e.result.is_success()).count();

    if succeeded == 0 {
        RunStatus::Failed
    } else if succeeded == entries.len() {
        RunStatus::Complete
    } else {
        RunStatus::Partial
    }
}

/// Count outcomes by kind.
pub fn summarize(entries: &[AgentEntry]) -> RunSummary {
    let mut summary = RunSummary {
        total: entries.len(),
        ..RunSummary::default()
    };

    for entry in entries {
        match entry.result.failure_kind() {
            None => summary.succeeded += 1,
            Some(kind) => {
                summary.failed += 1;
                if kind == FailureKind::Timeout {
                    summary.timed_out += 1;
                }
            }
        }
    }

    summary
}

/// Entries that failed, in registration order.
pub fn failures(entries: &[AgentEntry]) -> Vec<&AgentEntry> {
    entries.iter().filter(|e| !e.result.is_success()).collect()
}

/// The `n` agents that took longest to reach an outcome.
pub fn slowest_agents(entries: &[AgentEntry], n: usize) -> Vec<&AgentEntry> {
    let mut sorted: Vec<&AgentEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| {
        b.elapsed_ms
            .partial_cmp(&a.elapsed_ms)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.truncate(n);
    sorted
}

/// Whether every success in the report was produced with the report's backend.
pub fn backend_consistent(report: &AggregatedReport) -> bool {
    report
        .entries
        .iter()
        .filter_map(|e| e.result.backend())
        .all(|backend| *backend == *report.backend)
}

/// Generate a text summary of a run.
pub fn generate_summary_text(report: &AggregatedReport) -> String {
    let summary = &report.summary;
    let mut lines = Vec::new();

    lines.push(format!(
        "Status: {} {}",
        report.status.emoji(),
        report.status
    ));
    lines.push(format!(
        "Agents: {} succeeded, {} failed ({} timed out) of {}",
        summary.succeeded, summary.failed, summary.timed_out, summary.total
    ));

    for entry in failures(&report.entries) {
        if let crate::models::AnalysisResult::Failure { kind, message, .. } = &entry.result {
            lines.push(format!("- {}: {} ({})", entry.name, kind, message));
        }
    }

    lines.join("\n")
}
