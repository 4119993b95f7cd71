//! Markdown and JSON report generation.
//!
//! This module renders an [`AggregatedReport`] for humans (Markdown) or
//! for downstream tooling (JSON).

use crate::analysis::{backend_consistent, failures, slowest_agents};
use crate::models::{AgentEntry, AggregatedReport, AnalysisResult, BackendConfig};
use anyhow::Result;
use std::io::Write;
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &AggregatedReport) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!("# PharmaLens Report: {}\n\n", report.subject));

    output.push_str(&generate_metadata_section(report));
    output.push_str(&generate_backend_section(&report.backend, report));
    output.push_str(&generate_summary_section(report));
    output.push_str(&generate_agents_section(&report.entries));
    output.push_str(&generate_failures_section(&report.entries));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(report: &AggregatedReport) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Subject:** {}\n", report.subject));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Requested Mode:** `{}`\n", report.requested_mode));
    section.push_str(&format!("- **Mode Used:** `{}`\n", report.mode_used));
    if report.fell_back {
        section.push_str(&format!(
            "- **Fallback:** requested `{}` backend was unavailable, `{}` was used\n",
            report.requested_mode, report.mode_used
        ));
    }
    section.push_str(&format!(
        "- **Status:** {} {}\n",
        report.status.emoji(),
        report.status
    ));
    section.push_str(&format!(
        "- **Total Duration:** {:.1}ms\n",
        report.duration_ms
    ));
    section.push('\n');

    section
}

/// Generate the backend profile section.
fn generate_backend_section(backend: &BackendConfig, report: &AggregatedReport) -> String {
    let mut section = String::new();

    section.push_str("## Backend\n\n");
    section.push_str("| Provider | Model | Privacy Level | Data Residency | Multimodal | Context Window |\n");
    section.push_str("|:---|:---|:---|:---|:---:|---:|\n");
    section.push_str(&format!(
        "| {} | `{}` | {} | {} | {} | {} |\n\n",
        backend.provider,
        backend.model,
        backend.privacy_level,
        backend.data_residency,
        if backend.capabilities.multimodal { "yes" } else { "no" },
        backend.capabilities.context_window
    ));

    if !backend_consistent(report) {
        section.push_str("> ⚠️ Some results were produced with a different backend.\n\n");
    }

    section
}

/// Generate the summary section.
fn generate_summary_section(report: &AggregatedReport) -> String {
    let summary = &report.summary;
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| 🟢 Succeeded | 🔴 Failed | ⏱️ Timed Out | **Total** |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | **{}** |\n\n",
        summary.succeeded, summary.failed, summary.timed_out, summary.total
    ));

    let slowest = slowest_agents(&report.entries, 3);
    if !slowest.is_empty() {
        section.push_str("### Slowest Agents\n\n");
        section.push_str("| Agent | Elapsed |\n");
        section.push_str("|:---|---:|\n");

        for entry in slowest {
            section.push_str(&format!("| {} | {:.1}ms |\n", entry.name, entry.elapsed_ms));
        }
        section.push('\n');
    }

    section
}

/// Generate the per-agent findings section.
fn generate_agents_section(entries: &[AgentEntry]) -> String {
    let mut section = String::new();

    section.push_str("## Agent Findings\n\n");

    for entry in entries {
        section.push_str(&generate_agent_block(entry));
    }

    section
}

/// Generate a single agent block.
fn generate_agent_block(entry: &AgentEntry) -> String {
    let mut block = String::new();

    match &entry.result {
        AnalysisResult::Success {
            analyzer,
            payload,
            processing_time_ms,
            backend,
        } => {
            block.push_str(&format!("### 🟢 {}\n\n", entry.name));
            block.push_str(&format!(
                "*Version: {} | Model: `{}` | Processing: {:.1}ms*\n\n",
                analyzer.version, backend.model, processing_time_ms
            ));

            let pretty = serde_json::to_string_pretty(payload).unwrap_or_default();
            block.push_str("<details>\n<summary>View Findings</summary>\n\n```json\n");
            block.push_str(&pretty);
            block.push_str("\n```\n</details>\n\n");
        }
        AnalysisResult::Failure {
            analyzer,
            kind,
            message,
        } => {
            block.push_str(&format!("### 🔴 {}\n\n", entry.name));
            block.push_str(&format!(
                "*Version: {} | Error: {}*\n\n",
                analyzer.version, kind
            ));
            block.push_str(&format!("> {}\n\n", message));
        }
    }

    block.push_str("---\n\n");

    block
}

/// Generate the failures section.
fn generate_failures_section(entries: &[AgentEntry]) -> String {
    let failed = failures(entries);
    if failed.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Failures\n\n");
    section.push_str("The following agents did not contribute findings to this report:\n\n");

    for (i, entry) in failed.iter().enumerate() {
        if let Some(kind) = entry.result.failure_kind() {
            section.push_str(&format!("{}. **{}** ({})\n", i + 1, entry.name, kind));
        }
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by PharmaLens*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &AggregatedReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write the report to a file in the given format.
pub fn write_report(report: &AggregatedReport, path: &Path, json: bool) -> Result<()> {
    let content = if json {
        generate_json_report(report)?
    } else {
        generate_markdown_report(report)
    };

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::backend;
    use crate::models::{
        AnalyzerIdentity, FailureKind, PrivacyMode, RunStatus, RunSummary,
    };
    use chrono::Utc;

    fn create_test_report() -> AggregatedReport {
        let backend = backend(PrivacyMode::Cloud);

        AggregatedReport {
            subject: "aspirin".to_string(),
            requested_mode: PrivacyMode::Secure,
            mode_used: PrivacyMode::Cloud,
            fell_back: true,
            backend: backend.clone(),
            started_at: Utc::now(),
            status: RunStatus::Partial,
            summary: RunSummary {
                total: 2,
                succeeded: 1,
                failed: 1,
                timed_out: 1,
            },
            entries: vec![
                AgentEntry {
                    name: "ClinicalAgent".to_string(),
                    registration_index: 0,
                    elapsed_ms: 812.4,
                    result: AnalysisResult::Success {
                        analyzer: AnalyzerIdentity::new("ClinicalAgent", "1.0.0"),
                        payload: serde_json::json!({ "total_trials_found": 42 }),
                        processing_time_ms: 810.0,
                        backend,
                    },
                },
                AgentEntry {
                    name: "VisionAgent".to_string(),
                    registration_index: 1,
                    elapsed_ms: 1000.0,
                    result: AnalysisResult::failure(
                        AnalyzerIdentity::new("VisionAgent", "1.0.0"),
                        FailureKind::Timeout,
                        "no result within 1000ms",
                    ),
                },
            ],
            duration_ms: 1000.0,
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# PharmaLens Report: aspirin"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Backend"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("## Agent Findings"));
        assert!(markdown.contains("\"total_trials_found\": 42"));
        assert!(markdown.contains("## Failures"));
        assert!(markdown.contains("**VisionAgent** (Timeout)"));
        assert!(!markdown.contains("different backend"));
    }

    #[test]
    fn test_metadata_mentions_fallback() {
        let report = create_test_report();
        let section = generate_metadata_section(&report);

        assert!(section.contains("**Fallback:**"));
        assert!(section.contains("`secure`"));
        assert!(section.contains("partial"));
    }

    #[test]
    fn test_failures_section_empty_when_complete() {
        let mut report = create_test_report();
        report.entries.truncate(1);
        assert!(generate_failures_section(&report.entries).is_empty());
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"mode_used\": \"cloud\""));
        assert!(json.contains("\"status\": \"partial\""));
        assert!(json.contains("\"outcome\": \"failure\""));
        assert!(json.contains("\"kind\": \"timeout\""));
        assert!(!json.contains("api_key"));
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_report(&create_test_report(), &path, true).unwrap();

        let parsed: AggregatedReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.subject, "aspirin");
        assert_eq!(parsed.entries.len(), 2);
    }
}
