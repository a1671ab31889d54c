// SPDX-License-Identifier: PMPL-1.0-or-later
//! Report rendering.
//!
//! - Text: score, issues grouped by severity, suggestions
//! - JSON: the report as the engine returns it

use crate::model::{AccessibilityReport, Severity};

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Render a report
pub fn render(report: &AccessibilityReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => render_text(report),
        OutputFormat::Json => render_json(report),
    }
}

fn render_text(report: &AccessibilityReport) -> String {
    let mut output = String::new();

    output.push_str("=== Accessibility Compliance Report ===\n\n");
    output.push_str(&format!("Score: {}/100\n\n", report.score));

    if report.issues.is_empty() {
        output.push_str("No accessibility issues found. All checks passed.\n");
    } else {
        let high = report.by_severity(Severity::High).len();
        let medium = report.by_severity(Severity::Medium).len();
        output.push_str(&format!(
            "Found {} issue(s): {} high, {} medium, {} low\n\n",
            report.issues.len(),
            high,
            medium,
            report.issues.len() - high - medium
        ));

        for severity in [Severity::High, Severity::Medium, Severity::Low] {
            let issues = report.by_severity(severity);
            if issues.is_empty() {
                continue;
            }

            output.push_str(&format!("--- {} ({}) ---\n", severity, issues.len()));
            for issue in issues {
                output.push_str(&format!("[{}] {}\n", issue.id, issue.description));
                output.push_str(&format!("  Element: {}\n", issue.element));
                output.push_str(&format!("  Fix: {}\n", issue.recommendation));
                if issue.auto_fixable {
                    output.push_str("  Auto-fixable\n");
                }
                output.push('\n');
            }
        }
    }

    if let Some(analyses) = &report.image_analyses {
        output.push_str(&format!("--- Image analyses ({}) ---\n", analyses.len()));
        for entry in analyses {
            output.push_str(&format!(
                "{}: \"{}\" ({:?} confidence{})\n",
                entry.src,
                entry.analysis.alt_text,
                entry.analysis.confidence,
                if entry.analysis.decorative { ", decorative" } else { "" }
            ));
        }
        output.push('\n');
    }

    if !report.suggestions.is_empty() {
        output.push_str("--- Suggestions ---\n");
        for suggestion in &report.suggestions {
            output.push_str(&format!("- {}\n", suggestion));
        }
        output.push('\n');
    }

    if report.has_high_severity() {
        output.push_str("RESULT: FAIL (high severity issues found)\n");
    } else if !report.issues.is_empty() {
        output.push_str("RESULT: PASS WITH WARNINGS\n");
    } else {
        output.push_str("RESULT: PASS\n");
    }

    output
}

fn render_json(report: &AccessibilityReport) -> String {
    serde_json::to_string_pretty(report)
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize report: {}\"}}", e))
}
