// SPDX-License-Identifier: PMPL-1.0-or-later
//! Suggestion generation.
//!
//! Output is an insertion-ordered set: every issue recommendation, then one
//! general suggestion per issue type present, then aggregates over the real
//! image analyses.

use crate::ai::TaskOutcome;
use crate::model::{AccessibilityIssue, ImageAnalysis, IssueType};
use std::collections::HashSet;

/// General advice for an issue type
pub fn general_suggestion(issue_type: IssueType) -> &'static str {
    match issue_type {
        IssueType::AltText => "Consider using AI-suggested alt text as a starting point",
        IssueType::Contrast => "Check text and background colors with a contrast checker and aim for at least 4.5:1",
        IssueType::Heading => "Use a single H1 and step heading levels down one at a time",
        IssueType::Aria => "Give every interactive control an accessible name and use only valid ARIA attributes",
        IssueType::Semantic => "Use semantic elements such as lists and table headers so structure reaches assistive technology",
    }
}

#[derive(Default)]
struct OrderedSet {
    seen: HashSet<String>,
    items: Vec<String>,
}

impl OrderedSet {
    fn insert(&mut self, item: impl Into<String>) {
        let item = item.into();
        if !item.trim().is_empty() && self.seen.insert(item.clone()) {
            self.items.push(item);
        }
    }
}

/// Deduplicated suggestions for a merged issue list
pub fn suggestions(issues: &[AccessibilityIssue], images: &[TaskOutcome<ImageAnalysis>]) -> Vec<String> {
    let mut out = OrderedSet::default();

    for issue in issues {
        out.insert(issue.recommendation.as_str());
    }

    let mut types: Vec<IssueType> = Vec::new();
    for issue in issues {
        if !types.contains(&issue.issue_type) {
            types.push(issue.issue_type);
        }
    }
    for issue_type in types {
        out.insert(general_suggestion(issue_type));
    }

    let analyses: Vec<&ImageAnalysis> = images.iter().filter(|o| o.is_real()).map(|o| &o.value).collect();

    let decorative = analyses.iter().filter(|a| a.decorative).count();
    if decorative > 0 {
        out.insert(format!(
            "{} image(s) appear decorative; mark them with alt=\"\" and role=\"presentation\"",
            decorative
        ));
    }

    let complex = analyses.iter().filter(|a| a.accessibility.is_complex).count();
    if complex > 0 {
        out.insert(format!("{} image(s) are complex; provide long descriptions for charts and diagrams", complex));
    }

    let with_text = analyses.iter().filter(|a| a.accessibility.has_text).count();
    if with_text > 0 {
        out.insert(format!(
            "{} image(s) contain text; make sure that text is also available as real text",
            with_text
        ));
    }

    out.items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::TaskStatus;
    use crate::model::Severity;

    fn issue(issue_type: IssueType, recommendation: &str) -> AccessibilityIssue {
        AccessibilityIssue {
            id: format!("{}-1", issue_type),
            issue_type,
            severity: Severity::High,
            element: "x".to_string(),
            description: "d".to_string(),
            recommendation: recommendation.to_string(),
            auto_fixable: false,
        }
    }

    #[test]
    fn test_one_general_suggestion_per_type() {
        let issues = vec![
            issue(IssueType::AltText, "Add alt text"),
            issue(IssueType::AltText, "Add alt text"),
            issue(IssueType::AltText, "Shorten alt text"),
            issue(IssueType::Heading, "Add an H1"),
        ];
        let out = suggestions(&issues, &[]);
        assert_eq!(
            out,
            vec![
                "Add alt text".to_string(),
                "Shorten alt text".to_string(),
                "Add an H1".to_string(),
                general_suggestion(IssueType::AltText).to_string(),
                general_suggestion(IssueType::Heading).to_string(),
            ]
        );
    }

    #[test]
    fn test_no_issues_no_suggestions() {
        assert!(suggestions(&[], &[]).is_empty());
    }

    #[test]
    fn test_decorative_aggregate_counts_real_analyses() {
        let decorative = ImageAnalysis { decorative: true, ..ImageAnalysis::placeholder() };
        let images = vec![
            TaskOutcome::new(decorative.clone(), TaskStatus::Completed),
            TaskOutcome::new(decorative.clone(), TaskStatus::Cached),
            TaskOutcome::new(decorative, TaskStatus::Failed("x".to_string())),
        ];
        let out = suggestions(&[], &images);
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("2 image(s) appear decorative"));
    }
}
