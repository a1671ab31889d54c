// SPDX-License-Identifier: PMPL-1.0-or-later
//! Issue merging.
//!
//! Rule failures and AI findings are normalized into one issue list with a
//! fixed order: rule issues in check order, then AI image issues in image
//! order, then AI content issues in provider order. Issues from both paths
//! about the same element are kept side by side.

use crate::ai::{AiFindings, ContentFinding};
use crate::config::RuleConfig;
use crate::model::{AccessibilityIssue, ImageAnalysis, IssueType, Severity, ValidationResult};
use crate::rules::images::InventoryImage;
use crate::rules::markup::{self, strip_tags, truncate_chars};
use crate::rules::{self, ALT_TEXT_RULE, ARIA_RULE, CONTRAST_RULE, HEADING_RULE, STRUCTURE_RULE};
use std::collections::HashMap;

/// Issue type for a catalog rule id
pub fn issue_type_for_rule(rule_id: &str) -> IssueType {
    match rule_id {
        ALT_TEXT_RULE => IssueType::AltText,
        CONTRAST_RULE => IssueType::Contrast,
        STRUCTURE_RULE => IssueType::Semantic,
        HEADING_RULE => IssueType::Heading,
        ARIA_RULE => IssueType::Aria,
        _ => IssueType::Semantic,
    }
}

/// Hands out `<type>-<n>` ids, numbered per type
#[derive(Debug, Default)]
struct IssueIds {
    next: HashMap<IssueType, usize>,
}

impl IssueIds {
    fn next(&mut self, issue_type: IssueType) -> String {
        let n = self.next.entry(issue_type).or_insert(0);
        *n += 1;
        format!("{}-{}", issue_type, n)
    }
}

/// Slice of at most `n` characters ending at byte `end`
fn chars_before(text: &str, end: usize, n: usize) -> &str {
    let head = &text[..end];
    let start = head.char_indices().rev().take(n).last().map(|(i, _)| i).unwrap_or(end);
    &head[start..]
}

/// Slice of at most `n` characters starting at byte `start`
fn chars_after(text: &str, start: usize, n: usize) -> &str {
    let tail = &text[start..];
    let len = tail.char_indices().nth(n).map(|(i, _)| i).unwrap_or(tail.len());
    &tail[..len]
}

/// Visible text within `window` characters either side of an image reference.
///
/// The reference is the `<img>` tag with this `src`, or the first literal
/// occurrence of `src`. Tags cut by the window edges are dropped. `None`
/// when the image is not referenced in the content.
pub fn image_context(content: &str, src: &str, window: usize) -> Option<String> {
    if src.is_empty() {
        return None;
    }

    let (start, end) = match markup::find_tags(content, &["img"])
        .into_iter()
        .find(|t| t.attr("src") == Some(src))
    {
        Some(tag) => (tag.start, tag.end),
        None => {
            let start = content.find(src)?;
            (start, start + src.len())
        }
    };

    let mut before = chars_before(content, start, window);
    if let Some(close) = before.find('>') {
        if before.find('<').map(|open| close < open).unwrap_or(true) {
            before = &before[close + 1..];
        }
    }

    let mut after = chars_after(content, end, window);
    if let Some(open) = after.rfind('<') {
        if !after[open..].contains('>') {
            after = &after[..open];
        }
    }

    Some(strip_tags(&format!("{} {}", before, after)))
}

/// Whether the content around an image carries enough text to stand in for it
pub fn has_textual_equivalent(content: &str, src: &str, config: &RuleConfig) -> bool {
    image_context(content, src, config.context_window)
        .map(|text| text.chars().count() >= config.min_context_chars)
        .unwrap_or(false)
}

/// Normalizes rule results and AI findings into report issues
pub struct IssueMerger<'a> {
    content: &'a str,
    config: &'a RuleConfig,
    ids: IssueIds,
    issues: Vec<AccessibilityIssue>,
}

impl<'a> IssueMerger<'a> {
    pub fn new(content: &'a str, config: &'a RuleConfig) -> Self {
        Self { content, config, ids: IssueIds::default(), issues: Vec::new() }
    }

    fn push(
        &mut self,
        issue_type: IssueType,
        severity: Severity,
        element: String,
        description: String,
        recommendation: String,
        auto_fixable: bool,
    ) {
        let id = self.ids.next(issue_type);
        self.issues.push(AccessibilityIssue {
            id,
            issue_type,
            severity,
            element,
            description,
            recommendation,
            auto_fixable,
        });
    }

    /// Failed rule results, in the order given
    pub fn add_rule_results(&mut self, results: &[ValidationResult]) {
        for result in results.iter().filter(|r| !r.passed) {
            let recommendation = if result.suggestion.is_empty() {
                rules::rule(&result.rule_id)
                    .map(|r| format!("Review against WCAG {} ({})", r.wcag_criterion, r.name))
                    .unwrap_or_else(|| "Review this element for accessibility".to_string())
            } else {
                result.suggestion.clone()
            };
            self.push(
                issue_type_for_rule(&result.rule_id),
                result.severity,
                result.element.clone().unwrap_or_else(|| "document".to_string()),
                result.message.clone(),
                recommendation,
                result.auto_fixable,
            );
        }
    }

    /// Issues derived from one real image analysis
    fn add_image_analysis(&mut self, image: &InventoryImage, analysis: &ImageAnalysis) {
        let element = image.label();

        if !analysis.decorative && !image.is_decorative() && image.non_empty_alt().is_none() {
            self.push(
                IssueType::AltText,
                Severity::High,
                element.clone(),
                "Image conveys information but has no alt text".to_string(),
                format!("Add alt text, for example: \"{}\"", analysis.alt_text),
                true,
            );
        }

        if analysis.accessibility.has_text && !has_textual_equivalent(self.content, &image.src, self.config) {
            let description = match analysis.text_content.as_deref().filter(|t| !t.trim().is_empty()) {
                Some(text) => format!("Text in image with no alternative: \"{}\"", truncate_chars(text.trim(), 80)),
                None => "Text in image with no alternative".to_string(),
            };
            self.push(
                IssueType::AltText,
                Severity::High,
                element.clone(),
                description,
                "Repeat the text shown in the image in its alt text or the surrounding content".to_string(),
                false,
            );
        }

        if analysis.accessibility.needs_long_description {
            let recommendation = match analysis.accessibility.suggested_long_description.as_deref() {
                Some(long) if !long.trim().is_empty() => format!("Add a long description, for example: {}", long.trim()),
                _ => "Add a long description via aria-describedby or adjacent text".to_string(),
            };
            self.push(
                IssueType::AltText,
                Severity::Medium,
                element,
                "Complex image needs a long description".to_string(),
                recommendation,
                false,
            );
        }
    }

    /// AI image issues in inventory order; placeholders contribute nothing
    pub fn add_image_findings(&mut self, inventory: &[InventoryImage], findings: &AiFindings) {
        for (image, outcome) in inventory.iter().zip(&findings.images) {
            if outcome.is_real() {
                self.add_image_analysis(image, &outcome.value);
            }
        }
    }

    /// Content critique entries in provider order
    pub fn add_content_findings(&mut self, findings: &[ContentFinding]) {
        for finding in findings {
            self.push(
                finding.issue_type.unwrap_or(IssueType::Semantic),
                finding.severity,
                "content".to_string(),
                finding.description.clone(),
                finding.recommendation.clone(),
                finding.auto_fixable,
            );
        }
    }

    pub fn finish(self) -> Vec<AccessibilityIssue> {
        self.issues
    }
}

/// Merge everything for one request in the fixed order
pub fn merge(
    content: &str,
    results: &[ValidationResult],
    inventory: &[InventoryImage],
    findings: &AiFindings,
    config: &RuleConfig,
) -> Vec<AccessibilityIssue> {
    let mut merger = IssueMerger::new(content, config);
    merger.add_rule_results(results);
    merger.add_image_findings(inventory, findings);
    if findings.content.is_real() {
        merger.add_content_findings(&findings.content.value);
    }
    merger.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{TaskOutcome, TaskStatus};
    use crate::model::ImageAccessibility;
    use crate::rules::images::inventory;

    fn analysis(decorative: bool, has_text: bool, long: bool) -> ImageAnalysis {
        ImageAnalysis {
            alt_text: "Sales poster".to_string(),
            decorative,
            accessibility: ImageAccessibility {
                has_text,
                needs_long_description: long,
                ..ImageAccessibility::default()
            },
            ..ImageAnalysis::placeholder()
        }
    }

    fn findings(images: Vec<TaskOutcome<ImageAnalysis>>, content: Vec<ContentFinding>) -> AiFindings {
        AiFindings { images, content: TaskOutcome::new(content, TaskStatus::Completed) }
    }

    #[test]
    fn test_rule_mapping_table() {
        assert_eq!(issue_type_for_rule("alt-text-rule"), IssueType::AltText);
        assert_eq!(issue_type_for_rule("contrast-rule"), IssueType::Contrast);
        assert_eq!(issue_type_for_rule("structure-rule"), IssueType::Semantic);
        assert_eq!(issue_type_for_rule("heading-rule"), IssueType::Heading);
        assert_eq!(issue_type_for_rule("aria-rule"), IssueType::Aria);
    }

    #[test]
    fn test_rule_results_skip_passes_and_number_ids() {
        let results = vec![
            ValidationResult::failure(ALT_TEXT_RULE, Severity::High, "a").with_suggestion("fix a"),
            ValidationResult::pass(HEADING_RULE, "ok"),
            ValidationResult::failure(ALT_TEXT_RULE, Severity::Medium, "b"),
            ValidationResult::failure(ARIA_RULE, Severity::Low, "c"),
        ];
        let issues = merge("", &results, &[], &AiFindings::unavailable(0, TaskStatus::Skipped), &RuleConfig::default());
        let ids: Vec<_> = issues.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["alt-text-1", "alt-text-2", "aria-1"]);
        assert_eq!(issues[0].recommendation, "fix a");
        assert!(issues[1].recommendation.contains("1.1.1"));
        assert_eq!(issues[2].element, "document");
    }

    #[test]
    fn test_image_issues_for_real_analyses_only() {
        let content = r#"<img src="a.png"><img src="b.png"><img src="c.png" alt="Chart">"#;
        let inventory = inventory(content, &[]);
        let ai = findings(
            vec![
                TaskOutcome::new(analysis(false, false, false), TaskStatus::Completed),
                TaskOutcome::new(ImageAnalysis::placeholder(), TaskStatus::TimedOut),
                TaskOutcome::new(analysis(false, false, true), TaskStatus::Cached),
            ],
            vec![],
        );
        let issues = merge(content, &[], &inventory, &ai, &RuleConfig::default());
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].element, "<img src=\"a.png\">");
        assert_eq!(issues[0].severity, Severity::High);
        assert!(issues[0].recommendation.contains("Sales poster"));
        assert_eq!(issues[1].element, "<img src=\"c.png\">");
        assert_eq!(issues[1].severity, Severity::Medium);
    }

    #[test]
    fn test_decorative_analysis_adds_nothing() {
        let content = r#"<img src="swirl.png">"#;
        let inventory = inventory(content, &[]);
        let ai = findings(vec![TaskOutcome::new(analysis(true, false, false), TaskStatus::Completed)], vec![]);
        assert!(merge(content, &[], &inventory, &ai, &RuleConfig::default()).is_empty());
    }

    #[test]
    fn test_text_in_image_uses_context_window() {
        let bare = r#"<img src="poster.png" alt="Poster">"#;
        let inventory_bare = inventory(bare, &[]);
        let ai = findings(vec![TaskOutcome::new(analysis(false, true, false), TaskStatus::Completed)], vec![]);
        let issues = merge(bare, &[], &inventory_bare, &ai, &RuleConfig::default());
        assert_eq!(issues.len(), 1);
        assert!(issues[0].description.starts_with("Text in image with no alternative"));

        let described = format!(
            r#"<p>{}</p><img src="poster.png" alt="Poster">"#,
            "The summer sale runs until August and every item is half price in store."
        );
        let inventory_described = inventory(&described, &[]);
        assert!(merge(&described, &[], &inventory_described, &ai, &RuleConfig::default()).is_empty());
    }

    #[test]
    fn test_context_window_bounds() {
        let content = format!("{}<img src=\"x.png\">{}", "a".repeat(300), "é".repeat(300));
        let context = image_context(&content, "x.png", 200).unwrap();
        assert_eq!(context.chars().filter(|c| *c == 'a').count(), 200);
        assert_eq!(context.chars().filter(|c| *c == 'é').count(), 200);
        assert_eq!(image_context(&content, "missing.png", 200), None);
        assert_eq!(image_context(&content, "", 200), None);
    }

    #[test]
    fn test_context_window_drops_cut_tags() {
        let content = r#"<p class="intro">Hi</p><img src="x.png"><span title="long">"#;
        let context = image_context(content, "x.png", 12).unwrap();
        assert!(!context.contains('>'), "{:?}", context);
        assert!(!context.contains('<'), "{:?}", context);
    }

    #[test]
    fn test_content_findings_default_to_semantic() {
        let content_findings = vec![
            ContentFinding {
                issue_type: None,
                severity: Severity::Medium,
                description: "Dense text".to_string(),
                recommendation: "Break it up".to_string(),
                auto_fixable: false,
            },
            ContentFinding {
                issue_type: Some(IssueType::Heading),
                severity: Severity::Low,
                description: "Vague headings".to_string(),
                recommendation: "Be specific".to_string(),
                auto_fixable: false,
            },
        ];
        let results = vec![ValidationResult::failure(HEADING_RULE, Severity::High, "no h1")];
        let issues = merge("<p>x</p>", &results, &[], &findings(vec![], content_findings), &RuleConfig::default());
        let summary: Vec<_> = issues.iter().map(|i| (i.id.as_str(), i.issue_type)).collect();
        assert_eq!(
            summary,
            vec![("heading-1", IssueType::Heading), ("semantic-1", IssueType::Semantic), ("heading-2", IssueType::Heading)]
        );
    }

    #[test]
    fn test_textual_equivalent_threshold() {
        let config = RuleConfig::default();
        assert_eq!(config.min_context_chars, 50);
        let page = |text: String| format!(r#"<p>{}</p><img src="poster.png" alt="Poster">"#, text);
        let ai = findings(vec![TaskOutcome::new(analysis(false, true, false), TaskStatus::Completed)], vec![]);

        let short = page("x".repeat(config.min_context_chars - 1));
        assert!(!has_textual_equivalent(&short, "poster.png", &config));
        assert_eq!(merge(&short, &[], &inventory(&short, &[]), &ai, &config).len(), 1);

        let enough = page("x".repeat(config.min_context_chars));
        assert!(has_textual_equivalent(&enough, "poster.png", &config));
        assert!(merge(&enough, &[], &inventory(&enough, &[]), &ai, &config).is_empty());
    }
}
