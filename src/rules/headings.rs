// SPDX-License-Identifier: PMPL-1.0-or-later
//! Heading structure check - WCAG 1.3.1 Info and Relationships (Level A)
//!
//! Checks run only when the content has headings at all:
//! - exactly one `<h1>`
//! - adjacent headings never skip a level going down
//! - heading text is present and not trivially short

use super::markup::{strip_tags, truncate_chars};
use super::{Check, CheckInput, HEADING_RULE};
use crate::model::{Severity, ValidationResult};
use regex::Regex;
use std::sync::LazyLock;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h([1-6])(?:\s[^>]*)?>(.*?)</h[1-6]\s*>").expect("valid regex"));

/// Minimum heading text length before a heading is considered too short
const MIN_HEADING_CHARS: usize = 3;

/// A heading in document order
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// Extract headings with their level and stripped text
pub fn extract_headings(content: &str) -> Vec<Heading> {
    HEADING_RE
        .captures_iter(content)
        .filter_map(|caps| {
            let level = caps[1].parse::<u8>().ok()?;
            Some(Heading { level, text: strip_tags(&caps[2]) })
        })
        .collect()
}

/// Heading check
pub struct HeadingCheck;

impl Check for HeadingCheck {
    fn rule_id(&self) -> &'static str {
        HEADING_RULE
    }

    fn check(&self, input: &CheckInput<'_>) -> Vec<ValidationResult> {
        let headings = extract_headings(input.content);
        let mut results = Vec::new();

        if headings.is_empty() {
            return results;
        }

        let h1_count = headings.iter().filter(|h| h.level == 1).count();
        if h1_count == 0 {
            results.push(
                ValidationResult::failure(
                    HEADING_RULE,
                    Severity::High,
                    format!("Content is missing an H1 heading; the first heading is <h{}>", headings[0].level),
                )
                .with_element(format!("<h{}>", headings[0].level))
                .with_suggestion("Start the content with a single <h1> describing the page"),
            );
        } else if h1_count > 1 {
            results.push(
                ValidationResult::failure(
                    HEADING_RULE,
                    Severity::Medium,
                    format!("Content has {} H1 headings; expected exactly one", h1_count),
                )
                .with_element("<h1>")
                .with_suggestion("Keep one <h1> and demote the others to <h2>"),
            );
        }

        for (idx, heading) in headings.iter().enumerate() {
            if idx > 0 {
                let prev = headings[idx - 1].level;
                if heading.level > prev + 1 {
                    results.push(
                        ValidationResult::failure(
                            HEADING_RULE,
                            Severity::Medium,
                            format!(
                                "Heading hierarchy skips from level {} to level {}; expected level {}",
                                prev,
                                heading.level,
                                prev + 1
                            ),
                        )
                        .with_element(format!("<h{}>{}</h{}>", heading.level, heading.text, heading.level))
                        .with_suggestion(format!(
                            "Use <h{}> instead of <h{}>, or add the intermediate heading level",
                            prev + 1,
                            heading.level
                        )),
                    );
                }
            }

            let length = heading.text.chars().count();
            if length == 0 {
                results.push(
                    ValidationResult::failure(
                        HEADING_RULE,
                        Severity::High,
                        format!("Empty heading: <h{}> has no text", heading.level),
                    )
                    .with_element(format!("<h{}></h{}>", heading.level, heading.level))
                    .with_suggestion("Give the heading descriptive text or remove it"),
                );
            } else if length < MIN_HEADING_CHARS {
                results.push(
                    ValidationResult::failure(
                        HEADING_RULE,
                        Severity::Low,
                        format!(
                            "Heading text \"{}\" is too short to describe its section",
                            truncate_chars(&heading.text, 20)
                        ),
                    )
                    .with_element(format!("<h{}>{}</h{}>", heading.level, heading.text, heading.level))
                    .with_suggestion("Use heading text that describes the section content"),
                );
            }
        }

        results
    }
}
