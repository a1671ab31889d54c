// SPDX-License-Identifier: PMPL-1.0-or-later
//! Semantic structure check - WCAG 1.3.1 Info and Relationships (Level A)
//!
//! - `<ul>` / `<ol>` must contain at least one `<li>`
//! - `<table>` must declare header cells (`<th>` or a row/col `scope`)
//! - whitespace-only content is reported as a diagnostic

use super::markup;
use super::{Check, CheckInput, STRUCTURE_RULE};
use crate::model::{Severity, ValidationResult};

/// Semantic structure check
pub struct StructureCheck;

impl Check for StructureCheck {
    fn rule_id(&self) -> &'static str {
        STRUCTURE_RULE
    }

    fn check(&self, input: &CheckInput<'_>) -> Vec<ValidationResult> {
        let mut results = Vec::new();

        if input.content.trim().is_empty() {
            results.push(
                ValidationResult::failure(STRUCTURE_RULE, Severity::Low, "Content is empty; nothing to validate")
                    .with_suggestion("Provide the markup to be checked"),
            );
            return results;
        }

        check_lists(input.content, &mut results);
        check_tables(input.content, &mut results);

        results
    }
}

/// Lists without items, in document order
fn check_lists(content: &str, results: &mut Vec<ValidationResult>) {
    let mut lists: Vec<markup::Element> = markup::find_elements(content, "ul");
    lists.extend(markup::find_elements(content, "ol"));
    lists.sort_by_key(|el| el.tag.start);

    for list in lists {
        if markup::find_tags(&list.inner, &["li"]).is_empty() {
            results.push(
                ValidationResult::failure(
                    STRUCTURE_RULE,
                    Severity::Medium,
                    format!("List <{}> has no list items", list.tag.name),
                )
                .with_element(list.tag.snippet())
                .with_suggestion(format!(
                    "Add <li> items to the <{}> or replace it with a non-list element",
                    list.tag.name
                )),
            );
        }
    }
}

/// Tables without header cells
fn check_tables(content: &str, results: &mut Vec<ValidationResult>) {
    for table in markup::find_elements(content, "table") {
        let inner_tags = markup::all_tags(&table.inner);
        let has_th = inner_tags.iter().any(|t| t.name == "th");
        let has_scope = inner_tags
            .iter()
            .chain(std::iter::once(&table.tag))
            .any(|t| matches!(t.attr("scope").map(str::to_lowercase).as_deref(), Some("col") | Some("row")));

        if !has_th && !has_scope {
            results.push(
                ValidationResult::failure(
                    STRUCTURE_RULE,
                    Severity::Medium,
                    "Table has no header cells (<th> or scope=\"col\"/\"row\")",
                )
                .with_element(table.tag.snippet())
                .with_suggestion("Mark header cells with <th scope=\"col\"> or <th scope=\"row\">"),
            );
        }
    }
}
