// SPDX-License-Identifier: PMPL-1.0-or-later
//! ARIA check - WCAG 4.1.2 Name, Role, Value (Level A)
//!
//! - Interactive controls (button, input, select, textarea) need an accessible name
//! - `aria-*` attributes must be valid ARIA states or properties

use super::markup::{self, Tag};
use super::{Check, CheckInput, ARIA_RULE};
use crate::model::{Severity, ValidationResult};

/// Valid ARIA 1.2 states and properties
const VALID_ARIA_ATTRIBUTES: &[&str] = &[
    "aria-activedescendant",
    "aria-atomic",
    "aria-autocomplete",
    "aria-braillelabel",
    "aria-brailleroledescription",
    "aria-busy",
    "aria-checked",
    "aria-colcount",
    "aria-colindex",
    "aria-colindextext",
    "aria-colspan",
    "aria-controls",
    "aria-current",
    "aria-describedby",
    "aria-description",
    "aria-details",
    "aria-disabled",
    "aria-dropeffect",
    "aria-errormessage",
    "aria-expanded",
    "aria-flowto",
    "aria-grabbed",
    "aria-haspopup",
    "aria-hidden",
    "aria-invalid",
    "aria-keyshortcuts",
    "aria-label",
    "aria-labelledby",
    "aria-level",
    "aria-live",
    "aria-modal",
    "aria-multiline",
    "aria-multiselectable",
    "aria-orientation",
    "aria-owns",
    "aria-placeholder",
    "aria-posinset",
    "aria-pressed",
    "aria-readonly",
    "aria-relevant",
    "aria-required",
    "aria-roledescription",
    "aria-rowcount",
    "aria-rowindex",
    "aria-rowindextext",
    "aria-rowspan",
    "aria-selected",
    "aria-setsize",
    "aria-sort",
    "aria-valuemax",
    "aria-valuemin",
    "aria-valuenow",
    "aria-valuetext",
];

/// Input types whose accessible name comes from their `value`
const VALUE_NAMED_INPUTS: &[&str] = &["submit", "reset", "button"];

/// Input types that are never exposed to users
const NON_INTERACTIVE_INPUTS: &[&str] = &["hidden"];

/// ARIA check
pub struct AriaCheck;

impl Check for AriaCheck {
    fn rule_id(&self) -> &'static str {
        ARIA_RULE
    }

    fn check(&self, input: &CheckInput<'_>) -> Vec<ValidationResult> {
        let mut results = Vec::new();

        check_accessible_names(input.content, &mut results);
        check_aria_attributes(input.content, &mut results);

        results
    }
}

/// `id`s referenced by `<label for="...">`
fn labelled_ids(content: &str) -> Vec<String> {
    markup::find_tags(content, &["label"])
        .iter()
        .filter_map(|t| t.non_empty_attr("for").map(str::to_string))
        .collect()
}

fn has_aria_name(tag: &Tag) -> bool {
    tag.non_empty_attr("aria-label").is_some() || tag.non_empty_attr("aria-labelledby").is_some()
}

/// Whether a form control is named by a `<label for>` or aria attributes
fn has_label(tag: &Tag, labelled: &[String]) -> bool {
    has_aria_name(tag)
        || tag
            .non_empty_attr("id")
            .map(|id| labelled.iter().any(|l| l == id))
            .unwrap_or(false)
}

/// Interactive controls without an accessible name, in document order
fn check_accessible_names(content: &str, results: &mut Vec<ValidationResult>) {
    let labelled = labelled_ids(content);
    let mut unnamed: Vec<(usize, ValidationResult)> = Vec::new();

    for button in markup::find_elements(content, "button") {
        if has_aria_name(&button.tag) || !button.text().is_empty() {
            continue;
        }
        unnamed.push((
            button.tag.start,
            ValidationResult::failure(
                ARIA_RULE,
                Severity::High,
                "Button has no accessible name: no text content, aria-label or aria-labelledby",
            )
            .with_element(button.tag.snippet())
            .with_suggestion("Add visible text to the button or an aria-label describing its action")
            .as_fixable(),
        ));
    }

    for tag in markup::find_tags(content, &["input", "select", "textarea"]) {
        let input_type = tag.attr("type").unwrap_or("text").to_lowercase();
        if tag.name == "input" && NON_INTERACTIVE_INPUTS.contains(&input_type.as_str()) {
            continue;
        }

        let (named, message, suggestion) = if tag.name == "input" && VALUE_NAMED_INPUTS.contains(&input_type.as_str()) {
            (
                has_aria_name(&tag) || tag.non_empty_attr("value").is_some(),
                format!("<input type=\"{}\"> has no accessible name: no value, aria-label or aria-labelledby", input_type),
                "Give the input a value describing its action",
            )
        } else if tag.name == "input" && input_type == "image" {
            (
                has_aria_name(&tag) || tag.non_empty_attr("alt").is_some(),
                "<input type=\"image\"> has no accessible name: no alt, aria-label or aria-labelledby".to_string(),
                "Add alt text describing the image button's action",
            )
        } else {
            (
                has_label(&tag, &labelled),
                format!("<{}> has no accessible name: no label, aria-label or aria-labelledby", tag.name),
                "Associate a <label for> with the control or add aria-label",
            )
        };

        if !named {
            unnamed.push((
                tag.start,
                ValidationResult::failure(ARIA_RULE, Severity::High, message)
                    .with_element(tag.snippet())
                    .with_suggestion(suggestion),
            ));
        }
    }

    unnamed.sort_by_key(|(start, _)| *start);
    results.extend(unnamed.into_iter().map(|(_, r)| r));
}

/// Unknown `aria-*` attributes on any element
fn check_aria_attributes(content: &str, results: &mut Vec<ValidationResult>) {
    for tag in markup::all_tags(content) {
        for (name, _) in &tag.attrs {
            if name.starts_with("aria-") && !VALID_ARIA_ATTRIBUTES.contains(&name.as_str()) {
                results.push(
                    ValidationResult::failure(
                        ARIA_RULE,
                        Severity::Low,
                        format!("Unknown ARIA attribute \"{}\" on <{}>", name, tag.name),
                    )
                    .with_element(tag.snippet())
                    .with_suggestion(format!("Remove \"{}\" or replace it with a valid ARIA attribute", name)),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleConfig;

    fn run(content: &str) -> Vec<ValidationResult> {
        let config = RuleConfig::default();
        AriaCheck.check(&CheckInput { content, images: &[], config: &config })
    }

    #[test]
    fn test_named_controls() {
        let content = r#"
            <button>Save</button>
            <button aria-label="Close dialog"><i class="icon-x"></i></button>
            <label for="email">Email</label><input id="email" type="email">
            <input type="submit" value="Send">
            <input type="hidden" name="token">
            <select aria-labelledby="country-label"><option>NZ</option></select>
            <textarea aria-label="Comment"></textarea>
        "#;
        assert!(run(content).is_empty(), "{:?}", run(content));
    }

    #[test]
    fn test_icon_button_no_label() {
        let results = run(r#"<button><i class="icon-close"></i></button>"#);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::High);
    }

    #[test]
    fn test_unnamed_inputs_in_document_order() {
        let results = run(r#"<input type="text"><button></button><input type="submit"><textarea></textarea>"#);
        assert_eq!(results.len(), 4);
        assert!(results[0].message.starts_with("<input>"));
        assert!(results[1].message.starts_with("Button"));
        assert!(results[2].message.contains("type=\"submit\""));
        assert!(results[3].message.starts_with("<textarea>"));
    }

    #[test]
    fn test_blank_aria_label_does_not_name() {
        let results = run(r#"<select aria-label=" "></select>"#);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_unknown_aria_attribute() {
        let results = run(r#"<div aria-labeledby="x" aria-hidden="true">x</div>"#);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::Low);
        assert!(results[0].message.contains("aria-labeledby"));
    }

    #[test]
    fn test_name_failures_precede_attribute_failures() {
        let results = run(r#"<div aria-foo="1"></div><button></button>"#);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].severity, Severity::High);
        assert_eq!(results[1].severity, Severity::Low);
    }
}
