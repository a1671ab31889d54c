// SPDX-License-Identifier: PMPL-1.0-or-later
//! Deterministic rule validation.
//!
//! Each check module covers one catalog rule. The validator runs them in a
//! fixed order (images, headings, contrast, structure, ARIA) and never
//! fails: malformed input turns into low-severity diagnostic results.

pub mod aria;
pub mod contrast;
pub mod headings;
pub mod images;
pub mod markup;
pub mod structure;

use crate::config::RuleConfig;
use crate::model::{ComplianceLevel, ImageDescriptor, RuleCategory, ValidationResult, ValidationRule};
use images::InventoryImage;
use tracing::debug;

pub const ALT_TEXT_RULE: &str = "alt-text-rule";
pub const HEADING_RULE: &str = "heading-rule";
pub const CONTRAST_RULE: &str = "contrast-rule";
pub const STRUCTURE_RULE: &str = "structure-rule";
pub const ARIA_RULE: &str = "aria-rule";

/// The static rule catalog
pub static RULES: [ValidationRule; 5] = [
    ValidationRule {
        id: ALT_TEXT_RULE,
        name: "Non-text Content",
        wcag_criterion: "1.1.1",
        compliance_level: ComplianceLevel::A,
        category: RuleCategory::Perceivable,
        description: "Images carry meaningful, concise alternative text",
    },
    ValidationRule {
        id: HEADING_RULE,
        name: "Heading Structure",
        wcag_criterion: "1.3.1",
        compliance_level: ComplianceLevel::A,
        category: RuleCategory::Perceivable,
        description: "One H1, no skipped levels, no empty headings",
    },
    ValidationRule {
        id: CONTRAST_RULE,
        name: "Contrast (Minimum)",
        wcag_criterion: "1.4.3",
        compliance_level: ComplianceLevel::AA,
        category: RuleCategory::Perceivable,
        description: "Inline text and background colors reach a 4.5:1 contrast ratio",
    },
    ValidationRule {
        id: STRUCTURE_RULE,
        name: "Info and Relationships",
        wcag_criterion: "1.3.1",
        compliance_level: ComplianceLevel::A,
        category: RuleCategory::Perceivable,
        description: "Lists contain items and data tables declare header cells",
    },
    ValidationRule {
        id: ARIA_RULE,
        name: "Name, Role, Value",
        wcag_criterion: "4.1.2",
        compliance_level: ComplianceLevel::A,
        category: RuleCategory::Robust,
        description: "Interactive controls have accessible names and ARIA attributes are valid",
    },
];

/// Look up a catalog rule by id
pub fn rule(id: &str) -> Option<&'static ValidationRule> {
    RULES.iter().find(|r| r.id == id)
}

/// Everything a check sees
pub struct CheckInput<'a> {
    pub content: &'a str,
    pub images: &'a [InventoryImage],
    pub config: &'a RuleConfig,
}

/// Trait implemented by all checks
pub trait Check: Send + Sync {
    /// Catalog rule this check reports under
    fn rule_id(&self) -> &'static str;

    /// Run the check and return failures and diagnostics
    fn check(&self, input: &CheckInput<'_>) -> Vec<ValidationResult>;
}

/// Runs every check in catalog order
pub struct RuleValidator {
    checks: Vec<Box<dyn Check>>,
    config: RuleConfig,
}

impl Default for RuleValidator {
    fn default() -> Self {
        Self::new(RuleConfig::default())
    }
}

impl RuleValidator {
    pub fn new(config: RuleConfig) -> Self {
        let checks: Vec<Box<dyn Check>> = vec![
            Box::new(images::AltTextCheck),
            Box::new(headings::HeadingCheck),
            Box::new(contrast::ContrastCheck),
            Box::new(structure::StructureCheck),
            Box::new(aria::AriaCheck),
        ];
        Self { checks, config }
    }

    /// The rule catalog
    pub fn rules(&self) -> &'static [ValidationRule] {
        &RULES
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Validate content and images, returning results in check order.
    ///
    /// A check family with no failures contributes a single passing result.
    pub fn validate(&self, content: &str, images: &[ImageDescriptor]) -> Vec<ValidationResult> {
        let inventory = images::inventory(content, images);
        let input = CheckInput { content, images: &inventory, config: &self.config };

        let mut results = Vec::new();
        for check in &self.checks {
            let found = check.check(&input);
            debug!(rule = check.rule_id(), failures = found.len(), "Check complete");
            if found.is_empty() {
                results.push(ValidationResult::pass(check.rule_id(), "No issues found"));
            } else {
                results.extend(found);
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failures(results: &[ValidationResult]) -> Vec<&ValidationResult> {
        results.iter().filter(|r| !r.passed).collect()
    }

    #[test]
    fn test_catalog_ids_unique() {
        let mut ids: Vec<_> = RULES.iter().map(|r| r.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), RULES.len());
        assert_eq!(rule(CONTRAST_RULE).map(|r| r.compliance_level), Some(ComplianceLevel::AA));
    }

    #[test]
    fn test_clean_content_passes_every_family() {
        let content = r#"<h1>Annual report</h1><p style="color: #000; background-color: #fff">Text</p>
            <ul><li>One</li></ul><button>Save</button>"#;
        let results = RuleValidator::default().validate(content, &[]);
        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|r| r.passed));
        let order: Vec<_> = results.iter().map(|r| r.rule_id.as_str()).collect();
        assert_eq!(order, vec![ALT_TEXT_RULE, HEADING_RULE, CONTRAST_RULE, STRUCTURE_RULE, ARIA_RULE]);
    }

    #[test]
    fn test_missing_alt_only_issue() {
        let results = RuleValidator::default().validate(r#"<img src="a.jpg">"#, &[]);
        let failed = failures(&results);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].rule_id, ALT_TEXT_RULE);
        assert!(failed[0].auto_fixable);
    }

    #[test]
    fn test_results_follow_check_order() {
        let content = r#"<button></button><ul></ul><h1>T</h1><img src="x.png">"#;
        let results = RuleValidator::default().validate(content, &[]);
        let failed: Vec<_> = failures(&results).iter().map(|r| r.rule_id.clone()).collect();
        assert_eq!(failed, vec![ALT_TEXT_RULE, HEADING_RULE, STRUCTURE_RULE, ARIA_RULE]);
    }

    #[test]
    fn test_validate_is_total_on_garbage() {
        let inputs = ["", "   ", "<<<>>>", "<h9>", "<img src=", "<p style=\"color:\">", "\u{0}\u{fffd}<h1"];
        for input in inputs {
            let results = RuleValidator::default().validate(input, &[ImageDescriptor::new("")]);
            assert!(!results.is_empty(), "no results for {:?}", input);
        }
    }
}
