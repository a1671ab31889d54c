// SPDX-License-Identifier: PMPL-1.0-or-later
//! Image alt text check - WCAG 1.1.1 Non-text Content (Level A)
//!
//! - Every image needs non-empty alt text unless explicitly decorative
//! - Alt text must stay concise (125 characters by default)
//! - Alt text must not be a generic term like "image" or "photo"

use super::markup::{self, Tag};
use super::{Check, CheckInput, ALT_TEXT_RULE};
use crate::model::{ImageDescriptor, Severity, ValidationResult};

/// Generic alt text values that indicate lazy/unhelpful descriptions
const GENERIC_ALT_VALUES: &[&str] = &[
    "image",
    "photo",
    "photograph",
    "picture",
    "pic",
    "icon",
    "graphic",
    "img",
    "banner",
    "logo",
    "untitled",
    "screenshot",
    "thumbnail",
    "placeholder",
];

/// An image known to the request: caller-supplied or found in the markup
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryImage {
    pub src: String,
    pub alt: Option<String>,
    /// Marked `role="presentation"`/`role="none"` or `aria-hidden="true"` in the markup
    pub presentational: bool,
    /// Position in the caller's image list, `None` for markup-only images
    pub descriptor_index: Option<usize>,
}

impl InventoryImage {
    /// Empty alt on an image explicitly marked decorative
    pub fn is_decorative(&self) -> bool {
        self.presentational && self.alt.as_deref().map(|a| a.trim().is_empty()).unwrap_or(false)
    }

    /// Alt text that is present and not blank
    pub fn non_empty_alt(&self) -> Option<&str> {
        self.alt.as_deref().filter(|a| !a.trim().is_empty())
    }

    /// How the image is referred to in issues
    pub fn label(&self) -> String {
        if self.src.is_empty() {
            "<img>".to_string()
        } else {
            format!("<img src=\"{}\">", self.src)
        }
    }
}

/// Build the image inventory: the caller's list first, then every `<img>` tag
/// not claimed by a listed image, in document order. A listed image claims the
/// first unclaimed tag with the same `src` and inherits its alt when it has none.
/// Repeated or missing `src` values in the markup give separate entries.
pub fn inventory(content: &str, images: &[ImageDescriptor]) -> Vec<InventoryImage> {
    let tags = markup::find_tags(content, &["img"]);
    let mut claimed = vec![false; tags.len()];

    let mut inventory: Vec<InventoryImage> = images
        .iter()
        .enumerate()
        .map(|(idx, image)| {
            let tag = tags
                .iter()
                .enumerate()
                .find(|(t, tag)| !claimed[*t] && tag.attr("src") == Some(image.src.as_str()))
                .map(|(t, tag)| {
                    claimed[t] = true;
                    tag
                });
            InventoryImage {
                src: image.src.clone(),
                alt: image
                    .alt
                    .clone()
                    .or_else(|| tag.and_then(|t| t.attr("alt")).map(str::to_string)),
                presentational: tag.map(is_presentational).unwrap_or(false),
                descriptor_index: Some(idx),
            }
        })
        .collect();

    for (tag, _) in tags.iter().zip(&claimed).filter(|(_, taken)| !**taken) {
        inventory.push(InventoryImage {
            src: tag.attr("src").unwrap_or("").to_string(),
            alt: tag.attr("alt").map(str::to_string),
            presentational: is_presentational(tag),
            descriptor_index: None,
        });
    }

    inventory
}

fn is_presentational(tag: &Tag) -> bool {
    matches!(tag.attr("role"), Some("presentation") | Some("none"))
        || tag.attr("aria-hidden") == Some("true")
}

/// Whether alt text is a generic term, exactly or as its first or last word
pub fn is_generic_alt(alt: &str) -> bool {
    let words: Vec<String> = alt
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect();

    match (words.first(), words.last()) {
        (Some(first), Some(last)) => {
            GENERIC_ALT_VALUES.contains(&first.as_str()) || GENERIC_ALT_VALUES.contains(&last.as_str())
        }
        _ => false,
    }
}

/// Alt text check
pub struct AltTextCheck;

impl Check for AltTextCheck {
    fn rule_id(&self) -> &'static str {
        ALT_TEXT_RULE
    }

    fn check(&self, input: &CheckInput<'_>) -> Vec<ValidationResult> {
        let mut results = Vec::new();

        for image in input.images {
            if image.is_decorative() {
                continue;
            }

            let Some(alt) = image.non_empty_alt() else {
                results.push(
                    ValidationResult::failure(
                        ALT_TEXT_RULE,
                        Severity::High,
                        "Image is missing alternative text",
                    )
                    .with_element(image.label())
                    .with_suggestion(
                        "Add alt text describing the image, or mark it decorative with alt=\"\" and role=\"presentation\"",
                    )
                    .as_fixable(),
                );
                continue;
            };

            let length = alt.chars().count();
            if length > input.config.max_alt_length {
                results.push(
                    ValidationResult::failure(
                        ALT_TEXT_RULE,
                        Severity::Medium,
                        format!(
                            "Alt text is {} characters long; keep it under {}",
                            length, input.config.max_alt_length
                        ),
                    )
                    .with_element(image.label())
                    .with_suggestion("Shorten the alt text and move the detail into a long description"),
                );
            }

            if is_generic_alt(alt) {
                results.push(
                    ValidationResult::failure(
                        ALT_TEXT_RULE,
                        Severity::Medium,
                        format!("Image has generic alt text \"{}\"", alt.trim()),
                    )
                    .with_element(image.label())
                    .with_suggestion("Describe what the image shows instead of what it is")
                    .as_fixable(),
                );
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleConfig;

    fn run(content: &str, images: &[ImageDescriptor]) -> Vec<ValidationResult> {
        let inventory = inventory(content, images);
        let config = RuleConfig::default();
        AltTextCheck.check(&CheckInput { content, images: &inventory, config: &config })
    }

    #[test]
    fn test_accessible_images() {
        let content = r#"
            <img src="chart.png" alt="Bar chart showing Q4 revenue growth of 15%">
            <img src="divider.png" alt="" role="presentation">
        "#;
        assert!(run(content, &[]).is_empty());
    }

    #[test]
    fn test_missing_alt() {
        let results = run(r#"<img src="a.jpg">"#, &[]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::High);
        assert!(results[0].auto_fixable);
        assert_eq!(results[0].element.as_deref(), Some("<img src=\"a.jpg\">"));
    }

    #[test]
    fn test_empty_alt_without_decorative_marker() {
        let results = run(r#"<img src="a.jpg" alt="  ">"#, &[]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::High);
    }

    #[test]
    fn test_long_alt() {
        let alt = "a".repeat(126);
        let results = run("", &[ImageDescriptor::new("x.png").with_alt(alt)]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::Medium);
        assert!(!results[0].auto_fixable);

        let ok = "a".repeat(125);
        assert!(run("", &[ImageDescriptor::new("x.png").with_alt(ok)]).is_empty());
    }

    #[test]
    fn test_generic_alt_exact_and_tokens() {
        assert!(is_generic_alt("Image"));
        assert!(is_generic_alt("photo of the team"));
        assert!(is_generic_alt("Company logo."));
        assert!(!is_generic_alt("Team celebrating the product launch"));
        assert!(!is_generic_alt("An iconic bridge at dusk"));

        let results = run("", &[ImageDescriptor::new("x.png").with_alt("logo")]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::Medium);
        assert!(results[0].auto_fixable);
    }

    #[test]
    fn test_inventory_merges_markup_and_descriptors() {
        let content = r#"<img src="a.png" alt="From markup"><img src="b.png"><img src="c.png" alt="C">"#;
        let images = vec![ImageDescriptor::new("b.png"), ImageDescriptor::new("a.png")];
        let inv = inventory(content, &images);
        let srcs: Vec<_> = inv.iter().map(|i| i.src.as_str()).collect();
        assert_eq!(srcs, vec!["b.png", "a.png", "c.png"]);
        assert_eq!(inv[1].alt.as_deref(), Some("From markup"));
        assert_eq!(inv[1].descriptor_index, Some(1));
        assert_eq!(inv[2].descriptor_index, None);
    }

    #[test]
    fn test_listed_and_marked_up_image_reported_once() {
        let results = run(r#"<img src="a.jpg">"#, &[ImageDescriptor::new("a.jpg")]);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_repeated_src_is_checked_per_tag() {
        let content = r#"<img src="logo.png" alt="Acme Corporation"><p>x</p><img src="logo.png">"#;
        let results = run(content, &[]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::High);
        assert_eq!(inventory(content, &[]).len(), 2);
    }

    #[test]
    fn test_images_without_src_are_checked_each() {
        let results = run("<img><img>", &[]);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.element.as_deref() == Some("<img>")));
    }

    #[test]
    fn test_descriptor_claims_one_tag() {
        let content = r#"<img src="a.png" alt="First"><img src="a.png">"#;
        let inv = inventory(content, &[ImageDescriptor::new("a.png")]);
        assert_eq!(inv.len(), 2);
        assert_eq!(inv[0].descriptor_index, Some(0));
        assert_eq!(inv[0].alt.as_deref(), Some("First"));
        assert_eq!(inv[1].descriptor_index, None);
        assert_eq!(inv[1].alt, None);
    }
}
