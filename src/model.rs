// SPDX-License-Identifier: PMPL-1.0-or-later
//! Core data model shared by the validator, merger, scorer and cache.
//!
//! Everything here is plain data with serde derives so reports can be
//! rendered as JSON and cached by value.

use serde::{Deserialize, Serialize};

/// Severity of a validation result or issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks assistive technology users
    High,
    /// Degrades the experience
    Medium,
    /// Minor or diagnostic
    Low,
}

impl Severity {
    /// Fixed point deduction used by every score computation
    pub fn weight(&self) -> u32 {
        match self {
            Severity::High => 15,
            Severity::Medium => 10,
            Severity::Low => 5,
        }
    }

    /// Parse a loosely formatted severity label from a provider reply
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "high" | "critical" | "error" | "serious" => Some(Severity::High),
            "medium" | "moderate" | "warning" => Some(Severity::Medium),
            "low" | "minor" | "info" => Some(Severity::Low),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::Low => write!(f, "LOW"),
        }
    }
}

/// WCAG conformance level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComplianceLevel {
    /// Level A - minimum conformance
    A,
    /// Level AA - standard conformance
    AA,
    /// Level AAA - enhanced conformance
    AAA,
}

impl std::fmt::Display for ComplianceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComplianceLevel::A => write!(f, "A"),
            ComplianceLevel::AA => write!(f, "AA"),
            ComplianceLevel::AAA => write!(f, "AAA"),
        }
    }
}

/// WCAG principle a rule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Perceivable,
    Operable,
    Understandable,
    Robust,
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleCategory::Perceivable => write!(f, "perceivable"),
            RuleCategory::Operable => write!(f, "operable"),
            RuleCategory::Understandable => write!(f, "understandable"),
            RuleCategory::Robust => write!(f, "robust"),
        }
    }
}

/// A static rule definition in the validator catalog
#[derive(Debug, Clone, Serialize)]
pub struct ValidationRule {
    pub id: &'static str,
    pub name: &'static str,
    pub wcag_criterion: &'static str,
    pub compliance_level: ComplianceLevel,
    pub category: RuleCategory,
    pub description: &'static str,
}

/// Outcome of a single rule invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Catalog rule id (e.g. "alt-text-rule")
    pub rule_id: String,
    /// Whether the check passed
    pub passed: bool,
    /// Severity level
    pub severity: Severity,
    /// Markup or image reference involved
    pub element: Option<String>,
    /// Detailed message
    pub message: String,
    /// Suggested fix
    pub suggestion: String,
    /// Whether this can be auto-fixed
    pub auto_fixable: bool,
}

impl ValidationResult {
    /// Create a failed result
    pub fn failure(rule_id: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            passed: false,
            severity,
            element: None,
            message: message.into(),
            suggestion: String::new(),
            auto_fixable: false,
        }
    }

    /// Create a passing result for a check family that found nothing
    pub fn pass(rule_id: &str, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            passed: true,
            severity: Severity::Low,
            element: None,
            message: message.into(),
            suggestion: String::new(),
            auto_fixable: false,
        }
    }

    /// Set the element
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    /// Set suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }

    /// Mark as auto-fixable
    pub fn as_fixable(mut self) -> Self {
        self.auto_fixable = true;
        self
    }
}

/// An image supplied by the caller alongside the content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDescriptor {
    pub src: String,
    #[serde(default)]
    pub alt: Option<String>,
    /// Raw image bytes, base64 encoded in JSON
    #[serde(default, with = "base64_bytes")]
    pub data: Option<Vec<u8>>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl ImageDescriptor {
    pub fn new(src: impl Into<String>) -> Self {
        Self { src: src.into(), ..Self::default() }
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }

    pub fn with_data(mut self, data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        self.data = Some(data);
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Mime type, falling back to a guess from the file extension
    pub fn effective_mime_type(&self) -> String {
        if let Some(mime) = &self.mime_type {
            return mime.clone();
        }
        let ext = self.src.rsplit('.').next().unwrap_or("").to_lowercase();
        match ext.as_str() {
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "svg" => "image/svg+xml",
            _ => "image/jpeg",
        }
        .to_string()
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match data {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|s| STANDARD.decode(s.trim()).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Confidence reported by the AI provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    #[default]
    Low,
}

/// Accessibility traits of an analyzed image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageAccessibility {
    pub has_text: bool,
    pub is_complex: bool,
    pub needs_long_description: bool,
    pub suggested_long_description: Option<String>,
}

/// AI-derived analysis of a single image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageAnalysis {
    pub alt_text: String,
    pub confidence: Confidence,
    pub description: String,
    pub context: String,
    pub decorative: bool,
    pub text_content: Option<String>,
    pub accessibility: ImageAccessibility,
}

/// Alt text used whenever no real analysis is available
pub const PLACEHOLDER_ALT_TEXT: &str = "Image";

impl ImageAnalysis {
    /// Neutral low-confidence stand-in for a failed or skipped analysis
    pub fn placeholder() -> Self {
        Self {
            alt_text: PLACEHOLDER_ALT_TEXT.to_string(),
            confidence: Confidence::Low,
            description: "Image analysis unavailable".to_string(),
            context: String::new(),
            decorative: false,
            text_content: None,
            accessibility: ImageAccessibility::default(),
        }
    }
}

impl Default for ImageAnalysis {
    fn default() -> Self {
        Self::placeholder()
    }
}

/// Issue categories returned to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    AltText,
    Contrast,
    Heading,
    Aria,
    Semantic,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::AltText => "alt-text",
            IssueType::Contrast => "contrast",
            IssueType::Heading => "heading",
            IssueType::Aria => "aria",
            IssueType::Semantic => "semantic",
        }
    }

    /// Parse a provider-supplied type label
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().replace('_', "-").as_str() {
            "alt-text" | "alt" | "image" | "images" => Some(IssueType::AltText),
            "contrast" | "color" | "colour" => Some(IssueType::Contrast),
            "heading" | "headings" => Some(IssueType::Heading),
            "aria" => Some(IssueType::Aria),
            "semantic" | "structure" => Some(IssueType::Semantic),
            _ => None,
        }
    }
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An actionable issue in a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityIssue {
    /// Unique within one report
    pub id: String,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: Severity,
    pub element: String,
    pub description: String,
    pub recommendation: String,
    pub auto_fixable: bool,
}

/// Analysis attached to the report for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysisEntry {
    pub src: String,
    pub analysis: ImageAnalysis,
}

/// The unit returned by `check_content`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityReport {
    pub score: u8,
    pub issues: Vec<AccessibilityIssue>,
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_analyses: Option<Vec<ImageAnalysisEntry>>,
}

impl AccessibilityReport {
    /// Issues of one severity
    pub fn by_severity(&self, severity: Severity) -> Vec<&AccessibilityIssue> {
        self.issues.iter().filter(|i| i.severity == severity).collect()
    }

    /// Issues of one type
    pub fn by_type(&self, issue_type: IssueType) -> Vec<&AccessibilityIssue> {
        self.issues.iter().filter(|i| i.issue_type == issue_type).collect()
    }

    /// Whether any high severity issue exists
    pub fn has_high_severity(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::High)
    }
}
