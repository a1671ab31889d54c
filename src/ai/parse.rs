// SPDX-License-Identifier: PMPL-1.0-or-later
//! Best-effort parsing of provider replies.
//!
//! Replies are free text that usually wraps a JSON document. Each parser
//! returns `Structured` when the JSON could be read and `Unstructured` with
//! the raw text otherwise; the conversion to domain values then applies
//! explicit defaults rather than leaving fields empty. A reply that carries
//! `"success": false` is a provider failure.

use crate::error::{EngineError, Result};
use crate::model::{Confidence, ImageAnalysis, IssueType, Severity, PLACEHOLDER_ALT_TEXT};
use crate::rules::markup::clip_chars;
use serde::Deserialize;
use serde_json::Value;

/// Alt text longer than this is cut when derived from free text
const MAX_DERIVED_ALT_CHARS: usize = 125;

const DEFAULT_CONTENT_DESCRIPTION: &str = "Accessibility concern reported by AI analysis";
const DEFAULT_CONTENT_RECOMMENDATION: &str = "Review this part of the content for accessibility";

/// A provider reply that may or may not have been machine readable
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderReply<T> {
    Structured(T),
    Unstructured(String),
}

impl<T> ProviderReply<T> {
    pub fn is_structured(&self) -> bool {
        matches!(self, ProviderReply::Structured(_))
    }
}

/// A content-level critique entry from the provider
#[derive(Debug, Clone, PartialEq)]
pub struct ContentFinding {
    /// Specific type when the provider supplied a recognizable one
    pub issue_type: Option<IssueType>,
    pub severity: Severity,
    pub description: String,
    pub recommendation: String,
    pub auto_fixable: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContentIssue {
    #[serde(rename = "type")]
    kind: Option<String>,
    severity: Option<String>,
    description: Option<String>,
    recommendation: Option<String>,
    #[serde(alias = "auto_fixable")]
    auto_fixable: Option<bool>,
}

impl RawContentIssue {
    fn into_finding(self) -> Option<ContentFinding> {
        let description = self.description.filter(|d| !d.trim().is_empty());
        let recommendation = self.recommendation.filter(|r| !r.trim().is_empty());
        if description.is_none() && recommendation.is_none() {
            return None;
        }
        Some(ContentFinding {
            issue_type: self.kind.as_deref().and_then(IssueType::from_label),
            severity: self.severity.as_deref().and_then(Severity::from_label).unwrap_or(Severity::Medium),
            description: description.unwrap_or_else(|| DEFAULT_CONTENT_DESCRIPTION.to_string()),
            recommendation: recommendation.unwrap_or_else(|| DEFAULT_CONTENT_RECOMMENDATION.to_string()),
            auto_fixable: self.auto_fixable.unwrap_or(false),
        })
    }
}

/// Find the JSON document in a reply: whole text, fenced block, or outermost braces
pub fn extract_json(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"));
    if let Some(body) = unfenced {
        if let Ok(value) = serde_json::from_str(body.trim()) {
            return Some(value);
        }
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (trimmed.find(open), trimmed.rfind(close)) {
            if start < end {
                if let Ok(value) = serde_json::from_str(&trimmed[start..=end]) {
                    return Some(value);
                }
            }
        }
    }
    None
}

/// Fail on an explicit `"success": false` envelope
fn check_envelope(value: &Value) -> Result<()> {
    if value.get("success").and_then(Value::as_bool) == Some(false) {
        let reason = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("provider reported failure");
        return Err(EngineError::Provider(reason.to_string()));
    }
    Ok(())
}

/// Parse an image analysis reply
pub fn parse_image_analysis(raw: &str) -> Result<ProviderReply<ImageAnalysis>> {
    let Some(value) = extract_json(raw) else {
        return Ok(ProviderReply::Unstructured(raw.to_string()));
    };
    check_envelope(&value)?;

    let body = value.get("analysis").cloned().unwrap_or(value);
    match serde_json::from_value::<ImageAnalysis>(body) {
        Ok(analysis) => Ok(ProviderReply::Structured(analysis)),
        Err(_) => Ok(ProviderReply::Unstructured(raw.to_string())),
    }
}

/// Parse a content critique reply: `{"issues": [...]}` or a bare array
pub fn parse_content_findings(raw: &str) -> Result<ProviderReply<Vec<ContentFinding>>> {
    let Some(value) = extract_json(raw) else {
        return Ok(ProviderReply::Unstructured(raw.to_string()));
    };
    check_envelope(&value)?;

    let issues = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("issues") {
            Some(Value::Array(items)) => items,
            _ => return Ok(ProviderReply::Unstructured(raw.to_string())),
        },
        _ => return Ok(ProviderReply::Unstructured(raw.to_string())),
    };

    let findings = issues
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RawContentIssue>(item).ok())
        .filter_map(RawContentIssue::into_finding)
        .collect();
    Ok(ProviderReply::Structured(findings))
}

/// Parse an alt text reply: `{"altText": "..."}` or plain text
pub fn parse_alt_text(raw: &str) -> Result<ProviderReply<String>> {
    let Some(value) = extract_json(raw) else {
        return Ok(ProviderReply::Unstructured(raw.to_string()));
    };
    check_envelope(&value)?;

    match value.get("altText").or_else(|| value.get("alt_text")).and_then(Value::as_str) {
        Some(alt) => Ok(ProviderReply::Structured(alt.to_string())),
        None => Ok(ProviderReply::Unstructured(raw.to_string())),
    }
}

/// First sentence of free text, unquoted and cut to alt text length
pub fn derive_alt_text(raw: &str) -> String {
    let first_line = raw.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    let sentence = match first_line.find(". ") {
        Some(pos) => &first_line[..=pos],
        None => first_line,
    };
    let cleaned = sentence.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if cleaned.is_empty() {
        PLACEHOLDER_ALT_TEXT.to_string()
    } else {
        clip_chars(cleaned, MAX_DERIVED_ALT_CHARS)
    }
}

impl ProviderReply<ImageAnalysis> {
    /// Resolve to an analysis; free text becomes a low-confidence description
    pub fn into_analysis(self) -> ImageAnalysis {
        match self {
            ProviderReply::Structured(mut analysis) => {
                analysis.alt_text = analysis.alt_text.trim().to_string();
                if analysis.alt_text.is_empty() && !analysis.decorative {
                    analysis.alt_text = PLACEHOLDER_ALT_TEXT.to_string();
                    analysis.confidence = Confidence::Low;
                }
                analysis
            }
            ProviderReply::Unstructured(raw) => ImageAnalysis {
                alt_text: derive_alt_text(&raw),
                confidence: Confidence::Low,
                description: raw.trim().to_string(),
                ..ImageAnalysis::placeholder()
            },
        }
    }
}

impl ProviderReply<Vec<ContentFinding>> {
    /// Resolve to findings; free text yields none
    pub fn into_findings(self) -> Vec<ContentFinding> {
        match self {
            ProviderReply::Structured(findings) => findings,
            ProviderReply::Unstructured(_) => Vec::new(),
        }
    }
}

impl ProviderReply<String> {
    /// Resolve to alt text; free text is reduced to its first sentence
    pub fn into_alt_text(self) -> String {
        match self {
            ProviderReply::Structured(alt) if !alt.trim().is_empty() => alt.trim().to_string(),
            ProviderReply::Structured(_) => PLACEHOLDER_ALT_TEXT.to_string(),
            ProviderReply::Unstructured(raw) => derive_alt_text(&raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_image_analysis() {
        let raw = r#"Here you go:
            {"altText": "Line chart of monthly sales", "confidence": "high", "decorative": false,
             "accessibility": {"hasText": true, "isComplex": true, "needsLongDescription": true}}
            Hope this helps."#;
        let reply = parse_image_analysis(raw).unwrap();
        assert!(reply.is_structured());
        let analysis = reply.into_analysis();
        assert_eq!(analysis.alt_text, "Line chart of monthly sales");
        assert_eq!(analysis.confidence, Confidence::High);
        assert!(analysis.accessibility.needs_long_description);
        assert_eq!(analysis.accessibility.suggested_long_description, None);
    }

    #[test]
    fn test_fenced_json() {
        let raw = "```json\n{\"altText\": \"A red bicycle\"}\n```";
        let analysis = parse_image_analysis(raw).unwrap().into_analysis();
        assert_eq!(analysis.alt_text, "A red bicycle");
        // Unspecified fields fall back to the placeholder defaults
        assert_eq!(analysis.confidence, Confidence::Low);
        assert!(!analysis.decorative);
    }

    #[test]
    fn test_unstructured_image_reply() {
        let raw = "A golden retriever catching a frisbee. The background is a park.";
        let reply = parse_image_analysis(raw).unwrap();
        assert_eq!(reply, ProviderReply::Unstructured(raw.to_string()));
        let analysis = reply.into_analysis();
        assert_eq!(analysis.alt_text, "A golden retriever catching a frisbee.");
        assert_eq!(analysis.confidence, Confidence::Low);
        assert_eq!(analysis.description, raw);
    }

    #[test]
    fn test_failure_envelope() {
        let raw = r#"{"success": false, "error": "quota exceeded"}"#;
        match parse_image_analysis(raw) {
            Err(EngineError::Provider(msg)) => assert_eq!(msg, "quota exceeded"),
            other => panic!("expected provider error, got {:?}", other),
        }
        assert!(parse_content_findings(raw).is_err());
        assert!(parse_alt_text(raw).is_err());
    }

    #[test]
    fn test_content_findings_with_defaults() {
        let raw = r#"{"success": true, "issues": [
            {"type": "heading", "severity": "high", "description": "Headings are vague", "recommendation": "Be specific"},
            {"severity": "bogus", "description": "Link text says click here"},
            {"type": "semantic"},
            "not an object"
        ]}"#;
        let findings = parse_content_findings(raw).unwrap().into_findings();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].issue_type, Some(IssueType::Heading));
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[1].issue_type, None);
        assert_eq!(findings[1].severity, Severity::Medium);
        assert_eq!(findings[1].recommendation, DEFAULT_CONTENT_RECOMMENDATION);
    }

    #[test]
    fn test_content_bare_array_and_free_text() {
        let findings = parse_content_findings(r#"[{"description": "Dense paragraphs"}]"#)
            .unwrap()
            .into_findings();
        assert_eq!(findings.len(), 1);

        let reply = parse_content_findings("The content looks fine to me.").unwrap();
        assert!(!reply.is_structured());
        assert!(reply.into_findings().is_empty());
    }

    #[test]
    fn test_alt_text_reply_forms() {
        assert_eq!(parse_alt_text(r#"{"success": true, "altText": " Sunset over hills "}"#).unwrap().into_alt_text(), "Sunset over hills");
        assert_eq!(parse_alt_text("\"Sunset over hills\"").unwrap().into_alt_text(), "Sunset over hills");
        assert_eq!(parse_alt_text("").unwrap().into_alt_text(), PLACEHOLDER_ALT_TEXT);
    }
}
