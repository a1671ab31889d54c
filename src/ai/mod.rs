// SPDX-License-Identifier: PMPL-1.0-or-later
//! AI analysis boundary.
//!
//! `AiProvider` is the transport-facing collaborator: it returns raw reply
//! text and may fail or hang. `AnalysisAdapter` wraps it with per-task
//! timeouts, reply parsing and placeholder fallbacks so nothing on this
//! side of the boundary can fail a report.

pub mod adapter;
pub mod parse;

pub use adapter::{AiFindings, AnalysisAdapter, ImageTask, TaskOutcome, TaskStatus};
pub use parse::{ContentFinding, ProviderReply};

use crate::error::{EngineError, Result};
use async_trait::async_trait;

/// External AI capability producing accessibility findings.
///
/// Image payloads are base64 encoded. Replies are returned as raw text; they
/// are expected to contain JSON but need not.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Short alt text for an image
    async fn generate_alt_text(&self, image_base64: &str, mime_type: &str) -> Result<String>;

    /// Full accessibility analysis of an image
    async fn analyze_image(&self, image_base64: &str, mime_type: &str, context: Option<&str>) -> Result<String>;

    /// Accessibility critique of the content as a whole
    async fn analyze_content_accessibility(&self, content: &str) -> Result<String>;
}

/// Provider used when no AI backend is configured; every call fails
#[derive(Debug, Clone, Default)]
pub struct UnavailableProvider;

#[async_trait]
impl AiProvider for UnavailableProvider {
    async fn generate_alt_text(&self, _image_base64: &str, _mime_type: &str) -> Result<String> {
        Err(EngineError::Provider("no AI provider configured".to_string()))
    }

    async fn analyze_image(&self, _image_base64: &str, _mime_type: &str, _context: Option<&str>) -> Result<String> {
        Err(EngineError::Provider("no AI provider configured".to_string()))
    }

    async fn analyze_content_accessibility(&self, _content: &str) -> Result<String> {
        Err(EngineError::Provider("no AI provider configured".to_string()))
    }
}
