// SPDX-License-Identifier: PMPL-1.0-or-later
//! The compliance engine.
//!
//! One request runs `validate ∥ analyze → merge → score → suggest`, wrapped
//! by the report cache. Only missing input is reported as an error; every
//! AI failure degrades to reduced coverage.

use crate::ai::{AiFindings, AiProvider, AnalysisAdapter, ImageTask, TaskStatus};
use crate::cache::{report_fingerprint, ResultCache};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::merge::{self, image_context};
use crate::model::{AccessibilityReport, ImageAnalysisEntry, ImageDescriptor, ValidationRule};
use crate::rules::images::{self as image_inventory, InventoryImage};
use crate::rules::RuleValidator;
use crate::{scoring, suggest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Accessibility compliance engine
pub struct ComplianceEngine {
    config: EngineConfig,
    validator: RuleValidator,
    adapter: AnalysisAdapter,
    report_cache: ResultCache<AccessibilityReport>,
}

impl ComplianceEngine {
    pub fn new(config: EngineConfig, provider: Arc<dyn AiProvider>) -> Self {
        let validator = RuleValidator::new(config.rules.clone());
        let adapter = AnalysisAdapter::new(provider, config.analysis.clone(), &config.cache);
        Self {
            config,
            validator,
            adapter,
            report_cache: ResultCache::new("report"),
        }
    }

    /// Use a shared report cache, e.g. one handle across several engines
    pub fn with_report_cache(mut self, cache: ResultCache<AccessibilityReport>) -> Self {
        self.report_cache = cache;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The rule catalog
    pub fn rules(&self) -> &'static [ValidationRule] {
        self.validator.rules()
    }

    pub fn report_cache(&self) -> &ResultCache<AccessibilityReport> {
        &self.report_cache
    }

    pub fn adapter(&self) -> &AnalysisAdapter {
        &self.adapter
    }

    /// Check content and its images, returning a scored report
    pub async fn check_content(&self, content: &str, images: &[ImageDescriptor]) -> Result<AccessibilityReport> {
        if content.is_empty() {
            return Err(EngineError::MissingContent);
        }
        info!(content_len = content.len(), images = images.len(), "Checking content");

        let key = report_fingerprint(
            content,
            images,
            self.config.cache.fingerprint_chars,
            self.config.cache.fingerprint_image_bytes,
        );
        if let Some(report) = self.report_cache.get(&key) {
            info!(score = report.score, issues = report.issues.len(), "Served report from cache");
            return Ok(report);
        }

        let inventory = image_inventory::inventory(content, images);
        let tasks = self.image_tasks(content, &inventory, images);
        let task_count = tasks.len();
        debug!(images = task_count, "Dispatching AI analysis");

        let adapter = self.adapter.clone();
        let owned_content = content.to_string();
        let analysis = tokio::spawn(async move { adapter.dispatch(tasks, owned_content).await });

        // Rules run while the AI tasks are in flight
        let results = self.validator.validate(content, images);

        let findings = analysis.await.unwrap_or_else(|e| {
            warn!(error = %e, "AI analysis aborted, continuing with rule results only");
            AiFindings::unavailable(task_count, TaskStatus::Failed(e.to_string()))
        });

        let issues = merge::merge(content, &results, &inventory, &findings, &self.config.rules);
        let score = scoring::score(&issues);
        let suggestions = suggest::suggestions(&issues, &findings.images);

        let analyses: Vec<ImageAnalysisEntry> = inventory
            .iter()
            .zip(&findings.images)
            .filter(|(_, outcome)| outcome.status != TaskStatus::Skipped)
            .map(|(image, outcome)| ImageAnalysisEntry { src: image.src.clone(), analysis: outcome.value.clone() })
            .collect();

        let report = AccessibilityReport {
            score,
            issues,
            suggestions,
            image_analyses: (!analyses.is_empty()).then_some(analyses),
        };

        info!(
            score = report.score,
            issues = report.issues.len(),
            analyzed_images = findings.real_image_count(),
            content_analysis = ?findings.content.status,
            "Content checked"
        );

        if findings.is_degraded() {
            debug!("AI coverage incomplete, report not cached");
        } else {
            self.report_cache
                .set(key, report.clone(), Duration::from_secs(self.config.cache.report_ttl_secs));
        }
        Ok(report)
    }

    fn image_tasks(&self, content: &str, inventory: &[InventoryImage], images: &[ImageDescriptor]) -> Vec<ImageTask> {
        inventory
            .iter()
            .enumerate()
            .map(|(index, image)| {
                let descriptor = image.descriptor_index.and_then(|i| images.get(i));
                ImageTask {
                    index,
                    src: image.src.clone(),
                    data: descriptor.and_then(|d| d.data.clone()),
                    mime_type: descriptor
                        .map(ImageDescriptor::effective_mime_type)
                        .unwrap_or_else(|| ImageDescriptor::new(image.src.as_str()).effective_mime_type()),
                    context: image_context(content, &image.src, self.config.rules.context_window)
                        .filter(|c| !c.is_empty()),
                }
            })
            .collect()
    }

    /// Alt text for raw image bytes; falls back to a generic placeholder
    pub async fn generate_alt_text(&self, data: &[u8], mime_type: &str) -> Result<String> {
        if data.is_empty() {
            return Err(EngineError::MissingImageData);
        }
        let outcome = self
            .adapter
            .generate_alt_text(data, mime_type, self.config.rules.max_alt_length)
            .await;
        debug!(status = ?outcome.status, "Alt text generated");
        Ok(outcome.value)
    }

    /// Drop every cached report, image analysis and alt text
    pub fn clear_caches(&self) {
        self.report_cache.clear();
        self.adapter.clear_caches();
    }

    /// Remove expired entries from every cache
    pub fn purge_expired(&self) -> usize {
        self.report_cache.purge_expired()
            + self.adapter.image_cache().purge_expired()
            + self.adapter.alt_text_cache().purge_expired()
    }
}
