// SPDX-License-Identifier: PMPL-1.0-or-later
//! Timed, failure-isolating wrapper around an `AiProvider`.
//!
//! Every operation here returns a value: provider errors, unreadable replies
//! and timeouts degrade to placeholders and are recorded in the task status.

use super::parse::{self, ContentFinding};
use super::AiProvider;
use crate::cache::{image_fingerprint, ResultCache};
use crate::config::{AnalysisConfig, CacheConfig};
use crate::error::EngineError;
use crate::model::{ImageAnalysis, PLACEHOLDER_ALT_TEXT};
use crate::rules::markup::clip_chars;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, debug_span, warn, Instrument};

/// How an AI task settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// The provider answered in time
    Completed,
    /// The provider returned an error
    Failed(String),
    /// The provider did not answer within the budget
    TimedOut,
    /// Nothing to analyze, or analysis disabled
    Skipped,
    /// Served from the image cache
    Cached,
}

impl TaskStatus {
    /// Whether the value is a real analysis rather than a placeholder
    pub fn is_real(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cached)
    }

    /// The provider was asked and did not deliver
    pub fn is_degraded(&self) -> bool {
        matches!(self, TaskStatus::Failed(_) | TaskStatus::TimedOut)
    }
}

/// A settled AI task: its value (possibly a placeholder) and how it settled
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome<T> {
    pub value: T,
    pub status: TaskStatus,
}

impl<T> TaskOutcome<T> {
    pub fn new(value: T, status: TaskStatus) -> Self {
        Self { value, status }
    }

    pub fn is_real(&self) -> bool {
        self.status.is_real()
    }
}

/// One image to analyze, identified by its inventory position
#[derive(Debug, Clone)]
pub struct ImageTask {
    pub index: usize,
    pub src: String,
    pub data: Option<Vec<u8>>,
    pub mime_type: String,
    /// Stripped text around the image reference
    pub context: Option<String>,
}

/// Everything the AI path produced for one request.
///
/// `images[i]` belongs to the i-th dispatched `ImageTask`, whatever order the
/// tasks finished in.
#[derive(Debug, Clone, PartialEq)]
pub struct AiFindings {
    pub images: Vec<TaskOutcome<ImageAnalysis>>,
    pub content: TaskOutcome<Vec<ContentFinding>>,
}

impl AiFindings {
    /// Placeholders for every task, used when the AI path could not run at all
    pub fn unavailable(image_count: usize, status: TaskStatus) -> Self {
        Self {
            images: (0..image_count)
                .map(|_| TaskOutcome::new(ImageAnalysis::placeholder(), status.clone()))
                .collect(),
            content: TaskOutcome::new(Vec::new(), status),
        }
    }

    /// Number of image tasks that produced a real analysis
    pub fn real_image_count(&self) -> usize {
        self.images.iter().filter(|o| o.is_real()).count()
    }

    /// Whether any task fell back to a placeholder after a failure or timeout
    pub fn is_degraded(&self) -> bool {
        self.content.status.is_degraded() || self.images.iter().any(|o| o.status.is_degraded())
    }
}

/// Outcome of a timed provider call
enum Call<T> {
    Answered(T),
    Failed(String),
    TimedOut,
}

/// Runs provider calls under per-task timeouts with placeholder fallbacks
#[derive(Clone)]
pub struct AnalysisAdapter {
    provider: Arc<dyn AiProvider>,
    config: AnalysisConfig,
    image_cache: ResultCache<ImageAnalysis>,
    alt_text_cache: ResultCache<String>,
    image_ttl: Duration,
    alt_text_ttl: Duration,
    fingerprint_bytes: usize,
}

impl AnalysisAdapter {
    pub fn new(provider: Arc<dyn AiProvider>, config: AnalysisConfig, cache: &CacheConfig) -> Self {
        Self {
            provider,
            config,
            image_cache: ResultCache::new("image-analysis"),
            alt_text_cache: ResultCache::new("alt-text"),
            image_ttl: Duration::from_secs(cache.image_analysis_ttl_secs),
            alt_text_ttl: Duration::from_secs(cache.alt_text_ttl_secs),
            fingerprint_bytes: cache.fingerprint_image_bytes,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Handle on the per-image analysis cache
    pub fn image_cache(&self) -> &ResultCache<ImageAnalysis> {
        &self.image_cache
    }

    /// Handle on the generated alt text cache
    pub fn alt_text_cache(&self) -> &ResultCache<String> {
        &self.alt_text_cache
    }

    pub fn clear_caches(&self) {
        self.image_cache.clear();
        self.alt_text_cache.clear();
    }

    async fn timed<F>(&self, budget: Duration, call: F) -> Call<String>
    where
        F: Future<Output = crate::error::Result<String>>,
    {
        match tokio::time::timeout(budget, call).await {
            Ok(Ok(raw)) => Call::Answered(raw),
            Ok(Err(e)) => Call::Failed(e.to_string()),
            Err(_) => Call::TimedOut,
        }
    }

    /// Analyze one image; never fails
    pub async fn analyze_image(&self, data: &[u8], mime_type: &str, context: Option<&str>) -> TaskOutcome<ImageAnalysis> {
        let key = image_fingerprint(data, mime_type, self.fingerprint_bytes);
        if let Some(cached) = self.image_cache.get(&key) {
            return TaskOutcome::new(cached, TaskStatus::Cached);
        }

        let encoded = STANDARD.encode(data);
        let budget = self.config.image_timeout();
        let call = self.provider.analyze_image(&encoded, mime_type, context);

        match self.timed(budget, call).await {
            Call::Answered(raw) => match parse::parse_image_analysis(&raw) {
                Ok(reply) => {
                    if !reply.is_structured() {
                        debug!(mime_type, "Image analysis reply was not JSON, deriving from text");
                    }
                    let analysis = reply.into_analysis();
                    self.image_cache.set(key, analysis.clone(), self.image_ttl);
                    TaskOutcome::new(analysis, TaskStatus::Completed)
                }
                Err(e) => {
                    warn!(error = %e, "Image analysis rejected by provider, using placeholder");
                    TaskOutcome::new(ImageAnalysis::placeholder(), TaskStatus::Failed(e.to_string()))
                }
            },
            Call::Failed(reason) => {
                warn!(error = %reason, "Image analysis failed, using placeholder");
                TaskOutcome::new(ImageAnalysis::placeholder(), TaskStatus::Failed(reason))
            }
            Call::TimedOut => {
                warn!(error = %EngineError::Timeout(budget), "Image analysis timed out, using placeholder");
                TaskOutcome::new(ImageAnalysis::placeholder(), TaskStatus::TimedOut)
            }
        }
    }

    /// Critique the content as a whole; never fails
    pub async fn analyze_content(&self, content: &str) -> TaskOutcome<Vec<ContentFinding>> {
        let budget = self.config.content_timeout();
        let call = self.provider.analyze_content_accessibility(content);

        match self.timed(budget, call).await {
            Call::Answered(raw) => match parse::parse_content_findings(&raw) {
                Ok(reply) => {
                    if !reply.is_structured() {
                        warn!("Content analysis reply was not JSON, no findings taken");
                    }
                    TaskOutcome::new(reply.into_findings(), TaskStatus::Completed)
                }
                Err(e) => {
                    warn!(error = %e, "Content analysis rejected by provider");
                    TaskOutcome::new(Vec::new(), TaskStatus::Failed(e.to_string()))
                }
            },
            Call::Failed(reason) => {
                warn!(error = %reason, "Content analysis failed");
                TaskOutcome::new(Vec::new(), TaskStatus::Failed(reason))
            }
            Call::TimedOut => {
                warn!(error = %EngineError::Timeout(budget), "Content analysis timed out");
                TaskOutcome::new(Vec::new(), TaskStatus::TimedOut)
            }
        }
    }

    /// Alt text for raw image bytes, cut to `max_chars`; never fails.
    ///
    /// The cache keeps the full text so each caller gets its own limit.
    pub async fn generate_alt_text(&self, data: &[u8], mime_type: &str, max_chars: usize) -> TaskOutcome<String> {
        let key = image_fingerprint(data, mime_type, self.fingerprint_bytes);
        if let Some(cached) = self.alt_text_cache.get(&key) {
            return TaskOutcome::new(clip_chars(&cached, max_chars), TaskStatus::Cached);
        }

        let encoded = STANDARD.encode(data);
        let budget = self.config.image_timeout();
        let call = self.provider.generate_alt_text(&encoded, mime_type);

        let status = match self.timed(budget, call).await {
            Call::Answered(raw) => match parse::parse_alt_text(&raw) {
                Ok(reply) => {
                    let alt = reply.into_alt_text();
                    let clipped = clip_chars(&alt, max_chars);
                    self.alt_text_cache.set(key, alt, self.alt_text_ttl);
                    return TaskOutcome::new(clipped, TaskStatus::Completed);
                }
                Err(e) => TaskStatus::Failed(e.to_string()),
            },
            Call::Failed(reason) => TaskStatus::Failed(reason),
            Call::TimedOut => TaskStatus::TimedOut,
        };

        warn!(?status, "Alt text generation failed, using placeholder");
        TaskOutcome::new(PLACEHOLDER_ALT_TEXT.to_string(), status)
    }

    /// Run every image analysis and the content critique concurrently.
    ///
    /// Returns once every task has settled. Images without data are skipped
    /// without a provider call.
    pub async fn dispatch(&self, tasks: Vec<ImageTask>, content: String) -> AiFindings {
        if !self.config.enabled {
            debug!("AI analysis disabled");
            return AiFindings::unavailable(tasks.len(), TaskStatus::Skipped);
        }

        let content_handle = {
            let adapter = self.clone();
            tokio::spawn(async move { adapter.analyze_content(&content).await }.instrument(debug_span!("content_analysis")))
        };

        let mut image_handles = Vec::with_capacity(tasks.len());
        for task in tasks {
            let Some(data) = task.data.filter(|d| !d.is_empty()) else {
                debug!(index = task.index, src = %task.src, "No image data, skipping analysis");
                image_handles.push(None);
                continue;
            };
            let adapter = self.clone();
            let mime_type = task.mime_type;
            let context = task.context;
            let span = debug_span!("image_analysis", index = task.index, src = %task.src);
            image_handles.push(Some(tokio::spawn(
                async move { adapter.analyze_image(&data, &mime_type, context.as_deref()).await }.instrument(span),
            )));
        }

        // Awaited in dispatch order so results line up with the tasks
        let mut images = Vec::with_capacity(image_handles.len());
        for handle in image_handles {
            let outcome = match handle {
                None => TaskOutcome::new(ImageAnalysis::placeholder(), TaskStatus::Skipped),
                Some(handle) => handle.await.unwrap_or_else(|e| {
                    warn!(error = %e, "Image analysis task aborted");
                    TaskOutcome::new(ImageAnalysis::placeholder(), TaskStatus::Failed(e.to_string()))
                }),
            };
            images.push(outcome);
        }

        let content = content_handle.await.unwrap_or_else(|e| {
            warn!(error = %e, "Content analysis task aborted");
            TaskOutcome::new(Vec::new(), TaskStatus::Failed(e.to_string()))
        });

        AiFindings { images, content }
    }
}
