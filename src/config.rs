// SPDX-License-Identifier: PMPL-1.0-or-later
//! Configuration handling for the accessibility engine

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// AI analysis settings
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Result cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Rule thresholds
    #[serde(default)]
    pub rules: RuleConfig,
}

/// AI analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Whether AI analysis is dispatched at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Budget for one image analysis (milliseconds)
    #[serde(default = "default_image_timeout")]
    pub image_timeout_ms: u64,

    /// Budget for the content critique (milliseconds)
    #[serde(default = "default_content_timeout")]
    pub content_timeout_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            image_timeout_ms: default_image_timeout(),
            content_timeout_ms: default_content_timeout(),
        }
    }
}

impl AnalysisConfig {
    pub fn image_timeout(&self) -> Duration {
        Duration::from_millis(self.image_timeout_ms)
    }

    pub fn content_timeout(&self) -> Duration {
        Duration::from_millis(self.content_timeout_ms)
    }
}

fn default_true() -> bool {
    true
}

fn default_image_timeout() -> u64 {
    15_000
}

fn default_content_timeout() -> u64 {
    20_000
}

/// Result cache configuration
///
/// Keys are fingerprints over a bounded, normalized slice of the input:
/// requests that agree on the first `fingerprint_chars` normalized characters
/// of content (and on their image list) share an entry. Raising the bound
/// tightens the key; it is never derived from the full content implicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of whole reports (seconds)
    #[serde(default = "default_report_ttl")]
    pub report_ttl_secs: u64,

    /// Lifetime of per-image analyses (seconds)
    #[serde(default = "default_image_analysis_ttl")]
    pub image_analysis_ttl_secs: u64,

    /// Lifetime of generated alt text (seconds)
    #[serde(default = "default_alt_text_ttl")]
    pub alt_text_ttl_secs: u64,

    /// Normalized content characters included in a report fingerprint
    #[serde(default = "default_fingerprint_chars")]
    pub fingerprint_chars: usize,

    /// Leading image bytes included in an image fingerprint
    #[serde(default = "default_fingerprint_image_bytes")]
    pub fingerprint_image_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            report_ttl_secs: default_report_ttl(),
            image_analysis_ttl_secs: default_image_analysis_ttl(),
            alt_text_ttl_secs: default_alt_text_ttl(),
            fingerprint_chars: default_fingerprint_chars(),
            fingerprint_image_bytes: default_fingerprint_image_bytes(),
        }
    }
}

fn default_report_ttl() -> u64 {
    1800 // 30 minutes
}

fn default_image_analysis_ttl() -> u64 {
    86_400 // 24 hours
}

fn default_alt_text_ttl() -> u64 {
    86_400
}

fn default_fingerprint_chars() -> usize {
    1000
}

fn default_fingerprint_image_bytes() -> usize {
    4096
}

/// Rule thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Alt text longer than this is reported
    #[serde(default = "default_max_alt_length")]
    pub max_alt_length: usize,

    /// Characters on each side of an image reference inspected for a textual equivalent
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Stripped characters in the window that count as a textual equivalent
    #[serde(default = "default_min_context_chars")]
    pub min_context_chars: usize,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            max_alt_length: default_max_alt_length(),
            context_window: default_context_window(),
            min_context_chars: default_min_context_chars(),
        }
    }
}

fn default_max_alt_length() -> usize {
    125
}

fn default_context_window() -> usize {
    200
}

fn default_min_context_chars() -> usize {
    50
}

/// Load configuration from a TOML file, falling back to defaults when absent
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)?
    } else {
        debug!("Config file not found at {}, using defaults", path.display());
        EngineConfig::default()
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;

    debug!(?config, "Loaded configuration");
    Ok(config)
}

/// Apply `A11Y_ENGINE_*` environment overrides
fn apply_env_overrides(config: &mut EngineConfig) -> Result<()> {
    if let Some(ms) = env_u64("A11Y_ENGINE_IMAGE_TIMEOUT_MS")? {
        config.analysis.image_timeout_ms = ms;
    }
    if let Some(ms) = env_u64("A11Y_ENGINE_CONTENT_TIMEOUT_MS")? {
        config.analysis.content_timeout_ms = ms;
    }
    if let Ok(value) = std::env::var("A11Y_ENGINE_ANALYSIS_ENABLED") {
        config.analysis.enabled = matches!(value.to_lowercase().as_str(), "1" | "true" | "yes");
    }
    Ok(())
}

fn env_u64(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| EngineError::Config(format!("{} must be an integer, got {:?}", name, value))),
        Err(_) => Ok(None),
    }
}

impl EngineConfig {
    /// Reject settings the pipeline cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.analysis.image_timeout_ms == 0 || self.analysis.content_timeout_ms == 0 {
            return Err(EngineError::Config("analysis timeouts must be positive".to_string()));
        }
        if self.cache.fingerprint_chars == 0 {
            return Err(EngineError::Config("cache.fingerprint_chars must be positive".to_string()));
        }
        if self.rules.max_alt_length == 0 {
            return Err(EngineError::Config("rules.max_alt_length must be positive".to_string()));
        }
        Ok(())
    }
}
