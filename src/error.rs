// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for the accessibility engine
//!
//! Only `MissingContent` and `MissingImageData` ever reach a caller of the
//! engine. Provider failures and timeouts are absorbed by the analysis
//! adapter and replaced with placeholder values.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No content supplied")]
    MissingContent,

    #[error("No image data supplied")]
    MissingImageData,

    #[error("AI provider error: {0}")]
    Provider(String),

    #[error("AI provider did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl EngineError {
    /// Whether this is a precondition failure the caller must fix
    pub fn is_precondition(&self) -> bool {
        matches!(self, EngineError::MissingContent | EngineError::MissingImageData)
    }
}
