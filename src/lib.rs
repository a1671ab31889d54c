// SPDX-License-Identifier: PMPL-1.0-or-later
//! accessibility-engine - Accessibility compliance engine for markup content
//!
//! Evaluates content (HTML-like markup plus an ordered image list) and
//! produces a 0-100 compliance score, a list of actionable issues and
//! deduplicated suggestions.
//!
//! # Pipeline
//!
//! ```text
//! content + images ─┬→ RuleValidator ───────────┬→ merge → score → suggest → report
//!                   └→ AnalysisAdapter (AI) ────┘            (wrapped by ResultCache)
//! ```
//!
//! ## Rules
//!
//! - **Alt Text** (1.1.1): missing, over-long and generic alternative text
//! - **Headings** (1.3.1): single H1, adjacent-level hierarchy, empty headings
//! - **Contrast** (1.4.3): inline color pairs below 4.5:1
//! - **Structure** (1.3.1): empty lists, tables without header cells
//! - **ARIA** (4.1.2): unnamed controls, unknown `aria-*` attributes
//!
//! AI analysis is optional: provider failures and timeouts degrade to
//! placeholders and never fail a report.

pub mod ai;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod merge;
pub mod model;
pub mod report;
pub mod rules;
pub mod scoring;
pub mod suggest;

pub use config::EngineConfig;
pub use engine::ComplianceEngine;
pub use error::{EngineError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ai::{AiProvider, UnavailableProvider};
    pub use crate::config::{load_config, EngineConfig};
    pub use crate::engine::ComplianceEngine;
    pub use crate::error::{EngineError, Result};
    pub use crate::model::{AccessibilityIssue, AccessibilityReport, ImageDescriptor, IssueType, Severity};
    pub use crate::report::{render, OutputFormat};
}
