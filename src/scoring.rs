// SPDX-License-Identifier: PMPL-1.0-or-later
//! Compliance scoring.
//!
//! score = max(0, 100 - sum of severity weights over failed items)

use crate::model::{AccessibilityIssue, Severity, ValidationResult};

/// Anything that can deduct from the score
pub trait Penalty {
    /// Severity to deduct, `None` when the item does not count
    fn penalty(&self) -> Option<Severity>;
}

impl Penalty for ValidationResult {
    fn penalty(&self) -> Option<Severity> {
        (!self.passed).then_some(self.severity)
    }
}

impl Penalty for AccessibilityIssue {
    fn penalty(&self) -> Option<Severity> {
        Some(self.severity)
    }
}

/// Compute the 0-100 score for a set of results or issues
pub fn score<'a, T, I>(items: I) -> u8
where
    T: Penalty + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let deduction: u32 = items
        .into_iter()
        .filter_map(|item| item.penalty())
        .map(|severity| severity.weight())
        .sum();
    100u32.saturating_sub(deduction) as u8
}
