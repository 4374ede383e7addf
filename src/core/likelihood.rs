// src/core/likelihood.rs
//! Draw weights. A word's weight starts at its usefulness score and shrinks as
//! the user answers it well; failures win back weight, never past the score.
use crate::core::types::OutcomeCounts;

/// `1 + direct<10 + 0.5·direct[10,20) + 0.25·indirect − fail`.
pub fn history_score(counts: &OutcomeCounts) -> f64 {
    1.0 + counts.success_direct_under_10 as f64
        + 0.5 * counts.success_direct_between_10_and_20 as f64
        + 0.25
            * (counts.success_indirect_under_10 as f64
                + counts.success_indirect_between_10_and_20 as f64)
        - counts.fail as f64
}

pub fn likelihood(score: f64, counts: &OutcomeCounts) -> f64 {
    score / history_score(counts).max(1.0)
}

/// Likelihood with no history at all.
pub fn baseline_likelihood(score: f64) -> f64 {
    likelihood(score, &OutcomeCounts::default())
}

/// The per-user offset that gets stored: `likelihood(history) − baseline`.
pub fn delta_likelihood(score: f64, counts: &OutcomeCounts) -> f64 {
    likelihood(score, counts) - baseline_likelihood(score)
}
