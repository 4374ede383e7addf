// File: src/store/mod.rs
//! The per-user performance ledger and the contract any backing store meets.
use crate::core::types::{OutcomeCategory, UserId, UserOverallStat, UserWordStat, WordIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub mod memory;

pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("transaction rejected: {0}")]
    Rejected(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store lock poisoned")]
    Poisoned,
    #[error("failed to persist ledger to {path:?}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("ledger encoding error: {0}")]
    Codec(#[from] bincode::Error),
}

/// One aggregate row for a user: the overall totals or one bucket's delta sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AggregateRecord {
    Overall(UserOverallStat),
    Bucket { index: usize, delta_likelihood: f64 },
}

/// Everything one submission changes. All fields are additive so concurrent
/// transactions commute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordUpdate {
    pub word_index: WordIndex,
    pub bucket_index: usize,
    pub category: OutcomeCategory,
    /// Added to the word, its bucket and the overall delta.
    pub delta_likelihood_change: f64,
    pub word_average_time_change: f64,
    pub overall_average_time_change: f64,
    /// Surface form to credit in the word's anagram counters.
    pub anagram: Option<String>,
}

/// The three scopes as they were just before a transaction landed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviousValues {
    pub word: UserWordStat,
    pub bucket_delta_likelihood: f64,
    pub overall: UserOverallStat,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketLedger {
    pub delta_likelihood: f64,
    pub words: BTreeMap<WordIndex, UserWordStat>,
}

/// All stored state for one user, keyed the way the sampler reads it:
/// overall, then bucket, then word.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserLedger {
    pub overall: UserOverallStat,
    pub buckets: BTreeMap<usize, BucketLedger>,
}

impl UserLedger {
    pub fn aggregates(&self) -> Vec<AggregateRecord> {
        std::iter::once(AggregateRecord::Overall(self.overall.clone()))
            .chain(self.buckets.iter().map(|(&index, bucket)| AggregateRecord::Bucket {
                index,
                delta_likelihood: bucket.delta_likelihood,
            }))
            .collect()
    }

    pub fn words_in_bucket(&self, bucket: usize) -> BTreeMap<WordIndex, UserWordStat> {
        self.buckets
            .get(&bucket)
            .map(|b| b.words.clone())
            .unwrap_or_default()
    }

    /// Applies `update` to word, bucket and overall scopes together.
    pub fn apply(&mut self, update: &WordUpdate) -> PreviousValues {
        let bucket = self.buckets.entry(update.bucket_index).or_default();
        let word = bucket.words.entry(update.word_index).or_default();
        let previous = PreviousValues {
            word: word.clone(),
            bucket_delta_likelihood: bucket.delta_likelihood,
            overall: self.overall.clone(),
        };

        word.counts.record(update.category);
        word.delta_likelihood += update.delta_likelihood_change;
        word.average_success_time += update.word_average_time_change;
        if let Some(anagram) = &update.anagram {
            *word.anagram_counters.entry(anagram.clone()).or_insert(0) += 1;
        }
        bucket.delta_likelihood += update.delta_likelihood_change;

        self.overall.record(update.category);
        self.overall.delta_likelihood += update.delta_likelihood_change;
        self.overall.average_success_time += update.overall_average_time_change;

        previous
    }
}

/// Read/write contract for per-user performance data.
///
/// `apply_update` must land all three scopes or none of them.
pub trait PerformanceStore: Send + Sync {
    fn overall_and_bucket_stats(&self, user: &UserId) -> Result<Vec<AggregateRecord>, StoreError>;

    fn word_stats_for_bucket(
        &self,
        user: &UserId,
        bucket: usize,
    ) -> Result<BTreeMap<WordIndex, UserWordStat>, StoreError>;

    fn apply_update(&self, user: &UserId, update: &WordUpdate) -> Result<PreviousValues, StoreError>;

    /// Whether `apply_update` is all-or-nothing. Writers refuse stores that
    /// answer `false`.
    fn guarantees_atomic_updates(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(word_index: WordIndex, bucket_index: usize, change: f64) -> WordUpdate {
        WordUpdate {
            word_index,
            bucket_index,
            category: OutcomeCategory::SuccessDirectUnder10,
            delta_likelihood_change: change,
            word_average_time_change: 4.0,
            overall_average_time_change: 4.0,
            anagram: Some("MAIDENS".to_string()),
        }
    }

    #[test]
    fn apply_moves_all_three_scopes_and_returns_prior_state() {
        let mut ledger = UserLedger::default();
        let first = ledger.apply(&update(891, 22, -400.0));
        assert_eq!(first, PreviousValues::default());

        let second = ledger.apply(&update(891, 22, -133.0));
        assert_eq!(second.word.counts.success_direct_under_10, 1);
        assert_eq!(second.bucket_delta_likelihood, -400.0);
        assert_eq!(second.overall.success_direct_under_10, 1);

        let word = &ledger.buckets[&22].words[&891];
        assert_eq!(word.counts.success_direct_under_10, 2);
        assert_eq!(word.delta_likelihood, -533.0);
        assert_eq!(word.anagram_counters["MAIDENS"], 2);
        assert_eq!(ledger.buckets[&22].delta_likelihood, -533.0);
        assert_eq!(ledger.overall.delta_likelihood, -533.0);
        assert_eq!(ledger.overall.average_success_time, 8.0);
    }

    #[test]
    fn aggregates_list_overall_then_buckets() {
        let mut ledger = UserLedger::default();
        ledger.apply(&update(1, 0, -1.0));
        ledger.apply(&update(50, 1, -2.0));
        let aggregates = ledger.aggregates();
        assert!(matches!(aggregates[0], AggregateRecord::Overall(_)));
        assert_eq!(
            aggregates[2],
            AggregateRecord::Bucket { index: 1, delta_likelihood: -2.0 }
        );
        assert!(ledger.words_in_bucket(7).is_empty());
    }
}
