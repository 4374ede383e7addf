use crate::config::{TrainerConfig, VowelTargets};
use crate::core::corpus::{WordCorpus, WordEntry};
use crate::core::puzzle::PuzzleConstructor;
use crate::core::selector::AdaptiveSelector;
use crate::core::types::{
    OverallReport, Puzzle, Submission, SubmissionReport, UserId, UserOverallStat, UserSummary,
    UserWordStat, WordIndex, WordReport,
};
use crate::error::{Result, TrainerError};
use crate::learning::MetricUpdateEngine;
use crate::persistence::FileStore;
use crate::store::{AggregateRecord, PerformanceStore, WordUpdate};
use rand::Rng;
use std::sync::Arc;

// The engine owns nothing mutable itself: the corpus is shared and read-only,
// per-user state lives in the store.
pub struct TrainerEngine<S: PerformanceStore> {
    corpus: Arc<WordCorpus>,
    store: S,
    metrics: MetricUpdateEngine,
    max_retries: u32,
    vowel_targets: VowelTargets,
}

impl TrainerEngine<FileStore> {
    /// Loads the corpus and opens the file-backed store named by `config`.
    pub fn from_config(config: &TrainerConfig) -> Result<Self> {
        config.validate()?;
        let corpus = WordCorpus::load(
            &config.corpus_path,
            config.dictionary_path.as_deref(),
            &config.corpus_options(),
        )?;
        let store = FileStore::open(&config.store_path)?;
        Ok(Self::new(Arc::new(corpus), store, config))
    }
}

impl<S: PerformanceStore> TrainerEngine<S> {
    pub fn new(corpus: Arc<WordCorpus>, store: S, config: &TrainerConfig) -> Self {
        Self {
            corpus,
            store,
            metrics: MetricUpdateEngine::new(config.fast_threshold_secs),
            max_retries: config.max_retries,
            vowel_targets: config.vowel_targets,
        }
    }

    pub fn corpus(&self) -> &Arc<WordCorpus> {
        &self.corpus
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn select_and_build_puzzle(&self, user: &UserId) -> Result<Puzzle> {
        self.select_and_build_puzzle_with(user, &mut rand::thread_rng())
    }

    pub fn select_and_build_puzzle_with<R: Rng + ?Sized>(
        &self,
        user: &UserId,
        rng: &mut R,
    ) -> Result<Puzzle> {
        let index = AdaptiveSelector::new(&self.corpus).select(&self.store, user, rng)?;
        self.build_puzzle_with(index, rng)
    }

    /// Builds a puzzle around a caller-chosen word, skipping selection.
    pub fn build_puzzle(&self, index: WordIndex) -> Result<Puzzle> {
        self.build_puzzle_with(index, &mut rand::thread_rng())
    }

    pub fn build_puzzle_with<R: Rng + ?Sized>(&self, index: WordIndex, rng: &mut R) -> Result<Puzzle> {
        PuzzleConstructor::new(&self.corpus, self.max_retries, self.vowel_targets).build(index, rng)
    }

    /// Records one finished round and reports what changed.
    pub fn process_submission(&self, user: &UserId, submission: &Submission) -> Result<SubmissionReport> {
        if !self.store.guarantees_atomic_updates() {
            return Err(TrainerError::NonAtomicStore);
        }

        let target = self.corpus.entry(submission.word_index)?;
        let resolution = self.metrics.resolve(&self.corpus, target, submission);
        let total_baseline = self.corpus.total_baseline_likelihood();

        let Some((entry, category, anagram)) = resolution.subject else {
            let overall = self.overall_stat(user)?;
            let word = self.word_stat(user, target)?;
            return Ok(SubmissionReport {
                outcome: resolution.outcome,
                is_in_dictionary: resolution.is_in_dictionary,
                is_in_top_1000: resolution.is_tracked,
                overall: OverallReport {
                    old_likelihood: total_baseline + overall.delta_likelihood,
                    old_average_success_time: overall.average_success_time,
                    ..Default::default()
                },
                target_word: word_report(target, &word, None),
                submitted_word: None,
            });
        };

        let prior_word = self.word_stat(user, entry)?;
        let prior_overall = self.overall_stat(user)?;
        let plan = self.metrics.plan(
            entry,
            &prior_word,
            &prior_overall,
            category,
            submission.elapsed_secs,
            anagram,
        );
        let previous = self.store.apply_update(user, &plan.update)?;
        log::info!(
            "user {user}: {:?} on {} ({:?}), likelihood {:.3} -> {:.3}",
            resolution.outcome,
            entry.primary(),
            category,
            plan.old_likelihood,
            plan.new_likelihood
        );

        let credited = word_report(entry, &previous.word, Some(&plan.update));
        let (target_word, submitted_word) = if entry.index == target.index {
            (credited, None)
        } else {
            let untouched = self.word_stat(user, target)?;
            (word_report(target, &untouched, None), Some(credited))
        };

        Ok(SubmissionReport {
            outcome: resolution.outcome,
            is_in_dictionary: resolution.is_in_dictionary,
            is_in_top_1000: resolution.is_tracked,
            overall: OverallReport {
                old_likelihood: total_baseline + previous.overall.delta_likelihood,
                change_in_likelihood: plan.update.delta_likelihood_change,
                old_average_success_time: previous.overall.average_success_time,
                change_in_average_success_time: plan.update.overall_average_time_change,
            },
            target_word,
            submitted_word,
        })
    }

    pub fn user_summary(&self, user: &UserId) -> Result<UserSummary> {
        let overall = self.overall_stat(user)?;
        let baseline_likelihood = self.corpus.total_baseline_likelihood();
        Ok(UserSummary {
            total_likelihood: baseline_likelihood + overall.delta_likelihood,
            baseline_likelihood,
            overall,
        })
    }

    fn overall_stat(&self, user: &UserId) -> Result<UserOverallStat> {
        let overall = self
            .store
            .overall_and_bucket_stats(user)?
            .into_iter()
            .find_map(|record| match record {
                AggregateRecord::Overall(stat) => Some(stat),
                AggregateRecord::Bucket { .. } => None,
            });
        Ok(overall.unwrap_or_default())
    }

    fn word_stat(&self, user: &UserId, entry: &WordEntry) -> Result<UserWordStat> {
        Ok(self
            .store
            .word_stats_for_bucket(user, entry.bucket_index)?
            .remove(&entry.index)
            .unwrap_or_default())
    }
}

/// Before/after view of one word. `update` is `None` when the submission left
/// the word alone.
fn word_report(entry: &WordEntry, before: &UserWordStat, update: Option<&WordUpdate>) -> WordReport {
    let mut anagram_counters = before.anagram_counters.clone();
    if let Some(anagram) = update.and_then(|u| u.anagram.as_ref()) {
        *anagram_counters.entry(anagram.clone()).or_insert(0) += 1;
    }
    WordReport {
        word_data: entry.data(),
        category: update.map(|u| u.category),
        old_likelihood: entry.baseline_likelihood + before.delta_likelihood,
        change_in_likelihood: update.map_or(0.0, |u| u.delta_likelihood_change),
        old_average_success_time: before.average_success_time,
        change_in_average_success_time: update.map_or(0.0, |u| u.word_average_time_change),
        anagram_counters,
    }
}
