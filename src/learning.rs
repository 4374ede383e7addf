// File: src/learning.rs
use crate::core::corpus::{WordCorpus, WordEntry};
use crate::core::likelihood::likelihood;
use crate::core::types::{OutcomeCategory, Submission, SubmissionOutcome, UserOverallStat, UserWordStat};
use crate::store::WordUpdate;

/// Which record a submission lands on, and how.
#[derive(Debug, Clone)]
pub struct Resolution<'c> {
    pub outcome: SubmissionOutcome,
    /// The entry credited or failed, with the category and the surface form
    /// that was produced. `None` when nothing is recorded.
    pub subject: Option<(&'c WordEntry, OutcomeCategory, Option<String>)>,
    pub is_in_dictionary: bool,
    pub is_tracked: bool,
}

/// The changes one attempt makes, ready for the store.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPlan {
    pub update: WordUpdate,
    pub old_likelihood: f64,
    pub new_likelihood: f64,
}

pub struct MetricUpdateEngine {
    fast_threshold_secs: f64,
}

impl MetricUpdateEngine {
    pub fn new(fast_threshold_secs: f64) -> Self {
        Self { fast_threshold_secs }
    }

    /// Classifies a submission against `target`. First match wins: a target
    /// anagram, an explicit fail, another tracked word, a known untracked
    /// word, and finally anything else counts as a fail.
    pub fn resolve<'c>(
        &self,
        corpus: &'c WordCorpus,
        target: &'c WordEntry,
        submission: &Submission,
    ) -> Resolution<'c> {
        let submitted = submission.submitted_word.trim().to_ascii_uppercase();
        let is_target_form = submission
            .target_anagrams
            .iter()
            .any(|form| form.trim().eq_ignore_ascii_case(&submitted));
        let tracked = corpus.entry_for_surface(&submitted);
        let is_in_dictionary = corpus.is_dictionary_word(&submitted);

        let (outcome, subject) = if !submitted.is_empty() && is_target_form {
            let category = OutcomeCategory::success(true, submission.elapsed_secs, self.fast_threshold_secs);
            (SubmissionOutcome::DirectSuccess, Some((target, category, Some(submitted))))
        } else if submission.is_failed {
            (SubmissionOutcome::Failed, Some((target, OutcomeCategory::Fail, None)))
        } else if let Some(entry) = tracked {
            let direct = entry.index == target.index;
            let category =
                OutcomeCategory::success(direct, submission.elapsed_secs, self.fast_threshold_secs);
            let outcome = if direct {
                SubmissionOutcome::DirectSuccess
            } else {
                SubmissionOutcome::IndirectSuccess
            };
            (outcome, Some((entry, category, Some(submitted))))
        } else if is_in_dictionary {
            (SubmissionOutcome::UntrackedWord, None)
        } else {
            log::warn!(
                "submission {:?} for word {} is neither a known word nor flagged failed; recording a fail",
                submission.submitted_word,
                target.index
            );
            (
                SubmissionOutcome::UnrecognizedTreatedAsFail,
                Some((target, OutcomeCategory::Fail, None)),
            )
        };

        Resolution {
            outcome,
            subject,
            is_in_dictionary: is_in_dictionary || tracked.is_some(),
            is_tracked: tracked.is_some(),
        }
    }

    /// Works out the additive changes for one attempt on `entry`, given the
    /// user's prior word and overall state.
    pub fn plan(
        &self,
        entry: &WordEntry,
        word: &UserWordStat,
        overall: &UserOverallStat,
        category: OutcomeCategory,
        elapsed_secs: f64,
        anagram: Option<String>,
    ) -> MetricPlan {
        let old_likelihood = entry.baseline_likelihood + word.delta_likelihood;
        let new_likelihood = likelihood(entry.baseline_score, &word.counts.with(category));
        let delta_likelihood_change = new_likelihood - entry.baseline_likelihood - word.delta_likelihood;

        let (word_average_time_change, overall_average_time_change) = if category.is_success() {
            (
                average_change(word.counts.successes(), word.average_success_time, elapsed_secs),
                average_change(overall.successes(), overall.average_success_time, elapsed_secs),
            )
        } else {
            (0.0, 0.0)
        };

        MetricPlan {
            update: WordUpdate {
                word_index: entry.index,
                bucket_index: entry.bucket_index,
                category,
                delta_likelihood_change,
                word_average_time_change,
                overall_average_time_change,
                anagram,
            },
            old_likelihood,
            new_likelihood,
        }
    }
}

/// Change in a running mean over `prior_count` samples when `sample` joins it.
fn average_change(prior_count: u32, old_average: f64, sample: f64) -> f64 {
    let n = prior_count as f64;
    (n * old_average + sample) / (n + 1.0) - old_average
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::corpus::tests::row;
    use crate::core::corpus::CorpusOptions;
    use crate::core::types::OutcomeCounts;

    fn corpus() -> WordCorpus {
        WordCorpus::from_rows(
            vec![
                row(889, "RETAINS/NASTIER/RETINAS", 900.0),
                row(890, "DREAMS", 850.0),
                row(891, "MAIDENS/MEDIANS/MEDINAS/SIDEMAN", 800.0),
                row(2000, "ADMINS", 10.0),
            ],
            vec!["DENIMS".to_string()],
            &CorpusOptions { tracked_limit: 3, bucket_size: 2 },
        )
        .unwrap()
    }

    fn submission(word: &str, elapsed_secs: f64, is_failed: bool) -> Submission {
        Submission {
            word_index: 891,
            target_anagrams: ["MAIDENS", "MEDIANS", "MEDINAS", "SIDEMAN"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            submitted_word: word.to_string(),
            elapsed_secs,
            is_failed,
        }
    }

    #[test]
    fn resolves_in_priority_order() {
        let corpus = corpus();
        let target = corpus.entry(891).unwrap();
        let engine = MetricUpdateEngine::new(10.0);

        let direct = engine.resolve(&corpus, target, &submission("maidens", 8.8, false));
        assert_eq!(direct.outcome, SubmissionOutcome::DirectSuccess);
        let (entry, category, anagram) = direct.subject.clone().unwrap();
        assert_eq!(entry.index, 891);
        assert_eq!(category, OutcomeCategory::SuccessDirectUnder10);
        assert_eq!(anagram.as_deref(), Some("MAIDENS"));

        // A target anagram wins even when the caller also flagged a fail.
        let late = engine.resolve(&corpus, target, &submission("SIDEMAN", 14.0, true));
        assert_eq!(late.subject.unwrap().1, OutcomeCategory::SuccessDirectBetween10And20);

        let failed = engine.resolve(&corpus, target, &submission("DREAMS", 3.0, true));
        assert_eq!(failed.outcome, SubmissionOutcome::Failed);
        assert_eq!(failed.subject.unwrap().1, OutcomeCategory::Fail);

        let indirect = engine.resolve(&corpus, target, &submission("DREAMS", 12.0, false));
        assert_eq!(indirect.outcome, SubmissionOutcome::IndirectSuccess);
        let (entry, category, _) = indirect.subject.unwrap();
        assert_eq!(entry.index, 890);
        assert_eq!(category, OutcomeCategory::SuccessIndirectBetween10And20);

        for word in ["ADMINS", "DENIMS"] {
            let untracked = engine.resolve(&corpus, target, &submission(word, 5.0, false));
            assert_eq!(untracked.outcome, SubmissionOutcome::UntrackedWord);
            assert!(untracked.subject.is_none());
            assert!(untracked.is_in_dictionary);
            assert!(!untracked.is_tracked);
        }

        let junk = engine.resolve(&corpus, target, &submission("MSDNIAE", 5.0, false));
        assert_eq!(junk.outcome, SubmissionOutcome::UnrecognizedTreatedAsFail);
        assert_eq!(junk.subject.unwrap().0.index, 891);
        assert!(!junk.is_in_dictionary);
    }

    #[test]
    fn first_fast_direct_success_halves_likelihood() {
        let corpus = corpus();
        let entry = corpus.entry(891).unwrap();
        let engine = MetricUpdateEngine::new(10.0);
        let plan = engine.plan(
            entry,
            &UserWordStat::default(),
            &UserOverallStat::default(),
            OutcomeCategory::SuccessDirectUnder10,
            8.8,
            Some("MAIDENS".into()),
        );

        assert_eq!(plan.old_likelihood, 800.0);
        assert_eq!(plan.new_likelihood, 400.0);
        assert_eq!(plan.update.delta_likelihood_change, -400.0);
        assert_eq!(plan.update.bucket_index, 1);
        assert!((plan.update.word_average_time_change - 8.8).abs() < 1e-12);
        assert!((plan.update.overall_average_time_change - 8.8).abs() < 1e-12);
    }

    #[test]
    fn averages_use_prior_success_counts_only() {
        let corpus = corpus();
        let entry = corpus.entry(891).unwrap();
        let engine = MetricUpdateEngine::new(10.0);
        let word = UserWordStat {
            counts: OutcomeCounts {
                success_direct_under_10: 1,
                success_indirect_between_10_and_20: 1,
                fail: 5,
                ..Default::default()
            },
            average_success_time: 9.0,
            ..Default::default()
        };
        let overall = UserOverallStat {
            success_direct_under_10: 3,
            fail: 9,
            average_success_time: 6.0,
            ..Default::default()
        };

        let plan = engine.plan(entry, &word, &overall, OutcomeCategory::SuccessDirectUnder10, 3.0, None);
        // (2·9 + 3) / 3 = 7 and (3·6 + 3) / 4 = 5.25
        assert!((plan.update.word_average_time_change - -2.0).abs() < 1e-12);
        assert!((plan.update.overall_average_time_change - -0.75).abs() < 1e-12);

        let fail = engine.plan(entry, &word, &overall, OutcomeCategory::Fail, 3.0, None);
        assert_eq!(fail.update.word_average_time_change, 0.0);
        assert_eq!(fail.update.overall_average_time_change, 0.0);
    }

    #[test]
    fn delta_change_restores_the_exact_offset() {
        let corpus = corpus();
        let entry = corpus.entry(889).unwrap();
        let engine = MetricUpdateEngine::new(10.0);
        let mut word = UserWordStat::default();
        let overall = UserOverallStat::default();

        for category in [
            OutcomeCategory::SuccessDirectUnder10,
            OutcomeCategory::SuccessDirectBetween10And20,
            OutcomeCategory::Fail,
            OutcomeCategory::SuccessIndirectUnder10,
            OutcomeCategory::Fail,
            OutcomeCategory::Fail,
            OutcomeCategory::Fail,
        ] {
            let plan = engine.plan(entry, &word, &overall, category, 4.0, None);
            word.delta_likelihood += plan.update.delta_likelihood_change;
            word.counts.record(category);
            let expected = likelihood(entry.baseline_score, &word.counts) - entry.baseline_likelihood;
            assert!((word.delta_likelihood - expected).abs() < 1e-9);
            assert!(word.delta_likelihood <= 1e-9);
        }
    }
}
