// src/core/types.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The 1-based rank of a word in the corpus. Stable and never reused.
pub type WordIndex = u32;

/// A player identity, as issued by whatever authenticates the caller.
pub type UserId = str;

/// The public face of a corpus entry, as shown to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordData {
    pub index: WordIndex,
    /// All accepted surface forms. `anagrams[0]` is the canonical form.
    pub anagrams: Vec<String>,
    pub length: usize,
}

/// How a single attempt on a word went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutcomeCategory {
    SuccessDirectUnder10,
    SuccessDirectBetween10And20,
    SuccessIndirectUnder10,
    SuccessIndirectBetween10And20,
    Fail,
}

impl OutcomeCategory {
    /// Picks the success bucket for an answer found after `elapsed_secs`.
    pub fn success(direct: bool, elapsed_secs: f64, fast_threshold_secs: f64) -> Self {
        let fast = elapsed_secs < fast_threshold_secs;
        match (direct, fast) {
            (true, true) => OutcomeCategory::SuccessDirectUnder10,
            (true, false) => OutcomeCategory::SuccessDirectBetween10And20,
            (false, true) => OutcomeCategory::SuccessIndirectUnder10,
            (false, false) => OutcomeCategory::SuccessIndirectBetween10And20,
        }
    }

    pub fn is_success(self) -> bool {
        self != OutcomeCategory::Fail
    }
}

/// Per-word outcome counters. These are the only inputs to the history score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeCounts {
    pub success_direct_under_10: u32,
    pub success_direct_between_10_and_20: u32,
    pub success_indirect_under_10: u32,
    pub success_indirect_between_10_and_20: u32,
    pub fail: u32,
}

impl OutcomeCounts {
    pub fn record(&mut self, category: OutcomeCategory) {
        let counter = match category {
            OutcomeCategory::SuccessDirectUnder10 => &mut self.success_direct_under_10,
            OutcomeCategory::SuccessDirectBetween10And20 => {
                &mut self.success_direct_between_10_and_20
            }
            OutcomeCategory::SuccessIndirectUnder10 => &mut self.success_indirect_under_10,
            OutcomeCategory::SuccessIndirectBetween10And20 => {
                &mut self.success_indirect_between_10_and_20
            }
            OutcomeCategory::Fail => &mut self.fail,
        };
        *counter = counter.saturating_add(1);
    }

    /// A copy with one more attempt of `category`.
    pub fn with(mut self, category: OutcomeCategory) -> Self {
        self.record(category);
        self
    }

    /// Number of successful attempts, direct and indirect.
    pub fn successes(&self) -> u32 {
        self.success_direct_under_10
            .saturating_add(self.success_direct_between_10_and_20)
            .saturating_add(self.success_indirect_under_10)
            .saturating_add(self.success_indirect_between_10_and_20)
    }
}

/// A user's history with one word. A missing record is the same as `default()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWordStat {
    pub counts: OutcomeCounts,
    /// Running mean over successful attempts only.
    pub average_success_time: f64,
    /// Signed offset from the word's baseline likelihood.
    pub delta_likelihood: f64,
    /// Surface form -> times it was produced correctly.
    pub anagram_counters: BTreeMap<String, u32>,
}

/// A user's totals across the whole corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOverallStat {
    pub success_direct_under_10: u32,
    pub success_direct_between_10_and_20: u32,
    pub success_indirect: u32,
    pub fail: u32,
    pub average_success_time: f64,
    pub delta_likelihood: f64,
}

impl UserOverallStat {
    pub fn record(&mut self, category: OutcomeCategory) {
        let counter = match category {
            OutcomeCategory::SuccessDirectUnder10 => &mut self.success_direct_under_10,
            OutcomeCategory::SuccessDirectBetween10And20 => {
                &mut self.success_direct_between_10_and_20
            }
            OutcomeCategory::SuccessIndirectUnder10
            | OutcomeCategory::SuccessIndirectBetween10And20 => &mut self.success_indirect,
            OutcomeCategory::Fail => &mut self.fail,
        };
        *counter = counter.saturating_add(1);
    }

    pub fn successes(&self) -> u32 {
        self.success_direct_under_10
            .saturating_add(self.success_direct_between_10_and_20)
            .saturating_add(self.success_indirect)
    }
}

/// A generated round: nine scrambled tiles and every tracked answer they allow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Puzzle {
    pub letters: String,
    pub primary_words: Vec<String>,
    pub correct_words: Vec<String>,
    pub word_index: WordIndex,
    /// Set when no legal rack was found and the target was padded with `X`.
    /// Such a rack carries no guarantee about equal-or-longer words.
    pub is_fallback: bool,
}

/// What the caller sends back after a round. Web clients send `index` and
/// `timeTaken`; both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(alias = "index")]
    pub word_index: WordIndex,
    pub target_anagrams: Vec<String>,
    pub submitted_word: String,
    #[serde(alias = "timeTaken")]
    pub elapsed_secs: f64,
    pub is_failed: bool,
}

/// How a submission was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmissionOutcome {
    DirectSuccess,
    Failed,
    IndirectSuccess,
    /// A real word that the corpus does not track. Nothing is recorded.
    UntrackedWord,
    /// Neither a known word nor flagged as failed by the caller; recorded as a
    /// fail against the target.
    UnrecognizedTreatedAsFail,
}

/// Before/after figures for one word touched (or not) by a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordReport {
    pub word_data: WordData,
    pub category: Option<OutcomeCategory>,
    pub old_likelihood: f64,
    pub change_in_likelihood: f64,
    pub old_average_success_time: f64,
    pub change_in_average_success_time: f64,
    pub anagram_counters: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallReport {
    pub old_likelihood: f64,
    pub change_in_likelihood: f64,
    pub old_average_success_time: f64,
    pub change_in_average_success_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReport {
    pub outcome: SubmissionOutcome,
    pub is_in_dictionary: bool,
    #[serde(rename = "isInTop1000")]
    pub is_in_top_1000: bool,
    pub overall: OverallReport,
    pub target_word: WordReport,
    /// Only present when a different tracked word was credited.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub submitted_word: Option<WordReport>,
}

/// A user's standing across the whole corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub overall: UserOverallStat,
    pub total_likelihood: f64,
    pub baseline_likelihood: f64,
}
