// src/core/corpus.rs
use crate::core::letters::LetterCounts;
use crate::core::likelihood::baseline_likelihood;
use crate::core::types::{WordData, WordIndex};
use crate::error::{Result, TrainerError};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::ops::Range;
use std::path::Path;

/// Longest canonical form a rack can hold.
pub const MAX_WORD_LENGTH: usize = 9;

/// One row of the pre-built word list, as it appears on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWordRow {
    #[serde(default)]
    pub index: Value,
    #[serde(default)]
    pub words: Option<String>,
    #[serde(default)]
    pub score: Value,
}

/// A validated row: rank, surface forms and usefulness score.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusRow {
    pub index: WordIndex,
    pub anagrams: Vec<String>,
    pub score: f64,
}

impl CorpusRow {
    pub fn new(index: WordIndex, words: &str, score: f64) -> Option<Self> {
        let anagrams: Vec<String> = words
            .split('/')
            .map(|w| w.trim().to_ascii_uppercase())
            .filter(|w| !w.is_empty())
            .collect();
        if anagrams.is_empty() || !score.is_finite() || score <= 0.0 {
            return None;
        }
        if anagrams.iter().any(|w| !w.bytes().all(|b| b.is_ascii_uppercase())) {
            return None;
        }
        Some(Self { index, anagrams, score })
    }

    fn from_raw(raw: &RawWordRow) -> Option<Self> {
        let index = number(&raw.index).filter(|i| *i >= 1.0 && i.fract() == 0.0)? as WordIndex;
        let score = number(&raw.score)?;
        Self::new(index, raw.words.as_deref()?, score)
    }
}

/// Accepts both `812` and `"812"`, like the CSV-derived input does.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorpusOptions {
    /// How many usable rows, in rank order, are tracked per user.
    pub tracked_limit: usize,
    pub bucket_size: usize,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self { tracked_limit: 1000, bucket_size: 40 }
    }
}

#[derive(Debug, Clone)]
pub struct WordEntry {
    pub index: WordIndex,
    pub anagrams: Vec<String>,
    pub length: usize,
    pub baseline_score: f64,
    pub baseline_likelihood: f64,
    pub bucket_index: usize,
}

impl WordEntry {
    pub fn primary(&self) -> &str {
        &self.anagrams[0]
    }

    pub fn data(&self) -> WordData {
        WordData {
            index: self.index,
            anagrams: self.anagrams.clone(),
            length: self.length,
        }
    }
}

/// Any usable row short enough for a rack, tracked or not. Racks are checked
/// against these, so an untracked anagram still counts as a collision.
#[derive(Debug, Clone)]
pub struct PuzzleWord {
    pub index: WordIndex,
    pub anagrams: Vec<String>,
    pub length: usize,
    letters: LetterCounts,
}

impl PuzzleWord {
    pub fn primary(&self) -> &str {
        &self.anagrams[0]
    }

    pub fn letter_counts(&self) -> &LetterCounts {
        &self.letters
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub index: usize,
    /// Positions of the member entries in the corpus.
    pub range: Range<usize>,
    pub baseline_likelihood_sum: f64,
}

/// The tracked word list, bucketed in rank order. Built once, read-only after.
#[derive(Debug, Clone)]
pub struct WordCorpus {
    entries: Vec<WordEntry>,
    puzzle_words: Vec<PuzzleWord>,
    buckets: Vec<Bucket>,
    total_baseline_likelihood: f64,
    by_index: HashMap<WordIndex, usize>,
    by_surface: HashMap<String, usize>,
    dictionary: HashSet<String>,
}

impl WordCorpus {
    /// Builds the corpus from rows in rank order. `extra_words` only widen the
    /// dictionary used to recognise valid-but-untracked answers.
    pub fn from_rows<I, W>(rows: I, extra_words: W, options: &CorpusOptions) -> Result<Self>
    where
        I: IntoIterator<Item = CorpusRow>,
        W: IntoIterator<Item = String>,
    {
        if options.bucket_size == 0 {
            return Err(TrainerError::Config("bucket_size must be positive".into()));
        }

        let mut dictionary: HashSet<String> = extra_words
            .into_iter()
            .map(|w| w.trim().to_ascii_uppercase())
            .filter(|w| !w.is_empty())
            .collect();
        let mut entries: Vec<WordEntry> = Vec::new();
        let mut puzzle_words: Vec<PuzzleWord> = Vec::new();
        let mut seen_indices = HashSet::new();
        let mut by_index = HashMap::new();
        let mut by_surface = HashMap::new();
        let mut tracked_rows = 0;

        for row in rows {
            dictionary.extend(row.anagrams.iter().cloned());
            let tracked = tracked_rows < options.tracked_limit;
            tracked_rows += 1;

            let length = row.anagrams[0].len();
            if length > MAX_WORD_LENGTH {
                continue;
            }
            if !seen_indices.insert(row.index) {
                log::warn!("duplicate word index {} skipped", row.index);
                continue;
            }
            puzzle_words.push(PuzzleWord {
                index: row.index,
                anagrams: row.anagrams.clone(),
                length,
                letters: LetterCounts::from_word(&row.anagrams[0]),
            });
            if !tracked {
                continue;
            }

            let position = entries.len();
            by_index.insert(row.index, position);
            for form in &row.anagrams {
                by_surface.entry(form.clone()).or_insert(position);
            }
            entries.push(WordEntry {
                index: row.index,
                length,
                baseline_score: row.score,
                baseline_likelihood: baseline_likelihood(row.score),
                bucket_index: position / options.bucket_size,
                anagrams: row.anagrams,
            });
        }

        if entries.is_empty() {
            return Err(TrainerError::EmptyCorpus);
        }

        let buckets: Vec<Bucket> = entries
            .chunks(options.bucket_size)
            .enumerate()
            .map(|(index, chunk)| {
                let start = index * options.bucket_size;
                Bucket {
                    index,
                    range: start..start + chunk.len(),
                    baseline_likelihood_sum: chunk.iter().map(|e| e.baseline_likelihood).sum(),
                }
            })
            .collect();
        let total_baseline_likelihood = buckets.iter().map(|b| b.baseline_likelihood_sum).sum();

        Ok(Self {
            entries,
            puzzle_words,
            buckets,
            total_baseline_likelihood,
            by_index,
            by_surface,
            dictionary,
        })
    }

    /// Loads the JSON word list and, optionally, a newline-separated list of
    /// further valid words.
    pub fn load(
        corpus_path: &Path,
        dictionary_path: Option<&Path>,
        options: &CorpusOptions,
    ) -> Result<Self> {
        let text = fs::read_to_string(corpus_path).map_err(|source| TrainerError::Io {
            path: corpus_path.to_path_buf(),
            source,
        })?;
        let raw: Vec<RawWordRow> =
            serde_json::from_str(&text).map_err(|source| TrainerError::Json {
                path: corpus_path.to_path_buf(),
                source,
            })?;

        let total_rows = raw.len();
        let rows: Vec<CorpusRow> = raw.iter().filter_map(CorpusRow::from_raw).collect();
        if rows.len() < total_rows {
            log::debug!("skipped {} unusable rows in {:?}", total_rows - rows.len(), corpus_path);
        }

        let extra_words: Vec<String> = match dictionary_path {
            Some(path) => fs::read_to_string(path)
                .map_err(|source| TrainerError::Io { path: path.to_path_buf(), source })?
                .lines()
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        };

        let corpus = Self::from_rows(rows, extra_words, options)?;
        log::info!(
            "loaded {} tracked words in {} buckets ({} dictionary words)",
            corpus.len(),
            corpus.buckets.len(),
            corpus.dictionary.len()
        );
        Ok(corpus)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[WordEntry] {
        &self.entries
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Every word a rack is checked against, in rank order.
    pub fn puzzle_words(&self) -> &[PuzzleWord] {
        &self.puzzle_words
    }

    pub fn bucket_entries(&self, bucket: &Bucket) -> &[WordEntry] {
        &self.entries[bucket.range.clone()]
    }

    pub fn total_baseline_likelihood(&self) -> f64 {
        self.total_baseline_likelihood
    }

    pub fn entry(&self, index: WordIndex) -> Result<&WordEntry> {
        self.by_index
            .get(&index)
            .map(|&position| &self.entries[position])
            .ok_or(TrainerError::UnknownWordIndex(index))
    }

    /// The tracked entry that accepts `word` as one of its surface forms.
    pub fn entry_for_surface(&self, word: &str) -> Option<&WordEntry> {
        self.by_surface.get(word).map(|&position| &self.entries[position])
    }

    pub fn is_dictionary_word(&self, word: &str) -> bool {
        self.dictionary.contains(word)
    }
}
