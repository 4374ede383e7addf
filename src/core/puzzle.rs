// src/core/puzzle.rs
use crate::config::VowelTargets;
use crate::core::corpus::{PuzzleWord, WordCorpus, WordEntry};
use crate::core::letters::{
    count_classes, LetterClass, LetterCounts, LetterPool, FALLBACK_LETTER, MIN_CONSONANTS,
    MIN_VOWELS, TILE_COUNT,
};
use crate::core::types::{Puzzle, WordIndex};
use crate::error::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Shortest word worth listing as a correct answer.
pub const MIN_ANSWER_LENGTH: usize = 5;

/// Pigeonhole filter: on a 9-tile rack holding `chosen`, `other` has to reuse at
/// least `len(chosen) + len(other) - 9` of its tiles. Necessary, not sufficient.
pub fn is_dict_word_possible(chosen: &str, other: &str) -> bool {
    let necessary = (chosen.len() + other.len()).saturating_sub(TILE_COUNT);
    LetterCounts::from_word(chosen).shared_with(&LetterCounts::from_word(other)) >= necessary
}

/// Exact formability: every letter of `word`, with multiplicity, is on the rack.
pub fn letters_contain_word(rack: &str, word: &str) -> bool {
    LetterCounts::from_word(rack).contains(&LetterCounts::from_word(word))
}

/// The tiles chosen for a rack, before scrambling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilledRack {
    pub letters: Vec<u8>,
    /// No legal rack was found inside the retry budget.
    pub fallback: bool,
}

pub struct PuzzleConstructor<'a> {
    corpus: &'a WordCorpus,
    max_retries: u32,
    vowel_targets: VowelTargets,
}

impl<'a> PuzzleConstructor<'a> {
    pub fn new(corpus: &'a WordCorpus, max_retries: u32, vowel_targets: VowelTargets) -> Self {
        Self { corpus, max_retries, vowel_targets }
    }

    /// Builds a scrambled rack around the word at `index` and lists every
    /// known word of five or more letters it allows.
    pub fn build<R: Rng + ?Sized>(&self, index: WordIndex, rng: &mut R) -> Result<Puzzle> {
        let target = self.corpus.entry(index)?;
        let chosen = target.primary();
        let target_vowels = self.vowel_targets.pick(rng.gen::<f64>());

        let candidates = self.candidate_pool(chosen);
        let rack = self.fill_remaining_letters(
            &LetterPool::without_word(chosen),
            &candidates,
            target,
            TILE_COUNT.saturating_sub(chosen.len()),
            target_vowels,
            rng,
        )?;

        let rack_counts = LetterCounts::from_letters(&rack.letters);
        let mut seen = HashSet::new();
        let mut correct_words = Vec::new();
        for form in &target.anagrams {
            if seen.insert(form.as_str()) {
                correct_words.push(form.clone());
            }
        }
        for word in candidates.iter().filter(|w| w.index != target.index) {
            if word.length < MIN_ANSWER_LENGTH || !rack_counts.contains(word.letter_counts()) {
                continue;
            }
            for form in &word.anagrams {
                if seen.insert(form.as_str()) {
                    correct_words.push(form.clone());
                }
            }
        }

        Ok(Puzzle {
            letters: scramble(rack.letters, rng),
            primary_words: target.anagrams.clone(),
            correct_words,
            word_index: target.index,
            is_fallback: rack.fallback,
        })
    }

    /// Words, tracked or not, that could share a rack with `chosen`.
    pub fn candidate_pool(&self, chosen: &str) -> Vec<&'a PuzzleWord> {
        let chosen_counts = LetterCounts::from_word(chosen);
        self.corpus
            .puzzle_words()
            .iter()
            .filter(|word| {
                let necessary = (chosen.len() + word.length).saturating_sub(TILE_COUNT);
                chosen_counts.shared_with(word.letter_counts()) >= necessary
            })
            .collect()
    }

    /// Pads `target` out to nine tiles: vowels until `target_vowels` is reached,
    /// consonants after. A rack is rejected when it breaks the vowel/consonant
    /// minimums or spells another known word at least as long as the target.
    pub fn fill_remaining_letters<R: Rng + ?Sized>(
        &self,
        pool: &LetterPool,
        candidates: &[&PuzzleWord],
        target: &WordEntry,
        slots_to_fill: usize,
        target_vowels: usize,
        rng: &mut R,
    ) -> Result<FilledRack> {
        let chosen = target.primary().as_bytes();

        for attempt in 0..self.max_retries {
            let mut pool = pool.clone();
            let mut letters = chosen.to_vec();
            let (mut vowels, _) = count_classes(&letters);

            for _ in 0..slots_to_fill {
                let class = if vowels >= target_vowels {
                    LetterClass::Consonant
                } else {
                    LetterClass::Vowel
                };
                letters.push(pool.draw(class, rng)?);
                if class == LetterClass::Vowel {
                    vowels += 1;
                }
            }

            let (vowels, consonants) = count_classes(&letters);
            if vowels < MIN_VOWELS || consonants < MIN_CONSONANTS {
                log::debug!(
                    "attempt {attempt} for {}: {vowels} vowels / {consonants} consonants",
                    target.primary()
                );
                continue;
            }
            if let Some(collision) = equal_or_longer_word(&letters, candidates, target) {
                log::debug!(
                    "attempt {attempt} for {}: rack {} also spells {}",
                    target.primary(),
                    String::from_utf8_lossy(&letters),
                    collision.primary()
                );
                continue;
            }
            return Ok(FilledRack { letters, fallback: false });
        }

        log::warn!(
            "no legal rack for {} after {} attempts, padding with {}",
            target.primary(),
            self.max_retries,
            FALLBACK_LETTER as char
        );
        let mut letters = chosen.to_vec();
        letters.resize(TILE_COUNT.max(chosen.len()), FALLBACK_LETTER);
        Ok(FilledRack { letters, fallback: true })
    }
}

/// The first candidate other than `target`, no shorter than it, that the rack
/// spells.
fn equal_or_longer_word<'w>(
    letters: &[u8],
    candidates: &[&'w PuzzleWord],
    target: &WordEntry,
) -> Option<&'w PuzzleWord> {
    let rack = LetterCounts::from_letters(letters);
    candidates
        .iter()
        .copied()
        .filter(|word| word.index != target.index && word.length >= target.length)
        .find(|word| rack.contains(word.letter_counts()))
}

fn scramble<R: Rng + ?Sized>(mut letters: Vec<u8>, rng: &mut R) -> String {
    letters.shuffle(rng);
    letters.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::corpus::tests::row;
    use crate::core::corpus::{CorpusOptions, CorpusRow};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn corpus(rows: Vec<CorpusRow>) -> WordCorpus {
        WordCorpus::from_rows(rows, Vec::<String>::new(), &CorpusOptions::default()).unwrap()
    }

    fn sample_corpus() -> WordCorpus {
        corpus(vec![
            row(1, "RETAINS/NASTIER/RETINAS/RETSINA/STAINER/STEARIN", 900.0),
            row(2, "MAIDENS/MEDIANS/MEDINAS/SIDEMAN", 800.0),
            row(3, "REDRAW/REWARD/WARDER", 700.0),
            row(4, "DRAWERS/REDRAWS/REWARDS/WARDERS", 650.0),
            row(5, "TOASTER/ROTATES", 600.0),
            row(6, "DREAMS", 500.0),
            row(7, "STAIN/SATIN/SAINT", 450.0),
            row(8, "ORIENTATE", 400.0),
            row(9, "QUIZ", 300.0),
        ])
    }

    #[test]
    fn dict_word_possible_examples() {
        assert!(is_dict_word_possible("REDRAW", "DRAWERS"));
        assert!(!is_dict_word_possible("APTEROUS", "KITTEN"));
    }

    #[test]
    fn letters_contain_word_examples() {
        assert!(letters_contain_word("SIDEMANRT", "MAIDENS"));
        assert!(letters_contain_word("SIDEMANRT", "DREAMS"));
        assert!(!letters_contain_word("SIDEMANRT", "MADDEN"));
        assert!(!letters_contain_word("ABC", "ABCD"));
        assert!(letters_contain_word("ABC", ""));
    }

    #[test]
    fn letters_contain_word_matches_multiset_definition() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..2_000 {
            let rack: String = (0..9).map(|_| rng.gen_range(b'A'..=b'F') as char).collect();
            let word: String = (0..rng.gen_range(1..=9))
                .map(|_| rng.gen_range(b'A'..=b'F') as char)
                .collect();
            let expected = word
                .chars()
                .all(|c| word.matches(c).count() <= rack.matches(c).count());
            assert_eq!(letters_contain_word(&rack, &word), expected, "{rack} / {word}");
        }
    }

    #[test]
    fn dict_word_possible_never_rejects_a_formable_pair() {
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..5_000 {
            let mut rack: Vec<u8> = (0..TILE_COUNT).map(|_| rng.gen_range(b'A'..=b'H')).collect();
            rack.shuffle(&mut rng);
            let chosen: String = rack[..rng.gen_range(5..=9)].iter().map(|&b| b as char).collect();
            rack.shuffle(&mut rng);
            let other: String = rack[..rng.gen_range(5..=9)].iter().map(|&b| b as char).collect();
            let rack: String = rack.iter().map(|&b| b as char).collect();

            assert!(letters_contain_word(&rack, &chosen) && letters_contain_word(&rack, &other));
            assert!(is_dict_word_possible(&chosen, &other), "{chosen} / {other} on {rack}");
        }
    }

    #[test]
    fn puzzles_are_legal_racks() {
        let corpus = sample_corpus();
        let constructor = PuzzleConstructor::new(&corpus, 100, VowelTargets::default());
        let mut rng = StdRng::seed_from_u64(42);

        for index in [1, 2, 3, 5, 6, 7] {
            for _ in 0..25 {
                let puzzle = constructor.build(index, &mut rng).unwrap();
                assert_eq!(puzzle.letters.len(), TILE_COUNT);
                assert_eq!(puzzle.word_index, index);
                if puzzle.is_fallback {
                    continue;
                }
                let (vowels, consonants) = count_classes(puzzle.letters.as_bytes());
                assert!(vowels >= MIN_VOWELS, "{}", puzzle.letters);
                assert!(consonants >= MIN_CONSONANTS, "{}", puzzle.letters);

                let target = corpus.entry(index).unwrap();
                for word in corpus.puzzle_words() {
                    if word.index != index && word.length >= target.length {
                        assert!(
                            !letters_contain_word(&puzzle.letters, word.primary()),
                            "{} spells {}",
                            puzzle.letters,
                            word.primary()
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn correct_words_cover_target_and_formable_entries() {
        let corpus = sample_corpus();
        let constructor = PuzzleConstructor::new(&corpus, 100, VowelTargets::default());
        let mut rng = StdRng::seed_from_u64(9);
        let puzzle = constructor.build(2, &mut rng).unwrap();

        assert_eq!(puzzle.primary_words, corpus.entry(2).unwrap().anagrams);
        assert_eq!(&puzzle.correct_words[..4], &puzzle.primary_words[..]);
        for word in &puzzle.correct_words {
            assert!(letters_contain_word(&puzzle.letters, word));
            assert!(word.len() >= MIN_ANSWER_LENGTH);
        }
        // MAIDENS always holds DREAMS's letters except R, so check the rack.
        let dreams = letters_contain_word(&puzzle.letters, "DREAMS");
        assert_eq!(puzzle.correct_words.contains(&"DREAMS".to_string()), dreams);
        let unique: HashSet<_> = puzzle.correct_words.iter().collect();
        assert_eq!(unique.len(), puzzle.correct_words.len());
    }

    #[test]
    fn exhausted_retries_pad_with_placeholder() {
        let corpus = sample_corpus();
        let constructor = PuzzleConstructor::new(&corpus, 0, VowelTargets::default());
        let mut rng = StdRng::seed_from_u64(1);
        let puzzle = constructor.build(6, &mut rng).unwrap();

        assert!(puzzle.is_fallback);
        assert_eq!(puzzle.letters.len(), TILE_COUNT);
        assert_eq!(puzzle.letters.matches('X').count(), 3);
        assert!(letters_contain_word(&puzzle.letters, "DREAMS"));
    }

    #[test]
    fn rejected_targets_fall_back_after_every_retry() {
        // STAIN and SATIN are separate tracked rows, so every rack around
        // STAIN also spells SATIN.
        let corpus = corpus(vec![row(1, "STAIN", 500.0), row(2, "SATIN", 400.0)]);
        let constructor = PuzzleConstructor::new(&corpus, 100, VowelTargets::default());
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..10 {
            let puzzle = constructor.build(1, &mut rng).unwrap();
            assert!(puzzle.is_fallback);
            assert_eq!(puzzle.letters.len(), TILE_COUNT);
            assert_eq!(puzzle.letters.matches('X').count(), 4);
            assert!(letters_contain_word(&puzzle.letters, "STAIN"));
            assert_eq!(puzzle.correct_words, vec!["STAIN", "SATIN"]);
        }
    }

    #[test]
    fn untracked_words_still_shape_the_rack() {
        let rows = vec![
            row(1, "STAIN", 500.0),
            row(2, "SAINT", 400.0),
            row(3, "MAIDENS", 300.0),
            row(4, "MEDIA", 200.0),
        ];
        let options = CorpusOptions { tracked_limit: 1, bucket_size: 40 };
        let corpus = WordCorpus::from_rows(rows, Vec::<String>::new(), &options).unwrap();
        assert!(corpus.entry(2).is_err());
        let constructor = PuzzleConstructor::new(&corpus, 100, VowelTargets::default());
        let mut rng = StdRng::seed_from_u64(8);

        // The only tracked word always collides with its untracked anagram.
        let puzzle = constructor.build(1, &mut rng).unwrap();
        assert!(puzzle.is_fallback);
        assert!(puzzle.correct_words.contains(&"SAINT".to_string()));
        let pool: Vec<WordIndex> = constructor.candidate_pool("STAIN").iter().map(|w| w.index).collect();
        assert!(pool.contains(&2));
    }

    #[test]
    fn untracked_words_are_listed_as_answers() {
        let rows = vec![row(1, "MAIDENS", 500.0), row(2, "MEDIA", 400.0)];
        let options = CorpusOptions { tracked_limit: 1, bucket_size: 40 };
        let corpus = WordCorpus::from_rows(rows, Vec::<String>::new(), &options).unwrap();
        let constructor = PuzzleConstructor::new(&corpus, 100, VowelTargets::default());
        let mut rng = StdRng::seed_from_u64(21);

        for _ in 0..10 {
            let puzzle = constructor.build(1, &mut rng).unwrap();
            assert!(!puzzle.is_fallback, "{}", puzzle.letters);
            assert_eq!(puzzle.correct_words, vec!["MAIDENS", "MEDIA"]);
        }
    }

    #[test]
    fn candidate_pool_drops_impossible_words() {
        let corpus = sample_corpus();
        let constructor = PuzzleConstructor::new(&corpus, 100, VowelTargets::default());
        let pool: Vec<WordIndex> =
            constructor.candidate_pool("ORIENTATE").iter().map(|e| e.index).collect();
        assert!(pool.contains(&8));
        assert!(!pool.contains(&2));
        assert!(!pool.contains(&9));
    }

    #[test]
    fn unknown_target_is_fatal() {
        let corpus = sample_corpus();
        let constructor = PuzzleConstructor::new(&corpus, 100, VowelTargets::default());
        let err = constructor.build(999, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(err.is_fatal());
    }
}
