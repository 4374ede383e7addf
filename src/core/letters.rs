// src/core/letters.rs
use crate::error::{Result, TrainerError};
use rand::Rng;
use std::fmt;

/// Tiles on a full rack.
pub const TILE_COUNT: usize = 9;
pub const MIN_VOWELS: usize = 3;
pub const MIN_CONSONANTS: usize = 4;
/// Padding used when no legal rack could be found.
pub const FALLBACK_LETTER: u8 = b'X';

/// Tile bag counts, A to Z.
pub const LETTER_DISTRIBUTION: [u32; 26] = [
    15, // A
    2,  // B
    3,  // C
    6,  // D
    21, // E
    2,  // F
    3,  // G
    2,  // H
    13, // I
    1,  // J
    1,  // K
    5,  // L
    4,  // M
    8,  // N
    13, // O
    4,  // P
    1,  // Q
    9,  // R
    9,  // S
    9,  // T
    5,  // U
    1,  // V
    1,  // W
    1,  // X
    1,  // Y
    1,  // Z
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LetterClass {
    Vowel,
    Consonant,
}

impl fmt::Display for LetterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LetterClass::Vowel => f.write_str("vowel"),
            LetterClass::Consonant => f.write_str("consonant"),
        }
    }
}

/// Classifies an uppercase ASCII letter. `Y` is a consonant.
pub fn classify(letter: u8) -> Option<LetterClass> {
    match letter {
        b'A' | b'E' | b'I' | b'O' | b'U' => Some(LetterClass::Vowel),
        b'A'..=b'Z' => Some(LetterClass::Consonant),
        _ => None,
    }
}

/// Returns `(vowels, consonants)` in `letters`.
pub fn count_classes(letters: &[u8]) -> (usize, usize) {
    letters
        .iter()
        .fold((0, 0), |(v, c), &letter| match classify(letter) {
            Some(LetterClass::Vowel) => (v + 1, c),
            Some(LetterClass::Consonant) => (v, c + 1),
            None => (v, c),
        })
}

fn slot(letter: u8) -> Option<usize> {
    letter
        .is_ascii_uppercase()
        .then(|| (letter - b'A') as usize)
}

/// Remaining tiles in the bag for one construction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterPool {
    counts: [u32; 26],
}

impl LetterPool {
    pub fn standard() -> Self {
        Self { counts: LETTER_DISTRIBUTION }
    }

    /// The standard bag with the tiles of `word` already taken out.
    /// Letters the bag has run out of stay at zero.
    pub fn without_word(word: &str) -> Self {
        let mut pool = Self::standard();
        for slot in word.bytes().filter_map(slot) {
            pool.counts[slot] = pool.counts[slot].saturating_sub(1);
        }
        pool
    }

    pub fn remaining(&self, letter: u8) -> u32 {
        slot(letter).map_or(0, |s| self.counts[s])
    }

    /// Draws one tile of `class`, weighted by how many of each letter remain,
    /// and removes it from the pool.
    pub fn draw<R: Rng + ?Sized>(&mut self, class: LetterClass, rng: &mut R) -> Result<u8> {
        let in_class = |s: usize| classify(b'A' + s as u8) == Some(class);
        let total: u32 = (0..26)
            .filter(|&s| in_class(s))
            .map(|s| self.counts[s])
            .sum();
        if total == 0 {
            return Err(TrainerError::LetterPoolExhausted(class));
        }

        let target = rng.gen_range(0..total);
        let mut cumulative = 0;
        for s in (0..26).filter(|&s| in_class(s) && self.counts[s] > 0) {
            cumulative += self.counts[s];
            if cumulative > target {
                self.counts[s] -= 1;
                return Ok(b'A' + s as u8);
            }
        }
        Err(TrainerError::LetterPoolExhausted(class))
    }
}

/// A letter multiset, used for the formability checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LetterCounts([u8; 26]);

impl LetterCounts {
    pub fn from_letters(letters: &[u8]) -> Self {
        let mut counts = [0u8; 26];
        for s in letters.iter().copied().filter_map(slot) {
            counts[s] = counts[s].saturating_add(1);
        }
        Self(counts)
    }

    pub fn from_word(word: &str) -> Self {
        Self::from_letters(word.as_bytes())
    }

    /// True when every letter of `word` is available here with at least the
    /// same multiplicity.
    pub fn contains(&self, word: &LetterCounts) -> bool {
        self.0.iter().zip(word.0.iter()).all(|(have, need)| have >= need)
    }

    /// Size of the multiset intersection.
    pub fn shared_with(&self, other: &LetterCounts) -> usize {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (*a).min(*b) as usize)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn distribution_matches_tile_bag() {
        assert_eq!(LETTER_DISTRIBUTION.iter().sum::<u32>(), 141);
        assert_eq!(LetterPool::standard().remaining(b'E'), 21);
        assert_eq!(LetterPool::standard().remaining(b'Z'), 1);
    }

    #[test]
    fn classify_treats_y_as_consonant() {
        assert_eq!(classify(b'A'), Some(LetterClass::Vowel));
        assert_eq!(classify(b'Y'), Some(LetterClass::Consonant));
        assert_eq!(classify(b'a'), None);
        assert_eq!(count_classes(b"MAIDENS"), (3, 4));
    }

    #[test]
    fn without_word_saturates_at_zero() {
        let pool = LetterPool::without_word("ZIZZ");
        assert_eq!(pool.remaining(b'Z'), 0);
        assert_eq!(pool.remaining(b'I'), 12);
    }

    #[test]
    fn draw_respects_class_and_decrements() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut pool = LetterPool::standard();
        for _ in 0..20 {
            let letter = pool.draw(LetterClass::Vowel, &mut rng).unwrap();
            assert_eq!(classify(letter), Some(LetterClass::Vowel));
        }
        let left: u32 = [b'A', b'E', b'I', b'O', b'U']
            .iter()
            .map(|&l| pool.remaining(l))
            .sum();
        assert_eq!(left, 67 - 20);
    }

    #[test]
    fn draw_is_frequency_weighted() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut e_count = 0;
        let trials = 20_000;
        for _ in 0..trials {
            let mut pool = LetterPool::standard();
            if pool.draw(LetterClass::Vowel, &mut rng).unwrap() == b'E' {
                e_count += 1;
            }
        }
        let freq = e_count as f64 / trials as f64;
        assert!((freq - 21.0 / 67.0).abs() < 0.02, "E frequency {freq}");
    }

    #[test]
    fn draw_from_empty_class_is_an_error() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut pool = LetterPool::standard();
        for _ in 0..67 {
            pool.draw(LetterClass::Vowel, &mut rng).unwrap();
        }
        let err = pool.draw(LetterClass::Vowel, &mut rng).unwrap_err();
        assert!(matches!(err, TrainerError::LetterPoolExhausted(LetterClass::Vowel)));
        assert!(err.is_fatal());
    }

    #[test]
    fn contains_is_a_multiset_subset_test() {
        let rack = LetterCounts::from_word("MAIDENSXR");
        assert!(rack.contains(&LetterCounts::from_word("SIDEMAN")));
        assert!(rack.contains(&LetterCounts::from_word("DREAMS")));
        assert!(!rack.contains(&LetterCounts::from_word("MADDEN")));
        assert_eq!(
            LetterCounts::from_word("REDRAW").shared_with(&LetterCounts::from_word("DRAWERS")),
            6
        );
    }
}
