// src/core/selector.rs
use crate::core::corpus::WordCorpus;
use crate::core::types::{UserId, WordIndex};
use crate::error::{Result, TrainerError};
use crate::store::{AggregateRecord, PerformanceStore};
use rand::Rng;

/// Picks the next target word for a user in two steps: a bucket, weighted by
/// its baseline sum plus the user's bucket delta, then a word inside it.
/// Only one bucket's word records are read per draw.
pub struct AdaptiveSelector<'a> {
    corpus: &'a WordCorpus,
}

impl<'a> AdaptiveSelector<'a> {
    pub fn new(corpus: &'a WordCorpus) -> Self {
        Self { corpus }
    }

    /// Current draw weight of every bucket for `user`, in rank order.
    pub fn bucket_weights<S: PerformanceStore + ?Sized>(
        &self,
        store: &S,
        user: &UserId,
    ) -> Result<Vec<f64>> {
        let mut weights: Vec<f64> = self
            .corpus
            .buckets()
            .iter()
            .map(|b| b.baseline_likelihood_sum)
            .collect();
        for record in store.overall_and_bucket_stats(user)? {
            if let AggregateRecord::Bucket { index, delta_likelihood } = record {
                match weights.get_mut(index) {
                    Some(weight) => *weight += delta_likelihood,
                    None => log::warn!("user {user} has stats for unknown bucket {index}"),
                }
            }
        }
        Ok(weights.into_iter().map(|w| w.max(0.0)).collect())
    }

    pub fn select<S, R>(&self, store: &S, user: &UserId, rng: &mut R) -> Result<WordIndex>
    where
        S: PerformanceStore + ?Sized,
        R: Rng + ?Sized,
    {
        let bucket_weights = self.bucket_weights(store, user)?;
        let total: f64 = bucket_weights.iter().sum();
        if total.is_nan() || total <= 0.0 {
            return Err(TrainerError::ZeroDrawWeight(total));
        }

        let draw = rng.gen_range(0.0..total);
        let (position, residual) = cumulative_pick(bucket_weights.iter().copied(), draw)
            .ok_or(TrainerError::ZeroDrawWeight(total))?;
        let bucket = &self.corpus.buckets()[position];

        let stats = store.word_stats_for_bucket(user, bucket.index)?;
        let entries = self.corpus.bucket_entries(bucket);
        let word_weights = entries.iter().map(|entry| {
            let delta = stats.get(&entry.index).map_or(0.0, |s| s.delta_likelihood);
            (entry.baseline_likelihood + delta).max(0.0)
        });
        let (word_position, _) = cumulative_pick(word_weights, residual)
            .ok_or(TrainerError::ZeroDrawWeight(bucket_weights[position]))?;

        let index = entries[word_position].index;
        log::debug!(
            "user {user}: draw {draw:.3} of {total:.3} -> bucket {} word {index}",
            bucket.index
        );
        Ok(index)
    }
}

/// Walks `weights` until the running sum exceeds `draw`. Returns the position
/// hit and what was left of `draw` on reaching it. A draw past the end lands
/// on the last positive weight; `None` means there was none.
pub(crate) fn cumulative_pick<I>(weights: I, draw: f64) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = f64>,
{
    let mut cumulative = 0.0;
    let mut last_positive = None;
    for (position, weight) in weights.into_iter().enumerate() {
        if weight <= 0.0 {
            continue;
        }
        if draw < cumulative + weight {
            return Some((position, draw - cumulative));
        }
        last_positive = Some((position, (draw - cumulative).min(weight)));
        cumulative += weight;
    }
    last_positive
}
