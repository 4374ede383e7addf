// File: src/store/memory.rs
use super::{AggregateRecord, PerformanceStore, PreviousValues, StoreError, UserLedger, WordUpdate};
use crate::core::types::{UserId, UserWordStat, WordIndex};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// Process-local store. Every transaction runs under the write lock, so each
/// one lands whole.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, UserLedger>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ledgers(users: HashMap<String, UserLedger>) -> Self {
        Self { users: RwLock::new(users) }
    }

    /// A copy of one user's ledger, empty if the user has none yet.
    pub fn ledger(&self, user: &UserId) -> Result<UserLedger, StoreError> {
        let users = self.users.read().map_err(|_| StoreError::Poisoned)?;
        Ok(users.get(user).cloned().unwrap_or_default())
    }

    pub(crate) fn user_count(&self) -> Result<usize, StoreError> {
        Ok(self.users.read().map_err(|_| StoreError::Poisoned)?.len())
    }

    /// Runs `f` against every ledger while holding the write lock.
    pub(crate) fn transact<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut HashMap<String, UserLedger>) -> Result<T, StoreError>,
    {
        let mut users = self.users.write().map_err(|_| StoreError::Poisoned)?;
        f(&mut users)
    }
}

impl PerformanceStore for MemoryStore {
    fn overall_and_bucket_stats(&self, user: &UserId) -> Result<Vec<AggregateRecord>, StoreError> {
        let users = self.users.read().map_err(|_| StoreError::Poisoned)?;
        Ok(users.get(user).map(UserLedger::aggregates).unwrap_or_default())
    }

    fn word_stats_for_bucket(
        &self,
        user: &UserId,
        bucket: usize,
    ) -> Result<BTreeMap<WordIndex, UserWordStat>, StoreError> {
        let users = self.users.read().map_err(|_| StoreError::Poisoned)?;
        Ok(users
            .get(user)
            .map(|ledger| ledger.words_in_bucket(bucket))
            .unwrap_or_default())
    }

    fn apply_update(&self, user: &UserId, update: &WordUpdate) -> Result<PreviousValues, StoreError> {
        self.transact(|users| Ok(users.entry(user.to_string()).or_default().apply(update)))
    }
}
