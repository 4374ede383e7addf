// File: src/persistence.rs
use crate::core::types::{UserId, UserWordStat, WordIndex};
use crate::store::{
    AggregateRecord, MemoryStore, PerformanceStore, PreviousValues, StoreError, UserLedger,
    WordUpdate,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// The serializable state of the store.
#[derive(Default, Deserialize)]
struct SerializableState {
    users: HashMap<String, UserLedger>,
}

/// Borrowing twin of `SerializableState`; encodes to the same bytes.
#[derive(Serialize)]
struct SerializableStateRef<'a> {
    users: &'a HashMap<String, UserLedger>,
}

pub fn save_to_disk(users: &HashMap<String, UserLedger>, path: &Path) -> Result<(), StoreError> {
    let persist_err = |source: std::io::Error| StoreError::Persist {
        path: path.to_path_buf(),
        source,
    };
    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir).map_err(persist_err)?;

    let temp_file = NamedTempFile::new_in(parent_dir).map_err(persist_err)?;
    {
        let mut writer = BufWriter::new(temp_file.as_file());
        bincode::serialize_into(&mut writer, &SerializableStateRef { users })?;
        writer.flush().map_err(persist_err)?;
    }

    temp_file.persist(path).map_err(|e| persist_err(e.error))?;
    Ok(())
}

pub fn load_from_disk(path: &Path) -> Result<HashMap<String, UserLedger>, StoreError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(source) => {
            return Err(StoreError::Unavailable(format!("cannot open {path:?}: {source}")))
        }
    };
    let state: SerializableState = bincode::deserialize_from(BufReader::new(file))?;
    Ok(state.users)
}

/// A `MemoryStore` that snapshots every user to one file after each
/// transaction. A transaction that cannot be written out is rolled back.
pub struct FileStore {
    path: PathBuf,
    memory: MemoryStore,
}

impl FileStore {
    /// Opens the snapshot at `path`, or starts empty if there is none.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let memory = MemoryStore::from_ledgers(load_from_disk(&path)?);
        log::info!("opened performance store {:?} ({} users)", path, memory.user_count()?);
        Ok(Self { path, memory })
    }

    pub fn ledger(&self, user: &UserId) -> Result<UserLedger, StoreError> {
        self.memory.ledger(user)
    }
}

impl PerformanceStore for FileStore {
    fn overall_and_bucket_stats(&self, user: &UserId) -> Result<Vec<AggregateRecord>, StoreError> {
        self.memory.overall_and_bucket_stats(user)
    }

    fn word_stats_for_bucket(
        &self,
        user: &UserId,
        bucket: usize,
    ) -> Result<BTreeMap<WordIndex, UserWordStat>, StoreError> {
        self.memory.word_stats_for_bucket(user, bucket)
    }

    fn apply_update(&self, user: &UserId, update: &WordUpdate) -> Result<PreviousValues, StoreError> {
        self.memory.transact(|users| {
            let before = users.get(user).cloned();
            let previous = users.entry(user.to_string()).or_default().apply(update);

            if let Err(e) = save_to_disk(users, &self.path) {
                match before {
                    Some(ledger) => users.insert(user.to_string(), ledger),
                    None => users.remove(user),
                };
                log::error!("rolled back update for {user}: {e}");
                return Err(e);
            }
            Ok(previous)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::OutcomeCategory;

    fn update() -> WordUpdate {
        WordUpdate {
            word_index: 12,
            bucket_index: 0,
            category: OutcomeCategory::SuccessIndirectBetween10And20,
            delta_likelihood_change: -25.0,
            word_average_time_change: 14.0,
            overall_average_time_change: 14.0,
            anagram: Some("SATIN".to_string()),
        }
    }

    #[test]
    fn updates_survive_a_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("performance.bin");

        let store = FileStore::open(&path).unwrap();
        store.apply_update("ada", &update()).unwrap();
        store.apply_update("ada", &update()).unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.memory.user_count().unwrap(), 1);
        assert_eq!(reopened.word_stats_for_bucket("ada", 0).unwrap().len(), 1);
        let ledger = reopened.ledger("ada").unwrap();
        let word = &ledger.buckets[&0].words[&12];
        assert_eq!(word.counts.success_indirect_between_10_and_20, 2);
        assert_eq!(word.anagram_counters["SATIN"], 2);
        assert_eq!(ledger.overall.success_indirect, 2);
        assert_eq!(ledger.buckets[&0].delta_likelihood, -50.0);
    }

    #[test]
    fn failed_snapshot_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the snapshot file should be makes persist fail.
        let path = dir.path().join("blocked");
        fs::create_dir_all(path.join("inner")).unwrap();

        let store = FileStore { path: path.clone(), memory: MemoryStore::new() };
        let err = store.apply_update("ada", &update()).unwrap_err();
        assert!(matches!(err, StoreError::Persist { .. }));
        assert_eq!(store.ledger("ada").unwrap(), UserLedger::default());
        assert!(store.overall_and_bucket_stats("ada").unwrap().is_empty());
        assert_eq!(store.memory.user_count().unwrap(), 0);
    }

    #[test]
    fn corrupt_snapshot_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("performance.bin");
        fs::write(&path, [0xff; 3]).unwrap();
        assert!(matches!(FileStore::open(&path), Err(StoreError::Codec(_))));
    }
}
