// File: src/error.rs
use crate::core::letters::LetterClass;
use crate::core::types::WordIndex;
use crate::store::StoreError;
use std::path::PathBuf;

pub type Result<T, E = TrainerError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum TrainerError {
    #[error("word corpus is empty")]
    EmptyCorpus,
    #[error("word index {0} is not in the corpus")]
    UnknownWordIndex(WordIndex),
    #[error("letter pool has no {0} left to draw")]
    LetterPoolExhausted(LetterClass),
    #[error("total draw weight is not positive ({0})")]
    ZeroDrawWeight(f64),
    #[error("performance store cannot apply updates atomically; refusing to write")]
    NonAtomicStore,
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse JSON {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TrainerError {
    /// Invariant violations that should abort the request rather than be
    /// absorbed by the caller.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TrainerError::EmptyCorpus
                | TrainerError::UnknownWordIndex(_)
                | TrainerError::LetterPoolExhausted(_)
                | TrainerError::ZeroDrawWeight(_)
        )
    }
}
