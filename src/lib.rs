// src/lib.rs

pub mod c_api;
pub mod config;
pub mod core;
pub mod error;
pub mod learning;
pub mod logging;
pub mod persistence;
pub mod store;

pub use crate::config::TrainerConfig;
pub use crate::core::engine::TrainerEngine;
pub use crate::core::types::{Puzzle, Submission, SubmissionOutcome, SubmissionReport, UserSummary};
pub use crate::error::{Result, TrainerError};
pub use crate::persistence::FileStore;
pub use crate::store::{MemoryStore, PerformanceStore, StoreError};
