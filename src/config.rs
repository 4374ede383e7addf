// File: src/config.rs
use crate::core::corpus::CorpusOptions;
use crate::error::{Result, TrainerError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Chances of aiming a rack at 3, 4 or 5 vowels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VowelTargets {
    pub three: f64,
    pub four: f64,
    pub five: f64,
}

impl Default for VowelTargets {
    fn default() -> Self {
        Self { three: 0.28, four: 0.60, five: 0.12 }
    }
}

impl VowelTargets {
    /// Maps one uniform draw in `[0, 1)` onto a vowel target.
    pub fn pick(&self, roll: f64) -> usize {
        if roll < self.three {
            3
        } else if roll < self.three + self.four {
            4
        } else {
            5
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub corpus_path: PathBuf,
    pub dictionary_path: Option<PathBuf>,
    pub store_path: PathBuf,
    pub log_path: PathBuf,
    pub log_level: String,
    pub tracked_limit: usize,
    pub bucket_size: usize,
    pub max_retries: u32,
    pub vowel_targets: VowelTargets,
    /// Answers faster than this count as "under 10".
    pub fast_threshold_secs: f64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self::with_data_dir(&default_data_dir())
    }
}

impl TrainerConfig {
    /// Defaults with every file living under `data_dir`.
    pub fn with_data_dir(data_dir: &Path) -> Self {
        Self {
            corpus_path: data_dir.join("useful_words.json"),
            dictionary_path: None,
            store_path: data_dir.join("performance.bin"),
            log_path: data_dir.join("word_trainer.log"),
            log_level: "info".to_string(),
            tracked_limit: 1000,
            bucket_size: 40,
            max_retries: 100,
            vowel_targets: VowelTargets::default(),
            fast_threshold_secs: 10.0,
        }
    }

    /// `WORD_TRAINER_CONFIG` names the file explicitly; otherwise the standard
    /// config directory is tried. A missing file yields the defaults.
    pub fn discover() -> Result<Self> {
        let path = std::env::var("WORD_TRAINER_CONFIG")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::config_dir().map(|dir| dir.join("word-trainer").join("config.json")));

        match path {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| TrainerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| TrainerError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket_size == 0 {
            return Err(TrainerError::Config("bucket_size must be positive".into()));
        }
        if self.tracked_limit == 0 {
            return Err(TrainerError::Config("tracked_limit must be positive".into()));
        }
        let VowelTargets { three, four, five } = self.vowel_targets;
        if [three, four, five].iter().any(|p| !p.is_finite() || *p < 0.0)
            || (three + four + five - 1.0).abs() > 1e-6
        {
            return Err(TrainerError::Config(format!(
                "vowel target chances must be non-negative and sum to 1, got {three}/{four}/{five}"
            )));
        }
        if self.fast_threshold_secs.is_nan() || self.fast_threshold_secs <= 0.0 {
            return Err(TrainerError::Config("fast_threshold_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn corpus_options(&self) -> CorpusOptions {
        CorpusOptions {
            tracked_limit: self.tracked_limit,
            bucket_size: self.bucket_size,
        }
    }

    pub fn log_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("WORD_TRAINER_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .map(|dir| dir.join("word-trainer"))
        .unwrap_or_else(|| PathBuf::from("data"))
}
