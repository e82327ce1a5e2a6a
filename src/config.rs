//! Engine thresholds and storage location, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! the stock behaviour.

use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let mut cfg = Self::from_toml_str(&raw)?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// Like `load`, but a missing file means defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            let mut cfg = Self::default();
            cfg.apply_env();
            return Ok(cfg);
        }
        Self::load(path)
    }

    fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var("RETROSCOPE_DATA_DIR") {
            if !dir.is_empty() {
                self.storage.data_dir = PathBuf::from(dir);
            }
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|p| p.join("retroscope").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("retroscope.toml"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|p| p.join("retroscope"))
        .unwrap_or_else(|| PathBuf::from("./retroscope_data"))
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir() }
    }
}

/// Detector thresholds. Windows count the most recent entries.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Analysis needs at least this many entries.
    pub min_entries: usize,
    pub evidence_limit: usize,

    pub tag_min_support: usize,
    pub tag_mid_support: usize,
    pub tag_high_support: usize,

    pub emotion_window: usize,
    pub emotion_min_count: usize,
    pub emotion_high_count: usize,

    pub energy_window: usize,
    pub energy_min_entries: usize,
    pub energy_low_mean: f64,
    pub energy_high_mean: f64,

    pub keyword_window: usize,
    pub keyword_min_support: usize,
    pub keyword_mid_support: usize,
    pub keyword_top: usize,

    pub question_window: usize,
    pub question_min_entries: usize,
    pub question_min_answers: usize,
    pub question_high_answers: usize,

    pub time_min_entries: usize,
    pub time_negative_ratio: f64,
    pub time_low_energy_ratio: f64,
    /// Energy at or below this (and above 0) counts as low in the time-of-day detector.
    pub low_energy_max: u8,

    pub positive_min_entries: usize,
    pub positive_min_tag_count: usize,
    pub positive_energy_min: u8,
    pub positive_evidence_limit: usize,

    pub correlation_min_shared_days: usize,
    pub correlation_min_score: f64,

    /// Offset used for hour-of-day bucketing and calendar-day truncation.
    pub utc_offset_minutes: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_entries: 2,
            evidence_limit: 4,

            tag_min_support: 3,
            tag_mid_support: 4,
            tag_high_support: 5,

            emotion_window: 10,
            emotion_min_count: 3,
            emotion_high_count: 5,

            energy_window: 7,
            energy_min_entries: 3,
            energy_low_mean: 4.0,
            energy_high_mean: 3.0,

            keyword_window: 15,
            keyword_min_support: 4,
            keyword_mid_support: 6,
            keyword_top: 3,

            question_window: 10,
            question_min_entries: 5,
            question_min_answers: 4,
            question_high_answers: 6,

            time_min_entries: 3,
            time_negative_ratio: 0.6,
            time_low_energy_ratio: 0.5,
            low_energy_max: 3,

            positive_min_entries: 3,
            positive_min_tag_count: 2,
            positive_energy_min: 7,
            positive_evidence_limit: 3,

            correlation_min_shared_days: 2,
            correlation_min_score: 0.3,

            utc_offset_minutes: 0,
        }
    }
}

impl EngineConfig {
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix())
    }
}
