use serde::{Deserialize, Serialize};

use crate::types::{
    Stage, DAY_MS, HOUR_MS, REQUIRED_CONSECUTIVE_CORRECT, REQUIRED_CONSECUTIVE_WRONG,
    RETRY_DELAY_MS,
};

/// Delay (ms) before a word scheduled into a stage becomes visible again
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDelays {
    pub passive: i64,
    pub active: i64,
    pub review1: i64,
    pub review2: i64,
    pub review3: i64,
}

impl Default for StageDelays {
    fn default() -> Self {
        Self {
            passive: 0,
            active: HOUR_MS,
            review1: DAY_MS,
            review2: 3 * DAY_MS,
            review3: 7 * DAY_MS,
        }
    }
}

impl StageDelays {
    pub fn for_stage(&self, stage: Stage) -> i64 {
        match stage {
            Stage::Passive => self.passive,
            Stage::Active => self.active,
            Stage::Review1 => self.review1,
            Stage::Review2 => self.review2,
            Stage::Review3 => self.review3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerConfig {
    pub required_consecutive_correct: u32,
    pub required_consecutive_wrong: u32,
    pub retry_delay_ms: i64,
    pub stage_delays: StageDelays,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            required_consecutive_correct: REQUIRED_CONSECUTIVE_CORRECT,
            required_consecutive_wrong: REQUIRED_CONSECUTIVE_WRONG,
            retry_delay_ms: RETRY_DELAY_MS,
            stage_delays: StageDelays::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(val) = env_positive::<u32>("DANCI_REQUIRED_CORRECT") {
            config.required_consecutive_correct = val;
        }
        if let Some(val) = env_positive::<u32>("DANCI_REQUIRED_WRONG") {
            config.required_consecutive_wrong = val;
        }
        if let Some(val) = env_positive::<i64>("DANCI_RETRY_DELAY_MS") {
            config.retry_delay_ms = val;
        }

        config
    }
}

fn env_positive<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
        .filter(|value| *value > T::default())
}

/// Settings of the command-line driver
#[derive(Debug, Clone)]
pub struct Config {
    pub state_path: String,
    pub vocab_path: String,
    pub log_level: String,
    /// Directory for rolling log files; file logging is off when unset
    pub log_dir: Option<String>,
    pub scheduler: SchedulerConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let state_path = std::env::var("DANCI_STATE_PATH")
            .unwrap_or_else(|_| "./danci-state.json".to_string());
        let vocab_path =
            std::env::var("DANCI_VOCAB_PATH").unwrap_or_else(|_| "./words.json".to_string());
        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let log_dir = std::env::var("DANCI_LOG_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty());

        Self {
            state_path,
            vocab_path,
            log_level,
            log_dir,
            scheduler: SchedulerConfig::from_env(),
        }
    }
}
