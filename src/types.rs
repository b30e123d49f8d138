//! Common Types and Constants
//!
//! Shared data structures used across the scheduler, the queue query engine
//! and the session layer. Every record serializes with camelCase keys so a
//! persisted state stays readable by the web client.

use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Consecutive "known" answers needed to leave a stage forward
pub const REQUIRED_CONSECUTIVE_CORRECT: u32 = 3;

/// Consecutive "unknown" answers needed to fall back one stage
pub const REQUIRED_CONSECUTIVE_WRONG: u32 = 3;

pub const MINUTE_MS: i64 = 60 * 1000;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// Short retry delay after a wrong answer that did not trigger a demotion
pub const RETRY_DELAY_MS: i64 = 5 * MINUTE_MS;

/// `version` tag written into exported payloads
pub const EXPORT_VERSION: &str = "1.0";

/// Schema tag of the persisted envelope
pub const SCHEMA_VERSION: u32 = 1;

// ==================== Stage ====================

/// Mastery stage of a word in the learning queue.
///
/// Declaration order is the progression order, so `Ord` sorts
/// `Passive < Active < Review1 < Review2 < Review3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Passive,
    Active,
    Review1,
    Review2,
    Review3,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Passive,
        Stage::Active,
        Stage::Review1,
        Stage::Review2,
        Stage::Review3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Passive => "passive",
            Stage::Active => "active",
            Stage::Review1 => "review1",
            Stage::Review2 => "review2",
            Stage::Review3 => "review3",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "passive" => Some(Stage::Passive),
            "active" => Some(Stage::Active),
            "review1" => Some(Stage::Review1),
            "review2" => Some(Stage::Review2),
            "review3" => Some(Stage::Review3),
            _ => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==================== Queue Item ====================

/// Progress record of one word while it sits in the learning queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordLearningItem {
    /// Index into the vocabulary collection
    pub word_id: i64,
    pub stage: Stage,
    pub consecutive_correct: u32,
    pub consecutive_wrong: u32,
    /// Epoch millis; the item is eligible once `now >= show_after`
    pub show_after: i64,
    /// Responses ever recorded for this item
    pub attempts: u32,
    pub added_at: i64,
    /// Epoch millis of the latest response, 0 when never answered
    pub last_seen: i64,
}

/// A single answer submitted for a card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardResponse {
    pub word_id: i64,
    pub known: bool,
    /// Time the learner needed to answer (ms)
    #[serde(default)]
    pub response_time: i64,
    pub timestamp: i64,
}

impl CardResponse {
    pub fn new(word_id: i64, known: bool, timestamp: i64) -> Self {
        Self {
            word_id,
            known,
            response_time: 0,
            timestamp,
        }
    }
}

// ==================== Session Types ====================

/// Which screen the learner is on. Never influences card selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningMode {
    #[default]
    Learning,
    Reviewing,
    Adding,
}

impl LearningMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "learning" => Some(LearningMode::Learning),
            "reviewing" => Some(LearningMode::Reviewing),
            "adding" => Some(LearningMode::Adding),
            _ => None,
        }
    }
}

/// Proficiency level produced by the placement test
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    #[default]
    A1,
    A2,
    B1,
    B2,
}

impl Level {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "A1" => Some(Level::A1),
            "A2" => Some(Level::A2),
            "B1" => Some(Level::B1),
            "B2" => Some(Level::B2),
            _ => None,
        }
    }

    /// First vocabulary index taught at this level
    pub fn starting_index(&self) -> i64 {
        match self {
            Level::A1 => 0,
            Level::A2 => 800,
            Level::B1 => 2000,
            Level::B2 => 4000,
        }
    }

    /// Last vocabulary index taught at this level (inclusive)
    pub fn max_index(&self) -> i64 {
        match self {
            Level::A1 => 799,
            Level::A2 => 1999,
            Level::B1 => 3999,
            Level::B2 => 4999,
        }
    }
}

/// One answer from the placement test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelTestResult {
    pub word_id: i64,
    pub known: bool,
}

/// Per-day activity counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    /// ISO date, `YYYY-MM-DD`
    pub date: String,
    pub new_words: u32,
    pub review_words: u32,
    /// Seconds spent studying
    pub time_spent: u64,
    pub streak_days: u32,
}

impl DailyStats {
    pub fn for_date(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            new_words: 0,
            review_words: 0,
            time_spent: 0,
            streak_days: 1,
        }
    }
}

// ==================== Query Results ====================

/// Available/scheduled split of one stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    pub available: usize,
    pub scheduled: usize,
    pub total: usize,
}

/// Queue statistics per stage plus the learned count
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub passive: StageCounts,
    pub active: StageCounts,
    pub review1: StageCounts,
    pub review2: StageCounts,
    pub review3: StageCounts,
    pub learned: usize,
}

impl QueueStats {
    pub fn stage(&self, stage: Stage) -> &StageCounts {
        match stage {
            Stage::Passive => &self.passive,
            Stage::Active => &self.active,
            Stage::Review1 => &self.review1,
            Stage::Review2 => &self.review2,
            Stage::Review3 => &self.review3,
        }
    }

    pub fn stage_mut(&mut self, stage: Stage) -> &mut StageCounts {
        match stage {
            Stage::Passive => &mut self.passive,
            Stage::Active => &mut self.active,
            Stage::Review1 => &mut self.review1,
            Stage::Review2 => &mut self.review2,
            Stage::Review3 => &mut self.review3,
        }
    }

    /// Sum of all stage totals, equal to the queue length
    pub fn queued(&self) -> usize {
        Stage::ALL.iter().map(|s| self.stage(*s).total).sum()
    }
}

/// Which side of the word is shown first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardDirection {
    /// Learning language shown, native translation expected
    SourceToTarget,
    /// Native translation shown, learning language expected
    TargetToSource,
}

impl CardDirection {
    pub fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::Passive => CardDirection::SourceToTarget,
            _ => CardDirection::TargetToSource,
        }
    }
}

/// Display-ready projection of the next item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentCard {
    pub word_id: i64,
    pub word: String,
    pub props: Vec<String>,
    pub translations: Vec<String>,
    pub direction: CardDirection,
    pub stage: Stage,
    pub attempts: u32,
    pub consecutive_correct: u32,
    pub consecutive_wrong: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_follows_progression() {
        let mut stages = vec![Stage::Review3, Stage::Passive, Stage::Review1, Stage::Active];
        stages.sort();
        assert_eq!(
            stages,
            vec![Stage::Passive, Stage::Active, Stage::Review1, Stage::Review3]
        );
    }

    #[test]
    fn test_stage_serializes_lowercase() {
        let json = serde_json::to_string(&Stage::Review2).unwrap();
        assert_eq!(json, "\"review2\"");
        assert_eq!(Stage::parse("review2"), Some(Stage::Review2));
        assert_eq!(Stage::parse("learned"), None);
    }

    #[test]
    fn test_item_uses_camel_case_keys() {
        let item = WordLearningItem {
            word_id: 7,
            stage: Stage::Passive,
            consecutive_correct: 0,
            consecutive_wrong: 0,
            show_after: 10,
            attempts: 0,
            added_at: 10,
            last_seen: 0,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["wordId"], 7);
        assert_eq!(value["showAfter"], 10);
        assert_eq!(value["stage"], "passive");
    }

    #[test]
    fn test_level_ranges() {
        assert_eq!(Level::A1.starting_index(), 0);
        assert_eq!(Level::B2.starting_index(), 4000);
        assert_eq!(Level::A2.max_index(), 1999);
        assert_eq!(Level::parse("b1"), Some(Level::B1));
        assert_eq!(Level::parse("C1"), None);
    }

    #[test]
    fn test_card_direction_by_stage() {
        assert_eq!(
            CardDirection::for_stage(Stage::Passive),
            CardDirection::SourceToTarget
        );
        assert_eq!(
            CardDirection::for_stage(Stage::Review2),
            CardDirection::TargetToSource
        );
    }
}
