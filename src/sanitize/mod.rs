//! Data Sanitization
//!
//! Structural validation of queue items and defensive coercion of externally
//! supplied state.
//!
//! Functions:
//! - Queue item validation (`validate_item`)
//! - Field-by-field coercion of a JSON state payload with per-field defaults
//! - Queue/learned-set hygiene (duplicates, overlaps)
//!
//! Nothing here fails on malformed input: bad fields fall back to defaults and
//! bad queue items are dropped.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::config::SchedulerConfig;
use crate::session::LearningState;
use crate::types::{DailyStats, LearningMode, Level, LevelTestResult, Stage, WordLearningItem};

/// Outcome of `validate_item`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Check the structural invariants of a queue item.
///
/// Stage validity is enforced by the type; items with an unknown stage never
/// deserialize and are rejected by `coerce_queue_item`.
pub fn validate_item(item: &WordLearningItem, now: i64, config: &SchedulerConfig) -> ItemValidation {
    let mut errors = Vec::new();

    if item.word_id < 0 {
        errors.push("wordId must be non-negative".to_string());
    }
    if item.consecutive_correct > config.required_consecutive_correct {
        errors.push("consecutiveCorrect out of valid range".to_string());
    }
    if item.consecutive_wrong > config.required_consecutive_wrong {
        errors.push("consecutiveWrong out of valid range".to_string());
    }
    if item.added_at > now {
        errors.push("addedAt cannot be in the future".to_string());
    }
    if item.show_after < item.added_at {
        errors.push("showAfter cannot be before addedAt".to_string());
    }

    ItemValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Build one queue item from a raw entry, `None` if it must be dropped.
///
/// `wordId` and `stage` are required. Other fields fall back to defaults when
/// missing or mistyped; negative counts drop the item. Streak counters above
/// the configured thresholds are clamped so that lowering a threshold keeps
/// existing progress.
pub fn coerce_queue_item(
    value: &Value,
    now: i64,
    config: &SchedulerConfig,
) -> Option<WordLearningItem> {
    let Some(word_id) = value.get("wordId").and_then(as_i64_lenient) else {
        warn!("dropping queue item without a wordId");
        return None;
    };
    let Some(stage) = value.get("stage").and_then(Value::as_str).and_then(Stage::parse) else {
        warn!(word_id, "dropping queue item with unknown stage");
        return None;
    };
    let (Some(correct), Some(wrong), Some(attempts)) = (
        item_count(value, "consecutiveCorrect"),
        item_count(value, "consecutiveWrong"),
        item_count(value, "attempts"),
    ) else {
        warn!(word_id, "dropping queue item with negative counters");
        return None;
    };

    let added_at = field_i64(value, "addedAt", now);
    let item = WordLearningItem {
        word_id,
        stage,
        consecutive_correct: correct.min(config.required_consecutive_correct),
        consecutive_wrong: wrong.min(config.required_consecutive_wrong),
        show_after: field_i64(value, "showAfter", added_at),
        attempts,
        added_at,
        last_seen: field_i64(value, "lastSeen", 0),
    };

    let validation = validate_item(&item, now, config);
    if !validation.is_valid {
        warn!(
            word_id = item.word_id,
            errors = ?validation.errors,
            "dropping invalid queue item"
        );
        return None;
    }

    Some(item)
}

// ==================== Field Coercion ====================

/// Integer view of a JSON number, accepting integral floats
pub fn as_i64_lenient(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn field_i64(obj: &Value, key: &str, default: i64) -> i64 {
    obj.get(key).and_then(as_i64_lenient).unwrap_or(default)
}

// Missing or mistyped -> 0, negative -> None
fn item_count(obj: &Value, key: &str) -> Option<u32> {
    match obj.get(key).and_then(as_i64_lenient) {
        None => Some(0),
        Some(v) if v < 0 => None,
        Some(v) => Some(u32::try_from(v).unwrap_or(u32::MAX)),
    }
}

fn field_u32(obj: &Value, key: &str, default: u32) -> u32 {
    obj.get(key)
        .and_then(as_i64_lenient)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(default)
}

fn field_u64(obj: &Value, key: &str, default: u64) -> u64 {
    obj.get(key)
        .and_then(as_i64_lenient)
        .and_then(|v| u64::try_from(v).ok())
        .unwrap_or(default)
}

fn field_string(obj: &Value, key: &str, default: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

fn coerce_daily_stats(value: Option<&Value>, defaults: &DailyStats) -> DailyStats {
    let Some(obj) = value.filter(|v| v.is_object()) else {
        return defaults.clone();
    };

    DailyStats {
        date: field_string(obj, "date", &defaults.date),
        new_words: field_u32(obj, "newWords", defaults.new_words),
        review_words: field_u32(obj, "reviewWords", defaults.review_words),
        time_spent: field_u64(obj, "timeSpent", defaults.time_spent),
        streak_days: field_u32(obj, "streakDays", defaults.streak_days),
    }
}

fn coerce_level_results(value: Option<&Value>) -> Vec<LevelTestResult> {
    value
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let word_id = entry.get("wordId").and_then(as_i64_lenient)?;
                    let known = entry.get("known").and_then(Value::as_bool)?;
                    (word_id >= 0).then_some(LevelTestResult { word_id, known })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn coerce_learned_words(value: Option<&Value>) -> Vec<i64> {
    let mut seen = HashSet::new();
    value
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(as_i64_lenient)
                .filter(|id| *id >= 0 && seen.insert(*id))
                .collect()
        })
        .unwrap_or_default()
}

/// Valid queue items, first occurrence per word, none already learned
fn coerce_queue(
    value: Option<&Value>,
    learned: &[i64],
    now: i64,
    config: &SchedulerConfig,
) -> Vec<WordLearningItem> {
    let Some(entries) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    let learned: HashSet<i64> = learned.iter().copied().collect();
    let mut seen = HashSet::new();
    let mut queue = Vec::with_capacity(entries.len());

    for entry in entries {
        let Some(item) = coerce_queue_item(entry, now, config) else {
            continue;
        };
        if learned.contains(&item.word_id) {
            warn!(word_id = item.word_id, "dropping queue item already learned");
            continue;
        }
        if !seen.insert(item.word_id) {
            warn!(word_id = item.word_id, "dropping duplicate queue item");
            continue;
        }
        queue.push(item);
    }

    queue
}

/// Build a state from arbitrary JSON, substituting `defaults` field by field
pub fn coerce_state(
    value: &Value,
    defaults: LearningState,
    now: i64,
    config: &SchedulerConfig,
) -> LearningState {
    if !value.is_object() {
        warn!("state payload is not an object, using defaults");
        return defaults;
    }

    let learned_words = coerce_learned_words(value.get("learnedWords"));
    let learning_queue = coerce_queue(value.get("learningQueue"), &learned_words, now, config);

    LearningState {
        detected_level: value
            .get("detectedLevel")
            .and_then(Value::as_str)
            .and_then(Level::parse)
            .unwrap_or(defaults.detected_level),
        level_test_results: coerce_level_results(value.get("levelTestResults")),
        progress: field_i64(value, "progress", defaults.progress).max(0),
        words_learned: field_u32(value, "wordsLearned", defaults.words_learned),
        words_reviewed: field_u32(value, "wordsReviewed", defaults.words_reviewed),
        learning_queue,
        learned_words,
        current_mode: value
            .get("currentMode")
            .and_then(Value::as_str)
            .and_then(LearningMode::parse)
            .unwrap_or(defaults.current_mode),
        last_activity: field_i64(value, "lastActivity", defaults.last_activity),
        session_start_time: field_i64(value, "sessionStartTime", defaults.session_start_time),
        today_stats: coerce_daily_stats(value.get("todayStats"), &defaults.today_stats),
    }
}
