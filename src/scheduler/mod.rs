//! Stage Scheduler
//!
//! Pure functions driving a word through the five mastery stages.
//!
//! Core rules:
//! - A streak of `required_consecutive_correct` known answers promotes the
//!   word one stage; at `review3` the same streak graduates it out of the queue
//! - A streak of `required_consecutive_wrong` unknown answers demotes the word
//!   one stage; at `passive` the streak is simply cleared
//! - Any other unknown answer pushes the word back by the short retry delay
//! - A stage transition schedules the word `delay(new stage)` after the answer
//!
//! None of these functions read the wall clock; callers pass timestamps in.

use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::types::{CardResponse, Stage, WordLearningItem, DAY_MS};

// ==================== Stage Policy ====================

/// Forward transition; `None` at `review3` means "graduate"
pub fn next_stage(stage: Stage) -> Option<Stage> {
    match stage {
        Stage::Passive => Some(Stage::Active),
        Stage::Active => Some(Stage::Review1),
        Stage::Review1 => Some(Stage::Review2),
        Stage::Review2 => Some(Stage::Review3),
        Stage::Review3 => None,
    }
}

/// Backward transition; `None` at `passive` means "cannot regress"
pub fn previous_stage(stage: Stage) -> Option<Stage> {
    match stage {
        Stage::Passive => None,
        Stage::Active => Some(Stage::Passive),
        Stage::Review1 => Some(Stage::Active),
        Stage::Review2 => Some(Stage::Review1),
        Stage::Review3 => Some(Stage::Review2),
    }
}

/// Timestamp at which a word just scheduled into `stage` becomes visible
pub fn next_show_time(stage: Stage, base_time: i64, config: &SchedulerConfig) -> i64 {
    base_time.saturating_add(config.stage_delays.for_stage(stage))
}

// ==================== Item Lifecycle ====================

/// Build a fresh `passive` item, available immediately
pub fn create_item(word_id: i64, now: i64) -> Result<WordLearningItem, SchedulerError> {
    if word_id < 0 {
        return Err(SchedulerError::InvalidWordId(word_id));
    }

    Ok(WordLearningItem {
        word_id,
        stage: Stage::Passive,
        consecutive_correct: 0,
        consecutive_wrong: 0,
        show_after: now,
        attempts: 0,
        added_at: now,
        last_seen: 0,
    })
}

/// Result of applying one answer to an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseOutcome {
    pub item: WordLearningItem,
    pub stage_changed: bool,
    pub was_promoted: bool,
    pub was_demoted: bool,
    /// The item finished `review3`; the caller removes it from the queue
    pub was_learned: bool,
}

/// Apply an answer to an item and report what happened.
///
/// `response.word_id` must match `item.word_id`; pairing them is the caller's job.
pub fn apply_response(
    item: &WordLearningItem,
    response: &CardResponse,
    config: &SchedulerConfig,
) -> ResponseOutcome {
    debug_assert_eq!(item.word_id, response.word_id, "response paired with wrong item");

    let mut updated = item.clone();
    updated.attempts = updated.attempts.saturating_add(1);
    updated.last_seen = response.timestamp;

    let mut was_promoted = false;
    let mut was_demoted = false;
    let mut was_learned = false;

    if response.known {
        updated.consecutive_correct = updated.consecutive_correct.saturating_add(1);
        updated.consecutive_wrong = 0;

        if updated.consecutive_correct >= config.required_consecutive_correct {
            match next_stage(updated.stage) {
                Some(stage) => {
                    updated.stage = stage;
                    updated.consecutive_correct = 0;
                    updated.show_after = scheduled_show_after(&updated, response.timestamp, config);
                    was_promoted = true;
                }
                None => was_learned = true,
            }
        }
    } else {
        updated.consecutive_wrong = updated.consecutive_wrong.saturating_add(1);
        updated.consecutive_correct = 0;

        if updated.consecutive_wrong >= config.required_consecutive_wrong {
            match previous_stage(updated.stage) {
                Some(stage) => {
                    updated.stage = stage;
                    updated.consecutive_wrong = 0;
                    updated.show_after = scheduled_show_after(&updated, response.timestamp, config);
                    was_demoted = true;
                }
                None => updated.consecutive_wrong = 0,
            }
        } else {
            updated.show_after = response
                .timestamp
                .saturating_add(config.retry_delay_ms)
                .max(updated.added_at);
        }
    }

    ResponseOutcome {
        item: updated,
        stage_changed: was_promoted || was_demoted,
        was_promoted,
        was_demoted,
        was_learned,
    }
}

// show_after never precedes added_at, even for answers timestamped before the item existed
fn scheduled_show_after(item: &WordLearningItem, timestamp: i64, config: &SchedulerConfig) -> i64 {
    next_show_time(item.stage, timestamp, config).max(item.added_at)
}

/// Clear both streak counters, keeping stage and schedule
pub fn reset_item_progress(item: &mut WordLearningItem) {
    item.consecutive_correct = 0;
    item.consecutive_wrong = 0;
}

/// Manual override of the show time. Not validated against `added_at`.
pub fn reschedule_item(item: &mut WordLearningItem, show_after: i64) {
    item.show_after = show_after;
}

// ==================== Analytics ====================

/// Per-word learning metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordEfficiency {
    pub attempts: u32,
    pub days_since_added: f64,
    /// Position in the stage ladder, 0.2 (passive) to 1.0 (review3)
    pub progress_rate: f64,
}

pub fn stage_progress_rate(stage: Stage) -> f64 {
    match stage {
        Stage::Passive => 0.2,
        Stage::Active => 0.4,
        Stage::Review1 => 0.6,
        Stage::Review2 => 0.8,
        Stage::Review3 => 1.0,
    }
}

pub fn word_efficiency(item: &WordLearningItem, now: i64) -> WordEfficiency {
    let elapsed = now.saturating_sub(item.added_at).max(0);
    WordEfficiency {
        attempts: item.attempts,
        days_since_added: elapsed as f64 / DAY_MS as f64,
        progress_rate: stage_progress_rate(item.stage),
    }
}
