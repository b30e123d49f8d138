//! Session State Manager
//!
//! Owns the aggregate learning state and exposes the operations the
//! application calls. Derived views (next card, queue stats, analytics) are
//! recomputed from the state on every call.
//!
//! The session is single-writer: hosts that share it across threads must
//! serialize access themselves. After any mutating call the host may persist
//! a snapshot with [`LearningSession::persist`].

pub mod snapshot;

use std::cell::Cell;
use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::queue;
use crate::scheduler::{self, ResponseOutcome, WordEfficiency};
use crate::types::{
    CardDirection, CardResponse, CurrentCard, DailyStats, LearningMode, Level, LevelTestResult,
    QueueStats, Stage, WordLearningItem,
};
use crate::vocabulary::Vocabulary;

// ==================== Clock ====================

/// Source of "now" in epoch milliseconds
pub trait Clock {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock for tests and simulations
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<i64>,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self { now: Cell::new(now) }
    }

    pub fn set(&self, now: i64) {
        self.now.set(now);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now.set(self.now.get().saturating_add(delta_ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

/// `YYYY-MM-DD` of an epoch-millis timestamp (UTC)
pub fn date_string(now_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(now_ms)
        .unwrap_or_default()
        .format("%Y-%m-%d")
        .to_string()
}

// ==================== State ====================

/// Aggregate learning state, serialized as-is into snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningState {
    pub detected_level: Level,
    pub level_test_results: Vec<LevelTestResult>,
    /// Highest word index reached
    pub progress: i64,
    pub words_learned: u32,
    /// Stage transitions (promotions and demotions) recorded
    pub words_reviewed: u32,
    pub learning_queue: Vec<WordLearningItem>,
    pub learned_words: Vec<i64>,
    pub current_mode: LearningMode,
    pub last_activity: i64,
    pub session_start_time: i64,
    pub today_stats: DailyStats,
}

impl LearningState {
    pub fn new(now: i64) -> Self {
        Self {
            detected_level: Level::default(),
            level_test_results: Vec::new(),
            progress: 0,
            words_learned: 0,
            words_reviewed: 0,
            learning_queue: Vec::new(),
            learned_words: Vec::new(),
            current_mode: LearningMode::default(),
            last_activity: now,
            session_start_time: now,
            today_stats: DailyStats::for_date(date_string(now)),
        }
    }

    pub fn contains(&self, word_id: i64) -> bool {
        self.is_queued(word_id) || self.is_learned(word_id)
    }

    pub fn is_queued(&self, word_id: i64) -> bool {
        self.learning_queue.iter().any(|item| item.word_id == word_id)
    }

    pub fn is_learned(&self, word_id: i64) -> bool {
        self.learned_words.contains(&word_id)
    }

    fn item_index(&self, word_id: i64) -> Option<usize> {
        self.learning_queue
            .iter()
            .position(|item| item.word_id == word_id)
    }
}

/// Read-only summary of the whole session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningAnalytics {
    /// Queue plus learned words
    pub total_words: usize,
    pub words_learned: usize,
    pub average_attempts_per_stage: BTreeMap<Stage, f64>,
    /// Learned words per recorded attempt, 0 without attempts
    pub learning_efficiency: f64,
}

// ==================== Session ====================

pub struct LearningSession<C: Clock = SystemClock> {
    state: LearningState,
    config: SchedulerConfig,
    clock: C,
}

impl LearningSession<SystemClock> {
    pub fn with_system_clock(config: SchedulerConfig) -> Self {
        Self::new(config, SystemClock)
    }
}

impl<C: Clock> LearningSession<C> {
    pub fn new(config: SchedulerConfig, clock: C) -> Self {
        let state = LearningState::new(clock.now_ms());
        Self {
            state,
            config,
            clock,
        }
    }

    pub fn with_state(state: LearningState, config: SchedulerConfig, clock: C) -> Self {
        Self {
            state,
            config,
            clock,
        }
    }

    pub fn state(&self) -> &LearningState {
        &self.state
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn now(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn into_state(self) -> LearningState {
        self.state
    }

    // ==================== Queue mutation ====================

    /// Enqueue a word at `passive`. Returns `false` when it is already queued or learned.
    pub fn add_word(&mut self, word_id: i64) -> Result<bool, SchedulerError> {
        if self.state.contains(word_id) {
            debug!(word_id, "word already tracked, not adding");
            return Ok(false);
        }

        let item = scheduler::create_item(word_id, self.now()).inspect_err(|err| {
            warn!(word_id, error = %err, "rejected add_word");
        })?;

        self.state.learning_queue.push(item);
        self.state.progress = self.state.progress.max(word_id);
        self.state.today_stats.new_words = self.state.today_stats.new_words.saturating_add(1);
        Ok(true)
    }

    /// Apply an answer to the matching queue item
    pub fn submit_response(
        &mut self,
        response: &CardResponse,
    ) -> Result<ResponseOutcome, SchedulerError> {
        let Some(index) = self.state.item_index(response.word_id) else {
            warn!(word_id = response.word_id, "response for word not in queue");
            return Err(SchedulerError::WordNotInQueue(response.word_id));
        };

        let outcome =
            scheduler::apply_response(&self.state.learning_queue[index], response, &self.config);

        if outcome.was_learned {
            self.state.learning_queue.remove(index);
            self.state.learned_words.push(response.word_id);
            self.state.words_learned = self.state.words_learned.saturating_add(1);
            debug!(word_id = response.word_id, "word graduated");
        } else {
            if outcome.stage_changed {
                debug!(
                    word_id = response.word_id,
                    from = %self.state.learning_queue[index].stage,
                    to = %outcome.item.stage,
                    "stage changed"
                );
            }
            self.state.learning_queue[index] = outcome.item.clone();
        }

        if outcome.stage_changed {
            self.state.words_reviewed = self.state.words_reviewed.saturating_add(1);
        }
        self.state.last_activity = response.timestamp;
        let stats = &mut self.state.today_stats;
        stats.review_words = stats.review_words.saturating_add(1);

        Ok(outcome)
    }

    pub fn reset_item_progress(&mut self, word_id: i64) -> Result<(), SchedulerError> {
        let item = self.item_mut(word_id)?;
        scheduler::reset_item_progress(item);
        Ok(())
    }

    /// Overwrite `show_after` directly. The caller keeps it `>= added_at`.
    pub fn reschedule(&mut self, word_id: i64, new_show_after: i64) -> Result<(), SchedulerError> {
        let item = self.item_mut(word_id)?;
        scheduler::reschedule_item(item, new_show_after);
        Ok(())
    }

    fn item_mut(&mut self, word_id: i64) -> Result<&mut WordLearningItem, SchedulerError> {
        match self.state.item_index(word_id) {
            Some(index) => Ok(&mut self.state.learning_queue[index]),
            None => {
                warn!(word_id, "word not in queue");
                Err(SchedulerError::WordNotInQueue(word_id))
            }
        }
    }

    /// Record a word as learned outside the queue (placement test).
    /// Returns `false` if it was learned already.
    pub fn mark_learned(&mut self, word_id: i64) -> Result<bool, SchedulerError> {
        if word_id < 0 {
            warn!(word_id, "rejected mark_learned");
            return Err(SchedulerError::InvalidWordId(word_id));
        }
        if self.state.is_learned(word_id) {
            return Ok(false);
        }

        self.state
            .learning_queue
            .retain(|item| item.word_id != word_id);
        self.state.learned_words.push(word_id);
        self.state.words_learned = self.state.words_learned.saturating_add(1);
        self.state.progress = self.state.progress.max(word_id.saturating_add(1));
        self.state.last_activity = self.now();
        Ok(true)
    }

    // ==================== Session fields ====================

    pub fn switch_mode(&mut self, mode: LearningMode) {
        self.state.current_mode = mode;
        self.state.last_activity = self.now();
    }

    pub fn set_detected_level(&mut self, level: Level) {
        self.state.detected_level = level;
    }

    /// Take over the placement test outcome: level, raw answers, starting
    /// index, and every known word as learned.
    pub fn apply_placement(&mut self, level: Level, results: &[LevelTestResult]) {
        self.state.detected_level = level;
        self.state.level_test_results = results.to_vec();
        self.state.progress = self.state.progress.max(level.starting_index());

        for result in results.iter().filter(|r| r.known) {
            if let Err(err) = self.mark_learned(result.word_id) {
                warn!(word_id = result.word_id, error = %err, "skipping placement result");
            }
        }
    }

    /// Next vocabulary index to enqueue, starting from `progress` and bounded
    /// by the detected level and the vocabulary size
    pub fn next_unused_word(&self, vocabulary_len: usize) -> Option<i64> {
        let limit = self
            .state
            .detected_level
            .max_index()
            .min(vocabulary_len as i64 - 1);
        let used: HashSet<i64> = self
            .state
            .learning_queue
            .iter()
            .map(|item| item.word_id)
            .chain(self.state.learned_words.iter().copied())
            .collect();

        (self.state.progress.max(0)..=limit).find(|index| !used.contains(index))
    }

    /// Start a new calendar day if `today` differs from the stored date
    pub fn roll_over_day(&mut self, today: NaiveDate) {
        let today_str = today.format("%Y-%m-%d").to_string();
        let stats = &mut self.state.today_stats;
        if stats.date == today_str {
            return;
        }

        let consecutive = NaiveDate::parse_from_str(&stats.date, "%Y-%m-%d")
            .ok()
            .and_then(|previous| previous.succ_opt())
            .is_some_and(|next| next == today);
        let streak_days = if consecutive {
            stats.streak_days.saturating_add(1)
        } else {
            1
        };

        *stats = DailyStats {
            streak_days,
            ..DailyStats::for_date(today_str)
        };
    }

    pub fn record_time_spent(&mut self, seconds: u64) {
        let stats = &mut self.state.today_stats;
        stats.time_spent = stats.time_spent.saturating_add(seconds);
    }

    /// Replace everything with a fresh default state
    pub fn reset_all(&mut self) {
        self.state = LearningState::new(self.now());
    }

    // ==================== Derived views ====================

    pub fn next_item(&self) -> Option<&WordLearningItem> {
        queue::next_word_to_study(&self.state.learning_queue, self.now())
    }

    pub fn next_card(&self, vocabulary: &dyn Vocabulary) -> Option<CurrentCard> {
        let item = self.next_item()?;
        let Some(word) = vocabulary.word_by_index(item.word_id) else {
            warn!(word_id = item.word_id, "queued word missing from vocabulary");
            return None;
        };

        Some(CurrentCard {
            word_id: item.word_id,
            word: word.word.clone(),
            props: word.props.clone(),
            translations: word.translations.clone(),
            direction: CardDirection::for_stage(item.stage),
            stage: item.stage,
            attempts: item.attempts,
            consecutive_correct: item.consecutive_correct,
            consecutive_wrong: item.consecutive_wrong,
        })
    }

    pub fn queue_stats(&self) -> QueueStats {
        queue::generate_queue_stats(
            &self.state.learning_queue,
            &self.state.learned_words,
            self.now(),
        )
    }

    pub fn available_count(&self) -> usize {
        queue::available_words(&self.state.learning_queue, self.now()).len()
    }

    pub fn overdue_count(&self) -> usize {
        queue::overdue_words(&self.state.learning_queue, self.now()).len()
    }

    pub fn words_by_stage(&self, stage: Stage) -> Vec<&WordLearningItem> {
        queue::words_by_stage(&self.state.learning_queue, stage)
    }

    pub fn word_efficiency(&self, word_id: i64) -> Option<WordEfficiency> {
        queue::find_item(&self.state.learning_queue, word_id)
            .map(|item| scheduler::word_efficiency(item, self.now()))
    }

    pub fn analytics(&self) -> LearningAnalytics {
        let queue = &self.state.learning_queue;

        let average_attempts_per_stage = Stage::ALL
            .iter()
            .map(|stage| {
                let (total, count) = queue
                    .iter()
                    .filter(|item| item.stage == *stage)
                    .fold((0u64, 0u64), |(total, count), item| {
                        (total + u64::from(item.attempts), count + 1)
                    });
                let average = if count > 0 {
                    total as f64 / count as f64
                } else {
                    0.0
                };
                (*stage, average)
            })
            .collect();

        let total_attempts: u64 = queue.iter().map(|item| u64::from(item.attempts)).sum();
        let learning_efficiency = if total_attempts > 0 {
            self.state.learned_words.len() as f64 / total_attempts as f64
        } else {
            0.0
        };

        LearningAnalytics {
            total_words: queue.len() + self.state.learned_words.len(),
            words_learned: self.state.learned_words.len(),
            average_attempts_per_stage,
            learning_efficiency,
        }
    }
}
