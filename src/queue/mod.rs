//! Queue Query Engine
//!
//! Read-only views over a queue snapshot and a reference time. The queue
//! itself is unordered; presentation order is computed here.
//!
//! Selection priority (`next_word_to_study`):
//! 1. larger overdue amount `max(0, now - show_after)`
//! 2. earlier stage
//! 3. earlier `show_after`
//!
//! Remaining ties keep queue order, so the result is deterministic.

use std::cmp::Ordering;

use crate::types::{QueueStats, Stage, WordLearningItem};

/// Items whose show time has arrived
pub fn available_words(queue: &[WordLearningItem], now: i64) -> Vec<&WordLearningItem> {
    queue.iter().filter(|item| item.show_after <= now).collect()
}

/// Items still waiting for their show time
pub fn scheduled_words(queue: &[WordLearningItem], now: i64) -> Vec<&WordLearningItem> {
    queue.iter().filter(|item| item.show_after > now).collect()
}

pub fn words_by_stage(queue: &[WordLearningItem], stage: Stage) -> Vec<&WordLearningItem> {
    queue.iter().filter(|item| item.stage == stage).collect()
}

/// Items past their show time, excluding `passive` which has no enforced delay
pub fn overdue_words(queue: &[WordLearningItem], now: i64) -> Vec<&WordLearningItem> {
    queue
        .iter()
        .filter(|item| item.show_after < now && item.stage != Stage::Passive)
        .collect()
}

pub fn overdue_amount(item: &WordLearningItem, now: i64) -> i64 {
    now.saturating_sub(item.show_after).max(0)
}

fn study_priority(a: &WordLearningItem, b: &WordLearningItem, now: i64) -> Ordering {
    overdue_amount(b, now)
        .cmp(&overdue_amount(a, now))
        .then_with(|| a.stage.cmp(&b.stage))
        .then_with(|| a.show_after.cmp(&b.show_after))
}

/// Highest-priority available item, or `None` when nothing is due
pub fn next_word_to_study(queue: &[WordLearningItem], now: i64) -> Option<&WordLearningItem> {
    queue
        .iter()
        .filter(|item| item.show_after <= now)
        .min_by(|a, b| study_priority(a, b, now))
}

/// Available items in presentation order
pub fn study_order(queue: &[WordLearningItem], now: i64) -> Vec<&WordLearningItem> {
    let mut available = available_words(queue, now);
    available.sort_by(|a, b| study_priority(a, b, now));
    available
}

pub fn generate_queue_stats(
    queue: &[WordLearningItem],
    learned_words: &[i64],
    now: i64,
) -> QueueStats {
    let mut stats = QueueStats {
        learned: learned_words.len(),
        ..QueueStats::default()
    };

    for item in queue {
        let counts = stats.stage_mut(item.stage);
        counts.total += 1;
        if item.show_after <= now {
            counts.available += 1;
        } else {
            counts.scheduled += 1;
        }
    }

    stats
}

pub fn find_item(queue: &[WordLearningItem], word_id: i64) -> Option<&WordLearningItem> {
    queue.iter().find(|item| item.word_id == word_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HOUR_MS, MINUTE_MS};

    const NOW: i64 = 1_700_000_000_000;

    fn item(word_id: i64, stage: Stage, show_after: i64) -> WordLearningItem {
        WordLearningItem {
            word_id,
            stage,
            consecutive_correct: 0,
            consecutive_wrong: 0,
            show_after,
            attempts: 0,
            added_at: show_after.min(NOW - 10 * HOUR_MS),
            last_seen: 0,
        }
    }

    fn sample_queue() -> Vec<WordLearningItem> {
        vec![
            item(1, Stage::Passive, NOW),
            item(2, Stage::Active, NOW - HOUR_MS),
            item(3, Stage::Review1, NOW + HOUR_MS),
            item(4, Stage::Review2, NOW - MINUTE_MS),
            item(5, Stage::Passive, NOW - 2 * HOUR_MS),
        ]
    }

    #[test]
    fn test_available_and_scheduled_partition_queue() {
        let queue = sample_queue();
        let available = available_words(&queue, NOW);
        let scheduled = scheduled_words(&queue, NOW);
        assert_eq!(available.len() + scheduled.len(), queue.len());
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].word_id, 3);
    }

    #[test]
    fn test_words_by_stage() {
        let queue = sample_queue();
        let ids: Vec<i64> = words_by_stage(&queue, Stage::Passive)
            .iter()
            .map(|i| i.word_id)
            .collect();
        assert_eq!(ids, vec![1, 5]);
    }

    #[test]
    fn test_overdue_excludes_passive_and_due_now() {
        let queue = sample_queue();
        let ids: Vec<i64> = overdue_words(&queue, NOW).iter().map(|i| i.word_id).collect();
        assert_eq!(ids, vec![2, 4]);
    }

    #[test]
    fn test_most_overdue_wins() {
        let queue = sample_queue();
        let next = next_word_to_study(&queue, NOW).unwrap();
        assert_eq!(next.word_id, 5);
    }

    #[test]
    fn test_stage_breaks_overdue_tie() {
        let queue = vec![
            item(10, Stage::Review1, NOW),
            item(11, Stage::Passive, NOW),
            item(12, Stage::Active, NOW),
        ];
        assert_eq!(next_word_to_study(&queue, NOW).unwrap().word_id, 11);
    }

    #[test]
    fn test_empty_or_future_queue_yields_none() {
        assert!(next_word_to_study(&[], NOW).is_none());
        let queue = vec![item(1, Stage::Active, NOW + 1)];
        assert!(next_word_to_study(&queue, NOW).is_none());
    }

    #[test]
    fn test_equal_priority_keeps_queue_order() {
        let queue = vec![item(7, Stage::Passive, NOW), item(8, Stage::Passive, NOW)];
        assert_eq!(next_word_to_study(&queue, NOW).unwrap().word_id, 7);
    }

    #[test]
    fn test_study_order() {
        let queue = sample_queue();
        let ids: Vec<i64> = study_order(&queue, NOW).iter().map(|i| i.word_id).collect();
        assert_eq!(ids, vec![5, 2, 4, 1]);
    }

    #[test]
    fn test_queue_stats_sum() {
        let queue = sample_queue();
        let stats = generate_queue_stats(&queue, &[100, 101], NOW);
        assert_eq!(stats.learned, 2);
        assert_eq!(stats.passive.total, 2);
        assert_eq!(stats.review1.scheduled, 1);
        assert_eq!(stats.review1.available, 0);
        assert_eq!(stats.queued(), queue.len());
        for stage in Stage::ALL {
            let counts = stats.stage(stage);
            assert_eq!(counts.available + counts.scheduled, counts.total);
        }
    }
}
