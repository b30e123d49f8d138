//! Integration tests for the learning session.
//!
//! Covers the end-to-end card flow, selection priority across stages, and
//! persistence through a JSON file store.

use danci_scheduler::{
    CardDirection, CardResponse, InMemoryVocabulary, JsonFileStore, LearningSession,
    LearningState, ManualClock, MemoryStore, SchedulerConfig, Stage, StateStore, WordData, DAY_MS,
    HOUR_MS, MINUTE_MS,
};

const T: i64 = 1_700_000_000_000;

fn vocabulary() -> InMemoryVocabulary {
    InMemoryVocabulary::new(
        (0..100)
            .map(|i| WordData {
                id: i,
                word: format!("mot{i}"),
                props: vec![],
                translations: vec![format!("word{i}")],
            })
            .collect(),
    )
}

fn session_at(clock: &ManualClock) -> LearningSession<&ManualClock> {
    LearningSession::new(SchedulerConfig::default(), clock)
}

#[test]
fn test_end_to_end_promotion_hides_word() {
    let clock = ManualClock::new(T);
    let mut session = session_at(&clock);
    let vocab = vocabulary();

    session.add_word(42).unwrap();
    let card = session.next_card(&vocab).unwrap();
    assert_eq!(card.word_id, 42);
    assert_eq!(card.stage, Stage::Passive);
    assert_eq!(card.direction, CardDirection::SourceToTarget);

    for _ in 0..3 {
        session
            .submit_response(&CardResponse::new(42, true, T + 1))
            .unwrap();
    }

    let item = &session.state().learning_queue[0];
    assert_eq!(item.stage, Stage::Active);
    assert_eq!(item.show_after, T + 1 + 3_600_000);

    clock.set(T + 10 * MINUTE_MS);
    assert!(session.next_card(&vocab).is_none());

    clock.set(T + 1 + HOUR_MS);
    let card = session.next_card(&vocab).unwrap();
    assert_eq!(card.word_id, 42);
    assert_eq!(card.direction, CardDirection::TargetToSource);
}

#[test]
fn test_other_word_shown_while_first_is_scheduled() {
    let clock = ManualClock::new(T);
    let mut session = session_at(&clock);
    session.add_word(1).unwrap();
    session.add_word(2).unwrap();

    for _ in 0..3 {
        session
            .submit_response(&CardResponse::new(1, true, T))
            .unwrap();
    }
    assert_eq!(session.next_item().map(|i| i.word_id), Some(2));
}

#[test]
fn test_full_ladder_to_learned() {
    let clock = ManualClock::new(T);
    let mut session = session_at(&clock);
    session.add_word(7).unwrap();

    let mut now = T;
    let delays = [0, HOUR_MS, DAY_MS, 3 * DAY_MS, 7 * DAY_MS];
    for delay in delays {
        now += delay;
        clock.set(now);
        assert_eq!(session.next_item().map(|i| i.word_id), Some(7));
        for _ in 0..3 {
            session
                .submit_response(&CardResponse::new(7, true, now))
                .unwrap();
        }
    }

    let state = session.state();
    assert!(state.learning_queue.is_empty());
    assert_eq!(state.learned_words, vec![7]);
    assert_eq!(state.words_learned, 1);
    assert_eq!(state.words_reviewed, 4);
    assert_eq!(session.queue_stats().learned, 1);
}

#[test]
fn test_demotion_after_three_misses() {
    let clock = ManualClock::new(T);
    let mut session = session_at(&clock);
    session.add_word(3).unwrap();
    for _ in 0..3 {
        session
            .submit_response(&CardResponse::new(3, true, T))
            .unwrap();
    }

    clock.set(T + HOUR_MS);
    for i in 0..2 {
        let outcome = session
            .submit_response(&CardResponse::new(3, false, T + HOUR_MS + i))
            .unwrap();
        assert!(!outcome.stage_changed);
        assert_eq!(outcome.item.show_after, T + HOUR_MS + i + 5 * MINUTE_MS);
    }
    let outcome = session
        .submit_response(&CardResponse::new(3, false, T + HOUR_MS + 2))
        .unwrap();
    assert!(outcome.was_demoted);
    assert_eq!(outcome.item.stage, Stage::Passive);
    assert_eq!(outcome.item.show_after, T + HOUR_MS + 2);
    assert_eq!(session.state().words_reviewed, 2);
}

#[test]
fn test_overdue_and_available_counts() {
    let clock = ManualClock::new(T);
    let mut session = session_at(&clock);
    session.add_word(1).unwrap();
    session.add_word(2).unwrap();
    for _ in 0..3 {
        session
            .submit_response(&CardResponse::new(2, true, T))
            .unwrap();
    }

    assert_eq!(session.available_count(), 1);
    assert_eq!(session.overdue_count(), 0);

    clock.set(T + 2 * HOUR_MS);
    assert_eq!(session.available_count(), 2);
    assert_eq!(session.overdue_count(), 1);
    assert_eq!(session.next_item().map(|i| i.word_id), Some(1));
    assert_eq!(session.words_by_stage(Stage::Active).len(), 1);
}

#[test]
fn test_file_store_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("state.json"));
    let clock = ManualClock::new(T);

    let mut session = session_at(&clock);
    session.add_word(10).unwrap();
    session.add_word(11).unwrap();
    session
        .submit_response(&CardResponse::new(10, false, T))
        .unwrap();
    assert!(session.persist(&store));

    let restored = LearningSession::restore(&store, SchedulerConfig::default(), &clock);
    assert_eq!(restored.state(), session.state());
}

#[test]
fn test_corrupt_file_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{ definitely not json").unwrap();

    let clock = ManualClock::new(T);
    let restored =
        LearningSession::restore(&JsonFileStore::new(&path), SchedulerConfig::default(), &clock);
    assert_eq!(restored.state(), &LearningState::new(T));
}

#[test]
fn test_import_drops_invalid_items() {
    let clock = ManualClock::new(T);
    let mut session = session_at(&clock);
    let payload = format!(
        r#"{{
            "version": "1.0",
            "exportedAt": {T},
            "progress": 12,
            "learningQueue": [
                {{"wordId": 1, "stage": "active", "consecutiveCorrect": 1, "consecutiveWrong": 0,
                  "showAfter": {T}, "attempts": 4, "addedAt": {T}, "lastSeen": {T}}},
                {{"wordId": 2, "stage": "active", "consecutiveCorrect": 0, "consecutiveWrong": -1,
                  "showAfter": {T}, "attempts": 4, "addedAt": {T}, "lastSeen": {T}}},
                {{"wordId": 4, "stage": "review2", "consecutiveCorrect": 7.0, "attempts": 9,
                  "showAfter": {T}, "addedAt": {T}}},
                {{"wordId": 3, "stage": "active", "consecutiveCorrect": 0, "consecutiveWrong": 0,
                  "showAfter": {T}, "attempts": 4, "addedAt": {future}, "lastSeen": 0}}
            ],
            "learnedWords": [5]
        }}"#,
        future = T + DAY_MS
    );

    session.import_snapshot(&payload).unwrap();
    let state = session.state();
    let ids: Vec<i64> = state.learning_queue.iter().map(|i| i.word_id).collect();
    assert_eq!(ids, vec![1, 4]);
    assert_eq!(state.learning_queue[1].stage, Stage::Review2);
    assert_eq!(state.learning_queue[1].consecutive_correct, 3);
    assert_eq!(state.learning_queue[1].last_seen, 0);
    assert_eq!(state.learned_words, vec![5]);
    assert_eq!(state.progress, 12);
}

#[test]
fn test_stored_payload_is_versioned() {
    let clock = ManualClock::new(T);
    let mut session = session_at(&clock);
    session.add_word(1).unwrap();

    let store = MemoryStore::new();
    assert!(session.persist(&store));
    let raw: serde_json::Value = serde_json::from_str(&store.load().unwrap().unwrap()).unwrap();
    assert_eq!(raw["schemaVersion"], 1);
    assert_eq!(raw["savedAt"], T);
    assert_eq!(raw["state"]["learningQueue"][0]["wordId"], 1);
}
