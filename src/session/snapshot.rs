//! Snapshot export/import and the persisted envelope.
//!
//! Export payload: every state field at the top level plus `exportedAt` and
//! `version`. Persisted payload: `{ schemaVersion, savedAt, state }`; a payload
//! with another schema version is treated as absent.

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use super::{Clock, LearningSession, LearningState};
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::sanitize::{as_i64_lenient, coerce_state};
use crate::storage::StateStore;
use crate::types::{EXPORT_VERSION, SCHEMA_VERSION};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportPayload<'a> {
    #[serde(flatten)]
    state: &'a LearningState,
    exported_at: i64,
    version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedEnvelope<'a> {
    schema_version: u32,
    saved_at: i64,
    state: &'a LearningState,
}

pub fn encode_envelope(state: &LearningState, saved_at: i64) -> Result<String, SchedulerError> {
    let envelope = PersistedEnvelope {
        schema_version: SCHEMA_VERSION,
        saved_at,
        state,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Unwrap a persisted envelope and return its raw state object
pub fn decode_envelope(raw: &str) -> Result<Value, SchedulerError> {
    let mut envelope: Value = serde_json::from_str(raw)?;

    let found = envelope.get("schemaVersion").and_then(as_i64_lenient);
    if found != Some(i64::from(SCHEMA_VERSION)) {
        return Err(SchedulerError::VersionMismatch {
            expected: SCHEMA_VERSION.to_string(),
            found: envelope
                .get("schemaVersion")
                .map(Value::to_string)
                .unwrap_or_else(|| "none".to_string()),
        });
    }

    Ok(envelope
        .get_mut("state")
        .map(Value::take)
        .unwrap_or(Value::Null))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl<C: Clock> LearningSession<C> {
    /// Serialize the whole state for backup
    pub fn export_snapshot(&self) -> Result<String, SchedulerError> {
        let payload = ExportPayload {
            state: &self.state,
            exported_at: self.now(),
            version: EXPORT_VERSION,
        };
        Ok(serde_json::to_string_pretty(&payload)?)
    }

    /// Replace the state with a backup. Unparsable JSON or a non-object payload
    /// is an error and leaves the state untouched; any object is coerced field
    /// by field.
    pub fn import_snapshot(&mut self, data: &str) -> Result<(), SchedulerError> {
        let value: Value = serde_json::from_str(data).inspect_err(|err| {
            warn!(error = %err, "failed to import learning data");
        })?;
        if !value.is_object() {
            let kind = json_kind(&value);
            warn!(kind, "refusing to import non-object snapshot");
            return Err(SchedulerError::InvalidSnapshot(kind));
        }

        if let Some(version) = value.get("version").and_then(Value::as_str) {
            if version != EXPORT_VERSION {
                warn!(version, "importing payload with unexpected version");
            }
        }

        let now = self.now();
        self.state = coerce_state(&value, LearningState::new(now), now, &self.config);
        info!(
            queued = self.state.learning_queue.len(),
            learned = self.state.learned_words.len(),
            "imported learning data"
        );
        Ok(())
    }

    /// Write the current state to `store`; failures are logged and reported as `false`
    pub fn persist(&self, store: &dyn StateStore) -> bool {
        let result = encode_envelope(&self.state, self.now()).and_then(|raw| store.save(&raw));
        match result {
            Ok(()) => true,
            Err(err) => {
                error!(error = %err, "failed to save learning state");
                false
            }
        }
    }

    /// Rebuild a session from `store`, starting fresh when nothing usable is stored
    pub fn restore(store: &dyn StateStore, config: SchedulerConfig, clock: C) -> Self {
        let now = clock.now_ms();
        let defaults = LearningState::new(now);

        let raw = match store.load() {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::with_state(defaults, config, clock),
            Err(err) => {
                error!(error = %err, "failed to load learning state");
                return Self::with_state(defaults, config, clock);
            }
        };

        let state = match decode_envelope(&raw) {
            Ok(value) => coerce_state(&value, defaults, now, &config),
            Err(err) => {
                warn!(error = %err, "discarding unusable learning state");
                defaults
            }
        };

        Self::with_state(state, config, clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ManualClock;
    use crate::storage::MemoryStore;
    use crate::types::CardResponse;

    const T: i64 = 1_700_000_000_000;

    fn populated() -> LearningSession<ManualClock> {
        let mut session = LearningSession::new(SchedulerConfig::default(), ManualClock::new(T));
        session.add_word(1).unwrap();
        session.add_word(2).unwrap();
        session.mark_learned(7).unwrap();
        for i in 0..3 {
            session
                .submit_response(&CardResponse::new(1, true, T + i))
                .unwrap();
        }
        session
            .submit_response(&CardResponse::new(2, false, T + 5))
            .unwrap();
        session
    }

    #[test]
    fn test_export_has_wrapper_fields() {
        let session = populated();
        let value: Value = serde_json::from_str(&session.export_snapshot().unwrap()).unwrap();
        assert_eq!(value["version"], "1.0");
        assert_eq!(value["exportedAt"], T);
        assert_eq!(value["learnedWords"], serde_json::json!([7]));
        assert!(value["learningQueue"].is_array());
    }

    #[test]
    fn test_export_import_round_trip() {
        let session = populated();
        let exported = session.export_snapshot().unwrap();

        let mut restored = LearningSession::new(SchedulerConfig::default(), ManualClock::new(T));
        restored.import_snapshot(&exported).unwrap();
        assert_eq!(restored.state(), session.state());
    }

    #[test]
    fn test_import_garbage_keeps_state() {
        let mut session = populated();
        let before = session.state().clone();
        assert!(session.import_snapshot("{not json").is_err());
        assert_eq!(session.state(), &before);
    }

    #[test]
    fn test_import_non_object_keeps_state() {
        let mut session = populated();
        let before = session.state().clone();
        for payload in ["null", "[1, 2]", "\"state\"", "42"] {
            assert!(matches!(
                session.import_snapshot(payload),
                Err(SchedulerError::InvalidSnapshot(_))
            ));
        }
        assert_eq!(session.state(), &before);
    }

    #[test]
    fn test_persist_and_restore() {
        let session = populated();
        let store = MemoryStore::new();
        assert!(session.persist(&store));

        let restored =
            LearningSession::restore(&store, SchedulerConfig::default(), ManualClock::new(T));
        assert_eq!(restored.state(), session.state());
    }

    #[test]
    fn test_restore_with_version_mismatch_starts_fresh() {
        let store = MemoryStore::with_contents(
            r#"{"schemaVersion": 0, "state": {"learnedWords": [1, 2]}}"#,
        );
        let restored =
            LearningSession::restore(&store, SchedulerConfig::default(), ManualClock::new(T));
        assert_eq!(restored.state(), &LearningState::new(T));
    }

    #[test]
    fn test_restore_from_empty_store() {
        let restored = LearningSession::restore(
            &MemoryStore::new(),
            SchedulerConfig::default(),
            ManualClock::new(T),
        );
        assert!(restored.state().learning_queue.is_empty());
    }

    #[test]
    fn test_persist_failure_is_reported() {
        let session = populated();
        assert!(!session.persist(&MemoryStore::failing()));
        assert_eq!(session.state().learning_queue.len(), 2);
    }
}
