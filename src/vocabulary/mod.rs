//! Vocabulary collaborator.
//!
//! The word list is an ordered, stable array; a word's position is its id.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordData {
    #[serde(default)]
    pub id: i64,
    pub word: String,
    #[serde(default)]
    pub props: Vec<String>,
    #[serde(default)]
    pub translations: Vec<String>,
}

pub trait Vocabulary {
    fn word_by_index(&self, index: i64) -> Option<&WordData>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryVocabulary {
    words: Vec<WordData>,
}

impl InMemoryVocabulary {
    pub fn new(words: Vec<WordData>) -> Self {
        Self { words }
    }

    pub fn from_json(raw: &str) -> Result<Self, SchedulerError> {
        Ok(Self::new(serde_json::from_str(raw)?))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchedulerError> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

impl Vocabulary for InMemoryVocabulary {
    fn word_by_index(&self, index: i64) -> Option<&WordData> {
        usize::try_from(index).ok().and_then(|i| self.words.get(i))
    }

    fn len(&self) -> usize {
        self.words.len()
    }
}
