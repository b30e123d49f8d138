//! Persistence collaborators.
//!
//! A store moves one opaque serialized payload in and out of durable storage.
//! The session decides what the payload contains.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::SchedulerError;

pub trait StateStore {
    fn save(&self, payload: &str) -> Result<(), SchedulerError>;

    /// `Ok(None)` when nothing has been saved yet
    fn load(&self) -> Result<Option<String>, SchedulerError>;
}

/// Stores the payload in a single JSON file, replaced atomically on save
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateStore for JsonFileStore {
    fn save(&self, payload: &str) -> Result<(), SchedulerError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.temp_path();
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), bytes = payload.len(), "state saved");
        Ok(())
    }

    fn load(&self) -> Result<Option<String>, SchedulerError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-process store, optionally rejecting every write
#[derive(Debug, Default)]
pub struct MemoryStore {
    contents: RefCell<Option<String>>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(raw: impl Into<String>) -> Self {
        Self {
            contents: RefCell::new(Some(raw.into())),
            fail_writes: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            contents: RefCell::new(None),
            fail_writes: true,
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.borrow().clone()
    }
}

impl StateStore for MemoryStore {
    fn save(&self, payload: &str) -> Result<(), SchedulerError> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "store is read-only").into());
        }
        *self.contents.borrow_mut() = Some(payload.to_string());
        Ok(())
    }

    fn load(&self) -> Result<Option<String>, SchedulerError> {
        Ok(self.contents())
    }
}
