//! Durable snapshot of the last quiz, used to offer resume after abandonment.
//!
//! Exactly one snapshot is kept; each save overwrites the previous one. The
//! JSON field names also accept the names older saves used (`examTimeLeft`,
//! `activeQuestions`, `currentQuestionIndex`).

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::quiz_engine::{
    error::{QuizError, Result},
    models::{domain_breakdown, DomainTally, TaggedQuestion},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    pub finished: bool,
    pub score: usize,
    pub total: usize,
    #[serde(default)]
    pub elapsed_seconds: u64,
    #[serde(default, alias = "examTimeLeft")]
    pub remaining_exam_seconds: Option<u64>,
    /// Epoch milliseconds at the time of saving.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, alias = "activeQuestions")]
    pub questions: Vec<TaggedQuestion>,
    #[serde(default, alias = "currentQuestionIndex")]
    pub current_index: usize,
    /// The question at `current_index` was already answered or timed out.
    #[serde(default)]
    pub current_answered: bool,
    #[serde(default)]
    pub current_selection: Option<usize>,
}

impl PersistedSnapshot {
    /// An unfinished snapshot with questions left to show.
    pub fn is_resumable(&self) -> bool {
        !self.finished && self.current_index < self.questions.len()
    }

    pub fn breakdown(&self) -> Vec<DomainTally> {
        domain_breakdown(&self.questions)
    }
}

pub trait SnapshotStore: Send + Sync {
    fn save(&self, snapshot: &PersistedSnapshot) -> Result<()>;
    fn load(&self) -> Result<Option<PersistedSnapshot>>;
}

/// Read the saved snapshot, typically once at startup to offer resume.
/// A failed read is logged and treated as "nothing saved".
pub fn load_last_quiz(store: &dyn SnapshotStore) -> Option<PersistedSnapshot> {
    match store.load() {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!(error = %err, "could not read saved quiz snapshot");
            None
        }
    }
}

fn encode(snapshot: &PersistedSnapshot) -> Result<String> {
    serde_json::to_string(snapshot).map_err(|e| QuizError::Persistence(e.to_string()))
}

fn decode(raw: &str) -> Result<PersistedSnapshot> {
    serde_json::from_str(raw).map_err(|e| QuizError::Persistence(e.to_string()))
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileStore {
    fn save(&self, snapshot: &PersistedSnapshot) -> Result<()> {
        let raw = encode(snapshot)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, raw)?;
        debug!(path = %self.path.display(), finished = snapshot.finished, "snapshot saved");
        Ok(())
    }

    fn load(&self) -> Result<Option<PersistedSnapshot>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => decode(&raw).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// In memory
// ---------------------------------------------------------------------------

/// Keeps the serialized snapshot in memory; the default for sessions that
/// were given no store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn save(&self, snapshot: &PersistedSnapshot) -> Result<()> {
        let raw = encode(snapshot)?;
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| QuizError::Persistence("snapshot slot poisoned".into()))?;
        *slot = Some(raw);
        Ok(())
    }

    fn load(&self) -> Result<Option<PersistedSnapshot>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| QuizError::Persistence("snapshot slot poisoned".into()))?;
        slot.as_deref().map(decode).transpose()
    }
}
