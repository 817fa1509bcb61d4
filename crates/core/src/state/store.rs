use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::NamedTempFile;

use super::BotState;

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("state file {0} does not exist")]
    Missing(PathBuf),
    #[error("state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("state file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize state: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("state store unavailable: {0}")]
    Unavailable(String),
}

/// Load/save boundary for `BotState`.
#[async_trait::async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self) -> Result<BotState, StateError>;
    async fn save(&self, state: &BotState) -> Result<(), StateError>;
}

/// JSON file on disk. Writes go through a temp file in the same directory and
/// an atomic rename, so a crash mid-write leaves the previous snapshot intact.
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

    fn io_err(&self, source: std::io::Error) -> StateError {
        StateError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait::async_trait]
impl StateStore for JsonFileStore {
    async fn load(&self) -> Result<BotState, StateError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StateError::Missing(self.path.clone()));
            }
            Err(e) => return Err(self.io_err(e)),
        };
        serde_json::from_slice(&bytes).map_err(|source| StateError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, state: &BotState) -> Result<(), StateError> {
        let bytes = serde_json::to_vec(state).map_err(StateError::Serialize)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|e| StateError::Unavailable(e.to_string()))?
            .map_err(|e| self.io_err(e))
    }
}

/// In-process store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Option<BotState>>,
    fail_saves: bool,
    saves: AtomicUsize,
}

impl MemoryStore {
    /// Store that loads as a fresh, empty state.
    pub fn new() -> Self {
        Self::with_state(BotState::default())
    }

    pub fn with_state(state: BotState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
            ..Self::default()
        }
    }

    /// Store whose load fails, like a missing state file.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every save returns an error; the stored snapshot never changes.
    pub fn failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    /// Last snapshot written or seeded.
    pub fn snapshot(&self) -> Option<BotState> {
        self.lock().clone()
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<BotState>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl StateStore for MemoryStore {
    async fn load(&self) -> Result<BotState, StateError> {
        self.lock()
            .clone()
            .ok_or_else(|| StateError::Unavailable("no state seeded".into()))
    }

    async fn save(&self, state: &BotState) -> Result<(), StateError> {
        if self.fail_saves {
            return Err(StateError::Unavailable("saves disabled".into()));
        }
        *self.lock() = Some(state.clone());
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data.json"));
        let mut state = BotState::default();
        state.history.admit("sam");
        state.cursor.advance_to(77);
        state.cursor.mark_cycle(Utc::now());

        store.save(&state).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.history, state.history);
        assert_eq!(loaded.cursor.last_mention_id, 77);
        assert_eq!(
            loaded.cursor.last_cycle_at.map(|t| t.timestamp_millis()),
            state.cursor.last_cycle_at.map(|t| t.timestamp_millis())
        );
    }

    #[tokio::test]
    async fn missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nope.json"));
        assert!(matches!(store.load().await, Err(StateError::Missing(_))));
    }

    #[test]
    fn serialize_failure_is_not_reported_as_corrupt_file() {
        let source = serde_json::from_str::<u8>("x").unwrap_err();
        let err = StateError::Serialize(source);
        assert!(err.to_string().starts_with("failed to serialize state"));
        assert!(!err.to_string().contains("corrupt"));
    }

    #[tokio::test]
    async fn corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, b"{not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load().await, Err(StateError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn save_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, b"{}").unwrap();
        let store = JsonFileStore::new(&path);
        assert_eq!(store.path(), path.as_path());
        let mut state = store.load().await.unwrap();
        state.cursor.advance_to(5);
        store.save(&state).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains(r#""lastMentionId":5"#), "{raw}");
        // only the state file remains; the temp file was renamed into place
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn memory_store_tracks_saves() {
        let store = MemoryStore::new();
        let mut state = store.load().await.unwrap();
        state.cursor.advance_to(3);
        store.save(&state).await.unwrap();
        assert_eq!(store.saves(), 1);
        assert_eq!(store.snapshot().unwrap().cursor.last_mention_id, 3);
    }

    #[tokio::test]
    async fn memory_store_failures() {
        assert!(MemoryStore::empty().load().await.is_err());
        let store = MemoryStore::new().failing_saves();
        assert!(store.save(&BotState::default()).await.is_err());
        assert_eq!(store.saves(), 0);
        assert_eq!(store.snapshot(), Some(BotState::default()));
    }
}
