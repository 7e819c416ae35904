use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("state directory missing or not writable: {0}")]
    StateDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// One opaque blob under one fixed key.
pub trait BlobStore: Send + Sync {
    /// `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<String>, PersistError>;
    fn save(&self, blob: &str) -> Result<(), PersistError>;
}

/// Ensure the state directory exists; create if missing.
pub fn ensure_state_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::StateDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::StateDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::StateDir(e.to_string()))?;
    }
    Ok(())
}

/// Stores the blob as `{dir}/{key}`, replacing it atomically on every save.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
    key: String,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            key: key.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.key)
    }
}

impl BlobStore for FileBlobStore {
    fn load(&self) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(self.path()) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, blob: &str) -> Result<(), PersistError> {
        ensure_state_dir(&self.dir)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(blob.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(self.path()).map_err(|e| PersistError::Io(e.error))?;
        Ok(())
    }
}

/// In-process store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blob: Mutex<Option<String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
        }
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&self) -> Result<Option<String>, PersistError> {
        Ok(self
            .blob
            .lock()
            .map_err(|_| PersistError::StateDir("memory store poisoned".into()))?
            .clone())
    }

    fn save(&self, blob: &str) -> Result<(), PersistError> {
        *self
            .blob
            .lock()
            .map_err(|_| PersistError::StateDir("memory store poisoned".into()))? = Some(blob.to_string());
        Ok(())
    }
}
