//! # Session Store
//!
//! Persists the single session identifier handed out by `/signup` and
//! `/login` so it survives app restarts.
//!
//! ## File Structure
//!
//! ```text
//! <data dir>/
//! └── session.yaml    ← This module manages this file
//! ```
//!
//! ## YAML Format
//!
//! ```yaml
//! userId: "k2J9x0..."
//! updatedAt: "2025-03-14T09:30:00Z"
//! ```
//!
//! An empty `userId` means "no session". Writes go through a temp file
//! followed by a rename so a crash never leaves a half-written file.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info};

use crate::error::ApiError;

pub const SESSION_FILE_NAME: &str = "session.yaml";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("session file is corrupt: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// On-disk layout of `session.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionFile {
    pub user_id: String,
    pub updated_at: Option<String>,
}

/// Storage for the one session identifier of this installation
pub trait SessionStorage: Send + Sync {
    /// Persist `user_id`, replacing any previous value. `None` stores an
    /// empty value, which reads back as no session.
    fn save(&self, user_id: Option<&str>) -> Result<(), SessionError>;

    /// The stored identifier, or `None` when nothing (or only blanks) is stored
    fn read(&self) -> Result<Option<String>, SessionError>;

    /// Remove the stored identifier. Succeeds when there is nothing to remove.
    fn clear(&self) -> Result<(), SessionError>;
}

/// Read the session, turning absence into a precondition error
pub fn require_session(store: &dyn SessionStorage) -> Result<String, ApiError> {
    store.read()?.ok_or_else(ApiError::not_signed_in)
}

fn normalize(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// File-backed store keeping the identifier in `session.yaml`
#[derive(Debug, Clone)]
pub struct YamlSessionStore {
    data_dir: PathBuf,
}

impl YamlSessionStore {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE_NAME)
    }

    fn load(&self) -> Result<Option<SessionFile>, SessionError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }

        let yaml_content = fs::read_to_string(&path)?;
        if yaml_content.trim().is_empty() {
            return Ok(None);
        }
        let file: SessionFile = serde_yaml::from_str(&yaml_content)?;
        debug!(path = %path.display(), "Loaded session file");
        Ok(Some(file))
    }

    fn write(&self, file: &SessionFile) -> Result<(), SessionError> {
        if !self.data_dir.exists() {
            fs::create_dir_all(&self.data_dir)?;
            info!(dir = %self.data_dir.display(), "Created data directory");
        }

        let path = self.path();
        let yaml_content = serde_yaml::to_string(file)?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, yaml_content)?;
        fs::rename(&temp_path, &path)?;

        debug!(path = %path.display(), "Saved session file");
        Ok(())
    }
}

impl SessionStorage for YamlSessionStore {
    fn save(&self, user_id: Option<&str>) -> Result<(), SessionError> {
        let file = SessionFile {
            user_id: user_id.unwrap_or_default().to_string(),
            updated_at: Some(Utc::now().to_rfc3339()),
        };
        self.write(&file)?;

        if file.user_id.trim().is_empty() {
            info!("Stored empty session");
        } else {
            info!("Stored session identifier");
        }
        Ok(())
    }

    fn read(&self) -> Result<Option<String>, SessionError> {
        Ok(self.load()?.and_then(|file| normalize(&file.user_id)))
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(self.path()) {
            Ok(()) => {
                info!("Cleared session");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store, for tests and for hosts that persist elsewhere
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    value: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(user_id: &str) -> Self {
        Self {
            value: Mutex::new(Some(user_id.to_string())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.value.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStorage for MemorySessionStore {
    fn save(&self, user_id: Option<&str>) -> Result<(), SessionError> {
        *self.slot() = Some(user_id.unwrap_or_default().to_string());
        Ok(())
    }

    fn read(&self) -> Result<Option<String>, SessionError> {
        Ok(self.slot().as_deref().and_then(normalize))
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.slot() = None;
        Ok(())
    }
}
