//! Persisted record of the last applied mode.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use config::Fingerprint;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

/// What was last fully or partially applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcilerState {
    /// Focus mode name the profile was applied for.
    pub mode: String,
    /// Fingerprint of the applied profile.
    pub fingerprint: Fingerprint,
    /// Wallpaper most recently set successfully.
    #[serde(default)]
    pub wallpaper: Option<PathBuf>,
    /// Seconds since the Unix epoch when this state was recorded.
    #[serde(default)]
    pub applied_at: u64,
}

impl ReconcilerState {
    /// New state stamped with the current time.
    pub fn new(mode: impl Into<String>, fingerprint: Fingerprint, wallpaper: Option<PathBuf>) -> Self {
        Self {
            mode: mode.into(),
            fingerprint,
            wallpaper,
            applied_at: unix_now(),
        }
    }
}

/// Current time in whole seconds since the epoch.
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Errors reading the state file.
#[derive(Debug, Error)]
pub enum StateError {
    /// The file exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// State file path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// The file does not hold a valid state record.
    #[error("corrupt state file {}: {source}", path.display())]
    Corrupt {
        /// State file path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
}

/// JSON file holding a [`ReconcilerState`], replaced atomically on save.
#[derive(Debug, Clone)]
pub struct StateStore {
    /// State file path.
    path: PathBuf,
}

impl StateStore {
    /// Store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// State file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored state. A missing file is `Ok(None)`.
    pub fn load(&self) -> Result<Option<ReconcilerState>, StateError> {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StateError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StateError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    /// Write `state`, replacing any previous record.
    ///
    /// The record is written to a temporary file in the same directory,
    /// synced, then persisted over the target, so readers see either the old
    /// or the new record. The temporary file is removed if persisting fails.
    pub fn save(&self, state: &ReconcilerState) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                fs::create_dir_all(dir)?;
                dir
            }
            _ => Path::new("."),
        };
        let json = serde_json::to_vec_pretty(state).map_err(io::Error::other)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}
