//! Dock and desktop picture operations for macOS.
//!
//! The reconciler only talks to the [`DockController`] and
//! [`WallpaperController`] traits. Production implementations shell out to
//! the command-line helpers the package depends on:
//! - [`DockUtil`] drives `dockutil` and restarts the Dock once per batch.
//! - [`Osascript`] sets the picture on every desktop through System Events.
//!
//! [`MockDesktop`] (feature `test-utils`) implements both traits in memory and
//! records every call.

use std::{
    env,
    ffi::OsStr,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    process::Command,
    result::Result as StdResult,
};

use thiserror::Error;
use tracing::trace;

mod dock;
#[cfg(any(test, feature = "test-utils"))]
mod mock;
mod wallpaper;

pub use dock::{DockUtil, item_label, parse_dock_list, resolve_app};
#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockDesktop;
pub use wallpaper::{Osascript, set_picture_script};

/// Result alias for desktop operations.
pub type Result<T> = StdResult<T, Error>;

/// Errors from dock and wallpaper operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A required helper is not installed or not on `PATH`.
    #[error("{tool} not found on PATH")]
    ToolMissing {
        /// Program name.
        tool: String,
    },
    /// A helper ran but reported failure.
    #[error("{tool} failed ({status}): {stderr}")]
    CommandFailed {
        /// Program name.
        tool: String,
        /// Exit status description.
        status: String,
        /// Trimmed stderr output.
        stderr: String,
    },
    /// The wallpaper image does not exist.
    #[error("wallpaper image not found: {}", .0.display())]
    WallpaperMissing(PathBuf),
    /// Other I/O failure while spawning a helper.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A dock item resolved to an application bundle on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockApp {
    /// Tile label as shown in the Dock (the bundle name without `.app`).
    pub label: String,
    /// Path of the application bundle.
    pub path: PathBuf,
}

/// Dock operations. Items are identified by their tile label.
pub trait DockController: Send + Sync {
    /// Labels of the persistent application tiles, left to right.
    fn items(&self) -> Result<Vec<String>>;
    /// Resolve a configured dock item to an installed application.
    fn resolve(&self, item: &str) -> Option<DockApp>;
    /// Remove the tile labelled `label`.
    fn remove(&self, label: &str) -> Result<()>;
    /// Add `app` right after the tile `after`, or first when `after` is `None`.
    fn add(&self, app: &DockApp, after: Option<&str>) -> Result<()>;
    /// Move the tile `label` right after `after`, or first when `after` is `None`.
    fn move_item(&self, label: &str, after: Option<&str>) -> Result<()>;
    /// Make pending edits visible (restarts the Dock if anything changed).
    fn commit(&self) -> Result<()>;
}

/// Desktop picture operations.
pub trait WallpaperController: Send + Sync {
    /// Set the picture on every desktop to the image at `path`.
    fn set_wallpaper(&self, path: &Path) -> Result<()>;
}

/// Helpers the production controllers shell out to.
pub const REQUIRED_TOOLS: &[&str] = &["dockutil", "osascript", "killall"];

/// Required helpers that cannot be found on `PATH`.
pub fn missing_tools() -> Vec<&'static str> {
    REQUIRED_TOOLS
        .iter()
        .copied()
        .filter(|t| find_on_path(t).is_none())
        .collect()
}

/// Locate `program` on `PATH`.
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|p| p.is_file())
}

/// Run `tool` with `args`, returning stdout on success.
pub(crate) fn run<I, S>(tool: &str, args: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(tool);
    cmd.args(args);
    trace!(command = ?cmd, "run_helper");
    let output = cmd.output().map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::ToolMissing {
            tool: tool.to_string(),
        },
        _ => Error::Io(e),
    })?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(Error::CommandFailed {
            tool: tool.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
