use std::{io, path::PathBuf, result::Result as StdResult};

use thiserror::Error;

/// Convenient result type for the engine crate.
pub type Result<T> = StdResult<T, ReconcileError>;

/// Failures while bringing the desktop in line with a profile.
///
/// Every variant except [`ReconcileError::AllResourcesFailed`] is a partial
/// failure: it is logged and reported, but the rest of the profile is still
/// applied.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Setting the desktop picture failed.
    #[error("failed to set wallpaper {}: {message}", path.display())]
    WallpaperFailed {
        /// Requested image.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },

    /// Reading or editing the dock failed.
    #[error("dock update failed: {message}")]
    DockFailed {
        /// Underlying error text.
        message: String,
    },

    /// A configured dock item does not match an installed application.
    #[error("dock item {item:?} does not resolve to an installed application")]
    DockItemUnresolvable {
        /// The item as configured.
        item: String,
    },

    /// The applied state could not be written to disk.
    #[error("failed to persist state to {}: {message}", path.display())]
    StatePersistFailed {
        /// State file path.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },

    /// Every resource the profile asked for failed; nothing was applied.
    #[error("nothing applied for mode {mode:?}: {}", join(.errors))]
    AllResourcesFailed {
        /// Mode being applied.
        mode: String,
        /// The individual failures.
        errors: Vec<ReconcileError>,
    },
}

/// Render a list of errors on one line.
fn join(errors: &[ReconcileError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ReconcileError {
    /// Resource name for structured log fields.
    pub fn resource(&self) -> &'static str {
        match self {
            Self::WallpaperFailed { .. } => "wallpaper",
            Self::DockFailed { .. } | Self::DockItemUnresolvable { .. } => "dock",
            Self::StatePersistFailed { .. } => "state",
            Self::AllResourcesFailed { .. } => "all",
        }
    }
}

/// Errors that stop the daemon from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    /// No home directory could be determined for the current user.
    #[error("cannot resolve the home directory; set HOME")]
    HomeDirectoryUnresolvable,

    /// The async runtime could not be created.
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] io::Error),
}
