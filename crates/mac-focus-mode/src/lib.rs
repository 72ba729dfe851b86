//! mac-focus-mode: read the currently active macOS Focus mode.
//!
//! macOS has no public API for the active Focus. The system records it in the
//! DoNotDisturb database under `~/Library/DoNotDisturb/DB/`:
//! - `Assertions.json` holds the assertion records for the mode that is
//!   currently switched on (empty when no Focus is active).
//! - `ModeConfigurations.json` maps mode identifiers such as
//!   `com.apple.focus.work` to their display names.
//!
//! [`DndDbSource`] parses those files. Reading them may require Full Disk
//! Access for the process; without it every read fails with
//! [`FocusReadError::Unavailable`].
//!
//! Consumers depend on the [`FocusStateSource`] trait and usually wrap a source
//! in a [`FocusReader`], which never fails: errors become the
//! [`FocusMode::unknown`] sentinel and are logged once per failure streak.

mod dnd;
#[cfg(any(test, feature = "test-utils"))]
mod mock;
mod mode;
mod reader;

pub use dnd::{DndDbSource, builtin_name};
pub use mode::FocusMode;
pub use reader::FocusReader;

#[cfg(any(test, feature = "test-utils"))]
pub use mock::StaticFocusSource;

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while querying the focus state.
#[derive(Debug, Error, Clone)]
pub enum FocusReadError {
    /// The focus database could not be read (missing, permission denied).
    #[error("focus state unavailable at {}: {message}", path.display())]
    Unavailable {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
    /// The focus database was read but did not have the expected shape.
    #[error("malformed focus state: {0}")]
    Malformed(String),
}

/// Anything that can report the active Focus mode.
pub trait FocusStateSource: Send + Sync {
    /// Query the active mode. Must return quickly; it runs every poll cycle.
    fn current_mode(&self) -> Result<FocusMode, FocusReadError>;
}
