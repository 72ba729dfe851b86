//! Focus mode profile store: the user-authored mapping from Focus mode name to
//! the dock layout and wallpaper that mode should have.
//!
//! The store is loaded from a single JSON document and fully validated on each
//! load. Callers keep the last store that loaded successfully and swap it out
//! only when a new load succeeds, so a half-written edit never replaces a
//! working configuration.
#![warn(unsafe_op_in_unsafe_fn)]

use std::path::{Path, PathBuf};

mod error;
mod loader;
mod profile;
mod raw;
mod watch;

#[cfg(test)]
mod test_load;

pub use error::{Error, ErrorKind};
pub use loader::{load_from_path, load_from_str};
pub use profile::{DEFAULT_POLL_INTERVAL, Fingerprint, ModeProfile, ProfileStore};
pub use watch::{ConfigWatch, watch};

/// Per-user application directory, relative to the home directory.
pub const APP_DIR: &str = ".config/macfocusmodes";
/// File name of the profile document inside [`APP_DIR`].
pub const CONFIG_FILE: &str = "config.json";
/// File name of the persisted daemon state inside [`APP_DIR`].
pub const STATE_FILE: &str = "state.json";

/// The application directory (`~/.config/macfocusmodes`) under `home`.
pub fn config_dir(home: &Path) -> PathBuf {
    home.join(APP_DIR)
}

/// Determine the default config path (`~/.config/macfocusmodes/config.json`).
pub fn default_config_path(home: &Path) -> PathBuf {
    config_dir(home).join(CONFIG_FILE)
}

/// Determine the default state path (`~/.config/macfocusmodes/state.json`).
pub fn default_state_path(home: &Path) -> PathBuf {
    config_dir(home).join(STATE_FILE)
}

/// Expand a leading `~/` against `home`.
///
/// Returns `None` when the result would not be an absolute path, including
/// the case of a `~/` path with no home directory available.
pub fn expand_home(raw: &str, home: Option<&Path>) -> Option<PathBuf> {
    let expanded = match raw.strip_prefix("~/") {
        Some(rest) => home?.join(rest),
        None if raw == "~" => home?.to_path_buf(),
        None => PathBuf::from(raw),
    };
    expanded.is_absolute().then_some(expanded)
}
