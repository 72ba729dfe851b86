//! Parse and load user configuration.

use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::Path,
};

use tracing::debug;

use crate::{
    Error, ModeProfile, ProfileStore,
    error::excerpt_at,
    expand_home,
    raw::{RawDocument, RawProfile, extension_text},
};

/// Load and validate the profile store at `path`.
///
/// The file is read in full and validated before anything is returned, so a
/// concurrent edit yields either a complete new store or an error.
pub fn load_from_path(path: &Path) -> Result<ProfileStore, Error> {
    let source = fs::read_to_string(path).map_err(|e| Error::Read {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })?;
    let home = dirs::home_dir();
    let store = load_from_str(&source, Some(path), home.as_deref())?;
    debug!(path = %path.display(), modes = store.len(), "config_loaded");
    Ok(store)
}

/// Parse and validate a profile document held in memory.
///
/// `path` is only used to annotate errors. `home` expands `~/` wallpaper paths.
pub fn load_from_str(
    source: &str,
    path: Option<&Path>,
    home: Option<&Path>,
) -> Result<ProfileStore, Error> {
    let raw: RawDocument = serde_json::from_str(source).map_err(|e| {
        let (line, col) = (e.line(), e.column());
        Error::Parse {
            path: path.map(Path::to_path_buf),
            line,
            col,
            message: e.to_string(),
            excerpt: excerpt_at(source, line, col),
        }
    })?;

    let mut seen = HashSet::new();
    let mut modes = BTreeMap::new();
    for (mode, profile) in raw.modes.0 {
        if !seen.insert(mode.clone()) {
            return Err(Error::DuplicateMode {
                path: path.map(Path::to_path_buf),
                mode,
            });
        }
        let profile = validate_profile(&mode, profile, path, home)?;
        modes.insert(mode, profile);
    }

    Ok(ProfileStore {
        modes,
        poll_interval_secs: raw.poll_interval_secs,
        extensions: raw
            .extra
            .into_iter()
            .map(|(k, v)| (k, extension_text(v)))
            .collect(),
    })
}

/// Check one raw profile and convert it to a [`ModeProfile`].
fn validate_profile(
    mode: &str,
    raw: RawProfile,
    path: Option<&Path>,
    home: Option<&Path>,
) -> Result<ModeProfile, Error> {
    if let Some(items) = &raw.dock_items
        && let Some(index) = items.iter().position(|s| s.trim().is_empty())
    {
        return Err(Error::InvalidDockItem {
            path: path.map(Path::to_path_buf),
            mode: mode.to_string(),
            index,
        });
    }

    let wallpaper_path = match raw.wallpaper_path {
        None => None,
        Some(value) => Some(expand_home(value.trim(), home).ok_or_else(|| {
            Error::InvalidWallpaperPath {
                path: path.map(Path::to_path_buf),
                mode: mode.to_string(),
                value,
            }
        })?),
    };

    // Unknown keys fold in first so an explicit `extensions` entry wins.
    let mut extensions: BTreeMap<String, String> = raw
        .extra
        .into_iter()
        .map(|(k, v)| (k, extension_text(v)))
        .collect();
    extensions.extend(
        raw.extensions
            .into_iter()
            .map(|(k, v)| (k, extension_text(v))),
    );

    Ok(ModeProfile {
        dock_items: raw
            .dock_items
            .map(|items| items.into_iter().map(|s| s.trim().to_string()).collect()),
        wallpaper_path,
        extensions,
    })
}
