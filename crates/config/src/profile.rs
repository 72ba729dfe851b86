//! Validated profile types.

use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Poll interval used when the document does not set one.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Smallest accepted `pollIntervalSecs`.
const MIN_POLL_SECS: u64 = 1;
/// Largest accepted `pollIntervalSecs`.
const MAX_POLL_SECS: u64 = 3600;

/// Desired environment for one Focus mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeProfile {
    /// Dock applications, left to right. `None` leaves the dock untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dock_items: Option<Vec<String>>,
    /// Absolute path of the desktop picture. `None` leaves it untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallpaper_path: Option<PathBuf>,
    /// Settings not otherwise modeled, including unknown profile keys.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, String>,
}

impl ModeProfile {
    /// Profile with a dock layout and wallpaper.
    pub fn new<I, S>(dock_items: I, wallpaper_path: Option<&Path>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dock_items: Some(dock_items.into_iter().map(Into::into).collect()),
            wallpaper_path: wallpaper_path.map(Path::to_path_buf),
            extensions: BTreeMap::new(),
        }
    }

    /// Content fingerprint. Equal profiles always produce equal fingerprints.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut h = Sha256::new();
        match &self.dock_items {
            None => h.update([0u8]),
            Some(items) => {
                h.update([1u8]);
                h.update((items.len() as u64).to_le_bytes());
                for item in items {
                    hash_str(&mut h, item);
                }
            }
        }
        match &self.wallpaper_path {
            None => h.update([0u8]),
            Some(p) => {
                h.update([1u8]);
                hash_str(&mut h, &p.to_string_lossy());
            }
        }
        h.update((self.extensions.len() as u64).to_le_bytes());
        for (k, v) in &self.extensions {
            hash_str(&mut h, k);
            hash_str(&mut h, v);
        }
        Fingerprint(format!("{:x}", h.finalize()))
    }
}

/// Length-prefix a string so adjacent fields cannot alias.
fn hash_str(h: &mut Sha256, s: &str) {
    h.update((s.len() as u64).to_le_bytes());
    h.update(s.as_bytes());
}

/// Hex SHA-256 digest identifying the content of a [`ModeProfile`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated digest for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The full mode-to-profile mapping from one successful load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStore {
    /// Profiles keyed by Focus mode name.
    pub(crate) modes: BTreeMap<String, ModeProfile>,
    /// Daemon poll interval requested by the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) poll_interval_secs: Option<u64>,
    /// Unknown top-level document keys.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) extensions: BTreeMap<String, String>,
}

impl ProfileStore {
    /// Build a store directly from profiles; later duplicates replace earlier ones.
    pub fn from_profiles<I, K>(profiles: I) -> Self
    where
        I: IntoIterator<Item = (K, ModeProfile)>,
        K: Into<String>,
    {
        Self {
            modes: profiles.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Self::default()
        }
    }

    /// Profile for `mode`, if one is configured.
    pub fn get(&self, mode: &str) -> Option<&ModeProfile> {
        self.modes.get(mode)
    }

    /// Configured mode names in sorted order.
    pub fn modes(&self) -> impl Iterator<Item = &str> {
        self.modes.keys().map(String::as_str)
    }

    /// Number of configured modes.
    pub fn len(&self) -> usize {
        self.modes.len()
    }

    /// True when no modes are configured.
    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// Poll interval requested by the document, clamped to a sane range.
    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_secs
            .map(|s| Duration::from_secs(s.clamp(MIN_POLL_SECS, MAX_POLL_SECS)))
    }

    /// Unknown top-level keys, preserved for forward compatibility.
    pub fn extensions(&self) -> &BTreeMap<String, String> {
        &self.extensions
    }
}
