//! DoNotDisturb database reader.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::trace;

use crate::{FocusMode, FocusReadError, FocusStateSource};

/// Location of the database relative to the home directory.
const DB_DIR: &str = "Library/DoNotDisturb/DB";
/// File holding the active assertion records.
const ASSERTIONS: &str = "Assertions.json";
/// File holding mode identifiers and display names.
const MODE_CONFIGURATIONS: &str = "ModeConfigurations.json";

/// `Assertions.json`
#[derive(Debug, Deserialize)]
struct Assertions {
    /// Store snapshots; the first is current.
    #[serde(default)]
    data: Vec<AssertionStore>,
}

/// One assertion store snapshot.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssertionStore {
    /// Active assertions; absent when no Focus is on.
    #[serde(default)]
    store_assertion_records: Vec<AssertionRecord>,
}

/// One assertion record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssertionRecord {
    /// Record details.
    #[serde(default)]
    assertion_details: Option<AssertionDetails>,
}

/// Details of an assertion record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssertionDetails {
    /// Identifier of the asserted mode.
    #[serde(default)]
    assertion_details_mode_identifier: Option<String>,
}

/// `ModeConfigurations.json`
#[derive(Debug, Deserialize)]
struct ModeConfigurations {
    /// Store snapshots; the first is current.
    #[serde(default)]
    data: Vec<ModeConfigurationStore>,
}

/// One configuration store snapshot.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModeConfigurationStore {
    /// Mode configurations keyed by identifier.
    #[serde(default)]
    mode_configurations: HashMap<String, ModeConfiguration>,
}

/// One configured mode.
#[derive(Debug, Deserialize)]
struct ModeConfiguration {
    /// Mode description.
    #[serde(default)]
    mode: Option<ModeDescription>,
}

/// Display attributes of a mode.
#[derive(Debug, Deserialize)]
struct ModeDescription {
    /// Display name.
    #[serde(default)]
    name: Option<String>,
}

/// Display names for the modes macOS ships with.
pub fn builtin_name(identifier: &str) -> Option<&'static str> {
    Some(match identifier {
        "com.apple.donotdisturb.mode.default" => "Do Not Disturb",
        "com.apple.sleep.sleep-mode" => "Sleep",
        "com.apple.focus.work" => "Work",
        "com.apple.focus.personal-time" => "Personal",
        "com.apple.donotdisturb.mode.driving" => "Driving",
        "com.apple.focus.reduce-interruptions" => "Reduce Interruptions",
        "com.apple.focus.mindfulness" => "Mindfulness",
        "com.apple.focus.gaming" => "Gaming",
        "com.apple.focus.reading" => "Reading",
        "com.apple.focus.fitness" => "Fitness",
        _ => return None,
    })
}

/// Extract the active mode identifier from `Assertions.json` content.
///
/// Returns `Ok(None)` when no Focus is active. When several records are
/// present the last one wins, matching the order macOS appends them.
pub(crate) fn active_identifier(source: &str) -> Result<Option<String>, FocusReadError> {
    let parsed: Assertions = serde_json::from_str(source)
        .map_err(|e| FocusReadError::Malformed(format!("{ASSERTIONS}: {e}")))?;
    Ok(parsed.data.into_iter().next().and_then(|store| {
        store
            .store_assertion_records
            .into_iter()
            .filter_map(|r| r.assertion_details?.assertion_details_mode_identifier)
            .filter(|id| !id.is_empty())
            .last()
    }))
}

/// Look up the display name for `identifier` in `ModeConfigurations.json` content.
pub(crate) fn mode_name(source: &str, identifier: &str) -> Option<String> {
    let parsed: ModeConfigurations = serde_json::from_str(source).ok()?;
    parsed
        .data
        .into_iter()
        .next()?
        .mode_configurations
        .remove(identifier)?
        .mode?
        .name
        .filter(|n| !n.is_empty())
}

/// Focus source backed by the DoNotDisturb database files.
#[derive(Debug, Clone)]
pub struct DndDbSource {
    /// Directory containing the database files.
    dir: PathBuf,
}

impl DndDbSource {
    /// Source for the database under `home`.
    pub fn for_home(home: &Path) -> Self {
        Self::new(home.join(DB_DIR))
    }

    /// Source for the database files in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory being read.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read a database file to a string.
    fn read(&self, file: &str) -> Result<String, FocusReadError> {
        let path = self.dir.join(file);
        fs::read_to_string(&path).map_err(|e| FocusReadError::Unavailable {
            path,
            message: e.to_string(),
        })
    }
}

impl FocusStateSource for DndDbSource {
    fn current_mode(&self) -> Result<FocusMode, FocusReadError> {
        let Some(id) = active_identifier(&self.read(ASSERTIONS)?)? else {
            return Ok(FocusMode::none());
        };
        // Names are cosmetic; a missing configuration file is not an error.
        let name = self
            .read(MODE_CONFIGURATIONS)
            .ok()
            .and_then(|src| mode_name(&src, &id))
            .or_else(|| builtin_name(&id).map(str::to_string))
            .unwrap_or_else(|| id.clone());
        trace!(identifier = %id, name = %name, "focus_mode_read");
        Ok(FocusMode::with_identifier(name, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTIVE: &str = r#"{
        "data": [{
            "storeAssertionRecords": [{
                "assertionUUID": "A1",
                "assertionStartDateTimestamp": 718000000.0,
                "assertionDetails": {
                    "assertionDetailsIdentifier": "com.apple.focus.work",
                    "assertionDetailsModeIdentifier": "com.apple.focus.work",
                    "assertionDetailsReason": "user-action"
                }
            }]
        }],
        "header": { "timestamp": 718000000.0 }
    }"#;

    const INACTIVE: &str = r#"{ "data": [{ "storeInvalidationRecords": [] }], "header": {} }"#;

    const CONFIGS: &str = r#"{
        "data": [{
            "modeConfigurations": {
                "com.apple.focus.work": {
                    "mode": { "name": "Deep Work", "modeIdentifier": "com.apple.focus.work" }
                },
                "com.example.custom": { "mode": { "name": "Writing" } }
            }
        }]
    }"#;

    #[test]
    fn parses_active_identifier() {
        assert_eq!(
            active_identifier(ACTIVE).unwrap().as_deref(),
            Some("com.apple.focus.work")
        );
        assert_eq!(active_identifier(INACTIVE).unwrap(), None);
        assert_eq!(active_identifier("{}").unwrap(), None);
    }

    #[test]
    fn malformed_assertions_are_errors() {
        assert!(matches!(
            active_identifier("not json"),
            Err(FocusReadError::Malformed(_))
        ));
    }

    #[test]
    fn looks_up_mode_names() {
        assert_eq!(
            mode_name(CONFIGS, "com.apple.focus.work").as_deref(),
            Some("Deep Work")
        );
        assert_eq!(mode_name(CONFIGS, "com.example.missing"), None);
        assert_eq!(builtin_name("com.apple.sleep.sleep-mode"), Some("Sleep"));
    }

    #[test]
    fn source_reads_database_dir() {
        let dir = tempfile::tempdir().unwrap();
        let src = DndDbSource::new(dir.path());

        // No database at all.
        assert!(matches!(
            src.current_mode(),
            Err(FocusReadError::Unavailable { .. })
        ));

        fs::write(dir.path().join(ASSERTIONS), INACTIVE).unwrap();
        assert!(src.current_mode().unwrap().is_none());

        // Active without configurations falls back to the builtin name.
        fs::write(dir.path().join(ASSERTIONS), ACTIVE).unwrap();
        let m = src.current_mode().unwrap();
        assert_eq!(m.name(), "Work");
        assert_eq!(m.identifier(), Some("com.apple.focus.work"));

        fs::write(dir.path().join(MODE_CONFIGURATIONS), CONFIGS).unwrap();
        assert_eq!(src.current_mode().unwrap().name(), "Deep Work");
    }

    #[test]
    fn unknown_identifier_used_as_name() {
        let dir = tempfile::tempdir().unwrap();
        let src = DndDbSource::new(dir.path());
        fs::write(
            dir.path().join(ASSERTIONS),
            ACTIVE.replace("com.apple.focus.work", "com.example.other"),
        )
        .unwrap();
        assert_eq!(src.current_mode().unwrap().name(), "com.example.other");
    }
}
