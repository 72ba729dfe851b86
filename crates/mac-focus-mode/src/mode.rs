//! The Focus mode value type.

use std::{fmt, iter};

/// Name reported when no Focus is active.
const NONE: &str = "None";
/// Name reported when the focus state could not be read.
const UNKNOWN: &str = "unknown";

/// An active Focus mode as reported by the OS.
///
/// `name` is the human-readable mode name ("Work", "Do Not Disturb"). When the
/// OS exposes a stable identifier (`com.apple.focus.work`) it is kept in
/// `identifier` so profiles can be keyed by either.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FocusMode {
    /// Display name, or a sentinel.
    name: String,
    /// OS identifier, when known.
    identifier: Option<String>,
}

impl FocusMode {
    /// A mode known only by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: None,
        }
    }

    /// A mode with both a display name and an OS identifier.
    pub fn with_identifier(name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: Some(identifier.into()),
        }
    }

    /// Sentinel for "no Focus active".
    pub fn none() -> Self {
        Self::named(NONE)
    }

    /// Sentinel for "focus state could not be determined".
    pub fn unknown() -> Self {
        Self::named(UNKNOWN)
    }

    /// True for the [`FocusMode::none`] sentinel.
    pub fn is_none(&self) -> bool {
        self.identifier.is_none() && self.name == NONE
    }

    /// True for the [`FocusMode::unknown`] sentinel.
    pub fn is_unknown(&self) -> bool {
        self.identifier.is_none() && self.name == UNKNOWN
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// OS identifier, when known.
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Keys to try, in order, when looking this mode up in a profile table.
    pub fn lookup_keys(&self) -> impl Iterator<Item = &str> {
        iter::once(self.name.as_str()).chain(self.identifier.as_deref())
    }
}

impl fmt::Display for FocusMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_are_distinct() {
        assert!(FocusMode::none().is_none());
        assert!(!FocusMode::none().is_unknown());
        assert!(FocusMode::unknown().is_unknown());
        assert!(!FocusMode::named("Work").is_none());
        // A real mode that happens to be called "None" still carries an id.
        assert!(!FocusMode::with_identifier("None", "com.example.none").is_none());
    }

    #[test]
    fn lookup_keys_prefer_name() {
        let m = FocusMode::with_identifier("Work", "com.apple.focus.work");
        assert_eq!(
            m.lookup_keys().collect::<Vec<_>>(),
            vec!["Work", "com.apple.focus.work"]
        );
        assert_eq!(FocusMode::named("Work").lookup_keys().count(), 1);
        assert_eq!(m.to_string(), "Work");
    }
}
