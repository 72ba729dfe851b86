//! In-memory desktop for tests (enabled with the `test-utils` feature).

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use parking_lot::Mutex;

use crate::{DockApp, DockController, Error, Result, WallpaperController};

/// Simulated dock and wallpaper that records every call.
///
/// Every item resolves to `/Applications/<item>.app` unless marked
/// unresolvable. Dock edits update the simulated dock, so a later `items()`
/// observes them.
#[derive(Clone, Default)]
pub struct MockDesktop {
    /// Calls in order, e.g. `add:Mail@^`, `move:Slack@Mail`, `wallpaper:/a.png`.
    calls: Arc<Mutex<Vec<String>>>,
    /// Current dock tile labels.
    dock: Arc<Mutex<Vec<String>>>,
    /// Current wallpaper.
    wallpaper: Arc<Mutex<Option<PathBuf>>>,
    /// Items that fail to resolve.
    unresolvable: Arc<Mutex<HashSet<String>>>,
    /// Fail `set_wallpaper`.
    fail_wallpaper: Arc<AtomicBool>,
    /// Fail `items`.
    fail_dock_read: Arc<AtomicBool>,
    /// Fail every dock edit.
    fail_dock_edits: Arc<AtomicBool>,
}

impl MockDesktop {
    /// Empty dock, no wallpaper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the given dock layout.
    pub fn with_dock<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let m = Self::new();
        *m.dock.lock() = items.into_iter().map(Into::into).collect();
        m
    }

    /// Replace the simulated dock, as a user editing it by hand would.
    pub fn set_dock<I, S>(&self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.dock.lock() = items.into_iter().map(Into::into).collect();
    }

    /// Current dock labels.
    pub fn dock(&self) -> Vec<String> {
        self.dock.lock().clone()
    }

    /// Current wallpaper.
    pub fn wallpaper(&self) -> Option<PathBuf> {
        self.wallpaper.lock().clone()
    }

    /// Make `item` fail to resolve.
    pub fn set_unresolvable(&self, item: &str) {
        self.unresolvable.lock().insert(item.to_string());
    }

    /// Fail wallpaper changes.
    pub fn set_fail_wallpaper(&self, v: bool) {
        self.fail_wallpaper.store(v, Ordering::SeqCst);
    }

    /// Fail dock reads.
    pub fn set_fail_dock_read(&self, v: bool) {
        self.fail_dock_read.store(v, Ordering::SeqCst);
    }

    /// Fail dock edits.
    pub fn set_fail_dock_edits(&self, v: bool) {
        self.fail_dock_edits.store(v, Ordering::SeqCst);
    }

    /// All calls so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// True if any call starts with `prefix`.
    pub fn calls_contains(&self, prefix: &str) -> bool {
        self.calls.lock().iter().any(|c| c.starts_with(prefix))
    }

    /// Number of state-changing calls (edits, commits, wallpaper).
    pub fn mutation_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| !c.starts_with("items"))
            .count()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Record a call.
    fn note(&self, s: String) {
        self.calls.lock().push(s);
    }

    /// Error returned by scripted failures.
    fn scripted(what: &str) -> Error {
        Error::CommandFailed {
            tool: "mock".into(),
            status: "exit status: 1".into(),
            stderr: format!("scripted {what} failure"),
        }
    }

    /// Insert `label` into the simulated dock after `after`.
    fn insert_after(dock: &mut Vec<String>, label: String, after: Option<&str>) {
        let at = after
            .and_then(|a| dock.iter().position(|x| x == a))
            .map_or(0, |i| i + 1);
        dock.insert(at, label);
    }
}

/// Render an anchor for the call log.
fn anchor(after: Option<&str>) -> &str {
    after.unwrap_or("^")
}

impl DockController for MockDesktop {
    fn items(&self) -> Result<Vec<String>> {
        self.note("items".into());
        if self.fail_dock_read.load(Ordering::SeqCst) {
            return Err(Self::scripted("dock read"));
        }
        Ok(self.dock())
    }

    fn resolve(&self, item: &str) -> Option<DockApp> {
        if self.unresolvable.lock().contains(item) {
            return None;
        }
        let label = item.strip_suffix(".app").unwrap_or(item).to_string();
        Some(DockApp {
            path: PathBuf::from(format!("/Applications/{label}.app")),
            label,
        })
    }

    fn remove(&self, label: &str) -> Result<()> {
        self.note(format!("remove:{label}"));
        if self.fail_dock_edits.load(Ordering::SeqCst) {
            return Err(Self::scripted("dock edit"));
        }
        self.dock.lock().retain(|x| x != label);
        Ok(())
    }

    fn add(&self, app: &DockApp, after: Option<&str>) -> Result<()> {
        self.note(format!("add:{}@{}", app.label, anchor(after)));
        if self.fail_dock_edits.load(Ordering::SeqCst) {
            return Err(Self::scripted("dock edit"));
        }
        Self::insert_after(&mut self.dock.lock(), app.label.clone(), after);
        Ok(())
    }

    fn move_item(&self, label: &str, after: Option<&str>) -> Result<()> {
        self.note(format!("move:{label}@{}", anchor(after)));
        if self.fail_dock_edits.load(Ordering::SeqCst) {
            return Err(Self::scripted("dock edit"));
        }
        let mut dock = self.dock.lock();
        dock.retain(|x| x != label);
        Self::insert_after(&mut dock, label.to_string(), after);
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        self.note("commit".into());
        Ok(())
    }
}

impl WallpaperController for MockDesktop {
    fn set_wallpaper(&self, path: &Path) -> Result<()> {
        self.note(format!("wallpaper:{}", path.display()));
        if self.fail_wallpaper.load(Ordering::SeqCst) {
            return Err(Self::scripted("wallpaper"));
        }
        *self.wallpaper.lock() = Some(path.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_update_simulated_dock() {
        let m = MockDesktop::with_dock(["Safari", "Mail"]);
        let slack = m.resolve("Slack").unwrap();
        m.add(&slack, Some("Safari")).unwrap();
        assert_eq!(m.dock(), vec!["Safari", "Slack", "Mail"]);
        m.move_item("Mail", None).unwrap();
        assert_eq!(m.dock(), vec!["Mail", "Safari", "Slack"]);
        m.remove("Safari").unwrap();
        assert_eq!(m.dock(), vec!["Mail", "Slack"]);
        assert_eq!(m.mutation_count(), 3);
        assert!(m.calls_contains("move:Mail@^"));
    }

    #[test]
    fn scripted_failures() {
        let m = MockDesktop::new();
        m.set_fail_wallpaper(true);
        assert!(m.set_wallpaper(Path::new("/a.png")).is_err());
        assert_eq!(m.wallpaper(), None);
        m.set_unresolvable("Ghost");
        assert!(m.resolve("Ghost").is_none());
    }
}
