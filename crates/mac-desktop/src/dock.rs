//! `dockutil`-backed dock controller.

use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

use tracing::debug;

use crate::{DockApp, DockController, Result, run};

/// Dock helper binary.
const DOCKUTIL: &str = "dockutil";

/// Section names `dockutil --list` uses for application tiles.
const APP_SECTIONS: &[&str] = &["persistentApps", "persistent-apps"];

/// Directories searched, in order, for a bare application name.
fn default_app_dirs(home: Option<&Path>) -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/Applications"),
        PathBuf::from("/System/Applications"),
        PathBuf::from("/System/Applications/Utilities"),
        PathBuf::from("/Applications/Utilities"),
    ];
    if let Some(home) = home {
        dirs.push(home.join("Applications"));
    }
    dirs
}

/// Parse `dockutil --list` output into application tile labels.
///
/// Each line is `label<TAB>url<TAB>section<TAB>plist`. Only application tiles
/// are returned; lines without a section column are assumed to be apps.
pub fn parse_dock_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let mut cols = line.split('\t');
            let label = cols.next()?.trim();
            if label.is_empty() {
                return None;
            }
            match cols.nth(1) {
                Some(section) if !APP_SECTIONS.contains(&section.trim()) => None,
                _ => Some(label.to_string()),
            }
        })
        .collect()
}

/// Resolve a configured dock item against `app_dirs`.
///
/// Absolute paths (and `~/` paths, given `home`) must exist. Bare names are
/// looked up as `<dir>/<name>.app`; a trailing `.app` on the name is accepted.
pub fn resolve_app(item: &str, app_dirs: &[PathBuf], home: Option<&Path>) -> Option<DockApp> {
    let item = item.trim();
    let explicit = match item.strip_prefix("~/") {
        Some(rest) => Some(home?.join(rest)),
        None if item.starts_with('/') => Some(PathBuf::from(item)),
        None => None,
    };
    let path = match explicit {
        Some(p) => p.exists().then_some(p)?,
        None => {
            let name = item.strip_suffix(".app").unwrap_or(item);
            app_dirs
                .iter()
                .map(|d| d.join(format!("{name}.app")))
                .find(|p| p.exists())?
        }
    };
    let label = path.file_stem()?.to_string_lossy().into_owned();
    Some(DockApp { label, path })
}

/// Tile label a configured item would have, without touching the disk.
///
/// `Slack`, `Slack.app`, `/Applications/Setapp/Slack.app` and
/// `~/Applications/Slack.app` all label as `Slack`.
pub fn item_label(item: &str) -> Option<String> {
    let name = Path::new(item.trim()).file_name()?.to_str()?;
    let label = name.strip_suffix(".app").unwrap_or(name);
    (!label.is_empty()).then(|| label.to_string())
}

/// Anchor arguments for `--add`/`--move`.
fn position_args(after: Option<&str>) -> [&str; 2] {
    match after {
        Some(label) => ["--after", label],
        None => ["--position", "beginning"],
    }
}

/// Production dock controller.
///
/// Edits are made with `--no-restart`; [`DockController::commit`] restarts
/// the Dock once if any edit succeeded since the last commit.
pub struct DockUtil {
    /// Application search path for bare names.
    app_dirs: Vec<PathBuf>,
    /// Home directory for `~/` items.
    home: Option<PathBuf>,
    /// An edit was made since the last commit.
    dirty: AtomicBool,
}

impl Default for DockUtil {
    fn default() -> Self {
        Self::new()
    }
}

impl DockUtil {
    /// Controller using the standard application directories.
    pub fn new() -> Self {
        let home = dirs::home_dir();
        Self {
            app_dirs: default_app_dirs(home.as_deref()),
            home,
            dirty: AtomicBool::new(false),
        }
    }

    /// Replace the application search path.
    pub fn with_app_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.app_dirs = dirs;
        self
    }

    /// Run a mutating `dockutil` invocation.
    fn edit(&self, args: &[&str]) -> Result<()> {
        run(DOCKUTIL, args.iter().chain(&["--no-restart"]))?;
        self.dirty.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl DockController for DockUtil {
    fn items(&self) -> Result<Vec<String>> {
        Ok(parse_dock_list(&run(DOCKUTIL, ["--list"])?))
    }

    fn resolve(&self, item: &str) -> Option<DockApp> {
        resolve_app(item, &self.app_dirs, self.home.as_deref())
    }

    fn remove(&self, label: &str) -> Result<()> {
        self.edit(&["--remove", label])
    }

    fn add(&self, app: &DockApp, after: Option<&str>) -> Result<()> {
        let path = app.path.to_string_lossy();
        let [flag, anchor] = position_args(after);
        self.edit(&["--add", &*path, flag, anchor])
    }

    fn move_item(&self, label: &str, after: Option<&str>) -> Result<()> {
        let [flag, anchor] = position_args(after);
        self.edit(&["--move", label, flag, anchor])
    }

    fn commit(&self) -> Result<()> {
        if self.dirty.swap(false, Ordering::SeqCst) {
            debug!("restarting Dock");
            run("killall", ["Dock"])?;
        }
        Ok(())
    }
}
