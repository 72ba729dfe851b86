//! The poll loop tying focus reads, configuration, and the reconciler together.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use config::{DEFAULT_POLL_INTERVAL, ModeProfile, ProfileStore};
use mac_desktop::{DockController, WallpaperController};
use mac_focus_mode::{FocusMode, FocusReader, FocusStateSource};
use tokio::{sync::mpsc::UnboundedReceiver, time};
use tracing::{debug, info, warn};

use crate::{
    reconciler::Reconciler,
    state::{ReconcilerState, StateStore},
};

/// Paths and overrides for a [`Daemon`].
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Profile document.
    pub config_path: PathBuf,
    /// Persisted reconciler state.
    pub state_path: PathBuf,
    /// Poll interval override; takes precedence over the document.
    pub poll_interval: Option<Duration>,
}

/// Requests delivered to a running daemon, typically from signal handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Re-read the configuration now.
    Reload,
    /// Stop after the current cycle.
    Shutdown,
}

/// What one poll cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No configuration has ever loaded successfully.
    Idle,
    /// The focus state could not be read.
    Unknown,
    /// No profile is configured for the active mode.
    NoProfile,
    /// The active profile is already applied.
    Unchanged,
    /// The profile was applied; `clean` is false after partial failures.
    Applied {
        /// Every requested change succeeded and was persisted.
        clean: bool,
    },
    /// Nothing could be applied.
    Failed,
}

/// The profile document plus the last version of it that validated.
///
/// A document that fails to load never replaces a good one; the daemon keeps
/// running on the previous profiles until the file is fixed.
#[derive(Debug)]
pub struct ProfileSource {
    /// Document path.
    path: PathBuf,
    /// Last successfully loaded store.
    current: Option<ProfileStore>,
}

impl ProfileSource {
    /// Source for the document at `path`. Nothing is loaded yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: None,
        }
    }

    /// Document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The store in effect, if any document has loaded.
    pub fn current(&self) -> Option<&ProfileStore> {
        self.current.as_ref()
    }

    /// Re-read the document. Returns whether the store in effect changed.
    ///
    /// On error the previous store stays in effect.
    pub fn reload(&mut self) -> Result<bool, config::Error> {
        let store = config::load_from_path(&self.path)?;
        let changed = self.current.as_ref() != Some(&store);
        self.current = Some(store);
        Ok(changed)
    }

    /// Profile for `mode`, matched by name and then by identifier.
    pub fn lookup(&self, mode: &FocusMode) -> Option<&ModeProfile> {
        let store = self.current.as_ref()?;
        mode.lookup_keys().find_map(|k| store.get(k))
    }
}

/// Polls the Focus state and applies the matching profile.
pub struct Daemon {
    /// Configuration with last-known-good semantics.
    profiles: ProfileSource,
    /// Focus state reader.
    reader: FocusReader,
    /// Applies profiles.
    reconciler: Reconciler,
    /// Last applied state.
    state: Option<ReconcilerState>,
    /// Poll interval override.
    poll_override: Option<Duration>,
    /// Mode seen on the previous cycle, for change logging.
    last_mode: Option<FocusMode>,
}

impl Daemon {
    /// Build a daemon, loading persisted state and the initial configuration.
    ///
    /// An unreadable state file is ignored, which at worst re-applies the
    /// current profile once. A missing or invalid configuration leaves the
    /// daemon idle until a valid one appears.
    pub fn new(
        config: DaemonConfig,
        focus: Arc<dyn FocusStateSource>,
        dock: Arc<dyn DockController>,
        wallpaper: Arc<dyn WallpaperController>,
    ) -> Self {
        let store = StateStore::new(&config.state_path);
        let state = match store.load() {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable state file");
                None
            }
        };
        if let Some(s) = &state {
            debug!(mode = %s.mode, fingerprint = %s.fingerprint.short(), "state_restored");
        }
        let mut daemon = Self {
            profiles: ProfileSource::new(config.config_path),
            reader: FocusReader::new(focus),
            reconciler: Reconciler::new(dock, wallpaper, store),
            state,
            poll_override: config.poll_interval,
            last_mode: None,
        };
        daemon.reload();
        daemon
    }

    /// Configuration in effect.
    pub fn profiles(&self) -> &ProfileSource {
        &self.profiles
    }

    /// Last applied state.
    pub fn state(&self) -> Option<&ReconcilerState> {
        self.state.as_ref()
    }

    /// Delay between poll cycles.
    pub fn poll_interval(&self) -> Duration {
        self.poll_override
            .or_else(|| self.profiles.current().and_then(ProfileStore::poll_interval))
            .unwrap_or(DEFAULT_POLL_INTERVAL)
    }

    /// Re-read the configuration, keeping the previous one on error.
    ///
    /// Returns true when a new profile store took effect.
    pub fn reload(&mut self) -> bool {
        let path = self.profiles.path().display().to_string();
        match self.profiles.reload() {
            Ok(true) => {
                let modes = self.profiles.current().map_or(0, ProfileStore::len);
                info!(path = %path, modes, "configuration loaded");
                true
            }
            Ok(false) => {
                debug!(path = %path, "config_unchanged");
                false
            }
            Err(e) => {
                if self.profiles.current().is_some() {
                    warn!(path = %path, error = %e, "invalid configuration; keeping previous profiles");
                } else {
                    warn!(path = %path, error = %e, "no valid configuration; idling");
                }
                false
            }
        }
    }

    /// Run one poll cycle: read the mode and apply its profile if needed.
    pub fn tick(&mut self) -> TickOutcome {
        let mode = self.reader.current_mode();
        if self.last_mode.as_ref() != Some(&mode) {
            info!(mode = %mode, "focus mode changed");
            self.last_mode = Some(mode.clone());
        }
        if mode.is_unknown() {
            return TickOutcome::Unknown;
        }
        if self.profiles.current().is_none() {
            return TickOutcome::Idle;
        }
        let Some(profile) = self.profiles.lookup(&mode) else {
            debug!(mode = %mode, "no_profile_for_mode");
            return TickOutcome::NoProfile;
        };
        match self
            .reconciler
            .apply(mode.name(), profile, self.state.as_ref())
        {
            Ok(report) if !report.changed => TickOutcome::Unchanged,
            Ok(report) => {
                let clean = report.is_clean();
                self.state = Some(report.state);
                TickOutcome::Applied { clean }
            }
            Err(_) => TickOutcome::Failed,
        }
    }

    /// Poll until a [`Control::Shutdown`] arrives or `control` closes.
    ///
    /// Configuration changes on disk and [`Control::Reload`] trigger a reload
    /// followed by an immediate cycle. Cycles never overlap.
    pub async fn run(mut self, mut control: UnboundedReceiver<Control>) {
        let mut watch = config::watch(self.profiles.path());
        info!(
            config = %self.profiles.path().display(),
            state = %self.reconciler.store().path().display(),
            interval = ?self.poll_interval(),
            native_watch = watch.is_native(),
            "daemon started"
        );
        loop {
            self.tick();
            tokio::select! {
                biased;
                ctl = control.recv() => match ctl {
                    Some(Control::Reload) => {
                        info!("reload requested");
                        self.reload();
                    }
                    Some(Control::Shutdown) | None => {
                        info!("shutting down");
                        break;
                    }
                },
                changed = watch.changed() => match changed {
                    Some(()) => {
                        debug!("config_changed_on_disk");
                        self.reload();
                    }
                    None => {
                        warn!("config watcher stopped; restarting it");
                        watch = config::watch(self.profiles.path());
                    }
                },
                _ = time::sleep(self.poll_interval()) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use mac_desktop::MockDesktop;
    use mac_focus_mode::StaticFocusSource;

    use super::*;

    const WORK: &str = r#"{"modes": {"Work": {"dockItems": ["Mail", "Slack"]}}}"#;

    #[test]
    fn profile_source_keeps_last_good() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut src = ProfileSource::new(&path);
        assert!(src.reload().is_err());
        assert!(src.current().is_none());

        fs::write(&path, WORK).unwrap();
        assert!(src.reload().unwrap());
        assert!(!src.reload().unwrap());

        fs::write(&path, "{ not json").unwrap();
        assert!(src.reload().is_err());
        assert!(src.lookup(&FocusMode::named("Work")).is_some());
    }

    #[test]
    fn lookup_falls_back_to_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"modes": {"com.apple.focus.work": {"dockItems": []}}}"#,
        )
        .unwrap();
        let mut src = ProfileSource::new(&path);
        src.reload().unwrap();
        let mode = FocusMode::with_identifier("Work", "com.apple.focus.work");
        assert!(src.lookup(&mode).is_some());
        assert!(src.lookup(&FocusMode::named("Work")).is_none());
    }

    #[test]
    fn poll_interval_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"pollIntervalSecs": 2, "modes": {}}"#).unwrap();
        let mock = MockDesktop::new();
        let mk = |poll_interval| {
            Daemon::new(
                DaemonConfig {
                    config_path: path.clone(),
                    state_path: dir.path().join("state.json"),
                    poll_interval,
                },
                Arc::new(StaticFocusSource::new(FocusMode::none())),
                Arc::new(mock.clone()),
                Arc::new(mock.clone()),
            )
        };
        assert_eq!(mk(None).poll_interval(), Duration::from_secs(2));
        assert_eq!(
            mk(Some(Duration::from_millis(250))).poll_interval(),
            Duration::from_millis(250)
        );
        fs::remove_file(&path).unwrap();
        assert_eq!(mk(None).poll_interval(), DEFAULT_POLL_INTERVAL);
    }
}
