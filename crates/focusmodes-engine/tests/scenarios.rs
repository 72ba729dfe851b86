//! End-to-end poll cycles against in-memory focus and desktop fakes.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use config::ModeProfile;
use focusmodes_engine::{Control, Daemon, DaemonConfig, StateStore, TickOutcome};
use mac_desktop::MockDesktop;
use mac_focus_mode::{FocusMode, StaticFocusSource};
use tempfile::TempDir;
use tokio::{sync::mpsc::unbounded_channel, time};

const WORK: &str = r#"{
  "modes": {
    "Work": { "dockItems": ["Mail", "Slack"], "wallpaperPath": "/img/work.png" }
  }
}"#;

const WORK_AND_PERSONAL: &str = r#"{
  "modes": {
    "Work": { "dockItems": ["Mail", "Slack"], "wallpaperPath": "/img/work.png" },
    "Personal": { "dockItems": ["Music", "Messages"] }
  }
}"#;

const DUPLICATE_WORK: &str = r#"{
  "modes": {
    "Work": { "dockItems": ["Mail"] },
    "Work": { "dockItems": ["Slack"] }
  }
}"#;

struct Fixture {
    dir: TempDir,
    focus: Arc<StaticFocusSource>,
    desktop: MockDesktop,
}

impl Fixture {
    fn new(config: &str, mode: FocusMode) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.json"), config).unwrap();
        Self {
            dir,
            focus: Arc::new(StaticFocusSource::new(mode)),
            desktop: MockDesktop::with_dock(["Safari", "Mail"]),
        }
    }

    fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.json")
    }

    fn state_path(&self) -> PathBuf {
        self.dir.path().join("state.json")
    }

    fn daemon(&self) -> Daemon {
        Daemon::new(
            DaemonConfig {
                config_path: self.config_path(),
                state_path: self.state_path(),
                poll_interval: Some(Duration::from_millis(10)),
            },
            self.focus.clone(),
            Arc::new(self.desktop.clone()),
            Arc::new(self.desktop.clone()),
        )
    }

    /// Daemon whose poll never fires during a test.
    fn slow_daemon(&self) -> Daemon {
        Daemon::new(
            DaemonConfig {
                config_path: self.config_path(),
                state_path: self.state_path(),
                poll_interval: Some(Duration::from_secs(3600)),
            },
            self.focus.clone(),
            Arc::new(self.desktop.clone()),
            Arc::new(self.desktop.clone()),
        )
    }

    fn write_config(&self, config: &str) {
        fs::write(self.config_path(), config).unwrap();
    }
}

fn work_profile() -> ModeProfile {
    ModeProfile::new(["Mail", "Slack"], Some(Path::new("/img/work.png")))
}

#[test]
fn first_work_activation_applies_everything() {
    let fx = Fixture::new(WORK, FocusMode::named("Work"));
    let mut daemon = fx.daemon();

    assert_eq!(daemon.tick(), TickOutcome::Applied { clean: true });
    assert_eq!(fx.desktop.wallpaper(), Some(PathBuf::from("/img/work.png")));
    assert_eq!(fx.desktop.dock(), vec!["Mail", "Slack"]);

    let state = daemon.state().unwrap();
    assert_eq!(state.mode, "Work");
    assert_eq!(state.fingerprint, work_profile().fingerprint());
    let stored = StateStore::new(fx.state_path()).load().unwrap().unwrap();
    assert_eq!(&stored, state);
}

#[test]
fn repeated_poll_makes_no_calls() {
    let fx = Fixture::new(WORK, FocusMode::named("Work"));
    let mut daemon = fx.daemon();
    daemon.tick();
    let before = daemon.state().cloned();
    fx.desktop.clear_calls();

    assert_eq!(daemon.tick(), TickOutcome::Unchanged);
    assert_eq!(fx.desktop.mutation_count(), 0);
    assert!(fx.desktop.calls().is_empty());
    assert_eq!(daemon.state().cloned(), before);
}

#[test]
fn restart_does_not_reapply() {
    let fx = Fixture::new(WORK, FocusMode::named("Work"));
    fx.daemon().tick();
    fx.desktop.clear_calls();

    let mut restarted = fx.daemon();
    assert_eq!(restarted.tick(), TickOutcome::Unchanged);
    assert!(fx.desktop.calls().is_empty());
}

#[test]
fn unconfigured_mode_is_a_no_op() {
    let fx = Fixture::new(WORK, FocusMode::named("Work"));
    let mut daemon = fx.daemon();
    daemon.tick();
    let before = daemon.state().cloned();
    fx.desktop.clear_calls();

    fx.focus.set(FocusMode::named("Unknown-XYZ"));
    assert_eq!(daemon.tick(), TickOutcome::NoProfile);
    assert_eq!(fx.desktop.mutation_count(), 0);
    assert_eq!(daemon.state().cloned(), before);
}

#[test]
fn unreadable_focus_state_changes_nothing() {
    let fx = Fixture::new(WORK, FocusMode::named("Work"));
    let mut daemon = fx.daemon();
    fx.focus.fail();
    assert_eq!(daemon.tick(), TickOutcome::Unknown);
    assert!(fx.desktop.calls().is_empty());
    assert!(daemon.state().is_none());
}

#[test]
fn switching_modes_reapplies() {
    let fx = Fixture::new(WORK_AND_PERSONAL, FocusMode::named("Work"));
    let mut daemon = fx.daemon();
    daemon.tick();

    fx.focus.set(FocusMode::named("Personal"));
    assert_eq!(daemon.tick(), TickOutcome::Applied { clean: true });
    assert_eq!(fx.desktop.dock(), vec!["Music", "Messages"]);
    assert_eq!(fx.desktop.wallpaper(), Some(PathBuf::from("/img/work.png")));

    fx.desktop.clear_calls();
    fx.focus.set(FocusMode::named("Work"));
    assert_eq!(daemon.tick(), TickOutcome::Applied { clean: true });
    assert_eq!(fx.desktop.dock(), vec!["Mail", "Slack"]);
    // The wallpaper never changed, so it is not set again.
    assert!(!fx.desktop.calls_contains("wallpaper:"));
}

#[test]
fn duplicate_mode_keeps_previous_profiles() {
    let fx = Fixture::new(WORK, FocusMode::named("Work"));
    let mut daemon = fx.daemon();
    daemon.tick();

    fx.write_config(DUPLICATE_WORK);
    assert!(!daemon.reload());
    let err = config::load_from_path(&fx.config_path()).unwrap_err();
    assert_eq!(err.kind(), config::ErrorKind::DuplicateMode);

    let current = daemon.profiles().current().unwrap();
    assert_eq!(current.get("Work"), Some(&work_profile()));
    fx.desktop.clear_calls();
    assert_eq!(daemon.tick(), TickOutcome::Unchanged);
    assert!(fx.desktop.calls().is_empty());
}

#[test]
fn idles_until_config_appears() {
    let fx = Fixture::new(WORK, FocusMode::named("Work"));
    fs::remove_file(fx.config_path()).unwrap();
    let mut daemon = fx.daemon();
    assert_eq!(daemon.tick(), TickOutcome::Idle);
    assert!(fx.desktop.calls().is_empty());

    fx.write_config(WORK);
    assert!(daemon.reload());
    assert_eq!(daemon.tick(), TickOutcome::Applied { clean: true });
}

#[test]
fn edited_profile_reapplies() {
    let fx = Fixture::new(WORK, FocusMode::named("Work"));
    let mut daemon = fx.daemon();
    daemon.tick();

    fx.write_config(
        r#"{"modes": {"Work": {"dockItems": ["Slack", "Mail", "Calendar"], "wallpaperPath": "/img/work.png"}}}"#,
    );
    assert!(daemon.reload());
    fx.desktop.clear_calls();
    assert_eq!(daemon.tick(), TickOutcome::Applied { clean: true });
    assert_eq!(fx.desktop.dock(), vec!["Slack", "Mail", "Calendar"]);
    assert_eq!(
        fx.desktop.calls(),
        vec!["items", "move:Mail@Slack", "add:Calendar@Mail", "commit"]
    );
}

#[test]
fn total_failure_retries_next_cycle() {
    let fx = Fixture::new(WORK, FocusMode::named("Work"));
    let mut daemon = fx.daemon();
    fx.desktop.set_fail_wallpaper(true);
    fx.desktop.set_fail_dock_read(true);
    assert_eq!(daemon.tick(), TickOutcome::Failed);
    assert!(daemon.state().is_none());
    assert!(!fx.state_path().exists());

    fx.desktop.set_fail_wallpaper(false);
    fx.desktop.set_fail_dock_read(false);
    assert_eq!(daemon.tick(), TickOutcome::Applied { clean: true });
    assert_eq!(fx.desktop.dock(), vec!["Mail", "Slack"]);
}

#[test]
fn partial_failure_is_persisted() {
    let fx = Fixture::new(WORK, FocusMode::named("Work"));
    let mut daemon = fx.daemon();
    fx.desktop.set_fail_wallpaper(true);
    assert_eq!(daemon.tick(), TickOutcome::Applied { clean: false });
    assert_eq!(fx.desktop.dock(), vec!["Mail", "Slack"]);
    assert!(fx.state_path().exists());
}

#[test]
fn no_focus_uses_none_profile() {
    let fx = Fixture::new(
        r#"{"modes": {"None": {"dockItems": ["Finder"]}}}"#,
        FocusMode::none(),
    );
    let mut daemon = fx.daemon();
    assert_eq!(daemon.tick(), TickOutcome::Applied { clean: true });
    assert_eq!(fx.desktop.dock(), vec!["Finder"]);
}

/// Poll `cond` until it holds or a generous deadline passes.
async fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

#[tokio::test]
async fn run_applies_and_stops_on_shutdown() {
    let fx = Fixture::new(WORK, FocusMode::named("Work"));
    let (tx, rx) = unbounded_channel();
    let handle = tokio::spawn(fx.daemon().run(rx));

    assert!(eventually(|| fx.desktop.dock() == vec!["Mail", "Slack"]).await);
    tx.send(Control::Shutdown).unwrap();
    time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("daemon did not stop")
        .unwrap();
}

#[tokio::test]
async fn run_follows_mode_changes() {
    let fx = Fixture::new(WORK_AND_PERSONAL, FocusMode::named("Work"));
    let (tx, rx) = unbounded_channel();
    let handle = tokio::spawn(fx.daemon().run(rx));

    assert!(eventually(|| fx.desktop.dock() == vec!["Mail", "Slack"]).await);
    fx.focus.set(FocusMode::named("Personal"));
    assert!(eventually(|| fx.desktop.dock() == vec!["Music", "Messages"]).await);

    drop(tx);
    time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("daemon did not stop")
        .unwrap();
}

#[tokio::test]
async fn reload_request_applies_new_config() {
    let fx = Fixture::new(WORK, FocusMode::named("Work"));
    let (tx, rx) = unbounded_channel();
    let handle = tokio::spawn(fx.slow_daemon().run(rx));
    assert!(eventually(|| fx.desktop.dock() == vec!["Mail", "Slack"]).await);

    fx.write_config(r#"{"modes": {"Work": {"dockItems": ["Calendar"]}}}"#);
    tx.send(Control::Reload).unwrap();
    assert!(eventually(|| fx.desktop.dock() == vec!["Calendar"]).await);

    tx.send(Control::Shutdown).unwrap();
    time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("daemon did not stop")
        .unwrap();
}

#[tokio::test]
async fn config_edit_on_disk_applies_without_waiting_for_poll() {
    let fx = Fixture::new(WORK, FocusMode::named("Work"));
    let (tx, rx) = unbounded_channel();
    let handle = tokio::spawn(fx.slow_daemon().run(rx));
    assert!(eventually(|| fx.desktop.dock() == vec!["Mail", "Slack"]).await);

    fx.write_config(r#"{"modes": {"Work": {"dockItems": ["Calendar"]}}}"#);
    assert!(eventually(|| fx.desktop.dock() == vec!["Calendar"]).await);

    tx.send(Control::Shutdown).unwrap();
    time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("daemon did not stop")
        .unwrap();
}
