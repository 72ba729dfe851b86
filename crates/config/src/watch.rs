//! Change notifications for the config file.
//!
//! [`watch`] prefers a native filesystem watcher on the config file's parent
//! directory, since editors commonly replace files by renaming a temporary
//! over them. When the native watcher cannot be installed (for instance the
//! directory does not exist yet) it falls back to polling the file's
//! modification time and length.
//!
//! The resulting [`ConfigWatch`] is an endless stream of "something changed"
//! signals. Bursts are coalesced into a single signal. Dropping the watch stops
//! all background work; call [`watch`] again to restart it.

use std::{
    ffi::{OsStr, OsString},
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::{
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
    task::JoinHandle,
    time::interval,
};
use tracing::{debug, warn};

/// Interval for the modification-time fallback.
const POLL_FALLBACK_INTERVAL: Duration = Duration::from_secs(2);

/// Keeps whichever backend feeds the channel alive.
enum Backend {
    /// Native filesystem notifications.
    Native(RecommendedWatcher),
    /// Modification-time polling task.
    Poll(JoinHandle<()>),
}

/// Stream of config change signals. See the module docs.
pub struct ConfigWatch {
    /// Change signals from the backend.
    rx: UnboundedReceiver<()>,
    /// Source of the signals; held for its lifetime.
    backend: Backend,
}

impl ConfigWatch {
    /// Watch `path` by polling its modification time every `every`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn poll(path: &Path, every: Duration) -> Self {
        let (tx, rx) = unbounded_channel();
        let task = tokio::spawn(poll_loop(path.to_path_buf(), every, tx));
        Self {
            rx,
            backend: Backend::Poll(task),
        }
    }

    /// Wait for the next change. Coalesces any signals already queued.
    ///
    /// Returns `None` only if the backend has shut down.
    pub async fn changed(&mut self) -> Option<()> {
        self.rx.recv().await?;
        while self.rx.try_recv().is_ok() {}
        Some(())
    }

    /// True when backed by native filesystem notifications.
    pub fn is_native(&self) -> bool {
        matches!(self.backend, Backend::Native(_))
    }
}

impl Drop for ConfigWatch {
    fn drop(&mut self) {
        if let Backend::Poll(task) = &self.backend {
            task.abort();
        }
    }
}

/// Start watching the config file at `path`.
///
/// Must be called from within a tokio runtime.
pub fn watch(path: &Path) -> ConfigWatch {
    match native(path) {
        Ok(watch) => {
            debug!(path = %path.display(), "config_watch_native");
            watch
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "native config watcher unavailable; polling for changes"
            );
            ConfigWatch::poll(path, POLL_FALLBACK_INTERVAL)
        }
    }
}

/// Install a native watcher on the parent directory of `path`.
fn native(path: &Path) -> notify::Result<ConfigWatch> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let name: Option<OsString> = path.file_name().map(|n| n.to_os_string());
    let (tx, rx) = unbounded_channel();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if is_relevant(&event, name.as_deref()) {
                    let _ignored = tx.send(());
                }
            }
            Err(e) => debug!(error = %e, "config_watch_event_error"),
        },
        notify::Config::default(),
    )?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    Ok(ConfigWatch {
        rx,
        backend: Backend::Native(watcher),
    })
}

/// True for content-affecting events that touch the watched file name.
fn is_relevant(event: &Event, name: Option<&OsStr>) -> bool {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    ) {
        return false;
    }
    match name {
        Some(name) => event.paths.iter().any(|p| p.file_name() == Some(name)),
        None => true,
    }
}

/// Observable identity of the file for change detection.
type Stamp = Option<(SystemTime, u64)>;

/// Read the current stamp; a missing file has no stamp.
fn stamp(path: &Path) -> Stamp {
    let meta = fs::metadata(path).ok()?;
    Some((meta.modified().ok()?, meta.len()))
}

/// Emit a signal whenever the stamp changes.
async fn poll_loop(path: PathBuf, every: Duration, tx: UnboundedSender<()>) {
    let mut last = stamp(&path);
    let mut ticker = interval(every);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let now = stamp(&path);
        if now != last {
            last = now;
            if tx.send(()).is_err() {
                return;
            }
        }
    }
}
