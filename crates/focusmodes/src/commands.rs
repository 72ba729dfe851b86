use std::{path::Path, process::ExitCode, sync::Arc};

use focusmodes_engine::{Daemon, DaemonConfig, StateStore, TickOutcome};
use mac_desktop::{DockUtil, Osascript};
use mac_focus_mode::{DndDbSource, FocusMode, FocusReader};

use crate::Paths;

/// Read the active mode from the Focus database under `home`.
fn read_mode(home: &Path) -> FocusMode {
    FocusReader::new(Arc::new(DndDbSource::for_home(home))).current_mode()
}

/// Render a mode with its identifier when known.
fn describe(mode: &FocusMode) -> String {
    match mode.identifier() {
        Some(id) => format!("{} ({id})", mode.name()),
        None => mode.name().to_string(),
    }
}

/// Validate the document at `path`, optionally dumping it as JSON.
pub fn check(path: &Path, dump: bool) -> ExitCode {
    let store = match config::load_from_path(path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("{}", e.pretty());
            return ExitCode::FAILURE;
        }
    };
    if dump {
        match serde_json::to_string_pretty(&store) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Failed to serialize config: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("OK ({} modes)", store.len());
    }
    ExitCode::SUCCESS
}

/// Print the active mode.
pub fn mode(home: &Path) -> ExitCode {
    println!("{}", describe(&read_mode(home)));
    ExitCode::SUCCESS
}

/// Print the active mode, the configuration, and the applied state.
pub fn status(paths: &Paths) -> ExitCode {
    let mode = read_mode(paths.home());
    println!("mode:    {}", describe(&mode));

    match config::load_from_path(&paths.config) {
        Ok(store) => {
            println!("config:  {} ({} modes)", paths.config.display(), store.len());
            let matched = mode.lookup_keys().find(|k| store.get(k).is_some());
            match matched {
                Some(key) => println!("profile: {key}"),
                None => println!("profile: none"),
            }
        }
        Err(e) => println!("config:  {} (invalid: {e})", paths.config.display()),
    }

    match StateStore::new(&paths.state).load() {
        Ok(Some(state)) => {
            println!(
                "applied: {} [{}] at {}",
                state.mode,
                state.fingerprint.short(),
                state.applied_at
            );
            if let Some(w) = state.wallpaper {
                println!("wallpaper: {}", w.display());
            }
        }
        Ok(None) => println!("applied: nothing yet"),
        Err(e) => println!("applied: unreadable ({e})"),
    }
    ExitCode::SUCCESS
}

/// Run one reconcile cycle against the live desktop.
pub fn apply(paths: &Paths, config: DaemonConfig) -> ExitCode {
    let mut daemon = Daemon::new(
        config,
        Arc::new(DndDbSource::for_home(paths.home())),
        Arc::new(DockUtil::new()),
        Arc::new(Osascript),
    );
    let outcome = daemon.tick();
    let summary = match outcome {
        TickOutcome::Idle => "no valid configuration",
        TickOutcome::Unknown => "focus mode unknown; nothing applied",
        TickOutcome::NoProfile => "no profile for the active mode",
        TickOutcome::Unchanged => "already applied",
        TickOutcome::Applied { clean: true } => "applied",
        TickOutcome::Applied { clean: false } => "applied with errors (see log)",
        TickOutcome::Failed => "failed (see log)",
    };
    println!("{summary}");
    if outcome == TickOutcome::Failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
