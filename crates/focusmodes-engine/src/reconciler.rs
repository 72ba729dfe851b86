//! Applies a mode profile to the desktop.

use std::{collections::HashSet, path::PathBuf, sync::Arc};

use config::ModeProfile;
use mac_desktop::{DockApp, DockController, WallpaperController, item_label};
use tracing::{debug, error, info, warn};

use crate::{
    error::{ReconcileError, Result},
    plan::{DockEdit, plan},
    state::{ReconcilerState, StateStore},
};

/// Outcome of one [`Reconciler::apply`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    /// State now in effect. Equal to the previous state when nothing changed.
    pub state: ReconcilerState,
    /// False when the fingerprint matched and no work was done.
    pub changed: bool,
    /// Partial failures that did not stop the rest of the profile.
    pub failures: Vec<ReconcileError>,
}

impl ApplyReport {
    /// True when every requested change was applied and persisted.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of applying one resource.
enum Outcome {
    /// The profile does not mention this resource.
    Skipped,
    /// The resource now matches the profile.
    Done,
    /// Nothing could be applied.
    Failed,
}

/// Brings the dock and wallpaper in line with a [`ModeProfile`].
///
/// The wallpaper and the dock are independent: a failure in one is recorded
/// and the other is still applied. State is persisted unless every resource
/// the profile asked for failed.
pub struct Reconciler {
    /// Dock backend.
    dock: Arc<dyn DockController>,
    /// Wallpaper backend.
    wallpaper: Arc<dyn WallpaperController>,
    /// Where applied state is recorded.
    store: StateStore,
}

impl Reconciler {
    /// Construct a reconciler over the given backends.
    pub fn new(
        dock: Arc<dyn DockController>,
        wallpaper: Arc<dyn WallpaperController>,
        store: StateStore,
    ) -> Self {
        Self {
            dock,
            wallpaper,
            store,
        }
    }

    /// State file backing this reconciler.
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Apply `profile` for `mode`.
    ///
    /// Returns without touching anything when `previous` records the same mode
    /// and profile fingerprint. Returns [`ReconcileError::AllResourcesFailed`]
    /// when every requested resource failed; `previous` then stays in effect.
    pub fn apply(
        &self,
        mode: &str,
        profile: &ModeProfile,
        previous: Option<&ReconcilerState>,
    ) -> Result<ApplyReport> {
        let fingerprint = profile.fingerprint();
        if let Some(prev) = previous
            && prev.mode == mode
            && prev.fingerprint == fingerprint
        {
            debug!(mode, fingerprint = %fingerprint.short(), "profile_unchanged");
            return Ok(ApplyReport {
                state: prev.clone(),
                changed: false,
                failures: Vec::new(),
            });
        }

        info!(mode, fingerprint = %fingerprint.short(), "applying profile");
        let mut failures = Vec::new();
        let last_wallpaper = previous.and_then(|p| p.wallpaper.clone());

        let (wallpaper_outcome, wallpaper) =
            self.apply_wallpaper(profile, last_wallpaper, &mut failures);
        let dock_outcome = match &profile.dock_items {
            Some(items) => self.apply_dock(items, &mut failures),
            None => Outcome::Skipped,
        };

        let attempted = [&wallpaper_outcome, &dock_outcome]
            .iter()
            .filter(|o| !matches!(o, Outcome::Skipped))
            .count();
        let failed = [&wallpaper_outcome, &dock_outcome]
            .iter()
            .filter(|o| matches!(o, Outcome::Failed))
            .count();
        if attempted > 0 && failed == attempted {
            let err = ReconcileError::AllResourcesFailed {
                mode: mode.to_string(),
                errors: failures,
            };
            error!(mode, error = %err, "profile not applied");
            return Err(err);
        }

        let state = ReconcilerState::new(mode, fingerprint, wallpaper);
        if let Err(e) = self.store.save(&state) {
            let err = ReconcileError::StatePersistFailed {
                path: self.store.path().to_path_buf(),
                message: e.to_string(),
            };
            error!(error = %err, "state not persisted; profile will be re-applied after restart");
            failures.push(err);
        }

        if failures.is_empty() {
            info!(mode, "profile applied");
        } else {
            warn!(mode, failures = failures.len(), "profile partially applied");
        }
        Ok(ApplyReport {
            state,
            changed: true,
            failures,
        })
    }

    /// Set the wallpaper if the profile names one that is not already set.
    ///
    /// Returns the outcome and the wallpaper that should be recorded.
    fn apply_wallpaper(
        &self,
        profile: &ModeProfile,
        last: Option<PathBuf>,
        failures: &mut Vec<ReconcileError>,
    ) -> (Outcome, Option<PathBuf>) {
        let Some(path) = profile.wallpaper_path.as_deref() else {
            return (Outcome::Skipped, last);
        };
        if last.as_deref() == Some(path) {
            debug!(path = %path.display(), "wallpaper_already_set");
            return (Outcome::Done, last);
        }
        match self.wallpaper.set_wallpaper(path) {
            Ok(()) => {
                info!(path = %path.display(), "wallpaper set");
                (Outcome::Done, Some(path.to_path_buf()))
            }
            Err(e) => {
                let err = ReconcileError::WallpaperFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                };
                warn!(error = %err, "wallpaper not applied");
                failures.push(err);
                (Outcome::Failed, last)
            }
        }
    }

    /// Edit the dock so its application tiles equal `items`, in order.
    fn apply_dock(&self, items: &[String], failures: &mut Vec<ReconcileError>) -> Outcome {
        let live = match self.dock.items() {
            Ok(live) => live,
            Err(e) => {
                let err = ReconcileError::DockFailed {
                    message: e.to_string(),
                };
                warn!(error = %err, "cannot read dock");
                failures.push(err);
                return Outcome::Failed;
            }
        };

        let (apps, desired) = self.resolve_items(items, &live, failures);
        let edits = plan(&live, &desired);
        if edits.is_empty() {
            debug!(items = desired.len(), "dock_already_matches");
            return Outcome::Done;
        }
        debug!(edits = edits.len(), "dock_plan");

        let mut applied = 0usize;
        let mut first_error = None;
        for edit in &edits {
            let res = match edit {
                DockEdit::Remove { label } => self.dock.remove(label),
                DockEdit::Move { label, after } => self.dock.move_item(label, after.as_deref()),
                DockEdit::Add { label, after } => match apps.iter().find(|a| &a.label == label) {
                    Some(app) => self.dock.add(app, after.as_deref()),
                    None => continue,
                },
            };
            match res {
                Ok(()) => applied += 1,
                Err(e) => {
                    warn!(label = edit.label(), error = %e, "dock edit failed");
                    first_error.get_or_insert(e.to_string());
                }
            }
        }

        if applied > 0
            && let Err(e) = self.dock.commit()
        {
            warn!(error = %e, "dock restart failed");
            first_error.get_or_insert(e.to_string());
        }

        match first_error {
            None => Outcome::Done,
            Some(message) => {
                failures.push(ReconcileError::DockFailed { message });
                if applied > 0 {
                    Outcome::Done
                } else {
                    Outcome::Failed
                }
            }
        }
    }

    /// Resolve configured items into bundles to add and the desired labels.
    ///
    /// An item that does not resolve but whose tile is already in `live` is
    /// kept in place: it stays desired and is never added. Unresolvable items
    /// absent from the dock are skipped and reported. Repeats are dropped.
    fn resolve_items(
        &self,
        items: &[String],
        live: &[String],
        failures: &mut Vec<ReconcileError>,
    ) -> (Vec<DockApp>, Vec<String>) {
        let mut seen = HashSet::new();
        let mut apps = Vec::with_capacity(items.len());
        let mut desired = Vec::with_capacity(items.len());
        for item in items {
            let label = match self.dock.resolve(item) {
                Some(app) => {
                    let label = app.label.clone();
                    if !seen.contains(&label) {
                        apps.push(app);
                    }
                    label
                }
                None => match item_label(item).filter(|l| live.contains(l)) {
                    Some(label) => {
                        debug!(item, label = %label, "unresolvable dock item already present; keeping");
                        label
                    }
                    None => {
                        let err = ReconcileError::DockItemUnresolvable { item: item.clone() };
                        warn!(error = %err, "skipping dock item");
                        failures.push(err);
                        continue;
                    }
                },
            };
            if seen.insert(label.clone()) {
                desired.push(label);
            } else {
                warn!(item, "dock item listed twice; keeping first");
            }
        }
        (apps, desired)
    }
}
