//! Core of the focusmodes daemon.
//!
//! - [`Reconciler`] applies a [`config::ModeProfile`] to the dock and wallpaper,
//!   skipping work when the profile fingerprint matches the persisted state.
//! - [`StateStore`] records what was applied, replacing the file atomically.
//! - [`Daemon`] polls the Focus state, watches the configuration, and drives
//!   the reconciler one cycle at a time.
//!
//! The macOS surfaces are reached only through the traits in `mac_desktop`
//! and `mac_focus_mode`, so everything here runs against in-memory fakes in
//! tests.

mod daemon;
mod error;
mod plan;
mod reconciler;
mod state;

pub use daemon::{Control, Daemon, DaemonConfig, ProfileSource, TickOutcome};
pub use error::{ReconcileError, Result, StartupError};
pub use plan::{DockEdit, plan};
pub use reconciler::{ApplyReport, Reconciler};
pub use state::{ReconcilerState, StateError, StateStore};
