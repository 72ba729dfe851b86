//! Binary entrypoint for the focusmodes daemon.
use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    time::Duration,
};

use clap::{Parser, Subcommand};
use focusmodes_engine::{DaemonConfig, StartupError};
use logging::LogArgs;
use tracing::error;

/// One-shot subcommands.
mod commands;
/// Daemon startup and signal wiring.
mod daemon;

#[derive(Parser, Debug)]
#[command(
    name = "focusmodes",
    about = "Reconfigure the macOS dock and wallpaper when the Focus mode changes",
    version
)]
/// Command-line interface for the `focusmodes` binary.
struct Cli {
    /// Optional subcommand; without one the daemon runs in the foreground.
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to the profile document (defaults to ~/.config/macfocusmodes/config.json)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Path to the state file (defaults to ~/.config/macfocusmodes/state.json)
    #[arg(long, value_name = "PATH")]
    state: Option<PathBuf>,

    /// Poll interval in seconds; overrides `pollIntervalSecs` in the config
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    interval: Option<u64>,

    /// Logging controls
    #[command(flatten)]
    log: LogArgs,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
/// Top-level CLI subcommands.
enum Command {
    /// Load and validate the configuration then exit.
    Check {
        /// Path to configuration file to check (defaults to --config)
        path: Option<PathBuf>,

        /// Dump the parsed configuration as JSON to stdout
        #[arg(long)]
        dump: bool,
    },
    /// Print the focus mode, the applied state, and whether a profile matches.
    Status,
    /// Run a single reconcile cycle and exit.
    Apply,
    /// Print the active focus mode.
    Mode,
}

/// Resolved per-user locations.
#[derive(Debug)]
struct Paths {
    /// Home directory.
    home: PathBuf,
    /// Profile document.
    config: PathBuf,
    /// Reconciler state file.
    state: PathBuf,
}

impl Paths {
    /// Resolve paths from the CLI, defaulting to the per-user config directory.
    fn resolve(cli: &Cli) -> Result<Self, StartupError> {
        let home = dirs::home_dir().ok_or(StartupError::HomeDirectoryUnresolvable)?;
        Ok(Self::with_home(cli, home))
    }

    /// Resolve against an explicit home directory.
    fn with_home(cli: &Cli, home: PathBuf) -> Self {
        Self {
            config: cli
                .config
                .clone()
                .unwrap_or_else(|| config::default_config_path(&home)),
            state: cli
                .state
                .clone()
                .unwrap_or_else(|| config::default_state_path(&home)),
            home,
        }
    }

    /// Daemon settings for these paths.
    fn daemon_config(&self, interval: Option<u64>) -> DaemonConfig {
        DaemonConfig {
            config_path: self.config.clone(),
            state_path: self.state.clone(),
            poll_interval: interval.map(Duration::from_secs),
        }
    }

    /// Home directory.
    fn home(&self) -> &Path {
        &self.home
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&cli.log.spec());
    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "startup failed");
            ExitCode::FAILURE
        }
    }
}

/// Dispatch to the chosen subcommand or run the daemon.
fn run(cli: &Cli) -> Result<ExitCode, StartupError> {
    let paths = Paths::resolve(cli)?;
    Ok(match &cli.command {
        Some(Command::Check { path, dump }) => {
            commands::check(path.as_deref().unwrap_or(&paths.config), *dump)
        }
        Some(Command::Status) => commands::status(&paths),
        Some(Command::Apply) => commands::apply(&paths, paths.daemon_config(cli.interval)),
        Some(Command::Mode) => commands::mode(paths.home()),
        None => daemon::run(paths.home(), paths.daemon_config(cli.interval))?,
    })
}
