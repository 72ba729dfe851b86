use std::{io, path::Path, process::ExitCode, sync::Arc};

use focusmodes_engine::{Control, Daemon, DaemonConfig, StartupError};
use mac_desktop::{DockUtil, Osascript};
use mac_focus_mode::DndDbSource;
use tokio::{
    runtime::Builder,
    signal::unix::{SignalKind, signal},
    sync::mpsc::{UnboundedSender, unbounded_channel},
};
use tracing::{debug, info, warn};

/// Run the daemon until SIGTERM or SIGINT.
///
/// SIGHUP reloads the configuration. Only runtime or signal setup failures
/// are errors; everything after startup is logged and survived.
pub fn run(home: &Path, config: DaemonConfig) -> Result<ExitCode, StartupError> {
    let missing = mac_desktop::missing_tools();
    if !missing.is_empty() {
        warn!(
            missing = ?missing,
            "helpers not found on PATH; dock and wallpaper changes will fail"
        );
    }

    let runtime = Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(async {
        let (tx, rx) = unbounded_channel();
        forward_signals(tx)?;
        let daemon = Daemon::new(
            config,
            Arc::new(DndDbSource::for_home(home)),
            Arc::new(DockUtil::new()),
            Arc::new(Osascript),
        );
        daemon.run(rx).await;
        info!("daemon stopped");
        Ok::<_, StartupError>(ExitCode::SUCCESS)
    })
}

/// Translate process signals into [`Control`] messages.
fn forward_signals(tx: UnboundedSender<Control>) -> io::Result<()> {
    let mut hup = signal(SignalKind::hangup())?;
    let mut term = signal(SignalKind::terminate())?;
    let mut int = signal(SignalKind::interrupt())?;
    tokio::spawn(async move {
        loop {
            let ctl = tokio::select! {
                Some(()) = hup.recv() => {
                    debug!("sighup");
                    Control::Reload
                }
                Some(()) = term.recv() => {
                    info!("SIGTERM received");
                    Control::Shutdown
                }
                Some(()) = int.recv() => {
                    info!("SIGINT received");
                    Control::Shutdown
                }
                else => break,
            };
            if tx.send(ctl).is_err() || ctl == Control::Shutdown {
                break;
            }
        }
    });
    Ok(())
}
