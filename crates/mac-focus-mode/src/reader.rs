//! Infallible focus reads for the poll loop.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::{debug, info, warn};

use crate::{FocusMode, FocusStateSource};

/// Reads slower than this are logged; the poll loop expects sub-second reads.
const SLOW_READ_WARN: Duration = Duration::from_millis(500);

/// Wraps a [`FocusStateSource`] so a bad read never escapes the poll loop.
///
/// Errors are mapped to [`FocusMode::unknown`]. The first failure of a streak
/// is logged at warn; repeats are logged at debug so a missing permission does
/// not flood the log every few seconds. Recovery is logged once at info.
pub struct FocusReader {
    /// Underlying source.
    source: Arc<dyn FocusStateSource>,
    /// True while the previous read failed.
    failing: bool,
}

impl FocusReader {
    /// Wrap `source`.
    pub fn new(source: Arc<dyn FocusStateSource>) -> Self {
        Self {
            source,
            failing: false,
        }
    }

    /// The active mode, or [`FocusMode::unknown`] if it cannot be determined.
    pub fn current_mode(&mut self) -> FocusMode {
        let started = Instant::now();
        let result = self.source.current_mode();
        let elapsed = started.elapsed();
        if elapsed > SLOW_READ_WARN {
            warn!(elapsed_ms = elapsed.as_millis() as u64, "slow focus state read");
        }
        match result {
            Ok(mode) => {
                if self.failing {
                    info!(mode = %mode, "focus state readable again");
                    self.failing = false;
                }
                mode
            }
            Err(e) => {
                if self.failing {
                    debug!(error = %e, "focus_read_failed_again");
                } else {
                    warn!(error = %e, "cannot read focus state; treating mode as unknown");
                    self.failing = true;
                }
                FocusMode::unknown()
            }
        }
    }
}
