//! Scripted focus source (enabled with the `test-utils` feature).

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::{FocusMode, FocusReadError, FocusStateSource};

/// Focus source that returns whatever the test last scripted.
#[derive(Default)]
pub struct StaticFocusSource {
    /// Next result to return; `None` reads as no Focus.
    next: Mutex<Option<Result<FocusMode, FocusReadError>>>,
    /// Number of queries served.
    reads: AtomicUsize,
}

impl StaticFocusSource {
    /// Source that reports `mode` until changed.
    pub fn new(mode: FocusMode) -> Self {
        let s = Self::default();
        s.set(mode);
        s
    }

    /// Report `mode` from now on.
    pub fn set(&self, mode: FocusMode) {
        *self.next.lock() = Some(Ok(mode));
    }

    /// Fail every read from now on.
    pub fn fail(&self) {
        *self.next.lock() = Some(Err(FocusReadError::Malformed("scripted failure".into())));
    }

    /// Number of queries served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl FocusStateSource for StaticFocusSource {
    fn current_mode(&self) -> Result<FocusMode, FocusReadError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.next
            .lock()
            .clone()
            .unwrap_or_else(|| Ok(FocusMode::none()))
    }
}
