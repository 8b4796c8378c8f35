//! Stop signal implementations

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::StopSignal;

/// Requests a stop once a file exists at `path`
#[derive(Debug, Clone)]
pub struct SentinelFile {
    path: PathBuf,
}

impl SentinelFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StopSignal for SentinelFile {
    fn stop_requested(&self) -> bool {
        self.path.exists()
    }
}

/// Shared flag, typically set from a Ctrl-C handler or a deadline task
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    requested: Arc<AtomicBool>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

impl StopSignal for StopFlag {
    fn stop_requested(&self) -> bool {
        self.is_requested()
    }
}

/// Stops when any inner signal does
#[derive(Default)]
pub struct AnyStop {
    signals: Vec<Box<dyn StopSignal>>,
}

impl AnyStop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, signal: impl StopSignal + 'static) -> Self {
        self.push(signal);
        self
    }

    pub fn push(&mut self, signal: impl StopSignal + 'static) {
        self.signals.push(Box::new(signal));
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

impl fmt::Debug for AnyStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyStop")
            .field("signals", &self.signals.len())
            .finish()
    }
}

impl StopSignal for AnyStop {
    fn stop_requested(&self) -> bool {
        self.signals.iter().any(|s| s.stop_requested())
    }
}

/// Never requests a stop
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverStop;

impl StopSignal for NeverStop {
    fn stop_requested(&self) -> bool {
        false
    }
}
