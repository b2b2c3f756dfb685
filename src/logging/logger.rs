//! Console logger used by the command implementations.
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::subscriber::STAGE_TARGET;

/// Thin facade over [`tracing`] with a quiet switch and a warning tally.
///
/// Library code logs through `tracing` directly at debug level; commands use
/// a `Logger` for everything the user is meant to read.
#[derive(Debug, Default)]
pub struct Logger {
    quiet: AtomicBool,
    warnings: AtomicUsize,
}

impl Logger {
    /// Create a logger that reports warnings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress (or restore) warnings. Errors are never suppressed.
    pub fn set_quiet(&self, quiet: bool) {
        self.quiet.store(quiet, Ordering::Relaxed);
    }

    /// Whether warnings are currently suppressed.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.quiet.load(Ordering::Relaxed)
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message, unless quiet.
    ///
    /// Suppressed warnings are still counted.
    pub fn warn(&self, msg: &str) {
        self.warnings.fetch_add(1, Ordering::Relaxed);
        if !self.is_quiet() {
            tracing::warn!("{msg}");
        }
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (shown with `--verbose`).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Number of warnings raised so far, including suppressed ones.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }
}
