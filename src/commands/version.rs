//! Command: print version information.
use std::io::Write as _;

use anyhow::{Context as _, Result};

/// The version string: `VKDISPATCH_VERSION` at build time, else the crate
/// version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("VKDISPATCH_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the vkdispatch version to stdout.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn run() -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "vkdispatch {}", version()).context("failed to write to stdout")
}
