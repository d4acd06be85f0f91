//! Candidate executable validation.
//!
//! Packaging assumes a statically linked, executable, regular file.
//! Validation runs before any staging work so a bad input fails in
//! milliseconds instead of mid-build.

use anyhow::{bail, Context, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::process::{Cmd, CommandRunner};

/// Check that the candidate binary is something dpkg could meaningfully
/// install.
///
/// Checks run in order and stop at the first failure: exists, regular file,
/// readable, executable, statically linked. Each failure names the check
/// that rejected the file.
pub fn validate_executable(runner: &dyn CommandRunner, executable: &Path) -> Result<()> {
    let display = executable.display();

    let metadata = fs::symlink_metadata(executable)
        .with_context(|| format!("executable '{}' does not exist", display))?;

    if !metadata.is_file() {
        bail!("'{}' is not a regular file", display);
    }

    fs::File::open(executable)
        .with_context(|| format!("executable '{}' is not readable", display))?;

    let mode = metadata.permissions().mode();
    if mode & 0o111 == 0 {
        bail!("'{}' is not executable (mode {:o})", display, mode & 0o7777);
    }

    let result = Cmd::new(runner, "file")
        .arg_path(executable)
        .error_msg("file type probe failed")
        .run()?;

    if !result.stdout.contains("statically linked") {
        bail!(
            "'{}' is not statically linked (file reports: {})",
            display,
            result.stdout_trimmed()
        );
    }

    Ok(())
}
