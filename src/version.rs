//! Version and architecture resolution.
//!
//! The package version comes from one of two places depending on the tool:
//! the project manifest (no binary needed) or the candidate binary's own
//! `--version` output. The architecture always comes from the machine the
//! pipeline runs on.

use anyhow::{bail, Context, Result};
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::process::{run, Cmd, CommandRunner};

/// Debian architecture labels this pipeline can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebArch {
    Amd64,
    I386,
    Arm64,
}

impl DebArch {
    /// Map a hardware identifier (as printed by `uname -m`) to its label.
    pub fn from_machine(machine: &str) -> Result<Self> {
        match machine {
            "x86_64" => Ok(Self::Amd64),
            "i386" | "i686" => Ok(Self::I386),
            "aarch64" => Ok(Self::Arm64),
            other => bail!("unsupported hardware architecture '{}'", other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::I386 => "i386",
            Self::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for DebArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Architecture of the machine the pipeline runs on.
pub fn host_arch(runner: &dyn CommandRunner) -> Result<DebArch> {
    let result = run(runner, "uname", ["-m"])?;
    DebArch::from_machine(result.stdout_trimmed())
}

/// Extract the package version from a Cargo manifest.
///
/// The first `version = "..."` declaration wins. Dependency tables further
/// down also carry version keys, so later matches are ignored.
pub fn version_from_manifest(manifest: &Path) -> Result<String> {
    let content = fs::read_to_string(manifest)
        .with_context(|| format!("Failed to read manifest {}", manifest.display()))?;

    let pattern = Regex::new(r#"(?m)^\s*version\s*=\s*"([^"]+)""#)?;
    match pattern.captures(&content) {
        Some(caps) => Ok(caps[1].to_string()),
        None => bail!("no version declaration found in {}", manifest.display()),
    }
}

/// Ask the candidate executable for its version.
///
/// Expects at least two whitespace-separated tokens on the first line of
/// output, name then version, the convention the delivery agent follows.
pub fn version_from_executable(runner: &dyn CommandRunner, executable: &Path) -> Result<String> {
    let result = Cmd::new(runner, executable.to_string_lossy())
        .arg("--version")
        .allow_fail()
        .run()?;

    if !result.success() {
        bail!(
            "version probe `{} --version` exited with code {}",
            executable.display(),
            result.code
        );
    }

    let first_line = result.stdout.lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        bail!(
            "version probe `{} --version` produced no output",
            executable.display()
        );
    }

    let mut tokens = first_line.split_whitespace();
    tokens.next();
    match tokens.next() {
        Some(version) => Ok(version.to_string()),
        None => bail!("version probe output '{}' carries no version token", first_line),
    }
}

// =============================================================================
// Tests
// =============================================================================
