//! Preflight checks and the check report.
//!
//! Each tool verifies the host commands it is about to shell out to before
//! doing any work, so a missing dependency surfaces as one readable report
//! instead of a mid-pipeline subprocess error. The report type is shared
//! with the container harness, which uses the same pass/fail discipline for
//! its acceptance checks.

use anyhow::{bail, Result};

/// Result of a single check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed.
    Pass,
    /// Check failed - the run cannot succeed.
    Fail,
}

impl CheckResult {
    pub fn pass(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Pass,
            details: None,
        }
    }

    pub fn pass_with(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Pass,
            details: Some(details.to_string()),
        }
    }

    pub fn fail(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Fail,
            details: Some(details.to_string()),
        }
    }
}

/// Results of a group of checks.
#[derive(Debug)]
pub struct CheckReport {
    pub checks: Vec<CheckResult>,
}

impl CheckReport {
    /// Returns true if no check failed.
    pub fn all_passed(&self) -> bool {
        !self.checks.iter().any(|c| c.status == CheckStatus::Fail)
    }

    /// Count of failed checks.
    pub fn fail_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.status == CheckStatus::Fail)
            .count()
    }

    /// Print the report to stdout.
    pub fn print(&self, title: &str) {
        println!("=== {} ===\n", title);

        for check in &self.checks {
            let (icon, status_str) = match check.status {
                CheckStatus::Pass => ("✓", "PASS"),
                CheckStatus::Fail => ("✗", "FAIL"),
            };

            print!("  {} [{}] {}", icon, status_str, check.name);
            if let Some(details) = &check.details {
                println!(": {}", details);
            } else {
                println!();
            }
        }

        println!();
        let total = self.checks.len();
        let passed = total - self.fail_count();
        println!("Summary: {}/{} passed", passed, total);
        if self.fail_count() > 0 {
            println!("         {} FAILED", self.fail_count());
        }
    }
}

// =============================================================================
// Host tool checks
// =============================================================================

/// (command, package hint, purpose) triples per tool surface.
pub const BUILD_TOOLS: &[(&str, &str, &str)] = &[
    ("file", "file", "Required to verify static linking"),
    ("uname", "coreutils", "Required to resolve the target architecture"),
    ("strip", "binutils", "Required to strip the staged binary"),
    ("pandoc", "pandoc", "Required to render the man page"),
    ("du", "coreutils", "Required to measure installed size"),
    ("fakeroot", "fakeroot", "Required to build the archive with root ownership"),
    ("dpkg-deb", "dpkg", "Required to assemble the package"),
];

pub const DRY_RUN_TOOLS: &[(&str, &str, &str)] = &[
    ("file", "file", "Required to verify static linking"),
    ("uname", "coreutils", "Required to resolve the target architecture"),
];

pub const NAME_TOOLS: &[(&str, &str, &str)] = &[(
    "uname",
    "coreutils",
    "Required to resolve the target architecture",
)];

pub const HARNESS_TOOLS: &[(&str, &str, &str)] = &[(
    "docker",
    "docker.io",
    "Required to build and run the test container",
)];

/// Check that each listed tool is on PATH.
pub fn check_host_tools(tools: &[(&str, &str, &str)]) -> CheckReport {
    let checks = tools
        .iter()
        .map(|(tool, package, purpose)| check_tool_exists(tool, package, purpose))
        .collect();
    CheckReport { checks }
}

/// Fail fast when any required tool is missing, naming all of them at once.
pub fn require_host_tools(tools: &[(&str, &str, &str)]) -> Result<()> {
    let report = check_host_tools(tools);
    if report.all_passed() {
        return Ok(());
    }

    report.print("Host Tool Check");
    bail!("{} required tool(s) missing", report.fail_count());
}

fn check_tool_exists(tool: &str, package: &str, purpose: &str) -> CheckResult {
    match which::which(tool) {
        Ok(path) => CheckResult::pass_with(tool, &path.display().to_string()),
        Err(_) => CheckResult::fail(
            tool,
            &format!("Not found. Install '{}' package. {}", package, purpose),
        ),
    }
}
