//! Container acceptance harness.
//!
//! Runs the built package through a disposable container: build the test
//! image, launch a long-lived container with the artifact and the
//! delivery-agent configuration bind-mounted, install the package, submit a
//! message through the sendmail shim, copy the mailbox out, and check what
//! was delivered. The container is stopped on every exit path once it has
//! been launched.

use anyhow::{bail, Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::config::HarnessConfig;
use crate::mail::MailMessage;
use crate::preflight::{CheckReport, CheckResult};
use crate::process::{Cmd, CommandRunner};

/// Acceptance check names, declared before anything runs so a reader of the
/// output knows the full set even when a stage dies early.
pub const CHECK_NAMES: [&str; 6] = [
    "exactly one message collected",
    "agent Received header",
    "recipient address",
    "sender username",
    "subject line",
    "message body",
];

/// Stops the container when dropped. Launch registers one of these
/// immediately, so teardown runs whether the later stages succeed or not.
pub struct ContainerGuard<'a> {
    runner: &'a dyn CommandRunner,
    /// Identifier printed by the container runtime at launch.
    pub id: String,
}

impl Drop for ContainerGuard<'_> {
    fn drop(&mut self) {
        println!("  Stopping container {}", short_id(&self.id));
        let result = Cmd::new(self.runner, "docker")
            .arg("stop")
            .arg(&self.id)
            .allow_fail()
            .run();

        // A teardown failure must never mask the result of the run itself.
        match result {
            Ok(r) if r.success() => {}
            Ok(r) => eprintln!(
                "Warning: docker stop failed (exit code {}): {}",
                r.code,
                r.stderr_trimmed()
            ),
            Err(e) => eprintln!("Warning: docker stop failed: {:#}", e),
        }
    }
}

/// Mailbox contents copied out of the container, removed on drop.
struct Collected {
    scratch: TempDir,
}

impl Collected {
    /// Every regular file under the copied directory, sorted.
    fn files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(self.scratch.path()) {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }
}

/// The acceptance pipeline, parameterized over the command runner.
pub struct TestHarness<'a> {
    runner: &'a dyn CommandRunner,
    cfg: HarnessConfig,
}

impl<'a> TestHarness<'a> {
    pub fn new(runner: &'a dyn CommandRunner, cfg: HarnessConfig) -> Self {
        Self { runner, cfg }
    }

    /// Run the full pipeline against a built package artifact.
    ///
    /// Stage failures are fatal; check mismatches are not. The returned
    /// report carries one entry per name in [`CHECK_NAMES`].
    pub fn run(&self, deb: &Path) -> Result<CheckReport> {
        self.build_image()?;
        let container = self.launch(deb)?;
        self.exercise(&container)?;
        let collected = self.collect(&container)?;
        let report = self.assert_delivery(&collected);
        drop(container);
        report
    }

    fn build_image(&self) -> Result<()> {
        println!("=== Building test image ===");
        println!("  Context: {}", self.cfg.docker_context.display());
        Cmd::new(self.runner, "docker")
            .args(["build", "-t"])
            .arg(&self.cfg.image_tag)
            .arg_path(&self.cfg.docker_context)
            .error_msg("Failed to build test image")
            .run()?;
        Ok(())
    }

    fn launch(&self, deb: &Path) -> Result<ContainerGuard<'a>> {
        println!("=== Launching container ===");
        require_readable("package artifact", deb)?;
        require_readable("delivery-agent configuration", &self.cfg.config_fixture)?;

        // Bind mounts need absolute host paths.
        let deb_abs = fs::canonicalize(deb)
            .with_context(|| format!("Failed to resolve {}", deb.display()))?;
        let config_abs = fs::canonicalize(&self.cfg.config_fixture).with_context(|| {
            format!("Failed to resolve {}", self.cfg.config_fixture.display())
        })?;

        let result = Cmd::new(self.runner, "docker")
            .args(["run", "-d", "--rm"])
            .arg("-v")
            .arg(format!(
                "{}:{}",
                self.cfg.base_dir.display(),
                self.cfg.work_mount_point
            ))
            .arg("-v")
            .arg(format!(
                "{}:{}",
                config_abs.display(),
                self.cfg.config_mount_point
            ))
            .arg("-v")
            .arg(format!("{}:{}", deb_abs.display(), self.cfg.deb_mount_point))
            .arg(&self.cfg.image_tag)
            .args(["sleep", "infinity"])
            .error_msg("Failed to launch test container")
            .run()?;

        let id = result.stdout_trimmed().to_string();
        if id.is_empty() {
            bail!("container runtime did not report a container id");
        }
        println!("  Container: {}", short_id(&id));

        Ok(ContainerGuard {
            runner: self.runner,
            id,
        })
    }

    fn exercise(&self, container: &ContainerGuard) -> Result<()> {
        println!("=== Exercising package in container ===");
        println!("  Installing {}", self.cfg.deb_mount_point);
        Cmd::new(self.runner, "docker")
            .arg("exec")
            .arg(&container.id)
            .args(["dpkg", "-i"])
            .arg(&self.cfg.deb_mount_point)
            .error_msg("Package installation inside the container failed")
            .run()?;

        println!("  Submitting test message as '{}'", self.cfg.test_user);
        let submission = format!(
            "printf '%s\\n' '{}' | mail -s '{}' '{}'",
            self.cfg.body, self.cfg.subject, self.cfg.recipient
        );
        Cmd::new(self.runner, "docker")
            .args(["exec", "-u"])
            .arg(&self.cfg.test_user)
            .arg(&container.id)
            .args(["sh", "-c"])
            .arg(&submission)
            .error_msg("Mail submission inside the container failed")
            .run()?;
        Ok(())
    }

    fn collect(&self, container: &ContainerGuard) -> Result<Collected> {
        println!("=== Collecting mailbox ===");
        let scratch = TempDir::new().context("Failed to create collection scratch directory")?;
        let source = format!("{}:{}", container.id, self.cfg.mailbox_dir);
        Cmd::new(self.runner, "docker")
            .arg("cp")
            .arg(&source)
            .arg_path(scratch.path())
            .error_msg("Failed to copy mailbox out of the container")
            .run()?;
        println!("  Mailbox copied to {}", scratch.path().display());
        Ok(Collected { scratch })
    }

    /// Evaluate every check, never stopping at the first mismatch.
    fn assert_delivery(&self, collected: &Collected) -> Result<CheckReport> {
        println!("=== Checking delivery ===");
        let files = collected.files()?;
        let mut checks = Vec::new();

        if files.len() == 1 {
            checks.push(CheckResult::pass(CHECK_NAMES[0]));
        } else {
            checks.push(CheckResult::fail(
                CHECK_NAMES[0],
                &format!("expected 1 file in the mailbox, found {}", files.len()),
            ));
        }

        let message = match files.as_slice() {
            [path] => match fs::read_to_string(path) {
                Ok(text) => match MailMessage::parse(&text) {
                    Ok(message) => Ok(message),
                    Err(e) => Err(format!("collected message does not parse: {:#}", e)),
                },
                Err(e) => Err(format!("collected message is not readable: {}", e)),
            },
            _ => Err("no single message to inspect".to_string()),
        };

        match message {
            Ok(message) => {
                checks.push(self.check_agent_header(&message)?);
                checks.push(check_header(
                    &message,
                    CHECK_NAMES[2],
                    "To",
                    &self.cfg.recipient,
                ));
                checks.push(check_header(
                    &message,
                    CHECK_NAMES[3],
                    "From",
                    &self.cfg.test_user,
                ));
                checks.push(check_header(
                    &message,
                    CHECK_NAMES[4],
                    "Subject",
                    &self.cfg.subject,
                ));

                let expected_body = format!("{}\n", self.cfg.body);
                if message.body == expected_body {
                    checks.push(CheckResult::pass(CHECK_NAMES[5]));
                } else {
                    checks.push(CheckResult::fail(
                        CHECK_NAMES[5],
                        &format!("expected {:?}, got {:?}", expected_body, message.body),
                    ));
                }
            }
            Err(reason) => {
                for name in &CHECK_NAMES[1..] {
                    checks.push(CheckResult::fail(name, &reason));
                }
            }
        }

        Ok(CheckReport { checks })
    }

    /// Exactly one Received header stamped by the delivery agent.
    fn check_agent_header(&self, message: &MailMessage) -> Result<CheckResult> {
        let pattern = Regex::new(&self.cfg.header_pattern)?;
        let received = message.header_values("Received");
        let matching: Vec<&str> = received
            .iter()
            .copied()
            .filter(|v| pattern.is_match(v))
            .collect();

        Ok(match matching.as_slice() {
            [only] => CheckResult::pass_with(CHECK_NAMES[1], only),
            [] => CheckResult::fail(
                CHECK_NAMES[1],
                &format!(
                    "no Received header matches '{}' ({} Received header(s) present)",
                    self.cfg.header_pattern,
                    received.len()
                ),
            ),
            many => CheckResult::fail(
                CHECK_NAMES[1],
                &format!("{} Received headers match, expected exactly 1", many.len()),
            ),
        })
    }
}

fn check_header(message: &MailMessage, check: &str, header: &str, expected: &str) -> CheckResult {
    match message.header(header) {
        Some(actual) if actual == expected => CheckResult::pass_with(check, actual),
        Some(actual) => CheckResult::fail(
            check,
            &format!("expected '{}', got '{}'", expected, actual),
        ),
        None => CheckResult::fail(check, &format!("'{}' header missing", header)),
    }
}

fn require_readable(what: &str, path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("{} {} does not exist", what, path.display());
    }
    fs::File::open(path).with_context(|| format!("{} {} is not readable", what, path.display()))?;
    Ok(())
}

fn short_id(id: &str) -> &str {
    &id[..id.len().min(12)]
}
