//! Centralized command execution with consistent error handling.
//!
//! Every external tool this crate touches (file, strip, pandoc, du, fakeroot,
//! dpkg-deb, docker, the candidate binary itself) runs as a blocking
//! subprocess behind the [`CommandRunner`] trait, so tests can substitute
//! deterministic fakes without spawning real processes.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// A fully described subprocess invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl Invocation {
    /// Create an invocation with no arguments.
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Render the invocation the way an operator would retype it.
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code, or -1 if terminated by signal.
    pub code: i32,
    /// Captured stdout as a string.
    pub stdout: String,
    /// Captured stderr as a string.
    pub stderr: String,
}

impl CommandResult {
    /// A successful result carrying the given stdout.
    pub fn ok(stdout: impl AsRef<str>) -> Self {
        Self {
            code: 0,
            stdout: stdout.as_ref().to_string(),
            stderr: String::new(),
        }
    }

    /// A failed result with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl AsRef<str>) -> Self {
        Self {
            code,
            stdout: String::new(),
            stderr: stderr.as_ref().to_string(),
        }
    }

    /// Returns true if the command exited successfully.
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Get stdout, trimmed of whitespace.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// Get stderr, trimmed of whitespace.
    pub fn stderr_trimmed(&self) -> &str {
        self.stderr.trim()
    }
}

/// Runs invocations. The production implementation spawns real processes;
/// tests provide scripted implementations.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandResult>;
}

/// Executes invocations as real subprocesses, capturing stdout and stderr.
///
/// The caller blocks until the subprocess terminates. Exit status policy
/// (fail or tolerate) lives in [`Cmd::run`], not here.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandResult> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);

        if let Some(ref dir) = invocation.current_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().with_context(|| {
            format!(
                "Failed to execute '{}'. Is it installed?",
                invocation.program
            )
        })?;

        Ok(CommandResult {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Builder for configuring command execution against a runner.
pub struct Cmd<'a> {
    runner: &'a dyn CommandRunner,
    invocation: Invocation,
    /// If true, don't fail on non-zero exit.
    allow_fail: bool,
    /// Custom error message prefix.
    error_prefix: Option<String>,
}

impl<'a> Cmd<'a> {
    /// Create a new command builder.
    pub fn new(runner: &'a dyn CommandRunner, program: impl AsRef<str>) -> Self {
        Self {
            runner,
            invocation: Invocation::new(program),
            allow_fail: false,
            error_prefix: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.invocation.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.invocation.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Add a path as an argument.
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.invocation
            .args
            .push(path.to_string_lossy().into_owned());
        self
    }

    /// Set the working directory.
    pub fn dir(mut self, dir: &Path) -> Self {
        self.invocation.current_dir = Some(dir.to_path_buf());
        self
    }

    /// Allow non-zero exit codes without failing.
    pub fn allow_fail(mut self) -> Self {
        self.allow_fail = true;
        self
    }

    /// Set a custom error message prefix.
    pub fn error_msg(mut self, msg: impl AsRef<str>) -> Self {
        self.error_prefix = Some(msg.as_ref().to_string());
        self
    }

    /// Run the command and capture output.
    ///
    /// On non-zero exit the error always carries the exact command line,
    /// so the operator can rerun the failing step by hand.
    pub fn run(self) -> Result<CommandResult> {
        let result = self.runner.run(&self.invocation)?;

        if !self.allow_fail && !result.success() {
            let command = self.invocation.command_line();
            let prefix = match self.error_prefix {
                Some(msg) => format!("{}: `{}` failed", msg, command),
                None => format!("`{}` failed", command),
            };

            let stderr = result.stderr_trimmed();
            if stderr.is_empty() {
                bail!("{} (exit code {})", prefix, result.code);
            } else {
                bail!("{} (exit code {}):\n{}", prefix, result.code, stderr);
            }
        }

        Ok(result)
    }
}

// =============================================================================
// Convenience functions
// =============================================================================

/// Run a command with arguments. Fails with stderr on error.
///
/// # Example
/// ```ignore
/// let result = run(&SystemRunner, "uname", ["-m"])?;
/// println!("Arch: {}", result.stdout_trimmed());
/// ```
pub fn run<I, S>(runner: &dyn CommandRunner, program: &str, args: I) -> Result<CommandResult>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cmd = Cmd::new(runner, program);
    for arg in args {
        cmd = cmd.arg(arg);
    }
    cmd.run()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_success() {
        let result = run(&SystemRunner, "echo", ["hello"]).unwrap();
        assert!(result.success());
        assert_eq!(result.stdout_trimmed(), "hello");
    }

    #[test]
    fn test_run_captures_stderr() {
        // `ls` on a non-existent file writes to stderr
        let result = Cmd::new(&SystemRunner, "ls")
            .arg("/nonexistent_path_12345")
            .allow_fail()
            .run()
            .unwrap();

        assert!(!result.success());
        assert!(!result.stderr.is_empty());
    }

    #[test]
    fn test_run_failure_includes_command_line() {
        let err = run(&SystemRunner, "ls", ["/nonexistent_path_12345"]).unwrap_err();
        let msg = err.to_string();

        assert!(msg.contains("`ls /nonexistent_path_12345` failed"));
        assert!(msg.contains("No such file") || msg.contains("cannot access"));
    }

    #[test]
    fn test_custom_error_message_keeps_command() {
        let err = Cmd::new(&SystemRunner, "false")
            .error_msg("Custom build step failed")
            .run()
            .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("Custom build step failed"));
        assert!(msg.contains("`false` failed"));
    }

    #[test]
    fn test_allow_fail() {
        let result = Cmd::new(&SystemRunner, "false").allow_fail().run().unwrap();

        assert!(!result.success());
        assert_eq!(result.code, 1);
    }

    #[test]
    fn test_cmd_builder_chaining() {
        let result = Cmd::new(&SystemRunner, "echo")
            .arg("hello")
            .arg("world")
            .run()
            .unwrap();

        assert_eq!(result.stdout_trimmed(), "hello world");
    }

    #[test]
    fn test_cmd_args_iterator() {
        let args = vec!["one", "two", "three"];
        let result = Cmd::new(&SystemRunner, "echo").args(args).run().unwrap();

        assert_eq!(result.stdout_trimmed(), "one two three");
    }

    #[test]
    fn test_run_in_directory() {
        let result = Cmd::new(&SystemRunner, "pwd")
            .dir(Path::new("/tmp"))
            .run()
            .unwrap();
        assert!(result.stdout_trimmed().contains("tmp"));
    }

    #[test]
    fn test_command_line_rendering() {
        let mut invocation = Invocation::new("dpkg-deb");
        invocation.args = vec!["--build".to_string(), "/tmp/stage".to_string()];
        assert_eq!(invocation.command_line(), "dpkg-deb --build /tmp/stage");
    }

    #[test]
    fn test_result_constructors() {
        let ok = CommandResult::ok("output\n");
        assert!(ok.success());
        assert_eq!(ok.stdout_trimmed(), "output");

        let failed = CommandResult::failed(2, "boom");
        assert!(!failed.success());
        assert_eq!(failed.code, 2);
        assert_eq!(failed.stderr_trimmed(), "boom");
    }
}
