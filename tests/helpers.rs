//! Shared test utilities: a scripted command runner and project fixtures.

use anyhow::Result;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

use rattomail_dist::config::{HarnessConfig, PackagingConfig};
use rattomail_dist::process::{CommandResult, CommandRunner, Invocation};

type Handler = Box<dyn Fn(&Invocation) -> Result<CommandResult> + Send + Sync>;

struct Rule {
    program: String,
    args_prefix: Vec<String>,
    handler: Handler,
}

/// Scripted command runner. Rules are consulted in registration order; the
/// first whose program and argument prefix match wins. Anything unscripted
/// succeeds with empty output. Every invocation is recorded.
pub struct FakeRunner {
    rules: Vec<Rule>,
    invocations: Mutex<Vec<Invocation>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Script an arbitrary handler for matching invocations.
    pub fn on<F>(mut self, program: &str, args_prefix: &[&str], handler: F) -> Self
    where
        F: Fn(&Invocation) -> Result<CommandResult> + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            program: program.to_string(),
            args_prefix: args_prefix.iter().map(|s| s.to_string()).collect(),
            handler: Box::new(handler),
        });
        self
    }

    /// Script a fixed successful response.
    pub fn ok(self, program: &str, args_prefix: &[&str], stdout: &str) -> Self {
        let stdout = stdout.to_string();
        self.on(program, args_prefix, move |_| Ok(CommandResult::ok(&stdout)))
    }

    /// Script a fixed failure.
    pub fn fail(self, program: &str, args_prefix: &[&str], code: i32, stderr: &str) -> Self {
        let stderr = stderr.to_string();
        self.on(program, args_prefix, move |_| {
            Ok(CommandResult::failed(code, &stderr))
        })
    }

    /// Everything that was run, in order.
    pub fn recorded(&self) -> Vec<Invocation> {
        self.invocations.lock().expect("runner lock poisoned").clone()
    }

    /// Program names in invocation order.
    pub fn program_sequence(&self) -> Vec<String> {
        self.recorded().into_iter().map(|i| i.program).collect()
    }

    /// All recorded invocations of one program.
    pub fn invocations_of(&self, program: &str) -> Vec<Invocation> {
        self.recorded()
            .into_iter()
            .filter(|i| i.program == program)
            .collect()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandResult> {
        self.invocations
            .lock()
            .expect("runner lock poisoned")
            .push(invocation.clone());

        for rule in &self.rules {
            if rule.program == invocation.program
                && invocation.args.starts_with(&rule.args_prefix)
            {
                return (rule.handler)(invocation);
            }
        }

        Ok(CommandResult::ok(""))
    }
}

/// Project layout fixture mirroring the real tree: manifest, control
/// template, doc sources, and docker fixtures under one temp dir.
pub struct TestProject {
    /// Kept alive for the lifetime of the fixture.
    pub _temp_dir: TempDir,
    pub base_dir: PathBuf,
}

impl TestProject {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base_dir = temp_dir.path().to_path_buf();

        fs::write(
            base_dir.join("Cargo.toml"),
            "[package]\nname = \"rattomail\"\nversion = \"0.1.0\"\nedition = \"2021\"\n\n\
             [dependencies]\nchrono = { version = \"0.4\" }\n",
        )
        .expect("Failed to write manifest");

        fs::create_dir_all(base_dir.join("packaging")).expect("Failed to create packaging dir");
        fs::write(
            base_dir.join("packaging/control.in"),
            "Package: rattomail\nVersion: @VERSION@\nArchitecture: @ARCHITECTURE@\n\
             Installed-Size: @INSTALLED_SIZE@\nDescription: test template\n",
        )
        .expect("Failed to write control template");

        fs::create_dir_all(base_dir.join("doc")).expect("Failed to create doc dir");
        fs::write(base_dir.join("doc/rattomail.8.md"), "# NAME\n\nrattomail\n")
            .expect("Failed to write man source");
        fs::write(
            base_dir.join("doc/attomail.conf.example"),
            "mailDir = /home/user/Maildir/new\nuserName = user\n",
        )
        .expect("Failed to write example config");

        fs::create_dir_all(base_dir.join("docker")).expect("Failed to create docker dir");
        fs::write(
            base_dir.join("docker/attomail.conf"),
            "mailDir = /home/user/Maildir/new\nuserName = user\n",
        )
        .expect("Failed to write config fixture");
        fs::write(base_dir.join("docker/Dockerfile"), "FROM scratch\n")
            .expect("Failed to write Dockerfile");

        Self {
            _temp_dir: temp_dir,
            base_dir,
        }
    }

    pub fn packaging_config(&self) -> PackagingConfig {
        PackagingConfig::new(&self.base_dir)
    }

    pub fn harness_config(&self) -> HarnessConfig {
        HarnessConfig::new(&self.base_dir)
    }

    /// Drop a mock executable into the tree and return its path.
    pub fn write_executable(&self, name: &str) -> PathBuf {
        let path = self.base_dir.join(name);
        create_mock_executable(&path);
        path
    }
}

/// Create a mock executable file (not a real binary; mode 0755).
pub fn create_mock_executable(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir for executable");
    }

    fs::write(path, "#!/bin/sh\necho rattomail 0.1.0\n").expect("Failed to create mock executable");

    let mut perms = fs::metadata(path)
        .expect("Failed to get metadata")
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("Failed to set permissions");
}

/// File or directory mode bits (lower 12).
pub fn mode_of(path: &Path) -> u32 {
    fs::metadata(path)
        .expect("Failed to stat path")
        .permissions()
        .mode()
        & 0o7777
}

/// Assert that a symlink exists and points to the expected target.
pub fn assert_symlink(path: &Path, expected_target: &str) {
    assert!(
        path.is_symlink(),
        "Expected symlink at {}, but it's not a symlink",
        path.display()
    );

    let target = fs::read_link(path).expect("Failed to read symlink");
    assert_eq!(
        target.to_string_lossy(),
        expected_target,
        "Symlink {} points to {:?}, expected {}",
        path.display(),
        target,
        expected_target
    );
}

/// Assert that a file contains expected content.
pub fn assert_file_contains(path: &Path, expected: &str) {
    let content =
        fs::read_to_string(path).unwrap_or_else(|_| panic!("Failed to read file: {}", path.display()));
    assert!(
        content.contains(expected),
        "File {} does not contain expected content.\nExpected to find: {}\nActual content: {}",
        path.display(),
        expected,
        content
    );
}

/// Assert that a file exists.
pub fn assert_file_exists(path: &Path) {
    assert!(path.exists(), "Expected file to exist: {}", path.display());
}

/// Assert that a directory exists.
pub fn assert_dir_exists(path: &Path) {
    assert!(
        path.is_dir(),
        "Expected directory to exist: {}",
        path.display()
    );
}
