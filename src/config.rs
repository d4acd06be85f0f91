//! Packaging and harness configuration.
//!
//! Every path, mode, token, and name the pipeline depends on lives here
//! instead of being scattered as literals, so tests can rebase the whole
//! pipeline onto fixture directories by constructing these structs directly.

use std::path::{Path, PathBuf};

/// Environment variable that overrides the Debian revision.
pub const REVISION_ENV: &str = "DEB_REVISION";

/// Revision used when the environment does not say otherwise.
pub const DEFAULT_REVISION: &str = "1";

/// Everything the package build stages need to know.
#[derive(Debug, Clone)]
pub struct PackagingConfig {
    /// Project root; fixed inputs (packaging/, doc/) are resolved against it.
    pub base_dir: PathBuf,
    /// Debian package name, also the installed binary name.
    pub package_name: String,
    /// Manifest scanned for the version declaration.
    pub manifest_path: PathBuf,
    /// Where the staged binary ends up after installation.
    pub installed_binary_path: PathBuf,
    /// Name of the compatibility symlink placed next to the binary.
    pub sendmail_link_name: String,
    /// Staging subdirectory for the binary (relative to the staging root).
    pub binary_dir: PathBuf,
    /// Staging subdirectory for the section 8 man page.
    pub man_dir: PathBuf,
    /// Staging subdirectory for shipped example files.
    pub doc_examples_dir: PathBuf,
    /// Staging subdirectory for package metadata.
    pub metadata_dir: PathBuf,
    /// Markdown source rendered into the man page.
    pub man_source: PathBuf,
    /// Installed man page file name.
    pub man_page_name: String,
    /// Example configuration shipped under the doc directory.
    pub example_config: PathBuf,
    /// Control template with substitution tokens.
    pub control_template: PathBuf,
    /// Mode applied to every staged directory.
    pub dir_mode: u32,
    /// Mode applied to the staged binary (setuid root).
    pub binary_mode: u32,
    /// Directory the finished .deb is written to.
    pub output_dir: PathBuf,
}

impl PackagingConfig {
    /// Standard layout rooted at the project directory.
    pub fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            package_name: "rattomail".to_string(),
            manifest_path: base_dir.join("Cargo.toml"),
            installed_binary_path: PathBuf::from("/usr/sbin/rattomail"),
            sendmail_link_name: "sendmail".to_string(),
            binary_dir: PathBuf::from("usr/sbin"),
            man_dir: PathBuf::from("usr/share/man/man8"),
            doc_examples_dir: PathBuf::from("usr/share/doc/rattomail/examples"),
            metadata_dir: PathBuf::from("DEBIAN"),
            man_source: base_dir.join("doc/rattomail.8.md"),
            man_page_name: "rattomail.8".to_string(),
            example_config: base_dir.join("doc/attomail.conf.example"),
            control_template: base_dir.join("packaging/control.in"),
            dir_mode: 0o755,
            binary_mode: 0o4755,
            output_dir: base_dir.to_path_buf(),
        }
    }

    /// Debian revision, from the environment or the default.
    ///
    /// An empty value counts as unset; a revision of "" would produce a
    /// malformed artifact name.
    pub fn revision(&self) -> String {
        match std::env::var(REVISION_ENV) {
            Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
            _ => DEFAULT_REVISION.to_string(),
        }
    }
}

/// Everything the container acceptance run needs to know.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Project root, bind-mounted read-only style into the container.
    pub base_dir: PathBuf,
    /// Tag the throwaway test image is built under.
    pub image_tag: String,
    /// Docker build context directory.
    pub docker_context: PathBuf,
    /// Delivery-agent configuration fixture mounted into the container.
    pub config_fixture: PathBuf,
    /// Where the fixture lands inside the container.
    pub config_mount_point: String,
    /// Where the package artifact lands inside the container.
    pub deb_mount_point: String,
    /// Where the project tree lands inside the container.
    pub work_mount_point: String,
    /// Unprivileged account that submits the test message.
    pub test_user: String,
    /// Maildir subdirectory new deliveries appear in.
    pub mailbox_dir: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    /// Pattern the delivery agent's Received header must match.
    pub header_pattern: String,
}

impl HarnessConfig {
    /// Standard fixtures rooted at the project directory.
    pub fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            image_tag: "rattomail-deb-test".to_string(),
            docker_context: base_dir.join("docker"),
            config_fixture: base_dir.join("docker/attomail.conf"),
            config_mount_point: "/etc/attomail.conf".to_string(),
            deb_mount_point: "/tmp/rattomail.deb".to_string(),
            work_mount_point: "/work".to_string(),
            test_user: "user".to_string(),
            mailbox_dir: "/home/user/Maildir/new".to_string(),
            recipient: "foo@bar.com".to_string(),
            subject: "test".to_string(),
            body: "wobble".to_string(),
            header_pattern: r"\(rattomail\) \(envelope-from [^)]*\);".to_string(),
        }
    }
}
