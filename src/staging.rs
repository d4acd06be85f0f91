//! Staging tree construction.
//!
//! Builds the exact directory image `dpkg-deb` will archive: the setuid
//! binary under `usr/sbin`, the rendered man page, the shipped example
//! config, the `sendmail` compatibility symlink, and the `DEBIAN` metadata
//! directory. Everything lives under a randomized scratch root that is
//! removed when the tree is dropped, on success and failure alike.

use anyhow::{Context, Result};
use std::fs;
use std::os::unix::fs::symlink;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::config::PackagingConfig;
use crate::process::{Cmd, CommandRunner};

/// A fully populated staging tree, alive until dropped.
#[derive(Debug)]
pub struct StagingTree {
    scratch: TempDir,
    /// Staged binary, stripped and setuid.
    pub binary_path: PathBuf,
    /// Where the rendered control file belongs.
    pub control_path: PathBuf,
}

impl StagingTree {
    /// Root of the staged directory image.
    pub fn root(&self) -> &Path {
        self.scratch.path()
    }
}

/// Build the staging tree from a validated executable.
pub fn build_staging_tree(
    runner: &dyn CommandRunner,
    cfg: &PackagingConfig,
    executable: &Path,
) -> Result<StagingTree> {
    let scratch = TempDir::new().context("Failed to create staging scratch directory")?;
    let root = scratch.path().to_path_buf();
    println!("  Staging root: {}", root.display());

    let binary_dir = root.join(&cfg.binary_dir);
    let man_dir = root.join(&cfg.man_dir);
    let examples_dir = root.join(&cfg.doc_examples_dir);
    let metadata_dir = root.join(&cfg.metadata_dir);

    for dir in [&binary_dir, &man_dir, &examples_dir, &metadata_dir] {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create staging directory {}", dir.display()))?;
    }

    // The scratch root is created 0o700; dpkg-deb refuses a tree whose
    // directories are not world-readable. Normalize every directory, the
    // root included.
    for entry in WalkDir::new(&root) {
        let entry = entry?;
        if entry.file_type().is_dir() {
            fs::set_permissions(entry.path(), fs::Permissions::from_mode(cfg.dir_mode))
                .with_context(|| {
                    format!("Failed to set mode on {}", entry.path().display())
                })?;
        }
    }

    let staged_binary = binary_dir.join(&cfg.package_name);
    fs::copy(executable, &staged_binary).with_context(|| {
        format!(
            "Failed to copy {} into the staging tree",
            executable.display()
        )
    })?;

    Cmd::new(runner, "strip")
        .arg_path(&staged_binary)
        .error_msg("Failed to strip staged binary")
        .run()?;

    // strip rewrites the file in place and clears the setuid bit, so the
    // final mode must go on after it.
    fs::set_permissions(&staged_binary, fs::Permissions::from_mode(cfg.binary_mode))
        .with_context(|| format!("Failed to set mode on {}", staged_binary.display()))?;
    println!(
        "  Staged binary: {} (stripped, mode {:o})",
        staged_binary.display(),
        cfg.binary_mode
    );

    let man_page = man_dir.join(&cfg.man_page_name);
    Cmd::new(runner, "pandoc")
        .args(["-s", "-f", "markdown", "-t", "man", "-o"])
        .arg_path(&man_page)
        .arg_path(&cfg.man_source)
        .error_msg("Failed to render man page")
        .run()?;
    println!("  Man page: {}", man_page.display());

    let example_name = cfg
        .example_config
        .file_name()
        .context("example config path has no file name")?;
    let staged_example = examples_dir.join(example_name);
    fs::copy(&cfg.example_config, &staged_example).with_context(|| {
        format!(
            "Failed to copy example config {}",
            cfg.example_config.display()
        )
    })?;

    // The symlink target is the installed path, not a staging path, so the
    // link dangles inside the tree and resolves once the package is
    // installed.
    let link = binary_dir.join(&cfg.sendmail_link_name);
    symlink(&cfg.installed_binary_path, &link)
        .with_context(|| format!("Failed to create symlink {}", link.display()))?;
    println!(
        "  Symlink: {} -> {}",
        cfg.sendmail_link_name,
        cfg.installed_binary_path.display()
    );

    let control_path = metadata_dir.join("control");

    Ok(StagingTree {
        scratch,
        binary_path: staged_binary,
        control_path,
    })
}
