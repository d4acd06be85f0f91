//! Final package assembly.
//!
//! `fakeroot` makes the staged tree appear root-owned to `dpkg-deb` so the
//! archive records sane ownership without the pipeline needing privileges.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::identity::PackageIdentity;
use crate::process::{Cmd, CommandRunner};

/// Build the .deb from a finished staging tree, returning the artifact path.
pub fn assemble_package(
    runner: &dyn CommandRunner,
    identity: &PackageIdentity,
    staging_root: &Path,
    output_dir: &Path,
) -> Result<PathBuf> {
    let artifact = output_dir.join(identity.deb_file_name());

    Cmd::new(runner, "fakeroot")
        .arg("dpkg-deb")
        .arg("--build")
        .arg_path(staging_root)
        .arg_path(&artifact)
        .error_msg("Failed to assemble package")
        .run()?;

    Ok(artifact)
}
