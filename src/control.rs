//! Control file rendering.
//!
//! The template under `packaging/` carries three placeholder tokens; this
//! module measures the staged tree, substitutes the tokens globally, and
//! writes the result into the metadata directory.

use anyhow::{bail, Context, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::config::PackagingConfig;
use crate::identity::PackageIdentity;
use crate::process::{Cmd, CommandRunner};
use crate::staging::StagingTree;

/// Measure the staged tree in kilobytes, the unit `Installed-Size` uses.
pub fn installed_size_kb(runner: &dyn CommandRunner, root: &Path) -> Result<String> {
    let result = Cmd::new(runner, "du")
        .arg("-sk")
        .arg_path(root)
        .error_msg("Failed to measure staging tree")
        .run()?;

    match result.stdout_trimmed().split_whitespace().next() {
        Some(field) => Ok(field.to_string()),
        None => bail!("du produced no output for {}", root.display()),
    }
}

/// Substitute the placeholder tokens. Every occurrence is replaced.
pub fn substitute_tokens(template: &str, version: &str, arch: &str, size_kb: &str) -> String {
    template
        .replace("@VERSION@", version)
        .replace("@ARCHITECTURE@", arch)
        .replace("@INSTALLED_SIZE@", size_kb)
}

/// Render the control template and write it into the staging tree.
pub fn render_control(
    runner: &dyn CommandRunner,
    cfg: &PackagingConfig,
    identity: &PackageIdentity,
    staging: &StagingTree,
) -> Result<()> {
    let template = fs::read_to_string(&cfg.control_template).with_context(|| {
        format!(
            "Failed to read control template {}",
            cfg.control_template.display()
        )
    })?;

    let size_kb = installed_size_kb(runner, staging.root())?;
    let rendered = substitute_tokens(
        &template,
        &identity.deb_version(),
        identity.arch.as_str(),
        &size_kb,
    );

    fs::write(&staging.control_path, rendered).with_context(|| {
        format!(
            "Failed to write control file {}",
            staging.control_path.display()
        )
    })?;
    fs::set_permissions(&staging.control_path, fs::Permissions::from_mode(0o644))
        .with_context(|| {
            format!("Failed to set mode on {}", staging.control_path.display())
        })?;
    println!("  Control file: Installed-Size {} kB", size_kb);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitution_replaces_every_occurrence() {
        let template = "Version: @VERSION@\nArchitecture: @ARCHITECTURE@\n\
                        Installed-Size: @INSTALLED_SIZE@\nDescription: v@VERSION@ build\n";
        let rendered = substitute_tokens(template, "0.1.0-1", "amd64", "640");

        assert_eq!(
            rendered,
            "Version: 0.1.0-1\nArchitecture: amd64\n\
             Installed-Size: 640\nDescription: v0.1.0-1 build\n"
        );
        assert!(!rendered.contains('@'));
    }

    #[test]
    fn test_substitution_leaves_plain_text_alone() {
        let rendered = substitute_tokens("Package: rattomail\n", "1", "amd64", "2");
        assert_eq!(rendered, "Package: rattomail\n");
    }
}
