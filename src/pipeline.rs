//! Build pipeline orchestration.
//!
//! The bins stay thin; the identity resolution and full packaging sequence
//! live here so tests can drive them with a scripted runner.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::assemble;
use crate::config::PackagingConfig;
use crate::control;
use crate::identity::PackageIdentity;
use crate::process::CommandRunner;
use crate::staging;
use crate::validate;
use crate::version;

/// Resolve identity from the manifest, for tools that never touch a binary.
pub fn identity_from_manifest(
    runner: &dyn CommandRunner,
    cfg: &PackagingConfig,
) -> Result<PackageIdentity> {
    let version = version::version_from_manifest(&cfg.manifest_path)?;
    let arch = version::host_arch(runner)?;
    Ok(PackageIdentity::resolve(cfg, version, arch))
}

/// Resolve identity by asking the candidate binary, validating it first.
pub fn identity_from_executable(
    runner: &dyn CommandRunner,
    cfg: &PackagingConfig,
    executable: &Path,
) -> Result<PackageIdentity> {
    validate::validate_executable(runner, executable)?;
    let version = version::version_from_executable(runner, executable)?;
    let arch = version::host_arch(runner)?;
    Ok(PackageIdentity::resolve(cfg, version, arch))
}

/// Compute the artifact name a packaging run would produce, with no side
/// effects beyond validating the executable.
pub fn dry_run_name(
    runner: &dyn CommandRunner,
    cfg: &PackagingConfig,
    executable: &Path,
) -> Result<String> {
    let identity = identity_from_executable(runner, cfg, executable)?;
    Ok(identity.deb_file_name())
}

/// Full packaging run: validate, stage, render control, assemble.
pub fn build_package(
    runner: &dyn CommandRunner,
    cfg: &PackagingConfig,
    executable: &Path,
) -> Result<PathBuf> {
    let identity = identity_from_executable(runner, cfg, executable)?;
    println!("=== Building {} ===", identity.deb_file_name());
    println!("  Version: {}", identity.deb_version());
    println!("  Architecture: {}", identity.arch);

    println!("=== Staging package tree ===");
    let staging = staging::build_staging_tree(runner, cfg, executable)?;
    control::render_control(runner, cfg, &identity, &staging)?;

    println!("=== Assembling package ===");
    let artifact = assemble::assemble_package(runner, &identity, staging.root(), &cfg.output_dir)?;

    Ok(artifact)
}
