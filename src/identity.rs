//! Package identity: the four facts that name an artifact.

use crate::config::PackagingConfig;
use crate::version::DebArch;

/// Name, upstream version, Debian revision, and architecture of one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageIdentity {
    pub name: String,
    pub version: String,
    pub revision: String,
    pub arch: DebArch,
}

impl PackageIdentity {
    /// Combine a resolved version and architecture with the configured name
    /// and the revision from the environment.
    pub fn resolve(cfg: &PackagingConfig, version: String, arch: DebArch) -> Self {
        Self {
            name: cfg.package_name.clone(),
            version,
            revision: cfg.revision(),
            arch,
        }
    }

    /// Artifact file name: `<name>-<version>-<revision>-<arch>.deb`.
    pub fn deb_file_name(&self) -> String {
        format!(
            "{}-{}-{}-{}.deb",
            self.name, self.version, self.revision, self.arch
        )
    }

    /// Debian version string as dpkg understands it: `<version>-<revision>`.
    pub fn deb_version(&self) -> String {
        format!("{}-{}", self.version, self.revision)
    }

    /// `<version> <architecture>`, the form release tooling consumes.
    pub fn ver_arch(&self) -> String {
        format!("{} {}", self.version, self.arch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> PackageIdentity {
        PackageIdentity {
            name: "rattomail".to_string(),
            version: "0.1.0".to_string(),
            revision: "1".to_string(),
            arch: DebArch::Amd64,
        }
    }

    #[test]
    fn test_deb_file_name() {
        assert_eq!(identity().deb_file_name(), "rattomail-0.1.0-1-amd64.deb");
    }

    #[test]
    fn test_deb_file_name_with_revision() {
        let mut id = identity();
        id.revision = "3".to_string();
        assert_eq!(id.deb_file_name(), "rattomail-0.1.0-3-amd64.deb");
    }

    #[test]
    fn test_ver_arch() {
        assert_eq!(identity().ver_arch(), "0.1.0 amd64");
    }

    #[test]
    fn test_deb_version() {
        assert_eq!(identity().deb_version(), "0.1.0-1");
    }
}
