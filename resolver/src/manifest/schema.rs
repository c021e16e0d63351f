//! Declaration types for the package manifest.
//!
//! These types mirror the TOML layout one-to-one. Field newtypes validate
//! during deserialization; cross-field rules are checked by the parser
//! after the document is read.

use crate::record::{ArtifactName, ArtifactSource, Checksum, ReleaseVersion};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::fmt;

/// A minimum operating system requirement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Platform {
    os: String,
    min_version: String,
}

impl Platform {
    /// Return the operating system identifier (for example `ios`).
    #[must_use]
    pub fn os(&self) -> &str {
        &self.os
    }

    /// Return the minimum supported OS version.
    #[must_use]
    pub fn min_version(&self) -> &str {
        &self.min_version
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} >= {}", self.os, self.min_version)
    }
}

/// A named product exposing one or more targets to consumers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Product {
    name: String,
    targets: Vec<ArtifactName>,
}

impl Product {
    /// Return the product name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the targets the product exposes.
    #[must_use]
    pub fn targets(&self) -> &[ArtifactName] {
        &self.targets
    }
}

/// A precompiled binary target bound to a local path or a pinned URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BinaryTarget {
    name: ArtifactName,
    #[serde(default)]
    path: Option<Utf8PathBuf>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    checksum: Option<Checksum>,
}

impl BinaryTarget {
    /// Return the target name.
    #[must_use]
    pub const fn name(&self) -> &ArtifactName {
        &self.name
    }

    /// Return the declared local path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }

    /// Return the declared URL, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Return the pinned checksum, if any.
    #[must_use]
    pub const fn checksum(&self) -> Option<&Checksum> {
        self.checksum.as_ref()
    }

    /// Build the artifact source, resolving a relative path against
    /// `base_dir`.
    ///
    /// Returns `None` when neither a path nor a URL is declared.
    #[must_use]
    pub fn source(&self, base_dir: Option<&Utf8Path>) -> Option<ArtifactSource> {
        if let Some(url) = &self.url {
            return Some(ArtifactSource::Remote { url: url.clone() });
        }
        let path = self.path.as_ref()?;
        let resolved = match base_dir {
            Some(base) if path.is_relative() && !path.as_str().is_empty() => base.join(path),
            _ => path.clone(),
        };
        Some(ArtifactSource::LocalPath(resolved))
    }
}

/// A source library target that wraps exactly one binary target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LibraryTarget {
    name: ArtifactName,
    #[serde(default)]
    dependencies: Vec<ArtifactName>,
    #[serde(default)]
    path: Option<Utf8PathBuf>,
}

impl LibraryTarget {
    /// Return the target name.
    #[must_use]
    pub const fn name(&self) -> &ArtifactName {
        &self.name
    }

    /// Return the targets this library depends on.
    #[must_use]
    pub fn dependencies(&self) -> &[ArtifactName] {
        &self.dependencies
    }

    /// Return the source directory, if declared.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }
}

/// A target declared by a package.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetDecl {
    /// A precompiled binary module.
    Binary(BinaryTarget),
    /// A pass-through source library.
    Library(LibraryTarget),
}

impl TargetDecl {
    /// Return the target name.
    #[must_use]
    pub const fn name(&self) -> &ArtifactName {
        match self {
            Self::Binary(target) => target.name(),
            Self::Library(target) => target.name(),
        }
    }

    /// Return the `kind` label used in the manifest.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Binary(_) => "binary",
            Self::Library(_) => "library",
        }
    }
}

/// One release of a package as declared in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageDeclaration {
    name: ArtifactName,
    version: ReleaseVersion,
    #[serde(default)]
    platforms: Vec<Platform>,
    #[serde(default)]
    products: Vec<Product>,
    #[serde(default)]
    targets: Vec<TargetDecl>,
}

impl PackageDeclaration {
    /// Return the package name.
    #[must_use]
    pub const fn name(&self) -> &ArtifactName {
        &self.name
    }

    /// Return the package release version.
    #[must_use]
    pub const fn version(&self) -> &ReleaseVersion {
        &self.version
    }

    /// Return the supported platforms.
    #[must_use]
    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    /// Return the declared products.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Return every declared target.
    #[must_use]
    pub fn targets(&self) -> &[TargetDecl] {
        &self.targets
    }

    /// Return the target called `name`.
    #[must_use]
    pub fn target(&self, name: &str) -> Option<&TargetDecl> {
        self.targets.iter().find(|t| t.name().as_str() == name)
    }

    /// Iterate over the binary targets.
    pub fn binary_targets(&self) -> impl Iterator<Item = &BinaryTarget> {
        self.targets.iter().filter_map(|target| match target {
            TargetDecl::Binary(binary) => Some(binary),
            TargetDecl::Library(_) => None,
        })
    }

    /// Return the binary target wrapped by the library `library`.
    #[must_use]
    pub fn pass_through(&self, library: &str) -> Option<&BinaryTarget> {
        let Some(TargetDecl::Library(lib)) = self.target(library) else {
            return None;
        };
        let dependency = lib.dependencies().first()?;
        self.binary_targets().find(|b| b.name() == dependency)
    }

    /// Return `"name version"` for diagnostics.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.name, self.version)
    }
}
