//! The loaded manifest and record extraction.

use super::schema::PackageDeclaration;
use super::schema_version::SchemaVersion;
use crate::error::Result;
use crate::record::ArtifactRecord;
use crate::selection::{RecordSet, VersionConstraint};
use camino::{Utf8Path, Utf8PathBuf};

/// A parsed and validated package manifest.
///
/// The manifest is an explicit value: load it once and pass it by reference
/// to whatever needs release data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSet {
    schema_version: SchemaVersion,
    active: VersionConstraint,
    packages: Vec<PackageDeclaration>,
    base_dir: Option<Utf8PathBuf>,
}

impl ManifestSet {
    pub(crate) const fn new(
        schema_version: SchemaVersion,
        active: VersionConstraint,
        packages: Vec<PackageDeclaration>,
        base_dir: Option<Utf8PathBuf>,
    ) -> Self {
        Self {
            schema_version,
            active,
            packages,
            base_dir,
        }
    }

    pub(crate) fn with_base_dir(mut self, base_dir: Utf8PathBuf) -> Self {
        self.base_dir = Some(base_dir);
        self
    }

    /// Return the manifest schema version.
    #[must_use]
    pub const fn schema_version(&self) -> SchemaVersion {
        self.schema_version
    }

    /// Return the constraint selecting the active release.
    #[must_use]
    pub const fn active(&self) -> &VersionConstraint {
        &self.active
    }

    /// Return every package release in declaration order.
    #[must_use]
    pub fn packages(&self) -> &[PackageDeclaration] {
        &self.packages
    }

    /// Return the directory relative local paths resolve against.
    #[must_use]
    pub fn base_dir(&self) -> Option<&Utf8Path> {
        self.base_dir.as_deref()
    }

    /// Return the declaration for package `name` at `version`.
    #[must_use]
    pub fn package(&self, name: &str, version: &str) -> Option<&PackageDeclaration> {
        let version = version.parse().ok()?;
        self.packages
            .iter()
            .find(|p| p.name().as_str() == name && *p.version() == version)
    }

    /// Return one record per binary target per package release.
    ///
    /// The records are not validated; see [`ManifestSet::record_set`].
    #[must_use]
    pub fn records(&self) -> Vec<ArtifactRecord> {
        let base_dir = self.base_dir();
        self.packages
            .iter()
            .flat_map(|package| {
                package.binary_targets().filter_map(move |target| {
                    let source = target.source(base_dir)?;
                    Some(ArtifactRecord::new(
                        target.name().clone(),
                        package.version().clone(),
                        source,
                        target.checksum().cloned(),
                    ))
                })
            })
            .collect()
    }

    /// Extract the validated [`RecordSet`] of every binary release.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ResolveError::MalformedRecord`] for an
    /// unusable record and [`crate::error::ResolveError::DuplicateVersion`]
    /// when a binary appears twice at the same version.
    pub fn record_set(&self) -> Result<RecordSet> {
        RecordSet::new(self.records())
    }

    /// Select the release of `name` satisfying `constraint`.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`ManifestSet::record_set`] and
    /// [`RecordSet::select`].
    pub fn select(&self, name: &str, constraint: &VersionConstraint) -> Result<ArtifactRecord> {
        self.record_set()?.select(name, constraint).cloned()
    }

    /// Return the active release of `name` under the manifest's `active`
    /// constraint.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`ManifestSet::select`].
    pub fn active_record(&self, name: &str) -> Result<ArtifactRecord> {
        self.select(name, &self.active)
    }
}
