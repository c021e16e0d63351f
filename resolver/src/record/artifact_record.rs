//! The published-release record consumed by the resolver.

use super::checksum::Checksum;
use super::name::ArtifactName;
use super::source::ArtifactSource;
use super::version::ReleaseVersion;
use crate::error::{ResolveError, Result};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One published release of a binary artifact.
///
/// Records are immutable values: a new release produces a new record. The
/// constructors do not enforce cross-field invariants so that records read
/// from untrusted input can be represented and then rejected by
/// [`ArtifactRecord::validate`] before any I/O takes place.
///
/// # Examples
///
/// ```
/// use artifact_resolver::record::ArtifactRecord;
///
/// let record = ArtifactRecord::remote(
///     "stx2btcFFI".try_into().expect("valid name"),
///     "0.4.1".parse().expect("valid version"),
///     "https://example.test/stx2btc.xcframework.zip",
///     "abcd".parse().expect("valid checksum"),
/// );
/// assert!(record.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRecord {
    name: ArtifactName,
    version: ReleaseVersion,
    source: ArtifactSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    checksum: Option<Checksum>,
}

impl ArtifactRecord {
    /// Construct a record from its parts without validation.
    #[must_use]
    pub const fn new(
        name: ArtifactName,
        version: ReleaseVersion,
        source: ArtifactSource,
        checksum: Option<Checksum>,
    ) -> Self {
        Self {
            name,
            version,
            source,
            checksum,
        }
    }

    /// Construct a local-path record with no checksum.
    #[must_use]
    pub fn local(name: ArtifactName, version: ReleaseVersion, path: impl Into<Utf8PathBuf>) -> Self {
        Self::new(name, version, ArtifactSource::LocalPath(path.into()), None)
    }

    /// Construct a remote record pinned to `checksum`.
    #[must_use]
    pub fn remote(
        name: ArtifactName,
        version: ReleaseVersion,
        url: impl Into<String>,
        checksum: Checksum,
    ) -> Self {
        Self::new(
            name,
            version,
            ArtifactSource::Remote { url: url.into() },
            Some(checksum),
        )
    }

    /// Return a copy of this record carrying `checksum`.
    #[must_use]
    pub fn with_checksum(mut self, checksum: Checksum) -> Self {
        self.checksum = Some(checksum);
        self
    }

    /// Return the artifact name.
    #[must_use]
    pub const fn name(&self) -> &ArtifactName {
        &self.name
    }

    /// Return the release version.
    #[must_use]
    pub const fn version(&self) -> &ReleaseVersion {
        &self.version
    }

    /// Return the artifact source.
    #[must_use]
    pub const fn source(&self) -> &ArtifactSource {
        &self.source
    }

    /// Return the pinned checksum, if any.
    #[must_use]
    pub const fn checksum(&self) -> Option<&Checksum> {
        self.checksum.as_ref()
    }

    /// Check the record's invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::MalformedRecord`] when the source is unusable
    /// or a remote source has no checksum.
    pub fn validate(&self) -> Result<()> {
        if let Some(reason) = self.source.defect() {
            return Err(self.malformed(reason));
        }
        if self.source.is_remote() && self.checksum.is_none() {
            return Err(self.malformed("remote source requires a checksum"));
        }
        Ok(())
    }

    fn malformed(&self, reason: impl Into<String>) -> ResolveError {
        ResolveError::MalformedRecord {
            name: format!("{} {}", self.name, self.version),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ArtifactRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.name, self.version, self.source)
    }
}
