//! Version constraints and release selection.
//!
//! A [`RecordSet`] is the validated collection of published releases: every
//! record passes its own invariants and `(name, version)` pairs are unique.
//! Selection picks one record per artifact name under a
//! [`VersionConstraint`].

use crate::error::{ResolveError, Result};
use crate::record::{ArtifactName, ArtifactRecord, ReleaseVersion};
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

/// Which release of an artifact to select.
///
/// # Examples
///
/// ```
/// use artifact_resolver::selection::VersionConstraint;
///
/// let latest: VersionConstraint = "latest".parse().expect("valid constraint");
/// assert_eq!(latest, VersionConstraint::Latest);
/// let capped: VersionConstraint = "<=0.4.0".parse().expect("valid constraint");
/// assert_eq!(capped.to_string(), "<=0.4.0");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VersionConstraint {
    /// The highest version by precedence.
    #[default]
    Latest,
    /// Exactly this version.
    Exact(ReleaseVersion),
    /// The highest version less than or equal to this one.
    AtMost(ReleaseVersion),
}

impl VersionConstraint {
    /// Return true when `version` satisfies the constraint.
    #[must_use]
    pub fn matches(&self, version: &ReleaseVersion) -> bool {
        match self {
            Self::Latest => true,
            Self::Exact(wanted) => version == wanted,
            Self::AtMost(limit) => version <= limit,
        }
    }
}

impl FromStr for VersionConstraint {
    type Err = crate::record::error::RecordError;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("latest") {
            return Ok(Self::Latest);
        }
        if let Some(rest) = trimmed.strip_prefix("<=") {
            return rest.trim().parse().map(Self::AtMost);
        }
        let exact = trimmed.strip_prefix('=').unwrap_or(trimmed);
        exact.trim().parse().map(Self::Exact)
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Exact(version) => write!(f, "={version}"),
            Self::AtMost(version) => write!(f, "<={version}"),
        }
    }
}

impl<'de> Deserialize<'de> for VersionConstraint {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Select the record satisfying `constraint` from releases of one artifact.
///
/// # Errors
///
/// - [`ResolveError::MalformedRecord`] if the records name more than one
///   artifact.
/// - [`ResolveError::DuplicateVersion`] if the winning version appears more
///   than once.
/// - [`ResolveError::NoMatchingVersion`] if nothing satisfies `constraint`.
pub fn select_version<'a>(
    records: &'a [ArtifactRecord],
    constraint: &VersionConstraint,
) -> Result<&'a ArtifactRecord> {
    let Some(first) = records.first() else {
        return Err(ResolveError::NoMatchingVersion {
            name: "<no records>".to_owned(),
            constraint: constraint.to_string(),
        });
    };
    if let Some(other) = records.iter().find(|r| r.name() != first.name()) {
        return Err(ResolveError::MalformedRecord {
            name: other.name().to_string(),
            reason: format!("selection mixes artifacts {} and {}", first.name(), other.name()),
        });
    }
    select_from(first.name(), records.iter(), constraint)
}

fn select_from<'a>(
    name: &ArtifactName,
    candidates: impl Iterator<Item = &'a ArtifactRecord>,
    constraint: &VersionConstraint,
) -> Result<&'a ArtifactRecord> {
    let matching: Vec<&ArtifactRecord> = candidates
        .filter(|record| constraint.matches(record.version()))
        .collect();
    let Some(best) = matching.iter().copied().max_by(|a, b| a.version().cmp(b.version())) else {
        return Err(ResolveError::NoMatchingVersion {
            name: name.to_string(),
            constraint: constraint.to_string(),
        });
    };
    let ties = matching
        .iter()
        .filter(|record| record.version() == best.version())
        .count();
    if ties > 1 {
        return Err(ResolveError::DuplicateVersion {
            name: name.to_string(),
            version: best.version().to_string(),
        });
    }
    Ok(best)
}

/// A validated set of published releases.
///
/// # Examples
///
/// ```
/// use artifact_resolver::record::ArtifactRecord;
/// use artifact_resolver::selection::{RecordSet, VersionConstraint};
///
/// let record = |v: &str| {
///     ArtifactRecord::remote(
///         "stx2btcFFI".try_into().expect("valid name"),
///         v.parse().expect("valid version"),
///         format!("https://example.test/{v}.zip"),
///         "abcd".parse().expect("valid checksum"),
///     )
/// };
/// let set = RecordSet::new([record("0.3.1"), record("0.4.0"), record("0.4.1")])
///     .expect("valid set");
/// let latest = set
///     .select("stx2btcFFI", &VersionConstraint::Latest)
///     .expect("a release");
/// assert_eq!(latest.version().to_string(), "0.4.1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    records: Vec<ArtifactRecord>,
}

impl RecordSet {
    /// Validate `records` and collect them into a set.
    ///
    /// No I/O is performed.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::MalformedRecord`] for the first invalid record
    /// and [`ResolveError::DuplicateVersion`] for the first repeated
    /// `(name, version)` pair.
    pub fn new(records: impl IntoIterator<Item = ArtifactRecord>) -> Result<Self> {
        let records: Vec<ArtifactRecord> = records.into_iter().collect();
        let mut seen = HashSet::new();
        for record in &records {
            record.validate()?;
            if !seen.insert((record.name(), record.version())) {
                return Err(ResolveError::DuplicateVersion {
                    name: record.name().to_string(),
                    version: record.version().to_string(),
                });
            }
        }
        Ok(Self { records })
    }

    /// Return every record in insertion order.
    #[must_use]
    pub fn records(&self) -> &[ArtifactRecord] {
        &self.records
    }

    /// Return the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Return true when the set holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Return the distinct artifact names, sorted.
    #[must_use]
    pub fn names(&self) -> BTreeSet<&ArtifactName> {
        self.records.iter().map(ArtifactRecord::name).collect()
    }

    /// Return every release of `name`, oldest first.
    #[must_use]
    pub fn releases(&self, name: &str) -> Vec<&ArtifactRecord> {
        let mut releases: Vec<&ArtifactRecord> = self
            .records
            .iter()
            .filter(|record| record.name().as_str() == name)
            .collect();
        releases.sort_by(|a, b| a.version().cmp(b.version()));
        releases
    }

    /// Select the release of `name` satisfying `constraint`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NoMatchingVersion`] when `name` is unknown or
    /// no release satisfies `constraint`.
    pub fn select(&self, name: &str, constraint: &VersionConstraint) -> Result<&ArtifactRecord> {
        let mut candidates = self
            .records
            .iter()
            .filter(|record| record.name().as_str() == name)
            .peekable();
        let Some(first) = candidates.peek() else {
            return Err(ResolveError::NoMatchingVersion {
                name: name.to_owned(),
                constraint: constraint.to_string(),
            });
        };
        let artifact = first.name().clone();
        select_from(&artifact, candidates, constraint)
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a ArtifactRecord;
    type IntoIter = std::slice::Iter<'a, ArtifactRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
