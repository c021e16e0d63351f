//! Release version newtype with semantic-version precedence.
//!
//! Versions follow `MAJOR.MINOR.PATCH[-pre][+build]`. An optional leading
//! `v` (as used by release tags) is accepted and dropped. Ordering compares
//! the numeric triple first; a version carrying any suffix sorts below the
//! same triple without one. Pre-release identifiers compare as in semver and
//! build metadata is the final, lexical, tie-break.

use super::error::{RecordError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A single dot-separated pre-release identifier.
///
/// Variant order matters: numeric identifiers sort below alphanumeric ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum PreId {
    Numeric(u64),
    Alpha(String),
}

impl fmt::Display for PreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Alpha(s) => f.write_str(s),
        }
    }
}

/// A validated release version (e.g. `0.4.1`, `1.0.0-rc.1`).
///
/// # Examples
///
/// ```
/// use artifact_resolver::record::version::ReleaseVersion;
///
/// let older: ReleaseVersion = "0.4.0".parse().expect("valid version");
/// let newer: ReleaseVersion = "v0.4.1".parse().expect("valid version");
/// assert!(older < newer);
/// assert_eq!(newer.to_string(), "0.4.1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseVersion {
    major: u64,
    minor: u64,
    patch: u64,
    pre: Vec<PreId>,
    build: Option<String>,
}

impl ReleaseVersion {
    /// Construct a plain release version without suffixes.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: Vec::new(),
            build: None,
        }
    }

    /// Return the major component.
    #[must_use]
    pub const fn major(&self) -> u64 {
        self.major
    }

    /// Return the minor component.
    #[must_use]
    pub const fn minor(&self) -> u64 {
        self.minor
    }

    /// Return the patch component.
    #[must_use]
    pub const fn patch(&self) -> u64 {
        self.patch
    }

    /// Return true when the version carries a pre-release suffix.
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }

    /// Return the build metadata, if any.
    #[must_use]
    pub fn build(&self) -> Option<&str> {
        self.build.as_deref()
    }
}

fn invalid(value: &str, reason: impl Into<String>) -> RecordError {
    RecordError::InvalidVersion {
        value: value.to_owned(),
        reason: reason.into(),
    }
}

fn parse_numeric(original: &str, part: &str, label: &str) -> Result<u64> {
    if part.is_empty() {
        return Err(invalid(original, format!("{label} component is empty")));
    }
    if !part.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid(original, format!("{label} component \"{part}\" is not numeric")));
    }
    if part.len() > 1 && part.starts_with('0') {
        return Err(invalid(original, format!("{label} component \"{part}\" has a leading zero")));
    }
    part.parse::<u64>()
        .map_err(|e| invalid(original, format!("{label} component \"{part}\": {e}")))
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

fn validate_identifiers(original: &str, section: &str, label: &str) -> Result<()> {
    for ident in section.split('.') {
        if ident.is_empty() {
            return Err(invalid(original, format!("empty {label} identifier")));
        }
        if let Some(bad) = ident.chars().find(|c| !is_identifier_char(*c)) {
            return Err(invalid(original, format!("invalid character '{bad}' in {label}")));
        }
    }
    Ok(())
}

fn parse_pre(original: &str, section: &str) -> Result<Vec<PreId>> {
    validate_identifiers(original, section, "pre-release")?;
    section
        .split('.')
        .map(|ident| {
            if ident.chars().all(|c| c.is_ascii_digit()) {
                parse_numeric(original, ident, "pre-release").map(PreId::Numeric)
            } else {
                Ok(PreId::Alpha(ident.to_owned()))
            }
        })
        .collect()
}

fn parse_version(value: &str) -> Result<ReleaseVersion> {
    let trimmed = value.strip_prefix('v').unwrap_or(value);
    if trimmed.is_empty() {
        return Err(invalid(value, "version must not be empty"));
    }

    let (rest, build) = match trimmed.split_once('+') {
        Some((rest, build)) => {
            validate_identifiers(value, build, "build metadata")?;
            (rest, Some(build.to_owned()))
        }
        None => (trimmed, None),
    };

    let (core, pre) = match rest.split_once('-') {
        Some((core, pre)) => (core, parse_pre(value, pre)?),
        None => (rest, Vec::new()),
    };

    let mut parts = core.split('.');
    let (Some(major), Some(minor), Some(patch), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid(value, "expected MAJOR.MINOR.PATCH"));
    };

    Ok(ReleaseVersion {
        major: parse_numeric(value, major, "major")?,
        minor: parse_numeric(value, minor, "minor")?,
        patch: parse_numeric(value, patch, "patch")?,
        pre,
        build,
    })
}

fn compare_pre(left: &[PreId], right: &[PreId]) -> Ordering {
    match (left.is_empty(), right.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => left.cmp(right),
    }
}

fn compare_build(left: Option<&str>, right: Option<&str>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(l), Some(r)) => l.cmp(r),
    }
}

impl Ord for ReleaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| compare_pre(&self.pre, &other.pre))
            .then_with(|| compare_build(self.build.as_deref(), other.build.as_deref()))
    }
}

impl PartialOrd for ReleaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for ReleaseVersion {
    type Err = RecordError;

    fn from_str(value: &str) -> Result<Self> {
        parse_version(value)
    }
}

impl TryFrom<&str> for ReleaseVersion {
    type Error = RecordError;

    fn try_from(value: &str) -> Result<Self> {
        parse_version(value)
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.pre.is_empty() {
            f.write_str("-")?;
            for (index, ident) in self.pre.iter().enumerate() {
                if index > 0 {
                    f.write_str(".")?;
                }
                write!(f, "{ident}")?;
            }
        }
        if let Some(build) = &self.build {
            write!(f, "+{build}")?;
        }
        Ok(())
    }
}

impl Serialize for ReleaseVersion {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ReleaseVersion {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_version(&raw).map_err(serde::de::Error::custom)
    }
}
