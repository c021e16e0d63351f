//! Artifact name newtype.
//!
//! Binary module names appear in manifests and cache paths, so they are
//! restricted to ASCII alphanumerics, hyphens, dots, and underscores.

use super::error::{RecordError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A validated binary module name (e.g. `stx2btcFFI`).
///
/// # Examples
///
/// ```
/// use artifact_resolver::record::name::ArtifactName;
///
/// let name: ArtifactName = "stx2btcFFI".try_into().expect("valid name");
/// assert_eq!(name.as_str(), "stx2btcFFI");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ArtifactName(String);

fn is_valid_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_'
}

impl ArtifactName {
    /// Return the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

fn validate_name(value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(RecordError::InvalidName {
            value: value.to_owned(),
            reason: "name must not be empty".to_owned(),
        });
    }
    // Leading dots would produce hidden or relative cache directories.
    if value.starts_with('.') {
        return Err(RecordError::InvalidName {
            value: value.to_owned(),
            reason: "name must not start with '.'".to_owned(),
        });
    }
    if let Some(bad) = value.chars().find(|c| !is_valid_name_char(*c)) {
        return Err(RecordError::InvalidName {
            value: value.to_owned(),
            reason: format!("invalid character '{bad}'"),
        });
    }
    Ok(())
}

impl TryFrom<&str> for ArtifactName {
    type Error = RecordError;

    fn try_from(value: &str) -> Result<Self> {
        validate_name(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for ArtifactName {
    type Error = RecordError;

    fn try_from(value: String) -> Result<Self> {
        validate_name(&value)?;
        Ok(Self(value))
    }
}

impl<'de> Deserialize<'de> for ArtifactName {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for ArtifactName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
