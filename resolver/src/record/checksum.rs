//! Opaque integrity token pinned by a release.
//!
//! Published checksums are long hex strings whose algorithm is not always
//! named and whose length varies between releases, so the token is kept
//! opaque: an optional `<algorithm>:` prefix followed by one or more hex
//! digits. Comparison with a computed digest is case-insensitive and exact.

use super::error::{RecordError, Result};
use crate::digest::DigestAlgorithm;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A validated checksum token.
///
/// # Examples
///
/// ```
/// use artifact_resolver::digest::DigestAlgorithm;
/// use artifact_resolver::record::checksum::Checksum;
///
/// let plain: Checksum = "9D2B9EEC".parse().expect("valid token");
/// assert!(plain.matches("9d2b9eec"));
/// assert_eq!(plain.algorithm(), None);
///
/// let pinned: Checksum = "blake3:af13".parse().expect("valid token");
/// assert_eq!(pinned.algorithm(), Some(DigestAlgorithm::Blake3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    algorithm: Option<DigestAlgorithm>,
    hex: String,
}

impl Checksum {
    /// Return the algorithm pinned by the token prefix, if any.
    #[must_use]
    pub const fn algorithm(&self) -> Option<DigestAlgorithm> {
        self.algorithm
    }

    /// Return the hex digits exactly as published.
    #[must_use]
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Resolve the algorithm to verify with, preferring the token's own prefix.
    #[must_use]
    pub fn effective_algorithm(&self, configured: DigestAlgorithm) -> DigestAlgorithm {
        self.algorithm.unwrap_or(configured)
    }

    /// Compare a computed hex digest against this token.
    #[must_use]
    pub fn matches(&self, actual_hex: &str) -> bool {
        self.hex.eq_ignore_ascii_case(actual_hex)
    }

    /// Return a normalised, filesystem-safe form used to key cache entries.
    #[must_use]
    pub fn cache_component(&self) -> String {
        let hex = self.hex.to_ascii_lowercase();
        match self.algorithm {
            Some(algorithm) => format!("{algorithm}-{hex}"),
            None => hex,
        }
    }
}

fn invalid(value: &str, reason: impl Into<String>) -> RecordError {
    RecordError::InvalidChecksum {
        value: value.to_owned(),
        reason: reason.into(),
    }
}

fn parse_checksum(value: &str) -> Result<Checksum> {
    if value.is_empty() {
        return Err(invalid(value, "checksum must not be empty"));
    }
    let (algorithm, hex) = match value.split_once(':') {
        Some((prefix, hex)) => {
            let algorithm = prefix
                .parse::<DigestAlgorithm>()
                .map_err(|e| invalid(value, e.to_string()))?;
            (Some(algorithm), hex)
        }
        None => (None, value),
    };
    if hex.is_empty() {
        return Err(invalid(value, "no digest after algorithm prefix"));
    }
    if let Some(bad) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(invalid(value, format!("non-hex character '{bad}'")));
    }
    Ok(Checksum {
        algorithm,
        hex: hex.to_owned(),
    })
}

impl FromStr for Checksum {
    type Err = RecordError;

    fn from_str(value: &str) -> Result<Self> {
        parse_checksum(value)
    }
}

impl TryFrom<&str> for Checksum {
    type Error = RecordError;

    fn try_from(value: &str) -> Result<Self> {
        parse_checksum(value)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.algorithm {
            Some(algorithm) => write!(f, "{algorithm}:{}", self.hex),
            None => f.write_str(&self.hex),
        }
    }
}

impl Serialize for Checksum {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_checksum(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const PUBLISHED: &str = "9d2b9eecc9ddb69b16d5dd4360e940542616443ec66164a8bd3ef848c986b645";

    #[test]
    fn accepts_sixty_four_hex_characters() {
        let checksum = Checksum::try_from(PUBLISHED).expect("valid token");
        assert_eq!(checksum.hex(), PUBLISHED);
        assert_eq!(checksum.algorithm(), None);
    }

    #[test]
    fn accepts_sixty_six_hex_characters() {
        let long = format!("{PUBLISHED}ab");
        assert!(Checksum::try_from(long.as_str()).is_ok());
    }

    #[rstest]
    #[case::sha256("sha256:abcd", DigestAlgorithm::Sha256)]
    #[case::sha512("sha512:abcd", DigestAlgorithm::Sha512)]
    #[case::blake3("blake3:abcd", DigestAlgorithm::Blake3)]
    fn parses_algorithm_prefix(#[case] token: &str, #[case] expected: DigestAlgorithm) {
        let checksum = Checksum::try_from(token).expect("valid token");
        assert_eq!(checksum.algorithm(), Some(expected));
        assert_eq!(checksum.hex(), "abcd");
        assert_eq!(checksum.to_string(), token);
    }

    #[rstest]
    #[case::empty("")]
    #[case::non_hex("xyz123")]
    #[case::whitespace("abcd ef")]
    #[case::unknown_prefix("md5:abcd")]
    #[case::empty_after_prefix("sha256:")]
    fn rejects_malformed_tokens(#[case] token: &str) {
        let result = Checksum::try_from(token);
        assert!(
            matches!(result, Err(RecordError::InvalidChecksum { .. })),
            "expected InvalidChecksum for {token:?}"
        );
    }

    #[test]
    fn matching_ignores_case() {
        let checksum = Checksum::try_from("ABCDEF").expect("valid token");
        assert!(checksum.matches("abcdef"));
        assert!(!checksum.matches("abcdee"));
    }

    #[test]
    fn matching_requires_exact_length() {
        let checksum = Checksum::try_from("abcdef").expect("valid token");
        assert!(!checksum.matches("abcdef00"));
        assert!(!checksum.matches("abcd"));
    }

    #[test]
    fn prefix_overrides_configured_algorithm() {
        let checksum = Checksum::try_from("blake3:abcd").expect("valid token");
        assert_eq!(
            checksum.effective_algorithm(DigestAlgorithm::Sha256),
            DigestAlgorithm::Blake3
        );
        let plain = Checksum::try_from("abcd").expect("valid token");
        assert_eq!(
            plain.effective_algorithm(DigestAlgorithm::Sha512),
            DigestAlgorithm::Sha512
        );
    }

    #[test]
    fn cache_component_is_lowercase_and_prefixed() {
        let checksum = Checksum::try_from("sha256:ABCD").expect("valid token");
        assert_eq!(checksum.cache_component(), "sha256-abcd");
    }
}
