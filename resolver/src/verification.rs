//! Verification policy for resolved artifact integrity.
//!
//! Remote artifacts are always verified against their pinned checksum; that
//! rule is not configurable. Local paths sit inside the caller's trust
//! boundary, so verifying them is a policy choice captured here as data.

use crate::digest::DigestAlgorithm;
use std::fmt;

/// Policy governing how resolved bytes are verified.
///
/// # Examples
///
/// ```
/// use artifact_resolver::verification::VerificationPolicy;
///
/// let policy = VerificationPolicy::default();
/// assert!(policy.verify_local());
/// assert!(!policy.skipping_local().verify_local());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationPolicy {
    algorithm: DigestAlgorithm,
    verify_local: bool,
}

impl VerificationPolicy {
    /// Construct a policy verifying with `algorithm`.
    #[must_use]
    pub const fn new(algorithm: DigestAlgorithm, verify_local: bool) -> Self {
        Self {
            algorithm,
            verify_local,
        }
    }

    /// Return the algorithm used for tokens without an algorithm prefix.
    #[must_use]
    pub const fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Return whether local-path artifacts with a checksum are verified.
    #[must_use]
    pub const fn verify_local(&self) -> bool {
        self.verify_local
    }

    /// Return a copy of this policy that skips local verification.
    #[must_use]
    pub const fn skipping_local(self) -> Self {
        Self {
            verify_local: false,
            ..self
        }
    }

    /// Return a copy of this policy using `algorithm` by default.
    #[must_use]
    pub const fn with_algorithm(self, algorithm: DigestAlgorithm) -> Self {
        Self { algorithm, ..self }
    }

    /// Decide whether a record should be verified.
    ///
    /// Remote records are always verified; local records only when they
    /// carry a checksum and local verification is enabled.
    #[must_use]
    pub const fn should_verify(&self, is_remote: bool, has_checksum: bool) -> bool {
        is_remote || (has_checksum && self.verify_local)
    }
}

impl Default for VerificationPolicy {
    /// SHA-256 by default, verifying local paths whenever a checksum is pinned.
    fn default() -> Self {
        Self::new(DigestAlgorithm::Sha256, true)
    }
}

impl fmt::Display for VerificationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.verify_local {
            write!(f, "{} verification for remote and local artifacts", self.algorithm)
        } else {
            write!(f, "{} verification for remote artifacts only", self.algorithm)
        }
    }
}
