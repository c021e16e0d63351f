//! Error types for artifact record fields.
//!
//! Each variant names the rejected input and the constraint it violated.

use thiserror::Error;

/// Errors arising from invalid artifact record values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// An artifact name is empty or contains unsupported characters.
    #[error("invalid artifact name \"{value}\": {reason}")]
    InvalidName {
        /// The rejected name.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// A release version does not follow `MAJOR.MINOR.PATCH[-pre][+build]`.
    #[error("invalid release version \"{value}\": {reason}")]
    InvalidVersion {
        /// The rejected version string.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// A checksum token is empty, names an unknown algorithm, or is not hex.
    #[error("invalid checksum \"{value}\": {reason}")]
    InvalidChecksum {
        /// The rejected checksum token.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// A digest algorithm name is not recognised.
    #[error("unknown digest algorithm \"{value}\"; expected one of: {expected}")]
    UnknownAlgorithm {
        /// The rejected algorithm name.
        value: String,
        /// Comma-separated list of accepted names.
        expected: String,
    },
}

/// Result type alias using [`RecordError`].
pub type Result<T> = std::result::Result<T, RecordError>;
