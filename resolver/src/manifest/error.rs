//! Error types for manifest loading and validation.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors arising from reading, parsing, or validating a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read manifest {path}: {source}")]
    Read {
        /// Path of the manifest file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or field validation failed.
    #[error("manifest parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A schema version is outside the accepted range.
    #[error("unsupported manifest schema version {value}; current maximum is {max}")]
    UnsupportedSchemaVersion {
        /// The rejected version number.
        value: u32,
        /// The highest version this build understands.
        max: u32,
    },

    /// A package declaration violates a structural rule.
    #[error("invalid package {package}: {reason}")]
    InvalidPackage {
        /// Name and version of the offending package.
        package: String,
        /// Description of the violated rule.
        reason: String,
    },
}

/// Result type alias using [`ManifestError`].
pub type Result<T> = std::result::Result<T, ManifestError>;
