//! Error types for artifact resolution.
//!
//! Every failure is returned to the caller as a typed [`ResolveError`]. The
//! coarse [`ErrorKind`] lets callers decide whether a retry makes sense
//! without matching on every field.

use crate::manifest::error::ManifestError;
use std::fmt;
use thiserror::Error;

/// Errors that can occur while selecting or resolving an artifact.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The record violates a data-model invariant; no I/O was attempted.
    #[error("malformed record {name}: {reason}")]
    MalformedRecord {
        /// Name (and version, when known) of the offending record.
        name: String,
        /// Description of the violated invariant.
        reason: String,
    },

    /// The local file or remote object does not exist.
    #[error("artifact not found at {location}")]
    NotFound {
        /// The path or URL that was requested.
        location: String,
    },

    /// A transport failure occurred while fetching a remote artifact.
    #[error("network error fetching {url}: {reason}")]
    Network {
        /// The URL being fetched.
        url: String,
        /// Description of the transport failure.
        reason: String,
    },

    /// The artifact bytes do not match the pinned checksum.
    #[error("integrity check failed for {name} {version}: expected {expected}, got {actual}")]
    Integrity {
        /// Name of the artifact.
        name: String,
        /// Version of the artifact.
        version: String,
        /// The pinned checksum.
        expected: String,
        /// The digest computed over the fetched bytes.
        actual: String,
    },

    /// Two records share the same `(name, version)` pair.
    #[error("duplicate version {version} for artifact {name}")]
    DuplicateVersion {
        /// Name of the artifact.
        name: String,
        /// The duplicated version.
        version: String,
    },

    /// No record satisfies the requested version constraint.
    #[error("no version of {name} matches {constraint}")]
    NoMatchingVersion {
        /// Name of the artifact.
        name: String,
        /// The constraint that matched nothing.
        constraint: String,
    },

    /// Reading a local artifact failed for a reason other than absence.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// The path being read.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An in-flight fetch was cancelled by the caller.
    #[error("fetch of {url} was cancelled")]
    Cancelled {
        /// The URL whose fetch was cancelled.
        url: String,
    },

    /// The manifest could not be loaded or failed validation.
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Coarse classification of a [`ResolveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`ResolveError::MalformedRecord`].
    MalformedRecord,
    /// See [`ResolveError::NotFound`].
    NotFound,
    /// See [`ResolveError::Network`].
    Network,
    /// See [`ResolveError::Integrity`].
    Integrity,
    /// See [`ResolveError::DuplicateVersion`].
    DuplicateVersion,
    /// See [`ResolveError::NoMatchingVersion`].
    NoMatchingVersion,
    /// See [`ResolveError::Io`].
    Io,
    /// See [`ResolveError::Cancelled`].
    Cancelled,
    /// See [`ResolveError::Manifest`].
    Manifest,
}

impl ErrorKind {
    /// Return true when re-invoking with the same input may succeed.
    ///
    /// Only transport failures and cancellations qualify. Integrity failures
    /// are never retryable against the same source.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Cancelled)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::MalformedRecord => "malformed record",
            Self::NotFound => "not found",
            Self::Network => "network error",
            Self::Integrity => "integrity error",
            Self::DuplicateVersion => "duplicate version",
            Self::NoMatchingVersion => "no matching version",
            Self::Io => "I/O error",
            Self::Cancelled => "cancelled",
            Self::Manifest => "manifest error",
        };
        f.write_str(label)
    }
}

impl ResolveError {
    /// Return the coarse classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedRecord { .. } => ErrorKind::MalformedRecord,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Network { .. } => ErrorKind::Network,
            Self::Integrity { .. } => ErrorKind::Integrity,
            Self::DuplicateVersion { .. } => ErrorKind::DuplicateVersion,
            Self::NoMatchingVersion { .. } => ErrorKind::NoMatchingVersion,
            Self::Io { .. } => ErrorKind::Io,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Manifest(_) => ErrorKind::Manifest,
        }
    }
}

/// Result type alias using [`ResolveError`].
pub type Result<T> = std::result::Result<T, ResolveError>;
