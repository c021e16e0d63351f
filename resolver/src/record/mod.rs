//! Artifact record data model.
//!
//! - [`artifact_record`] - the `ArtifactRecord` published per release.
//! - [`checksum`] - opaque integrity token (`Checksum`).
//! - [`error`] - field validation errors (`RecordError`).
//! - [`name`] - binary module name newtype (`ArtifactName`).
//! - [`source`] - local path or remote URL (`ArtifactSource`).
//! - [`version`] - release version with semver precedence (`ReleaseVersion`).

pub mod artifact_record;
pub mod checksum;
pub mod error;
pub mod name;
pub mod source;
pub mod version;

pub use artifact_record::ArtifactRecord;
pub use checksum::Checksum;
pub use name::ArtifactName;
pub use source::ArtifactSource;
pub use version::ReleaseVersion;
