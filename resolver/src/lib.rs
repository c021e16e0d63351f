//! Pinned binary artifact resolver.
//!
//! This crate turns declarative release records (a binary module bound to a
//! local path, or to a remote URL plus checksum) into verified bytes. It is
//! used by the `artifact-resolver` CLI binary and by packages that ship a
//! precompiled module behind a pass-through library target.
//!
//! # Modules
//!
//! - [`cache`] - Content cache keyed by name, version, and checksum
//! - [`cancel`] - Cooperative cancellation for in-flight downloads
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Resolver configuration and environment overrides
//! - [`digest`] - Supported digest algorithms
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`error`] - Resolution error taxonomy
//! - [`fetch`] - Byte-fetch capability and the HTTP implementation
//! - [`manifest`] - Package manifest schema, parsing, and validation
//! - [`output`] - Output formatting for the CLI
//! - [`record`] - Artifact record data model
//! - [`resolver`] - The resolve operation and its state machine
//! - [`selection`] - Version constraints and release selection
//! - [`verification`] - Verification policy
//!
//! # Example
//!
//! ```
//! use artifact_resolver::manifest::parse_manifest;
//! use artifact_resolver::selection::VersionConstraint;
//!
//! let manifest = parse_manifest(concat!(
//!     "schema_version = 1\n",
//!     "[[package]]\nname = \"stx2btc\"\nversion = \"0.4.1\"\n",
//!     "[[package.targets]]\nkind = \"binary\"\nname = \"stx2btcFFI\"\n",
//!     "url = \"https://example.test/stx2btc.xcframework.zip\"\n",
//!     "checksum = \"9d2b9eec\"\n",
//! ))
//! .expect("valid manifest");
//! let record = manifest
//!     .select("stx2btcFFI", &VersionConstraint::Latest)
//!     .expect("a release");
//! assert_eq!(record.version().to_string(), "0.4.1");
//! ```

pub mod cache;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod digest;
pub mod dirs;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod output;
pub mod record;
pub mod resolver;
pub mod selection;
pub mod verification;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use error::{ErrorKind, ResolveError};
pub use record::ArtifactRecord;
pub use resolver::{ResolvedArtifact, Resolver};
