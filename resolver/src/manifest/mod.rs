//! Package manifest: the declarative source of published releases.
//!
//! - [`error`] - manifest read, parse and validation errors.
//! - [`manifest_set`] - the loaded manifest and record extraction.
//! - [`parser`] - TOML parsing and structural validation.
//! - [`schema`] - package, target, product and platform declarations.
//! - [`schema_version`] - supported manifest schema versions.

pub mod error;
pub mod manifest_set;
pub mod parser;
pub mod schema;
pub mod schema_version;

pub use error::ManifestError;
pub use manifest_set::ManifestSet;
pub use parser::{load_manifest, parse_manifest};
pub use schema::{BinaryTarget, LibraryTarget, PackageDeclaration, Platform, Product, TargetDecl};
