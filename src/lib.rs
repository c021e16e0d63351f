//! Pass-through package for the prebuilt `stx2btcFFI` binary module.
//!
//! The package ships no logic of its own. Its manifest, `Package.toml`,
//! declares the `stx2btc` library target as a thin wrapper over exactly one
//! binary target, and this crate exposes that manifest together with the
//! resolver that turns a declared release into verified bytes.

use artifact_resolver::error::{ResolveError, Result};
use artifact_resolver::manifest::{ManifestSet, load_manifest, parse_manifest};
use artifact_resolver::record::ArtifactRecord;
use artifact_resolver::selection::VersionConstraint;
use camino::Utf8PathBuf;

pub use artifact_resolver;

/// The package manifest, embedded at build time.
pub const PACKAGE_MANIFEST: &str = include_str!("../Package.toml");

/// Name of the prebuilt binary target.
pub const FFI_TARGET: &str = "stx2btcFFI";

/// Name of the pass-through library target.
pub const LIBRARY_TARGET: &str = "stx2btc";

/// Name of the package declared in the manifest.
pub const PACKAGE_NAME: &str = "stx2btc";

/// Parse the embedded package manifest.
///
/// Local binary paths in the embedded copy are left relative; use
/// [`load_package_manifest`] to resolve them against the package root.
///
/// # Errors
///
/// Returns [`artifact_resolver::error::ResolveError::Manifest`] if the
/// embedded manifest is invalid.
pub fn package_manifest() -> Result<ManifestSet> {
    Ok(parse_manifest(PACKAGE_MANIFEST)?)
}

/// Path of `Package.toml` in the package source tree.
#[must_use]
pub fn package_manifest_path() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("Package.toml")
}

/// Load `Package.toml` from the package source tree.
///
/// # Errors
///
/// Returns [`artifact_resolver::error::ResolveError::Manifest`] if the file
/// cannot be read or is invalid.
pub fn load_package_manifest() -> Result<ManifestSet> {
    Ok(load_manifest(&package_manifest_path())?)
}

/// Select the `stx2btcFFI` release matching `constraint` from `manifest`.
///
/// The binary is reached through the library target's single dependency, so
/// a manifest whose library target does not pass through to a binary is
/// reported as malformed.
///
/// # Errors
///
/// Returns [`artifact_resolver::error::ResolveError::MalformedRecord`] when
/// no release wires the library to the binary, and the errors of
/// [`ManifestSet::select`] otherwise.
pub fn ffi_record(manifest: &ManifestSet, constraint: &VersionConstraint) -> Result<ArtifactRecord> {
    let record = manifest.select(FFI_TARGET, constraint)?;
    let wired = manifest
        .package(PACKAGE_NAME, &record.version().to_string())
        .and_then(|package| package.pass_through(LIBRARY_TARGET))
        .is_some_and(|binary| binary.name().as_str() == FFI_TARGET);
    if wired {
        Ok(record)
    } else {
        Err(ResolveError::MalformedRecord {
            name: format!("{PACKAGE_NAME} {}", record.version()),
            reason: format!("{LIBRARY_TARGET} does not pass through to {FFI_TARGET}"),
        })
    }
}
