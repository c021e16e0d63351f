//! Manifest parsing and structural validation.
//!
//! Parses the TOML package manifest into a [`ManifestSet`]. Newtype
//! validation (names, versions, checksums, schema version) runs during
//! deserialization; the rules spanning several declarations run afterwards,
//! one package at a time.

use super::error::{ManifestError, Result};
use super::manifest_set::ManifestSet;
use super::schema::{BinaryTarget, LibraryTarget, PackageDeclaration, TargetDecl};
use super::schema_version::SchemaVersion;
use crate::selection::VersionConstraint;
use camino::Utf8Path;
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestDocument {
    schema_version: SchemaVersion,
    #[serde(default)]
    active: VersionConstraint,
    #[serde(default, rename = "package")]
    packages: Vec<PackageDeclaration>,
}

/// Parse a TOML string into a validated [`ManifestSet`].
///
/// Relative local paths stay relative; use [`load_manifest`] to anchor them
/// to the manifest's directory.
///
/// # Errors
///
/// Returns [`ManifestError::Toml`] for syntax and field errors and
/// [`ManifestError::InvalidPackage`] when a declaration breaks a structural
/// rule.
///
/// # Examples
///
/// ```
/// use artifact_resolver::manifest::parse_manifest;
///
/// let toml = r#"
/// schema_version = 1
///
/// [[package]]
/// name = "stx2btc"
/// version = "0.4.1"
///
/// [[package.targets]]
/// kind = "binary"
/// name = "stx2btcFFI"
/// path = "target/stx2btc.xcframework"
/// "#;
/// let manifest = parse_manifest(toml).expect("valid manifest");
/// assert_eq!(manifest.packages().len(), 1);
/// ```
pub fn parse_manifest(contents: &str) -> Result<ManifestSet> {
    let document: ManifestDocument = toml::from_str(contents)?;
    for package in &document.packages {
        validate_package(package)?;
    }
    Ok(ManifestSet::new(
        document.schema_version,
        document.active,
        document.packages,
        None,
    ))
}

/// Read and parse the manifest at `path`.
///
/// Relative local binary paths resolve against the manifest's directory.
///
/// # Errors
///
/// Returns [`ManifestError::Read`] if the file cannot be read, otherwise the
/// errors of [`parse_manifest`].
pub fn load_manifest(path: &Utf8Path) -> Result<ManifestSet> {
    let contents =
        std::fs::read_to_string(path.as_std_path()).map_err(|source| ManifestError::Read {
            path: path.to_owned(),
            source,
        })?;
    let manifest = parse_manifest(&contents)?;
    let base_dir = path.parent().filter(|dir| !dir.as_str().is_empty());
    log::debug!("loaded manifest {path} with {} packages", manifest.packages().len());
    Ok(match base_dir {
        Some(dir) => manifest.with_base_dir(dir.to_owned()),
        None => manifest,
    })
}

fn validate_package(package: &PackageDeclaration) -> Result<()> {
    check_package(package).map_err(|reason| ManifestError::InvalidPackage {
        package: package.label(),
        reason,
    })
}

fn check_package(package: &PackageDeclaration) -> std::result::Result<(), String> {
    let mut target_names = HashSet::new();
    for target in package.targets() {
        if !target_names.insert(target.name()) {
            return Err(format!("target {} is declared more than once", target.name()));
        }
        match target {
            TargetDecl::Binary(binary) => check_binary(binary)?,
            TargetDecl::Library(library) => check_library(package, library)?,
        }
    }
    check_products(package)?;
    check_platforms(package)
}

fn check_binary(target: &BinaryTarget) -> std::result::Result<(), String> {
    let name = target.name();
    match (target.path(), target.url()) {
        (Some(_), Some(_)) => Err(format!("binary target {name} declares both path and url")),
        (None, None) => Err(format!("binary target {name} declares neither path nor url")),
        (Some(path), None) if path.as_str().is_empty() => {
            Err(format!("binary target {name} has an empty path"))
        }
        (None, Some(_)) if target.checksum().is_none() => {
            Err(format!("binary target {name} has a url but no checksum"))
        }
        _ => Ok(()),
    }
}

fn check_library(
    package: &PackageDeclaration,
    library: &LibraryTarget,
) -> std::result::Result<(), String> {
    let name = library.name();
    let [dependency] = library.dependencies() else {
        return Err(format!(
            "library target {name} must depend on exactly one binary target, found {}",
            library.dependencies().len()
        ));
    };
    match package.target(dependency.as_str()) {
        Some(TargetDecl::Binary(_)) => Ok(()),
        Some(other) => Err(format!(
            "library target {name} depends on {} target {dependency}",
            other.kind()
        )),
        None => Err(format!(
            "library target {name} depends on undeclared target {dependency}"
        )),
    }
}

fn check_products(package: &PackageDeclaration) -> std::result::Result<(), String> {
    for product in package.products() {
        if product.name().trim().is_empty() {
            return Err("product name must not be empty".to_owned());
        }
        if product.targets().is_empty() {
            return Err(format!("product {} lists no targets", product.name()));
        }
        if let Some(missing) = product
            .targets()
            .iter()
            .find(|t| package.target(t.as_str()).is_none())
        {
            return Err(format!(
                "product {} references undeclared target {missing}",
                product.name()
            ));
        }
    }
    Ok(())
}

fn check_platforms(package: &PackageDeclaration) -> std::result::Result<(), String> {
    let mut seen = HashSet::new();
    for platform in package.platforms() {
        if platform.os().trim().is_empty() || platform.min_version().trim().is_empty() {
            return Err("platform entries need both os and min_version".to_owned());
        }
        if !seen.insert(platform.os()) {
            return Err(format!("platform {} is listed more than once", platform.os()));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
