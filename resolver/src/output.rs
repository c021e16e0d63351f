//! Output formatting for the resolver CLI.
//!
//! Listings are rendered for humans or as JSON; progress and errors go to
//! stderr through [`write_stderr_line`].

use crate::record::ArtifactRecord;
use crate::resolver::ResolvedArtifact;
use crate::selection::{RecordSet, VersionConstraint};
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Format the releases in `set` for human-readable output.
///
/// Releases are grouped by artifact, oldest first; the release selected by
/// `active` is marked.
///
/// # Examples
///
/// ```
/// use artifact_resolver::output::format_human;
/// use artifact_resolver::selection::{RecordSet, VersionConstraint};
///
/// let output = format_human(&RecordSet::default(), &VersionConstraint::Latest);
/// assert!(output.contains("No releases declared"));
/// ```
#[must_use]
pub fn format_human(set: &RecordSet, active: &VersionConstraint) -> String {
    if set.is_empty() {
        return String::from("No releases declared.");
    }

    let mut output = String::new();
    for name in set.names() {
        let selected = set.select(name.as_str(), active).ok();
        let _ = writeln!(output, "{name}");
        for record in set.releases(name.as_str()) {
            let marker = if selected == Some(record) { " (active)" } else { "" };
            let _ = writeln!(output, "  {}{marker}", record.version());
            let _ = writeln!(output, "    source:   {}", record.source());
            if let Some(checksum) = record.checksum() {
                let _ = writeln!(output, "    checksum: {checksum}");
            }
        }
    }
    output
}

/// Format the releases in `set` as pretty-printed JSON.
///
/// # Examples
///
/// ```
/// use artifact_resolver::output::format_json;
/// use artifact_resolver::selection::{RecordSet, VersionConstraint};
///
/// let json = format_json(&RecordSet::default(), &VersionConstraint::Latest);
/// assert!(json.contains("\"artifacts\""));
/// ```
#[must_use]
pub fn format_json(set: &RecordSet, active: &VersionConstraint) -> String {
    let listing = ListingJson::from_set(set, active);
    serde_json::to_string_pretty(&listing).unwrap_or_else(|_| "{}".to_owned())
}

/// One line describing a selected record.
#[must_use]
pub fn format_record(record: &ArtifactRecord) -> String {
    match record.checksum() {
        Some(checksum) => format!("{record} checksum {checksum}"),
        None => record.to_string(),
    }
}

/// One line summarising a completed resolution.
#[must_use]
pub fn format_resolution(artifact: &ResolvedArtifact, destination: &str) -> String {
    let record = artifact.record();
    let verification = artifact
        .digest()
        .map_or_else(|| "unverified".to_owned(), |digest| format!("verified {digest}"));
    format!(
        "Resolved {} {} from {} ({}, {} bytes) to {destination}",
        record.name(),
        record.version(),
        artifact.origin(),
        verification,
        artifact.bytes().len(),
    )
}

/// JSON-serializable listing of declared releases.
#[derive(Debug, Serialize)]
pub struct ListingJson {
    /// Artifacts in name order.
    pub artifacts: Vec<ArtifactEntry>,
}

/// JSON entry for one artifact.
#[derive(Debug, Serialize)]
pub struct ArtifactEntry {
    /// Artifact name.
    pub name: String,
    /// Version selected by the active constraint, if any.
    pub active: Option<String>,
    /// Releases, oldest first.
    pub releases: Vec<ReleaseEntry>,
}

/// JSON entry for one release.
#[derive(Debug, Serialize)]
pub struct ReleaseEntry {
    /// Release version.
    pub version: String,
    /// `local` or `remote`.
    pub source: &'static str,
    /// Path or URL.
    pub location: String,
    /// Pinned checksum, if any.
    pub checksum: Option<String>,
}

impl ListingJson {
    fn from_set(set: &RecordSet, active: &VersionConstraint) -> Self {
        let artifacts = set
            .names()
            .into_iter()
            .map(|name| ArtifactEntry {
                name: name.to_string(),
                active: set
                    .select(name.as_str(), active)
                    .ok()
                    .map(|record| record.version().to_string()),
                releases: set
                    .releases(name.as_str())
                    .into_iter()
                    .map(ReleaseEntry::from_record)
                    .collect(),
            })
            .collect();
        Self { artifacts }
    }
}

impl ReleaseEntry {
    fn from_record(record: &ArtifactRecord) -> Self {
        Self {
            version: record.version().to_string(),
            source: if record.source().is_remote() {
                "remote"
            } else {
                "local"
            },
            location: record.source().location(),
            checksum: record.checksum().map(ToString::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::remote_record;
    use serde_json::Value;

    fn sample_set() -> RecordSet {
        let record = |version: &str, checksum: &str| {
            remote_record(
                "stx2btcFFI",
                version,
                &format!("https://example.test/{version}.zip"),
                checksum.parse().expect("valid checksum"),
            )
        };
        RecordSet::new([record("0.4.0", "9d2b"), record("0.4.1", "0401")]).expect("valid set")
    }

    #[test]
    fn human_listing_marks_active_release() {
        let output = format_human(&sample_set(), &VersionConstraint::Latest);
        assert!(output.starts_with("stx2btcFFI\n"));
        assert!(output.contains("  0.4.0\n"));
        assert!(output.contains("  0.4.1 (active)\n"));
        assert!(output.contains("checksum: 9d2b"));
    }

    #[test]
    fn json_listing_reports_releases() {
        let json = format_json(&sample_set(), &"0.4.0".parse().expect("valid constraint"));
        let parsed: Value = serde_json::from_str(&json).expect("valid JSON");
        let artifact = &parsed["artifacts"][0];
        assert_eq!(artifact["name"], "stx2btcFFI");
        assert_eq!(artifact["active"], "0.4.0");
        assert_eq!(artifact["releases"].as_array().map(Vec::len), Some(2));
        assert_eq!(artifact["releases"][1]["source"], "remote");
        assert_eq!(artifact["releases"][1]["checksum"], "0401");
    }

    #[test]
    fn write_stderr_line_appends_newline() {
        let mut stderr = Vec::new();
        write_stderr_line(&mut stderr, "hello");
        assert_eq!(stderr, b"hello\n");
    }
}
