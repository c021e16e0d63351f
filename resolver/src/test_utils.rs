//! Shared test utilities for the resolver crate.

use crate::cancel::CancellationToken;
use crate::digest::DigestAlgorithm;
use crate::fetch::{ByteFetcher, FetchError, copy_with_cancel};
use crate::record::{ArtifactName, ArtifactRecord, Checksum, ReleaseVersion};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Computes the lowercase SHA-256 hex digest of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    DigestAlgorithm::Sha256.digest_bytes(bytes)
}

/// Builds a checksum token pinning the SHA-256 digest of `bytes`.
///
/// # Panics
///
/// Never in practice: a computed digest is always valid hex.
pub fn sha256_checksum(bytes: &[u8]) -> Checksum {
    match sha256_hex(bytes).parse() {
        Ok(checksum) => checksum,
        Err(err) => panic!("computed digest rejected: {err}"),
    }
}

/// Builds a remote record for `name` at `version`.
///
/// # Panics
///
/// Panics if `name` or `version` is invalid.
pub fn remote_record(name: &str, version: &str, url: &str, checksum: Checksum) -> ArtifactRecord {
    let Ok(name) = ArtifactName::try_from(name) else {
        panic!("invalid artifact name {name}");
    };
    let Ok(version) = version.parse::<ReleaseVersion>() else {
        panic!("invalid release version {version}");
    };
    ArtifactRecord::remote(name, version, url, checksum)
}

/// Creates a temporary directory and returns it with its UTF-8 path.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or its path is not
/// UTF-8.
pub fn utf8_temp_dir() -> io::Result<(TempDir, Utf8PathBuf)> {
    let temp = tempfile::tempdir()?;
    let path = Utf8PathBuf::try_from(temp.path().to_path_buf()).map_err(io::Error::other)?;
    Ok((temp, path))
}

/// Lists file names under `dir`, recursively, relative to `dir`.
///
/// A missing directory yields an empty list.
pub fn files_under(dir: &Utf8Path) -> Vec<String> {
    let mut found = Vec::new();
    collect_files(dir, dir, &mut found);
    found.sort();
    found
}

fn collect_files(root: &Utf8Path, dir: &Utf8Path, found: &mut Vec<String>) {
    let Ok(entries) = dir.read_dir_utf8() else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, path, found);
        } else if let Ok(relative) = path.strip_prefix(root) {
            found.push(relative.to_string());
        }
    }
}

/// Renders a manifest declaring one `stx2btc` package per release.
///
/// Each release is `(version, url, checksum)` and declares the remote
/// `stx2btcFFI` binary target plus the `stx2btc` pass-through library.
pub fn release_manifest_toml(releases: &[(&str, &str, &str)]) -> String {
    let mut toml = String::from("schema_version = 1\n");
    for (version, url, checksum) in releases {
        // Writing to a String cannot fail.
        let _ = write!(
            toml,
            concat!(
                "\n[[package]]\n",
                "name = \"stx2btc\"\n",
                "version = \"{version}\"\n",
                "platforms = [{{ os = \"ios\", min_version = \"13\" }}, ",
                "{{ os = \"macos\", min_version = \"14\" }}]\n",
                "products = [{{ name = \"stx2btc\", targets = [\"stx2btc\"] }}]\n",
                "\n[[package.targets]]\n",
                "kind = \"binary\"\n",
                "name = \"stx2btcFFI\"\n",
                "url = \"{url}\"\n",
                "checksum = \"{checksum}\"\n",
                "\n[[package.targets]]\n",
                "kind = \"library\"\n",
                "name = \"stx2btc\"\n",
                "dependencies = [\"stx2btcFFI\"]\n",
                "path = \"Sources/stx2btc\"\n",
            ),
            version = version,
            url = url,
            checksum = checksum,
        );
    }
    toml
}

/// Canned behaviour for one URL served by [`StubFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubResponse {
    /// Serve these bytes.
    Body(Vec<u8>),
    /// Fail with [`FetchError::NotFound`].
    NotFound,
    /// Fail with [`FetchError::Http`] carrying this reason.
    Unreachable(String),
    /// Start serving these bytes, then cancel the caller's token.
    CancelMidStream(Vec<u8>),
}

/// An in-memory [`ByteFetcher`] that counts its calls.
///
/// URLs without a canned response are reported as not found.
#[derive(Debug, Default)]
pub struct StubFetcher {
    responses: HashMap<String, StubResponse>,
    calls: AtomicUsize,
}

impl StubFetcher {
    /// Creates a fetcher with no canned responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `bytes` for `url`.
    #[must_use]
    pub fn with_body(self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.with_response(url, StubResponse::Body(bytes.into()))
    }

    /// Serves `response` for `url`.
    #[must_use]
    pub fn with_response(mut self, url: impl Into<String>, response: StubResponse) -> Self {
        self.responses.insert(url.into(), response);
        self
    }

    /// Returns how many fetches have been attempted.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ByteFetcher for StubFetcher {
    fn fetch(
        &self,
        url: &str,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.get(url) {
            None | Some(StubResponse::NotFound) => Err(FetchError::NotFound {
                url: url.to_owned(),
            }),
            Some(StubResponse::Unreachable(reason)) => Err(FetchError::Http {
                url: url.to_owned(),
                reason: reason.clone(),
            }),
            Some(StubResponse::Body(bytes)) => {
                let mut file = File::create(dest)?;
                copy_with_cancel(url, &mut bytes.as_slice(), &mut file, cancel)
            }
            Some(StubResponse::CancelMidStream(bytes)) => {
                let mut file = File::create(dest)?;
                let mut reader = CancellingReader {
                    inner: bytes.as_slice(),
                    token: cancel.clone(),
                };
                copy_with_cancel(url, &mut reader, &mut file, cancel)
            }
        }
    }
}

/// Reader that cancels its token after yielding the first chunk.
struct CancellingReader<'a> {
    inner: &'a [u8],
    token: CancellationToken,
}

impl Read for CancellingReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.token.cancel();
        Ok(n)
    }
}
