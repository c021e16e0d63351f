//! Local content cache for verified remote artifacts.
//!
//! Entries live at `<root>/<name>/<version>/<checksum>`. Downloads are
//! staged in a hidden temp file inside the entry directory and renamed into
//! place only after verification, so an entry path either holds verified
//! bytes or does not exist. Concurrent writers of the same key persist
//! identical content; the last rename wins.

use crate::record::{ArtifactName, ArtifactRecord, Checksum, ReleaseVersion};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::ErrorKind;
use tempfile::NamedTempFile;

/// Prefix for in-progress downloads inside an entry directory.
pub const STAGING_PREFIX: &str = ".partial-";

/// Identity of a cache entry: `(name, version, checksum)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    name: ArtifactName,
    version: ReleaseVersion,
    checksum: Checksum,
}

impl CacheKey {
    /// Construct a key from its parts.
    #[must_use]
    pub const fn new(name: ArtifactName, version: ReleaseVersion, checksum: Checksum) -> Self {
        Self {
            name,
            version,
            checksum,
        }
    }

    /// Derive the key for `record`, or `None` when it carries no checksum.
    #[must_use]
    pub fn for_record(record: &ArtifactRecord) -> Option<Self> {
        record.checksum().map(|checksum| {
            Self::new(
                record.name().clone(),
                record.version().clone(),
                checksum.clone(),
            )
        })
    }

    /// Return the pinned checksum this key was built from.
    #[must_use]
    pub const fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    fn relative_dir(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(self.name.as_str()).join(self.version.to_string())
    }
}

/// Errors arising from cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Creating an entry directory failed.
    #[error("failed to create cache directory {path}: {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading a cache entry failed.
    #[error("failed to read cache entry {path}: {source}")]
    Read {
        /// Entry path that could not be read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Creating a staging file failed.
    #[error("failed to create staging file in {path}: {source}")]
    Stage {
        /// Directory the staging file was created in.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Renaming a staged file into place failed.
    #[error("failed to persist cache entry {path}: {source}")]
    Persist {
        /// Destination entry path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Removing a cache entry failed.
    #[error("failed to remove cache entry {path}: {source}")]
    Remove {
        /// Entry path that could not be removed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// A directory-backed artifact cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCache {
    root: Utf8PathBuf,
}

impl ArtifactCache {
    /// Use `root` as the cache directory. Nothing is created until a write.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Return the cache root directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Return the directory holding entries for `key`'s name and version.
    #[must_use]
    pub fn entry_dir(&self, key: &CacheKey) -> Utf8PathBuf {
        self.root.join(key.relative_dir())
    }

    /// Return the final path of the entry for `key`.
    #[must_use]
    pub fn entry_path(&self, key: &CacheKey) -> Utf8PathBuf {
        self.entry_dir(key).join(key.checksum.cache_component())
    }

    /// Read the entry for `key`, returning `None` on a miss.
    ///
    /// The bytes are returned unverified; callers re-check them.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Read`] if the entry exists but cannot be read.
    pub fn lookup(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.entry_path(key);
        match std::fs::read(path.as_std_path()) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CacheError::Read { path, source }),
        }
    }

    /// Create a hidden staging file beside the entry path for `key`.
    ///
    /// Dropping the returned file without committing deletes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry directory or staging file cannot be
    /// created.
    pub fn stage(&self, key: &CacheKey) -> Result<NamedTempFile, CacheError> {
        let dir = self.entry_dir(key);
        std::fs::create_dir_all(dir.as_std_path()).map_err(|source| {
            CacheError::CreateDirectory {
                path: dir.clone(),
                source,
            }
        })?;
        tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(dir.as_std_path())
            .map_err(|source| CacheError::Stage { path: dir, source })
    }

    /// Atomically rename a verified staging file into the entry path.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Persist`] if the rename fails; the staging file
    /// is removed in that case.
    pub fn commit(&self, staged: NamedTempFile, key: &CacheKey) -> Result<Utf8PathBuf, CacheError> {
        let path = self.entry_path(key);
        staged
            .persist(path.as_std_path())
            .map_err(|e| CacheError::Persist {
                path: path.clone(),
                source: e.error,
            })?;
        Ok(path)
    }

    /// Remove the entry for `key`, returning whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Remove`] if the entry exists but cannot be
    /// deleted.
    pub fn evict(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let path = self.entry_path(key);
        match std::fs::remove_file(path.as_std_path()) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CacheError::Remove { path, source }),
        }
    }
}
