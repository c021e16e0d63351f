//! Artifact resolution: record in, verified bytes out.
//!
//! [`Resolver::resolve`] turns one [`ArtifactRecord`] into a
//! [`ResolvedArtifact`] or a typed [`ResolveError`]. Resolution is
//! all-or-nothing: bytes that fail verification are discarded and never
//! reach the caller or the cache.
//!
//! Each request moves through [`ResolutionState`]s:
//! `Pending → Fetching → Verifying → Verified | Failed(kind)`. A corrupt
//! cache entry repeats `Fetching → Verifying` for the refetch. There are no
//! automatic retries; every call is independent.

use crate::cache::{ArtifactCache, CacheKey};
use crate::cancel::CancellationToken;
use crate::config::{ConfigError, ResolverConfig};
use crate::dirs::BaseDirs;
use crate::error::{ErrorKind, ResolveError, Result};
use crate::fetch::{ByteFetcher, FetchError, HttpFetcher};
use crate::record::{ArtifactRecord, ArtifactSource, Checksum};
use crate::verification::VerificationPolicy;
use camino::Utf8Path;
use std::fmt;
use std::path::Path;
use tempfile::NamedTempFile;

/// Where the bytes of a [`ResolvedArtifact`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactOrigin {
    /// Read from a local path.
    Local,
    /// Downloaded from the record's URL.
    Remote,
    /// Served from the artifact cache.
    Cache,
}

impl fmt::Display for ArtifactOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Remote => "remote",
            Self::Cache => "cache",
        })
    }
}

/// Verified artifact bytes and the record they satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    bytes: Vec<u8>,
    record: ArtifactRecord,
    origin: ArtifactOrigin,
    digest: Option<String>,
}

impl ResolvedArtifact {
    /// Return the artifact bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the artifact and return its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Return the record the bytes were resolved from.
    #[must_use]
    pub const fn record(&self) -> &ArtifactRecord {
        &self.record
    }

    /// Return where the bytes came from.
    #[must_use]
    pub const fn origin(&self) -> ArtifactOrigin {
        self.origin
    }

    /// Return the computed digest, or `None` when verification was skipped.
    #[must_use]
    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// Return true when the bytes were checked against a pinned checksum.
    #[must_use]
    pub const fn is_verified(&self) -> bool {
        self.digest.is_some()
    }
}

/// Lifecycle of a single resolution request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionState {
    /// The request has been accepted.
    Pending,
    /// Bytes are being read or downloaded.
    Fetching,
    /// Bytes are being checked against the pinned checksum.
    Verifying,
    /// The request succeeded.
    Verified,
    /// The request failed with the given kind of error.
    Failed(ErrorKind),
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Fetching => f.write_str("fetching"),
            Self::Verifying => f.write_str("verifying"),
            Self::Verified => f.write_str("verified"),
            Self::Failed(kind) => write!(f, "failed ({kind})"),
        }
    }
}

/// Receives state transitions while a record resolves.
pub trait ResolutionObserver {
    /// Called on every transition of `record`'s request.
    fn on_transition(&mut self, record: &ArtifactRecord, state: ResolutionState);
}

impl ResolutionObserver for () {
    fn on_transition(&mut self, _record: &ArtifactRecord, _state: ResolutionState) {}
}

impl ResolutionObserver for Vec<ResolutionState> {
    fn on_transition(&mut self, _record: &ArtifactRecord, state: ResolutionState) {
        self.push(state);
    }
}

/// Resolves artifact records through a [`ByteFetcher`].
///
/// The resolver holds no mutable state; share it across threads to resolve
/// records in parallel.
///
/// # Examples
///
/// ```no_run
/// use artifact_resolver::fetch::HttpFetcher;
/// use artifact_resolver::record::ArtifactRecord;
/// use artifact_resolver::resolver::Resolver;
///
/// let record = ArtifactRecord::remote(
///     "stx2btcFFI".try_into().expect("valid name"),
///     "0.4.1".parse().expect("valid version"),
///     "https://example.test/stx2btc.xcframework.zip",
///     "9d2b9eec".parse().expect("valid checksum"),
/// );
/// let artifact = Resolver::new(HttpFetcher::default())
///     .resolve(&record)
///     .expect("resolution failed");
/// assert!(artifact.is_verified());
/// ```
#[derive(Debug, Clone)]
pub struct Resolver<F: ByteFetcher = HttpFetcher> {
    fetcher: F,
    cache: Option<ArtifactCache>,
    policy: VerificationPolicy,
}

impl Resolver<HttpFetcher> {
    /// Build an HTTP-backed resolver from configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when caching is enabled but no cache
    /// directory can be determined.
    pub fn from_config(
        config: &ResolverConfig,
        dirs: &dyn BaseDirs,
    ) -> std::result::Result<Self, ConfigError> {
        let resolver =
            Self::new(HttpFetcher::new(config.timeout())).with_policy(config.policy());
        Ok(match config.cache(dirs)? {
            Some(cache) => resolver.with_cache(cache),
            None => resolver,
        })
    }
}

impl<F: ByteFetcher> Resolver<F> {
    /// Build an uncached resolver with the default verification policy.
    #[must_use]
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            cache: None,
            policy: VerificationPolicy::default(),
        }
    }

    /// Cache verified remote artifacts in `cache`.
    #[must_use]
    pub fn with_cache(mut self, cache: ArtifactCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Verify with `policy`.
    #[must_use]
    pub fn with_policy(mut self, policy: VerificationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Return the byte fetcher.
    #[must_use]
    pub const fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Return the cache, if configured.
    #[must_use]
    pub const fn cache(&self) -> Option<&ArtifactCache> {
        self.cache.as_ref()
    }

    /// Return the verification policy.
    #[must_use]
    pub const fn policy(&self) -> VerificationPolicy {
        self.policy
    }

    /// Resolve `record` to verified bytes.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::MalformedRecord`] before any I/O for invalid records.
    /// - [`ResolveError::NotFound`] for a missing path or a 404.
    /// - [`ResolveError::Network`] for transport failures.
    /// - [`ResolveError::Integrity`] when the bytes do not match the checksum.
    /// - [`ResolveError::Io`] for other local read failures.
    pub fn resolve(&self, record: &ArtifactRecord) -> Result<ResolvedArtifact> {
        self.resolve_with(record, &CancellationToken::new(), &mut ())
    }

    /// Resolve `record`, honouring `cancel` and reporting transitions to
    /// `observer`.
    ///
    /// # Errors
    ///
    /// As [`Self::resolve`], plus [`ResolveError::Cancelled`] when `cancel`
    /// fires during a download.
    pub fn resolve_with(
        &self,
        record: &ArtifactRecord,
        cancel: &CancellationToken,
        observer: &mut dyn ResolutionObserver,
    ) -> Result<ResolvedArtifact> {
        let mut run = Run { record, observer };
        run.transition(ResolutionState::Pending);
        let result = self.run(&mut run, cancel);
        match &result {
            Ok(_) => run.transition(ResolutionState::Verified),
            Err(err) => run.transition(ResolutionState::Failed(err.kind())),
        }
        result
    }

    fn run(&self, run: &mut Run<'_>, cancel: &CancellationToken) -> Result<ResolvedArtifact> {
        let record = run.record;
        record.validate()?;
        match record.source() {
            ArtifactSource::LocalPath(path) => self.resolve_local(run, path),
            ArtifactSource::Remote { url } => {
                let Some(checksum) = record.checksum() else {
                    return Err(ResolveError::MalformedRecord {
                        name: format!("{} {}", record.name(), record.version()),
                        reason: "remote source requires a checksum".to_owned(),
                    });
                };
                let key = CacheKey::new(
                    record.name().clone(),
                    record.version().clone(),
                    checksum.clone(),
                );
                if let Some(hit) = self.cached(run, &key) {
                    return Ok(hit);
                }
                self.resolve_remote(run, url, &key, cancel)
            }
        }
    }

    fn resolve_local(&self, run: &mut Run<'_>, path: &Utf8Path) -> Result<ResolvedArtifact> {
        let record = run.record;
        run.transition(ResolutionState::Fetching);
        let bytes = std::fs::read(path.as_std_path()).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ResolveError::NotFound {
                    location: path.to_string(),
                }
            } else {
                ResolveError::Io {
                    path: path.to_string(),
                    source,
                }
            }
        })?;
        let digest = match record.checksum() {
            Some(checksum) if self.policy.should_verify(false, true) => {
                run.transition(ResolutionState::Verifying);
                Some(self.verify(record, checksum, &bytes)?)
            }
            _ => None,
        };
        Ok(ResolvedArtifact {
            bytes,
            record: record.clone(),
            origin: ArtifactOrigin::Local,
            digest,
        })
    }

    /// Serve `key` from the cache when an intact entry exists.
    ///
    /// Corrupt entries are evicted; cache read failures count as misses.
    fn cached(&self, run: &mut Run<'_>, key: &CacheKey) -> Option<ResolvedArtifact> {
        let cache = self.cache.as_ref()?;
        let record = run.record;
        let bytes = match cache.lookup(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(err) => {
                log::warn!("ignoring unreadable cache entry for {record}: {err}");
                return None;
            }
        };
        run.transition(ResolutionState::Fetching);
        run.transition(ResolutionState::Verifying);
        let actual = self.digest_for(key.checksum(), &bytes);
        if key.checksum().matches(&actual) {
            log::debug!("cache hit for {record}");
            return Some(ResolvedArtifact {
                bytes,
                record: record.clone(),
                origin: ArtifactOrigin::Cache,
                digest: Some(actual),
            });
        }
        log::warn!(
            "evicting corrupt cache entry {} for {record}",
            cache.entry_path(key)
        );
        if let Err(err) = cache.evict(key) {
            log::warn!("failed to evict corrupt cache entry: {err}");
        }
        None
    }

    fn resolve_remote(
        &self,
        run: &mut Run<'_>,
        url: &str,
        key: &CacheKey,
        cancel: &CancellationToken,
    ) -> Result<ResolvedArtifact> {
        let record = run.record;
        run.transition(ResolutionState::Fetching);
        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled {
                url: url.to_owned(),
            });
        }
        let (staged, cacheable) = self.staging_file(key)?;
        self.fetcher
            .fetch(url, staged.path(), cancel)
            .map_err(|err| map_fetch_error(err, staged.path()))?;
        let bytes = std::fs::read(staged.path()).map_err(|source| ResolveError::Io {
            path: staged.path().display().to_string(),
            source,
        })?;

        run.transition(ResolutionState::Verifying);
        let digest = self.verify(record, key.checksum(), &bytes)?;

        if let Some(cache) = self.cache.as_ref().filter(|_| cacheable) {
            match cache.commit(staged, key) {
                Ok(path) => log::debug!("cached {record} at {path}"),
                Err(err) => log::warn!("failed to cache {record}: {err}"),
            }
        }
        Ok(ResolvedArtifact {
            bytes,
            record: record.clone(),
            origin: ArtifactOrigin::Remote,
            digest: Some(digest),
        })
    }

    /// Create the download destination, inside the cache entry directory
    /// when possible so the verified file can be renamed into place.
    fn staging_file(&self, key: &CacheKey) -> Result<(NamedTempFile, bool)> {
        if let Some(cache) = &self.cache {
            match cache.stage(key) {
                Ok(staged) => return Ok((staged, true)),
                Err(err) => log::warn!("caching disabled for this download: {err}"),
            }
        }
        let staged = NamedTempFile::new().map_err(|source| ResolveError::Io {
            path: std::env::temp_dir().display().to_string(),
            source,
        })?;
        Ok((staged, false))
    }

    fn digest_for(&self, checksum: &Checksum, bytes: &[u8]) -> String {
        checksum
            .effective_algorithm(self.policy.algorithm())
            .digest_bytes(bytes)
    }

    fn verify(&self, record: &ArtifactRecord, checksum: &Checksum, bytes: &[u8]) -> Result<String> {
        let actual = self.digest_for(checksum, bytes);
        if checksum.matches(&actual) {
            return Ok(actual);
        }
        log::warn!("integrity check failed for {record}: expected {checksum}, got {actual}");
        Err(ResolveError::Integrity {
            name: record.name().to_string(),
            version: record.version().to_string(),
            expected: checksum.to_string(),
            actual,
        })
    }
}

/// Per-request context reporting transitions.
struct Run<'a> {
    record: &'a ArtifactRecord,
    observer: &'a mut dyn ResolutionObserver,
}

impl Run<'_> {
    fn transition(&mut self, state: ResolutionState) {
        log::debug!("{}: {state}", self.record);
        self.observer.on_transition(self.record, state);
    }
}

fn map_fetch_error(err: FetchError, dest: &Path) -> ResolveError {
    match err {
        FetchError::Http { url, reason } => ResolveError::Network { url, reason },
        FetchError::NotFound { url } => ResolveError::NotFound { location: url },
        FetchError::Cancelled { url } => ResolveError::Cancelled { url },
        FetchError::Io(source) => ResolveError::Io {
            path: dest.display().to_string(),
            source,
        },
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
