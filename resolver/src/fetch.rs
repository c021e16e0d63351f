//! Byte-fetch capability for remote artifacts.
//!
//! Provides a trait-based abstraction over HTTP GET so the resolver can be
//! exercised without network access, plus the production implementation
//! backed by `ureq`. Bodies are streamed to a destination file in chunks,
//! checking a [`CancellationToken`] between chunks.

use crate::cancel::CancellationToken;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

/// Default network timeout for artifact downloads.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const COPY_BUFFER_LEN: usize = 8192;

/// Trait for fetching a remote object into a local file.
///
/// # Examples
///
/// ```
/// use artifact_resolver::fetch::{DEFAULT_TIMEOUT, HttpFetcher};
///
/// let fetcher = HttpFetcher::new(DEFAULT_TIMEOUT);
/// // fetcher.fetch(url, dest, &token) in production
/// # let _ = fetcher;
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ByteFetcher {
    /// Fetch `url` and write its body to `dest`, truncating any content.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NotFound`] for a missing object,
    /// [`FetchError::Http`] for other transport failures,
    /// [`FetchError::Cancelled`] when `cancel` fires mid-transfer, and
    /// [`FetchError::Io`] when writing `dest` fails.
    fn fetch(&self, url: &str, dest: &Path, cancel: &CancellationToken)
    -> Result<u64, FetchError>;
}

/// Errors arising from fetch operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request failed in transport or returned an error status.
    #[error("download failed for {url}: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested object was not found (HTTP 404).
    #[error("artifact not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// The transfer was cancelled before completion.
    #[error("download of {url} cancelled")]
    Cancelled {
        /// The URL whose transfer was cancelled.
        url: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP-based fetcher using `ureq`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Build a fetcher whose requests time out after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl ByteFetcher for HttpFetcher {
    fn fetch(
        &self,
        url: &str,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled {
                url: url.to_owned(),
            });
        }
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut file = File::create(dest)?;
        let mut body = response.into_body();
        copy_with_cancel(url, &mut body.as_reader(), &mut file, cancel)
    }
}

/// Stream `reader` into `writer`, stopping as soon as `cancel` fires.
///
/// Read failures are reported as [`FetchError::Http`] because they surface
/// while the body is still in transit; write failures are [`FetchError::Io`].
///
/// # Errors
///
/// Returns [`FetchError::Cancelled`] if the token is set before or between
/// chunks.
pub fn copy_with_cancel(
    url: &str,
    reader: &mut dyn Read,
    writer: &mut dyn Write,
    cancel: &CancellationToken,
) -> Result<u64, FetchError> {
    let mut buffer = [0u8; COPY_BUFFER_LEN];
    let mut written: u64 = 0;
    loop {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled {
                url: url.to_owned(),
            });
        }
        let bytes_read = reader.read(&mut buffer).map_err(|e| FetchError::Http {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        if bytes_read == 0 {
            break;
        }
        writer.write_all(&buffer[..bytes_read])?;
        written = written.saturating_add(bytes_read as u64);
    }
    writer.flush()?;
    Ok(written)
}

/// Map a ureq error to a [`FetchError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(404) => FetchError::NotFound {
            url: url.to_owned(),
        },
        other => FetchError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
