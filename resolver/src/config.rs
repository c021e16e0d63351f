//! Resolver configuration loaded from TOML with environment overrides.
//!
//! Settings come from `<config_dir>/config.toml` when present and fall back
//! to defaults otherwise. `ARTIFACT_RESOLVER_CACHE_DIR` overrides the cache
//! directory from the environment.

use crate::cache::ArtifactCache;
use crate::digest::DigestAlgorithm;
use crate::dirs::BaseDirs;
use crate::verification::VerificationPolicy;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding the cache directory.
pub const CACHE_DIR_ENV: &str = "ARTIFACT_RESOLVER_CACHE_DIR";

/// File name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors arising from loading or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    Read {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML or has unknown keys.
    #[error("configuration parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A setting holds an unusable value.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Description of the problem.
        reason: String,
    },

    /// Caching is enabled but no cache directory could be determined.
    #[error("could not determine a cache directory; set cache_dir or {CACHE_DIR_ENV}")]
    NoCacheDir,

    /// A platform directory is not valid UTF-8.
    #[error("directory is not valid UTF-8: {}", path.display())]
    NonUtf8Dir {
        /// The offending path.
        path: PathBuf,
    },
}

/// Result type alias using [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Settings for a [`crate::resolver::Resolver`].
///
/// # Examples
///
/// ```
/// use artifact_resolver::config::ResolverConfig;
///
/// let config = ResolverConfig::parse("timeout_secs = 5").expect("valid config");
/// assert_eq!(config.timeout_secs, 5);
/// assert!(config.cache_enabled);
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Cache directory; the platform cache directory when absent.
    pub cache_dir: Option<Utf8PathBuf>,
    /// Whether verified remote artifacts are cached.
    pub cache_enabled: bool,
    /// Digest algorithm for checksum tokens without a prefix.
    pub algorithm: DigestAlgorithm,
    /// Network timeout for a whole download, in seconds.
    pub timeout_secs: u64,
    /// Whether local-path artifacts carrying a checksum are verified.
    pub verify_local: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            cache_enabled: true,
            algorithm: DigestAlgorithm::default(),
            timeout_secs: 30,
            verify_local: true,
        }
    }
}

impl ResolverConfig {
    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
    /// [`ConfigError::Invalid`] for a zero timeout.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        if config.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                reason: "timeout_secs must be greater than zero".to_owned(),
            });
        }
        Ok(config)
    }

    /// Read configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise
    /// the errors of [`Self::parse`].
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path.as_std_path()).map_err(|source| ConfigError::Read {
                path: path.to_owned(),
                source,
            })?;
        Self::parse(&contents)
    }

    /// Read `<config_dir>/config.toml`, or return defaults when it is absent.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::load`] for a file that exists.
    pub fn load_default(dirs: &dyn BaseDirs) -> Result<Self> {
        let Some(dir) = dirs.config_dir() else {
            return Ok(Self::default());
        };
        let path = utf8_dir(dir)?.join(CONFIG_FILE_NAME);
        if path.exists() {
            log::debug!("loading resolver configuration from {path}");
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`.
    ///
    /// A blank `ARTIFACT_RESOLVER_CACHE_DIR` is ignored.
    #[must_use]
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(CACHE_DIR_ENV).filter(|value| !value.trim().is_empty()) {
            self.cache_dir = Some(Utf8PathBuf::from(dir));
        }
        self
    }

    /// Return the verification policy these settings describe.
    #[must_use]
    pub const fn policy(&self) -> VerificationPolicy {
        VerificationPolicy::new(self.algorithm, self.verify_local)
    }

    /// Return the download timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Return the cache directory, or `None` when caching is disabled.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoCacheDir`] when caching is enabled but
    /// neither an explicit nor a platform directory is available.
    pub fn cache_dir(&self, dirs: &dyn BaseDirs) -> Result<Option<Utf8PathBuf>> {
        if !self.cache_enabled {
            return Ok(None);
        }
        if let Some(dir) = &self.cache_dir {
            return Ok(Some(dir.clone()));
        }
        let dir = dirs.cache_dir().ok_or(ConfigError::NoCacheDir)?;
        utf8_dir(dir).map(Some)
    }

    /// Build the artifact cache these settings describe.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::cache_dir`].
    pub fn cache(&self, dirs: &dyn BaseDirs) -> Result<Option<ArtifactCache>> {
        Ok(self.cache_dir(dirs)?.map(ArtifactCache::new))
    }
}

fn utf8_dir(path: PathBuf) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).map_err(|path| ConfigError::NonUtf8Dir { path })
}
