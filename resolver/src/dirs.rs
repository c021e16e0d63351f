//! Platform base directories for the resolver cache and configuration.
//!
//! The [`BaseDirs`] trait lets callers substitute fixed directories in
//! tests; [`SystemBaseDirs`] asks the operating system via
//! `directories-next`.

use directories_next::ProjectDirs;
use std::path::PathBuf;

const APPLICATION: &str = "artifact-resolver";

/// Source of per-user directories.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// Directory holding cached artifacts.
    fn cache_dir(&self) -> Option<PathBuf>;

    /// Directory holding the resolver configuration file.
    fn config_dir(&self) -> Option<PathBuf>;
}

/// Directories reported by the operating system.
///
/// # Examples
///
/// ```no_run
/// use artifact_resolver::dirs::{BaseDirs, SystemBaseDirs};
///
/// let dirs = SystemBaseDirs::new().expect("failed to initialise directories");
/// let cache = dirs.cache_dir();
/// # let _ = cache;
/// ```
#[derive(Debug, Clone)]
pub struct SystemBaseDirs {
    project: ProjectDirs,
}

impl SystemBaseDirs {
    /// Resolve the platform directories, or `None` when no home directory
    /// is known.
    #[must_use]
    pub fn new() -> Option<Self> {
        ProjectDirs::from("", "", APPLICATION).map(|project| Self { project })
    }
}

impl BaseDirs for SystemBaseDirs {
    fn cache_dir(&self) -> Option<PathBuf> {
        Some(self.project.cache_dir().to_path_buf())
    }

    fn config_dir(&self) -> Option<PathBuf> {
        Some(self.project.config_dir().to_path_buf())
    }
}

/// Fixed directories, used when the platform reports none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedBaseDirs {
    /// Directory returned by [`BaseDirs::cache_dir`].
    pub cache_dir: Option<PathBuf>,
    /// Directory returned by [`BaseDirs::config_dir`].
    pub config_dir: Option<PathBuf>,
}

impl BaseDirs for FixedBaseDirs {
    fn cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir.clone()
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.config_dir.clone()
    }
}
