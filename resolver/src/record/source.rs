//! Where an artifact's bytes come from.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The location of a published artifact.
///
/// Local paths sit inside the caller's trust boundary; remote sources are
/// fetched over HTTP and must always carry a checksum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactSource {
    /// A file on the local filesystem.
    LocalPath(Utf8PathBuf),
    /// A remote object addressed by URL.
    Remote {
        /// The `http://` or `https://` URL of the artifact.
        url: String,
    },
}

impl ArtifactSource {
    /// Return true for [`ArtifactSource::Remote`].
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Return the path or URL as a display string.
    #[must_use]
    pub fn location(&self) -> String {
        match self {
            Self::LocalPath(path) => path.to_string(),
            Self::Remote { url } => url.clone(),
        }
    }

    /// Check the source's own shape, returning a reason when it is unusable.
    pub(crate) fn defect(&self) -> Option<String> {
        match self {
            Self::LocalPath(path) if path.as_str().is_empty() => {
                Some("local path must not be empty".to_owned())
            }
            Self::LocalPath(_) => None,
            Self::Remote { url } => url_defect(url),
        }
    }
}

fn url_defect(url: &str) -> Option<String> {
    let remainder = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match remainder {
        None => Some(format!("URL \"{url}\" must use http:// or https://")),
        Some("") => Some(format!("URL \"{url}\" has no host")),
        Some(rest) if rest.chars().any(char::is_whitespace) => {
            Some(format!("URL \"{url}\" contains whitespace"))
        }
        Some(_) => None,
    }
}

impl fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalPath(path) => write!(f, "path {path}"),
            Self::Remote { url } => write!(f, "url {url}"),
        }
    }
}
