//! Digest algorithms used to verify artifact bytes.
//!
//! The algorithm that produced a pinned checksum is configuration rather
//! than an assumption, so the resolver supports several and hashes through a
//! single streaming interface. All digests are rendered as lowercase hex.

use crate::record::error::RecordError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

const READ_BUFFER_LEN: usize = 8192;

/// A supported digest algorithm.
///
/// # Examples
///
/// ```
/// use artifact_resolver::digest::DigestAlgorithm;
///
/// let hex = DigestAlgorithm::Sha256.digest_bytes(b"abc");
/// assert_eq!(
///     hex,
///     "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
/// );
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-256 (the default).
    #[default]
    Sha256,
    /// SHA-512.
    Sha512,
    /// BLAKE3 with the default 32-byte output.
    Blake3,
}

impl DigestAlgorithm {
    /// Every supported algorithm, in display order.
    pub const ALL: [Self; 3] = [Self::Sha256, Self::Sha512, Self::Blake3];

    /// Return the lowercase algorithm name used in tokens and configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Blake3 => "blake3",
        }
    }

    /// Hash an in-memory buffer and return the lowercase hex digest.
    #[must_use]
    pub fn digest_bytes(self, bytes: &[u8]) -> String {
        let mut digester = Digester::new(self);
        digester.update(bytes);
        digester.finalize_hex()
    }

    /// Hash everything readable from `reader`.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while reading.
    pub fn digest_reader<R: Read>(self, reader: &mut R) -> io::Result<String> {
        let mut digester = Digester::new(self);
        let mut buffer = [0u8; READ_BUFFER_LEN];
        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            digester.update(&buffer[..bytes_read]);
        }
        Ok(digester.finalize_hex())
    }

    /// Hash the file at `path` in chunks.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn digest_file(self, path: &Path) -> io::Result<String> {
        let mut file = fs::File::open(path)?;
        self.digest_reader(&mut file)
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = RecordError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| RecordError::UnknownAlgorithm {
                value: value.to_owned(),
                expected: Self::ALL.map(Self::as_str).join(", "),
            })
    }
}

/// Incremental hasher over any supported algorithm.
enum Digester {
    Sha256(Sha256),
    Sha512(Sha512),
    Blake3(Box<blake3::Hasher>),
}

impl Digester {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            DigestAlgorithm::Sha512 => Self::Sha512(Sha512::new()),
            DigestAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Sha256(hasher) => hasher.update(bytes),
            Self::Sha512(hasher) => hasher.update(bytes),
            Self::Blake3(hasher) => {
                hasher.update(bytes);
            }
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Self::Sha256(hasher) => format!("{:x}", hasher.finalize()),
            Self::Sha512(hasher) => format!("{:x}", hasher.finalize()),
            Self::Blake3(hasher) => hasher.finalize().to_hex().to_string(),
        }
    }
}
