//! CLI argument definitions for the artifact resolver.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint so parsing can be tested without running
//! commands.

use crate::digest::DigestAlgorithm;
use crate::selection::VersionConstraint;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

/// Default manifest file name looked up in the current directory.
pub const DEFAULT_MANIFEST: &str = "Package.toml";

/// Resolve pinned binary artifacts declared in a package manifest.
#[derive(Parser, Debug)]
#[command(name = "artifact-resolver")]
#[command(version, about)]
#[command(long_about = concat!(
    "Resolve pinned binary artifacts declared in a package manifest.\n\n",
    "Each release binds a binary module to a local path or to a remote URL ",
    "plus checksum. Remote artifacts are always verified before they are ",
    "written out or cached; a checksum mismatch is an error, never a warning.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  List every release in ./Package.toml:\n",
    "    $ artifact-resolver list\n\n",
    "  Show the release selected by a constraint:\n",
    "    $ artifact-resolver select -a stx2btcFFI -c '<=0.4.0'\n\n",
    "  Fetch, verify, and write the active release:\n",
    "    $ artifact-resolver resolve -a stx2btcFFI -o stx2btc.xcframework.zip\n\n",
    "  Compute the checksum to pin for a new release:\n",
    "    $ artifact-resolver digest stx2btc.xcframework.zip",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Map `-q` and `-v` flags onto a log level.
    #[must_use]
    pub const fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List every release declared in the manifest.
    List(ListArgs),

    /// Show the release a constraint selects.
    Select(SelectArgs),

    /// Fetch, verify, and write out a release.
    Resolve(ResolveArgs),

    /// Compute the checksum of a local file.
    Digest(DigestArgs),
}

/// Manifest location shared by the manifest-reading commands.
#[derive(Args, Debug, Clone)]
pub struct ManifestArgs {
    /// Package manifest to read.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_MANIFEST)]
    pub manifest: Utf8PathBuf,
}

/// Arguments for the list command.
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Manifest selection.
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Output in JSON format.
    #[arg(long)]
    pub json: bool,
}

/// Artifact and constraint shared by select and resolve.
#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Binary artifact name (for example `stx2btcFFI`).
    #[arg(short, long, value_name = "NAME")]
    pub artifact: String,

    /// Version constraint: `latest`, `X.Y.Z`, `=X.Y.Z` or `<=X.Y.Z`
    /// [default: the manifest's active constraint].
    #[arg(short, long, value_name = "CONSTRAINT")]
    pub constraint: Option<VersionConstraint>,
}

/// Arguments for the select command.
#[derive(Args, Debug, Clone)]
pub struct SelectArgs {
    /// Manifest selection.
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Release selection.
    #[command(flatten)]
    pub selection: SelectionArgs,
}

/// Arguments for the resolve command.
#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Manifest selection.
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Release selection.
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// File to write the verified bytes to.
    #[arg(short, long, value_name = "FILE")]
    pub output: Utf8PathBuf,

    /// Bypass the artifact cache.
    #[arg(long, conflicts_with = "cache_dir")]
    pub no_cache: bool,

    /// Cache directory [default: platform-specific].
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<Utf8PathBuf>,

    /// Resolver configuration file [default: platform config directory].
    #[arg(long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,
}

/// Arguments for the digest command.
#[derive(Args, Debug, Clone)]
pub struct DigestArgs {
    /// File to hash.
    #[arg(value_name = "FILE")]
    pub file: Utf8PathBuf,

    /// Digest algorithm: sha256, sha512 or blake3.
    #[arg(short, long, value_name = "ALG", default_value_t = DigestAlgorithm::Sha256)]
    pub algorithm: DigestAlgorithm,

    /// Print an `algorithm:hex` token instead of `hex  FILE`.
    #[arg(long)]
    pub token: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
