//! Artifact resolver CLI entrypoint.
//!
//! Reads a package manifest, selects releases by constraint, and fetches and
//! verifies pinned binary artifacts.

use artifact_resolver::cli::{
    Cli, Command, DigestArgs, ListArgs, ResolveArgs, SelectArgs, SelectionArgs,
};
use artifact_resolver::config::{ConfigError, ResolverConfig};
use artifact_resolver::dirs::{BaseDirs, FixedBaseDirs, SystemBaseDirs};
use artifact_resolver::error::ResolveError;
use artifact_resolver::manifest::{ManifestError, ManifestSet, load_manifest};
use artifact_resolver::output::{
    format_human, format_json, format_record, format_resolution, write_stderr_line,
};
use artifact_resolver::record::ArtifactRecord;
use artifact_resolver::resolver::Resolver;
use camino::Utf8Path;
use clap::Parser;
use std::io::Write;

/// Errors surfaced by CLI commands.
#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

type Result<T> = std::result::Result<T, RunError>;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn init_logging(cli: &Cli) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(cli.log_level());
    builder.parse_env("RUST_LOG");
    builder.format_target(false);
    if builder.try_init().is_err() {
        // A logger is already installed; keep it.
    }
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    match &cli.command {
        Command::List(args) => run_list(args, stdout),
        Command::Select(args) => run_select(args, stdout),
        Command::Resolve(args) => run_resolve(args, cli.quiet, &*system_dirs(), stderr),
        Command::Digest(args) => run_digest(args, stdout),
    }
}

fn system_dirs() -> Box<dyn BaseDirs> {
    match SystemBaseDirs::new() {
        Some(dirs) => Box::new(dirs),
        None => {
            log::warn!("no home directory found; platform cache and config are unavailable");
            Box::new(FixedBaseDirs::default())
        }
    }
}

fn run_list(args: &ListArgs, stdout: &mut dyn Write) -> Result<()> {
    let manifest = load_manifest(&args.manifest.manifest)?;
    let set = manifest.record_set()?;
    let text = if args.json {
        format_json(&set, manifest.active())
    } else {
        format_human(&set, manifest.active())
    };
    write_stdout(stdout, text.trim_end())
}

fn run_select(args: &SelectArgs, stdout: &mut dyn Write) -> Result<()> {
    let manifest = load_manifest(&args.manifest.manifest)?;
    let record = select_record(&manifest, &args.selection)?;
    write_stdout(stdout, format_record(&record))
}

fn select_record(
    manifest: &ManifestSet,
    selection: &SelectionArgs,
) -> Result<ArtifactRecord> {
    let record = match &selection.constraint {
        Some(constraint) => manifest.select(&selection.artifact, constraint)?,
        None => manifest.active_record(&selection.artifact)?,
    };
    Ok(record)
}

fn run_resolve(
    args: &ResolveArgs,
    quiet: bool,
    dirs: &dyn BaseDirs,
    stderr: &mut dyn Write,
) -> Result<()> {
    let config = resolver_config(args, dirs)?;
    let manifest = load_manifest(&args.manifest.manifest)?;
    let record = select_record(&manifest, &args.selection)?;

    if !quiet {
        write_stderr_line(stderr, format!("Resolving {record}..."));
    }
    let resolver = Resolver::from_config(&config, dirs)?;
    let artifact = resolver.resolve(&record)?;
    write_file(&args.output, artifact.bytes())?;

    if !quiet {
        write_stderr_line(stderr, format_resolution(&artifact, args.output.as_str()));
    }
    Ok(())
}

/// Merge the configuration file, environment, and command-line overrides.
fn resolver_config(args: &ResolveArgs, dirs: &dyn BaseDirs) -> Result<ResolverConfig> {
    let mut config = match &args.config {
        Some(path) => ResolverConfig::load(path)?,
        None => ResolverConfig::load_default(dirs)?,
    }
    .with_env_overrides();
    if let Some(dir) = &args.cache_dir {
        config.cache_dir = Some(dir.clone());
    }
    if args.no_cache {
        config.cache_enabled = false;
    }
    Ok(config)
}

fn run_digest(args: &DigestArgs, stdout: &mut dyn Write) -> Result<()> {
    let hex = args
        .algorithm
        .digest_file(args.file.as_std_path())
        .map_err(|source| RunError::Io {
            path: args.file.to_string(),
            source,
        })?;
    let line = if args.token {
        format!("{}:{hex}", args.algorithm)
    } else {
        format!("{hex}  {}", args.file)
    };
    write_stdout(stdout, line)
}

fn write_file(path: &Utf8Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path.as_std_path(), bytes).map_err(|source| RunError::Io {
        path: path.to_string(),
        source,
    })
}

fn write_stdout(stdout: &mut dyn Write, message: impl std::fmt::Display) -> Result<()> {
    writeln!(stdout, "{message}").map_err(|source| RunError::Io {
        path: "stdout".to_owned(),
        source,
    })
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifact_resolver::config::CACHE_DIR_ENV;
    use artifact_resolver::test_utils::{release_manifest_toml, utf8_temp_dir};
    use camino::Utf8PathBuf;
    use rstest::rstest;

    fn write_manifest(dir: &Utf8Path) -> Utf8PathBuf {
        let path = dir.join("Package.toml");
        let toml = release_manifest_toml(&[
            ("0.3.1", "https://example.test/0.3.1.zip", "0301"),
            ("0.4.0", "https://example.test/0.4.0.zip", "9d2b"),
            ("0.4.1", "https://example.test/0.4.1.zip", "0401"),
        ]);
        std::fs::write(path.as_std_path(), toml).expect("write manifest");
        path
    }

    fn run_args(args: &[&str]) -> (Result<()>, String) {
        let cli = Cli::parse_from(args);
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let result = run(&cli, &mut stdout, &mut stderr);
        (result, String::from_utf8(stdout).expect("stdout was not UTF-8"))
    }

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        assert_eq!(exit_code_for_run_result(Ok(()), &mut stderr), 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = RunError::Resolve(ResolveError::NoMatchingVersion {
            name: "stx2btcFFI".to_owned(),
            constraint: "=9.9.9".to_owned(),
        });
        let mut stderr = Vec::new();
        assert_eq!(exit_code_for_run_result(Err(err), &mut stderr), 1);
        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.contains("error: no version of stx2btcFFI matches =9.9.9"));
    }

    #[test]
    fn list_prints_every_release() {
        let (_temp, dir) = utf8_temp_dir().expect("temp dir");
        let manifest = write_manifest(&dir);
        let (result, stdout) = run_args(&["artifact-resolver", "list", "-m", manifest.as_str()]);
        result.expect("list succeeds");
        assert!(stdout.contains("0.3.1"));
        assert!(stdout.contains("0.4.1 (active)"));
    }

    #[rstest]
    #[case::latest(None, "0.4.1")]
    #[case::exact(Some("0.4.0"), "0.4.0")]
    #[case::capped(Some("<=0.3.9"), "0.3.1")]
    fn select_prints_chosen_release(#[case] constraint: Option<&str>, #[case] expected: &str) {
        let (_temp, dir) = utf8_temp_dir().expect("temp dir");
        let manifest = write_manifest(&dir);
        let mut argv = vec!["artifact-resolver", "select", "-m", manifest.as_str(), "-a", "stx2btcFFI"];
        if let Some(constraint) = constraint {
            argv.extend(["-c", constraint]);
        }
        let (result, stdout) = run_args(&argv);
        result.expect("select succeeds");
        assert!(stdout.starts_with(&format!("stx2btcFFI {expected} ")), "stdout: {stdout}");
    }

    #[test]
    fn select_unknown_artifact_fails() {
        let (_temp, dir) = utf8_temp_dir().expect("temp dir");
        let manifest = write_manifest(&dir);
        let (result, _) = run_args(&[
            "artifact-resolver",
            "select",
            "-m",
            manifest.as_str(),
            "-a",
            "ghost",
        ]);
        assert!(matches!(result, Err(RunError::Resolve(_))));
    }

    #[test]
    fn digest_prints_hex_and_token() {
        let (_temp, dir) = utf8_temp_dir().expect("temp dir");
        let file = dir.join("empty.bin");
        std::fs::write(file.as_std_path(), b"").expect("write file");
        let empty_sha256 = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

        let (result, stdout) = run_args(&["artifact-resolver", "digest", file.as_str()]);
        result.expect("digest succeeds");
        assert_eq!(stdout, format!("{empty_sha256}  {file}\n"));

        let (result, stdout) = run_args(&["artifact-resolver", "digest", "--token", file.as_str()]);
        result.expect("digest succeeds");
        assert_eq!(stdout, format!("sha256:{empty_sha256}\n"));
    }

    #[test]
    fn resolve_config_applies_command_line_overrides() {
        temp_env::with_var(CACHE_DIR_ENV, Some("/from/env"), || {
            let cli = Cli::parse_from([
                "artifact-resolver",
                "resolve",
                "-a",
                "stx2btcFFI",
                "-o",
                "out.bin",
                "--cache-dir",
                "/from/flag",
            ]);
            let Command::Resolve(args) = cli.command else {
                panic!("expected Resolve command");
            };
            let config = resolver_config(&args, &FixedBaseDirs::default()).expect("config");
            assert_eq!(config.cache_dir, Some(Utf8PathBuf::from("/from/flag")));
            assert!(config.cache_enabled);
        });
    }

    #[test]
    fn resolve_writes_local_artifact() {
        let (_temp, dir) = utf8_temp_dir().expect("temp dir");
        std::fs::write(dir.join("ffi.bin").as_std_path(), b"local bytes").expect("artifact");
        let manifest = dir.join("Package.toml");
        std::fs::write(
            manifest.as_std_path(),
            concat!(
                "schema_version = 1\n\n[[package]]\nname = \"stx2btc\"\nversion = \"0.4.1\"\n\n",
                "[[package.targets]]\nkind = \"binary\"\nname = \"stx2btcFFI\"\npath = \"ffi.bin\"\n",
            ),
        )
        .expect("write manifest");
        let output = dir.join("out.bin");
        let cli = Cli::parse_from([
            "artifact-resolver",
            "resolve",
            "-q",
            "-m",
            manifest.as_str(),
            "-a",
            "stx2btcFFI",
            "-o",
            output.as_str(),
            "--no-cache",
            "--config",
            dir.join("absent.toml").as_str(),
        ]);
        let Command::Resolve(args) = &cli.command else {
            panic!("expected Resolve command");
        };
        let mut stderr = Vec::new();
        let result = run_resolve(args, true, &FixedBaseDirs::default(), &mut stderr);
        // An explicit --config that does not exist is an error.
        assert!(matches!(result, Err(RunError::Config(ConfigError::Read { .. }))));

        let args = ResolveArgs {
            config: None,
            ..args.clone()
        };
        run_resolve(&args, true, &FixedBaseDirs::default(), &mut stderr).expect("resolve succeeds");
        assert_eq!(std::fs::read(output.as_std_path()).expect("output"), b"local bytes");
        assert!(stderr.is_empty());
    }
}
