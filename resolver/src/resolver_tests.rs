//! Unit tests for artifact resolution.

use super::*;
use crate::digest::DigestAlgorithm;
use crate::fetch::MockByteFetcher;
use crate::record::{ArtifactName, ReleaseVersion};
use crate::test_utils::{
    StubFetcher, StubResponse, files_under, remote_record, sha256_checksum, sha256_hex,
    utf8_temp_dir,
};
use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use tempfile::TempDir;

const PAYLOAD: &[u8] = b"stx2btcFFI xcframework bytes";
const URL: &str = "https://example.test/0.4.1/stx2btc.xcframework.zip";

#[fixture]
fn sandbox() -> (TempDir, Utf8PathBuf) {
    utf8_temp_dir().expect("temp dir")
}

fn pinned_record() -> ArtifactRecord {
    remote_record("stx2btcFFI", "0.4.1", URL, sha256_checksum(PAYLOAD))
}

fn local_record(path: &Utf8Path) -> ArtifactRecord {
    ArtifactRecord::local(
        ArtifactName::try_from("stx2btcFFI").expect("valid name"),
        ReleaseVersion::new(0, 4, 1),
        path,
    )
}

fn serving(bytes: &'static [u8]) -> MockByteFetcher {
    let mut fetcher = MockByteFetcher::new();
    fetcher.expect_fetch().times(1).returning(move |_url, dest, _cancel| {
        std::fs::write(dest, bytes)?;
        Ok(bytes.len() as u64)
    });
    fetcher
}

fn failing_with(make_error: fn() -> FetchError) -> MockByteFetcher {
    let mut fetcher = MockByteFetcher::new();
    fetcher
        .expect_fetch()
        .times(1)
        .returning(move |_url, _dest, _cancel| Err(make_error()));
    fetcher
}

#[test]
fn remote_record_resolves_to_verified_bytes() {
    let resolver = Resolver::new(serving(PAYLOAD));
    let mut states = Vec::new();
    let artifact = resolver
        .resolve_with(&pinned_record(), &CancellationToken::new(), &mut states)
        .expect("resolution succeeds");

    assert_eq!(artifact.bytes(), PAYLOAD);
    assert_eq!(artifact.origin(), ArtifactOrigin::Remote);
    assert_eq!(artifact.digest(), Some(sha256_hex(PAYLOAD).as_str()));
    assert_eq!(artifact.record(), &pinned_record());
    assert_eq!(
        states,
        [
            ResolutionState::Pending,
            ResolutionState::Fetching,
            ResolutionState::Verifying,
            ResolutionState::Verified,
        ]
    );
}

#[rstest]
fn checksum_mismatch_is_integrity_error_and_leaves_cache_untouched(
    sandbox: (TempDir, Utf8PathBuf),
) {
    let (_temp, root) = sandbox;
    let resolver = Resolver::new(serving(b"tampered bytes")).with_cache(ArtifactCache::new(&root));
    let mut states = Vec::new();

    let err = resolver
        .resolve_with(&pinned_record(), &CancellationToken::new(), &mut states)
        .expect_err("tampered bytes must be rejected");

    assert!(
        matches!(
            &err,
            ResolveError::Integrity { expected, actual, .. }
                if *expected == sha256_hex(PAYLOAD) && *actual == sha256_hex(b"tampered bytes")
        ),
        "unexpected error: {err}"
    );
    assert!(!err.kind().is_retryable());
    assert_eq!(states.last(), Some(&ResolutionState::Failed(ErrorKind::Integrity)));
    assert!(files_under(&root).is_empty(), "cache: {:?}", files_under(&root));
}

#[test]
fn checksum_comparison_ignores_case() {
    let upper = sha256_hex(PAYLOAD).to_ascii_uppercase();
    let record = remote_record("stx2btcFFI", "0.4.1", URL, upper.parse().expect("valid token"));
    let artifact = Resolver::new(serving(PAYLOAD))
        .resolve(&record)
        .expect("case-insensitive match");
    assert_eq!(artifact.bytes(), PAYLOAD);
}

#[test]
fn prefixed_checksum_overrides_configured_algorithm() {
    let token = format!("blake3:{}", DigestAlgorithm::Blake3.digest_bytes(PAYLOAD));
    let record = remote_record("stx2btcFFI", "0.4.1", URL, token.parse().expect("valid token"));
    let resolver = Resolver::new(serving(PAYLOAD))
        .with_policy(VerificationPolicy::default().with_algorithm(DigestAlgorithm::Sha512));
    let artifact = resolver.resolve(&record).expect("blake3 match");
    assert_eq!(
        artifact.digest(),
        Some(DigestAlgorithm::Blake3.digest_bytes(PAYLOAD).as_str())
    );
}

#[test]
fn configured_algorithm_applies_to_plain_tokens() {
    let token = DigestAlgorithm::Sha512.digest_bytes(PAYLOAD);
    let record = remote_record("stx2btcFFI", "0.4.1", URL, token.parse().expect("valid token"));
    let resolver = Resolver::new(serving(PAYLOAD))
        .with_policy(VerificationPolicy::default().with_algorithm(DigestAlgorithm::Sha512));
    assert!(resolver.resolve(&record).is_ok());
}

#[rstest]
fn warm_resolution_is_served_from_cache_without_fetching(sandbox: (TempDir, Utf8PathBuf)) {
    let (_temp, root) = sandbox;
    let resolver = Resolver::new(StubFetcher::new().with_body(URL, PAYLOAD))
        .with_cache(ArtifactCache::new(&root));

    let cold = resolver.resolve(&pinned_record()).expect("cold resolution");
    let warm = resolver.resolve(&pinned_record()).expect("warm resolution");

    assert_eq!(cold.bytes(), warm.bytes());
    assert_eq!(cold.origin(), ArtifactOrigin::Remote);
    assert_eq!(warm.origin(), ArtifactOrigin::Cache);
    assert_eq!(resolver.fetcher().calls(), 1);
    let expected_entry = format!("stx2btcFFI/0.4.1/{}", sha256_hex(PAYLOAD));
    assert_eq!(files_under(&root), [expected_entry]);
}

#[rstest]
fn corrupt_cache_entry_is_evicted_and_refetched(sandbox: (TempDir, Utf8PathBuf)) {
    let (_temp, root) = sandbox;
    let cache = ArtifactCache::new(&root);
    let key = CacheKey::for_record(&pinned_record()).expect("remote record has a key");
    std::fs::create_dir_all(cache.entry_dir(&key).as_std_path()).expect("entry dir");
    std::fs::write(cache.entry_path(&key).as_std_path(), b"bit rot").expect("corrupt entry");

    let resolver = Resolver::new(StubFetcher::new().with_body(URL, PAYLOAD)).with_cache(cache);
    let artifact = resolver.resolve(&pinned_record()).expect("refetch succeeds");

    assert_eq!(artifact.origin(), ArtifactOrigin::Remote);
    assert_eq!(resolver.fetcher().calls(), 1);
    let cached = resolver
        .cache()
        .expect("cache configured")
        .lookup(&key)
        .expect("lookup");
    assert_eq!(cached.as_deref(), Some(PAYLOAD));
}

#[rstest]
fn cache_write_failure_does_not_fail_resolution(sandbox: (TempDir, Utf8PathBuf)) {
    let (_temp, root) = sandbox;
    let blocked = root.join("not-a-directory");
    std::fs::write(blocked.as_std_path(), b"file").expect("write blocker");

    let resolver = Resolver::new(serving(PAYLOAD)).with_cache(ArtifactCache::new(&blocked));
    let artifact = resolver.resolve(&pinned_record()).expect("resolution succeeds");
    assert_eq!(artifact.bytes(), PAYLOAD);
}

#[rstest]
fn cancelled_fetch_leaves_no_partial_file(sandbox: (TempDir, Utf8PathBuf)) {
    let (_temp, root) = sandbox;
    let fetcher = StubFetcher::new()
        .with_response(URL, StubResponse::CancelMidStream(vec![9_u8; 64 * 1024]));
    let cache = ArtifactCache::new(&root);
    let key = CacheKey::for_record(&pinned_record()).expect("remote record has a key");
    let resolver = Resolver::new(fetcher).with_cache(cache.clone());

    let err = resolver
        .resolve_with(&pinned_record(), &CancellationToken::new(), &mut ())
        .expect_err("fetch was cancelled");

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(files_under(&cache.entry_dir(&key)).is_empty());
    assert!(!cache.entry_path(&key).exists());
}

#[test]
fn pre_cancelled_token_skips_the_fetch() {
    let mut fetcher = MockByteFetcher::new();
    fetcher.expect_fetch().never();
    let token = CancellationToken::new();
    token.cancel();

    let err = Resolver::new(fetcher)
        .resolve_with(&pinned_record(), &token, &mut ())
        .expect_err("cancelled");
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

#[test]
fn malformed_record_fails_before_any_io() {
    let mut fetcher = MockByteFetcher::new();
    fetcher.expect_fetch().never();
    let record = ArtifactRecord::new(
        ArtifactName::try_from("stx2btcFFI").expect("valid name"),
        ReleaseVersion::new(0, 4, 1),
        ArtifactSource::Remote {
            url: URL.to_owned(),
        },
        None,
    );
    let mut states = Vec::new();

    let err = Resolver::new(fetcher)
        .resolve_with(&record, &CancellationToken::new(), &mut states)
        .expect_err("malformed");

    assert_eq!(err.kind(), ErrorKind::MalformedRecord);
    assert_eq!(
        states,
        [
            ResolutionState::Pending,
            ResolutionState::Failed(ErrorKind::MalformedRecord),
        ]
    );
}

#[rstest]
#[case::not_found(
    || FetchError::NotFound { url: URL.to_owned() },
    ErrorKind::NotFound
)]
#[case::transport(
    || FetchError::Http { url: URL.to_owned(), reason: "connection reset".to_owned() },
    ErrorKind::Network
)]
#[case::disk(|| FetchError::Io(std::io::Error::other("disk full")), ErrorKind::Io)]
fn fetch_failures_map_to_error_kinds(
    #[case] make_error: fn() -> FetchError,
    #[case] expected: ErrorKind,
) {
    let err = Resolver::new(failing_with(make_error))
        .resolve(&pinned_record())
        .expect_err("fetch failed");
    assert_eq!(err.kind(), expected);
}

#[test]
fn network_errors_are_retryable() {
    let err = Resolver::new(failing_with(|| FetchError::Http {
        url: URL.to_owned(),
        reason: "timed out".to_owned(),
    }))
    .resolve(&pinned_record())
    .expect_err("transport failure");
    assert!(err.kind().is_retryable());
}

#[rstest]
fn missing_local_path_is_not_found(sandbox: (TempDir, Utf8PathBuf)) {
    let (_temp, root) = sandbox;
    let mut states = Vec::new();
    let err = Resolver::new(StubFetcher::new())
        .resolve_with(
            &local_record(&root.join("missing.xcframework")),
            &CancellationToken::new(),
            &mut states,
        )
        .expect_err("missing file");

    assert!(matches!(
        &err,
        ResolveError::NotFound { location } if location.ends_with("missing.xcframework")
    ));
    assert_eq!(
        states,
        [
            ResolutionState::Pending,
            ResolutionState::Fetching,
            ResolutionState::Failed(ErrorKind::NotFound),
        ]
    );
}

#[rstest]
fn local_directory_is_an_io_error(sandbox: (TempDir, Utf8PathBuf)) {
    let (_temp, root) = sandbox;
    let err = Resolver::new(StubFetcher::new())
        .resolve(&local_record(&root))
        .expect_err("directories are not artifacts");
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[rstest]
fn local_path_without_checksum_is_returned_unverified(sandbox: (TempDir, Utf8PathBuf)) {
    let (_temp, root) = sandbox;
    let path = root.join("stx2btc.bin");
    std::fs::write(path.as_std_path(), PAYLOAD).expect("write artifact");

    let resolver = Resolver::new(StubFetcher::new());
    let artifact = resolver.resolve(&local_record(&path)).expect("local read");

    assert_eq!(artifact.bytes(), PAYLOAD);
    assert_eq!(artifact.origin(), ArtifactOrigin::Local);
    assert!(!artifact.is_verified());
    assert_eq!(resolver.fetcher().calls(), 0);
}

#[rstest]
#[case::verified(true, true)]
#[case::skipped(false, false)]
fn local_checksum_follows_policy(
    sandbox: (TempDir, Utf8PathBuf),
    #[case] verify_local: bool,
    #[case] expect_failure: bool,
) {
    let (_temp, root) = sandbox;
    let path = root.join("stx2btc.bin");
    std::fs::write(path.as_std_path(), PAYLOAD).expect("write artifact");
    let record = local_record(&path).with_checksum(sha256_checksum(b"something else"));
    let policy = VerificationPolicy::new(DigestAlgorithm::Sha256, verify_local);

    let result = Resolver::new(StubFetcher::new())
        .with_policy(policy)
        .resolve(&record);

    if expect_failure {
        assert_eq!(
            result.expect_err("mismatch").kind(),
            ErrorKind::Integrity
        );
    } else {
        assert!(!result.expect("verification skipped").is_verified());
    }
}

#[rstest]
fn parallel_resolutions_share_one_resolver(sandbox: (TempDir, Utf8PathBuf)) {
    let (_temp, root) = sandbox;
    let urls: Vec<String> = (0..4)
        .map(|n| format!("https://example.test/{n}/ffi.zip"))
        .collect();
    let fetcher = urls
        .iter()
        .fold(StubFetcher::new(), |f, url| f.with_body(url.clone(), PAYLOAD));
    let resolver = Resolver::new(fetcher).with_cache(ArtifactCache::new(&root));
    let records: Vec<ArtifactRecord> = urls
        .iter()
        .enumerate()
        .map(|(n, url)| {
            remote_record("stx2btcFFI", &format!("0.4.{n}"), url, sha256_checksum(PAYLOAD))
        })
        .collect();

    let resolver = &resolver;
    let results: Vec<Result<ResolvedArtifact>> = std::thread::scope(|scope| {
        let handles: Vec<_> = records
            .iter()
            .chain(records.iter())
            .map(|record| scope.spawn(move || resolver.resolve(record)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("resolution thread panicked"))
            .collect()
    });

    for result in results {
        assert_eq!(result.expect("resolution succeeds").bytes(), PAYLOAD);
    }
    assert_eq!(files_under(&root).len(), records.len());
    assert!(
        files_under(&root)
            .iter()
            .all(|f| !f.contains(crate::cache::STAGING_PREFIX)),
        "staging files left behind"
    );
}
