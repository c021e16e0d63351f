//! Behaviour-driven tests for resolving remote releases.
//!
//! These scenarios drive the resolver against an in-memory fetcher and a
//! temporary cache, covering verification, caching, and transport failures.

use artifact_resolver::cache::ArtifactCache;
use artifact_resolver::cancel::CancellationToken;
use artifact_resolver::error::ResolveError;
use artifact_resolver::record::ArtifactRecord;
use artifact_resolver::resolver::{ResolutionState, ResolvedArtifact, Resolver};
use artifact_resolver::test_utils::{
    StubFetcher, StubResponse, files_under, remote_record, sha256_checksum, utf8_temp_dir,
};
use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

const RELEASE_URL: &str = "https://example.test/releases/stx2btc.xcframework.zip";
const PINNED_BODY: &str = "xcframework archive";

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ResolutionWorld {
    record: Option<ArtifactRecord>,
    fetcher: Option<StubFetcher>,
    cache_root: Option<Utf8PathBuf>,
    resolver: Option<Resolver<StubFetcher>>,
    states: Vec<ResolutionState>,
    result: Option<Result<ResolvedArtifact, ResolveError>>,
    // Keep the cache directory alive for the lifetime of the scenario.
    _temp_dir: Option<TempDir>,
}

impl ResolutionWorld {
    fn resolve(&mut self) {
        if self.resolver.is_none() {
            let fetcher = self.fetcher.take().expect("fetcher not set");
            let mut resolver = Resolver::new(fetcher);
            if let Some(root) = &self.cache_root {
                resolver = resolver.with_cache(ArtifactCache::new(root.clone()));
            }
            self.resolver = Some(resolver);
        }
        let resolver = self.resolver.as_ref().expect("resolver built");
        let record = self.record.as_ref().expect("record not set");
        self.states.clear();
        let result = resolver.resolve_with(record, &CancellationToken::new(), &mut self.states);
        self.result = Some(result);
    }

    fn error(&self) -> &ResolveError {
        match self.result.as_ref().expect("resolution not attempted") {
            Ok(artifact) => panic!("expected failure, resolved {:?}", artifact.record()),
            Err(err) => err,
        }
    }

    fn artifact(&self) -> &ResolvedArtifact {
        match self.result.as_ref().expect("resolution not attempted") {
            Ok(artifact) => artifact,
            Err(err) => panic!("expected success, got {err}"),
        }
    }
}

#[fixture]
fn world() -> ResolutionWorld {
    ResolutionWorld::default()
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("a remote release \"{version}\" serving \"{body}\"")]
fn given_remote_release(world: &mut ResolutionWorld, version: String, body: String) {
    world.record = Some(remote_record(
        "stx2btcFFI",
        &version,
        RELEASE_URL,
        sha256_checksum(body.as_bytes()),
    ));
    world.fetcher = Some(StubFetcher::new().with_body(RELEASE_URL, body.into_bytes()));
}

#[given("a tampered remote release \"{version}\" serving \"{body}\"")]
fn given_tampered_release(world: &mut ResolutionWorld, version: String, body: String) {
    world.record = Some(remote_record(
        "stx2btcFFI",
        &version,
        RELEASE_URL,
        sha256_checksum(PINNED_BODY.as_bytes()),
    ));
    world.fetcher = Some(StubFetcher::new().with_body(RELEASE_URL, body.into_bytes()));
}

#[given("an unreachable remote release \"{version}\"")]
fn given_unreachable_release(world: &mut ResolutionWorld, version: String) {
    world.record = Some(remote_record(
        "stx2btcFFI",
        &version,
        RELEASE_URL,
        sha256_checksum(PINNED_BODY.as_bytes()),
    ));
    world.fetcher = Some(StubFetcher::new().with_response(
        RELEASE_URL,
        StubResponse::Unreachable("connection refused".to_owned()),
    ));
}

#[given("an empty artifact cache")]
fn given_empty_cache(world: &mut ResolutionWorld) {
    let (temp, root) = utf8_temp_dir().expect("temp dir");
    world.cache_root = Some(root);
    world._temp_dir = Some(temp);
}

#[when("the release is resolved")]
fn when_resolved(world: &mut ResolutionWorld) {
    world.resolve();
}

#[when("the release is resolved again")]
fn when_resolved_again(world: &mut ResolutionWorld) {
    world.resolve();
}

#[then("the resolved bytes are \"{expected}\"")]
fn then_bytes_are(world: &mut ResolutionWorld, expected: String) {
    assert_eq!(world.artifact().bytes(), expected.as_bytes());
    assert!(world.artifact().is_verified());
}

#[then("the artifact came from \"{origin}\"")]
fn then_origin_is(world: &mut ResolutionWorld, origin: String) {
    assert_eq!(world.artifact().origin().to_string(), origin);
}

#[then("the observed states are \"{states}\"")]
fn then_states_are(world: &mut ResolutionWorld, states: String) {
    let observed: Vec<String> = world.states.iter().map(ToString::to_string).collect();
    let expected: Vec<&str> = states.split(',').collect();
    assert_eq!(observed, expected);
}

#[then("the resolution fails with kind \"{kind}\"")]
fn then_fails_with_kind(world: &mut ResolutionWorld, kind: String) {
    let err = world.error();
    assert_eq!(format!("{:?}", err.kind()), kind, "unexpected error: {err}");
}

#[then("the failure is retryable")]
fn then_failure_retryable(world: &mut ResolutionWorld) {
    assert!(world.error().kind().is_retryable());
}

#[then("the artifact cache is empty")]
fn then_cache_empty(world: &mut ResolutionWorld) {
    let root = world.cache_root.as_ref().expect("cache root set");
    assert!(files_under(root).is_empty(), "cache holds {:?}", files_under(root));
}

#[then("the fetcher was called \"{count}\" times")]
fn then_fetcher_called(world: &mut ResolutionWorld, count: String) {
    let expected: usize = count.parse().expect("numeric count");
    let resolver = world.resolver.as_ref().expect("resolver built");
    assert_eq!(resolver.fetcher().calls(), expected);
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/resolution.feature",
    name = "A fresh remote release is fetched and verified"
)]
fn scenario_fresh_remote_release(world: ResolutionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/resolution.feature",
    name = "A checksum mismatch is rejected and nothing is cached"
)]
fn scenario_checksum_mismatch(world: ResolutionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/resolution.feature",
    name = "A warm cache satisfies a repeat resolution"
)]
fn scenario_warm_cache(world: ResolutionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/resolution.feature",
    name = "An unreachable host is a retryable network failure"
)]
fn scenario_unreachable_host(world: ResolutionWorld) {
    let _ = world;
}
