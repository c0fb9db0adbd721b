//! Integration tests for async memoization bound to directories of the
//! process-wide registry

use memogate_async::{async_memoise_in, AsyncMemoised};
use memogate_core::{DirectoryRegistry, InvalidationDirectory, KeyTag, TRACKING_ENV_VAR};
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;
use tokio_util::sync::CancellationToken;

// The global registry reads the toggle once; every test in this binary
// enables it before touching the registry.
fn enable_tracking() {
    static INIT: Once = Once::new();
    INIT.call_once(|| std::env::set_var(TRACKING_ENV_VAR, "true"));
    assert!(DirectoryRegistry::global().is_enabled());
}

#[tokio::test]
#[serial]
async fn test_reset_clears_async_cache() {
    enable_tracking();
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    let directory = InvalidationDirectory::new().unwrap();
    let lookup = async_memoise_in(
        |id: u32, _token: CancellationToken| async move {
            CALLS.fetch_add(1, Ordering::SeqCst);
            format!("record {id}")
        },
        directory.id(),
    )
    .unwrap();
    let token = CancellationToken::new();

    assert_eq!(lookup.call(1, token.clone()).await, "record 1");
    assert_eq!(lookup.call(1, token.clone()).await, "record 1");
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);

    DirectoryRegistry::global().reset(directory.id()).unwrap();

    assert_eq!(lookup.call(1, token).await, "record 1");
    assert_eq!(CALLS.load(Ordering::SeqCst), 2);
}

#[tokio::test]
#[serial]
async fn test_shared_tag_quirk_async() {
    enable_tracking();
    static FIRST: AtomicUsize = AtomicUsize::new(0);
    static SECOND: AtomicUsize = AtomicUsize::new(0);

    let directory = InvalidationDirectory::new().unwrap();
    let first = AsyncMemoised::bound(
        |x: u64, _token: CancellationToken| async move { FIRST.fetch_add(1, Ordering::SeqCst) as u64 + x },
        directory.id(),
    )
    .unwrap();
    let second = AsyncMemoised::bound(
        |x: u64, _token: CancellationToken| async move { SECOND.fetch_add(1, Ordering::SeqCst) as u64 + x },
        directory.id(),
    )
    .unwrap();
    let token = CancellationToken::new();

    assert_eq!(first.call(10, token.clone()).await, 10);
    assert_eq!(second.call(10, token.clone()).await, 10);

    directory.reset();

    assert_eq!(first.call(10, token.clone()).await, 11);
    assert_eq!(second.call(10, token).await, 10);
    assert_eq!(SECOND.load(Ordering::SeqCst), 1);
}

#[tokio::test]
#[serial]
async fn test_named_tags_separate_async_engines() {
    enable_tracking();

    let directory = InvalidationDirectory::new().unwrap();
    let engine = AsyncMemoised::bound(
        |x: u64, _token: CancellationToken| async move { x },
        directory.id(),
    )
    .unwrap()
    .with_tag(KeyTag::named("async-users"));

    engine.call(1, CancellationToken::new()).await;
    assert!(directory.contains(&KeyTag::named("async-users")));
}
