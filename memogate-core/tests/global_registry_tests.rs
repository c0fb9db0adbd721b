use memogate_core::{
    memoise_sync_in, CancellationToken, DirectoryRegistry, InvalidationDirectory, KeyTag, MemoError,
    Memoised, SyncMemoised, TRACKING_ENV_VAR,
};
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::thread;

fn enable_tracking() {
    static INIT: Once = Once::new();
    INIT.call_once(|| std::env::set_var(TRACKING_ENV_VAR, "true"));
    assert!(DirectoryRegistry::global().is_enabled());
}

#[test]
#[serial]
fn test_global_directory_lookup_and_reset() {
    enable_tracking();
    let registry = DirectoryRegistry::global();

    let directory = InvalidationDirectory::new().unwrap();
    let found = registry.get(directory.id()).unwrap();
    assert!(Arc::ptr_eq(&found, &directory));

    let before = directory.generation();
    registry.reset(directory.id()).unwrap();
    assert_eq!(directory.generation(), before + 1);
}

#[test]
#[serial]
fn test_reset_all_touches_every_global_directory() {
    enable_tracking();
    let registry = DirectoryRegistry::global();

    let a = InvalidationDirectory::new().unwrap();
    let b = InvalidationDirectory::new().unwrap();
    let (gen_a, gen_b) = (a.generation(), b.generation());

    assert!(registry.reset_all() >= 2);
    assert_eq!(a.generation(), gen_a + 1);
    assert_eq!(b.generation(), gen_b + 1);
}

#[test]
#[serial]
fn test_bound_by_id_through_global_registry() {
    enable_tracking();
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    let directory = InvalidationDirectory::new().unwrap();
    let mut engine = Memoised::bound(
        |x: i32| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            x - 1
        },
        directory.id(),
    )
    .unwrap()
    .with_tag(KeyTag::named("offsets"));

    assert_eq!(engine.call(10), 9);
    assert_eq!(engine.call(10), 9);
    DirectoryRegistry::global().reset(directory.id()).unwrap();
    assert_eq!(engine.call(10), 9);

    assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    assert_eq!(engine.tag(), Some(&KeyTag::named("offsets")));
}

#[test]
#[serial]
fn test_locked_engine_across_threads_with_reset() {
    enable_tracking();
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    let directory = InvalidationDirectory::new().unwrap();
    let engine: Arc<SyncMemoised<u16, u16, _>> = Arc::new(
        SyncMemoised::bound(
            |x: u16, _token: &CancellationToken| {
                CALLS.fetch_add(1, Ordering::SeqCst);
                x * 2
            },
            directory.id(),
        )
        .unwrap(),
    );

    let run = |engine: &Arc<SyncMemoised<u16, u16, _>>| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(engine);
                thread::spawn(move || engine.call(21, &CancellationToken::new()))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 42);
        }
    };

    run(&engine);
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);

    directory.reset();
    run(&engine);
    assert_eq!(CALLS.load(Ordering::SeqCst), 2);
}

#[test]
#[serial]
fn test_unknown_id_in_global_registry() {
    enable_tracking();

    let id = "ffffffffffffffffffffffffffffffff".parse().unwrap();
    let result = memoise_sync_in(|x: u8, _token: &CancellationToken| x, id).map(|_| ());

    assert_eq!(result.unwrap_err(), MemoError::UnknownDirectory(id));
}
