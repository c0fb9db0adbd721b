//! Integration tests for serialized async memoization

use memogate_async::{async_memoise, async_memoise_with_param, try_async_memoise, AsyncMemoised};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
struct User {
    id: u64,
    name: String,
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_one_computation() {
    static CALL_COUNT: AtomicUsize = AtomicUsize::new(0);

    let fetch_user = Arc::new(async_memoise(|id: u64, _token: CancellationToken| async move {
        CALL_COUNT.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        User {
            id,
            name: format!("User {}", id),
        }
    }));

    let mut tasks = vec![];
    for _ in 0..16 {
        let fetch_user = Arc::clone(&fetch_user);
        tasks.push(tokio::spawn(async move {
            fetch_user.call(1, CancellationToken::new()).await
        }));
    }

    let expected = User {
        id: 1,
        name: "User 1".to_string(),
    };
    for task in tasks {
        assert_eq!(task.await.unwrap(), expected);
    }
    assert_eq!(CALL_COUNT.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_computations_never_overlap_across_keys() {
    static ACTIVE: AtomicUsize = AtomicUsize::new(0);
    static OVERLAPS: AtomicUsize = AtomicUsize::new(0);

    let slow_square = Arc::new(async_memoise(|x: u32, _token: CancellationToken| async move {
        if ACTIVE.fetch_add(1, Ordering::SeqCst) > 0 {
            OVERLAPS.fetch_add(1, Ordering::SeqCst);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
        ACTIVE.fetch_sub(1, Ordering::SeqCst);
        x * x
    }));

    let mut tasks = vec![];
    for x in 0..8u32 {
        let slow_square = Arc::clone(&slow_square);
        tasks.push(tokio::spawn(async move {
            slow_square.call(x, CancellationToken::new()).await
        }));
    }

    for (x, task) in tasks.into_iter().enumerate() {
        assert_eq!(task.await.unwrap(), (x * x) as u32);
    }
    assert_eq!(OVERLAPS.load(Ordering::SeqCst), 0);
    assert_eq!(slow_square.len().await, 8);
}

#[tokio::test]
async fn test_extra_param_is_not_part_of_key() {
    let render = async_memoise_with_param(
        |id: u64, template: &'static str, _token: CancellationToken| async move {
            template.replace("{}", &id.to_string())
        },
    );
    let token = CancellationToken::new();

    assert_eq!(render.call_with(5, "item-{}", token.clone()).await, "item-5");
    assert_eq!(render.call_with(5, "other-{}", token.clone()).await, "item-5");
    assert_eq!(render.call_with(6, "other-{}", token).await, "other-6");
}

#[tokio::test]
async fn test_token_passed_through_untouched() {
    let observe = async_memoise(|_key: u8, token: CancellationToken| async move {
        token.is_cancelled()
    });

    let cancelled = CancellationToken::new();
    cancelled.cancel();

    // the engine does not short-circuit on a cancelled token
    assert!(observe.call(1, cancelled).await);
    assert!(!observe.call(2, CancellationToken::new()).await);
}

#[tokio::test]
async fn test_errors_are_not_cached() {
    static ATTEMPTS: AtomicUsize = AtomicUsize::new(0);

    let load = try_async_memoise(|path: String, _token: CancellationToken| async move {
        if ATTEMPTS.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(format!("{path}: temporarily unavailable"))
        } else {
            Ok(path.len())
        }
    });
    let token = CancellationToken::new();

    assert_eq!(
        load.try_call("config.toml".to_string(), token.clone()).await,
        Err("config.toml: temporarily unavailable".to_string())
    );
    assert!(!load.contains_key(&"config.toml".to_string()).await);

    assert_eq!(load.try_call("config.toml".to_string(), token.clone()).await, Ok(11));
    assert_eq!(load.try_call("config.toml".to_string(), token).await, Ok(11));
    assert_eq!(ATTEMPTS.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_try_call_with_param() {
    let engine = AsyncMemoised::new(|a: i64, b: i64, _token: CancellationToken| async move {
        a.checked_div(b).ok_or("division by zero")
    });
    let token = CancellationToken::new();

    assert_eq!(engine.try_call_with(9, 0, token.clone()).await, Err("division by zero"));
    assert_eq!(engine.try_call_with(9, 3, token.clone()).await, Ok(3));
    assert_eq!(engine.try_call_with(9, 0, token).await, Ok(3));
}

#[tokio::test]
async fn test_clear_forces_recompute() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    let engine = async_memoise(|x: u8, _token: CancellationToken| async move {
        CALLS.fetch_add(1, Ordering::SeqCst);
        x
    });
    let token = CancellationToken::new();

    engine.call(1, token.clone()).await;
    engine.clear().await;
    assert!(engine.is_empty().await);
    engine.call(1, token).await;

    assert_eq!(CALLS.load(Ordering::SeqCst), 2);
}

#[tokio::test]
#[cfg(feature = "stats")]
async fn test_stats_snapshot() {
    let engine = async_memoise(|x: u8, _token: CancellationToken| async move { x });
    let token = CancellationToken::new();

    engine.call(1, token.clone()).await;
    engine.call(1, token.clone()).await;
    engine.call(2, token).await;

    let stats = engine.stats().await;
    assert_eq!(stats.hits(), 1);
    assert_eq!(stats.misses(), 2);
    assert_eq!(stats.resets(), 0);
}
