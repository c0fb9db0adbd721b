#[cfg(feature = "stats")]
use memogate_core::MemoStats;
use memogate_core::{Binding, DirectoryId, InvalidationDirectory, KeyTag, MemoCache, MemoError};
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// A memoized async function whose calls are serialized by one lock.
///
/// The whole check-compute-store sequence, including awaiting the wrapped
/// future, runs while holding a `tokio::sync::Mutex`. Calls for different keys
/// wait for each other too. What this buys:
///
/// - the wrapped function runs at most once per key, however many callers
///   ask for it concurrently
/// - two computations of the same cache never overlap
///
/// Every call takes a [`CancellationToken`] that is handed to the wrapped
/// function as-is. The engine never checks it and has no timeout of its own.
///
/// The lock is not reentrant: a wrapped future that awaits a call on the
/// same engine never completes. Awaiting a different engine is fine.
///
/// Like the synchronous engines, an `AsyncMemoised` can be bound to an
/// [`InvalidationDirectory`] and drops its cache when the directory was
/// reset. Errors from the `try_*` methods are returned unchanged and never
/// stored.
///
/// # Examples
///
/// ```rust
/// use memogate_async::async_memoise;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() {
/// let fetch = async_memoise(|id: u64, _token: CancellationToken| async move {
///     format!("user-{id}")
/// });
///
/// let token = CancellationToken::new();
/// assert_eq!(fetch.call(7, token.clone()).await, "user-7");
/// assert_eq!(fetch.call(7, token).await, "user-7");
/// assert_eq!(fetch.len().await, 1);
/// # }
/// ```
pub struct AsyncMemoised<K, V, F> {
    func: F,
    cache: Mutex<MemoCache<K, V>>,
}

impl<K, V, F> AsyncMemoised<K, V, F>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(func: F) -> Self {
        Self {
            func,
            cache: Mutex::new(MemoCache::new()),
        }
    }

    /// Binds to a directory of the global registry, tagged by key type `K`.
    ///
    /// # Errors
    ///
    /// * [`MemoError::TrackingDisabled`] when tracking is off
    /// * [`MemoError::UnknownDirectory`] when no directory has that id
    pub fn bound(func: F, directory: DirectoryId) -> Result<Self, MemoError>
    where
        K: 'static,
    {
        Ok(Self {
            func,
            cache: Mutex::new(MemoCache::bound(Binding::resolve::<K>(directory)?)),
        })
    }

    pub fn bound_to(func: F, directory: Arc<InvalidationDirectory>) -> Self
    where
        K: 'static,
    {
        Self {
            func,
            cache: Mutex::new(MemoCache::bound(Binding::new(
                directory,
                KeyTag::of::<K>(),
            ))),
        }
    }

    /// Answer for `tag` instead of the key type. No effect when unbound.
    pub fn with_tag(mut self, tag: KeyTag) -> Self {
        self.cache.get_mut().set_tag(tag);
        self
    }

    async fn get_or_compute<C, Fut>(&self, key: K, compute: C) -> V
    where
        C: FnOnce(K) -> Fut,
        Fut: Future<Output = V>,
    {
        let mut cache = self.cache.lock().await;
        cache.refresh();
        if let Some(value) = cache.lookup(&key) {
            return value;
        }

        let value = compute(key.clone()).await;
        cache.insert(key, value.clone());
        value
    }

    async fn try_get_or_compute<C, Fut, E>(&self, key: K, compute: C) -> Result<V, E>
    where
        C: FnOnce(K) -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let mut cache = self.cache.lock().await;
        cache.refresh();
        if let Some(value) = cache.lookup(&key) {
            return Ok(value);
        }

        let value = compute(key.clone()).await?;
        cache.insert(key, value.clone());
        Ok(value)
    }

    pub async fn call<Fut>(&self, key: K, token: CancellationToken) -> V
    where
        F: Fn(K, CancellationToken) -> Fut,
        Fut: Future<Output = V>,
    {
        self.get_or_compute(key, |key| (self.func)(key, token)).await
    }

    /// Two-argument form; `param` is not part of the key.
    pub async fn call_with<P, Fut>(&self, key: K, param: P, token: CancellationToken) -> V
    where
        F: Fn(K, P, CancellationToken) -> Fut,
        Fut: Future<Output = V>,
    {
        self.get_or_compute(key, |key| (self.func)(key, param, token))
            .await
    }

    pub async fn try_call<Fut, E>(&self, key: K, token: CancellationToken) -> Result<V, E>
    where
        F: Fn(K, CancellationToken) -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        self.try_get_or_compute(key, |key| (self.func)(key, token))
            .await
    }

    pub async fn try_call_with<P, Fut, E>(
        &self,
        key: K,
        param: P,
        token: CancellationToken,
    ) -> Result<V, E>
    where
        F: Fn(K, P, CancellationToken) -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        self.try_get_or_compute(key, |key| (self.func)(key, param, token))
            .await
    }

    pub async fn contains_key(&self, key: &K) -> bool {
        self.cache.lock().await.contains_key(key)
    }

    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.is_empty()
    }

    /// Snapshot of the statistics.
    #[cfg(feature = "stats")]
    pub async fn stats(&self) -> MemoStats {
        self.cache.lock().await.stats().clone()
    }
}

/// Memoize an async function of one key.
pub fn async_memoise<K, V, F, Fut>(func: F) -> AsyncMemoised<K, V, F>
where
    K: Eq + Hash + Clone,
    V: Clone,
    F: Fn(K, CancellationToken) -> Fut,
    Fut: Future<Output = V>,
{
    AsyncMemoised::new(func)
}

/// Memoize an async function of a key and an extra parameter.
pub fn async_memoise_with_param<K, P, V, F, Fut>(func: F) -> AsyncMemoised<K, V, F>
where
    K: Eq + Hash + Clone,
    V: Clone,
    F: Fn(K, P, CancellationToken) -> Fut,
    Fut: Future<Output = V>,
{
    AsyncMemoised::new(func)
}

/// Memoize an async function bound to a directory of the global registry.
pub fn async_memoise_in<K, V, F, Fut>(
    func: F,
    directory: DirectoryId,
) -> Result<AsyncMemoised<K, V, F>, MemoError>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone,
    F: Fn(K, CancellationToken) -> Fut,
    Fut: Future<Output = V>,
{
    AsyncMemoised::bound(func, directory)
}

/// Memoize a fallible async function. Only `Ok` values are stored.
pub fn try_async_memoise<K, V, E, F, Fut>(func: F) -> AsyncMemoised<K, V, F>
where
    K: Eq + Hash + Clone,
    V: Clone,
    F: Fn(K, CancellationToken) -> Fut,
    Fut: Future<Output = Result<V, E>>,
{
    AsyncMemoised::new(func)
}

#[cfg(test)]
mod tests {
    use super::*;
    use memogate_core::{DirectoryRegistry, TrackingConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_call_once_per_key() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let double = async_memoise(move |x: u32, _token: CancellationToken| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                x * 2
            }
        });
        let token = CancellationToken::new();

        assert_eq!(double.call(2, token.clone()).await, 4);
        assert_eq!(double.call(2, token.clone()).await, 4);
        assert_eq!(double.call(3, token).await, 6);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_bound_engine_reset() {
        let registry = DirectoryRegistry::new(TrackingConfig::enabled());
        let directory = registry.create_directory().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let engine = AsyncMemoised::bound_to(
            move |x: u8, _token: CancellationToken| {
                let counter = Arc::clone(&counter);
                async move { counter.fetch_add(1, Ordering::SeqCst) as u8 + x }
            },
            directory.clone(),
        );
        let token = CancellationToken::new();

        assert_eq!(engine.call(1, token.clone()).await, 1);
        assert_eq!(engine.call(1, token.clone()).await, 1);
        directory.reset();
        assert_eq!(engine.call(1, token).await, 2);

        #[cfg(feature = "stats")]
        assert_eq!(engine.stats().await.resets(), 2);
    }

    #[tokio::test]
    async fn test_with_tag_on_bound_engine() {
        let registry = DirectoryRegistry::new(TrackingConfig::enabled());
        let directory = registry.create_directory().unwrap();
        let engine = AsyncMemoised::bound_to(
            |x: u8, _token: CancellationToken| async move { x },
            directory.clone(),
        )
        .with_tag(KeyTag::named("async-bytes"));

        engine.call(1, CancellationToken::new()).await;
        assert!(directory.contains(&KeyTag::named("async-bytes")));
        assert!(!directory.contains(&KeyTag::of::<u8>()));
    }

    #[tokio::test]
    async fn test_awaits_another_engine() {
        let inner: Arc<AsyncMemoised<u32, u32, _>> =
            Arc::new(async_memoise(|x: u32, _token: CancellationToken| async move { x * 3 }));
        let nested = Arc::clone(&inner);
        let outer: AsyncMemoised<u32, u32, _> = async_memoise(move |x: u32, token: CancellationToken| {
            let nested = Arc::clone(&nested);
            async move { nested.call(x, token).await + 1 }
        });

        let token = CancellationToken::new();
        assert_eq!(outer.call(5, token.clone()).await, 16);
        assert_eq!(outer.call(5, token).await, 16);
        assert!(inner.contains_key(&5).await);
        assert_eq!(inner.len().await, 1);
    }
}
