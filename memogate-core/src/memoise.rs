//! # Memoized Functions
//!
//! Wraps a function with a key → result cache.
//!
//! Two engines live here:
//!
//! - [`Memoised`]: the plain engine. It is called through `&mut self`, so a
//!   single caller owns the cache at any time. Share it across threads by
//!   putting it behind your own lock, or use [`SyncMemoised`].
//! - [`SyncMemoised`]: one `parking_lot::Mutex` around the whole
//!   check-compute-store sequence. Every call is serialized, including calls
//!   for different keys. In exchange the wrapped function runs at most once
//!   per key and two computations never overlap. It takes a
//!   [`CancellationToken`] that is handed to the wrapped function untouched.
//!
//! Either engine can be bound to an [`InvalidationDirectory`]. A bound
//! engine checks its [`KeyTag`] against the directory before every lookup and
//! starts over from an empty cache when the directory was reset.
//!
//! Failed computations (`try_*` methods) return the error unchanged and leave
//! no entry behind, so the next call for that key runs the function again.
//!
//! # Examples
//!
//! ```
//! use memogate_core::memoise;
//! use std::cell::Cell;
//!
//! let calls = Cell::new(0);
//! let mut square = memoise(|x: u64| {
//!     calls.set(calls.get() + 1);
//!     x * x
//! });
//!
//! assert_eq!(square(12), 144);
//! assert_eq!(square(12), 144);
//! assert_eq!(calls.get(), 1);
//! ```

#[cfg(feature = "stats")]
use crate::MemoStats;
use crate::cache::{Binding, MemoCache};
use crate::directory::{DirectoryId, InvalidationDirectory};
use crate::{KeyTag, MemoError};
use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A memoized function with an exclusively owned cache.
///
/// The call methods available depend on the shape of `F`:
///
/// | `F`                               | method                     |
/// |-----------------------------------|----------------------------|
/// | `FnMut(K) -> V`                   | [`call`](Self::call)       |
/// | `FnMut(K, P) -> V`                | [`call_with`](Self::call_with) |
/// | `FnMut(K) -> Result<V, E>`        | [`try_call`](Self::try_call) |
/// | `FnMut(K, P) -> Result<V, E>`     | [`try_call_with`](Self::try_call_with) |
///
/// In the two-argument forms only the key takes part in caching; the extra
/// parameter is passed through on a miss and ignored on a hit.
pub struct Memoised<K, V, F> {
    func: F,
    cache: MemoCache<K, V>,
}

impl<K, V, F> Memoised<K, V, F>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Wraps `func` with a plain cache and no invalidation.
    pub fn new(func: F) -> Self {
        Self {
            func,
            cache: MemoCache::new(),
        }
    }

    /// Wraps `func` and binds it to a directory of the global registry.
    ///
    /// The tag defaults to the key type `K`.
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
            cache: MemoCache::bound(Binding::resolve::<K>(directory)?),
        })
    }

    /// Wraps `func` and binds it to `directory`.
    pub fn bound_to(func: F, directory: Arc<InvalidationDirectory>) -> Self
    where
        K: 'static,
    {
        Self {
            func,
            cache: MemoCache::bound(Binding::new(directory, KeyTag::of::<K>())),
        }
    }

    /// Answer for `tag` instead of the key type. No effect when unbound.
    pub fn with_tag(mut self, tag: KeyTag) -> Self {
        self.cache.set_tag(tag);
        self
    }

    pub fn call(&mut self, key: K) -> V
    where
        F: FnMut(K) -> V,
    {
        let func = &mut self.func;
        self.cache.get_or_insert_with(key, |key| func(key))
    }

    pub fn call_with<P>(&mut self, key: K, param: P) -> V
    where
        F: FnMut(K, P) -> V,
    {
        let func = &mut self.func;
        self.cache.get_or_insert_with(key, |key| func(key, param))
    }

    pub fn try_call<E>(&mut self, key: K) -> Result<V, E>
    where
        F: FnMut(K) -> Result<V, E>,
    {
        let func = &mut self.func;
        self.cache.try_get_or_insert_with(key, |key| func(key))
    }

    pub fn try_call_with<P, E>(&mut self, key: K, param: P) -> Result<V, E>
    where
        F: FnMut(K, P) -> Result<V, E>,
    {
        let func = &mut self.func;
        self.cache.try_get_or_insert_with(key, |key| func(key, param))
    }

    /// The directory this engine listens to, if any.
    pub fn directory(&self) -> Option<&Arc<InvalidationDirectory>> {
        self.cache.binding().map(Binding::directory)
    }

    pub fn tag(&self) -> Option<&KeyTag> {
        self.cache.binding().map(Binding::tag)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.cache.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    #[cfg(feature = "stats")]
    pub fn stats(&self) -> &MemoStats {
        self.cache.stats()
    }
}

/// A memoized function that serializes every call through one lock.
///
/// The wrapped function receives the caller's [`CancellationToken`]; the
/// engine itself never looks at it.
///
/// # Reentrancy
///
/// The lock is not reentrant. A wrapped function that calls back into the
/// same engine (a memoized recursive fibonacci, say) deadlocks on the
/// inner call. Calling a *different* engine from inside the function is
/// fine.
///
/// # Examples
///
/// ```
/// use memogate_core::SyncMemoised;
/// use tokio_util::sync::CancellationToken;
///
/// let lengths = SyncMemoised::new(|s: String, _token: &CancellationToken| s.len());
/// let token = CancellationToken::new();
///
/// assert_eq!(lengths.call("hello".to_string(), &token), 5);
/// assert_eq!(lengths.len(), 1);
/// ```
pub struct SyncMemoised<K, V, F> {
    func: F,
    cache: Mutex<MemoCache<K, V>>,
}

impl<K, V, F> SyncMemoised<K, V, F>
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

    /// See [`Memoised::bound`].
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

    pub fn with_tag(self, tag: KeyTag) -> Self {
        self.cache.lock().set_tag(tag);
        self
    }

    /// Looks `key` up, computing and storing it on a miss.
    ///
    /// The lock is held for the whole sequence, including the computation.
    pub fn call(&self, key: K, token: &CancellationToken) -> V
    where
        F: Fn(K, &CancellationToken) -> V,
    {
        let mut cache = self.cache.lock();
        cache.get_or_insert_with(key, |key| (self.func)(key, token))
    }

    pub fn try_call<E>(&self, key: K, token: &CancellationToken) -> Result<V, E>
    where
        F: Fn(K, &CancellationToken) -> Result<V, E>,
    {
        let mut cache = self.cache.lock();
        cache.try_get_or_insert_with(key, |key| (self.func)(key, token))
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.cache.lock().contains_key(key)
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Snapshot of the statistics.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> MemoStats {
        self.cache.lock().stats().clone()
    }
}

/// Memoize a one-argument function.
pub fn memoise<K, V, F>(func: F) -> impl FnMut(K) -> V
where
    K: Eq + Hash + Clone,
    V: Clone,
    F: FnMut(K) -> V,
{
    let mut memoised = Memoised::new(func);
    move |key| memoised.call(key)
}

/// Memoize a one-argument function bound to a directory of the global
/// registry.
pub fn memoise_in<K, V, F>(func: F, directory: DirectoryId) -> Result<impl FnMut(K) -> V, MemoError>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone,
    F: FnMut(K) -> V,
{
    let mut memoised = Memoised::bound(func, directory)?;
    Ok(move |key| memoised.call(key))
}

/// Memoize a two-argument function, keyed on the first argument only.
pub fn memoise_with_param<K, P, V, F>(func: F) -> impl FnMut(K, P) -> V
where
    K: Eq + Hash + Clone,
    V: Clone,
    F: FnMut(K, P) -> V,
{
    let mut memoised = Memoised::new(func);
    move |key, param| memoised.call_with(key, param)
}

/// Two-argument form of [`memoise_in`].
pub fn memoise_with_param_in<K, P, V, F>(
    func: F,
    directory: DirectoryId,
) -> Result<impl FnMut(K, P) -> V, MemoError>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone,
    F: FnMut(K, P) -> V,
{
    let mut memoised = Memoised::bound(func, directory)?;
    Ok(move |key, param| memoised.call_with(key, param))
}

/// Memoize a fallible function. Only `Ok` values are stored.
pub fn try_memoise<K, V, E, F>(func: F) -> impl FnMut(K) -> Result<V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    F: FnMut(K) -> Result<V, E>,
{
    let mut memoised = Memoised::new(func);
    move |key| memoised.try_call(key)
}

/// Fallible form of [`memoise_in`].
pub fn try_memoise_in<K, V, E, F>(
    func: F,
    directory: DirectoryId,
) -> Result<impl FnMut(K) -> Result<V, E>, MemoError>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone,
    F: FnMut(K) -> Result<V, E>,
{
    let mut memoised = Memoised::bound(func, directory)?;
    Ok(move |key| memoised.try_call(key))
}

/// Memoize behind a single lock; see [`SyncMemoised`].
pub fn memoise_sync<K, V, F>(func: F) -> impl Fn(K, &CancellationToken) -> V
where
    K: Eq + Hash + Clone,
    V: Clone,
    F: Fn(K, &CancellationToken) -> V,
{
    let memoised = SyncMemoised::new(func);
    move |key: K, token: &CancellationToken| memoised.call(key, token)
}

/// Memoize behind a single lock, bound to a directory of the global
/// registry.
pub fn memoise_sync_in<K, V, F>(
    func: F,
    directory: DirectoryId,
) -> Result<impl Fn(K, &CancellationToken) -> V, MemoError>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone,
    F: Fn(K, &CancellationToken) -> V,
{
    let memoised = SyncMemoised::bound(func, directory)?;
    Ok(move |key: K, token: &CancellationToken| memoised.call(key, token))
}
