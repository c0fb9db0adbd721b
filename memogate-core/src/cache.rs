#[cfg(feature = "stats")]
use crate::MemoStats;
use crate::directory::{DirectoryId, InvalidationDirectory};
use crate::registry::DirectoryRegistry;
use crate::{KeyTag, MemoError};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// The link between one cache and the directory it listens to.
#[derive(Clone, Debug)]
pub struct Binding {
    directory: Arc<InvalidationDirectory>,
    tag: KeyTag,
}

impl Binding {
    pub fn new(directory: Arc<InvalidationDirectory>, tag: KeyTag) -> Self {
        Self { directory, tag }
    }

    /// Binds a cache keyed by `K` to a directory of the global registry.
    pub fn resolve<K: ?Sized + 'static>(directory: DirectoryId) -> Result<Self, MemoError> {
        let directory = DirectoryRegistry::global().get(directory)?;
        Ok(Self::new(directory, KeyTag::of::<K>()))
    }

    pub fn directory(&self) -> &Arc<InvalidationDirectory> {
        &self.directory
    }

    pub fn tag(&self) -> &KeyTag {
        &self.tag
    }
}

/// Key/value storage shared by every memoization engine.
///
/// `MemoCache` holds the entries, the optional directory [`Binding`] and the
/// statistics. It has no locking of its own: the plain engine owns it behind
/// `&mut self`, the locked engines put it behind a mutex.
///
/// The entry map is only ever replaced as a whole, either by [`refresh`]
/// after a directory reset or by an explicit [`clear`]. Single keys are never
/// evicted.
///
/// [`refresh`]: MemoCache::refresh
/// [`clear`]: MemoCache::clear
pub struct MemoCache<K, V> {
    entries: HashMap<K, V>,
    binding: Option<Binding>,
    #[cfg(feature = "stats")]
    stats: MemoStats,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            binding: None,
            #[cfg(feature = "stats")]
            stats: MemoStats::new(),
        }
    }

    pub fn bound(binding: Binding) -> Self {
        Self {
            binding: Some(binding),
            ..Self::new()
        }
    }

    pub fn binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }

    /// Replaces the tag of a bound cache. No effect on an unbound cache.
    pub fn set_tag(&mut self, tag: KeyTag) {
        if let Some(binding) = self.binding.as_mut() {
            binding.tag = tag;
        }
    }

    /// Drops every entry if the bound directory was reset since this tag
    /// last caught up.
    ///
    /// Returns `true` when the entries were dropped.
    pub fn refresh(&mut self) -> bool {
        let Some(binding) = &self.binding else {
            return false;
        };

        if !binding.directory.try_consume_tag(&binding.tag) {
            return false;
        }

        let dropped = self.entries.len();
        self.entries = HashMap::new();

        #[cfg(feature = "stats")]
        self.stats.record_reset();

        tracing::trace!(
            directory = %binding.directory.id(),
            tag = %binding.tag,
            dropped,
            "memoise.cache.reset"
        );
        true
    }

    /// Returns a clone of the stored value, recording a hit or a miss.
    pub fn lookup(&self, key: &K) -> Option<V> {
        let found = self.entries.get(key).cloned();

        #[cfg(feature = "stats")]
        if found.is_some() {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }

        found
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    /// Refresh, then return the stored value or compute and store it.
    pub fn get_or_insert_with<C>(&mut self, key: K, compute: C) -> V
    where
        K: Clone,
        C: FnOnce(K) -> V,
    {
        self.refresh();
        if let Some(value) = self.lookup(&key) {
            return value;
        }

        let value = compute(key.clone());
        self.entries.insert(key, value.clone());
        value
    }

    /// Like [`get_or_insert_with`](Self::get_or_insert_with) for fallible
    /// computations. An `Err` is returned unchanged and nothing is stored.
    pub fn try_get_or_insert_with<C, E>(&mut self, key: K, compute: C) -> Result<V, E>
    where
        K: Clone,
        C: FnOnce(K) -> Result<V, E>,
    {
        self.refresh();
        if let Some(value) = self.lookup(&key) {
            return Ok(value);
        }

        let value = compute(key.clone())?;
        self.entries.insert(key, value.clone());
        Ok(value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Drops every entry. Not counted as a reset.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(feature = "stats")]
    pub fn stats(&self) -> &MemoStats {
        &self.stats
    }
}

impl<K, V> Default for MemoCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
