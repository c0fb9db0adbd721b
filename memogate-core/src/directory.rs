//! # Invalidation Directories
//!
//! A directory is a shared reset signal. Memoized functions bound to it
//! check, on every call, whether their [`KeyTag`] is still present in the
//! directory. [`InvalidationDirectory::reset`] forgets every tag; the next
//! call of each bound function then finds its tag missing, re-adds it and
//! drops its whole cache.
//!
//! The check is scoped per tag, not per function. When two functions bound to
//! the same directory share a tag, only the first one called after a reset
//! notices the reset: it puts the tag back, and the second one finds it
//! present and keeps its old entries. Give such functions distinct tags with
//! [`KeyTag::named`] when both must be cleared.
//!
//! ```no_run
//! use memogate_core::{InvalidationDirectory, Memoised};
//!
//! # fn main() -> Result<(), memogate_core::MemoError> {
//! let directory = InvalidationDirectory::new()?;
//! let mut lookup = Memoised::bound(|id: u64| id * 2, directory.id())?;
//!
//! assert_eq!(lookup.call(21), 42);
//! directory.reset(); // next call starts from an empty cache
//! assert_eq!(lookup.call(21), 42);
//! # Ok(())
//! # }
//! ```

use crate::error::ParseDirectoryIdError;
use crate::registry::DirectoryRegistry;
use crate::{KeyTag, MemoError};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Opaque identity of an [`InvalidationDirectory`].
///
/// Displayed and parsed as 32 lowercase hexadecimal digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DirectoryId(u128);

impl DirectoryId {
    pub(crate) fn random() -> Self {
        DirectoryId(fastrand::u128(..))
    }

    /// The raw 128-bit value.
    pub fn as_u128(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for DirectoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl FromStr for DirectoryId {
    type Err = ParseDirectoryIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDirectoryIdError {
            input: s.to_string(),
        };

        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err());
        }

        u128::from_str_radix(s, 16).map(DirectoryId).map_err(|_| err())
    }
}

/// A set of key tags that have caught up with the latest reset.
///
/// Directories are only created through a [`DirectoryRegistry`], which keeps
/// them alive for its own lifetime. Handles are shared as
/// `Arc<InvalidationDirectory>`.
pub struct InvalidationDirectory {
    id: DirectoryId,
    tags: Mutex<HashSet<KeyTag>>,
    generation: AtomicU64,
}

impl InvalidationDirectory {
    /// Creates a directory in the process-wide registry.
    ///
    /// # Errors
    ///
    /// [`MemoError::TrackingDisabled`] unless tracking was switched on through
    /// [`TRACKING_ENV_VAR`](crate::TRACKING_ENV_VAR).
    pub fn new() -> Result<Arc<Self>, MemoError> {
        DirectoryRegistry::global().create_directory()
    }

    pub(crate) fn with_id(id: DirectoryId) -> Self {
        Self {
            id,
            tags: Mutex::new(HashSet::new()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> DirectoryId {
        self.id
    }

    /// Forgets every tag.
    ///
    /// No cache is touched here. Bound functions notice the reset lazily on
    /// their next call.
    pub fn reset(&self) {
        let forgotten = {
            let mut tags = self.tags.lock();
            let forgotten = tags.len();
            tags.clear();
            forgotten
        };
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        tracing::debug!(
            directory = %self.id,
            forgotten,
            generation,
            "directory.reset"
        );
    }

    /// Number of resets this directory has received.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Whether `tag` has caught up since the last reset.
    pub fn contains(&self, tag: &KeyTag) -> bool {
        self.tags.lock().contains(tag)
    }

    /// Number of tags currently caught up.
    pub fn tag_count(&self) -> usize {
        self.tags.lock().len()
    }

    /// Marks `tag` as caught up.
    ///
    /// Returns `true` when the tag was missing, meaning the caller must treat
    /// its cache as reset. Returns `false` and changes nothing when the tag is
    /// already present. The check and the insert happen under one lock.
    pub(crate) fn try_consume_tag(&self, tag: &KeyTag) -> bool {
        let mut tags = self.tags.lock();
        if tags.contains(tag) {
            return false;
        }
        tags.insert(tag.clone());
        true
    }
}

impl fmt::Debug for InvalidationDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvalidationDirectory")
            .field("id", &self.id)
            .field("tags", &self.tag_count())
            .field("generation", &self.generation())
            .finish()
    }
}
