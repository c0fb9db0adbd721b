//! # Directory Registry
//!
//! Holds every [`InvalidationDirectory`] by id.
//!
//! The registry exists in two states:
//! - **enabled**: directories can be created, looked up and reset
//! - **disabled** (default): every operation fails with
//!   [`MemoError::TrackingDisabled`] and nothing is registered
//!
//! The process-wide registry decides its state once, from
//! [`TRACKING_ENV_VAR`](crate::TRACKING_ENV_VAR), the first time
//! [`DirectoryRegistry::global`] is called. Independent registries can be
//! built from an explicit [`TrackingConfig`].
//!
//! # Examples
//!
//! ```rust
//! use memogate_core::{DirectoryRegistry, TrackingConfig};
//!
//! let registry = DirectoryRegistry::new(TrackingConfig::enabled());
//! let directory = registry.create_directory().unwrap();
//!
//! assert!(registry.get(directory.id()).is_ok());
//! registry.reset(directory.id()).unwrap();
//! assert_eq!(directory.generation(), 1);
//! ```

use crate::directory::{DirectoryId, InvalidationDirectory};
use crate::{MemoError, TrackingConfig};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;

static GLOBAL_REGISTRY: Lazy<DirectoryRegistry> =
    Lazy::new(|| DirectoryRegistry::new(TrackingConfig::from_env()));

/// Registry of invalidation directories.
///
/// Directories are kept alive for as long as the registry lives; the global
/// registry lives for the whole process.
pub struct DirectoryRegistry {
    enabled: bool,
    /// Map from directory id to the shared directory
    directories: DashMap<DirectoryId, Arc<InvalidationDirectory>>,
}

impl DirectoryRegistry {
    /// Create a registry with the given tracking state.
    pub fn new(config: TrackingConfig) -> Self {
        tracing::debug!(enabled = config.enabled, "directory_registry.init");
        Self {
            enabled: config.enabled,
            directories: DashMap::new(),
        }
    }

    /// Get the process-wide registry.
    pub fn global() -> &'static DirectoryRegistry {
        &GLOBAL_REGISTRY
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn check_enabled(&self, operation: &'static str) -> Result<(), MemoError> {
        if self.enabled {
            Ok(())
        } else {
            tracing::debug!(operation, "directory_registry.disabled");
            Err(MemoError::TrackingDisabled)
        }
    }

    /// Create and register a new directory under a fresh id.
    ///
    /// # Errors
    ///
    /// [`MemoError::TrackingDisabled`] when tracking is off.
    pub fn create_directory(&self) -> Result<Arc<InvalidationDirectory>, MemoError> {
        self.check_enabled("create_directory")?;

        loop {
            let id = DirectoryId::random();
            if let Entry::Vacant(slot) = self.directories.entry(id) {
                let directory = Arc::new(InvalidationDirectory::with_id(id));
                slot.insert(Arc::clone(&directory));
                tracing::debug!(directory = %id, "directory.created");
                return Ok(directory);
            }
        }
    }

    /// Look up a directory by id.
    ///
    /// # Errors
    ///
    /// * [`MemoError::TrackingDisabled`] when tracking is off
    /// * [`MemoError::UnknownDirectory`] when `id` was not created here
    pub fn get(&self, id: DirectoryId) -> Result<Arc<InvalidationDirectory>, MemoError> {
        self.check_enabled("get")?;

        self.directories
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(MemoError::UnknownDirectory(id))
    }

    /// Reset the directory registered under `id`.
    pub fn reset(&self, id: DirectoryId) -> Result<(), MemoError> {
        self.get(id)?.reset();
        Ok(())
    }

    /// Reset every registered directory.
    ///
    /// # Returns
    ///
    /// Number of directories reset (0 when tracking is off)
    pub fn reset_all(&self) -> usize {
        if self.check_enabled("reset_all").is_err() {
            return 0;
        }

        let directories: Vec<_> = self
            .directories
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        for directory in &directories {
            directory.reset();
        }

        directories.len()
    }

    /// Ids of all registered directories, in no particular order.
    pub fn ids(&self) -> Vec<DirectoryId> {
        self.directories.iter().map(|entry| *entry.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.directories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }
}

impl Default for DirectoryRegistry {
    fn default() -> Self {
        Self::new(TrackingConfig::default())
    }
}
