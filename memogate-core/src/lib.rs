//! # Memogate Core
//!
//! Core building blocks for the memogate library.
//!
//! This crate provides memoized function wrappers, the invalidation
//! directories that let several memoized functions share one reset signal,
//! and the scoped release handle used by every resource the library hands out.
//!
//! ## Features
//!
//! - **Memoization**: Wrap any `FnMut(K) -> V` (or two-argument / fallible forms) with a key → result cache
//! - **Locked memoization**: `SyncMemoised` runs each key's computation at most once, even across threads
//! - **Invalidation directories**: Reset a directory and every bound cache starts over on its next call
//! - **Explicit enablement**: Directories only exist when tracking is switched on, otherwise you get an error
//! - **Scoped release**: `ScopedRelease` runs its action exactly once, however often or wherever it is released
//! - **Statistics**: Hit / miss / reset counters per memoized function (`stats` feature)
//!
//! ## Module Organization
//!
//! - [`scoped`] - At-most-once release handle
//! - [`config`] - Tracking toggle read from the environment
//! - [`directory`] - Invalidation directories and their ids
//! - [`registry`] - Process-wide directory registry
//! - [`cache`] - Storage shared by all memoization engines
//! - [`memoise`] - The synchronous memoization engines
//!
mod error;
mod tag;

pub mod cache;
pub mod config;
pub mod directory;
pub mod memoise;
pub mod registry;
pub mod scoped;

#[cfg(feature = "stats")]
mod stats;

pub use cache::{Binding, MemoCache};
pub use config::{TrackingConfig, TRACKING_ENV_VAR};
pub use directory::{DirectoryId, InvalidationDirectory};
pub use error::{MemoError, ParseDirectoryIdError};
pub use memoise::{
    memoise, memoise_in, memoise_sync, memoise_sync_in, memoise_with_param,
    memoise_with_param_in, try_memoise, try_memoise_in, Memoised, SyncMemoised,
};
pub use registry::DirectoryRegistry;
pub use scoped::ScopedRelease;
pub use tag::KeyTag;

#[cfg(feature = "stats")]
pub use stats::MemoStats;

pub use tokio_util::sync::CancellationToken;
