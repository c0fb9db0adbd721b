//! # Memogate
//!
//! Two small primitives for application code: memoized functions whose
//! caches can be reset together through shared invalidation directories, and
//! a bounded async concurrency gate whose permits are returned through
//! at-most-once release handles.
//!
//! ## Features
//!
//! - **Memoization**: wrap a function with a key → result cache, one computation per key
//! - **Shared invalidation**: bind many memoized functions to one directory and reset them all at once
//! - **Serialized engines**: `SyncMemoised` / `AsyncMemoised` never run two computations at the same time
//! - **Concurrency gate**: cap how many tasks run a section, optionally counting waiters and holders
//! - **Scoped release**: every permit comes back through a `ScopedRelease` that only ever runs once
//! - **Error-aware**: fallible functions only cache `Ok` values; errors reach the caller untouched
//!
//! ## Quick Start
//!
//! ```rust
//! use memogate::memoise;
//!
//! let mut fibonacci_digits = memoise(|n: u32| {
//!     let (mut a, mut b) = (0u64, 1u64);
//!     for _ in 0..n {
//!         let next = a + b;
//!         a = b;
//!         b = next;
//!     }
//!     a.to_string().len()
//! });
//!
//! // First call computes the result
//! let first = fibonacci_digits(50);
//! // Second call returns the stored result
//! assert_eq!(fibonacci_digits(50), first);
//! ```
//!
//! ## Invalidation Directories
//!
//! Directories only exist when tracking is switched on by setting
//! `MEMOGATE_TRACKING=true` before the registry is first used. Otherwise
//! creating one fails with [`MemoError::TrackingDisabled`].
//!
//! ```rust,no_run
//! use memogate::{memoise_in, InvalidationDirectory};
//!
//! # fn main() -> Result<(), memogate::MemoError> {
//! let prices = InvalidationDirectory::new()?;
//! let mut price_of = memoise_in(|sku: String| sku.len() as u64 * 100, prices.id())?;
//!
//! assert_eq!(price_of("apple".to_string()), 500);
//!
//! // Prices changed: every function bound to the directory starts over
//! prices.reset();
//! assert_eq!(price_of("apple".to_string()), 500);
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency Gate
//!
//! ```rust
//! use memogate::ConcurrencyGate;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let gate = ConcurrencyGate::new(2);
//!
//! let permit = gate.enter_counted().await;
//! assert_eq!(gate.count(), 1);
//!
//! permit.release();
//! permit.release(); // no-op
//! assert_eq!(gate.count(), 0);
//! # }
//! ```

pub use memogate_async::*;
pub use memogate_core::*;

/// Reset every directory of the process-wide registry.
///
/// # Returns
///
/// The number of directories reset, 0 when tracking is disabled
///
/// # Examples
///
/// ```rust
/// use memogate::reset_all_directories;
///
/// // Later, when all derived data is stale:
/// reset_all_directories();
/// ```
pub fn reset_all_directories() -> usize {
    DirectoryRegistry::global().reset_all()
}

/// Reset one directory of the process-wide registry by id.
///
/// # Errors
///
/// [`MemoError::TrackingDisabled`] or [`MemoError::UnknownDirectory`].
pub fn reset_directory(id: DirectoryId) -> Result<(), MemoError> {
    DirectoryRegistry::global().reset(id)
}
