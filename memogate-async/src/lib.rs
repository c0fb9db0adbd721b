//! # Memogate Async
//!
//! The async half of memogate.
//!
//! This crate provides a bounded concurrency gate built on the tokio
//! semaphore, and a memoization engine for async functions that serializes
//! every call through one lock so each key is computed at most once.
//!
//! ## Features
//!
//! - 🚦 **Concurrency gate**: at most N holders, with `ScopedRelease` handles that free a permit exactly once
//! - 🔢 **Live counting**: `enter_counted` tracks callers waiting for or holding a permit
//! - 🛑 **Cancellation**: cancellable acquisition that never leaks a permit or a count
//! - 🧠 **Async memoization**: one computation per key, no overlapping computations
//! - 🔥 **Invalidation directories**: the same reset mechanism as the synchronous engines
//! - 📈 **Statistics**: hit / miss / reset counters (`stats` feature)
//!
//! ## Examples
//!
//! ### Bounding parallelism
//!
//! ```rust,ignore
//! use memogate_async::ConcurrencyGate;
//!
//! let gate = ConcurrencyGate::new(4);
//! for url in urls {
//!     let gate = gate.clone();
//!     tokio::spawn(async move {
//!         let _permit = gate.enter().await;
//!         fetch(url).await
//!     });
//! }
//! ```
//!
//! ### Memoizing an async lookup
//!
//! ```rust,ignore
//! use memogate_async::async_memoise;
//!
//! let profile = async_memoise(|id: u64, token: CancellationToken| async move {
//!     database::load_profile(id, token).await
//! });
//! let first = profile.call(42, token.clone()).await;
//! ```
//!
//! ## Thread Safety
//!
//! `ConcurrencyGate` is cheap to clone and every clone shares the same
//! permits and counter. `AsyncMemoised` is `Send + Sync` when its function,
//! key and value types are, so it can be shared behind an `Arc`.

mod error;
mod gate;
mod memoise;

pub use error::GateError;
pub use gate::ConcurrencyGate;
pub use memoise::{
    async_memoise, async_memoise_in, async_memoise_with_param, try_async_memoise, AsyncMemoised,
};

// Re-export core types that appear in this crate's signatures
pub use memogate_core::{CancellationToken, ScopedRelease};
#[cfg(feature = "stats")]
pub use memogate_core::MemoStats;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{async_memoise, AsyncMemoised, ConcurrencyGate, GateError, ScopedRelease};
    pub use memogate_core::CancellationToken;
}
