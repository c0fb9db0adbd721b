use crate::GateError;
use memogate_core::ScopedRelease;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// A bounded-permit limiter for async sections.
///
/// `ConcurrencyGate` hands out at most `max_concurrency` permits at a time.
/// Entering waits until a permit is free and returns a [`ScopedRelease`]
/// that gives the permit back when released or dropped.
///
/// # Modes
///
/// - [`enter`](Self::enter): plain acquisition
/// - [`enter_counted`](Self::enter_counted): also counts the caller in
///   [`count`](Self::count) from the moment it asks for a permit until its
///   handle is released, so the count covers both waiting and holding callers
///
/// Both have cancellable variants taking a [`CancellationToken`]. A cancelled
/// attempt never holds a permit and never leaves the counter raised.
///
/// # Ordering
///
/// Waiters are woken in whatever order the underlying tokio semaphore
/// chooses. Do not rely on first-come, first-served.
///
/// # Examples
///
/// ```rust
/// use memogate_async::ConcurrencyGate;
///
/// # #[tokio::main]
/// # async fn main() {
/// let gate = ConcurrencyGate::new(2);
///
/// let first = gate.enter_counted().await;
/// let second = gate.enter_counted().await;
/// assert_eq!(gate.count(), 2);
/// assert!(gate.try_enter().is_none());
///
/// first.release();
/// assert_eq!(gate.count(), 1);
/// drop(second);
/// assert_eq!(gate.count(), 0);
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    count: Arc<AtomicUsize>,
    max_concurrency: usize,
}

/// Decrements the counter on drop unless disarmed.
///
/// Covers callers that give up while waiting, including futures dropped
/// before or during their await.
struct PendingCount {
    count: Arc<AtomicUsize>,
    armed: bool,
}

impl PendingCount {
    fn enter(count: &Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::AcqRel);
        Self {
            count: Arc::clone(count),
            armed: true,
        }
    }

    /// Hands the counter over to a release action.
    fn disarm(mut self) -> Arc<AtomicUsize> {
        self.armed = false;
        Arc::clone(&self.count)
    }
}

impl Drop for PendingCount {
    fn drop(&mut self) {
        if self.armed {
            self.count.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

impl ConcurrencyGate {
    /// Creates a gate with `max_concurrency` permits.
    ///
    /// The value is clamped to `1..=Semaphore::MAX_PERMITS`.
    pub fn new(max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            count: Arc::new(AtomicUsize::new(0)),
            max_concurrency,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Permits not held by anyone right now.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Callers that entered through a counting method and have not released
    /// yet, waiting or holding.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    async fn acquire(&self) -> OwnedSemaphorePermit {
        // the semaphore is private and never closed
        match Arc::clone(&self.semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => unreachable!("gate semaphore closed"),
        }
    }

    async fn acquire_cancellable(
        &self,
        token: &CancellationToken,
    ) -> Result<OwnedSemaphorePermit, GateError> {
        if token.is_cancelled() {
            return Err(GateError::Cancelled);
        }

        tokio::select! {
            biased;
            permit = self.acquire() => Ok(permit),
            _ = token.cancelled() => Err(GateError::Cancelled),
        }
    }

    fn permit_release(permit: OwnedSemaphorePermit) -> ScopedRelease {
        ScopedRelease::new(move || {
            drop(permit);
            tracing::trace!("gate.release");
        })
    }

    fn counted_release(permit: OwnedSemaphorePermit, count: Arc<AtomicUsize>) -> ScopedRelease {
        ScopedRelease::new(move || {
            drop(permit);
            let remaining = count.fetch_sub(1, Ordering::AcqRel) - 1;
            tracing::trace!(remaining, "gate.release");
        })
    }

    /// Waits for a permit.
    pub async fn enter(&self) -> ScopedRelease {
        tracing::trace!(available = self.available_permits(), "gate.enter");
        let permit = self.acquire().await;
        Self::permit_release(permit)
    }

    /// Waits for a permit, counting the caller while it waits and holds.
    ///
    /// The caller is counted as soon as this method is called, before the
    /// returned future is polled. Dropping the future unfinished takes the
    /// count back.
    pub fn enter_counted(&self) -> impl Future<Output = ScopedRelease> + Send + '_ {
        let pending = PendingCount::enter(&self.count);
        tracing::trace!(count = self.count(), "gate.enter_counted");

        async move {
            let permit = self.acquire().await;
            Self::counted_release(permit, pending.disarm())
        }
    }

    /// [`enter`](Self::enter) that gives up when `token` is cancelled.
    ///
    /// A permit that is already available wins over a token cancelled in the
    /// meantime; a token cancelled before the call always wins.
    ///
    /// # Errors
    ///
    /// [`GateError::Cancelled`] if the token fired before a permit was
    /// acquired. No permit is held in that case.
    pub async fn enter_cancellable(
        &self,
        token: &CancellationToken,
    ) -> Result<ScopedRelease, GateError> {
        let permit = self.acquire_cancellable(token).await.map_err(|err| {
            tracing::trace!("gate.enter.cancelled");
            err
        })?;
        Ok(Self::permit_release(permit))
    }

    /// [`enter_counted`](Self::enter_counted) that gives up when `token` is
    /// cancelled. The count is restored before the error is returned.
    pub fn enter_counted_cancellable<'a>(
        &'a self,
        token: &'a CancellationToken,
    ) -> impl Future<Output = Result<ScopedRelease, GateError>> + Send + 'a {
        let pending = PendingCount::enter(&self.count);

        async move {
            match self.acquire_cancellable(token).await {
                Ok(permit) => Ok(Self::counted_release(permit, pending.disarm())),
                Err(err) => {
                    drop(pending);
                    tracing::trace!(count = self.count(), "gate.enter_counted.cancelled");
                    Err(err)
                }
            }
        }
    }

    /// Takes a permit only if one is free right now.
    pub fn try_enter(&self) -> Option<ScopedRelease> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .ok()
            .map(Self::permit_release)
    }
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::new(1)
    }
}
