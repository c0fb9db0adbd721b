use parking_lot::Mutex;
use std::fmt;

type ReleaseAction = Box<dyn FnOnce() + Send + 'static>;

/// A handle that runs its release action exactly once.
///
/// Every resource handed out by this crate family (gate permits in
/// particular) is freed through a `ScopedRelease`. The action runs the first
/// time [`release`](Self::release) is called, or when the handle is dropped
/// if it was never released explicitly. Any further request is a no-op, even
/// when several threads race to release the same handle.
///
/// # Thread Safety
///
/// The handle is `Send + Sync`: it can be released from a thread other than
/// the one that acquired it, or shared behind an `Arc` and released from
/// many threads at once. Taking the action out of the handle happens under a
/// `parking_lot::Mutex`; the action itself runs after the lock is dropped.
///
/// # Examples
///
/// ```
/// use memogate_core::ScopedRelease;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let released = Arc::new(AtomicUsize::new(0));
/// let counter = released.clone();
/// let handle = ScopedRelease::new(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// assert!(handle.release());
/// assert!(!handle.release());
/// drop(handle);
///
/// assert_eq!(released.load(Ordering::SeqCst), 1);
/// ```
pub struct ScopedRelease {
    action: Mutex<Option<ReleaseAction>>,
}

impl ScopedRelease {
    /// Creates a handle that will run `action` once.
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            action: Mutex::new(Some(Box::new(action))),
        }
    }

    /// Creates a handle that is already released.
    pub fn noop() -> Self {
        Self {
            action: Mutex::new(None),
        }
    }

    /// Runs the release action if it has not run yet.
    ///
    /// # Returns
    ///
    /// `true` for the call that actually ran the action, `false` for every
    /// other call.
    pub fn release(&self) -> bool {
        let action = self.action.lock().take();

        match action {
            Some(action) => {
                action();
                true
            }
            None => false,
        }
    }

    /// Returns `true` once the action has been taken for execution.
    pub fn is_released(&self) -> bool {
        self.action.lock().is_none()
    }
}

impl Drop for ScopedRelease {
    fn drop(&mut self) {
        if let Some(action) = self.action.get_mut().take() {
            action();
        }
    }
}

impl fmt::Debug for ScopedRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedRelease")
            .field("released", &self.is_released())
            .finish()
    }
}
