use thiserror::Error;

/// Errors raised by [`ConcurrencyGate`](crate::ConcurrencyGate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateError {
    /// The cancellation token fired before a permit was acquired.
    #[error("gate acquisition cancelled before a permit was free")]
    Cancelled,
}
