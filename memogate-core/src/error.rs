use crate::config::TRACKING_ENV_VAR;
use crate::directory::DirectoryId;
use thiserror::Error;

/// Errors raised by the invalidation machinery.
///
/// Failures of a memoized function are never wrapped in this type: they
/// reach the caller as the function's own error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoError {
    /// Directory tracking was not enabled when the registry was created.
    #[error("cache tracking is disabled; set {}=true to use invalidation directories", TRACKING_ENV_VAR)]
    TrackingDisabled,

    /// No directory with this id lives in the registry that was asked.
    #[error("no invalidation directory registered under id {0}")]
    UnknownDirectory(DirectoryId),
}

/// Error returned when parsing a [`DirectoryId`] from text fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid directory id {input:?}: expected 32 hexadecimal digits")]
pub struct ParseDirectoryIdError {
    pub(crate) input: String,
}
