//! # Tracking Configuration
//!
//! Invalidation directories only work when tracking is switched on. The
//! process-wide registry reads [`TRACKING_ENV_VAR`] once, the first time it
//! is touched; anything other than a case-insensitive `true` leaves tracking
//! disabled.
//!
//! ```
//! use memogate_core::TrackingConfig;
//!
//! assert!(TrackingConfig::parse(Some(" True ")).enabled);
//! assert!(!TrackingConfig::parse(Some("yes")).enabled);
//! assert!(!TrackingConfig::parse(None).enabled);
//! ```

/// Environment variable that switches directory tracking on.
pub const TRACKING_ENV_VAR: &str = "MEMOGATE_TRACKING";

/// Whether invalidation directories may be created and used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackingConfig {
    pub enabled: bool,
}

impl TrackingConfig {
    /// Tracking switched on.
    pub fn enabled() -> Self {
        Self { enabled: true }
    }

    /// Tracking switched off. Same as `Default`.
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    /// Reads [`TRACKING_ENV_VAR`] from the process environment.
    ///
    /// A value that is not valid unicode counts as unparseable.
    pub fn from_env() -> Self {
        let raw = std::env::var(TRACKING_ENV_VAR).ok();
        Self::parse(raw.as_deref())
    }

    /// Interprets a raw toggle value.
    ///
    /// Surrounding whitespace is ignored and the comparison is
    /// case-insensitive. Unset, empty, `false` and unparseable values all
    /// disable tracking.
    pub fn parse(raw: Option<&str>) -> Self {
        let enabled = raw
            .map(str::trim)
            .map(|value| value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self { enabled }
    }
}
