//! Error types for the clockpro crate.
//!
//! ## Key Components
//!
//! - [`InvariantError`]: Returned by [`ClockPro::check_invariants`] when the
//!   queue store, the page table and the cold-page accounting disagree.
//! - [`ConfigError`]: Returned when policy configuration parameters are
//!   invalid (e.g. a cold percentage above its ceiling, a zero hash factor).
//!
//! Runtime invariant violations inside the hands are not reported through
//! these types: they panic on the spot.
//!
//! ## Example Usage
//!
//! ```
//! use clockpro::config::ClockProConfig;
//! use clockpro::error::ConfigError;
//!
//! let ok: Result<ClockProConfig, ConfigError> =
//!     ClockProConfig::builder().cold_target_pct(20).try_build();
//! assert!(ok.is_ok());
//!
//! let bad = ClockProConfig::builder().cold_target_pct(95).try_build();
//! assert!(bad.is_err());
//! ```
//!
//! [`ClockPro::check_invariants`]: crate::policy::clock_pro::ClockPro::check_invariants

use std::fmt;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal policy invariants are violated.
///
/// Produced by [`ClockPro::check_invariants`](crate::policy::clock_pro::ClockPro::check_invariants).
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when policy configuration parameters are invalid.
///
/// Produced by [`ClockProConfigBuilder::try_build`](crate::config::ClockProConfigBuilder::try_build)
/// and [`ClockPro::set_cold_target_pct`](crate::policy::clock_pro::ClockPro::set_cold_target_pct).
///
/// # Example
///
/// ```
/// use clockpro::config::ClockProConfig;
///
/// let err = ClockProConfig::builder().hash_factor(0).try_build().unwrap_err();
/// assert!(err.to_string().contains("hash_factor"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
