//! Tunables for [`ClockPro`](crate::policy::clock_pro::ClockPro).
//!
//! ```
//! use clockpro::config::ClockProConfig;
//!
//! let config = ClockProConfig::builder()
//!     .cold_target_pct(25)
//!     .new_queue_min(8)
//!     .build();
//! assert_eq!(config.cold_target_pct(), 25);
//! assert_eq!(config.new_queue_min(), 8);
//! ```

use crate::error::ConfigError;

/// Default share of tracked pages the cold region aims for.
pub const DEFAULT_COLD_TARGET_PCT: u32 = 10;
/// Default ceiling on the cold share, feedback included.
pub const DEFAULT_COLD_TARGET_PCT_MAX: u32 = 90;
/// Default floor on the arrival buffer: 1 MiB worth of 4 KiB pages.
pub const DEFAULT_NEW_QUEUE_MIN: usize = (1024 * 1024) >> 12;
/// Default multiplier on the non-resident bucket count.
pub const DEFAULT_HASH_FACTOR: usize = 2;

const MAX_HASH_FACTOR: usize = 64;

/// Validated policy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockProConfig {
    cold_target_pct: u32,
    cold_target_pct_max: u32,
    new_queue_min: usize,
    hash_factor: usize,
    adaptive: bool,
}

impl ClockProConfig {
    /// Starts a builder populated with the defaults.
    pub fn builder() -> ClockProConfigBuilder {
        ClockProConfigBuilder::default()
    }

    /// Percentage of tracked pages the cold region should hold.
    #[inline]
    pub fn cold_target_pct(&self) -> u32 {
        self.cold_target_pct
    }

    /// Upper bound for the cold target, as a percentage of tracked pages.
    #[inline]
    pub fn cold_target_pct_max(&self) -> u32 {
        self.cold_target_pct_max
    }

    /// Smallest size the arrival buffer is allowed to shrink to.
    #[inline]
    pub fn new_queue_min(&self) -> usize {
        self.new_queue_min
    }

    /// Buckets allocated per 14 pages of memory.
    #[inline]
    pub fn hash_factor(&self) -> usize {
        self.hash_factor
    }

    /// Whether non-resident feedback moves the cold target.
    #[inline]
    pub fn adaptive(&self) -> bool {
        self.adaptive
    }

    pub(crate) fn validate_cold_target_pct(&self, pct: u32) -> Result<(), ConfigError> {
        if pct > self.cold_target_pct_max {
            return Err(ConfigError::new(format!(
                "cold_target_pct must be <= cold_target_pct_max ({}), got {}",
                self.cold_target_pct_max, pct
            )));
        }
        Ok(())
    }

    pub(crate) fn set_cold_target_pct(&mut self, pct: u32) -> Result<(), ConfigError> {
        self.validate_cold_target_pct(pct)?;
        self.cold_target_pct = pct;
        Ok(())
    }
}

impl Default for ClockProConfig {
    fn default() -> Self {
        Self {
            cold_target_pct: DEFAULT_COLD_TARGET_PCT,
            cold_target_pct_max: DEFAULT_COLD_TARGET_PCT_MAX,
            new_queue_min: DEFAULT_NEW_QUEUE_MIN,
            hash_factor: DEFAULT_HASH_FACTOR,
            adaptive: true,
        }
    }
}

/// Builder for [`ClockProConfig`].
#[derive(Debug, Clone)]
pub struct ClockProConfigBuilder {
    config: ClockProConfig,
}

impl Default for ClockProConfigBuilder {
    fn default() -> Self {
        Self {
            config: ClockProConfig::default(),
        }
    }
}

impl ClockProConfigBuilder {
    pub fn cold_target_pct(mut self, pct: u32) -> Self {
        self.config.cold_target_pct = pct;
        self
    }

    pub fn cold_target_pct_max(mut self, pct: u32) -> Self {
        self.config.cold_target_pct_max = pct;
        self
    }

    pub fn new_queue_min(mut self, pages: usize) -> Self {
        self.config.new_queue_min = pages;
        self
    }

    pub fn hash_factor(mut self, factor: usize) -> Self {
        self.config.hash_factor = factor;
        self
    }

    pub fn adaptive(mut self, adaptive: bool) -> Self {
        self.config.adaptive = adaptive;
        self
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `cold_target_pct_max` is outside `1..=100`,
    /// `cold_target_pct` exceeds it, `new_queue_min` is zero, or
    /// `hash_factor` is outside `1..=64`.
    pub fn try_build(self) -> Result<ClockProConfig, ConfigError> {
        let config = self.config;
        if !(1..=100).contains(&config.cold_target_pct_max) {
            return Err(ConfigError::new(format!(
                "cold_target_pct_max must be in [1, 100], got {}",
                config.cold_target_pct_max
            )));
        }
        config.validate_cold_target_pct(config.cold_target_pct)?;
        if config.new_queue_min == 0 {
            return Err(ConfigError::new("new_queue_min must be greater than zero"));
        }
        if !(1..=MAX_HASH_FACTOR).contains(&config.hash_factor) {
            return Err(ConfigError::new(format!(
                "hash_factor must be in [1, {}], got {}",
                MAX_HASH_FACTOR, config.hash_factor
            )));
        }
        Ok(config)
    }

    /// Validates and returns the configuration.
    ///
    /// # Panics
    ///
    /// Panics if the parameters are invalid. See [`try_build`](Self::try_build).
    pub fn build(self) -> ClockProConfig {
        match self.try_build() {
            Ok(config) => config,
            Err(e) => panic!("{}", e),
        }
    }
}
