//! Configuration Module
//!
//! Handles loading engine and server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Knobs controlling expiration and background reclamation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// If false, only lazy expiration ever reclaims space
    pub enable_active_cleaning: bool,
    /// Seconds between reclaim cycles
    pub clean_interval_seconds: u64,
    /// Wall-clock budget of one reclaim cycle in microseconds
    pub max_clean_microseconds: u64,
    /// Share of the table (0-100) one reclaim cycle may collect
    pub max_clean_percentage: u8,
    /// Seed for member sampling; None seeds from OS entropy
    pub random_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_active_cleaning: true,
            clean_interval_seconds: 1,
            max_clean_microseconds: 25_000,
            max_clean_percentage: 20,
            random_seed: None,
        }
    }
}

impl EngineConfig {
    /// Loads engine knobs from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_ENABLE_ACTIVE_CLEANING` - Run the background reclaimer (default: true)
    /// - `CACHE_CLEAN_INTERVAL_SECONDS` - Seconds between reclaim cycles (default: 1)
    /// - `CACHE_MAX_CLEAN_MICROSECONDS` - Per-cycle time budget (default: 25000)
    /// - `CACHE_MAX_CLEAN_PERCENTAGE` - Per-cycle table share, clamped to 100 (default: 20)
    /// - `CACHE_RANDOM_SEED` - Fixed sampling seed (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enable_active_cleaning: env_or("CACHE_ENABLE_ACTIVE_CLEANING", defaults.enable_active_cleaning),
            clean_interval_seconds: env_or("CACHE_CLEAN_INTERVAL_SECONDS", defaults.clean_interval_seconds),
            max_clean_microseconds: env_or("CACHE_MAX_CLEAN_MICROSECONDS", defaults.max_clean_microseconds),
            max_clean_percentage: env_or("CACHE_MAX_CLEAN_PERCENTAGE", defaults.max_clean_percentage)
                .min(100),
            random_seed: env_var("CACHE_RANDOM_SEED"),
        }
    }

    /// Turns the background reclaimer on or off.
    ///
    /// # Arguments
    /// * `enabled` - When false only lazy expiration removes entries
    pub fn with_active_cleaning(mut self, enabled: bool) -> Self {
        self.enable_active_cleaning = enabled;
        self
    }

    /// Sets the time between reclaim cycles.
    ///
    /// The interval is kept in whole seconds; a fractional part rounds up,
    /// so `500ms` becomes one second. Only `Duration::ZERO` yields zero.
    ///
    /// # Arguments
    /// * `interval` - Time between two reclaim cycles
    pub fn with_clean_interval(mut self, interval: Duration) -> Self {
        let round_up = u64::from(interval.subsec_nanos() > 0);
        self.clean_interval_seconds = interval.as_secs().saturating_add(round_up);
        self
    }

    /// Sets the wall-clock budget of one reclaim cycle.
    ///
    /// # Arguments
    /// * `budget` - Kept in microseconds, saturating at `u64::MAX`
    pub fn with_max_clean_duration(mut self, budget: Duration) -> Self {
        self.max_clean_microseconds = u64::try_from(budget.as_micros()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the share of the table one reclaim cycle may collect.
    ///
    /// # Arguments
    /// * `percentage` - 0 to 100; larger values fail [`validate`](Self::validate)
    pub fn with_max_clean_percentage(mut self, percentage: u8) -> Self {
        self.max_clean_percentage = percentage;
        self
    }

    /// Fixes the sampling seed so random member selection is reproducible.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Time between reclaim cycles.
    pub fn clean_interval(&self) -> Duration {
        Duration::from_secs(self.clean_interval_seconds)
    }

    /// Wall-clock budget of one reclaim cycle.
    pub fn max_clean_duration(&self) -> Duration {
        Duration::from_micros(self.max_clean_microseconds)
    }

    /// Checks the reclaimer knobs. Only relevant when active cleaning is on.
    pub fn validate(&self) -> Result<()> {
        if !self.enable_active_cleaning {
            return Ok(());
        }
        if self.clean_interval_seconds == 0 {
            return Err(CacheError::InvalidConfig(
                "clean interval must be at least one second".to_string(),
            ));
        }
        if self.max_clean_percentage > 100 {
            return Err(CacheError::InvalidConfig(format!(
                "max clean percentage must be within 0-100, got {}",
                self.max_clean_percentage
            )));
        }
        Ok(())
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Cache engine knobs
    pub engine: EngineConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - plus every variable read by [`EngineConfig::from_env`]
    pub fn from_env() -> Self {
        Self {
            server_port: env_or("SERVER_PORT", 3000),
            engine: EngineConfig::from_env(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            engine: EngineConfig::default(),
        }
    }
}

fn env_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env_var(name).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert!(config.enable_active_cleaning);
        assert_eq!(config.clean_interval(), Duration::from_secs(1));
        assert_eq!(config.max_clean_duration(), Duration::from_micros(25_000));
        assert_eq!(config.max_clean_percentage, 20);
        assert!(config.random_seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("SERVER_PORT");
        env::remove_var("CACHE_ENABLE_ACTIVE_CLEANING");
        env::remove_var("CACHE_CLEAN_INTERVAL_SECONDS");
        env::remove_var("CACHE_MAX_CLEAN_MICROSECONDS");
        env::remove_var("CACHE_MAX_CLEAN_PERCENTAGE");
        env::remove_var("CACHE_RANDOM_SEED");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::default()
            .with_active_cleaning(false)
            .with_clean_interval(Duration::from_secs(5))
            .with_max_clean_duration(Duration::from_millis(2))
            .with_max_clean_percentage(100)
            .with_random_seed(42);

        assert!(!config.enable_active_cleaning);
        assert_eq!(config.clean_interval_seconds, 5);
        assert_eq!(config.max_clean_microseconds, 2_000);
        assert_eq!(config.max_clean_percentage, 100);
        assert_eq!(config.random_seed, Some(42));
    }

    #[test]
    fn test_clean_interval_rounds_up_fractions() {
        let interval = |millis| {
            EngineConfig::default()
                .with_clean_interval(Duration::from_millis(millis))
                .clean_interval_seconds
        };

        assert_eq!(interval(0), 0);
        assert_eq!(interval(1), 1);
        assert_eq!(interval(500), 1);
        assert_eq!(interval(1_000), 1);
        assert_eq!(interval(1_500), 2);
    }

    #[test]
    fn test_validate_rejects_bad_knobs() {
        let zero_interval = EngineConfig::default().with_clean_interval(Duration::ZERO);
        assert!(matches!(
            zero_interval.validate(),
            Err(CacheError::InvalidConfig(_))
        ));

        let half_second = EngineConfig::default().with_clean_interval(Duration::from_millis(500));
        assert!(half_second.validate().is_ok());

        let too_much = EngineConfig::default().with_max_clean_percentage(101);
        assert!(too_much.validate().is_err());

        // Knobs are irrelevant once active cleaning is off
        let disabled = too_much.with_active_cleaning(false);
        assert!(disabled.validate().is_ok());
    }
}
