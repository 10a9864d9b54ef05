//! Pool configuration
//!
//! Capacities and timings are loaded once at startup, in RON (Rusty Object
//! Notation) or JSON format.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assets::AssetKey;
use crate::pool::PoolError;

/// Capacity of one recycling pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSettings {
    /// Template the pool instantiates
    pub key: AssetKey,
    /// Maximum tracked instances
    pub capacity: usize,
}

impl PoolSettings {
    /// Create settings for a pool
    pub fn new(key: impl Into<AssetKey>, capacity: usize) -> Self {
        Self {
            key: key.into(),
            capacity,
        }
    }
}

/// Settings for the keyed ring-buffer projectile pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingPoolSettings {
    /// Queue length per asset key
    pub per_key_capacity: usize,
    /// Extra destroy delay per instance on teardown
    pub stagger_seconds: f32,
    /// Time before a fired projectile deactivates itself
    pub lifetime_seconds: f32,
    /// Bounces before a projectile deactivates
    pub max_bounces: u32,
}

impl Default for RingPoolSettings {
    fn default() -> Self {
        Self {
            per_key_capacity: 64,
            stagger_seconds: 0.01,
            lifetime_seconds: 5.0,
            max_bounces: 3,
        }
    }
}

impl RingPoolSettings {
    /// Set the queue length per key
    #[must_use]
    pub const fn with_per_key_capacity(mut self, capacity: usize) -> Self {
        self.per_key_capacity = capacity;
        self
    }

    /// Set the teardown stagger
    #[must_use]
    pub const fn with_stagger(mut self, seconds: f32) -> Self {
        self.stagger_seconds = seconds;
        self
    }

    /// Set the projectile lifetime
    #[must_use]
    pub const fn with_lifetime(mut self, seconds: f32) -> Self {
        self.lifetime_seconds = seconds;
        self
    }

    /// Set the bounce limit
    #[must_use]
    pub const fn with_max_bounces(mut self, bounces: u32) -> Self {
        self.max_bounces = bounces;
        self
    }

    /// Teardown stagger as a duration
    #[must_use]
    pub fn stagger(&self) -> Duration {
        seconds(self.stagger_seconds)
    }

    /// Projectile lifetime as a duration
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        seconds(self.lifetime_seconds)
    }
}

/// Settings for debounced effect spawning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpamSettings {
    /// Minimum time between two spawns of the same recipe
    pub interval_seconds: f32,
    /// Time before a spawned effect destroys itself
    pub effect_lifetime_seconds: f32,
}

impl Default for SpamSettings {
    fn default() -> Self {
        Self {
            interval_seconds: 0.1,
            effect_lifetime_seconds: 2.0,
        }
    }
}

impl SpamSettings {
    /// Set the debounce interval
    #[must_use]
    pub const fn with_interval(mut self, seconds: f32) -> Self {
        self.interval_seconds = seconds;
        self
    }

    /// Set the effect lifetime
    #[must_use]
    pub const fn with_effect_lifetime(mut self, seconds: f32) -> Self {
        self.effect_lifetime_seconds = seconds;
        self
    }

    /// Debounce interval as a duration
    #[must_use]
    pub fn interval(&self) -> Duration {
        seconds(self.interval_seconds)
    }

    /// Effect lifetime as a duration
    #[must_use]
    pub fn effect_lifetime(&self) -> Duration {
        seconds(self.effect_lifetime_seconds)
    }
}

/// Negative or non-finite values clamp to zero
fn seconds(value: f32) -> Duration {
    Duration::try_from_secs_f32(value.max(0.0)).unwrap_or(Duration::ZERO)
}

/// Complete pooling configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Recycling pools to create
    #[serde(default)]
    pub pools: Vec<PoolSettings>,
    /// Projectile ring pool
    #[serde(default)]
    pub projectiles: RingPoolSettings,
    /// Effect debouncing
    #[serde(default)]
    pub spam: SpamSettings,
}

impl PoolConfig {
    /// Add a recycling pool
    #[must_use]
    pub fn with_pool(mut self, key: impl Into<AssetKey>, capacity: usize) -> Self {
        self.pools.push(PoolSettings::new(key, capacity));
        self
    }

    /// Set the projectile settings
    #[must_use]
    pub fn with_projectiles(mut self, projectiles: RingPoolSettings) -> Self {
        self.projectiles = projectiles;
        self
    }

    /// Set the debounce settings
    #[must_use]
    pub fn with_spam(mut self, spam: SpamSettings) -> Self {
        self.spam = spam;
        self
    }

    /// Settings for the pool of `key`, if configured
    #[must_use]
    pub fn pool(&self, key: &AssetKey) -> Option<&PoolSettings> {
        self.pools.iter().find(|settings| &settings.key == key)
    }

    /// Reject capacities no pool could operate with
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfiguration`] naming the first bad entry
    pub fn validate(&self) -> Result<(), PoolError> {
        if let Some(settings) = self.pools.iter().find(|settings| settings.capacity == 0) {
            return Err(PoolError::invalid(format!(
                "pool '{}' has zero capacity",
                settings.key
            )));
        }
        if self.projectiles.per_key_capacity == 0 {
            return Err(PoolError::invalid("projectile per-key capacity is zero"));
        }
        Ok(())
    }

    /// Parse and validate a RON string
    ///
    /// # Errors
    ///
    /// Returns an error if parsing or validation fails
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        let config: PoolConfig =
            ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if parsing or validation fails
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: PoolConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = Self::from_ron_str(&fs::read_to_string(path)?)?;
        log::info!("Loaded pool config from {}", path.display());
        Ok(config)
    }

    /// Load a config from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = Self::from_json_str(&fs::read_to_string(path)?)?;
        log::info!("Loaded pool config from {}", path.display());
        Ok(config)
    }

    /// Serialize to pretty RON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Save the config to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }
}

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),
    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    /// Parsed but unusable
    #[error(transparent)]
    Invalid(#[from] PoolError),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"(
        pools: [
            (key: "soldier", capacity: 12),
            (key: "crate", capacity: 4),
        ],
        projectiles: (per_key_capacity: 32, max_bounces: 2),
    )"#;

    #[test]
    fn test_parse_ron() {
        let config = PoolConfig::from_ron_str(SAMPLE).unwrap();

        assert_eq!(config.pools.len(), 2);
        assert_eq!(config.pool(&AssetKey::new("crate")).unwrap().capacity, 4);
        assert_eq!(config.projectiles.per_key_capacity, 32);
        assert_eq!(config.projectiles.max_bounces, 2);
        // Unspecified fields fall back to defaults
        assert_eq!(config.projectiles.lifetime(), Duration::from_secs(5));
        assert_eq!(config.spam, SpamSettings::default());
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "pools": [{ "key": "medkit", "capacity": 3 }],
            "spam": { "interval_seconds": 0.5 }
        }"#;
        let config = PoolConfig::from_json_str(json).unwrap();

        assert_eq!(config.pools[0], PoolSettings::new("medkit", 3));
        assert_eq!(config.spam.interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_ron_roundtrip() {
        let config = PoolConfig::default()
            .with_pool("soldier", 8)
            .with_projectiles(RingPoolSettings::default().with_per_key_capacity(16))
            .with_spam(SpamSettings::default().with_interval(0.25));

        let ron_str = config.to_ron_string().unwrap();
        assert!(ron_str.contains("soldier"));

        let loaded = PoolConfig::from_ron_str(&ron_str).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err =
            PoolConfig::from_ron_str(r#"(pools: [(key: "empty", capacity: 0)])"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(PoolError::InvalidConfiguration { .. })
        ));

        let config = PoolConfig::default()
            .with_projectiles(RingPoolSettings::default().with_per_key_capacity(0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            PoolConfig::from_ron_str("(pools: 7)"),
            Err(ConfigError::Deserialize(_))
        ));
    }

    #[test]
    fn test_negative_seconds_clamp() {
        let settings = SpamSettings::default().with_interval(-1.0);
        assert_eq!(settings.interval(), Duration::ZERO);
    }
}
