use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::error::ConfigError;

/// What the ring buffer does when a push would overwrite unread audio
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverrunPolicy {
    /// Overwrite the oldest unread bytes and move the read pointer past them
    #[default]
    DropOldest,
    /// Reject the incoming chunk
    DropNewest,
}

/// How decoded audio travels from the decoder callback to the audio tap
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AudioDelivery {
    /// Push into the ring buffer from the decoder thread
    #[default]
    Direct,
    /// Move chunks over a bounded channel, drained on the consumer side
    Channel,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Ring capacity as a multiple of the reported delay
    pub safety_factor: f64,
    /// Relative delay change that triggers a read pointer rebase
    pub rebase_tolerance: f64,
    pub overrun_policy: OverrunPolicy,
    pub delivery: AudioDelivery,
    pub channel_capacity: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            safety_factor: 2.0,
            rebase_tolerance: 0.10,
            overrun_policy: OverrunPolicy::DropOldest,
            delivery: AudioDelivery::Direct,
            channel_capacity: 32,
        }
    }
}

/// Engine configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Handover buffer level (percent) at which a prebuffered stream may be swapped in
    pub handover_ready_threshold: f32,
    pub default_volume: u8,
    pub tick_rate_hz: f64,
    /// Swaps slower than this are logged as warnings
    pub swap_warn_ms: u64,
    pub audio: AudioConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            handover_ready_threshold: 90.0,
            default_volume: 100,
            tick_rate_hz: 60.0,
            swap_warn_ms: 5,
            audio: AudioConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.handover_ready_threshold) {
            return Err(invalid("handover_ready_threshold", "must be between 0 and 100"));
        }
        if self.default_volume > 100 {
            return Err(invalid("default_volume", "must be between 0 and 100"));
        }
        if !(self.tick_rate_hz > 0.0 && self.tick_rate_hz <= 1000.0) {
            return Err(invalid("tick_rate_hz", "must be above 0 and at most 1000"));
        }
        if !(self.audio.safety_factor >= 1.0) {
            return Err(invalid("audio.safety_factor", "must be at least 1.0"));
        }
        if !(self.audio.rebase_tolerance >= 0.0) {
            return Err(invalid("audio.rebase_tolerance", "must not be negative"));
        }
        if self.audio.channel_capacity == 0 {
            return Err(invalid("audio.channel_capacity", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    config: EngineConfig,
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path()?;
        Self::with_path(config_path)
    }

    /// Manager backed by an explicit file. A missing file yields defaults; a
    /// corrupt one falls back to defaults with a warning.
    pub fn with_path(config_path: PathBuf) -> Result<Self, ConfigError> {
        let config = match Self::load_config(&config_path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring configuration at {}: {}", config_path.display(), e);
                EngineConfig::default()
            }
        };

        Ok(Self {
            config,
            config_path,
        })
    }

    pub fn get_config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Apply `updater`, validate the result and persist it. An invalid update is
    /// rolled back.
    pub fn update_config<F>(&mut self, updater: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut EngineConfig),
    {
        let mut candidate = self.config.clone();
        updater(&mut candidate);
        candidate.validate()?;
        self.config = candidate;
        self.save_config()
    }

    pub fn set_ready_threshold(&mut self, threshold: f32) -> Result<(), ConfigError> {
        self.update_config(|config| config.handover_ready_threshold = threshold)
    }

    pub fn set_overrun_policy(&mut self, policy: OverrunPolicy) -> Result<(), ConfigError> {
        self.update_config(|config| config.audio.overrun_policy = policy)
    }

    pub fn set_volume(&mut self, volume: u8) -> Result<(), ConfigError> {
        self.config.default_volume = volume.min(100);
        self.save_config()
    }

    pub fn reset_to_defaults(&mut self) -> Result<(), ConfigError> {
        self.config = EngineConfig::default();
        self.save_config()
    }

    fn get_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::home_dir()
            .ok_or(ConfigError::ConfigDirNotFound)?
            .join(".config")
            .join("handover-player");

        std::fs::create_dir_all(&config_dir)?;

        Ok(config_dir.join("config.toml"))
    }

    fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
        if !path.exists() {
            return Ok(EngineConfig::default());
        }

        let config_content = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&config_content)?;
        config.validate()?;

        Ok(config)
    }

    fn save_config(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let config_content = toml::to_string_pretty(&self.config)?;
        std::fs::write(&self.config_path, config_content)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let config_manager = ConfigManager {
            config: EngineConfig::default(),
            config_path,
        };

        (config_manager, temp_dir)
    }

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();

        assert_eq!(config.handover_ready_threshold, 90.0);
        assert_eq!(config.default_volume, 100);
        assert_eq!(config.audio.safety_factor, 2.0);
        assert_eq!(config.audio.rebase_tolerance, 0.10);
        assert_eq!(config.audio.overrun_policy, OverrunPolicy::DropOldest);
        assert_eq!(config.audio.delivery, AudioDelivery::Direct);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_config() {
        let (mut config_manager, _temp_dir) = create_test_config_manager();

        config_manager.config.handover_ready_threshold = 75.0;
        config_manager.config.audio.overrun_policy = OverrunPolicy::DropNewest;
        config_manager.save_config().unwrap();

        let loaded = ConfigManager::load_config(&config_manager.config_path).unwrap();
        assert_eq!(loaded.handover_ready_threshold, 75.0);
        assert_eq!(loaded.audio.overrun_policy, OverrunPolicy::DropNewest);
    }

    #[test]
    fn test_load_nonexistent_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigManager::load_config(&temp_dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_load_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.toml");
        fs::write(&config_path, "invalid toml content [[[").unwrap();

        match ConfigManager::load_config(&config_path) {
            Err(ConfigError::DeserializationError(_)) => {}
            other => panic!("Expected DeserializationError, got {:?}", other),
        }

        // The manager itself falls back to defaults
        let manager = ConfigManager::with_path(config_path).unwrap();
        assert_eq!(manager.get_config(), &EngineConfig::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("partial.toml");
        fs::write(&config_path, "handover_ready_threshold = 50.0\n\n[audio]\ndelivery = \"channel\"\n").unwrap();

        let config = ConfigManager::load_config(&config_path).unwrap();
        assert_eq!(config.handover_ready_threshold, 50.0);
        assert_eq!(config.audio.delivery, AudioDelivery::Channel);
        assert_eq!(config.audio.safety_factor, 2.0);
        assert_eq!(config.tick_rate_hz, 60.0);
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        fs::write(&config_path, "[audio]\nsafety_factor = 0.5\n").unwrap();

        match ConfigManager::load_config(&config_path) {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "audio.safety_factor"),
            other => panic!("Expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_update_config_rolls_back_invalid() {
        let (mut config_manager, _temp_dir) = create_test_config_manager();

        assert!(config_manager.set_ready_threshold(150.0).is_err());
        assert_eq!(config_manager.config.handover_ready_threshold, 90.0);

        config_manager.set_ready_threshold(80.0).unwrap();
        let loaded = ConfigManager::load_config(&config_manager.config_path).unwrap();
        assert_eq!(loaded.handover_ready_threshold, 80.0);
    }

    #[test]
    fn test_set_overrun_policy_and_volume() {
        let (mut config_manager, _temp_dir) = create_test_config_manager();

        config_manager.set_overrun_policy(OverrunPolicy::DropNewest).unwrap();
        assert_eq!(config_manager.config.audio.overrun_policy, OverrunPolicy::DropNewest);

        config_manager.set_volume(250).unwrap();
        assert_eq!(config_manager.config.default_volume, 100);
    }

    #[test]
    fn test_reset_to_defaults() {
        let (mut config_manager, _temp_dir) = create_test_config_manager();

        config_manager.config.tick_rate_hz = 30.0;
        config_manager.config.audio.channel_capacity = 4;
        config_manager.reset_to_defaults().unwrap();

        assert_eq!(config_manager.config, EngineConfig::default());
    }

    #[test]
    fn test_config_path_creation() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("nested").join("config").join("config.toml");

        let config_manager = ConfigManager {
            config: EngineConfig::default(),
            config_path: nested_path.clone(),
        };
        config_manager.save_config().unwrap();

        assert!(nested_path.exists());
    }

    #[test]
    fn test_toml_format() {
        let toml_string = toml::to_string_pretty(&EngineConfig::default()).unwrap();

        assert!(toml_string.contains("handover_ready_threshold"));
        assert!(toml_string.contains("[audio]"));
        assert!(toml_string.contains("drop_oldest"));
        assert!(toml_string.contains("direct"));
    }
}
