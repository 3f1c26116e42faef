/// CLI configuration
use crate::simulated::SimulationSettings;
use config::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use webamp_playback::PlaybackConfig;

/// Config file read when no path is given and it exists
pub const DEFAULT_CONFIG_FILE: &str = "webamp.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub simulation: SimulationSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    /// Directory holding the playlist, usage and settings documents
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl CliConfig {
    /// Load configuration from a TOML file and the environment
    ///
    /// With no explicit path, `webamp.toml` in the working directory is used
    /// if present. Environment variables prefixed with `WEBAMP_` override the
    /// file, sections separated by a double underscore
    /// (`WEBAMP_STORAGE__DATA_DIR`, `WEBAMP_SIMULATION__SPEED`).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("WEBAMP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.playback.volume > 100 {
            return Err(ConfigError::Message(format!(
                "playback.volume must be 0-100, got {}",
                self.playback.volume
            )));
        }

        if !(self.simulation.track_length_secs.is_finite() && self.simulation.track_length_secs > 0.0)
        {
            return Err(ConfigError::Message(
                "simulation.track_length_secs must be positive".to_string(),
            ));
        }

        if !(self.simulation.speed.is_finite() && self.simulation.speed > 0.0) {
            return Err(ConfigError::Message(
                "simulation.speed must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CliConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.data_dir, PathBuf::from("./data"));
        assert_eq!(config.playback.volume, 100);
    }

    #[test]
    fn test_rejects_zero_speed() {
        let mut config = CliConfig::default();
        config.simulation.speed = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_loud_volume() {
        let mut config = CliConfig::default();
        config.playback.volume = 150;
        assert!(config.validate().is_err());
    }
}
