use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    session::SessionRequest,
    video::EncoderSettings,
};

/// Main configuration for framesmith
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// What to render
    pub session: SessionRequest,

    /// How the encoder subprocess is invoked
    pub encoder: EncoderSettings,

    /// Render engine settings
    pub render: RenderConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the encoder and render tables
    ///
    /// The session table is checked separately by the session validator, after
    /// command-line overrides are applied.
    pub fn validate(&self) -> Result<()> {
        self.encoder.validate()?;
        self.render.validate()?;
        Ok(())
    }
}

/// Largest progress backlog a config may ask for
pub const MAX_PROGRESS_CAPACITY: usize = 1 << 16;

/// Render engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Worker threads for per-frame row work
    pub threads: usize,

    /// Undelivered progress events kept before the oldest are dropped
    pub progress_capacity: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            progress_capacity: 64,
        }
    }
}

impl RenderConfig {
    fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.threads".to_string(),
                value: self.threads.to_string()
            }.into());
        }

        if self.progress_capacity == 0 || self.progress_capacity > MAX_PROGRESS_CAPACITY {
            return Err(ConfigError::InvalidValue {
                key: "render.progress_capacity".to_string(),
                value: self.progress_capacity.to_string()
            }.into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{BallParams, FieldParams};
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.session.field = FieldParams::Ball(BallParams { radius: 25, speed: 300.0 });
        original_config.session.seed = Some(1234);
        original_config.encoder.crf = 23;

        // Save and load
        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(loaded_config.session.field, original_config.session.field);
        assert_eq!(loaded_config.session.seed, Some(1234));
        assert_eq!(loaded_config.encoder, original_config.encoder);
        assert_eq!(loaded_config.render, original_config.render);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(
            &file_path,
            "[session]\nwidth = 640\nheight = 360\n\n[session.field]\nkind = \"starfield\"\nstars = 900\n",
        )
        .unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.session.width, 640);
        assert_eq!(config.session.fps, 30.0);
        assert_eq!(config.encoder.program, "ffmpeg");
        match config.session.field {
            FieldParams::Starfield(p) => assert_eq!(p.stars, 900),
            other => panic!("unexpected field {:?}", other),
        }
    }

    #[test]
    fn test_missing_and_malformed_files() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            Config::from_file(dir.path().join("absent.toml")),
            Err(crate::error::FramesmithError::Config(ConfigError::FileNotFound { .. }))
        ));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[session\nwidth = ").unwrap();
        assert!(matches!(
            Config::from_file(&bad),
            Err(crate::error::FramesmithError::Config(ConfigError::ParseFailed { .. }))
        ));
    }

    #[test]
    fn test_invalid_render_config() {
        let mut config = Config::default();
        config.render.threads = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_progress_capacity_is_bounded() {
        let mut config = Config::default();
        config.render.progress_capacity = MAX_PROGRESS_CAPACITY;
        assert!(config.validate().is_ok());

        config.render.progress_capacity = usize::MAX;
        assert!(matches!(
            config.validate(),
            Err(crate::error::FramesmithError::Config(ConfigError::InvalidValue { ref key, .. }))
                if key == "render.progress_capacity"
        ));

        let dir = tempdir().unwrap();
        let file_path = dir.path().join("huge.toml");
        std::fs::write(&file_path, "[render]\nprogress_capacity = 9223372036854775807\n").unwrap();
        assert!(Config::from_file(&file_path).unwrap().validate().is_err());
    }
}
