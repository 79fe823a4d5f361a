use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::content::{read_json_file, DefinitionError};

pub const WORLD_CONFIG_FILE: &str = "world_config.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub default_tile_width: f32,
    pub default_tile_height: f32,
    pub door_slide_duration_ms: u64,
    pub door_slide_rise_px: f32,
    pub door_open_sound: String,
    pub door_default_sound: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            default_tile_width: 16.0,
            default_tile_height: 16.0,
            door_slide_duration_ms: 400,
            door_slide_rise_px: 15.0,
            door_open_sound: "door/open_door".to_string(),
            door_default_sound: "door/default".to_string(),
        }
    }
}

impl WorldConfig {
    pub fn door_slide_duration(&self) -> Duration {
        Duration::from_millis(self.door_slide_duration_ms)
    }

    /// Reads `world_config.json` from `dir` when present; missing fields keep defaults.
    pub fn load_or_default(dir: &Path) -> Result<Self, DefinitionError> {
        let path = dir.join(WORLD_CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let config: WorldConfig = read_json_file(&path)?;
        info!(
            path = %path.display(),
            door_slide_duration_ms = config.door_slide_duration_ms,
            "world_config_loaded"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().expect("temp");
        let config = WorldConfig::load_or_default(temp.path()).expect("config");
        assert_eq!(config, WorldConfig::default());
        assert_eq!(config.door_slide_duration(), Duration::from_millis(400));
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let temp = TempDir::new().expect("temp");
        fs::write(
            temp.path().join(WORLD_CONFIG_FILE),
            r#"{"door_slide_duration_ms": 250, "door_open_sound": "door/creak"}"#,
        )
        .expect("write");
        let config = WorldConfig::load_or_default(temp.path()).expect("config");
        assert_eq!(config.door_slide_duration_ms, 250);
        assert_eq!(config.door_open_sound, "door/creak");
        assert_eq!(config.default_tile_width, 16.0);
    }
}
