use std::io::ErrorKind;
use std::time::Duration;

use serde_json::Value;
use tileworld::{
    ContentPaths, MapDefinition, MapLoadError, MapLoader, ScriptedEvent, ScriptedEventProvider,
    TeleportPhase, TilePos, Vec2, WorldServices,
};
use tracing::{debug, info};

const FADE_DURATION: Duration = Duration::from_millis(250);
const FLASH_DURATION: Duration = Duration::from_millis(120);

/// Stand-in for the renderer, audio and physics: every call is logged and the
/// animated ones wait out their duration.
#[derive(Debug)]
pub(crate) struct HeadlessServices {
    fade_duration: Duration,
    flash_duration: Duration,
    physics_paused: bool,
}

impl Default for HeadlessServices {
    fn default() -> Self {
        Self::with_durations(FADE_DURATION, FLASH_DURATION)
    }
}

impl HeadlessServices {
    pub(crate) fn with_durations(fade_duration: Duration, flash_duration: Duration) -> Self {
        Self {
            fade_duration,
            flash_duration,
            physics_paused: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn physics_paused(&self) -> bool {
        self.physics_paused
    }
}

impl WorldServices for HeadlessServices {
    fn play_sound(&mut self, key: &str) {
        info!(sound = key, "sound_played");
    }

    fn pause_physics(&mut self) {
        self.physics_paused = true;
        debug!("physics_paused");
    }

    fn resume_physics(&mut self) {
        self.physics_paused = false;
        debug!("physics_resumed");
    }

    fn open_door(&mut self, door: TilePos) {
        info!(x = door.x, y = door.y, "door_opened");
    }

    async fn slide_hero(&mut self, to: Vec2, duration: Duration) {
        debug!(x = to.x, y = to.y, duration_ms = duration.as_millis() as u64, "hero_slide");
        tokio::time::sleep(duration).await;
    }

    async fn fade_out(&mut self) {
        tokio::time::sleep(self.fade_duration).await;
    }

    async fn flash(&mut self) {
        tokio::time::sleep(self.flash_duration).await;
    }

    fn finish_reveal(&mut self) {
        info!("reveal_finished");
    }

    fn phase_changed(&mut self, phase: TeleportPhase) {
        debug!(phase = phase.label(), "services_phase");
    }
}

/// Reads `<maps_dir>/<key>.json` off the async runtime's blocking pool.
#[derive(Debug, Clone)]
pub(crate) struct FileMapLoader {
    paths: ContentPaths,
}

impl FileMapLoader {
    pub(crate) fn new(paths: ContentPaths) -> Self {
        Self { paths }
    }
}

impl MapLoader for FileMapLoader {
    async fn load_map(&mut self, key: &str) -> Result<MapDefinition, MapLoadError> {
        let path = self.paths.map_file(key);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(source) if source.kind() == ErrorKind::NotFound => {
                return Err(MapLoadError::NotFound {
                    key: key.to_string(),
                })
            }
            Err(source) => return Err(MapLoadError::Io { path, source }),
        };
        let definition =
            MapDefinition::from_json_str(&raw).map_err(|source| MapLoadError::Malformed {
                key: key.to_string(),
                source,
            })?;
        info!(map = key, path = %path.display(), "map_file_loaded");
        Ok(definition)
    }
}

/// Scripted events that only report themselves. The `type` field of the
/// descriptor names the event in the log.
#[derive(Debug, Default)]
pub(crate) struct LoggingScripts;

struct LoggedEvent {
    name: String,
}

impl ScriptedEvent for LoggedEvent {
    fn fire(&mut self) {
        info!(script = %self.name, "scripted_event_fired");
    }

    fn destroy(&mut self) {
        debug!(script = %self.name, "scripted_event_destroyed");
    }
}

impl ScriptedEventProvider for LoggingScripts {
    fn get_event_instance(&mut self, descriptor: &Value) -> Box<dyn ScriptedEvent> {
        let name = descriptor
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("unnamed")
            .to_string();
        Box::new(LoggedEvent { name })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn paths_with_map(key: &str, body: &str) -> (TempDir, ContentPaths) {
        let temp = TempDir::new().expect("temp");
        let paths = ContentPaths::from_root(temp.path().to_path_buf());
        fs::create_dir_all(&paths.maps_dir).expect("mkdir");
        fs::write(paths.map_file(key), body).expect("write");
        (temp, paths)
    }

    #[tokio::test]
    async fn loads_map_files_by_key() {
        let (_temp, paths) = paths_with_map("inn", r#"{"key": "inn", "width": 8, "height": 12}"#);
        let mut loader = FileMapLoader::new(paths);
        let definition = loader.load_map("inn").await.expect("load");
        assert_eq!(definition.key, "inn");
        assert_eq!(definition.width, 8);
    }

    #[tokio::test]
    async fn missing_and_malformed_maps_are_distinguished() {
        let (_temp, paths) = paths_with_map("broken", r#"{"key": "broken"}"#);
        let mut loader = FileMapLoader::new(paths);
        assert!(matches!(
            loader.load_map("nowhere").await,
            Err(MapLoadError::NotFound { key }) if key == "nowhere"
        ));
        assert!(matches!(
            loader.load_map("broken").await,
            Err(MapLoadError::Malformed { key, .. }) if key == "broken"
        ));
    }
}
