use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use serde_json::Value;

use crate::content::MapDefinition;
use crate::script::{ScriptedEvent, ScriptedEventProvider};
use crate::tile::{TilePos, Vec2};
use crate::transition::{MapLoadError, MapLoader, TeleportPhase, WorldServices};

#[derive(Debug, Default)]
struct ScriptLog {
    created: usize,
    fired: Vec<usize>,
    destroyed: usize,
}

/// Hands out scripted events that record into a shared log. Each event is
/// identified by its creation index.
#[derive(Debug, Default, Clone)]
pub(crate) struct RecordingScripts {
    log: Rc<RefCell<ScriptLog>>,
}

impl RecordingScripts {
    pub(crate) fn created(&self) -> usize {
        self.log.borrow().created
    }

    pub(crate) fn fired(&self) -> Vec<usize> {
        self.log.borrow().fired.clone()
    }

    pub(crate) fn destroyed(&self) -> usize {
        self.log.borrow().destroyed
    }
}

struct RecordingEvent {
    index: usize,
    log: Rc<RefCell<ScriptLog>>,
}

impl ScriptedEvent for RecordingEvent {
    fn fire(&mut self) {
        self.log.borrow_mut().fired.push(self.index);
    }

    fn destroy(&mut self) {
        self.log.borrow_mut().destroyed += 1;
    }
}

impl ScriptedEventProvider for RecordingScripts {
    fn get_event_instance(&mut self, _descriptor: &Value) -> Box<dyn ScriptedEvent> {
        let index = {
            let mut log = self.log.borrow_mut();
            log.created += 1;
            log.created - 1
        };
        Box::new(RecordingEvent {
            index,
            log: Rc::clone(&self.log),
        })
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingServices {
    pub(crate) sounds: Vec<String>,
    pub(crate) doors_opened: Vec<TilePos>,
    pub(crate) slides: Vec<(Vec2, Duration)>,
    pub(crate) phases: Vec<TeleportPhase>,
    pub(crate) physics_paused: bool,
    pub(crate) reveals_finished: usize,
    pub(crate) stall_fade_out: bool,
}

impl WorldServices for RecordingServices {
    fn play_sound(&mut self, key: &str) {
        self.sounds.push(key.to_string());
    }

    fn pause_physics(&mut self) {
        self.physics_paused = true;
    }

    fn resume_physics(&mut self) {
        self.physics_paused = false;
    }

    fn open_door(&mut self, door: TilePos) {
        self.doors_opened.push(door);
    }

    async fn slide_hero(&mut self, to: Vec2, duration: Duration) {
        self.slides.push((to, duration));
    }

    async fn fade_out(&mut self) {
        if self.stall_fade_out {
            std::future::pending::<()>().await;
        }
    }

    async fn flash(&mut self) {}

    fn finish_reveal(&mut self) {
        self.reveals_finished += 1;
    }

    fn phase_changed(&mut self, phase: TeleportPhase) {
        self.phases.push(phase);
    }
}

#[derive(Debug, Default)]
pub(crate) struct StaticMapLoader {
    maps: HashMap<String, MapDefinition>,
    pub(crate) requests: usize,
}

impl StaticMapLoader {
    pub(crate) fn with_maps<I>(maps: I) -> Self
    where
        I: IntoIterator<Item = MapDefinition>,
    {
        Self {
            maps: maps
                .into_iter()
                .map(|map| (map.key.clone(), map))
                .collect(),
            requests: 0,
        }
    }
}

impl MapLoader for StaticMapLoader {
    async fn load_map(&mut self, key: &str) -> Result<MapDefinition, MapLoadError> {
        self.requests += 1;
        tokio::task::yield_now().await;
        self.maps
            .get(key)
            .cloned()
            .ok_or_else(|| MapLoadError::NotFound {
                key: key.to_string(),
            })
    }
}
