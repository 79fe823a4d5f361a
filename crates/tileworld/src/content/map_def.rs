use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::collision::CollisionLayer;
use crate::tile::{Direction, TilePos};

use super::defs::ObjectEventOverride;
use super::tables::{parse_json, DefinitionError};

fn default_true() -> bool {
    true
}

fn default_tile_size() -> f32 {
    16.0
}

fn default_layers() -> Vec<CollisionLayer> {
    vec![CollisionLayer(0)]
}

/// Everything the loader hands back for one map.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapDefinition {
    pub key: String,
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_tile_size")]
    pub tile_width: f32,
    #[serde(default = "default_tile_size")]
    pub tile_height: f32,
    #[serde(default)]
    pub interactable_objects: Vec<InteractableObjectPlacement>,
    #[serde(default)]
    pub npcs: Vec<NpcPlacement>,
    #[serde(default)]
    pub tile_events: Vec<MapTileEventDef>,
}

impl MapDefinition {
    pub fn from_json_str(raw: &str) -> Result<Self, DefinitionError> {
        parse_json(raw)
    }

    /// Every collision layer the map's content refers to, plus `mount_layer`.
    pub fn referenced_layers(&self, mount_layer: CollisionLayer) -> Vec<CollisionLayer> {
        let mut layers = vec![mount_layer];
        layers.extend(
            self.interactable_objects
                .iter()
                .filter_map(|placement| placement.base_collision_layer),
        );
        layers.extend(
            self.npcs
                .iter()
                .filter_map(|placement| placement.base_collision_layer),
        );
        layers.extend(
            self.tile_events
                .iter()
                .flat_map(|event| event.activation_collision_layers.iter().copied()),
        );
        layers.sort();
        layers.dedup();
        layers
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ObjectStorageKeys {
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub base_collision_layer: Option<String>,
    #[serde(default)]
    pub enable: Option<String>,
    #[serde(default)]
    pub entangled_by_bush: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AllowedTile {
    pub x: i32,
    pub y: i32,
    pub collision_layer: CollisionLayer,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToggleEnableEventDef {
    pub event: Value,
    pub on_enable: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InteractableObjectPlacement {
    pub key_name: String,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub storage_keys: ObjectStorageKeys,
    #[serde(default)]
    pub allowed_tiles: Vec<AllowedTile>,
    #[serde(default)]
    pub base_collision_layer: Option<CollisionLayer>,
    #[serde(default)]
    pub not_allowed_tiles: Vec<TilePos>,
    #[serde(default)]
    pub block_climb_collision_layer_shift: Option<i32>,
    #[serde(default)]
    pub events_info: BTreeMap<usize, ObjectEventOverride>,
    #[serde(default)]
    pub enable: Option<bool>,
    #[serde(default)]
    pub entangled_by_bush: Option<bool>,
    #[serde(default)]
    pub toggle_enable_events: Vec<ToggleEnableEventDef>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NpcStorageKeys {
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub base_collision_layer: Option<String>,
    #[serde(default)]
    pub affected_by_reveal: Option<String>,
    #[serde(default)]
    pub visible: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NpcPlacement {
    pub key_name: String,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub base_collision_layer: Option<CollisionLayer>,
    #[serde(default)]
    pub affected_by_reveal: Option<bool>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub storage_keys: NpcStorageKeys,
    #[serde(default)]
    pub events: Vec<Value>,
}

/// Event authored directly on the map rather than derived from an object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapTileEventDef {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub key_name: Option<String>,
    #[serde(default)]
    pub activation_directions: Option<Vec<Direction>>,
    #[serde(default = "default_layers")]
    pub activation_collision_layers: Vec<CollisionLayer>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub dynamic: bool,
    #[serde(default)]
    pub active_storage_key: Option<String>,
    #[serde(default)]
    pub affected_by_reveal: bool,
    #[serde(flatten)]
    pub kind: MapTileEventKind,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapTileEventKind {
    Teleport {
        target: String,
        x_target: i32,
        y_target: i32,
        #[serde(default)]
        advance_effect: bool,
        #[serde(default)]
        dest_collision_layer: CollisionLayer,
        #[serde(default)]
        destination_direction: Option<Direction>,
    },
    Jump {
        #[serde(default = "default_true")]
        is_set: bool,
    },
    Climb {
        change_to_collision_layer: CollisionLayer,
        #[serde(default)]
        climbing_only: bool,
    },
}
