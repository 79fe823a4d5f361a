use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::collision::{BodyId, BodyKind, CollisionLayer, CollisionLayerSet};
use crate::content::{
    AllowedTile, InteractableObjectDef, InteractableObjectPlacement, ObjectEventOverride,
    ObjectStorageKeys,
};
use crate::events::TileEventId;
use crate::script::{ScriptedEventProvider, ToggleEnableBinding};
use crate::storage::{bound_bool, bound_i32, Storage};
use crate::tile::TilePos;

/// Index of an interactable object within its mounted map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub usize);

/// Fields that changed while re-reading bound storage keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectStorageSync {
    pub position: Option<TilePos>,
    pub base_collision_layer: Option<CollisionLayer>,
    pub enable: Option<bool>,
    pub entangled_by_bush: Option<bool>,
}

impl ObjectStorageSync {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug)]
pub struct InteractableObject {
    id: ObjectId,
    key_name: String,
    label: Option<String>,
    storage_keys: ObjectStorageKeys,
    initial_tile: TilePos,
    tile: TilePos,
    allowed_tiles: Vec<AllowedTile>,
    not_allowed_tiles: Vec<TilePos>,
    base_collision_layer: CollisionLayer,
    enable: bool,
    entangled_by_bush: bool,
    active: bool,
    body_radius: f32,
    block_climb_collision_layer_shift: Option<i32>,
    events_info: BTreeMap<usize, ObjectEventOverride>,
    events: BTreeSet<TileEventId>,
    toggle_enable_events: Vec<ToggleEnableBinding>,
    body: Option<BodyId>,
    blocking_stair_block: Option<BodyId>,
}

impl InteractableObject {
    /// Builds the object from its placement; bound storage keys override the
    /// authored position, base layer, enable and bush flags.
    pub fn from_placement(
        id: ObjectId,
        placement: &InteractableObjectPlacement,
        def: &InteractableObjectDef,
        storage: &dyn Storage,
        scripts: &mut dyn ScriptedEventProvider,
    ) -> Self {
        let keys = placement.storage_keys.clone();
        let authored = TilePos::new(placement.x, placement.y);
        let initial_tile = keys
            .position
            .as_deref()
            .and_then(|key| storage.get_position(key))
            .unwrap_or(authored);
        let base_collision_layer = CollisionLayer(bound_i32(
            storage,
            keys.base_collision_layer.as_deref(),
            placement.base_collision_layer.unwrap_or_default().value(),
        ));
        let enable = bound_bool(
            storage,
            keys.enable.as_deref(),
            placement.enable.unwrap_or(true),
        );
        let entangled_by_bush = bound_bool(
            storage,
            keys.entangled_by_bush.as_deref(),
            placement.entangled_by_bush.unwrap_or(false),
        );
        let toggle_enable_events = placement
            .toggle_enable_events
            .iter()
            .map(|binding| ToggleEnableBinding {
                event: scripts.get_event_instance(&binding.event),
                on_enable: binding.on_enable,
            })
            .collect();

        Self {
            id,
            key_name: placement.key_name.clone(),
            label: placement.label.clone(),
            storage_keys: keys,
            initial_tile,
            tile: initial_tile,
            allowed_tiles: placement.allowed_tiles.clone(),
            not_allowed_tiles: placement.not_allowed_tiles.clone(),
            base_collision_layer,
            enable,
            entangled_by_bush,
            active: true,
            body_radius: def.body_radius,
            block_climb_collision_layer_shift: placement.block_climb_collision_layer_shift,
            events_info: placement.events_info.clone(),
            events: BTreeSet::new(),
            toggle_enable_events,
            body: None,
            blocking_stair_block: None,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn initial_tile(&self) -> TilePos {
        self.initial_tile
    }

    pub fn get_current_position(&self) -> TilePos {
        self.tile
    }

    pub fn base_collision_layer(&self) -> CollisionLayer {
        self.base_collision_layer
    }

    pub fn enable(&self) -> bool {
        self.enable
    }

    pub fn entangled_by_bush(&self) -> bool {
        self.entangled_by_bush
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn body(&self) -> Option<BodyId> {
        self.body
    }

    pub fn blocking_stair_block(&self) -> Option<BodyId> {
        self.blocking_stair_block
    }

    pub fn event_override(&self, index: usize) -> ObjectEventOverride {
        self.events_info.get(&index).copied().unwrap_or_default()
    }

    pub fn is_not_allowed(&self, pos: TilePos) -> bool {
        self.not_allowed_tiles.contains(&pos)
    }

    /// Whether `pos` is in the allowed list for the map's current layer.
    pub fn tile_in_allowed_list(&self, pos: TilePos, map_layer: CollisionLayer) -> bool {
        self.allowed_tiles.iter().any(|tile| {
            tile.x == pos.x && tile.y == pos.y && tile.collision_layer == map_layer
        })
    }

    /// Moves the current tile. Either axis may be left unchanged; the initial
    /// tile is kept.
    pub fn set_tile_position(&mut self, x: Option<i32>, y: Option<i32>) {
        if let Some(x) = x {
            self.tile.x = x;
        }
        if let Some(y) = y {
            self.tile.y = y;
        }
    }

    /// Stores the flag, persists it when bound, then fires every toggle binding
    /// whose trigger equals `enable`. Bindings fire even when the value is unchanged.
    pub fn set_enable(&mut self, enable: bool, storage: &mut dyn Storage) {
        self.enable = enable;
        if let Some(key) = &self.storage_keys.enable {
            storage.set(key, enable.into());
        }
        let mut fired = 0usize;
        for binding in &mut self.toggle_enable_events {
            if binding.on_enable == enable {
                binding.event.fire();
                fired += 1;
            }
        }
        debug!(
            object = %self.key_name,
            enable,
            fired,
            "interactable_object_enable_set"
        );
    }

    pub fn set_entangled_by_bush(&mut self, entangled_by_bush: bool, storage: &mut dyn Storage) {
        self.entangled_by_bush = entangled_by_bush;
        if let Some(key) = &self.storage_keys.entangled_by_bush {
            storage.set(key, entangled_by_bush.into());
        }
    }

    /// Re-reads bound fields. A changed base layer is only reported, so the
    /// caller can route it through the map's layer reassignment.
    pub fn check_storage_keys(&mut self, storage: &dyn Storage) -> ObjectStorageSync {
        let mut sync = ObjectStorageSync::default();
        if let Some(position) = self
            .storage_keys
            .position
            .as_deref()
            .and_then(|key| storage.get_position(key))
        {
            if position != self.tile {
                self.tile = position;
                sync.position = Some(position);
            }
        }
        if let Some(layer) = self
            .storage_keys
            .base_collision_layer
            .as_deref()
            .and_then(|key| storage.get_i32(key))
        {
            if layer != self.base_collision_layer.value() {
                sync.base_collision_layer = Some(CollisionLayer(layer));
            }
        }
        if let Some(enable) = self
            .storage_keys
            .enable
            .as_deref()
            .and_then(|key| storage.get_bool(key))
        {
            if enable != self.enable {
                self.enable = enable;
                sync.enable = Some(enable);
            }
        }
        if let Some(entangled) = self
            .storage_keys
            .entangled_by_bush
            .as_deref()
            .and_then(|key| storage.get_bool(key))
        {
            if entangled != self.entangled_by_bush {
                self.entangled_by_bush = entangled;
                sync.entangled_by_bush = Some(entangled);
            }
        }
        sync
    }

    pub fn insert_event(&mut self, id: TileEventId) {
        self.events.insert(id);
    }

    pub fn remove_event(&mut self, id: TileEventId) {
        self.events.remove(&id);
    }

    pub fn event_ids(&self) -> impl Iterator<Item = TileEventId> + '_ {
        self.events.iter().copied()
    }

    pub fn owns_event(&self, id: TileEventId) -> bool {
        self.events.contains(&id)
    }

    /// Registers the physical body (and stair block) in the collision set.
    /// Objects without a radius or on a negative layer get no body.
    pub fn config_body(&mut self, collision: &mut CollisionLayerSet) {
        if self.body_radius == 0.0 || self.base_collision_layer.value() < 0 {
            return;
        }
        self.body = Some(collision.create_body(
            BodyKind::InteractableObject,
            self.base_collision_layer,
        ));
        if let Some(shift) = self.block_climb_collision_layer_shift {
            self.blocking_stair_block = Some(collision.create_body(
                BodyKind::StairBlock,
                self.base_collision_layer.shifted(shift),
            ));
        }
    }

    /// Moves the body to `layer`'s group and records the new base layer. Spawned
    /// events are re-derived by the owning map.
    pub(crate) fn move_to_layer(&mut self, layer: CollisionLayer, collision: &mut CollisionLayerSet) {
        if let Some(body) = self.body {
            collision.move_body(body, layer);
        }
        if let (Some(block), Some(shift)) =
            (self.blocking_stair_block, self.block_climb_collision_layer_shift)
        {
            collision.move_body(block, layer.shifted(shift));
        }
        self.base_collision_layer = layer;
    }

    pub fn toggle_active(&mut self, active: bool, collision: &mut CollisionLayerSet) {
        for body in self.body.iter().chain(self.blocking_stair_block.iter()) {
            collision.set_collides_with_hero(*body, active);
        }
        self.active = active;
    }

    /// Releases bodies and toggle-enable scripted events. Spawned event ids are
    /// returned so the map can drop them from its registry.
    pub fn unset(&mut self, collision: &mut CollisionLayerSet) -> Vec<TileEventId> {
        for body in self.body.take().into_iter().chain(self.blocking_stair_block.take()) {
            collision.destroy_body(body);
        }
        for binding in &mut self.toggle_enable_events {
            binding.event.destroy();
        }
        self.toggle_enable_events.clear();
        std::mem::take(&mut self.events).into_iter().collect()
    }
}
