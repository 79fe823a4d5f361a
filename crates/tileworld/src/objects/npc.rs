use tracing::debug;

use crate::collision::{BodyId, BodyKind, CollisionLayer, CollisionLayerSet};
use crate::content::{NpcDef, NpcPlacement, NpcStorageKeys};
use crate::script::{ScriptedEvent, ScriptedEventProvider};
use crate::storage::{bound_bool, bound_i32, Storage};
use crate::tile::TilePos;

/// A dialogue character placed on the map.
pub struct Npc {
    key_name: String,
    label: Option<String>,
    tile: TilePos,
    base_collision_layer: CollisionLayer,
    affected_by_reveal: bool,
    visible: bool,
    active: bool,
    body_radius: f32,
    storage_keys: NpcStorageKeys,
    events: Vec<Box<dyn ScriptedEvent>>,
    body: Option<BodyId>,
}

impl std::fmt::Debug for Npc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Npc")
            .field("key_name", &self.key_name)
            .field("tile", &self.tile)
            .field("base_collision_layer", &self.base_collision_layer)
            .field("active", &self.active)
            .field("events", &self.events.len())
            .finish_non_exhaustive()
    }
}

impl Npc {
    pub fn from_placement(
        placement: &NpcPlacement,
        def: &NpcDef,
        storage: &dyn Storage,
        scripts: &mut dyn ScriptedEventProvider,
    ) -> Self {
        let keys = placement.storage_keys.clone();
        let tile = keys
            .position
            .as_deref()
            .and_then(|key| storage.get_position(key))
            .unwrap_or(TilePos::new(placement.x, placement.y));
        let base_collision_layer = CollisionLayer(bound_i32(
            storage,
            keys.base_collision_layer.as_deref(),
            placement.base_collision_layer.unwrap_or_default().value(),
        ));
        let affected_by_reveal = bound_bool(
            storage,
            keys.affected_by_reveal.as_deref(),
            placement.affected_by_reveal.unwrap_or(false),
        );
        let visible = bound_bool(
            storage,
            keys.visible.as_deref(),
            placement.visible.unwrap_or(true),
        );
        let events = placement
            .events
            .iter()
            .map(|descriptor| scripts.get_event_instance(descriptor))
            .collect();
        Self {
            key_name: placement.key_name.clone(),
            label: placement.label.clone(),
            tile,
            base_collision_layer,
            affected_by_reveal,
            visible,
            active: placement.active,
            body_radius: def.body_radius,
            storage_keys: keys,
            events,
            body: None,
        }
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn tile(&self) -> TilePos {
        self.tile
    }

    pub fn base_collision_layer(&self) -> CollisionLayer {
        self.base_collision_layer
    }

    pub fn affected_by_reveal(&self) -> bool {
        self.affected_by_reveal
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn body(&self) -> Option<BodyId> {
        self.body
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn config_body(&mut self, collision: &mut CollisionLayerSet) {
        if self.body_radius == 0.0 {
            return;
        }
        let body = collision.create_body(BodyKind::Npc, self.base_collision_layer);
        collision.set_collides_with_hero(body, self.active);
        self.body = Some(body);
    }

    /// Re-reads bound fields; a changed base layer also moves the body.
    pub fn check_storage_keys(
        &mut self,
        storage: &dyn Storage,
        collision: &mut CollisionLayerSet,
    ) -> bool {
        let mut changed = false;
        if let Some(layer) = self
            .storage_keys
            .base_collision_layer
            .as_deref()
            .and_then(|key| storage.get_i32(key))
        {
            if layer != self.base_collision_layer.value() {
                self.base_collision_layer = CollisionLayer(layer);
                if let Some(body) = self.body {
                    collision.move_body(body, self.base_collision_layer);
                }
                changed = true;
            }
        }
        if let Some(reveal) = self
            .storage_keys
            .affected_by_reveal
            .as_deref()
            .and_then(|key| storage.get_bool(key))
        {
            changed |= reveal != self.affected_by_reveal;
            self.affected_by_reveal = reveal;
        }
        if let Some(visible) = self
            .storage_keys
            .visible
            .as_deref()
            .and_then(|key| storage.get_bool(key))
        {
            changed |= visible != self.visible;
            self.visible = visible;
        }
        changed
    }

    /// Joins or leaves the hero's collision set.
    pub fn toggle_active(&mut self, active: bool, collision: &mut CollisionLayerSet) {
        if let Some(body) = self.body {
            collision.set_collides_with_hero(body, active);
        }
        self.active = active;
        debug!(npc = %self.key_name, active, "npc_toggled");
    }

    pub fn unset(&mut self, collision: &mut CollisionLayerSet) {
        if let Some(body) = self.body.take() {
            collision.destroy_body(body);
        }
        for event in &mut self.events {
            event.destroy();
        }
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::storage::MemoryStorage;
    use crate::test_support::RecordingScripts;

    fn placement() -> NpcPlacement {
        serde_json::from_value(json!({
            "key_name": "guard",
            "x": 2,
            "y": 3,
            "storage_keys": {"base_collision_layer": "guard_layer", "visible": "guard_visible"},
            "events": [{"type": "dialog", "text": "halt"}]
        }))
        .expect("placement")
    }

    fn def() -> NpcDef {
        NpcDef {
            key_name: "guard".to_string(),
            body_radius: 5.0,
        }
    }

    #[test]
    fn storage_bound_fields_resync_and_move_body() {
        let storage = MemoryStorage::new().with("guard_visible", false);
        let mut scripts = RecordingScripts::default();
        let mut npc = Npc::from_placement(&placement(), &def(), &storage, &mut scripts);
        assert!(!npc.visible());
        assert_eq!(npc.event_count(), 1);

        let mut collision = CollisionLayerSet::default();
        npc.config_body(&mut collision);
        let body = npc.body().expect("body");

        let updated = MemoryStorage::new()
            .with("guard_layer", 2)
            .with("guard_visible", true);
        assert!(npc.check_storage_keys(&updated, &mut collision));
        assert_eq!(npc.base_collision_layer(), CollisionLayer(2));
        assert_eq!(collision.body(body).expect("record").layer, CollisionLayer(2));
        assert!(npc.visible());
        assert!(!npc.check_storage_keys(&updated, &mut collision));
    }

    #[test]
    fn toggle_active_and_unset() {
        let storage = MemoryStorage::new();
        let mut scripts = RecordingScripts::default();
        let mut npc = Npc::from_placement(&placement(), &def(), &storage, &mut scripts);
        let mut collision = CollisionLayerSet::default();
        npc.config_body(&mut collision);
        let body = npc.body().expect("body");

        npc.toggle_active(false, &mut collision);
        assert!(!npc.is_active());
        assert!(!collision.body(body).expect("record").collides_with_hero);

        npc.unset(&mut collision);
        assert_eq!(collision.body_count(), 0);
        assert_eq!(scripts.destroyed(), 1);
    }
}
