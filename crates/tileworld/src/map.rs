use tracing::{debug, info};

use crate::collision::{CollisionLayer, CollisionLayerSet};
use crate::content::{
    DefinitionError, DefinitionTables, MapDefinition, MapTileEventDef, MapTileEventKind,
};
use crate::events::{
    ClimbEvent, EventRegistry, JumpEvent, TeleportEvent, TileEvent, TileEventId,
    TileEventIdAllocator, TileEventKind, TileEventSpec,
};
use crate::location::LocationKey;
use crate::objects::{InteractableObject, InteractableObjectSpawner, Npc, ObjectId};
use crate::script::ScriptedEventProvider;
use crate::storage::Storage;
use crate::tile::{Direction, DirectionSet, TilePos};

/// The mounted map: owns its event registry, interactable objects and NPCs.
#[derive(Debug)]
pub struct GameMap {
    key: String,
    width: u32,
    height: u32,
    tile_width: f32,
    tile_height: f32,
    collision_layer: CollisionLayer,
    referenced_layers: Vec<CollisionLayer>,
    registry: EventRegistry,
    objects: Vec<InteractableObject>,
    npcs: Vec<Npc>,
}

impl GameMap {
    /// Builds objects, NPCs and every tile event for `definition` at `collision_layer`.
    /// Unknown object or NPC keys fail the whole mount.
    pub fn mount(
        definition: &MapDefinition,
        collision_layer: CollisionLayer,
        tables: &DefinitionTables,
        ids: &mut TileEventIdAllocator,
        storage: &dyn Storage,
        scripts: &mut dyn ScriptedEventProvider,
    ) -> Result<Self, DefinitionError> {
        let mut registry = EventRegistry::new();
        let mut objects = Vec::with_capacity(definition.interactable_objects.len());
        for (index, placement) in definition.interactable_objects.iter().enumerate() {
            let def = tables.interactable_object(&placement.key_name)?;
            objects.push(InteractableObject::from_placement(
                ObjectId(index),
                placement,
                def,
                storage,
                scripts,
            ));
        }

        let mut object_events = 0;
        {
            let mut spawner = InteractableObjectSpawner::new(ids, storage, collision_layer);
            for object in &mut objects {
                let def = tables.interactable_object(object.key_name())?;
                object_events += spawner.initialize_related_events(object, def, &mut registry);
            }
        }

        for event_def in &definition.tile_events {
            let id = ids.allocate();
            let event = map_tile_event(id, event_def, storage);
            registry.insert(LocationKey::of(event.position()), event);
        }

        let mut npcs = Vec::with_capacity(definition.npcs.len());
        for placement in &definition.npcs {
            let def = tables.npc(&placement.key_name)?;
            npcs.push(Npc::from_placement(placement, def, storage, scripts));
        }

        info!(
            map = %definition.key,
            collision_layer = collision_layer.value(),
            interactable_objects = objects.len(),
            npcs = npcs.len(),
            object_events,
            map_events = definition.tile_events.len(),
            "map_mounted"
        );

        Ok(Self {
            key: definition.key.clone(),
            width: definition.width,
            height: definition.height,
            tile_width: definition.tile_width,
            tile_height: definition.tile_height,
            collision_layer,
            referenced_layers: definition.referenced_layers(collision_layer),
            registry,
            objects,
            npcs,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn tile_width(&self) -> f32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> f32 {
        self.tile_height
    }

    pub fn collision_layer(&self) -> CollisionLayer {
        self.collision_layer
    }

    pub fn referenced_layers(&self) -> &[CollisionLayer] {
        &self.referenced_layers
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    pub fn event(&self, id: TileEventId) -> Option<&TileEvent> {
        self.registry.get(id)
    }

    pub(crate) fn event_mut(&mut self, id: TileEventId) -> Option<&mut TileEvent> {
        self.registry.get_mut(id)
    }

    pub fn objects(&self) -> &[InteractableObject] {
        &self.objects
    }

    pub fn object(&self, id: ObjectId) -> Option<&InteractableObject> {
        self.objects.get(id.0)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut InteractableObject> {
        self.objects.get_mut(id.0)
    }

    pub fn object_by_label(&self, label: &str) -> Option<&InteractableObject> {
        self.objects
            .iter()
            .find(|object| object.label() == Some(label))
    }

    pub fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    /// Events at `pos` that accept an entity entering in `direction` on `layer`, in registry order.
    pub fn candidates(
        &self,
        pos: TilePos,
        direction: Direction,
        layer: CollisionLayer,
    ) -> impl Iterator<Item = &TileEvent> + '_ {
        self.registry
            .lookup(LocationKey::of(pos))
            .iter()
            .filter(move |event| event.accepts(direction, layer))
    }

    /// Registers bodies for every object and NPC in the collision set.
    pub fn config_all_bodies(&mut self, collision: &mut CollisionLayerSet) {
        for object in &mut self.objects {
            object.config_body(collision);
        }
        for npc in &mut self.npcs {
            npc.config_body(collision);
        }
    }

    /// Moves an object to `destination` and re-derives every event it spawned
    /// from the new base layer, all within this call.
    pub fn change_collision_layer(
        &mut self,
        object: ObjectId,
        destination: CollisionLayer,
        collision: &mut CollisionLayerSet,
    ) -> bool {
        let Some(target) = self.objects.get_mut(object.0) else {
            return false;
        };
        let previous = target.base_collision_layer();
        target.move_to_layer(destination, collision);
        let mut updated = 0;
        for id in target.event_ids() {
            if let Some(event) = self.registry.get_mut(id) {
                event.apply_base_layer(destination);
                updated += 1;
            }
        }
        debug!(
            object = %target.key_name(),
            from = previous.value(),
            to = destination.value(),
            events = updated,
            "object_collision_layer_changed"
        );
        true
    }

    /// Ties or unties every rope event spawned by `object`. Returns how many
    /// events were updated.
    pub fn set_rope_tied(&mut self, object: ObjectId, tied: bool) -> usize {
        let Some(owner) = self.objects.get(object.0) else {
            return 0;
        };
        let mut updated = 0;
        for id in owner.event_ids() {
            let kind = self.registry.get_mut(id).map(TileEvent::kind_mut);
            if let Some(TileEventKind::Rope(rope)) = kind {
                rope.set_tied(tied);
                updated += 1;
            }
        }
        debug!(object = %owner.key_name(), tied, events = updated, "rope_tied_set");
        updated
    }

    /// No other object already sits on `pos` at this object's layer, and `pos`
    /// is in its allowed list for the map's current layer.
    pub fn position_allowed(&self, object: ObjectId, pos: TilePos) -> bool {
        let Some(subject) = self.objects.get(object.0) else {
            return false;
        };
        let occupied = self.objects.iter().any(|other| {
            other.id() != subject.id()
                && other.get_current_position() == pos
                && other.base_collision_layer() == subject.base_collision_layer()
        });
        !occupied && subject.tile_in_allowed_list(pos, self.collision_layer)
    }

    /// Unregisters one event and drops it from its owner's id set.
    pub fn remove_event(&mut self, id: TileEventId) -> Option<TileEvent> {
        let removed = self.registry.remove(id)?;
        if let Some(owner) = removed.origin().and_then(|origin| self.objects.get_mut(origin.0)) {
            owner.remove_event(id);
        }
        Some(removed)
    }

    /// Flips every reveal-affected event. Returns how many were flipped.
    pub fn toggle_reveal_events(&mut self) -> usize {
        let flipped = self
            .registry
            .iter_mut()
            .map(|event| event.toggle_by_reveal())
            .filter(|flipped| *flipped)
            .count();
        debug!(map = %self.key, flipped, "reveal_events_toggled");
        flipped
    }

    /// Re-syncs events, objects and NPCs with their bound storage keys.
    /// Returns how many entities changed.
    pub fn check_storage_keys(
        &mut self,
        storage: &dyn Storage,
        collision: &mut CollisionLayerSet,
    ) -> usize {
        let mut changed = self
            .registry
            .iter_mut()
            .map(|event| event.check_storage_keys(storage))
            .filter(|changed| *changed)
            .count();

        let mut relayered = Vec::new();
        for object in &mut self.objects {
            let sync = object.check_storage_keys(storage);
            if let Some(layer) = sync.base_collision_layer {
                relayered.push((object.id(), layer));
            }
            if !sync.is_empty() {
                changed += 1;
            }
        }
        for (object, layer) in relayered {
            self.change_collision_layer(object, layer, collision);
        }

        for npc in &mut self.npcs {
            if npc.check_storage_keys(storage, collision) {
                changed += 1;
            }
        }
        changed
    }

    /// Tears the map down: objects and NPCs release their bodies and scripted
    /// events, every event is destroyed and the registry emptied.
    pub fn unset_map(&mut self, collision: &mut CollisionLayerSet) {
        let mut released = 0;
        for object in &mut self.objects {
            released += object.unset(collision).len();
        }
        for npc in &mut self.npcs {
            npc.unset(collision);
        }
        for event in self.registry.iter_mut() {
            event.destroy();
        }
        let events = self.registry.len();
        self.registry.clear();
        collision.clear();
        info!(
            map = %self.key,
            events,
            object_events = released,
            "map_unmounted"
        );
    }
}

fn map_tile_event(id: TileEventId, def: &MapTileEventDef, storage: &dyn Storage) -> TileEvent {
    let directions = def
        .activation_directions
        .as_ref()
        .map(|directions| directions.iter().copied().collect())
        .unwrap_or(DirectionSet::ALL);
    let kind = match &def.kind {
        MapTileEventKind::Teleport {
            target,
            x_target,
            y_target,
            advance_effect,
            dest_collision_layer,
            destination_direction,
        } => TileEventKind::Teleport(TeleportEvent {
            target: target.clone(),
            target_pos: TilePos::new(*x_target, *y_target),
            advance_effect: *advance_effect,
            destination_layer: *dest_collision_layer,
            destination_direction: *destination_direction,
        }),
        MapTileEventKind::Jump { is_set } => TileEventKind::Jump(JumpEvent { is_set: *is_set }),
        MapTileEventKind::Climb {
            change_to_collision_layer,
            climbing_only,
        } => TileEventKind::Climb(ClimbEvent {
            destination_layer: *change_to_collision_layer,
            climbing_only: *climbing_only,
        }),
    };
    let spec = TileEventSpec {
        position: TilePos::new(def.x, def.y),
        activation_directions: directions,
        activation_collision_layers: def.activation_collision_layers.clone(),
        active: def.active,
        dynamic: def.dynamic,
        affected_by_reveal: def.affected_by_reveal,
        active_storage_key: def.active_storage_key.clone(),
        key_name: def.key_name.clone(),
    };
    TileEvent::new(id, spec, kind, storage)
}
