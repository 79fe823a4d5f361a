use tracing::{debug, info};

use crate::collision::{CollisionLayer, CollisionLayerSet};
use crate::config::WorldConfig;
use crate::content::{DefinitionError, DefinitionTables, MapDefinition};
use crate::events::{
    FireOutcome, IgnoreReason, TileEventId, TileEventIdAllocator, TileEventKind,
};
use crate::map::GameMap;
use crate::objects::ObjectId;
use crate::script::ScriptedEventProvider;
use crate::session::{Hero, SessionGates};
use crate::storage::Storage;
use crate::tile::Direction;

/// Single-threaded session context: the hero, the mounted map, collision
/// groups, movement gates and the external collaborators they consume.
pub struct World {
    config: WorldConfig,
    gates: SessionGates,
    hero: Hero,
    map: Option<GameMap>,
    collision: CollisionLayerSet,
    ids: TileEventIdAllocator,
    tables: DefinitionTables,
    storage: Box<dyn Storage>,
    scripts: Box<dyn ScriptedEventProvider>,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("hero", &self.hero)
            .field("map", &self.map.as_ref().map(GameMap::key))
            .field("gates", &self.gates)
            .finish_non_exhaustive()
    }
}

impl World {
    pub fn new(
        config: WorldConfig,
        tables: DefinitionTables,
        storage: Box<dyn Storage>,
        scripts: Box<dyn ScriptedEventProvider>,
        hero: Hero,
    ) -> Self {
        let mut hero = hero;
        hero.set_tile_size(config.default_tile_width, config.default_tile_height);
        Self {
            config,
            gates: SessionGates::new(),
            hero,
            map: None,
            collision: CollisionLayerSet::default(),
            ids: TileEventIdAllocator::default(),
            tables,
            storage,
            scripts,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn gates(&self) -> &SessionGates {
        &self.gates
    }

    pub fn hero(&self) -> &Hero {
        &self.hero
    }

    pub fn hero_mut(&mut self) -> &mut Hero {
        &mut self.hero
    }

    pub fn map(&self) -> Option<&GameMap> {
        self.map.as_ref()
    }

    pub fn map_mut(&mut self) -> Option<&mut GameMap> {
        self.map.as_mut()
    }

    pub fn collision(&self) -> &CollisionLayerSet {
        &self.collision
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn storage_mut(&mut self) -> &mut dyn Storage {
        self.storage.as_mut()
    }

    /// Unmounts the current map (if any) and mounts `definition` at `collision_layer`.
    pub fn mount_map(
        &mut self,
        definition: &MapDefinition,
        collision_layer: CollisionLayer,
    ) -> Result<(), DefinitionError> {
        self.unmount_map();
        let map = GameMap::mount(
            definition,
            collision_layer,
            &self.tables,
            &mut self.ids,
            self.storage.as_ref(),
            self.scripts.as_mut(),
        )?;
        self.hero.set_tile_size(map.tile_width(), map.tile_height());
        self.map = Some(map);
        Ok(())
    }

    /// Creates collision groups for every layer the map uses and registers all bodies.
    pub fn rebuild_collision(&mut self) {
        let Some(map) = self.map.as_mut() else {
            return;
        };
        self.collision.clear();
        self.collision
            .config_collision_groups(map.referenced_layers().iter().copied());
        map.config_all_bodies(&mut self.collision);
        debug!(
            map = %map.key(),
            groups = self.collision.group_count(),
            bodies = self.collision.body_count(),
            "collision_rebuilt"
        );
    }

    /// Mounts `definition`, rebuilds collision and puts the hero on `collision_layer`.
    pub fn enter_map(
        &mut self,
        definition: &MapDefinition,
        collision_layer: CollisionLayer,
    ) -> Result<(), DefinitionError> {
        self.mount_map(definition, collision_layer)?;
        self.rebuild_collision();
        self.hero.collision_layer = collision_layer;
        Ok(())
    }

    pub fn unmount_map(&mut self) {
        if let Some(mut map) = self.map.take() {
            map.unset_map(&mut self.collision);
        }
    }

    /// Fires one event for the hero moving in `direction`.
    ///
    /// Guard failures (no map, unknown or inactive event, stale position, closed
    /// movement gate) come back as `FireOutcome::Ignored`. A teleport returns
    /// its plan with the session gates already raised.
    pub fn fire(&mut self, id: TileEventId, direction: Direction) -> FireOutcome {
        let Some(map) = self.map.as_ref() else {
            return FireOutcome::Ignored(IgnoreReason::NoMap);
        };
        let Some(event) = map.event(id) else {
            return FireOutcome::Ignored(IgnoreReason::UnknownEvent);
        };
        if !event.is_active() {
            return FireOutcome::Ignored(IgnoreReason::Inactive);
        }
        if event.position() != self.hero.tile {
            return FireOutcome::Ignored(IgnoreReason::StalePosition);
        }
        if !self.gates.movement_allowed() {
            return FireOutcome::Ignored(IgnoreReason::MovementBlocked);
        }
        if !event.activation_directions().contains(direction) {
            return FireOutcome::Ignored(IgnoreReason::DirectionMismatch);
        }

        let outcome = match event.kind() {
            TileEventKind::Jump(jump) => jump.fire(&mut self.hero, direction),
            TileEventKind::Climb(climb) => climb.fire(&mut self.hero),
            TileEventKind::Rope(rope) => rope.fire(&mut self.hero),
            TileEventKind::Teleport(teleport) => {
                let guard = self.gates.begin_event(true);
                FireOutcome::Teleport(teleport.arm(
                    id,
                    event.position(),
                    event.activation_directions(),
                    guard,
                ))
            }
        };
        info!(
            event_id = id.0,
            event_type = event.event_type().label(),
            x = event.position().x,
            y = event.position().y,
            outcome = outcome.label(),
            "tile_event_fired"
        );
        outcome
    }

    /// Movement entry point after the hero crossed into a new tile. Events there
    /// that accept `direction` on the hero's layer are tried in registry order
    /// and the first one that does not ignore the hero fires. When every
    /// candidate ignores, the last reason is returned.
    pub fn on_tile_enter(&mut self, direction: Direction) -> FireOutcome {
        let Some(map) = self.map.as_ref() else {
            return FireOutcome::Ignored(IgnoreReason::NoMap);
        };
        let candidates: Vec<TileEventId> = map
            .candidates(self.hero.tile, direction, self.hero.collision_layer)
            .map(|event| event.id())
            .collect();
        let mut outcome = FireOutcome::Ignored(IgnoreReason::NoCandidate);
        for id in candidates {
            outcome = self.fire(id, direction);
            if !outcome.is_ignored() {
                break;
            }
        }
        outcome
    }

    /// Steps the hero one tile and runs the tile-enter check.
    pub fn move_hero(&mut self, direction: Direction) -> FireOutcome {
        if !self.gates.movement_allowed() {
            return FireOutcome::Ignored(IgnoreReason::MovementBlocked);
        }
        let next = self.hero.tile.step(direction);
        self.hero.place_on_tile(next);
        self.hero.direction = direction;
        self.on_tile_enter(direction)
    }

    pub fn change_object_collision_layer(
        &mut self,
        object: ObjectId,
        destination: CollisionLayer,
    ) -> bool {
        match self.map.as_mut() {
            Some(map) => map.change_collision_layer(object, destination, &mut self.collision),
            None => false,
        }
    }

    pub fn set_object_enable(&mut self, object: ObjectId, enable: bool) -> bool {
        let Some(target) = self.map.as_mut().and_then(|map| map.object_mut(object)) else {
            return false;
        };
        target.set_enable(enable, self.storage.as_mut());
        true
    }

    /// Runtime activation toggle for dynamic events; persisted when bound.
    pub fn set_event_active(&mut self, id: TileEventId, active: bool) -> bool {
        let Some(event) = self.map.as_mut().and_then(|map| map.event_mut(id)) else {
            return false;
        };
        event.set_active(active, self.storage.as_mut())
    }

    /// Casts or ends Reveal: flips the hero's flag and every reveal-affected event.
    pub fn toggle_reveal(&mut self) -> usize {
        self.hero.on_reveal = !self.hero.on_reveal;
        self.map
            .as_mut()
            .map_or(0, GameMap::toggle_reveal_events)
    }

    pub fn check_storage_keys(&mut self) -> usize {
        match self.map.as_mut() {
            Some(map) => map.check_storage_keys(self.storage.as_ref(), &mut self.collision),
            None => 0,
        }
    }
}
