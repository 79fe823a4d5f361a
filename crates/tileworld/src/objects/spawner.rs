use tracing::debug;

use crate::collision::CollisionLayer;
use crate::content::{InteractableObjectDef, ObjectEventKind};
use crate::events::{
    ClimbEvent, EventRegistry, JumpEvent, LayerBinding, RopeEvent, RopeRole, TileEvent,
    TileEventIdAllocator, TileEventKind, TileEventSpec,
};
use crate::location::LocationKey;
use crate::storage::Storage;
use crate::tile::{Direction, DirectionSet, TilePos};

use super::InteractableObject;

/// Neighbors of a jump-around source paired with the direction that walks back
/// toward the source. The order is fixed.
fn surroundings(source: TilePos) -> [(TilePos, Direction); 4] {
    [
        (source.offset(-1, 0), Direction::Right),
        (source.offset(1, 0), Direction::Left),
        (source.offset(0, -1), Direction::Down),
        (source.offset(0, 1), Direction::Up),
    ]
}

/// Tile next to a rope dock reached when approaching in `direction`.
fn rope_approach_tile(dock: TilePos, direction: Direction) -> Option<TilePos> {
    match direction {
        Direction::Up => Some(dock.offset(0, 1)),
        Direction::Down => Some(dock.offset(0, -1)),
        Direction::Right => Some(dock.offset(-1, 0)),
        Direction::Left => Some(dock.offset(1, 0)),
        _ => None,
    }
}

struct Derived {
    position: TilePos,
    directions: DirectionSet,
    layer: CollisionLayer,
    binding: Option<LayerBinding>,
    kind: TileEventKind,
}

/// Derives an object's tile events from its definition and registers them.
pub struct InteractableObjectSpawner<'a> {
    ids: &'a mut TileEventIdAllocator,
    storage: &'a dyn Storage,
    map_collision_layer: CollisionLayer,
}

impl<'a> InteractableObjectSpawner<'a> {
    pub fn new(
        ids: &'a mut TileEventIdAllocator,
        storage: &'a dyn Storage,
        map_collision_layer: CollisionLayer,
    ) -> Self {
        Self {
            ids,
            storage,
            map_collision_layer,
        }
    }

    /// Registers every event the object's descriptors produce and records the
    /// ids on the object. Returns how many events were registered.
    pub fn initialize_related_events(
        &mut self,
        object: &mut InteractableObject,
        def: &InteractableObjectDef,
        registry: &mut EventRegistry,
    ) -> usize {
        let base = object.base_collision_layer();
        let mut position = object.get_current_position();
        let mut registered = 0;

        for (index, descriptor) in def.events.iter().enumerate() {
            let overrides = object.event_override(index);
            position = position.offset(descriptor.x_shift, descriptor.y_shift);
            let shift = overrides.collision_layer_shift;
            let target_layer = base.shifted(shift);
            let active = overrides.active.or(descriptor.active).unwrap_or(true);

            let derived = match &descriptor.kind {
                ObjectEventKind::Jump { is_set } => vec![Derived {
                    position,
                    directions: Direction::CARDINALS.into_iter().collect(),
                    layer: target_layer,
                    binding: Some(LayerBinding::relative(shift)),
                    kind: TileEventKind::Jump(JumpEvent { is_set: *is_set }),
                }],
                ObjectEventKind::JumpAround { is_set } => surroundings(position)
                    .into_iter()
                    .map(|(tile, direction)| Derived {
                        position: tile,
                        directions: DirectionSet::single(direction),
                        layer: target_layer,
                        binding: Some(LayerBinding::relative(shift)),
                        kind: TileEventKind::Jump(JumpEvent { is_set: *is_set }),
                    })
                    .collect(),
                ObjectEventKind::Climb { top_event_y_shift } => climb_events(
                    position,
                    base,
                    *top_event_y_shift,
                    shift,
                    overrides.intermediate_collision_layer_shift,
                ),
                ObjectEventKind::Rope {
                    activation_directions,
                    rope_collision_layer,
                    dest_x,
                    dest_y,
                    starting_dock,
                    walk_over_rope,
                    dock_exit_collision_layer,
                    tied,
                } => {
                    let rope = RopeEvent {
                        role: RopeRole::Dock,
                        dest: TilePos::new(*dest_x, *dest_y),
                        starting_dock: *starting_dock,
                        walk_over_rope: *walk_over_rope,
                        rope_collision_layer: *rope_collision_layer,
                        dock_exit_collision_layer: dock_exit_collision_layer
                            .unwrap_or(self.map_collision_layer),
                        tied: *tied,
                    };
                    let directions = activation_directions
                        .clone()
                        .unwrap_or_else(|| Direction::CARDINALS.to_vec());
                    rope_events(position, &directions, rope, target_layer, shift)
                }
            };

            for event in derived {
                // Climb stages sit on the object's own staircase and are never excluded.
                let excludable = !matches!(descriptor.kind, ObjectEventKind::Climb { .. });
                if excludable && object.is_not_allowed(event.position) {
                    debug!(
                        object = %object.key_name(),
                        x = event.position.x,
                        y = event.position.y,
                        event_type = descriptor.kind.label(),
                        "tile_event_excluded"
                    );
                    continue;
                }
                let id = self.ids.allocate();
                let spec = TileEventSpec {
                    position: event.position,
                    activation_directions: event.directions,
                    activation_collision_layers: vec![event.layer],
                    active,
                    dynamic: descriptor.dynamic,
                    affected_by_reveal: false,
                    active_storage_key: None,
                    key_name: None,
                };
                let tile_event = TileEvent::new(id, spec, event.kind, self.storage)
                    .with_origin(object.id(), event.binding);
                debug!(
                    object = %object.key_name(),
                    event_id = id.0,
                    x = event.position.x,
                    y = event.position.y,
                    layer = event.layer.value(),
                    event_type = descriptor.kind.label(),
                    "tile_event_registered"
                );
                registry.insert(LocationKey::of(event.position), tile_event);
                object.insert_event(id);
                registered += 1;
            }
        }
        registered
    }
}

/// The four staircase stages: bottom entry, bottom exit, top entry, top exit.
fn climb_events(
    position: TilePos,
    base: CollisionLayer,
    top_event_y_shift: i32,
    shift: i32,
    intermediate_shift: i32,
) -> Vec<Derived> {
    let stages = [
        (position.offset(0, 1), Direction::Up, 0, intermediate_shift, false),
        (position, Direction::Down, intermediate_shift, 0, true),
        (
            position.offset(0, top_event_y_shift.wrapping_add(1)),
            Direction::Up,
            intermediate_shift,
            shift,
            true,
        ),
        (
            position.offset(0, top_event_y_shift),
            Direction::Down,
            shift,
            intermediate_shift,
            false,
        ),
    ];
    stages
        .into_iter()
        .map(
            |(tile, direction, activation_shift, destination_shift, climbing_only)| Derived {
                position: tile,
                directions: DirectionSet::single(direction),
                layer: base.shifted(activation_shift),
                binding: Some(LayerBinding::with_destination(
                    activation_shift,
                    destination_shift,
                )),
                kind: TileEventKind::Climb(ClimbEvent {
                    destination_layer: base.shifted(destination_shift),
                    climbing_only,
                }),
            },
        )
        .collect()
}

/// Dock event on the rope layer first, then one approach event per direction.
fn rope_events(
    dock: TilePos,
    directions: &[Direction],
    rope: RopeEvent,
    target_layer: CollisionLayer,
    shift: i32,
) -> Vec<Derived> {
    let mut events = vec![Derived {
        position: dock,
        directions: DirectionSet::ALL,
        layer: rope.rope_collision_layer,
        binding: None,
        kind: TileEventKind::Rope(rope),
    }];
    for direction in directions {
        let Some(tile) = rope_approach_tile(dock, *direction) else {
            continue;
        };
        events.push(Derived {
            position: tile,
            directions: DirectionSet::single(*direction),
            layer: target_layer,
            binding: Some(LayerBinding::relative(shift)),
            kind: TileEventKind::Rope(RopeEvent {
                role: RopeRole::Approach,
                ..rope
            }),
        });
    }
    events
}
