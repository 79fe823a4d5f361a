//! Tile events: location-bound triggers fired when the controlled entity
//! enters a tile moving in an accepted direction on an accepted layer.

mod climb;
mod jump;
mod registry;
mod rope;
mod teleport;

use std::fmt;

use tracing::debug;

use crate::collision::CollisionLayer;
use crate::objects::ObjectId;
use crate::storage::{bound_bool, Storage};
use crate::tile::{Direction, DirectionSet, TilePos};
use crate::transition::TeleportPlan;

pub use climb::ClimbEvent;
pub use jump::JumpEvent;
pub use registry::EventRegistry;
pub use rope::{RopeEvent, RopeRole};
pub use teleport::TeleportEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileEventId(pub u64);

impl fmt::Display for TileEventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out event ids; never reuses one for the lifetime of the allocator.
#[derive(Debug, Default)]
pub struct TileEventIdAllocator {
    next: u64,
}

impl TileEventIdAllocator {
    pub fn allocate(&mut self) -> TileEventId {
        let id = TileEventId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Jump,
    Climb,
    Rope,
    Teleport,
}

impl EventType {
    pub fn label(self) -> &'static str {
        match self {
            EventType::Jump => "jump",
            EventType::Climb => "climb",
            EventType::Rope => "rope",
            EventType::Teleport => "teleport",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TileEventKind {
    Jump(JumpEvent),
    Climb(ClimbEvent),
    Rope(RopeEvent),
    Teleport(TeleportEvent),
}

impl TileEventKind {
    pub fn event_type(&self) -> EventType {
        match self {
            TileEventKind::Jump(_) => EventType::Jump,
            TileEventKind::Climb(_) => EventType::Climb,
            TileEventKind::Rope(_) => EventType::Rope,
            TileEventKind::Teleport(_) => EventType::Teleport,
        }
    }
}

/// How an object-spawned event re-derives its layers from the owner's base layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerBinding {
    pub activation_shift: i32,
    pub destination_shift: Option<i32>,
}

impl LayerBinding {
    pub fn relative(activation_shift: i32) -> Self {
        Self {
            activation_shift,
            destination_shift: None,
        }
    }

    pub fn with_destination(activation_shift: i32, destination_shift: i32) -> Self {
        Self {
            activation_shift,
            destination_shift: Some(destination_shift),
        }
    }
}

/// Fields shared by every event variant at construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct TileEventSpec {
    pub position: TilePos,
    pub activation_directions: DirectionSet,
    pub activation_collision_layers: Vec<CollisionLayer>,
    pub active: bool,
    pub dynamic: bool,
    pub affected_by_reveal: bool,
    pub active_storage_key: Option<String>,
    pub key_name: Option<String>,
}

impl TileEventSpec {
    pub fn new(
        position: TilePos,
        activation_directions: DirectionSet,
        activation_collision_layer: CollisionLayer,
    ) -> Self {
        Self {
            position,
            activation_directions,
            activation_collision_layers: vec![activation_collision_layer],
            active: true,
            dynamic: false,
            affected_by_reveal: false,
            active_storage_key: None,
            key_name: None,
        }
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn dynamic(mut self, dynamic: bool) -> Self {
        self.dynamic = dynamic;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileEvent {
    id: TileEventId,
    key_name: Option<String>,
    position: TilePos,
    activation_directions: DirectionSet,
    activation_collision_layers: Vec<CollisionLayer>,
    active: bool,
    dynamic: bool,
    affected_by_reveal: bool,
    active_storage_key: Option<String>,
    origin: Option<ObjectId>,
    layer_binding: Option<LayerBinding>,
    kind: TileEventKind,
}

impl TileEvent {
    /// Builds an event; a bound storage key overrides `spec.active`.
    pub fn new(
        id: TileEventId,
        spec: TileEventSpec,
        kind: TileEventKind,
        storage: &dyn Storage,
    ) -> Self {
        let active = bound_bool(storage, spec.active_storage_key.as_deref(), spec.active);
        Self {
            id,
            key_name: spec.key_name,
            position: spec.position,
            activation_directions: spec.activation_directions,
            activation_collision_layers: spec.activation_collision_layers,
            active,
            dynamic: spec.dynamic,
            affected_by_reveal: spec.affected_by_reveal,
            active_storage_key: spec.active_storage_key,
            origin: None,
            layer_binding: None,
            kind,
        }
    }

    pub(crate) fn with_origin(mut self, origin: ObjectId, binding: Option<LayerBinding>) -> Self {
        self.origin = Some(origin);
        self.layer_binding = binding;
        self
    }

    pub fn id(&self) -> TileEventId {
        self.id
    }

    pub fn key_name(&self) -> Option<&str> {
        self.key_name.as_deref()
    }

    pub fn position(&self) -> TilePos {
        self.position
    }

    pub fn activation_directions(&self) -> DirectionSet {
        self.activation_directions
    }

    pub fn activation_collision_layers(&self) -> &[CollisionLayer] {
        &self.activation_collision_layers
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn affected_by_reveal(&self) -> bool {
        self.affected_by_reveal
    }

    pub fn origin(&self) -> Option<ObjectId> {
        self.origin
    }

    pub fn layer_binding(&self) -> Option<LayerBinding> {
        self.layer_binding
    }

    pub fn kind(&self) -> &TileEventKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut TileEventKind {
        &mut self.kind
    }

    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    /// Layer the event moves the entity to, for variants that have one.
    pub fn destination_layer(&self) -> Option<CollisionLayer> {
        match &self.kind {
            TileEventKind::Climb(climb) => Some(climb.destination_layer),
            TileEventKind::Teleport(teleport) => Some(teleport.destination_layer),
            TileEventKind::Jump(_) | TileEventKind::Rope(_) => None,
        }
    }

    /// Geometric and activity match for an entity entering this tile.
    pub fn accepts(&self, direction: Direction, layer: CollisionLayer) -> bool {
        self.active
            && self.activation_directions.contains(direction)
            && self.activation_collision_layers.contains(&layer)
    }

    /// Re-derives activation (and destination) layers from the owner's base layer.
    pub fn apply_base_layer(&mut self, base: CollisionLayer) {
        let Some(binding) = self.layer_binding else {
            return;
        };
        self.activation_collision_layers = vec![base.shifted(binding.activation_shift)];
        if let (Some(shift), TileEventKind::Climb(climb)) =
            (binding.destination_shift, &mut self.kind)
        {
            climb.change_collision_layer_destination(base.shifted(shift));
        }
    }

    /// Runtime activation toggle. Non-dynamic events keep their state and return `false`.
    pub fn set_active(&mut self, active: bool, storage: &mut dyn Storage) -> bool {
        if !self.dynamic {
            debug!(event_id = self.id.0, active, "tile_event_toggle_refused_static");
            return false;
        }
        self.active = active;
        if let Some(key) = &self.active_storage_key {
            storage.set(key, active.into());
        }
        true
    }

    pub fn activate(&mut self, storage: &mut dyn Storage) -> bool {
        self.set_active(true, storage)
    }

    pub fn deactivate(&mut self, storage: &mut dyn Storage) -> bool {
        self.set_active(false, storage)
    }

    /// Flips activity when the event reacts to Reveal.
    pub fn toggle_by_reveal(&mut self) -> bool {
        if !self.affected_by_reveal {
            return false;
        }
        self.active = !self.active;
        true
    }

    /// Re-reads the bound activity flag. Returns whether the in-memory state changed.
    pub fn check_storage_keys(&mut self, storage: &dyn Storage) -> bool {
        let Some(key) = &self.active_storage_key else {
            return false;
        };
        let Some(stored) = storage.get_bool(key) else {
            return false;
        };
        let changed = stored != self.active;
        self.active = stored;
        changed
    }

    /// Drops the owner back-reference and forces the event inactive. Idempotent.
    pub fn destroy(&mut self) {
        self.origin = None;
        self.layer_binding = None;
        self.active = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NoMap,
    NoCandidate,
    UnknownEvent,
    Inactive,
    StalePosition,
    MovementBlocked,
    DirectionMismatch,
    NotSet,
    ClimbStateMismatch,
    RopeUntied,
    RopeNotWalkable,
    NotOnRope,
}

/// Result of asking an event to fire.
#[derive(Debug)]
pub enum FireOutcome {
    Ignored(IgnoreReason),
    Jumped {
        from: TilePos,
        landing: TilePos,
        direction: Direction,
    },
    ClimbStarted {
        layer: CollisionLayer,
    },
    ClimbFinished {
        layer: CollisionLayer,
    },
    RopeMounted {
        layer: CollisionLayer,
        dest: TilePos,
    },
    RopeDismounted {
        layer: CollisionLayer,
    },
    Teleport(TeleportPlan),
}

impl FireOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, FireOutcome::Ignored(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            FireOutcome::Ignored(_) => "ignored",
            FireOutcome::Jumped { .. } => "jumped",
            FireOutcome::ClimbStarted { .. } => "climb_started",
            FireOutcome::ClimbFinished { .. } => "climb_finished",
            FireOutcome::RopeMounted { .. } => "rope_mounted",
            FireOutcome::RopeDismounted { .. } => "rope_dismounted",
            FireOutcome::Teleport(_) => "teleport",
        }
    }
}
