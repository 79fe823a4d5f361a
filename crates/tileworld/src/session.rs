use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

use crate::collision::CollisionLayer;
use crate::tile::{Direction, TilePos, Vec2};

#[derive(Debug, Default)]
struct GateCells {
    event_in_progress: Cell<bool>,
    teleporting: Cell<bool>,
    dialogue_open: Cell<bool>,
}

/// Session-wide movement gates shared by the frame loop, events and the
/// transition coordinator. Clones share the same flags.
#[derive(Debug, Clone, Default)]
pub struct SessionGates {
    cells: Rc<GateCells>,
}

impl SessionGates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_in_progress(&self) -> bool {
        self.cells.event_in_progress.get()
    }

    pub fn teleporting(&self) -> bool {
        self.cells.teleporting.get()
    }

    pub fn dialogue_open(&self) -> bool {
        self.cells.dialogue_open.get()
    }

    pub fn set_dialogue_open(&self, open: bool) {
        self.cells.dialogue_open.set(open);
    }

    pub fn movement_allowed(&self) -> bool {
        !self.event_in_progress() && !self.teleporting() && !self.dialogue_open()
    }

    /// Raises the in-progress flag (and `teleporting` when asked). Both drop
    /// back to false when the returned guard is dropped, on every path.
    pub fn begin_event(&self, teleporting: bool) -> EventGuard {
        self.cells.event_in_progress.set(true);
        if teleporting {
            self.cells.teleporting.set(true);
        }
        debug!(teleporting, "session_gates_acquired");
        EventGuard {
            gates: self.clone(),
        }
    }

    /// Clears both event flags without a guard. For teardown that abandons a
    /// sequence whose guard is still alive elsewhere.
    pub fn force_clear(&self) {
        self.cells.event_in_progress.set(false);
        self.cells.teleporting.set(false);
    }
}

#[derive(Debug)]
pub struct EventGuard {
    gates: SessionGates,
}

impl Drop for EventGuard {
    fn drop(&mut self) {
        self.gates.force_clear();
        debug!("session_gates_released");
    }
}

/// The controlled entity as seen by tile events.
#[derive(Debug, Clone, PartialEq)]
pub struct Hero {
    pub tile: TilePos,
    pub position: Vec2,
    pub collision_layer: CollisionLayer,
    pub direction: Direction,
    pub climbing: bool,
    pub on_rope: bool,
    pub on_reveal: bool,
    pub stopped_by_colliding: bool,
    tile_width: f32,
    tile_height: f32,
}

impl Hero {
    pub fn new(tile: TilePos, collision_layer: CollisionLayer) -> Self {
        let mut hero = Self {
            tile,
            position: Vec2 { x: 0.0, y: 0.0 },
            collision_layer,
            direction: Direction::Down,
            climbing: false,
            on_rope: false,
            on_reveal: false,
            stopped_by_colliding: false,
            tile_width: 16.0,
            tile_height: 16.0,
        };
        hero.place_on_tile(tile);
        hero
    }

    pub fn set_tile_size(&mut self, tile_width: f32, tile_height: f32) {
        self.tile_width = tile_width;
        self.tile_height = tile_height;
    }

    /// Centers the entity on `tile`.
    pub fn place_on_tile(&mut self, tile: TilePos) {
        self.tile = tile;
        self.position = tile.center_px(self.tile_width, self.tile_height);
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.tile = position.to_tile(self.tile_width, self.tile_height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_drop_clears_both_flags() {
        let gates = SessionGates::new();
        {
            let _guard = gates.begin_event(true);
            assert!(gates.event_in_progress());
            assert!(gates.teleporting());
            assert!(!gates.movement_allowed());
        }
        assert!(!gates.event_in_progress());
        assert!(!gates.teleporting());
        assert!(gates.movement_allowed());
    }

    #[test]
    fn dialogue_blocks_movement() {
        let gates = SessionGates::new();
        gates.set_dialogue_open(true);
        assert!(!gates.movement_allowed());
        gates.set_dialogue_open(false);
        assert!(gates.movement_allowed());
    }

    #[test]
    fn clones_share_flags() {
        let gates = SessionGates::new();
        let observer = gates.clone();
        let guard = gates.begin_event(false);
        assert!(observer.event_in_progress());
        assert!(!observer.teleporting());
        drop(guard);
        assert!(!observer.event_in_progress());
    }

    #[test]
    fn placing_on_tile_centers_position() {
        let mut hero = Hero::new(TilePos::new(0, 0), CollisionLayer(0));
        hero.set_tile_size(16.0, 16.0);
        hero.place_on_tile(TilePos::new(4, 9));
        assert_eq!(hero.position, Vec2 { x: 72.0, y: 152.0 });
        hero.set_position(Vec2 { x: 40.0, y: 8.0 });
        assert_eq!(hero.tile, TilePos::new(2, 0));
    }
}
