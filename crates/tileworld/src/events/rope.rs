use crate::collision::CollisionLayer;
use crate::session::Hero;
use crate::tile::TilePos;

use super::{FireOutcome, IgnoreReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RopeRole {
    /// Sits on the rope tile itself, live on the rope layer.
    Dock,
    /// Sits next to the dock on the side the entity approaches from.
    Approach,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RopeEvent {
    pub role: RopeRole,
    pub dest: TilePos,
    pub starting_dock: bool,
    pub walk_over_rope: bool,
    pub rope_collision_layer: CollisionLayer,
    pub dock_exit_collision_layer: CollisionLayer,
    pub tied: bool,
}

impl RopeEvent {
    pub fn set_tied(&mut self, tied: bool) {
        self.tied = tied;
    }

    pub(crate) fn fire(&self, hero: &mut Hero) -> FireOutcome {
        if !self.tied {
            return FireOutcome::Ignored(IgnoreReason::RopeUntied);
        }
        match self.role {
            RopeRole::Approach => {
                if !self.walk_over_rope {
                    return FireOutcome::Ignored(IgnoreReason::RopeNotWalkable);
                }
                hero.on_rope = true;
                hero.collision_layer = self.rope_collision_layer;
                FireOutcome::RopeMounted {
                    layer: self.rope_collision_layer,
                    dest: self.dest,
                }
            }
            RopeRole::Dock => {
                if !hero.on_rope {
                    return FireOutcome::Ignored(IgnoreReason::NotOnRope);
                }
                hero.on_rope = false;
                hero.collision_layer = self.dock_exit_collision_layer;
                FireOutcome::RopeDismounted {
                    layer: self.dock_exit_collision_layer,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rope(role: RopeRole, tied: bool) -> RopeEvent {
        RopeEvent {
            role,
            dest: TilePos::new(9, 3),
            starting_dock: true,
            walk_over_rope: true,
            rope_collision_layer: CollisionLayer(4),
            dock_exit_collision_layer: CollisionLayer(0),
            tied,
        }
    }

    #[test]
    fn approach_mounts_and_dock_dismounts() {
        let mut hero = Hero::new(TilePos::new(3, 4), CollisionLayer(0));
        assert!(matches!(
            rope(RopeRole::Approach, true).fire(&mut hero),
            FireOutcome::RopeMounted { dest, .. } if dest == TilePos::new(9, 3)
        ));
        assert!(hero.on_rope);
        assert_eq!(hero.collision_layer, CollisionLayer(4));
        assert!(matches!(
            rope(RopeRole::Dock, true).fire(&mut hero),
            FireOutcome::RopeDismounted { layer } if layer == CollisionLayer(0)
        ));
        assert!(!hero.on_rope);
    }

    #[test]
    fn untied_or_unwalkable_rope_is_ignored() {
        let mut hero = Hero::new(TilePos::new(3, 4), CollisionLayer(0));
        assert!(matches!(
            rope(RopeRole::Approach, false).fire(&mut hero),
            FireOutcome::Ignored(IgnoreReason::RopeUntied)
        ));
        let mut blocked = rope(RopeRole::Approach, true);
        blocked.walk_over_rope = false;
        assert!(matches!(
            blocked.fire(&mut hero),
            FireOutcome::Ignored(IgnoreReason::RopeNotWalkable)
        ));
        assert!(matches!(
            rope(RopeRole::Dock, true).fire(&mut hero),
            FireOutcome::Ignored(IgnoreReason::NotOnRope)
        ));
        assert_eq!(hero.collision_layer, CollisionLayer(0));
    }
}
