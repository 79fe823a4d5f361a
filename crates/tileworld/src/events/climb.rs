use crate::collision::CollisionLayer;
use crate::session::Hero;

use super::{FireOutcome, IgnoreReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClimbEvent {
    pub destination_layer: CollisionLayer,
    /// Only fires for an entity that is already climbing.
    pub climbing_only: bool,
}

impl ClimbEvent {
    pub fn change_collision_layer_destination(&mut self, layer: CollisionLayer) {
        self.destination_layer = layer;
    }

    /// Starts climbing when the entity is on foot, finishes it when already climbing.
    pub(crate) fn fire(&self, hero: &mut Hero) -> FireOutcome {
        if hero.climbing != self.climbing_only {
            return FireOutcome::Ignored(IgnoreReason::ClimbStateMismatch);
        }
        hero.collision_layer = self.destination_layer;
        hero.climbing = !hero.climbing;
        if hero.climbing {
            FireOutcome::ClimbStarted {
                layer: self.destination_layer,
            }
        } else {
            FireOutcome::ClimbFinished {
                layer: self.destination_layer,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TilePos;

    #[test]
    fn entry_then_exit_round_trips_climbing_state() {
        let mut hero = Hero::new(TilePos::new(0, 0), CollisionLayer(0));
        let entry = ClimbEvent {
            destination_layer: CollisionLayer(1),
            climbing_only: false,
        };
        let exit = ClimbEvent {
            destination_layer: CollisionLayer(2),
            climbing_only: true,
        };

        assert!(matches!(
            exit.fire(&mut hero),
            FireOutcome::Ignored(IgnoreReason::ClimbStateMismatch)
        ));
        assert!(matches!(
            entry.fire(&mut hero),
            FireOutcome::ClimbStarted { layer } if layer == CollisionLayer(1)
        ));
        assert!(hero.climbing);
        assert!(matches!(
            exit.fire(&mut hero),
            FireOutcome::ClimbFinished { layer } if layer == CollisionLayer(2)
        ));
        assert!(!hero.climbing);
        assert_eq!(hero.collision_layer, CollisionLayer(2));
    }
}
