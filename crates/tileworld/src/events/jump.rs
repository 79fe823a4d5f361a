use crate::session::Hero;
use crate::tile::Direction;

use super::{FireOutcome, IgnoreReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpEvent {
    pub is_set: bool,
}

impl JumpEvent {
    /// Jumps over the event tile, landing two tiles away in `direction`.
    pub(crate) fn fire(&self, hero: &mut Hero, direction: Direction) -> FireOutcome {
        if !self.is_set {
            return FireOutcome::Ignored(IgnoreReason::NotSet);
        }
        let from = hero.tile;
        let landing = from.step(direction).step(direction);
        hero.place_on_tile(landing);
        hero.direction = direction;
        FireOutcome::Jumped {
            from,
            landing,
            direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionLayer;
    use crate::tile::TilePos;

    #[test]
    fn set_jump_lands_two_tiles_ahead() {
        let mut hero = Hero::new(TilePos::new(5, 4), CollisionLayer(0));
        let outcome = JumpEvent { is_set: true }.fire(&mut hero, Direction::Up);
        match outcome {
            FireOutcome::Jumped { from, landing, .. } => {
                assert_eq!(from, TilePos::new(5, 4));
                assert_eq!(landing, TilePos::new(5, 2));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(hero.tile, TilePos::new(5, 2));
    }

    #[test]
    fn unset_jump_is_ignored() {
        let mut hero = Hero::new(TilePos::new(0, 0), CollisionLayer(0));
        let outcome = JumpEvent { is_set: false }.fire(&mut hero, Direction::Left);
        assert!(matches!(outcome, FireOutcome::Ignored(IgnoreReason::NotSet)));
        assert_eq!(hero.tile, TilePos::new(0, 0));
    }
}
