use crate::collision::CollisionLayer;
use crate::session::EventGuard;
use crate::tile::{Direction, DirectionSet, TilePos};
use crate::transition::TeleportPlan;

use super::TileEventId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeleportEvent {
    pub target: String,
    pub target_pos: TilePos,
    pub advance_effect: bool,
    pub destination_layer: CollisionLayer,
    pub destination_direction: Option<Direction>,
}

impl TeleportEvent {
    /// Facing on arrival: the authored direction, else the first activation direction.
    pub fn resolved_direction(&self, activation_directions: DirectionSet) -> Direction {
        self.destination_direction
            .or_else(|| activation_directions.first())
            .unwrap_or(Direction::Down)
    }

    pub(crate) fn arm(
        &self,
        event_id: TileEventId,
        event_position: TilePos,
        activation_directions: DirectionSet,
        guard: EventGuard,
    ) -> TeleportPlan {
        TeleportPlan {
            event_id,
            event_position,
            target: self.target.clone(),
            target_pos: self.target_pos,
            destination_layer: self.destination_layer,
            destination_direction: self.resolved_direction(activation_directions),
            advance_effect: self.advance_effect,
            guard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn door(direction: Option<Direction>) -> TeleportEvent {
        TeleportEvent {
            target: "madra_inn".to_string(),
            target_pos: TilePos::new(4, 9),
            advance_effect: true,
            destination_layer: CollisionLayer(1),
            destination_direction: direction,
        }
    }

    #[test]
    fn authored_direction_wins() {
        let event = door(Some(Direction::Left));
        assert_eq!(
            event.resolved_direction(DirectionSet::single(Direction::Up)),
            Direction::Left
        );
    }

    #[test]
    fn falls_back_to_first_activation_direction() {
        let event = door(None);
        assert_eq!(
            event.resolved_direction(DirectionSet::single(Direction::Up)),
            Direction::Up
        );
        assert_eq!(event.resolved_direction(DirectionSet::EMPTY), Direction::Down);
    }
}
