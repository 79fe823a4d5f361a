use serde::Deserialize;

use crate::collision::CollisionLayer;
use crate::tile::Direction;

fn default_true() -> bool {
    true
}

/// Static definition of an interactable object kind (one entry of `interactable_objects.json`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InteractableObjectDef {
    pub key_name: String,
    #[serde(default)]
    pub body_radius: f32,
    #[serde(default)]
    pub events: Vec<ObjectEventDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NpcDef {
    pub key_name: String,
    #[serde(default)]
    pub body_radius: f32,
}

/// One authored event descriptor of an object kind. Shifts are relative to the
/// previous descriptor's resolved tile (the first one to the object itself).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObjectEventDescriptor {
    #[serde(default)]
    pub x_shift: i32,
    #[serde(default)]
    pub y_shift: i32,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub dynamic: bool,
    #[serde(flatten)]
    pub kind: ObjectEventKind,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectEventKind {
    Jump {
        #[serde(default = "default_true")]
        is_set: bool,
    },
    JumpAround {
        #[serde(default = "default_true")]
        is_set: bool,
    },
    Climb {
        top_event_y_shift: i32,
    },
    Rope {
        #[serde(default)]
        activation_directions: Option<Vec<Direction>>,
        rope_collision_layer: CollisionLayer,
        dest_x: i32,
        dest_y: i32,
        #[serde(default)]
        starting_dock: bool,
        #[serde(default)]
        walk_over_rope: bool,
        #[serde(default)]
        dock_exit_collision_layer: Option<CollisionLayer>,
        #[serde(default)]
        tied: bool,
    },
}

impl ObjectEventKind {
    pub fn label(&self) -> &'static str {
        match self {
            ObjectEventKind::Jump { .. } => "jump",
            ObjectEventKind::JumpAround { .. } => "jump_around",
            ObjectEventKind::Climb { .. } => "climb",
            ObjectEventKind::Rope { .. } => "rope",
        }
    }
}

/// Per-placement override for the descriptor at the same index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct ObjectEventOverride {
    #[serde(default)]
    pub collision_layer_shift: i32,
    #[serde(default)]
    pub intermediate_collision_layer_shift: i32,
    #[serde(default)]
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_parse_each_event_type() {
        let raw = r#"{
            "key_name": "ladder",
            "body_radius": 7.0,
            "events": [
                {"type": "jump", "y_shift": -1},
                {"type": "jump_around", "is_set": false},
                {"type": "climb", "top_event_y_shift": -3, "dynamic": true},
                {"type": "rope", "rope_collision_layer": 4, "dest_x": 9, "dest_y": 3,
                 "activation_directions": ["up", "down"], "walk_over_rope": true, "tied": true}
            ]
        }"#;
        let def: InteractableObjectDef = serde_json::from_str(raw).expect("parse");
        assert_eq!(def.events.len(), 4);
        assert_eq!(def.events[0].y_shift, -1);
        assert_eq!(def.events[0].kind, ObjectEventKind::Jump { is_set: true });
        assert_eq!(def.events[1].kind, ObjectEventKind::JumpAround { is_set: false });
        assert!(def.events[2].dynamic);
        match &def.events[3].kind {
            ObjectEventKind::Rope {
                rope_collision_layer,
                activation_directions,
                dock_exit_collision_layer,
                ..
            } => {
                assert_eq!(*rope_collision_layer, CollisionLayer(4));
                assert_eq!(
                    activation_directions.as_deref(),
                    Some(&[Direction::Up, Direction::Down][..])
                );
                assert!(dock_exit_collision_layer.is_none());
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn climb_requires_top_shift() {
        let raw = r#"{"type": "climb"}"#;
        assert!(serde_json::from_str::<ObjectEventDescriptor>(raw).is_err());
    }
}
