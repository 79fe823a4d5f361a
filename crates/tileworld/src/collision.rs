use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One stacked partition of a map's tile grid. May be negative.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CollisionLayer(pub i32);

impl CollisionLayer {
    pub fn shifted(self, shift: i32) -> Self {
        Self(self.0.wrapping_add(shift))
    }

    pub fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Display for CollisionLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionGroupId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    InteractableObject,
    StairBlock,
    Npc,
}

impl BodyKind {
    fn family(self) -> GroupFamily {
        match self {
            BodyKind::InteractableObject | BodyKind::StairBlock => GroupFamily::InteractableObjects,
            BodyKind::Npc => GroupFamily::Npcs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupFamily {
    InteractableObjects,
    Npcs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyRecord {
    pub kind: BodyKind,
    pub layer: CollisionLayer,
    pub group: CollisionGroupId,
    pub collides_with_hero: bool,
}

/// Collision groups of the mounted map, one per (family, layer), created on first use.
#[derive(Debug, Default)]
pub struct CollisionLayerSet {
    next_group: u32,
    hero_group: Option<CollisionGroupId>,
    object_groups: HashMap<CollisionLayer, CollisionGroupId>,
    npc_groups: HashMap<CollisionLayer, CollisionGroupId>,
    next_body: u64,
    bodies: HashMap<BodyId, BodyRecord>,
}

impl CollisionLayerSet {
    pub fn hero_group(&mut self) -> CollisionGroupId {
        if let Some(group) = self.hero_group {
            return group;
        }
        let group = self.allocate_group();
        self.hero_group = Some(group);
        group
    }

    pub fn object_group(&mut self, layer: CollisionLayer) -> CollisionGroupId {
        self.group_for(GroupFamily::InteractableObjects, layer)
    }

    pub fn npc_group(&mut self, layer: CollisionLayer) -> CollisionGroupId {
        self.group_for(GroupFamily::Npcs, layer)
    }

    pub fn existing_object_group(&self, layer: CollisionLayer) -> Option<CollisionGroupId> {
        self.object_groups.get(&layer).copied()
    }

    pub fn existing_npc_group(&self, layer: CollisionLayer) -> Option<CollisionGroupId> {
        self.npc_groups.get(&layer).copied()
    }

    /// Pre-creates object and NPC groups for every listed layer.
    pub fn config_collision_groups<I>(&mut self, layers: I)
    where
        I: IntoIterator<Item = CollisionLayer>,
    {
        self.hero_group();
        for layer in layers {
            self.object_group(layer);
            self.npc_group(layer);
        }
    }

    pub fn create_body(&mut self, kind: BodyKind, layer: CollisionLayer) -> BodyId {
        let group = self.group_for(kind.family(), layer);
        let id = BodyId(self.next_body);
        self.next_body = self.next_body.saturating_add(1);
        self.bodies.insert(
            id,
            BodyRecord {
                kind,
                layer,
                group,
                collides_with_hero: true,
            },
        );
        id
    }

    /// Leaves the current layer's group and joins `layer`'s group.
    pub fn move_body(&mut self, body: BodyId, layer: CollisionLayer) -> bool {
        let Some(kind) = self.bodies.get(&body).map(|record| record.kind) else {
            return false;
        };
        let group = self.group_for(kind.family(), layer);
        if let Some(record) = self.bodies.get_mut(&body) {
            record.layer = layer;
            record.group = group;
        }
        true
    }

    pub fn set_collides_with_hero(&mut self, body: BodyId, collides: bool) -> bool {
        match self.bodies.get_mut(&body) {
            Some(record) => {
                record.collides_with_hero = collides;
                true
            }
            None => false,
        }
    }

    pub fn destroy_body(&mut self, body: BodyId) -> bool {
        self.bodies.remove(&body).is_some()
    }

    pub fn body(&self, body: BodyId) -> Option<&BodyRecord> {
        self.bodies.get(&body)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn group_count(&self) -> usize {
        self.object_groups.len() + self.npc_groups.len() + usize::from(self.hero_group.is_some())
    }

    /// Drops every group and body; used when the map unmounts.
    pub fn clear(&mut self) {
        self.hero_group = None;
        self.object_groups.clear();
        self.npc_groups.clear();
        self.bodies.clear();
    }

    fn group_for(&mut self, family: GroupFamily, layer: CollisionLayer) -> CollisionGroupId {
        let existing = match family {
            GroupFamily::InteractableObjects => self.object_groups.get(&layer),
            GroupFamily::Npcs => self.npc_groups.get(&layer),
        };
        if let Some(group) = existing {
            return *group;
        }
        let group = self.allocate_group();
        debug!(?family, layer = layer.0, group = group.0, "collision_group_created");
        match family {
            GroupFamily::InteractableObjects => self.object_groups.insert(layer, group),
            GroupFamily::Npcs => self.npc_groups.insert(layer, group),
        };
        group
    }

    fn allocate_group(&mut self) -> CollisionGroupId {
        let group = CollisionGroupId(self.next_group);
        self.next_group = self.next_group.saturating_add(1);
        group
    }
}
