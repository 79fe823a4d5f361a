use std::collections::HashMap;

use tracing::debug;

use crate::location::LocationKey;

use super::{TileEvent, TileEventId};

/// Location-indexed storage for the mounted map's tile events.
///
/// Pure storage: it never builds or fires events. Insertion order at a
/// location is kept; callers filter the looked-up sequence themselves.
#[derive(Debug, Default)]
pub struct EventRegistry {
    by_location: HashMap<LocationKey, Vec<TileEvent>>,
    locations: HashMap<TileEventId, LocationKey>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `event` at `key`. An id that is already registered is left
    /// where it is and the new event is dropped; returns whether it was added.
    pub fn insert(&mut self, key: LocationKey, event: TileEvent) -> bool {
        if self.locations.contains_key(&event.id()) {
            debug!(id = event.id().0, "tile_event_already_registered");
            return false;
        }
        self.locations.insert(event.id(), key);
        self.by_location.entry(key).or_default().push(event);
        true
    }

    /// Removes the event with `id` wherever it lives. Unknown ids are a no-op.
    pub fn remove(&mut self, id: TileEventId) -> Option<TileEvent> {
        let key = self.locations.remove(&id)?;
        let events = self.by_location.get_mut(&key)?;
        let index = events.iter().position(|event| event.id() == id)?;
        let removed = events.remove(index);
        if events.is_empty() {
            self.by_location.remove(&key);
        }
        Some(removed)
    }

    pub fn lookup(&self, key: LocationKey) -> &[TileEvent] {
        self.by_location
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn contains(&self, id: TileEventId) -> bool {
        self.locations.contains_key(&id)
    }

    pub fn get(&self, id: TileEventId) -> Option<&TileEvent> {
        let key = self.locations.get(&id)?;
        self.by_location
            .get(key)?
            .iter()
            .find(|event| event.id() == id)
    }

    pub fn get_mut(&mut self, id: TileEventId) -> Option<&mut TileEvent> {
        let key = self.locations.get(&id)?;
        self.by_location
            .get_mut(key)?
            .iter_mut()
            .find(|event| event.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileEvent> {
        self.by_location.values().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TileEvent> {
        self.by_location.values_mut().flatten()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_location.clear();
        self.locations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionLayer;
    use crate::events::{JumpEvent, TileEventKind, TileEventSpec};
    use crate::storage::MemoryStorage;
    use crate::tile::{DirectionSet, TilePos};

    fn event(id: u64, x: i32, y: i32) -> TileEvent {
        TileEvent::new(
            TileEventId(id),
            TileEventSpec::new(TilePos::new(x, y), DirectionSet::ALL, CollisionLayer(0)),
            TileEventKind::Jump(JumpEvent { is_set: true }),
            &MemoryStorage::new(),
        )
    }

    #[test]
    fn insert_lookup_remove_round_trip() {
        let mut registry = EventRegistry::new();
        let key = LocationKey::get_key(2, 3);
        registry.insert(key, event(7, 2, 3));
        assert_eq!(registry.lookup(key).len(), 1);
        assert_eq!(registry.lookup(key)[0].id(), TileEventId(7));

        let removed = registry.remove(TileEventId(7)).expect("removed");
        assert_eq!(removed.id(), TileEventId(7));
        assert!(registry.lookup(key).is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn lookup_keeps_insertion_order() {
        let mut registry = EventRegistry::new();
        let key = LocationKey::get_key(0, 0);
        registry.insert(key, event(2, 0, 0));
        registry.insert(key, event(1, 0, 0));
        registry.insert(key, event(3, 0, 0));
        let ids: Vec<_> = registry.lookup(key).iter().map(TileEvent::id).collect();
        assert_eq!(ids, vec![TileEventId(2), TileEventId(1), TileEventId(3)]);

        registry.remove(TileEventId(1));
        let ids: Vec<_> = registry.lookup(key).iter().map(TileEvent::id).collect();
        assert_eq!(ids, vec![TileEventId(2), TileEventId(3)]);
    }

    #[test]
    fn removing_unknown_id_is_a_noop() {
        let mut registry = EventRegistry::new();
        registry.insert(LocationKey::get_key(1, 1), event(0, 1, 1));
        assert!(registry.remove(TileEventId(99)).is_none());
        assert!(registry.remove(TileEventId(0)).is_some());
        assert!(registry.remove(TileEventId(0)).is_none());
    }

    #[test]
    fn double_insert_is_a_noop() {
        let mut registry = EventRegistry::new();
        let key = LocationKey::get_key(1, 1);
        assert!(registry.insert(key, event(7, 1, 1)));
        assert!(!registry.insert(key, event(7, 1, 1)));
        assert!(!registry.insert(LocationKey::get_key(4, 4), event(7, 4, 4)));
        assert_eq!(registry.lookup(key).len(), 1);
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(TileEventId(7)).is_some());
        assert!(registry.remove(TileEventId(7)).is_none());
        assert!(registry.lookup(key).is_empty());
        assert!(registry.lookup(LocationKey::get_key(4, 4)).is_empty());
        assert!(registry.iter().next().is_none());
    }

    #[test]
    fn lookup_at_empty_location_is_empty() {
        let registry = EventRegistry::new();
        assert!(registry.lookup(LocationKey::get_key(-4, 12)).is_empty());
    }

    #[test]
    fn get_mut_reaches_registered_event() {
        let mut registry = EventRegistry::new();
        registry.insert(LocationKey::get_key(5, 5), event(4, 5, 5));
        registry.get_mut(TileEventId(4)).expect("event").destroy();
        assert!(!registry.get(TileEventId(4)).expect("event").is_active());
        assert_eq!(registry.iter().count(), 1);
    }
}
