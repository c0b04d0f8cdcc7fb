//! Object registry backing the world's object storage.

use std::collections::BTreeMap;

use tactica_core::{CellCoord, ObjectId, Rect, SelectableObject};

/// Registry that stores object snapshots and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct ObjectRegistry {
    entries: BTreeMap<ObjectId, SelectableObject>,
    next_object_id: ObjectId,
}

impl ObjectRegistry {
    /// Creates an empty registry whose first identifier is `1`.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_object_id: ObjectId::new(1),
        }
    }

    /// Allocates the next identifier.
    pub(crate) fn allocate(&mut self) -> ObjectId {
        let id = self.next_object_id;
        self.next_object_id = ObjectId::new(id.get().saturating_add(1));
        id
    }

    /// Stores the snapshot, replacing any previous entry with the same identifier.
    pub(crate) fn insert(&mut self, object: SelectableObject) {
        let _ = self.entries.insert(object.id, object);
    }

    /// Removes the entry and returns its final snapshot.
    pub(crate) fn remove(&mut self, id: ObjectId) -> Option<SelectableObject> {
        self.entries.remove(&id)
    }

    pub(crate) fn get(&self, id: ObjectId) -> Option<&SelectableObject> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ObjectId) -> Option<&mut SelectableObject> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &SelectableObject> {
        self.entries.values()
    }

    /// Active object covering the cell, preferring units over buildings and
    /// newer objects over older ones.
    pub(crate) fn topmost_at(&self, cell: CellCoord) -> Option<SelectableObject> {
        let probe = cell.center();
        self.entries
            .values()
            .filter(|object| object.active)
            .filter(|object| object.bounds().contains_point(probe.x(), probe.y()))
            .max_by_key(|object| (object.selection_priority(), object.id))
            .copied()
    }

    /// Every object whose center lies inside the world-space rectangle.
    pub(crate) fn within(&self, area: Rect) -> Vec<SelectableObject> {
        self.entries
            .values()
            .filter(|object| area.contains_point(object.position.x(), object.position.y()))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactica_core::{HouseId, ObjectKind};

    fn object(id: u32, kind: ObjectKind, cell: CellCoord) -> SelectableObject {
        SelectableObject::new(ObjectId::new(id), kind, HouseId::new(0), cell)
    }

    #[test]
    fn registry_starts_empty_and_allocates_from_one() {
        let mut registry = ObjectRegistry::new();
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.allocate(), ObjectId::new(1));
        assert_eq!(registry.allocate(), ObjectId::new(2));
    }

    #[test]
    fn topmost_prefers_units_standing_on_buildings() {
        let mut registry = ObjectRegistry::new();
        let cell = CellCoord::new(4, 4);
        registry.insert(object(1, ObjectKind::Building, cell).with_size(72, 72));
        registry.insert(object(2, ObjectKind::Vehicle, cell));

        let top = registry.topmost_at(cell).expect("object expected");
        assert_eq!(top.id, ObjectId::new(2), "unit should be reported above the building");
    }

    #[test]
    fn topmost_skips_inactive_objects() {
        let mut registry = ObjectRegistry::new();
        let cell = CellCoord::new(1, 1);
        registry.insert(object(1, ObjectKind::Vehicle, cell).with_active(false));

        assert!(registry.topmost_at(cell).is_none());
    }

    #[test]
    fn within_uses_object_centers() {
        let mut registry = ObjectRegistry::new();
        registry.insert(object(1, ObjectKind::Infantry, CellCoord::new(0, 0)));
        registry.insert(object(2, ObjectKind::Infantry, CellCoord::new(5, 5)));

        let found = registry.within(Rect::new(0, 0, 24, 24));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, ObjectId::new(1));
    }
}
