#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Selection set and control groups for the local player.
//!
//! The manager never owns objects. It stores [`ObjectId`] handles together
//! with the few attributes it needs for ordering and type queries, and
//! re-validates handles against an [`ObjectStore`] whenever a group is
//! recalled. Storage must route every destruction through
//! [`DestructionObserver::on_object_destroyed`] so that no stale handle
//! survives in the selection or in a saved group.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tactica_core::{
    DestructionObserver, HouseId, ObjectId, ObjectKind, ObjectStore, Rect, SelectableObject,
    TypeIndex, WorldPoint,
};
use tracing::debug;

/// Number of control groups bound to the digit keys.
pub const GROUP_COUNT: usize = 10;

/// Undrained notifications kept before the oldest are dropped.
pub const EVENT_BACKLOG: usize = 256;

/// Selection limits loaded from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Largest number of objects the selection may hold.
    pub cap: usize,
    /// House whose objects may be selected.
    pub player_house: u8,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            cap: 128,
            player_house: 0,
        }
    }
}

/// Change notifications produced by the manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionEvent {
    /// The selection became empty.
    Cleared,
    /// An object joined the selection.
    Added(ObjectId),
    /// An object left the selection.
    Removed(ObjectId),
    /// The selection was rebuilt in one step.
    Replaced,
    /// A control group was stored.
    GroupSaved(u8),
    /// A control group became the selection.
    GroupRecalled(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Entry {
    id: ObjectId,
    kind: ObjectKind,
    type_index: TypeIndex,
    priority: u32,
}

impl Entry {
    const fn of(object: &SelectableObject) -> Self {
        Self {
            id: object.id,
            kind: object.kind,
            type_index: object.type_index,
            priority: object.selection_priority(),
        }
    }
}

/// Tracks the selected objects and the saved control groups.
///
/// Every change queues a [`SelectionEvent`]. Owners drain them once per frame
/// with [`SelectionManager::drain_events`]; at most [`EVENT_BACKLOG`] are kept.
#[derive(Clone, Debug)]
pub struct SelectionManager {
    config: SelectionConfig,
    entries: Vec<Entry>,
    groups: [Vec<ObjectId>; GROUP_COUNT],
    events: VecDeque<SelectionEvent>,
}

impl Default for SelectionManager {
    fn default() -> Self {
        Self::new(SelectionConfig::default())
    }
}

impl SelectionManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new(config: SelectionConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
            groups: Default::default(),
            events: VecDeque::new(),
        }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// House allowed into the selection.
    #[must_use]
    pub const fn player(&self) -> HouseId {
        HouseId::new(self.config.player_house)
    }

    /// Returns `true` when the object may enter the selection.
    #[must_use]
    pub fn can_select(&self, object: &SelectableObject) -> bool {
        object.active && object.owner == self.player()
    }

    /// Replaces the selection with a single object.
    ///
    /// Objects that cannot be selected leave the selection untouched.
    pub fn select(&mut self, object: &SelectableObject) -> bool {
        if !self.can_select(object) || self.config.cap == 0 {
            return false;
        }
        self.entries.clear();
        self.entries.push(Entry::of(object));
        self.record(SelectionEvent::Replaced);
        debug!(id = object.id.get(), "selection replaced");
        true
    }

    /// Adds an object. Duplicates, foreign objects and additions past the cap are ignored.
    pub fn add(&mut self, object: &SelectableObject) -> bool {
        if !self.can_select(object)
            || self.is_selected(object.id)
            || self.entries.len() >= self.config.cap
        {
            return false;
        }
        self.entries.push(Entry::of(object));
        self.sort();
        self.record(SelectionEvent::Added(object.id));
        true
    }

    /// Removes the object when selected, adds it otherwise.
    pub fn toggle(&mut self, object: &SelectableObject) -> bool {
        if self.is_selected(object.id) {
            self.remove(object.id)
        } else {
            self.add(object)
        }
    }

    /// Removes an object from the selection.
    pub fn remove(&mut self, id: ObjectId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        if self.entries.len() == before {
            return false;
        }
        self.record(SelectionEvent::Removed(id));
        true
    }

    /// Empties the selection. Groups are kept.
    pub fn clear(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.entries.clear();
        self.record(SelectionEvent::Cleared);
    }

    /// Selects the player's units whose centers lie inside `area` (world pixels).
    ///
    /// Buildings never take part in box selection. When nothing qualifies the
    /// current selection is kept. Returns the number of selected objects.
    pub fn select_in_box<S>(&mut self, store: &S, area: Rect) -> usize
    where
        S: ObjectStore + ?Sized,
    {
        let candidates: Vec<SelectableObject> = store
            .objects_in(area)
            .into_iter()
            .filter(|object| object.kind.is_unit() && self.can_select(object))
            .collect();
        if candidates.is_empty() {
            return 0;
        }
        self.replace_with(candidates.iter(), SelectionEvent::Replaced);
        debug!(count = self.entries.len(), "box selection");
        self.entries.len()
    }

    /// Selects every player object of the given type.
    pub fn select_all_of_type<S>(&mut self, store: &S, type_index: TypeIndex) -> usize
    where
        S: ObjectStore + ?Sized,
    {
        self.select_matching(store, |object| object.type_index == type_index)
    }

    /// Selects every player unit on the map.
    pub fn select_all_units<S>(&mut self, store: &S) -> usize
    where
        S: ObjectStore + ?Sized,
    {
        self.select_matching(store, |object| object.kind.is_unit())
    }

    fn select_matching<S, F>(&mut self, store: &S, predicate: F) -> usize
    where
        S: ObjectStore + ?Sized,
        F: Fn(&SelectableObject) -> bool,
    {
        let matches: Vec<SelectableObject> = store
            .all_objects()
            .into_iter()
            .filter(|object| self.can_select(object) && predicate(object))
            .collect();
        if matches.is_empty() {
            return 0;
        }
        self.replace_with(matches.iter(), SelectionEvent::Replaced);
        self.entries.len()
    }

    fn replace_with<'a, I>(&mut self, objects: I, event: SelectionEvent)
    where
        I: Iterator<Item = &'a SelectableObject>,
    {
        self.entries.clear();
        for object in objects {
            if !self.entries.iter().any(|entry| entry.id == object.id) {
                self.entries.push(Entry::of(object));
            }
        }
        self.sort();
        self.entries.truncate(self.config.cap);
        self.record(event);
    }

    fn record(&mut self, event: SelectionEvent) {
        if self.events.len() >= EVENT_BACKLOG {
            let _ = self.events.pop_front();
        }
        self.events.push_back(event);
    }

    fn sort(&mut self) {
        self.entries.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// Returns `true` when the object is selected.
    #[must_use]
    pub fn is_selected(&self, id: ObjectId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    /// Number of selected objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Selected handles in display order.
    #[must_use]
    pub fn ids(&self) -> Vec<ObjectId> {
        self.entries.iter().map(|entry| entry.id).collect()
    }

    /// Object shown in the unit portrait.
    #[must_use]
    pub fn primary(&self) -> Option<ObjectId> {
        self.entries.first().map(|entry| entry.id)
    }

    /// Returns `true` when any mobile unit is selected.
    #[must_use]
    pub fn has_selected_units(&self) -> bool {
        self.entries.iter().any(|entry| entry.kind.is_unit())
    }

    /// Returns `true` when any building is selected.
    #[must_use]
    pub fn has_selected_buildings(&self) -> bool {
        self.entries.iter().any(|entry| entry.kind.is_building())
    }

    /// Returns `true` when the selection is non-empty and every object has the kind.
    #[must_use]
    pub fn all_selected_are(&self, kind: ObjectKind) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|entry| entry.kind == kind)
    }

    /// Kind shared by the whole selection, if any.
    #[must_use]
    pub fn selected_kind(&self) -> Option<ObjectKind> {
        let first = self.entries.first()?.kind;
        self.all_selected_are(first).then_some(first)
    }

    /// Type shared by the whole selection, if any.
    #[must_use]
    pub fn selected_type(&self) -> Option<TypeIndex> {
        let first = self.entries.first()?.type_index;
        self.entries
            .iter()
            .all(|entry| entry.type_index == first)
            .then_some(first)
    }

    /// Fresh snapshots of the selected objects that storage still knows.
    pub fn objects<S>(&self, store: &S) -> Vec<SelectableObject>
    where
        S: ObjectStore + ?Sized,
    {
        self.entries
            .iter()
            .filter_map(|entry| store.object(entry.id))
            .collect()
    }

    /// Stores a copy of the selection in group `slot`.
    pub fn save_group(&mut self, slot: u8) -> bool {
        let Some(group) = self.groups.get_mut(usize::from(slot)) else {
            return false;
        };
        *group = self.entries.iter().map(|entry| entry.id).collect();
        debug!(slot, size = group.len(), "control group saved");
        self.record(SelectionEvent::GroupSaved(slot));
        true
    }

    /// Adds the current selection to group `slot` without replacing it.
    pub fn add_to_group(&mut self, slot: u8) -> bool {
        let Some(group) = self.groups.get_mut(usize::from(slot)) else {
            return false;
        };
        for entry in &self.entries {
            if !group.contains(&entry.id) {
                group.push(entry.id);
            }
        }
        self.record(SelectionEvent::GroupSaved(slot));
        true
    }

    /// Makes group `slot` the selection.
    ///
    /// Members storage no longer knows, or that are no longer selectable, are
    /// pruned from the group. An empty group leaves the selection unchanged.
    pub fn recall_group<S>(&mut self, slot: u8, store: &S) -> usize
    where
        S: ObjectStore + ?Sized,
    {
        let members = self.valid_members(slot, store);
        if members.is_empty() {
            return 0;
        }
        self.replace_with(members.iter(), SelectionEvent::GroupRecalled(slot));
        debug!(slot, size = self.entries.len(), "control group recalled");
        self.entries.len()
    }

    /// Adds the members of group `slot` to the selection, respecting the cap.
    pub fn add_group_to_selection<S>(&mut self, slot: u8, store: &S) -> usize
    where
        S: ObjectStore + ?Sized,
    {
        self.valid_members(slot, store)
            .iter()
            .filter(|object| self.add(object))
            .count()
    }

    fn valid_members<S>(&mut self, slot: u8, store: &S) -> Vec<SelectableObject>
    where
        S: ObjectStore + ?Sized,
    {
        let player = self.player();
        let Some(group) = self.groups.get_mut(usize::from(slot)) else {
            return Vec::new();
        };
        let mut members = Vec::with_capacity(group.len());
        group.retain(|&id| match store.object(id) {
            Some(object) if object.active && object.owner == player => {
                members.push(object);
                true
            }
            _ => false,
        });
        members
    }

    /// Returns `true` when group `slot` holds at least one handle.
    #[must_use]
    pub fn has_group(&self, slot: u8) -> bool {
        self.group_size(slot) > 0
    }

    /// Number of handles stored in group `slot`.
    #[must_use]
    pub fn group_size(&self, slot: u8) -> usize {
        self.groups.get(usize::from(slot)).map_or(0, Vec::len)
    }

    /// Handles stored in group `slot`.
    #[must_use]
    pub fn group(&self, slot: u8) -> &[ObjectId] {
        self.groups
            .get(usize::from(slot))
            .map_or(&[], Vec::as_slice)
    }

    /// Average position of the group members storage still knows.
    pub fn group_center<S>(&self, slot: u8, store: &S) -> Option<WorldPoint>
    where
        S: ObjectStore + ?Sized,
    {
        let (sum_x, sum_y, count) = self
            .group(slot)
            .iter()
            .filter_map(|&id| store.object(id))
            .filter(|object| object.active)
            .fold((0_i64, 0_i64, 0_i64), |(x, y, n), object| {
                (
                    x + i64::from(object.position.x()),
                    y + i64::from(object.position.y()),
                    n + 1,
                )
            });
        (count > 0).then(|| {
            WorldPoint::new(
                i32::try_from(sum_x / count).unwrap_or(i32::MAX),
                i32::try_from(sum_y / count).unwrap_or(i32::MAX),
            )
        })
    }

    /// Moves the pending change notifications into `out`.
    pub fn drain_events(&mut self, out: &mut Vec<SelectionEvent>) {
        out.extend(self.events.drain(..));
    }
}

impl DestructionObserver for SelectionManager {
    fn on_object_destroyed(&mut self, id: ObjectId) {
        let _ = self.remove(id);
        for group in &mut self.groups {
            group.retain(|&member| member != id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactica_core::CellCoord;

    fn unit(id: u32, owner: u8) -> SelectableObject {
        SelectableObject::new(
            ObjectId::new(id),
            ObjectKind::Vehicle,
            HouseId::new(owner),
            CellCoord::new(id as i32, 0),
        )
    }

    #[test]
    fn foreign_objects_are_rejected() {
        let mut selection = SelectionManager::default();
        assert!(!selection.select(&unit(1, 3)), "enemy objects cannot be selected");
        assert!(selection.is_empty());
        assert!(!selection.add(&unit(2, 0).with_active(false)));
        assert!(selection.is_empty(), "inactive objects cannot be selected");
    }

    #[test]
    fn infantry_sorts_ahead_of_vehicles_and_buildings() {
        let mut selection = SelectionManager::default();
        let building = SelectableObject::new(
            ObjectId::new(1),
            ObjectKind::Building,
            HouseId::new(0),
            CellCoord::new(1, 1),
        );
        let soldier = SelectableObject::new(
            ObjectId::new(3),
            ObjectKind::Infantry,
            HouseId::new(0),
            CellCoord::new(3, 1),
        );
        assert!(selection.select(&building));
        assert!(selection.add(&unit(2, 0)));
        assert!(selection.add(&soldier));
        assert_eq!(
            selection.ids(),
            vec![ObjectId::new(3), ObjectId::new(2), ObjectId::new(1)]
        );
        assert_eq!(selection.primary(), Some(ObjectId::new(3)));
        assert!(selection.has_selected_buildings());
        assert_eq!(selection.selected_kind(), None);
    }

    #[test]
    fn equal_priority_keeps_insertion_order() {
        let mut selection = SelectionManager::default();
        for id in [5, 2, 9] {
            assert!(selection.add(&unit(id, 0)));
        }
        assert_eq!(
            selection.ids(),
            vec![ObjectId::new(5), ObjectId::new(2), ObjectId::new(9)]
        );
        assert!(selection.all_selected_are(ObjectKind::Vehicle));
    }

    #[test]
    fn undrained_events_keep_only_the_latest_backlog() {
        let mut selection = SelectionManager::default();
        let object = unit(4, 0);
        for _ in 0..EVENT_BACKLOG {
            assert!(selection.toggle(&object));
        }
        assert!(selection.save_group(2));

        let mut events = Vec::new();
        selection.drain_events(&mut events);
        assert_eq!(events.len(), EVENT_BACKLOG);
        assert_eq!(events.first(), Some(&SelectionEvent::Removed(object.id)));
        assert_eq!(events.last(), Some(&SelectionEvent::GroupSaved(2)));

        selection.drain_events(&mut events);
        assert_eq!(events.len(), EVENT_BACKLOG, "draining empties the queue");
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut selection = SelectionManager::default();
        let object = unit(4, 0);
        assert!(selection.toggle(&object));
        assert!(selection.is_selected(object.id));
        assert!(selection.toggle(&object));
        assert!(!selection.is_selected(object.id));

        let mut events = Vec::new();
        selection.drain_events(&mut events);
        assert_eq!(
            events,
            vec![
                SelectionEvent::Added(object.id),
                SelectionEvent::Removed(object.id)
            ]
        );
    }

    #[test]
    fn destruction_prunes_groups_as_well_as_the_selection() {
        let mut selection = SelectionManager::default();
        assert!(selection.select(&unit(1, 0)));
        assert!(selection.add(&unit(2, 0)));
        assert!(selection.save_group(3));
        selection.on_object_destroyed(ObjectId::new(1));
        assert!(!selection.is_selected(ObjectId::new(1)));
        assert_eq!(selection.group(3), &[ObjectId::new(2)]);
    }

    #[test]
    fn out_of_range_group_slots_are_ignored() {
        let mut selection = SelectionManager::default();
        assert!(!selection.save_group(10));
        assert_eq!(selection.group_size(42), 0);
    }
}
