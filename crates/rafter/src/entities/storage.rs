use super::Entity;
use ahash::AHashSet;
use std::fmt::Display;

/// Dense storage of component records.
///
/// Records live in a packed array for fast iteration, with a sparse index-to-slot map for lookups.
/// Removal swaps the last record into the freed slot.
#[derive(Debug, Clone)]
pub struct ComponentStorage<T> {
    entities: Vec<Entity>,
    values: Vec<T>,
    slots: Vec<Option<u32>>,

    /// Entities already reported as broken, so that per-frame warnings don't repeat
    reported: AHashSet<Entity>,
}

impl<T> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ComponentStorage<T> {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            values: Vec::new(),
            slots: Vec::new(),
            reported: AHashSet::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn slot(&self, entity: Entity) -> Option<usize> {
        let slot = (*self.slots.get(entity.index as usize)?)? as usize;
        // The index may be reused by a newer generation
        (self.entities[slot] == entity).then_some(slot)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.slot(entity).is_some()
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.slot(entity).map(|slot| &self.values[slot])
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.slot(entity).map(|slot| &mut self.values[slot])
    }

    /// Inserts or overwrites the entity's record. Returns the previous record, if any.
    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        if let Some(slot) = self.slot(entity) {
            return Some(std::mem::replace(&mut self.values[slot], value));
        }

        // A stale record left behind by an older generation of this index
        self.remove_index(entity.index);

        let index = entity.index as usize;
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }

        self.slots[index] = Some(self.values.len() as u32);
        self.entities.push(entity);
        self.values.push(value);
        None
    }

    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let slot = self.slot(entity)?;
        self.reported.remove(&entity);
        Some(self.remove_slot(slot))
    }

    fn remove_index(&mut self, index: u32) {
        if let Some(Some(slot)) = self.slots.get(index as usize).copied() {
            let entity = self.entities[slot as usize];
            self.reported.remove(&entity);
            self.remove_slot(slot as usize);
        }
    }

    fn remove_slot(&mut self, slot: usize) -> T {
        let removed = self.entities.swap_remove(slot);
        self.slots[removed.index as usize] = None;

        if let Some(moved) = self.entities.get(slot) {
            self.slots[moved.index as usize] = Some(slot as u32);
        }

        self.values.swap_remove(slot)
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.values.clear();
        self.slots.clear();
        self.reported.clear();
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.values.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.entities.iter().copied().zip(self.values.iter_mut())
    }

    /// Logs a warning about the entity, once per entity for as long as the record stays.
    pub fn warn_once(&mut self, entity: Entity, message: impl Display) {
        if self.reported.insert(entity) {
            log::warn!("{entity}: {message}");
        }
    }

    /// Whether [`Self::warn_once`] was already triggered for this entity.
    pub fn was_reported(&self, entity: Entity) -> bool {
        self.reported.contains(&entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;

    fn entity(index: u32, generation: u32) -> Entity {
        Entity {
            index,
            generation: NonZeroU32::new(generation).unwrap(),
        }
    }

    #[test]
    fn dense_storage() {
        let (a, b, c) = (entity(0, 1), entity(5, 2), entity(2, 3));

        let mut storage = ComponentStorage::new();
        assert_eq!(storage.insert(a, "a"), None);
        assert_eq!(storage.insert(b, "b"), None);
        assert_eq!(storage.insert(c, "c"), None);
        assert_eq!(storage.len(), 3);

        assert_eq!(storage.remove(a), Some("a"));
        assert_eq!(storage.get(a), None);
        assert_eq!(storage.get(b), Some(&"b"));
        assert_eq!(storage.get(c), Some(&"c"));
        assert_eq!(storage.len(), 2);

        assert_eq!(storage.insert(b, "B"), Some("b"));
        let mut collected: Vec<_> = storage.iter().map(|(e, v)| (e.index, *v)).collect();
        collected.sort();
        assert_eq!(collected, vec![(2, "c"), (5, "B")]);
    }

    #[test]
    fn stale_generations_are_ignored() {
        let old = entity(3, 1);
        let new = entity(3, 7);

        let mut storage = ComponentStorage::new();
        storage.insert(old, 1);
        assert_eq!(storage.get(new), None);
        assert_eq!(storage.remove(new), None);

        storage.insert(new, 2);
        assert_eq!(storage.get(old), None);
        assert_eq!(storage.get(new), Some(&2));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn warnings_are_reported_once() {
        let a = entity(1, 1);
        let mut storage = ComponentStorage::new();
        storage.insert(a, ());

        assert!(!storage.was_reported(a));
        storage.warn_once(a, "something is off");
        assert!(storage.was_reported(a));

        storage.remove(a);
        assert!(!storage.was_reported(a));
    }
}
