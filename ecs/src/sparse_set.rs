use std::any::Any;

/// Ticks recorded for one stored component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ticks {
    added: u64,
    changed: u64,
}

/// Per-type component storage indexed by entity slot.
///
/// `slots[entity_index]` points into the packed `values` column, so lookups
/// are O(1) and removal swaps the last value into the hole. Every value
/// carries the tick it was added at and the tick it was last handed out
/// mutably through [`get_mut_tracked`](Self::get_mut_tracked).
pub struct SparseSet<T: 'static> {
    slots: Vec<Option<u32>>,
    values: Vec<T>,
    owners: Vec<u32>,
    ticks: Vec<Ticks>,
}

impl<T: 'static> SparseSet<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            values: Vec::new(),
            owners: Vec::new(),
            ticks: Vec::new(),
        }
    }

    /// Stores `value` for the slot at `tick`. An existing value is replaced
    /// and only its changed tick moves.
    pub fn insert(&mut self, entity_index: u32, value: T, tick: u64) -> &mut T {
        let slot = entity_index as usize;
        if slot >= self.slots.len() {
            self.slots.resize(slot + 1, None);
        }

        let packed = match self.slots[slot] {
            Some(packed) => {
                let packed = packed as usize;
                self.values[packed] = value;
                self.ticks[packed].changed = tick;
                packed
            }
            None => {
                self.slots[slot] = Some(self.values.len() as u32);
                self.values.push(value);
                self.owners.push(entity_index);
                self.ticks.push(Ticks {
                    added: tick,
                    changed: tick,
                });
                self.values.len() - 1
            }
        };
        &mut self.values[packed]
    }

    pub fn remove(&mut self, entity_index: u32) -> Option<T> {
        let packed = self.packed_index(entity_index)?;
        self.slots[entity_index as usize] = None;

        let last = self.values.len() - 1;
        if packed != last {
            let moved = self.owners[last];
            self.slots[moved as usize] = Some(packed as u32);
        }
        self.owners.swap_remove(packed);
        self.ticks.swap_remove(packed);
        Some(self.values.swap_remove(packed))
    }

    pub fn get(&self, entity_index: u32) -> Option<&T> {
        self.packed_index(entity_index).map(|packed| &self.values[packed])
    }

    /// Mutable access that marks the value changed at `tick`.
    pub fn get_mut_tracked(&mut self, entity_index: u32, tick: u64) -> Option<&mut T> {
        let packed = self.packed_index(entity_index)?;
        self.ticks[packed].changed = tick;
        Some(&mut self.values[packed])
    }

    pub fn contains(&self, entity_index: u32) -> bool {
        self.packed_index(entity_index).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Slots holding a value, in storage order.
    pub fn entities(&self) -> &[u32] {
        &self.owners
    }

    /// Changed strictly after `since_tick`.
    pub fn changed_since(&self, entity_index: u32, since_tick: u64) -> bool {
        self.packed_index(entity_index)
            .is_some_and(|packed| self.ticks[packed].changed > since_tick)
    }

    /// Added strictly after `since_tick`.
    pub fn added_since(&self, entity_index: u32, since_tick: u64) -> bool {
        self.packed_index(entity_index)
            .is_some_and(|packed| self.ticks[packed].added > since_tick)
    }

    fn packed_index(&self, entity_index: u32) -> Option<usize> {
        self.slots
            .get(entity_index as usize)
            .copied()
            .flatten()
            .map(|packed| packed as usize)
    }
}

impl<T: 'static> Default for SparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`SparseSet`] behind `dyn Any`, so the registry can drop a destroyed
/// entity's components without knowing their types.
pub(crate) struct ComponentStorage {
    inner: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
    remove_fn: fn(&mut dyn Any, u32) -> bool,
}

impl ComponentStorage {
    pub fn new<T: Send + Sync + 'static>() -> Self {
        Self {
            inner: Box::new(SparseSet::<T>::new()),
            type_name: std::any::type_name::<T>(),
            remove_fn: |any, entity_index| {
                any.downcast_mut::<SparseSet<T>>()
                    .is_some_and(|set| set.remove(entity_index).is_some())
            },
        }
    }

    /// Storages are keyed by `TypeId`, so a mismatch is a registry bug.
    pub fn typed<T: 'static>(&self) -> &SparseSet<T> {
        match self.inner.downcast_ref::<SparseSet<T>>() {
            Some(set) => set,
            None => panic!("storage for `{}` holds a different type", self.type_name),
        }
    }

    pub fn typed_mut<T: 'static>(&mut self) -> &mut SparseSet<T> {
        let type_name = self.type_name;
        match self.inner.downcast_mut::<SparseSet<T>>() {
            Some(set) => set,
            None => panic!("storage for `{type_name}` holds a different type"),
        }
    }

    /// Drops the slot's value, whatever its type. Returns whether one existed.
    pub fn remove_untyped(&mut self, entity_index: u32) -> bool {
        (self.remove_fn)(self.inner.as_mut(), entity_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_existing_value() {
        let mut set = SparseSet::<u32>::new();
        *set.insert(5, 42, 1) += 1;
        assert_eq!(set.get(5), Some(&43));

        set.insert(5, 99, 2);
        assert_eq!(set.get(5), Some(&99));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn remove_swaps_last_value_into_hole() {
        let mut set = SparseSet::<&str>::new();
        set.insert(0, "a", 1);
        set.insert(7, "b", 1);
        set.insert(3, "c", 1);

        assert_eq!(set.remove(0), Some("a"));
        assert_eq!(set.remove(0), None);
        assert_eq!(set.get(7), Some(&"b"));
        assert_eq!(set.get(3), Some(&"c"));
        assert_eq!(set.entities(), &[3, 7]);
        assert_eq!(set.remove(42), None);
    }

    #[test]
    fn remove_untyped_drops_value() {
        let mut storage = ComponentStorage::new::<u32>();
        storage.typed_mut::<u32>().insert(5, 42, 1);
        assert!(storage.remove_untyped(5));
        assert!(!storage.typed::<u32>().contains(5));
        assert!(!storage.remove_untyped(5));
    }

    #[test]
    #[should_panic(expected = "holds a different type")]
    fn typed_with_wrong_type_panics() {
        let storage = ComponentStorage::new::<u32>();
        let _ = storage.typed::<f32>();
    }

    #[test]
    fn ticks_are_strictly_after() {
        let mut set = SparseSet::<u32>::new();
        set.insert(5, 42, 10);
        assert!(set.added_since(5, 9));
        assert!(!set.added_since(5, 10));

        set.insert(5, 99, 20);
        assert!(!set.added_since(5, 10));
        assert!(set.changed_since(5, 19));
        assert!(!set.changed_since(5, 20));
    }

    #[test]
    fn tracked_access_marks_changed() {
        let mut set = SparseSet::<u32>::new();
        set.insert(5, 42, 10);
        assert!(!set.changed_since(5, 10));

        *set.get_mut_tracked(5, 25).unwrap() = 99;
        assert_eq!(set.get(5), Some(&99));
        assert!(set.changed_since(5, 24));
    }

    #[test]
    fn ticks_follow_swapped_values() {
        let mut set = SparseSet::<u32>::new();
        set.insert(0, 10, 1);
        set.insert(1, 20, 5);
        set.insert(2, 30, 10);

        set.remove(0);

        assert!(set.added_since(2, 9));
        assert!(!set.added_since(2, 10));
        assert!(set.added_since(1, 4));
        assert!(!set.added_since(1, 5));
    }
}
