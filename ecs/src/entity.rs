use std::hash::{Hash, Hasher};

/// An entity identifier: slot index, spawn tick and owning registry.
///
/// - **index**: slot index in the entity allocator, recycled on destroy
/// - **spawn_tick**: registry tick when this entity was created (acts as a
///   generation; if a slot is reused, the new spawn_tick differs)
/// - **owner**: id of the [`Registry`](crate::Registry) that created it
///
/// Entities carry no data. A handle is only meaningful to the registry
/// (and therefore the scene) that created it.
#[derive(Clone, Copy)]
pub struct Entity {
    id: u32,
    owner: u32,
    spawn_tick: u64,
}

impl Entity {
    pub(crate) fn new(index: u32, spawn_tick: u64, owner: u32) -> Self {
        Self {
            id: index,
            owner,
            spawn_tick,
        }
    }

    /// Returns the slot index of this entity.
    pub fn index(&self) -> u32 {
        self.id
    }

    /// Returns the spawn tick of this entity.
    pub fn spawn_tick(&self) -> u64 {
        self.spawn_tick
    }

    /// Returns the id of the registry that created this entity.
    pub fn owner(&self) -> u32 {
        self.owner
    }

    /// Packs the handle into 128 bits (for external engines' user data slots).
    pub fn to_bits(&self) -> u128 {
        (self.id as u128) | ((self.owner as u128) << 32) | ((self.spawn_tick as u128) << 64)
    }

    /// Inverse of [`to_bits`](Self::to_bits).
    pub fn from_bits(bits: u128) -> Self {
        Self {
            id: bits as u32,
            owner: (bits >> 32) as u32,
            spawn_tick: (bits >> 64) as u64,
        }
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.spawn_tick == other.spawn_tick && self.owner == other.owner
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.spawn_tick.hash(state);
        self.owner.hash(state);
    }
}

impl PartialOrd for Entity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.owner, self.id, self.spawn_tick).cmp(&(other.owner, other.id, other.spawn_tick))
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({}@{})", self.index(), self.spawn_tick())
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({}@{})", self.index(), self.spawn_tick())
    }
}

/// Allocates and recycles entity IDs with spawn-tick tracking.
///
/// When an entity is destroyed, its slot is added to a free list.
/// The next allocation reuses the slot with a spawn tick strictly greater
/// than the previous occupant's, invalidating any old Entity handles.
pub(crate) struct EntityAllocator {
    owner: u32,
    /// Spawn tick for each slot. Index = entity index.
    spawn_ticks: Vec<u64>,
    /// Alive flag per slot.
    alive: Vec<bool>,
    /// Free list of recyclable indices (LIFO stack).
    free_list: Vec<u32>,
    /// Total number of currently alive entities.
    count: u32,
}

impl EntityAllocator {
    pub fn new(owner: u32) -> Self {
        Self {
            owner,
            spawn_ticks: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            count: 0,
        }
    }

    /// Allocates a new entity, reusing a recycled slot if available.
    pub fn allocate(&mut self, tick: u64) -> Entity {
        self.count += 1;

        if let Some(index) = self.free_list.pop() {
            let idx = index as usize;
            // Deallocation bumped the stored tick past the old handle's,
            // so taking the max keeps same-tick reuse distinguishable.
            let spawn_tick = tick.max(self.spawn_ticks[idx]);
            self.alive[idx] = true;
            self.spawn_ticks[idx] = spawn_tick;
            Entity::new(index, spawn_tick, self.owner)
        } else {
            let index = self.spawn_ticks.len() as u32;
            self.spawn_ticks.push(tick);
            self.alive.push(true);
            Entity::new(index, tick, self.owner)
        }
    }

    /// Deallocates an entity. Returns false if already dead or stale.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }

        let idx = entity.index() as usize;
        self.alive[idx] = false;
        self.spawn_ticks[idx] = self.spawn_ticks[idx].wrapping_add(1);
        self.free_list.push(entity.index());
        self.count -= 1;
        true
    }

    /// Returns whether the entity is currently alive in this allocator.
    pub fn is_alive(&self, entity: Entity) -> bool {
        let idx = entity.index() as usize;
        entity.owner() == self.owner
            && idx < self.alive.len()
            && self.alive[idx]
            && self.spawn_ticks[idx] == entity.spawn_tick()
    }

    /// Returns the number of alive entities.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Returns the alive entity at the given index, if any.
    pub fn entity_at_index(&self, index: u32) -> Option<Entity> {
        let idx = index as usize;
        if idx < self.alive.len() && self.alive[idx] {
            Some(Entity::new(index, self.spawn_ticks[idx], self.owner))
        } else {
            None
        }
    }

    /// Iterates over all currently alive entity IDs.
    pub fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(idx, _)| Entity::new(idx as u32, self.spawn_ticks[idx], self.owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_sequential() {
        let mut alloc = EntityAllocator::new(1);
        let e0 = alloc.allocate(100);
        let e1 = alloc.allocate(100);
        let e2 = alloc.allocate(100);

        assert_eq!(e0.index(), 0);
        assert_eq!(e1.index(), 1);
        assert_eq!(e2.index(), 2);
        assert_eq!(e0.spawn_tick(), 100);
        assert_eq!(e2.owner(), 1);
    }

    #[test]
    fn deallocate_makes_dead() {
        let mut alloc = EntityAllocator::new(1);
        let entity = alloc.allocate(1);
        assert!(alloc.is_alive(entity));
        assert!(alloc.deallocate(entity));
        assert!(!alloc.is_alive(entity));
        // Deallocating again returns false
        assert!(!alloc.deallocate(entity));
    }

    #[test]
    fn recycled_slot_new_tick() {
        let mut alloc = EntityAllocator::new(1);
        let e0 = alloc.allocate(10);
        alloc.deallocate(e0);
        let e1 = alloc.allocate(20);

        assert_eq!(e1.index(), 0);
        assert_eq!(e1.spawn_tick(), 20);
        assert!(!alloc.is_alive(e0));
    }

    #[test]
    fn recycled_slot_same_tick_is_distinct() {
        let mut alloc = EntityAllocator::new(1);
        let old = alloc.allocate(5);
        alloc.deallocate(old);
        let new = alloc.allocate(5);

        assert_eq!(new.index(), old.index());
        assert_ne!(new, old);
        assert!(!alloc.is_alive(old));
        assert!(alloc.is_alive(new));
    }

    #[test]
    fn foreign_entity_is_not_alive() {
        let mut a = EntityAllocator::new(1);
        let mut b = EntityAllocator::new(2);
        let ea = a.allocate(1);
        let _eb = b.allocate(1);
        assert!(!b.is_alive(ea));
    }

    #[test]
    fn count_tracks_alive() {
        let mut alloc = EntityAllocator::new(1);
        assert_eq!(alloc.count(), 0);

        let e0 = alloc.allocate(1);
        let _e1 = alloc.allocate(1);
        assert_eq!(alloc.count(), 2);

        alloc.deallocate(e0);
        assert_eq!(alloc.count(), 1);
    }

    #[test]
    fn iter_alive_correctness() {
        let mut alloc = EntityAllocator::new(1);
        let entities: Vec<_> = (0..5).map(|_| alloc.allocate(1)).collect();

        alloc.deallocate(entities[1]);
        alloc.deallocate(entities[3]);

        let alive: Vec<_> = alloc.iter_alive().collect();
        assert_eq!(alive, vec![entities[0], entities[2], entities[4]]);
        assert_eq!(alloc.entity_at_index(2), Some(entities[2]));
        assert_eq!(alloc.entity_at_index(3), None);
    }

    #[test]
    fn bits_roundtrip_preserves_identity() {
        let entity = Entity::new(7, 1234, 3);
        assert_eq!(Entity::from_bits(entity.to_bits()), entity);
    }

    #[test]
    fn debug_format() {
        let entity = Entity::new(42, 100, 1);
        assert_eq!(format!("{:?}", entity), "Entity(42@100)");
        assert_eq!(format!("{}", entity), "Entity(42@100)");
    }
}
