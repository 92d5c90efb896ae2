use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};

use crate::component::{Component, FieldError, FieldMap};
use crate::entity::{Entity, EntityAllocator};
use crate::sparse_set::{ComponentStorage, SparseSet};

static NEXT_REGISTRY_ID: AtomicU32 = AtomicU32::new(1);

// ---------------------------------------------------------------------------
// Reflection metadata (stored beside the component storages)
// ---------------------------------------------------------------------------

/// Type-erased reflection operations for a single component type.
struct ReflectEntry {
    has_fn: fn(&Registry, Entity) -> bool,
    save_fn: fn(&Registry, Entity) -> Option<FieldMap>,
    /// Inserts a default instance first when the entity lacks the component.
    restore_fn: fn(&mut Registry, Entity, &FieldMap) -> Result<(), FieldError>,
    remove_fn: fn(&mut Registry, Entity) -> bool,
}

/// Entity registry: allocates entity handles and stores components by type.
///
/// Each Registry is self-contained. Handles carry the id of the registry that
/// created them, so a handle from another registry is never considered alive
/// here.
///
/// Access follows a "check, then must exist" contract: callers that branch
/// use [`has_component`](Self::has_component) or the `try_*` accessors; the
/// plain accessors panic when the component is absent.
///
/// # Example
///
/// ```
/// use quasar_ecs::Registry;
///
/// struct Position { x: f32, y: f32 }
///
/// let mut registry = Registry::new();
/// let entity = registry.create_entity();
/// registry.add_component(entity, Position { x: 0.0, y: 0.0 });
///
/// if registry.has_component::<Position>(entity) {
///     registry.get_component_mut::<Position>(entity).x += 1.0;
/// }
/// assert_eq!(registry.get_component::<Position>(entity).x, 1.0);
/// ```
pub struct Registry {
    id: u32,
    entities: EntityAllocator,
    components: HashMap<TypeId, ComponentStorage>,
    /// Tick counter for change detection. Starts at 1 so that tick 0 means
    /// "never synchronized".
    tick: u64,
    reflected: BTreeMap<&'static str, ReflectEntry>,
}

impl Registry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        let id = NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            id,
            entities: EntityAllocator::new(id),
            components: HashMap::new(),
            tick: 1,
            reflected: BTreeMap::new(),
        }
    }

    /// Unique id of this registry, stamped into every handle it creates.
    pub fn id(&self) -> u32 {
        self.id
    }

    // ---- Entity management ----

    /// Creates a new entity with no components.
    pub fn create_entity(&mut self) -> Entity {
        self.entities.allocate(self.tick)
    }

    /// Destroys an entity, dropping all its components.
    ///
    /// Returns `false` if the entity was already dead.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.entities.deallocate(entity) {
            return false;
        }

        let index = entity.index();
        for storage in self.components.values_mut() {
            storage.remove_untyped(index);
        }
        true
    }

    /// Returns whether the entity is currently alive.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Returns the number of alive entities.
    pub fn entity_count(&self) -> u32 {
        self.entities.count()
    }

    /// Snapshot of all alive entities in slot order.
    pub fn get_all_entities(&self) -> Vec<Entity> {
        self.entities.iter_alive().collect()
    }

    /// Snapshot of the alive entities that have a `T` component.
    pub fn view<T: 'static>(&self) -> Vec<Entity> {
        let Some(storage) = self.components.get(&TypeId::of::<T>()) else {
            return Vec::new();
        };
        storage
            .typed::<T>()
            .entities()
            .iter()
            .filter_map(|&index| self.entities.entity_at_index(index))
            .collect()
    }

    // ---- Component management ----

    /// Attaches a component to an entity.
    ///
    /// # Panics
    ///
    /// Panics if the entity is dead or already has a `T`.
    pub fn add_component<T: Send + Sync + 'static>(&mut self, entity: Entity, value: T) -> &mut T {
        assert!(self.is_alive(entity), "{entity} is not alive");
        let tick = self.tick;
        let storage = self.storage_mut::<T>();
        let index = entity.index();
        assert!(
            !storage.contains(index),
            "{entity} already has component `{}`",
            std::any::type_name::<T>()
        );
        storage.insert(index, value, tick)
    }

    /// Returns whether the entity is alive and has a `T` component.
    pub fn has_component<T: 'static>(&self, entity: Entity) -> bool {
        self.try_get_component::<T>(entity).is_some()
    }

    /// Returns the entity's `T` component.
    ///
    /// # Panics
    ///
    /// Panics if the entity does not have a `T`.
    pub fn get_component<T: 'static>(&self, entity: Entity) -> &T {
        match self.try_get_component::<T>(entity) {
            Some(value) => value,
            None => panic!(
                "{entity} does not have component `{}`",
                std::any::type_name::<T>()
            ),
        }
    }

    /// Returns the entity's `T` component and marks it changed at the
    /// current tick.
    ///
    /// # Panics
    ///
    /// Panics if the entity does not have a `T`.
    pub fn get_component_mut<T: 'static>(&mut self, entity: Entity) -> &mut T {
        match self.try_get_component_mut::<T>(entity) {
            Some(value) => value,
            None => panic!(
                "{entity} does not have component `{}`",
                std::any::type_name::<T>()
            ),
        }
    }

    /// Returns the entity's `T` component, if any.
    pub fn try_get_component<T: 'static>(&self, entity: Entity) -> Option<&T> {
        if !self.is_alive(entity) {
            return None;
        }
        self.storage::<T>()?.get(entity.index())
    }

    /// Returns the entity's `T` component, if any, marking it changed.
    pub fn try_get_component_mut<T: 'static>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.is_alive(entity) {
            return None;
        }
        let tick = self.tick;
        self.components
            .get_mut(&TypeId::of::<T>())?
            .typed_mut::<T>()
            .get_mut_tracked(entity.index(), tick)
    }

    /// Detaches and returns the entity's `T` component.
    ///
    /// # Panics
    ///
    /// Panics if the entity does not have a `T`.
    pub fn remove_component<T: 'static>(&mut self, entity: Entity) -> T {
        match self.try_remove_component::<T>(entity) {
            Some(value) => value,
            None => panic!(
                "{entity} does not have component `{}`",
                std::any::type_name::<T>()
            ),
        }
    }

    /// Detaches and returns the entity's `T` component, if any.
    pub fn try_remove_component<T: 'static>(&mut self, entity: Entity) -> Option<T> {
        if !self.is_alive(entity) {
            return None;
        }
        self.components
            .get_mut(&TypeId::of::<T>())?
            .typed_mut::<T>()
            .remove(entity.index())
    }

    /// Number of components of type `T` currently stored.
    pub fn component_count<T: 'static>(&self) -> usize {
        self.storage::<T>().map_or(0, SparseSet::len)
    }

    fn storage<T: 'static>(&self) -> Option<&SparseSet<T>> {
        self.components
            .get(&TypeId::of::<T>())
            .map(|storage| storage.typed::<T>())
    }

    fn storage_mut<T: Send + Sync + 'static>(&mut self) -> &mut SparseSet<T> {
        self.components
            .entry(TypeId::of::<T>())
            .or_insert_with(ComponentStorage::new::<T>)
            .typed_mut::<T>()
    }

    // ---- Change detection ----

    /// Returns the current tick.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Advances the tick. Called once per frame by the owner.
    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    /// Returns true if the entity's `T` was changed strictly after `since_tick`.
    pub fn changed_since<T: 'static>(&self, entity: Entity, since_tick: u64) -> bool {
        self.is_alive(entity)
            && self
                .storage::<T>()
                .is_some_and(|s| s.changed_since(entity.index(), since_tick))
    }

    /// Returns true if the entity's `T` was added strictly after `since_tick`.
    pub fn added_since<T: 'static>(&self, entity: Entity, since_tick: u64) -> bool {
        self.is_alive(entity)
            && self
                .storage::<T>()
                .is_some_and(|s| s.added_since(entity.index(), since_tick))
    }

    // ---- Reflection ----

    /// Registers `T` for by-name access (snapshots, cloning, tooling).
    pub fn register_reflected<T: Component + Default>(&mut self) {
        log::debug!("Registry {}: reflecting component `{}`", self.id, T::NAME);
        self.reflected.insert(
            T::NAME,
            ReflectEntry {
                has_fn: |registry, entity| registry.has_component::<T>(entity),
                save_fn: |registry, entity| {
                    registry
                        .try_get_component::<T>(entity)
                        .map(|component| component.save_fields())
                },
                restore_fn: |registry, entity, fields| {
                    if !registry.has_component::<T>(entity) {
                        registry.add_component(entity, T::default());
                    }
                    registry
                        .get_component_mut::<T>(entity)
                        .restore_fields(fields)
                },
                remove_fn: |registry, entity| registry.try_remove_component::<T>(entity).is_some(),
            },
        );
    }

    /// Returns whether the entity has the reflected component named `name`.
    pub fn has_by_name(&self, entity: Entity, name: &str) -> bool {
        self.reflected
            .get(name)
            .is_some_and(|entry| (entry.has_fn)(self, entity))
    }

    /// Names of the reflected components the entity has, sorted by name.
    pub fn reflected_components_of(&self, entity: Entity) -> Vec<&'static str> {
        self.reflected
            .iter()
            .filter(|(_, entry)| (entry.has_fn)(self, entity))
            .map(|(name, _)| *name)
            .collect()
    }

    /// Saves the named component's persistent fields.
    ///
    /// Returns `None` if the name is unknown or the entity lacks it.
    pub fn save_by_name(&self, entity: Entity, name: &str) -> Option<FieldMap> {
        let entry = self.reflected.get(name)?;
        (entry.save_fn)(self, entity)
    }

    /// Restores the named component's fields, adding it if missing.
    ///
    /// Returns `Ok(false)` if the name is not registered.
    pub fn restore_by_name(
        &mut self,
        entity: Entity,
        name: &str,
        fields: &FieldMap,
    ) -> Result<bool, FieldError> {
        let Some(restore) = self.reflected.get(name).map(|e| e.restore_fn) else {
            return Ok(false);
        };
        if !self.is_alive(entity) {
            return Ok(false);
        }
        restore(self, entity, fields)?;
        Ok(true)
    }

    /// Removes the named component. Returns true if it was removed.
    pub fn remove_by_name(&mut self, entity: Entity, name: &str) -> bool {
        let Some(remove) = self.reflected.get(name).map(|e| e.remove_fn) else {
            return false;
        };
        remove(self, entity)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComponentField, FieldInfo, FieldKind, FieldValue};

    #[derive(Debug, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, PartialEq)]
    struct Velocity {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Default, PartialEq)]
    struct Label {
        text: String,
    }

    impl Component for Label {
        const NAME: &'static str = "Label";

        fn field_infos() -> &'static [FieldInfo] {
            &[FieldInfo {
                name: "text",
                kind: FieldKind::String,
            }]
        }

        fn field(&self, name: &str) -> Option<FieldValue> {
            (name == "text").then(|| self.text.to_field_value())
        }

        fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
            if name != "text" {
                return Err(FieldError::UnknownField {
                    component: Self::NAME,
                    field: name.to_string(),
                });
            }
            self.text = String::from_field_value(&value).ok_or(FieldError::TypeMismatch {
                component: Self::NAME,
                field: "text",
                expected: FieldKind::String,
                found: value.kind(),
            })?;
            Ok(())
        }
    }

    #[test]
    fn create_and_destroy() {
        let mut registry = Registry::new();
        let e = registry.create_entity();
        assert!(registry.is_alive(e));
        assert_eq!(registry.entity_count(), 1);

        assert!(registry.destroy_entity(e));
        assert!(!registry.is_alive(e));
        assert_eq!(registry.entity_count(), 0);
        assert!(!registry.destroy_entity(e));
    }

    #[test]
    fn add_and_get() {
        let mut registry = Registry::new();
        let e = registry.create_entity();
        registry.add_component(e, Position { x: 1.0, y: 2.0 });

        assert!(registry.has_component::<Position>(e));
        assert!(!registry.has_component::<Velocity>(e));
        assert_eq!(registry.get_component::<Position>(e), &Position { x: 1.0, y: 2.0 });
    }

    #[test]
    #[should_panic(expected = "already has component")]
    fn add_twice_panics() {
        let mut registry = Registry::new();
        let e = registry.create_entity();
        registry.add_component(e, Position { x: 0.0, y: 0.0 });
        registry.add_component(e, Position { x: 1.0, y: 1.0 });
    }

    #[test]
    #[should_panic(expected = "does not have component")]
    fn get_missing_panics() {
        let mut registry = Registry::new();
        let e = registry.create_entity();
        let _ = registry.get_component::<Position>(e);
    }

    #[test]
    #[should_panic(expected = "is not alive")]
    fn add_to_dead_entity_panics() {
        let mut registry = Registry::new();
        let e = registry.create_entity();
        registry.destroy_entity(e);
        registry.add_component(e, Position { x: 0.0, y: 0.0 });
    }

    #[test]
    fn destroy_drops_components() {
        let mut registry = Registry::new();
        let e = registry.create_entity();
        registry.add_component(e, Position { x: 0.0, y: 0.0 });
        registry.add_component(e, Velocity { x: 1.0, y: 0.0 });

        registry.destroy_entity(e);
        assert_eq!(registry.component_count::<Position>(), 0);
        assert_eq!(registry.component_count::<Velocity>(), 0);
    }

    #[test]
    fn stale_handle_does_not_see_new_occupant() {
        let mut registry = Registry::new();
        let old = registry.create_entity();
        registry.destroy_entity(old);
        let new = registry.create_entity();
        registry.add_component(new, Position { x: 5.0, y: 5.0 });

        assert_eq!(old.index(), new.index());
        assert!(!registry.has_component::<Position>(old));
        assert!(registry.try_get_component::<Position>(old).is_none());
    }

    #[test]
    fn handles_from_another_registry_are_rejected() {
        let mut a = Registry::new();
        let mut b = Registry::new();
        let ea = a.create_entity();
        let eb = b.create_entity();
        b.add_component(eb, Position { x: 0.0, y: 0.0 });

        assert_eq!(ea.index(), eb.index());
        assert!(!b.is_alive(ea));
        assert!(!b.has_component::<Position>(ea));
    }

    #[test]
    fn view_snapshots_entities_with_component() {
        let mut registry = Registry::new();
        let e0 = registry.create_entity();
        let e1 = registry.create_entity();
        let e2 = registry.create_entity();
        registry.add_component(e0, Position { x: 0.0, y: 0.0 });
        registry.add_component(e2, Position { x: 0.0, y: 0.0 });
        registry.add_component(e1, Velocity { x: 0.0, y: 0.0 });

        let mut with_position = registry.view::<Position>();
        with_position.sort();
        assert_eq!(with_position, vec![e0, e2]);
        assert!(registry.view::<Label>().is_empty());

        // The snapshot stays valid while the registry is mutated.
        for entity in registry.view::<Position>() {
            registry.destroy_entity(entity);
        }
        assert_eq!(registry.get_all_entities(), vec![e1]);
    }

    #[test]
    fn remove_returns_value() {
        let mut registry = Registry::new();
        let e = registry.create_entity();
        registry.add_component(e, Velocity { x: 3.0, y: 4.0 });

        assert_eq!(registry.remove_component::<Velocity>(e), Velocity { x: 3.0, y: 4.0 });
        assert!(registry.try_remove_component::<Velocity>(e).is_none());
    }

    // ---- Change detection ----

    #[test]
    fn tick_starts_at_one() {
        let registry = Registry::new();
        assert_eq!(registry.current_tick(), 1);
    }

    #[test]
    fn get_mut_marks_changed() {
        let mut registry = Registry::new();
        let e = registry.create_entity();
        registry.add_component(e, Position { x: 0.0, y: 0.0 });
        assert!(registry.added_since::<Position>(e, 0));

        registry.advance_tick();
        let synced = registry.current_tick();
        assert!(!registry.changed_since::<Position>(e, synced));

        registry.advance_tick();
        registry.get_component_mut::<Position>(e).x = 1.0;
        assert!(registry.changed_since::<Position>(e, synced));
        assert!(!registry.added_since::<Position>(e, synced));
    }

    #[test]
    fn reading_does_not_mark_changed() {
        let mut registry = Registry::new();
        let e = registry.create_entity();
        registry.add_component(e, Position { x: 0.0, y: 0.0 });
        registry.advance_tick();
        let since = registry.current_tick();

        let _ = registry.get_component::<Position>(e);
        assert!(!registry.changed_since::<Position>(e, since));
    }

    // ---- Reflection ----

    #[test]
    fn reflected_save_and_restore() {
        let mut registry = Registry::new();
        registry.register_reflected::<Label>();

        let a = registry.create_entity();
        registry.add_component(
            a,
            Label {
                text: "crate".into(),
            },
        );
        assert_eq!(registry.reflected_components_of(a), vec!["Label"]);
        assert!(registry.has_by_name(a, "Label"));
        assert!(!registry.has_by_name(a, "Position"));

        let fields = registry.save_by_name(a, "Label").unwrap();
        let b = registry.create_entity();
        assert!(registry.restore_by_name(b, "Label", &fields).unwrap());
        assert_eq!(registry.get_component::<Label>(b).text, "crate");
    }

    #[test]
    fn restore_unknown_name_is_ignored() {
        let mut registry = Registry::new();
        let e = registry.create_entity();
        assert!(!registry.restore_by_name(e, "Missing", &FieldMap::new()).unwrap());
        assert!(registry.save_by_name(e, "Missing").is_none());
    }

    #[test]
    fn remove_by_name() {
        let mut registry = Registry::new();
        registry.register_reflected::<Label>();
        let e = registry.create_entity();
        registry.add_component(e, Label::default());

        assert!(registry.remove_by_name(e, "Label"));
        assert!(!registry.has_component::<Label>(e));
        assert!(!registry.remove_by_name(e, "Label"));
    }
}
