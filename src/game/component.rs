//! Component Storage
//!
//! Two containers live here:
//!
//! - `ComponentStorage<T>`: a sparse array indexed by entity slot. The world
//!   keeps one of these holding every entity's bucket.
//! - `ComponentBucket`: the per-entity map from component type to the single
//!   instance of that type the entity owns. Adding a component of a type the
//!   entity already has overwrites the old one.
//!
//! Buckets are plain values, so a destroyed entity's bucket can be handed back
//! to an object pool and re-attached to the next entity of the same kind.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use super::entity::Entity;

/// Marker for types that can be attached to entities.
pub trait Component: Any {}

impl<T: Any> Component for T {}

/// Sparse storage for one value type, indexed by entity slot.
///
/// Holes are `None`. Only the slot index is used, so liveness checks belong
/// to the caller (the world validates generations before touching storage).
pub struct ComponentStorage<T> {
    data: Vec<Option<T>>,
}

impl<T> ComponentStorage<T> {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Insert, replacing and returning whatever occupied the slot.
    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        let index = entity.index() as usize;
        if self.data.len() <= index {
            self.data.resize_with(index + 1, || None);
        }
        self.data[index].replace(value)
    }

    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        self.data.get_mut(entity.index() as usize)?.take()
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.data.get(entity.index() as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.data.get_mut(entity.index() as usize)?.as_mut()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.get(entity).is_some()
    }

    /// Occupied (slot index, value) pairs in slot order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.data
            .iter()
            .enumerate()
            .filter_map(|(index, value)| Some((index as u32, value.as_ref()?)))
    }

    pub fn count(&self) -> usize {
        self.data.iter().flatten().count()
    }
}

impl<T> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// One entity's components, at most one per type.
#[derive(Default)]
pub struct ComponentBucket {
    components: HashMap<TypeId, Box<dyn Any>>,
}

impl ComponentBucket {
    pub fn new() -> Self {
        Self { components: HashMap::new() }
    }

    /// Builder-style add for assembling prefabs.
    pub fn with<T: Component>(mut self, component: T) -> Self {
        self.add(component);
        self
    }

    /// Put `component` in its type's slot. Returns the instance it replaced.
    pub fn add<T: Component>(&mut self, component: T) -> Option<T> {
        self.components
            .insert(TypeId::of::<T>(), Box::new(component))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn get<T: Component>(&self) -> Option<&T> {
        self.components
            .get(&TypeId::of::<T>())
            .and_then(|c| c.downcast_ref::<T>())
    }

    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components
            .get_mut(&TypeId::of::<T>())
            .and_then(|c| c.downcast_mut::<T>())
    }

    pub fn remove<T: Component>(&mut self) -> Option<T> {
        self.components
            .remove(&TypeId::of::<T>())
            .and_then(|c| c.downcast::<T>().ok())
            .map(|c| *c)
    }

    pub fn has<T: Component>(&self) -> bool {
        self.components.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn clear(&mut self) {
        self.components.clear();
    }
}

impl std::fmt::Debug for ComponentBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentBucket")
            .field("components", &self.components.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(i32);

    #[derive(Debug, PartialEq)]
    struct Speed(f32);

    #[test]
    fn test_storage_insert_and_get() {
        let mut storage: ComponentStorage<i32> = ComponentStorage::new();
        let entity = Entity::new(5, 0);

        assert_eq!(storage.insert(entity, 42), None);
        assert_eq!(storage.get(entity), Some(&42));
        assert_eq!(storage.insert(entity, 7), Some(42));
        assert_eq!(storage.remove(entity), Some(7));
        assert!(!storage.contains(entity));
    }

    #[test]
    fn test_storage_is_sparse() {
        let mut storage: ComponentStorage<&str> = ComponentStorage::new();
        storage.insert(Entity::new(0, 0), "zero");
        storage.insert(Entity::new(100, 0), "hundred");

        assert!(!storage.contains(Entity::new(50, 0)));
        assert_eq!(storage.count(), 2);
        let items: Vec<_> = storage.iter().collect();
        assert!(items.contains(&(100, &"hundred")));
    }

    #[test]
    fn test_bucket_one_slot_per_type() {
        let mut bucket = ComponentBucket::new();
        assert_eq!(bucket.add(Health(10)), None);
        assert_eq!(bucket.add(Speed(2.0)), None);
        assert_eq!(bucket.len(), 2);

        // Re-adding the same type overwrites
        assert_eq!(bucket.add(Health(25)), Some(Health(10)));
        assert_eq!(bucket.len(), 2);
        assert_eq!(bucket.get::<Health>(), Some(&Health(25)));
    }

    #[test]
    fn test_bucket_get_mut_and_remove() {
        let mut bucket = ComponentBucket::new().with(Health(3));
        bucket.get_mut::<Health>().unwrap().0 -= 1;
        assert_eq!(bucket.get::<Health>(), Some(&Health(2)));

        assert_eq!(bucket.remove::<Health>(), Some(Health(2)));
        assert!(!bucket.has::<Health>());
        assert!(bucket.is_empty());
        assert_eq!(bucket.remove::<Health>(), None);
    }
}
