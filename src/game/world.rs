//! Game World
//!
//! The World owns every live entity in the level:
//! - Entity allocation and lifetime tracking
//! - One `ComponentBucket` per entity
//! - Deferred destruction (so systems can destroy while iterating)
//!
//! Destroying an entity hands its bucket back to the caller instead of
//! dropping it. The runtime forwards those buckets to the entity pools, which
//! is how pooled bullets and enemies get recycled.

use tracing::warn;
use super::component::{Component, ComponentBucket, ComponentStorage};
use super::entity::{Entity, EntityAllocator};

struct EntitySlot {
    entity: Entity,
    bucket: ComponentBucket,
}

/// Container for all entities of the running level.
pub struct World {
    entities: EntityAllocator,
    slots: ComponentStorage<EntitySlot>,
    /// Entities queued for destruction at end of frame
    despawn_queue: Vec<Entity>,
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: EntityAllocator::new(),
            slots: ComponentStorage::new(),
            despawn_queue: Vec::new(),
        }
    }

    // =========================================================================
    // Entity Management
    // =========================================================================

    /// Spawn an entity with no components.
    pub fn spawn(&mut self) -> Entity {
        self.spawn_with(ComponentBucket::new())
    }

    /// Spawn an entity that takes ownership of a pre-built bucket.
    pub fn spawn_with(&mut self, bucket: ComponentBucket) -> Entity {
        let entity = self.entities.allocate();
        self.slots.insert(entity, EntitySlot { entity, bucket });
        entity
    }

    /// Queue an entity for destruction at end of frame.
    pub fn despawn(&mut self, entity: Entity) {
        if self.is_alive(entity) && !self.despawn_queue.contains(&entity) {
            self.despawn_queue.push(entity);
        }
    }

    pub fn is_despawn_queued(&self, entity: Entity) -> bool {
        self.despawn_queue.contains(&entity)
    }

    /// Destroy an entity now and return its bucket. A dead or stale handle
    /// returns `None`, so each entity yields its bucket exactly once.
    pub fn despawn_immediate(&mut self, entity: Entity) -> Option<ComponentBucket> {
        if !self.entities.free(entity) {
            return None;
        }
        self.despawn_queue.retain(|&e| e != entity);
        self.slots.remove(entity).map(|slot| slot.bucket)
    }

    /// Process all queued destructions. Returns the reclaimed buckets.
    pub fn flush_despawns(&mut self) -> Vec<ComponentBucket> {
        let queue = std::mem::take(&mut self.despawn_queue);
        queue
            .into_iter()
            .filter_map(|entity| self.despawn_immediate(entity))
            .collect()
    }

    /// Destroy everything (level unload). Returns every bucket.
    pub fn clear(&mut self) -> Vec<ComponentBucket> {
        let alive = self.entities();
        let buckets = alive
            .into_iter()
            .filter_map(|entity| self.slots.remove(entity).map(|slot| slot.bucket))
            .collect();
        self.entities.clear();
        self.despawn_queue.clear();
        buckets
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    pub fn entity_count(&self) -> u32 {
        self.entities.alive_count()
    }

    /// Snapshot of all live entities, in slot order.
    pub fn entities(&self) -> Vec<Entity> {
        self.slots.iter().map(|(_, slot)| slot.entity).collect()
    }

    // =========================================================================
    // Components
    // =========================================================================

    pub fn bucket(&self, entity: Entity) -> Option<&ComponentBucket> {
        if !self.is_alive(entity) {
            return None;
        }
        self.slots.get(entity).map(|slot| &slot.bucket)
    }

    pub fn bucket_mut(&mut self, entity: Entity) -> Option<&mut ComponentBucket> {
        if !self.is_alive(entity) {
            return None;
        }
        self.slots.get_mut(entity).map(|slot| &mut slot.bucket)
    }

    /// Attach a component, replacing (and returning) any of the same type.
    pub fn add<T: Component>(&mut self, entity: Entity, component: T) -> Option<T> {
        match self.bucket_mut(entity) {
            Some(bucket) => bucket.add(component),
            None => {
                warn!(%entity, component = std::any::type_name::<T>(), "add() on dead entity ignored");
                None
            }
        }
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.bucket(entity).and_then(|b| b.get::<T>())
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.bucket_mut(entity).and_then(|b| b.get_mut::<T>())
    }

    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.bucket_mut(entity).and_then(|b| b.remove::<T>())
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.bucket(entity).is_some_and(|b| b.has::<T>())
    }

    /// All live entities owning a `T`, in slot order.
    pub fn entities_with<T: Component>(&self) -> Vec<Entity> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.bucket.has::<T>())
            .map(|(_, slot)| slot.entity)
            .collect()
    }

    /// First live entity owning a `T` (the player, the camera focus, ...).
    pub fn first_with<T: Component>(&self) -> Option<Entity> {
        self.slots
            .iter()
            .find(|(_, slot)| slot.bucket.has::<T>())
            .map(|(_, slot)| slot.entity)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Tag(&'static str);

    #[derive(Debug, PartialEq)]
    struct Hp(i32);

    #[test]
    fn test_spawn_and_despawn_immediate() {
        let mut world = World::new();
        let e1 = world.spawn();
        let e2 = world.spawn();
        world.add(e1, Tag("met"));
        assert_eq!(world.entity_count(), 2);

        let bucket = world.despawn_immediate(e1).unwrap();
        assert_eq!(bucket.get::<Tag>(), Some(&Tag("met")));
        assert!(!world.is_alive(e1));
        assert!(world.is_alive(e2));

        // Second destroy yields nothing
        assert!(world.despawn_immediate(e1).is_none());
    }

    #[test]
    fn test_deferred_despawn_returns_each_bucket_once() {
        let mut world = World::new();
        let e = world.spawn();
        world.despawn(e);
        world.despawn(e);
        assert!(world.is_alive(e));
        assert!(world.is_despawn_queued(e));

        let buckets = world.flush_despawns();
        assert_eq!(buckets.len(), 1);
        assert!(!world.is_alive(e));
        assert!(world.flush_despawns().is_empty());
    }

    #[test]
    fn test_stale_handle_cannot_reach_new_entity() {
        let mut world = World::new();
        let old = world.spawn();
        world.add(old, Hp(1));
        world.despawn_immediate(old);

        let new = world.spawn();
        world.add(new, Hp(5));
        assert_eq!(new.index(), old.index());
        assert!(world.get::<Hp>(old).is_none());
        assert_eq!(world.get::<Hp>(new), Some(&Hp(5)));
        assert!(world.add(old, Hp(9)).is_none());
        assert_eq!(world.get::<Hp>(new), Some(&Hp(5)));
    }

    #[test]
    fn test_queries() {
        let mut world = World::new();
        let a = world.spawn();
        let b = world.spawn();
        let c = world.spawn();
        world.add(a, Hp(1));
        world.add(c, Hp(3));
        world.add(b, Tag("block"));

        assert_eq!(world.entities_with::<Hp>(), vec![a, c]);
        assert_eq!(world.first_with::<Tag>(), Some(b));
        assert!(world.has::<Hp>(c));
        assert!(!world.has::<Hp>(b));
    }

    #[test]
    fn test_clear_returns_all_buckets() {
        let mut world = World::new();
        for _ in 0..4 {
            world.spawn();
        }
        let gone = world.spawn();
        world.despawn_immediate(gone);

        let buckets = world.clear();
        assert_eq!(buckets.len(), 4);
        assert_eq!(world.entity_count(), 0);
        assert!(world.entities().is_empty());
    }
}
