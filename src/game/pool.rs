//! Object Pools
//!
//! Bullets, explosions and enemies are spawned and destroyed constantly.
//! Rather than rebuilding their component buckets every time, destroyed
//! buckets go back into a per-kind pool and the next spawn of that kind
//! re-attaches one. Re-adding a component overwrites the stale copy, so a
//! spawner only has to set what differs (position, trajectory, owner).
//!
//! `EntityPools` is an ordinary value owned by the level runtime and passed
//! to whoever spawns. There is no global registry.

use std::collections::HashMap;
use tracing::{debug, warn};
use super::component::ComponentBucket;
use super::components::{EntityKind, Pooled};
use super::entity::Entity;
use super::world::World;

type Supplier<T> = Box<dyn FnMut() -> T>;
type Hook<T> = Box<dyn FnMut(&mut T)>;

/// Free list of reusable values, refilled by a supplier when empty.
pub struct Pool<T> {
    free: Vec<T>,
    supplier: Supplier<T>,
    on_fetch: Option<Hook<T>>,
    on_free: Option<Hook<T>>,
    created: usize,
}

impl<T> Pool<T> {
    pub fn new(supplier: impl FnMut() -> T + 'static) -> Self {
        Self {
            free: Vec::new(),
            supplier: Box::new(supplier),
            on_fetch: None,
            on_free: None,
            created: 0,
        }
    }

    /// Pre-fill with `count` fresh values.
    pub fn with_capacity(supplier: impl FnMut() -> T + 'static, count: usize) -> Self {
        let mut pool = Self::new(supplier);
        for _ in 0..count {
            let value = (pool.supplier)();
            pool.created += 1;
            pool.free.push(value);
        }
        pool
    }

    pub fn on_fetch(mut self, hook: impl FnMut(&mut T) + 'static) -> Self {
        self.on_fetch = Some(Box::new(hook));
        self
    }

    pub fn on_free(mut self, hook: impl FnMut(&mut T) + 'static) -> Self {
        self.on_free = Some(Box::new(hook));
        self
    }

    pub fn fetch(&mut self) -> T {
        let mut value = match self.free.pop() {
            Some(value) => value,
            None => {
                self.created += 1;
                (self.supplier)()
            }
        };
        if let Some(hook) = self.on_fetch.as_mut() {
            hook(&mut value);
        }
        value
    }

    pub fn free(&mut self, mut value: T) {
        if let Some(hook) = self.on_free.as_mut() {
            hook(&mut value);
        }
        self.free.push(value);
    }

    /// Values waiting for reuse
    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Values ever built by the supplier
    pub fn created(&self) -> usize {
        self.created
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub created: usize,
    pub free: usize,
    pub in_use: usize,
}

/// Per-kind pools of entity buckets.
#[derive(Default)]
pub struct EntityPools {
    pools: HashMap<EntityKind, Pool<ComponentBucket>>,
    in_use: HashMap<EntityKind, usize>,
}

impl EntityPools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the prefab builder for a kind. Replaces any previous pool.
    pub fn register(&mut self, kind: EntityKind, supplier: impl FnMut() -> ComponentBucket + 'static) {
        self.pools.insert(kind, Pool::new(supplier));
        self.in_use.insert(kind, 0);
    }

    pub fn is_registered(&self, kind: EntityKind) -> bool {
        self.pools.contains_key(&kind)
    }

    /// Spawn a pooled entity of `kind`. `None` when nothing is registered for it.
    pub fn spawn(&mut self, world: &mut World, kind: EntityKind) -> Option<Entity> {
        let Some(pool) = self.pools.get_mut(&kind) else {
            warn!(?kind, "no pool registered");
            return None;
        };
        let mut bucket = pool.fetch();
        bucket.add(Pooled(kind));
        *self.in_use.entry(kind).or_default() += 1;
        Some(world.spawn_with(bucket))
    }

    /// Return a destroyed entity's bucket to its pool. Buckets without a
    /// `Pooled` tag (or whose kind is unknown) are dropped.
    pub fn reclaim(&mut self, bucket: ComponentBucket) -> bool {
        let Some(&Pooled(kind)) = bucket.get::<Pooled>() else {
            return false;
        };
        let Some(pool) = self.pools.get_mut(&kind) else {
            return false;
        };
        pool.free(bucket);
        if let Some(count) = self.in_use.get_mut(&kind) {
            *count = count.saturating_sub(1);
        }
        debug!(?kind, free = pool.len(), "bucket returned to pool");
        true
    }

    /// Reclaim a batch (typically `World::flush_despawns`). Returns how many were pooled.
    pub fn reclaim_all(&mut self, buckets: Vec<ComponentBucket>) -> usize {
        let mut pooled = 0;
        for bucket in buckets {
            if self.reclaim(bucket) {
                pooled += 1;
            }
        }
        pooled
    }

    pub fn stats(&self, kind: EntityKind) -> PoolStats {
        match self.pools.get(&kind) {
            Some(pool) => PoolStats {
                created: pool.created(),
                free: pool.len(),
                in_use: self.in_use.get(&kind).copied().unwrap_or(0),
            },
            None => PoolStats::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Ammo(i32);

    #[test]
    fn test_pool_reuses_freed_values() {
        let mut pool = Pool::new(|| vec![0u8; 4]);
        let a = pool.fetch();
        assert_eq!(pool.created(), 1);
        pool.free(a);
        assert_eq!(pool.len(), 1);
        let _b = pool.fetch();
        assert_eq!(pool.created(), 1);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_pool_hooks() {
        let mut pool = Pool::with_capacity(|| 10, 2).on_free(|v| *v = 0).on_fetch(|v| *v += 1);
        assert_eq!(pool.len(), 2);
        let v = pool.fetch();
        assert_eq!(v, 11);
        pool.free(v);
        assert_eq!(pool.fetch(), 1);
    }

    #[test]
    fn test_destroy_returns_exactly_one_bucket() {
        let mut world = World::new();
        let mut pools = EntityPools::new();
        pools.register(EntityKind::Bullet, || ComponentBucket::new().with(Ammo(1)));

        let bullet = pools.spawn(&mut world, EntityKind::Bullet).unwrap();
        assert_eq!(pools.stats(EntityKind::Bullet).in_use, 1);

        world.despawn(bullet);
        world.despawn(bullet);
        assert_eq!(pools.reclaim_all(world.flush_despawns()), 1);

        // Destroying again after the fact yields nothing more
        assert!(world.despawn_immediate(bullet).is_none());

        let stats = pools.stats(EntityKind::Bullet);
        assert_eq!(stats, PoolStats { created: 1, free: 1, in_use: 0 });
    }

    #[test]
    fn test_respawn_reuses_bucket() {
        let mut world = World::new();
        let mut pools = EntityPools::new();
        pools.register(EntityKind::Met, || ComponentBucket::new().with(Ammo(3)));

        let first = pools.spawn(&mut world, EntityKind::Met).unwrap();
        world.get_mut::<Ammo>(first).unwrap().0 = 0;
        pools.reclaim(world.despawn_immediate(first).unwrap());

        let second = pools.spawn(&mut world, EntityKind::Met).unwrap();
        // Same bucket came back; the spawner is expected to overwrite state
        assert_eq!(world.get::<Ammo>(second), Some(&Ammo(0)));
        assert_eq!(world.get::<Pooled>(second), Some(&Pooled(EntityKind::Met)));
        assert_eq!(pools.stats(EntityKind::Met).created, 1);
    }

    #[test]
    fn test_untagged_and_unregistered() {
        let mut world = World::new();
        let mut pools = EntityPools::new();
        assert!(pools.spawn(&mut world, EntityKind::Bat).is_none());
        assert!(!pools.reclaim(ComponentBucket::new()));
    }
}
