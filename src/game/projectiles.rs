//! Projectiles
//!
//! Every projectile kind is pooled. A pooled bucket keeps whatever state its
//! previous life left behind, so the spawn functions overwrite every
//! per-shot field (position, velocity, owner, hit count, lifetime).

use tracing::debug;
use super::component::ComponentBucket;
use super::components::{EntityKind, Lifetime, Projectile};
use super::damage::{ContactDamager, DamagerKind, Team};
use super::entity::Entity;
use super::geometry::{Facing, Rect, Vec2};
use super::megaman::{ChargeStatus, PlayerShot};
use super::physics::{Body, BodyType, Fixture, FixtureType};
use super::pool::EntityPools;
use super::timer::Timer;
use super::world::World;

/// Seconds before an unobstructed shot gives up
pub const PROJECTILE_LIFETIME: f32 = 3.0;

pub const PROJECTILE_KINDS: &[EntityKind] = &[
    EntityKind::Bullet,
    EntityKind::ChargedShot,
    EntityKind::Fireball,
    EntityKind::IceCube,
    EntityKind::MoonScythe,
    EntityKind::MetBullet,
];

/// (size, speed) per kind
fn shape(kind: EntityKind) -> (Vec2, f32) {
    match kind {
        EntityKind::ChargedShot => (Vec2::new(0.75, 0.75), 12.0),
        EntityKind::Fireball => (Vec2::new(0.5, 0.5), 8.0),
        EntityKind::IceCube => (Vec2::new(0.5, 0.5), 7.0),
        EntityKind::MoonScythe => (Vec2::new(0.75, 0.5), 9.0),
        EntityKind::MetBullet => (Vec2::new(0.25, 0.25), 6.0),
        _ => (Vec2::new(0.25, 0.25), 10.0),
    }
}

fn damager_for(kind: EntityKind) -> ContactDamager {
    match kind {
        EntityKind::ChargedShot => ContactDamager::new(DamagerKind::HalfChargedShot, Team::Player).single_hit(),
        EntityKind::Fireball => ContactDamager::new(DamagerKind::Fireball, Team::Player).single_hit(),
        EntityKind::IceCube => ContactDamager::new(DamagerKind::IceCube, Team::Player).single_hit(),
        EntityKind::MoonScythe => ContactDamager::new(DamagerKind::MoonScythe, Team::Player),
        EntityKind::MetBullet => ContactDamager::new(DamagerKind::EnemyBullet, Team::Enemy).single_hit(),
        _ => ContactDamager::new(DamagerKind::Bullet, Team::Player).single_hit(),
    }
}

/// Fresh bucket for a projectile kind. Used as the pool supplier.
pub fn projectile_bucket(kind: EntityKind) -> ComponentBucket {
    let (size, _) = shape(kind);
    let mut body = Body::new(BodyType::Abstract, Rect::centered(Vec2::ZERO, size.x, size.y))
        .with_fixture(Fixture::new(FixtureType::Projectile, size))
        .with_fixture(Fixture::new(FixtureType::Damager, size));
    body.gravity_on = false;
    ComponentBucket::new()
        .with(kind)
        .with(body)
        .with(damager_for(kind))
        .with(Projectile { owner: Entity::NULL, kind })
        .with(Lifetime { timer: Timer::new(PROJECTILE_LIFETIME) })
}

pub fn register_projectile_pools(pools: &mut EntityPools) {
    for &kind in PROJECTILE_KINDS {
        pools.register(kind, move || projectile_bucket(kind));
    }
}

/// Fetch a projectile and aim it. `None` if the kind has no pool.
pub fn spawn_projectile(
    world: &mut World,
    pools: &mut EntityPools,
    kind: EntityKind,
    owner: Entity,
    origin: Vec2,
    direction: Vec2,
) -> Option<Entity> {
    let entity = pools.spawn(world, kind)?;
    let (_, speed) = shape(kind);
    if let Some(body) = world.get_mut::<Body>(entity) {
        body.set_center(origin);
        body.velocity = direction.normalize() * speed;
    }
    if let Some(projectile) = world.get_mut::<Projectile>(entity) {
        projectile.owner = owner;
    }
    if let Some(damager) = world.get_mut::<ContactDamager>(entity) {
        damager.hits = 0;
    }
    if let Some(lifetime) = world.get_mut::<Lifetime>(entity) {
        lifetime.timer.reset();
    }
    debug!(?kind, %entity, "projectile spawned");
    Some(entity)
}

/// Spawn what Megaman just fired.
pub fn spawn_player_shot(world: &mut World, pools: &mut EntityPools, owner: Entity, shot: &PlayerShot) -> Option<Entity> {
    let direction = match shot.facing {
        Facing::Left => Vec2::new(-1.0, 0.0),
        Facing::Right => Vec2::new(1.0, 0.0),
    };
    let entity = spawn_projectile(world, pools, shot.request.projectile, owner, shot.origin, direction)?;
    if shot.request.projectile == EntityKind::ChargedShot {
        if let Some(damager) = world.get_mut::<ContactDamager>(entity) {
            let full = shot.request.status == ChargeStatus::FullyCharged;
            damager.kind = if full { DamagerKind::FullyChargedShot } else { DamagerKind::HalfChargedShot };
            // A full charge passes through what it kills
            damager.single_hit = !full;
        }
    }
    Some(entity)
}

/// Tick lifetimes; despawn expired and spent projectiles.
pub fn update_projectiles(world: &mut World, delta: f32) {
    for entity in world.entities_with::<Projectile>() {
        let expired = world.get_mut::<Lifetime>(entity).is_some_and(|lifetime| {
            lifetime.timer.update(delta);
            lifetime.timer.is_finished()
        });
        let spent = world.get::<ContactDamager>(entity).is_some_and(|d| d.is_spent());
        if expired || spent {
            world.despawn(entity);
        }
    }
}
