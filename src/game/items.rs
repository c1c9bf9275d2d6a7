//! Pickups
//!
//! Touching an item doesn't heal anything directly: it submits
//! `AddPlayerHealth` / `AddWeaponEnergy` and the level runtime applies them
//! when the event comes round.

use tracing::debug;
use super::component::ComponentBucket;
use super::components::{EntityKind, Item, ItemKind, Lifetime};
use super::damage::Combatant;
use super::entity::Entity;
use super::event::{Event, EventType};
use super::geometry::{Rect, Vec2};
use super::megaman::Megaman;
use super::physics::{Body, BodyType, Fixture, FixtureType};
use super::pool::EntityPools;
use super::timer::Timer;
use super::world::World;

pub const SMALL_PICKUP_AMOUNT: i32 = 3;
/// Dropped items vanish after this long
pub const DROPPED_ITEM_LIFETIME: f32 = 5.0;

fn item_kind(kind: EntityKind) -> ItemKind {
    match kind {
        EntityKind::WeaponEnergy => ItemKind::WeaponEnergy { amount: SMALL_PICKUP_AMOUNT },
        _ => ItemKind::HealthBulb { amount: SMALL_PICKUP_AMOUNT },
    }
}

pub fn item_bucket(kind: EntityKind) -> ComponentBucket {
    let size = Vec2::new(0.5, 0.5);
    let body = Body::new(BodyType::Dynamic, Rect::centered(Vec2::ZERO, size.x, size.y))
        .with_fixture(Fixture::new(FixtureType::Item, size))
        .with_fixture(Fixture::new(FixtureType::Feet, Vec2::new(0.4, 0.1)).at(Vec2::new(0.0, -size.y / 2.0)));
    ComponentBucket::new()
        .with(kind)
        .with(body)
        .with(Item { kind: item_kind(kind) })
}

pub fn register_item_pools(pools: &mut EntityPools) {
    for kind in [EntityKind::HealthBulb, EntityKind::WeaponEnergy] {
        pools.register(kind, move || item_bucket(kind));
    }
}

/// Spawn an item. Dropped items expire, placed ones stay.
pub fn spawn_item(world: &mut World, pools: &mut EntityPools, kind: EntityKind, position: Vec2, dropped: bool) -> Option<Entity> {
    let entity = pools.spawn(world, kind)?;
    if let Some(body) = world.get_mut::<Body>(entity) {
        body.set_center(position);
        body.velocity = Vec2::ZERO;
    }
    if dropped {
        world.add(entity, Lifetime { timer: Timer::new(DROPPED_ITEM_LIFETIME) });
    } else {
        world.remove::<Lifetime>(entity);
    }
    debug!(?kind, %entity, dropped, "item spawned");
    Some(entity)
}

/// The event an item submits when collected.
pub fn pickup_event(item: &Item) -> Event {
    match item.kind {
        ItemKind::HealthBulb { amount } => Event::new(EventType::AddPlayerHealth).with("amount", amount),
        ItemKind::WeaponEnergy { amount } => Event::new(EventType::AddWeaponEnergy).with("amount", amount),
    }
}

/// Apply a pickup event to the player. Returns false for other events.
pub fn apply_pickup(world: &mut World, player: Entity, event: &Event) -> bool {
    let amount = event.properties.get_int_or("amount", 0) as i32;
    match event.key {
        EventType::AddPlayerHealth => {
            if let Some(combatant) = world.get_mut::<Combatant>(player) {
                combatant.health.heal(amount);
            }
            true
        }
        EventType::AddWeaponEnergy => {
            if let Some(megaman) = world.get_mut::<Megaman>(player) {
                let current = megaman.current_weapon;
                megaman.weapons.add_weapon_energy(current, amount);
            }
            true
        }
        _ => false,
    }
}

/// Tick item lifetimes.
pub fn update_items(world: &mut World, delta: f32) {
    for entity in world.entities_with::<Item>() {
        let expired = world.get_mut::<Lifetime>(entity).is_some_and(|lifetime| {
            lifetime.timer.update(delta);
            lifetime.timer.is_finished()
        });
        if expired {
            world.despawn(entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::game::megaman::{megaman_bucket, MegamanWeapon};

    #[test]
    fn test_pickup_heals_player() {
        let config = EngineConfig::default();
        let mut world = World::new();
        let player = world.spawn_with(megaman_bucket(&config, Vec2::ZERO));
        world.get_mut::<Combatant>(player).unwrap().health.damage(10);

        let event = pickup_event(&Item { kind: ItemKind::HealthBulb { amount: 3 } });
        assert!(apply_pickup(&mut world, player, &event));
        assert_eq!(world.get::<Combatant>(player).unwrap().health.current(), config.max_health - 7);
    }

    #[test]
    fn test_weapon_energy_goes_to_current_weapon() {
        let config = EngineConfig::default();
        let mut world = World::new();
        let player = world.spawn_with(megaman_bucket(&config, Vec2::ZERO));
        {
            let megaman = world.get_mut::<Megaman>(player).unwrap();
            megaman.weapons.put_weapon(MegamanWeapon::IceCube);
            megaman.set_current_weapon(MegamanWeapon::IceCube);
            megaman.weapons.translate_ammo(MegamanWeapon::IceCube, -10);
        }
        let event = pickup_event(&Item { kind: ItemKind::WeaponEnergy { amount: 3 } });
        apply_pickup(&mut world, player, &event);
        assert_eq!(world.get::<Megaman>(player).unwrap().weapons.ammo(MegamanWeapon::IceCube), 23);

        assert!(!apply_pickup(&mut world, player, &Event::new(EventType::GamePause)));
    }

    #[test]
    fn test_weapon_energy_with_buster_equipped() {
        let config = EngineConfig::default();
        let mut world = World::new();
        let player = world.spawn_with(megaman_bucket(&config, Vec2::ZERO));
        {
            let megaman = world.get_mut::<Megaman>(player).unwrap();
            megaman.weapons.put_weapon(MegamanWeapon::FireBall);
            megaman.weapons.translate_ammo(MegamanWeapon::FireBall, -10);
            megaman.set_current_weapon(MegamanWeapon::MegaBuster);
        }
        let event = pickup_event(&Item { kind: ItemKind::WeaponEnergy { amount: 4 } });
        assert!(apply_pickup(&mut world, player, &event));
        let megaman = world.get::<Megaman>(player).unwrap();
        assert_eq!(megaman.current_weapon, MegamanWeapon::MegaBuster);
        assert_eq!(megaman.weapons.ammo(MegamanWeapon::FireBall), 24);
    }

    #[test]
    fn test_dropped_items_expire() {
        let mut world = World::new();
        let mut pools = EntityPools::new();
        register_item_pools(&mut pools);
        let dropped = spawn_item(&mut world, &mut pools, EntityKind::HealthBulb, Vec2::ZERO, true).unwrap();
        let placed = spawn_item(&mut world, &mut pools, EntityKind::WeaponEnergy, Vec2::ZERO, false).unwrap();
        update_items(&mut world, DROPPED_ITEM_LIFETIME);
        assert!(world.is_despawn_queued(dropped));
        assert!(!world.is_despawn_queued(placed));
    }
}
