//! Megaman
//!
//! The player character. State lives in three components on one entity:
//! - `Body`: physics, senses
//! - `Megaman`: facing, weapons, charge, readiness
//! - `MegamanBehaviors`: the active motion mode
//!
//! `update_player` runs once per fixed step. It temporarily takes the body
//! and `Megaman` out of the world so behaviors can mutate both without
//! borrowing the world, then puts them back.

pub mod behaviors;
pub mod weapons;

use tracing::warn;
use crate::config::EngineConfig;
use crate::input::{ControllerButton, ControllerState};
use super::behavior::{BehaviorType, BehaviorsComponent};
use super::component::ComponentBucket;
use super::components::EntityKind;
use super::damage::{Combatant, DamageNegotiator, DamagerKind, Health, Team};
use super::entity::Entity;
use super::geometry::{Facing, Rect, Vec2};
use super::physics::{Body, BodySense, BodyType, Fixture, FixtureType};
use super::timer::Timer;
use super::world::World;

pub use behaviors::megaman_behaviors;
pub use weapons::{ChargeStatus, MegamanWeapon, ShotRequest, WeaponEntry, WeaponHandler};

// =============================================================================
// Tuning (world units and seconds)
// =============================================================================

pub const WIDTH: f32 = 0.75;
pub const HEIGHT: f32 = 1.25;

pub const RUN_SPEED: f32 = 5.0;
pub const JUMP_VEL: f32 = 14.0;
pub const WATER_JUMP_VEL: f32 = 9.0;
pub const SWIM_VEL: f32 = 7.0;
pub const WALL_SLIDE_SPEED: f32 = 2.5;
pub const WALL_JUMP_VEL: Vec2 = Vec2::new(5.0, 12.0);
pub const WALL_JUMP_IMPETUS_TIME: f32 = 0.15;
pub const AIR_DASH_SPEED: f32 = 9.0;
pub const AIR_DASH_DURATION: f32 = 0.25;
pub const GROUND_SLIDE_SPEED: f32 = 9.0;
pub const GROUND_SLIDE_DURATION: f32 = 0.35;
pub const CLIMB_SPEED: f32 = 4.0;
pub const JETPACK_Y_VEL: f32 = 4.0;
pub const JETPACK_AMMO_INTERVAL: f32 = 0.25;
pub const CART_SPEED: f32 = 7.0;
pub const KNOCKBACK_SPEED: f32 = 2.0;

pub const DAMAGE_DURATION: f32 = 0.75;
pub const RECOVERY_DURATION: f32 = 1.5;
pub const SHOOT_ANIM_TIME: f32 = 0.3;
pub const HALF_CHARGED_TIME: f32 = 0.5;
pub const FULLY_CHARGED_TIME: f32 = 1.25;

/// Behaviors that own horizontal velocity while active
const MOVEMENT_OVERRIDES: &[BehaviorType] = &[
    BehaviorType::AirDashing,
    BehaviorType::GroundSliding,
    BehaviorType::Climbing,
    BehaviorType::Crouching,
    BehaviorType::RidingCart,
];

// =============================================================================
// Components
// =============================================================================

/// Player-only state.
pub struct Megaman {
    pub facing: Facing,
    pub current_weapon: MegamanWeapon,
    pub weapons: WeaponHandler,
    /// False while teleporting in or during cutscenes
    pub ready: bool,
    pub dead: bool,
    /// Refilled on landing, spent by an air dash
    pub can_air_dash: bool,
    /// While running, input doesn't steer (just after a wall jump)
    pub wall_jump_impetus: Timer,
    pub(crate) charging: bool,
    pub(crate) charging_timer: Timer,
    pub(crate) shoot_anim_timer: Timer,
}

impl Megaman {
    pub fn new(max_weapon_ammo: i32) -> Self {
        let mut weapons = WeaponHandler::new(max_weapon_ammo);
        weapons.put_weapon(MegamanWeapon::MegaBuster);
        Self {
            facing: Facing::Right,
            current_weapon: MegamanWeapon::MegaBuster,
            weapons,
            ready: true,
            dead: false,
            can_air_dash: true,
            wall_jump_impetus: Timer::finished(WALL_JUMP_IMPETUS_TIME),
            charging: false,
            // Never finishes on its own; elapsed is the hold time
            charging_timer: Timer::new(FULLY_CHARGED_TIME),
            shoot_anim_timer: Timer::finished(SHOOT_ANIM_TIME),
        }
    }

    pub fn update_charge(&mut self, delta: f32) {
        if self.charging {
            self.charging_timer.update(delta);
        }
    }

    /// Back to a fresh life: weapons topped up, timers cleared.
    pub fn respawn(&mut self) {
        self.dead = false;
        self.ready = true;
        self.facing = Facing::Right;
        self.can_air_dash = true;
        self.wall_jump_impetus.set_to_end();
        self.weapons.set_all_to_max_ammo();
        self.reset_weapon_timers();
    }
}

pub type MegamanBehaviors = BehaviorsComponent<PlayerContext>;

/// What behaviors see. Owned so the behaviors component can be stored in the world.
pub struct PlayerContext {
    pub body: Body,
    pub megaman: Megaman,
    pub controller: ControllerState,
}

impl PlayerContext {
    pub fn pressed(&self, button: ControllerButton) -> bool {
        self.controller.is_pressed(button)
    }

    pub fn just_pressed(&self, button: ControllerButton) -> bool {
        self.controller.is_just_pressed(button)
    }

    pub fn senses(&self, sense: BodySense) -> bool {
        self.body.is_sensing(sense)
    }
}

/// A shot fired this step, with where and which way to spawn it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerShot {
    pub request: ShotRequest,
    pub origin: Vec2,
    pub facing: Facing,
}

// =============================================================================
// Prefab
// =============================================================================

pub fn megaman_body(position: Vec2) -> Body {
    let size = Vec2::new(WIDTH, HEIGHT);
    let mut body = Body::new(BodyType::Dynamic, Rect::centered(position, WIDTH, HEIGHT))
        .with_fixture(Fixture::new(FixtureType::Body, size))
        .with_fixture(Fixture::new(FixtureType::Damageable, size * 0.8))
        .with_fixture(Fixture::new(FixtureType::Feet, Vec2::new(0.6, 0.2)).at(Vec2::new(0.0, -HEIGHT / 2.0)))
        .with_fixture(Fixture::new(FixtureType::Head, Vec2::new(0.6, 0.2)).at(Vec2::new(0.0, HEIGHT / 2.0)))
        .with_fixture(Fixture::new(FixtureType::Side, Vec2::new(0.2, 0.8)).at(Vec2::new(-WIDTH / 2.0, 0.0)))
        .with_fixture(Fixture::new(FixtureType::Side, Vec2::new(0.2, 0.8)).at(Vec2::new(WIDTH / 2.0, 0.0)));
    body.friction = 0.0;
    body
}

pub fn megaman_combatant(config: &EngineConfig) -> Combatant {
    Combatant::new(
        Team::Player,
        Health::new(config.max_health, DAMAGE_DURATION, RECOVERY_DURATION),
        DamageNegotiator::new(2)
            .with(DamagerKind::EnemyBody, 3)
            .with(DamagerKind::EnemyBullet, 2),
    )
}

/// Everything a fresh Megaman entity carries.
pub fn megaman_bucket(config: &EngineConfig, position: Vec2) -> ComponentBucket {
    ComponentBucket::new()
        .with(EntityKind::Megaman)
        .with(megaman_body(position))
        .with(megaman_combatant(config))
        .with(Megaman::new(config.max_weapon_ammo))
        .with(megaman_behaviors())
}

// =============================================================================
// Per-step update
// =============================================================================

/// Run input, behaviors and weapons for the player. Returns the shots fired.
pub fn update_player(world: &mut World, player: Entity, controller: &ControllerState, delta: f32) -> Vec<PlayerShot> {
    let stunned = world
        .get::<Combatant>(player)
        .is_some_and(|c| c.health.is_damaged());

    if !(world.has::<Body>(player) && world.has::<Megaman>(player) && world.has::<MegamanBehaviors>(player)) {
        warn!(%player, "player is missing body, megaman or behaviors");
        return Vec::new();
    }
    let (Some(body), Some(megaman), Some(mut behaviors)) = (
        world.remove::<Body>(player),
        world.remove::<Megaman>(player),
        world.remove::<MegamanBehaviors>(player),
    ) else {
        return Vec::new();
    };

    let mut ctx = PlayerContext { body, megaman, controller: *controller };
    let mut shots = Vec::new();

    if ctx.megaman.dead || !ctx.megaman.ready {
        behaviors.reset(&mut ctx);
        ctx.body.velocity.x = 0.0;
    } else if stunned {
        behaviors.reset(&mut ctx);
        ctx.megaman.stop_charging();
        ctx.body.velocity.x = -ctx.megaman.facing.value() * KNOCKBACK_SPEED;
    } else {
        ctx.megaman.wall_jump_impetus.update(delta);
        if ctx.senses(BodySense::FeetOnGround) {
            ctx.megaman.can_air_dash = true;
        }

        let steering = ctx.megaman.wall_jump_impetus.is_finished();
        let input = ctx.controller.horizontal();
        if steering && input != 0.0 && !behaviors.is_any_active(&[BehaviorType::AirDashing, BehaviorType::GroundSliding]) {
            ctx.megaman.facing = if input < 0.0 { Facing::Left } else { Facing::Right };
        }

        behaviors.update(&mut ctx, delta);

        if steering && !behaviors.is_any_active(MOVEMENT_OVERRIDES) {
            ctx.body.velocity.x = input * RUN_SPEED;
        }

        shots = update_weapons(&mut ctx, delta);
    }

    let PlayerContext { body, megaman, .. } = ctx;
    world.add(player, body);
    world.add(player, megaman);
    world.add(player, behaviors);
    shots
}

fn update_weapons(ctx: &mut PlayerContext, delta: f32) -> Vec<PlayerShot> {
    let megaman = &mut ctx.megaman;
    megaman.weapons.update(megaman.current_weapon, delta);
    megaman.update_charge(delta);
    megaman.shoot_anim_timer.update(delta);

    if ctx.controller.is_just_pressed(ControllerButton::Select) {
        megaman.next_weapon();
    }

    let mut fired = Vec::new();
    if ctx.controller.is_just_pressed(ControllerButton::B) {
        fired.extend(megaman.shoot());
        megaman.start_charging();
    } else if ctx.controller.is_just_released(ControllerButton::B) {
        if megaman.charge_status() != ChargeStatus::NotCharged {
            fired.extend(megaman.shoot());
        }
        megaman.stop_charging();
    }

    let origin = ctx.body.center() + Vec2::new(megaman.facing.value() * (WIDTH / 2.0 + 0.25), 0.1);
    fired
        .into_iter()
        .map(|request| PlayerShot { request, origin, facing: megaman.facing })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::physics::Physics;

    fn setup() -> (World, Physics, Entity) {
        let config = EngineConfig::default();
        let mut world = World::new();
        let floor = world.spawn();
        world.add(floor, Body::static_area(Rect::new(-10.0, -1.0, 40.0, 1.0), FixtureType::Block));
        let player = world.spawn_with(megaman_bucket(&config, Vec2::new(0.0, HEIGHT / 2.0 + 0.01)));
        (world, Physics::new(config.physics), player)
    }

    fn step(world: &mut World, physics: &mut Physics, player: Entity, controller: &ControllerState) -> Vec<PlayerShot> {
        let shots = update_player(world, player, controller, 1.0 / 60.0);
        physics.step(world, 1.0 / 60.0);
        shots
    }

    fn settle(world: &mut World, physics: &mut Physics, player: Entity) {
        let idle = ControllerState::new();
        for _ in 0..10 {
            step(world, physics, player, &idle);
        }
    }

    #[test]
    fn test_runs_and_faces_input() {
        let (mut world, mut physics, player) = setup();
        settle(&mut world, &mut physics, player);
        let mut controller = ControllerState::new();
        controller.set_buttons(&[ControllerButton::Left]);
        let start = world.get::<Body>(player).unwrap().center().x;
        for _ in 0..30 {
            step(&mut world, &mut physics, player, &controller);
        }
        assert!(world.get::<Body>(player).unwrap().center().x < start - 1.0);
        assert_eq!(world.get::<Megaman>(player).unwrap().facing, Facing::Left);
    }

    #[test]
    fn test_jump_from_ground() {
        let (mut world, mut physics, player) = setup();
        settle(&mut world, &mut physics, player);
        assert!(world.get::<Body>(player).unwrap().is_sensing(BodySense::FeetOnGround));

        let mut controller = ControllerState::new();
        controller.set_buttons(&[ControllerButton::A]);
        step(&mut world, &mut physics, player, &controller);
        assert!(world.get::<MegamanBehaviors>(player).unwrap().is_active(BehaviorType::Jumping));
        assert!(world.get::<Body>(player).unwrap().velocity.y > 0.0);
    }

    #[test]
    fn test_shoot_on_press_and_charged_on_release() {
        let (mut world, mut physics, player) = setup();
        settle(&mut world, &mut physics, player);

        let mut controller = ControllerState::new();
        controller.set_buttons(&[ControllerButton::B]);
        let shots = step(&mut world, &mut physics, player, &controller);
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].request.projectile, EntityKind::Bullet);
        assert!(shots[0].origin.x > world.get::<Body>(player).unwrap().center().x);

        for _ in 0..90 {
            controller.set_buttons(&[ControllerButton::B]);
            step(&mut world, &mut physics, player, &controller);
        }
        controller.set_buttons(&[]);
        let shots = step(&mut world, &mut physics, player, &controller);
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].request.status, ChargeStatus::FullyCharged);
        assert_eq!(shots[0].request.projectile, EntityKind::ChargedShot);
    }

    #[test]
    fn test_stunned_player_is_knocked_back() {
        let (mut world, mut physics, player) = setup();
        settle(&mut world, &mut physics, player);
        world.get_mut::<Combatant>(player).unwrap().health.damage(3);

        let mut controller = ControllerState::new();
        controller.set_buttons(&[ControllerButton::Right, ControllerButton::B]);
        let shots = update_player(&mut world, player, &controller, 1.0 / 60.0);
        assert!(shots.is_empty());
        assert!(world.get::<Body>(player).unwrap().velocity.x < 0.0);
    }

    #[test]
    fn test_missing_components_is_noop() {
        let mut world = World::new();
        let player = world.spawn();
        world.add(player, megaman_body(Vec2::ZERO));
        let shots = update_player(&mut world, player, &ControllerState::new(), 0.1);
        assert!(shots.is_empty());
        assert!(world.has::<Body>(player));
    }
}
