//! Enemies
//!
//! Two representative enemies exercise the engine:
//! - Met: hides under its helmet (can't be hurt), pops up when the player
//!   is near and fires a three-way spread, then hides again.
//! - Bat: hangs until the player comes close, then flies at the player along an
//!   A* path around blocks, staying inside its room.
//!
//! Both are pooled. `spawn_enemy` overwrites everything a previous life
//! could have changed.

use rand::Rng;
use std::collections::HashSet;
use tracing::debug;
use super::component::ComponentBucket;
use super::components::{CullOffscreen, Enemy, EntityKind};
use super::damage::{Combatant, ContactDamager, DamageNegotiator, DamagerKind, Health, Team};
use super::entity::Entity;
use super::geometry::{Facing, Rect, Vec2};
use super::pathfinding::{Cell, Pathfinder};
use super::physics::{Body, BodyType, Fixture, FixtureType};
use super::pool::EntityPools;
use super::projectiles::spawn_projectile;
use super::state_machine::StateMachine;
use super::timer::Timer;
use super::world::World;

pub const BASE_DROP_CHANCE: f32 = 0.2;
/// Added to the drop chance, scaled by how much health the player is missing
pub const MISSING_HEALTH_DROP_BONUS: f32 = 0.3;

pub const MET_HEALTH: i32 = 3;
pub const MET_SIGHT: f32 = 8.0;
pub const MET_SHIELDED_TIME: f32 = 1.5;
pub const MET_POP_UP_TIME: f32 = 0.25;
pub const MET_SHOOTING_TIME: f32 = 0.5;

pub const BAT_HEALTH: i32 = 2;
pub const BAT_SIGHT: f32 = 6.0;
pub const BAT_SPEED: f32 = 3.0;
pub const BAT_REPATH_TIME: f32 = 0.5;

/// Seconds off camera before a live enemy is culled
pub const ENEMY_CULL_TIME: f32 = 1.0;

fn enemy_combatant(health: i32) -> Combatant {
    Combatant::new(
        Team::Enemy,
        Health::new(health, 0.1, 0.0),
        DamageNegotiator::new(1)
            .with(DamagerKind::HalfChargedShot, 2)
            .with(DamagerKind::FullyChargedShot, 4)
            .with(DamagerKind::Fireball, 4)
            .with(DamagerKind::IceCube, 2)
            .with(DamagerKind::MoonScythe, 3),
    )
}

// =============================================================================
// Met
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetState {
    Shielded,
    PoppingUp,
    Shooting,
}

/// What the Met's transitions look at
pub struct MetView {
    pub phase_finished: bool,
    pub player_in_range: bool,
}

pub struct MetAi {
    machine: StateMachine<MetState, MetView>,
    phase: Timer,
    pub facing: Facing,
}

impl MetAi {
    pub fn new() -> Self {
        let machine = StateMachine::<MetState, MetView>::new(MetState::Shielded)
            .transition(MetState::Shielded, MetState::PoppingUp, |v| v.phase_finished && v.player_in_range)
            .transition(MetState::PoppingUp, MetState::Shooting, |v| v.phase_finished)
            .transition(MetState::Shooting, MetState::Shielded, |v| v.phase_finished);
        Self {
            machine,
            phase: Timer::new(MET_SHIELDED_TIME),
            facing: Facing::Left,
        }
    }

    pub fn state(&self) -> MetState {
        self.machine.current()
    }

    pub fn reset(&mut self) {
        self.machine.reset();
        self.phase = Timer::new(MET_SHIELDED_TIME);
        self.facing = Facing::Left;
    }
}

impl Default for MetAi {
    fn default() -> Self {
        Self::new()
    }
}

fn phase_duration(state: MetState) -> f32 {
    match state {
        MetState::Shielded => MET_SHIELDED_TIME,
        MetState::PoppingUp => MET_POP_UP_TIME,
        MetState::Shooting => MET_SHOOTING_TIME,
    }
}

pub fn met_bucket() -> ComponentBucket {
    let size = Vec2::new(0.8, 0.7);
    let body = Body::new(BodyType::Dynamic, Rect::centered(Vec2::ZERO, size.x, size.y))
        .with_fixture(Fixture::new(FixtureType::Body, size))
        .with_fixture(Fixture::new(FixtureType::Feet, Vec2::new(0.6, 0.2)).at(Vec2::new(0.0, -size.y / 2.0)))
        .with_fixture(Fixture::new(FixtureType::Damager, size))
        .with_fixture(Fixture::new(FixtureType::Damageable, size));
    let mut combatant = enemy_combatant(MET_HEALTH);
    combatant.can_be_damaged = false;
    ComponentBucket::new()
        .with(EntityKind::Met)
        .with(body)
        .with(combatant)
        .with(ContactDamager::new(DamagerKind::EnemyBody, Team::Enemy))
        .with(Enemy { kind: EntityKind::Met, base_drop_chance: BASE_DROP_CHANCE })
        .with(MetAi::new())
        .with(CullOffscreen::new(ENEMY_CULL_TIME))
}

/// Step every Met. Shots are spawned straight from `pools`.
pub fn update_mets(world: &mut World, pools: &mut EntityPools, player: Option<Vec2>, delta: f32) {
    for entity in world.entities_with::<MetAi>() {
        let Some(center) = world.get::<Body>(entity).map(|b| b.center()) else {
            continue;
        };
        let Some(mut ai) = world.remove::<MetAi>(entity) else {
            continue;
        };

        ai.phase.update(delta);
        if let Some(target) = player {
            ai.facing = if target.x < center.x { Facing::Left } else { Facing::Right };
        }
        let view = MetView {
            phase_finished: ai.phase.is_finished(),
            player_in_range: player.is_some_and(|p| p.distance(center) <= MET_SIGHT),
        };
        let before = ai.machine.current();
        let after = ai.machine.next(&view);
        if after != before {
            ai.phase = Timer::new(phase_duration(after));
            debug!(%entity, ?after, "met state");
            if after == MetState::Shooting {
                let forward = ai.facing.value();
                for dy in [-0.5, 0.0, 0.5] {
                    spawn_projectile(world, pools, EntityKind::MetBullet, entity, center, Vec2::new(forward, dy));
                }
            }
        }
        if let Some(combatant) = world.get_mut::<Combatant>(entity) {
            combatant.can_be_damaged = after != MetState::Shielded;
        }
        world.add(entity, ai);
    }
}

// =============================================================================
// Bat
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatState {
    Hanging,
    Flying,
}

pub struct BatAi {
    pub state: BatState,
    /// Cells still to visit, next first
    pub path: Vec<Cell>,
    repath: Timer,
}

impl BatAi {
    pub fn new() -> Self {
        Self {
            state: BatState::Hanging,
            path: Vec::new(),
            repath: Timer::finished(BAT_REPATH_TIME),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for BatAi {
    fn default() -> Self {
        Self::new()
    }
}

pub fn bat_bucket() -> ComponentBucket {
    let size = Vec2::new(0.6, 0.6);
    let mut body = Body::new(BodyType::Abstract, Rect::centered(Vec2::ZERO, size.x, size.y))
        .with_fixture(Fixture::new(FixtureType::Body, size))
        .with_fixture(Fixture::new(FixtureType::Damager, size))
        .with_fixture(Fixture::new(FixtureType::Damageable, size));
    body.gravity_on = false;
    ComponentBucket::new()
        .with(EntityKind::Bat)
        .with(body)
        .with(enemy_combatant(BAT_HEALTH))
        .with(ContactDamager::new(DamagerKind::EnemyBody, Team::Enemy))
        .with(Enemy { kind: EntityKind::Bat, base_drop_chance: BASE_DROP_CHANCE })
        .with(BatAi::new())
        .with(CullOffscreen::new(ENEMY_CULL_TIME))
}

pub fn cell_of(point: Vec2) -> Cell {
    (point.x.floor() as i32, point.y.floor() as i32)
}

pub fn cell_center(cell: Cell) -> Vec2 {
    Vec2::new(cell.0 as f32 + 0.5, cell.1 as f32 + 0.5)
}

/// Grid cells inside `area` covered by any active block fixture.
pub fn blocked_cells(world: &World, area: Rect) -> HashSet<Cell> {
    let mut cells = HashSet::new();
    for entity in world.entities_with::<Body>() {
        let Some(body) = world.get::<Body>(entity) else {
            continue;
        };
        for fixture in body.fixtures.iter().filter(|f| f.active && f.kind == FixtureType::Block) {
            let Some(rect) = fixture.bounds(&body.bounds).intersection(&area) else {
                continue;
            };
            for x in rect.x.floor() as i32..rect.right().ceil() as i32 {
                for y in rect.y.floor() as i32..rect.top().ceil() as i32 {
                    cells.insert((x, y));
                }
            }
        }
    }
    cells
}

/// Without a room, the box around every bat and the player, padded.
fn search_area(world: &World, bats: &[Entity], player: Option<Vec2>) -> Rect {
    let points: Vec<Vec2> = bats
        .iter()
        .filter_map(|&e| world.get::<Body>(e).map(|b| b.center()))
        .chain(player)
        .collect();
    let Some(&first) = points.first() else {
        return Rect::new(0.0, 0.0, 0.0, 0.0);
    };
    let (mut lo, mut hi) = (first, first);
    for p in &points {
        lo = Vec2::new(lo.x.min(p.x), lo.y.min(p.y));
        hi = Vec2::new(hi.x.max(p.x), hi.y.max(p.y));
    }
    let pad = BAT_SIGHT * 2.0;
    Rect::new(lo.x - pad, lo.y - pad, hi.x - lo.x + 2.0 * pad, hi.y - lo.y + 2.0 * pad)
}

/// Step every Bat. `room` bounds the search so bats never leave it.
pub fn update_bats(world: &mut World, player: Option<Vec2>, room: Option<Rect>, max_iterations: usize, delta: f32) {
    let bats = world.entities_with::<BatAi>();
    if bats.is_empty() {
        return;
    }
    let area = room.unwrap_or_else(|| search_area(world, &bats, player));
    let blocked = blocked_cells(world, area);
    let walkable = |cell: Cell| {
        !blocked.contains(&cell) && room.map_or(true, |r| r.contains(cell_center(cell)))
    };

    for entity in bats {
        let Some(center) = world.get::<Body>(entity).map(|b| b.center()) else {
            continue;
        };
        let Some(mut ai) = world.remove::<BatAi>(entity) else {
            continue;
        };

        let mut velocity = Vec2::ZERO;
        match (ai.state, player) {
            (BatState::Hanging, Some(target)) if target.distance(center) <= BAT_SIGHT => {
                ai.state = BatState::Flying;
                debug!(%entity, "bat takes off");
            }
            (BatState::Flying, Some(target)) => {
                ai.repath.update(delta);
                if ai.repath.is_finished() || ai.path.is_empty() {
                    let result = Pathfinder::new(cell_of(center), cell_of(target), &walkable)
                        .max_iterations(max_iterations)
                        .find();
                    ai.path = result.path.map(|p| p.into_iter().skip(1).collect()).unwrap_or_default();
                    ai.repath.reset();
                }
                while let Some(&next) = ai.path.first() {
                    if cell_center(next).distance(center) > 0.1 {
                        break;
                    }
                    ai.path.remove(0);
                }
                let aim = ai.path.first().map(|&c| cell_center(c)).unwrap_or(target);
                velocity = (aim - center).normalize() * BAT_SPEED;
            }
            _ => {}
        }
        if let Some(body) = world.get_mut::<Body>(entity) {
            body.velocity = velocity;
        }
        world.add(entity, ai);
    }
}

// =============================================================================
// Spawning and drops
// =============================================================================

pub fn register_enemy_pools(pools: &mut EntityPools) {
    pools.register(EntityKind::Met, met_bucket);
    pools.register(EntityKind::Bat, bat_bucket);
}

/// Spawn an enemy from its pool at `position`, fully reset.
pub fn spawn_enemy(world: &mut World, pools: &mut EntityPools, kind: EntityKind, position: Vec2) -> Option<Entity> {
    let entity = pools.spawn(world, kind)?;
    if let Some(body) = world.get_mut::<Body>(entity) {
        body.set_center(position);
        body.velocity = Vec2::ZERO;
        body.clear_senses();
    }
    if let Some(combatant) = world.get_mut::<Combatant>(entity) {
        combatant.health.reset();
        combatant.ready = true;
        combatant.can_be_damaged = kind != EntityKind::Met;
    }
    if let Some(damager) = world.get_mut::<ContactDamager>(entity) {
        damager.hits = 0;
    }
    if let Some(ai) = world.get_mut::<MetAi>(entity) {
        ai.reset();
    }
    if let Some(ai) = world.get_mut::<BatAi>(entity) {
        ai.reset();
    }
    if let Some(cull) = world.get_mut::<CullOffscreen>(entity) {
        cull.timer.reset();
    }
    debug!(?kind, %entity, "enemy spawned");
    Some(entity)
}

/// Drop chance after factoring in the player's health ratio (0..=1).
pub fn drop_chance(base: f32, player_health_ratio: f32) -> f32 {
    let missing = 1.0 - player_health_ratio.clamp(0.0, 1.0);
    (base + missing * MISSING_HEALTH_DROP_BONUS).clamp(0.0, 1.0)
}

/// Roll for an item drop.
pub fn roll_drop(rng: &mut impl Rng, chance: f32) -> Option<EntityKind> {
    if rng.gen::<f32>() >= chance {
        return None;
    }
    Some(if rng.gen_bool(0.5) { EntityKind::HealthBulb } else { EntityKind::WeaponEnergy })
}
