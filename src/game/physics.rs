//! Physics
//!
//! Axis-aligned bodies stepped at a fixed rate:
//! - `Static` bodies never move (blocks, ladders, water, spikes)
//! - `Dynamic` bodies get gravity and are pushed out of solid blocks
//! - `Abstract` bodies move by velocity only (projectiles, flying enemies)
//!
//! Each body carries fixtures: smaller rectangles, offset from the body
//! center, that exist only to detect overlaps. Overlapping fixtures become
//! `Contact`s, and the block contacts are turned into body senses
//! (feet on ground, head bump, wall at the side...) the behaviors read.

use serde::{Serialize, Deserialize};
use std::collections::HashSet;
use super::entity::Entity;
use super::geometry::{Rect, Vec2};
use super::spatial::SpatialGrid;
use super::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    Static,
    Dynamic,
    Abstract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FixtureType {
    /// Solid terrain. Dynamic bodies are pushed out of these.
    Block,
    Body,
    Feet,
    Head,
    Side,
    Damager,
    Damageable,
    Projectile,
    Water,
    Ladder,
    Death,
    Cart,
    Item,
    Trigger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodySense {
    FeetOnGround,
    HeadTouchingBlock,
    SideTouchingBlockLeft,
    SideTouchingBlockRight,
    InWater,
    TouchingLadder,
    TouchingCart,
}

/// Sensor rectangle attached to a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fixture {
    pub kind: FixtureType,
    /// Offset of the fixture center from the body center
    pub offset: Vec2,
    pub size: Vec2,
    pub active: bool,
}

impl Fixture {
    pub fn new(kind: FixtureType, size: Vec2) -> Self {
        Self { kind, offset: Vec2::ZERO, size, active: true }
    }

    pub fn at(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    /// World-space rectangle of this fixture on `body`
    pub fn bounds(&self, body: &Rect) -> Rect {
        Rect::centered(body.center() + self.offset, self.size.x, self.size.y)
    }
}

/// Physical body component.
#[derive(Debug, Clone)]
pub struct Body {
    pub body_type: BodyType,
    pub bounds: Rect,
    pub velocity: Vec2,
    pub gravity: Vec2,
    pub gravity_on: bool,
    /// Multiplies gravity (water, jetpack)
    pub gravity_scalar: f32,
    /// Max absolute speed per axis
    pub terminal_velocity: Vec2,
    /// Horizontal damping per second
    pub friction: f32,
    /// Push out of blocks (off for ghosts and while climbing through floors)
    pub collides: bool,
    pub fixtures: Vec<Fixture>,
    senses: HashSet<BodySense>,
}

impl Body {
    pub fn new(body_type: BodyType, bounds: Rect) -> Self {
        Self {
            body_type,
            bounds,
            velocity: Vec2::ZERO,
            gravity: Vec2::ZERO,
            gravity_on: body_type == BodyType::Dynamic,
            gravity_scalar: 1.0,
            terminal_velocity: Vec2::new(f32::MAX, f32::MAX),
            friction: 0.0,
            collides: body_type == BodyType::Dynamic,
            fixtures: Vec::new(),
            senses: HashSet::new(),
        }
    }

    /// Static body covered by a single fixture of the given kind.
    pub fn static_area(bounds: Rect, kind: FixtureType) -> Self {
        Self::new(BodyType::Static, bounds).with_fixture(Fixture::new(kind, Vec2::new(bounds.w, bounds.h)))
    }

    pub fn with_fixture(mut self, fixture: Fixture) -> Self {
        self.fixtures.push(fixture);
        self
    }

    pub fn center(&self) -> Vec2 {
        self.bounds.center()
    }

    pub fn set_center(&mut self, center: Vec2) {
        self.bounds.set_center(center);
    }

    pub fn is_sensing(&self, sense: BodySense) -> bool {
        self.senses.contains(&sense)
    }

    pub fn set_sensing(&mut self, sense: BodySense, on: bool) {
        if on {
            self.senses.insert(sense);
        } else {
            self.senses.remove(&sense);
        }
    }

    pub fn clear_senses(&mut self) {
        self.senses.clear();
    }

    pub fn fixture(&self, kind: FixtureType) -> Option<&Fixture> {
        self.fixtures.iter().find(|f| f.kind == kind)
    }

    pub fn set_fixtures_active(&mut self, kind: FixtureType, active: bool) {
        for fixture in self.fixtures.iter_mut().filter(|f| f.kind == kind) {
            fixture.active = active;
        }
    }
}

/// Identifies one fixture of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixtureRef {
    pub entity: Entity,
    pub index: usize,
}

/// Two overlapping fixtures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub a: FixtureRef,
    pub a_kind: FixtureType,
    pub b: FixtureRef,
    pub b_kind: FixtureType,
}

impl Contact {
    /// If this contact joins fixtures of kinds `x` and `y` (either order),
    /// returns the refs ordered as (x, y).
    pub fn matching(&self, x: FixtureType, y: FixtureType) -> Option<(FixtureRef, FixtureRef)> {
        if self.a_kind == x && self.b_kind == y {
            Some((self.a, self.b))
        } else if self.a_kind == y && self.b_kind == x {
            Some((self.b, self.a))
        } else {
            None
        }
    }

    /// Order-independent key for contact tracking
    pub fn key(&self) -> (FixtureRef, FixtureRef) {
        if self.a <= self.b { (self.a, self.b) } else { (self.b, self.a) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: Vec2,
    pub terminal_velocity: Vec2,
    /// Gravity multiplier while in water
    pub water_gravity_scalar: f32,
    /// Broadphase cell size in world units
    pub cell_size: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -30.0),
            terminal_velocity: Vec2::new(20.0, 15.0),
            water_gravity_scalar: 0.4,
            cell_size: 2.0,
        }
    }
}

/// Steps every body in the world.
pub struct Physics {
    pub config: PhysicsConfig,
    solids: SpatialGrid<Entity>,
    fixtures: SpatialGrid<(FixtureRef, FixtureType)>,
}

impl Physics {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            solids: SpatialGrid::new(config.cell_size),
            fixtures: SpatialGrid::new(config.cell_size),
        }
    }

    /// Limit the broadphase to `area`; bodies outside share its edge cells.
    pub fn set_bounds(&mut self, area: Rect) {
        self.solids.set_bounds(area);
        self.fixtures.set_bounds(area);
    }

    /// Advance one fixed step. Returns every fixture contact after moving.
    pub fn step(&mut self, world: &mut World, dt: f32) -> Vec<Contact> {
        let bodies = world.entities_with::<Body>();

        self.solids.clear();
        for &entity in &bodies {
            if let Some(body) = world.get::<Body>(entity) {
                for fixture in body.fixtures.iter().filter(|f| f.active && f.kind == FixtureType::Block) {
                    self.solids.insert(entity, fixture.bounds(&body.bounds));
                }
            }
        }

        for &entity in &bodies {
            if let Some(body) = world.get_mut::<Body>(entity) {
                match body.body_type {
                    BodyType::Static => {}
                    BodyType::Abstract => {
                        integrate_velocity(body, &self.config, dt);
                        let delta = body.velocity * dt;
                        body.bounds.translate(delta);
                    }
                    BodyType::Dynamic => {
                        integrate_velocity(body, &self.config, dt);
                        move_and_collide(body, entity, &self.solids, dt);
                    }
                }
            }
        }

        let contacts = self.collect_contacts(world, &bodies);
        apply_senses(world, &bodies, &contacts);
        contacts
    }

    fn collect_contacts(&mut self, world: &World, bodies: &[Entity]) -> Vec<Contact> {
        self.fixtures.clear();
        for &entity in bodies {
            if let Some(body) = world.get::<Body>(entity) {
                for (index, fixture) in body.fixtures.iter().enumerate() {
                    if fixture.active {
                        self.fixtures.insert((FixtureRef { entity, index }, fixture.kind), fixture.bounds(&body.bounds));
                    }
                }
            }
        }

        self.fixtures
            .overlapping_pairs()
            .into_iter()
            .filter(|((a, _), (b, _))| a.entity != b.entity)
            .map(|((a, a_kind), (b, b_kind))| Contact { a, a_kind, b, b_kind })
            .collect()
    }
}

fn integrate_velocity(body: &mut Body, config: &PhysicsConfig, dt: f32) {
    if body.gravity_on {
        let mut gravity = if body.gravity == Vec2::ZERO { config.gravity } else { body.gravity };
        gravity = gravity * body.gravity_scalar;
        if body.is_sensing(BodySense::InWater) {
            gravity = gravity * config.water_gravity_scalar;
        }
        body.velocity += gravity * dt;
    }
    if body.friction > 0.0 {
        body.velocity.x *= (1.0 - body.friction * dt).max(0.0);
    }
    let terminal = Vec2::new(
        body.terminal_velocity.x.min(config.terminal_velocity.x),
        body.terminal_velocity.y.min(config.terminal_velocity.y),
    );
    body.velocity.x = body.velocity.x.clamp(-terminal.x, terminal.x);
    body.velocity.y = body.velocity.y.clamp(-terminal.y, terminal.y);
}

/// Move one axis at a time and push out of any solid hit along the way.
fn move_and_collide(body: &mut Body, entity: Entity, solids: &SpatialGrid<Entity>, dt: f32) {
    body.bounds.x += body.velocity.x * dt;
    if body.collides {
        for (owner, solid) in solids.query(&body.bounds) {
            if owner == entity {
                continue;
            }
            if body.velocity.x > 0.0 {
                body.bounds.x = solid.x - body.bounds.w;
            } else if body.velocity.x < 0.0 {
                body.bounds.x = solid.right();
            } else {
                continue;
            }
            body.velocity.x = 0.0;
        }
    }

    body.bounds.y += body.velocity.y * dt;
    if body.collides {
        for (owner, solid) in solids.query(&body.bounds) {
            if owner == entity {
                continue;
            }
            if body.velocity.y > 0.0 {
                body.bounds.y = solid.y - body.bounds.h;
            } else if body.velocity.y < 0.0 {
                body.bounds.y = solid.top();
            } else {
                continue;
            }
            body.velocity.y = 0.0;
        }
    }
}

fn apply_senses(world: &mut World, bodies: &[Entity], contacts: &[Contact]) {
    for &entity in bodies {
        if let Some(body) = world.get_mut::<Body>(entity) {
            if body.body_type != BodyType::Static {
                body.clear_senses();
            }
        }
    }

    let rules = [
        (FixtureType::Feet, FixtureType::Block),
        (FixtureType::Head, FixtureType::Block),
        (FixtureType::Side, FixtureType::Block),
        (FixtureType::Body, FixtureType::Water),
        (FixtureType::Body, FixtureType::Ladder),
        (FixtureType::Body, FixtureType::Cart),
    ];

    for contact in contacts {
        for (mine, other) in rules {
            let Some((fixture, _)) = contact.matching(mine, other) else {
                continue;
            };
            let Some(body) = world.get_mut::<Body>(fixture.entity) else {
                continue;
            };
            let sense = match (mine, other) {
                (FixtureType::Feet, _) => BodySense::FeetOnGround,
                (FixtureType::Head, _) => BodySense::HeadTouchingBlock,
                (FixtureType::Side, _) => {
                    let offset = body.fixtures.get(fixture.index).map(|f| f.offset.x).unwrap_or(0.0);
                    if offset < 0.0 {
                        BodySense::SideTouchingBlockLeft
                    } else {
                        BodySense::SideTouchingBlockRight
                    }
                }
                (_, FixtureType::Water) => BodySense::InWater,
                (_, FixtureType::Ladder) => BodySense::TouchingLadder,
                _ => BodySense::TouchingCart,
            };
            body.set_sensing(sense, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(world: &mut World, bounds: Rect) -> Entity {
        let body = Body::new(BodyType::Dynamic, bounds)
            .with_fixture(Fixture::new(FixtureType::Feet, Vec2::new(0.6, 0.2)).at(Vec2::new(0.0, -bounds.h / 2.0)))
            .with_fixture(Fixture::new(FixtureType::Side, Vec2::new(0.2, 0.8)).at(Vec2::new(-bounds.w / 2.0, 0.0)))
            .with_fixture(Fixture::new(FixtureType::Side, Vec2::new(0.2, 0.8)).at(Vec2::new(bounds.w / 2.0, 0.0)))
            .with_fixture(Fixture::new(FixtureType::Body, Vec2::new(bounds.w, bounds.h)));
        let e = world.spawn();
        world.add(e, body);
        e
    }

    fn block(world: &mut World, bounds: Rect) -> Entity {
        let e = world.spawn();
        world.add(e, Body::static_area(bounds, FixtureType::Block));
        e
    }

    #[test]
    fn test_falls_and_lands_on_block() {
        let mut world = World::new();
        let mut physics = Physics::new(PhysicsConfig::default());
        block(&mut world, Rect::new(-5.0, 0.0, 10.0, 1.0));
        let player = actor(&mut world, Rect::new(0.0, 3.0, 1.0, 1.5));

        for _ in 0..300 {
            physics.step(&mut world, 1.0 / 150.0);
        }

        let body = world.get::<Body>(player).unwrap();
        assert!((body.bounds.y - 1.0).abs() < 1e-4);
        assert_eq!(body.velocity.y, 0.0);
        assert!(body.is_sensing(BodySense::FeetOnGround));
    }

    #[test]
    fn test_wall_stops_horizontal_motion_and_sets_side_sense() {
        let mut world = World::new();
        let mut physics = Physics::new(PhysicsConfig::default());
        block(&mut world, Rect::new(-5.0, 0.0, 20.0, 1.0));
        block(&mut world, Rect::new(3.0, 1.0, 1.0, 5.0));
        let player = actor(&mut world, Rect::new(0.0, 1.0, 1.0, 1.5));

        for _ in 0..150 {
            world.get_mut::<Body>(player).unwrap().velocity.x = 5.0;
            physics.step(&mut world, 1.0 / 150.0);
        }

        let body = world.get::<Body>(player).unwrap();
        assert!((body.bounds.right() - 3.0).abs() < 1e-4);
        assert!(body.is_sensing(BodySense::SideTouchingBlockRight));
        assert!(!body.is_sensing(BodySense::SideTouchingBlockLeft));
    }

    #[test]
    fn test_water_sense_and_contacts() {
        let mut world = World::new();
        let mut physics = Physics::new(PhysicsConfig::default());
        let water = world.spawn();
        world.add(water, Body::static_area(Rect::new(-2.0, -2.0, 4.0, 4.0), FixtureType::Water));
        let player = actor(&mut world, Rect::new(0.0, 0.0, 1.0, 1.5));
        world.get_mut::<Body>(player).unwrap().gravity_on = false;

        let contacts = physics.step(&mut world, 1.0 / 150.0);
        assert!(world.get::<Body>(player).unwrap().is_sensing(BodySense::InWater));
        assert!(contacts.iter().any(|c| c.matching(FixtureType::Body, FixtureType::Water).is_some()));
    }

    #[test]
    fn test_abstract_body_passes_through_blocks() {
        let mut world = World::new();
        let mut physics = Physics::new(PhysicsConfig::default());
        block(&mut world, Rect::new(1.0, 0.0, 1.0, 1.0));
        let shot = world.spawn();
        let mut body = Body::new(BodyType::Abstract, Rect::new(0.0, 0.4, 0.2, 0.2));
        body.velocity = Vec2::new(10.0, 0.0);
        world.add(shot, body);

        for _ in 0..75 {
            physics.step(&mut world, 1.0 / 150.0);
        }
        assert!(world.get::<Body>(shot).unwrap().bounds.x > 4.0);
    }
}
