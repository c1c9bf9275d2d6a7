//! Damage
//!
//! Two sides of every hit:
//! - `Damager`: something that hurts (bullet, enemy body, spiked ball)
//! - `Damageable`: something that can be hurt (Megaman, a Met)
//!
//! `try_inflict_damage` runs the handshake. The damager may veto, the
//! damageable may refuse (invincible, shielded, same team), and only when
//! damage actually lands does the damager get told about it.

use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use super::points::Points;
use super::timer::Timer;

/// Team affiliation for damage filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Player,
    Enemy,
    Neutral, // Damages everyone (hazards)
}

/// What kind of thing is dealing damage. Damageables price hits by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamagerKind {
    Bullet,
    HalfChargedShot,
    FullyChargedShot,
    Fireball,
    IceCube,
    MoonScythe,
    EnemyBody,
    EnemyBullet,
}

pub trait Damager {
    fn damager_kind(&self) -> DamagerKind;

    fn team(&self) -> Team;

    /// Veto hook, checked before the damageable is consulted.
    fn can_damage(&self, _damageable: &dyn Damageable) -> bool {
        true
    }

    /// Called only when damage was actually applied.
    fn on_damage_inflicted_to(&mut self, _damageable: &dyn Damageable) {}
}

pub trait Damageable {
    fn invincible(&self) -> bool;

    fn can_be_damaged_by(&self, _damager: &dyn Damager) -> bool {
        !self.invincible()
    }

    /// Apply the hit. Returns false if the damage was refused after all.
    fn take_damage_from(&mut self, damager: &dyn Damager) -> bool;
}

/// Result of one damage handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// The damager refused to deal damage
    Vetoed,
    /// The damageable refused to take it
    Rejected,
    Applied,
}

pub fn try_inflict_damage(damager: &mut dyn Damager, damageable: &mut dyn Damageable) -> DamageOutcome {
    if !damager.can_damage(&*damageable) {
        return DamageOutcome::Vetoed;
    }
    if !damageable.can_be_damaged_by(&*damager) {
        return DamageOutcome::Rejected;
    }
    if !damageable.take_damage_from(&*damager) {
        return DamageOutcome::Rejected;
    }
    damager.on_damage_inflicted_to(&*damageable);
    DamageOutcome::Applied
}

/// Damage table: how much each damager kind hurts one particular damageable.
#[derive(Debug, Clone, Default)]
pub struct DamageNegotiator {
    table: HashMap<DamagerKind, i32>,
    default: i32,
}

impl DamageNegotiator {
    pub fn new(default: i32) -> Self {
        Self { table: HashMap::new(), default }
    }

    pub fn with(mut self, kind: DamagerKind, amount: i32) -> Self {
        self.table.insert(kind, amount);
        self
    }

    pub fn get(&self, kind: DamagerKind) -> i32 {
        self.table.get(&kind).copied().unwrap_or(self.default)
    }
}

/// Health points plus the two post-hit windows.
///
/// While `damage_timer` runs the entity is in hit-stun. While
/// `recovery_timer` runs (started when hit-stun ends) it blinks and can't be
/// hurt.
#[derive(Debug, Clone)]
pub struct Health {
    pub points: Points,
    damage_timer: Timer,
    recovery_timer: Timer,
}

impl Health {
    pub fn new(max: i32, damage_duration: f32, recovery_duration: f32) -> Self {
        Self {
            points: Points::full(0, max),
            damage_timer: Timer::finished(damage_duration),
            recovery_timer: Timer::finished(recovery_duration),
        }
    }

    pub fn current(&self) -> i32 {
        self.points.current()
    }

    pub fn is_dead(&self) -> bool {
        self.points.is_min()
    }

    pub fn is_damaged(&self) -> bool {
        !self.damage_timer.is_finished()
    }

    pub fn is_recovering(&self) -> bool {
        !self.recovery_timer.is_finished()
    }

    /// Subtract `amount` and start hit-stun. Returns the damage actually taken.
    pub fn damage(&mut self, amount: i32) -> i32 {
        let taken = -self.points.translate(-amount.max(0));
        self.damage_timer.reset();
        taken
    }

    pub fn heal(&mut self, amount: i32) -> i32 {
        self.points.translate(amount.max(0))
    }

    pub fn update(&mut self, delta: f32) {
        if self.is_damaged() {
            self.damage_timer.update(delta);
            if self.damage_timer.is_finished() {
                self.recovery_timer.reset();
            }
        } else {
            self.recovery_timer.update(delta);
        }
    }

    /// Full health, no timers running.
    pub fn reset(&mut self) {
        self.points.set_to_max();
        self.damage_timer.set_to_end();
        self.recovery_timer.set_to_end();
    }
}

/// General-purpose damageable: health, team, damage table and readiness.
/// Enemies and the player both carry one.
#[derive(Debug, Clone)]
pub struct Combatant {
    pub team: Team,
    pub health: Health,
    pub negotiator: DamageNegotiator,
    /// Cleared by AI while shielded
    pub can_be_damaged: bool,
    /// False while spawning or teleporting
    pub ready: bool,
}

impl Combatant {
    pub fn new(team: Team, health: Health, negotiator: DamageNegotiator) -> Self {
        Self {
            team,
            health,
            negotiator,
            can_be_damaged: true,
            ready: true,
        }
    }

    pub fn update(&mut self, delta: f32) {
        self.health.update(delta);
    }
}

impl Damageable for Combatant {
    fn invincible(&self) -> bool {
        self.health.is_damaged()
            || self.health.is_recovering()
            || !self.can_be_damaged
            || self.health.is_dead()
            || !self.ready
    }

    fn can_be_damaged_by(&self, damager: &dyn Damager) -> bool {
        if self.invincible() {
            return false;
        }
        damager.team() == Team::Neutral || damager.team() != self.team
    }

    fn take_damage_from(&mut self, damager: &dyn Damager) -> bool {
        let amount = self.negotiator.get(damager.damager_kind());
        if amount <= 0 {
            return false;
        }
        self.health.damage(amount);
        true
    }
}

/// Damager for projectiles and harmful bodies.
#[derive(Debug, Clone)]
pub struct ContactDamager {
    pub kind: DamagerKind,
    pub team: Team,
    /// Projectiles are spent after their first hit
    pub single_hit: bool,
    pub hits: u32,
}

impl ContactDamager {
    pub fn new(kind: DamagerKind, team: Team) -> Self {
        Self { kind, team, single_hit: false, hits: 0 }
    }

    pub fn single_hit(mut self) -> Self {
        self.single_hit = true;
        self
    }

    pub fn is_spent(&self) -> bool {
        self.single_hit && self.hits > 0
    }
}

impl Damager for ContactDamager {
    fn damager_kind(&self) -> DamagerKind {
        self.kind
    }

    fn team(&self) -> Team {
        self.team
    }

    fn can_damage(&self, _damageable: &dyn Damageable) -> bool {
        !self.is_spent()
    }

    fn on_damage_inflicted_to(&mut self, _damageable: &dyn Damageable) {
        self.hits += 1;
    }
}
