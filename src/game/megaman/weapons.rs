//! Megaman's weapons
//!
//! `WeaponHandler` owns one entry per acquired weapon: cooldown, ammo,
//! per-charge costs and the projectiles currently in flight. Firing never
//! spawns anything itself; it hands back a `ShotRequest` and the level
//! runtime spawns the projectile from the pools.
//!
//! The second half of this file is the player-facing API on `Megaman`
//! (shoot, charge, switch weapon). Those methods are thin wrappers that
//! delegate to the handler and keep the timers consistent.

use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use tracing::{debug, info};
use crate::game::components::EntityKind;
use crate::game::entity::Entity;
use crate::game::timer::Timer;
use super::{Megaman, FULLY_CHARGED_TIME, HALF_CHARGED_TIME};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MegamanWeapon {
    MegaBuster,
    /// Shoots like the buster for free; its ammo fuels the jetpack
    RushJet,
    FireBall,
    IceCube,
    MoonScythe,
}

impl MegamanWeapon {
    pub const ALL: &'static [MegamanWeapon] = &[
        MegamanWeapon::MegaBuster,
        MegamanWeapon::RushJet,
        MegamanWeapon::FireBall,
        MegamanWeapon::IceCube,
        MegamanWeapon::MoonScythe,
    ];

    /// Ammo is unlimited
    pub fn is_infinite(&self) -> bool {
        matches!(self, MegamanWeapon::MegaBuster)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChargeStatus {
    NotCharged,
    HalfCharged,
    FullyCharged,
}

/// Per-weapon firing state.
#[derive(Debug, Clone)]
pub struct WeaponEntry {
    pub cooldown: Timer,
    pub ammo: i32,
    pub normal_cost: i32,
    pub half_charged_cost: i32,
    pub fully_charged_cost: i32,
    pub chargeable: bool,
    /// Limit on projectiles of this weapon alive at once
    pub max_spawned: Option<usize>,
    pub spawned: Vec<Entity>,
}

impl WeaponEntry {
    pub fn new(cooldown: f32, ammo: i32) -> Self {
        Self {
            cooldown: Timer::finished(cooldown),
            ammo,
            normal_cost: 0,
            half_charged_cost: 0,
            fully_charged_cost: 0,
            chargeable: true,
            max_spawned: None,
            spawned: Vec::new(),
        }
    }

    fn costs(mut self, normal: i32, half: i32, full: i32) -> Self {
        self.normal_cost = normal;
        self.half_charged_cost = half;
        self.fully_charged_cost = full;
        self
    }

    fn not_chargeable(mut self) -> Self {
        self.chargeable = false;
        self
    }

    fn max_spawned(mut self, max: usize) -> Self {
        self.max_spawned = Some(max);
        self
    }

    fn cost(&self, status: ChargeStatus) -> i32 {
        if !self.chargeable {
            return self.normal_cost;
        }
        match status {
            ChargeStatus::NotCharged => self.normal_cost,
            ChargeStatus::HalfCharged => self.half_charged_cost,
            ChargeStatus::FullyCharged => self.fully_charged_cost,
        }
    }
}

/// What the runtime should spawn for a successful shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotRequest {
    pub weapon: MegamanWeapon,
    /// Effective status; non-chargeable weapons always fire uncharged
    pub status: ChargeStatus,
    pub projectile: EntityKind,
}

pub struct WeaponHandler {
    weapons: BTreeMap<MegamanWeapon, WeaponEntry>,
    max_ammo: i32,
}

impl WeaponHandler {
    pub fn new(max_ammo: i32) -> Self {
        Self { weapons: BTreeMap::new(), max_ammo }
    }

    fn entry_for(&self, weapon: MegamanWeapon) -> WeaponEntry {
        let max = self.max_ammo;
        match weapon {
            MegamanWeapon::MegaBuster => WeaponEntry::new(0.1, max),
            MegamanWeapon::RushJet => WeaponEntry::new(0.1, max).not_chargeable(),
            MegamanWeapon::FireBall => WeaponEntry::new(0.5, max).costs(3, 5, 7).max_spawned(1),
            MegamanWeapon::IceCube => WeaponEntry::new(0.25, max).costs(2, 2, 2).not_chargeable(),
            MegamanWeapon::MoonScythe => WeaponEntry::new(0.5, max).costs(2, 4, 6),
        }
    }

    /// Give Megaman a weapon with full ammo. Returns false if he already had it.
    pub fn put_weapon(&mut self, weapon: MegamanWeapon) -> bool {
        if self.has_weapon(weapon) {
            return false;
        }
        let entry = self.entry_for(weapon);
        self.weapons.insert(weapon, entry);
        info!(?weapon, "weapon acquired");
        true
    }

    pub fn remove_weapon(&mut self, weapon: MegamanWeapon) -> bool {
        self.weapons.remove(&weapon).is_some()
    }

    pub fn has_weapon(&self, weapon: MegamanWeapon) -> bool {
        self.weapons.contains_key(&weapon)
    }

    pub fn weapons(&self) -> impl Iterator<Item = MegamanWeapon> + '_ {
        self.weapons.keys().copied()
    }

    pub fn entry(&self, weapon: MegamanWeapon) -> Option<&WeaponEntry> {
        self.weapons.get(&weapon)
    }

    pub fn is_chargeable(&self, weapon: MegamanWeapon) -> bool {
        self.weapons.get(&weapon).is_some_and(|e| e.chargeable)
    }

    /// Add (or with a negative delta, spend) ammo, clamped to 0..=max.
    pub fn translate_ammo(&mut self, weapon: MegamanWeapon, delta: i32) {
        let max = self.max_ammo;
        if let Some(entry) = self.weapons.get_mut(&weapon) {
            entry.ammo = (entry.ammo + delta).clamp(0, max);
        }
    }

    /// Hand out weapon energy: the current weapon first (unless it's the
    /// buster), then the other owned weapons in order. Returns the leftover.
    pub fn add_weapon_energy(&mut self, current: MegamanWeapon, amount: i32) -> i32 {
        let max = self.max_ammo;
        let order = std::iter::once(current)
            .chain(MegamanWeapon::ALL.iter().copied().filter(|&w| w != current))
            .filter(|w| !w.is_infinite());
        let mut remaining = amount.max(0);
        for weapon in order {
            if remaining == 0 {
                break;
            }
            let Some(entry) = self.weapons.get_mut(&weapon) else {
                continue;
            };
            let added = remaining.min(max - entry.ammo).max(0);
            entry.ammo += added;
            remaining -= added;
        }
        if remaining == amount.max(0) {
            debug!(amount, "no weapon can take energy");
        }
        remaining
    }

    pub fn set_to_max_ammo(&mut self, weapon: MegamanWeapon) {
        let max = self.max_ammo;
        if let Some(entry) = self.weapons.get_mut(&weapon) {
            entry.ammo = max;
        }
    }

    pub fn set_all_to_max_ammo(&mut self) {
        let max = self.max_ammo;
        for entry in self.weapons.values_mut() {
            entry.ammo = max;
        }
    }

    pub fn deplete_ammo(&mut self, weapon: MegamanWeapon) {
        if let Some(entry) = self.weapons.get_mut(&weapon) {
            entry.ammo = 0;
        }
    }

    /// Current ammo. Missing weapons have none; the buster never runs out.
    pub fn ammo(&self, weapon: MegamanWeapon) -> i32 {
        match self.weapons.get(&weapon) {
            None => 0,
            Some(_) if weapon.is_infinite() => i32::MAX,
            Some(entry) => entry.ammo,
        }
    }

    pub fn max_ammo(&self) -> i32 {
        self.max_ammo
    }

    pub fn is_depleted(&self, weapon: MegamanWeapon) -> bool {
        self.ammo(weapon) == 0
    }

    pub fn can_fire(&self, weapon: MegamanWeapon, status: ChargeStatus) -> bool {
        let Some(entry) = self.weapons.get(&weapon) else {
            return false;
        };
        if !entry.cooldown.is_finished() {
            return false;
        }
        if entry.max_spawned.is_some_and(|max| entry.spawned.len() >= max) {
            return false;
        }
        let cost = if weapon.is_infinite() { 0 } else { entry.cost(status) };
        cost <= self.ammo(weapon)
    }

    /// Fire `weapon`: restarts its cooldown and spends ammo.
    pub fn fire(&mut self, weapon: MegamanWeapon, status: ChargeStatus) -> Option<ShotRequest> {
        if !self.can_fire(weapon, status) {
            return None;
        }
        let status = if self.is_chargeable(weapon) { status } else { ChargeStatus::NotCharged };
        let entry = self.weapons.get_mut(&weapon)?;
        let cost = if weapon.is_infinite() { 0 } else { entry.cost(status) };
        entry.cooldown.reset();
        let max = self.max_ammo;
        entry.ammo = (entry.ammo - cost).clamp(0, max);

        let projectile = match (weapon, status) {
            (MegamanWeapon::MegaBuster | MegamanWeapon::RushJet, ChargeStatus::NotCharged) => EntityKind::Bullet,
            (MegamanWeapon::MegaBuster | MegamanWeapon::RushJet, _) => EntityKind::ChargedShot,
            (MegamanWeapon::FireBall, _) => EntityKind::Fireball,
            (MegamanWeapon::IceCube, _) => EntityKind::IceCube,
            (MegamanWeapon::MoonScythe, _) => EntityKind::MoonScythe,
        };
        debug!(?weapon, ?status, cost, "weapon fired");
        Some(ShotRequest { weapon, status, projectile })
    }

    /// Remember a projectile so `max_spawned` can be enforced.
    pub fn track_spawned(&mut self, weapon: MegamanWeapon, projectile: Entity) {
        if let Some(entry) = self.weapons.get_mut(&weapon) {
            entry.spawned.push(projectile);
        }
    }

    /// Forget projectiles that no longer exist.
    pub fn cull_dead(&mut self, is_alive: impl Fn(Entity) -> bool) {
        for entry in self.weapons.values_mut() {
            entry.spawned.retain(|&e| is_alive(e));
        }
    }

    /// Tick the cooldown of the weapon in hand.
    pub fn update(&mut self, current: MegamanWeapon, delta: f32) {
        if let Some(entry) = self.weapons.get_mut(&current) {
            entry.cooldown.update(delta);
        }
    }

    /// All cooldowns ready.
    pub fn reset(&mut self) {
        for entry in self.weapons.values_mut() {
            entry.cooldown.set_to_end();
        }
    }
}

// =============================================================================
// Megaman weapon API
// =============================================================================

impl Megaman {
    /// How charged the buster is, given how long B has been held.
    pub fn charge_status(&self) -> ChargeStatus {
        if !self.charging || !self.weapons.is_chargeable(self.current_weapon) {
            return ChargeStatus::NotCharged;
        }
        let held = self.charging_timer.elapsed();
        if held >= FULLY_CHARGED_TIME {
            ChargeStatus::FullyCharged
        } else if held >= HALF_CHARGED_TIME {
            ChargeStatus::HalfCharged
        } else {
            ChargeStatus::NotCharged
        }
    }

    pub fn start_charging(&mut self) {
        if !self.charging {
            self.charging = true;
            self.charging_timer.reset();
        }
    }

    pub fn stop_charging(&mut self) {
        self.charging = false;
        self.charging_timer.reset();
    }

    pub fn is_charging(&self) -> bool {
        self.charging
    }

    /// Fire the current weapon at the current charge level.
    pub fn shoot(&mut self) -> Option<ShotRequest> {
        if !self.ready || self.dead {
            return None;
        }
        let status = self.charge_status();
        let shot = self.weapons.fire(self.current_weapon, status)?;
        self.shoot_anim_timer.reset();
        Some(shot)
    }

    /// Cooldowns ready and charge dropped.
    pub fn reset_weapon_timers(&mut self) {
        self.weapons.reset();
        self.stop_charging();
        self.shoot_anim_timer.set_to_end();
    }

    /// Switch weapons. Returns false if Megaman doesn't have `weapon`.
    pub fn set_current_weapon(&mut self, weapon: MegamanWeapon) -> bool {
        if !self.weapons.has_weapon(weapon) {
            return false;
        }
        self.current_weapon = weapon;
        self.reset_weapon_timers();
        true
    }

    /// Cycle to the next acquired weapon (Select button).
    pub fn next_weapon(&mut self) -> MegamanWeapon {
        let owned: Vec<_> = self.weapons.weapons().collect();
        if let Some(pos) = owned.iter().position(|&w| w == self.current_weapon) {
            let next = owned[(pos + 1) % owned.len()];
            self.set_current_weapon(next);
        }
        self.current_weapon
    }

    pub fn is_shooting(&self) -> bool {
        !self.shoot_anim_timer.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn handler() -> WeaponHandler {
        let mut h = WeaponHandler::new(30);
        h.put_weapon(MegamanWeapon::MegaBuster);
        h.put_weapon(MegamanWeapon::FireBall);
        h.put_weapon(MegamanWeapon::IceCube);
        h
    }

    #[test]
    fn test_weapon_enum_unique() {
        let set: HashSet<_> = MegamanWeapon::ALL.iter().collect();
        assert_eq!(set.len(), MegamanWeapon::ALL.len());
    }

    #[test]
    fn test_cooldown_blocks_until_elapsed() {
        let mut h = handler();
        assert!(h.fire(MegamanWeapon::MegaBuster, ChargeStatus::NotCharged).is_some());
        assert!(h.fire(MegamanWeapon::MegaBuster, ChargeStatus::NotCharged).is_none());
        h.update(MegamanWeapon::MegaBuster, 0.05);
        assert!(!h.can_fire(MegamanWeapon::MegaBuster, ChargeStatus::NotCharged));
        h.update(MegamanWeapon::MegaBuster, 0.05);
        assert!(h.can_fire(MegamanWeapon::MegaBuster, ChargeStatus::NotCharged));
    }

    #[test]
    fn test_charged_costs_and_projectiles() {
        let mut h = handler();
        let shot = h.fire(MegamanWeapon::FireBall, ChargeStatus::FullyCharged).unwrap();
        assert_eq!(shot.projectile, EntityKind::Fireball);
        assert_eq!(h.ammo(MegamanWeapon::FireBall), 23);

        let buster = h.fire(MegamanWeapon::MegaBuster, ChargeStatus::HalfCharged).unwrap();
        assert_eq!(buster.projectile, EntityKind::ChargedShot);
        assert_eq!(h.ammo(MegamanWeapon::MegaBuster), i32::MAX);
    }

    #[test]
    fn test_non_chargeable_fires_uncharged() {
        let mut h = handler();
        let shot = h.fire(MegamanWeapon::IceCube, ChargeStatus::FullyCharged).unwrap();
        assert_eq!(shot.status, ChargeStatus::NotCharged);
        assert_eq!(h.ammo(MegamanWeapon::IceCube), 28);
    }

    #[test]
    fn test_ammo_bounds_and_depletion() {
        let mut h = handler();
        h.translate_ammo(MegamanWeapon::IceCube, 100);
        assert_eq!(h.ammo(MegamanWeapon::IceCube), 30);
        h.translate_ammo(MegamanWeapon::IceCube, -29);
        assert!(!h.can_fire(MegamanWeapon::IceCube, ChargeStatus::NotCharged));
        h.deplete_ammo(MegamanWeapon::IceCube);
        assert!(h.is_depleted(MegamanWeapon::IceCube));
        h.set_all_to_max_ammo();
        assert_eq!(h.ammo(MegamanWeapon::IceCube), 30);

        assert_eq!(h.ammo(MegamanWeapon::MoonScythe), 0);
        assert!(!h.can_fire(MegamanWeapon::MoonScythe, ChargeStatus::NotCharged));
    }

    #[test]
    fn test_weapon_energy_skips_buster_and_spills_over() {
        let mut h = handler();
        h.translate_ammo(MegamanWeapon::FireBall, -5);
        h.translate_ammo(MegamanWeapon::IceCube, -10);

        // Buster equipped: everything goes to the special weapons in order
        assert_eq!(h.add_weapon_energy(MegamanWeapon::MegaBuster, 8), 0);
        assert_eq!(h.ammo(MegamanWeapon::FireBall), 30);
        assert_eq!(h.ammo(MegamanWeapon::IceCube), 23);

        // The current weapon fills first
        h.translate_ammo(MegamanWeapon::FireBall, -2);
        assert_eq!(h.add_weapon_energy(MegamanWeapon::IceCube, 10), 1);
        assert_eq!(h.ammo(MegamanWeapon::IceCube), 30);
        assert_eq!(h.ammo(MegamanWeapon::FireBall), 30);

        // Nothing to fill
        assert_eq!(h.add_weapon_energy(MegamanWeapon::MegaBuster, 5), 5);
        let mut buster_only = WeaponHandler::new(30);
        buster_only.put_weapon(MegamanWeapon::MegaBuster);
        assert_eq!(buster_only.add_weapon_energy(MegamanWeapon::MegaBuster, 5), 5);
    }

    #[test]
    fn test_spawn_limit_and_cull() {
        let mut h = handler();
        h.fire(MegamanWeapon::FireBall, ChargeStatus::NotCharged).unwrap();
        let fireball = Entity::new(7, 0);
        h.track_spawned(MegamanWeapon::FireBall, fireball);
        h.reset();
        assert!(!h.can_fire(MegamanWeapon::FireBall, ChargeStatus::NotCharged));

        h.cull_dead(|_| false);
        assert!(h.can_fire(MegamanWeapon::FireBall, ChargeStatus::NotCharged));
    }

    #[test]
    fn test_megaman_charge_and_switch() {
        let mut mega = Megaman::new(30);
        mega.weapons.put_weapon(MegamanWeapon::IceCube);

        mega.start_charging();
        mega.update_charge(FULLY_CHARGED_TIME);
        assert_eq!(mega.charge_status(), ChargeStatus::FullyCharged);
        let shot = mega.shoot().unwrap();
        assert_eq!(shot.projectile, EntityKind::ChargedShot);

        // Switching weapons resets cooldowns and drops the charge
        assert!(mega.set_current_weapon(MegamanWeapon::IceCube));
        assert!(!mega.is_charging());
        assert!(mega.weapons.can_fire(MegamanWeapon::IceCube, ChargeStatus::NotCharged));
        mega.start_charging();
        mega.update_charge(FULLY_CHARGED_TIME);
        assert_eq!(mega.charge_status(), ChargeStatus::NotCharged);

        assert!(!mega.set_current_weapon(MegamanWeapon::MoonScythe));
        assert_eq!(mega.next_weapon(), MegamanWeapon::MegaBuster);
    }

    #[test]
    fn test_not_ready_cannot_shoot() {
        let mut mega = Megaman::new(30);
        mega.ready = false;
        assert!(mega.shoot().is_none());
    }
}
