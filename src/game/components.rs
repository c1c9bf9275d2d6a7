//! Game Components
//!
//! Plain data attached to entities. Logic lives in the systems that read
//! them (physics, contacts, AI, runtime).

use serde::{Serialize, Deserialize};
use super::entity::Entity;
use super::geometry::{Rect, Vec2};
use super::properties::Properties;
use super::timer::Timer;

// =============================================================================
// Kinds
// =============================================================================

/// Every spawnable entity kind. Also the key of the entity pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Megaman,
    Met,
    Bat,
    Bullet,
    ChargedShot,
    Fireball,
    IceCube,
    MoonScythe,
    MetBullet,
    HealthBulb,
    WeaponEnergy,
    Block,
    Ladder,
    Water,
    Spike,
    Background,
    Trigger,
}

impl EntityKind {
    /// Look up an enemy kind by its map name
    pub fn enemy_from_name(name: &str) -> Option<EntityKind> {
        match name {
            "met" | "Met" => Some(EntityKind::Met),
            "bat" | "Bat" => Some(EntityKind::Bat),
            _ => None,
        }
    }

    pub fn item_from_name(name: &str) -> Option<EntityKind> {
        match name {
            "health_bulb" | "HealthBulb" => Some(EntityKind::HealthBulb),
            "weapon_energy" | "WeaponEnergy" => Some(EntityKind::WeaponEnergy),
            _ => None,
        }
    }
}

/// Tag added to every bucket handed out by `EntityPools`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pooled(pub EntityKind);

// =============================================================================
// Markers
// =============================================================================

/// Enemy marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Enemy {
    pub kind: EntityKind,
    /// Chance to drop an item before the player's health is factored in
    pub base_drop_chance: f32,
}

/// Killing every boss-tagged enemy ends the level
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Boss;

/// Fired by someone. Despawned on hitting a block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    pub owner: Entity,
    pub kind: EntityKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    /// Restores player health
    HealthBulb { amount: i32 },
    /// Restores ammo of the current weapon
    WeaponEnergy { amount: i32 },
}

/// Collectible pickup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Item {
    pub kind: ItemKind,
}

/// Solid terrain
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Block;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ladder;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Water;

/// Kills the player on touch (spikes, pits)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Hazard;

// =============================================================================
// Level structure
// =============================================================================

/// A camera room. The camera stays inside the room the player is in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRoom {
    pub name: String,
    pub bounds: Rect,
    #[serde(default)]
    pub boss: bool,
}

/// What happens when the player touches a trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TriggerAction {
    /// Request a transition into a named room
    NextRoom(String),
    /// Entering the boss room locks the gate and readies the boss
    BossRoom,
    EndLevel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub action: TriggerAction,
    /// Fire once, then stay silent
    pub once: bool,
    pub fired: bool,
}

/// Parallax background layer (data only, drawn by the debug renderer)
#[derive(Debug, Clone, PartialEq)]
pub struct Background {
    pub name: String,
    pub bounds: Rect,
    pub parallax: Vec2,
}

/// Spawns one enemy each time it scrolls into view, unless the last one is still alive
#[derive(Debug, Clone)]
pub struct SpawnPoint {
    pub kind: EntityKind,
    pub position: Vec2,
    pub room: Option<String>,
    pub properties: Properties,
    pub spawned: Option<Entity>,
    /// Inside the camera view last step
    pub in_view: bool,
}

impl SpawnPoint {
    pub fn new(kind: EntityKind, position: Vec2) -> Self {
        Self {
            kind,
            position,
            room: None,
            properties: Properties::new(),
            spawned: None,
            in_view: false,
        }
    }
}

/// Player (re)spawn location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSpawn {
    pub position: Vec2,
    /// Used for the initial spawn of the level
    pub primary: bool,
}

/// Despawn once this entity has spent `timer` seconds outside the camera
#[derive(Debug, Clone, Copy)]
pub struct CullOffscreen {
    pub timer: Timer,
}

impl CullOffscreen {
    pub fn new(seconds: f32) -> Self {
        Self { timer: Timer::new(seconds) }
    }
}

/// Despawn after a fixed lifetime
#[derive(Debug, Clone, Copy)]
pub struct Lifetime {
    pub timer: Timer,
}
