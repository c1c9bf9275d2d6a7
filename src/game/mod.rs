//! Game Foundation Module
//!
//! A small entity-component engine and the platformer built on it.
//!
//! Key concepts:
//! - Entity: Generational index for safe entity references
//! - ComponentBucket: One slot per component type, per entity
//! - World: Entities, their buckets and the deferred despawn queue
//! - EventsManager: Closed event vocabulary delivered to listener inboxes
//! - EntityPools: Reusable buckets per entity kind
//!
//! Gameplay:
//! - `megaman`: the player, its behaviors and weapons
//! - `enemies`, `projectiles`, `items`: pooled actors
//! - `camera`: rooms and room transitions
//! - `level`: the fixed-step runtime tying it together
//! - `renderer`: debug shapes and HUD (the only module that draws)

pub mod entity;
pub mod component;
pub mod world;
pub mod event;
pub mod properties;
pub mod points;
pub mod timer;
pub mod geometry;
pub mod damage;
pub mod pool;
pub mod components;
pub mod spatial;
pub mod physics;
pub mod contact;
pub mod state_machine;
pub mod pathfinding;
pub mod behavior;
pub mod megaman;
pub mod projectiles;
pub mod enemies;
pub mod items;
pub mod camera;
pub mod state;
pub mod level;
pub mod renderer;

// Re-export main types
pub use entity::Entity;
pub use world::World;
pub use event::{Event, EventType, EventsManager};
pub use state::{default_save_path, GameState};
pub use level::{LevelRuntime, LevelStatus, RuntimeStats};
pub use renderer::draw_level;
