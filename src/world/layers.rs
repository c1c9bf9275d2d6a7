//! Map layer builders
//!
//! A map is a list of named layers. `MapLayerBuilders` maps each layer name
//! to the builder that turns its objects into entities. The registry is
//! filled once when a level is set up and never changes afterwards; a
//! layer with no builder is skipped with a warning.

use std::collections::HashMap;
use tracing::{debug, warn};
use crate::game::components::{
    Background, Block, EntityKind, GameRoom, Hazard, Ladder, PlayerSpawn, SpawnPoint, Trigger, TriggerAction, Water,
};
use crate::game::geometry::Vec2;
use crate::game::items::spawn_item;
use crate::game::physics::{Body, FixtureType};
use crate::game::pool::EntityPools;
use crate::game::world::World;
use super::map::{GameMap, MapError, MapLayer, MapObject};

/// Layer names understood by the standard builders
pub mod layer_names {
    pub const PLAYER: &str = "player";
    pub const GAME_ROOMS: &str = "game_rooms";
    pub const BLOCKS: &str = "blocks";
    pub const LADDERS: &str = "ladders";
    pub const WATER: &str = "water";
    pub const HAZARDS: &str = "hazards";
    pub const ENEMIES: &str = "enemies";
    pub const ITEMS: &str = "items";
    pub const BACKGROUNDS: &str = "backgrounds";
    pub const TRIGGERS: &str = "triggers";
}

/// What builders write into
pub struct BuildContext<'a> {
    pub world: &'a mut World,
    pub pools: &'a mut EntityPools,
}

pub trait MapLayerBuilder {
    fn build(&self, layer: &MapLayer, ctx: &mut BuildContext) -> Result<(), MapError>;
}

/// Which layers were built and which had no builder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub built: Vec<String>,
    pub skipped: Vec<String>,
}

/// Layer name → builder.
#[derive(Default)]
pub struct MapLayerBuilders {
    builders: HashMap<String, Box<dyn MapLayerBuilder>>,
}

impl MapLayerBuilders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, builder: impl MapLayerBuilder + 'static) -> Self {
        self.builders.insert(name.to_string(), Box::new(builder));
        self
    }

    /// Every built-in builder under its standard layer name.
    pub fn standard() -> Self {
        Self::new()
            .with(layer_names::PLAYER, PlayerBuilder)
            .with(layer_names::GAME_ROOMS, GameRoomsBuilder)
            .with(layer_names::BLOCKS, StaticAreaBuilder(FixtureType::Block))
            .with(layer_names::LADDERS, StaticAreaBuilder(FixtureType::Ladder))
            .with(layer_names::WATER, StaticAreaBuilder(FixtureType::Water))
            .with(layer_names::HAZARDS, StaticAreaBuilder(FixtureType::Death))
            .with(layer_names::ENEMIES, EnemiesBuilder)
            .with(layer_names::ITEMS, ItemsBuilder)
            .with(layer_names::BACKGROUNDS, BackgroundsBuilder)
            .with(layer_names::TRIGGERS, TriggersBuilder)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build every layer of `map` in file order. Stops at the first error.
    pub fn build_all(&self, map: &GameMap, ctx: &mut BuildContext) -> Result<BuildSummary, MapError> {
        let mut summary = BuildSummary::default();
        for layer in &map.layers {
            match self.builders.get(&layer.name) {
                Some(builder) => {
                    builder.build(layer, ctx)?;
                    debug!(layer = %layer.name, objects = layer.objects.len(), "layer built");
                    summary.built.push(layer.name.clone());
                }
                None => {
                    warn!(layer = %layer.name, map = %map.name, "no builder for layer, skipping");
                    summary.skipped.push(layer.name.clone());
                }
            }
        }
        Ok(summary)
    }
}

fn missing(layer: &MapLayer, object: &MapObject, property: &str) -> MapError {
    MapError::MissingProperty {
        layer: layer.name.clone(),
        object: object.name.clone(),
        property: property.to_string(),
    }
}

fn unknown(layer: &MapLayer, what: &'static str, name: &str) -> MapError {
    MapError::UnknownKind {
        layer: layer.name.clone(),
        what,
        name: name.to_string(),
    }
}

// =============================================================================
// Builders
// =============================================================================

/// Spawn locations. The object marked `primary` (or the first one) is where the level starts.
pub struct PlayerBuilder;

impl MapLayerBuilder for PlayerBuilder {
    fn build(&self, layer: &MapLayer, ctx: &mut BuildContext) -> Result<(), MapError> {
        let any_primary = layer.objects.iter().any(|o| o.properties.get_bool_or("primary", false));
        for (i, object) in layer.objects.iter().enumerate() {
            let primary = object.properties.get_bool_or("primary", !any_primary && i == 0);
            let entity = ctx.world.spawn();
            ctx.world.add(entity, PlayerSpawn { position: object.rect.center(), primary });
        }
        Ok(())
    }
}

pub struct GameRoomsBuilder;

impl MapLayerBuilder for GameRoomsBuilder {
    fn build(&self, layer: &MapLayer, ctx: &mut BuildContext) -> Result<(), MapError> {
        for object in &layer.objects {
            if object.name.is_empty() {
                return Err(missing(layer, object, "name"));
            }
            let entity = ctx.world.spawn();
            ctx.world.add(entity, GameRoom {
                name: object.name.clone(),
                bounds: object.rect,
                boss: object.properties.get_bool_or("boss", false),
            });
        }
        Ok(())
    }
}

/// Static sensor or solid covering each object's rectangle.
pub struct StaticAreaBuilder(pub FixtureType);

impl MapLayerBuilder for StaticAreaBuilder {
    fn build(&self, layer: &MapLayer, ctx: &mut BuildContext) -> Result<(), MapError> {
        for object in &layer.objects {
            let entity = ctx.world.spawn();
            ctx.world.add(entity, Body::static_area(object.rect, self.0));
            match self.0 {
                FixtureType::Block => {
                    ctx.world.add(entity, Block);
                    ctx.world.add(entity, EntityKind::Block);
                }
                FixtureType::Ladder => {
                    ctx.world.add(entity, Ladder);
                    ctx.world.add(entity, EntityKind::Ladder);
                }
                FixtureType::Water => {
                    ctx.world.add(entity, Water);
                    ctx.world.add(entity, EntityKind::Water);
                }
                _ => {
                    ctx.world.add(entity, Hazard);
                    ctx.world.add(entity, EntityKind::Spike);
                }
            }
        }
        Ok(())
    }
}

/// Enemy spawn points. Enemies themselves are spawned when their room is entered.
pub struct EnemiesBuilder;

impl MapLayerBuilder for EnemiesBuilder {
    fn build(&self, layer: &MapLayer, ctx: &mut BuildContext) -> Result<(), MapError> {
        for object in &layer.objects {
            let kind = EntityKind::enemy_from_name(&object.name).ok_or_else(|| unknown(layer, "enemy", &object.name))?;
            let mut spawn = SpawnPoint::new(kind, object.rect.center());
            spawn.room = object.properties.get_str("room").map(str::to_string);
            spawn.properties = object.properties.clone();
            let entity = ctx.world.spawn();
            ctx.world.add(entity, spawn);
        }
        Ok(())
    }
}

pub struct ItemsBuilder;

impl MapLayerBuilder for ItemsBuilder {
    fn build(&self, layer: &MapLayer, ctx: &mut BuildContext) -> Result<(), MapError> {
        for object in &layer.objects {
            let kind = EntityKind::item_from_name(&object.name).ok_or_else(|| unknown(layer, "item", &object.name))?;
            if spawn_item(ctx.world, ctx.pools, kind, object.rect.center(), false).is_none() {
                warn!(?kind, "item pool not registered, skipping");
            }
        }
        Ok(())
    }
}

/// Parallax backgrounds. Data only; the debug renderer outlines them.
pub struct BackgroundsBuilder;

impl MapLayerBuilder for BackgroundsBuilder {
    fn build(&self, layer: &MapLayer, ctx: &mut BuildContext) -> Result<(), MapError> {
        for object in &layer.objects {
            let props = &object.properties;
            let entity = ctx.world.spawn();
            ctx.world.add(entity, Background {
                name: object.name.clone(),
                bounds: object.rect,
                parallax: Vec2::new(props.get_float_or("parallax_x", 1.0), props.get_float_or("parallax_y", 1.0)),
            });
            ctx.world.add(entity, EntityKind::Background);
        }
        Ok(())
    }
}

/// Player-touch sensors: `action` is `next_room` (with `room`), `boss_room` or `end_level`.
pub struct TriggersBuilder;

impl MapLayerBuilder for TriggersBuilder {
    fn build(&self, layer: &MapLayer, ctx: &mut BuildContext) -> Result<(), MapError> {
        for object in &layer.objects {
            let props = &object.properties;
            let action = match props.get_str("action") {
                Some("next_room") => {
                    let room = props.get_str("room").ok_or_else(|| missing(layer, object, "room"))?;
                    TriggerAction::NextRoom(room.to_string())
                }
                Some("boss_room") => TriggerAction::BossRoom,
                Some("end_level") => TriggerAction::EndLevel,
                Some(other) => return Err(unknown(layer, "trigger action", other)),
                None => return Err(missing(layer, object, "action")),
            };
            let entity = ctx.world.spawn();
            ctx.world.add(entity, Body::static_area(object.rect, FixtureType::Trigger));
            ctx.world.add(entity, Trigger { action, once: props.get_bool_or("once", true), fired: false });
            ctx.world.add(entity, EntityKind::Trigger);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::components::Item;
    use crate::game::geometry::Rect;
    use crate::game::items::register_item_pools;
    use crate::game::properties::Properties;

    fn map(layers: Vec<MapLayer>) -> GameMap {
        GameMap { name: "test".into(), width: 32, height: 14, properties: Properties::new(), layers }
    }

    fn build(map: &GameMap) -> (World, Result<BuildSummary, MapError>) {
        let mut world = World::new();
        let mut pools = EntityPools::new();
        register_item_pools(&mut pools);
        let result = MapLayerBuilders::standard().build_all(map, &mut BuildContext { world: &mut world, pools: &mut pools });
        (world, result)
    }

    #[test]
    fn test_standard_registry_names() {
        let builders = MapLayerBuilders::standard();
        assert_eq!(builders.len(), 10);
        assert!(builders.contains("game_rooms"));
        assert!(!builders.contains("tiles"));
        assert_eq!(builders.names()[0], "backgrounds");
    }

    #[test]
    fn test_builds_layers_and_skips_unknown() {
        let map = map(vec![
            MapLayer::new("game_rooms").with_object(MapObject::new("start", Rect::new(0.0, 0.0, 32.0, 14.0)).with("boss", true)),
            MapLayer::new("blocks")
                .with_object(MapObject::new("", Rect::new(0.0, 0.0, 32.0, 1.0)))
                .with_object(MapObject::new("", Rect::new(0.0, 1.0, 1.0, 13.0))),
            MapLayer::new("parallax_clouds"),
            MapLayer::new("player")
                .with_object(MapObject::new("a", Rect::new(2.0, 1.0, 1.0, 2.0)))
                .with_object(MapObject::new("b", Rect::new(8.0, 1.0, 1.0, 2.0)).with("primary", true)),
            MapLayer::new("enemies").with_object(MapObject::new("met", Rect::new(10.0, 1.0, 1.0, 1.0)).with("room", "start")),
            MapLayer::new("items").with_object(MapObject::new("health_bulb", Rect::new(4.0, 1.0, 0.5, 0.5))),
        ]);
        let (world, result) = build(&map);
        let summary = result.unwrap();
        assert_eq!(summary.skipped, vec!["parallax_clouds".to_string()]);
        assert_eq!(summary.built.len(), 5);

        assert_eq!(world.entities_with::<Block>().len(), 2);
        let room = world.first_with::<GameRoom>().unwrap();
        assert!(world.get::<GameRoom>(room).unwrap().boss);

        let primaries: Vec<_> = world
            .entities_with::<PlayerSpawn>()
            .into_iter()
            .filter_map(|e| world.get::<PlayerSpawn>(e).copied())
            .filter(|s| s.primary)
            .collect();
        assert_eq!(primaries.len(), 1);
        assert_eq!(primaries[0].position, Vec2::new(8.5, 2.0));

        let spawn = world.first_with::<SpawnPoint>().unwrap();
        let spawn = world.get::<SpawnPoint>(spawn).unwrap();
        assert_eq!(spawn.kind, EntityKind::Met);
        assert_eq!(spawn.room.as_deref(), Some("start"));
        assert_eq!(world.entities_with::<Item>().len(), 1);
    }

    #[test]
    fn test_unknown_enemy_is_error() {
        let map = map(vec![MapLayer::new("enemies").with_object(MapObject::new("dragon", Rect::new(0.0, 0.0, 1.0, 1.0)))]);
        let (_, result) = build(&map);
        assert!(matches!(result, Err(MapError::UnknownKind { what: "enemy", .. })));
    }

    #[test]
    fn test_trigger_needs_action_and_room() {
        let no_action = map(vec![MapLayer::new("triggers").with_object(MapObject::new("t", Rect::new(0.0, 0.0, 1.0, 1.0)))]);
        assert!(matches!(build(&no_action).1, Err(MapError::MissingProperty { .. })));

        let no_room = map(vec![MapLayer::new("triggers")
            .with_object(MapObject::new("t", Rect::new(0.0, 0.0, 1.0, 1.0)).with("action", "next_room"))]);
        match build(&no_room).1 {
            Err(MapError::MissingProperty { property, .. }) => assert_eq!(property, "room"),
            other => panic!("unexpected {:?}", other),
        }

        let ok = map(vec![MapLayer::new("triggers")
            .with_object(MapObject::new("t", Rect::new(0.0, 0.0, 1.0, 1.0)).with("action", "boss_room"))]);
        let (world, result) = build(&ok);
        result.unwrap();
        let trigger = world.first_with::<Trigger>().unwrap();
        assert_eq!(world.get::<Trigger>(trigger).unwrap().action, TriggerAction::BossRoom);
    }

    #[test]
    fn test_hazards_are_death_areas() {
        let map = map(vec![MapLayer::new("hazards").with_object(MapObject::new("spikes", Rect::new(5.0, 0.0, 2.0, 0.5)))]);
        let (world, result) = build(&map);
        result.unwrap();
        let spikes = world.first_with::<Hazard>().unwrap();
        assert!(world.get::<Body>(spikes).unwrap().fixture(FixtureType::Death).is_some());
    }
}
