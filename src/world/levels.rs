//! Built-in levels
//!
//! Each level pairs a map embedded at compile time with the layer builders
//! that understand it. `--level` also accepts a path to a map file, which is
//! built with the standard registry.

use std::path::{Path, PathBuf};
use super::layers::MapLayerBuilders;
use super::map::{load_map, load_map_from_str, GameMap, MapError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelDefinition {
    IntroStage,
}

impl LevelDefinition {
    pub const ALL: [LevelDefinition; 1] = [LevelDefinition::IntroStage];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            LevelDefinition::IntroStage => "intro_stage",
        }
    }

    fn source(&self) -> &'static str {
        match self {
            LevelDefinition::IntroStage => include_str!("../../assets/levels/intro_stage.ron"),
        }
    }

    pub fn map(&self) -> Result<GameMap, MapError> {
        load_map_from_str(self.source())
    }

    /// Builders for this level's layers
    pub fn layer_builders(&self) -> MapLayerBuilders {
        match self {
            LevelDefinition::IntroStage => MapLayerBuilders::standard(),
        }
    }
}

/// A level picked on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelSource {
    Builtin(LevelDefinition),
    File(PathBuf),
}

impl LevelSource {
    /// A built-in level name, otherwise a map path.
    pub fn parse(arg: &str) -> Self {
        match LevelDefinition::from_name(arg) {
            Some(level) => LevelSource::Builtin(level),
            None => LevelSource::File(PathBuf::from(arg)),
        }
    }

    pub fn load(&self) -> Result<(GameMap, MapLayerBuilders), MapError> {
        match self {
            LevelSource::Builtin(level) => Ok((level.map()?, level.layer_builders())),
            LevelSource::File(path) => Ok((load_map(Path::new(path))?, MapLayerBuilders::standard())),
        }
    }
}

impl Default for LevelSource {
    fn default() -> Self {
        LevelSource::Builtin(LevelDefinition::IntroStage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::components::{GameRoom, PlayerSpawn, SpawnPoint};
    use crate::game::items::register_item_pools;
    use crate::game::pool::EntityPools;
    use crate::game::world::World;
    use crate::world::layers::BuildContext;

    #[test]
    fn test_names_round_trip() {
        for level in LevelDefinition::ALL {
            assert_eq!(LevelDefinition::from_name(level.name()), Some(level));
        }
        assert_eq!(LevelDefinition::from_name("wily_castle"), None);
    }

    #[test]
    fn test_builtin_levels_build() {
        for level in LevelDefinition::ALL {
            let map = level.map().unwrap();
            let mut world = World::new();
            let mut pools = EntityPools::new();
            register_item_pools(&mut pools);
            let summary = level
                .layer_builders()
                .build_all(&map, &mut BuildContext { world: &mut world, pools: &mut pools })
                .unwrap();
            assert!(summary.skipped.is_empty(), "{:?}", summary.skipped);
            assert!(world.entities_with::<GameRoom>().len() >= 2);
            assert!(!world.entities_with::<SpawnPoint>().is_empty());
            let primary = world
                .entities_with::<PlayerSpawn>()
                .into_iter()
                .filter(|&e| world.get::<PlayerSpawn>(e).is_some_and(|s| s.primary))
                .count();
            assert_eq!(primary, 1);
        }
    }

    #[test]
    fn test_level_source_parse() {
        assert_eq!(LevelSource::parse("intro_stage"), LevelSource::Builtin(LevelDefinition::IntroStage));
        assert_eq!(LevelSource::parse("maps/custom.ron"), LevelSource::File(PathBuf::from("maps/custom.ron")));
        assert!(matches!(LevelSource::parse("missing.ron").load(), Err(MapError::Io(_))));
    }
}
