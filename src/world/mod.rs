//! Levels on disk
//!
//! - `map`: the RON map format (layers of rectangles with properties)
//! - `layers`: the registry that turns each layer into entities
//! - `levels`: built-in levels and `--level` resolution

pub mod layers;
pub mod levels;
pub mod map;

pub use layers::{BuildContext, BuildSummary, MapLayerBuilder, MapLayerBuilders};
pub use levels::{LevelDefinition, LevelSource};
pub use map::{load_map, load_map_from_str, save_map, validate_map, GameMap, MapError, MapLayer, MapObject};
