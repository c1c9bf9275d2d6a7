//! Map loading and saving
//!
//! Maps are RON files: a list of named layers, each a list of rectangles
//! with free-form properties. What a layer *means* is decided by the layer
//! builder registered under its name (see `layers`).

use serde::{Serialize, Deserialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;
use crate::game::geometry::Rect;
use crate::game::properties::Properties;

/// Validation limits to keep a broken file from exhausting memory
pub mod limits {
    pub const MAX_LAYERS: usize = 64;
    pub const MAX_OBJECTS_PER_LAYER: usize = 4096;
    /// Largest map side in tiles
    pub const MAX_MAP_SIZE: u32 = 4096;
    pub const MAX_COORD: f32 = 1_000_000.0;
    /// How far past the map edges an object may reach, in tiles
    pub const OBJECT_MARGIN: f32 = 32.0;
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read map: {0}")]
    Io(#[from] std::io::Error),

    #[error("map parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("failed to serialize map: {0}")]
    Serialize(#[from] ron::Error),

    #[error("invalid map: {0}")]
    Validation(String),

    #[error("object {object:?} in layer {layer:?} is missing property {property:?}")]
    MissingProperty {
        layer: String,
        object: String,
        property: String,
    },

    #[error("unknown {what} {name:?} in layer {layer:?}")]
    UnknownKind {
        layer: String,
        what: &'static str,
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapObject {
    #[serde(default)]
    pub name: String,
    pub rect: Rect,
    #[serde(default)]
    pub properties: Properties,
}

impl MapObject {
    pub fn new(name: &str, rect: Rect) -> Self {
        Self { name: name.to_string(), rect, properties: Properties::new() }
    }

    pub fn with(mut self, key: &str, value: impl Into<crate::game::properties::PropValue>) -> Self {
        self.properties.put(key, value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapLayer {
    pub name: String,
    #[serde(default)]
    pub objects: Vec<MapObject>,
}

impl MapLayer {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), objects: Vec::new() }
    }

    pub fn with_object(mut self, object: MapObject) -> Self {
        self.objects.push(object);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMap {
    pub name: String,
    /// Size in tiles
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub properties: Properties,
    /// Built in order
    pub layers: Vec<MapLayer>,
}

impl GameMap {
    pub fn layer(&self, name: &str) -> Option<&MapLayer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f32, self.height as f32)
    }

    /// Map bounds plus the margin objects may reach into
    pub fn object_bounds(&self) -> Rect {
        let m = limits::OBJECT_MARGIN;
        Rect::new(-m, -m, self.width as f32 + 2.0 * m, self.height as f32 + 2.0 * m)
    }
}

fn is_valid_coord(f: f32) -> bool {
    f.is_finite() && f.abs() <= limits::MAX_COORD
}

/// Validate a map
pub fn validate_map(map: &GameMap) -> Result<(), MapError> {
    if map.width > limits::MAX_MAP_SIZE || map.height > limits::MAX_MAP_SIZE {
        return Err(MapError::Validation(format!(
            "map too large ({}x{} > {})", map.width, map.height, limits::MAX_MAP_SIZE
        )));
    }
    if map.layers.len() > limits::MAX_LAYERS {
        return Err(MapError::Validation(format!(
            "too many layers ({} > {})", map.layers.len(), limits::MAX_LAYERS
        )));
    }
    let allowed = map.object_bounds();
    for layer in &map.layers {
        if layer.objects.len() > limits::MAX_OBJECTS_PER_LAYER {
            return Err(MapError::Validation(format!(
                "layer {:?} has too many objects ({} > {})",
                layer.name, layer.objects.len(), limits::MAX_OBJECTS_PER_LAYER
            )));
        }
        for (i, object) in layer.objects.iter().enumerate() {
            let r = object.rect;
            if ![r.x, r.y, r.w, r.h].into_iter().all(is_valid_coord) || r.w < 0.0 || r.h < 0.0 {
                return Err(MapError::Validation(format!(
                    "layer {:?} object {} has invalid rect {:?}", layer.name, i, r
                )));
            }
            if r.x < allowed.x || r.y < allowed.y || r.right() > allowed.right() || r.top() > allowed.top() {
                return Err(MapError::Validation(format!(
                    "layer {:?} object {} at {:?} reaches outside the {}x{} map",
                    layer.name, i, r, map.width, map.height
                )));
            }
        }
    }
    Ok(())
}

/// Load a map from a RON string (embedded levels and tests)
pub fn load_map_from_str(s: &str) -> Result<GameMap, MapError> {
    let map: GameMap = match ron::from_str(s) {
        Ok(map) => map,
        Err(e) => {
            let line = s.lines().nth(e.position.line.saturating_sub(1)).unwrap_or("");
            warn!(line = e.position.line, col = e.position.col, context = line.trim(), "map parse error: {}", e.code);
            return Err(e.into());
        }
    };
    validate_map(&map)?;
    Ok(map)
}

/// Load a map from a RON file
pub fn load_map<P: AsRef<Path>>(path: P) -> Result<GameMap, MapError> {
    let contents = fs::read_to_string(path.as_ref())?;
    load_map_from_str(&contents)
}

/// Save a map as pretty RON
pub fn save_map<P: AsRef<Path>>(map: &GameMap, path: P) -> Result<(), MapError> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(5)
        .indentor("  ".to_string());
    let text = ron::ser::to_string_pretty(map, config)?;
    fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GameMap {
        GameMap {
            name: "sample".into(),
            width: 32,
            height: 14,
            properties: Properties::new(),
            layers: vec![
                MapLayer::new("blocks").with_object(MapObject::new("floor", Rect::new(0.0, 0.0, 32.0, 1.0))),
                MapLayer::new("enemies")
                    .with_object(MapObject::new("met", Rect::new(10.0, 1.0, 1.0, 1.0)).with("room", "start")),
            ],
        }
    }

    #[test]
    fn test_parse_minimal_map() {
        let map = load_map_from_str(
            r#"(
                name: "tiny",
                width: 16,
                height: 14,
                layers: [
                    (name: "blocks", objects: [(rect: (x: 0.0, y: 0.0, w: 16.0, h: 1.0))]),
                    (name: "decor"),
                ],
            )"#,
        )
        .unwrap();
        assert_eq!(map.layers.len(), 2);
        assert_eq!(map.layer("blocks").unwrap().objects[0].rect.w, 16.0);
        assert!(map.layer("decor").unwrap().objects.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.ron");
        let map = sample();
        save_map(&map, &path).unwrap();
        assert_eq!(load_map(&path).unwrap(), map);
    }

    #[test]
    fn test_rejects_bad_rect() {
        let mut map = sample();
        map.layers[0].objects[0].rect.w = f32::NAN;
        assert!(matches!(validate_map(&map), Err(MapError::Validation(_))));
    }

    #[test]
    fn test_rejects_object_far_outside_map() {
        let mut map = sample();
        map.layers[0].objects[0].rect = Rect::new(0.0, 0.0, 999_000.0, 1.0);
        assert!(matches!(validate_map(&map), Err(MapError::Validation(_))));

        map.layers[0].objects[0].rect = Rect::new(-1.0, 0.0, 34.0, 1.0);
        assert!(validate_map(&map).is_ok());
    }

    #[test]
    fn test_parse_error_kind() {
        assert!(matches!(load_map_from_str("(name: 3)"), Err(MapError::Parse(_))));
    }
}
