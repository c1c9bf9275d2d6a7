//! Property Bags
//!
//! Loosely-typed key/value maps. Map objects carry them from the level file,
//! events carry them as payload, and spawn requests use them to configure a
//! pooled entity (position, trajectory, owner...).

use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use super::geometry::{Rect, Vec2};

/// A single property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropValue {
    Bool(bool),
    Int(i64),
    Float(f32),
    Str(String),
    Vec2(Vec2),
    Rect(Rect),
}

impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        PropValue::Bool(v)
    }
}

impl From<i64> for PropValue {
    fn from(v: i64) -> Self {
        PropValue::Int(v)
    }
}

impl From<i32> for PropValue {
    fn from(v: i32) -> Self {
        PropValue::Int(v as i64)
    }
}

impl From<f32> for PropValue {
    fn from(v: f32) -> Self {
        PropValue::Float(v)
    }
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        PropValue::Str(v.to_string())
    }
}

impl From<String> for PropValue {
    fn from(v: String) -> Self {
        PropValue::Str(v)
    }
}

impl From<Vec2> for PropValue {
    fn from(v: Vec2) -> Self {
        PropValue::Vec2(v)
    }
}

impl From<Rect> for PropValue {
    fn from(v: Rect) -> Self {
        PropValue::Rect(v)
    }
}

/// Ordered string-keyed property map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties {
    values: BTreeMap<String, PropValue>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<PropValue>) -> Self {
        self.put(key, value);
        self
    }

    pub fn put(&mut self, key: &str, value: impl Into<PropValue>) -> Option<PropValue> {
        self.values.insert(key.to_string(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<PropValue> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy every entry of `other` over this map.
    pub fn merge(&mut self, other: &Properties) {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), v.clone());
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            PropValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer value. Floats are truncated.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            PropValue::Int(i) => Some(*i),
            PropValue::Float(f) => Some(*f as i64),
            _ => None,
        }
    }

    /// Float value. Integers are widened.
    pub fn get_float(&self, key: &str) -> Option<f32> {
        match self.get(key)? {
            PropValue::Float(f) => Some(*f),
            PropValue::Int(i) => Some(*i as f32),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            PropValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_vec2(&self, key: &str) -> Option<Vec2> {
        match self.get(key)? {
            PropValue::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_rect(&self, key: &str) -> Option<Rect> {
        match self.get(key)? {
            PropValue::Rect(r) => Some(*r),
            _ => None,
        }
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    pub fn get_int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }

    pub fn get_float_or(&self, key: &str, default: f32) -> f32 {
        self.get_float(key).unwrap_or(default)
    }

    pub fn get_str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_str(key).unwrap_or(default)
    }

    pub fn get_vec2_or(&self, key: &str, default: Vec2) -> Vec2 {
        self.get_vec2(key).unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let props = Properties::new()
            .with("boss", true)
            .with("count", 3)
            .with("speed", 2.5_f32)
            .with("kind", "met")
            .with("trajectory", Vec2::new(1.0, 0.0));

        assert_eq!(props.get_bool("boss"), Some(true));
        assert_eq!(props.get_int("count"), Some(3));
        assert_eq!(props.get_float("count"), Some(3.0));
        assert_eq!(props.get_float("speed"), Some(2.5));
        assert_eq!(props.get_str("kind"), Some("met"));
        assert_eq!(props.get_vec2("trajectory"), Some(Vec2::new(1.0, 0.0)));

        // Wrong type reads as missing
        assert_eq!(props.get_str("count"), None);
        assert_eq!(props.get_int_or("missing", 7), 7);
    }

    #[test]
    fn test_merge_overwrites() {
        let mut a = Properties::new().with("x", 1).with("y", 2);
        let b = Properties::new().with("y", 5);
        a.merge(&b);
        assert_eq!(a.get_int("y"), Some(5));
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_ron_round_trip() {
        let props = Properties::new().with("room", "boss").with("area", Rect::new(0.0, 0.0, 2.0, 2.0));
        let text = ron::to_string(&props).unwrap();
        let back: Properties = ron::from_str(&text).unwrap();
        assert_eq!(back, props);
    }
}
