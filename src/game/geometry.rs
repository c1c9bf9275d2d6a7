//! 2D Geometry
//!
//! World-space math for the platformer. Units are "tiles" (1.0 = one tile);
//! the renderer multiplies by PPM. Y grows upward, matching the physics.

use serde::{Serialize, Deserialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// 2D vector in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(&self, other: Vec2) -> f32 {
        (*self - other).length()
    }

    /// Unit vector, or zero for a zero-length input.
    pub fn normalize(&self) -> Vec2 {
        let len = self.length();
        if len <= f32::EPSILON {
            Vec2::ZERO
        } else {
            Vec2::new(self.x / len, self.y / len)
        }
    }

    /// Linear interpolation, `t` clamped to 0..=1.
    pub fn lerp(&self, target: Vec2, t: f32) -> Vec2 {
        let t = t.clamp(0.0, 1.0);
        Vec2::new(
            self.x + (target.x - self.x) * t,
            self.y + (target.y - self.y) * t,
        )
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Cardinal direction. Used for room transitions and gravity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn is_vertical(&self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    pub fn is_horizontal(&self) -> bool {
        !self.is_vertical()
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Dominant direction from `start` to `target`. Ties go to the horizontal axis.
    pub fn from_start_to_target(start: Vec2, target: Vec2) -> Direction {
        let dx = target.x - start.x;
        let dy = target.y - start.y;
        if dx.abs() >= dy.abs() {
            if dx >= 0.0 { Direction::Right } else { Direction::Left }
        } else if dy >= 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

/// Which way a character faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    /// -1.0 for left, 1.0 for right
    pub fn value(&self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn flipped(&self) -> Facing {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }
}

/// Axis-aligned rectangle. `(x, y)` is the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle of the given size centered on `center`
    pub fn centered(center: Vec2, w: f32, h: f32) -> Self {
        Self::new(center.x - w * 0.5, center.y - h * 0.5, w, h)
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn top(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn set_center(&mut self, center: Vec2) {
        self.x = center.x - self.w * 0.5;
        self.y = center.y - self.h * 0.5;
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    /// Point containment (inclusive of the bottom/left edges)
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.top()
    }

    /// Strict overlap; touching edges do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.top()
            && self.top() > other.y
    }

    /// Intersection of two rectangles, if they overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.overlaps(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let top = self.top().min(other.top());
        Some(Rect::new(x, y, right - x, top - y))
    }

    /// Direction `self` must be pushed to leave `other` along the axis of least
    /// penetration. `None` when they don't overlap.
    pub fn overlap_push_direction(&self, other: &Rect) -> Option<Direction> {
        let overlap = self.intersection(other)?;
        let self_center = self.center();
        let other_center = other.center();
        if overlap.w < overlap.h {
            if self_center.x < other_center.x {
                Some(Direction::Left)
            } else {
                Some(Direction::Right)
            }
        } else if self_center.y < other_center.y {
            Some(Direction::Down)
        } else {
            Some(Direction::Up)
        }
    }

    /// Clamp `point` so it stays inside this rectangle.
    pub fn clamp_point(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            point.x.clamp(self.x, self.right().max(self.x)),
            point.y.clamp(self.y, self.top().max(self.y)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlaps_excludes_touching_edges() {
        let a = Rect::new(0.0, 0.0, 1.0, 1.0);
        let b = Rect::new(1.0, 0.0, 1.0, 1.0);
        let c = Rect::new(0.5, 0.5, 1.0, 1.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
    }

    #[test]
    fn test_intersection() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(1.0, 1.0, 2.0, 2.0);
        let i = a.intersection(&b).unwrap();
        assert_eq!(i, Rect::new(1.0, 1.0, 1.0, 1.0));
        assert!(a.intersection(&Rect::new(5.0, 5.0, 1.0, 1.0)).is_none());
    }

    #[test]
    fn test_push_direction_uses_shallow_axis() {
        let wall = Rect::new(0.0, 0.0, 1.0, 4.0);
        // Player slightly overlapping the wall's right side
        let player = Rect::new(0.9, 1.0, 1.0, 1.5);
        assert_eq!(player.overlap_push_direction(&wall), Some(Direction::Right));

        let floor = Rect::new(0.0, 0.0, 10.0, 1.0);
        let falling = Rect::new(3.0, 0.8, 1.0, 1.5);
        assert_eq!(falling.overlap_push_direction(&floor), Some(Direction::Up));
    }

    #[test]
    fn test_direction_from_start_to_target() {
        let origin = Vec2::ZERO;
        assert_eq!(Direction::from_start_to_target(origin, Vec2::new(5.0, 1.0)), Direction::Right);
        assert_eq!(Direction::from_start_to_target(origin, Vec2::new(-5.0, 1.0)), Direction::Left);
        assert_eq!(Direction::from_start_to_target(origin, Vec2::new(0.5, 3.0)), Direction::Up);
        assert_eq!(Direction::from_start_to_target(origin, Vec2::new(0.5, -3.0)), Direction::Down);
    }

    #[test]
    fn test_lerp_clamps() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 20.0);
        assert_eq!(a.lerp(b, 0.5), Vec2::new(5.0, 10.0));
        assert_eq!(a.lerp(b, 2.0), b);
    }
}
