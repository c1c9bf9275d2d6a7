//! Debug renderer
//!
//! Draws the running level with macroquad shapes only: room outlines,
//! parallax background frames, one rectangle per fixture colored by kind,
//! and a HUD with health, ammo, lives and currency. World y points up,
//! screen y points down; `ScreenMapping` does the flip.

use macroquad::prelude::*;
use super::components::{Background, Enemy};
use super::damage::Combatant;
use super::geometry::{Rect as WorldRect, Vec2 as WorldVec2};
use super::level::{LevelRuntime, LevelStatus};
use super::megaman::Megaman;
use super::physics::{Body, FixtureType};

const BACKGROUND: Color = Color::new(0.04, 0.04, 0.05, 1.0);
const ROOM_OUTLINE: Color = Color::new(0.35, 0.35, 0.45, 1.0);
const BOSS_ROOM_OUTLINE: Color = Color::new(0.7, 0.25, 0.3, 1.0);

/// World → screen transform for the current camera view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenMapping {
    view: WorldRect,
    scale: f32,
    offset_x: f32,
    offset_y: f32,
}

impl ScreenMapping {
    /// Fit `view` into a `width` × `height` screen, letterboxed.
    pub fn new(view: WorldRect, width: f32, height: f32) -> Self {
        let scale = (width / view.w).min(height / view.h).max(0.0);
        Self {
            view,
            scale,
            offset_x: (width - view.w * scale) / 2.0,
            offset_y: (height - view.h * scale) / 2.0,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn point(&self, p: WorldVec2) -> (f32, f32) {
        (
            self.offset_x + (p.x - self.view.x) * self.scale,
            self.offset_y + (self.view.top() - p.y) * self.scale,
        )
    }

    /// Screen rectangle (top-left, size) of a world rectangle
    pub fn rect(&self, r: &WorldRect) -> (f32, f32, f32, f32) {
        let (x, y) = self.point(WorldVec2::new(r.x, r.top()));
        (x, y, r.w * self.scale, r.h * self.scale)
    }
}

fn fixture_color(kind: FixtureType) -> Option<Color> {
    let color = match kind {
        FixtureType::Block => Color::new(0.45, 0.45, 0.5, 1.0),
        FixtureType::Ladder => Color::new(0.75, 0.55, 0.25, 0.8),
        FixtureType::Water => Color::new(0.2, 0.4, 0.9, 0.35),
        FixtureType::Death => Color::new(0.9, 0.15, 0.15, 0.8),
        FixtureType::Trigger => Color::new(0.9, 0.9, 0.2, 0.25),
        FixtureType::Item => Color::new(0.3, 0.9, 0.4, 1.0),
        FixtureType::Projectile => Color::new(1.0, 0.85, 0.3, 1.0),
        FixtureType::Body => Color::new(0.6, 0.6, 0.6, 0.6),
        _ => return None,
    };
    Some(color)
}

/// Draw one frame of the level.
pub fn draw_level(runtime: &LevelRuntime) {
    clear_background(BACKGROUND);
    let mapping = ScreenMapping::new(runtime.camera.view(), screen_width(), screen_height());
    let world = &runtime.world;

    for entity in world.entities_with::<Background>() {
        if let Some(bg) = world.get::<Background>(entity) {
            // Parallax: shift the frame by the part of the camera motion it doesn't follow
            let camera = runtime.camera.position;
            let mut bounds = bg.bounds;
            bounds.x += camera.x * (1.0 - bg.parallax.x);
            bounds.y += camera.y * (1.0 - bg.parallax.y);
            let (x, y, w, h) = mapping.rect(&bounds);
            draw_rectangle_lines(x, y, w, h, 1.0, Color::new(0.2, 0.2, 0.3, 1.0));
        }
    }

    for room in runtime.camera.rooms() {
        let (x, y, w, h) = mapping.rect(&room.bounds);
        let color = if room.boss { BOSS_ROOM_OUTLINE } else { ROOM_OUTLINE };
        draw_rectangle_lines(x, y, w, h, 2.0, color);
    }

    for entity in world.entities_with::<Body>() {
        let Some(body) = world.get::<Body>(entity) else {
            continue;
        };
        let tint = if entity == runtime.player() {
            Some(player_color(runtime))
        } else if world.has::<Enemy>(entity) {
            Some(Color::new(0.85, 0.3, 0.85, 1.0))
        } else {
            None
        };

        for fixture in body.fixtures.iter().filter(|f| f.active) {
            let color = match (fixture.kind, tint) {
                (FixtureType::Body, Some(tint)) => tint,
                (kind, _) => match fixture_color(kind) {
                    Some(color) => color,
                    None => continue,
                },
            };
            let (x, y, w, h) = mapping.rect(&fixture.bounds(&body.bounds));
            match fixture.kind {
                FixtureType::Trigger | FixtureType::Water => draw_rectangle(x, y, w, h, color),
                FixtureType::Body if tint.is_some() => draw_rectangle(x, y, w, h, color),
                FixtureType::Block | FixtureType::Death | FixtureType::Item | FixtureType::Projectile => {
                    draw_rectangle(x, y, w, h, color)
                }
                _ => draw_rectangle_lines(x, y, w, h, 1.0, color),
            }
        }
    }

    draw_hud(runtime);
}

fn player_color(runtime: &LevelRuntime) -> Color {
    let world = &runtime.world;
    let player = runtime.player();
    let recovering = world
        .get::<Combatant>(player)
        .is_some_and(|c| c.health.is_damaged() || c.health.is_recovering());
    let charging = world.get::<Megaman>(player).is_some_and(|m| m.is_charging());
    if recovering && (get_time() * 20.0) as i64 % 2 == 0 {
        Color::new(1.0, 1.0, 1.0, 0.3)
    } else if charging {
        Color::new(0.4, 0.9, 1.0, 1.0)
    } else {
        Color::new(0.2, 0.5, 1.0, 1.0)
    }
}

fn draw_bar(x: f32, y: f32, ratio: f32, color: Color) {
    let (w, h) = (10.0, 84.0);
    draw_rectangle(x, y, w, h, Color::new(0.0, 0.0, 0.0, 0.7));
    let filled = h * ratio.clamp(0.0, 1.0);
    draw_rectangle(x, y + h - filled, w, filled, color);
    draw_rectangle_lines(x, y, w, h, 1.0, WHITE);
}

fn draw_hud(runtime: &LevelRuntime) {
    let world = &runtime.world;
    let player = runtime.player();

    if let Some(combatant) = world.get::<Combatant>(player) {
        draw_bar(16.0, 16.0, combatant.health.points.ratio(), Color::new(1.0, 0.85, 0.4, 1.0));
    }
    if let Some(megaman) = world.get::<Megaman>(player) {
        let weapon = megaman.current_weapon;
        if !weapon.is_infinite() {
            let ratio = megaman.weapons.ammo(weapon) as f32 / megaman.weapons.max_ammo().max(1) as f32;
            draw_bar(30.0, 16.0, ratio, Color::new(0.4, 0.9, 1.0, 1.0));
        }
        draw_text(&format!("{:?}", weapon), 16.0, 120.0, 18.0, WHITE);
    }
    draw_text(
        &format!("lives {}   bolts {}", runtime.state.lives(), runtime.state.currency()),
        16.0,
        140.0,
        18.0,
        Color::new(0.8, 0.8, 0.85, 1.0),
    );

    let banner = match runtime.status() {
        LevelStatus::Complete => Some("STAGE CLEAR"),
        LevelStatus::GameOver => Some("GAME OVER"),
        LevelStatus::Playing if runtime.is_paused() => Some("PAUSED"),
        LevelStatus::Playing => None,
    };
    if let Some(text) = banner {
        let size = 40.0;
        let dims = measure_text(text, None, size as u16, 1.0);
        draw_text(
            text,
            (screen_width() - dims.width) / 2.0,
            screen_height() / 2.0,
            size,
            WHITE,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_flips_y() {
        let mapping = ScreenMapping::new(WorldRect::new(0.0, 0.0, 16.0, 14.0), 512.0, 448.0);
        assert_eq!(mapping.scale(), 32.0);
        assert_eq!(mapping.point(WorldVec2::new(0.0, 14.0)), (0.0, 0.0));
        assert_eq!(mapping.point(WorldVec2::new(16.0, 0.0)), (512.0, 448.0));
        assert_eq!(mapping.rect(&WorldRect::new(1.0, 1.0, 2.0, 1.0)), (32.0, 384.0, 64.0, 32.0));
    }

    #[test]
    fn test_mapping_letterboxes() {
        let mapping = ScreenMapping::new(WorldRect::new(10.0, 0.0, 16.0, 14.0), 1024.0, 448.0);
        assert_eq!(mapping.scale(), 32.0);
        assert_eq!(mapping.point(WorldVec2::new(10.0, 14.0)), (256.0, 0.0));
    }
}
