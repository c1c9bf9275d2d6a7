//! Megaman's motion modes
//!
//! Listed in priority order in `megaman_behaviors`. Each behavior tracks
//! whether it is the active one so `evaluate` can apply a looser "keep
//! going" test than the "may start" test.

use crate::game::behavior::{Behavior, BehaviorType};
use crate::game::geometry::Facing;
use crate::game::physics::BodySense;
use crate::game::timer::Timer;
use crate::input::ControllerButton;
use super::*;

pub fn megaman_behaviors() -> MegamanBehaviors {
    MegamanBehaviors::new()
        .with(RidingCart::default())
        .with(Climbing::default())
        .with(Jetpacking::default())
        .with(WallSliding::default())
        .with(Swimming::default())
        .with(Jumping::default())
        .with(AirDashing::default())
        .with(GroundSliding::default())
        .with(Crouching::default())
}

// =============================================================================
// Jumping
// =============================================================================

/// Held A keeps rising; letting go early cuts the jump.
#[derive(Default)]
pub struct Jumping {
    active: bool,
}

impl Behavior<PlayerContext> for Jumping {
    fn kind(&self) -> BehaviorType {
        BehaviorType::Jumping
    }

    fn evaluate(&mut self, ctx: &mut PlayerContext, _delta: f32) -> bool {
        if self.active {
            ctx.pressed(ControllerButton::A)
                && ctx.body.velocity.y > 0.0
                && !ctx.senses(BodySense::HeadTouchingBlock)
        } else {
            ctx.senses(BodySense::FeetOnGround)
                && ctx.just_pressed(ControllerButton::A)
                && !ctx.pressed(ControllerButton::Down)
        }
    }

    fn init(&mut self, ctx: &mut PlayerContext) {
        self.active = true;
        ctx.body.velocity.y = if ctx.senses(BodySense::InWater) { WATER_JUMP_VEL } else { JUMP_VEL };
    }

    fn act(&mut self, _ctx: &mut PlayerContext, _delta: f32) {}

    fn end(&mut self, ctx: &mut PlayerContext) {
        self.active = false;
        if ctx.body.velocity.y > 0.0 {
            ctx.body.velocity.y = 0.0;
        }
    }
}

// =============================================================================
// Air dash
// =============================================================================

/// Horizontal burst in the air, once per airtime.
#[derive(Default)]
pub struct AirDashing {
    active: bool,
    timer: Timer,
}

impl AirDashing {
    fn blocked(ctx: &PlayerContext) -> bool {
        match ctx.megaman.facing {
            Facing::Left => ctx.senses(BodySense::SideTouchingBlockLeft),
            Facing::Right => ctx.senses(BodySense::SideTouchingBlockRight),
        }
    }
}

impl Behavior<PlayerContext> for AirDashing {
    fn kind(&self) -> BehaviorType {
        BehaviorType::AirDashing
    }

    fn evaluate(&mut self, ctx: &mut PlayerContext, _delta: f32) -> bool {
        if ctx.senses(BodySense::FeetOnGround) || Self::blocked(ctx) {
            return false;
        }
        if self.active {
            !self.timer.is_finished() && ctx.pressed(ControllerButton::A)
        } else {
            ctx.megaman.can_air_dash
                && ctx.megaman.wall_jump_impetus.is_finished()
                && ctx.just_pressed(ControllerButton::A)
                && !ctx.senses(BodySense::InWater)
        }
    }

    fn init(&mut self, ctx: &mut PlayerContext) {
        self.active = true;
        self.timer = Timer::new(AIR_DASH_DURATION);
        ctx.megaman.can_air_dash = false;
        ctx.body.gravity_on = false;
        ctx.body.velocity.y = 0.0;
    }

    fn act(&mut self, ctx: &mut PlayerContext, delta: f32) {
        self.timer.update(delta);
        ctx.body.velocity.x = ctx.megaman.facing.value() * AIR_DASH_SPEED;
        ctx.body.velocity.y = 0.0;
    }

    fn end(&mut self, ctx: &mut PlayerContext) {
        self.active = false;
        ctx.body.gravity_on = true;
    }
}

// =============================================================================
// Ground slide
// =============================================================================

/// Down + A on the ground. Keeps sliding while something is overhead.
#[derive(Default)]
pub struct GroundSliding {
    active: bool,
    timer: Timer,
}

impl Behavior<PlayerContext> for GroundSliding {
    fn kind(&self) -> BehaviorType {
        BehaviorType::GroundSliding
    }

    fn evaluate(&mut self, ctx: &mut PlayerContext, _delta: f32) -> bool {
        if !ctx.senses(BodySense::FeetOnGround) {
            return false;
        }
        if self.active {
            let blocked = match ctx.megaman.facing {
                Facing::Left => ctx.senses(BodySense::SideTouchingBlockLeft),
                Facing::Right => ctx.senses(BodySense::SideTouchingBlockRight),
            };
            !blocked && (!self.timer.is_finished() || ctx.senses(BodySense::HeadTouchingBlock))
        } else {
            ctx.pressed(ControllerButton::Down) && ctx.just_pressed(ControllerButton::A)
        }
    }

    fn init(&mut self, _ctx: &mut PlayerContext) {
        self.active = true;
        self.timer = Timer::new(GROUND_SLIDE_DURATION);
    }

    fn act(&mut self, ctx: &mut PlayerContext, delta: f32) {
        self.timer.update(delta);
        ctx.body.velocity.x = ctx.megaman.facing.value() * GROUND_SLIDE_SPEED;
    }

    fn end(&mut self, _ctx: &mut PlayerContext) {
        self.active = false;
    }
}

// =============================================================================
// Wall slide
// =============================================================================

/// Pressing into a wall while falling slows the fall. A jumps off the wall.
#[derive(Default)]
pub struct WallSliding {
    active: bool,
}

impl WallSliding {
    fn against_wall(ctx: &PlayerContext) -> bool {
        (ctx.senses(BodySense::SideTouchingBlockLeft) && ctx.pressed(ControllerButton::Left))
            || (ctx.senses(BodySense::SideTouchingBlockRight) && ctx.pressed(ControllerButton::Right))
    }
}

impl Behavior<PlayerContext> for WallSliding {
    fn kind(&self) -> BehaviorType {
        BehaviorType::WallSliding
    }

    fn evaluate(&mut self, ctx: &mut PlayerContext, _delta: f32) -> bool {
        if ctx.senses(BodySense::FeetOnGround) || ctx.just_pressed(ControllerButton::A) || !Self::against_wall(ctx) {
            return false;
        }
        self.active || ctx.body.velocity.y <= 0.0
    }

    fn init(&mut self, ctx: &mut PlayerContext) {
        self.active = true;
        ctx.megaman.can_air_dash = true;
    }

    fn act(&mut self, ctx: &mut PlayerContext, _delta: f32) {
        ctx.body.velocity.y = ctx.body.velocity.y.max(-WALL_SLIDE_SPEED);
    }

    fn end(&mut self, ctx: &mut PlayerContext) {
        self.active = false;
        if ctx.just_pressed(ControllerButton::A) && !ctx.senses(BodySense::FeetOnGround) {
            let away = if ctx.senses(BodySense::SideTouchingBlockLeft) { Facing::Right } else { Facing::Left };
            ctx.megaman.facing = away;
            ctx.body.velocity.x = away.value() * WALL_JUMP_VEL.x;
            ctx.body.velocity.y = WALL_JUMP_VEL.y;
            ctx.megaman.wall_jump_impetus.reset();
        }
    }
}

// =============================================================================
// Swim
// =============================================================================

/// A in water (off the floor) strokes upward.
#[derive(Default)]
pub struct Swimming {
    active: bool,
}

impl Behavior<PlayerContext> for Swimming {
    fn kind(&self) -> BehaviorType {
        BehaviorType::Swimming
    }

    fn evaluate(&mut self, ctx: &mut PlayerContext, _delta: f32) -> bool {
        if !ctx.senses(BodySense::InWater) {
            return false;
        }
        if self.active {
            ctx.body.velocity.y > 0.0 && !ctx.senses(BodySense::HeadTouchingBlock)
        } else {
            !ctx.senses(BodySense::FeetOnGround) && ctx.just_pressed(ControllerButton::A)
        }
    }

    fn init(&mut self, ctx: &mut PlayerContext) {
        self.active = true;
        ctx.body.velocity.y = SWIM_VEL;
    }

    fn act(&mut self, _ctx: &mut PlayerContext, _delta: f32) {}

    fn end(&mut self, _ctx: &mut PlayerContext) {
        self.active = false;
    }
}

// =============================================================================
// Climb
// =============================================================================

#[derive(Default)]
pub struct Climbing {
    active: bool,
}

impl Behavior<PlayerContext> for Climbing {
    fn kind(&self) -> BehaviorType {
        BehaviorType::Climbing
    }

    fn evaluate(&mut self, ctx: &mut PlayerContext, _delta: f32) -> bool {
        if !ctx.senses(BodySense::TouchingLadder) {
            return false;
        }
        let on_ground = ctx.senses(BodySense::FeetOnGround);
        if self.active {
            !ctx.just_pressed(ControllerButton::A) && !(on_ground && ctx.pressed(ControllerButton::Down))
        } else {
            (ctx.pressed(ControllerButton::Up) && !ctx.senses(BodySense::HeadTouchingBlock))
                || (ctx.pressed(ControllerButton::Down) && !on_ground)
        }
    }

    fn init(&mut self, ctx: &mut PlayerContext) {
        self.active = true;
        ctx.body.gravity_on = false;
        ctx.body.velocity = Vec2::ZERO;
        ctx.megaman.can_air_dash = true;
    }

    fn act(&mut self, ctx: &mut PlayerContext, _delta: f32) {
        ctx.body.velocity.x = 0.0;
        ctx.body.velocity.y = if ctx.pressed(ControllerButton::Up) {
            CLIMB_SPEED
        } else if ctx.pressed(ControllerButton::Down) {
            -CLIMB_SPEED
        } else {
            0.0
        };
    }

    fn end(&mut self, ctx: &mut PlayerContext) {
        self.active = false;
        ctx.body.gravity_on = true;
    }
}

// =============================================================================
// Crouch
// =============================================================================

#[derive(Default)]
pub struct Crouching;

impl Behavior<PlayerContext> for Crouching {
    fn kind(&self) -> BehaviorType {
        BehaviorType::Crouching
    }

    fn evaluate(&mut self, ctx: &mut PlayerContext, _delta: f32) -> bool {
        ctx.senses(BodySense::FeetOnGround)
            && ctx.pressed(ControllerButton::Down)
            && !ctx.just_pressed(ControllerButton::A)
    }

    fn act(&mut self, ctx: &mut PlayerContext, _delta: f32) {
        ctx.body.velocity.x = 0.0;
    }
}

// =============================================================================
// Jetpack (Rush Jet)
// =============================================================================

/// Hold A in the air with Rush Jet equipped. Burns ammo while flying.
#[derive(Default)]
pub struct Jetpacking {
    active: bool,
    drain: Timer,
}

impl Behavior<PlayerContext> for Jetpacking {
    fn kind(&self) -> BehaviorType {
        BehaviorType::Jetpacking
    }

    fn evaluate(&mut self, ctx: &mut PlayerContext, _delta: f32) -> bool {
        let megaman = &ctx.megaman;
        if megaman.current_weapon != MegamanWeapon::RushJet
            || megaman.weapons.is_depleted(MegamanWeapon::RushJet)
            || ctx.senses(BodySense::InWater)
        {
            return false;
        }
        if self.active {
            ctx.pressed(ControllerButton::A) && !ctx.senses(BodySense::HeadTouchingBlock)
        } else {
            !ctx.senses(BodySense::FeetOnGround) && ctx.just_pressed(ControllerButton::A)
        }
    }

    fn init(&mut self, ctx: &mut PlayerContext) {
        self.active = true;
        self.drain = Timer::new(JETPACK_AMMO_INTERVAL);
        ctx.body.gravity_on = false;
    }

    fn act(&mut self, ctx: &mut PlayerContext, delta: f32) {
        ctx.body.velocity.y = JETPACK_Y_VEL;
        self.drain.update(delta);
        if self.drain.is_finished() {
            ctx.megaman.weapons.translate_ammo(MegamanWeapon::RushJet, -1);
            self.drain.reset();
        }
    }

    fn end(&mut self, ctx: &mut PlayerContext) {
        self.active = false;
        ctx.body.gravity_on = true;
    }
}

// =============================================================================
// Cart
// =============================================================================

/// Riding a cart: input accelerates instead of setting speed. A hops off.
#[derive(Default)]
pub struct RidingCart;

impl Behavior<PlayerContext> for RidingCart {
    fn kind(&self) -> BehaviorType {
        BehaviorType::RidingCart
    }

    fn evaluate(&mut self, ctx: &mut PlayerContext, _delta: f32) -> bool {
        ctx.senses(BodySense::TouchingCart) && !ctx.just_pressed(ControllerButton::A)
    }

    fn act(&mut self, ctx: &mut PlayerContext, delta: f32) {
        let accel = ctx.controller.horizontal() * CART_SPEED * 2.0 * delta;
        ctx.body.velocity.x = (ctx.body.velocity.x + accel).clamp(-CART_SPEED, CART_SPEED);
    }

    fn end(&mut self, ctx: &mut PlayerContext) {
        if ctx.just_pressed(ControllerButton::A) {
            ctx.body.velocity.y = JUMP_VEL;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::geometry::Vec2;

    const DT: f32 = 1.0 / 60.0;

    fn context(senses: &[BodySense]) -> PlayerContext {
        let mut body = megaman_body(Vec2::ZERO);
        for &sense in senses {
            body.set_sensing(sense, true);
        }
        PlayerContext { body, megaman: Megaman::new(30), controller: ControllerState::new() }
    }

    fn press(ctx: &mut PlayerContext, buttons: &[ControllerButton]) {
        ctx.controller.set_buttons(buttons);
    }

    #[test]
    fn test_behavior_types_unique() {
        let kinds: std::collections::HashSet<_> = BehaviorType::ALL.iter().collect();
        assert_eq!(kinds.len(), BehaviorType::ALL.len());
        assert_eq!(megaman_behaviors().len(), BehaviorType::ALL.len());
    }

    #[test]
    fn test_release_cuts_jump() {
        let mut behaviors = megaman_behaviors();
        let mut ctx = context(&[BodySense::FeetOnGround]);
        press(&mut ctx, &[ControllerButton::A]);
        behaviors.update(&mut ctx, DT);
        assert!(behaviors.is_active(BehaviorType::Jumping));
        assert_eq!(ctx.body.velocity.y, JUMP_VEL);

        ctx.body.clear_senses();
        press(&mut ctx, &[]);
        behaviors.update(&mut ctx, DT);
        assert_eq!(behaviors.active(), None);
        assert_eq!(ctx.body.velocity.y, 0.0);
    }

    #[test]
    fn test_air_dash_once_per_airtime() {
        let mut behaviors = megaman_behaviors();
        let mut ctx = context(&[]);
        press(&mut ctx, &[ControllerButton::A]);
        behaviors.update(&mut ctx, DT);
        assert!(behaviors.is_active(BehaviorType::AirDashing));
        assert!(!ctx.body.gravity_on);
        assert_eq!(ctx.body.velocity.x, AIR_DASH_SPEED);

        press(&mut ctx, &[]);
        behaviors.update(&mut ctx, DT);
        assert_eq!(behaviors.active(), None);
        assert!(ctx.body.gravity_on);

        press(&mut ctx, &[ControllerButton::A]);
        behaviors.update(&mut ctx, DT);
        assert_eq!(behaviors.active(), None);
    }

    #[test]
    fn test_wall_slide_caps_fall_and_wall_jump_pushes_away() {
        let mut behaviors = megaman_behaviors();
        let mut ctx = context(&[BodySense::SideTouchingBlockRight]);
        ctx.body.velocity.y = -10.0;
        press(&mut ctx, &[ControllerButton::Right]);
        behaviors.update(&mut ctx, DT);
        assert!(behaviors.is_active(BehaviorType::WallSliding));
        assert_eq!(ctx.body.velocity.y, -WALL_SLIDE_SPEED);

        press(&mut ctx, &[ControllerButton::Right, ControllerButton::A]);
        behaviors.update(&mut ctx, DT);
        assert!(!behaviors.is_active(BehaviorType::WallSliding));
        assert!(ctx.body.velocity.x < 0.0);
        assert_eq!(ctx.body.velocity.y, WALL_JUMP_VEL.y);
        assert_eq!(ctx.megaman.facing, Facing::Left);
        assert!(!ctx.megaman.wall_jump_impetus.is_finished());
    }

    #[test]
    fn test_ladder_beats_lower_priorities() {
        let mut behaviors = megaman_behaviors();
        let mut ctx = context(&[BodySense::TouchingLadder, BodySense::FeetOnGround]);
        press(&mut ctx, &[ControllerButton::Up]);
        behaviors.update(&mut ctx, DT);
        assert!(behaviors.is_active(BehaviorType::Climbing));
        assert!(!ctx.body.gravity_on);
        assert_eq!(ctx.body.velocity.y, CLIMB_SPEED);

        // Jumping off the ladder
        press(&mut ctx, &[ControllerButton::A]);
        behaviors.update(&mut ctx, DT);
        assert!(!behaviors.is_active(BehaviorType::Climbing));
        assert!(ctx.body.gravity_on);
    }

    #[test]
    fn test_down_a_slides_instead_of_jumping() {
        let mut behaviors = megaman_behaviors();
        let mut ctx = context(&[BodySense::FeetOnGround]);
        press(&mut ctx, &[ControllerButton::Down]);
        behaviors.update(&mut ctx, DT);
        assert!(behaviors.is_active(BehaviorType::Crouching));

        press(&mut ctx, &[ControllerButton::Down, ControllerButton::A]);
        behaviors.update(&mut ctx, DT);
        assert!(behaviors.is_active(BehaviorType::GroundSliding));
        assert_eq!(ctx.body.velocity.x, GROUND_SLIDE_SPEED);

        for _ in 0..30 {
            press(&mut ctx, &[]);
            behaviors.update(&mut ctx, DT);
        }
        assert_eq!(behaviors.active(), None);
    }

    #[test]
    fn test_jetpack_needs_rush_jet_and_burns_ammo() {
        let mut behaviors = megaman_behaviors();
        let mut ctx = context(&[]);
        ctx.megaman.can_air_dash = false;
        press(&mut ctx, &[ControllerButton::A]);
        behaviors.update(&mut ctx, DT);
        assert_eq!(behaviors.active(), None);

        ctx.megaman.weapons.put_weapon(MegamanWeapon::RushJet);
        ctx.megaman.set_current_weapon(MegamanWeapon::RushJet);
        press(&mut ctx, &[]);
        behaviors.update(&mut ctx, DT);
        press(&mut ctx, &[ControllerButton::A]);
        behaviors.update(&mut ctx, DT);
        assert!(behaviors.is_active(BehaviorType::Jetpacking));
        assert_eq!(ctx.body.velocity.y, JETPACK_Y_VEL);

        for _ in 0..60 {
            press(&mut ctx, &[ControllerButton::A]);
            behaviors.update(&mut ctx, DT);
        }
        assert!(ctx.megaman.weapons.ammo(MegamanWeapon::RushJet) < 30);

        ctx.megaman.weapons.deplete_ammo(MegamanWeapon::RushJet);
        behaviors.update(&mut ctx, DT);
        assert!(!behaviors.is_active(BehaviorType::Jetpacking));
        assert!(ctx.body.gravity_on);
    }

    #[test]
    fn test_cart_accelerates_and_jump_dismounts() {
        let mut behaviors = megaman_behaviors();
        let mut ctx = context(&[BodySense::TouchingCart, BodySense::FeetOnGround]);
        press(&mut ctx, &[ControllerButton::Right]);
        behaviors.update(&mut ctx, DT);
        assert!(behaviors.is_active(BehaviorType::RidingCart));
        let first = ctx.body.velocity.x;
        assert!(first > 0.0 && first < CART_SPEED);

        press(&mut ctx, &[ControllerButton::Right, ControllerButton::A]);
        behaviors.update(&mut ctx, DT);
        assert!(!behaviors.is_active(BehaviorType::RidingCart));
        assert!(ctx.body.velocity.y > 0.0);
    }
}
