//! Behaviors
//!
//! A behavior is one motion mode of a character: jumping, wall sliding,
//! climbing... Behaviors are mutually exclusive. Each frame the active
//! behavior is asked whether it should continue; if not it ends, and the
//! remaining behaviors are asked in priority order whether they should
//! start. The first one that says yes becomes active.

use serde::{Serialize, Deserialize};
use tracing::trace;

/// The closed set of motion modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorType {
    Jumping,
    AirDashing,
    GroundSliding,
    WallSliding,
    Swimming,
    Climbing,
    Crouching,
    Jetpacking,
    RidingCart,
}

impl BehaviorType {
    pub const ALL: &'static [BehaviorType] = &[
        BehaviorType::Jumping,
        BehaviorType::AirDashing,
        BehaviorType::GroundSliding,
        BehaviorType::WallSliding,
        BehaviorType::Swimming,
        BehaviorType::Climbing,
        BehaviorType::Crouching,
        BehaviorType::Jetpacking,
        BehaviorType::RidingCart,
    ];
}

/// One motion mode operating on context `C`.
pub trait Behavior<C> {
    fn kind(&self) -> BehaviorType;

    /// Should this behavior run (start, or keep running) this frame?
    fn evaluate(&mut self, ctx: &mut C, delta: f32) -> bool;

    fn init(&mut self, _ctx: &mut C) {}

    fn act(&mut self, ctx: &mut C, delta: f32);

    fn end(&mut self, _ctx: &mut C) {}
}

/// Priority-ordered behaviors with at most one active.
pub struct BehaviorsComponent<C> {
    behaviors: Vec<Box<dyn Behavior<C>>>,
    active: Option<usize>,
}

impl<C> BehaviorsComponent<C> {
    pub fn new() -> Self {
        Self { behaviors: Vec::new(), active: None }
    }

    /// Append a behavior. Earlier behaviors win ties.
    pub fn with(mut self, behavior: impl Behavior<C> + 'static) -> Self {
        self.behaviors.push(Box::new(behavior));
        self
    }

    pub fn active(&self) -> Option<BehaviorType> {
        self.active.map(|idx| self.behaviors[idx].kind())
    }

    pub fn is_active(&self, kind: BehaviorType) -> bool {
        self.active() == Some(kind)
    }

    pub fn is_any_active(&self, kinds: &[BehaviorType]) -> bool {
        self.active().is_some_and(|k| kinds.contains(&k))
    }

    pub fn update(&mut self, ctx: &mut C, delta: f32) {
        let mut ended = None;
        if let Some(idx) = self.active {
            if self.behaviors[idx].evaluate(ctx, delta) {
                self.behaviors[idx].act(ctx, delta);
                return;
            }
            trace!(behavior = ?self.behaviors[idx].kind(), "behavior ended");
            self.behaviors[idx].end(ctx);
            self.active = None;
            ended = Some(idx);
        }

        for idx in 0..self.behaviors.len() {
            if Some(idx) == ended {
                continue;
            }
            if self.behaviors[idx].evaluate(ctx, delta) {
                trace!(behavior = ?self.behaviors[idx].kind(), "behavior started");
                self.behaviors[idx].init(ctx);
                self.behaviors[idx].act(ctx, delta);
                self.active = Some(idx);
                return;
            }
        }
    }

    /// End the active behavior, if any.
    pub fn reset(&mut self, ctx: &mut C) {
        if let Some(idx) = self.active.take() {
            self.behaviors[idx].end(ctx);
        }
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}

impl<C> Default for BehaviorsComponent<C> {
    fn default() -> Self {
        Self::new()
    }
}
