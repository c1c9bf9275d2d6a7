//! Room camera
//!
//! The level is cut into rectangular rooms. Inside a room the camera
//! follows the player but never shows anything outside the room. When the
//! player crosses into a neighbouring room the camera runs a transition:
//!
//! 1. Begin: `BeginRoomTrans` and `TurnControllerOff` go out
//! 2. Continue: after a short delay, camera and player slide into the new
//!    room; every step emits `ContinueRoomTrans` with the player position
//! 3. End: `EndRoomTrans` and `TurnControllerOn`, the new room is current
//!
//! Entering a room without a transition (spawn, teleport) emits
//! `SetToRoomNoTrans` instead.

use tracing::{debug, warn};
use super::components::GameRoom;
use super::event::{Event, EventType};
use super::geometry::{Direction, Rect, Vec2};
use super::timer::Timer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    Begin,
    Continue,
    End,
}

#[derive(Debug, Clone)]
pub struct RoomTransition {
    pub direction: Direction,
    pub prior: usize,
    pub next: usize,
    pub state: TransitionState,
    delay: Timer,
    progress: Timer,
    camera_start: Vec2,
    camera_target: Vec2,
    focus_start: Vec2,
    focus_target: Vec2,
}

pub struct RoomCamera {
    /// Camera center in world units
    pub position: Vec2,
    viewport: Vec2,
    rooms: Vec<GameRoom>,
    current: Option<usize>,
    transition: Option<RoomTransition>,
    delay_duration: f32,
    trans_duration: f32,
    /// How far past the edge the player ends up after a transition
    distance_on_transition: f32,
}

impl RoomCamera {
    pub fn new(viewport: Vec2, delay: f32, duration: f32, distance: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            viewport,
            rooms: Vec::new(),
            current: None,
            transition: None,
            delay_duration: delay,
            trans_duration: duration,
            distance_on_transition: distance,
        }
    }

    pub fn set_rooms(&mut self, rooms: Vec<GameRoom>) {
        self.rooms = rooms;
        self.current = None;
        self.transition = None;
    }

    pub fn rooms(&self) -> &[GameRoom] {
        &self.rooms
    }

    pub fn current_room(&self) -> Option<&GameRoom> {
        self.current.and_then(|idx| self.rooms.get(idx))
    }

    pub fn transition(&self) -> Option<&RoomTransition> {
        self.transition.as_ref()
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Visible area
    pub fn view(&self) -> Rect {
        Rect::centered(self.position, self.viewport.x, self.viewport.y)
    }

    fn room_at(&self, point: Vec2) -> Option<usize> {
        self.rooms.iter().position(|room| room.bounds.contains(point))
    }

    /// Camera center for `focus` clamped so the view stays inside `room`.
    fn clamped_center(&self, room: &Rect, focus: Vec2) -> Vec2 {
        let half = self.viewport * 0.5;
        let axis = |value: f32, min: f32, len: f32, half: f32| {
            if len <= half * 2.0 {
                min + len / 2.0
            } else {
                value.clamp(min + half, min + len - half)
            }
        };
        Vec2::new(axis(focus.x, room.x, room.w, half.x), axis(focus.y, room.y, room.h, half.y))
    }

    fn room_event(&self, key: EventType, idx: usize) -> Event {
        let room = &self.rooms[idx];
        Event::new(key).with("room", room.name.as_str()).with("bounds", room.bounds)
    }

    /// Snap to whatever room contains `focus`, without a transition.
    pub fn reset(&mut self, focus: &Rect) -> Vec<Event> {
        self.transition = None;
        self.current = self.room_at(focus.center());
        match self.current {
            Some(idx) => {
                self.position = self.clamped_center(&self.rooms[idx].bounds, focus.center());
                debug!(room = %self.rooms[idx].name, "camera set to room");
                vec![self.room_event(EventType::SetToRoomNoTrans, idx)]
            }
            None => {
                self.position = focus.center();
                Vec::new()
            }
        }
    }

    /// Advance one step. Returns the events to submit.
    pub fn update(&mut self, focus: &Rect, delta: f32) -> Vec<Event> {
        if self.transition.is_some() {
            return self.update_transition(delta);
        }

        let center = focus.center();
        let Some(current) = self.current else {
            return self.reset(focus);
        };

        if self.rooms[current].bounds.contains(center) {
            self.position = self.clamped_center(&self.rooms[current].bounds, center);
            return Vec::new();
        }

        match self.room_at(center) {
            Some(next) => {
                let direction = focus
                    .overlap_push_direction(&self.rooms[current].bounds)
                    .unwrap_or_else(|| Direction::from_start_to_target(
                        self.rooms[current].bounds.center(),
                        self.rooms[next].bounds.center(),
                    ));
                self.start_transition(current, next, direction, center);
                Vec::new()
            }
            None => {
                // Out of every room (falling into a pit): keep the camera put
                Vec::new()
            }
        }
    }

    /// Request a transition into a named room (`NextRoomReq`).
    pub fn transition_to_room(&mut self, name: &str, focus: &Rect) -> bool {
        if self.transition.is_some() {
            return false;
        }
        let Some(next) = self.rooms.iter().position(|r| r.name == name) else {
            warn!(room = name, "transition to unknown room");
            return false;
        };
        let Some(current) = self.current else {
            return false;
        };
        if current == next {
            return false;
        }
        let direction = Direction::from_start_to_target(
            self.rooms[current].bounds.center(),
            self.rooms[next].bounds.center(),
        );
        self.start_transition(current, next, direction, focus.center());
        true
    }

    fn start_transition(&mut self, prior: usize, next: usize, direction: Direction, focus: Vec2) {
        let room = self.rooms[next].bounds;
        let half_w = (room.w / 2.0).min(self.viewport.x / 2.0);
        let half_h = (room.h / 2.0).min(self.viewport.y / 2.0);
        let distance = self.distance_on_transition;

        let mut camera_target = self.clamped_center(&room, focus);
        let mut focus_target = focus;
        match direction {
            Direction::Right => {
                camera_target.x = room.x + half_w;
                focus_target.x = room.x + distance;
            }
            Direction::Left => {
                camera_target.x = room.right() - half_w;
                focus_target.x = room.right() - distance;
            }
            Direction::Up => {
                camera_target.y = room.y + half_h;
                focus_target.y = room.y + distance;
            }
            Direction::Down => {
                camera_target.y = room.top() - half_h;
                focus_target.y = room.top() - distance;
            }
        }

        debug!(from = %self.rooms[prior].name, to = %self.rooms[next].name, ?direction, "room transition");
        self.transition = Some(RoomTransition {
            direction,
            prior,
            next,
            state: TransitionState::Begin,
            delay: Timer::new(self.delay_duration),
            progress: Timer::new(self.trans_duration),
            camera_start: self.position,
            camera_target,
            focus_start: focus,
            focus_target,
        });
    }

    fn update_transition(&mut self, delta: f32) -> Vec<Event> {
        let Some(mut trans) = self.transition.take() else {
            return Vec::new();
        };
        let mut events = Vec::new();
        match trans.state {
            TransitionState::Begin => {
                events.push(
                    self.room_event(EventType::BeginRoomTrans, trans.next)
                        .with("prior", self.rooms[trans.prior].name.as_str())
                        .with("position", trans.focus_start),
                );
                events.push(Event::new(EventType::TurnControllerOff));
                trans.state = TransitionState::Continue;
            }
            TransitionState::Continue => {
                if !trans.delay.is_finished() {
                    trans.delay.update(delta);
                } else {
                    trans.progress.update(delta);
                }
                let t = trans.progress.ratio();
                self.position = trans.camera_start.lerp(trans.camera_target, t);
                let focus = trans.focus_start.lerp(trans.focus_target, t);
                events.push(
                    self.room_event(EventType::ContinueRoomTrans, trans.next)
                        .with("position", focus),
                );
                if trans.progress.is_finished() {
                    trans.state = TransitionState::End;
                }
            }
            TransitionState::End => {
                self.position = trans.camera_target;
                self.current = Some(trans.next);
                events.push(
                    self.room_event(EventType::EndRoomTrans, trans.next)
                        .with("position", trans.focus_target),
                );
                events.push(Event::new(EventType::TurnControllerOn));
                if self.rooms[trans.next].boss {
                    events.push(self.room_event(EventType::EnterBossRoom, trans.next));
                }
                return events;
            }
        }
        self.transition = Some(trans);
        events
    }
}
