//! Event System
//!
//! Game systems talk through events instead of calling each other. A system
//! subscribes to the event types it cares about and later polls its inbox:
//!
//! 1. Contact listener detects a boss kill → submits `BossDefeated`
//! 2. `EventsManager::run` copies it into every inbox whose mask includes it
//! 3. The level runtime polls its inbox → starts the victory sequence
//! 4. The game state polls its inbox → marks the level defeated
//!
//! Delivery happens once per frame. Anything submitted while handlers are
//! processing lands in the next frame's batch, so a handler can never starve
//! the loop by re-submitting.

use serde::{Serialize, Deserialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, trace};
use super::properties::Properties;

/// The closed vocabulary of game events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventType {
    // Progression
    AddCurrency,
    AddHeartTank,
    AttainHealthTank,
    AttainHeartTank,
    AddPlayerHealth,
    AddWeaponEnergy,

    // Game flow
    GamePause,
    GameResume,
    GameOver,
    EndLevel,
    VictoryEvent,
    EndEvent,
    TogglePixelPerfect,

    // Player lifecycle
    PlayerSpawn,
    PlayerReady,
    PlayerJustDied,
    PlayerDoneDying,
    StunPlayer,
    Teleport,
    MegamanMove,
    MegamanTrans,
    WeaponEvent,

    // Controller
    TurnControllerOn,
    TurnControllerOff,

    // Rooms and camera
    NextRoomReq,
    BeginRoomTrans,
    ContinueRoomTrans,
    EndRoomTrans,
    SetToRoomNoTrans,
    EnterBossRoom,
    ReqShakeCam,
    ShakeCam,
    SetGameCamRotation,
    StartGameCamRotation,
    EndGameCamRotation,

    // Bosses
    BossReady,
    BossDefeated,
    BossDead,
    EndBossSpawn,
    MiniBossDead,
    IntermediateBossDead,

    // Gates and switches
    GateInitOpening,
    GateFinishOpening,
    GateInitClosing,
    GateFinishClosing,
    ActivateSwitch,
    DeactivateSwitch,

    // Lighting and backgrounds
    AddLightSource,
    RemoveLightSource,
    LightSource,
    LightUpAll,
    DarkenAll,
    BlackBackground,
    HideBackgrounds,
    ShowBackgrounds,

    // Map editing
    EditTiledMap,
}

impl EventType {
    /// Every variant, in declaration order.
    pub const ALL: &'static [EventType] = &[
        EventType::AddCurrency,
        EventType::AddHeartTank,
        EventType::AttainHealthTank,
        EventType::AttainHeartTank,
        EventType::AddPlayerHealth,
        EventType::AddWeaponEnergy,
        EventType::GamePause,
        EventType::GameResume,
        EventType::GameOver,
        EventType::EndLevel,
        EventType::VictoryEvent,
        EventType::EndEvent,
        EventType::TogglePixelPerfect,
        EventType::PlayerSpawn,
        EventType::PlayerReady,
        EventType::PlayerJustDied,
        EventType::PlayerDoneDying,
        EventType::StunPlayer,
        EventType::Teleport,
        EventType::MegamanMove,
        EventType::MegamanTrans,
        EventType::WeaponEvent,
        EventType::TurnControllerOn,
        EventType::TurnControllerOff,
        EventType::NextRoomReq,
        EventType::BeginRoomTrans,
        EventType::ContinueRoomTrans,
        EventType::EndRoomTrans,
        EventType::SetToRoomNoTrans,
        EventType::EnterBossRoom,
        EventType::ReqShakeCam,
        EventType::ShakeCam,
        EventType::SetGameCamRotation,
        EventType::StartGameCamRotation,
        EventType::EndGameCamRotation,
        EventType::BossReady,
        EventType::BossDefeated,
        EventType::BossDead,
        EventType::EndBossSpawn,
        EventType::MiniBossDead,
        EventType::IntermediateBossDead,
        EventType::GateInitOpening,
        EventType::GateFinishOpening,
        EventType::GateInitClosing,
        EventType::GateFinishClosing,
        EventType::ActivateSwitch,
        EventType::DeactivateSwitch,
        EventType::AddLightSource,
        EventType::RemoveLightSource,
        EventType::LightSource,
        EventType::LightUpAll,
        EventType::DarkenAll,
        EventType::BlackBackground,
        EventType::HideBackgrounds,
        EventType::ShowBackgrounds,
        EventType::EditTiledMap,
    ];
}

/// An event instance: its type plus a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub key: EventType,
    pub properties: Properties,
}

impl Event {
    pub fn new(key: EventType) -> Self {
        Self { key, properties: Properties::new() }
    }

    pub fn with_properties(key: EventType, properties: Properties) -> Self {
        Self { key, properties }
    }

    /// Builder-style payload entry.
    pub fn with(mut self, prop: &str, value: impl Into<super::properties::PropValue>) -> Self {
        self.properties.put(prop, value);
        self
    }
}

/// Subscription handle returned by `EventsManager::add_listener`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u32);

struct Listener {
    mask: HashSet<EventType>,
    inbox: Vec<Event>,
}

/// Routes submitted events into the inboxes of the listeners that asked for them.
pub struct EventsManager {
    listeners: BTreeMap<ListenerId, Listener>,
    queue: Vec<Event>,
    next_id: u32,
}

impl EventsManager {
    pub fn new() -> Self {
        Self {
            listeners: BTreeMap::new(),
            queue: Vec::new(),
            next_id: 0,
        }
    }

    /// Register interest in a set of event types.
    pub fn add_listener(&mut self, keys: &[EventType]) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.insert(id, Listener {
            mask: keys.iter().copied().collect(),
            inbox: Vec::new(),
        });
        id
    }

    /// Drop a listener and anything left in its inbox.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn submit(&mut self, event: Event) {
        trace!(key = ?event.key, "event submitted");
        self.queue.push(event);
    }

    /// Deliver everything submitted so far, in submission order.
    pub fn run(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut self.queue);
        for event in batch {
            let mut delivered = 0;
            for listener in self.listeners.values_mut() {
                if listener.mask.contains(&event.key) {
                    listener.inbox.push(event.clone());
                    delivered += 1;
                }
            }
            if delivered == 0 {
                debug!(key = ?event.key, "event had no listeners");
            }
        }
    }

    /// Take the pending events of one listener.
    pub fn poll(&mut self, id: ListenerId) -> Vec<Event> {
        self.listeners
            .get_mut(&id)
            .map(|l| std::mem::take(&mut l.inbox))
            .unwrap_or_default()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Discard queued events and every inbox. Listeners stay registered.
    pub fn clear(&mut self) {
        self.queue.clear();
        for listener in self.listeners.values_mut() {
            listener.inbox.clear();
        }
    }
}

impl Default for EventsManager {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Typed queues
// =============================================================================

/// A queue for events of a single type.
/// Events are collected during the frame and drained at specific points.
#[derive(Debug, Clone)]
pub struct EventQueue<T> {
    events: Vec<T>,
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn send(&mut self, event: T) {
        self.events.push(event);
    }

    /// Iterate over events without clearing
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.events.iter()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.events.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_types_are_unique() {
        let set: HashSet<_> = EventType::ALL.iter().collect();
        assert_eq!(set.len(), EventType::ALL.len());
        assert!(EventType::ALL.contains(&EventType::BossDefeated));
        assert!(EventType::ALL.contains(&EventType::BeginRoomTrans));
    }

    #[test]
    fn test_mask_filters_delivery() {
        let mut events = EventsManager::new();
        let camera = events.add_listener(&[EventType::BeginRoomTrans, EventType::EndRoomTrans]);
        let state = events.add_listener(&[EventType::BossDefeated]);

        events.submit(Event::new(EventType::BeginRoomTrans));
        events.submit(Event::new(EventType::BossDefeated));
        events.submit(Event::new(EventType::EndRoomTrans));
        events.run();

        let cam_events: Vec<_> = events.poll(camera).into_iter().map(|e| e.key).collect();
        assert_eq!(cam_events, vec![EventType::BeginRoomTrans, EventType::EndRoomTrans]);
        let state_events = events.poll(state);
        assert_eq!(state_events.len(), 1);

        // Inbox is drained by poll
        assert!(events.poll(camera).is_empty());
    }

    #[test]
    fn test_events_submitted_after_run_wait_for_next_run() {
        let mut events = EventsManager::new();
        let id = events.add_listener(&[EventType::GamePause]);
        events.submit(Event::new(EventType::GamePause));
        events.run();
        events.submit(Event::new(EventType::GamePause));

        assert_eq!(events.poll(id).len(), 1);
        assert_eq!(events.pending(), 1);
        events.run();
        assert_eq!(events.poll(id).len(), 1);
    }

    #[test]
    fn test_payload_and_remove_listener() {
        let mut events = EventsManager::new();
        let id = events.add_listener(&[EventType::AddCurrency]);
        events.submit(Event::new(EventType::AddCurrency).with("value", 25));
        events.run();
        let got = events.poll(id);
        assert_eq!(got[0].properties.get_int("value"), Some(25));

        assert!(events.remove_listener(id));
        assert!(!events.remove_listener(id));
        assert!(events.poll(id).is_empty());
    }

    #[test]
    fn test_typed_event_queue() {
        let mut queue: EventQueue<i32> = EventQueue::new();
        queue.send(1);
        queue.send(2);
        queue.send(3);
        assert_eq!(queue.len(), 3);

        let collected: Vec<_> = queue.drain().collect();
        assert_eq!(collected, vec![1, 2, 3]);
        assert!(queue.is_empty());
    }
}
