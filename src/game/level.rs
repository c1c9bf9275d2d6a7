//! Level runtime
//!
//! Owns everything a running level needs and advances it in fixed steps.
//! Frame time is accumulated and consumed `fixed_time_step` at a time; the
//! event pump runs once per frame and after every step, so an event
//! submitted during a step is handled before the next one starts.
//!
//! Step order:
//! 1. Player input, behaviors and weapons
//! 2. Enemy AI, health timers, projectile and item lifetimes, off-camera culling
//! 3. Physics, then contact handling (damage, pickups, hazards, triggers)
//! 4. Deaths (enemy drops, boss check, player death timer)
//! 5. Room camera
//! 6. Despawned buckets go back to their pools
//!
//! No drawing or window access happens here, so a level runs headless.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};
use crate::config::EngineConfig;
use crate::input::{ControllerButton, ControllerState};
use crate::world::{validate_map, BuildContext, GameMap, MapError, MapLayerBuilders};
use super::camera::RoomCamera;
use super::components::{Boss, CullOffscreen, Enemy, GameRoom, Item, PlayerSpawn, Projectile, SpawnPoint, Trigger, TriggerAction};
use super::contact::{ContactPhase, ContactTracker};
use super::damage::{try_inflict_damage, Combatant, ContactDamager, DamageOutcome};
use super::enemies::{drop_chance, register_enemy_pools, roll_drop, spawn_enemy, update_bats, update_mets};
use super::entity::Entity;
use super::event::{Event, EventType, EventsManager, ListenerId};
use super::geometry::{Rect, Vec2};
use super::items::{apply_pickup, pickup_event, register_item_pools, spawn_item, update_items};
use super::megaman::{megaman_bucket, update_player, Megaman};
use super::physics::{Body, Contact, FixtureType, Physics};
use super::pool::EntityPools;
use super::projectiles::{register_projectile_pools, spawn_player_shot, update_projectiles};
use super::state::GameState;
use super::timer::Timer;
use super::world::World;

/// Events the runtime itself reacts to
const HANDLED_EVENTS: &[EventType] = &[
    EventType::GamePause,
    EventType::GameResume,
    EventType::AddPlayerHealth,
    EventType::AddWeaponEnergy,
    EventType::NextRoomReq,
    EventType::BeginRoomTrans,
    EventType::ContinueRoomTrans,
    EventType::EndRoomTrans,
    EventType::SetToRoomNoTrans,
    EventType::EnterBossRoom,
    EventType::TurnControllerOn,
    EventType::TurnControllerOff,
    EventType::PlayerJustDied,
    EventType::PlayerDoneDying,
    EventType::BossDefeated,
    EventType::VictoryEvent,
    EventType::EndLevel,
    EventType::GameOver,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelStatus {
    Playing,
    /// Boss beaten or an end trigger touched
    Complete,
    GameOver,
}

/// Counters for the headless summary
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeStats {
    pub frames: u64,
    pub steps: u64,
    pub events: u64,
    pub deaths: u32,
    pub enemies_killed: u32,
}

pub struct LevelRuntime {
    pub config: EngineConfig,
    pub level_name: String,
    pub world: World,
    pub events: EventsManager,
    pub pools: EntityPools,
    pub camera: RoomCamera,
    pub state: GameState,
    physics: Physics,
    contacts: ContactTracker,
    listener: ListenerId,
    rng: StdRng,
    player: Entity,
    accumulator: f32,
    paused: bool,
    controller_on: bool,
    death_timer: Option<Timer>,
    status: LevelStatus,
    stats: RuntimeStats,
}

impl LevelRuntime {
    /// Build `map` with `builders` and place the player at the primary spawn.
    pub fn new(config: EngineConfig, map: &GameMap, builders: &MapLayerBuilders, state: GameState) -> Result<Self, MapError> {
        validate_map(map)?;
        let mut world = World::new();
        let mut pools = EntityPools::new();
        register_projectile_pools(&mut pools);
        register_enemy_pools(&mut pools);
        register_item_pools(&mut pools);

        let summary = builders.build_all(map, &mut BuildContext { world: &mut world, pools: &mut pools })?;
        info!(level = %map.name, built = summary.built.len(), skipped = summary.skipped.len(), "level built");

        let spawn = primary_spawn(&world)
            .ok_or_else(|| MapError::Validation(format!("map {:?} has no player spawn", map.name)))?;

        let rooms: Vec<GameRoom> = world
            .entities_with::<GameRoom>()
            .into_iter()
            .filter_map(|e| world.get::<GameRoom>(e).cloned())
            .collect();
        let mut camera = RoomCamera::new(
            Vec2::new(config.view_width, config.view_height),
            config.room_trans_delay,
            config.room_trans_duration,
            config.room_trans_distance,
        );
        camera.set_rooms(rooms);

        let player = world.spawn_with(megaman_bucket(&config, spawn));
        if let Some(combatant) = world.get_mut::<Combatant>(player) {
            combatant.health.points.set_max(state.max_health(config.max_health));
            combatant.health.reset();
        }

        let mut events = EventsManager::new();
        let listener = events.add_listener(HANDLED_EVENTS);

        let mut physics = Physics::new(config.physics);
        physics.set_bounds(map.object_bounds());

        let mut runtime = Self {
            physics,
            config,
            level_name: map.name.clone(),
            world,
            events,
            pools,
            camera,
            state,
            contacts: ContactTracker::new(),
            listener,
            rng: StdRng::from_entropy(),
            player,
            accumulator: 0.0,
            paused: false,
            controller_on: true,
            death_timer: None,
            status: LevelStatus::Playing,
            stats: RuntimeStats::default(),
        };
        let focus = runtime.player_bounds().unwrap_or_else(|| Rect::centered(spawn, 1.0, 1.0));
        for event in runtime.camera.reset(&focus) {
            runtime.events.submit(event);
        }
        runtime.events.submit(Event::new(EventType::PlayerSpawn).with("position", spawn));
        Ok(runtime)
    }

    /// Fixed seed for item drops
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn player(&self) -> Entity {
        self.player
    }

    pub fn status(&self) -> LevelStatus {
        self.status
    }

    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_controller_on(&self) -> bool {
        self.controller_on
    }

    pub fn player_bounds(&self) -> Option<Rect> {
        self.world.get::<Body>(self.player).map(|b| b.bounds)
    }

    fn player_center(&self) -> Option<Vec2> {
        self.world.get::<Body>(self.player).map(|b| b.center())
    }

    // =========================================================================
    // Frame loop
    // =========================================================================

    /// Advance by one rendered frame.
    pub fn update(&mut self, frame_time: f32, controller: &ControllerState) {
        self.stats.frames += 1;

        if controller.is_just_pressed(ControllerButton::Start) && self.status == LevelStatus::Playing {
            let key = if self.paused { EventType::GameResume } else { EventType::GamePause };
            self.events.submit(Event::new(key));
        }
        self.pump_events();

        if self.paused || self.status != LevelStatus::Playing {
            self.accumulator = 0.0;
            return;
        }

        let mut input = *controller;
        input.set_enabled(self.controller_on);
        let step = self.config.fixed_time_step;
        self.accumulator += frame_time.clamp(0.0, self.config.max_frame_time);
        while self.accumulator >= step {
            self.step(&input, step);
            self.accumulator -= step;
            // Edges belong to the first step of the frame only
            let held = input;
            input.update(|b| held.is_pressed(b));
            input.set_enabled(self.controller_on);
            if self.paused || self.status != LevelStatus::Playing {
                self.accumulator = 0.0;
                break;
            }
        }
    }

    /// One fixed simulation step.
    pub fn step(&mut self, controller: &ControllerState, delta: f32) {
        self.stats.steps += 1;

        if self.camera.is_transitioning() {
            self.update_camera(delta);
            self.finish_step();
            return;
        }

        self.update_player(controller, delta);
        self.update_spawn_points();

        let player_pos = self.player_center().filter(|_| !self.is_player_dead());
        let room = self.camera.current_room().map(|r| r.bounds);
        update_mets(&mut self.world, &mut self.pools, player_pos, delta);
        update_bats(&mut self.world, player_pos, room, self.config.pathfinding_max_iterations, delta);
        for entity in self.world.entities_with::<Combatant>() {
            if let Some(combatant) = self.world.get_mut::<Combatant>(entity) {
                combatant.update(delta);
            }
        }
        update_projectiles(&mut self.world, delta);
        update_items(&mut self.world, delta);
        self.cull_offscreen(delta);

        let contacts = self.physics.step(&mut self.world, delta);
        for (phase, contact) in self.contacts.update(contacts) {
            self.handle_contact(phase, &contact);
        }

        self.handle_enemy_deaths();
        self.handle_player_death(delta);
        self.update_camera(delta);
        self.finish_step();
    }

    fn finish_step(&mut self) {
        for event in self.state.drain_changes() {
            self.events.submit(event);
        }
        let buckets = self.world.flush_despawns();
        self.pools.reclaim_all(buckets);
        self.pump_events();
    }

    fn update_player(&mut self, controller: &ControllerState, delta: f32) {
        let shots = update_player(&mut self.world, self.player, controller, delta);
        let mut spawned = Vec::with_capacity(shots.len());
        for shot in &shots {
            match spawn_player_shot(&mut self.world, &mut self.pools, self.player, shot) {
                Some(entity) => spawned.push((shot.request.weapon, entity)),
                None => warn!(kind = ?shot.request.projectile, "no pool for player shot"),
            }
        }
        if let Some(mut megaman) = self.world.remove::<Megaman>(self.player) {
            for (weapon, entity) in spawned {
                megaman.weapons.track_spawned(weapon, entity);
            }
            let world = &self.world;
            megaman.weapons.cull_dead(|e| world.is_alive(e) && !world.is_despawn_queued(e));
            self.world.add(self.player, megaman);
        }
    }

    fn cull_offscreen(&mut self, delta: f32) {
        let view = self.camera.view();
        for entity in self.world.entities_with::<CullOffscreen>() {
            let Some(bounds) = self.world.get::<Body>(entity).map(|b| b.bounds) else {
                continue;
            };
            let Some(cull) = self.world.get_mut::<CullOffscreen>(entity) else {
                continue;
            };
            if view.overlaps(&bounds) {
                cull.timer.reset();
                continue;
            }
            cull.timer.update(delta);
            if cull.timer.is_finished() {
                debug!(%entity, "culled off camera");
                self.world.despawn(entity);
            }
        }
    }

    fn update_camera(&mut self, delta: f32) {
        let Some(focus) = self.player_bounds() else {
            return;
        };
        for event in self.camera.update(&focus, delta) {
            self.events.submit(event);
        }
    }

    // =========================================================================
    // Contacts
    // =========================================================================

    fn handle_contact(&mut self, phase: ContactPhase, contact: &Contact) {
        if phase == ContactPhase::End {
            return;
        }

        if let Some((damager, damageable)) = contact.matching(FixtureType::Damager, FixtureType::Damageable) {
            self.resolve_damage(damager.entity, damageable.entity);
        }

        if let Some((projectile, _)) = contact.matching(FixtureType::Projectile, FixtureType::Block) {
            self.world.despawn(projectile.entity);
        }

        if phase != ContactPhase::Begin {
            return;
        }

        if let Some((body, _)) = contact.matching(FixtureType::Body, FixtureType::Death) {
            if body.entity == self.player {
                self.kill_player();
            }
        }

        if let Some((body, item)) = contact.matching(FixtureType::Body, FixtureType::Item) {
            if body.entity == self.player && !self.world.is_despawn_queued(item.entity) {
                if let Some(event) = self.world.get::<Item>(item.entity).map(pickup_event) {
                    self.events.submit(event);
                    self.world.despawn(item.entity);
                }
            }
        }

        if let Some((body, trigger)) = contact.matching(FixtureType::Body, FixtureType::Trigger) {
            if body.entity == self.player {
                self.fire_trigger(trigger.entity);
            }
        }
    }

    fn resolve_damage(&mut self, damager: Entity, target: Entity) {
        if damager == target || self.world.is_despawn_queued(damager) || self.world.is_despawn_queued(target) {
            return;
        }
        if !(self.world.has::<ContactDamager>(damager) && self.world.has::<Combatant>(target)) {
            return;
        }
        let (Some(mut hitter), Some(mut victim)) = (
            self.world.remove::<ContactDamager>(damager),
            self.world.remove::<Combatant>(target),
        ) else {
            return;
        };
        let outcome = try_inflict_damage(&mut hitter, &mut victim);
        let health = victim.health.current();
        let spent = hitter.is_spent();
        self.world.add(damager, hitter);
        self.world.add(target, victim);

        if spent {
            self.world.despawn(damager);
        }
        if outcome == DamageOutcome::Applied {
            debug!(%damager, %target, health, "damage applied");
            if target == self.player {
                self.events.submit(Event::new(EventType::StunPlayer).with("health", health));
            }
        }
    }

    fn fire_trigger(&mut self, entity: Entity) {
        let Some(trigger) = self.world.get_mut::<Trigger>(entity) else {
            return;
        };
        if trigger.once && trigger.fired {
            return;
        }
        trigger.fired = true;
        let action = trigger.action.clone();
        debug!(%entity, ?action, "trigger fired");
        match action {
            TriggerAction::NextRoom(room) => {
                self.events.submit(Event::new(EventType::NextRoomReq).with("room", room));
            }
            TriggerAction::BossRoom => {
                match self.camera.rooms().iter().find(|r| r.boss) {
                    Some(room) => {
                        let name = room.name.clone();
                        self.events.submit(Event::new(EventType::NextRoomReq).with("room", name));
                    }
                    None => warn!("boss trigger in a map without a boss room"),
                }
            }
            TriggerAction::EndLevel => self.events.submit(Event::new(EventType::EndLevel)),
        }
    }

    // =========================================================================
    // Deaths
    // =========================================================================

    fn is_player_dead(&self) -> bool {
        self.world.get::<Megaman>(self.player).is_some_and(|m| m.dead)
    }

    fn kill_player(&mut self) {
        if let Some(combatant) = self.world.get_mut::<Combatant>(self.player) {
            combatant.health.points.set_to_min();
        }
    }

    fn handle_enemy_deaths(&mut self) {
        let player_health = self
            .world
            .get::<Combatant>(self.player)
            .map_or(1.0, |c| c.health.points.ratio());

        for entity in self.world.entities_with::<Enemy>() {
            if self.world.is_despawn_queued(entity) {
                continue;
            }
            let dead = self.world.get::<Combatant>(entity).is_some_and(|c| c.health.is_dead());
            if !dead {
                continue;
            }
            let Some(enemy) = self.world.get::<Enemy>(entity).copied() else {
                continue;
            };
            let position = self.world.get::<Body>(entity).map(|b| b.center()).unwrap_or(Vec2::ZERO);
            self.world.despawn(entity);
            self.stats.enemies_killed += 1;
            debug!(%entity, kind = ?enemy.kind, "enemy destroyed");

            if let Some(item) = roll_drop(&mut self.rng, drop_chance(enemy.base_drop_chance, player_health)) {
                spawn_item(&mut self.world, &mut self.pools, item, position, true);
            }

            if self.world.has::<Boss>(entity) {
                let remaining = self
                    .world
                    .entities_with::<Boss>()
                    .into_iter()
                    .filter(|&e| !self.world.is_despawn_queued(e))
                    .count();
                if remaining == 0 {
                    info!(level = %self.level_name, "boss defeated");
                    self.events.submit(Event::new(EventType::BossDefeated));
                }
            }
        }
    }

    fn handle_player_death(&mut self, delta: f32) {
        let just_died = self.world.get::<Combatant>(self.player).is_some_and(|c| c.health.is_dead())
            && !self.is_player_dead();
        if just_died {
            if let Some(megaman) = self.world.get_mut::<Megaman>(self.player) {
                megaman.dead = true;
                megaman.stop_charging();
            }
            if let Some(body) = self.world.get_mut::<Body>(self.player) {
                body.velocity = Vec2::ZERO;
            }
            self.stats.deaths += 1;
            info!("player died");
            self.events.submit(Event::new(EventType::PlayerJustDied));
            self.death_timer = Some(Timer::new(self.config.player_death_delay));
            return;
        }

        if let Some(timer) = self.death_timer.as_mut() {
            timer.update(delta);
            if timer.is_finished() {
                self.death_timer = None;
                self.events.submit(Event::new(EventType::PlayerDoneDying));
            }
        }
    }

    /// Where the player comes back: the spawn inside the current room, else the primary one.
    fn respawn_point(&self) -> Option<Vec2> {
        let room = self.camera.current_room().map(|r| r.bounds);
        let spawns: Vec<PlayerSpawn> = self
            .world
            .entities_with::<PlayerSpawn>()
            .into_iter()
            .filter_map(|e| self.world.get::<PlayerSpawn>(e).copied())
            .collect();
        room.and_then(|r| spawns.iter().find(|s| r.contains(s.position)))
            .or_else(|| spawns.iter().find(|s| s.primary))
            .or_else(|| spawns.first())
            .map(|s| s.position)
    }

    fn respawn_player(&mut self) {
        let Some(position) = self.respawn_point() else {
            warn!("no player spawn to respawn at");
            return;
        };

        for entity in self.world.entities_with::<Enemy>() {
            self.world.despawn(entity);
        }
        for entity in self.world.entities_with::<Projectile>() {
            self.world.despawn(entity);
        }
        for entity in self.world.entities_with::<SpawnPoint>() {
            if let Some(spawn) = self.world.get_mut::<SpawnPoint>(entity) {
                spawn.spawned = None;
                spawn.in_view = false;
            }
        }

        if let Some(megaman) = self.world.get_mut::<Megaman>(self.player) {
            megaman.respawn();
        }
        if let Some(combatant) = self.world.get_mut::<Combatant>(self.player) {
            combatant.health.reset();
        }
        if let Some(body) = self.world.get_mut::<Body>(self.player) {
            body.set_center(position);
            body.velocity = Vec2::ZERO;
            body.clear_senses();
        }
        self.contacts.clear();
        self.controller_on = true;

        if let Some(focus) = self.player_bounds() {
            for event in self.camera.reset(&focus) {
                self.events.submit(event);
            }
        }
        self.events.submit(Event::new(EventType::PlayerSpawn).with("position", position));
        info!(lives = self.state.lives(), "player respawned");
    }

    /// Spawn from every point that just came into view in the current room.
    fn update_spawn_points(&mut self) {
        let view = self.camera.view();
        let room = self.camera.current_room().map(|r| r.name.clone());
        for point in self.world.entities_with::<SpawnPoint>() {
            let Some(spawn) = self.world.get_mut::<SpawnPoint>(point) else {
                continue;
            };
            let in_room = match (&spawn.room, &room) {
                (Some(wanted), Some(current)) => wanted == current,
                (None, _) => true,
                (Some(_), None) => false,
            };
            let visible = in_room && view.contains(spawn.position);
            let entered = visible && !spawn.in_view;
            spawn.in_view = visible;
            if !entered {
                continue;
            }
            let (kind, position, boss) = (spawn.kind, spawn.position, spawn.properties.get_bool_or("boss", false));
            let previous = spawn.spawned;
            if previous.is_some_and(|e| self.world.is_alive(e) && !self.world.is_despawn_queued(e)) {
                continue;
            }

            let Some(enemy) = spawn_enemy(&mut self.world, &mut self.pools, kind, position) else {
                warn!(?kind, "no pool for enemy");
                continue;
            };
            if boss {
                self.world.add(enemy, Boss);
            } else {
                self.world.remove::<Boss>(enemy);
            }
            if let Some(spawn) = self.world.get_mut::<SpawnPoint>(point) {
                spawn.spawned = Some(enemy);
            }
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    fn pump_events(&mut self) {
        // Handlers may submit more; those are delivered on the next pass
        for _ in 0..4 {
            if self.events.pending() == 0 {
                break;
            }
            self.events.run();
            let events = self.events.poll(self.listener);
            for event in &events {
                self.handle_event(event);
            }
        }
    }

    fn handle_event(&mut self, event: &Event) {
        self.stats.events += 1;
        match event.key {
            EventType::GamePause => {
                self.paused = true;
                info!("paused");
            }
            EventType::GameResume => {
                self.paused = false;
                info!("resumed");
            }
            EventType::AddPlayerHealth | EventType::AddWeaponEnergy => {
                apply_pickup(&mut self.world, self.player, event);
            }
            EventType::NextRoomReq => {
                let Some(room) = event.properties.get_str("room") else {
                    warn!("room request without a room");
                    return;
                };
                if let Some(focus) = self.player_bounds() {
                    self.camera.transition_to_room(room, &focus);
                }
            }
            EventType::BeginRoomTrans => {
                if let Some(body) = self.world.get_mut::<Body>(self.player) {
                    body.velocity = Vec2::ZERO;
                    body.gravity_on = false;
                    body.collides = false;
                }
            }
            EventType::ContinueRoomTrans => {
                if let (Some(position), Some(body)) =
                    (event.properties.get_vec2("position"), self.world.get_mut::<Body>(self.player))
                {
                    body.set_center(position);
                }
            }
            EventType::EndRoomTrans => {
                if let Some(body) = self.world.get_mut::<Body>(self.player) {
                    if let Some(position) = event.properties.get_vec2("position") {
                        body.set_center(position);
                    }
                    body.gravity_on = true;
                    body.collides = true;
                }
            }
            EventType::SetToRoomNoTrans => {
                debug!(room = event.properties.get_str_or("room", "?"), "camera set to room");
            }
            EventType::EnterBossRoom => {
                info!(room = event.properties.get_str_or("room", "?"), "entered boss room");
            }
            EventType::TurnControllerOn => self.controller_on = true,
            EventType::TurnControllerOff => self.controller_on = false,
            EventType::PlayerJustDied => {
                self.state.lose_life();
            }
            EventType::PlayerDoneDying => {
                if self.state.is_at_min_lives() {
                    self.events.submit(Event::new(EventType::GameOver));
                } else {
                    self.respawn_player();
                }
            }
            EventType::BossDefeated => {
                self.state.add_defeated_level(&self.level_name);
                self.events.submit(Event::new(EventType::VictoryEvent));
            }
            EventType::VictoryEvent => {
                self.events.submit(Event::new(EventType::EndLevel));
            }
            EventType::EndLevel => {
                if self.status == LevelStatus::Playing {
                    info!(level = %self.level_name, "level complete");
                    self.status = LevelStatus::Complete;
                }
            }
            EventType::GameOver => {
                info!("game over");
                self.status = LevelStatus::GameOver;
            }
            _ => {}
        }
    }
}

fn primary_spawn(world: &World) -> Option<Vec2> {
    let spawns: Vec<PlayerSpawn> = world
        .entities_with::<PlayerSpawn>()
        .into_iter()
        .filter_map(|e| world.get::<PlayerSpawn>(e).copied())
        .collect();
    spawns.iter().find(|s| s.primary).or_else(|| spawns.first()).map(|s| s.position)
}
