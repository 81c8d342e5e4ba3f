//! One round of play and the state machine around it.

use duskfall_common::EntityId;
use duskfall_input::{FrameIntent, launch_speed};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::actors::{Health, HostileStatus};
use crate::celestial::{CelestialModel, CelestialState};
use crate::clock::WorldClock;
use crate::combat::CombatResolver;
use crate::config::SessionConfig;
use crate::events::GameEvent;
use crate::registry::EntityRegistry;
use crate::spatial::SpatialWorld;
use crate::spawn::SpawnRules;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    Menu,
    Playing,
    Paused,
    GameOver,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Menu => "menu",
            SessionState::Playing => "playing",
            SessionState::Paused => "paused",
            SessionState::GameOver => "game over",
        };
        f.write_str(name)
    }
}

/// A state change that the machine does not allow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} while {from}")]
pub struct TransitionError {
    pub from: SessionState,
    pub action: &'static str,
}

/// What one call to [`GameSession::frame`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// Not playing; nothing moved.
    Skipped(SessionState),
    /// A full frame ran.
    Advanced { delta: f32 },
    /// Health hit zero part way through; the rest of the frame was skipped.
    GameOver { score: u32 },
}

/// Authoritative state of one game.
///
/// Owns the clock, arena, actors, score and random stream. Rendering and
/// audio only read from it.
#[derive(Debug, Clone)]
pub struct GameSession {
    config: SessionConfig,
    state: SessionState,
    clock: WorldClock,
    celestial: CelestialModel,
    world: SpatialWorld,
    registry: EntityRegistry,
    spawn: SpawnRules,
    combat: CombatResolver,
    rng: ChaCha8Rng,
    score: u32,
    frame: u64,
    rounds: u32,
    events: Vec<GameEvent>,
}

impl GameSession {
    /// A session sitting in the menu, with an arena already laid out.
    pub fn new(config: SessionConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let world = SpatialWorld::arena(&config.arena, &mut rng);
        let health = Health::new(config.player.initial_health, config.player.max_health);
        Self {
            clock: WorldClock::new(&config.day),
            celestial: CelestialModel::new(),
            world,
            registry: EntityRegistry::new(health),
            spawn: SpawnRules::new(&config.spawn, &config.arena),
            combat: CombatResolver::new(config.spawn.drop_chance),
            rng,
            score: 0,
            frame: 0,
            rounds: 0,
            events: Vec::new(),
            state: SessionState::Menu,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn health(&self) -> Health {
        self.registry.player.health
    }

    /// Frames advanced since the round started.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Rounds started since the session was created.
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn clock(&self) -> &WorldClock {
        &self.clock
    }

    pub fn world(&self) -> &SpatialWorld {
        &self.world
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Direct actor access for scripted scenarios and tests.
    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    /// Lighting for the current time of day.
    pub fn celestial(&self) -> CelestialState {
        self.celestial.sample(self.clock.phase())
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- transitions ----

    fn transition(
        &mut self,
        allowed: &[SessionState],
        to: SessionState,
        action: &'static str,
    ) -> Result<(), TransitionError> {
        if !allowed.contains(&self.state) {
            return Err(TransitionError {
                from: self.state,
                action,
            });
        }
        tracing::info!(from = %self.state, to = %to, "session transition");
        self.state = to;
        Ok(())
    }

    /// Menu to a fresh round.
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.transition(&[SessionState::Menu], SessionState::Playing, "start")?;
        self.reset_round();
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), TransitionError> {
        self.transition(&[SessionState::Playing], SessionState::Paused, "pause")
    }

    pub fn resume(&mut self) -> Result<(), TransitionError> {
        self.transition(&[SessionState::Paused], SessionState::Playing, "resume")
    }

    /// Game over straight into a fresh round.
    pub fn restart(&mut self) -> Result<(), TransitionError> {
        self.transition(&[SessionState::GameOver], SessionState::Playing, "restart")?;
        self.reset_round();
        Ok(())
    }

    pub fn to_menu(&mut self) -> Result<(), TransitionError> {
        self.transition(
            &[SessionState::Paused, SessionState::GameOver],
            SessionState::Menu,
            "return to menu",
        )
    }

    /// New arena, no actors, zero score, starting health, clock at zero.
    fn reset_round(&mut self) {
        self.world = SpatialWorld::arena(&self.config.arena, &mut self.rng);
        let health = Health::new(
            self.config.player.initial_health,
            self.config.player.max_health,
        );
        self.registry = EntityRegistry::new(health);
        self.clock.reset();
        self.score = 0;
        self.frame = 0;
        self.rounds += 1;
        self.events.clear();
        tracing::info!(round = self.rounds, "round started");
    }

    // ---- simulation ----

    /// Launch a projectile from the player's muzzle. No-op unless playing.
    pub fn fire(&mut self, speed: f32) -> Option<EntityId> {
        if self.state != SessionState::Playing {
            return None;
        }
        let player = &mut self.registry.player;
        player.apply_fire_kick(speed);
        let (origin, direction) = (player.muzzle(), player.front());
        let id = self.registry.spawn_projectile(origin, direction, speed);
        let strong = duskfall_input::is_strong_shot(speed);
        tracing::debug!(%id, speed, strong, "fired");
        self.events.push(GameEvent::Fire { strong });
        Some(id)
    }

    /// Advance one frame: clock, player, spawns, pickups, hostiles, combat.
    ///
    /// Movement constants are per frame; `elapsed` only drives the clock.
    pub fn frame(&mut self, elapsed: f32, intent: &FrameIntent) -> FrameOutcome {
        if self.state != SessionState::Playing {
            return FrameOutcome::Skipped(self.state);
        }
        let _span = tracing::debug_span!("frame", n = self.frame).entered();
        let delta = self.clock.tick(elapsed);
        let now = self.clock.seconds();
        self.frame += 1;

        self.update_player(intent);
        self.run_spawns(now);
        self.update_pickups(now);
        if self.update_hostiles(now) {
            return FrameOutcome::GameOver { score: self.score };
        }
        self.resolve_combat();
        self.registry.sweep_dead();

        FrameOutcome::Advanced { delta }
    }

    fn update_player(&mut self, intent: &FrameIntent) {
        let player = &mut self.registry.player;
        player.look(intent.look_delta.x, intent.look_delta.y);
        if intent.jump {
            player.jump();
        }
        if let Some(held) = intent.fire {
            self.fire(launch_speed(held));
        }
        let player = &mut self.registry.player;
        player.step(&intent.movement, &self.world);
        player.decay_effects();
    }

    fn run_spawns(&mut self, now: f32) {
        if let Some((kind, position)) = self.spawn.roll_hostile(self.score, &mut self.rng) {
            self.registry.spawn_hostile(kind, position, now, &mut self.rng);
        }
        if let Some(position) = self.spawn.roll_heart(&mut self.rng) {
            self.registry.spawn_pickup(position);
        }
    }

    fn update_pickups(&mut self, now: f32) {
        let player = &mut self.registry.player;
        for pickup in self.registry.pickups.iter_mut() {
            let before = player.health.current();
            if pickup.update(player.position, now, &mut player.health) {
                let healed = player.health.current() > before;
                tracing::debug!(id = %pickup.id, healed, "heart collected");
                self.events.push(GameEvent::HeartPickup {
                    pickup: pickup.id,
                    healed,
                });
            }
        }
    }

    /// Returns true when the player died and the frame must stop.
    fn update_hostiles(&mut self, now: f32) -> bool {
        let player_pos = self.registry.player.position;
        for i in 0..self.registry.hostiles.len() {
            let hostile = &mut self.registry.hostiles[i];
            match hostile.update(player_pos, now, &mut self.rng) {
                HostileStatus::Chasing { talk: Some(volume) } => {
                    self.events.push(GameEvent::HostileTalk {
                        hostile: hostile.id,
                        kind: hostile.kind,
                        volume,
                    });
                }
                HostileStatus::HitPlayer => {
                    let health = self.registry.player.health.damage();
                    tracing::info!(health, "player hit");
                    self.events.push(GameEvent::PlayerHit { health });
                    if health == 0 {
                        self.state = SessionState::GameOver;
                        tracing::info!(score = self.score, frame = self.frame, "game over");
                        self.events.push(GameEvent::GameOver { score: self.score });
                        return true;
                    }
                }
                HostileStatus::Chasing { talk: None } | HostileStatus::Inactive => {}
            }
        }
        false
    }

    fn resolve_combat(&mut self) {
        let report = self.combat.resolve(
            &mut self.registry.projectiles,
            &mut self.registry.hostiles,
            &self.world,
            &mut self.rng,
        );
        for death in &report.deaths {
            self.score += death.score;
            self.events.push(GameEvent::HostileDeath {
                hostile: death.id,
                kind: death.kind,
                has_death_cue: death.has_death_cue,
            });
            if death.drops_pickup {
                self.registry.drop_pickup(death.position);
            }
        }
    }

    /// FNV-1a over everything the simulation evolves. Equal seeds and equal
    /// intent sequences give equal hashes.
    pub fn state_hash(&self) -> u64 {
        let mut h = StateHasher::new();
        h.bytes(&[self.state as u8]);
        h.bytes(&self.frame.to_le_bytes());
        h.bytes(&self.score.to_le_bytes());
        h.f32(self.clock.seconds());

        let player = &self.registry.player;
        h.vec3(player.position);
        h.f32(player.yaw);
        h.f32(player.pitch);
        h.bytes(&player.health.current().to_le_bytes());

        for hostile in &self.registry.hostiles {
            h.bytes(&hostile.id.0.to_le_bytes());
            h.bytes(&[hostile.kind as u8, hostile.alive as u8]);
            h.bytes(&hostile.hit_points.to_le_bytes());
            h.vec3(hostile.position);
        }
        for projectile in &self.registry.projectiles {
            h.bytes(&projectile.id.0.to_le_bytes());
            h.bytes(&projectile.life.to_le_bytes());
            h.vec3(projectile.position);
            h.vec3(projectile.velocity);
        }
        for pickup in &self.registry.pickups {
            h.bytes(&pickup.id.0.to_le_bytes());
            h.vec3(pickup.position);
        }
        for tree in self.world.trees() {
            h.f32(tree.x);
            h.f32(tree.y);
        }
        h.finish()
    }
}

struct StateHasher(u64);

impl StateHasher {
    fn new() -> Self {
        Self(0xcbf2_9ce4_8422_2325) // FNV offset basis
    }

    fn bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(0x0100_0000_01b3);
        }
    }

    fn f32(&mut self, v: f32) {
        self.bytes(&v.to_le_bytes());
    }

    fn vec3(&mut self, v: glam::Vec3) {
        for c in v.to_array() {
            self.f32(c);
        }
    }

    fn finish(self) -> u64 {
        self.0
    }
}
