//! Game kernel: authoritative session state, per-frame simulation, day/night model.
//!
//! # Invariants
//! - All randomness flows from one seeded generator per session, so equal
//!   seeds and equal intent sequences give equal state hashes.
//! - All state mutations flow through [`GameSession`] operations; renderers
//!   and audio only read.
//! - Session transitions are checked once per frame; game over skips the rest
//!   of that frame.

pub mod actors;
pub mod celestial;
pub mod clock;
pub mod combat;
pub mod config;
pub mod events;
pub mod projectile;
pub mod registry;
pub mod session;
pub mod spatial;
pub mod spawn;

pub use actors::{
    Health, Hostile, HostileDeath, HostileKind, HostileProfile, HostileStatus, Pickup, Player,
};
pub use celestial::{CelestialModel, CelestialState};
pub use clock::WorldClock;
pub use combat::{CombatReport, CombatResolver, HitRecord};
pub use config::{ConfigError, SessionConfig};
pub use events::GameEvent;
pub use projectile::Projectile;
pub use registry::EntityRegistry;
pub use session::{FrameOutcome, GameSession, SessionState, TransitionError};
pub use spatial::{Obstacle, SpatialWorld};
pub use spawn::SpawnRules;
