use duskfall_common::EntityId;
use serde::{Deserialize, Serialize};

use crate::actors::HostileKind;

/// Something the audio or UI layer may want to react to.
///
/// Events are plain data; the session never plays sounds or touches UI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A hostile's talk timer fired. `volume` is in `[0, 1]`.
    HostileTalk {
        hostile: EntityId,
        kind: HostileKind,
        volume: f32,
    },
    HostileDeath {
        hostile: EntityId,
        kind: HostileKind,
        has_death_cue: bool,
    },
    Fire { strong: bool },
    /// A hostile reached the player. `health` is what is left.
    PlayerHit { health: u32 },
    GameOver { score: u32 },
    HeartPickup { pickup: EntityId, healed: bool },
}

impl GameEvent {
    /// Short tag for logs and the CLI.
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::HostileTalk { .. } => "hostile_talk",
            GameEvent::HostileDeath { .. } => "hostile_death",
            GameEvent::Fire { .. } => "fire",
            GameEvent::PlayerHit { .. } => "player_hit",
            GameEvent::GameOver { .. } => "game_over",
            GameEvent::HeartPickup { .. } => "heart_pickup",
        }
    }
}
