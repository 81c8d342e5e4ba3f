//! Input intent: raw device events are mapped elsewhere; the kernel only ever
//! sees the per-frame intent built here.
//!
//! # Invariants
//! - The kernel consumes intents, never raw key or mouse events.
//! - Edge-triggered intents (jump, fire) are consumed exactly once.

pub mod action;
pub mod charge;

pub use action::{Action, FrameIntent, IntentState, MoveIntent};
pub use charge::{
    ChargeTrigger, FULL_CHARGE_SECONDS, MAX_LAUNCH_SPEED, STRONG_SHOT_SPEED, is_strong_shot,
    launch_speed,
};
