use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::charge::ChargeTrigger;

/// Degrees of view rotation per unit of raw pointer motion.
pub const LOOK_SENSITIVITY_DEGREES: f32 = 0.1;

/// A discrete action produced by the platform layer.
///
/// The kernel never sees these directly; they are folded into a
/// [`FrameIntent`] by [`IntentState`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Hold or release "move forward".
    Forward(bool),
    /// Hold or release "move back".
    Back(bool),
    /// Hold or release "strafe left".
    StrafeLeft(bool),
    /// Hold or release "strafe right".
    StrafeRight(bool),
    /// Raw pointer motion in device units.
    Look { dx: f32, dy: f32 },
    /// Jump edge.
    Jump,
    /// Fire button pressed: start charging.
    ChargeStart,
    /// Fire button released: launch with the held charge.
    ChargeRelease,
    /// No-op (used for input mapping that hasn't been bound yet).
    Noop,
}

/// Held movement keys for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveIntent {
    /// Forward/strafe axes in `[-1, 1]`: `x` is strafe right, `y` forward.
    pub fn axes(&self) -> Vec2 {
        let axis = |pos: bool, neg: bool| (pos as i8 - neg as i8) as f32;
        Vec2::new(axis(self.right, self.left), axis(self.forward, self.back))
    }

    pub fn is_idle(&self) -> bool {
        self.axes() == Vec2::ZERO
    }
}

/// Everything the simulation consumes from input for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameIntent {
    pub movement: MoveIntent,
    /// View rotation in degrees: `x` yaw delta, `y` pitch delta.
    pub look_delta: Vec2,
    pub jump: bool,
    /// Charge duration in seconds when the fire button was released.
    pub fire: Option<f32>,
}

impl FrameIntent {
    /// An intent that does nothing.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Remove the edge-triggered parts, keeping held movement.
    pub fn without_edges(&self) -> Self {
        Self {
            movement: self.movement,
            ..Self::default()
        }
    }
}

/// Accumulates actions between frames and hands out one [`FrameIntent`]
/// per frame.
#[derive(Debug, Clone, Default)]
pub struct IntentState {
    movement: MoveIntent,
    look: Vec2,
    jump: bool,
    fire: Option<f32>,
    charge: ChargeTrigger,
}

impl IntentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one action into the pending intent. `now` is seconds on the
    /// caller's monotonic clock.
    pub fn apply(&mut self, action: Action, now: f64) {
        match action {
            Action::Forward(held) => self.movement.forward = held,
            Action::Back(held) => self.movement.back = held,
            Action::StrafeLeft(held) => self.movement.left = held,
            Action::StrafeRight(held) => self.movement.right = held,
            Action::Look { dx, dy } => {
                self.look.x += dx * LOOK_SENSITIVITY_DEGREES;
                self.look.y -= dy * LOOK_SENSITIVITY_DEGREES;
            }
            Action::Jump => self.jump = true,
            Action::ChargeStart => self.charge.begin(now),
            Action::ChargeRelease => {
                if let Some(held) = self.charge.release(now) {
                    tracing::trace!(held, "charge released");
                    self.fire = Some(held);
                }
            }
            Action::Noop => {}
        }
    }

    pub fn charge(&self) -> &ChargeTrigger {
        &self.charge
    }

    /// Take the intent for this frame, clearing edges and look delta.
    pub fn take_frame(&mut self) -> FrameIntent {
        let intent = FrameIntent {
            movement: self.movement,
            look_delta: self.look,
            jump: self.jump,
            fire: self.fire,
        };
        self.look = Vec2::ZERO;
        self.jump = false;
        self.fire = None;
        intent
    }

    /// Forget held keys and any charge in progress (pause, focus loss).
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_axes() {
        let intent = MoveIntent {
            forward: true,
            left: true,
            ..MoveIntent::default()
        };
        assert_eq!(intent.axes(), Vec2::new(-1.0, 1.0));
        let cancel = MoveIntent {
            forward: true,
            back: true,
            ..MoveIntent::default()
        };
        assert!(cancel.is_idle());
    }

    #[test]
    fn edges_are_consumed_once() {
        let mut state = IntentState::new();
        state.apply(Action::Jump, 0.0);
        state.apply(Action::ChargeStart, 0.0);
        state.apply(Action::ChargeRelease, 0.4);
        let first = state.take_frame();
        assert!(first.jump);
        assert!((first.fire.unwrap() - 0.4).abs() < 1e-6);
        let second = state.take_frame();
        assert!(!second.jump);
        assert_eq!(second.fire, None);
    }

    #[test]
    fn held_movement_persists_across_frames() {
        let mut state = IntentState::new();
        state.apply(Action::Forward(true), 0.0);
        assert!(state.take_frame().movement.forward);
        assert!(state.take_frame().movement.forward);
        state.apply(Action::Forward(false), 0.0);
        assert!(!state.take_frame().movement.forward);
    }

    #[test]
    fn look_accumulates_in_degrees() {
        let mut state = IntentState::new();
        state.apply(Action::Look { dx: 10.0, dy: 5.0 }, 0.0);
        state.apply(Action::Look { dx: 10.0, dy: 5.0 }, 0.0);
        let intent = state.take_frame();
        assert!((intent.look_delta.x - 2.0).abs() < 1e-6);
        assert!((intent.look_delta.y + 1.0).abs() < 1e-6);
        assert_eq!(state.take_frame().look_delta, Vec2::ZERO);
    }

    #[test]
    fn release_without_start_does_not_fire() {
        let mut state = IntentState::new();
        state.apply(Action::ChargeRelease, 1.0);
        assert_eq!(state.take_frame().fire, None);
    }

    #[test]
    fn without_edges_keeps_movement() {
        let intent = FrameIntent {
            movement: MoveIntent {
                back: true,
                ..MoveIntent::default()
            },
            look_delta: Vec2::ONE,
            jump: true,
            fire: Some(1.0),
        };
        let held = intent.without_edges();
        assert!(held.movement.back);
        assert!(!held.jump);
        assert_eq!(held.fire, None);
        assert_eq!(held.look_delta, Vec2::ZERO);
    }
}
