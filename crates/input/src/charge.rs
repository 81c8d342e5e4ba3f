/// Launch speed at which a charged shot becomes "strong".
pub const STRONG_SHOT_SPEED: f32 = 2.9;
/// Upper bound on launch speed, reached after a one-second charge.
pub const MAX_LAUNCH_SPEED: f32 = 3.0;
/// Charge time that fills the power bar.
pub const FULL_CHARGE_SECONDS: f32 = 1.0;

const BASE_LAUNCH_SPEED: f32 = 0.5;
const SPEED_PER_SECOND: f32 = 2.5;

/// Projectile launch speed for a charge held `duration` seconds.
///
/// `speed = min(3.0, 0.5 + duration * 2.5)`. Negative or non-finite
/// durations count as an instant release.
pub fn launch_speed(duration: f32) -> f32 {
    let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
    (BASE_LAUNCH_SPEED + duration * SPEED_PER_SECOND).min(MAX_LAUNCH_SPEED)
}

/// Whether a launch speed qualifies as a strong shot.
pub fn is_strong_shot(speed: f32) -> bool {
    speed >= STRONG_SHOT_SPEED
}

/// Tracks the charge-start / charge-release pair of the fire button.
///
/// Times are caller-supplied seconds on any monotonic clock.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChargeTrigger {
    started_at: Option<f64>,
}

impl ChargeTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_charging(&self) -> bool {
        self.started_at.is_some()
    }

    /// Start charging. A second start while already charging keeps the
    /// first start time.
    pub fn begin(&mut self, now: f64) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    /// Release the charge, returning the held duration in seconds.
    /// Returns `None` if no charge was in progress.
    pub fn release(&mut self, now: f64) -> Option<f32> {
        let start = self.started_at.take()?;
        Some((now - start).max(0.0) as f32)
    }

    /// Drop an in-progress charge without firing (pause, focus loss).
    pub fn cancel(&mut self) {
        self.started_at = None;
    }

    /// Fill fraction of the power bar in `[0, 1]`.
    pub fn fraction(&self, now: f64) -> f32 {
        match self.started_at {
            Some(start) => ((now - start).max(0.0) as f32 / FULL_CHARGE_SECONDS).min(1.0),
            None => 0.0,
        }
    }
}
