use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::config::DayConfig;

/// Accumulated simulated time and the day-cycle phase derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldClock {
    elapsed: f64,
    day_length: f32,
    phase_offset: f32,
}

impl Default for WorldClock {
    fn default() -> Self {
        Self::new(&DayConfig::default())
    }
}

impl WorldClock {
    pub fn new(day: &DayConfig) -> Self {
        Self {
            elapsed: 0.0,
            day_length: day.day_length_seconds,
            phase_offset: day.phase_offset_seconds,
        }
    }

    /// Advance by `elapsed_seconds` of wall time and return the applied delta.
    ///
    /// Negative and non-finite inputs advance nothing.
    pub fn tick(&mut self, elapsed_seconds: f32) -> f32 {
        let delta = if elapsed_seconds.is_finite() {
            elapsed_seconds.max(0.0)
        } else {
            0.0
        };
        self.elapsed += delta as f64;
        delta
    }

    /// Seconds of simulated time since the last reset.
    pub fn seconds(&self) -> f32 {
        self.elapsed as f32
    }

    /// Day-cycle angle in radians: `((t + offset) / day_length) * 2π`.
    ///
    /// Not wrapped; callers feed it straight into `cos`/`sin`.
    pub fn phase(&self) -> f32 {
        (((self.elapsed + self.phase_offset as f64) / self.day_length as f64) * TAU as f64) as f32
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}
