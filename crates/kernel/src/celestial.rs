//! Time of day to lighting.
//!
//! The sun travels a tilted circle of radius 300 around the player. Its height
//! picks one of three bands: night, twilight (night blending into dusk), and
//! daylight (dusk blending into full day). Every band edge is continuous.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Radius of the sun's orbit.
pub const ORBIT_RADIUS: f32 = 300.0;
/// Tilt of the orbit along z.
pub const ORBIT_TILT: f32 = 50.0;

/// Sun height above which the daylight band starts.
const DAYLIGHT_FLOOR: f32 = -50.0;
/// Sun height span over which dusk becomes full day.
const DAYLIGHT_SPAN: f32 = 100.0;
/// Sun height below which night holds flat.
const TWILIGHT_FLOOR: f32 = -100.0;

/// One set of lighting colors.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Palette {
    sky: Vec3,
    light: Vec3,
    tint: Vec3,
}

const NIGHT: Palette = Palette {
    sky: Vec3::new(0.05, 0.05, 0.1),
    light: Vec3::new(0.2, 0.3, 0.5),
    tint: Vec3::new(0.1, 0.1, 0.2),
};

const DUSK: Palette = Palette {
    sky: Vec3::new(0.8, 0.4, 0.2),
    light: Vec3::new(0.8, 0.5, 0.2),
    tint: Vec3::new(1.0, 0.8, 0.6),
};

const DAY: Palette = Palette {
    sky: Vec3::new(0.5, 0.7, 0.9),
    light: Vec3::new(1.2, 1.1, 0.9),
    tint: Vec3::ONE,
};

impl Palette {
    fn lerp(&self, other: &Palette, t: f32) -> Palette {
        Palette {
            sky: self.sky.lerp(other.sky, t),
            light: self.light.lerp(other.light, t),
            tint: self.tint.lerp(other.tint, t),
        }
    }
}

/// Lighting derived from the day phase. Never stored; recomputed per frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CelestialState {
    /// Direction towards the sun, unnormalized (length about 300).
    pub light_dir: Vec3,
    pub light_color: Vec3,
    /// Clear color behind the skybox.
    pub sky_color: Vec3,
    /// Multiplier applied to skybox texels.
    pub sky_tint: Vec3,
}

impl CelestialState {
    /// Height of the sun relative to the player.
    pub fn sun_height(&self) -> f32 {
        self.light_dir.y
    }

    pub fn is_daytime(&self) -> bool {
        self.sun_height() > 0.0
    }

    pub fn sun_position(&self) -> Vec3 {
        self.light_dir
    }

    /// The moon sits opposite the sun.
    pub fn moon_position(&self) -> Vec3 {
        -self.light_dir
    }
}

/// Maps a day-cycle phase to a [`CelestialState`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CelestialModel;

impl CelestialModel {
    pub fn new() -> Self {
        Self
    }

    /// Pure function of `phase` (radians, any range).
    pub fn sample(&self, phase: f32) -> CelestialState {
        let (sin, cos) = phase.sin_cos();
        let light_dir = Vec3::new(cos * ORBIT_RADIUS, sin * ORBIT_RADIUS, cos * ORBIT_TILT);
        let palette = Self::palette_for_height(light_dir.y);
        CelestialState {
            light_dir,
            light_color: palette.light,
            sky_color: palette.sky,
            sky_tint: palette.tint,
        }
    }

    fn palette_for_height(h: f32) -> Palette {
        if h > DAYLIGHT_FLOOR {
            let t = ((h - DAYLIGHT_FLOOR) / DAYLIGHT_SPAN).clamp(0.0, 1.0);
            if t < 0.5 { DUSK.lerp(&DAY, t * 2.0) } else { DAY }
        } else if h > TWILIGHT_FLOOR {
            let t = (h - TWILIGHT_FLOOR) / (DAYLIGHT_FLOOR - TWILIGHT_FLOOR);
            NIGHT.lerp(&DUSK, t)
        } else {
            NIGHT
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI, TAU};

    fn close(a: Vec3, b: Vec3, eps: f32) -> bool {
        (a - b).abs().max_element() <= eps
    }

    /// Phase at which the sun height equals `h` on the rising half.
    fn phase_for_height(h: f32) -> f32 {
        (h / ORBIT_RADIUS).asin()
    }

    #[test]
    fn noon_is_full_day() {
        let s = CelestialModel::new().sample(FRAC_PI_2);
        assert!(close(s.light_dir, Vec3::new(0.0, 300.0, 0.0), 1e-3));
        assert_eq!(s.sky_color, DAY.sky);
        assert_eq!(s.light_color, DAY.light);
        assert_eq!(s.sky_tint, Vec3::ONE);
        assert!(s.is_daytime());
    }

    #[test]
    fn midnight_is_night() {
        let s = CelestialModel::new().sample(-FRAC_PI_2);
        assert_eq!(s.sky_color, NIGHT.sky);
        assert_eq!(s.light_color, NIGHT.light);
        assert_eq!(s.sky_tint, NIGHT.tint);
        assert!(!s.is_daytime());
    }

    #[test]
    fn horizon_is_halfway_dusk() {
        // h = 0 gives t = 0.5, the first fully-day sample.
        let s = CelestialModel::new().sample(0.0);
        assert!(close(s.sky_color, DAY.sky, 1e-5));
        let s = CelestialModel::new().sample(phase_for_height(-25.0));
        // t = 0.25 -> halfway between dusk and day.
        assert!(close(s.sky_color, DUSK.sky.lerp(DAY.sky, 0.5), 1e-3));
    }

    #[test]
    fn sample_is_pure() {
        let model = CelestialModel::new();
        for i in 0..64 {
            let phase = i as f32 * 0.37;
            assert_eq!(model.sample(phase), model.sample(phase));
        }
        // Whole turns land on the same state up to float error.
        let a = model.sample(1.0);
        let b = model.sample(1.0 + TAU);
        assert!(close(a.sky_color, b.sky_color, 1e-3));
    }

    #[test]
    fn moon_opposes_sun() {
        let s = CelestialModel::new().sample(PI / 3.0);
        assert_eq!(s.moon_position(), -s.sun_position());
    }

    #[test]
    fn band_edges_are_continuous() {
        let model = CelestialModel::new();
        for edge in [DAYLIGHT_FLOOR, TWILIGHT_FLOOR, 0.0] {
            let below = model.sample(phase_for_height(edge - 0.01));
            let above = model.sample(phase_for_height(edge + 0.01));
            assert!(close(below.sky_color, above.sky_color, 1e-3), "sky pops at {edge}");
            assert!(close(below.light_color, above.light_color, 1e-3), "light pops at {edge}");
            assert!(close(below.sky_tint, above.sky_tint, 1e-3), "tint pops at {edge}");
        }
    }

    #[test]
    fn whole_day_has_no_large_steps() {
        let model = CelestialModel::new();
        let steps = 7200;
        let mut prev = model.sample(0.0);
        for i in 1..=steps {
            let next = model.sample(i as f32 / steps as f32 * TAU);
            assert!(close(prev.sky_color, next.sky_color, 0.02));
            assert!(close(prev.sky_tint, next.sky_tint, 0.02));
            prev = next;
        }
    }
}
