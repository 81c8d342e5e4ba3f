use duskfall_kernel::CelestialState;
use glam::{Mat4, Vec3};

/// Half extent of the orthographic shadow frustum.
pub const SHADOW_EXTENT: f32 = 120.0;
pub const SHADOW_NEAR: f32 = 1.0;
pub const SHADOW_FAR: f32 = 600.0;
/// Side of the square shadow depth target, in texels.
pub const SHADOW_MAP_SIZE: u32 = 2048;

/// Transform from world space into the sun's clip space, shared by both
/// render passes of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSpace {
    /// Where the light looks from: `focus + light_dir`.
    pub eye: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
    pub matrix: Mat4,
}

impl LightSpace {
    /// Orthographic light looking from `focus + light_dir` at `focus`.
    ///
    /// Uses +Y as up unless the light is (nearly) vertical, then +Z.
    pub fn new(light_dir: Vec3, focus: Vec3) -> Self {
        let eye = focus + light_dir;
        let up = if light_dir.normalize_or_zero().dot(Vec3::Y).abs() > 0.999 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(eye, focus, up);
        let projection = Mat4::orthographic_rh(
            -SHADOW_EXTENT,
            SHADOW_EXTENT,
            -SHADOW_EXTENT,
            SHADOW_EXTENT,
            SHADOW_NEAR,
            SHADOW_FAR,
        );
        Self {
            eye,
            view,
            projection,
            matrix: projection * view,
        }
    }

    pub fn from_celestial(celestial: &CelestialState, focus: Vec3) -> Self {
        Self::new(celestial.light_dir, focus)
    }

    /// Shadow-map lookup coordinates for a world point: `xy` in `[0, 1]`
    /// texture space (y down), `z` the depth the shadow pass would store.
    pub fn project(&self, world: Vec3) -> Vec3 {
        let clip = self.matrix.project_point3(world);
        Vec3::new(clip.x * 0.5 + 0.5, 1.0 - (clip.y * 0.5 + 0.5), clip.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duskfall_kernel::CelestialModel;

    #[test]
    fn focus_projects_to_map_center() {
        let light = LightSpace::new(Vec3::new(200.0, 200.0, 30.0), Vec3::new(5.0, 1.7, -3.0));
        let p = light.project(Vec3::new(5.0, 1.7, -3.0));
        assert!((p.x - 0.5).abs() < 1e-4 && (p.y - 0.5).abs() < 1e-4);
        assert!(p.z > 0.0 && p.z < 1.0);
    }

    #[test]
    fn vertical_light_is_finite() {
        let noon = CelestialModel::new().sample(std::f32::consts::FRAC_PI_2);
        let light = LightSpace::from_celestial(
            &CelestialState {
                light_dir: Vec3::new(0.0, 300.0, 0.0),
                ..noon
            },
            Vec3::ZERO,
        );
        assert!(!light.matrix.is_nan());
        let p = light.project(Vec3::new(1.0, 0.0, 1.0));
        assert!(p.is_finite());
    }

    #[test]
    fn closer_to_light_is_shallower() {
        let light = LightSpace::new(Vec3::new(0.0, 300.0, 50.0), Vec3::ZERO);
        let high = light.project(Vec3::new(0.0, 10.0, 0.0));
        let low = light.project(Vec3::ZERO);
        assert!(high.z < low.z);
    }

    #[test]
    fn beyond_far_plane_is_past_one() {
        let light = LightSpace::new(Vec3::new(0.0, 300.0, 50.0), Vec3::ZERO);
        let dir = Vec3::new(0.0, 300.0, 50.0).normalize();
        let far_point = light.eye - dir * (SHADOW_FAR + 10.0);
        assert!(light.project(far_point).z > 1.0);
    }
}
