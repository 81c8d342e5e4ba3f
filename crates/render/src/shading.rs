//! CPU reference for the lit fragment shader.
//!
//! The WGSL in the GPU backend mirrors these functions term for term; tests
//! pin the maths here where they are cheap to run.

use glam::{Vec2, Vec3};

pub const AMBIENT_STRENGTH: f32 = 0.3;
pub const SPECULAR_STRENGTH: f32 = 0.5;
pub const SHININESS: f32 = 32.0;
const MIN_BIAS: f32 = 0.005;

/// Depth bias against shadow acne, larger at grazing angles.
pub fn shadow_bias(n_dot_l: f32) -> f32 {
    (MIN_BIAS * (1.0 - n_dot_l)).max(MIN_BIAS)
}

/// Fraction of a 3x3 texel neighbourhood that is in shadow.
///
/// `coords` comes from [`crate::LightSpace::project`]. `closest_depth`
/// samples the shadow map at a texture-space position. Fragments past the
/// light's far plane are never shadowed.
pub fn pcf_shadow(
    coords: Vec3,
    bias: f32,
    texel_size: f32,
    closest_depth: impl Fn(Vec2) -> f32,
) -> f32 {
    if coords.z > 1.0 {
        return 0.0;
    }
    let mut shadow = 0.0;
    for y in -1..=1 {
        for x in -1..=1 {
            let offset = Vec2::new(x as f32, y as f32) * texel_size;
            let depth = closest_depth(Vec2::new(coords.x, coords.y) + offset);
            if coords.z - bias > depth {
                shadow += 1.0;
            }
        }
    }
    shadow / 9.0
}

/// Inputs for one lit fragment, all in world space.
#[derive(Debug, Clone, Copy)]
pub struct Fragment {
    pub position: Vec3,
    pub normal: Vec3,
    /// Texel times tint, or the tint alone for untextured draws.
    pub color: Vec3,
}

/// Per-frame lighting shared by every fragment.
#[derive(Debug, Clone, Copy)]
pub struct Lighting {
    pub light_position: Vec3,
    pub light_color: Vec3,
    pub view_position: Vec3,
    /// Muzzle flash added on top of everything.
    pub flash: f32,
}

/// Phong with shadowed direct light:
/// `ambient + (1 - shadow) * (diffuse + specular) + flash * color`.
pub fn shade(fragment: &Fragment, lighting: &Lighting, shadow: f32) -> Vec3 {
    let n = fragment.normal.normalize_or_zero();
    let l = (lighting.light_position - fragment.position).normalize_or_zero();
    let v = (lighting.view_position - fragment.position).normalize_or_zero();
    let r = reflect(-l, n);

    let ambient = AMBIENT_STRENGTH * fragment.color;
    let diffuse = n.dot(l).max(0.0) * lighting.light_color * fragment.color;
    let specular = SPECULAR_STRENGTH * v.dot(r).max(0.0).powf(SHININESS) * lighting.light_color;
    ambient + (1.0 - shadow.clamp(0.0, 1.0)) * (diffuse + specular) + lighting.flash * fragment.color
}

fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * normal.dot(incident) * normal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lighting() -> Lighting {
        Lighting {
            light_position: Vec3::new(0.0, 100.0, 0.0),
            light_color: Vec3::ONE,
            view_position: Vec3::new(0.0, 10.0, 10.0),
            flash: 0.0,
        }
    }

    fn floor_fragment() -> Fragment {
        Fragment {
            position: Vec3::ZERO,
            normal: Vec3::Y,
            color: Vec3::splat(0.5),
        }
    }

    #[test]
    fn bias_grows_at_grazing_angles() {
        assert_eq!(shadow_bias(1.0), 0.005);
        assert!((shadow_bias(0.0) - 0.005).abs() < 1e-7);
        assert!((shadow_bias(-1.0) - 0.01).abs() < 1e-7);
    }

    #[test]
    fn pcf_counts_occluded_taps() {
        let lit = pcf_shadow(Vec3::new(0.5, 0.5, 0.4), 0.005, 1.0 / 2048.0, |_| 1.0);
        assert_eq!(lit, 0.0);
        let dark = pcf_shadow(Vec3::new(0.5, 0.5, 0.4), 0.005, 1.0 / 2048.0, |_| 0.1);
        assert_eq!(dark, 1.0);
        // Occluder covers only the left column of taps.
        let edge = pcf_shadow(Vec3::new(0.5, 0.5, 0.4), 0.005, 0.01, |uv| {
            if uv.x < 0.495 { 0.1 } else { 1.0 }
        });
        assert!((edge - 3.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn beyond_far_plane_is_lit() {
        assert_eq!(pcf_shadow(Vec3::new(0.5, 0.5, 1.2), 0.005, 0.001, |_| 0.0), 0.0);
    }

    #[test]
    fn full_shadow_leaves_ambient_only() {
        let c = shade(&floor_fragment(), &lighting(), 1.0);
        assert!((c - Vec3::splat(0.15)).length() < 1e-5);
    }

    #[test]
    fn direct_light_adds_diffuse() {
        let lit = shade(&floor_fragment(), &lighting(), 0.0);
        // ambient 0.15 + diffuse 0.5, specular negligible from this angle.
        assert!(lit.x > 0.64 && lit.x < 0.7, "{lit}");
    }

    #[test]
    fn flash_brightens_even_in_shadow() {
        let mut l = lighting();
        l.flash = 1.0;
        let c = shade(&floor_fragment(), &l, 1.0);
        assert!((c - Vec3::splat(0.65)).length() < 1e-5);
    }
}
