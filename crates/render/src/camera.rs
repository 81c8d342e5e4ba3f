use duskfall_kernel::Player;
use glam::{Mat4, Vec3, Vec4};

/// First-person camera derived from the player each frame.
///
/// Camera motion is owned by the kernel's player controller; this type only
/// turns it into matrices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerCamera {
    pub eye: Vec3,
    /// Degrees.
    pub yaw: f32,
    /// Degrees.
    pub pitch: f32,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PlayerCamera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 1.7, 0.0),
            yaw: -90.0,
            pitch: 0.0,
            fov: 60.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl PlayerCamera {
    pub fn from_player(player: &Player, aspect: f32) -> Self {
        Self {
            eye: player.position,
            yaw: player.yaw,
            pitch: player.pitch,
            aspect: if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 },
            ..Self::default()
        }
    }

    pub fn forward(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.eye + self.forward(), Vec3::Y)
    }

    /// View with the translation removed, for geometry pinned to the sky.
    pub fn sky_view_matrix(&self) -> Mat4 {
        let mut view = self.view_matrix();
        view.w_axis = Vec4::W;
        view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duskfall_kernel::Health;

    #[test]
    fn follows_player() {
        let mut player = Player::new(Health::new(2, 5));
        player.position = Vec3::new(3.0, 1.7, -4.0);
        player.yaw = 0.0;
        let cam = PlayerCamera::from_player(&player, 2.0);
        assert_eq!(cam.eye, player.position);
        assert!((cam.forward() - Vec3::X).length() < 1e-5);
        assert_eq!(cam.aspect, 2.0);
    }

    #[test]
    fn sky_view_has_no_translation() {
        let cam = PlayerCamera {
            eye: Vec3::new(10.0, 5.0, -3.0),
            ..PlayerCamera::default()
        };
        let sky = cam.sky_view_matrix();
        assert_eq!(sky.transform_point3(Vec3::ZERO), Vec3::ZERO);
        // Rotation part matches the full view.
        let dir = Vec3::new(0.3, 0.2, -1.0);
        let a = sky.transform_vector3(dir);
        let b = cam.view_matrix().transform_vector3(dir);
        assert!((a - b).length() < 1e-5);
    }

    #[test]
    fn bad_aspect_falls_back() {
        let player = Player::new(Health::new(2, 5));
        assert_eq!(PlayerCamera::from_player(&player, 0.0).aspect, 1.0);
        assert!(!PlayerCamera::from_player(&player, f32::NAN)
            .view_projection()
            .is_nan());
    }
}
