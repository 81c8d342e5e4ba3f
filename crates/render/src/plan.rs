use duskfall_kernel::{CelestialState, GameSession};
use glam::{Mat4, Vec3};

use crate::camera::PlayerCamera;
use crate::light::LightSpace;
use crate::scene::{
    DrawItem, DrawLayer, RenderPass, celestial_items, draw_world, sky_item, weapon_item,
};

/// Everything a backend needs to draw one frame, in submission order.
///
/// Built once per frame after the simulation step; borrows nothing from
/// the session.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub celestial: CelestialState,
    pub light: LightSpace,
    pub camera: PlayerCamera,
    pub view: Mat4,
    pub sky_view: Mat4,
    pub projection: Mat4,
    pub clear_color: Vec3,
    /// Muzzle flash added to every lit world fragment.
    pub flash: f32,
    /// Depth-only draws from the light.
    pub shadow_pass: Vec<DrawItem>,
    /// Sky, discs, world, then HUD.
    pub color_pass: Vec<DrawItem>,
}

impl FramePlan {
    pub fn build(session: &GameSession, aspect: f32) -> Self {
        let _span = tracing::trace_span!("frame_plan").entered();
        let celestial = session.celestial();
        let player = &session.registry().player;
        let light = LightSpace::from_celestial(&celestial, player.position);
        let camera = PlayerCamera::from_player(player, aspect);

        let mut shadow_pass = Vec::new();
        draw_world(RenderPass::Shadow, session, &mut shadow_pass);

        let mut color_pass = Vec::with_capacity(shadow_pass.len() + 4);
        color_pass.push(sky_item(celestial.sky_tint));
        color_pass.extend(celestial_items(celestial.light_dir));
        draw_world(RenderPass::Color, session, &mut color_pass);
        color_pass.push(weapon_item(player.recoil));

        Self {
            celestial,
            light,
            view: camera.view_matrix(),
            sky_view: camera.sky_view_matrix(),
            projection: camera.projection_matrix(),
            camera,
            clear_color: celestial.sky_color,
            flash: player.flash,
            shadow_pass,
            color_pass,
        }
    }

    /// Color-pass draws in one layer, in order.
    pub fn layer(&self, layer: DrawLayer) -> impl Iterator<Item = &DrawItem> {
        self.color_pass.iter().filter(move |d| d.layer == layer)
    }

    pub fn draw_count(&self) -> usize {
        self.shadow_pass.len() + self.color_pass.len()
    }
}
