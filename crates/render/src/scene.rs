//! What to draw, independent of how.
//!
//! # Invariants
//! - [`draw_world`] emits the same meshes with the same transforms in the
//!   same order for both passes; only materials differ.
//! - Sky, celestial discs and the HUD weapon are never emitted by
//!   [`draw_world`], so they can never cast shadows.

use duskfall_common::EntityId;
use duskfall_kernel::GameSession;
use glam::{Mat4, Quat, Vec2, Vec3};

/// Which of the two passes a traversal feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPass {
    /// Depth only, from the light.
    Shadow,
    /// Lit color, from the camera.
    Color,
}

/// Geometry a draw refers to. Backends map each to a loaded mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Floor,
    /// Unit cube scaled to the wall's extents.
    Wall,
    /// Multi-part model, one texture per part.
    Tree,
    /// Sphere of the projectile's radius.
    Projectile,
    Heart,
    Hostile,
    /// Unit cube sampled as a cubemap.
    Skybox,
    /// Unit sphere for the sun and moon.
    CelestialDisc,
    Weapon,
}

/// Texture a lit draw samples. Backends fall back to flat gray when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Grass,
    Wall,
    /// Per-part textures come from the tree's material table.
    Tree,
    Hostile,
    Weapon,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Depth-only caster in the shadow pass.
    ShadowCaster,
    /// Phong-lit and shadowed.
    Lit {
        tint: Vec3,
        texture: Option<TextureSlot>,
        uv_scale: Vec2,
    },
    /// Flat color, unaffected by light.
    Emissive { color: Vec3 },
    /// Cubemap texel times tint.
    Sky { tint: Vec3 },
}

/// Depth and view handling for a group of draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DrawLayer {
    /// Translation-free view, depth test `LessEqual` at the far plane.
    Sky,
    /// Translation-free view.
    Celestial,
    /// Camera view, shadowed.
    World,
    /// Identity view, depth test off.
    Hud,
}

/// One mesh instance to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub mesh: MeshKind,
    pub model: Mat4,
    pub material: Material,
    pub layer: DrawLayer,
    /// The simulated actor behind the draw, if any.
    pub entity: Option<EntityId>,
}

/// Receives draws in submission order.
pub trait DrawSink {
    fn submit(&mut self, item: DrawItem);
}

impl DrawSink for Vec<DrawItem> {
    fn submit(&mut self, item: DrawItem) {
        self.push(item);
    }
}

pub const FLOOR_UV_SCALE: f32 = 50.0;
pub const WALL_UV_SCALE: Vec2 = Vec2::new(20.0, 1.0);
/// Trees are modelled lying down and small.
pub const TREE_SCALE: f32 = 5.0;
/// Hostile models are drawn larger than their collision scale.
pub const HOSTILE_DRAW_SCALE: f32 = 1.8;
pub const HEART_SCALE: f32 = 0.5;
pub const HEART_COLOR: Vec3 = Vec3::new(1.0, 0.0, 0.0);

/// Emit every shadow-casting world object: ground, walls, trees,
/// projectiles, hearts, hostiles.
pub fn draw_world(pass: RenderPass, session: &GameSession, sink: &mut impl DrawSink) {
    let lit = |tint: Vec3, texture: Option<TextureSlot>, uv_scale: Vec2| match pass {
        RenderPass::Shadow => Material::ShadowCaster,
        RenderPass::Color => Material::Lit {
            tint,
            texture,
            uv_scale,
        },
    };
    let mut emit = |mesh, model, material, entity| {
        sink.submit(DrawItem {
            mesh,
            model,
            material,
            layer: DrawLayer::World,
            entity,
        })
    };

    emit(
        MeshKind::Floor,
        Mat4::IDENTITY,
        lit(Vec3::ONE, Some(TextureSlot::Grass), Vec2::splat(FLOOR_UV_SCALE)),
        None,
    );

    let world = session.world();
    for (center, size) in world.walls() {
        emit(
            MeshKind::Wall,
            Mat4::from_translation(center) * Mat4::from_scale(size),
            lit(Vec3::ONE, Some(TextureSlot::Wall), WALL_UV_SCALE),
            None,
        );
    }

    for tree in world.trees() {
        let model = Mat4::from_scale_rotation_translation(
            Vec3::splat(TREE_SCALE),
            Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2),
            Vec3::new(tree.x, 0.0, tree.y),
        );
        emit(
            MeshKind::Tree,
            model,
            lit(Vec3::ONE, Some(TextureSlot::Tree), Vec2::ONE),
            None,
        );
    }

    let registry = session.registry();
    for projectile in &registry.projectiles {
        emit(
            MeshKind::Projectile,
            Mat4::from_translation(projectile.position),
            lit(projectile.tint(), None, Vec2::ONE),
            Some(projectile.id),
        );
    }

    for heart in registry.live_pickups() {
        let model = Mat4::from_scale_rotation_translation(
            Vec3::splat(HEART_SCALE),
            Quat::from_rotation_y(heart.spin),
            heart.position,
        );
        emit(
            MeshKind::Heart,
            model,
            lit(HEART_COLOR, None, Vec2::ONE),
            Some(heart.id),
        );
    }

    let eye = registry.player.position;
    for hostile in registry.live_hostiles() {
        let facing = (eye.x - hostile.position.x).atan2(eye.z - hostile.position.z);
        let model = Mat4::from_scale_rotation_translation(
            Vec3::splat(hostile.scale() * HOSTILE_DRAW_SCALE),
            Quat::from_rotation_y(facing),
            hostile.position,
        );
        emit(
            MeshKind::Hostile,
            model,
            lit(
                hostile.profile().tint,
                Some(TextureSlot::Hostile),
                Vec2::ONE,
            ),
            Some(hostile.id),
        );
    }
}

pub const SUN_SCALE: f32 = 20.0;
pub const SUN_COLOR: Vec3 = Vec3::new(1.0, 1.0, 0.8);
pub const MOON_SCALE: f32 = 15.0;
pub const MOON_COLOR: Vec3 = Vec3::ONE;

/// Skybox cube tinted for the time of day.
pub fn sky_item(tint: Vec3) -> DrawItem {
    DrawItem {
        mesh: MeshKind::Skybox,
        model: Mat4::IDENTITY,
        material: Material::Sky { tint },
        layer: DrawLayer::Sky,
        entity: None,
    }
}

/// Sun at `light_dir` and moon opposite, in sky space.
pub fn celestial_items(light_dir: Vec3) -> [DrawItem; 2] {
    let disc = |position: Vec3, scale: f32, color: Vec3| DrawItem {
        mesh: MeshKind::CelestialDisc,
        model: Mat4::from_translation(position) * Mat4::from_scale(Vec3::splat(scale)),
        material: Material::Emissive { color },
        layer: DrawLayer::Celestial,
        entity: None,
    };
    [
        disc(light_dir, SUN_SCALE, SUN_COLOR),
        disc(-light_dir, MOON_SCALE, MOON_COLOR),
    ]
}

/// First-person weapon in view space, kicked back by `recoil`.
pub fn weapon_item(recoil: f32) -> DrawItem {
    let model = Mat4::from_translation(Vec3::new(0.65, -0.25, -0.6))
        * Mat4::from_translation(Vec3::new(
            0.4,
            -0.15 + recoil * 0.05,
            -0.5 + recoil * 0.1,
        ))
        * Mat4::from_rotation_y(std::f32::consts::PI / 1.05)
        * Mat4::from_rotation_x(0.1)
        * Mat4::from_scale(Vec3::splat(0.04));
    DrawItem {
        mesh: MeshKind::Weapon,
        model,
        material: Material::Lit {
            tint: Vec3::ONE,
            texture: Some(TextureSlot::Weapon),
            uv_scale: Vec2::ONE,
        },
        layer: DrawLayer::Hud,
        entity: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duskfall_kernel::{HostileKind, SessionConfig};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn session_with_hostile(at: Vec3) -> GameSession {
        let mut session = GameSession::new(SessionConfig::with_seed(4));
        session.start().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        session
            .registry_mut()
            .spawn_hostile(HostileKind::Normal, at, 0.0, &mut rng);
        session
    }

    #[test]
    fn shadow_items_are_casters_and_color_items_are_lit() {
        let session = session_with_hostile(Vec3::new(5.0, 0.8, 0.0));
        let mut shadow = Vec::new();
        let mut color = Vec::new();
        draw_world(RenderPass::Shadow, &session, &mut shadow);
        draw_world(RenderPass::Color, &session, &mut color);
        assert_eq!(shadow.len(), color.len());
        assert!(shadow.iter().all(|d| d.material == Material::ShadowCaster));
        assert!(color.iter().all(|d| matches!(d.material, Material::Lit { .. })));
        assert_eq!(color[0].mesh, MeshKind::Floor);
    }

    #[test]
    fn hostile_faces_the_player() {
        let session = session_with_hostile(Vec3::new(5.0, 0.8, 0.0));
        let mut color = Vec::new();
        draw_world(RenderPass::Color, &session, &mut color);
        let item = color
            .iter()
            .find(|d| d.mesh == MeshKind::Hostile)
            .unwrap();
        // Model +Z maps toward the player at the origin.
        let facing = item.model.transform_vector3(Vec3::Z).normalize();
        assert!((facing - Vec3::NEG_X).length() < 1e-4, "{facing}");
    }

    #[test]
    fn hostile_draw_uses_profile_tint_and_scale() {
        let session = session_with_hostile(Vec3::new(0.0, 0.8, 8.0));
        let mut color = Vec::new();
        draw_world(RenderPass::Color, &session, &mut color);
        let item = color.iter().find(|d| d.mesh == MeshKind::Hostile).unwrap();
        let profile = HostileKind::Normal.profile();
        let (scale, _, _) = item.model.to_scale_rotation_translation();
        assert!((scale.x - profile.scale * HOSTILE_DRAW_SCALE).abs() < 1e-4);
        match item.material {
            Material::Lit { tint, texture, .. } => {
                assert_eq!(tint, profile.tint);
                assert_eq!(texture, Some(TextureSlot::Hostile));
            }
            other => panic!("unexpected material {other:?}"),
        }
    }

    #[test]
    fn floor_and_walls_tile_their_textures() {
        let session = session_with_hostile(Vec3::new(0.0, 0.8, 8.0));
        let mut color = Vec::new();
        draw_world(RenderPass::Color, &session, &mut color);
        let uv = |mesh| {
            color.iter().find(|d| d.mesh == mesh).map(|d| match d.material {
                Material::Lit { uv_scale, .. } => uv_scale,
                _ => Vec2::ZERO,
            })
        };
        assert_eq!(uv(MeshKind::Floor), Some(Vec2::splat(50.0)));
        assert_eq!(uv(MeshKind::Wall), Some(Vec2::new(20.0, 1.0)));
        assert_eq!(color.iter().filter(|d| d.mesh == MeshKind::Wall).count(), 4);
    }

    #[test]
    fn weapon_kicks_back_with_recoil() {
        let rest = weapon_item(0.0).model.transform_point3(Vec3::ZERO);
        let kicked = weapon_item(1.0).model.transform_point3(Vec3::ZERO);
        assert!(kicked.z > rest.z);
        assert!(kicked.y > rest.y);
        assert_eq!(weapon_item(0.0).layer, DrawLayer::Hud);
    }
}
