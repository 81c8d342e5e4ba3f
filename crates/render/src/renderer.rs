use std::fmt::Write as _;

use crate::plan::FramePlan;
use crate::scene::{DrawLayer, Material, MeshKind};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("frame needs {requested} instances but the buffer holds {capacity}")]
    InstanceOverflow { capacity: usize, requested: usize },
    #[error("surface lost or outdated")]
    SurfaceLost,
    #[error("backend: {0}")]
    Backend(String),
}

/// Backend-agnostic frame consumer.
///
/// A renderer only reads the plan; world truth stays with the session.
pub trait Renderer {
    type Output;

    fn render(&mut self, plan: &FramePlan) -> Result<Self::Output, RenderError>;
}

/// Renders a plan as text. Used by the CLI and in tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

fn mesh_name(mesh: MeshKind) -> &'static str {
    match mesh {
        MeshKind::Floor => "floor",
        MeshKind::Wall => "wall",
        MeshKind::Tree => "tree",
        MeshKind::Projectile => "projectile",
        MeshKind::Heart => "heart",
        MeshKind::Hostile => "hostile",
        MeshKind::Skybox => "skybox",
        MeshKind::CelestialDisc => "disc",
        MeshKind::Weapon => "weapon",
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, plan: &FramePlan) -> Result<String, RenderError> {
        self.frames += 1;
        let mut out = String::new();
        let c = &plan.celestial;
        let eye = plan.camera.eye;
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "=== frame {} ({}) ===",
            self.frames,
            if c.is_daytime() { "day" } else { "night" }
        );
        let _ = writeln!(
            out,
            "sun: dir=({:.1}, {:.1}, {:.1}) light=({:.2}, {:.2}, {:.2}) sky=({:.2}, {:.2}, {:.2})",
            c.light_dir.x,
            c.light_dir.y,
            c.light_dir.z,
            c.light_color.x,
            c.light_color.y,
            c.light_color.z,
            c.sky_color.x,
            c.sky_color.y,
            c.sky_color.z
        );
        let _ = writeln!(
            out,
            "camera: eye=({:.1}, {:.1}, {:.1}) yaw={:.0} pitch={:.0}",
            eye.x, eye.y, eye.z, plan.camera.yaw, plan.camera.pitch
        );
        let _ = writeln!(
            out,
            "passes: shadow={} color={}",
            plan.shadow_pass.len(),
            plan.color_pass.len()
        );

        for layer in [DrawLayer::Sky, DrawLayer::Celestial, DrawLayer::World, DrawLayer::Hud] {
            for item in plan.layer(layer) {
                // Static scenery is summarised by the counts above.
                if item.entity.is_none() && layer == DrawLayer::World {
                    continue;
                }
                let p = item.model.w_axis;
                let tag = match item.material {
                    Material::Emissive { .. } => " emissive",
                    Material::Sky { .. } => " sky",
                    _ => "",
                };
                let id = item.entity.map(|id| id.to_string()).unwrap_or_default();
                let _ = writeln!(
                    out,
                    "  {:?} {}{} {} pos=({:.2}, {:.2}, {:.2})",
                    layer,
                    mesh_name(item.mesh),
                    tag,
                    id,
                    p.x,
                    p.y,
                    p.z
                );
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duskfall_input::FrameIntent;
    use duskfall_kernel::{GameSession, HostileKind, SessionConfig};
    use glam::Vec3;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn menu_session_still_renders() {
        let session = GameSession::new(SessionConfig::default());
        let plan = FramePlan::build(&session, 16.0 / 9.0);
        let mut renderer = DebugTextRenderer::new();
        let out = renderer.render(&plan).unwrap();
        assert!(out.contains("frame 1"));
        assert!(out.contains("skybox"));
        assert!(out.contains("weapon"));
        assert_eq!(renderer.frames(), 1);
    }

    #[test]
    fn actors_are_listed_with_ids() {
        let mut config = SessionConfig::with_seed(9);
        config.spawn.hostile_chance = 0.0;
        config.spawn.heart_chance = 0.0;
        let mut session = GameSession::new(config);
        session.start().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let id = session.registry_mut().spawn_hostile(
            HostileKind::Mini,
            Vec3::new(20.0, 0.6, 20.0),
            0.0,
            &mut rng,
        );
        session.frame(1.0 / 60.0, &FrameIntent::idle());
        let out = DebugTextRenderer::new()
            .render(&FramePlan::build(&session, 1.0))
            .unwrap();
        assert!(out.contains(&format!("hostile {id}")), "{out}");
        assert!(!out.contains(" tree "));
    }

    #[test]
    fn overflow_error_reads_well() {
        let err = RenderError::InstanceOverflow {
            capacity: 8,
            requested: 9,
        };
        assert_eq!(
            err.to_string(),
            "frame needs 9 instances but the buffer holds 8"
        );
    }
}
