//! wgpu backend for arena frame plans.
//!
//! Two passes per frame: a 2048x2048 depth-only shadow pass from the sun,
//! then the color pass (sky, sun and moon, lit world, HUD weapon).
//!
//! # Invariants
//! - The renderer only reads the [`duskfall_render::FramePlan`]; it never
//!   sees the session.
//! - One instance per draw item, written in plan order, so draw order is
//!   exactly the plan's.

mod gpu;
mod resources;
mod shaders;

use duskfall_render::{FramePlan, RenderError, Renderer};

pub use gpu::{FrameStats, MAX_INSTANCES, WgpuRenderer};

/// A renderer bound to one surface texture for one frame.
pub struct WgpuTarget<'a> {
    pub renderer: &'a WgpuRenderer,
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub view: &'a wgpu::TextureView,
}

impl Renderer for WgpuTarget<'_> {
    type Output = FrameStats;

    fn render(&mut self, plan: &FramePlan) -> Result<FrameStats, RenderError> {
        self.renderer.render(self.device, self.queue, self.view, plan)
    }
}
