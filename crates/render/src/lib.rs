//! Renderer-agnostic frame planning for the arena.
//!
//! # Invariants
//! - Renderers never mutate the session; a [`FramePlan`] is built from a
//!   shared borrow and owns everything a backend needs.
//! - The shadow pass runs before the color pass and draws the same world
//!   objects with the same transforms.
//! - Sky, sun, moon and the HUD weapon never cast shadows.

pub mod camera;
pub mod light;
pub mod plan;
mod renderer;
pub mod scene;
pub mod shading;

pub use camera::PlayerCamera;
pub use light::LightSpace;
pub use plan::FramePlan;
pub use renderer::{DebugTextRenderer, RenderError, Renderer};
pub use scene::{DrawItem, DrawLayer, DrawSink, Material, MeshKind, RenderPass, TextureSlot};
