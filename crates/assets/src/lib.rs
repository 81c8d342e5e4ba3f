//! Arena assets: OBJ/MTL models, textures, cubemap, procedural meshes.
//!
//! # Invariants
//! - Loading never fails. A missing or malformed file is logged and replaced
//!   by a deterministic stand-in (unit cube, 1x1 gray, gradient sky).
//! - The cubemap is all or nothing: one bad face selects the fallback.

pub mod library;
pub mod mesh;
pub mod mtl;
pub mod obj;
pub mod texture;

pub use library::{AssetLibrary, Fallback, LoadReport, SurfaceMaterial};
pub use mesh::{MeshData, Model, SubMesh, Vertex};
pub use mtl::{MaterialDef, MaterialTable, parse_mtl};
pub use obj::parse_obj;
pub use texture::{CUBEMAP_FACES, CubemapData, TextureData};

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("image: {0}")]
    Image(#[from] image::ImageError),
    #[error("cubemap: {0}")]
    Cubemap(String),
    #[error("{0} has no geometry")]
    Empty(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
